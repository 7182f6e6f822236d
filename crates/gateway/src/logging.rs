use crate::config::Config;

pub const SERVICE_NAME: &str = "detector";

pub fn setup_logging(config: &Config) {
    let otel_service = config.otel_endpoint.as_ref().map(|_| SERVICE_NAME);
    common::setup_logging(config.log_level, config.environment, otel_service);
}

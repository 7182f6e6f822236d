use common::{Environment, LogLevel};
use inference::InferenceConfig;
use serde::Deserialize;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// How detections are laid out in the response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// `[x1, y1, x2, y2, label, confidence]` per detection
    #[default]
    Tuple,
    /// `{"x1": .., "label": .., "confidence": ..}` per detection
    Object,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Empty means any origin
    pub cors_allowed_origins: Vec<String>,
    pub response_format: ResponseFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_allowed_origins: Vec::new(),
            response_format: ResponseFormat::Tuple,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub log_level: LogLevel,
    pub environment: Environment,
    pub otel_endpoint: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.max_upload_bytes == 0 {
            anyhow::bail!("server.max_upload_bytes must be greater than 0");
        }
        self.inference.validate()
    }
}

/// Load configuration from an optional `detector.{toml,yaml,json}` file and
/// `DETECTOR_*` environment variables, e.g. `DETECTOR_INFERENCE__MODEL_PATH`.
pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let config = config::Config::builder()
        .set_default("log_level", "info")?
        .set_default("environment", "development")?
        .add_source(config::File::with_name("detector").required(false))
        .add_source(
            config::Environment::with_prefix("DETECTOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("server.cors_allowed_origins"),
        )
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;

    Ok(config)
}

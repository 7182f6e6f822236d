use crate::config::{ResponseFormat, ServerConfig};
use inference::Detector;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<Detector>,
    pub response_format: ResponseFormat,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Arc<[String]>,
}

impl AppState {
    pub fn new(detector: Arc<Detector>, server: &ServerConfig) -> Self {
        Self {
            detector,
            response_format: server.response_format,
            max_upload_bytes: server.max_upload_bytes,
            cors_allowed_origins: server.cors_allowed_origins.clone().into(),
        }
    }
}

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use inference::DetectError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Error retrieving file")]
    MissingFile,

    #[error("Invalid file type. Only JPEG, PNG, and GIF are supported")]
    InvalidFileType,

    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Unable to parse form: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error("Detection task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile
            | ApiError::InvalidFileType
            | ApiError::FileTooLarge { .. } => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Detect(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Detect(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Error processing image".to_string()
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
            match &self {
                ApiError::Detect(e) => format!("Error processing image: {}", e),
                other => other.to_string(),
            }
        };

        (status, body).into_response()
    }
}

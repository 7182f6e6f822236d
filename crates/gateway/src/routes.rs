use crate::{error::ApiError, serialization::render, state::AppState};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, Method, header},
    response::Response,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub const IMAGE_FIELD: &str = "image_file";
const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];
// Boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(cors_layer(&state.cors_allowed_origins))
        .layer(DefaultBodyLimit::max(
            state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
        ));

    Router::new()
        .route("/api/detect", post(detect))
        .route("/health", get(health))
        .layer(middleware)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

async fn detect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let start = Instant::now();

    let image = read_image_field(multipart, state.max_upload_bytes).await?;
    let size = image.len();

    let detector = Arc::clone(&state.detector);
    let detections = tokio::task::spawn_blocking(move || detector.detect(&image)).await??;

    tracing::info!(
        bytes = size,
        detections = detections.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request processed"
    );

    Ok(render(&detections, state.response_format))
}

async fn read_image_field(mut multipart: Multipart, limit: usize) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            tracing::warn!(content_type, "Unsupported upload content type");
            return Err(ApiError::InvalidFileType);
        }

        let data = field.bytes().await?;
        if data.len() > limit {
            return Err(ApiError::FileTooLarge {
                size: data.len(),
                limit,
            });
        }
        return Ok(data);
    }

    Err(ApiError::MissingFile)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    model_loaded: bool,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        model_loaded: state.detector.is_ready(),
    })
}

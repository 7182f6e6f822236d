use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use gateway::{AppState, ResponseFormat, ServerConfig, router};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use inference::{
    Detector, InferenceBackend, InferenceConfig,
    config::{BOX_ATTRIBUTES, NUM_ANCHORS, NUM_ATTRIBUTES},
    detector::BackendLoader,
};
use ndarray::{Array, ArrayD, IxDyn};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "detector-test-boundary";

/// One anchor: class 7, score 0.9, box (320, 320, 100, 50) in 640-space
struct FixedBackend;

impl InferenceBackend for FixedBackend {
    fn load_model(_config: &InferenceConfig) -> anyhow::Result<Self> {
        Ok(Self)
    }

    fn infer(&mut self, _images: &Array<f32, IxDyn>) -> anyhow::Result<ArrayD<f32>> {
        let mut output = ArrayD::zeros(IxDyn(&[1, NUM_ATTRIBUTES, NUM_ANCHORS]));
        output[[0, 0, 0]] = 320.0;
        output[[0, 1, 0]] = 320.0;
        output[[0, 2, 0]] = 100.0;
        output[[0, 3, 0]] = 50.0;
        output[[0, BOX_ATTRIBUTES + 7, 0]] = 0.9;
        Ok(output)
    }
}

struct FailingBackend;

impl InferenceBackend for FailingBackend {
    fn load_model(_config: &InferenceConfig) -> anyhow::Result<Self> {
        Ok(Self)
    }

    fn infer(&mut self, _images: &Array<f32, IxDyn>) -> anyhow::Result<ArrayD<f32>> {
        anyhow::bail!("device lost")
    }
}

fn test_config() -> InferenceConfig {
    InferenceConfig {
        eager_load: false,
        ..InferenceConfig::default()
    }
}

fn app_with<B: InferenceBackend + 'static>(server: ServerConfig) -> (Router, Arc<Detector>) {
    let detector = Arc::new(Detector::new::<B>(test_config()));
    let app = router(AppState::new(Arc::clone(&detector), &server));
    (app, detector)
}

fn app() -> (Router, Arc<Detector>) {
    app_with::<FixedBackend>(ServerConfig::default())
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([40, 80, 120]));
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

fn multipart_request(field: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"upload\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/detect")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_detect_returns_tuple_rows() {
    let (app, _) = app();

    let response = app
        .oneshot(multipart_request("image_file", "image/png", &png_bytes(640, 640)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );

    let json = body_json(response).await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);

    let row = rows[0].as_array().unwrap();
    assert_eq!(row.len(), 6);
    assert_eq!(row[0], 270.0);
    assert_eq!(row[1], 295.0);
    assert_eq!(row[2], 370.0);
    assert_eq!(row[3], 345.0);
    assert_eq!(row[4], "CARBERATOR");
    assert!((row[5].as_f64().unwrap() - 0.9).abs() < 1e-6);
}

#[tokio::test]
async fn test_detect_object_format() {
    let server = ServerConfig {
        response_format: ResponseFormat::Object,
        ..ServerConfig::default()
    };
    let (app, _) = app_with::<FixedBackend>(server);

    let response = app
        .oneshot(multipart_request("image_file", "image/png", &png_bytes(1280, 320)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let det = &json[0];
    assert_eq!(det["label"], "CARBERATOR");
    assert_eq!(det["x1"], 540.0);
    assert_eq!(det["x2"], 740.0);
    assert_eq!(det["y1"], 147.5);
    assert_eq!(det["y2"], 172.5);
}

#[tokio::test]
async fn test_get_on_detect_is_method_not_allowed() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/detect")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_missing_image_field() {
    let (app, detector) = app();

    let response = app
        .oneshot(multipart_request("attachment", "image/png", &png_bytes(8, 8)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Error retrieving file");
    assert!(!detector.is_ready());
}

#[tokio::test]
async fn test_unsupported_content_type() {
    let (app, _) = app();

    let response = app
        .oneshot(multipart_request("image_file", "text/plain", b"hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.starts_with("Invalid file type"));
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/detect")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_undecodable_image_is_client_error() {
    let (app, detector) = app();

    let response = app
        .oneshot(multipart_request("image_file", "image/png", b"definitely not a png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.starts_with("Error processing image"));
    assert!(!detector.is_ready());
}

#[tokio::test]
async fn test_upload_over_limit() {
    let server = ServerConfig {
        max_upload_bytes: 64,
        ..ServerConfig::default()
    };
    let (app, _) = app_with::<FixedBackend>(server);

    let response = app
        .oneshot(multipart_request("image_file", "image/png", &png_bytes(256, 256)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.starts_with("File too large"));
}

#[tokio::test]
async fn test_body_over_hard_limit_is_payload_too_large() {
    let server = ServerConfig {
        max_upload_bytes: 64,
        ..ServerConfig::default()
    };
    let (app, detector) = app_with::<FixedBackend>(server);
    // Past the upload limit plus the multipart framing allowance
    let oversized = vec![0u8; 256 * 1024];

    let response = app
        .oneshot(multipart_request("image_file", "image/png", &oversized))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!detector.is_ready());
}

#[tokio::test]
async fn test_engine_failure_is_internal_error() {
    let (app, _) = app_with::<FailingBackend>(ServerConfig::default());

    let response = app
        .oneshot(multipart_request("image_file", "image/png", &png_bytes(32, 32)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    // Engine details stay in the logs
    assert_eq!(body_text(response).await, "Error processing image");
}

#[tokio::test]
async fn test_failed_model_load_is_internal_error() {
    let loader: BackendLoader = Box::new(|| anyhow::bail!("model file not found: /nope.onnx"));
    let detector = Arc::new(Detector::with_loader(test_config(), loader));
    let app = router(AppState::new(Arc::clone(&detector), &ServerConfig::default()));

    let response = app
        .oneshot(multipart_request("image_file", "image/png", &png_bytes(32, 32)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!detector.is_ready());
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/detect")
                .header(header::ORIGIN, "https://parts.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"));
    assert!(methods.contains("OPTIONS"));
}

#[tokio::test]
async fn test_cors_configured_origin_list() {
    let server = ServerConfig {
        cors_allowed_origins: vec!["https://parts.example".to_string()],
        ..ServerConfig::default()
    };
    let (app, _) = app_with::<FixedBackend>(server);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/detect")
                .header(header::ORIGIN, "https://parts.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://parts.example"
    );
}

#[tokio::test]
async fn test_health_reports_model_state() {
    let (app, detector) = app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model_loaded"], false);

    detector.warm_up().unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["model_loaded"], true);
}

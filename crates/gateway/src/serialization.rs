use crate::config::ResponseFormat;
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use inference::Detection;
use serde::{Serialize, Serializer};

/// Serializes a detection as `[x1, y1, x2, y2, label, confidence]`.
pub struct DetectionRow<'a>(pub &'a Detection);

impl Serialize for DetectionRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let d = self.0;
        (d.x1, d.y1, d.x2, d.y2, d.label, d.confidence).serialize(serializer)
    }
}

/// JSON response body for `detections` in the requested layout.
pub fn render(detections: &[Detection], format: ResponseFormat) -> Response {
    match format {
        ResponseFormat::Tuple => {
            let rows: Vec<DetectionRow> = detections.iter().map(DetectionRow).collect();
            Json(rows).into_response()
        }
        ResponseFormat::Object => Json(detections).into_response(),
    }
}

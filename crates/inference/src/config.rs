use serde::Deserialize;

pub use crate::labels::NUM_CLASSES;

/// Model input width in pixels.
pub const INPUT_WIDTH: u32 = 640;
/// Model input height in pixels.
pub const INPUT_HEIGHT: u32 = 640;
/// Prediction slots emitted per image.
pub const NUM_ANCHORS: usize = 8400;
/// Center-x, center-y, width, height.
pub const BOX_ATTRIBUTES: usize = 4;
/// Rows of the output tensor: box attributes followed by one score per class.
pub const NUM_ATTRIBUTES: usize = BOX_ATTRIBUTES + NUM_CLASSES;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionProvider {
    #[default]
    Cpu,
    Cuda,
    #[serde(rename = "coreml")]
    CoreMl,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub model_path: String,
    pub execution_provider: ExecutionProvider,
    pub intra_threads: usize,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// Load the model at startup instead of on the first request
    pub eager_load: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model_path: "./models/best.onnx".to_string(),
            execution_provider: ExecutionProvider::Cpu,
            intra_threads: 4,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            eager_load: true,
        }
    }
}

impl InferenceConfig {
    pub fn input_size(&self) -> (u32, u32) {
        (INPUT_WIDTH, INPUT_HEIGHT)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            anyhow::bail!(
                "iou_threshold must be within [0, 1], got {}",
                self.iou_threshold
            );
        }
        if self.intra_threads == 0 {
            anyhow::bail!("intra_threads must be at least 1");
        }
        Ok(())
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            model_path: "/models/model.onnx".to_string(),
            eager_load: false,
            ..Self::default()
        }
    }
}

use preprocess::PreprocessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    /// The upload could not be decoded or resized.
    #[error(transparent)]
    Decode(#[from] PreprocessError),

    /// The model produced a tensor of the wrong shape (model/config mismatch).
    #[error("output tensor shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Loading the model or running it failed.
    #[error("inference failed: {0:#}")]
    Inference(anyhow::Error),
}

impl DetectError {
    /// Whether the caller sent bad input, as opposed to a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DetectError::Decode(e) if e.is_client_error())
    }
}

use crate::config::InferenceConfig;
use ndarray::{Array, ArrayD, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod ort;

/// An inference engine instance.
///
/// `infer` takes `&mut self`: an instance is not shared between concurrent
/// callers, see [`crate::Detector`] for how calls are serialized.
pub trait InferenceBackend: Send {
    fn load_model(config: &InferenceConfig) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run the model on a `[1, 3, H, W]` input, returning its raw output tensor.
    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<ArrayD<f32>>;
}

pub mod backend;
pub mod config;
pub mod detector;
pub mod error;
pub mod labels;
pub mod processing;

// Re-export commonly used types for convenience
pub use backend::InferenceBackend;
pub use config::{ExecutionProvider, InferenceConfig};
pub use detector::Detector;
pub use error::DetectError;
pub use processing::post::{Candidate, Detection, PostProcessor};

pub mod config;
pub mod cpu;
pub mod decode;
pub mod error;

use ndarray::{Array, IxDyn};

pub use config::DEFAULT_INPUT_SIZE;
pub use cpu::PreProcessor;
pub use decode::{DecodedImage, Pixels, decode_image};
pub use error::PreprocessError;

/// Model-ready input plus the source dimensions needed to scale boxes back.
#[derive(Debug)]
pub struct PreparedInput {
    /// `[1, 3, height, width]`, channel-planar RGB in `[0, 1]`
    pub tensor: Array<f32, IxDyn>,
    pub orig_width: u32,
    pub orig_height: u32,
}

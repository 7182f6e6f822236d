use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has zero width or height")]
    EmptyImage,

    #[error("failed to resize image: {0}")]
    Resize(String),

    /// The tensor buffer did not match the model input shape.
    #[error("failed to build input tensor: {0}")]
    Tensor(#[from] ndarray::ShapeError),
}

impl PreprocessError {
    /// Whether the uploaded image is at fault, as opposed to a broken pipeline.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PreprocessError::Tensor(_))
    }
}

impl From<fast_image_resize::ImageBufferError> for PreprocessError {
    fn from(e: fast_image_resize::ImageBufferError) -> Self {
        PreprocessError::Resize(e.to_string())
    }
}

impl From<fast_image_resize::ResizeError> for PreprocessError {
    fn from(e: fast_image_resize::ResizeError) -> Self {
        PreprocessError::Resize(e.to_string())
    }
}

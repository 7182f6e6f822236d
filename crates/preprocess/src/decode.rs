use crate::error::PreprocessError;
use common::span;
use image::{ColorType, DynamicImage, ImageBuffer, Rgb, RgbImage};

/// RGB pixel storage at the bit depth the decoder produced.
#[derive(Debug, Clone)]
pub enum Pixels {
    Rgb8(RgbImage),
    Rgb16(ImageBuffer<Rgb<u16>, Vec<u16>>),
}

/// A decoded upload, owned by the request that decoded it.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Pixels,
}

impl DecodedImage {
    pub fn from_rgb8(image: RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: Pixels::Rgb8(image),
        }
    }

    pub fn from_rgb16(image: ImageBuffer<Rgb<u16>, Vec<u16>>) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: Pixels::Rgb16(image),
        }
    }
}

/// Decode JPEG/PNG/GIF bytes into RGB. 16-bit sources keep their depth.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, PreprocessError> {
    let _s = span!("decode_image");

    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PreprocessError::EmptyImage);
    }

    tracing::debug!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Decoded image"
    );

    Ok(from_dynamic(image))
}

fn from_dynamic(image: DynamicImage) -> DecodedImage {
    match image.color() {
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => {
            DecodedImage::from_rgb16(image.to_rgb16())
        }
        _ => DecodedImage::from_rgb8(image.to_rgb8()),
    }
}

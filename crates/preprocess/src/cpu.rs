use crate::config::{DEFAULT_INPUT_SIZE, U16_TO_U8_DIVISOR};
use crate::decode::{DecodedImage, Pixels};
use crate::error::PreprocessError;
use crate::PreparedInput;
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use ndarray::{Array, IxDyn};

/// Stretches an image to the model resolution and lays it out channel-planar.
///
/// There is no letterboxing: the aspect ratio is not preserved, so boxes map
/// back to the source with a plain per-axis scale.
#[derive(Debug, Clone, Copy)]
pub struct PreProcessor {
    pub input_size: (u32, u32),
}

impl PreProcessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self { input_size }
    }

    pub fn prepare(&self, image: &DecodedImage) -> Result<PreparedInput, PreprocessError> {
        let _s = span!("prepare");

        tracing::trace!(
            width = image.width,
            height = image.height,
            input_width = self.input_size.0,
            input_height = self.input_size.1,
            "Preparing input tensor"
        );

        let tensor = match &image.pixels {
            Pixels::Rgb8(px) => {
                let resized = self.resize(px.as_raw(), image.width, image.height, PixelType::U8x3)?;
                self.normalize_u8(&resized)?
            }
            Pixels::Rgb16(px) => {
                let raw: &[u8] = bytemuck::cast_slice(px.as_raw().as_slice());
                let resized = self.resize(raw, image.width, image.height, PixelType::U16x3)?;
                self.normalize_u16(&resized)?
            }
        };

        Ok(PreparedInput {
            tensor,
            orig_width: image.width,
            orig_height: image.height,
        })
    }

    fn resize(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        pixel_type: PixelType,
    ) -> Result<Image<'static>, PreprocessError> {
        let _s = span!("resize");

        if width == 0 || height == 0 {
            return Err(PreprocessError::EmptyImage);
        }

        let src = ImageRef::new(width, height, pixels, pixel_type)?;
        let mut resized = Image::new(self.input_size.0, self.input_size.1, pixel_type);

        Resizer::new().resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3)),
        )?;

        Ok(resized)
    }

    fn normalize_u8(&self, image: &Image) -> Result<Array<f32, IxDyn>, PreprocessError> {
        let _s = span!("normalize");

        let pixel_count = self.pixel_count();
        let mut output = vec![0.0f32; 3 * pixel_count];

        for (idx, px) in image.buffer().chunks_exact(3).enumerate() {
            output[idx] = px[0] as f32 / 255.0;
            output[idx + pixel_count] = px[1] as f32 / 255.0;
            output[idx + 2 * pixel_count] = px[2] as f32 / 255.0;
        }

        self.to_tensor(output)
    }

    fn normalize_u16(&self, image: &Image) -> Result<Array<f32, IxDyn>, PreprocessError> {
        let _s = span!("normalize");

        let pixel_count = self.pixel_count();
        let mut output = vec![0.0f32; 3 * pixel_count];

        // The resized buffer is not guaranteed to be u16-aligned, so read by bytes.
        for (idx, px) in image.buffer().chunks_exact(6).enumerate() {
            let r = u16::from_ne_bytes([px[0], px[1]]) / U16_TO_U8_DIVISOR;
            let g = u16::from_ne_bytes([px[2], px[3]]) / U16_TO_U8_DIVISOR;
            let b = u16::from_ne_bytes([px[4], px[5]]) / U16_TO_U8_DIVISOR;
            output[idx] = r as f32 / 255.0;
            output[idx + pixel_count] = g as f32 / 255.0;
            output[idx + 2 * pixel_count] = b as f32 / 255.0;
        }

        self.to_tensor(output)
    }

    fn pixel_count(&self) -> usize {
        (self.input_size.0 * self.input_size.1) as usize
    }

    fn to_tensor(&self, data: Vec<f32>) -> Result<Array<f32, IxDyn>, PreprocessError> {
        Ok(Array::from_shape_vec(
            IxDyn(&[
                1,
                3,
                self.input_size.1 as usize,
                self.input_size.0 as usize,
            ]),
            data,
        )?)
    }
}

impl Default for PreProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}

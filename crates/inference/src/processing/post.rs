use crate::config::{BOX_ATTRIBUTES, NUM_ANCHORS, NUM_ATTRIBUTES, NUM_CLASSES};
use crate::error::DetectError;
use crate::labels::label_of;
use crate::processing::nms::{BoundingBox, suppress};
use serde::Serialize;

/// A decoded anchor that passed the confidence filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Corners in original-image pixels
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub confidence: f32,
}

/// A kept box, in original-image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub label: &'static str,
    pub confidence: f32,
}

impl From<Candidate> for Detection {
    fn from(c: Candidate) -> Self {
        Self {
            x1: c.bbox.x1,
            y1: c.bbox.y1,
            x2: c.bbox.x2,
            y2: c.bbox.y2,
            label: label_of(c.class_id),
            confidence: c.confidence,
        }
    }
}

pub struct PostProcessor {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub input_size: (u32, u32),
}

impl PostProcessor {
    pub fn new(confidence_threshold: f32, iou_threshold: f32, input_size: (u32, u32)) -> Self {
        Self {
            confidence_threshold,
            iou_threshold,
            input_size,
        }
    }

    /// Decode, filter and suppress the raw `[1, 54, 8400]` model output.
    #[tracing::instrument(skip(self, output))]
    pub fn process(
        &self,
        output: &ndarray::ArrayViewD<f32>,
        orig_width: u32,
        orig_height: u32,
    ) -> Result<Vec<Detection>, DetectError> {
        let candidates = self.decode_candidates(output, orig_width, orig_height)?;
        let num_candidates = candidates.len();

        let kept = suppress(candidates, self.iou_threshold);

        tracing::debug!(
            candidates = num_candidates,
            kept = kept.len(),
            "Post-processing complete"
        );

        Ok(kept.into_iter().map(Detection::from).collect())
    }

    /// Turn every anchor whose best class score reaches the confidence
    /// threshold into a candidate box scaled to the original image.
    ///
    /// Attribute `a` of anchor `i` is `output[[0, a, i]]`: rows 0..4 hold
    /// center-x, center-y, width, height in input pixels, the remaining rows
    /// one score per class. Candidates come out in anchor order.
    pub fn decode_candidates(
        &self,
        output: &ndarray::ArrayViewD<f32>,
        orig_width: u32,
        orig_height: u32,
    ) -> Result<Vec<Candidate>, DetectError> {
        let expected = [1, NUM_ATTRIBUTES, NUM_ANCHORS];
        if output.shape() != expected.as_slice() {
            tracing::error!(
                expected = ?expected,
                actual = ?output.shape(),
                "Model output shape does not match the configured model"
            );
            return Err(DetectError::ShapeMismatch {
                expected: expected.to_vec(),
                actual: output.shape().to_vec(),
            });
        }

        let scale_x = orig_width as f32 / self.input_size.0 as f32;
        let scale_y = orig_height as f32 / self.input_size.1 as f32;

        let mut candidates = Vec::new();

        for i in 0..NUM_ANCHORS {
            // Argmax over class scores; strict `>` keeps the lowest index on ties
            let mut prob = f32::NEG_INFINITY;
            let mut class_id = 0usize;
            for c in 0..NUM_CLASSES {
                let score = output[[0, BOX_ATTRIBUTES + c, i]];
                if score > prob {
                    prob = score;
                    class_id = c;
                }
            }

            if prob < self.confidence_threshold {
                continue;
            }

            let xc = output[[0, 0, i]];
            let yc = output[[0, 1, i]];
            let w = output[[0, 2, i]];
            let h = output[[0, 3, i]];

            let (x1, y1, x2, y2) = cxcywh_to_xyxy(xc, yc, w, h);
            let (x1, x2) = (x1 * scale_x, x2 * scale_x);
            let (y1, y2) = (y1 * scale_y, y2 * scale_y);

            // Negative sizes or NaNs cannot form a box
            if !(x1 <= x2 && y1 <= y2) {
                tracing::trace!(anchor = i, x1, y1, x2, y2, "Dropping inverted box");
                continue;
            }

            let bbox = BoundingBox::new(
                x1.clamp(0.0, orig_width as f32),
                y1.clamp(0.0, orig_height as f32),
                x2.clamp(0.0, orig_width as f32),
                y2.clamp(0.0, orig_height as f32),
            );

            candidates.push(Candidate {
                bbox,
                class_id,
                confidence: prob,
            });
        }

        Ok(candidates)
    }
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    let x1 = cx - w / 2.0;
    let y1 = cy - h / 2.0;
    let x2 = cx + w / 2.0;
    let y2 = cy + h / 2.0;
    (x1, y1, x2, y2)
}

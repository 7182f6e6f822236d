//! Box geometry and greedy non-maximum suppression.

use crate::processing::post::Candidate;
use std::collections::VecDeque;

/// Axis-aligned box in corner form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Signed area; negative when the corners are inverted.
    #[inline]
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }
}

/// Overlap area of two boxes, 0 when they are disjoint.
#[inline]
pub fn intersection(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);

    if ix2 < ix1 || iy2 < iy1 {
        return 0.0;
    }

    (ix2 - ix1) * (iy2 - iy1)
}

#[inline]
pub fn union(a: &BoundingBox, b: &BoundingBox) -> f32 {
    a.area() + b.area() - intersection(a, b)
}

/// Intersection over union; 0 when the union has no positive area.
#[inline]
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let union = union(a, b);
    if union <= 0.0 {
        return 0.0;
    }
    intersection(a, b) / union
}

/// Class-agnostic greedy NMS.
///
/// Candidates are stably sorted by confidence, highest first. The best
/// remaining box is kept and every other box with `iou >= iou_threshold`
/// against it is dropped, until nothing remains. The result is in descending
/// confidence order and no two kept boxes overlap at or above the threshold.
pub fn suppress(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut working: VecDeque<Candidate> = candidates.into();
    let mut kept = Vec::new();

    while let Some(best) = working.pop_front() {
        working.retain(|other| iou(&best.bbox, &other.bbox) < iou_threshold);
        kept.push(best);
    }

    kept
}

//! Resolving on-screen shapes back to stored boxes.
//!
//! Edited rectangles are tracked by shape, not by a stable identity, so
//! drag, resize, and delete must re-identify which stored box they are
//! operating on. Hit-testing for initial selection uses containment against
//! each box's viewport projection in list order; everything else uses the
//! minimal L1 coordinate difference.

use crate::model::BBox;
use crate::viewport::ViewTransform;

/// Find the stored box closest to `target` by L1 distance over the four
/// image-space coordinates (`|dx1|+|dy1|+|dx2|+|dy2|`). Ties resolve to the
/// lowest index.
pub fn closest_box(boxes: &[BBox], target: &BBox) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, b) in boxes.iter().enumerate() {
        let diff = (b.x1 - target.x1).abs()
            + (b.y1 - target.y1).abs()
            + (b.x2 - target.x2).abs()
            + (b.y2 - target.y2).abs();
        if best.map_or(true, |(_, d)| diff < d) {
            best = Some((i, diff));
        }
    }
    best.map(|(i, _)| i)
}

/// Find the first box whose viewport projection contains the pointer
/// position, in list order. Overlapping boxes always resolve to the
/// earliest-created one regardless of visual stacking; there is no z-order.
pub fn hit_test(boxes: &[BBox], view: &ViewTransform, pos: (f32, f32)) -> Option<usize> {
    for (i, b) in boxes.iter().enumerate() {
        let (vx1, vy1) = view.image_to_viewport((b.x1, b.y1));
        let (vx2, vy2) = view.image_to_viewport((b.x2, b.y2));
        if pos.0 >= vx1 && pos.0 <= vx2 && pos.1 >= vy1 && pos.1 <= vy2 {
            return Some(i);
        }
    }
    None
}

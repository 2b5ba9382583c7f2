//! Viewport transform mathematics.
//!
//! This module contains the mapping between image space (original image
//! pixels, origin top-left) and viewport space (on-screen pixels under the
//! current fit, zoom, and pan), extracted for testability and reusability.
//!
//! The total magnification is `base_scale * user_scale`: the base scale fits
//! the image inside the viewport preserving aspect ratio and is recomputed on
//! resize or fullscreen toggle, while the user scale is driven by the mouse
//! wheel and clamped to a fixed range.

use crate::constants::zoom;

/// Represents the pan/zoom transform state for one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    base_scale: f32,
    user_scale: f32,
    /// Viewport position of the image's top-left corner.
    pub offset: (f32, f32),
}

impl ViewTransform {
    /// Create a transform that fits an image inside a viewport, centered.
    ///
    /// Returns `None` for a degenerate viewport (width or height <= 0) or a
    /// zero-sized image; callers skip the frame rather than divide by zero.
    pub fn fitted(viewport: (f32, f32), image: (u32, u32)) -> Option<Self> {
        let (vw, vh) = viewport;
        let (iw, ih) = image;
        if vw <= 0.0 || vh <= 0.0 || iw == 0 || ih == 0 {
            return None;
        }

        let base_scale = (vw / iw as f32).min(vh / ih as f32);
        let offset = (
            (vw - iw as f32 * base_scale) / 2.0,
            (vh - ih as f32 * base_scale) / 2.0,
        );
        Some(Self {
            base_scale,
            user_scale: 1.0,
            offset,
        })
    }

    /// Recompute the base scale for a new viewport size, keeping the user
    /// zoom and pan position.
    ///
    /// Returns `false` (leaving the transform untouched) when the new
    /// viewport is degenerate; the caller skips drawing for that frame.
    pub fn refit(&mut self, viewport: (f32, f32), image: (u32, u32)) -> bool {
        let (vw, vh) = viewport;
        let (iw, ih) = image;
        if vw <= 0.0 || vh <= 0.0 || iw == 0 || ih == 0 {
            return false;
        }
        self.base_scale = (vw / iw as f32).min(vh / ih as f32);
        true
    }

    /// The fit-to-viewport scale component.
    pub fn base_scale(&self) -> f32 {
        self.base_scale
    }

    /// The user zoom component, in `[zoom::MIN, zoom::MAX]`.
    pub fn user_scale(&self) -> f32 {
        self.user_scale
    }

    /// Total image-to-viewport magnification.
    pub fn effective_scale(&self) -> f32 {
        self.base_scale * self.user_scale
    }

    /// Map a point from image space to viewport space.
    pub fn image_to_viewport(&self, p: (f32, f32)) -> (f32, f32) {
        let s = self.effective_scale();
        (self.offset.0 + p.0 * s, self.offset.1 + p.1 * s)
    }

    /// Map a point from viewport space back to image space.
    pub fn viewport_to_image(&self, p: (f32, f32)) -> (f32, f32) {
        let s = self.effective_scale();
        ((p.0 - self.offset.0) / s, (p.1 - self.offset.1) / s)
    }

    /// Calculate zoom-to-cursor transformation.
    ///
    /// This keeps the image point under the cursor fixed while zooming:
    /// the pan is recomputed so that `viewport_to_image(cursor)` is the same
    /// before and after the scale change. The requested user scale saturates
    /// at the configured limits rather than erroring.
    pub fn zoom_to_cursor(&self, new_user_scale: f32, cursor: (f32, f32)) -> ViewTransform {
        let new_user_scale = new_user_scale.clamp(zoom::MIN, zoom::MAX);
        let under_cursor = self.viewport_to_image(cursor);
        let new_scale = self.base_scale * new_user_scale;

        ViewTransform {
            base_scale: self.base_scale,
            user_scale: new_user_scale,
            offset: (
                cursor.0 - under_cursor.0 * new_scale,
                cursor.1 - under_cursor.1 * new_scale,
            ),
        }
    }

    /// One wheel step in, anchored at the cursor.
    pub fn zoomed_in(&self, cursor: (f32, f32)) -> ViewTransform {
        self.zoom_to_cursor(self.user_scale * zoom::STEP_IN, cursor)
    }

    /// One wheel step out, anchored at the cursor.
    pub fn zoomed_out(&self, cursor: (f32, f32)) -> ViewTransform {
        self.zoom_to_cursor(self.user_scale * zoom::STEP_OUT, cursor)
    }

    /// Apply a pan delta to the transform. The delta is in viewport pixels
    /// and is independent of the current scale.
    pub fn panned_by(&self, dx: f32, dy: f32) -> ViewTransform {
        ViewTransform {
            offset: (self.offset.0 + dx, self.offset.1 + dy),
            ..*self
        }
    }
}

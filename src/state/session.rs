//! Per-image editing sessions and the store that keeps them alive.
//!
//! A session owns the box lists and viewport transform for one image.
//! Sessions persist in memory for every image opened during the run, so
//! switching back and forth never loses unsaved edits; disk is only touched
//! on explicit save and on the initial annotation load.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::format;
use crate::model::{BBox, YoloBox};
use crate::viewport::ViewTransform;

/// Errors raised while opening an image session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The image file could not be read or decoded
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The viewport was degenerate, so no transform could be built
    #[error("viewport too small to display {path:?}")]
    DegenerateViewport { path: PathBuf },
}

/// Editing state for a single image.
///
/// The image-space box list is the source of truth; the parallel YOLO list
/// is recomputed from it on every geometric mutation, so the two can never
/// drift apart.
#[derive(Debug, Clone)]
pub struct ImageSession {
    path: PathBuf,
    image_width: u32,
    image_height: u32,
    boxes: Vec<BBox>,
    yolo_boxes: Vec<YoloBox>,
    /// Current pan/zoom state for this image.
    pub view: ViewTransform,
}

impl ImageSession {
    /// Open a session for an image: read its dimensions from the original
    /// file (never a resized copy), fit the viewport, and load any sibling
    /// annotation file that already exists.
    pub fn open(path: &Path, viewport: (f32, f32)) -> Result<Self, SessionError> {
        let (image_width, image_height) = image::image_dimensions(path)?;
        let view = ViewTransform::fitted(viewport, (image_width, image_height)).ok_or_else(
            || SessionError::DegenerateViewport {
                path: path.to_path_buf(),
            },
        )?;

        let mut session = Self {
            path: path.to_path_buf(),
            image_width,
            image_height,
            boxes: Vec::new(),
            yolo_boxes: Vec::new(),
            view,
        };

        match format::yolo::load(path, image_width, image_height) {
            Ok(boxes) => {
                for b in boxes {
                    session.add_box(b);
                }
            }
            Err(e) => {
                log::warn!("No annotations loaded for {:?}: {}", path, e);
            }
        }

        log::info!(
            "Opened session for {:?} ({}x{}, {} boxes)",
            path,
            image_width,
            image_height,
            session.boxes.len()
        );
        Ok(session)
    }

    /// Build a session from already-known parts. Used by tests and by
    /// callers that manage image decoding themselves.
    pub fn from_parts(
        path: PathBuf,
        image_width: u32,
        image_height: u32,
        view: ViewTransform,
    ) -> Self {
        Self {
            path,
            image_width,
            image_height,
            boxes: Vec::new(),
            yolo_boxes: Vec::new(),
            view,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original image dimensions, cached at load time.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Ordered image-space boxes.
    pub fn boxes(&self) -> &[BBox] {
        &self.boxes
    }

    /// Ordered normalized boxes, parallel to [`ImageSession::boxes`].
    pub fn yolo_boxes(&self) -> &[YoloBox] {
        &self.yolo_boxes
    }

    fn normalize(&self, bbox: BBox) -> (BBox, YoloBox) {
        let clamped = bbox.clamped(self.image_width as f32, self.image_height as f32);
        let yolo = clamped.to_yolo(self.image_width, self.image_height);
        (clamped, yolo)
    }

    /// Clamp and store a new box, returning its index.
    pub fn add_box(&mut self, bbox: BBox) -> usize {
        let (clamped, yolo) = self.normalize(bbox);
        self.boxes.push(clamped);
        self.yolo_boxes.push(yolo);
        self.boxes.len() - 1
    }

    /// Replace the box at `index`, keeping both representations in sync.
    /// Out-of-range indices are ignored (the gesture layer re-resolves
    /// indices, so a stale one is interaction noise, not an error).
    pub fn update_box(&mut self, index: usize, bbox: BBox) {
        if index >= self.boxes.len() {
            log::debug!("update_box: stale index {} ignored", index);
            return;
        }
        let (clamped, yolo) = self.normalize(bbox);
        self.boxes[index] = clamped;
        self.yolo_boxes[index] = yolo;
    }

    /// Remove the box at `index` from both lists.
    pub fn remove_box(&mut self, index: usize) -> Option<BBox> {
        if index >= self.boxes.len() {
            return None;
        }
        self.yolo_boxes.remove(index);
        Some(self.boxes.remove(index))
    }

    /// Drop all boxes for this image.
    pub fn clear(&mut self) {
        self.boxes.clear();
        self.yolo_boxes.clear();
    }

    /// Replace the whole box list (auto-detect replaces, never merges).
    pub fn replace_all(&mut self, boxes: impl IntoIterator<Item = BBox>) {
        self.clear();
        for b in boxes {
            self.add_box(b);
        }
    }
}

/// All sessions opened during this run, keyed by image path.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<PathBuf, ImageSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the existing session for an image, or open one. Prior edits
    /// survive image switches because the old session is returned as-is.
    pub fn open_or_get(
        &mut self,
        path: &Path,
        viewport: (f32, f32),
    ) -> Result<&mut ImageSession, SessionError> {
        if !self.sessions.contains_key(path) {
            let session = ImageSession::open(path, viewport)?;
            self.sessions.insert(path.to_path_buf(), session);
        }
        Ok(self.sessions.get_mut(path).expect("session just inserted"))
    }

    /// Look up a session without opening it.
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut ImageSession> {
        self.sessions.get_mut(path)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn test_session() -> ImageSession {
        let view = ViewTransform::fitted((800.0, 600.0), (800, 600)).unwrap();
        ImageSession::from_parts(PathBuf::from("test.png"), 800, 600, view)
    }

    #[test]
    fn test_lists_stay_parallel() {
        let mut s = test_session();
        s.add_box(BBox::from_corners(0, (10.0, 10.0), (50.0, 50.0)));
        s.add_box(BBox::from_corners(1, (100.0, 100.0), (300.0, 200.0)));
        assert_eq!(s.boxes().len(), s.yolo_boxes().len());

        s.update_box(0, BBox::from_corners(0, (20.0, 20.0), (60.0, 60.0)));
        assert_eq!(s.boxes().len(), s.yolo_boxes().len());

        s.remove_box(1);
        assert_eq!(s.boxes().len(), 1);
        assert_eq!(s.yolo_boxes().len(), 1);
    }

    #[test]
    fn test_mutation_reclamps_and_renormalizes() {
        let mut s = test_session();
        let i = s.add_box(BBox::from_corners(2, (-50.0, 100.0), (900.0, 150.0)));

        let b = s.boxes()[i];
        assert_eq!((b.x1, b.x2), (0.0, 800.0));

        let y = s.yolo_boxes()[i];
        // x_center * 2 * image_width == x1 + x2
        assert!((y.x_center * 2.0 * 800.0 - (b.x1 + b.x2)).abs() < EPSILON);
        assert!(y.width >= 0.0 && y.width <= 1.0);
        assert!(y.height >= 0.0 && y.height <= 1.0);
    }

    #[test]
    fn test_replace_all_replaces_not_merges() {
        let mut s = test_session();
        s.add_box(BBox::from_corners(0, (10.0, 10.0), (50.0, 50.0)));
        s.replace_all(vec![BBox::from_corners(1, (1.0, 1.0), (2.0, 2.0))]);
        assert_eq!(s.boxes().len(), 1);
        assert_eq!(s.boxes()[0].class_id, 1);

        s.replace_all(Vec::new());
        assert!(s.boxes().is_empty());
        assert!(s.yolo_boxes().is_empty());
    }

    #[test]
    fn test_stale_update_ignored() {
        let mut s = test_session();
        s.update_box(5, BBox::from_corners(0, (0.0, 0.0), (1.0, 1.0)));
        assert!(s.boxes().is_empty());
        assert!(s.remove_box(3).is_none());
    }
}

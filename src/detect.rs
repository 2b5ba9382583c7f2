//! Detection bridge: bootstrap a session's boxes from an object detector.
//!
//! The detector itself is an external collaborator behind the [`Detector`]
//! trait; it receives the full-resolution image and answers with corner
//! boxes in original pixel space. The bridge scales those through the
//! fit-to-viewport thumbnail ratio (scale only, no pan offset — detected
//! boxes land at canvas-origin coordinates and the normal render pass
//! applies the offset) and replaces the session's box list.

use std::path::PathBuf;

use image::DynamicImage;
use thiserror::Error;

use crate::model::BBox;
use crate::state::ImageSession;

/// One detector result in original-image pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub class_id: u32,
}

/// Construction parameters for a detector backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    /// Path to the model weights
    pub model_path: PathBuf,
    /// Detections below this confidence are dropped
    pub confidence_threshold: f32,
    /// Detections shorter than this (pixels) are dropped
    pub min_height: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            confidence_threshold: 0.5,
            min_height: 10,
        }
    }
}

/// Errors surfaced by detection. None of them are fatal to the session;
/// the failed operation is reported and aborted.
#[derive(Error, Debug)]
pub enum DetectError {
    /// Detection requested while no image is loaded
    #[error("no image loaded to run detection on")]
    NoActiveImage,

    /// The model could not be loaded (bad path, unsupported format)
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Inference failed on an otherwise valid image
    #[error("inference failed: {0}")]
    Inference(String),

    /// The current image could not be read for detection
    #[error("failed to read image: {0}")]
    Image(#[from] image::ImageError),
}

/// An object detector. Implementations wrap an external model runtime;
/// tests use stubs.
pub trait Detector {
    /// Run detection on a full-resolution image. Coordinates in the result
    /// are in the input image's pixel space.
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, DetectError>;
}

/// The thumbnail scale used for detected boxes: fit within the viewport
/// preserving aspect ratio, shrinking only (an image smaller than the
/// viewport keeps its size).
fn thumbnail_scale(image: (u32, u32), viewport: (f32, f32)) -> f32 {
    let sx = viewport.0 / image.0 as f32;
    let sy = viewport.1 / image.1 as f32;
    sx.min(sy).min(1.0)
}

/// Run the detector over the session's image and replace its boxes with the
/// results. Detect replaces, never merges: existing boxes are cleared before
/// the detector runs, so a failing detector leaves the list empty but the
/// session otherwise unchanged. Returns the number of boxes stored.
pub fn auto_detect(
    session: &mut ImageSession,
    detector: &dyn Detector,
    viewport: (f32, f32),
) -> Result<usize, DetectError> {
    let image = image::open(session.path())?;

    session.clear();
    let detections = detector.detect(&image)?;

    let scale = thumbnail_scale(session.dimensions(), viewport);
    session.replace_all(detections.iter().map(|d| BBox {
        class_id: d.class_id,
        x1: d.x1 * scale,
        y1: d.y1 * scale,
        x2: d.x2 * scale,
        y2: d.y2 * scale,
    }));

    log::info!(
        "Auto-detect stored {} boxes for {:?} (scale {:.3})",
        session.boxes().len(),
        session.path(),
        scale
    );
    Ok(session.boxes().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::ViewTransform;
    use image::RgbaImage;

    struct StubDetector(Result<Vec<Detection>, &'static str>);

    impl Detector for StubDetector {
        fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>, DetectError> {
            match &self.0 {
                Ok(d) => Ok(d.clone()),
                Err(msg) => Err(DetectError::Inference((*msg).to_string())),
            }
        }
    }

    /// Write a real PNG so `image::open` has something to decode.
    fn session_with_image(width: u32, height: u32) -> (tempfile::TempDir, ImageSession) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbaImage::new(width, height).save(&path).unwrap();

        let view = ViewTransform::fitted((800.0, 600.0), (width, height)).unwrap();
        let session = ImageSession::from_parts(path, width, height, view);
        (dir, session)
    }

    #[test]
    fn test_detections_scaled_to_thumbnail_space() {
        // 1600x1200 image in an 800x600 viewport: thumbnail scale 0.5.
        let (_dir, mut session) = session_with_image(1600, 1200);
        let detector = StubDetector(Ok(vec![Detection {
            x1: 200.0,
            y1: 400.0,
            x2: 600.0,
            y2: 800.0,
            class_id: 3,
        }]));

        let n = auto_detect(&mut session, &detector, (800.0, 600.0)).unwrap();
        assert_eq!(n, 1);

        let b = session.boxes()[0];
        assert_eq!(b.class_id, 3);
        assert!((b.x1 - 100.0).abs() < 0.001);
        assert!((b.y1 - 200.0).abs() < 0.001);
        assert!((b.x2 - 300.0).abs() < 0.001);
        assert!((b.y2 - 400.0).abs() < 0.001);
    }

    #[test]
    fn test_small_image_not_upscaled() {
        let (_dir, mut session) = session_with_image(400, 300);
        let detector = StubDetector(Ok(vec![Detection {
            x1: 10.0,
            y1: 10.0,
            x2: 50.0,
            y2: 50.0,
            class_id: 0,
        }]));

        auto_detect(&mut session, &detector, (800.0, 600.0)).unwrap();
        let b = session.boxes()[0];
        assert!((b.x1 - 10.0).abs() < 0.001);
        assert!((b.x2 - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_detect_replaces_existing_boxes() {
        let (_dir, mut session) = session_with_image(800, 600);
        session.add_box(BBox::from_corners(9, (1.0, 1.0), (2.0, 2.0)));

        let detector = StubDetector(Ok(vec![Detection {
            x1: 100.0,
            y1: 100.0,
            x2: 200.0,
            y2: 200.0,
            class_id: 1,
        }]));
        auto_detect(&mut session, &detector, (800.0, 600.0)).unwrap();

        assert_eq!(session.boxes().len(), 1);
        assert_eq!(session.boxes()[0].class_id, 1);
    }

    #[test]
    fn test_empty_result_clears_without_error() {
        let (_dir, mut session) = session_with_image(800, 600);
        session.add_box(BBox::from_corners(0, (10.0, 10.0), (50.0, 50.0)));

        let detector = StubDetector(Ok(Vec::new()));
        let n = auto_detect(&mut session, &detector, (800.0, 600.0)).unwrap();
        assert_eq!(n, 0);
        assert!(session.boxes().is_empty());
        assert!(session.yolo_boxes().is_empty());
    }

    #[test]
    fn test_inference_failure_leaves_list_empty() {
        let (_dir, mut session) = session_with_image(800, 600);
        session.add_box(BBox::from_corners(0, (10.0, 10.0), (50.0, 50.0)));

        let detector = StubDetector(Err("cuda out of memory"));
        let err = auto_detect(&mut session, &detector, (800.0, 600.0)).unwrap_err();
        assert!(matches!(err, DetectError::Inference(_)));
        assert!(session.boxes().is_empty());
    }

    #[test]
    fn test_unreadable_image_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let view = ViewTransform::fitted((800.0, 600.0), (800, 600)).unwrap();
        let mut session =
            ImageSession::from_parts(dir.path().join("missing.png"), 800, 600, view);
        session.add_box(BBox::from_corners(0, (10.0, 10.0), (50.0, 50.0)));

        let detector = StubDetector(Ok(Vec::new()));
        assert!(auto_detect(&mut session, &detector, (800.0, 600.0)).is_err());
        // The image failed to load before the clear, so the box survives.
        assert_eq!(session.boxes().len(), 1);
    }
}

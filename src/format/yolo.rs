//! YOLO TXT annotation persistence.
//!
//! One text file per image, sibling to it with the extension replaced by
//! `.txt`. Each line is `class_id x_center y_center width height` with the
//! four floats normalized to [0, 1] and fixed to six decimal places.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::format::FormatError;
use crate::model::{BBox, YoloBox};
use crate::state::ImageSession;

/// The annotation file belonging to an image: same path, `.txt` extension.
pub fn annotation_path(image_path: &Path) -> PathBuf {
    image_path.with_extension("txt")
}

/// Serialize one normalized box as an annotation line (no newline).
fn format_line(b: &YoloBox) -> String {
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        b.class_id, b.x_center, b.y_center, b.width, b.height
    )
}

/// Parse a single YOLO annotation line. Returns `None` for lines that do
/// not carry five parseable fields; callers skip those with a warning.
fn parse_line(line: &str) -> Option<YoloBox> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }

    Some(YoloBox {
        class_id: parts[0].parse().ok()?,
        x_center: parts[1].parse().ok()?,
        y_center: parts[2].parse().ok()?,
        width: parts[3].parse().ok()?,
        height: parts[4].parse().ok()?,
    })
}

/// Write a session's annotations to the image's sibling `.txt` file,
/// overwriting any previous contents. Returns the path written.
///
/// A failed write leaves whatever the filesystem did (possibly a truncated
/// file); the in-memory session is never affected by save failures.
pub fn save(session: &ImageSession) -> Result<PathBuf, FormatError> {
    let path = annotation_path(session.path());

    let mut contents = String::new();
    for b in session.yolo_boxes() {
        // Unreachable for String, but keeps the write! error path honest.
        let _ = writeln!(contents, "{}", format_line(b));
    }
    std::fs::write(&path, contents)?;

    log::info!(
        "Saved {} annotations to {:?}",
        session.yolo_boxes().len(),
        path
    );
    Ok(path)
}

/// Load the annotations belonging to an image, converted to pixel space
/// under the given dimensions. A missing annotation file is an empty list,
/// not an error; malformed lines are skipped with a warning.
pub fn load(image_path: &Path, image_width: u32, image_height: u32) -> Result<Vec<BBox>, FormatError> {
    let path = annotation_path(image_path);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = std::fs::read_to_string(&path)?;
    let mut boxes = Vec::new();
    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(yolo) => boxes.push(yolo.to_pixels(image_width, image_height)),
            None => log::warn!("Skipping malformed line {} in {:?}", number + 1, path),
        }
    }

    log::info!("Loaded {} annotations from {:?}", boxes.len(), path);
    Ok(boxes)
}

//! Annotation and registry file formats.
//!
//! One text file per image in YOLO normalized format, plus the process-wide
//! `classes.txt` that defines class ids by line order.

pub mod classes;
mod error;
pub mod yolo;

pub use error::FormatError;

//! Training launch plumbing.
//!
//! Everything between "the user pressed Train" and the external trainer
//! process: reading `train_settings.txt`, splitting the labeled images into
//! train/val/test sets with a `dataset.yaml` manifest, building the trainer
//! command line, and streaming the process output back to the UI thread.
//! The trainer itself is an external collaborator; there is no cancellation
//! contract and the process may outlive the UI.

pub mod dataset;
pub mod launcher;
pub mod settings;

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while preparing or launching a training run.
#[derive(Error, Debug)]
pub enum TrainingError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file does not exist
    #[error("settings file not found: {path:?}")]
    SettingsNotFound { path: PathBuf },

    /// The settings file contained no usable entries
    #[error("no valid settings in {path:?}")]
    EmptySettings { path: PathBuf },

    /// Split percentages did not sum to 100
    #[error("split ratios must sum to 100%, got {sum}%")]
    InvalidRatios { sum: f32 },

    /// The trainer process failed to start
    #[error("failed to launch trainer: {0}")]
    Launch(String),
}

//! `train_settings.txt` parsing.
//!
//! A flat `key=value` file edited by hand: `#` comments and blank lines are
//! ignored, only the first `=` splits, and malformed lines are skipped with
//! a warning rather than aborting the run. Values are not interpreted here;
//! they are forwarded verbatim to the trainer command line in file order.

use std::path::Path;

use crate::training::TrainingError;

/// Ordered settings entries, as they will appear on the command line.
pub type TrainSettings = Vec<(String, String)>;

/// Parse one settings line. `Ok(None)` means the line carries nothing
/// (blank or comment); `Err` describes why a line was malformed.
fn parse_line(line: &str) -> Result<Option<(String, String)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let Some((key, value)) = line.split_once('=') else {
        return Err("missing '=' separator".to_string());
    };
    let key = key.trim();
    if key.is_empty() {
        return Err("empty key".to_string());
    }

    Ok(Some((key.to_string(), value.trim().to_string())))
}

/// Read training settings from a file. Missing file and a file with no
/// usable entries are both errors; individual bad lines are only warnings.
pub fn read_train_settings(path: &Path) -> Result<TrainSettings, TrainingError> {
    if !path.exists() {
        return Err(TrainingError::SettingsNotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(path)?;
    let mut settings = TrainSettings::new();
    for (number, line) in contents.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(entry)) => settings.push(entry),
            Ok(None) => {}
            Err(reason) => {
                log::warn!("Skipping line {} of {:?}: {}", number + 1, path, reason);
            }
        }
    }

    if settings.is_empty() {
        return Err(TrainingError::EmptySettings {
            path: path.to_path_buf(),
        });
    }

    log::info!("Read {} training settings from {:?}", settings.len(), path);
    Ok(settings)
}

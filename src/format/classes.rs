//! `classes.txt` persistence for the class registry.
//!
//! One class name per line, UTF-8, line order defining the 0-indexed class
//! ids. The file lives in the working directory and is created with a single
//! default class when absent, so a fresh directory is immediately usable.

use std::path::{Path, PathBuf};

use crate::format::FormatError;
use crate::model::ClassRegistry;

/// File name of the class registry, one per working directory.
pub const CLASSES_FILE: &str = "classes.txt";

fn classes_path(dir: &Path) -> PathBuf {
    dir.join(CLASSES_FILE)
}

/// Load the class registry from `classes.txt` in `dir`. When the file does
/// not exist, a registry with the single default class is created and
/// written back so later runs see the same ids.
pub fn load_or_init(dir: &Path) -> Result<ClassRegistry, FormatError> {
    let path = classes_path(dir);
    if !path.exists() {
        let registry = ClassRegistry::default();
        save(dir, &registry)?;
        log::info!("Created {:?} with default class", path);
        return Ok(registry);
    }

    let contents = std::fs::read_to_string(&path)?;
    let names: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    log::info!("Loaded {} classes from {:?}", names.len(), path);
    Ok(ClassRegistry::new(names))
}

/// Write the registry back to `classes.txt`, one name per line.
pub fn save(dir: &Path, registry: &ClassRegistry) -> Result<(), FormatError> {
    let mut contents = String::new();
    for name in registry.names() {
        contents.push_str(name);
        contents.push('\n');
    }
    std::fs::write(classes_path(dir), contents)?;
    Ok(())
}

//! Dataset splitting and the `dataset.yaml` manifest.
//!
//! Labeled images are partitioned into train/val/test subsets by user-given
//! percentages and copied (with their sibling `.txt` label files) into a
//! `dataset/` tree next to the working directory. The manifest is written by
//! hand in the small fixed shape the trainer expects.

use std::path::{Path, PathBuf};

use crate::training::TrainingError;

/// Names of the three dataset subsets, in manifest order.
pub const SPLIT_NAMES: [&str; 3] = ["train", "val", "test"];

/// Validated train/val/test fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    pub train: f32,
    pub val: f32,
    pub test: f32,
}

impl SplitRatios {
    /// Build ratios from user-entered percentages. They must sum to 100
    /// (within rounding noise); anything else is an input error.
    pub fn from_percentages(train: f32, val: f32, test: f32) -> Result<Self, TrainingError> {
        let sum = train + val + test;
        if (sum - 100.0).abs() > 0.001 {
            return Err(TrainingError::InvalidRatios { sum });
        }
        Ok(Self {
            train: train / 100.0,
            val: val / 100.0,
            test: test / 100.0,
        })
    }
}

/// A partition of image files into the three subsets.
#[derive(Debug, Clone, Default)]
pub struct DatasetSplit {
    pub train: Vec<PathBuf>,
    pub val: Vec<PathBuf>,
    pub test: Vec<PathBuf>,
}

impl DatasetSplit {
    /// Partition `files` by the given ratios, preserving input order.
    /// Subset sizes truncate like the ratio arithmetic suggests: test
    /// receives the remainder. Callers wanting a random split shuffle the
    /// list first.
    pub fn plan(files: &[PathBuf], ratios: SplitRatios) -> Self {
        let n = files.len();
        let train_end = (n as f32 * ratios.train) as usize;
        let val_end = train_end + (n as f32 * ratios.val) as usize;

        Self {
            train: files[..train_end.min(n)].to_vec(),
            val: files[train_end.min(n)..val_end.min(n)].to_vec(),
            test: files[val_end.min(n)..].to_vec(),
        }
    }

    fn subsets(&self) -> [(&str, &[PathBuf]); 3] {
        [
            ("train", &self.train),
            ("val", &self.val),
            ("test", &self.test),
        ]
    }

    /// Copy each subset's images and their sibling `.txt` label files into
    /// `dataset_root/<subset>/`. Images without a label file are copied
    /// alone (an unlabeled image is a valid negative example).
    pub fn materialize(&self, dataset_root: &Path) -> Result<(), TrainingError> {
        for (name, files) in self.subsets() {
            let subset_dir = dataset_root.join(name);
            std::fs::create_dir_all(&subset_dir)?;

            for image in files {
                let Some(file_name) = image.file_name() else {
                    continue;
                };
                std::fs::copy(image, subset_dir.join(file_name))?;

                let label = image.with_extension("txt");
                if label.exists() {
                    let label_name = label.file_name().expect("label path has file name");
                    std::fs::copy(&label, subset_dir.join(label_name))?;
                }
            }
        }

        log::info!(
            "Materialized dataset at {:?} ({}/{}/{} images)",
            dataset_root,
            self.train.len(),
            self.val.len(),
            self.test.len()
        );
        Ok(())
    }
}

/// Write the `dataset.yaml` manifest the trainer reads: the dataset root,
/// the three subset directories, and the class names by id.
pub fn write_manifest(dataset_root: &Path, class_names: &[String]) -> Result<PathBuf, TrainingError> {
    let mut contents = String::new();
    contents.push_str(&format!("path: {}\n", dataset_root.display()));
    for name in SPLIT_NAMES {
        contents.push_str(&format!("{}: {}\n", name, name));
    }
    contents.push_str("names:\n");
    for (id, name) in class_names.iter().enumerate() {
        contents.push_str(&format!("  {}: {}\n", id, name));
    }

    let path = dataset_root.join("dataset.yaml");
    std::fs::create_dir_all(dataset_root)?;
    std::fs::write(&path, contents)?;
    log::info!("Wrote dataset manifest {:?}", path);
    Ok(path)
}

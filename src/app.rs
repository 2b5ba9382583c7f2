//! Workspace orchestration.
//!
//! The [`Workspace`] ties the pieces together the way the windowing shell
//! sees them: the loaded image list, the session store, the class registry,
//! the edit state machine, and the training task. The shell forwards pointer
//! and key events here and reads back geometry for rendering; it owns the
//! dialogs, the window, and nothing else.

use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::detect::{self, DetectError, Detector};
use crate::editor::{EditMode, Editor, PointerEvent};
use crate::format::{self, FormatError};
use crate::model::ClassRegistry;
use crate::state::{ImageSession, SessionStore};
use crate::training::dataset::{DatasetSplit, SplitRatios, write_manifest};
use crate::training::launcher::{TrainingEvent, TrainingTask, build_command};
use crate::training::settings::read_train_settings;
use crate::training::TrainingError;

/// File extensions accepted when opening images.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// File name of the training settings, read from the working directory.
const TRAIN_SETTINGS_FILE: &str = "train_settings.txt";

/// Top-level application state, one per run.
pub struct Workspace {
    config: AppConfig,
    working_dir: PathBuf,
    classes: ClassRegistry,
    images: Vec<PathBuf>,
    current: usize,
    viewport: (f32, f32),
    sessions: SessionStore,
    editor: Editor,
    training: Option<TrainingTask>,
}

impl Workspace {
    /// Create a workspace rooted at `working_dir`, loading (or creating)
    /// its `classes.txt` and the user configuration.
    pub fn new(working_dir: &Path, viewport: (f32, f32)) -> Result<Self, FormatError> {
        let config = AppConfig::load_from_default_path().unwrap_or_default();
        Self::with_config(working_dir, viewport, config)
    }

    /// Create a workspace with an explicit configuration.
    pub fn with_config(
        working_dir: &Path,
        viewport: (f32, f32),
        config: AppConfig,
    ) -> Result<Self, FormatError> {
        let classes = format::classes::load_or_init(working_dir)?;
        let editor = Editor::with_thresholds(
            config.preferences.min_drag,
            config.preferences.handle_radius,
        );

        Ok(Self {
            config,
            working_dir: working_dir.to_path_buf(),
            classes,
            images: Vec::new(),
            current: 0,
            viewport,
            sessions: SessionStore::new(),
            editor,
            training: None,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn mode(&self) -> EditMode {
        self.editor.mode()
    }

    /// Switch edit modes, clearing selection and cursor affordance state.
    pub fn set_mode(&mut self, mode: EditMode) {
        self.editor.set_mode(mode);
    }

    // ------------------------------------------------------------------
    // Image list and navigation
    // ------------------------------------------------------------------

    /// Replace the image list with the given paths, keeping only files with
    /// a recognized image extension. The first image becomes current.
    pub fn open_images(&mut self, paths: impl IntoIterator<Item = PathBuf>) -> usize {
        self.images = paths
            .into_iter()
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map_or(false, |e| {
                        IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str())
                    })
            })
            .collect();
        self.current = 0;
        self.editor.clear_selection();

        if self.images.is_empty() {
            log::warn!("No image files among the opened paths");
        } else {
            log::info!("Opened {} images", self.images.len());
        }
        self.images.len()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.images.get(self.current).map(PathBuf::as_path)
    }

    /// The session for the current image, opened on first access. Prior
    /// edits survive image switches; the viewport fit is refreshed in case
    /// the window was resized while another image was showing.
    pub fn current_session(&mut self) -> Option<&mut ImageSession> {
        let path = self.images.get(self.current)?;
        match self.sessions.open_or_get(path, self.viewport) {
            Ok(session) => {
                let dims = session.dimensions();
                session.view.refit(self.viewport, dims);
                Some(session)
            }
            Err(e) => {
                log::error!("Failed to open {:?}: {}", path, e);
                None
            }
        }
    }

    /// Advance to the next image, wrapping at the end.
    pub fn next_image(&mut self) {
        if self.images.is_empty() {
            return;
        }
        self.current = (self.current + 1) % self.images.len();
        self.editor.clear_selection();
    }

    /// Go back one image, wrapping at the start.
    pub fn previous_image(&mut self) {
        if self.images.is_empty() {
            return;
        }
        self.current = (self.current + self.images.len() - 1) % self.images.len();
        self.editor.clear_selection();
    }

    /// Save the current annotations, then advance regardless of the save
    /// outcome (the error is still returned for reporting).
    pub fn next_image_and_save(&mut self) -> Result<PathBuf, FormatError> {
        let result = self.save_current();
        self.next_image();
        result
    }

    /// The viewport was resized (or fullscreen toggled); the current
    /// session refits lazily on next access.
    pub fn set_viewport(&mut self, viewport: (f32, f32)) {
        self.viewport = viewport;
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Route a pointer event to the edit state machine.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let Some(path) = self.images.get(self.current) else {
            return;
        };
        let Ok(session) = self.sessions.open_or_get(path, self.viewport) else {
            return;
        };
        self.editor.handle_pointer(event, session);
    }

    /// Delete the selected box. Returns whether a box was removed.
    pub fn delete_selected(&mut self) -> bool {
        let Some(path) = self.images.get(self.current) else {
            return false;
        };
        match self.sessions.get_mut(path) {
            Some(session) => self.editor.delete_selected(session),
            None => false,
        }
    }

    /// Remove every box on the current image.
    pub fn clear_boxes(&mut self) {
        if let Some(path) = self.images.get(self.current) {
            if let Some(session) = self.sessions.get_mut(path) {
                session.clear();
            }
        }
        self.editor.clear_selection();
    }

    /// Advance the active class cyclically, returning the new class id.
    pub fn cycle_class(&mut self) -> u32 {
        let next = self.classes.cycle(self.editor.active_class());
        self.editor.set_active_class(next);
        log::debug!(
            "Active class: {} ({:?})",
            next,
            self.classes.name(next).unwrap_or("?")
        );
        next
    }

    /// Add a class (or find it if already present), make it active, and
    /// persist the registry file.
    pub fn add_class(&mut self, name: &str) -> Result<u32, FormatError> {
        let id = self.classes.add(name);
        format::classes::save(&self.working_dir, &self.classes)?;
        self.editor.set_active_class(id);
        Ok(id)
    }

    /// Make an existing class active.
    pub fn select_class(&mut self, id: u32) {
        if (id as usize) < self.classes.len() {
            self.editor.set_active_class(id);
        }
    }

    /// The color for a class id, for rendering.
    pub fn class_color(&mut self, id: u32) -> [u8; 3] {
        self.classes.color(id)
    }

    // ------------------------------------------------------------------
    // Persistence and detection
    // ------------------------------------------------------------------

    /// Write the current image's annotations to its sibling `.txt` file.
    pub fn save_current(&mut self) -> Result<PathBuf, FormatError> {
        let Some(path) = self.images.get(self.current) else {
            return Err(FormatError::NoActiveImage);
        };
        let session = self
            .sessions
            .open_or_get(path, self.viewport)
            .map_err(|e| FormatError::invalid_format(e.to_string()))?;
        format::yolo::save(session)
    }

    /// Run the detector on the current image, replacing its boxes.
    pub fn auto_detect(&mut self, detector: &dyn Detector) -> Result<usize, DetectError> {
        let Some(path) = self.images.get(self.current) else {
            return Err(DetectError::NoActiveImage);
        };
        let viewport = self.viewport;
        let Ok(session) = self.sessions.open_or_get(path, viewport) else {
            return Err(DetectError::NoActiveImage);
        };
        self.editor.clear_selection();
        detect::auto_detect(session, detector, viewport)
    }

    // ------------------------------------------------------------------
    // Training
    // ------------------------------------------------------------------

    /// Prepare a dataset from `work_dir` and launch the external trainer.
    /// Returns the command line that was launched. The caller shows it to
    /// the user; output arrives through [`Workspace::poll_training`].
    pub fn prepare_and_train(
        &mut self,
        work_dir: &Path,
        ratios: SplitRatios,
    ) -> Result<String, TrainingError> {
        let settings = read_train_settings(&self.working_dir.join(TRAIN_SETTINGS_FILE))?;

        let mut files: Vec<PathBuf> = std::fs::read_dir(work_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map_or(false, |e| e == "png" || e == "jpg")
            })
            .collect();
        files.sort();

        let dataset_root = work_dir
            .parent()
            .unwrap_or(work_dir)
            .join("dataset");
        let split = DatasetSplit::plan(&files, ratios);
        split.materialize(&dataset_root)?;
        let manifest = write_manifest(&dataset_root, self.classes.names())?;

        let command = build_command(&settings, &manifest);
        self.training = Some(TrainingTask::spawn(&command)?);
        Ok(command)
    }

    /// Drain pending trainer output. Called from the UI event loop; never
    /// blocks. A finished task stays pollable (empty) until the next launch.
    pub fn poll_training(&mut self) -> Vec<TrainingEvent> {
        self.training
            .as_ref()
            .map(TrainingTask::poll)
            .unwrap_or_default()
    }

    pub fn training_active(&self) -> bool {
        self.training.is_some()
    }
}

//! Customizable keybindings.
//!
//! This module maps key presses to workspace actions, mirroring the classic
//! single-letter bindings of the tool. Bindings can be remapped through the
//! configuration file.

use serde::{Deserialize, Serialize};

/// Keys the application reacts to. The embedding toolkit translates its own
/// key codes into these before handing them over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// A letter key, stored lowercase
    Char(char),
    Delete,
    Escape,
}

/// Actions a key press can trigger. The workspace executes most of these
/// itself; fullscreen and the log window belong to the windowing shell and
/// are relayed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Save the current image's annotations, then advance
    NextImageAndSave,
    /// Go to the previous image
    PreviousImage,
    /// Toggle fullscreen (shell-side)
    ToggleFullscreen,
    /// Leave fullscreen (shell-side)
    ExitFullscreen,
    /// Delete the selected box
    DeleteSelection,
    /// Switch to select mode
    SelectMode,
    /// Switch to draw mode
    DrawMode,
    /// Run the detector on the current image
    AutoDetect,
    /// Advance the active class
    CycleClass,
    /// Open the training log window (shell-side)
    ShowTrainingLog,
}

/// Keybinding configuration for the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub next_image_and_save: Key,
    pub previous_image: Key,
    pub toggle_fullscreen: Key,
    pub exit_fullscreen: Key,
    pub delete_selection: Key,
    pub select_mode: Key,
    pub draw_mode: Key,
    pub auto_detect: Key,
    pub cycle_class: Key,
    pub show_training_log: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            next_image_and_save: Key::Char('n'),
            previous_image: Key::Char('p'),
            toggle_fullscreen: Key::Char('f'),
            exit_fullscreen: Key::Escape,
            delete_selection: Key::Delete,
            select_mode: Key::Char('s'),
            draw_mode: Key::Char('d'),
            auto_detect: Key::Char('a'),
            cycle_class: Key::Char('c'),
            show_training_log: Key::Char('l'),
        }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> [(Key, Action); 10] {
        [
            (self.next_image_and_save, Action::NextImageAndSave),
            (self.previous_image, Action::PreviousImage),
            (self.toggle_fullscreen, Action::ToggleFullscreen),
            (self.exit_fullscreen, Action::ExitFullscreen),
            (self.delete_selection, Action::DeleteSelection),
            (self.select_mode, Action::SelectMode),
            (self.draw_mode, Action::DrawMode),
            (self.auto_detect, Action::AutoDetect),
            (self.cycle_class, Action::CycleClass),
            (self.show_training_log, Action::ShowTrainingLog),
        ]
    }

    /// Get the action bound to a key press, if any.
    pub fn action_for_key(&self, key: Key) -> Option<Action> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, action)| action)
    }

    /// Check if a key is already used by a binding other than `exclude`.
    /// Returns the conflicting action, if any.
    pub fn key_conflict(&self, key: Key, exclude: Option<Action>) -> Option<Action> {
        self.entries()
            .into_iter()
            .find(|(k, action)| *k == key && Some(*action) != exclude)
            .map(|(_, action)| action)
    }
}

/// Convert a key to a display string for the settings UI.
pub fn key_to_string(key: Key) -> String {
    match key {
        Key::Char(c) => c.to_uppercase().to_string(),
        Key::Delete => "Delete".to_string(),
        Key::Escape => "Esc".to_string(),
    }
}

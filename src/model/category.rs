//! Class registry for annotation categories.
//!
//! Class ids are positions in an ordered name list, matching the line order
//! of `classes.txt`. Colors come from a fixed palette for the first ten ids
//! and from golden-angle HSV generation beyond that, cached per id so a
//! class keeps its color for the whole session.

use std::collections::HashMap;

use crate::color_utils;
use crate::constants::palette;

/// Name given to the single class created when no `classes.txt` exists yet.
pub const DEFAULT_CLASS_NAME: &str = "class_0";

/// An annotation category with a name and color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Class id, equal to the position in the registry
    pub id: u32,
    /// Display name of the category
    pub name: String,
    /// RGB color for the category
    pub color: [u8; 3],
}

/// Ordered class names with a per-id color cache.
#[derive(Debug, Clone)]
pub struct ClassRegistry {
    names: Vec<String>,
    colors: HashMap<u32, [u8; 3]>,
}

impl ClassRegistry {
    /// Create a registry from an ordered name list. An empty list falls back
    /// to the single default class.
    pub fn new(names: Vec<String>) -> Self {
        let names = if names.is_empty() {
            vec![DEFAULT_CLASS_NAME.to_string()]
        } else {
            names
        };
        Self {
            names,
            colors: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All class names in id order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Look up a class name by id.
    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// Look up a class id by name.
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.names.iter().position(|n| n == name).map(|i| i as u32)
    }

    /// Add a class, returning its id. Adding an existing name returns the
    /// id it already has.
    pub fn add(&mut self, name: &str) -> u32 {
        if let Some(id) = self.id_of(name) {
            return id;
        }
        self.names.push(name.to_string());
        let id = (self.names.len() - 1) as u32;
        log::debug!("Added class '{}' (id={})", name, id);
        id
    }

    /// The next class id in cyclic order, for the class-cycling hotkey.
    pub fn cycle(&self, current: u32) -> u32 {
        (current + 1) % self.names.len() as u32
    }

    /// The color for a class id: fixed palette for ids 0-9, golden-angle
    /// generation beyond, cached so repeated lookups are stable.
    pub fn color(&mut self, id: u32) -> [u8; 3] {
        if let Some(fixed) = palette::FIXED.get(id as usize) {
            return *fixed;
        }
        *self
            .colors
            .entry(id)
            .or_insert_with(|| color_utils::generated_color(id))
    }

    /// Materialize a [`Category`] for a class id, if it exists.
    pub fn category(&mut self, id: u32) -> Option<Category> {
        let name = self.names.get(id as usize)?.clone();
        let color = self.color(id);
        Some(Category { id, name, color })
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

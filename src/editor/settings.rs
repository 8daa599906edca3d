// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Editor settings, persisted to `<config_dir>/atomCAD/editor.toml`.
//!
//! - **Windows:** `%APPDATA%\atomCAD\editor.toml`
//! - **macOS:** `~/Library/Application Support/atomCAD/editor.toml`
//! - **Linux:** `~/.config/atomCAD/editor.toml`

use crate::crystolecule::atomic_structure::BOND_DISTANCE_MULTIPLIER;
use crate::crystolecule::geometry::{SMART_OFFSET_MAX_STEPS, SMART_OFFSET_STEP};
use crate::editor::error::EditorError;
use crate::util::serialization_utils::dvec3_serializer;
use glam::f64::DVec3;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = crate::APP_NAME;
const SETTINGS_FILE_NAME: &str = "editor.toml";

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Number of snapshots kept per structure
    pub history_capacity: usize,
    /// Multiplier on the covalent radius sum below which two atoms bond
    pub bond_threshold: f64,
    pub display_scale: f64,
    pub default_element: String,
    #[serde(with = "dvec3_serializer")]
    pub paste_offset: DVec3,
    pub smart_offset_min_distance: f64,
    pub smart_offset_step: f64,
    pub smart_offset_max_steps: u32,
    pub slab_vacuum: f64,
    pub slab_layers: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            bond_threshold: BOND_DISTANCE_MULTIPLIER,
            display_scale: 1.0,
            default_element: "C".to_string(),
            paste_offset: DVec3::new(1.0, 1.0, 0.0),
            smart_offset_min_distance: 2.0,
            smart_offset_step: SMART_OFFSET_STEP,
            smart_offset_max_steps: SMART_OFFSET_MAX_STEPS,
            slab_vacuum: 10.0,
            slab_layers: 4,
        }
    }
}

/// Returns the path to the settings file, or None if the config directory cannot be determined.
pub fn settings_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join(CONFIG_DIR_NAME).join(SETTINGS_FILE_NAME))
}

impl EditorSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, EditorError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String, EditorError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads settings from the user's config directory.
    ///
    /// Never fails: a missing config directory or file, or an unreadable or invalid file, yields
    /// the defaults.
    pub fn load() -> Self {
        let Some(path) = settings_path() else {
            warn!("could not determine config directory, using default settings");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("failed to load {}: {}, using default settings", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, EditorError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Saves to the user's config directory. Failures are logged, not propagated.
    pub fn save(&self) {
        let Some(path) = settings_path() else {
            warn!("could not determine config directory, settings not saved");
            return;
        };
        if let Err(e) = self.save_to(&path) {
            warn!("failed to save {}: {}", path.display(), e);
        }
    }

    /// Writes pretty TOML to `path`, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), EditorError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::crystolecule::error::ModelError;
use crate::crystolecule::io::poscar::PoscarError;
use crate::crystolecule::snapshot::SnapshotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Poscar(#[from] PoscarError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("Invalid settings: {0}")]
    SettingsParse(#[from] toml::de::Error),

    #[error("Cannot serialize settings: {0}")]
    SettingsWrite(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No structure named '{0}'")]
    UnknownStructure(String),

    #[error("Cannot remove the last remaining structure")]
    LastStructure,

    #[error("Clipboard is empty")]
    EmptyClipboard,

    #[error("External helper failed: {0}")]
    Helper(String),

    #[error("Invalid atom selector '{0}'")]
    InvalidSelector(String),

    #[error("Nothing is selected")]
    NothingSelected,
}

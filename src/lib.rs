// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Molecular and crystal structure editing: the atom-bond graph and its periodic extension,
//! geometric and crystallographic operations, and the editor state built on top of them.

pub mod crystolecule;
pub mod editor;
pub mod util;

pub const APP_NAME: &str = "atomCAD";

// End of File

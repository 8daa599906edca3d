// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

pub mod clipboard;
pub mod commands;
#[allow(clippy::module_inception)]
pub mod editor;
pub mod error;
pub mod history;
pub mod manager;
pub mod selection;
pub mod settings;
pub mod smiles;

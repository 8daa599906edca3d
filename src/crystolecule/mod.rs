// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

pub mod atomic_structure;
pub mod crystal;
pub mod error;
pub mod functional_group;
pub mod geometry;
pub mod io;
pub mod lattice;
pub mod model;
pub mod pbc_bonds;
pub mod placement;
pub mod slab;
pub mod snapshot;

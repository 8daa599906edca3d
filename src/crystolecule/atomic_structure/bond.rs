// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

/// An entry of a structure's ordered bond list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub atom_id1: u32,
    pub atom_id2: u32,
    pub order: u8,
}

impl Bond {
    pub fn connects(&self, atom_id1: u32, atom_id2: u32) -> bool {
        (self.atom_id1 == atom_id1 && self.atom_id2 == atom_id2)
            || (self.atom_id1 == atom_id2 && self.atom_id2 == atom_id1)
    }

    pub fn contains(&self, atom_id: u32) -> bool {
        self.atom_id1 == atom_id || self.atom_id2 == atom_id
    }
}

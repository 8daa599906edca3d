// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::crystolecule::atomic_structure::inline_bond::InlineBond;
use glam::f64::DVec3;
use periodic_table::DUMMY_ATOMIC_NUMBER;
use smallvec::SmallVec;

#[derive(Debug, Clone)]
pub struct Atom {
    pub id: u32,
    pub atomic_number: i16,
    pub position: DVec3,
    /// Adjacency, kept in sync with the owning structure's bond list.
    pub bonds: SmallVec<[InlineBond; 4]>,
}

impl Atom {
    #[inline]
    pub fn symbol(&self) -> &'static str {
        periodic_table::symbol(self.atomic_number)
    }

    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.atomic_number == DUMMY_ATOMIC_NUMBER
    }

    pub fn neighbor_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.bonds.iter().map(|bond| bond.other_atom_id())
    }

    /// Sum of the orders of all incident bonds.
    pub fn bond_order_sum(&self) -> u32 {
        self.bonds.iter().map(|bond| bond.bond_order() as u32).sum()
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::crystolecule::atomic_structure::BOND_SINGLE;
use crate::crystolecule::crystal::Crystal;
use crate::crystolecule::error::ModelError;
use glam::f64::DVec3;
use glam::i32::IVec3;
use log::debug;

/// Bonds every pair of home-cell atoms for which some image in the 27 neighboring cells lies
/// closer than `threshold · (r_i + r_j)`. Bonds are created in the home-cell structure, one per
/// pair however many images qualify. An atom is never bonded to its own image.
///
/// Returns the number of new bonds.
pub fn pbc_auto_bond(crystal: &mut Crystal, threshold: f64) -> Result<usize, ModelError> {
    if !(threshold.is_finite() && threshold > 0.0) {
        return Err(ModelError::InvalidArgument(format!(
            "bond threshold must be positive, got {}",
            threshold
        )));
    }
    let lattice = crystal.require_lattice()?;

    let translations: Vec<DVec3> = (-1..=1)
        .flat_map(|i| (-1..=1).flat_map(move |j| (-1..=1).map(move |k| IVec3::new(i, j, k))))
        .map(|cell| lattice.translation(cell))
        .collect();

    let atoms: Vec<(u32, DVec3, f64)> = crystal
        .structure()
        .iter_atoms()
        .map(|atom| {
            (
                atom.id,
                atom.position,
                periodic_table::covalent_radius(atom.atomic_number),
            )
        })
        .collect();

    let mut pairs = Vec::new();
    for (i, &(id_i, pos_i, radius_i)) in atoms.iter().enumerate() {
        for &(id_j, pos_j, radius_j) in &atoms[i + 1..] {
            let cutoff_squared = (threshold * (radius_i + radius_j)).powi(2);
            let bonded = translations.iter().any(|t| {
                let d = (pos_j + *t - pos_i).length_squared();
                d > 1e-12 && d < cutoff_squared
            });
            if bonded && !crystal.structure().has_bond_between(id_i, id_j) {
                pairs.push((id_i, id_j));
            }
        }
    }

    let structure = crystal.structure_mut();
    for &(id1, id2) in &pairs {
        structure.add_bond(id1, id2, BOND_SINGLE)?;
    }
    debug!("periodic auto bonding added {} bonds", pairs.len());
    Ok(pairs.len())
}

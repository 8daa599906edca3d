// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Serialized form of a structure (and its crystal extension), used for the undo history and
//! for persisting models as JSON.

use crate::crystolecule::atomic_structure::AtomicStructure;
use crate::crystolecule::crystal::Crystal;
use crate::crystolecule::error::ModelError;
use crate::crystolecule::lattice::{Lattice, LatticeParameters};
use crate::crystolecule::model::Model;
use glam::f64::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomRecord {
    pub id: u32,
    pub element: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondRecord {
    pub atom1_id: u32,
    pub atom2_id: u32,
    pub order: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeRecord {
    #[serde(flatten)]
    pub parameters: LatticeParameters,
    /// The basis as stored, so that cells not in the standard orientation survive a round trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vectors: Option<[[f64; 3]; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FracRecord {
    pub id: u32,
    pub fx: f64,
    pub fy: f64,
    pub fz: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureSnapshot {
    pub name: String,
    pub atoms: Vec<AtomRecord>,
    pub bonds: Vec<BondRecord>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_crystal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lattice: Option<LatticeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_group_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frac_coords: Vec<FracRecord>,
}

impl StructureSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }
}

impl LatticeRecord {
    fn from_lattice(lattice: &Lattice) -> Self {
        let (a, b, c) = lattice.vectors();
        Self {
            parameters: lattice.parameters(),
            vectors: Some([a.to_array(), b.to_array(), c.to_array()]),
        }
    }

    fn to_lattice(&self) -> Result<Lattice, ModelError> {
        match self.vectors {
            Some([a, b, c]) => Lattice::from_recorded(
                DVec3::from_array(a),
                DVec3::from_array(b),
                DVec3::from_array(c),
                self.parameters,
            ),
            None => Lattice::from_parameters(self.parameters),
        }
    }
}

impl AtomicStructure {
    pub fn to_snapshot(&self) -> StructureSnapshot {
        StructureSnapshot {
            name: self.name().to_string(),
            atoms: self
                .iter_atoms()
                .map(|atom| AtomRecord {
                    id: atom.id,
                    element: atom.symbol().to_string(),
                    x: atom.position.x,
                    y: atom.position.y,
                    z: atom.position.z,
                })
                .collect(),
            bonds: self
                .bonds()
                .iter()
                .map(|bond| BondRecord {
                    atom1_id: bond.atom_id1,
                    atom2_id: bond.atom_id2,
                    order: bond.order,
                })
                .collect(),
            is_crystal: false,
            lattice: None,
            space_group: None,
            space_group_number: None,
            frac_coords: Vec::new(),
        }
    }

    /// Rebuilds a structure with the recorded ids; the next id is one past the largest.
    pub fn from_snapshot(snapshot: &StructureSnapshot) -> Result<Self, ModelError> {
        let mut structure = AtomicStructure::new(snapshot.name.clone());

        let mut atoms: Vec<&AtomRecord> = snapshot.atoms.iter().collect();
        atoms.sort_by_key(|record| record.id);
        for record in atoms {
            let atomic_number = periodic_table::atomic_number_from_symbol(&record.element)
                .ok_or_else(|| ModelError::UnknownElement(record.element.clone()))?;
            structure.insert_atom_with_id(
                record.id,
                atomic_number,
                DVec3::new(record.x, record.y, record.z),
            )?;
        }
        for bond in &snapshot.bonds {
            structure.add_bond(bond.atom1_id, bond.atom2_id, bond.order)?;
        }
        Ok(structure)
    }
}

impl Crystal {
    pub fn to_snapshot(&self) -> StructureSnapshot {
        let mut snapshot = self.structure().to_snapshot();
        snapshot.is_crystal = true;
        snapshot.lattice = self.lattice().map(LatticeRecord::from_lattice);
        snapshot.space_group = Some(self.space_group().to_string());
        snapshot.space_group_number = Some(self.space_group_number());
        snapshot.frac_coords = self
            .cached_fractional_coordinates()
            .into_iter()
            .map(|(id, frac)| FracRecord {
                id,
                fx: frac.x,
                fy: frac.y,
                fz: frac.z,
            })
            .collect();
        snapshot
    }

    pub fn from_snapshot(snapshot: &StructureSnapshot) -> Result<Self, ModelError> {
        let structure = AtomicStructure::from_snapshot(snapshot)?;
        let lattice = snapshot
            .lattice
            .as_ref()
            .map(LatticeRecord::to_lattice)
            .transpose()?;

        let mut crystal = Crystal::from_structure(structure, lattice);
        crystal.set_space_group(
            snapshot
                .space_group
                .clone()
                .unwrap_or_else(|| crate::crystolecule::crystal::DEFAULT_SPACE_GROUP.to_string()),
            snapshot
                .space_group_number
                .unwrap_or(crate::crystolecule::crystal::DEFAULT_SPACE_GROUP_NUMBER),
        );
        for record in &snapshot.frac_coords {
            crystal.cache_frac(record.id, DVec3::new(record.fx, record.fy, record.fz))?;
        }
        Ok(crystal)
    }
}

impl Model {
    pub fn to_snapshot(&self) -> StructureSnapshot {
        match self {
            Model::Molecule(structure) => structure.to_snapshot(),
            Model::Crystal(crystal) => crystal.to_snapshot(),
        }
    }

    /// Branches on the `isCrystal` tag.
    pub fn from_snapshot(snapshot: &StructureSnapshot) -> Result<Self, ModelError> {
        if snapshot.is_crystal {
            Ok(Model::Crystal(Crystal::from_snapshot(snapshot)?))
        } else {
            Ok(Model::Molecule(AtomicStructure::from_snapshot(snapshot)?))
        }
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use thiserror::Error;

/// Failures reported by model operations.  An operation that returns an error has not mutated
/// the structure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Atom {0} does not exist")]
    AtomNotFound(u32),

    #[error("Atom index {index} is out of range (structure has {len} atoms)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Cannot bond atom {0} to itself")]
    SelfBond(u32),

    #[error("Bond order {0} is out of range (1-7)")]
    InvalidBondOrder(u8),

    #[error("No bond between atoms {0} and {1}")]
    BondNotFound(u32, u32),

    #[error("Unknown element '{0}'")]
    UnknownElement(String),

    #[error("Atom {0} has a non-finite position")]
    NonFinitePosition(u32),

    #[error("Duplicate atom id {0}")]
    DuplicateAtomId(u32),

    #[error("Operation requires a lattice")]
    MissingLattice,

    #[error("Degenerate lattice: {0}")]
    DegenerateLattice(String),

    #[error("Lattice matrix is singular")]
    SingularMatrix,

    #[error("Expected {expected} selected atoms, got {actual}")]
    SelectionSize { expected: &'static str, actual: usize },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Supercell matrix determinant {0} is too small")]
    SupercellDeterminant(f64),

    #[error("Miller indices cannot all be zero")]
    ZeroMillerIndices,

    #[error("No pair of in-plane lattice vectors found for ({h} {k} {l})")]
    NoInPlaneVectors { h: i32, k: i32, l: i32 },

    #[error("Slab needs {requested} layers but only {found} were found")]
    InsufficientLayers { found: usize, requested: usize },

    #[error("Invalid functional group: {0}")]
    InvalidGroup(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal inconsistency: {0}")]
    Inconsistent(String),
}

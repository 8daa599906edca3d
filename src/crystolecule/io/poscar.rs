// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! VASP POSCAR reader (VASP 4 and 5 layouts) and writer (VASP 5, Direct coordinates).

use crate::crystolecule::crystal::Crystal;
use crate::crystolecule::error::ModelError;
use crate::crystolecule::lattice::Lattice;
use glam::f64::DVec3;
use indexmap::IndexMap;
use log::{info, warn};
use periodic_table::DUMMY_ATOMIC_NUMBER;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoscarError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid POSCAR format on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid cell: {0}")]
    Model(#[from] ModelError),
}

/// Parsed contents of a POSCAR file.
#[derive(Debug, Clone, PartialEq)]
pub struct Poscar {
    pub comment: String,
    /// Basis vectors with the universal scale already applied
    pub lattice_vectors: [DVec3; 3],
    /// Species labels; synthesized as A, B, C, ... for VASP 4 files
    pub species: Vec<String>,
    pub counts: Vec<usize>,
    pub selective_dynamics: bool,
    /// Fractional coordinates, grouped by species in file order
    pub positions: Vec<DVec3>,
}

struct LineReader<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> LineReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }

    /// Next line with its 1-based number.
    fn next(&mut self, what: &str) -> Result<(usize, &'a str), PoscarError> {
        self.lines
            .next()
            .map(|(index, line)| (index + 1, line))
            .ok_or_else(|| PoscarError::Parse {
                line: 0,
                message: format!("unexpected end of file, expected {}", what),
            })
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> PoscarError {
    PoscarError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_f64(token: &str, line: usize) -> Result<f64, PoscarError> {
    token
        .parse::<f64>()
        .map_err(|_| parse_error(line, format!("'{}' is not a number", token)))
}

fn parse_vector(text: &str, line: usize) -> Result<DVec3, PoscarError> {
    let values = text
        .split_whitespace()
        .take(3)
        .map(|token| parse_f64(token, line))
        .collect::<Result<Vec<f64>, _>>()?;
    match values.as_slice() {
        [x, y, z] => Ok(DVec3::new(*x, *y, *z)),
        _ => Err(parse_error(line, "expected three numbers")),
    }
}

fn synthesized_species(index: usize) -> String {
    let letter = (b'A' + (index % 26) as u8) as char;
    if index < 26 {
        letter.to_string()
    } else {
        format!("{}{}", letter, index / 26)
    }
}

/// Element symbol part of a species label such as `Fe_pv` or `Si/PAW`.
fn species_symbol(label: &str) -> &str {
    label
        .split(|c: char| c == '_' || c == '/')
        .next()
        .unwrap_or(label)
}

pub fn parse_poscar(text: &str) -> Result<Poscar, PoscarError> {
    let mut reader = LineReader::new(text);

    let (_, comment) = reader.next("comment line")?;

    let (scale_line, scale_text) = reader.next("scale factor")?;
    let scale = parse_f64(
        scale_text
            .split_whitespace()
            .next()
            .ok_or_else(|| parse_error(scale_line, "missing scale factor"))?,
        scale_line,
    )?;
    if scale == 0.0 || !scale.is_finite() {
        return Err(parse_error(scale_line, "scale factor must be non-zero"));
    }

    let mut raw = [DVec3::ZERO; 3];
    for vector in raw.iter_mut() {
        let (line, text) = reader.next("lattice vector")?;
        *vector = parse_vector(text, line)?;
    }

    // Negative scale: its magnitude is the target cell volume.
    let factor = if scale < 0.0 {
        let raw_volume = raw[0].dot(raw[1].cross(raw[2])).abs();
        if raw_volume == 0.0 {
            return Err(parse_error(scale_line, "lattice vectors span no volume"));
        }
        (scale.abs() / raw_volume).cbrt()
    } else {
        scale
    };
    let lattice_vectors = raw.map(|v| v * factor);

    let (species_line, species_text) = reader.next("species or counts")?;
    let tokens: Vec<&str> = species_text.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(parse_error(species_line, "empty species line"));
    }
    let numeric: Option<Vec<usize>> = tokens.iter().map(|t| t.parse::<usize>().ok()).collect();
    let (species, counts) = match numeric {
        // VASP 4: counts only
        Some(counts) => {
            let species = (0..counts.len()).map(synthesized_species).collect();
            (species, counts)
        }
        // VASP 5: symbols, then counts
        None => {
            let species: Vec<String> = tokens
                .iter()
                .map(|t| species_symbol(t).to_string())
                .collect();
            let (count_line, count_text) = reader.next("species counts")?;
            let counts = count_text
                .split_whitespace()
                .map(|t| {
                    t.parse::<usize>()
                        .map_err(|_| parse_error(count_line, format!("'{}' is not a count", t)))
                })
                .collect::<Result<Vec<usize>, _>>()?;
            if counts.len() != species.len() {
                return Err(parse_error(
                    count_line,
                    format!("{} species but {} counts", species.len(), counts.len()),
                ));
            }
            (species, counts)
        }
    };

    let (mut mode_line, mut mode_text) = reader.next("coordinate mode")?;
    let mut selective_dynamics = false;
    if mode_text.trim_start().starts_with(['s', 'S']) {
        selective_dynamics = true;
        (mode_line, mode_text) = reader.next("coordinate mode")?;
    }
    let cartesian = mode_text.trim_start().starts_with(['c', 'C', 'k', 'K']);
    if mode_text.trim().is_empty() {
        return Err(parse_error(mode_line, "missing coordinate mode"));
    }

    let lattice = Lattice::from_vectors(lattice_vectors[0], lattice_vectors[1], lattice_vectors[2])?;
    let total: usize = counts.iter().sum();
    let mut positions = Vec::with_capacity(total);
    for _ in 0..total {
        let (line, text) = reader.next("atom position")?;
        let position = parse_vector(text, line)?;
        positions.push(if cartesian {
            lattice.cart_to_frac(position * factor)
        } else {
            position
        });
    }

    Ok(Poscar {
        comment: comment.trim().to_string(),
        lattice_vectors,
        species,
        counts,
        selective_dynamics,
        positions,
    })
}

impl Poscar {
    /// Builds a crystal. Species labels that are not element symbols become dummy atoms.
    pub fn to_crystal(&self) -> Result<Crystal, PoscarError> {
        let [a, b, c] = self.lattice_vectors;
        let lattice = Lattice::from_vectors(a, b, c)?;
        let name = if self.comment.is_empty() {
            "POSCAR".to_string()
        } else {
            self.comment.clone()
        };
        let mut crystal = Crystal::new(name, lattice);

        let mut positions = self.positions.iter();
        for (label, &count) in self.species.iter().zip(&self.counts) {
            let atomic_number = periodic_table::atomic_number_from_symbol(label).unwrap_or_else(|| {
                warn!("species '{}' is not an element symbol, using dummy atoms", label);
                DUMMY_ATOMIC_NUMBER
            });
            for frac in positions.by_ref().take(count) {
                crystal.add_atom_fractional(atomic_number, *frac)?;
            }
        }
        Ok(crystal)
    }

    /// Groups the atoms by element in order of first appearance.
    pub fn from_crystal(crystal: &Crystal) -> Result<Self, PoscarError> {
        let lattice = crystal.require_lattice()?;
        let (a, b, c) = lattice.vectors();

        let mut groups: IndexMap<&'static str, Vec<DVec3>> = IndexMap::new();
        for atom in crystal.structure().iter_atoms() {
            groups
                .entry(atom.symbol())
                .or_default()
                .push(crystal.get_frac_safe(atom.id)?);
        }

        Ok(Self {
            comment: crystal.name().to_string(),
            lattice_vectors: [a, b, c],
            species: groups.keys().map(|s| s.to_string()).collect(),
            counts: groups.values().map(Vec::len).collect(),
            selective_dynamics: false,
            positions: groups.into_values().flatten().collect(),
        })
    }

    /// VASP 5 text with Direct coordinates.
    pub fn to_poscar_string(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}", self.comment);
        let _ = writeln!(out, "{:>19.14}", 1.0);
        for v in &self.lattice_vectors {
            let _ = writeln!(out, " {:>21.16} {:>21.16} {:>21.16}", v.x, v.y, v.z);
        }
        let species: Vec<String> = self.species.iter().map(|s| format!("{:>5}", s)).collect();
        let _ = writeln!(out, "{}", species.join(""));
        let counts: Vec<String> = self.counts.iter().map(|n| format!("{:>5}", n)).collect();
        let _ = writeln!(out, "{}", counts.join(""));
        let _ = writeln!(out, "Direct");
        for p in &self.positions {
            let _ = writeln!(out, "{:>16.10}{:>16.10}{:>16.10}", p.x, p.y, p.z);
        }
        out
    }
}

pub fn write_poscar(crystal: &Crystal) -> Result<String, PoscarError> {
    Ok(Poscar::from_crystal(crystal)?.to_poscar_string())
}

pub fn load_poscar(file_path: impl AsRef<Path>) -> Result<Crystal, PoscarError> {
    let text = fs::read_to_string(file_path.as_ref())?;
    let crystal = parse_poscar(&text)?.to_crystal()?;
    info!(
        "loaded {} atoms from {}",
        crystal.structure().get_num_of_atoms(),
        file_path.as_ref().display()
    );
    Ok(crystal)
}

pub fn save_poscar(crystal: &Crystal, file_path: impl AsRef<Path>) -> Result<(), PoscarError> {
    fs::write(file_path, write_poscar(crystal)?)?;
    Ok(())
}

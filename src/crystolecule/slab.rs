// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Surface slab construction from Miller indices.
//!
//! The slab cell keeps two short lattice vectors lying in the (h k l) plane and a third vector
//! along the surface normal whose length is the slab thickness plus the vacuum gap.

use crate::crystolecule::crystal::Crystal;
use crate::crystolecule::error::ModelError;
use crate::crystolecule::lattice::Lattice;
use crate::util::mat_utils::{gcd3, wrap_unit};
use glam::f64::DVec3;
use glam::i32::IVec3;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Search range for in-plane lattice vector coefficients.
const IN_PLANE_SEARCH: i32 = 4;
const MIN_REPEAT: i32 = 2;
const MAX_REPEAT: i32 = 8;
/// Fractional tolerance for duplicate detection.
const DEDUP_TOLERANCE: f64 = 1e-3;
const Z_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlabParameters {
    pub miller: IVec3,
    pub layers: usize,
    /// Vacuum thickness in Å
    pub vacuum: f64,
    /// Put half of the vacuum below the slab
    pub centered: bool,
}

/// Informational metadata describing how a slab was cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlabInfo {
    /// Miller indices after GCD reduction
    pub miller: [i32; 3],
    pub d_spacing: f64,
    pub layers: usize,
    pub vacuum: f64,
    pub atom_count: usize,
    pub centered: bool,
}

#[derive(Debug, Clone)]
pub struct Slab {
    pub crystal: Crystal,
    pub info: SlabInfo,
}

#[derive(Debug, Clone, Copy)]
struct Replica {
    atomic_number: i16,
    position: DVec3,
    height: f64,
}

/// Cuts a slab of `layers` atomic layers parallel to the (h k l) plane out of `crystal`.
///
/// # Errors
/// * `ZeroMillerIndices` for (0 0 0)
/// * `NoInPlaneVectors` if no two independent lattice vectors lie in the plane
/// * `InsufficientLayers` if the stacked planes hold fewer layers than requested
pub fn generate_slab(crystal: &Crystal, params: &SlabParameters) -> Result<Slab, ModelError> {
    if params.layers == 0 {
        return Err(ModelError::InvalidArgument("layer count must be at least 1".to_string()));
    }
    if !(params.vacuum.is_finite() && params.vacuum >= 0.0) {
        return Err(ModelError::InvalidArgument(format!(
            "vacuum must be non-negative, got {}",
            params.vacuum
        )));
    }
    let lattice = crystal.require_lattice()?;

    let divisor = gcd3(params.miller.x, params.miller.y, params.miller.z);
    if divisor == 0 {
        return Err(ModelError::ZeroMillerIndices);
    }
    let miller = params.miller / divisor;
    let plane = lattice.miller_plane_props(miller)?;
    let normal = plane.normal;
    let d_spacing = plane.d_spacing;

    let (new_a, new_b) = in_plane_vectors(lattice, miller, normal)?;
    debug!(
        "slab ({} {} {}): in-plane vectors {:?} {:?}, d = {:.4}",
        miller.x, miller.y, miller.z, new_a, new_b, d_spacing
    );

    let mut replicas = replicate(crystal, lattice, miller, params.layers, normal, d_spacing)?;
    replicas.sort_by(|r1, r2| r1.height.total_cmp(&r2.height));

    let tolerance = (0.04 * d_spacing).max(0.02);
    let (layer_heights, layer_of) = group_layers(&replicas, tolerance);
    if layer_heights.len() < params.layers {
        return Err(ModelError::InsufficientLayers {
            found: layer_heights.len(),
            requested: params.layers,
        });
    }

    let z0 = layer_heights[0];
    let slab_height = slab_height(&layer_heights, params.layers, d_spacing);
    let total_c = slab_height + params.vacuum;
    if total_c <= Z_TOLERANCE {
        return Err(ModelError::DegenerateLattice(
            "slab thickness plus vacuum is zero".to_string(),
        ));
    }
    let slab_lattice = Lattice::from_vectors(new_a, new_b, normal * total_c)?;
    let z_shift = if params.centered {
        params.vacuum / (2.0 * total_c)
    } else {
        0.0
    };

    let mut kept: Vec<(i16, DVec3)> = Vec::new();
    for (replica, &layer) in replicas.iter().zip(&layer_of) {
        if layer >= params.layers {
            continue;
        }
        let shifted = replica.position - normal * z0;
        let frac = slab_lattice.cart_to_frac(shifted);
        if frac.z < -Z_TOLERANCE || frac.z > 1.0 + Z_TOLERANCE {
            continue;
        }
        let frac = DVec3::new(wrap_unit(frac.x), wrap_unit(frac.y), frac.z.max(0.0));
        let duplicate = kept
            .iter()
            .any(|(z, f)| *z == replica.atomic_number && same_site(*f, frac));
        if !duplicate {
            kept.push((replica.atomic_number, frac));
        }
    }

    let name = format!(
        "{}_slab_{}{}{}",
        crystal.name(),
        miller.x,
        miller.y,
        miller.z
    );
    let mut slab = Crystal::new(name, slab_lattice);
    for (atomic_number, frac) in &kept {
        slab.add_atom_fractional(*atomic_number, *frac + DVec3::new(0.0, 0.0, z_shift))?;
    }

    let info = SlabInfo {
        miller: miller.to_array(),
        d_spacing,
        layers: params.layers,
        vacuum: params.vacuum,
        atom_count: kept.len(),
        centered: params.centered,
    };
    info!(
        "generated ({} {} {}) slab: {} layers, {} atoms, c = {:.4}",
        miller.x, miller.y, miller.z, params.layers, info.atom_count, total_c
    );
    Ok(Slab {
        crystal: slab,
        info,
    })
}

/// Shortest lattice vector in the plane, then the next shortest that is not parallel to it,
/// ordered so that `(a × b) · n̂ > 0`.
fn in_plane_vectors(lattice: &Lattice, miller: IVec3, normal: DVec3) -> Result<(DVec3, DVec3), ModelError> {
    let mut candidates: Vec<(IVec3, DVec3)> = Vec::new();
    for i in -IN_PLANE_SEARCH..=IN_PLANE_SEARCH {
        for j in -IN_PLANE_SEARCH..=IN_PLANE_SEARCH {
            for m in -IN_PLANE_SEARCH..=IN_PLANE_SEARCH {
                let coefficients = IVec3::new(i, j, m);
                if coefficients == IVec3::ZERO || coefficients.dot(miller) != 0 {
                    continue;
                }
                let vector = lattice.translation(coefficients);
                if vector.length() > 1e-6 {
                    candidates.push((coefficients, vector));
                }
            }
        }
    }

    // Ties in length prefer non-negative coefficients, then fewer non-zero ones, then the
    // lexicographically larger triple, so that e.g. (001) of a cubic cell yields +a, +b.
    candidates.sort_by_key(|(coefficients, vector)| {
        let values = coefficients.to_array();
        (
            (vector.length() * 1e6).round() as i64,
            values.iter().filter(|v| **v < 0).count(),
            values.iter().filter(|v| **v != 0).count(),
            Reverse(values),
        )
    });

    let no_pair = || ModelError::NoInPlaneVectors {
        h: miller.x,
        k: miller.y,
        l: miller.z,
    };
    let (_, new_a) = *candidates.first().ok_or_else(no_pair)?;
    let new_b = candidates
        .iter()
        .skip(1)
        .map(|(_, v)| *v)
        .find(|v| new_a.cross(*v).dot(normal).abs() > 1e-6 * new_a.length() * v.length())
        .ok_or_else(no_pair)?;

    if new_a.cross(new_b).dot(normal) < 0.0 {
        Ok((new_b, new_a))
    } else {
        Ok((new_a, new_b))
    }
}

/// Stacking levels generated below the layer cut: `L + 2`, clamped to [2, 8].
fn level_count(layers: usize) -> i32 {
    (layers as i64 + 2).clamp(MIN_REPEAT as i64, MAX_REPEAT as i64) as i32
}

/// Shortest lattice translation that climbs exactly one plane spacing along the normal,
/// i.e. whose coefficients `t` satisfy `t · (h k l) = 1`.
fn stacking_vector(lattice: &Lattice, miller: IVec3) -> Result<DVec3, ModelError> {
    let range = miller.abs().max_element() + 1;
    let mut best: Option<(i64, IVec3, DVec3)> = None;
    for i in -range..=range {
        for j in -range..=range {
            for m in -range..=range {
                let coefficients = IVec3::new(i, j, m);
                if coefficients.dot(miller) != 1 {
                    continue;
                }
                let vector = lattice.translation(coefficients);
                let key = (vector.length() * 1e6).round() as i64;
                let shorter = match &best {
                    Some((best_key, best_coefficients, _)) => {
                        (key, Reverse(coefficients.to_array()))
                            < (*best_key, Reverse(best_coefficients.to_array()))
                    }
                    None => true,
                };
                if shorter {
                    best = Some((key, coefficients, vector));
                }
            }
        }
    }
    best.map(|(_, _, vector)| vector).ok_or_else(|| {
        ModelError::DegenerateLattice(format!(
            "no lattice translation between adjacent ({} {} {}) planes",
            miller.x, miller.y, miller.z
        ))
    })
}

/// Places every home-cell atom on each stacking level. Each atom is first brought into the
/// lowest period `[0, d)` so that level `n` holds the complete plane family at height `n·d`.
fn replicate(
    crystal: &Crystal,
    lattice: &Lattice,
    miller: IVec3,
    layers: usize,
    normal: DVec3,
    d_spacing: f64,
) -> Result<Vec<Replica>, ModelError> {
    let step = stacking_vector(lattice, miller)?;
    let levels = level_count(layers);

    let mut replicas = Vec::new();
    for (id, frac) in crystal.fractional_coordinates()? {
        let atomic_number = crystal.structure().atom(id)?.atomic_number;
        let home = lattice.frac_to_cart(frac);
        let period = (home.dot(normal) / d_spacing + Z_TOLERANCE).floor();
        let base = home - step * period;
        for level in 0..levels {
            let position = base + step * level as f64;
            replicas.push(Replica {
                atomic_number,
                position,
                height: position.dot(normal),
            });
        }
    }
    Ok(replicas)
}

/// Groups heights (sorted ascending) into layers. Returns each layer's lowest height and, per
/// replica, its layer index.
fn group_layers(replicas: &[Replica], tolerance: f64) -> (Vec<f64>, Vec<usize>) {
    let mut layer_heights: Vec<f64> = Vec::new();
    let mut layer_of = Vec::with_capacity(replicas.len());
    for replica in replicas {
        match layer_heights.last() {
            Some(&start) if replica.height - start <= tolerance => {}
            _ => layer_heights.push(replica.height),
        }
        layer_of.push(layer_heights.len() - 1);
    }
    (layer_heights, layer_of)
}

/// Thickness of `layers` layers including the gap up to the next layer, so that a slab without
/// vacuum is periodic along c.
fn slab_height(layer_heights: &[f64], layers: usize, d_spacing: f64) -> f64 {
    let z0 = layer_heights[0];
    if let Some(next) = layer_heights.get(layers) {
        next - z0
    } else if layers > 1 {
        (layer_heights[layers - 1] - z0) * layers as f64 / (layers - 1) as f64
    } else {
        d_spacing
    }
}

fn same_site(f1: DVec3, f2: DVec3) -> bool {
    let periodic = |a: f64, b: f64| {
        let delta = (a - b).abs();
        delta.min(1.0 - delta) <= DEDUP_TOLERANCE
    };
    periodic(f1.x, f2.x) && periodic(f1.y, f2.y) && (f1.z - f2.z).abs() <= DEDUP_TOLERANCE
}

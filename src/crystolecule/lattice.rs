// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::crystolecule::error::ModelError;
use glam::f64::{DMat3, DVec3};
use glam::i32::IVec3;
use serde::{Deserialize, Serialize};

/// Below this |sin γ| or |det| a cell is considered degenerate.
const DEGENERACY_EPSILON: f64 = 1e-10;

/// Conventional cell parameters: lengths in Ångström, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticeParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl LatticeParameters {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
    }

    pub fn cubic(a: f64) -> Self {
        Self::new(a, a, a, 90.0, 90.0, 90.0)
    }
}

/// Properties of a crystal plane defined by Miller indices
#[derive(Debug, Clone, Copy)]
pub struct CrystalPlaneProps {
    /// The reciprocal lattice vector G = h*a* + k*b* + l*c* (no 2π factor)
    pub reciprocal_vector: DVec3,
    /// Normalized normal vector of the crystal plane in real space coordinates
    pub normal: DVec3,
    /// d-spacing (interplanar spacing) for this Miller index in real space units
    pub d_spacing: f64,
}

/// A periodic cell: three basis vectors and the matching conventional parameters.
///
/// A `Lattice` can only be constructed from a non-degenerate basis, so conversions between
/// fractional and Cartesian coordinates never fail once a value exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    a: DVec3,
    b: DVec3,
    c: DVec3,
    parameters: LatticeParameters,
    // Rows of the inverse of [a | b | c], i.e. the reciprocal basis a*, b*, c*
    reciprocal: [DVec3; 3],
}

impl Lattice {
    /// Builds the basis with the crystallographic convention: a along x, b in the xy-plane and c
    /// completing the cell so that all lengths and angles match.
    ///
    /// # Errors
    /// * `DegenerateLattice` if a length is not positive, an angle is outside (0, 180), sin γ is
    ///   zero, or the parameters admit no real c vector (c_z² < 0).
    pub fn from_parameters(parameters: LatticeParameters) -> Result<Self, ModelError> {
        let LatticeParameters {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        } = parameters;

        for (label, length) in [("a", a), ("b", b), ("c", c)] {
            if !(length.is_finite() && length > 0.0) {
                return Err(ModelError::DegenerateLattice(format!(
                    "cell length {} = {} must be positive",
                    label, length
                )));
            }
        }
        for (label, angle) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if !(angle.is_finite() && angle > 0.0 && angle < 180.0) {
                return Err(ModelError::DegenerateLattice(format!(
                    "cell angle {} = {} must lie in (0, 180)",
                    label, angle
                )));
            }
        }

        let (cos_alpha, cos_beta) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();
        if sin_gamma.abs() < DEGENERACY_EPSILON {
            return Err(ModelError::DegenerateLattice("sin(gamma) is zero".to_string()));
        }

        let vec_a = DVec3::new(a, 0.0, 0.0);
        let vec_b = DVec3::new(b * cos_gamma, b * sin_gamma, 0.0);

        let cx = c * cos_beta;
        let cy = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let cz_squared = c * c - cx * cx - cy * cy;
        if cz_squared <= DEGENERACY_EPSILON {
            return Err(ModelError::DegenerateLattice(format!(
                "angles ({}, {}, {}) do not form a cell",
                alpha, beta, gamma
            )));
        }
        let vec_c = DVec3::new(cx, cy, cz_squared.sqrt());

        let reciprocal = Self::reciprocal_basis(vec_a, vec_b, vec_c)?;
        Ok(Self {
            a: vec_a,
            b: vec_b,
            c: vec_c,
            parameters,
            reciprocal,
        })
    }

    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Result<Self, ModelError> {
        Self::from_parameters(LatticeParameters::new(a, b, c, alpha, beta, gamma))
    }

    pub fn cubic(a: f64) -> Result<Self, ModelError> {
        Self::from_parameters(LatticeParameters::cubic(a))
    }

    /// Inverse construction from three Cartesian vectors. The vectors are kept as given (no
    /// reorientation); the parameters are derived from them.
    ///
    /// # Errors
    /// * `DegenerateLattice` for a zero-length vector
    /// * `SingularMatrix` if the vectors are coplanar
    pub fn from_vectors(a: DVec3, b: DVec3, c: DVec3) -> Result<Self, ModelError> {
        let (len_a, len_b, len_c) = (a.length(), b.length(), c.length());
        if !(len_a > 0.0 && len_b > 0.0 && len_c > 0.0) || !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return Err(ModelError::DegenerateLattice(
                "lattice vectors must be finite and non-zero".to_string(),
            ));
        }

        let angle = |u: DVec3, v: DVec3, lu: f64, lv: f64| -> f64 {
            (u.dot(v) / (lu * lv)).clamp(-1.0, 1.0).acos().to_degrees()
        };
        let parameters = LatticeParameters {
            a: len_a,
            b: len_b,
            c: len_c,
            alpha: angle(b, c, len_b, len_c),
            beta: angle(a, c, len_a, len_c),
            gamma: angle(a, b, len_a, len_b),
        };

        let reciprocal = Self::reciprocal_basis(a, b, c)?;
        Ok(Self {
            a,
            b,
            c,
            parameters,
            reciprocal,
        })
    }

    /// Basis and parameters exactly as recorded, e.g. in a snapshot.
    pub(crate) fn from_recorded(
        a: DVec3,
        b: DVec3,
        c: DVec3,
        parameters: LatticeParameters,
    ) -> Result<Self, ModelError> {
        let mut lattice = Self::from_vectors(a, b, c)?;
        lattice.parameters = parameters;
        Ok(lattice)
    }

    // Inverse of [a, b, c] by Cramer's rule: (1/det) * [b×c, c×a, a×b]^T
    fn reciprocal_basis(a: DVec3, b: DVec3, c: DVec3) -> Result<[DVec3; 3], ModelError> {
        let det = a.dot(b.cross(c));
        let scale = a.length() * b.length() * c.length();
        if !det.is_finite() || det.abs() < DEGENERACY_EPSILON * scale.max(1.0) {
            return Err(ModelError::SingularMatrix);
        }
        let inv_det = 1.0 / det;
        Ok([
            b.cross(c) * inv_det,
            c.cross(a) * inv_det,
            a.cross(b) * inv_det,
        ])
    }

    /// (a⃗, b⃗, c⃗)
    pub fn vectors(&self) -> (DVec3, DVec3, DVec3) {
        (self.a, self.b, self.c)
    }

    /// Returns a basis vector by its index (0 = a, 1 = b, 2 = c).
    pub fn basis_vector(&self, index: usize) -> DVec3 {
        match index {
            0 => self.a,
            1 => self.b,
            _ => self.c,
        }
    }

    pub fn parameters(&self) -> LatticeParameters {
        self.parameters
    }

    /// The matrix with columns (a⃗, b⃗, c⃗).
    pub fn matrix(&self) -> DMat3 {
        DMat3::from_cols(self.a, self.b, self.c)
    }

    /// Reciprocal basis (a*, b*, c*) without the 2π factor.
    pub fn reciprocal_vectors(&self) -> (DVec3, DVec3, DVec3) {
        (self.reciprocal[0], self.reciprocal[1], self.reciprocal[2])
    }

    /// f_x·a⃗ + f_y·b⃗ + f_z·c⃗
    pub fn frac_to_cart(&self, frac: DVec3) -> DVec3 {
        frac.x * self.a + frac.y * self.b + frac.z * self.c
    }

    /// M⁻¹·p where M has columns (a⃗, b⃗, c⃗).
    pub fn cart_to_frac(&self, cart: DVec3) -> DVec3 {
        DVec3::new(
            self.reciprocal[0].dot(cart),
            self.reciprocal[1].dot(cart),
            self.reciprocal[2].dot(cart),
        )
    }

    pub fn volume(&self) -> f64 {
        self.a.dot(self.b.cross(self.c)).abs()
    }

    /// Shortest representative of `displacement` modulo lattice translations.
    ///
    /// Each fractional component is reduced with `f - floor(f + 0.5)`, which maps every integer
    /// shift of the input onto the same result.
    pub fn minimum_image(&self, displacement: DVec3) -> DVec3 {
        let frac = self.cart_to_frac(displacement);
        let reduced = frac - (frac + DVec3::splat(0.5)).floor();
        self.frac_to_cart(reduced)
    }

    /// Cartesian translation of the lattice vector with integer coefficients `cell`.
    pub fn translation(&self, cell: IVec3) -> DVec3 {
        self.frac_to_cart(cell.as_dvec3())
    }

    /// Converts Miller indices to crystal plane properties (normal and d-spacing).
    ///
    /// The reciprocal lattice vector is G = h*a* + k*b* + l*c* with
    /// a* = (b × c) / V, b* = (c × a) / V, c* = (a × b) / V and V = a · (b × c).
    /// The surface normal is G / |G| and the interplanar spacing is d = 1 / |G|.
    ///
    /// # Errors
    /// * `ZeroMillerIndices` if h = k = l = 0
    pub fn miller_plane_props(&self, miller_indices: IVec3) -> Result<CrystalPlaneProps, ModelError> {
        if miller_indices == IVec3::ZERO {
            return Err(ModelError::ZeroMillerIndices);
        }
        let m = miller_indices.as_dvec3();
        let reciprocal_vector =
            m.x * self.reciprocal[0] + m.y * self.reciprocal[1] + m.z * self.reciprocal[2];
        let length = reciprocal_vector.length();

        Ok(CrystalPlaneProps {
            reciprocal_vector,
            normal: reciprocal_vector / length,
            d_spacing: 1.0 / length,
        })
    }

    /// Compares two lattices with tolerance for small calculation errors.
    pub fn is_approximately_equal(&self, other: &Lattice) -> bool {
        const EPSILON: f64 = 1e-5;

        (self.a - other.a).length() < EPSILON
            && (self.b - other.b).length() < EPSILON
            && (self.c - other.c).length() < EPSILON
    }
}

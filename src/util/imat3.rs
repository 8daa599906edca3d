// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use glam::{DMat3, IVec3};
use serde::{Deserialize, Serialize};

/// A 3x3 integer matrix in row form, used for supercell transformations.
///
/// Row `i` holds the integer coefficients of new lattice vector `i` in terms of the old ones:
/// `new_i = rows[i].x * a + rows[i].y * b + rows[i].z * c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IMat3 {
    pub rows: [[i32; 3]; 3],
}

impl IMat3 {
    pub fn from_rows(rows: [[i32; 3]; 3]) -> Self {
        Self { rows }
    }

    pub fn identity() -> Self {
        Self::diagonal(1, 1, 1)
    }

    pub fn diagonal(na: i32, nb: i32, nc: i32) -> Self {
        Self {
            rows: [[na, 0, 0], [0, nb, 0], [0, 0, nc]],
        }
    }

    pub fn row(&self, index: usize) -> IVec3 {
        IVec3::from_array(self.rows[index])
    }

    pub fn determinant(&self) -> i64 {
        let m = self.rows.map(|row| row.map(i64::from));
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// True when every off-diagonal entry is zero.
    pub fn is_diagonal(&self) -> bool {
        (0..3).all(|i| (0..3).all(|j| i == j || self.rows[i][j] == 0))
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> i32 {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .map(|v| v.abs())
            .max()
            .unwrap_or(0)
    }

    /// The transpose as a real matrix.  glam matrices are column-major, so the rows of `self`
    /// become the columns of the result.
    pub fn transpose_as_dmat3(&self) -> DMat3 {
        DMat3::from_cols(
            self.row(0).as_dvec3(),
            self.row(1).as_dvec3(),
            self.row(2).as_dvec3(),
        )
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use glam::f64::DVec3;

/// Reduces a fractional coordinate into `[0, 1)`.
pub fn wrap_unit(value: f64) -> f64 {
    let wrapped = ((value % 1.0) + 1.0) % 1.0;
    // ((-tiny % 1) + 1) can round up to exactly 1.0 before the final modulo; guard the other side.
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

pub fn wrap_unit_dvec3(value: DVec3) -> DVec3 {
    DVec3::new(wrap_unit(value.x), wrap_unit(value.y), wrap_unit(value.z))
}

pub fn gcd(a: i32, b: i32) -> i32 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

pub fn gcd3(a: i32, b: i32, c: i32) -> i32 {
    gcd(gcd(a, b), c)
}

/// Returns a unit vector perpendicular to `v` (which must be non-zero).
pub fn arbitrary_perpendicular(v: DVec3) -> DVec3 {
    let arb = if v.normalize().x.abs() < 0.9 {
        DVec3::X
    } else {
        DVec3::Y
    };
    v.cross(arb).normalize()
}

// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use glam::f64::{DQuat, DVec3};

/// Rigid transform: rotation followed by translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: DVec3,
    pub rotation: DQuat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    pub fn new(translation: DVec3, rotation: DQuat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn from_translation(translation: DVec3) -> Self {
        Self::new(translation, DQuat::IDENTITY)
    }

    /// Creates a transform that rotates around `pivot_point`.
    ///
    /// For a point x this gives `P + R * (x - P) = (P - R*P) + R*x`, so the translation part is
    /// `P - R*P`.
    pub fn new_rotation_around_point(pivot_point: DVec3, rotation: DQuat) -> Self {
        let final_translation = pivot_point - rotation.mul_vec3(pivot_point);
        Self {
            translation: final_translation,
            rotation,
        }
    }

    /// Rotation by `angle_rad` around the line through `pivot_point` along `axis`.
    /// `axis` must be normalized.
    pub fn new_axis_rotation(pivot_point: DVec3, axis: DVec3, angle_rad: f64) -> Self {
        Self::new_rotation_around_point(pivot_point, DQuat::from_axis_angle(axis, angle_rad))
    }

    pub fn apply_to_position(&self, position: &DVec3) -> DVec3 {
        self.rotation.mul_vec3(*position) + self.translation
    }

    /// For unit quaternions the conjugate is the inverse.
    pub fn inverse(&self) -> Transform {
        let inv_rotation = self.rotation.conjugate();
        let inv_translation = -(inv_rotation.mul_vec3(self.translation));
        Transform {
            translation: inv_translation,
            rotation: inv_rotation,
        }
    }

    /// `self` applied after `other`.
    pub fn then_after(&self, other: &Transform) -> Transform {
        Transform {
            translation: self.rotation.mul_vec3(other.translation) + self.translation,
            rotation: self.rotation * other.rotation,
        }
    }
}

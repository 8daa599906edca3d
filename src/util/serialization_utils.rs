// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use glam::f64::DVec3;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serializes `DVec3` as a `[x, y, z]` array.
pub mod dvec3_serializer {
    use super::*;

    pub fn serialize<S>(vec: &DVec3, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (vec.x, vec.y, vec.z).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DVec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (x, y, z) = <(f64, f64, f64)>::deserialize(deserializer)?;
        Ok(DVec3::new(x, y, z))
    }
}

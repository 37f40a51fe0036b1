//! Pose representation shared by vehicles and props

use nalgebra::{UnitQuaternion, Vector3};
use serde::Serialize;

/// Position plus orientation of a scene entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    /// World position
    pub position: Vector3<f64>,

    /// Unit orientation quaternion
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Position at `position` with identity orientation
    pub fn at(position: [f64; 3]) -> Self {
        Self::new(Vector3::from(position), UnitQuaternion::identity())
    }

    /// Orientation in scalar-last order `[x, y, z, w]`
    pub fn quat_xyzw(&self) -> [f64; 4] {
        let q = self.orientation.quaternion();
        [q.i, q.j, q.k, q.w]
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at([0.0, 0.0, 0.0])
    }
}

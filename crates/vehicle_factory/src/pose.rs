//! Pose resolution
//!
//! Vehicles are placed with intrinsic X-Y-Z Euler angles in degrees,
//! `q = qx(a) * qy(b) * qz(c)`. Props follow the engine's extrinsic X-Y-Z
//! convention, `R = Rz(c) * Ry(b) * Rx(a)`.

use contracts::Pose;
use nalgebra::{Unit, UnitQuaternion, Vector3};

/// Stateless Euler to quaternion resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseResolver;

impl PoseResolver {
    /// Vehicle pose from position and intrinsic X-Y-Z rotation (deg)
    pub fn resolve(position: [f64; 3], rotation_deg: [f64; 3]) -> Pose {
        Pose::new(Vector3::from(position), Self::orientation(rotation_deg))
    }

    /// Prop pose from position and extrinsic X-Y-Z rotation (deg)
    pub fn resolve_extrinsic(position: [f64; 3], rotation_deg: [f64; 3]) -> Pose {
        Pose::new(
            Vector3::from(position),
            Self::orientation_extrinsic(rotation_deg),
        )
    }

    pub fn orientation(rotation_deg: [f64; 3]) -> UnitQuaternion<f64> {
        let [a, b, c] = rotation_deg.map(f64::to_radians);
        axis_angle(Vector3::x_axis(), a)
            * axis_angle(Vector3::y_axis(), b)
            * axis_angle(Vector3::z_axis(), c)
    }

    pub fn orientation_extrinsic(rotation_deg: [f64; 3]) -> UnitQuaternion<f64> {
        let [a, b, c] = rotation_deg.map(f64::to_radians);
        UnitQuaternion::from_euler_angles(a, b, c)
    }

    /// Intrinsic X-Y-Z angles (deg) of `orientation`
    ///
    /// First and third angles land in (-180, 180], the second in [-90, 90].
    /// At gimbal lock the third angle is reported as zero.
    pub fn to_euler_deg(orientation: &UnitQuaternion<f64>) -> [f64; 3] {
        let rotation = orientation.to_rotation_matrix();
        let m = rotation.matrix();

        let sin_b = m[(0, 2)].clamp(-1.0, 1.0);
        let b = sin_b.asin();

        let (a, c) = if sin_b.abs() < 1.0 - 1e-9 {
            (
                (-m[(1, 2)]).atan2(m[(2, 2)]),
                (-m[(0, 1)]).atan2(m[(0, 0)]),
            )
        } else {
            (m[(2, 1)].atan2(m[(1, 1)]), 0.0)
        };

        [a.to_degrees(), b.to_degrees(), c.to_degrees()]
    }
}

fn axis_angle(axis: Unit<Vector3<f64>>, angle: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&axis, angle)
}

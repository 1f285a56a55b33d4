//! Camera pose utilities
//!
//! Poses arrive as a position plus an `[x, y, z, w]` quaternion. The quaternion
//! is never trusted to be unit length: it is renormalized on every use, and a
//! zero (or non-finite) quaternion means "no rotation".

use crate::transform::Transform3D;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Convert an `[x, y, z, w]` quaternion into a 3x3 rotation matrix.
pub fn quaternion_to_rotation(quat: [f32; 4]) -> Matrix3<f32> {
    let [qx, qy, qz, qw] = quat;
    let norm = (qx * qx + qy * qy + qz * qz + qw * qw).sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Matrix3::identity();
    }
    let (qx, qy, qz, qw) = (qx / norm, qy / norm, qz / norm, qw / norm);

    let (xx, yy, zz) = (qx * qx, qy * qy, qz * qz);
    let (xy, xz, yz) = (qx * qy, qx * qz, qy * qz);
    let (wx, wy, wz) = (qw * qx, qw * qy, qw * qz);

    Matrix3::new(
        1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy),
        2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx),
        2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy),
    )
}

/// Camera position (meters) and optional orientation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f32; 3],
    pub rotation: Option<[f32; 4]>,
}

impl Pose {
    pub fn new(position: [f32; 3], rotation: Option<[f32; 4]>) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// Rigid camera-to-world transform for this pose
    pub fn to_transform(&self) -> Transform3D {
        let rotation = self
            .rotation
            .map(quaternion_to_rotation)
            .unwrap_or_else(Matrix3::identity);
        Transform3D::from_rotation_matrix(Vector3::from(self.position), rotation)
    }
}

/// One timestamped sample of the device trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Time in seconds, or a frame index
    pub t: f32,
    pub position: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
}

impl TrajectoryPoint {
    pub fn new(t: f32, position: [f32; 3], rotation: Option<[f32; 4]>) -> Self {
        Self { t, position, rotation }
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }
}

/// Pose for frame `index`, identity when the trajectory is shorter than the frame list
pub fn pose_for_frame(trajectory: &[TrajectoryPoint], index: usize) -> Pose {
    trajectory
        .get(index)
        .map(TrajectoryPoint::pose)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_zero_quaternion_is_identity() {
        assert_eq!(quaternion_to_rotation([0.0, 0.0, 0.0, 0.0]), Matrix3::identity());
        assert_eq!(quaternion_to_rotation([f32::NAN, 0.0, 0.0, 1.0]), Matrix3::identity());
    }

    #[test]
    fn test_unnormalized_quaternion_is_renormalized() {
        // 90 degrees about Z, scaled by 3
        let s = std::f32::consts::FRAC_1_SQRT_2 * 3.0;
        let r = quaternion_to_rotation([0.0, 0.0, s, s]);
        let v = r * Vector3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_pose_transform_translates_and_rotates() {
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let pose = Pose::new([1.0, 2.0, 3.0], Some([0.0, half, 0.0, half]));
        let p = pose.to_transform().transform_point(&Point3::new(0.0, 0.0, 1.0));
        // +90 degrees about Y maps +Z to +X
        assert_relative_eq!(p.x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pose_for_frame_past_trajectory_end() {
        let trajectory = vec![TrajectoryPoint::new(0.0, [1.0, 0.0, 0.0], None)];
        assert_eq!(pose_for_frame(&trajectory, 0).position, [1.0, 0.0, 0.0]);
        assert_eq!(pose_for_frame(&trajectory, 5), Pose::identity());
        assert!(pose_for_frame(&trajectory, 5).to_transform().is_identity(1e-9));
    }
}

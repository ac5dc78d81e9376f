//! 3D transformation utilities

use nalgebra::{Isometry3, Matrix4, Point3, Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D transformation that can be applied to points and point clouds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Build a rigid transform from a translation and a `w, x, y, z` quaternion.
    ///
    /// The quaternion does not need to be normalized. A zero quaternion
    /// carries no orientation and is treated as the identity rotation.
    pub fn from_pose(translation: [f64; 3], quaternion_wxyz: [f64; 4]) -> Self {
        let [w, x, y, z] = quaternion_wxyz;
        let rotation = UnitQuaternion::try_new(Quaternion::new(w, x, y, z), f64::EPSILON)
            .unwrap_or_else(UnitQuaternion::identity);
        let t = Vector3::new(translation[0], translation[1], translation[2]);
        let isometry = Isometry3::from_parts(t.into(), rotation);
        Self {
            matrix: isometry.to_homogeneous().cast::<f32>(),
        }
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Compose this transformation with another (`other` is applied first)
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// This transformation followed by a world-space translation
    pub fn then_translate(self, offset: Vector3<f32>) -> Self {
        Self::translation(offset).compose(self)
    }

    /// Check if this is approximately the identity transformation
    pub fn is_identity(&self, epsilon: f32) -> bool {
        (self.matrix - Matrix4::identity()).norm() < epsilon
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_pose() {
        let t = Transform3D::from_pose([0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]);
        assert!(t.is_identity(1e-6));
    }

    #[test]
    fn test_pose_normalizes_quaternion() {
        // 90 degrees about Z, scaled by 2
        let half = std::f64::consts::FRAC_1_SQRT_2 * 2.0;
        let t = Transform3D::from_pose([1.0, 2.0, 3.0], [half, 0.0, 0.0, half]);
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));

        assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 3.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_quaternion_is_identity_rotation() {
        let t = Transform3D::from_pose([0.5, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0]);
        let p = t.transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p, Point3::new(1.5, 1.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_then_translate_applies_offset_after_pose() {
        let rot = Transform3D::from_pose([0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]);
        let moved = rot.then_translate(Vector3::new(0.0, 0.0, 10.0));
        let p = moved.transform_point(&Point3::new(0.0, 1.0, 1.0));

        // 180 degrees about X flips y and z, then the offset lifts z
        assert_relative_eq!(p, Point3::new(0.0, -1.0, 9.0), epsilon = 1e-5);
    }
}

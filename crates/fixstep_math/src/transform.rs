//! Rigid transform (rotation basis + origin)
//!
//! This is the value exchanged between the physics world and the renderer:
//! bodies store one, motion states publish one, and render passes turn one
//! into a column-major [`Mat4`] with [`Transform::to_matrix`].

use bytemuck::{Pod, Zeroable};
use serde::{Serialize, Deserialize};
use crate::mat3::{self, Mat3};
use crate::mat4::{self, Mat4};
use crate::{Quat, Vec3};

/// A rigid transform with a rotation basis and an origin
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Transform {
    /// Orthonormal rotation basis (column-major)
    pub basis: Mat3,
    /// Translation
    pub origin: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// No rotation, no translation
    pub const IDENTITY: Self = Self {
        basis: mat3::IDENTITY,
        origin: Vec3::ZERO,
    };

    /// Create a transform with just an origin
    pub fn from_origin(origin: Vec3) -> Self {
        Self {
            basis: mat3::IDENTITY,
            origin,
        }
    }

    /// Create a transform from a rotation and an origin
    pub fn from_rotation_origin(rotation: Quat, origin: Vec3) -> Self {
        Self {
            basis: rotation.to_mat3(),
            origin,
        }
    }

    /// Reset to identity in place
    pub fn set_identity(&mut self) -> &mut Self {
        *self = Self::IDENTITY;
        self
    }

    /// Replace the origin in place
    pub fn set_origin(&mut self, origin: Vec3) -> &mut Self {
        self.origin = origin;
        self
    }

    /// Rotation stored in the basis
    pub fn rotation(&self) -> Quat {
        Quat::from_mat3(&self.basis)
    }

    /// Transform a point from local space to world space
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        mat3::transform(&self.basis, p) + self.origin
    }

    /// Transform a direction from local space to world space
    pub fn transform_direction(&self, d: Vec3) -> Vec3 {
        mat3::transform(&self.basis, d)
    }

    /// Inverse of this rigid transform
    pub fn inverse(&self) -> Self {
        let basis = mat3::transpose(&self.basis);
        Self {
            basis,
            origin: -mat3::transform(&basis, self.origin),
        }
    }

    /// Compose two transforms: result = self * other
    ///
    /// The composed transform applies `other` first, then `self`.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            basis: mat3::mul(&self.basis, &other.basis),
            origin: self.transform_point(other.origin),
        }
    }

    /// Column-major 4x4 matrix, ready for a renderer's model matrix stack
    pub fn to_matrix(&self) -> Mat4 {
        mat4::from_basis_origin(&self.basis, self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 0.0001
    }

    #[test]
    fn test_identity() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Transform::IDENTITY.transform_point(p), p);
        assert_eq!(Transform::default(), Transform::IDENTITY);
    }

    #[test]
    fn test_set_identity_after_set_origin() {
        let mut t = Transform::from_origin(Vec3::new(5.0, 0.0, 0.0));
        t.set_identity().set_origin(Vec3::new(0.0, 0.0, 20.0));
        assert_eq!(t.origin, Vec3::new(0.0, 0.0, 20.0));
        assert_eq!(t.basis, mat3::IDENTITY);
    }

    #[test]
    fn test_inverse_undoes_transform() {
        let t = Transform::from_rotation_origin(
            Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 0.8),
            Vec3::new(3.0, -2.0, 7.0),
        );
        let p = Vec3::new(0.5, 4.0, -1.0);
        assert!(vec_approx_eq(t.inverse().transform_point(t.transform_point(p)), p));
    }

    #[test]
    fn test_compose_applies_other_first() {
        let rotate = Transform::from_rotation_origin(Quat::from_axis_angle(Vec3::Z, FRAC_PI_2), Vec3::ZERO);
        let shift = Transform::from_origin(Vec3::new(1.0, 0.0, 0.0));
        let composed = rotate.compose(&shift);
        assert!(vec_approx_eq(composed.transform_point(Vec3::ZERO), Vec3::Y));
    }

    #[test]
    fn test_matrix_matches_transform_point() {
        let t = Transform::from_rotation_origin(
            Quat::from_axis_angle(Vec3::new(0.0, 1.0, 1.0), 1.3),
            Vec3::new(-1.0, 2.0, 9.0),
        );
        let p = Vec3::new(2.0, 0.0, -3.0);
        let m = t.to_matrix();
        assert!(vec_approx_eq(mat4::transform_point(&m, p), t.transform_point(p)));
    }
}

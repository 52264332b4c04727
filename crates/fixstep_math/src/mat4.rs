//! 4x4 matrix utilities for render transforms
//!
//! Matrices are column-major, so a `Mat4` can be handed to a renderer that
//! expects OpenGL-style matrices without reordering.

use crate::mat3::Mat3;
use crate::Vec3;

/// 4x4 matrix type (column-major: `m[col][row]`)
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Translation matrix
pub fn translation(offset: Vec3) -> Mat4 {
    let mut m = IDENTITY;
    m[3][0] = offset.x;
    m[3][1] = offset.y;
    m[3][2] = offset.z;
    m
}

/// Rotation of `angle` radians around `axis`
///
/// A zero-length axis yields the identity.
pub fn axis_angle(axis: Vec3, angle: f32) -> Mat4 {
    let axis = axis.normalized();
    if axis == Vec3::ZERO {
        return IDENTITY;
    }

    let (sn, cs) = angle.sin_cos();
    let t = 1.0 - cs;
    let Vec3 { x, y, z } = axis;

    [
        [t * x * x + cs, t * x * y + sn * z, t * x * z - sn * y, 0.0],
        [t * x * y - sn * z, t * y * y + cs, t * y * z + sn * x, 0.0],
        [t * x * z + sn * y, t * y * z - sn * x, t * z * z + cs, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Build an affine matrix from a rotation basis and an origin
pub fn from_basis_origin(basis: &Mat3, origin: Vec3) -> Mat4 {
    [
        [basis[0][0], basis[0][1], basis[0][2], 0.0],
        [basis[1][0], basis[1][1], basis[1][2], 0.0],
        [basis[2][0], basis[2][1], basis[2][2], 0.0],
        [origin.x, origin.y, origin.z, 1.0],
    ]
}

/// Multiply two 4x4 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut result = [[0.0f32; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Transform a point (w = 1) by an affine matrix
pub fn transform_point(m: &Mat4, p: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * p.x + m[1][0] * p.y + m[2][0] * p.z + m[3][0],
        m[0][1] * p.x + m[1][1] * p.y + m[2][1] * p.z + m[3][1],
        m[0][2] * p.x + m[1][2] * p.y + m[2][2] * p.z + m[3][2],
    )
}

/// Transform a direction (w = 0) by an affine matrix
pub fn transform_direction(m: &Mat4, d: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * d.x + m[1][0] * d.y + m[2][0] * d.z,
        m[0][1] * d.x + m[1][1] * d.y + m[2][1] * d.z,
        m[0][2] * d.x + m[1][2] * d.y + m[2][2] * d.z,
    )
}

/// Flatten into 16 floats in column order
pub fn to_cols_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    for (col, values) in m.iter().enumerate() {
        out[col * 4..col * 4 + 4].copy_from_slice(values);
    }
    out
}

/// Transpose a matrix
pub fn transpose(m: &Mat4) -> Mat4 {
    [
        [m[0][0], m[1][0], m[2][0], m[3][0]],
        [m[0][1], m[1][1], m[2][1], m[3][1]],
        [m[0][2], m[1][2], m[2][2], m[3][2]],
        [m[0][3], m[1][3], m[2][3], m[3][3]],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 0.0001
    }

    #[test]
    fn test_translation_moves_points_not_directions() {
        let m = translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform_point(&m, Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform_direction(&m, Vec3::X), Vec3::X);
    }

    #[test]
    fn test_axis_angle_quarter_turn_about_z() {
        let m = axis_angle(Vec3::Z, FRAC_PI_2);
        assert!(vec_approx_eq(transform_point(&m, Vec3::X), Vec3::Y));
        assert!(vec_approx_eq(transform_point(&m, Vec3::Y), -Vec3::X));
    }

    #[test]
    fn test_axis_angle_zero_axis_is_identity() {
        assert_eq!(axis_angle(Vec3::ZERO, 1.0), IDENTITY);
    }

    #[test]
    fn test_mul_translate_after_rotate() {
        let r = axis_angle(Vec3::Z, FRAC_PI_2);
        let t = translation(Vec3::new(0.0, 0.0, 5.0));
        let m = mul(&t, &r);
        assert!(vec_approx_eq(transform_point(&m, Vec3::X), Vec3::new(0.0, 1.0, 5.0)));
    }

    #[test]
    fn test_cols_array_layout() {
        let m = translation(Vec3::new(7.0, 8.0, 9.0));
        let flat = to_cols_array(&m);
        assert_eq!(&flat[12..15], &[7.0, 8.0, 9.0]);
        assert_eq!(flat[15], 1.0);
        assert_eq!(transpose(&transpose(&m)), m);
    }
}

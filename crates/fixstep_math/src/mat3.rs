//! 3x3 matrix utilities for rotation bases

use crate::Vec3;

/// 3x3 matrix type (column-major: `m[col][row]`)
pub type Mat3 = [[f32; 3]; 3];

/// Identity matrix
pub const IDENTITY: Mat3 = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Multiply two 3x3 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut result = [[0.0f32; 3]; 3];

    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Transform a vector: result = M * v
pub fn transform(m: &Mat3, v: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z,
        m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z,
        m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z,
    )
}

/// Transpose (the inverse of an orthonormal basis)
pub fn transpose(m: &Mat3) -> Mat3 {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// Get a column vector from a matrix
pub fn get_column(m: &Mat3, col: usize) -> Vec3 {
    Vec3::new(m[col][0], m[col][1], m[col][2])
}

/// Diagonal matrix from a vector
pub fn from_diagonal(d: Vec3) -> Mat3 {
    [
        [d.x, 0.0, 0.0],
        [0.0, d.y, 0.0],
        [0.0, 0.0, d.z],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Quat;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 0.0001
    }

    #[test]
    fn test_identity_transform() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(transform(&IDENTITY, v), v);
    }

    #[test]
    fn test_transpose_inverts_rotation() {
        let r = Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0), 1.1).to_mat3();
        let v = Vec3::new(-4.0, 0.5, 2.0);
        let back = transform(&transpose(&r), transform(&r, v));
        assert!(vec_approx_eq(back, v));
    }

    #[test]
    fn test_mul_applies_right_first() {
        let scale = from_diagonal(Vec3::new(2.0, 1.0, 1.0));
        let quarter = Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_2).to_mat3();
        // Scale X first, then rotate X onto Y
        let m = mul(&quarter, &scale);
        assert!(vec_approx_eq(transform(&m, Vec3::X), Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn test_get_column() {
        assert_eq!(get_column(&IDENTITY, 1), Vec3::Y);
    }
}

//! CPU-side mesh data
//!
//! A [`Mesh`] is an interleaved float vertex buffer with optional 16-bit
//! indices. Every layout starts with the position (three floats); the rest
//! of each vertex is opaque to the simulation.

use fixstep_math::Vec3;
use std::f32::consts::PI;

/// Floats per vertex for position + texture coordinates
pub const STRIDE_POSITION_UV: usize = 5;

/// Floats per vertex for position + normal + texture coordinates
pub const STRIDE_POSITION_NORMAL_UV: usize = 8;

/// Interleaved vertex data with optional indices
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// Interleaved vertex floats, `vertex_stride` per vertex
    pub vertices: Vec<f32>,
    /// Triangle indices; empty means vertices are used in order
    pub indices: Vec<u16>,
    /// Floats per vertex
    pub vertex_stride: usize,
}

impl Mesh {
    pub fn new(vertices: Vec<f32>, indices: Vec<u16>, vertex_stride: usize) -> Self {
        Self {
            vertices,
            indices,
            vertex_stride,
        }
    }

    /// Number of whole vertices in the buffer
    pub fn vertex_count(&self) -> usize {
        if self.vertex_stride == 0 {
            0
        } else {
            self.vertices.len() / self.vertex_stride
        }
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Position of vertex `index`, if it exists
    pub fn position(&self, index: usize) -> Option<Vec3> {
        let start = index.checked_mul(self.vertex_stride)?;
        let p = self.vertices.get(start..start + 3)?;
        Some(Vec3::new(p[0], p[1], p[2]))
    }

    /// Flat quad in the XY plane, centred on the origin, facing +Z
    ///
    /// Texture coordinates run from 0 to `width`/`height` so a repeating
    /// texture tiles once per unit.
    pub fn quad(width: f32, height: f32) -> Self {
        let (w, h) = (width / 2.0, height / 2.0);
        #[rustfmt::skip]
        let vertices = vec![
            -w, -h, 0.0, 0.0, 0.0,
             w, -h, 0.0, width, 0.0,
             w,  h, 0.0, width, height,
            -w,  h, 0.0, 0.0, height,
        ];
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3], STRIDE_POSITION_UV)
    }

    /// Box with the given half extents, one face per side
    pub fn cuboid(half_extents: Vec3) -> Self {
        let mut vertices = Vec::with_capacity(24 * STRIDE_POSITION_NORMAL_UV);
        let mut indices = Vec::with_capacity(36);

        // (normal, u axis, v axis) per face
        let faces = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (-Vec3::X, -Vec3::Y, Vec3::Z),
            (Vec3::Y, -Vec3::X, Vec3::Z),
            (-Vec3::Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, Vec3::X, -Vec3::Y),
        ];

        for (normal, u, v) in faces {
            let base = (vertices.len() / STRIDE_POSITION_NORMAL_UV) as u16;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (normal + u * su + v * sv).component_mul(half_extents);
                vertices.extend_from_slice(&[p.x, p.y, p.z, normal.x, normal.y, normal.z]);
                vertices.extend_from_slice(&[(su + 1.0) / 2.0, (sv + 1.0) / 2.0]);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(vertices, indices, STRIDE_POSITION_NORMAL_UV)
    }

    /// Latitude/longitude sphere
    pub fn sphere(radius: f32, segments: u16, rings: u16) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity(usize::from((segments + 1) * (rings + 1)) * STRIDE_POSITION_NORMAL_UV);
        let mut indices = Vec::with_capacity(usize::from(segments) * usize::from(rings) * 6);

        for ring in 0..=rings {
            let v = f32::from(ring) / f32::from(rings);
            let (sin_phi, cos_phi) = (v * PI).sin_cos();
            for segment in 0..=segments {
                let u = f32::from(segment) / f32::from(segments);
                let (sin_theta, cos_theta) = (u * 2.0 * PI).sin_cos();
                let n = Vec3::new(sin_phi * cos_theta, sin_phi * sin_theta, cos_phi);
                let p = n * radius;
                vertices.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z, u, v]);
            }
        }

        let row = segments + 1;
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * row + segment;
                let b = a + row;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }

        Self::new(vertices, indices, STRIDE_POSITION_NORMAL_UV)
    }

    /// Square height field of `cells × cells` quads centred on the origin
    ///
    /// `height(x, y)` gives the Z of each grid point. Normals point up; the
    /// terrain only needs them for lighting.
    pub fn height_field(cells: u16, cell_size: f32, height: impl Fn(f32, f32) -> f32) -> Self {
        let cells = cells.clamp(1, 254);
        let row = cells + 1;
        let half = f32::from(cells) * cell_size / 2.0;
        let mut vertices = Vec::with_capacity(usize::from(row) * usize::from(row) * STRIDE_POSITION_NORMAL_UV);
        let mut indices = Vec::with_capacity(usize::from(cells) * usize::from(cells) * 6);

        for j in 0..row {
            for i in 0..row {
                let x = f32::from(i) * cell_size - half;
                let y = f32::from(j) * cell_size - half;
                vertices.extend_from_slice(&[x, y, height(x, y), 0.0, 0.0, 1.0, f32::from(i), f32::from(j)]);
            }
        }

        for j in 0..cells {
            for i in 0..cells {
                let a = j * row + i;
                let b = a + row;
                indices.extend_from_slice(&[a, a + 1, b + 1, a, b + 1, b]);
            }
        }

        Self::new(vertices, indices, STRIDE_POSITION_NORMAL_UV)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_layout() {
        let quad = Mesh::quad(50.0, 20.0);
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.index_count(), 6);
        assert_eq!(quad.position(2), Some(Vec3::new(25.0, 10.0, 0.0)));
        assert_eq!(quad.position(4), None);
        // Texture repeats once per unit
        assert_eq!(quad.vertices[2 * STRIDE_POSITION_UV + 3], 50.0);
    }

    #[test]
    fn test_cuboid_vertices_on_surface() {
        let cube = Mesh::cuboid(Vec3::ONE);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        for i in 0..cube.vertex_count() {
            let p = cube.position(i).unwrap();
            assert_eq!(p.abs(), Vec3::ONE);
        }
    }

    #[test]
    fn test_sphere_vertices_at_radius() {
        let sphere = Mesh::sphere(2.0, 12, 6);
        assert!(sphere.is_indexed());
        for i in 0..sphere.vertex_count() {
            assert!((sphere.position(i).unwrap().length() - 2.0).abs() < 0.0001);
        }
        assert!(sphere.indices.iter().all(|&i| usize::from(i) < sphere.vertex_count()));
    }

    #[test]
    fn test_height_field_samples_heights() {
        let terrain = Mesh::height_field(4, 2.0, |x, y| x + y);
        assert_eq!(terrain.vertex_count(), 25);
        assert_eq!(terrain.index_count(), 4 * 4 * 6);
        assert_eq!(terrain.position(0), Some(Vec3::new(-4.0, -4.0, -8.0)));
    }
}

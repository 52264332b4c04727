//! Collision shapes
//!
//! Shapes are described in their local frame; a [`Transform`] places them in
//! the world. Static-only shapes (planes and triangle meshes) never move and
//! always report zero inertia.

use std::sync::Arc;

use fixstep_math::{mat3, Aabb, Transform, Vec3};

/// Half-size of the bounding box reported for infinite planes
const PLANE_EXTENT: f32 = 1.0e18;

/// Triangle soup used for static terrain
///
/// Vertices are stored unwelded, three per triangle. The mesh must outlive
/// every [`CollisionShape::TriangleMesh`] built from it, which sharing it
/// through an `Arc` guarantees.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    vertices: Vec<Vec3>,
    local_aabb: Aabb,
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl TriangleMesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            local_aabb: Aabb::EMPTY,
        }
    }

    /// Create an empty mesh with room for `triangles` triangles
    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(triangles * 3),
            local_aabb: Aabb::EMPTY,
        }
    }

    /// Append one triangle
    pub fn add_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        for v in [a, b, c] {
            self.local_aabb.extend(v);
            self.vertices.push(v);
        }
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Check whether the mesh has no triangles
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Get triangle `index` in local space
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        let base = index * 3;
        [self.vertices[base], self.vertices[base + 1], self.vertices[base + 2]]
    }

    /// Iterate over all triangles in local space
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.vertices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Bounding box of all vertices in local space
    pub fn local_aabb(&self) -> Aabb {
        self.local_aabb
    }
}

/// Shape of a collision object
#[derive(Clone, Debug)]
pub enum CollisionShape {
    /// Sphere centered on the body origin
    Sphere { radius: f32 },
    /// Box centered on the body origin
    Box { half_extents: Vec3 },
    /// Infinite plane `normal · p = constant` (static only)
    StaticPlane { normal: Vec3, constant: f32 },
    /// Triangle soup (static only)
    TriangleMesh(Arc<TriangleMesh>),
}

impl CollisionShape {
    /// Create a sphere shape
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box shape from its half extents
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Box { half_extents }
    }

    /// Create a static plane; the normal is normalized
    pub fn static_plane(normal: Vec3, constant: f32) -> Self {
        Self::StaticPlane {
            normal: normal.normalized(),
            constant,
        }
    }

    /// Create a static triangle mesh shape
    pub fn triangle_mesh(mesh: Arc<TriangleMesh>) -> Self {
        Self::TriangleMesh(mesh)
    }

    /// Short name used in log messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Box { .. } => "box",
            Self::StaticPlane { .. } => "static plane",
            Self::TriangleMesh(_) => "triangle mesh",
        }
    }

    /// Shapes that can only be used by static objects
    pub fn is_static_only(&self) -> bool {
        matches!(self, Self::StaticPlane { .. } | Self::TriangleMesh(_))
    }

    /// Diagonal of the inertia tensor for a body of the given mass
    pub fn calculate_local_inertia(&self, mass: f32) -> Vec3 {
        if mass == 0.0 {
            return Vec3::ZERO;
        }
        match self {
            Self::Sphere { radius } => {
                let i = 0.4 * mass * radius * radius;
                Vec3::new(i, i, i)
            }
            Self::Box { half_extents: h } => {
                let k = mass / 3.0;
                Vec3::new(
                    k * (h.y * h.y + h.z * h.z),
                    k * (h.x * h.x + h.z * h.z),
                    k * (h.x * h.x + h.y * h.y),
                )
            }
            Self::StaticPlane { .. } | Self::TriangleMesh(_) => Vec3::ZERO,
        }
    }

    /// Radius of a sphere around the shape origin enclosing the shape
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Self::Sphere { radius } => *radius,
            Self::Box { half_extents } => half_extents.length(),
            Self::StaticPlane { .. } => PLANE_EXTENT,
            Self::TriangleMesh(mesh) => {
                let b = mesh.local_aabb();
                if b.is_empty() {
                    0.0
                } else {
                    b.min.abs().max_components(b.max.abs()).length()
                }
            }
        }
    }

    /// World-space bounding box of the shape at `transform`
    pub fn aabb(&self, transform: &Transform) -> Aabb {
        match self {
            Self::Sphere { radius } => {
                Aabb::from_center_half_extents(transform.origin, Vec3::new(*radius, *radius, *radius))
            }
            Self::Box { half_extents } => {
                let b = &transform.basis;
                let abs_basis = [
                    mat3::get_column(b, 0).abs(),
                    mat3::get_column(b, 1).abs(),
                    mat3::get_column(b, 2).abs(),
                ];
                let extent = abs_basis[0] * half_extents.x
                    + abs_basis[1] * half_extents.y
                    + abs_basis[2] * half_extents.z;
                Aabb::from_center_half_extents(transform.origin, extent)
            }
            Self::StaticPlane { .. } => Aabb::from_center_half_extents(
                Vec3::ZERO,
                Vec3::new(PLANE_EXTENT, PLANE_EXTENT, PLANE_EXTENT),
            ),
            Self::TriangleMesh(mesh) => {
                let local = mesh.local_aabb();
                let mut out = Aabb::EMPTY;
                if local.is_empty() {
                    return Aabb::from_center_half_extents(transform.origin, Vec3::ZERO);
                }
                for i in 0..8 {
                    let corner = Vec3::new(
                        if i & 1 == 0 { local.min.x } else { local.max.x },
                        if i & 2 == 0 { local.min.y } else { local.max.y },
                        if i & 4 == 0 { local.min.z } else { local.max.z },
                    );
                    out.extend(transform.transform_point(corner));
                }
                out
            }
        }
    }
}

/// The eight corners of a box with the given half extents, in world space
pub(crate) fn box_corners(half_extents: Vec3, transform: &Transform) -> [Vec3; 8] {
    let mut corners = [Vec3::ZERO; 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        let local = Vec3::new(
            if i & 1 == 0 { -half_extents.x } else { half_extents.x },
            if i & 2 == 0 { -half_extents.y } else { half_extents.y },
            if i & 4 == 0 { -half_extents.z } else { half_extents.z },
        );
        *corner = transform.transform_point(local);
    }
    corners
}

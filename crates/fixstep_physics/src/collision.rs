//! Collision filtering and narrowphase contact generation
//!
//! Provides the group/mask filter used by the broadphase, the per-object
//! collision flags, and contact generation between pairs of shapes.

use bitflags::bitflags;

use crate::shapes::{box_corners, CollisionShape, TriangleMesh};
use fixstep_math::{mat3, Transform, Vec3};

bitflags! {
    /// Collision filter groups
    ///
    /// Each group is a bit in a 16-bit mask. Objects belong to one or more
    /// groups and list the groups they collide with in their mask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CollisionGroups: u16 {
        /// Default group for dynamic objects
        const DEFAULT = 1 << 0;
        /// Static world geometry
        const STATIC = 1 << 1;
        /// Kinematic (animated) objects
        const KINEMATIC = 1 << 2;
        /// Small debris that should not disturb anything
        const DEBRIS = 1 << 3;
        /// Sensors and triggers
        const SENSOR_TRIGGER = 1 << 4;
        /// Characters
        const CHARACTER = 1 << 5;
        /// All groups
        const ALL = 0xFFFF;
    }
}

bitflags! {
    /// Per-object collision flags
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CollisionFlags: u8 {
        /// Never moves; infinite mass in contact resolution
        const STATIC_OBJECT = 1 << 0;
        /// Moved by its motion state, not by the solver
        const KINEMATIC_OBJECT = 1 << 1;
        /// Generates contacts but receives no impulses
        const NO_CONTACT_RESPONSE = 1 << 2;
    }
}

/// Group/mask pair deciding which objects the world pairs up
///
/// Two objects A and B collide if:
/// - (A.group & B.mask) != 0, AND
/// - (B.group & A.mask) != 0
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionFilter {
    /// Which group(s) this object belongs to
    pub group: CollisionGroups,
    /// Which group(s) this object can collide with
    pub mask: CollisionGroups,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::dynamic()
    }
}

impl CollisionFilter {
    /// Create a new collision filter with specified group and mask
    pub fn new(group: CollisionGroups, mask: CollisionGroups) -> Self {
        Self { group, mask }
    }

    /// Dynamic objects: default group, collide with everything
    pub fn dynamic() -> Self {
        Self {
            group: CollisionGroups::DEFAULT,
            mask: CollisionGroups::ALL,
        }
    }

    /// Static and kinematic objects: static group, collide with everything
    /// except other static objects
    pub fn static_world() -> Self {
        Self {
            group: CollisionGroups::STATIC,
            mask: CollisionGroups::ALL ^ CollisionGroups::STATIC,
        }
    }

    /// Check if this filter allows collision with another filter
    pub fn collides_with(&self, other: &Self) -> bool {
        self.group.intersects(other.mask) && other.group.intersects(self.mask)
    }
}

/// Contact information from a collision
#[derive(Clone, Copy, Debug)]
pub struct Contact {
    /// World-space contact point
    pub point: Vec3,
    /// Normal pointing from the second shape toward the first
    pub normal: Vec3,
    /// Penetration depth (positive means overlapping)
    pub penetration: f32,
}

impl Contact {
    /// Create a new contact
    pub fn new(point: Vec3, normal: Vec3, penetration: f32) -> Self {
        Self {
            point,
            normal,
            penetration,
        }
    }

    /// Check if this represents an actual collision (positive penetration)
    pub fn is_colliding(&self) -> bool {
        self.penetration > 0.0
    }

    /// The same contact seen from the other shape
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Generate contacts between shape `a` at `ta` and shape `b` at `tb`
///
/// Contact normals point from `b` toward `a`. Box contacts against triangle
/// meshes use the box's bounding sphere; box/box contacts only test corners
/// against faces, so edge/edge crossings are missed.
pub fn generate_contacts(
    a: &CollisionShape,
    ta: &Transform,
    b: &CollisionShape,
    tb: &Transform,
    out: &mut Vec<Contact>,
) {
    use CollisionShape as S;

    match (a, b) {
        (S::Sphere { radius: ra }, S::Sphere { radius: rb }) => {
            out.extend(sphere_vs_sphere(ta.origin, *ra, tb.origin, *rb));
        }
        (S::Sphere { radius }, S::StaticPlane { normal, constant }) => {
            let (n, c) = world_plane(*normal, *constant, tb);
            out.extend(sphere_vs_plane(ta.origin, *radius, n, c));
        }
        (S::Box { half_extents }, S::StaticPlane { normal, constant }) => {
            let (n, c) = world_plane(*normal, *constant, tb);
            box_vs_plane(*half_extents, ta, n, c, out);
        }
        (S::Sphere { radius }, S::Box { half_extents }) => {
            out.extend(sphere_vs_box(ta.origin, *radius, *half_extents, tb));
        }
        (S::Box { half_extents: ha }, S::Box { half_extents: hb }) => {
            box_vs_box(*ha, ta, *hb, tb, out);
        }
        (S::Sphere { radius }, S::TriangleMesh(mesh)) => {
            sphere_vs_mesh(ta.origin, *radius, mesh, tb, out);
        }
        (S::Box { half_extents }, S::TriangleMesh(mesh)) => {
            sphere_vs_mesh(ta.origin, half_extents.length(), mesh, tb, out);
        }
        (S::StaticPlane { .. } | S::TriangleMesh(_), S::Sphere { .. } | S::Box { .. })
        | (S::Box { .. }, S::Sphere { .. }) => {
            let start = out.len();
            generate_contacts(b, tb, a, ta, out);
            for contact in &mut out[start..] {
                *contact = contact.flipped();
            }
        }
        // Static shapes never collide with each other
        (S::StaticPlane { .. } | S::TriangleMesh(_), S::StaticPlane { .. } | S::TriangleMesh(_)) => {}
    }
}

fn world_plane(normal: Vec3, constant: f32, transform: &Transform) -> (Vec3, f32) {
    let n = transform.transform_direction(normal);
    (n, constant + n.dot(transform.origin))
}

/// Sphere vs sphere (normal from `b` toward `a`)
pub fn sphere_vs_sphere(ca: Vec3, ra: f32, cb: Vec3, rb: f32) -> Option<Contact> {
    let delta = ca - cb;
    let dist_sq = delta.length_squared();
    let min_dist = ra + rb;

    if dist_sq >= min_dist * min_dist {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 0.0001 { delta * (1.0 / dist) } else { Vec3::Z };
    Some(Contact::new(cb + normal * rb, normal, min_dist - dist))
}

/// Sphere vs plane `normal · p = constant` (normal is the plane normal)
pub fn sphere_vs_plane(center: Vec3, radius: f32, normal: Vec3, constant: f32) -> Option<Contact> {
    let signed_dist = normal.dot(center) - constant;
    let penetration = radius - signed_dist;

    if penetration > 0.0 {
        Some(Contact::new(center - normal * radius, normal, penetration))
    } else {
        None
    }
}

/// Oriented box vs plane: one contact per corner below the plane
pub fn box_vs_plane(half_extents: Vec3, transform: &Transform, normal: Vec3, constant: f32, out: &mut Vec<Contact>) {
    for corner in box_corners(half_extents, transform) {
        let signed_dist = normal.dot(corner) - constant;
        if signed_dist < 0.0 {
            out.push(Contact::new(corner, normal, -signed_dist));
        }
    }
}

/// Sphere vs oriented box (normal from the box toward the sphere)
pub fn sphere_vs_box(center: Vec3, radius: f32, half_extents: Vec3, transform: &Transform) -> Option<Contact> {
    let local = transform.inverse().transform_point(center);
    let closest = local.clamp_components(-half_extents, half_extents);
    let delta = local - closest;
    let dist_sq = delta.length_squared();

    if dist_sq >= radius * radius {
        return None;
    }

    let dist = dist_sq.sqrt();
    let (local_normal, penetration) = if dist > 0.0001 {
        (delta * (1.0 / dist), radius - dist)
    } else {
        // Center inside the box: leave through the nearest face
        let (axis, sign, depth) = nearest_face(local, half_extents);
        (axis_vector(axis) * sign, depth + radius)
    };

    Some(Contact::new(
        transform.transform_point(closest),
        transform.transform_direction(local_normal),
        penetration,
    ))
}

/// Oriented box vs oriented box using corner-in-box tests both ways
pub fn box_vs_box(ha: Vec3, ta: &Transform, hb: Vec3, tb: &Transform, out: &mut Vec<Contact>) {
    let inv_b = tb.inverse();
    for corner in box_corners(ha, ta) {
        if let Some((normal, depth)) = point_in_box(inv_b.transform_point(corner), hb) {
            out.push(Contact::new(corner, tb.transform_direction(normal), depth));
        }
    }

    let inv_a = ta.inverse();
    for corner in box_corners(hb, tb) {
        if let Some((normal, depth)) = point_in_box(inv_a.transform_point(corner), ha) {
            // Face normal of `a` points toward `b`
            out.push(Contact::new(corner, -ta.transform_direction(normal), depth));
        }
    }
}

/// Sphere vs every triangle of a static mesh
pub fn sphere_vs_mesh(center: Vec3, radius: f32, mesh: &TriangleMesh, transform: &Transform, out: &mut Vec<Contact>) {
    let local_center = transform.inverse().transform_point(center);
    let radius_sq = radius * radius;

    for [a, b, c] in mesh.triangles() {
        let closest = closest_point_on_triangle(local_center, a, b, c);
        let delta = local_center - closest;
        let dist_sq = delta.length_squared();
        if dist_sq >= radius_sq {
            continue;
        }

        let dist = dist_sq.sqrt();
        let local_normal = if dist > 0.0001 {
            delta * (1.0 / dist)
        } else {
            let face = (b - a).cross(c - a).normalized();
            if face.dot(local_center - a) < 0.0 { -face } else { face }
        };

        out.push(Contact::new(
            transform.transform_point(closest),
            transform.transform_direction(local_normal),
            radius - dist,
        ));
    }
}

/// Closest point on triangle `abc` to `p`
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

/// If local point `p` is inside a box, the outward normal of the nearest
/// face and the depth below it
fn point_in_box(p: Vec3, half_extents: Vec3) -> Option<(Vec3, f32)> {
    let inside = p.x.abs() < half_extents.x && p.y.abs() < half_extents.y && p.z.abs() < half_extents.z;
    if !inside {
        return None;
    }
    let (axis, sign, depth) = nearest_face(p, half_extents);
    Some((axis_vector(axis) * sign, depth))
}

/// Axis index, sign and distance of the box face nearest to local point `p`
fn nearest_face(p: Vec3, half_extents: Vec3) -> (usize, f32, f32) {
    let mut best = (0, 1.0, f32::INFINITY);
    for axis in 0..3 {
        let coord = p.axis(axis);
        let depth = half_extents.axis(axis) - coord.abs();
        if depth < best.2 {
            best = (axis, if coord < 0.0 { -1.0 } else { 1.0 }, depth);
        }
    }
    best
}

fn axis_vector(axis: usize) -> Vec3 {
    mat3::get_column(&mat3::IDENTITY, axis)
}

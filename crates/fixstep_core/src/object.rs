//! Simulation objects
//!
//! A [`SimulationObject`] pairs a physics body with something to draw. Its
//! life runs through a fixed sequence:
//!
//! 1. constructed: no body yet
//! 2. initialized: body built, not simulated
//! 3. in the world: the body (and action, if any) is owned by the dynamics world
//! 4. removed: the body is handed back and the object may be re-added
//! 5. disposed: [`SimulationObject::dispose`] consumes the object
//!
//! Breaking the sequence (initializing twice, adding twice, disposing while
//! in the world) is a programming error and panics.

use crate::mesh::Mesh;
use crate::pool::ScratchPool;
use crate::render::{Primitive, RenderContext, Texture};
use fixstep_math::{mat4, Mat4, Transform, Vec3};
use fixstep_physics::{
    Action, ActionKey, BodyKey, CollisionFlags, CollisionGroups, CollisionObject, CollisionShape, DynamicsWorld,
    MotionState, RigidBody, RigidBodyConstructionInfo, TriangleMesh, WorldBody,
};
use std::fmt;
use std::mem;
use std::ops::Deref;
use std::sync::Arc;

/// A render asset that is either shared with other objects or owned
///
/// Only owned assets are released when the object is disposed; shared ones
/// live as long as their last `Arc`.
#[derive(Debug)]
pub enum AssetRef<T> {
    Shared(Arc<T>),
    Owned(Box<T>),
}

impl<T> AssetRef<T> {
    pub fn owned(value: T) -> Self {
        Self::Owned(Box::new(value))
    }

    pub fn shared(value: &Arc<T>) -> Self {
        Self::Shared(Arc::clone(value))
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }
}

impl<T> Deref for AssetRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Self::Shared(value) => value,
            Self::Owned(value) => value,
        }
    }
}

/// What an object draws
#[derive(Debug)]
pub enum ObjectKind {
    /// Physics only
    Rigid,
    /// A mesh drawn at the body's interpolated transform
    Mesh {
        mesh: AssetRef<Mesh>,
        primitive: Primitive,
        texture: Option<AssetRef<Texture>>,
    },
    /// A quad placed from the plane shape's normal and constant
    StaticPlane {
        quad: Mesh,
        texture: Option<AssetRef<Texture>>,
    },
}

/// Where an object is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectState {
    Constructed,
    Initialized,
    InWorld,
    Removed,
}

enum BodySlot {
    Empty,
    Detached(WorldBody),
    Attached { key: BodyKey, rigid: bool },
}

enum ActionSlot {
    None,
    Detached(Box<dyn Action>),
    Attached(ActionKey),
}

/// A physics body plus its render representation
pub struct SimulationObject {
    kind: ObjectKind,
    body: BodySlot,
    action: ActionSlot,
    dynamic: bool,
    group: Option<CollisionGroups>,
    mask: Option<CollisionGroups>,
    was_added: bool,
}

impl fmt::Debug for SimulationObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationObject")
            .field("kind", &self.kind)
            .field("state", &self.state())
            .field("body_key", &self.body_key())
            .field("dynamic", &self.dynamic)
            .finish()
    }
}

impl SimulationObject {
    /// Create an object with no body yet
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            body: BodySlot::Empty,
            action: ActionSlot::None,
            dynamic: false,
            group: None,
            mask: None,
            was_added: false,
        }
    }

    /// A physics-only object
    pub fn rigid() -> Self {
        Self::new(ObjectKind::Rigid)
    }

    /// An object drawn as `mesh`
    pub fn mesh(mesh: AssetRef<Mesh>, primitive: Primitive, texture: Option<AssetRef<Texture>>) -> Self {
        Self::new(ObjectKind::Mesh {
            mesh,
            primitive,
            texture,
        })
    }

    /// An initialized static plane drawn as a `width × height` quad
    ///
    /// `friction` of `None` keeps the engine default.
    pub fn static_plane(
        normal: Vec3,
        constant: f32,
        friction: Option<f32>,
        width: f32,
        height: f32,
        texture: Option<AssetRef<Texture>>,
        scratch: &mut ScratchPool,
    ) -> Self {
        let mut object = Self::new(ObjectKind::StaticPlane {
            quad: Mesh::quad(width, height),
            texture,
        });
        let start: Transform = scratch.obtain();
        object.initialize(CollisionShape::static_plane(normal, constant), 0.0, friction, &start, scratch);
        scratch.free(start);
        object
    }

    /// Build the rigid body chain: motion state, inertia, construction info, body
    ///
    /// Zero mass makes a static body with zero inertia. `friction` of `None`
    /// keeps the engine default.
    ///
    /// # Panics
    ///
    /// Panics if the object already has a body.
    pub fn initialize(
        &mut self,
        shape: CollisionShape,
        mass: f32,
        friction: Option<f32>,
        start: &Transform,
        scratch: &mut ScratchPool,
    ) {
        self.assert_uninitialized();

        let motion_state = MotionState::new(*start);
        let mut inertia: Vec3 = scratch.obtain();
        if mass != 0.0 {
            inertia = shape.calculate_local_inertia(mass);
        }

        let mut info = RigidBodyConstructionInfo::new(mass, Some(motion_state), shape, inertia);
        if let Some(friction) = friction {
            info.friction = friction;
        }
        let body = RigidBody::new(info);
        scratch.free(inertia);

        log::trace!("Initialized {} body (mass {})", body.collision_object().shape().name(), mass);
        self.dynamic = !body.collision_object().is_static_or_kinematic_object();
        self.body = BodySlot::Detached(WorldBody::Rigid(body));
    }

    /// Use a plain collision object (no mass, no motion state) as the body
    ///
    /// # Panics
    ///
    /// Panics if the object already has a body.
    pub fn initialize_collision_object(&mut self, object: CollisionObject) {
        self.assert_uninitialized();
        self.dynamic = !object.is_static_or_kinematic_object();
        self.body = BodySlot::Detached(WorldBody::Collision(object));
    }

    fn assert_uninitialized(&self) {
        if !matches!(self.body, BodySlot::Empty) {
            panic!("simulation object is already initialized");
        }
    }

    /// Replace the body's collision flags
    ///
    /// # Panics
    ///
    /// Panics unless the object is initialized and out of the world.
    pub fn set_collision_flags(&mut self, flags: CollisionFlags) {
        let object = match &mut self.body {
            BodySlot::Detached(WorldBody::Rigid(body)) => {
                body.set_collision_flags(flags);
                body.collision_object()
            }
            BodySlot::Detached(WorldBody::Collision(object)) => {
                object.set_collision_flags(flags);
                &*object
            }
            BodySlot::Empty => panic!("cannot set collision flags before the object is initialized"),
            BodySlot::Attached { .. } => panic!("cannot set collision flags while the object is in the world"),
        };
        self.dynamic = !object.is_static_or_kinematic_object();
    }

    /// Attach a per-step action, registered alongside the body
    ///
    /// # Panics
    ///
    /// Panics while the object is in the world.
    pub fn set_action(&mut self, action: Box<dyn Action>) {
        if matches!(self.action, ActionSlot::Attached(_)) {
            panic!("cannot replace the action while the object is in the world");
        }
        self.action = ActionSlot::Detached(action);
    }

    pub fn has_action(&self) -> bool {
        !matches!(self.action, ActionSlot::None)
    }

    /// Whether the body moves under simulation; false without a body
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Collision group: the override, or DEFAULT for dynamic and STATIC otherwise
    pub fn collision_filter_group(&self) -> CollisionGroups {
        self.group.unwrap_or(if self.dynamic {
            CollisionGroups::DEFAULT
        } else {
            CollisionGroups::STATIC
        })
    }

    /// Override the collision group; takes effect on the next add
    pub fn set_collision_filter_group(&mut self, group: CollisionGroups) {
        self.group = Some(group);
    }

    /// Collision mask: the override, or ALL for dynamic and everything but STATIC otherwise
    pub fn collision_filter_mask(&self) -> CollisionGroups {
        self.mask.unwrap_or(if self.dynamic {
            CollisionGroups::ALL
        } else {
            CollisionGroups::ALL ^ CollisionGroups::STATIC
        })
    }

    /// Override the collision mask; takes effect on the next add
    pub fn set_collision_filter_mask(&mut self, mask: CollisionGroups) {
        self.mask = Some(mask);
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn state(&self) -> ObjectState {
        match (&self.body, self.was_added) {
            (BodySlot::Empty, _) => ObjectState::Constructed,
            (BodySlot::Attached { .. }, _) => ObjectState::InWorld,
            (BodySlot::Detached(_), false) => ObjectState::Initialized,
            (BodySlot::Detached(_), true) => ObjectState::Removed,
        }
    }

    pub fn is_in_world(&self) -> bool {
        matches!(self.body, BodySlot::Attached { .. })
    }

    /// Key of the body while the object is in the world
    pub fn body_key(&self) -> Option<BodyKey> {
        match self.body {
            BodySlot::Attached { key, .. } => Some(key),
            _ => None,
        }
    }

    /// The body while the object is out of the world
    pub fn detached_body(&self) -> Option<&WorldBody> {
        match &self.body {
            BodySlot::Detached(body) => Some(body),
            _ => None,
        }
    }

    /// Hand the body (and action) to the world
    ///
    /// Rigid bodies use the rigid-body registration, plain collision objects
    /// the collision-object one, both with the resolved group and mask.
    ///
    /// # Panics
    ///
    /// Panics if the object is not initialized or is already in the world.
    pub fn add_to_world(&mut self, world: &mut dyn DynamicsWorld) {
        let (group, mask) = (self.collision_filter_group(), self.collision_filter_mask());
        let body = match mem::replace(&mut self.body, BodySlot::Empty) {
            BodySlot::Detached(body) => body,
            BodySlot::Empty => panic!("cannot add an uninitialized simulation object to the world"),
            BodySlot::Attached { .. } => panic!("simulation object is already in the world"),
        };

        self.body = match body {
            WorldBody::Rigid(body) => BodySlot::Attached {
                key: world.add_rigid_body(body, group, mask),
                rigid: true,
            },
            WorldBody::Collision(object) => BodySlot::Attached {
                key: world.add_collision_object(object, group, mask),
                rigid: false,
            },
        };

        if let ActionSlot::Detached(action) = mem::replace(&mut self.action, ActionSlot::None) {
            self.action = ActionSlot::Attached(world.add_action(action));
        }
        self.was_added = true;
    }

    /// Take the body (and action) back from the world
    ///
    /// Returns `false` without doing anything if the object is not in the
    /// world.
    ///
    /// # Panics
    ///
    /// Panics if `world` does not hold this object's body.
    pub fn remove_from_world(&mut self, world: &mut dyn DynamicsWorld) -> bool {
        let (key, rigid) = match self.body {
            BodySlot::Attached { key, rigid } => (key, rigid),
            _ => return false,
        };

        let body = if rigid {
            world.remove_rigid_body(key).map(WorldBody::Rigid)
        } else {
            world.remove_collision_object(key).map(WorldBody::Collision)
        };
        match body {
            Some(body) => self.body = BodySlot::Detached(body),
            None => panic!("body {key:?} is not registered with this world"),
        }

        if let ActionSlot::Attached(action_key) = self.action {
            self.action = match world.remove_action(action_key) {
                Some(action) => ActionSlot::Detached(action),
                None => ActionSlot::None,
            };
        }
        true
    }

    /// Transform to draw the object at
    ///
    /// Prefers the motion state's interpolated transform and falls back to
    /// the body's world transform. `None` without a body.
    pub fn graphics_transform(&self, world: &dyn DynamicsWorld) -> Option<Transform> {
        match &self.body {
            BodySlot::Empty => None,
            BodySlot::Detached(body) => Some(body_graphics_transform(body_parts(body))),
            BodySlot::Attached { key, rigid: true } => world
                .rigid_body(*key)
                .map(|body| body_graphics_transform((body.motion_state(), body.world_transform()))),
            BodySlot::Attached { key, rigid: false } => world.collision_object(*key).map(|o| *o.world_transform()),
        }
    }

    fn plane(&self, world: &dyn DynamicsWorld) -> Option<(Vec3, f32)> {
        let shape = match &self.body {
            BodySlot::Detached(body) => body.collision_object().shape(),
            BodySlot::Attached { key, .. } => world.collision_object(*key)?.shape(),
            BodySlot::Empty => return None,
        };
        match shape {
            CollisionShape::StaticPlane { normal, constant } => Some((*normal, *constant)),
            _ => None,
        }
    }

    /// Draw the object
    ///
    /// Meshes are drawn under the graphics transform, planes under a
    /// transform built from the plane's normal and constant.
    ///
    /// # Panics
    ///
    /// Panics if the object has no body to take a transform from.
    pub fn render(&self, ctx: &mut dyn RenderContext, world: &dyn DynamicsWorld, scratch: &mut ScratchPool) {
        match &self.kind {
            ObjectKind::Rigid => {}
            ObjectKind::Mesh {
                mesh,
                primitive,
                texture,
            } => {
                let Some(transform) = self.graphics_transform(world) else {
                    panic!("cannot render a simulation object without a body");
                };
                let mut matrix: Mat4 = scratch.obtain();
                matrix.copy_from_slice(&transform.to_matrix());
                ctx.push_transform(&matrix);
                ctx.enable_lighting();
                ctx.draw_mesh(mesh, *primitive, texture.as_deref());
                ctx.pop_transform();
                scratch.free(matrix);
            }
            ObjectKind::StaticPlane { quad, texture } => {
                let Some((normal, constant)) = self.plane(world) else {
                    panic!("static plane object has no plane shape");
                };
                let matrix = plane_matrix(normal, constant, scratch);
                ctx.push_transform(&matrix);
                ctx.enable_lighting();
                ctx.draw_mesh(quad, Primitive::Triangles, texture.as_deref());
                ctx.pop_transform();
                scratch.free(matrix);
            }
        }
    }

    /// Release the body, then its shape, then its motion state, then owned assets
    ///
    /// # Panics
    ///
    /// Panics if the object is still in the world.
    pub fn dispose(mut self) {
        if self.is_in_world() {
            panic!("cannot dispose a simulation object that is still in the world");
        }
        self.release();
    }

    fn release(&mut self) {
        match mem::replace(&mut self.body, BodySlot::Empty) {
            BodySlot::Detached(WorldBody::Rigid(body)) => {
                log::trace!("Releasing rigid body");
                let parts = body.into_parts();
                log::trace!("Releasing {} shape", parts.shape.name());
                drop(parts.shape);
                if parts.motion_state.is_some() {
                    log::trace!("Releasing motion state");
                }
            }
            BodySlot::Detached(WorldBody::Collision(object)) => {
                log::trace!("Releasing collision object");
                let shape = object.into_shape();
                log::trace!("Releasing {} shape", shape.name());
            }
            BodySlot::Empty | BodySlot::Attached { .. } => {}
        }
        self.action = ActionSlot::None;

        match mem::replace(&mut self.kind, ObjectKind::Rigid) {
            ObjectKind::Mesh { mesh, texture, .. } => {
                if mesh.is_owned() {
                    log::trace!("Releasing owned mesh");
                }
                release_texture(texture);
            }
            ObjectKind::StaticPlane { texture, .. } => {
                log::trace!("Releasing plane quad");
                release_texture(texture);
            }
            ObjectKind::Rigid => {}
        }
    }
}

impl Drop for SimulationObject {
    fn drop(&mut self) {
        if let BodySlot::Attached { key, .. } = self.body {
            log::warn!("Simulation object dropped while its body {:?} is still in the world", key);
            return;
        }
        self.release();
    }
}

fn release_texture(texture: Option<AssetRef<Texture>>) {
    if let Some(AssetRef::Owned(texture)) = texture {
        log::trace!("Releasing owned texture '{}'", texture.name());
    }
}

fn body_parts(body: &WorldBody) -> (Option<&MotionState>, &Transform) {
    match body {
        WorldBody::Rigid(body) => (body.motion_state(), body.world_transform()),
        WorldBody::Collision(object) => (None, object.world_transform()),
    }
}

fn body_graphics_transform((motion_state, world_transform): (Option<&MotionState>, &Transform)) -> Transform {
    motion_state.map_or(*world_transform, |m| m.graphics_world_transform)
}

/// Matrix placing a +Z facing quad on the plane `normal · p = constant`
pub fn plane_matrix(normal: Vec3, constant: f32, scratch: &mut ScratchPool) -> Mat4 {
    let mut origin: Vec3 = scratch.obtain();
    origin += normal * constant;

    let angle = Vec3::Z.angle_between(normal);
    let mut axis: Vec3 = scratch.obtain();
    axis += Vec3::Z.cross(normal);
    if axis.length_squared() < 1e-12 && angle > 1.0 {
        // Facing straight down: any horizontal axis works
        axis = Vec3::X;
    }

    let mut matrix: Mat4 = scratch.obtain();
    matrix.copy_from_slice(&mat4::mul(&mat4::translation(origin), &mat4::axis_angle(axis, angle)));
    scratch.free(origin);
    scratch.free(axis);
    matrix
}

/// Errors building a collision shape from render mesh data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshShapeError {
    /// Vertices too narrow to hold a position
    StrideTooSmall(usize),
    /// An index refers past the end of the vertex buffer
    IndexOutOfRange { index: u16, vertex_count: usize },
    /// Not a single whole triangle
    NoTriangles,
}

impl fmt::Display for MeshShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshShapeError::StrideTooSmall(stride) => {
                write!(f, "Mesh vertex stride {} is too small for a position", stride)
            }
            MeshShapeError::IndexOutOfRange { index, vertex_count } => {
                write!(f, "Mesh index {} out of range for {} vertices", index, vertex_count)
            }
            MeshShapeError::NoTriangles => write!(f, "Mesh has no triangles"),
        }
    }
}

impl std::error::Error for MeshShapeError {}

/// Build a static triangle-mesh shape from render mesh data
///
/// Reads the indices when present, otherwise the vertices in order, taking
/// each vertex's position from its first three floats. A trailing partial
/// triangle is ignored. The returned `Arc` is the same triangle data the
/// shape refers to.
pub fn triangle_mesh_shape(
    mesh: &Mesh,
    scratch: &mut ScratchPool,
) -> Result<(CollisionShape, Arc<TriangleMesh>), MeshShapeError> {
    if mesh.vertex_stride < 3 {
        return Err(MeshShapeError::StrideTooSmall(mesh.vertex_stride));
    }

    let vertex_count = mesh.vertex_count();
    let sequence: Box<dyn Iterator<Item = u16>> = if mesh.is_indexed() {
        Box::new(mesh.indices.iter().copied())
    } else {
        let count = u16::try_from(vertex_count).unwrap_or(u16::MAX);
        Box::new(0..count)
    };

    let mut triangles = TriangleMesh::with_capacity(mesh.index_count().max(vertex_count) / 3);
    let mut corners: [Vec3; 3] = [scratch.obtain(), scratch.obtain(), scratch.obtain()];
    let mut filled = 0;

    for index in sequence {
        let Some(position) = mesh.position(usize::from(index)) else {
            corners.into_iter().for_each(|c| scratch.free(c));
            return Err(MeshShapeError::IndexOutOfRange { index, vertex_count });
        };
        corners[filled] = position;
        filled += 1;
        if filled == 3 {
            triangles.add_triangle(corners[0], corners[1], corners[2]);
            filled = 0;
        }
    }
    corners.into_iter().for_each(|c| scratch.free(c));

    if filled != 0 {
        log::debug!("Ignoring {} trailing mesh vertices", filled);
    }
    if triangles.is_empty() {
        return Err(MeshShapeError::NoTriangles);
    }

    log::debug!("Built triangle mesh shape with {} triangles", triangles.triangle_count());
    let triangles = Arc::new(triangles);
    Ok((CollisionShape::triangle_mesh(Arc::clone(&triangles)), triangles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixstep_physics::DiscreteDynamicsWorld;

    #[derive(Default)]
    struct Recorder {
        pushed: Vec<Mat4>,
        depth: i32,
        draws: usize,
        textures: Vec<String>,
    }

    impl RenderContext for Recorder {
        fn clear(&mut self) {}
        fn begin_scene(&mut self) {}
        fn push_transform(&mut self, transform: &Mat4) {
            self.pushed.push(*transform);
            self.depth += 1;
        }
        fn pop_transform(&mut self) {
            self.depth -= 1;
        }
        fn enable_lighting(&mut self) {}
        fn disable_lighting(&mut self) {}
        fn draw_mesh(&mut self, _mesh: &Mesh, _primitive: Primitive, texture: Option<&Texture>) {
            self.draws += 1;
            if let Some(texture) = texture {
                self.textures.push(texture.name().to_string());
            }
        }
        fn begin_overlay(&mut self) {}
        fn draw_text(&mut self, _x: f32, _y: f32, _text: &str) {}
    }

    fn sphere(mass: f32, height: f32, scratch: &mut ScratchPool) -> SimulationObject {
        let mut object = SimulationObject::mesh(AssetRef::owned(Mesh::sphere(1.0, 8, 4)), Primitive::Triangles, None);
        object.initialize(
            CollisionShape::sphere(1.0),
            mass,
            None,
            &Transform::from_origin(Vec3::new(0.0, 0.0, height)),
            scratch,
        );
        object
    }

    #[test]
    fn test_lifecycle_states() {
        let mut scratch = ScratchPool::new();
        let mut world = DiscreteDynamicsWorld::with_defaults();
        let mut object = SimulationObject::rigid();
        assert_eq!(object.state(), ObjectState::Constructed);

        object.initialize(CollisionShape::sphere(1.0), 1.0, None, &Transform::IDENTITY, &mut scratch);
        assert_eq!(object.state(), ObjectState::Initialized);

        object.add_to_world(&mut world);
        assert_eq!(object.state(), ObjectState::InWorld);
        assert_eq!(world.body_count(), 1);

        assert!(object.remove_from_world(&mut world));
        assert_eq!(object.state(), ObjectState::Removed);
        assert_eq!(world.body_count(), 0);
        object.dispose();
    }

    #[test]
    fn test_remove_when_not_in_world_is_noop() {
        let mut scratch = ScratchPool::new();
        let mut world = DiscreteDynamicsWorld::with_defaults();
        let mut empty = SimulationObject::rigid();
        assert!(!empty.remove_from_world(&mut world));

        let mut object = sphere(1.0, 0.0, &mut scratch);
        assert!(!object.remove_from_world(&mut world));
        assert_eq!(object.state(), ObjectState::Initialized);
    }

    #[test]
    #[should_panic(expected = "already initialized")]
    fn test_initialize_twice_panics() {
        let mut scratch = ScratchPool::new();
        let mut object = sphere(1.0, 0.0, &mut scratch);
        object.initialize(CollisionShape::sphere(1.0), 1.0, None, &Transform::IDENTITY, &mut scratch);
    }

    #[test]
    #[should_panic(expected = "uninitialized")]
    fn test_add_uninitialized_panics() {
        let mut world = DiscreteDynamicsWorld::with_defaults();
        SimulationObject::rigid().add_to_world(&mut world);
    }

    #[test]
    #[should_panic(expected = "still in the world")]
    fn test_dispose_in_world_panics() {
        let mut scratch = ScratchPool::new();
        let mut world = DiscreteDynamicsWorld::with_defaults();
        let mut object = sphere(1.0, 0.0, &mut scratch);
        object.add_to_world(&mut world);
        object.dispose();
    }

    #[test]
    fn test_filter_defaults_follow_mass() {
        let mut scratch = ScratchPool::new();
        let dynamic = sphere(50.0, 0.0, &mut scratch);
        assert_eq!(dynamic.collision_filter_mask(), CollisionGroups::ALL);
        assert_eq!(dynamic.collision_filter_group(), CollisionGroups::DEFAULT);

        let fixed = sphere(0.0, 0.0, &mut scratch);
        assert_eq!(fixed.collision_filter_mask(), CollisionGroups::ALL ^ CollisionGroups::STATIC);
        assert_eq!(fixed.collision_filter_group(), CollisionGroups::STATIC);

        assert!(!SimulationObject::rigid().is_dynamic());
    }

    #[test]
    fn test_filter_override_used_on_add() {
        let mut scratch = ScratchPool::new();
        let mut world = DiscreteDynamicsWorld::with_defaults();
        let mut object = sphere(1.0, 0.0, &mut scratch);
        object.set_collision_filter_group(CollisionGroups::DEBRIS);
        object.add_to_world(&mut world);

        let key = object.body_key().unwrap();
        assert_eq!(world.bodies().filter(key).unwrap().group, CollisionGroups::DEBRIS);
        assert_eq!(object.collision_filter_mask(), CollisionGroups::ALL);
        object.remove_from_world(&mut world);
    }

    #[test]
    fn test_static_flag_makes_object_static() {
        let mut scratch = ScratchPool::new();
        let mut object = sphere(1.0, 0.0, &mut scratch);
        object.set_collision_flags(CollisionFlags::STATIC_OBJECT);
        assert!(!object.is_dynamic());
        assert_eq!(object.collision_filter_group(), CollisionGroups::STATIC);
    }

    #[test]
    fn test_action_follows_world_membership() {
        let mut scratch = ScratchPool::new();
        let mut world = DiscreteDynamicsWorld::with_defaults();
        let mut object = sphere(1.0, 0.0, &mut scratch);
        object.set_action(Box::new(|_: &mut fixstep_physics::BodySet, _: f32| {}));

        object.add_to_world(&mut world);
        assert_eq!(world.action_count(), 1);
        object.remove_from_world(&mut world);
        assert_eq!(world.action_count(), 0);
        assert!(object.has_action());
    }

    #[test]
    fn test_graphics_transform_prefers_motion_state() {
        let mut scratch = ScratchPool::new();
        let mut world = DiscreteDynamicsWorld::with_defaults();
        let mut object = sphere(1.0, 20.0, &mut scratch);
        object.add_to_world(&mut world);

        let key = object.body_key().unwrap();
        let body = world.rigid_body_mut(key).unwrap();
        body.set_world_transform(Transform::from_origin(Vec3::new(0.0, 0.0, 5.0)));

        // The world has not synced the motion state yet
        let transform = object.graphics_transform(&world).unwrap();
        assert_eq!(transform.origin, Vec3::new(0.0, 0.0, 20.0));
        object.remove_from_world(&mut world);
    }

    #[test]
    fn test_plain_collision_object_uses_world_transform() {
        let mut world = DiscreteDynamicsWorld::with_defaults();
        let mut object = SimulationObject::rigid();
        object.initialize_collision_object(CollisionObject::new(
            CollisionShape::cuboid(Vec3::ONE),
            Transform::from_origin(Vec3::new(1.0, 2.0, 3.0)),
        ));
        object.add_to_world(&mut world);
        assert_eq!(object.graphics_transform(&world).unwrap().origin, Vec3::new(1.0, 2.0, 3.0));
        assert!(object.remove_from_world(&mut world));
        assert!(world.bodies().is_empty());
    }

    #[test]
    fn test_mesh_render_pushes_body_transform() {
        let mut scratch = ScratchPool::new();
        let mut world = DiscreteDynamicsWorld::with_defaults();
        let mut object = sphere(1.0, 20.0, &mut scratch);
        object.add_to_world(&mut world);

        let mut recorder = Recorder::default();
        object.render(&mut recorder, &world, &mut scratch);
        assert_eq!(recorder.draws, 1);
        assert_eq!(recorder.depth, 0);
        assert_eq!(recorder.pushed[0][3][2], 20.0);
        object.remove_from_world(&mut world);
    }

    #[test]
    fn test_plane_render_follows_plane_parameters() {
        let mut scratch = ScratchPool::new();
        let mut world = DiscreteDynamicsWorld::with_defaults();
        let texture = Arc::new(Texture::new("grass"));
        let mut plane = SimulationObject::static_plane(
            Vec3::X,
            2.0,
            None,
            50.0,
            50.0,
            Some(AssetRef::shared(&texture)),
            &mut scratch,
        );
        plane.add_to_world(&mut world);

        let mut recorder = Recorder::default();
        plane.render(&mut recorder, &world, &mut scratch);
        let m = recorder.pushed[0];
        let up = mat4::transform_direction(&m, Vec3::Z);
        assert!((up - Vec3::X).length() < 0.0001);
        assert_eq!(mat4::transform_point(&m, Vec3::ZERO), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(recorder.textures, vec!["grass".to_string()]);

        plane.remove_from_world(&mut world);
        plane.dispose();
        assert_eq!(Arc::strong_count(&texture), 1);
    }

    #[test]
    fn test_plane_matrix_facing_down() {
        let mut scratch = ScratchPool::new();
        let m = plane_matrix(-Vec3::Z, 1.0, &mut scratch);
        let up = mat4::transform_direction(&m, Vec3::Z);
        assert!((up + Vec3::Z).length() < 0.0001);
    }

    #[test]
    fn test_triangle_mesh_shape_from_indexed_mesh() {
        let mut scratch = ScratchPool::new();
        let (shape, triangles) = triangle_mesh_shape(&Mesh::quad(2.0, 2.0), &mut scratch).unwrap();
        assert_eq!(triangles.triangle_count(), 2);
        assert!(shape.is_static_only());
        assert_eq!(Arc::strong_count(&triangles), 2);
    }

    #[test]
    fn test_triangle_mesh_shape_from_unindexed_mesh() {
        let mut scratch = ScratchPool::new();
        let mesh = Mesh::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 9.0, 9.0, 9.0], Vec::new(), 3);
        let (_, triangles) = triangle_mesh_shape(&mesh, &mut scratch).unwrap();
        assert_eq!(triangles.triangle_count(), 1);
        assert_eq!(triangles.triangle(0)[1], Vec3::X);
    }

    #[test]
    fn test_triangle_mesh_shape_errors() {
        let mut scratch = ScratchPool::new();
        let narrow = Mesh::new(vec![0.0; 6], Vec::new(), 2);
        assert_eq!(triangle_mesh_shape(&narrow, &mut scratch).unwrap_err(), MeshShapeError::StrideTooSmall(2));

        let bad = Mesh::new(vec![0.0; 9], vec![0, 1, 7], 3);
        assert_eq!(
            triangle_mesh_shape(&bad, &mut scratch).unwrap_err(),
            MeshShapeError::IndexOutOfRange {
                index: 7,
                vertex_count: 3
            }
        );

        let empty = Mesh::new(Vec::new(), Vec::new(), 3);
        assert_eq!(triangle_mesh_shape(&empty, &mut scratch).unwrap_err(), MeshShapeError::NoTriangles);
    }
}

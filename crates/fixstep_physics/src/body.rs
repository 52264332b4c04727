//! Collision objects, rigid bodies and motion states

use crate::collision::CollisionFlags;
use crate::material::PhysicsMaterial;
use crate::shapes::CollisionShape;
use fixstep_math::{mat3, Aabb, Mat3, Transform, Vec3};
use slotmap::new_key_type;

new_key_type! {
    /// Key to a body (rigid or plain collision object) in a dynamics world
    ///
    /// Uses generational indexing: once a body is removed, its old key
    /// returns None even after the slot is reused.
    pub struct BodyKey;

    /// Key to an action registered with a dynamics world
    pub struct ActionKey;
}

/// Source of a rigid body's world transform for rendering
///
/// The world writes the (interpolated) transform into it after every step;
/// renderers read [`MotionState::graphics_world_transform`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionState {
    /// Transform handed to the renderer
    pub graphics_world_transform: Transform,
    /// Offset from the graphics origin to the center of mass
    pub center_of_mass_offset: Transform,
    /// Transform the body started from
    pub start_world_transform: Transform,
}

impl Default for MotionState {
    fn default() -> Self {
        Self::new(Transform::IDENTITY)
    }
}

impl MotionState {
    /// Create a motion state starting at `start`
    pub fn new(start: Transform) -> Self {
        Self {
            graphics_world_transform: start,
            center_of_mass_offset: Transform::IDENTITY,
            start_world_transform: start,
        }
    }

    /// Set the center of mass offset
    pub fn with_center_of_mass_offset(mut self, offset: Transform) -> Self {
        self.center_of_mass_offset = offset;
        self
    }

    /// Center of mass transform, read by the body at construction
    pub fn world_transform(&self) -> Transform {
        self.graphics_world_transform.compose(&self.center_of_mass_offset.inverse())
    }

    /// Publish a new center of mass transform
    pub fn set_world_transform(&mut self, center_of_mass: &Transform) {
        self.graphics_world_transform = center_of_mass.compose(&self.center_of_mass_offset);
    }
}

/// An object with a shape and a transform that takes part in collisions
#[derive(Clone, Debug)]
pub struct CollisionObject {
    world_transform: Transform,
    shape: CollisionShape,
    flags: CollisionFlags,
    /// Surface used when resolving contacts
    pub material: PhysicsMaterial,
}

impl CollisionObject {
    /// Create a collision object; static-only shapes get the static flag
    pub fn new(shape: CollisionShape, world_transform: Transform) -> Self {
        let flags = if shape.is_static_only() {
            CollisionFlags::STATIC_OBJECT
        } else {
            CollisionFlags::empty()
        };
        Self {
            world_transform,
            shape,
            flags,
            material: PhysicsMaterial::default(),
        }
    }

    /// Set the material
    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    /// Get the shape
    pub fn shape(&self) -> &CollisionShape {
        &self.shape
    }

    /// Get the world transform
    pub fn world_transform(&self) -> &Transform {
        &self.world_transform
    }

    /// Replace the world transform
    pub fn set_world_transform(&mut self, transform: Transform) {
        self.world_transform = transform;
    }

    /// Get the collision flags
    pub fn collision_flags(&self) -> CollisionFlags {
        self.flags
    }

    /// Replace the collision flags
    pub fn set_collision_flags(&mut self, flags: CollisionFlags) {
        self.flags = flags;
    }

    /// Check whether this object never moves
    pub fn is_static_object(&self) -> bool {
        self.flags.contains(CollisionFlags::STATIC_OBJECT)
    }

    /// Check whether this object is driven by its motion state
    pub fn is_kinematic_object(&self) -> bool {
        self.flags.contains(CollisionFlags::KINEMATIC_OBJECT)
    }

    /// Check whether the solver treats this object as immovable
    pub fn is_static_or_kinematic_object(&self) -> bool {
        self.flags
            .intersects(CollisionFlags::STATIC_OBJECT | CollisionFlags::KINEMATIC_OBJECT)
    }

    /// Check whether contacts with this object produce impulses
    pub fn has_contact_response(&self) -> bool {
        !self.flags.contains(CollisionFlags::NO_CONTACT_RESPONSE)
    }

    /// World-space bounding box
    pub fn aabb(&self) -> Aabb {
        self.shape.aabb(&self.world_transform)
    }

    /// Give up the object, returning its shape
    pub fn into_shape(self) -> CollisionShape {
        self.shape
    }
}

/// Parameters for [`RigidBody::new`]
///
/// The descriptor is consumed by the body; nothing refers back to it.
#[derive(Clone, Debug)]
pub struct RigidBodyConstructionInfo {
    /// Mass (0 makes a static body)
    pub mass: f32,
    /// Optional motion state; when present the start transform is read from it
    pub motion_state: Option<MotionState>,
    /// Start transform when no motion state is given
    pub start_world_transform: Transform,
    /// Collision shape
    pub shape: CollisionShape,
    /// Diagonal inertia tensor in local space
    pub local_inertia: Vec3,
    /// Surface friction
    pub friction: f32,
    /// Surface restitution
    pub restitution: f32,
    /// Fraction of linear velocity lost per second
    pub linear_damping: f32,
    /// Fraction of angular velocity lost per second
    pub angular_damping: f32,
}

impl RigidBodyConstructionInfo {
    /// Create a descriptor with default surface and damping
    pub fn new(mass: f32, motion_state: Option<MotionState>, shape: CollisionShape, local_inertia: Vec3) -> Self {
        let surface = PhysicsMaterial::default();
        Self {
            mass,
            motion_state,
            start_world_transform: Transform::IDENTITY,
            shape,
            local_inertia,
            friction: surface.friction,
            restitution: surface.restitution,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }
}

/// The parts a rigid body releases when it is taken apart
#[derive(Debug)]
pub struct RigidBodyParts {
    /// Collision shape the body was built with
    pub shape: CollisionShape,
    /// Motion state the body was built with
    pub motion_state: Option<MotionState>,
}

/// A rigid body with mass, velocity and an optional motion state
#[derive(Clone, Debug)]
pub struct RigidBody {
    collision: CollisionObject,
    motion_state: Option<MotionState>,
    mass: f32,
    inverse_mass: f32,
    local_inertia: Vec3,
    inverse_inertia_local: Vec3,
    /// Linear velocity (units per second)
    pub linear_velocity: Vec3,
    /// Angular velocity (radians per second around each axis)
    pub angular_velocity: Vec3,
    /// Fraction of linear velocity lost per second
    pub linear_damping: f32,
    /// Fraction of angular velocity lost per second
    pub angular_damping: f32,
    total_force: Vec3,
}

impl RigidBody {
    /// Build a body from a construction descriptor
    pub fn new(info: RigidBodyConstructionInfo) -> Self {
        let transform = info
            .motion_state
            .as_ref()
            .map(MotionState::world_transform)
            .unwrap_or(info.start_world_transform);

        let mut collision = CollisionObject::new(info.shape, transform)
            .with_material(PhysicsMaterial::new(info.friction, info.restitution));
        if info.mass == 0.0 {
            collision.set_collision_flags(collision.collision_flags() | CollisionFlags::STATIC_OBJECT);
        }

        let inverse_mass = if info.mass != 0.0 { 1.0 / info.mass } else { 0.0 };
        let invert = |i: f32| if i != 0.0 { 1.0 / i } else { 0.0 };

        Self {
            collision,
            motion_state: info.motion_state,
            mass: info.mass,
            inverse_mass,
            local_inertia: info.local_inertia,
            inverse_inertia_local: Vec3::new(
                invert(info.local_inertia.x),
                invert(info.local_inertia.y),
                invert(info.local_inertia.z),
            ),
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_damping: info.linear_damping.clamp(0.0, 1.0),
            angular_damping: info.angular_damping.clamp(0.0, 1.0),
            total_force: Vec3::ZERO,
        }
    }

    /// Mass (0 for static bodies)
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Inverse mass as seen by the solver (0 for static and kinematic bodies)
    pub fn inverse_mass(&self) -> f32 {
        if self.collision.is_static_or_kinematic_object() {
            0.0
        } else {
            self.inverse_mass
        }
    }

    /// Diagonal inertia tensor in local space
    pub fn local_inertia(&self) -> Vec3 {
        self.local_inertia
    }

    /// Inverse inertia tensor in world space
    pub fn inverse_inertia_world(&self) -> Mat3 {
        if self.collision.is_static_or_kinematic_object() {
            return [[0.0; 3]; 3];
        }
        let basis = &self.collision.world_transform().basis;
        let scaled = mat3::mul(basis, &mat3::from_diagonal(self.inverse_inertia_local));
        mat3::mul(&scaled, &mat3::transpose(basis))
    }

    /// Check whether the solver moves this body
    pub fn is_dynamic(&self) -> bool {
        !self.collision.is_static_or_kinematic_object()
    }

    /// The collision part of the body
    pub fn collision_object(&self) -> &CollisionObject {
        &self.collision
    }

    /// Mutable access to the collision part of the body
    pub fn collision_object_mut(&mut self) -> &mut CollisionObject {
        &mut self.collision
    }

    /// Raw world transform of the center of mass
    pub fn world_transform(&self) -> &Transform {
        self.collision.world_transform()
    }

    /// Teleport the body
    pub fn set_world_transform(&mut self, transform: Transform) {
        self.collision.set_world_transform(transform);
    }

    /// Position of the center of mass
    pub fn center_of_mass_position(&self) -> Vec3 {
        self.collision.world_transform().origin
    }

    /// Get the motion state, if the body has one
    pub fn motion_state(&self) -> Option<&MotionState> {
        self.motion_state.as_ref()
    }

    /// Get the motion state mutably, if the body has one
    pub fn motion_state_mut(&mut self) -> Option<&mut MotionState> {
        self.motion_state.as_mut()
    }

    /// Get the collision flags
    pub fn collision_flags(&self) -> CollisionFlags {
        self.collision.collision_flags()
    }

    /// Replace the collision flags
    pub fn set_collision_flags(&mut self, flags: CollisionFlags) {
        self.collision.set_collision_flags(flags);
    }

    /// Surface friction
    pub fn friction(&self) -> f32 {
        self.collision.material.friction
    }

    /// Set the surface friction
    pub fn set_friction(&mut self, friction: f32) {
        self.collision.material.friction = friction.clamp(0.0, crate::material::MAX_FRICTION);
    }

    /// Surface restitution
    pub fn restitution(&self) -> f32 {
        self.collision.material.restitution
    }

    /// Set the surface restitution
    pub fn set_restitution(&mut self, restitution: f32) {
        self.collision.material.restitution = restitution.clamp(0.0, 1.0);
    }

    /// Change velocity by `impulse / mass`
    pub fn apply_central_impulse(&mut self, impulse: Vec3) {
        self.linear_velocity += impulse * self.inverse_mass();
    }

    /// Accumulate a force for the next step
    pub fn apply_central_force(&mut self, force: Vec3) {
        self.total_force += force;
    }

    /// Forces accumulated since the last step
    pub fn total_force(&self) -> Vec3 {
        self.total_force
    }

    pub(crate) fn clear_forces(&mut self) {
        self.total_force = Vec3::ZERO;
    }

    /// Take the body apart, handing back the shape and motion state
    pub fn into_parts(self) -> RigidBodyParts {
        RigidBodyParts {
            shape: self.collision.into_shape(),
            motion_state: self.motion_state,
        }
    }
}

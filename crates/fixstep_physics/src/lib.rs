//! Rigid body dynamics for fixstep
//!
//! This crate provides the physics world consumed by the simulation loop:
//! - Collision shapes (spheres, boxes, static planes, triangle meshes)
//! - Collision filtering via group/mask bit sets
//! - Rigid bodies with motion states for interpolated rendering
//! - A discrete dynamics world built from a configuration, dispatcher,
//!   broadphase and sequential impulse solver

pub mod action;
pub mod body;
pub mod body_set;
pub mod broadphase;
pub mod collision;
pub mod dispatcher;
pub mod material;
pub mod shapes;
pub mod solver;
pub mod world;

// Re-export commonly used types
pub use action::Action;
pub use body::{ActionKey, BodyKey, CollisionObject, MotionState, RigidBody, RigidBodyConstructionInfo, RigidBodyParts};
pub use body_set::{BodySet, WorldBody};
pub use broadphase::SweepBroadphase;
pub use collision::{CollisionFilter, CollisionFlags, CollisionGroups, Contact};
pub use dispatcher::{CollisionConfiguration, CollisionDispatcher, ContactPoint};
pub use material::PhysicsMaterial;
pub use shapes::{CollisionShape, TriangleMesh};
pub use solver::SequentialImpulseSolver;
pub use world::{DiscreteDynamicsWorld, DynamicsWorld};

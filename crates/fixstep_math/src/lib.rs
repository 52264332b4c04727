//! 3D Mathematics Library
//!
//! This crate provides the small value types shared by the fixstep physics
//! world and the simulation loop.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector
//! - [`Quat`] - unit quaternion rotation
//! - [`Mat3`] / [`Mat4`] - column-major matrices with free-function helpers
//! - [`Transform`] - rotation basis plus origin
//! - [`Aabb`] - axis-aligned bounding box

mod vec3;
mod quat;
mod transform;
mod aabb;
pub mod mat3;
pub mod mat4;

pub use vec3::Vec3;
pub use quat::Quat;
pub use transform::Transform;
pub use aabb::Aabb;
pub use mat3::Mat3;
pub use mat4::Mat4;

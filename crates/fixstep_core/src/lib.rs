//! Core simulation loop for fixstep
//!
//! This crate couples a variable-rate render loop to a fixed-rate physics
//! loop:
//! - [`FixedTimestep`] banks wall-clock time and releases it as whole steps
//! - [`SimulationObject`] pairs a physics body with a render representation
//!   and enforces its add/remove/dispose lifecycle
//! - [`SimulationWorld`] owns the physics world and the object registry and
//!   drives one frame through the [`SimulationApp`] hooks
//! - [`ScratchPool`] and [`WindowedStats`] support the hot path

pub mod mesh;
pub mod object;
pub mod overlay;
pub mod pool;
pub mod render;
pub mod stats;
pub mod timestep;
pub mod world;

// Re-export commonly used types
pub use mesh::Mesh;
pub use object::{triangle_mesh_shape, AssetRef, MeshShapeError, ObjectKind, ObjectState, SimulationObject};
pub use overlay::Overlay;
pub use pool::{Pool, Pooled, ScratchPool};
pub use render::{Primitive, RenderContext, Texture};
pub use stats::WindowedStats;
pub use timestep::{Advance, Clock, FixedTimestep, ManualClock, MonotonicClock};
pub use world::{Frame, FrameReport, ObjectKey, SimulationApp, SimulationSettings, SimulationWorld};

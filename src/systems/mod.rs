//! Application systems
//!
//! Headless rendering and the demo run loop, kept out of main.rs for testability.

mod render;
mod simulation;

pub use render::{FrameStats, HeadlessRenderer, RenderError};
pub use simulation::{RunSummary, SimulationSystem};

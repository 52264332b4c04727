//! fixstep - fixed-timestep rigid body demo
//!
//! Library entry point for the demo binary and its integration tests.

pub mod config;
pub mod demo;
pub mod input;
pub mod systems;

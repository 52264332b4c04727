//! Input handling module
//!
//! Provides input mapping from raw events to demo actions.

mod input_mapper;

pub use input_mapper::{DropShape, InputAction, InputEvent, InputMapper};

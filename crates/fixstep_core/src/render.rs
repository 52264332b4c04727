//! Render contract between the simulation and a graphics backend
//!
//! The simulation never talks to a GPU. It drives a [`RenderContext`] that a
//! backend implements; the context keeps a transform stack in the manner of
//! fixed-function pipelines, and objects draw in the space of the transform
//! on top of it.

use crate::mesh::Mesh;
use fixstep_math::Mat4;

/// How a mesh's indices are assembled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Primitive {
    #[default]
    Triangles,
    TriangleStrip,
    Lines,
}

/// Opaque handle to a texture owned by the backend
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Texture {
    name: String,
}

impl Texture {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        log::trace!("Releasing texture '{}'", self.name);
    }
}

/// What the simulation needs from a graphics backend each frame
pub trait RenderContext {
    /// Clear the color and depth buffers
    fn clear(&mut self);

    /// Set up the scene camera; the transform stack starts at identity
    fn begin_scene(&mut self);

    /// Push `transform` multiplied onto the current top of the stack
    fn push_transform(&mut self, transform: &Mat4);

    /// Restore the transform from before the matching push
    fn pop_transform(&mut self);

    fn enable_lighting(&mut self);

    fn disable_lighting(&mut self);

    /// Draw a mesh under the current transform
    fn draw_mesh(&mut self, mesh: &Mesh, primitive: Primitive, texture: Option<&Texture>);

    /// Switch to screen-space drawing for the overlay
    fn begin_overlay(&mut self);

    /// Draw a line of text at pixel position (`x`, `y`)
    fn draw_text(&mut self, x: f32, y: f32, text: &str);

    /// Height of capital letters in the overlay font, in pixels
    fn cap_height(&self) -> f32 {
        12.0
    }
}

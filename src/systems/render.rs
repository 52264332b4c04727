//! Headless rendering system
//!
//! Implements [`RenderContext`] without a GPU. It tracks:
//! - Draw calls and the primitives and textures they used
//! - The transform stack, which must be balanced at the end of each frame
//! - The last overlay line

use fixstep_core::{Mesh, Primitive, RenderContext, Texture};
use fixstep_math::{mat4, Mat4};

/// Render error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// More pops than pushes during the frame
    StackUnderflow,
    /// Transforms still pushed when the frame ended
    UnbalancedStack(usize),
    /// Lighting left on when the overlay was drawn
    LightingInOverlay,
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::StackUnderflow => write!(f, "Transform stack underflow"),
            RenderError::UnbalancedStack(depth) => {
                write!(f, "Transform stack left at depth {}", depth)
            }
            RenderError::LightingInOverlay => write!(f, "Overlay drawn with lighting enabled"),
        }
    }
}

impl std::error::Error for RenderError {}

/// What one frame drew
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub vertices: usize,
    pub textured_draws: usize,
}

/// Records draw calls instead of issuing them
pub struct HeadlessRenderer {
    stack: Vec<Mat4>,
    lighting: bool,
    in_overlay: bool,
    frame: FrameStats,
    error: Option<RenderError>,
    overlay_text: String,
    frames: u64,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            stack: vec![mat4::IDENTITY],
            lighting: false,
            in_overlay: false,
            frame: FrameStats::default(),
            error: None,
            overlay_text: String::new(),
            frames: 0,
        }
    }

    /// Reset per-frame counters
    pub fn begin_frame(&mut self) {
        self.stack.truncate(1);
        self.lighting = false;
        self.in_overlay = false;
        self.frame = FrameStats::default();
        self.error = None;
    }

    /// Finish the frame, checking the transform stack came back to the root
    pub fn end_frame(&mut self) -> Result<FrameStats, RenderError> {
        self.frames += 1;
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        if self.stack.len() != 1 {
            return Err(RenderError::UnbalancedStack(self.stack.len() - 1));
        }
        Ok(self.frame)
    }

    /// The top of the transform stack
    pub fn current_transform(&self) -> Mat4 {
        self.stack.last().copied().unwrap_or(mat4::IDENTITY)
    }

    /// Overlay line drawn during the last frame
    pub fn overlay_text(&self) -> &str {
        &self.overlay_text
    }

    /// Frames finished so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn fail(&mut self, error: RenderError) {
        if self.error.is_none() {
            log::error!("Render error: {}", error);
            self.error = Some(error);
        }
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext for HeadlessRenderer {
    fn clear(&mut self) {
        self.in_overlay = false;
    }

    fn begin_scene(&mut self) {
        self.stack.truncate(1);
    }

    fn push_transform(&mut self, transform: &Mat4) {
        let top = mat4::mul(&self.current_transform(), transform);
        self.stack.push(top);
    }

    fn pop_transform(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            self.fail(RenderError::StackUnderflow);
        }
    }

    fn enable_lighting(&mut self) {
        self.lighting = true;
    }

    fn disable_lighting(&mut self) {
        self.lighting = false;
    }

    fn draw_mesh(&mut self, mesh: &Mesh, primitive: Primitive, texture: Option<&Texture>) {
        self.frame.draw_calls += 1;
        self.frame.vertices += if mesh.is_indexed() {
            mesh.index_count()
        } else {
            mesh.vertex_count()
        };
        if texture.is_some() {
            self.frame.textured_draws += 1;
        }
        log::trace!(
            "draw {:?}: {} vertices, texture {:?}",
            primitive,
            mesh.vertex_count(),
            texture.map(Texture::name)
        );
    }

    fn begin_overlay(&mut self) {
        self.in_overlay = true;
    }

    fn draw_text(&mut self, _x: f32, _y: f32, text: &str) {
        if self.in_overlay && self.lighting {
            self.fail(RenderError::LightingInOverlay);
        }
        self.overlay_text.clear();
        self.overlay_text.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixstep_math::Vec3;

    #[test]
    fn test_render_error_display() {
        assert_eq!(format!("{}", RenderError::StackUnderflow), "Transform stack underflow");
        assert_eq!(
            format!("{}", RenderError::UnbalancedStack(2)),
            "Transform stack left at depth 2"
        );
    }

    #[test]
    fn test_balanced_frame_counts_draws() {
        let mut renderer = HeadlessRenderer::new();
        let mesh = Mesh::quad(2.0, 2.0);
        let texture = Texture::new("ground");

        renderer.begin_frame();
        renderer.push_transform(&mat4::translation(Vec3::new(0.0, 0.0, 5.0)));
        renderer.draw_mesh(&mesh, Primitive::Triangles, Some(&texture));
        renderer.pop_transform();
        renderer.draw_mesh(&mesh, Primitive::Triangles, None);

        let stats = renderer.end_frame().unwrap();
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.vertices, 12);
        assert_eq!(stats.textured_draws, 1);
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn test_pushes_compose() {
        let mut renderer = HeadlessRenderer::new();
        renderer.push_transform(&mat4::translation(Vec3::new(1.0, 0.0, 0.0)));
        renderer.push_transform(&mat4::translation(Vec3::new(0.0, 2.0, 0.0)));
        let top = renderer.current_transform();
        assert_eq!(mat4::transform_point(&top, Vec3::ZERO), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_unbalanced_stack_reported() {
        let mut renderer = HeadlessRenderer::new();
        renderer.begin_frame();
        renderer.push_transform(&mat4::IDENTITY);
        assert_eq!(renderer.end_frame(), Err(RenderError::UnbalancedStack(1)));
    }

    #[test]
    fn test_underflow_reported() {
        let mut renderer = HeadlessRenderer::new();
        renderer.begin_frame();
        renderer.pop_transform();
        assert_eq!(renderer.end_frame(), Err(RenderError::StackUnderflow));
    }

    #[test]
    fn test_overlay_with_lighting_reported() {
        let mut renderer = HeadlessRenderer::new();
        renderer.begin_frame();
        renderer.enable_lighting();
        renderer.begin_overlay();
        renderer.draw_text(10.0, 22.0, "fps: 60");
        assert_eq!(renderer.end_frame(), Err(RenderError::LightingInOverlay));
        assert_eq!(renderer.overlay_text(), "fps: 60");
    }
}

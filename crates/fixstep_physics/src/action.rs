//! Per-step callbacks registered with a dynamics world

use crate::body_set::BodySet;

/// Custom behavior run by the world once per internal step
///
/// Actions run before integration and may read or modify any body.
pub trait Action {
    /// Update bodies for a step of `delta_time` seconds
    fn update_action(&mut self, bodies: &mut BodySet, delta_time: f32);
}

impl<F> Action for F
where
    F: FnMut(&mut BodySet, f32),
{
    fn update_action(&mut self, bodies: &mut BodySet, delta_time: f32) {
        self(bodies, delta_time)
    }
}

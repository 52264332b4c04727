//! The simulation world: physics, objects and the per-frame loop
//!
//! [`SimulationWorld`] owns the dynamics world, the registry of live
//! [`SimulationObject`]s and the fixed-timestep accumulator. Each call to
//! [`SimulationWorld::frame`] runs, in order:
//!
//! 1. pending spawns and despawns from the previous frame
//! 2. [`SimulationApp::pre_physics`]
//! 3. zero or more fixed physics steps
//! 4. [`SimulationApp::post_physics`]
//! 5. clear, [`SimulationApp::post_clear`], [`SimulationApp::position_lights`]
//! 6. every registered object, in insertion order
//! 7. [`SimulationApp::render_scene`]
//! 8. the overlay line, then [`SimulationApp::render_overlay`]
//!
//! Objects spawned or despawned from hooks are queued and applied at the
//! start of the next frame, so the registry never changes while it is being
//! walked.

use crate::object::SimulationObject;
use crate::overlay::Overlay;
use crate::pool::ScratchPool;
use crate::render::RenderContext;
use crate::stats::WindowedStats;
use crate::timestep::{Clock, FixedTimestep, MonotonicClock};
use fixstep_math::Vec3;
use fixstep_physics::{
    CollisionConfiguration, CollisionDispatcher, DiscreteDynamicsWorld, DynamicsWorld, SequentialImpulseSolver,
    SweepBroadphase,
};
use slotmap::{new_key_type, SlotMap};
use std::mem;
use std::time::Instant;

new_key_type! {
    /// Key to an object registered with a [`SimulationWorld`]
    pub struct ObjectKey;
}

/// Parameters fixed when the world is built
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationSettings {
    /// Length of one physics step in seconds
    pub step_seconds: f32,
    pub gravity: Vec3,
    /// Samples kept for the step cost average
    pub stats_window: usize,
    /// Most steps per frame; `None` catches up without limit
    pub max_steps_per_frame: Option<u32>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            step_seconds: 1.0 / 60.0,
            gravity: Vec3::new(0.0, 0.0, -9.8),
            stats_window: 30,
            max_steps_per_frame: None,
        }
    }
}

/// What happened during one frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Simulated seconds advanced (a multiple of the step)
    pub physics_delta: f32,
    pub steps: u32,
    pub objects_rendered: usize,
}

/// Application hooks driven by [`SimulationWorld`]
///
/// Only [`SimulationApp::populate`] is required.
pub trait SimulationApp {
    /// Add the initial objects; called once, on first show
    fn populate(&mut self, frame: &mut Frame<'_>);

    fn pre_physics(&mut self, _frame: &mut Frame<'_>, _graphics_delta: f32) {}

    /// Called after stepping with the simulated time that actually elapsed
    fn post_physics(&mut self, _frame: &mut Frame<'_>, _graphics_delta: f32, _physics_delta: f32) {}

    fn post_clear(&mut self, _ctx: &mut dyn RenderContext, _graphics_delta: f32, _physics_delta: f32) {}

    fn position_lights(&mut self, _ctx: &mut dyn RenderContext, _graphics_delta: f32, _physics_delta: f32) {}

    /// Draw anything that is not a simulation object
    fn render_scene(&mut self, _ctx: &mut dyn RenderContext, _graphics_delta: f32, _physics_delta: f32) {}

    fn render_overlay(&mut self, _ctx: &mut dyn RenderContext, _graphics_delta: f32, _physics_delta: f32) {}

    /// Text put in front of the overlay line
    fn overlay_prefix(&self) -> &str {
        ""
    }
}

enum Pending {
    Spawn(SimulationObject),
    Despawn(ObjectKey),
}

/// Owns the physics world and every live simulation object
///
/// Every object in the registry is in the physics world and every body the
/// registry put in the physics world is in the registry.
pub struct SimulationWorld {
    objects: SlotMap<ObjectKey, SimulationObject>,
    order: Vec<ObjectKey>,
    pending: Vec<Pending>,
    physics: DiscreteDynamicsWorld,
    timestep: FixedTimestep,
    stats: WindowedStats,
    scratch: ScratchPool,
    overlay: Overlay,
    clock: Box<dyn Clock>,
    paused: bool,
    shown: bool,
    shut_down: bool,
}

impl SimulationWorld {
    /// Create a world timed by the monotonic clock
    pub fn new(settings: SimulationSettings) -> Self {
        Self::with_clock(settings, MonotonicClock::new())
    }

    /// Create a world timed by `clock`
    pub fn with_clock(settings: SimulationSettings, clock: impl Clock + 'static) -> Self {
        let configuration = CollisionConfiguration::default();
        let dispatcher = CollisionDispatcher::new(&configuration);
        let broadphase = SweepBroadphase::new();
        let solver = SequentialImpulseSolver::new();
        let mut physics = DiscreteDynamicsWorld::new(dispatcher, broadphase, solver, configuration);
        physics.set_gravity(settings.gravity);

        log::info!(
            "Simulation world created: step {:.4}s, gravity {:?}",
            settings.step_seconds,
            settings.gravity
        );

        Self {
            objects: SlotMap::with_key(),
            order: Vec::new(),
            pending: Vec::new(),
            physics,
            timestep: FixedTimestep::new(settings.step_seconds)
                .with_max_steps_per_frame(settings.max_steps_per_frame),
            stats: WindowedStats::new(settings.stats_window.max(1)),
            scratch: ScratchPool::new(),
            overlay: Overlay::new(),
            clock: Box::new(clock),
            paused: false,
            shown: false,
            shut_down: false,
        }
    }

    /// Put an initialized object in the physics world and the registry
    ///
    /// # Panics
    ///
    /// Panics if the object is not initialized or is already in a world.
    pub fn add_object(&mut self, mut object: SimulationObject) -> ObjectKey {
        object.add_to_world(&mut self.physics);
        let key = self.objects.insert(object);
        self.order.push(key);
        log::debug!("Added simulation object {:?}", key);
        key
    }

    /// Take an object out of the physics world and the registry
    ///
    /// The caller owns the returned object and is responsible for disposing
    /// of it.
    pub fn remove_object(&mut self, key: ObjectKey) -> Option<SimulationObject> {
        let mut object = self.objects.remove(key)?;
        self.order.retain(|&k| k != key);
        object.remove_from_world(&mut self.physics);
        log::debug!("Removed simulation object {:?}", key);
        Some(object)
    }

    pub fn object(&self, key: ObjectKey) -> Option<&SimulationObject> {
        self.objects.get(key)
    }

    pub fn object_mut(&mut self, key: ObjectKey) -> Option<&mut SimulationObject> {
        self.objects.get_mut(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Object keys in render order
    pub fn object_keys(&self) -> impl Iterator<Item = ObjectKey> + '_ {
        self.order.iter().copied()
    }

    /// Populate the world the first time it is shown
    pub fn show(&mut self, app: &mut (impl SimulationApp + ?Sized)) {
        self.timestep.rebase(self.clock.now_nanos());
        if self.shown {
            return;
        }
        self.shown = true;
        app.populate(&mut Frame { world: self });
        self.flush_pending();
        log::info!("Simulation world populated with {} objects", self.objects.len());
    }

    /// Stop stepping physics; frames keep rendering
    pub fn pause(&mut self) {
        if !self.paused {
            log::info!("Simulation paused");
            self.paused = true;
        }
    }

    /// Resume stepping from now, without replaying the paused time
    pub fn resume(&mut self) {
        if self.paused {
            log::info!("Simulation resumed");
            self.paused = false;
            self.timestep.rebase(self.clock.now_nanos());
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Run one frame
    pub fn frame(
        &mut self,
        app: &mut (impl SimulationApp + ?Sized),
        ctx: &mut dyn RenderContext,
        graphics_delta: f32,
    ) -> FrameReport {
        self.flush_pending();

        app.pre_physics(&mut Frame { world: self }, graphics_delta);
        let advance = self.step_physics();
        let physics_delta = advance.physics_delta;
        app.post_physics(&mut Frame { world: self }, graphics_delta, physics_delta);

        ctx.clear();
        app.post_clear(ctx, graphics_delta, physics_delta);
        ctx.begin_scene();
        app.position_lights(ctx, graphics_delta, physics_delta);

        let objects_rendered = self.render_objects(ctx);
        app.render_scene(ctx, graphics_delta, physics_delta);

        ctx.disable_lighting();
        ctx.begin_overlay();
        let y = 10.0 + ctx.cap_height();
        let text = self.overlay.update(
            self.clock.now_nanos(),
            app.overlay_prefix(),
            self.paused,
            self.objects.len(),
            &self.stats,
        );
        ctx.draw_text(10.0, y, text);
        app.render_overlay(ctx, graphics_delta, physics_delta);

        FrameReport {
            physics_delta,
            steps: advance.steps,
            objects_rendered,
        }
    }

    fn step_physics(&mut self) -> crate::timestep::Advance {
        let now = self.clock.now_nanos();
        let step = self.timestep.step_seconds();
        let physics = &mut self.physics;
        let stats = &mut self.stats;

        self.timestep.advance(now, self.paused, || {
            let started = Instant::now();
            // The accumulator does the sub-stepping; ask for exactly one step
            physics.step_simulation(step, 0, step);
            stats.add(started.elapsed().as_nanos() as i64);
        })
    }

    fn render_objects(&mut self, ctx: &mut dyn RenderContext) -> usize {
        let mut rendered = 0;
        for key in &self.order {
            if let Some(object) = self.objects.get(*key) {
                object.render(ctx, &self.physics, &mut self.scratch);
                rendered += 1;
            }
        }
        rendered
    }

    fn flush_pending(&mut self) {
        for pending in mem::take(&mut self.pending) {
            match pending {
                Pending::Spawn(object) => {
                    self.add_object(object);
                }
                Pending::Despawn(key) => {
                    if let Some(object) = self.remove_object(key) {
                        object.dispose();
                    }
                }
            }
        }
    }

    /// Remove and dispose every object; the physics world goes last
    ///
    /// Also run on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        for pending in mem::take(&mut self.pending) {
            if let Pending::Spawn(object) = pending {
                object.dispose();
            }
        }
        for key in mem::take(&mut self.order) {
            if let Some(mut object) = self.objects.remove(key) {
                object.remove_from_world(&mut self.physics);
                object.dispose();
            }
        }
        log::info!("Simulation world shut down");
    }

    pub fn physics(&self) -> &DiscreteDynamicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut DiscreteDynamicsWorld {
        &mut self.physics
    }

    /// Wall-clock cost of recent physics steps, in nanoseconds
    pub fn stats(&self) -> &WindowedStats {
        &self.stats
    }

    pub fn scratch(&mut self) -> &mut ScratchPool {
        &mut self.scratch
    }

    pub fn timestep(&self) -> &FixedTimestep {
        &self.timestep
    }

    /// The overlay line from the last frame
    pub fn overlay_text(&self) -> &str {
        self.overlay.text()
    }
}

impl Drop for SimulationWorld {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Access to the world from inside a hook
///
/// Spawns and despawns are queued until the start of the next frame.
pub struct Frame<'a> {
    world: &'a mut SimulationWorld,
}

impl Frame<'_> {
    /// Queue an initialized object to be added
    pub fn spawn(&mut self, object: SimulationObject) {
        self.world.pending.push(Pending::Spawn(object));
    }

    /// Queue an object to be removed and disposed
    pub fn despawn(&mut self, key: ObjectKey) {
        self.world.pending.push(Pending::Despawn(key));
    }

    pub fn pause(&mut self) {
        self.world.pause();
    }

    pub fn resume(&mut self) {
        self.world.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.world.paused
    }

    pub fn scratch(&mut self) -> &mut ScratchPool {
        &mut self.world.scratch
    }

    pub fn physics(&self) -> &DiscreteDynamicsWorld {
        &self.world.physics
    }

    pub fn object(&self, key: ObjectKey) -> Option<&SimulationObject> {
        self.world.objects.get(key)
    }

    pub fn object_count(&self) -> usize {
        self.world.objects.len()
    }

    pub fn object_keys(&self) -> impl Iterator<Item = ObjectKey> + '_ {
        self.world.object_keys()
    }

    /// Objects queued for the next frame
    pub fn pending_count(&self) -> usize {
        self.world.pending.len()
    }
}

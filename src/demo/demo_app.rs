//! DemoApp - drops boxes and spheres onto a static ground
//!
//! Input is queued with [`DemoApp::handle`] and applied at the start of the
//! next frame, before physics steps. Dropped objects share one mesh per shape
//! and one texture, so disposing them never frees the render data.

use crate::config::{DemoConfig, TerrainKind};
use crate::input::{DropShape, InputAction, InputEvent, InputMapper};
use fixstep_core::{
    triangle_mesh_shape, AssetRef, Frame, Mesh, Primitive, SimulationApp, SimulationObject, Texture,
};
use fixstep_math::{Transform, Vec3};
use fixstep_physics::{CollisionFlags, CollisionShape, TriangleMesh};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Arc;

/// Cells along each side of the mesh terrain
const TERRAIN_CELLS: u16 = 25;

/// Distance from the origin of the flat ground along +Z
const PLANE_CONSTANT: f32 = 1.0;

/// Half the side of the square objects are dropped over
const DROP_SPREAD: f32 = 5.0;

pub struct DemoApp {
    config: DemoConfig,
    rng: StdRng,
    box_mesh: Arc<Mesh>,
    sphere_mesh: Arc<Mesh>,
    texture: Arc<Texture>,
    /// Triangle data the terrain's collision shape was built from
    terrain_triangles: Option<Arc<TriangleMesh>>,
    actions: VecDeque<InputAction>,
    reset_requested: bool,
    dropped: usize,
    prefix: String,
}

impl DemoApp {
    pub fn new(config: DemoConfig) -> Self {
        let prefix = format!("(d:drop {}, g:trim, p:pause, r:reset) ", config.drop_count);
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            box_mesh: Arc::new(Mesh::cuboid(Vec3::ONE)),
            sphere_mesh: Arc::new(Mesh::sphere(1.0, 16, 8)),
            texture: Arc::new(Texture::new("badlogic")),
            terrain_triangles: None,
            actions: VecDeque::new(),
            reset_requested: false,
            dropped: 0,
            prefix,
            config,
        }
    }

    /// Queue a raw input event; unbound input is ignored
    pub fn handle(&mut self, event: InputEvent) {
        if let Some(action) = InputMapper::map(event) {
            log::debug!("Input {:?} -> {:?}", event, action);
            self.actions.push_back(action);
        }
    }

    /// Queue an action directly
    pub fn push_action(&mut self, action: InputAction) {
        self.actions.push_back(action);
    }

    /// Whether a reset was asked for; clears the request
    pub fn take_reset_request(&mut self) -> bool {
        std::mem::take(&mut self.reset_requested)
    }

    /// Objects dropped since the app was created
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn terrain_triangles(&self) -> Option<&Arc<TriangleMesh>> {
        self.terrain_triangles.as_ref()
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    fn apply(&mut self, frame: &mut Frame<'_>, action: InputAction) {
        match action {
            InputAction::TogglePause => {
                if frame.is_paused() {
                    frame.resume();
                } else {
                    frame.pause();
                }
            }
            InputAction::DropMany => {
                for _ in 0..self.config.drop_count {
                    self.drop_thing(frame, DropShape::Random);
                }
            }
            InputAction::DropOne(shape) => self.drop_thing(frame, shape),
            InputAction::Reset => {
                log::info!("Reset requested");
                self.reset_requested = true;
            }
            InputAction::TrimScratch => frame.scratch().clear(),
        }
    }

    /// Drop one object from a random spot above the ground
    ///
    /// Ignored while paused.
    fn drop_thing(&mut self, frame: &mut Frame<'_>, shape: DropShape) {
        if frame.is_paused() {
            return;
        }

        let shape = match shape {
            DropShape::Random if self.rng.gen_bool(0.5) => DropShape::Box,
            DropShape::Random => DropShape::Sphere,
            chosen => chosen,
        };
        let x = self.rng.gen::<f32>() * 2.0 * DROP_SPREAD - DROP_SPREAD;
        let y = self.rng.gen::<f32>() * 2.0 * DROP_SPREAD - DROP_SPREAD;
        let start = Transform::from_origin(Vec3::new(x, y, self.config.drop_height));

        let (mesh, collision) = match shape {
            DropShape::Box => (&self.box_mesh, CollisionShape::cuboid(Vec3::ONE)),
            _ => (&self.sphere_mesh, CollisionShape::sphere(1.0)),
        };
        let mut object = SimulationObject::mesh(
            AssetRef::shared(mesh),
            Primitive::Triangles,
            Some(AssetRef::shared(&self.texture)),
        );
        object.initialize(collision, self.config.drop_mass, None, &start, frame.scratch());
        frame.spawn(object);
        self.dropped += 1;
    }

    fn ground_plane(&self, frame: &mut Frame<'_>) -> SimulationObject {
        SimulationObject::static_plane(
            Vec3::Z,
            PLANE_CONSTANT,
            None,
            self.config.plane_size,
            self.config.plane_size,
            Some(AssetRef::shared(&self.texture)),
            frame.scratch(),
        )
    }

    fn ground_mesh(&mut self, frame: &mut Frame<'_>) -> SimulationObject {
        let cell_size = self.config.plane_size / f32::from(TERRAIN_CELLS);
        let terrain = Mesh::height_field(TERRAIN_CELLS, cell_size, |x, y| 0.5 * (x * 0.3).sin() * (y * 0.3).cos());

        let (shape, triangles) = match triangle_mesh_shape(&terrain, frame.scratch()) {
            Ok(built) => built,
            Err(e) => {
                log::warn!("Failed to build terrain shape: {}. Using a flat plane.", e);
                return self.ground_plane(frame);
            }
        };

        let mut object = SimulationObject::mesh(
            AssetRef::owned(terrain),
            Primitive::Triangles,
            Some(AssetRef::shared(&self.texture)),
        );
        object.initialize(shape, 0.0, None, &Transform::IDENTITY, frame.scratch());
        object.set_collision_flags(CollisionFlags::STATIC_OBJECT);
        self.terrain_triangles = Some(triangles);
        object
    }
}

impl SimulationApp for DemoApp {
    fn populate(&mut self, frame: &mut Frame<'_>) {
        let ground = match self.config.terrain {
            TerrainKind::Plane => self.ground_plane(frame),
            TerrainKind::Mesh => self.ground_mesh(frame),
        };
        frame.spawn(ground);
        log::info!("Demo populated with {:?} terrain", self.config.terrain);
    }

    fn pre_physics(&mut self, frame: &mut Frame<'_>, _graphics_delta: f32) {
        while let Some(action) = self.actions.pop_front() {
            self.apply(frame, action);
        }
    }

    fn overlay_prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::HeadlessRenderer;
    use fixstep_core::{ManualClock, SimulationSettings, SimulationWorld};
    use fixstep_physics::DynamicsWorld;

    struct Harness {
        clock: ManualClock,
        world: SimulationWorld,
        app: DemoApp,
        renderer: HeadlessRenderer,
    }

    impl Harness {
        fn new(config: DemoConfig) -> Self {
            let clock = ManualClock::new();
            let mut world = SimulationWorld::with_clock(SimulationSettings::default(), clock.clone());
            let mut app = DemoApp::new(config);
            world.show(&mut app);
            Self {
                clock,
                world,
                app,
                renderer: HeadlessRenderer::new(),
            }
        }

        fn frame(&mut self) -> u32 {
            self.clock.advance(self.world.timestep().step_nanos());
            self.world.frame(&mut self.app, &mut self.renderer, 1.0 / 60.0).steps
        }
    }

    #[test]
    fn test_populate_adds_plane() {
        let harness = Harness::new(DemoConfig::default());
        assert_eq!(harness.world.object_count(), 1);
        assert!(harness.app.terrain_triangles().is_none());
    }

    #[test]
    fn test_mesh_terrain_keeps_triangles() {
        let config = DemoConfig {
            terrain: TerrainKind::Mesh,
            ..DemoConfig::default()
        };
        let harness = Harness::new(config);
        assert_eq!(harness.world.object_count(), 1);

        let triangles = harness.app.terrain_triangles().unwrap();
        let cells = usize::from(TERRAIN_CELLS);
        assert_eq!(triangles.triangle_count(), cells * cells * 2);

        let key = harness.world.object_keys().next().unwrap();
        assert!(!harness.world.object(key).unwrap().is_dynamic());
    }

    #[test]
    fn test_drop_key_spawns_batch_next_frame() {
        let mut harness = Harness::new(DemoConfig::default());
        harness.app.handle(InputEvent::KeyTyped('d'));
        harness.frame();
        assert_eq!(harness.app.dropped(), 20);
        assert_eq!(harness.world.object_count(), 1);

        harness.frame();
        assert_eq!(harness.world.object_count(), 21);
        assert_eq!(harness.world.physics().body_count(), 21);
    }

    #[test]
    fn test_drops_ignored_while_paused() {
        let mut harness = Harness::new(DemoConfig::default());
        harness.app.handle(InputEvent::KeyTyped('p'));
        harness.app.handle(InputEvent::KeyTyped('d'));
        harness.app.handle(InputEvent::Click { x: 0.0, width: 800.0 });
        assert_eq!(harness.frame(), 0);
        assert!(harness.world.is_paused());
        assert_eq!(harness.app.dropped(), 0);

        harness.app.handle(InputEvent::KeyTyped('p'));
        harness.frame();
        assert!(!harness.world.is_paused());
    }

    #[test]
    fn test_dropped_objects_start_above_ground() {
        let mut harness = Harness::new(DemoConfig::default());
        harness.app.push_action(InputAction::DropOne(DropShape::Sphere));
        harness.frame();
        harness.frame();

        let key = harness.world.object_keys().nth(1).unwrap();
        let object = harness.world.object(key).unwrap();
        let transform = object.graphics_transform(harness.world.physics()).unwrap();
        assert!(transform.origin.x.abs() <= DROP_SPREAD);
        assert!(transform.origin.y.abs() <= DROP_SPREAD);
        assert!(transform.origin.z > 19.0 && transform.origin.z <= 20.0);
    }

    #[test]
    fn test_same_seed_same_drops() {
        let positions = |seed: u64| {
            let mut harness = Harness::new(DemoConfig {
                seed,
                drop_count: 3,
                ..DemoConfig::default()
            });
            harness.app.push_action(InputAction::DropMany);
            harness.frame();
            harness.frame();
            let keys: Vec<_> = harness.world.object_keys().skip(1).collect();
            keys.iter()
                .map(|&k| harness.world.object(k).unwrap().graphics_transform(harness.world.physics()).unwrap().origin)
                .collect::<Vec<_>>()
        };
        assert_eq!(positions(7), positions(7));
    }

    #[test]
    fn test_reset_and_trim_requests() {
        let mut harness = Harness::new(DemoConfig::default());
        harness.app.handle(InputEvent::KeyTyped('r'));
        harness.app.handle(InputEvent::KeyTyped('g'));
        harness.frame();
        assert!(harness.app.take_reset_request());
        assert!(!harness.app.take_reset_request());
        assert_eq!(harness.world.object_count(), 1);
    }

    #[test]
    fn test_overlay_prefix_names_drop_count() {
        let app = DemoApp::new(DemoConfig {
            drop_count: 5,
            ..DemoConfig::default()
        });
        assert_eq!(app.overlay_prefix(), "(d:drop 5, g:trim, p:pause, r:reset) ");
    }
}

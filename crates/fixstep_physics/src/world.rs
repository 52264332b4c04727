//! Dynamics world and simulation stepping

use crate::action::Action;
use crate::body::{ActionKey, BodyKey, CollisionObject, RigidBody};
use crate::body_set::{BodySet, WorldBody};
use crate::broadphase::{Proxy, SweepBroadphase};
use crate::collision::{CollisionFilter, CollisionGroups};
use crate::dispatcher::{CollisionConfiguration, CollisionDispatcher, ContactPoint};
use crate::solver::SequentialImpulseSolver;
use fixstep_math::{Transform, Vec3};
use slotmap::SlotMap;

/// The physics capability driven by a simulation loop
///
/// Bodies move into the world when added and are handed back when removed.
pub trait DynamicsWorld {
    /// Set the gravity applied to every dynamic body
    fn set_gravity(&mut self, gravity: Vec3);

    /// Current gravity
    fn gravity(&self) -> Vec3;

    /// Advance the simulation, returning the number of internal steps taken
    ///
    /// With `max_sub_steps == 0` exactly one step of `time_step` is taken and
    /// motion states receive the raw result. Otherwise time is accumulated,
    /// up to `max_sub_steps` steps of `fixed_time_step` are taken and motion
    /// states are interpolated by the leftover time.
    fn step_simulation(&mut self, time_step: f32, max_sub_steps: u32, fixed_time_step: f32) -> u32;

    /// Register a rigid body with the given filter
    fn add_rigid_body(&mut self, body: RigidBody, group: CollisionGroups, mask: CollisionGroups) -> BodyKey;

    /// Unregister a rigid body, handing it back
    fn remove_rigid_body(&mut self, key: BodyKey) -> Option<RigidBody>;

    /// Register a plain collision object with the given filter
    fn add_collision_object(
        &mut self,
        object: CollisionObject,
        group: CollisionGroups,
        mask: CollisionGroups,
    ) -> BodyKey;

    /// Unregister a plain collision object, handing it back
    fn remove_collision_object(&mut self, key: BodyKey) -> Option<CollisionObject>;

    /// Register an action run once per internal step
    fn add_action(&mut self, action: Box<dyn Action>) -> ActionKey;

    /// Unregister an action, handing it back
    fn remove_action(&mut self, key: ActionKey) -> Option<Box<dyn Action>>;

    /// Get a rigid body by key
    fn rigid_body(&self, key: BodyKey) -> Option<&RigidBody>;

    /// Get a mutable rigid body by key
    fn rigid_body_mut(&mut self, key: BodyKey) -> Option<&mut RigidBody>;

    /// Get the collision part of any registered body
    fn collision_object(&self, key: BodyKey) -> Option<&CollisionObject>;

    /// Number of registered bodies (rigid and plain)
    fn body_count(&self) -> usize;

    /// Number of registered actions
    fn action_count(&self) -> usize;
}

/// Reference dynamics world
///
/// Owns its broadphase, dispatcher, solver and configuration. Fields drop in
/// declaration order, so teardown runs world state, broadphase, dispatcher,
/// solver, configuration.
pub struct DiscreteDynamicsWorld {
    bodies: BodySet,
    actions: SlotMap<ActionKey, Box<dyn Action>>,
    gravity: Vec3,
    local_time: f32,
    pairs: Vec<(BodyKey, BodyKey)>,
    contacts: Vec<ContactPoint>,
    broadphase: SweepBroadphase,
    dispatcher: CollisionDispatcher,
    solver: SequentialImpulseSolver,
    configuration: CollisionConfiguration,
}

impl DiscreteDynamicsWorld {
    /// Create a world from its collaborating parts
    pub fn new(
        dispatcher: CollisionDispatcher,
        broadphase: SweepBroadphase,
        solver: SequentialImpulseSolver,
        configuration: CollisionConfiguration,
    ) -> Self {
        log::debug!("Creating dynamics world");
        Self {
            bodies: BodySet::new(),
            actions: SlotMap::with_key(),
            gravity: Vec3::new(0.0, 0.0, -9.81),
            local_time: 0.0,
            pairs: Vec::new(),
            contacts: Vec::new(),
            broadphase,
            dispatcher,
            solver,
            configuration,
        }
    }

    /// Build the whole chain with default parts
    pub fn with_defaults() -> Self {
        let configuration = CollisionConfiguration::default();
        let dispatcher = CollisionDispatcher::new(&configuration);
        let broadphase = SweepBroadphase::new();
        let solver = SequentialImpulseSolver::new();
        Self::new(dispatcher, broadphase, solver, configuration)
    }

    /// Registered bodies
    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    /// The configuration the world was built from
    pub fn configuration(&self) -> &CollisionConfiguration {
        &self.configuration
    }

    /// Contacts found during the last internal step
    pub fn contacts(&self) -> &[ContactPoint] {
        &self.contacts
    }

    fn internal_single_step(&mut self, dt: f32) {
        for (_, action) in self.actions.iter_mut() {
            action.update_action(&mut self.bodies, dt);
        }

        self.apply_forces(dt);
        self.update_kinematic_bodies();
        self.perform_discrete_collision_detection();

        self.solver.solve_group(&mut self.bodies, &self.contacts);

        self.integrate_transforms(dt);
    }

    fn apply_forces(&mut self, dt: f32) {
        let gravity = self.gravity;
        for (_, body) in self.bodies.rigid_bodies_mut() {
            if !body.is_dynamic() {
                continue;
            }
            let acceleration = gravity + body.total_force() * body.inverse_mass();
            body.linear_velocity += acceleration * dt;
            body.linear_velocity *= (1.0 - body.linear_damping).powf(dt);
            body.angular_velocity *= (1.0 - body.angular_damping).powf(dt);
        }
    }

    fn update_kinematic_bodies(&mut self) {
        for (_, body) in self.bodies.rigid_bodies_mut() {
            if !body.collision_object().is_kinematic_object() {
                continue;
            }
            if let Some(transform) = body.motion_state().map(|state| state.world_transform()) {
                body.set_world_transform(transform);
            }
        }
    }

    fn perform_discrete_collision_detection(&mut self) {
        let proxies = self.bodies.entries().map(|(key, entry)| {
            let object = entry.body.collision_object();
            Proxy {
                key,
                aabb: object.aabb(),
                filter: entry.filter,
                immovable: object.is_static_or_kinematic_object(),
            }
        });
        self.broadphase.set_proxies(proxies);

        self.pairs.clear();
        self.pairs.extend_from_slice(self.broadphase.calculate_overlapping_pairs());

        self.contacts.clear();
        self.dispatcher
            .dispatch_all_collision_pairs(&self.bodies, &self.pairs, &mut self.contacts);
    }

    fn integrate_transforms(&mut self, dt: f32) {
        for (_, body) in self.bodies.rigid_bodies_mut() {
            if !body.is_dynamic() {
                continue;
            }
            let predicted = predict_transform(body.world_transform(), body.linear_velocity, body.angular_velocity, dt);
            body.set_world_transform(predicted);
        }
    }

    fn synchronize_motion_states(&mut self, interpolation_time: f32) {
        for (_, body) in self.bodies.rigid_bodies_mut() {
            if !body.is_dynamic() {
                continue;
            }
            let transform = if interpolation_time > 0.0 {
                predict_transform(body.world_transform(), body.linear_velocity, body.angular_velocity, interpolation_time)
            } else {
                *body.world_transform()
            };
            if let Some(state) = body.motion_state_mut() {
                state.set_world_transform(&transform);
            }
        }
    }

    fn clear_forces(&mut self) {
        for (_, body) in self.bodies.rigid_bodies_mut() {
            body.clear_forces();
        }
    }
}

/// Integrate a transform forward by `dt` seconds of constant velocity
fn predict_transform(transform: &Transform, linear_velocity: Vec3, angular_velocity: Vec3, dt: f32) -> Transform {
    let rotation = transform.rotation().integrate(angular_velocity, dt);
    Transform::from_rotation_origin(rotation, transform.origin + linear_velocity * dt)
}

impl DynamicsWorld for DiscreteDynamicsWorld {
    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn step_simulation(&mut self, time_step: f32, max_sub_steps: u32, fixed_time_step: f32) -> u32 {
        let (num_steps, step, clamped) = if max_sub_steps > 0 && fixed_time_step > 0.0 {
            self.local_time += time_step;
            let num_steps = (self.local_time / fixed_time_step) as u32;
            self.local_time -= num_steps as f32 * fixed_time_step;
            (num_steps, fixed_time_step, num_steps.min(max_sub_steps))
        } else {
            // Variable step: one step of the full duration, no remainder
            self.local_time = 0.0;
            let num_steps = u32::from(time_step > 0.0);
            (num_steps, time_step, num_steps)
        };

        for _ in 0..clamped {
            self.internal_single_step(step);
        }

        let interpolation_time = self.local_time;
        self.synchronize_motion_states(interpolation_time);
        self.clear_forces();
        num_steps
    }

    fn add_rigid_body(&mut self, body: RigidBody, group: CollisionGroups, mask: CollisionGroups) -> BodyKey {
        let key = self
            .bodies
            .insert(WorldBody::Rigid(body), CollisionFilter::new(group, mask));
        log::debug!("Added rigid body {:?} (group {:?})", key, group);
        key
    }

    fn remove_rigid_body(&mut self, key: BodyKey) -> Option<RigidBody> {
        if self.bodies.rigid_body(key).is_none() {
            return None;
        }
        match self.bodies.remove(key)? {
            WorldBody::Rigid(body) => {
                log::debug!("Removed rigid body {:?}", key);
                Some(body)
            }
            WorldBody::Collision(_) => None,
        }
    }

    fn add_collision_object(
        &mut self,
        object: CollisionObject,
        group: CollisionGroups,
        mask: CollisionGroups,
    ) -> BodyKey {
        let key = self
            .bodies
            .insert(WorldBody::Collision(object), CollisionFilter::new(group, mask));
        log::debug!("Added collision object {:?} (group {:?})", key, group);
        key
    }

    fn remove_collision_object(&mut self, key: BodyKey) -> Option<CollisionObject> {
        if self.bodies.rigid_body(key).is_some() || !self.bodies.contains(key) {
            return None;
        }
        match self.bodies.remove(key)? {
            WorldBody::Collision(object) => {
                log::debug!("Removed collision object {:?}", key);
                Some(object)
            }
            WorldBody::Rigid(_) => None,
        }
    }

    fn add_action(&mut self, action: Box<dyn Action>) -> ActionKey {
        self.actions.insert(action)
    }

    fn remove_action(&mut self, key: ActionKey) -> Option<Box<dyn Action>> {
        self.actions.remove(key)
    }

    fn rigid_body(&self, key: BodyKey) -> Option<&RigidBody> {
        self.bodies.rigid_body(key)
    }

    fn rigid_body_mut(&mut self, key: BodyKey) -> Option<&mut RigidBody> {
        self.bodies.rigid_body_mut(key)
    }

    fn collision_object(&self, key: BodyKey) -> Option<&CollisionObject> {
        self.bodies.collision_object(key)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn action_count(&self) -> usize {
        self.actions.len()
    }
}

impl Drop for DiscreteDynamicsWorld {
    fn drop(&mut self) {
        if !self.bodies.is_empty() {
            log::warn!("Dynamics world dropped with {} bodies still registered", self.bodies.len());
        }
        log::trace!("Releasing dynamics world");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{MotionState, RigidBodyConstructionInfo};
    use crate::shapes::CollisionShape;

    const STEP: f32 = 1.0 / 60.0;

    fn sphere_body(mass: f32, origin: Vec3) -> RigidBody {
        let shape = CollisionShape::sphere(1.0);
        let inertia = shape.calculate_local_inertia(mass);
        RigidBody::new(RigidBodyConstructionInfo::new(
            mass,
            Some(MotionState::new(Transform::from_origin(origin))),
            shape,
            inertia,
        ))
    }

    fn world_with_ground() -> DiscreteDynamicsWorld {
        let mut world = DiscreteDynamicsWorld::with_defaults();
        world.set_gravity(Vec3::new(0.0, 0.0, -9.8));
        world.add_collision_object(
            CollisionObject::new(CollisionShape::static_plane(Vec3::Z, 0.0), Transform::IDENTITY),
            CollisionGroups::STATIC,
            CollisionGroups::ALL ^ CollisionGroups::STATIC,
        );
        world
    }

    #[test]
    fn test_add_and_remove_rigid_body() {
        let mut world = DiscreteDynamicsWorld::with_defaults();
        let key = world.add_rigid_body(sphere_body(1.0, Vec3::ZERO), CollisionGroups::DEFAULT, CollisionGroups::ALL);
        assert_eq!(world.body_count(), 1);
        assert!(world.rigid_body(key).is_some());

        assert!(world.remove_collision_object(key).is_none());
        assert!(world.remove_rigid_body(key).is_some());
        assert_eq!(world.body_count(), 0);
        assert!(world.remove_rigid_body(key).is_none());
    }

    #[test]
    fn test_single_step_free_fall() {
        let mut world = DiscreteDynamicsWorld::with_defaults();
        world.set_gravity(Vec3::new(0.0, 0.0, -9.8));
        let key = world.add_rigid_body(sphere_body(50.0, Vec3::new(0.0, 0.0, 20.0)), CollisionGroups::DEFAULT, CollisionGroups::ALL);

        assert_eq!(world.step_simulation(STEP, 0, STEP), 1);

        let body = world.rigid_body(key).unwrap();
        assert!((body.linear_velocity.z + 9.8 * STEP).abs() < 0.0001);
        assert!(body.center_of_mass_position().z < 20.0);
        // No interpolation remainder: the motion state matches the body
        let state = body.motion_state().unwrap();
        assert_eq!(state.graphics_world_transform.origin, body.center_of_mass_position());
    }

    #[test]
    fn test_sub_stepping_accumulates() {
        let mut world = DiscreteDynamicsWorld::with_defaults();
        assert_eq!(world.step_simulation(STEP * 0.5, 10, STEP), 0);
        assert_eq!(world.step_simulation(STEP * 0.75, 10, STEP), 1);
        assert_eq!(world.step_simulation(STEP * 3.0, 10, STEP), 3);
    }

    #[test]
    fn test_sphere_comes_to_rest_on_ground() {
        let mut world = world_with_ground();
        let key = world.add_rigid_body(sphere_body(50.0, Vec3::new(0.0, 0.0, 5.0)), CollisionGroups::DEFAULT, CollisionGroups::ALL);

        for _ in 0..300 {
            world.step_simulation(STEP, 0, STEP);
        }

        let z = world.rigid_body(key).unwrap().center_of_mass_position().z;
        assert!(z > 0.8 && z < 1.1, "sphere should rest on the ground, got z={}", z);
    }

    #[test]
    fn test_static_body_does_not_move() {
        let mut world = world_with_ground();
        let key = world.add_rigid_body(sphere_body(0.0, Vec3::new(0.0, 0.0, 5.0)), CollisionGroups::STATIC, CollisionGroups::ALL);
        for _ in 0..10 {
            world.step_simulation(STEP, 0, STEP);
        }
        assert_eq!(world.rigid_body(key).unwrap().center_of_mass_position(), Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_filtered_bodies_pass_through_each_other() {
        let mut world = world_with_ground();
        world.set_gravity(Vec3::ZERO);
        let a = world.add_rigid_body(sphere_body(1.0, Vec3::new(0.0, 0.0, 5.0)), CollisionGroups::DEBRIS, CollisionGroups::STATIC);
        let b = world.add_rigid_body(sphere_body(1.0, Vec3::new(0.5, 0.0, 5.0)), CollisionGroups::DEBRIS, CollisionGroups::STATIC);
        world.step_simulation(STEP, 0, STEP);
        assert!(world.contacts().is_empty());
        assert_eq!(world.rigid_body(a).unwrap().center_of_mass_position(), Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(world.rigid_body(b).unwrap().center_of_mass_position(), Vec3::new(0.5, 0.0, 5.0));
    }

    #[test]
    fn test_action_runs_each_step() {
        let mut world = DiscreteDynamicsWorld::with_defaults();
        world.set_gravity(Vec3::ZERO);
        let key = world.add_rigid_body(sphere_body(1.0, Vec3::ZERO), CollisionGroups::DEFAULT, CollisionGroups::ALL);

        let push = move |bodies: &mut BodySet, _dt: f32| {
            if let Some(body) = bodies.rigid_body_mut(key) {
                body.linear_velocity.x += 1.0;
            }
        };
        let action = world.add_action(Box::new(push));
        world.step_simulation(STEP, 0, STEP);
        world.step_simulation(STEP, 0, STEP);
        assert_eq!(world.rigid_body(key).unwrap().linear_velocity.x, 2.0);

        assert!(world.remove_action(action).is_some());
        assert_eq!(world.action_count(), 0);
        world.step_simulation(STEP, 0, STEP);
        assert_eq!(world.rigid_body(key).unwrap().linear_velocity.x, 2.0);
    }
}

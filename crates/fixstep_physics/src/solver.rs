//! Sequential impulse contact solver
//!
//! Copies the velocities of every body touched by a contact into a flat
//! solver array, applies normal and friction impulses over a fixed number of
//! iterations, pushes overlapping bodies apart and writes the result back.

use crate::body::BodyKey;
use crate::body_set::BodySet;
use crate::dispatcher::ContactPoint;
use fixstep_math::{mat3, Mat3, Vec3};
use slotmap::SecondaryMap;

/// Solver-side copy of a body
#[derive(Clone, Copy, Debug)]
struct SolverBody {
    key: BodyKey,
    inverse_mass: f32,
    inverse_inertia: Mat3,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    center: Vec3,
    correction: Vec3,
    dynamic: bool,
}

impl SolverBody {
    fn velocity_at(&self, r: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(r)
    }

    fn apply_impulse(&mut self, impulse: Vec3, r: Vec3) {
        if !self.dynamic {
            return;
        }
        self.linear_velocity += impulse * self.inverse_mass;
        self.angular_velocity += mat3::transform(&self.inverse_inertia, r.cross(impulse));
    }

    fn effective_mass_term(&self, r: Vec3, direction: Vec3) -> f32 {
        let rxd = r.cross(direction);
        self.inverse_mass + direction.dot(mat3::transform(&self.inverse_inertia, rxd).cross(r))
    }
}

/// Solver-side copy of a contact
#[derive(Clone, Copy, Debug)]
struct SolverContact {
    a: usize,
    b: usize,
    normal: Vec3,
    tangents: [Vec3; 2],
    ra: Vec3,
    rb: Vec3,
    penetration: f32,
    friction: f32,
    target_normal_velocity: f32,
    normal_mass: f32,
    tangent_mass: [f32; 2],
    normal_impulse: f32,
    tangent_impulse: [f32; 2],
}

/// Sequential impulse solver
#[derive(Debug)]
pub struct SequentialImpulseSolver {
    /// Velocity iterations per step
    pub iterations: u32,
    /// Fraction of the remaining penetration removed per contact per step
    pub correction_fraction: f32,
    /// Penetration tolerated without correction
    pub slop: f32,
    /// Closing speed below which contacts do not bounce
    pub restitution_threshold: f32,
    bodies: Vec<SolverBody>,
    index: SecondaryMap<BodyKey, usize>,
    contacts: Vec<SolverContact>,
}

impl Default for SequentialImpulseSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialImpulseSolver {
    /// Create a solver with default tuning
    pub fn new() -> Self {
        Self {
            iterations: 10,
            correction_fraction: 0.2,
            slop: 0.01,
            restitution_threshold: 1.0,
            bodies: Vec::new(),
            index: SecondaryMap::new(),
            contacts: Vec::new(),
        }
    }

    /// Set the number of velocity iterations
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    /// Resolve all contacts of one step, updating body velocities and positions
    pub fn solve_group(&mut self, bodies: &mut BodySet, points: &[ContactPoint]) {
        self.bodies.clear();
        self.index.clear();
        self.contacts.clear();

        for point in points {
            self.add_contact(bodies, point);
        }
        if self.contacts.is_empty() {
            return;
        }

        for _ in 0..self.iterations {
            for i in 0..self.contacts.len() {
                self.solve_contact(i);
            }
        }

        self.correct_positions();

        for solver_body in &self.bodies {
            if !solver_body.dynamic {
                continue;
            }
            if let Some(body) = bodies.rigid_body_mut(solver_body.key) {
                body.linear_velocity = solver_body.linear_velocity;
                body.angular_velocity = solver_body.angular_velocity;
                let mut transform = *body.world_transform();
                transform.origin += solver_body.correction;
                body.set_world_transform(transform);
            }
        }
    }

    fn solver_body_index(&mut self, bodies: &BodySet, key: BodyKey) -> Option<usize> {
        if let Some(&index) = self.index.get(key) {
            return Some(index);
        }

        let object = bodies.collision_object(key)?;
        let solver_body = match bodies.rigid_body(key) {
            Some(body) => SolverBody {
                key,
                inverse_mass: body.inverse_mass(),
                inverse_inertia: body.inverse_inertia_world(),
                linear_velocity: body.linear_velocity,
                angular_velocity: body.angular_velocity,
                center: body.center_of_mass_position(),
                correction: Vec3::ZERO,
                dynamic: body.is_dynamic(),
            },
            None => SolverBody {
                key,
                inverse_mass: 0.0,
                inverse_inertia: [[0.0; 3]; 3],
                linear_velocity: Vec3::ZERO,
                angular_velocity: Vec3::ZERO,
                center: object.world_transform().origin,
                correction: Vec3::ZERO,
                dynamic: false,
            },
        };

        let index = self.bodies.len();
        self.bodies.push(solver_body);
        self.index.insert(key, index);
        Some(index)
    }

    fn add_contact(&mut self, bodies: &BodySet, point: &ContactPoint) {
        let (Some(object_a), Some(object_b)) =
            (bodies.collision_object(point.body_a), bodies.collision_object(point.body_b))
        else {
            return;
        };
        if !object_a.has_contact_response() || !object_b.has_contact_response() {
            return;
        }
        let material = object_a.material.combine(&object_b.material);

        let (Some(a), Some(b)) = (
            self.solver_body_index(bodies, point.body_a),
            self.solver_body_index(bodies, point.body_b),
        ) else {
            return;
        };
        let (body_a, body_b) = (self.bodies[a], self.bodies[b]);
        if !body_a.dynamic && !body_b.dynamic {
            return;
        }

        let normal = point.contact.normal;
        let ra = point.contact.point - body_a.center;
        let rb = point.contact.point - body_b.center;
        let tangents = plane_space(normal);
        let inverse = |k: f32| if k > 0.0 { 1.0 / k } else { 0.0 };

        let closing = (body_a.velocity_at(ra) - body_b.velocity_at(rb)).dot(normal);
        let target_normal_velocity = if -closing > self.restitution_threshold {
            -closing * material.restitution
        } else {
            0.0
        };

        self.contacts.push(SolverContact {
            a,
            b,
            normal,
            tangents,
            ra,
            rb,
            penetration: point.contact.penetration,
            friction: material.friction,
            target_normal_velocity,
            normal_mass: inverse(body_a.effective_mass_term(ra, normal) + body_b.effective_mass_term(rb, normal)),
            tangent_mass: [
                inverse(body_a.effective_mass_term(ra, tangents[0]) + body_b.effective_mass_term(rb, tangents[0])),
                inverse(body_a.effective_mass_term(ra, tangents[1]) + body_b.effective_mass_term(rb, tangents[1])),
            ],
            normal_impulse: 0.0,
            tangent_impulse: [0.0; 2],
        });
    }

    fn solve_contact(&mut self, index: usize) {
        let mut c = self.contacts[index];

        // Normal impulse, accumulated and kept non-negative
        let relative = self.bodies[c.a].velocity_at(c.ra) - self.bodies[c.b].velocity_at(c.rb);
        let lambda = (c.target_normal_velocity - relative.dot(c.normal)) * c.normal_mass;
        let accumulated = (c.normal_impulse + lambda).max(0.0);
        let delta = accumulated - c.normal_impulse;
        c.normal_impulse = accumulated;
        self.apply(c.a, c.b, c.normal * delta, c.ra, c.rb);

        // Friction along both tangents, bounded by the normal impulse
        let limit = c.friction * c.normal_impulse;
        for axis in 0..2 {
            let tangent = c.tangents[axis];
            let relative = self.bodies[c.a].velocity_at(c.ra) - self.bodies[c.b].velocity_at(c.rb);
            let lambda = -relative.dot(tangent) * c.tangent_mass[axis];
            let accumulated = (c.tangent_impulse[axis] + lambda).clamp(-limit, limit);
            let delta = accumulated - c.tangent_impulse[axis];
            c.tangent_impulse[axis] = accumulated;
            self.apply(c.a, c.b, tangent * delta, c.ra, c.rb);
        }

        self.contacts[index] = c;
    }

    fn apply(&mut self, a: usize, b: usize, impulse: Vec3, ra: Vec3, rb: Vec3) {
        self.bodies[a].apply_impulse(impulse, ra);
        self.bodies[b].apply_impulse(-impulse, rb);
    }

    fn correct_positions(&mut self) {
        for c in &self.contacts {
            let depth = (c.penetration - self.slop).max(0.0) * self.correction_fraction;
            if depth <= 0.0 {
                continue;
            }
            let (a, b) = (&self.bodies[c.a], &self.bodies[c.b]);
            let inverse_a = if a.dynamic { a.inverse_mass } else { 0.0 };
            let inverse_b = if b.dynamic { b.inverse_mass } else { 0.0 };
            let total = inverse_a + inverse_b;
            if total <= 0.0 {
                continue;
            }
            let push = c.normal * (depth / total);
            self.bodies[c.a].correction += push * inverse_a;
            self.bodies[c.b].correction -= push * inverse_b;
        }
    }
}

impl Drop for SequentialImpulseSolver {
    fn drop(&mut self) {
        log::trace!("Releasing constraint solver");
    }
}

/// Two unit tangents perpendicular to `n` and to each other
fn plane_space(n: Vec3) -> [Vec3; 2] {
    let helper = if n.x.abs() > 0.57 { Vec3::Y } else { Vec3::X };
    let t1 = n.cross(helper).normalized();
    [t1, n.cross(t1)]
}

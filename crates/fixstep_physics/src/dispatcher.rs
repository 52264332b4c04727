//! Collision configuration and narrowphase dispatch

use crate::body::BodyKey;
use crate::body_set::BodySet;
use crate::collision::{generate_contacts, Contact};

/// Tuning shared by the dispatcher and solver
///
/// Built first and released last: every other part of the world is
/// created from it.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionConfiguration {
    /// Most contacts kept per body pair per step (the deepest win)
    pub max_contacts_per_pair: usize,
    /// Contacts shallower than this are ignored
    pub contact_threshold: f32,
}

impl Default for CollisionConfiguration {
    fn default() -> Self {
        Self {
            max_contacts_per_pair: 4,
            contact_threshold: 0.0,
        }
    }
}

impl Drop for CollisionConfiguration {
    fn drop(&mut self) {
        log::trace!("Releasing collision configuration");
    }
}

/// A contact between two registered bodies
#[derive(Clone, Copy, Debug)]
pub struct ContactPoint {
    pub body_a: BodyKey,
    pub body_b: BodyKey,
    /// Normal points from `body_b` toward `body_a`
    pub contact: Contact,
}

/// Runs the narrowphase for every broadphase pair
#[derive(Debug)]
pub struct CollisionDispatcher {
    max_contacts_per_pair: usize,
    contact_threshold: f32,
    scratch: Vec<Contact>,
}

impl CollisionDispatcher {
    /// Create a dispatcher from a configuration
    pub fn new(configuration: &CollisionConfiguration) -> Self {
        Self {
            max_contacts_per_pair: configuration.max_contacts_per_pair.max(1),
            contact_threshold: configuration.contact_threshold,
            scratch: Vec::with_capacity(16),
        }
    }

    /// Generate contacts for all pairs, appending them to `out`
    pub fn dispatch_all_collision_pairs(
        &mut self,
        bodies: &BodySet,
        pairs: &[(BodyKey, BodyKey)],
        out: &mut Vec<ContactPoint>,
    ) {
        for &(key_a, key_b) in pairs {
            let (Some(a), Some(b)) = (bodies.collision_object(key_a), bodies.collision_object(key_b)) else {
                continue;
            };

            self.scratch.clear();
            generate_contacts(a.shape(), a.world_transform(), b.shape(), b.world_transform(), &mut self.scratch);

            let threshold = self.contact_threshold;
            self.scratch.retain(|c| c.penetration > threshold);
            if self.scratch.len() > self.max_contacts_per_pair {
                self.scratch
                    .sort_by(|x, y| y.penetration.total_cmp(&x.penetration));
                self.scratch.truncate(self.max_contacts_per_pair);
            }

            out.extend(self.scratch.iter().map(|&contact| ContactPoint {
                body_a: key_a,
                body_b: key_b,
                contact,
            }));
        }
    }
}

impl Drop for CollisionDispatcher {
    fn drop(&mut self) {
        log::trace!("Releasing collision dispatcher");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::CollisionObject;
    use crate::body_set::WorldBody;
    use crate::collision::CollisionFilter;
    use crate::shapes::CollisionShape;
    use fixstep_math::{Transform, Vec3};

    #[test]
    fn test_box_on_plane_keeps_deepest_contacts() {
        let mut bodies = BodySet::new();
        let ground = bodies.insert(
            WorldBody::Collision(CollisionObject::new(CollisionShape::static_plane(Vec3::Z, 0.0), Transform::IDENTITY)),
            CollisionFilter::static_world(),
        );
        // Sunk below the plane so all eight corners report
        let cube = bodies.insert(
            WorldBody::Collision(CollisionObject::new(
                CollisionShape::cuboid(Vec3::ONE),
                Transform::from_origin(Vec3::new(0.0, 0.0, -5.0)),
            )),
            CollisionFilter::dynamic(),
        );

        let configuration = CollisionConfiguration::default();
        let mut dispatcher = CollisionDispatcher::new(&configuration);
        let mut out = Vec::new();
        dispatcher.dispatch_all_collision_pairs(&bodies, &[(cube, ground)], &mut out);

        assert_eq!(out.len(), configuration.max_contacts_per_pair);
        assert!(out.iter().all(|p| p.body_a == cube && p.body_b == ground));
        assert!(out.iter().all(|p| (p.contact.penetration - 6.0).abs() < 0.0001));
    }

    #[test]
    fn test_stale_pair_is_skipped() {
        let mut bodies = BodySet::new();
        let key = bodies.insert(
            WorldBody::Collision(CollisionObject::new(CollisionShape::sphere(1.0), Transform::IDENTITY)),
            CollisionFilter::dynamic(),
        );
        let other = bodies.insert(
            WorldBody::Collision(CollisionObject::new(CollisionShape::sphere(1.0), Transform::IDENTITY)),
            CollisionFilter::dynamic(),
        );
        bodies.remove(other);

        let mut dispatcher = CollisionDispatcher::new(&CollisionConfiguration::default());
        let mut out = Vec::new();
        dispatcher.dispatch_all_collision_pairs(&bodies, &[(key, other)], &mut out);
        assert!(out.is_empty());
    }
}

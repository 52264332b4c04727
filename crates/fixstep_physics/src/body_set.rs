//! Storage for the bodies registered with a dynamics world

use crate::body::{BodyKey, CollisionObject, RigidBody};
use crate::collision::CollisionFilter;
use slotmap::SlotMap;

/// A registered body: either a rigid body or a plain collision object
#[derive(Clone, Debug)]
pub enum WorldBody {
    Rigid(RigidBody),
    Collision(CollisionObject),
}

impl WorldBody {
    /// The collision part shared by both kinds
    pub fn collision_object(&self) -> &CollisionObject {
        match self {
            Self::Rigid(body) => body.collision_object(),
            Self::Collision(object) => object,
        }
    }

    /// Check whether this is a rigid body
    pub fn is_rigid(&self) -> bool {
        matches!(self, Self::Rigid(_))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct BodyEntry {
    pub(crate) body: WorldBody,
    pub(crate) filter: CollisionFilter,
}

/// All bodies in a dynamics world, keyed by generational [`BodyKey`]s
///
/// Actions receive mutable access to the set once per internal step.
#[derive(Debug, Default)]
pub struct BodySet {
    entries: SlotMap<BodyKey, BodyEntry>,
}

impl BodySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
        }
    }

    /// Number of bodies (rigid and plain)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether a key is still live
    pub fn contains(&self, key: BodyKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Get a rigid body by key
    pub fn rigid_body(&self, key: BodyKey) -> Option<&RigidBody> {
        match &self.entries.get(key)?.body {
            WorldBody::Rigid(body) => Some(body),
            WorldBody::Collision(_) => None,
        }
    }

    /// Get a mutable rigid body by key
    pub fn rigid_body_mut(&mut self, key: BodyKey) -> Option<&mut RigidBody> {
        match &mut self.entries.get_mut(key)?.body {
            WorldBody::Rigid(body) => Some(body),
            WorldBody::Collision(_) => None,
        }
    }

    /// Get the collision part of any body by key
    pub fn collision_object(&self, key: BodyKey) -> Option<&CollisionObject> {
        self.entries.get(key).map(|entry| entry.body.collision_object())
    }

    /// Get the collision filter a body was registered with
    pub fn filter(&self, key: BodyKey) -> Option<CollisionFilter> {
        self.entries.get(key).map(|entry| entry.filter)
    }

    /// Iterate over all keys
    pub fn keys(&self) -> impl Iterator<Item = BodyKey> + '_ {
        self.entries.keys()
    }

    /// Iterate over all rigid bodies
    pub fn rigid_bodies(&self) -> impl Iterator<Item = (BodyKey, &RigidBody)> {
        self.entries.iter().filter_map(|(key, entry)| match &entry.body {
            WorldBody::Rigid(body) => Some((key, body)),
            WorldBody::Collision(_) => None,
        })
    }

    /// Iterate mutably over all rigid bodies
    pub fn rigid_bodies_mut(&mut self) -> impl Iterator<Item = (BodyKey, &mut RigidBody)> {
        self.entries.iter_mut().filter_map(|(key, entry)| match &mut entry.body {
            WorldBody::Rigid(body) => Some((key, body)),
            WorldBody::Collision(_) => None,
        })
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (BodyKey, &BodyEntry)> {
        self.entries.iter()
    }

    pub(crate) fn insert(&mut self, body: WorldBody, filter: CollisionFilter) -> BodyKey {
        self.entries.insert(BodyEntry { body, filter })
    }

    pub(crate) fn remove(&mut self, key: BodyKey) -> Option<WorldBody> {
        self.entries.remove(key).map(|entry| entry.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{MotionState, RigidBodyConstructionInfo};
    use crate::shapes::CollisionShape;
    use fixstep_math::{Transform, Vec3};

    fn sphere() -> RigidBody {
        let shape = CollisionShape::sphere(1.0);
        let inertia = shape.calculate_local_inertia(1.0);
        RigidBody::new(RigidBodyConstructionInfo::new(1.0, Some(MotionState::default()), shape, inertia))
    }

    #[test]
    fn test_rigid_and_plain_bodies() {
        let mut set = BodySet::new();
        let rigid = set.insert(WorldBody::Rigid(sphere()), CollisionFilter::dynamic());
        let plain = set.insert(
            WorldBody::Collision(CollisionObject::new(CollisionShape::static_plane(Vec3::Z, 0.0), Transform::IDENTITY)),
            CollisionFilter::static_world(),
        );

        assert_eq!(set.len(), 2);
        assert!(set.rigid_body(rigid).is_some());
        assert!(set.rigid_body(plain).is_none());
        assert!(set.collision_object(plain).is_some());
        assert_eq!(set.rigid_bodies().count(), 1);
        assert_eq!(set.filter(plain), Some(CollisionFilter::static_world()));
    }

    #[test]
    fn test_stale_key_after_remove() {
        let mut set = BodySet::new();
        let key = set.insert(WorldBody::Rigid(sphere()), CollisionFilter::dynamic());
        assert!(set.remove(key).is_some());
        assert!(!set.contains(key));
        assert!(set.remove(key).is_none());

        let new_key = set.insert(WorldBody::Rigid(sphere()), CollisionFilter::dynamic());
        assert!(set.rigid_body(key).is_none());
        assert!(set.rigid_body(new_key).is_some());
    }
}

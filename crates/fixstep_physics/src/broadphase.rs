//! Broadphase pair search
//!
//! Sorts proxies along the X axis and sweeps for overlapping boxes. Pairs
//! rejected by the collision filter or made of two immovable objects are
//! dropped here so the narrowphase never sees them.

use crate::body::BodyKey;
use crate::collision::CollisionFilter;
use fixstep_math::Aabb;

/// A body's entry in the broadphase
#[derive(Clone, Copy, Debug)]
pub struct Proxy {
    pub key: BodyKey,
    pub aabb: Aabb,
    pub filter: CollisionFilter,
    /// Static or kinematic; two immovable proxies never pair
    pub immovable: bool,
}

/// Sort-and-sweep broadphase
#[derive(Debug, Default)]
pub struct SweepBroadphase {
    proxies: Vec<Proxy>,
    pairs: Vec<(BodyKey, BodyKey)>,
}

impl SweepBroadphase {
    /// Create an empty broadphase
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all proxies for this step
    pub fn set_proxies(&mut self, proxies: impl IntoIterator<Item = Proxy>) {
        self.proxies.clear();
        self.proxies.extend(proxies);
    }

    /// Find all overlapping, filter-compatible pairs among the current proxies
    pub fn calculate_overlapping_pairs(&mut self) -> &[(BodyKey, BodyKey)] {
        self.pairs.clear();
        self.proxies
            .sort_by(|a, b| a.aabb.min.x.total_cmp(&b.aabb.min.x));

        for i in 0..self.proxies.len() {
            let a = &self.proxies[i];
            for b in &self.proxies[i + 1..] {
                if b.aabb.min.x > a.aabb.max.x {
                    break;
                }
                if a.immovable && b.immovable {
                    continue;
                }
                if !a.filter.collides_with(&b.filter) {
                    continue;
                }
                if a.aabb.intersects(&b.aabb) {
                    self.pairs.push((a.key, b.key));
                }
            }
        }

        &self.pairs
    }

    /// Number of proxies from the last update
    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }
}

impl Drop for SweepBroadphase {
    fn drop(&mut self) {
        log::trace!("Releasing broadphase ({} proxies)", self.proxies.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionGroups;
    use fixstep_math::Vec3;
    use slotmap::SlotMap;

    fn proxy(key: BodyKey, center: Vec3, filter: CollisionFilter, immovable: bool) -> Proxy {
        Proxy {
            key,
            aabb: Aabb::from_center_half_extents(center, Vec3::ONE),
            filter,
            immovable,
        }
    }

    #[test]
    fn test_overlapping_pair_found() {
        let mut keys: SlotMap<BodyKey, ()> = SlotMap::with_key();
        let (a, b, c) = (keys.insert(()), keys.insert(()), keys.insert(()));

        let mut broadphase = SweepBroadphase::new();
        broadphase.set_proxies([
            proxy(a, Vec3::ZERO, CollisionFilter::dynamic(), false),
            proxy(b, Vec3::new(1.5, 0.0, 0.0), CollisionFilter::dynamic(), false),
            proxy(c, Vec3::new(10.0, 0.0, 0.0), CollisionFilter::dynamic(), false),
        ]);

        let pairs = broadphase.calculate_overlapping_pairs();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0] == (a, b) || pairs[0] == (b, a));
    }

    #[test]
    fn test_filter_and_static_pairs_rejected() {
        let mut keys: SlotMap<BodyKey, ()> = SlotMap::with_key();
        let (a, b, c) = (keys.insert(()), keys.insert(()), keys.insert(()));
        let ghost = CollisionFilter::new(CollisionGroups::DEBRIS, CollisionGroups::DEBRIS);

        let mut broadphase = SweepBroadphase::new();
        broadphase.set_proxies([
            proxy(a, Vec3::ZERO, CollisionFilter::static_world(), true),
            proxy(b, Vec3::ZERO, CollisionFilter::static_world(), true),
            proxy(c, Vec3::ZERO, ghost, false),
        ]);

        assert!(broadphase.calculate_overlapping_pairs().is_empty());
        assert_eq!(broadphase.proxy_count(), 3);
    }
}

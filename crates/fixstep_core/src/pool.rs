//! Scratch pools for transient math values
//!
//! Hot per-frame code borrows vectors, matrices and transforms from a
//! [`ScratchPool`] and hands them back when done, so steady-state frames do
//! not allocate. There is no tracking: a value must not be used after it has
//! been freed.
//!
//! # Architecture
//!
//! - [`Pooled`] - Implemented by value types that can be reset and reused
//! - [`Pool`] - Free list for one type
//! - [`ScratchPool`] - One [`Pool`] per type, keyed by `TypeId`

use fixstep_math::{Aabb, Mat3, Mat4, Quat, Transform, Vec3};
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Most idle instances a pool keeps by default
pub const DEFAULT_MAX_FREE: usize = 64;

/// A value that can be recycled through a [`Pool`]
pub trait Pooled: Sized + 'static {
    /// A newly built instance
    fn fresh() -> Self;

    /// Return to the state of [`Pooled::fresh`]
    fn reset(&mut self);
}

impl Pooled for Vec3 {
    fn fresh() -> Self {
        Vec3::ZERO
    }

    fn reset(&mut self) {
        *self = Vec3::ZERO;
    }
}

impl Pooled for Quat {
    fn fresh() -> Self {
        Quat::IDENTITY
    }

    fn reset(&mut self) {
        *self = Quat::IDENTITY;
    }
}

impl Pooled for Mat3 {
    fn fresh() -> Self {
        fixstep_math::mat3::IDENTITY
    }

    fn reset(&mut self) {
        *self = fixstep_math::mat3::IDENTITY;
    }
}

impl Pooled for Mat4 {
    fn fresh() -> Self {
        fixstep_math::mat4::IDENTITY
    }

    fn reset(&mut self) {
        *self = fixstep_math::mat4::IDENTITY;
    }
}

impl Pooled for Transform {
    fn fresh() -> Self {
        Transform::IDENTITY
    }

    fn reset(&mut self) {
        self.set_identity();
    }
}

impl Pooled for Aabb {
    fn fresh() -> Self {
        Aabb::EMPTY
    }

    fn reset(&mut self) {
        *self = Aabb::EMPTY;
    }
}

/// Free list for one pooled type
#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
    max_free: usize,
    created: usize,
}

impl<T: Pooled> Pool<T> {
    /// Create a pool keeping at most `max_free` idle instances
    pub fn new(max_free: usize) -> Self {
        Self {
            free: Vec::new(),
            max_free,
            created: 0,
        }
    }

    /// Take an instance, reusing an idle one when available
    pub fn obtain(&mut self) -> T {
        match self.free.pop() {
            Some(value) => value,
            None => {
                self.created += 1;
                T::fresh()
            }
        }
    }

    /// Give an instance back; it is reset before reuse
    pub fn free(&mut self, mut value: T) {
        if self.free.len() < self.max_free {
            value.reset();
            self.free.push(value);
        }
    }

    /// Idle instances ready for reuse
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Instances built because the free list was empty
    pub fn created(&self) -> usize {
        self.created
    }
}

impl<T: Pooled> Default for Pool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FREE)
    }
}

/// One [`Pool`] per value type
///
/// Pools are created on first use. Owned by the simulation world and lent to
/// object code, rather than living in global state.
#[derive(Default)]
pub struct ScratchPool {
    pools: HashMap<TypeId, Box<dyn Any>>,
    max_free: usize,
}

impl std::fmt::Debug for ScratchPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchPool")
            .field("pools", &self.pools.len())
            .field("max_free", &self.max_free)
            .finish()
    }
}

impl ScratchPool {
    pub fn new() -> Self {
        Self::with_max_free(DEFAULT_MAX_FREE)
    }

    /// Create pools keeping at most `max_free` idle instances each
    pub fn with_max_free(max_free: usize) -> Self {
        Self {
            pools: HashMap::new(),
            max_free,
        }
    }

    fn pool<T: Pooled>(&mut self) -> Option<&mut Pool<T>> {
        let max_free = self.max_free;
        self.pools
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Pool::<T>::new(max_free)))
            .downcast_mut::<Pool<T>>()
    }

    /// Borrow a value of type `T`
    pub fn obtain<T: Pooled>(&mut self) -> T {
        match self.pool::<T>() {
            Some(pool) => pool.obtain(),
            None => T::fresh(),
        }
    }

    /// Return a value obtained from this pool
    pub fn free<T: Pooled>(&mut self, value: T) {
        if let Some(pool) = self.pool::<T>() {
            pool.free(value);
        }
    }

    /// Drop every idle instance of every type
    pub fn clear(&mut self) {
        log::debug!("Clearing {} scratch pools", self.pools.len());
        self.pools.clear();
    }

    /// Idle instances of type `T`
    pub fn available<T: Pooled>(&self) -> usize {
        self.pools
            .get(&TypeId::of::<T>())
            .and_then(|p| p.downcast_ref::<Pool<T>>())
            .map_or(0, Pool::available)
    }
}

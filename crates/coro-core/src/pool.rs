//! Type-keyed free lists for envelopes and frame records.
//!
//! Every pooled object implements [`Recycle`]; the pool keeps one shelf per concrete type and
//! hands objects back out in LIFO order. Running out is never an error: [`Pool::take`] falls back
//! to a fresh allocation and records it in [`PoolStats::created`], which is what tests use to
//! assert that a warmed-up tree stops allocating.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Type-erasure helpers for pooled objects. Implemented for every `Send + 'static` type.
pub trait AsAny: Any + Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T: Any + Send> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// An object that can be parked in a [`Pool`] and handed out again.
pub trait Recycle: AsAny {
    /// Clear per-use state. Called when the object is returned to the pool.
    fn recycle(&mut self);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Objects allocated because the shelf was empty (including pre-warming).
    pub created: u64,
    pub taken: u64,
    pub returned: u64,
}

impl PoolStats {
    /// Objects currently handed out and not yet returned.
    pub fn outstanding(&self) -> u64 {
        self.taken.saturating_sub(self.returned)
    }

    fn merge(mut self, other: PoolStats) -> Self {
        self.created += other.created;
        self.taken += other.taken;
        self.returned += other.returned;
        self
    }
}

#[derive(Default)]
struct Shelf {
    free: Vec<Box<dyn Recycle>>,
    stats: PoolStats,
}

/// Shared, thread-safe object pool. Usually held as `Arc<Pool>` by a tree host and lent to every
/// scheduler it drives through the [`TickContext`](crate::TickContext).
#[derive(Default)]
pub struct Pool {
    shelves: Mutex<HashMap<TypeId, Shelf>>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TypeId, Shelf>> {
        self.shelves.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take a recycled `T`, or allocate one when the shelf is empty.
    pub fn take<T: Recycle + Default>(&self) -> Box<T> {
        let recycled = {
            let mut shelves = self.lock();
            let shelf = shelves.entry(TypeId::of::<T>()).or_default();
            shelf.stats.taken += 1;
            let item = shelf.free.pop();
            if item.is_none() {
                shelf.stats.created += 1;
            }
            item
        };

        match recycled.map(|item| AsAny::into_any(item).downcast::<T>()) {
            Some(Ok(item)) => item,
            _ => Box::default(),
        }
    }

    pub fn give<T: Recycle>(&self, item: Box<T>) {
        self.give_boxed(item);
    }

    /// Return a type-erased object to the shelf of its concrete type.
    pub fn give_boxed(&self, mut item: Box<dyn Recycle>) {
        item.recycle();
        let key = AsAny::as_any(&*item).type_id();
        let mut shelves = self.lock();
        let shelf = shelves.entry(key).or_default();
        shelf.stats.returned += 1;
        shelf.free.push(item);
    }

    /// Allocate `count` objects of type `T` up front.
    pub fn pre_warm<T: Recycle + Default>(&self, count: usize) {
        let mut shelves = self.lock();
        let shelf = shelves.entry(TypeId::of::<T>()).or_default();
        shelf.free.reserve(count);
        for _ in 0..count {
            shelf.free.push(Box::new(T::default()));
        }
        shelf.stats.created += count as u64;
    }

    /// Drop every parked object. Statistics are kept.
    pub fn clear(&self) {
        let mut shelves = self.lock();
        for shelf in shelves.values_mut() {
            shelf.free.clear();
        }
    }

    /// Number of parked objects across all types.
    pub fn count(&self) -> usize {
        self.lock().values().map(|s| s.free.len()).sum()
    }

    pub fn count_of<T: Recycle>(&self) -> usize {
        self.lock()
            .get(&TypeId::of::<T>())
            .map(|s| s.free.len())
            .unwrap_or(0)
    }

    pub fn stats_of<T: Recycle>(&self) -> PoolStats {
        self.lock()
            .get(&TypeId::of::<T>())
            .map(|s| s.stats)
            .unwrap_or_default()
    }

    pub fn totals(&self) -> PoolStats {
        self.lock()
            .values()
            .fold(PoolStats::default(), |acc, s| acc.merge(s.stats))
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("parked", &self.count())
            .field("totals", &self.totals())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    impl Recycle for Counter {
        fn recycle(&mut self) {
            self.value = 0;
        }
    }

    #[derive(Default)]
    struct Other;

    impl Recycle for Other {
        fn recycle(&mut self) {}
    }

    #[test]
    fn take_allocates_then_reuses() {
        let pool = Pool::new();
        let mut a = pool.take::<Counter>();
        a.value = 7;
        pool.give(a);

        let b = pool.take::<Counter>();
        assert_eq!(b.value, 0, "returned objects are recycled");

        let stats = pool.stats_of::<Counter>();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.taken, 2);
        assert_eq!(stats.returned, 1);
        assert_eq!(stats.outstanding(), 1);
    }

    #[test]
    fn shelves_are_keyed_by_type() {
        let pool = Pool::new();
        pool.pre_warm::<Counter>(3);
        pool.give_boxed(Box::new(Other));

        assert_eq!(pool.count_of::<Counter>(), 3);
        assert_eq!(pool.count_of::<Other>(), 1);
        assert_eq!(pool.count(), 4);

        let _ = pool.take::<Counter>();
        assert_eq!(pool.stats_of::<Counter>().created, 3);
    }

    #[test]
    fn clear_drops_parked_objects_but_keeps_stats() {
        let pool = Pool::new();
        pool.pre_warm::<Counter>(2);
        pool.clear();
        assert_eq!(pool.count(), 0);
        assert_eq!(pool.totals().created, 2);

        let _ = pool.take::<Counter>();
        assert_eq!(pool.stats_of::<Counter>().created, 3);
    }
}

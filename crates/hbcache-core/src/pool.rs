//! Bounded pool of reusable, lazily constructed resources.
//!
//! Used for transport handles: constructing one is comparatively expensive
//! (it owns connections), so the backend keeps them around and leases one per
//! request. [`Pool::get`] hands out a [`PoolHandle`] that returns the resource
//! when dropped, on every exit path.

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

type Factory<T, E> = Box<dyn Fn() -> Result<T, E> + Send + Sync>;
type Validator<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct PoolState<T> {
    idle: Vec<T>,
    /// Resources alive: idle plus leased plus slots reserved for construction.
    total: usize,
}

pub struct Pool<T, E> {
    max: usize,
    state: Mutex<PoolState<T>>,
    wakeup: Condvar,
    factory: Factory<T, E>,
    validator: Option<Validator<T>>,
}

impl<T, E> Pool<T, E> {
    /// Create a pool holding at most `max` resources (at least 1).
    pub fn new<F>(max: usize, factory: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            max: max.max(1),
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                total: 0,
            }),
            wakeup: Condvar::new(),
            factory: Box::new(factory),
            validator: None,
        }
    }

    /// Pool with no limit; `get` never blocks.
    pub fn unbounded<F>(factory: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self::new(usize::MAX, factory)
    }

    /// Idle resources rejected by `validator` are dropped instead of leased.
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Lease a resource, constructing one if none is idle and the bound
    /// allows. Blocks while the pool is at capacity with nothing idle.
    ///
    /// Factory errors are returned as-is; the reserved slot is given back.
    pub fn get(&self) -> Result<PoolHandle<'_, T, E>, E> {
        let mut state = self.lock();
        loop {
            while let Some(resource) = state.idle.pop() {
                if self.is_valid(&resource) {
                    return Ok(PoolHandle::new(self, resource));
                }
                state.total -= 1;
                tracing::debug!("discarding invalid pooled resource");
            }
            if state.total < self.max {
                state.total += 1;
                break;
            }
            state = self
                .wakeup
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        drop(state);

        // Construct outside the lock; the guard hands the slot back if the
        // factory fails or panics.
        let slot = SlotGuard {
            pool: self,
            armed: true,
        };
        let resource = (self.factory)()?;
        slot.disarm();
        Ok(PoolHandle::new(self, resource))
    }

    /// Maximum number of resources.
    pub fn capacity(&self) -> usize {
        self.max
    }

    /// Resources currently alive (idle or leased).
    pub fn count(&self) -> usize {
        self.lock().total
    }

    pub fn idle_count(&self) -> usize {
        self.lock().idle.len()
    }

    fn is_valid(&self, resource: &T) -> bool {
        self.validator.as_ref().map_or(true, |v| v(resource))
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<T>> {
        // Pool state is updated in single statements, so it stays consistent
        // even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release_slot(&self) {
        {
            let mut state = self.lock();
            state.total = state.total.saturating_sub(1);
        }
        self.wakeup.notify_one();
    }
}

/// Gives a reserved construction slot back to the pool when dropped.
struct SlotGuard<'a, T, E> {
    pool: &'a Pool<T, E>,
    armed: bool,
}

impl<T, E> SlotGuard<'_, T, E> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<T, E> Drop for SlotGuard<'_, T, E> {
    fn drop(&mut self) {
        if self.armed {
            self.pool.release_slot();
        }
    }
}

/// Exclusive lease on a pooled resource. Returned to the pool on drop.
pub struct PoolHandle<'a, T, E> {
    pool: &'a Pool<T, E>,
    resource: Option<T>,
    bad: bool,
}

impl<'a, T, E> PoolHandle<'a, T, E> {
    fn new(pool: &'a Pool<T, E>, resource: T) -> Self {
        Self {
            pool,
            resource: Some(resource),
            bad: false,
        }
    }

    /// Drop the resource instead of returning it to the pool.
    pub fn mark_bad(&mut self) {
        self.bad = true;
    }
}

impl<T, E> Deref for PoolHandle<'_, T, E> {
    type Target = T;

    fn deref(&self) -> &T {
        self.resource.as_ref().expect("resource present until drop")
    }
}

impl<T, E> DerefMut for PoolHandle<'_, T, E> {
    fn deref_mut(&mut self) -> &mut T {
        self.resource.as_mut().expect("resource present until drop")
    }
}

impl<T, E> Drop for PoolHandle<'_, T, E> {
    fn drop(&mut self) {
        let Some(resource) = self.resource.take() else {
            return;
        };
        // A lease unwound by a panic may have left the resource mid-request.
        if self.bad || std::thread::panicking() {
            drop(resource);
            self.pool.release_slot();
            return;
        }
        self.pool.lock().idle.push(resource);
        self.pool.wakeup.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn counting_pool(max: usize) -> (Pool<usize, String>, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&created);
        let pool = Pool::new(max, move || Ok(c.fetch_add(1, Ordering::SeqCst)));
        (pool, created)
    }

    #[test]
    fn resources_are_created_lazily_and_reused() {
        let (pool, created) = counting_pool(4);
        assert_eq!(pool.count(), 0);
        {
            let h = pool.get().unwrap();
            assert_eq!(*h, 0);
            assert_eq!(pool.count(), 1);
            assert_eq!(pool.idle_count(), 0);
        }
        assert_eq!(pool.idle_count(), 1);
        let h = pool.get().unwrap();
        assert_eq!(*h, 0, "idle resource should be reused");
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_leases_get_distinct_resources() {
        let (pool, _) = counting_pool(4);
        let a = pool.get().unwrap();
        let b = pool.get().unwrap();
        assert_ne!(*a, *b);
        assert_eq!(pool.count(), 2);
    }

    #[test]
    fn factory_error_propagates_and_frees_slot() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let pool: Pool<u32, String> = Pool::new(1, move || {
            if c.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("boom".to_string())
            } else {
                Ok(7)
            }
        });
        assert_eq!(pool.get().err().as_deref(), Some("boom"));
        assert_eq!(pool.count(), 0);
        // The slot is usable again, so this does not block.
        assert_eq!(*pool.get().unwrap(), 7);
    }

    #[test]
    fn bad_handles_are_discarded() {
        let (pool, created) = counting_pool(1);
        {
            let mut h = pool.get().unwrap();
            h.mark_bad();
        }
        assert_eq!(pool.count(), 0);
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(*pool.get().unwrap(), 1);
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn validator_rejects_stale_idle_resources() {
        let created = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&created);
        let pool: Pool<usize, String> =
            Pool::new(2, move || Ok(c.fetch_add(1, Ordering::SeqCst))).with_validator(|r| *r != 0);
        drop(pool.get().unwrap());
        assert_eq!(pool.idle_count(), 1);
        let h = pool.get().unwrap();
        assert_eq!(*h, 1, "resource 0 fails validation and is replaced");
        assert_eq!(pool.count(), 1);
    }

    #[test]
    fn get_blocks_at_capacity_until_release() {
        let (pool, created) = counting_pool(1);
        let pool = Arc::new(pool);
        let held = pool.get().unwrap();

        let p = Arc::clone(&pool);
        let waiter = thread::spawn(move || *p.get().unwrap());

        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished(), "second lease must wait for the first");
        drop(held);
        assert_eq!(waiter.join().unwrap(), 0);
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unbounded_pool_never_blocks() {
        let pool: Pool<usize, String> = Pool::unbounded(|| Ok(0));
        let handles: Vec<_> = (0..32).map(|_| pool.get().unwrap()).collect();
        assert_eq!(pool.count(), 32);
        assert_eq!(pool.capacity(), usize::MAX);
        drop(handles);
        assert_eq!(pool.idle_count(), 32);
    }

    #[test]
    fn total_never_exceeds_bound_under_contention() {
        let max = 3;
        let pool: Arc<Pool<usize, String>> = Arc::new(counting_pool(max).0);
        let leased = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let workers: Vec<_> = (0..12)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let leased = Arc::clone(&leased);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    for _ in 0..10 {
                        let _h = pool.get().unwrap();
                        let now = leased.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        assert!(pool.count() <= max);
                        thread::sleep(Duration::from_millis(1));
                        leased.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= max);
        assert!(pool.count() <= max);
    }
}

//! Claim/free pool over long-lived resources.
//!
//! [`ResourcePool<T>`] keeps every resource it ever created. Resources move
//! between a used set and a free list; the pool never shrinks, so resource
//! identities stay stable for the lifetime of the pool. This matters for
//! engine objects such as render targets that are expensive to recreate and
//! that other systems refer to by identity.
//!
//! # Example
//!
//! ```
//! use uiframe_core::pool::ResourcePool;
//!
//! let mut pool = ResourcePool::<u32>::new();
//! pool.reserve(2, |slot| slot as u32 * 10);
//! assert_eq!(pool.size(), 2);
//!
//! let (resource, slot) = pool.claim(|slot| slot as u32 * 10);
//! assert_eq!(pool.used_count(), 1);
//!
//! assert!(pool.free(&resource));
//! assert_eq!(pool.used_count(), 0);
//!
//! // The most recently freed slot is handed out first.
//! assert_eq!(pool.claim(|slot| slot as u32 * 10).1, slot);
//! ```

use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::hash::Hash;

/// A growable pool of resources with used/free tracking.
///
/// Invariants:
/// - every slot is either used or free, never both;
/// - `used_count() + free_count() == size()`;
/// - `size()` never decreases.
#[derive(Debug)]
pub struct ResourcePool<T> {
    resources: Vec<T>,
    free: VecDeque<usize>,
    used: HashMap<T, usize>,
}

impl<T> Default for ResourcePool<T> {
    fn default() -> Self {
        Self {
            resources: Vec::new(),
            free: VecDeque::new(),
            used: HashMap::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> ResourcePool<T> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of resources owned by the pool.
    pub fn size(&self) -> usize {
        self.resources.len()
    }

    /// Number of claimed resources.
    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    /// Number of resources available for claiming.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Returns true if there is no free resource left.
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// All resources in slot order, claimed or not.
    pub fn resources(&self) -> &[T] {
        &self.resources
    }

    /// Resource stored at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    pub fn get(&self, slot: usize) -> &T {
        assert!(
            slot < self.resources.len(),
            "resource pool slot {slot} out of range (size {})",
            self.resources.len()
        );
        &self.resources[slot]
    }

    /// Returns the slot of `resource` if it is currently claimed.
    pub fn slot_of(&self, resource: &T) -> Option<usize> {
        self.used.get(resource).copied()
    }

    /// Grow the pool to hold at least `count` resources.
    ///
    /// New resources are created with `make(slot)` and start out free.
    pub fn reserve(&mut self, count: usize, mut make: impl FnMut(usize) -> T) {
        let grown: Result<(), Infallible> = self.try_reserve(count, |slot| Ok(make(slot)));
        let Ok(()) = grown;
    }

    /// Fallible [`reserve`](Self::reserve). Resources created before a
    /// failure stay in the pool.
    pub fn try_reserve<E>(
        &mut self,
        count: usize,
        mut make: impl FnMut(usize) -> Result<T, E>,
    ) -> Result<(), E> {
        let old_size = self.resources.len();
        if count <= old_size {
            return Ok(());
        }
        self.resources.reserve(count - old_size);
        for slot in old_size..count {
            self.resources.push(make(slot)?);
            self.free.push_back(slot);
        }
        log::trace!("ResourcePool: grew from {old_size} to {count}");
        Ok(())
    }

    /// Claim a free resource, doubling the pool first if none is free.
    ///
    /// Returns the resource and its slot.
    pub fn claim(&mut self, mut make: impl FnMut(usize) -> T) -> (T, usize) {
        let claimed: Result<(T, usize), Infallible> = self.try_claim(|slot| Ok(make(slot)));
        let Ok(claimed) = claimed;
        claimed
    }

    /// Fallible [`claim`](Self::claim).
    pub fn try_claim<E>(
        &mut self,
        make: impl FnMut(usize) -> Result<T, E>,
    ) -> Result<(T, usize), E> {
        if self.free.is_empty() {
            let target = (self.resources.len() * 2).max(1);
            self.try_reserve(target, make)?;
        }
        let slot = match self.free.pop_front() {
            Some(slot) => slot,
            None => unreachable!("pool was grown before claiming"),
        };
        let resource = self.resources[slot].clone();
        self.used.insert(resource.clone(), slot);
        Ok((resource, slot))
    }

    /// Return a claimed resource to the pool.
    ///
    /// The slot goes to the front of the free list so it is reused first.
    /// Freeing a resource that is not claimed is a no-op and returns false.
    pub fn free(&mut self, resource: &T) -> bool {
        match self.used.remove(resource) {
            Some(slot) => {
                self.free.push_front(slot);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn make(slot: usize) -> u64 {
        1000 + slot as u64
    }

    fn assert_partition(pool: &ResourcePool<u64>) {
        assert_eq!(pool.used_count() + pool.free_count(), pool.size());
    }

    #[test]
    fn test_reserve_creates_free_resources() {
        let mut pool = ResourcePool::new();
        pool.reserve(4, make);
        assert_eq!(pool.size(), 4);
        assert_eq!(pool.free_count(), 4);
        assert_eq!(pool.resources(), &[1000, 1001, 1002, 1003]);

        // Reserving less never shrinks.
        pool.reserve(2, make);
        assert_eq!(pool.size(), 4);
    }

    #[rstest]
    #[case::empty(0, 1)]
    #[case::one(1, 2)]
    #[case::four(4, 8)]
    fn test_claim_doubles_when_full(#[case] initial: usize, #[case] grown: usize) {
        let mut pool = ResourcePool::new();
        pool.reserve(initial, make);
        for _ in 0..initial {
            pool.claim(make);
        }
        assert!(pool.is_full());
        pool.claim(make);
        assert_eq!(pool.size(), grown);
        assert_partition(&pool);
    }

    #[test]
    fn test_claim_free_round_trip() {
        let mut pool = ResourcePool::new();
        pool.reserve(3, make);
        let (kept, _) = pool.claim(make);

        let free_before: Vec<_> = pool.free.iter().copied().collect();
        let used_before = pool.used_count();

        let (resource, _) = pool.claim(make);
        assert!(pool.free(&resource));

        let mut free_after: Vec<_> = pool.free.iter().copied().collect();
        let mut expected = free_before.clone();
        free_after.sort_unstable();
        expected.sort_unstable();
        assert_eq!(free_after, expected);
        assert_eq!(pool.used_count(), used_before);
        assert_eq!(pool.slot_of(&kept), Some(0));
    }

    #[test]
    fn test_free_is_idempotent() {
        let mut pool = ResourcePool::new();
        let (resource, _) = pool.claim(make);
        assert!(pool.free(&resource));
        assert!(!pool.free(&resource));
        assert!(!pool.free(&42));
        assert_partition(&pool);
    }

    #[test]
    fn test_freed_slot_reused_first() {
        let mut pool = ResourcePool::new();
        pool.reserve(4, make);
        let (a, _) = pool.claim(make);
        let (b, slot_b) = pool.claim(make);
        pool.free(&a);
        pool.free(&b);
        assert_eq!(pool.claim(make), (b, slot_b));
    }

    #[test]
    fn test_size_never_decreases() {
        let mut pool = ResourcePool::new();
        let mut claimed = Vec::new();
        let mut last_size = 0;
        for step in 0..64 {
            if step % 3 == 2 {
                if let Some(resource) = claimed.pop() {
                    pool.free(&resource);
                }
            } else {
                claimed.push(pool.claim(make).0);
            }
            assert!(pool.size() >= last_size);
            last_size = pool.size();
            assert_partition(&pool);
        }
    }

    #[test]
    fn test_try_claim_propagates_failure() {
        let mut pool = ResourcePool::<u64>::new();
        let failed = pool.try_claim(|_| Err("out of memory"));
        assert_eq!(failed, Err("out of memory"));
        assert_eq!(pool.size(), 0);

        let claimed: Result<_, &str> = pool.try_claim(|slot| Ok(make(slot)));
        assert_eq!(claimed, Ok((1000, 0)));
    }
}

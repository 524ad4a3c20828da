//! Per-persona-type identity allocation.
//!
//! Every spawned virtual user receives a unique, strictly increasing integer
//! id scoped to its persona kind. The counters are the only state shared
//! between concurrently running sessions, so they live behind atomics on an
//! explicit, injectable allocator instance rather than in global mutable
//! state; tests construct a fresh allocator and get deterministic ids.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::session::PersonaKind;

/// Process-wide id source, one monotonic counter per persona kind.
///
/// Allocation cannot fail: ids are handed out with a single atomic
/// fetch-add, so concurrent callers can never observe a duplicate.
#[derive(Debug)]
pub struct IdentityAllocator {
    counters: [AtomicU64; PersonaKind::COUNT],
}

impl IdentityAllocator {
    /// Create an allocator with all counters at zero; the first id handed
    /// out for each kind is 1.
    pub fn new() -> Self {
        Self {
            counters: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Next unique id for `kind`. Safe for concurrent invocation; ids for a
    /// kind are strictly increasing with no gaps.
    pub fn next_id(&self, kind: PersonaKind) -> u64 {
        self.counters[kind.index()].fetch_add(1, Ordering::Relaxed) + 1
    }

    /// How many ids have been handed out for `kind` so far.
    pub fn allocated(&self, kind: PersonaKind) -> u64 {
        self.counters[kind.index()].load(Ordering::Relaxed)
    }
}

impl Default for IdentityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one() {
        let allocator = IdentityAllocator::new();
        assert_eq!(allocator.next_id(PersonaKind::Visitor), 1);
        assert_eq!(allocator.next_id(PersonaKind::Visitor), 2);
        assert_eq!(allocator.next_id(PersonaKind::Visitor), 3);
    }

    #[test]
    fn test_counters_independent_per_kind() {
        let allocator = IdentityAllocator::new();
        assert_eq!(allocator.next_id(PersonaKind::PowerUser), 1);
        assert_eq!(allocator.next_id(PersonaKind::PowerUser), 2);
        // A different kind starts over at 1
        assert_eq!(allocator.next_id(PersonaKind::ApiClient), 1);
        assert_eq!(allocator.allocated(PersonaKind::PowerUser), 2);
        assert_eq!(allocator.allocated(PersonaKind::ApiClient), 1);
        assert_eq!(allocator.allocated(PersonaKind::Visitor), 0);
    }

    #[test]
    fn test_concurrent_allocation_unique() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let allocator = Arc::new(IdentityAllocator::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let allocator = Arc::clone(&allocator);
            handles.push(std::thread::spawn(move || {
                let mut ids = Vec::with_capacity(125);
                for _ in 0..125 {
                    ids.push(allocator.next_id(PersonaKind::PowerUser));
                }
                ids
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }

        // 1000 allocations cover exactly 1..=1000 with no gaps
        assert_eq!(seen.len(), 1000);
        assert_eq!(*seen.iter().min().unwrap(), 1);
        assert_eq!(*seen.iter().max().unwrap(), 1000);
    }
}

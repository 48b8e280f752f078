//! Entity identifiers and allocation.
//!
//! An [`EntityId`] is an opaque 64-bit handle. The high 32 bits carry a
//! *generation* counter and the low 32 bits an *index*. Indices are recycled
//! once an entity is despawned, and the generation bump makes every handle
//! that still points at the old occupant stale. This is what lets queued
//! events safely outlive the entity they mention: a lookup through a stale
//! id simply misses.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity identifier.
///
/// Layout: `[generation: u32 | index: u32]`. Ordering follows the raw value,
/// which is the "engine order" used when iterating query results.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` from an index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The index portion (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Hands out [`EntityId`]s and recycles the indices of despawned entities.
///
/// Free indices are reused in FIFO order so a hot slot does not burn through
/// its generations while other slots sit idle.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Current generation for each index slot.
    generations: Vec<u32>,
    /// Whether the slot is currently occupied.
    alive: Vec<bool>,
    /// Number of occupied slots.
    live: usize,
    free_indices: VecDeque<u32>,
}

impl EntityAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh [`EntityId`], reusing a free slot when one exists.
    pub fn allocate(&mut self) -> EntityId {
        self.live += 1;
        if let Some(index) = self.free_indices.pop_front() {
            // Generation was already bumped when the slot was freed.
            self.alive[index as usize] = true;
            EntityId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            EntityId::new(index, 0)
        }
    }

    /// Free the slot behind `id` and bump its generation.
    ///
    /// Returns `false` when `id` was already dead or stale.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(id.index());
        self.live -= 1;
        true
    }

    /// Whether `id` names a live entity of the current generation.
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        idx < self.generations.len()
            && self.alive[idx]
            && self.generations[idx] == id.generation()
    }

    /// Number of live entities.
    pub fn alive_count(&self) -> usize {
        self.live
    }

    /// Every live entity, in ascending index order.
    pub fn iter_alive(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(idx, _)| EntityId::new(idx as u32, self.generations[idx]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_unique_ids() {
        let mut alloc = EntityAllocator::new();
        let ids: Vec<EntityId> = (0..100).map(|_| alloc.allocate()).collect();
        let mut indices: Vec<u32> = ids.iter().map(|id| id.index()).collect();
        indices.sort();
        indices.dedup();
        assert_eq!(indices.len(), 100);
    }

    #[test]
    fn recycled_slot_gets_new_generation() {
        let mut alloc = EntityAllocator::new();
        let first = alloc.allocate();
        assert!(alloc.deallocate(first));
        let second = alloc.allocate();
        assert_eq!(second.index(), first.index());
        assert_eq!(second.generation(), 1);
        assert!(!alloc.is_alive(first), "old handle must stay stale");
        assert!(alloc.is_alive(second));
    }

    #[test]
    fn double_deallocate_returns_false() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        assert!(alloc.deallocate(e));
        assert!(!alloc.deallocate(e));
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn iter_alive_skips_freed_slots() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let c = alloc.allocate();
        alloc.deallocate(b);
        let alive: Vec<EntityId> = alloc.iter_alive().collect();
        assert_eq!(alive, vec![a, c]);
    }

    #[test]
    fn entity_id_ordering_follows_raw_value() {
        let low = EntityId::new(3, 0);
        let high = EntityId::new(1, 1);
        assert!(low < high);
        assert_eq!(EntityId::from_raw(high.to_raw()), high);
    }
}

/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::atomic::{AtomicU64, Ordering};

use crate::Score;

/// What a stored transposition score is a bound on.
///
/// See [CPW](https://www.chessprogramming.org/Node_Types) for the node-type
/// terminology these correspond to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum Bound {
    /// Slot has never been written.
    Unused = 0,

    /// The true value is at least the stored score (a beta cutoff occurred).
    Lower = 1,

    /// The true value is at most the stored score (the node failed low).
    Upper = 2,

    /// The stored score is the true minimax value at the stored depth.
    Exact = 3,
}

impl Bound {
    #[inline(always)]
    const fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            1 => Self::Lower,
            2 => Self::Upper,
            3 => Self::Exact,
            _ => Self::Unused,
        }
    }
}

/// A decoded entry of the [`TTable`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TTableEntry {
    /// Full hash of the position this entry describes.
    pub hash: u64,

    /// Best score found for the position.
    pub score: Score,

    /// Depth the score was searched to.
    pub depth: u8,

    /// What kind of bound `score` is.
    pub bound: Bound,
}

/// One slot of the table: a data word and a key word storing `hash ^ data`.
///
/// Readers recover the hash as `key ^ data` and compare it against their
/// query, so a slot whose two words were written by different threads can
/// never validate. No locks are taken on either path; a store lost to a
/// race only costs a future cache hit.
#[derive(Default)]
struct Slot {
    key: AtomicU64,
    data: AtomicU64,
}

/// A fixed-capacity, lock-free transposition table.
///
/// Indexed by `hash & (capacity - 1)` with direct replacement: a new entry
/// simply overwrites whatever shared its slot. The table is allocated once
/// and never resized; entries remain valid across searches because they
/// store the full hash.
pub struct TTable {
    slots: Box<[Slot]>,
}

impl TTable {
    /// Default number of entries.
    pub const DEFAULT_CAPACITY: usize = 1 << 27;

    /// Creates a [`TTable`] with `capacity` slots.
    ///
    /// # Panics
    /// If `capacity` is not a power of two (the index mask depends on it).
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "transposition table capacity must be a power of two"
        );

        let slots = (0..capacity).map(|_| Slot::default()).collect();
        Self { slots }
    }

    /// Number of slots in this table.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Erases every entry.
    pub fn clear(&self) {
        for slot in self.slots.iter() {
            slot.key.store(0, Ordering::Relaxed);
            slot.data.store(0, Ordering::Relaxed);
        }
    }

    #[inline(always)]
    fn index(&self, hash: u64) -> usize {
        (hash & (self.slots.len() as u64 - 1)) as usize
    }

    /// Looks up the entry for `hash`.
    ///
    /// Returns [`None`] on an empty slot, a slot holding some other
    /// position, or a torn slot that fails key validation.
    #[inline(always)]
    pub fn load(&self, hash: u64) -> Option<TTableEntry> {
        let slot = &self.slots[self.index(hash)];
        let key = slot.key.load(Ordering::Relaxed);
        let data = slot.data.load(Ordering::Relaxed);

        if key ^ data != hash {
            return None;
        }

        let bound = Bound::from_bits(data);
        if bound == Bound::Unused {
            return None;
        }

        Some(TTableEntry {
            hash,
            score: Score::new((data >> 32) as u32 as i32),
            depth: (data >> 2) as u8,
            bound,
        })
    }

    /// Stores an entry for `hash`, overwriting whatever occupied its slot.
    #[inline(always)]
    pub fn store(&self, hash: u64, score: Score, depth: u8, bound: Bound) {
        let data =
            (score.inner() as u32 as u64) << 32 | (depth as u64) << 2 | bound as u64;

        let slot = &self.slots[self.index(hash)];
        slot.key.store(hash ^ data, Ordering::Relaxed);
        slot.data.store(data, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_load() {
        let tt = TTable::new(1 << 10);

        let hash = 0xDEAD_BEEF_CAFE_F00D;
        tt.store(hash, Score::new(-42), 7, Bound::Exact);

        let entry = tt.load(hash).unwrap();
        assert_eq!(entry.score, Score::new(-42));
        assert_eq!(entry.depth, 7);
        assert_eq!(entry.bound, Bound::Exact);
    }

    #[test]
    fn test_miss_on_unknown_hash() {
        let tt = TTable::new(1 << 10);
        assert!(tt.load(123).is_none());

        // Same slot, different hash: must not validate.
        let a = 0x1000;
        let b = a + (1 << 10);
        tt.store(a, Score::new(1), 1, Bound::Lower);
        assert!(tt.load(b).is_none());
        assert!(tt.load(a).is_some());
    }

    #[test]
    fn test_direct_replacement() {
        let tt = TTable::new(1 << 4);

        let a = 0x20;
        let b = a + (1 << 4);
        tt.store(a, Score::new(5), 3, Bound::Exact);
        tt.store(b, Score::new(9), 1, Bound::Upper);

        assert!(tt.load(a).is_none(), "overwritten entry must be gone");
        assert_eq!(tt.load(b).unwrap().score, Score::new(9));
    }

    #[test]
    fn test_negative_scores_roundtrip() {
        let tt = TTable::new(1 << 4);

        for value in [i32::MIN + 1, -1, 0, 1, i32::MAX - 3] {
            tt.store(7, Score::new(value), 255, Bound::Lower);
            assert_eq!(tt.load(7).unwrap().score, Score::new(value));
            assert_eq!(tt.load(7).unwrap().depth, 255);
        }
    }

    #[test]
    fn test_torn_slot_never_validates() {
        let tt = TTable::new(1 << 4);

        let hash = 0x30;
        tt.store(hash, Score::new(10), 2, Bound::Exact);

        // Simulate a torn write: replace the data word only, as if another
        // thread had half-finished storing a different entry.
        let index = tt.index(hash);
        let foreign = (999u64) << 32 | 3;
        tt.slots[index].data.store(foreign, Ordering::Relaxed);

        assert!(tt.load(hash).is_none());
    }

    #[test]
    fn test_clear() {
        let tt = TTable::new(1 << 4);
        tt.store(5, Score::new(1), 1, Bound::Exact);
        tt.clear();
        assert!(tt.load(5).is_none());
    }
}

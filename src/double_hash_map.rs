//! DoubleHashMap: public table engine tying the probe generator to the slot
//! store, with load-factor driven resizing.

use crate::probe::{ProbeSeed, ProbeSeq};
use crate::slot::{Entry, Slot, SlotArray};
use thiserror::Error;

/// Slot-array capacity of a fresh map; also the floor a shrink never passes.
pub const INITIAL_CAPACITY: usize = 8;

/// Expand once physical load (occupied + tombstoned slots) reaches this
/// percentage of capacity.
const MAX_LOAD_PERCENT: usize = 50;

/// Shrink once logical load falls to this percentage of capacity. Kept well
/// below the expand complement so tombstone churn around one boundary does
/// not thrash resizes; tune here if compaction should be more eager.
const MIN_LOAD_PERCENT: usize = 10;

/// Capacity multiplier and divisor for every resize.
const GROWTH_FACTOR: usize = 2;

/// Errors surfaced by fallible map operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableError {
    /// The key is not present in the map.
    #[error("key not found")]
    KeyNotFound,
    /// A resize could not place a live entry in the new slot array. This is
    /// a probing-logic bug, not a runtime condition; the map is left in its
    /// pre-resize state.
    #[error("resize could not place a rehashed entry")]
    InvariantViolation,
}

/// Open-addressed map from byte-string keys to `i64` values.
///
/// Collisions resolve by double hashing over a power-of-two slot array;
/// removals tombstone their slot until the next resize compacts the array.
/// The probe coefficients are drawn once at construction, so every key's
/// probe sequence is stable for the life of the map.
pub struct DoubleHashMap {
    seed: ProbeSeed,
    store: SlotArray,
}

impl DoubleHashMap {
    /// An empty map with a freshly drawn probe seed.
    pub fn new() -> Self {
        Self::with_probe_seed(ProbeSeed::generate())
    }

    /// An empty map whose probe seed derives from `seed`, so tests can
    /// reproduce exact probe behavior.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_probe_seed(ProbeSeed::from_u64(seed))
    }

    /// An empty map using explicit probe coefficients.
    pub fn with_probe_seed(seed: ProbeSeed) -> Self {
        Self {
            seed,
            store: SlotArray::new(INITIAL_CAPACITY),
        }
    }

    /// Number of live entries. Tombstones are not counted.
    pub fn len(&self) -> usize {
        self.store.logical()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current slot-array length. Grows and shrinks by powers of two as
    /// load thresholds are crossed; never below [`INITIAL_CAPACITY`].
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.locate(key).is_some()
    }

    /// Look up `key`, returning its value.
    pub fn get(&self, key: &[u8]) -> Result<i64, TableError> {
        let idx = self.locate(key).ok_or(TableError::KeyNotFound)?;
        match self.store.slot(idx) {
            Slot::Occupied(entry) => Ok(entry.value),
            _ => unreachable!("locate returned a non-occupied slot"),
        }
    }

    /// Insert `key` with `value`, or overwrite the value in place if the
    /// key is already present (the map never holds duplicate keys). The key
    /// bytes are copied into map-owned storage on insert.
    pub fn put(&mut self, key: &[u8], value: i64) -> Result<(), TableError> {
        let mut insert_at = None;
        let mut update_at = None;
        // Walk as far as a lookup would (see `locate` for the bound) so an
        // existing occupied slot for `key` is found before committing to
        // the first insertable slot seen along the way.
        for idx in self.probe_bounded(key) {
            match self.store.slot(idx) {
                Slot::Empty => {
                    if insert_at.is_none() {
                        insert_at = Some(idx);
                    }
                    // Nothing past a never-written slot was ever placed.
                    break;
                }
                Slot::Tombstone(_) => {
                    if insert_at.is_none() {
                        insert_at = Some(idx);
                    }
                    // The key may still live past this tombstone.
                }
                Slot::Occupied(entry) if *entry.key == *key => {
                    update_at = Some(idx);
                    break;
                }
                Slot::Occupied(_) => {}
            }
        }

        if let Some(idx) = update_at {
            self.store.replace_value(idx, value);
            return Ok(());
        }

        // At most `physical` slots are non-empty and the bounded walk visits
        // `physical + 1` distinct slots, so an insertable one was seen.
        let idx = insert_at.ok_or(TableError::InvariantViolation)?;
        self.store.insert_at(
            idx,
            Entry {
                key: key.into(),
                value,
            },
        );

        if self.store.physical() * 100 >= self.capacity() * MAX_LOAD_PERCENT {
            self.resize(self.capacity() * GROWTH_FACTOR)?;
        }
        Ok(())
    }

    /// Remove `key`, returning its value. The slot is tombstoned, not
    /// cleared, so probe sequences that pass through it keep working.
    pub fn remove(&mut self, key: &[u8]) -> Result<i64, TableError> {
        let idx = self.locate(key).ok_or(TableError::KeyNotFound)?;
        let value = self.store.tombstone_at(idx);

        if self.capacity() > INITIAL_CAPACITY
            && self.store.logical() * 100 <= self.capacity() * MIN_LOAD_PERCENT
        {
            self.resize(self.capacity() / GROWTH_FACTOR)?;
        }
        Ok(value)
    }

    /// Walk the probe sequence for `key` and return the index of the
    /// occupied slot holding it, if any. Terminates on the first empty slot
    /// or after `physical + 1` probes: a live key inserted at probe attempt
    /// `i` saw `i` distinct non-empty slots before it, so it is always
    /// reachable within the bound. Tombstones and colliding occupied slots
    /// are stepped over, not treated as terminators.
    fn locate(&self, key: &[u8]) -> Option<usize> {
        for idx in self.probe_bounded(key) {
            match self.store.slot(idx) {
                Slot::Empty => return None,
                Slot::Occupied(entry) if *entry.key == *key => return Some(idx),
                _ => {}
            }
        }
        None
    }

    /// The probe walk shared by lookup and insert, bounded to
    /// `physical + 1` attempts. The returned iterator owns its state, so
    /// callers may mutate the store while walking.
    fn probe_bounded(&self, key: &[u8]) -> std::iter::Take<ProbeSeq> {
        self.seed
            .probe(key, self.capacity())
            .take(self.store.physical() + 1)
    }

    /// Rebuild the slot array at `new_capacity`. Live entries are re-probed
    /// against the new capacity (the compression depends on capacity; the
    /// seed coefficients never change) and placed by the same first-empty
    /// rule as `put`. Tombstones and empty slots are discarded without
    /// their storage being read. Placements are computed up front, so a
    /// placement failure leaves the map untouched.
    fn resize(&mut self, new_capacity: usize) -> Result<(), TableError> {
        let mut claimed = vec![false; new_capacity];
        let mut placements = Vec::with_capacity(self.store.logical());
        for (from, entry) in self.store.occupied_iter() {
            let to = self
                .seed
                .probe(&entry.key, new_capacity)
                .take(new_capacity)
                .find(|&idx| !claimed[idx])
                .ok_or(TableError::InvariantViolation)?;
            claimed[to] = true;
            placements.push((from, to));
        }

        let old = std::mem::replace(&mut self.store, SlotArray::new(new_capacity));
        let mut slots = old.into_slots();
        for (from, to) in placements {
            match std::mem::replace(&mut slots[from], Slot::Empty) {
                Slot::Occupied(entry) => self.store.insert_at(to, entry),
                _ => unreachable!("placement source is no longer occupied"),
            }
        }
        // `slots` now holds only empties and tombstones; dropping it
        // releases the tombstoned keys.
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn physical_len(&self) -> usize {
        self.store.physical()
    }
}

impl Default for DoubleHashMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeSeed;

    /// Invariant: `put(k, v)` followed by `get(k)` returns `v`.
    #[test]
    fn put_then_get_round_trips() {
        let mut m = DoubleHashMap::with_seed(1);
        m.put(b"a", 1).unwrap();
        assert_eq!(m.get(b"a"), Ok(1));
        assert_eq!(m.len(), 1);
        assert!(!m.is_empty());
    }

    /// Invariant: a second `put` of the same key overwrites in place; the
    /// map never grows a duplicate entry for it.
    #[test]
    fn put_existing_key_updates_in_place() {
        let mut m = DoubleHashMap::with_seed(2);
        m.put(b"k", 1).unwrap();
        m.put(b"k", 2).unwrap();
        assert_eq!(m.get(b"k"), Ok(2));
        assert_eq!(m.len(), 1);
        assert_eq!(m.physical_len(), 1);
    }

    /// Invariant: lookups of absent keys fail with `KeyNotFound`, both on
    /// an empty map and next to live entries.
    #[test]
    fn missing_keys_error() {
        let mut m = DoubleHashMap::with_seed(3);
        assert_eq!(m.get(b"missing"), Err(TableError::KeyNotFound));

        m.put(b"present", 5).unwrap();
        assert_eq!(m.get(b"missing"), Err(TableError::KeyNotFound));
        assert_eq!(m.remove(b"missing"), Err(TableError::KeyNotFound));
        assert!(!m.contains_key(b"missing"));
        assert!(m.contains_key(b"present"));
    }

    /// Invariant: `remove` returns the stored value, decrements `len` by
    /// exactly one, and later lookups of the key fail.
    #[test]
    fn remove_returns_value_and_forgets_key() {
        let mut m = DoubleHashMap::with_seed(4);
        m.put(b"x", 10).unwrap();
        m.put(b"y", 20).unwrap();

        assert_eq!(m.remove(b"x"), Ok(10));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(b"x"), Err(TableError::KeyNotFound));
        assert_eq!(m.get(b"y"), Ok(20));

        // Double removal of the same key must also miss.
        assert_eq!(m.remove(b"x"), Err(TableError::KeyNotFound));
    }

    /// Invariant: the empty byte string is an ordinary key.
    #[test]
    fn empty_key_is_a_valid_key() {
        let mut m = DoubleHashMap::with_seed(5);
        m.put(b"", 42).unwrap();
        assert_eq!(m.get(b""), Ok(42));
        assert_eq!(m.remove(b""), Ok(42));
        assert!(m.is_empty());
    }

    /// Invariant: values at the `i64` extremes survive the round trip.
    #[test]
    fn extreme_values_round_trip() {
        let mut m = DoubleHashMap::with_seed(6);
        m.put(b"min", i64::MIN).unwrap();
        m.put(b"max", i64::MAX).unwrap();
        assert_eq!(m.get(b"min"), Ok(i64::MIN));
        assert_eq!(m.get(b"max"), Ok(i64::MAX));
    }

    /// Invariant: crossing 50% physical load expands the array by the
    /// growth factor and every live key still resolves afterwards.
    #[test]
    fn expand_preserves_all_entries() {
        let mut m = DoubleHashMap::with_seed(7);
        assert_eq!(m.capacity(), INITIAL_CAPACITY);

        for (i, k) in [&b"a"[..], b"b", b"c", b"d", b"e"].iter().enumerate() {
            m.put(k, i as i64).unwrap();
        }
        assert_eq!(m.capacity(), 2 * INITIAL_CAPACITY);
        assert_eq!(m.len(), 5);
        for (i, k) in [&b"a"[..], b"b", b"c", b"d", b"e"].iter().enumerate() {
            assert_eq!(m.get(k), Ok(i as i64));
        }
        // Expansion drops tombstones: counters agree again.
        assert_eq!(m.physical_len(), m.len());
    }

    /// Invariant: falling to 10% logical load shrinks the array back down
    /// (never below the initial capacity) and the survivors still resolve.
    #[test]
    fn shrink_preserves_survivors() {
        let mut m = DoubleHashMap::with_seed(8);
        for (i, k) in [&b"a"[..], b"b", b"c", b"d", b"e"].iter().enumerate() {
            m.put(k, i as i64).unwrap();
        }
        assert_eq!(m.capacity(), 16);

        for k in [&b"a"[..], b"b", b"c", b"d"] {
            m.remove(k).unwrap();
        }
        assert_eq!(m.capacity(), INITIAL_CAPACITY);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(b"e"), Ok(4));
        assert_eq!(m.physical_len(), 1);
    }

    /// Invariant: a map at the initial capacity never shrinks, however
    /// empty it gets.
    #[test]
    fn no_shrink_below_initial_capacity() {
        let mut m = DoubleHashMap::with_seed(9);
        m.put(b"only", 1).unwrap();
        m.remove(b"only").unwrap();
        assert_eq!(m.capacity(), INITIAL_CAPACITY);
        assert!(m.is_empty());
    }

    /// Invariant: tombstones are transparent to lookup but reclaimable by
    /// insert. Forced worst-case seed: every key probes 0, 1, 2, ... so the
    /// keys below form one collision chain.
    #[test]
    fn tombstones_transparent_and_reclaimed() {
        let mut m = DoubleHashMap::with_probe_seed(ProbeSeed::from_parts(0, 0, 0, 0));
        m.put(b"a", 1).unwrap();
        m.put(b"b", 2).unwrap();
        m.put(b"c", 3).unwrap();

        // Tombstone in the middle of the chain: the key past it must still
        // be reachable, the removed key must not.
        m.remove(b"b").unwrap();
        assert_eq!(m.get(b"c"), Ok(3));
        assert_eq!(m.get(b"b"), Err(TableError::KeyNotFound));
        assert_eq!(m.physical_len(), 3);

        // A new key reclaims the tombstoned slot instead of consuming a
        // fresh one.
        m.put(b"d", 4).unwrap();
        assert_eq!(m.physical_len(), 3);
        assert_eq!(m.len(), 3);
        for (k, v) in [(&b"a"[..], 1), (b"c", 3), (b"d", 4)] {
            assert_eq!(m.get(k), Ok(v));
        }
    }

    /// Invariant: removing and reinserting the same key behaves like a
    /// fresh insert with the new value.
    #[test]
    fn remove_then_reinsert_same_key() {
        let mut m = DoubleHashMap::with_seed(10);
        m.put(b"k", 1).unwrap();
        assert_eq!(m.remove(b"k"), Ok(1));
        m.put(b"k", 2).unwrap();
        assert_eq!(m.get(b"k"), Ok(2));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: keys are compared byte-for-byte, so keys that collide in
    /// hash space still resolve to their own values. The degenerate seed
    /// collides everything.
    #[test]
    fn byte_equality_under_full_collisions() {
        let mut m = DoubleHashMap::with_probe_seed(ProbeSeed::from_parts(0, 0, 0, 0));
        let keys: Vec<Vec<u8>> = (0u8..20).map(|i| vec![b'k', i]).collect();
        for (i, k) in keys.iter().enumerate() {
            m.put(k, i as i64).unwrap();
        }
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(m.get(k), Ok(i as i64));
        }
        assert_eq!(m.len(), 20);
    }

    /// Invariant: the seed drives placement but never observable behavior;
    /// any two seeds agree on the results of the same operations.
    #[test]
    fn behavior_is_seed_independent() {
        let mut a = DoubleHashMap::with_seed(11);
        let mut b = DoubleHashMap::with_seed(12);
        for m in [&mut a, &mut b] {
            for i in 0u8..32 {
                m.put(&[i], i64::from(i)).unwrap();
            }
            for i in (0u8..32).step_by(3) {
                m.remove(&[i]).unwrap();
            }
        }
        assert_eq!(a.len(), b.len());
        for i in 0u8..32 {
            assert_eq!(a.get(&[i]), b.get(&[i]));
        }
    }
}

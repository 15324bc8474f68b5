use std::{borrow::Borrow, hash::Hash, iter, mem};

use log::{debug, trace};

use crate::{
    config::{DEFAULT_CAPACITY, LoadFactor, MapConfig},
    hashing::{primary_hash, secondary_hash},
    map::{Entry, Map},
};

/// A single position in the table
#[derive(Debug, Clone)]
enum Slot<K, V> {
    /// Never held an entry since the last rehash; ends every probe sequence
    Empty,
    /// Held an entry that was removed; probes continue past it, inserts may reuse it
    Tombstone,
    /// Holds a live entry
    Occupied(Entry<K, V>),
}

/// Slot indices visited for one key: `(home + step * i) mod capacity` for `i` in
/// `0..capacity`.
///
/// With a prime capacity and `1 <= step < capacity` every slot is produced exactly once.
#[derive(Debug, Clone)]
struct ProbeSequence {
    /// Next index to yield
    index: usize,
    /// Distance between consecutive indices
    step: usize,
    /// Table size the indices are reduced by
    capacity: usize,
    /// Indices left to yield
    remaining: usize,
}

impl ProbeSequence {
    /// Probe sequence of `key` in a table of `capacity` slots
    fn new<K: Hash + ?Sized>(key: &K, capacity: usize) -> Self {
        Self {
            index: primary_hash(key, capacity),
            step: secondary_hash(key, capacity),
            capacity,
            remaining: capacity,
        }
    }
}

impl Iterator for ProbeSequence {
    type Item = usize;

    #[allow(clippy::arithmetic_side_effects)]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.index;
        // Both terms are below `capacity`, so one subtraction is enough to wrap.
        let next = current + self.step;
        self.index = if next >= self.capacity { next - self.capacity } else { next };
        Some(current)
    }
}

/// A hash map that resolves collisions by open addressing with double hashing.
///
/// Entries live directly in a flat, prime-sized array of slots. A key's probe
/// sequence starts at [`primary_hash`] and advances by [`secondary_hash`], so two
/// keys that share a home slot usually part ways after the first collision.
///
/// Removal leaves a tombstone behind, so lookups for keys stored further along
/// the same probe sequence keep working. Tombstones count towards the resize
/// threshold and are purged by the next rehash.
///
/// Inserting a key that is already present stores a second entry. Lookups see the
/// entry at the earliest position of the key's probe sequence, which is the older
/// one unless the newer entry reused a tombstone ahead of it. Rehashing keeps that
/// order, so the visible copy does not change when the table grows or is purged.
///
/// Note: This implementation is not thread-safe.
#[derive(Debug, Clone)]
pub struct OpenAddressingMap<K, V> {
    /// The slots, always a prime number of them
    slots: Vec<Slot<K, V>>,
    /// Number of occupied slots
    len: usize,
    /// Number of tombstone slots
    tombstones: usize,
    /// Threshold for growing the table
    load_factor: LoadFactor,
}

impl<K, V> Default for OpenAddressingMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Extend<(K, V)> for OpenAddressingMap<K, V>
where
    K: Eq + Hash,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for OpenAddressingMap<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// Allocates `capacity` empty slots
fn empty_slots<K, V>(capacity: usize) -> Vec<Slot<K, V>> {
    iter::repeat_with(|| Slot::Empty).take(capacity).collect()
}

impl<K, V> OpenAddressingMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty map with the default capacity (17) and a 75% load factor
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    /// Creates an empty map sized for the capacity hint.
    ///
    /// The actual capacity is the next prime at or above `capacity`; a zero hint
    /// selects the default capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(MapConfig::default().with_initial_capacity(capacity))
    }

    /// Creates an empty map from an explicit configuration
    #[must_use]
    pub fn with_config(config: MapConfig) -> Self {
        Self {
            slots: empty_slots(config.resolved_capacity()),
            len: 0,
            tombstones: 0,
            load_factor: config.load_factor,
        }
    }

    /// Sets the load factor threshold as a percentage, clamped to 1..=95
    pub fn set_load_factor_threshold(&mut self, threshold: usize) {
        self.load_factor = LoadFactor::clamped(threshold);
    }

    /// The load factor threshold in use
    #[must_use]
    pub fn load_factor_threshold(&self) -> LoadFactor {
        self.load_factor
    }

    /// Number of tombstones left behind by removals since the last rehash
    #[must_use]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Number of slots a lookup of `key` examines before it finds the key or
    /// reaches an empty slot.
    #[must_use]
    pub fn probe_count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut probes: usize = 0;
        for index in ProbeSequence::new(key, self.slots.len()) {
            probes = probes.saturating_add(1);
            match self.slots.get(index) {
                None | Some(Slot::Empty) => break,
                Some(Slot::Occupied(entry)) if entry.key.borrow() == key => break,
                Some(Slot::Occupied(_) | Slot::Tombstone) => {}
            }
        }
        probes
    }

    /// Returns an iterator over the live key-value pairs in slot order
    #[must_use]
    #[allow(clippy::iter_without_into_iter)]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { slots: self.slots.iter() }
    }

    /// Index of the first occupied slot holding `key` along its probe sequence.
    ///
    /// Tombstones are skipped; an empty slot ends the search.
    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        for index in ProbeSequence::new(key, self.slots.len()) {
            match self.slots.get(index) {
                None | Some(Slot::Empty) => return None,
                Some(Slot::Occupied(entry)) if entry.key.borrow() == key => return Some(index),
                Some(Slot::Occupied(_) | Slot::Tombstone) => {}
            }
        }
        None
    }

    /// Puts `entry` into the first empty or tombstone slot of its probe sequence.
    ///
    /// Returns the slot index and whether a tombstone was reused, or hands the entry
    /// back if every slot is occupied.
    fn place(slots: &mut [Slot<K, V>], entry: Entry<K, V>) -> Result<(usize, bool), Entry<K, V>> {
        for index in ProbeSequence::new(&entry.key, slots.len()) {
            if let Some(slot) = slots.get_mut(index) {
                match slot {
                    Slot::Occupied(_) => {}
                    Slot::Empty => {
                        *slot = Slot::Occupied(entry);
                        return Ok((index, false));
                    }
                    Slot::Tombstone => {
                        *slot = Slot::Occupied(entry);
                        return Ok((index, true));
                    }
                }
            }
        }
        Err(entry)
    }

    /// Counts a new entry, grows or purges the table if that crosses the threshold,
    /// then places the entry. Returns the slot index it landed in.
    fn insert_entry(&mut self, key: K, value: V) -> usize {
        self.len = self.len.saturating_add(1);
        let capacity = self.slots.len();
        if self.load_factor.should_resize(self.len.saturating_add(self.tombstones), capacity) {
            if self.load_factor.should_resize(self.len, capacity) {
                self.rehash(self.load_factor.grown_capacity(self.len, capacity));
            } else {
                // Tombstones alone crossed the threshold, reclaim them in place.
                self.rehash(capacity);
            }
        }

        let mut entry = Entry { key, value };
        loop {
            match Self::place(&mut self.slots, entry) {
                Ok((index, reused_tombstone)) => {
                    if reused_tombstone {
                        trace!("reused tombstone at slot {index}");
                        self.tombstones = self.tombstones.saturating_sub(1);
                    }
                    return index;
                }
                Err(rejected) => {
                    entry = rejected;
                    let capacity = self.slots.len();
                    self.rehash(self.load_factor.grown_capacity(self.len, capacity));
                }
            }
        }
    }

    /// Moves every live entry into a fresh array of `new_capacity` slots, recomputing
    /// each probe sequence against the new size. Tombstones are dropped.
    ///
    /// Entries sharing a key keep their relative probe order, so the copy lookups
    /// see before the rehash is still the one they see after it.
    fn rehash(&mut self, new_capacity: usize) {
        debug!(
            "rehashing open addressing table: {} -> {} slots ({} entries, {} tombstones)",
            self.slots.len(),
            new_capacity,
            self.len,
            self.tombstones
        );
        let old_capacity = self.slots.len();
        let old_slots = mem::replace(&mut self.slots, empty_slots(new_capacity));

        // Copies of one key share a probe sequence, so placing entries in order of their
        // old probe step keeps the earliest copy first in the new table.
        let mut staged: Vec<(usize, Entry<K, V>)> = old_slots
            .into_iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied(entry) => {
                    let step = ProbeSequence::new(&entry.key, old_capacity)
                        .position(|probed| probed == index)
                        .unwrap_or(old_capacity);
                    Some((step, entry))
                }
                Slot::Empty | Slot::Tombstone => None,
            })
            .collect();
        staged.sort_by_key(|(step, _)| *step);

        for (_, entry) in staged {
            let placed = Self::place(&mut self.slots, entry);
            debug_assert!(placed.is_ok(), "rehash target has room for every entry");
        }
        self.tombstones = 0;
    }
}

impl<K, V> Map<K, V> for OpenAddressingMap<K, V>
where
    K: Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) {
        self.insert_entry(key, value);
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        let slot = self.slots.get_mut(index)?;
        match mem::replace(slot, Slot::Tombstone) {
            Slot::Occupied(entry) => {
                self.len = self.len.saturating_sub(1);
                self.tombstones = self.tombstones.saturating_add(1);
                Some(entry.value)
            }
            other => {
                *slot = other;
                None
            }
        }
    }

    fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.slots.get(self.find_index(key)?) {
            Some(Slot::Occupied(entry)) => Some(&entry.value),
            _ => None,
        }
    }

    /// # Panics
    ///
    /// Panics if the slot just located or filled for `key` does not hold an entry,
    /// which would mean the probing logic is broken.
    #[allow(clippy::expect_used)]
    fn access(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let index = match self.find_index(&key) {
            Some(index) => index,
            None => self.insert_entry(key, V::default()),
        };
        let value = match self.slots.get_mut(index) {
            Some(Slot::Occupied(entry)) => Some(&mut entry.value),
            _ => None,
        };
        value.expect("located slot holds an entry")
    }

    fn clear(&mut self) {
        debug!("clearing open addressing table of {} slots", self.slots.len());
        self.slots = empty_slots(DEFAULT_CAPACITY);
        self.len = 0;
        self.tombstones = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Iterator over the live key-value pairs of an [`OpenAddressingMap`]
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    /// Remaining slots
    slots: std::slice::Iter<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.find_map(|slot| match slot {
            Slot::Occupied(entry) => Some((&entry.key, &entry.value)),
            Slot::Empty | Slot::Tombstone => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::is_prime;

    /// First key after `start` whose home slot matches `key`'s in a table of `capacity`.
    fn colliding_key(key: u64, start: u64, capacity: usize) -> u64 {
        let home = primary_hash(&key, capacity);
        (start..).find(|candidate| primary_hash(candidate, capacity) == home).unwrap()
    }

    #[test]
    fn test_insert_and_find() {
        let mut map = OpenAddressingMap::new();
        map.insert("key1".to_string(), 1);
        map.insert("key2".to_string(), 2);
        map.insert("key3".to_string(), 3);

        assert_eq!(map.find("key1"), Some(&1));
        assert_eq!(map.find("key2"), Some(&2));
        assert_eq!(map.find("key3"), Some(&3));
        assert_eq!(map.find("key4"), None);
        assert_eq!(map.find_or_default("key4"), 0);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_probe_sequence_visits_every_slot_once() {
        for capacity in [2, 3, 17, 23, 101] {
            for key in 0..50_u32 {
                let mut visited: Vec<usize> = ProbeSequence::new(&key, capacity).collect();
                visited.sort_unstable();
                assert_eq!(visited, (0..capacity).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_remove() {
        let mut map = OpenAddressingMap::new();
        map.insert("key1".to_string(), 1);
        map.insert("key2".to_string(), 2);

        assert_eq!(map.remove("key1"), Some(1));
        assert!(!map.key_exists("key1"));
        assert_eq!(map.find("key2"), Some(&2));
        assert_eq!(map.remove("key1"), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.tombstones(), 1);

        map.insert("key1".to_string(), 10);
        assert_eq!(map.find("key1"), Some(&10));
    }

    #[test]
    fn test_remove_keeps_colliding_keys_reachable() {
        let mut map: OpenAddressingMap<u64, &str> = OpenAddressingMap::new();
        let a = 0_u64;
        let b = colliding_key(a, 1, map.capacity());

        map.insert(a, "a");
        map.insert(b, "b");
        assert!(map.probe_count(&b) >= 2);

        assert_eq!(map.remove(&a), Some("a"));
        assert_eq!(map.find(&b), Some(&"b"));
        assert!(map.key_exists(&b));
        assert!(!map.key_exists(&a));
    }

    #[test]
    fn test_insert_reuses_tombstone() {
        let mut map = OpenAddressingMap::new();
        map.insert(1_u32, 1);
        map.remove(&1);
        assert_eq!(map.tombstones(), 1);

        map.insert(1, 2);
        assert_eq!(map.tombstones(), 0);
        assert_eq!(map.find(&1), Some(&2));
    }

    #[test]
    fn test_duplicate_keys_resolve_to_earliest_probe_position() {
        let mut map = OpenAddressingMap::new();
        map.insert("dup", 1);
        map.insert("dup", 2);

        assert_eq!(map.len(), 2);
        assert_eq!(map.find(&"dup"), Some(&1));

        // Removing the visible entry uncovers the shadowed one.
        assert_eq!(map.remove(&"dup"), Some(1));
        assert_eq!(map.find(&"dup"), Some(&2));
    }

    #[test]
    fn test_duplicate_order_survives_growth() {
        let mut map = OpenAddressingMap::new();
        for key in 0..200_u32 {
            map.insert(key, "old");
            map.insert(key, "new");
        }
        let capacity = map.capacity();
        let mut filler = 1_000_u32;
        while map.capacity() == capacity {
            map.insert(filler, "filler");
            filler += 1;
        }

        let flipped: Vec<u32> = (0..200).filter(|key| map.find(key) != Some(&"old")).collect();
        assert!(flipped.is_empty(), "newer copy became visible for {flipped:?}");
        assert_eq!(map.remove(&7), Some("old"));
        assert_eq!(map.find(&7), Some(&"new"));
    }

    #[test]
    fn test_duplicate_order_survives_tombstone_purge() {
        let mut map = OpenAddressingMap::new();
        for key in 0..4_u32 {
            map.insert(key, "old");
            map.insert(key, "new");
        }

        for extra in 100..104_u32 {
            map.insert(extra, "extra");
        }
        for extra in 100..104_u32 {
            map.remove(&extra);
        }
        assert_eq!(map.tombstones(), 4);

        // Nine live entries plus four tombstones cross 75% of 17 slots.
        map.insert(200, "trigger");
        assert_eq!(map.tombstones(), 0);
        assert_eq!(map.capacity(), 17);
        for key in 0..4_u32 {
            assert_eq!(map.find(&key), Some(&"old"));
        }
    }

    #[test]
    fn test_access_inserts_default() {
        let mut map: OpenAddressingMap<&str, i32> = OpenAddressingMap::new();
        assert_eq!(*map.access("missing"), 0);
        assert_eq!(map.len(), 1);
        assert!(map.key_exists(&"missing"));

        *map.access("counter") += 5;
        *map.access("counter") += 5;
        assert_eq!(map.find(&"counter"), Some(&10));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_resize_from_capacity_hint() {
        let mut map = OpenAddressingMap::with_capacity(10);
        assert_eq!(map.capacity(), 11);

        for i in 0..8_u32 {
            map.insert(i, i * 10);
        }
        assert_eq!(map.capacity(), 11);

        map.insert(8, 80);
        assert_eq!(map.capacity(), 23);
        for i in 0..9_u32 {
            assert_eq!(map.find(&i), Some(&(i * 10)));
        }
    }

    #[test]
    fn test_capacity_stays_prime_and_under_threshold() {
        let mut map = OpenAddressingMap::with_capacity(0);
        assert_eq!(map.capacity(), 17);

        let mut capacity = map.capacity();
        for i in 0..2_000_u32 {
            map.insert(i, i);
            if map.capacity() != capacity {
                capacity = map.capacity();
                assert!(is_prime(capacity));
                assert!(!map.load_factor_threshold().should_resize(map.len(), capacity));
            }
        }
        for i in 0..2_000_u32 {
            assert_eq!(map.find(&i), Some(&i));
        }
    }

    #[test]
    fn test_tombstones_are_purged_without_growing() {
        let mut map = OpenAddressingMap::new();
        for i in 0..1_000_u32 {
            map.insert(i, i);
            assert_eq!(map.remove(&i), Some(i));
        }

        assert_eq!(map.capacity(), 17);
        assert!(map.is_empty());
        assert!(map.tombstones() < map.capacity());
        assert_eq!(map.find(&5_000), None);
    }

    #[test]
    fn test_clear() {
        let mut map = OpenAddressingMap::new();
        for i in 0..100_u32 {
            map.insert(i, i);
        }
        assert!(map.capacity() > 17);

        map.clear();

        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 17);
        assert_eq!(map.tombstones(), 0);
        assert_eq!(map.find(&1), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = OpenAddressingMap::new();
        original.insert("a".to_string(), 1);

        let mut copy = original.clone();
        copy.insert("b".to_string(), 2);
        *copy.access("a".to_string()) = 100;
        original.remove("a");

        assert_eq!(original.find("a"), None);
        assert_eq!(original.find("b"), None);
        assert_eq!(copy.find("a"), Some(&100));
        assert_eq!(copy.find("b"), Some(&2));

        let mut assigned = OpenAddressingMap::new();
        assigned.insert("z".to_string(), 26);
        assigned.clone_from(&copy);
        assert_eq!(assigned.find("z"), None);
        assert_eq!(assigned.len(), copy.len());
    }

    #[test]
    fn test_iter_and_from_iter() {
        let map: OpenAddressingMap<u32, u32> = (1..=3).map(|i| (i, i * 2)).collect();

        let mut pairs: Vec<(u32, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(1, 2), (2, 4), (3, 6)]);
    }

    #[test]
    fn test_set_load_factor_threshold() {
        let mut map = OpenAddressingMap::with_capacity(17);
        map.set_load_factor_threshold(50);

        for i in 0..8_u32 {
            map.insert(i, i);
        }
        assert_eq!(map.capacity(), 17);
        map.insert(8, 8);
        assert_eq!(map.capacity(), 37);
    }
}

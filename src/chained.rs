use std::{
    borrow::Borrow,
    collections::{VecDeque, vec_deque},
    hash::Hash,
    iter, mem, slice,
};

use log::debug;

use crate::{
    config::{DEFAULT_CAPACITY, LoadFactor, MapConfig},
    hashing::primary_hash,
    map::{Entry, Map},
};

/// A hash map that resolves collisions by separate chaining.
///
/// Every bucket is a list of entries ordered most-recent-first. Inserting a key
/// that is already present prepends a second entry, so lookups always see the
/// value inserted last; removing it uncovers the previous one.
///
/// Note: This implementation is not thread-safe.
#[derive(Debug, Clone)]
pub struct ChainedMap<K, V> {
    /// The buckets, always a prime number of them
    buckets: Vec<VecDeque<Entry<K, V>>>,
    /// Number of live entries across all buckets
    len: usize,
    /// Threshold for growing the table
    load_factor: LoadFactor,
}

impl<K, V> Default for ChainedMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Extend<(K, V)> for ChainedMap<K, V>
where
    K: Eq + Hash,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ChainedMap<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// Allocates `capacity` empty buckets
fn empty_buckets<K, V>(capacity: usize) -> Vec<VecDeque<Entry<K, V>>> {
    iter::repeat_with(VecDeque::new).take(capacity).collect()
}

impl<K, V> ChainedMap<K, V>
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
            buckets: empty_buckets(config.resolved_capacity()),
            len: 0,
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

    /// Number of entries in the bucket `key` hashes to
    #[must_use]
    pub fn chain_length<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.get(primary_hash(key, self.buckets.len())).map_or(0, VecDeque::len)
    }

    /// Returns an iterator over the key-value pairs, bucket by bucket
    #[must_use]
    #[allow(clippy::iter_without_into_iter)]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { buckets: self.buckets.iter(), chain: None }
    }

    /// Bucket index and position within the bucket of the first entry for `key`
    fn locate<Q>(&self, key: &Q) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = primary_hash(key, self.buckets.len());
        let position = self.buckets.get(bucket)?.iter().position(|entry| entry.key.borrow() == key)?;
        Some((bucket, position))
    }

    /// Counts one more entry and grows the table if that crosses the threshold
    fn reserve_one(&mut self) {
        self.len = self.len.saturating_add(1);
        let capacity = self.buckets.len();
        if self.load_factor.should_resize(self.len, capacity) {
            self.resize(self.load_factor.grown_capacity(self.len, capacity));
        }
    }

    /// Prepends `entry` to its bucket without touching the count. Returns the bucket index.
    fn push_front(&mut self, entry: Entry<K, V>) -> usize {
        let index = primary_hash(&entry.key, self.buckets.len());
        if let Some(bucket) = self.buckets.get_mut(index) {
            bucket.push_front(entry);
        }
        index
    }

    /// Redistributes every entry over `new_capacity` fresh buckets.
    ///
    /// Entries are staged out of the old buckets and prepended again one by one.
    /// Each old bucket is replayed oldest first, so entries sharing a key keep their
    /// most-recent-first order. Placement skips the threshold check, so a resize
    /// never triggers another one.
    fn resize(&mut self, new_capacity: usize) {
        debug!(
            "resizing chained table: {} -> {} buckets ({} entries)",
            self.buckets.len(),
            new_capacity,
            self.len
        );
        let staged: Vec<Entry<K, V>> = mem::replace(&mut self.buckets, empty_buckets(new_capacity))
            .into_iter()
            .flat_map(|bucket| bucket.into_iter().rev())
            .collect();
        for entry in staged {
            self.push_front(entry);
        }
    }
}

impl<K, V> Map<K, V> for ChainedMap<K, V>
where
    K: Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) {
        self.reserve_one();
        self.push_front(Entry { key, value });
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (bucket, position) = self.locate(key)?;
        let entry = self.buckets.get_mut(bucket)?.remove(position)?;
        self.len = self.len.saturating_sub(1);
        Some(entry.value)
    }

    fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (bucket, position) = self.locate(key)?;
        self.buckets.get(bucket)?.get(position).map(|entry| &entry.value)
    }

    /// # Panics
    ///
    /// Panics if the entry just located or prepended for `key` cannot be found again,
    /// which would mean the bucket bookkeeping is broken.
    #[allow(clippy::expect_used)]
    fn access(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let (bucket, position) = match self.locate(&key) {
            Some(found) => found,
            None => {
                self.reserve_one();
                (self.push_front(Entry { key, value: V::default() }), 0)
            }
        };
        self.buckets
            .get_mut(bucket)
            .and_then(|chain| chain.get_mut(position))
            .map(|entry| &mut entry.value)
            .expect("located entry is still in its bucket")
    }

    fn clear(&mut self) {
        debug!("clearing chained table of {} buckets", self.buckets.len());
        self.buckets = empty_buckets(DEFAULT_CAPACITY);
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.buckets.len()
    }
}

/// Iterator over the key-value pairs of a [`ChainedMap`]
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    /// Buckets not yet visited
    buckets: slice::Iter<'a, VecDeque<Entry<K, V>>>,
    /// Remaining entries of the bucket being visited
    chain: Option<vec_deque::Iter<'a, Entry<K, V>>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.chain.as_mut().and_then(Iterator::next) {
                return Some((&entry.key, &entry.value));
            }
            self.chain = Some(self.buckets.next()?.iter());
        }
    }
}

//! The map contract shared by both collision-resolution strategies.

use std::{borrow::Borrow, hash::Hash};

/// A key-value pair stored in a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry<K, V> {
    /// The key in the key-value pair
    pub(crate) key: K,
    /// The value associated with the key
    pub(crate) value: V,
}

/// Key-value map over a prime-sized hash table.
///
/// `insert` appends and never replaces: inserting a key that is already present
/// stores a second entry, and which of the two is visible to lookups depends on
/// the implementation. See [`crate::OpenAddressingMap`] and [`crate::ChainedMap`].
pub trait Map<K, V>
where
    K: Eq + Hash,
{
    /// Stores `key` with `value`, growing the table first if needed.
    fn insert(&mut self, key: K, value: V);

    /// Removes the entry that lookups currently see for `key` and returns its value.
    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Returns the value lookups currently see for `key`.
    fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Returns a mutable handle to the value for `key`, inserting `V::default()` first if
    /// the key is absent.
    fn access(&mut self, key: K) -> &mut V
    where
        V: Default;

    /// Drops every entry and shrinks back to the default capacity.
    fn clear(&mut self);

    /// Number of live entries
    fn len(&self) -> usize;

    /// Number of slots (open addressing) or buckets (chaining). Always prime.
    fn capacity(&self) -> usize;

    /// Returns true if `key` has an entry.
    fn key_exists<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Returns a copy of the value for `key`, or `V::default()` if absent.
    fn find_or_default<Q>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Default + Clone,
    {
        self.find(key).cloned().unwrap_or_default()
    }

    /// Returns true if the map has no live entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ratio of live entries to capacity
    #[allow(clippy::cast_precision_loss)]
    fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }
}

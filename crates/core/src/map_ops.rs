//! Insertion-ordered maps
//!
//! [`Map`] is frozen and shareable; [`MapBuilder`] is its mutable form. Both
//! iterate in the order keys were first inserted. Overwriting a key keeps
//! its original position.
//!
//! A lookup of an absent key bubbles, so a stored `None` (with `V =
//! Option<_>`) stays distinguishable from a missing entry.
//!
//! # Examples
//!
//! ```
//! use weft_core::map_ops::{Map, Mapped};
//!
//! let m = Map::from_entries([("b", 1), ("a", 2), ("b", 3)]);
//! assert_eq!(m.keys().iter().copied().collect::<Vec<_>>(), vec!["b", "a"]);
//! assert_eq!(m.get(&"b"), Ok(&3));
//! assert!(m.get(&"z").is_err());
//! ```

use crate::error::{Result, bubble};
use crate::list_ops::{List, ListBuilder};
use indexmap::IndexMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

// =============================================================================
// Mapped: read-only view shared by maps and builders
// =============================================================================

/// Read-only access to an insertion-ordered mapping
pub trait Mapped<K: Eq + Hash, V> {
    /// Backing table; `None` when there are no entries
    fn table(&self) -> Option<&IndexMap<K, V>>;

    /// Entries in insertion order
    fn entries<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a V)>
    where
        K: 'a,
        V: 'a,
    {
        self.table().into_iter().flat_map(IndexMap::iter)
    }

    fn position(&self, key: &K) -> Option<usize> {
        self.table()?.get_index_of(key)
    }

    fn len(&self) -> usize {
        self.table().map_or(0, IndexMap::len)
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored value for `key`; absent keys bubble
    fn get<'a>(&'a self, key: &K) -> Result<&'a V>
    where
        K: 'a,
        V: 'a,
    {
        self.table()
            .and_then(|table| table.get(key))
            .ok_or_else(bubble)
    }

    fn get_or(&self, key: &K, default: V) -> V
    where
        V: Clone,
    {
        self.get(key).cloned().unwrap_or(default)
    }

    fn has(&self, key: &K) -> bool {
        self.position(key).is_some()
    }

    fn keys(&self) -> List<K>
    where
        K: Clone,
    {
        self.entries().map(|(k, _)| k.clone()).collect()
    }

    fn values(&self) -> List<V>
    where
        V: Clone,
    {
        self.entries().map(|(_, v)| v.clone()).collect()
    }

    fn to_list(&self) -> List<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.to_list_with(|k, v| (k.clone(), v.clone()))
    }

    fn to_list_with<T>(&self, mut f: impl FnMut(&K, &V) -> T) -> List<T> {
        self.entries().map(|(k, v)| f(k, v)).collect()
    }

    fn to_list_builder(&self) -> ListBuilder<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.to_list_builder_with(|k, v| (k.clone(), v.clone()))
    }

    fn to_list_builder_with<T>(&self, mut f: impl FnMut(&K, &V) -> T) -> ListBuilder<T> {
        self.entries().map(|(k, v)| f(k, v)).collect()
    }

    fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        for (k, v) in self.entries() {
            f(k, v);
        }
    }

    /// Freeze into an immutable map with the same order
    fn to_map(&self) -> Map<K, V>
    where
        K: Clone,
        V: Clone,
    {
        Map::from_entries(self.entries().map(|(k, v)| (k.clone(), v.clone())))
    }

    fn to_map_builder(&self) -> MapBuilder<K, V>
    where
        K: Clone,
        V: Clone,
    {
        MapBuilder {
            table: self.table().cloned().unwrap_or_default(),
        }
    }
}

// =============================================================================
// Map
// =============================================================================

/// Frozen insertion-ordered map
///
/// Two maps are equal when they hold the same entries in the same order.
pub struct Map<K, V> {
    table: Option<Arc<IndexMap<K, V>>>,
}

impl<K, V> Map<K, V> {
    pub const fn empty() -> Self {
        Map { table: None }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.table.iter().flat_map(|table| table.iter())
    }

    pub fn ptr_eq(a: &Map<K, V>, b: &Map<K, V>) -> bool {
        match (&a.table, &b.table) {
            (None, None) => true,
            (Some(x), Some(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }

    fn from_table(table: IndexMap<K, V>) -> Self {
        if table.is_empty() {
            Map::empty()
        } else {
            Map {
                table: Some(Arc::new(table)),
            }
        }
    }
}

impl<K: Eq + Hash, V> Map<K, V> {
    /// Build from entries; the last write for a key wins, and keys keep the
    /// order of their first occurrence
    pub fn from_entries(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Map::from_table(entries.into_iter().collect())
    }
}

impl<K: Eq + Hash, V> Mapped<K, V> for Map<K, V> {
    fn table(&self) -> Option<&IndexMap<K, V>> {
        self.table.as_deref()
    }

    fn to_map(&self) -> Map<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.clone()
    }
}

impl<K, V> Clone for Map<K, V> {
    fn clone(&self) -> Self {
        Map {
            table: self.table.clone(),
        }
    }
}

impl<K, V> Default for Map<K, V> {
    fn default() -> Self {
        Map::empty()
    }
}

impl<K: Eq + Hash, V: PartialEq> PartialEq for Map<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries().eq(other.entries())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Map<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for Map<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Map::from_entries(iter)
    }
}

// =============================================================================
// MapBuilder
// =============================================================================

/// Mutable insertion-ordered map
#[derive(Clone)]
pub struct MapBuilder<K, V> {
    table: IndexMap<K, V>,
}

impl<K: Eq + Hash, V> MapBuilder<K, V> {
    pub fn new() -> Self {
        MapBuilder {
            table: IndexMap::new(),
        }
    }

    /// Insert or overwrite; an overwritten key keeps its position
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        self.table.insert(key, value)
    }

    /// Remove and return the value for `key`; absent keys bubble
    ///
    /// Later entries shift down, so iteration order is preserved.
    pub fn remove(&mut self, key: &K) -> Result<V> {
        self.table.shift_remove(key).ok_or_else(bubble)
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Promote to an immutable map without copying entries
    pub fn into_map(self) -> Map<K, V> {
        Map::from_table(self.table)
    }
}

impl<K: Eq + Hash, V> Default for MapBuilder<K, V> {
    fn default() -> Self {
        MapBuilder::new()
    }
}

impl<K: Eq + Hash, V> Mapped<K, V> for MapBuilder<K, V> {
    fn table(&self) -> Option<&IndexMap<K, V>> {
        Some(&self.table)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MapBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.table.iter()).finish()
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for MapBuilder<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        MapBuilder {
            table: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::list_ops::Listed;

    #[test]
    fn test_construct_dedupes_last_write_wins() {
        let m = Map::from_entries([("x", 1), ("y", 2), ("x", 3), ("z", 4)]);
        assert_eq!(m.len(), 3);
        assert_eq!(m.keys().as_slice(), &["x", "y", "z"]);
        assert_eq!(m.values().as_slice(), &[3, 2, 4]);
    }

    #[test]
    fn test_canonical_empty() {
        let m: Map<String, i32> = Map::from_entries(Vec::new());
        assert!(m.is_empty());
        assert!(Map::ptr_eq(&m, &Map::empty()));
    }

    #[test]
    fn test_get_distinguishes_absent_from_none() {
        let m = Map::from_entries([("present", None), ("also", Some(1))]);
        assert_eq!(m.get(&"present"), Ok(&None));
        assert_eq!(m.get(&"missing"), Err(Error::Bubble));
        assert!(m.has(&"present"));
        assert!(!m.has(&"missing"));
        assert_eq!(m.get_or(&"missing", Some(9)), Some(9));
    }

    #[test]
    fn test_builder_remove() {
        let mut b = MapBuilder::new();
        b.set("a", 1);
        b.set("b", 2);
        b.set("c", 3);
        assert_eq!(b.remove(&"b"), Ok(2));
        assert_eq!(b.remove(&"b"), Err(Error::Bubble));
        // positions after the removed entry stay addressable
        assert_eq!(b.get(&"c"), Ok(&3));
        b.set("b", 4);
        assert_eq!(b.keys().as_slice(), &["a", "c", "b"]);
    }

    #[test]
    fn test_remove_keeps_order_of_remaining_entries() {
        let mut b: MapBuilder<i32, char> = [(1, 'a'), (2, 'b'), (3, 'c'), (4, 'd')]
            .into_iter()
            .collect();
        assert_eq!(b.remove(&1), Ok('a'));
        assert_eq!(b.keys().as_slice(), &[2, 3, 4]);
        assert_eq!(b.position(&4), Some(2));
        assert_eq!(b.to_map().values().as_slice(), &['b', 'c', 'd']);
    }

    #[test]
    fn test_set_overwrite_keeps_position() {
        let mut b = MapBuilder::new();
        b.set(1, "one");
        b.set(2, "two");
        assert_eq!(b.set(1, "uno"), Some("one"));
        assert_eq!(b.to_list().as_slice(), &[(1, "uno"), (2, "two")]);
    }

    #[test]
    fn test_to_list_with_and_for_each() {
        let m = Map::from_entries([("a", 1), ("b", 2)]);
        let labels = m.to_list_with(|k, v| format!("{}={}", k, v));
        assert_eq!(labels.join("&", |s| s.clone()), "a=1&b=2");

        let mut seen = Vec::new();
        m.for_each(|k, v| seen.push((*k, *v)));
        assert_eq!(seen, vec![("a", 1), ("b", 2)]);

        let mut builder = m.to_list_builder_with(|_, v| v * 10);
        builder.add(30);
        assert_eq!(builder.as_slice(), &[10, 20, 30]);
        assert_eq!(m.to_list_builder().len(), 2);
    }

    #[test]
    fn test_to_map_round_trips() {
        let m = Map::from_entries([("k", 1)]);
        assert!(Map::ptr_eq(&m, &m.to_map()));

        let mut b = m.to_map_builder();
        b.set("j", 2);
        let frozen = b.to_map();
        assert_eq!(frozen.keys().as_slice(), &["k", "j"]);
        assert_eq!(b.into_map(), frozen);
        // the source map is untouched
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut b: MapBuilder<i32, i32> = (0..5).map(|i| (i, i)).collect();
        assert_eq!(b.len(), 5);
        b.clear();
        assert!(b.is_empty());
        assert!(!b.has(&1));
    }
}

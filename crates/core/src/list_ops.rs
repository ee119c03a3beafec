//! Immutable lists, list builders, and the combinators shared by both
//!
//! [`List`] is a frozen, reference-counted sequence. Cloning one is O(1)
//! and lists are freely shareable across threads. [`ListBuilder`] is the
//! caller-owned mutable form; [`ListBuilder::into_list`] promotes it
//! without copying elements.
//!
//! The read-only combinators live on the [`Listed`] trait, implemented for
//! lists, builders, vectors, and slices. Element kinds are not boxed: each
//! combinator is one generic path, monomorphized per element type.
//!
//! # Examples
//!
//! ```
//! use weft_core::list_ops::{List, ListBuilder, Listed};
//!
//! let xs = List::of_slice(&[1, 2, 3, 4]);
//! let evens = xs.filter(|x| x % 2 == 0);
//! assert_eq!(evens.join(",", |x| x.to_string()), "2,4");
//!
//! let mut b = ListBuilder::from_vec(vec![10, 20, 30, 40]);
//! let removed = b.splice(Some(1), Some(2), Some(&[99]));
//! assert_eq!(removed, List::of_slice(&[20, 30]));
//! assert_eq!(b.as_slice(), &[10, 99, 40]);
//! ```

use crate::error::{Result, bubble};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

fn clamp(value: i32, low: usize, high: usize) -> usize {
    if value < 0 {
        low
    } else {
        (value as usize).clamp(low, high)
    }
}

fn checked_index(index: i32, len: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|i| *i < len)
}

// =============================================================================
// Listed: read-only view shared by lists and builders
// =============================================================================

/// Read-only access to an ordered sequence
pub trait Listed<T> {
    fn as_slice(&self) -> &[T];

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Element at `index`; out of range bubbles
    fn get(&self, index: i32) -> Result<&T> {
        let items = self.as_slice();
        checked_index(index, items.len())
            .map(|i| &items[i])
            .ok_or_else(bubble)
    }

    /// Element at `index`, or `default` when out of range
    fn get_or(&self, index: i32, default: T) -> T
    where
        T: Clone,
    {
        self.get(index).cloned().unwrap_or(default)
    }

    /// Copy of `[begin, end)`, with `begin` clamped to `[0, len]` and `end`
    /// clamped to `[begin, len]`
    fn slice(&self, begin: i32, end: i32) -> List<T>
    where
        T: Clone,
    {
        let items = self.as_slice();
        let start = clamp(begin, 0, items.len());
        let end = clamp(end, start, items.len());
        List::of_slice(&items[start..end])
    }

    fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> List<T>
    where
        T: Clone,
    {
        self.as_slice()
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    fn map<U>(&self, f: impl FnMut(&T) -> U) -> List<U> {
        self.as_slice().iter().map(f).collect()
    }

    /// Map, omitting elements whose transform bubbles
    ///
    /// Errors other than bubble stop the walk and propagate.
    fn map_dropping<U>(&self, mut f: impl FnMut(&T) -> Result<U>) -> Result<List<U>> {
        let mut out = Vec::with_capacity(self.len());
        for item in self.as_slice() {
            match f(item) {
                Ok(mapped) => out.push(mapped),
                Err(e) if e.is_bubble() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(List::from_vec(out))
    }

    /// Left fold seeded with the first element; empty bubbles
    fn reduce(&self, mut f: impl FnMut(T, &T) -> T) -> Result<T>
    where
        T: Clone,
    {
        let (first, rest) = self.as_slice().split_first().ok_or_else(bubble)?;
        Ok(rest.iter().fold(first.clone(), |acc, item| f(acc, item)))
    }

    /// Left fold from `initial`, starting at index 0
    fn reduce_from<R>(&self, initial: R, f: impl FnMut(R, &T) -> R) -> R {
        self.as_slice().iter().fold(initial, f)
    }

    fn join(&self, delimiter: &str, mut to_string: impl FnMut(&T) -> String) -> String {
        let mut out = String::new();
        for (i, item) in self.as_slice().iter().enumerate() {
            if i > 0 {
                out.push_str(delimiter);
            }
            out.push_str(&to_string(item));
        }
        out
    }

    fn for_each(&self, f: impl FnMut(&T)) {
        self.as_slice().iter().for_each(f);
    }

    /// Stable sort into a new list
    fn sorted(&self, compare: impl FnMut(&T, &T) -> Ordering) -> List<T>
    where
        T: Clone,
    {
        let mut items = self.as_slice().to_vec();
        items.sort_by(compare);
        List::from_vec(items)
    }

    fn to_list(&self) -> List<T>
    where
        T: Clone,
    {
        List::of_slice(self.as_slice())
    }

    fn to_list_builder(&self) -> ListBuilder<T>
    where
        T: Clone,
    {
        ListBuilder::from_vec(self.as_slice().to_vec())
    }
}

/// Immutable list for any listed value, reusing `source` when it is one
pub fn listed_to_list<T: Clone>(source: &impl Listed<T>) -> List<T> {
    source.to_list()
}

// =============================================================================
// List
// =============================================================================

/// Frozen, shareable sequence
///
/// The empty list holds no allocation.
pub struct List<T> {
    items: Option<Arc<[T]>>,
}

impl<T> List<T> {
    pub const fn of() -> Self {
        List { items: None }
    }

    pub fn of_one(item: T) -> Self {
        List::from_vec(vec![item])
    }

    /// Take ownership of `items`; no element is cloned
    pub fn from_vec(items: Vec<T>) -> Self {
        if items.is_empty() {
            List::of()
        } else {
            List {
                items: Some(Arc::from(items)),
            }
        }
    }

    pub fn copy_of(items: impl IntoIterator<Item = T>) -> Self {
        items.into_iter().collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Whether both handles share one allocation
    pub fn ptr_eq(a: &List<T>, b: &List<T>) -> bool {
        match (&a.items, &b.items) {
            (None, None) => true,
            (Some(x), Some(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }
}

impl<T: Clone> List<T> {
    pub fn of_slice(items: &[T]) -> Self {
        if items.is_empty() {
            List::of()
        } else {
            List {
                items: Some(Arc::from(items)),
            }
        }
    }
}

impl<T> Listed<T> for List<T> {
    fn as_slice(&self) -> &[T] {
        self.items.as_deref().unwrap_or(&[])
    }

    fn to_list(&self) -> List<T>
    where
        T: Clone,
    {
        self.clone()
    }
}

impl<T> Clone for List<T> {
    fn clone(&self) -> Self {
        List {
            items: self.items.clone(),
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        List::of()
    }
}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for List<T> {}

impl<T: Hash> Hash for List<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        List::from_vec(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// ListBuilder
// =============================================================================

/// Caller-owned mutable sequence
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ListBuilder<T> {
    items: Vec<T>,
}

impl<T> ListBuilder<T> {
    pub fn new() -> Self {
        ListBuilder { items: Vec::new() }
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        ListBuilder { items }
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item);
    }

    /// Insert at `at`, which must lie in `[0, len]`
    pub fn add_at(&mut self, item: T, at: i32) -> Result<()> {
        let at = usize::try_from(at)
            .ok()
            .filter(|i| *i <= self.items.len())
            .ok_or_else(bubble)?;
        self.items.insert(at, item);
        Ok(())
    }

    pub fn add_all(&mut self, source: impl IntoIterator<Item = T>) {
        self.items.extend(source);
    }

    pub fn add_all_at(&mut self, source: impl IntoIterator<Item = T>, at: i32) -> Result<()> {
        let at = usize::try_from(at)
            .ok()
            .filter(|i| *i <= self.items.len())
            .ok_or_else(bubble)?;
        self.items.splice(at..at, source);
        Ok(())
    }

    /// Remove and return the last element; empty bubbles
    pub fn remove_last(&mut self) -> Result<T> {
        self.items.pop().ok_or_else(bubble)
    }

    pub fn set(&mut self, index: i32, item: T) -> Result<()> {
        let i = checked_index(index, self.items.len()).ok_or_else(bubble)?;
        self.items[i] = item;
        Ok(())
    }

    pub fn reverse(&mut self) {
        self.items.reverse();
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Stable sort in place
    pub fn sort(&mut self, compare: impl FnMut(&T, &T) -> Ordering) {
        self.items.sort_by(compare);
    }

    /// Promote to an immutable list, moving the elements
    pub fn into_list(self) -> List<T> {
        List::from_vec(self.items)
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Clone> ListBuilder<T> {
    /// Replace a clamped range with `new_elems`, returning what was removed
    ///
    /// `index` defaults to 0 and is clamped to `[0, len]`. `remove_count`
    /// defaults to `len` and is clamped to `[0, len]`; the removed range
    /// ends at `min(index + remove_count, len)`.
    pub fn splice(
        &mut self,
        index: Option<i32>,
        remove_count: Option<i32>,
        new_elems: Option<&[T]>,
    ) -> List<T> {
        let size = self.items.len();
        let start = index.map_or(0, |i| clamp(i, 0, size));
        let remove = remove_count.map_or(size, |n| clamp(n, 0, size));
        let end = (start + remove).min(size);
        let replacement = new_elems.unwrap_or(&[]).iter().cloned();
        self.items.splice(start..end, replacement).collect()
    }
}

impl<T> Listed<T> for ListBuilder<T> {
    fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: fmt::Debug> fmt::Debug for ListBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

impl<T> FromIterator<T> for ListBuilder<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        ListBuilder::from_vec(iter.into_iter().collect())
    }
}

impl<T> Listed<T> for Vec<T> {
    fn as_slice(&self) -> &[T] {
        self
    }
}

impl<T> Listed<T> for [T] {
    fn as_slice(&self) -> &[T] {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_canonical_shapes() {
        let empty: List<i32> = List::of();
        assert!(empty.is_empty());
        assert!(List::ptr_eq(&empty, &List::from_vec(Vec::new())));
        assert_eq!(List::of_one(7).as_slice(), &[7]);
        assert_eq!(List::copy_of(vec![1, 2]), List::of_slice(&[1, 2]));
    }

    #[test]
    fn test_listed_to_list_reuses_list() {
        let xs = List::of_slice(&[1, 2, 3]);
        let same = listed_to_list(&xs);
        assert!(List::ptr_eq(&xs, &same));

        let builder = ListBuilder::from_vec(vec![1, 2, 3]);
        let snapshot = listed_to_list(&builder);
        assert_eq!(snapshot, xs);
        assert!(!List::ptr_eq(&snapshot, &xs));
    }

    #[test]
    fn test_get_and_get_or() {
        let xs = List::of_slice(&["a", "b"]);
        assert_eq!(xs.get(1), Ok(&"b"));
        assert_eq!(xs.get(2), Err(Error::Bubble));
        assert_eq!(xs.get(-1), Err(Error::Bubble));
        assert_eq!(xs.get_or(5, "z"), "z");
        assert_eq!(xs.get_or(-3, "z"), "z");
        assert_eq!(xs.get_or(0, "z"), "a");
    }

    #[test]
    fn test_slice_clamps() {
        let xs = List::of_slice(&[1, 2, 3, 4, 5]);
        assert_eq!(xs.slice(1, 3).as_slice(), &[2, 3]);
        assert_eq!(xs.slice(-5, 2).as_slice(), &[1, 2]);
        assert_eq!(xs.slice(3, 1).as_slice(), &[] as &[i32]);
        assert_eq!(xs.slice(4, 100).as_slice(), &[5]);
    }

    #[test]
    fn test_splice_scenario() {
        let mut b = ListBuilder::from_vec(vec![10, 20, 30, 40]);
        let removed = b.splice(Some(1), Some(2), Some(&[99]));
        assert_eq!(b.as_slice(), &[10, 99, 40]);
        assert_eq!(removed.as_slice(), &[20, 30]);
    }

    #[test]
    fn test_splice_defaults_and_clamping() {
        let mut b = ListBuilder::from_vec(vec![1, 2, 3]);
        let removed = b.splice(None, None, None);
        assert_eq!(removed.as_slice(), &[1, 2, 3]);
        assert!(b.is_empty());

        let mut b = ListBuilder::from_vec(vec![1, 2, 3]);
        let removed = b.splice(Some(-4), Some(1), None);
        assert_eq!(removed.as_slice(), &[1]);

        let mut b = ListBuilder::from_vec(vec![1, 2, 3]);
        let removed = b.splice(Some(2), Some(100), Some(&[7, 8]));
        assert_eq!(removed.as_slice(), &[3]);
        assert_eq!(b.as_slice(), &[1, 2, 7, 8]);

        let mut b = ListBuilder::from_vec(vec![1, 2, 3]);
        let removed = b.splice(Some(9), Some(-2), Some(&[4]));
        assert!(removed.is_empty());
        assert_eq!(b.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_builder_mutations() {
        let mut b = ListBuilder::new();
        b.add(1);
        b.add_all([2, 3]);
        b.add_at(0, 0).unwrap();
        b.add_all_at(vec![9, 9], 2).unwrap();
        assert_eq!(b.as_slice(), &[0, 1, 9, 9, 2, 3]);
        assert_eq!(b.add_at(5, 100), Err(Error::Bubble));
        assert_eq!(b.add_at(5, -1), Err(Error::Bubble));

        b.set(2, 4).unwrap();
        assert_eq!(b.set(6, 0), Err(Error::Bubble));
        assert_eq!(b.remove_last(), Ok(3));
        b.reverse();
        assert_eq!(b.as_slice(), &[2, 9, 4, 1, 0]);

        b.clear();
        assert_eq!(b.remove_last(), Err(Error::Bubble));
    }

    #[test]
    fn test_sort_is_stable() {
        let mut b = ListBuilder::from_vec(vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')]);
        let sorted = b.sorted(|x, y| x.0.cmp(&y.0));
        assert_eq!(sorted.as_slice(), &[(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
        // sorted leaves the source alone
        assert_eq!(b.get(0), Ok(&(2, 'a')));

        b.sort(|x, y| y.0.cmp(&x.0));
        assert_eq!(b.as_slice(), &[(2, 'a'), (2, 'c'), (1, 'b'), (1, 'd')]);
    }

    #[test]
    fn test_map_dropping_drops_only_bubbles() {
        let xs = List::of_slice(&[1, 2, 3]);
        let out = xs
            .map_dropping(|x| if *x == 2 { Err(bubble()) } else { Ok(x * 10) })
            .unwrap();
        assert_eq!(out.as_slice(), &[10, 30]);

        let err = xs.map_dropping(|x| {
            if *x == 2 {
                Err(Error::invalid_argument("bad"))
            } else {
                Ok(*x)
            }
        });
        assert_eq!(err, Err(Error::invalid_argument("bad")));
    }

    #[test]
    fn test_reduce() {
        let xs = List::of_slice(&[1, 2, 3, 4]);
        assert_eq!(xs.reduce(|a, b| a + b), Ok(10));
        assert_eq!(xs.reduce_from(100, |a, b| a - b), 90);
        let empty: List<i32> = List::of();
        assert_eq!(empty.reduce(|a, b| a + b), Err(Error::Bubble));
        assert_eq!(empty.reduce_from(5, |a, b| a + b), 5);
        // seed may differ in kind from the elements
        assert_eq!(xs.reduce_from(String::new(), |s, x| s + &x.to_string()), "1234");
    }

    #[test]
    fn test_join() {
        let xs = List::of_slice(&[1.5, 2.0]);
        assert_eq!(xs.join(", ", |x| format!("{}", x)), "1.5, 2");
        let empty: List<bool> = List::of();
        assert_eq!(empty.join(",", |b| b.to_string()), "");
        assert_eq!(List::of_one(true).join(",", |b| b.to_string()), "true");
    }

    #[test]
    fn test_primitive_kinds() {
        let bools = List::of_slice(&[true, false, true]);
        let ints: List<i32> = bools.map(|b| *b as i32);
        let floats: List<f64> = ints.map(|i| *i as f64 / 2.0);
        assert_eq!(floats.as_slice(), &[0.5, 0.0, 0.5]);
        assert_eq!(bools.filter(|b| *b).len(), 2);
    }

    #[test]
    fn test_for_each_and_vec_listed() {
        let v = vec!["x", "y"];
        let mut seen = Vec::new();
        v.for_each(|s| seen.push(*s));
        assert_eq!(seen, v);
        assert_eq!(v.to_list().len(), 2);
        assert_eq!(v[..].to_list_builder().into_vec(), v);
    }

    #[test]
    fn test_list_is_shareable() {
        fn assert_send_sync<X: Send + Sync>() {}
        assert_send_sync::<List<String>>();

        let xs = List::of_slice(&[1, 2, 3]);
        let ys = xs.clone();
        let handle = std::thread::spawn(move || ys.reduce_from(0, |a, b| a + b));
        assert_eq!(handle.join().unwrap(), 6);
        assert_eq!(xs.len(), 3);
    }
}

//! Iteration over occupied slots in bucket order, then chain order.

use crate::chain_map::ChainMap;
use crate::dispose::Disposer;
use crate::table::{NodeKey, Pos, Slot, Table};
use core::iter::FusedIterator;
use slotmap::SecondaryMap;

/// Detached iteration state.
///
/// A cursor does not borrow the map, so it can be kept across calls that
/// need the map mutably. Any mutation between `next` calls leaves the
/// cursor's position unspecified: it stays memory safe and terminates, but
/// it may skip or repeat entries. Call `reset` after mutating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    bucket: Option<usize>,
    pending: Option<Pos>,
}

impl Cursor {
    /// A cursor positioned before the first bucket.
    pub const fn new() -> Self {
        Self {
            bucket: None,
            pending: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance to the next occupied entry of `map`. Returns `None` once
    /// every bucket has been visited, and keeps returning `None` until reset.
    pub fn next<'a, K, V, O, D>(&mut self, map: &'a ChainMap<K, V, O, D>) -> Option<(&'a K, &'a V)>
    where
        D: Disposer<K, V>,
    {
        self.advance(map.table())
    }

    pub(crate) fn advance<'a, K, V>(&mut self, table: &'a Table<K, V>) -> Option<(&'a K, &'a V)> {
        loop {
            let pos = match self.pending {
                Some(pos) => pos,
                None => {
                    let bucket = self.bucket.map_or(0, |b| b.saturating_add(1));
                    if bucket >= table.bucket_count() {
                        self.bucket = Some(table.bucket_count());
                        return None;
                    }
                    self.bucket = Some(bucket);
                    Pos::Head(bucket)
                }
            };
            let Some(slot) = table.get_slot(pos) else {
                self.pending = None;
                continue;
            };
            self.pending = slot.next.map(Pos::Node);
            if let Some((k, v)) = &slot.pair {
                return Some((k, v));
            }
        }
    }
}

/// Borrowing iterator over `(&K, &V)`.
pub struct Iter<'a, K, V> {
    table: &'a Table<K, V>,
    cursor: Cursor,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(table: &'a Table<K, V>) -> Self {
        Self {
            table,
            cursor: Cursor::new(),
            remaining: table.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.cursor.advance(self.table)?;
        self.remaining -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in the same bucket-then-chain order as
/// `Iter`.
///
/// Extension slots are looked up through a side index of the arena's
/// mutable borrows, built once when the iterator is created.
pub struct IterMut<'a, K, V> {
    heads: core::slice::IterMut<'a, Slot<K, V>>,
    nodes: SecondaryMap<NodeKey, &'a mut Slot<K, V>>,
    pending: Option<NodeKey>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(table: &'a mut Table<K, V>) -> Self {
        let remaining = table.len();
        let (heads, arena) = table.split_mut();
        let mut nodes = SecondaryMap::with_capacity(arena.len());
        for (key, slot) in arena.iter_mut() {
            nodes.insert(key, slot);
        }
        Self {
            heads: heads.iter_mut(),
            nodes,
            pending: None,
            remaining,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            let slot: &'a mut Slot<K, V> = match self.pending {
                Some(key) => match self.nodes.remove(key) {
                    Some(slot) => slot,
                    None => {
                        self.pending = None;
                        continue;
                    }
                },
                None => self.heads.next()?,
            };
            self.pending = slot.next;
            if let Some((k, v)) = slot.pair.as_mut() {
                self.remaining -= 1;
                return Some((&*k, v));
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{FnOps, IdentityOps, KeyOps};

    fn table_with(buckets: usize, keys: &[u32]) -> Table<u32, u32> {
        let mut t = Table::with_buckets(buckets);
        for &k in keys {
            let b = t.bucket_of(IdentityOps.hash(&k));
            let p = t.locate(b, &k, &IdentityOps);
            t.apply(p, k, k + 100);
        }
        t
    }

    /// Invariant: the cursor yields buckets in index order and chains in
    /// link order, then stays exhausted.
    #[test]
    fn cursor_walks_bucket_then_chain_order() {
        let t = table_with(4, &[5, 2, 1, 9, 6]);
        let mut c = Cursor::new();
        let mut seen = Vec::new();
        while let Some((k, v)) = c.advance(&t) {
            assert_eq!(*v, *k + 100);
            seen.push(*k);
        }
        assert_eq!(seen, vec![5, 1, 9, 2, 6]);
        assert!(c.advance(&t).is_none());
        assert!(c.advance(&t).is_none());
    }

    /// Invariant: tombstones and empty buckets are skipped transparently.
    #[test]
    fn cursor_skips_tombstones_and_empty_buckets() {
        let mut t = table_with(8, &[3, 11, 19, 27]);
        let pos = t.find(3, &11, &IdentityOps).unwrap();
        t.take(pos);
        t.take(Pos::Head(3));
        let mut c = Cursor::new();
        let mut seen = Vec::new();
        while let Some((k, _)) = c.advance(&t) {
            seen.push(*k);
        }
        assert_eq!(seen, vec![19, 27]);
    }

    #[test]
    fn reset_restarts_iteration() {
        let t = table_with(3, &[0, 1, 2]);
        let mut c = Cursor::new();
        assert!(c.advance(&t).is_some());
        c.reset();
        assert_eq!(c, Cursor::new());
        let mut n = 0;
        while c.advance(&t).is_some() {
            n += 1;
        }
        assert_eq!(n, 3);
    }

    /// A cursor carried over from a larger table must not index out of bounds.
    #[test]
    fn stale_cursor_terminates() {
        let big = table_with(16, &[15]);
        let small = table_with(2, &[0, 1]);
        let mut c = Cursor::new();
        assert_eq!(c.advance(&big).map(|(k, _)| *k), Some(15));
        assert!(c.advance(&small).is_none());
    }

    #[test]
    fn iter_mut_visits_each_pair_once() {
        let mut t = table_with(2, &[0, 1, 2, 3, 4]);
        let mut it = IterMut::new(&mut t);
        assert_eq!(it.len(), 5);
        for (_, v) in it.by_ref() {
            *v += 1;
        }
        let mut vals: Vec<u32> = Iter::new(&t).map(|(_, v)| *v).collect();
        vals.sort_unstable();
        assert_eq!(vals, vec![101, 102, 103, 104, 105]);
    }

    /// Invariant: mutable iteration follows the same chain order as `Iter`.
    #[test]
    fn iter_mut_matches_iter_order() {
        let mut t = table_with(4, &[5, 2, 1, 9, 6, 13]);
        let pos = t.find(1, &9, &IdentityOps).unwrap();
        t.take(pos);
        let shared: Vec<u32> = Iter::new(&t).map(|(k, _)| *k).collect();
        assert_eq!(shared, vec![5, 1, 13, 2, 6]);
        let exclusive: Vec<u32> = IterMut::new(&mut t).map(|(k, _)| *k).collect();
        assert_eq!(exclusive, shared);
    }

    #[test]
    fn iter_reports_exact_size() {
        let ops = FnOps::new(|_: &u32| 0u64, |a: &u32, b: &u32| a == b);
        let mut t: Table<u32, u32> = Table::with_buckets(3);
        for k in 0..4 {
            let p = t.locate(t.bucket_of(ops.hash(&k)), &k, &ops);
            t.apply(p, k, k);
        }
        let mut it = Iter::new(&t);
        assert_eq!(it.len(), 4);
        it.next();
        assert_eq!(it.len(), 3);
        assert_eq!(Keys::new(Iter::new(&t)).count(), 4);
        assert_eq!(Values::new(Iter::new(&t)).sum::<u32>(), 6);
    }
}

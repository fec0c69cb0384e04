//! Bucket storage: one inline head slot per bucket, plus an arena of
//! extension slots that continue each bucket's chain.
//!
//! Slots are never unlinked while the table lives. Removing a pair vacates
//! its slot, which stays in the chain as a tombstone for a later insert into
//! the same bucket to reuse.

use crate::error::MapError;
use crate::ops::KeyOps;
use core::borrow::Borrow;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Arena index of an extension slot.
    pub(crate) struct NodeKey;
}

#[derive(Debug)]
pub(crate) struct Slot<K, V> {
    pub(crate) pair: Option<(K, V)>,
    pub(crate) next: Option<NodeKey>,
}

impl<K, V> Slot<K, V> {
    const fn vacant() -> Self {
        Self {
            pair: None,
            next: None,
        }
    }

    #[inline]
    pub(crate) fn is_occupied(&self) -> bool {
        self.pair.is_some()
    }
}

/// Where a slot lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Pos {
    Head(usize),
    Node(NodeKey),
}

/// Outcome of walking a chain for an incoming key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    /// An occupied slot already holds an equal key.
    Replace(Pos),
    /// First tombstone on the chain.
    Reuse(Pos),
    /// No candidate; a new extension slot goes after this tail.
    Append(Pos),
}

pub(crate) struct Table<K, V> {
    heads: Vec<Slot<K, V>>,
    nodes: SlotMap<NodeKey, Slot<K, V>>,
    len: usize,
}

impl<K, V> Table<K, V> {
    pub(crate) fn with_buckets(buckets: usize) -> Self {
        let mut heads = Vec::with_capacity(buckets);
        heads.resize_with(buckets, Slot::vacant);
        Self {
            heads,
            nodes: SlotMap::with_key(),
            len: 0,
        }
    }

    /// Like `with_buckets`, but reports allocation failure instead of aborting.
    pub(crate) fn try_with_buckets(buckets: usize) -> Result<Self, MapError> {
        let mut heads = Vec::new();
        heads
            .try_reserve_exact(buckets)
            .map_err(|_| MapError::AllocationFailed { slots: buckets })?;
        heads.resize_with(buckets, Slot::vacant);
        Ok(Self {
            heads,
            nodes: SlotMap::with_key(),
            len: 0,
        })
    }

    /// Make room for `additional` extension slots so that appends cannot
    /// allocate.
    pub(crate) fn reserve_nodes(&mut self, additional: usize) -> Result<(), MapError> {
        self.nodes
            .try_reserve(additional)
            .map_err(|_| MapError::AllocationFailed { slots: additional })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub(crate) fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.heads.len() as u64) as usize
    }

    /// Vacant extension slots currently parked in chains.
    pub(crate) fn tombstones(&self) -> usize {
        self.nodes.values().filter(|s| !s.is_occupied()).count()
    }

    #[cfg(test)]
    pub(crate) fn extension_slots(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub(crate) fn arena_capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Number of extension slots needed to move every pair into a fresh
    /// table of `buckets` buckets: one per pair whose target head is
    /// already taken by an earlier pair.
    pub(crate) fn overflow_into<O>(&self, buckets: usize, ops: &O) -> Result<usize, MapError>
    where
        O: KeyOps<K>,
    {
        let words = buckets.div_ceil(64);
        let mut taken: Vec<u64> = Vec::new();
        taken
            .try_reserve_exact(words)
            .map_err(|_| MapError::AllocationFailed { slots: buckets })?;
        taken.resize(words, 0);

        let mut overflow = 0;
        let occupied = self.heads.iter().chain(self.nodes.values());
        for (key, _) in occupied.filter_map(|s| s.pair.as_ref()) {
            let bucket = (ops.hash(key) % buckets as u64) as usize;
            let (word, bit) = (bucket / 64, 1u64 << (bucket % 64));
            if taken[word] & bit == 0 {
                taken[word] |= bit;
            } else {
                overflow += 1;
            }
        }
        Ok(overflow)
    }

    #[inline]
    pub(crate) fn slot(&self, pos: Pos) -> &Slot<K, V> {
        match pos {
            Pos::Head(i) => &self.heads[i],
            Pos::Node(n) => &self.nodes[n],
        }
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, pos: Pos) -> &mut Slot<K, V> {
        match pos {
            Pos::Head(i) => &mut self.heads[i],
            Pos::Node(n) => &mut self.nodes[n],
        }
    }

    /// Bounds-checked lookup for callers holding positions that may have
    /// outlived a resize.
    #[inline]
    pub(crate) fn get_slot(&self, pos: Pos) -> Option<&Slot<K, V>> {
        match pos {
            Pos::Head(i) => self.heads.get(i),
            Pos::Node(n) => self.nodes.get(n),
        }
    }

    /// Walk `bucket`'s chain for `key`.
    pub(crate) fn locate<O>(&self, bucket: usize, key: &K, ops: &O) -> Placement
    where
        O: KeyOps<K>,
    {
        let mut pos = Pos::Head(bucket);
        let mut tomb = None;
        loop {
            let slot = self.slot(pos);
            match &slot.pair {
                Some((k, _)) if ops.equals(k, key) => return Placement::Replace(pos),
                Some(_) => {}
                None => {
                    tomb.get_or_insert(pos);
                }
            }
            match slot.next {
                Some(n) => pos = Pos::Node(n),
                None => break,
            }
        }
        match tomb {
            Some(t) => Placement::Reuse(t),
            None => Placement::Append(pos),
        }
    }

    /// Store a pair where `locate` said it goes. Returns the displaced pair
    /// on replacement.
    ///
    /// `Append` allocates an arena slot; callers reserve one first when
    /// failure must be reported rather than abort.
    pub(crate) fn apply(&mut self, placement: Placement, key: K, value: V) -> Option<(K, V)> {
        match placement {
            Placement::Replace(pos) => self.slot_mut(pos).pair.replace((key, value)),
            Placement::Reuse(pos) => {
                let slot = self.slot_mut(pos);
                debug_assert!(!slot.is_occupied());
                slot.pair = Some((key, value));
                self.len += 1;
                None
            }
            Placement::Append(tail) => {
                let node = self.nodes.insert(Slot {
                    pair: Some((key, value)),
                    next: None,
                });
                self.slot_mut(tail).next = Some(node);
                self.len += 1;
                None
            }
        }
    }

    /// First occupied slot on `bucket`'s chain whose key equals `q`.
    pub(crate) fn find<Q, O>(&self, bucket: usize, q: &Q, ops: &O) -> Option<Pos>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        let mut pos = Pos::Head(bucket);
        loop {
            let slot = self.slot(pos);
            if let Some((k, _)) = &slot.pair {
                if ops.equals(k.borrow(), q) {
                    return Some(pos);
                }
            }
            pos = Pos::Node(slot.next?);
        }
    }

    /// Vacate the slot at `pos`, leaving a tombstone.
    pub(crate) fn take(&mut self, pos: Pos) -> Option<(K, V)> {
        let pair = self.slot_mut(pos).pair.take();
        if pair.is_some() {
            self.len -= 1;
        }
        pair
    }

    /// Move every pair out, bucket by bucket in chain order. Slots stay
    /// allocated as tombstones.
    pub(crate) fn drain_with<F>(&mut self, mut f: F)
    where
        F: FnMut(K, V),
    {
        for bucket in 0..self.heads.len() {
            let mut pos = Pos::Head(bucket);
            loop {
                let slot = self.slot_mut(pos);
                let next = slot.next;
                if let Some((k, v)) = slot.pair.take() {
                    self.len -= 1;
                    f(k, v);
                }
                match next {
                    Some(n) => pos = Pos::Node(n),
                    None => break,
                }
            }
        }
        debug_assert_eq!(self.len, 0);
    }

    /// Heads and arena borrowed apart, for iterators that follow chains
    /// mutably.
    pub(crate) fn split_mut(&mut self) -> (&mut [Slot<K, V>], &mut SlotMap<NodeKey, Slot<K, V>>) {
        (&mut self.heads, &mut self.nodes)
    }
}

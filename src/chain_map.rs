//! ChainMap: the public map wrapping a bucket `Table` with growth,
//! pluggable key capabilities and ownership hooks.

use crate::config::{watermark, MapConfig};
use crate::dispose::{Disposer, Dropper, FnDisposer};
use crate::error::MapError;
use crate::iter::{Iter, IterMut, Keys, Values};
use crate::ops::{FnOps, IdentityKey, IdentityOps, KeyOps};
use crate::reentrancy::DebugReentrancy;
use crate::table::{Placement, Pos, Table};
use core::borrow::Borrow;
use core::fmt;
use log::{debug, trace, warn};

/// How a successful `put` changed the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    /// The key was new; the map grew by one.
    Inserted,
    /// An equal key was present; its old key and value went to the disposer.
    Replaced,
}

/// A put that could not be carried out. The map is unchanged and the
/// caller gets its key and value back.
#[derive(Debug)]
pub struct Rejected<K, V> {
    pub key: K,
    pub value: V,
    pub error: MapError,
}

impl<K, V> Rejected<K, V> {
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<Rejected<K, V>> for MapError {
    fn from(r: Rejected<K, V>) -> Self {
        r.error
    }
}

/// Chained hash map with tombstone reuse.
///
/// Each bucket owns an inline head slot; collisions continue the chain in
/// an arena of extension slots. Removal vacates a slot in place, so other
/// entries are never relocated except by a resize. The bucket count grows
/// fourfold once the element count reaches 70% of it, checked before each
/// insert.
pub struct ChainMap<K, V, O = IdentityOps, D = Dropper>
where
    D: Disposer<K, V>,
{
    table: Table<K, V>,
    watermark: usize,
    config: MapConfig,
    ops: O,
    disposer: D,
    reentrancy: DebugReentrancy,
}

impl<K, V> ChainMap<K, V>
where
    K: IdentityKey,
{
    /// Empty map with identity hashing and no ownership hooks.
    pub fn new() -> Self {
        Self::with_ops(IdentityOps)
    }
}

impl<K, V> Default for ChainMap<K, V>
where
    K: IdentityKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, H, E> ChainMap<K, V, FnOps<H, E>>
where
    H: Fn(&K) -> u64,
    E: Fn(&K, &K) -> bool,
{
    /// Empty map hashing and comparing keys through the given closures.
    pub fn with_fns(hash: H, equals: E) -> Self {
        Self::with_ops(FnOps::new(hash, equals))
    }
}

impl<K, V, O> ChainMap<K, V, O>
where
    O: KeyOps<K>,
{
    pub fn with_ops(ops: O) -> Self {
        Self::new_full(ops, Dropper)
    }
}

impl<K, V, O, FK, FV> ChainMap<K, V, O, FnDisposer<FK, FV>>
where
    O: KeyOps<K>,
    FK: FnMut(K),
    FV: FnMut(V),
{
    /// Empty map that passes released keys and values to the two closures.
    pub fn with_free_fns(ops: O, key_free: FK, value_free: FV) -> Self {
        Self::new_full(ops, FnDisposer::new(key_free, value_free))
    }
}

impl<K, V, O, D> ChainMap<K, V, O, D>
where
    O: KeyOps<K>,
    D: Disposer<K, V>,
{
    pub fn new_full(ops: O, disposer: D) -> Self {
        let config = MapConfig::default();
        let table = Table::with_buckets(config.initial_buckets());
        Self::from_parts(table, config, ops, disposer)
    }

    /// Empty map sized by `config`. Fails only if the initial bucket array
    /// cannot be allocated.
    pub fn with_config(config: MapConfig, ops: O, disposer: D) -> Result<Self, MapError> {
        let table = Table::try_with_buckets(config.initial_buckets())?;
        Ok(Self::from_parts(table, config, ops, disposer))
    }

    fn from_parts(table: Table<K, V>, config: MapConfig, ops: O, disposer: D) -> Self {
        Self {
            watermark: watermark(table.bucket_count()),
            table,
            config,
            ops,
            disposer,
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Store `value` under `key`, replacing and disposing any pair with an
    /// equal key. On failure the map is unchanged and the rejected key and
    /// value are dropped.
    pub fn put(&mut self, key: K, value: V) -> Result<Insert, MapError> {
        Ok(self.try_put(key, value)?)
    }

    /// Like `put`, but hands the key and value back on failure.
    pub fn try_put(&mut self, key: K, value: V) -> Result<Insert, Rejected<K, V>> {
        if self.table.len() >= self.watermark {
            if let Err(error) = self.resize() {
                return Err(Rejected { key, value, error });
            }
        }

        let placement = {
            let _g = self.reentrancy.enter();
            let bucket = self.table.bucket_of(self.ops.hash(&key));
            self.table.locate(bucket, &key, &self.ops)
        };

        match placement {
            Placement::Append(_) => {
                if let Err(error) = self.table.reserve_nodes(1) {
                    warn!("put rejected: {}", error);
                    return Err(Rejected { key, value, error });
                }
                trace!("appending extension slot");
            }
            Placement::Reuse(_) => trace!("reusing tombstone"),
            Placement::Replace(_) => {}
        }

        match self.table.apply(placement, key, value) {
            Some((old_key, old_value)) => {
                self.disposer.dispose_value(old_value);
                self.disposer.dispose_key(old_key);
                Ok(Insert::Replaced)
            }
            None => Ok(Insert::Inserted),
        }
    }

    /// Grow the bucket array fourfold and move every pair into it.
    ///
    /// All reservations happen before the first pair moves, so a failure
    /// leaves the current table untouched and releases nothing. The arena is
    /// reserved for the pairs that will collide in the new geometry only,
    /// which costs one extra hash per pair.
    fn resize(&mut self) -> Result<(), MapError> {
        let old_buckets = self.table.bucket_count();
        let grown = self
            .config
            .grown(old_buckets)
            .ok_or(MapError::CapacityOverflow {
                buckets: old_buckets,
            })
            .and_then(|buckets| {
                let mut next = Table::try_with_buckets(buckets)?;
                let overflow = {
                    let _g = self.reentrancy.enter();
                    self.table.overflow_into(buckets, &self.ops)?
                };
                next.reserve_nodes(overflow)?;
                Ok(next)
            });
        let mut next = match grown {
            Ok(next) => next,
            Err(error) => {
                warn!(
                    "resize from {} buckets failed with {} entries: {}",
                    old_buckets,
                    self.table.len(),
                    error
                );
                return Err(error);
            }
        };

        let moved = self.table.len();
        {
            let _g = self.reentrancy.enter();
            let ops = &self.ops;
            self.table.drain_with(|key, value| {
                let bucket = next.bucket_of(ops.hash(&key));
                let placement = next.locate(bucket, &key, ops);
                let displaced = next.apply(placement, key, value);
                debug_assert!(displaced.is_none(), "duplicate key found during resize");
            });
        }
        debug_assert_eq!(next.len(), moved);

        self.table = next;
        self.watermark = watermark(self.table.bucket_count());
        debug!(
            "resized {} -> {} buckets ({} entries, watermark {})",
            old_buckets,
            self.table.bucket_count(),
            moved,
            self.watermark
        );
        Ok(())
    }
}

impl<K, V, O, D> ChainMap<K, V, O, D>
where
    D: Disposer<K, V>,
{
    fn find<Q>(&self, key: &Q) -> Option<Pos>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        let _g = self.reentrancy.enter();
        let bucket = self.table.bucket_of(self.ops.hash(key));
        self.table.find(bucket, key, &self.ops)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        let pos = self.find(key)?;
        self.table.slot(pos).pair.as_ref().map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        let pos = self.find(key)?;
        self.table.slot(pos).pair.as_ref().map(|(k, v)| (k, v))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        let pos = self.find(key)?;
        self.table.slot_mut(pos).pair.as_mut().map(|(_, v)| v)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        self.find(key).is_some()
    }

    /// Remove the pair for `key` and pass it to the disposer. The slot stays
    /// in its chain as a tombstone. Returns false if the key was absent.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        match self.steal(key) {
            Some((k, v)) => {
                self.disposer.dispose_pair(k, v);
                true
            }
            None => false,
        }
    }

    /// Remove the pair for `key` and return it without disposing it.
    pub fn steal<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOps<Q>,
    {
        let pos = self.find(key)?;
        self.table.take(pos)
    }

    /// Number of stored pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Element count at which the next `put` grows the map first.
    #[inline]
    pub fn watermark(&self) -> usize {
        self.watermark
    }

    /// Vacant extension slots waiting for reuse.
    pub fn tombstones(&self) -> usize {
        self.table.tombstones()
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.table)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.table)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    /// Release the map, disposing every remaining pair. Same as dropping it.
    pub fn destroy(self) {
        drop(self)
    }

    pub(crate) fn table(&self) -> &Table<K, V> {
        &self.table
    }
}

impl<K, V, O, D> Drop for ChainMap<K, V, O, D>
where
    D: Disposer<K, V>,
{
    fn drop(&mut self) {
        let disposer = &mut self.disposer;
        self.table.drain_with(|k, v| disposer.dispose_pair(k, v));
    }
}

impl<'a, K, V, O, D> IntoIterator for &'a ChainMap<K, V, O, D>
where
    D: Disposer<K, V>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, O, D> IntoIterator for &'a mut ChainMap<K, V, O, D>
where
    D: Disposer<K, V>,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, O, D> fmt::Debug for ChainMap<K, V, O, D>
where
    K: fmt::Debug,
    V: fmt::Debug,
    D: Disposer<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

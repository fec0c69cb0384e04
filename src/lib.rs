//! chainmap: a single-threaded chained hash map with pluggable key
//! capabilities, ownership hooks and tombstone reuse.
//!
//! Internal Design:
//!
//! Summary
//! - `Table<K, V>`: the bucket array. Every bucket owns an inline head
//!   slot; collisions continue the chain through extension slots kept in a
//!   `slotmap` arena and linked by arena index.
//! - `ChainMap<K, V, O, D>`: public API over a `Table`. `O: KeyOps<K>`
//!   supplies hash and equality, `D: Disposer<K, V>` receives keys and
//!   values the map releases.
//! - `IniFile`: a consumer that parses INI text into a map of maps.
//!
//! Insertion
//! - Walk the target chain once, noting the first vacant slot. An equal
//!   key is replaced in place (size unchanged, old pair disposed);
//!   otherwise the first vacant slot is reused; otherwise a new extension
//!   slot goes at the tail.
//! - Removal vacates a slot without unlinking it. Surviving entries never
//!   move except during a resize.
//!
//! Growth
//! - The watermark is `floor(0.7 * bucket_count)`. A `put` that finds the
//!   element count at or above it grows the bucket count fourfold first.
//! - Resize reserves the new bucket array, counts the pairs that will
//!   collide in it and reserves exactly that many arena slots before moving
//!   anything. It then moves pairs with the same
//!   placement walk as `put`. A failed reservation returns the error with
//!   the old table untouched; no key or value is disposed either way.
//!
//! Ownership
//! - `remove`, replacement and drop pass pairs to the disposer. `steal`
//!   returns the pair to the caller instead. Each pair reaches the
//!   disposer at most once.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (no internal locking or atomics).
//! - Reentrancy: hash and equality callbacks run under a debug-only guard;
//!   calling back into the same map from them panics in debug builds.
//!   Disposers run after the structure is consistent again.
//! - Iteration order is bucket index, then chain order. Mutating the map
//!   while a `Cursor` is in flight leaves its position unspecified.

mod chain_map;
#[cfg(test)]
mod chain_map_proptest;
mod config;
mod dispose;
mod error;
pub mod ini;
mod iter;
mod ops;
mod reentrancy;
mod table;

// Public surface
pub use chain_map::{ChainMap, Insert, Rejected};
pub use config::{MapConfig, DEFAULT_BUCKETS, GROWTH_FACTOR};
pub use dispose::{Disposer, Dropper, FnDisposer};
pub use error::{IniError, MapError};
pub use ini::IniFile;
pub use iter::{Cursor, Iter, IterMut, Keys, Values};
pub use ops::{djb_hash, FnOps, HasherOps, IdentityKey, IdentityOps, KeyOps, StrOps};

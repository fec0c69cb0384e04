//! Key capabilities: how a `ChainMap` hashes and compares its keys.
//!
//! A `KeyOps` value is injected at construction and owned by the map. It
//! may be implemented for a borrowed form `Q` of the stored key `K` as well;
//! in that case `hash(k) == hash(k.borrow())` and `equals` must agree across
//! both forms, or lookups through `Q` will miss.

use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Hash and equality for keys of type `K`.
pub trait KeyOps<K: ?Sized> {
    fn hash(&self, key: &K) -> u64;
    fn equals(&self, a: &K, b: &K) -> bool;
}

/// Keys whose identity is a single machine word: integers, `char`, `bool`
/// and raw pointers (by address).
pub trait IdentityKey {
    fn identity(&self) -> u64;
}

macro_rules! identity_unsigned {
    ($($t:ty)*) => {$(
        impl IdentityKey for $t {
            #[inline]
            fn identity(&self) -> u64 {
                *self as u64
            }
        }
    )*};
}

macro_rules! identity_signed {
    ($($t:ty)*) => {$(
        impl IdentityKey for $t {
            #[inline]
            fn identity(&self) -> u64 {
                *self as i64 as u64
            }
        }
    )*};
}

identity_unsigned!(u8 u16 u32 u64 usize);
identity_signed!(i8 i16 i32 i64 isize);

impl IdentityKey for bool {
    #[inline]
    fn identity(&self) -> u64 {
        *self as u64
    }
}

impl IdentityKey for char {
    #[inline]
    fn identity(&self) -> u64 {
        *self as u64
    }
}

impl<T: ?Sized> IdentityKey for *const T {
    #[inline]
    fn identity(&self) -> u64 {
        self.cast::<()>() as usize as u64
    }
}

impl<T: ?Sized> IdentityKey for *mut T {
    #[inline]
    fn identity(&self) -> u64 {
        self.cast::<()>() as usize as u64
    }
}

impl<T: ?Sized> IdentityKey for core::ptr::NonNull<T> {
    #[inline]
    fn identity(&self) -> u64 {
        self.as_ptr().identity()
    }
}

/// Identity hash and identity equality. The default for `ChainMap`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityOps;

impl<K: IdentityKey + ?Sized> KeyOps<K> for IdentityOps {
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        key.identity()
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        a.identity() == b.identity()
    }
}

/// DJB hash over the bytes of a string, with bytes read as signed chars.
pub fn djb_hash(s: &str) -> u64 {
    let mut h: u32 = 5381;
    for &b in s.as_bytes() {
        h = (h << 5).wrapping_add(h).wrapping_add(b as i8 as i32 as u32);
    }
    h as u64
}

/// DJB hash and string equality for text keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrOps;

impl<K: AsRef<str> + ?Sized> KeyOps<K> for StrOps {
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        djb_hash(key.as_ref())
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        a.as_ref() == b.as_ref()
    }
}

/// `Hash + Eq` keys hashed through a `BuildHasher`.
#[derive(Debug, Default, Clone)]
pub struct HasherOps<S = DefaultHashBuilder> {
    build: S,
}

impl<S> HasherOps<S> {
    pub fn new(build: S) -> Self {
        Self { build }
    }
}

impl<K, S> KeyOps<K> for HasherOps<S>
where
    K: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.build.hash_one(key)
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// A pair of closures standing in for hash and equality callbacks.
#[derive(Clone)]
pub struct FnOps<H, E> {
    hash: H,
    equals: E,
}

impl<H, E> FnOps<H, E> {
    pub fn new(hash: H, equals: E) -> Self {
        Self { hash, equals }
    }
}

impl<H, E> core::fmt::Debug for FnOps<H, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("FnOps")
    }
}

impl<K, H, E> KeyOps<K> for FnOps<H, E>
where
    K: ?Sized,
    H: Fn(&K) -> u64,
    E: Fn(&K, &K) -> bool,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        (self.hash)(key)
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        (self.equals)(a, b)
    }
}

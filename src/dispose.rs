//! Ownership hooks run when the map lets go of a key or value it owns.
//!
//! The map hands a pair to its `Disposer` on `remove`, when `put` displaces
//! an existing pair, and for every live pair when the map is dropped.
//! `steal`, resizing and rejected puts never reach the disposer.

/// Receives keys and values the map is releasing.
pub trait Disposer<K, V> {
    fn dispose_key(&mut self, key: K);
    fn dispose_value(&mut self, value: V);

    #[inline]
    fn dispose_pair(&mut self, key: K, value: V) {
        self.dispose_key(key);
        self.dispose_value(value);
    }
}

/// Lets released keys and values fall out of scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dropper;

impl<K, V> Disposer<K, V> for Dropper {
    #[inline]
    fn dispose_key(&mut self, _key: K) {}
    #[inline]
    fn dispose_value(&mut self, _value: V) {}
}

/// Closure-backed disposer, one callback for keys and one for values.
pub struct FnDisposer<FK, FV> {
    key: FK,
    value: FV,
}

impl<FK, FV> FnDisposer<FK, FV> {
    pub fn new(key: FK, value: FV) -> Self {
        Self { key, value }
    }
}

impl<FK> FnDisposer<FK, ()> {
    /// Callback for keys only; values are dropped.
    pub fn keys<V>(key: FK) -> FnDisposer<FK, fn(V)> {
        FnDisposer {
            key,
            value: drop::<V>,
        }
    }
}

impl<FV> FnDisposer<(), FV> {
    /// Callback for values only; keys are dropped.
    pub fn values<K>(value: FV) -> FnDisposer<fn(K), FV> {
        FnDisposer {
            key: drop::<K>,
            value,
        }
    }
}

impl<FK, FV> core::fmt::Debug for FnDisposer<FK, FV> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("FnDisposer")
    }
}

impl<K, V, FK, FV> Disposer<K, V> for FnDisposer<FK, FV>
where
    FK: FnMut(K),
    FV: FnMut(V),
{
    #[inline]
    fn dispose_key(&mut self, key: K) {
        (self.key)(key)
    }

    #[inline]
    fn dispose_value(&mut self, value: V) {
        (self.value)(value)
    }
}

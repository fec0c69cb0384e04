//! Debug-only guard against callbacks re-entering a map mid-probe.
//!
//! Hash and equality callbacks run while a chain walk is in progress. A
//! callback that reaches back into the same map (through a raw pointer or
//! shared cell) panics in debug builds; release builds compile this away.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // Single-threaded: keeps the owning map !Send + !Sync.
    _local: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _local: PhantomData,
        }
    }

    /// Mark the start of a probe. Panics in debug builds if one is already
    /// running on this map.
    #[inline]
    pub fn enter(&self) -> ProbeGuard<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "reentrancy detected: callback re-entered the map during a probe"
            );
            ProbeGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ProbeGuard { _z: PhantomData }
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// Ends the probe when dropped.
pub struct ProbeGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(false);
    }
}

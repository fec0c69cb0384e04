//! Sizing knobs for `ChainMap`.

/// Bucket count of a freshly created map.
pub const DEFAULT_BUCKETS: usize = 61;

/// Multiple the bucket count grows by on every resize.
pub const GROWTH_FACTOR: usize = 4;

/// Growth threshold for `buckets` buckets: `floor(buckets * 0.7)`.
#[inline]
pub fn watermark(buckets: usize) -> usize {
    (buckets / 10) * 7 + (buckets % 10) * 7 / 10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConfig {
    initial_buckets: usize,
    max_buckets: Option<usize>,
}

impl MapConfig {
    pub const fn new() -> Self {
        Self {
            initial_buckets: DEFAULT_BUCKETS,
            max_buckets: None,
        }
    }

    /// Starting bucket count; zero is raised to one.
    pub fn with_initial_buckets(mut self, buckets: usize) -> Self {
        self.initial_buckets = buckets.max(1);
        self
    }

    /// Upper bound on the bucket count. A resize that would pass it fails
    /// with `MapError::CapacityOverflow`.
    pub fn with_max_buckets(mut self, buckets: usize) -> Self {
        self.max_buckets = Some(buckets);
        self
    }

    pub fn initial_buckets(&self) -> usize {
        self.initial_buckets
    }

    pub fn max_buckets(&self) -> Option<usize> {
        self.max_buckets
    }

    /// Bucket count after growing from `current`, if allowed.
    pub(crate) fn grown(&self, current: usize) -> Option<usize> {
        let next = current.checked_mul(GROWTH_FACTOR)?;
        match self.max_buckets {
            Some(max) if next > max => None,
            _ => Some(next),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::new()
    }
}

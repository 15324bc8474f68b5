//! Construction parameters and the resize policy shared by both tables.

use crate::hashing::next_prime_at_or_above;
use thiserror::Error;

/// Capacity used when no usable hint is given, and after `clear`.
pub const DEFAULT_CAPACITY: usize = 17;

/// Default load factor threshold, as a percentage.
pub const DEFAULT_LOAD_FACTOR_PERCENT: usize = 75;

/// Smallest accepted load factor threshold, as a percentage.
const MIN_LOAD_FACTOR_PERCENT: usize = 1;

/// Largest accepted load factor threshold, as a percentage.
///
/// Open addressing needs at least one free slot for every lookup to terminate early.
const MAX_LOAD_FACTOR_PERCENT: usize = 95;

/// Errors raised while building a table configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested load factor threshold is outside the accepted range
    #[error("load factor threshold {percent}% is outside {min}..={max}%")]
    LoadFactorOutOfRange {
        /// The rejected threshold
        percent: usize,
        /// Smallest accepted threshold
        min: usize,
        /// Largest accepted threshold
        max: usize,
    },
}

/// Load factor threshold that decides when a table grows.
///
/// Stored as a whole percentage. A table resizes as soon as `count / capacity`
/// strictly exceeds the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadFactor {
    /// Threshold as a percentage (1-95)
    percent: usize,
}

impl Default for LoadFactor {
    fn default() -> Self {
        Self { percent: DEFAULT_LOAD_FACTOR_PERCENT }
    }
}

impl LoadFactor {
    /// Creates a threshold of `percent`, rejecting values outside 1..=95.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LoadFactorOutOfRange`] if `percent` is out of range.
    pub fn new(percent: usize) -> Result<Self, ConfigError> {
        if (MIN_LOAD_FACTOR_PERCENT..=MAX_LOAD_FACTOR_PERCENT).contains(&percent) {
            Ok(Self { percent })
        } else {
            Err(ConfigError::LoadFactorOutOfRange {
                percent,
                min: MIN_LOAD_FACTOR_PERCENT,
                max: MAX_LOAD_FACTOR_PERCENT,
            })
        }
    }

    /// Creates a threshold of `percent`, clamped into 1..=95.
    #[must_use]
    pub fn clamped(percent: usize) -> Self {
        Self { percent: percent.clamp(MIN_LOAD_FACTOR_PERCENT, MAX_LOAD_FACTOR_PERCENT) }
    }

    /// The threshold as a percentage
    #[must_use]
    pub fn percent(self) -> usize {
        self.percent
    }

    /// Returns true when `count` entries in `capacity` slots exceed the threshold.
    #[must_use]
    pub fn should_resize(self, count: usize, capacity: usize) -> bool {
        count.saturating_mul(100) > capacity.saturating_mul(self.percent)
    }

    /// Capacity to grow into so that `count` entries fit under the threshold.
    ///
    /// Starts at the next prime at or above twice `capacity` and keeps doubling
    /// while that is still too small.
    #[must_use]
    pub fn grown_capacity(self, count: usize, capacity: usize) -> usize {
        let mut grown = next_prime_at_or_above(capacity.max(1).saturating_mul(2));
        while self.should_resize(count, grown) && grown < usize::MAX {
            grown = next_prime_at_or_above(grown.saturating_mul(2));
        }
        grown
    }
}

/// Parameters used to construct a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConfig {
    /// Requested initial capacity. Zero selects [`DEFAULT_CAPACITY`].
    pub initial_capacity: usize,
    /// Resize threshold
    pub load_factor: LoadFactor,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { initial_capacity: DEFAULT_CAPACITY, load_factor: LoadFactor::default() }
    }
}

impl MapConfig {
    /// Sets the requested initial capacity
    #[must_use]
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Sets the resize threshold
    #[must_use]
    pub fn with_load_factor(mut self, load_factor: LoadFactor) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Actual capacity for this configuration: the next prime at or above the
    /// hint, or [`DEFAULT_CAPACITY`] for a zero hint.
    #[must_use]
    pub fn resolved_capacity(&self) -> usize {
        if self.initial_capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            next_prime_at_or_above(self.initial_capacity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::is_prime;

    #[test]
    fn test_load_factor_validation() {
        assert_eq!(LoadFactor::new(75).map(LoadFactor::percent), Ok(75));
        assert_eq!(
            LoadFactor::new(0),
            Err(ConfigError::LoadFactorOutOfRange { percent: 0, min: 1, max: 95 })
        );
        assert!(LoadFactor::new(96).is_err());
        assert_eq!(LoadFactor::clamped(200).percent(), 95);
        assert_eq!(LoadFactor::clamped(0).percent(), 1);
    }

    #[test]
    fn test_error_message() {
        let err = LoadFactor::new(99).unwrap_err();
        assert_eq!(err.to_string(), "load factor threshold 99% is outside 1..=95%");
    }

    #[test]
    fn test_should_resize_is_strict() {
        let load_factor = LoadFactor::default();
        assert!(!load_factor.should_resize(8, 11));
        assert!(load_factor.should_resize(9, 11));
        // Exactly at the threshold does not trigger.
        assert!(!load_factor.should_resize(3, 4));
    }

    #[test]
    fn test_grown_capacity() {
        let load_factor = LoadFactor::default();
        assert_eq!(load_factor.grown_capacity(9, 11), 23);
        assert_eq!(load_factor.grown_capacity(13, 17), 37);

        let tiny = LoadFactor::clamped(1);
        let grown = tiny.grown_capacity(3, 17);
        assert!(is_prime(grown));
        assert!(!tiny.should_resize(3, grown));
    }

    #[test]
    fn test_resolved_capacity() {
        assert_eq!(MapConfig::default().resolved_capacity(), 17);
        assert_eq!(MapConfig::default().with_initial_capacity(0).resolved_capacity(), 17);
        assert_eq!(MapConfig::default().with_initial_capacity(10).resolved_capacity(), 11);
        assert_eq!(MapConfig::default().with_initial_capacity(100).resolved_capacity(), 101);
    }
}

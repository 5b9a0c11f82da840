//! Configuration errors reported when a controller component is added.

use thiserror::Error;

/// A tuning value that cannot produce sensible motion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    /// A distance, speed, or force was zero, negative, or not finite.
    #[error("`{name}` must be a finite value greater than zero, got {value}")]
    NotPositive {
        /// The offending field.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// A lower bound is above its upper bound.
    #[error("`{name}` bounds are inverted: min {min} > max {max}")]
    InvertedBounds {
        /// The offending field.
        name: &'static str,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },
    /// A value must lie in a half-open unit range.
    #[error("`{name}` must be in [0, 1), got {value}")]
    OutOfUnitRange {
        /// The offending field.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// A multiplier meant to widen a range does not.
    #[error("`{name}` must be at least 1.0, got {value}")]
    NotWidening {
        /// The offending field.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },
}

pub(crate) fn ensure_positive(name: &'static str, value: f32) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::NotPositive { name, value })
    }
}

pub(crate) fn ensure_ordered(name: &'static str, min: f32, max: f32) -> Result<(), SettingsError> {
    if min <= max {
        Ok(())
    } else {
        Err(SettingsError::InvertedBounds { name, min, max })
    }
}

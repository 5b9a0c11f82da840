//! Provides [`EdgeLook`] settings.
//!
//! Edge look lets the view lean a few extra degrees while the pointer rests near the border of
//! the window. It never accumulates: the extra rotation is recomputed from the pointer position
//! every frame, so the view snaps back as soon as the pointer moves inward.

use bevy_math::prelude::*;
use bevy_reflect::Reflect;

use crate::error::{ensure_positive, SettingsError};

/// Extra rotation applied on top of the primary look while the pointer sits near a screen edge.
#[derive(Debug, Clone, Reflect)]
pub struct EdgeLook {
    /// Set to false to ignore the pointer position entirely.
    pub enabled: bool,
    /// Fraction of the half-screen, measured from the center, past which edge look starts.
    ///
    /// With `0.3`, the pointer has to be more than 30% of the way from the center to an edge.
    pub threshold: f32,
    /// Extra rotation in degrees when the pointer is exactly at the edge of the window.
    pub max_extra_degrees: f32,
    /// How much wider the bounds are while edge look is active, relative to the primary
    /// pitch and yaw bounds.
    ///
    /// Each range is scaled about its center, see [`widen`]. For symmetric pitch bounds this is
    /// the same as multiplying each bound, but `[-30, 10]` with `1.2` becomes `[-34, 14]`
    /// rather than `[-36, 12]`.
    pub bounds_multiplier: f32,
}

impl Default for EdgeLook {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.3,
            max_extra_degrees: 5.0,
            bounds_multiplier: 1.2,
        }
    }
}

impl EdgeLook {
    /// Checks that the settings describe a usable edge region.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(SettingsError::OutOfUnitRange {
                name: "edge_look.threshold",
                value: self.threshold,
            });
        }
        ensure_positive("edge_look.max_extra_degrees", self.max_extra_degrees)?;
        if self.bounds_multiplier.is_nan() || self.bounds_multiplier < 1.0 {
            return Err(SettingsError::NotWidening {
                name: "edge_look.bounds_multiplier",
                value: self.bounds_multiplier,
            });
        }
        Ok(())
    }

    /// Signed overshoot per axis in `[-1, 1]`, with `y` positive toward the top of the window.
    ///
    /// `pointer` is a window position in logical pixels with the origin in the top left corner,
    /// matching [`Window::cursor_position`](bevy_window::Window::cursor_position).
    pub fn overshoot(&self, pointer: Vec2, viewport_size: Vec2) -> Vec2 {
        if !self.enabled || viewport_size.cmple(Vec2::ZERO).any() {
            return Vec2::ZERO;
        }
        let half = viewport_size / 2.0;
        let offset = pointer - half;
        let ratio = Vec2::new(offset.x / half.x, -offset.y / half.y);
        Vec2::new(
            overshoot_ratio(ratio.x, self.threshold),
            overshoot_ratio(ratio.y, self.threshold),
        )
    }

    /// The extra `(yaw, pitch)` rotation in degrees for a given overshoot.
    pub fn extra_rotation(&self, overshoot: Vec2) -> Vec2 {
        overshoot * self.max_extra_degrees
    }
}

/// How far past `threshold` a normalized screen ratio sits, rescaled so the edge of the window is
/// `1.0`. Keeps the sign of `ratio`, and is exactly zero inside the threshold.
pub fn overshoot_ratio(ratio: f32, threshold: f32) -> f32 {
    let ratio = ratio.clamp(-1.0, 1.0);
    let magnitude = ratio.abs();
    if magnitude <= threshold || threshold >= 1.0 {
        return 0.0;
    }
    ratio.signum() * (magnitude - threshold) / (1.0 - threshold)
}

/// Scale the range `[min, max]` about its center.
pub fn widen(min: f32, max: f32, multiplier: f32) -> (f32, f32) {
    let center = (min + max) / 2.0;
    let half = (max - min) / 2.0 * multiplier;
    (center - half, center + half)
}

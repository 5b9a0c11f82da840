//! The primary [`Component`] of the look controller, [`Viewpoint`].

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_transform::prelude::*;
use bevy_window::RequestRedraw;

use super::edge_look::{widen, EdgeLook};
use crate::error::{ensure_ordered, ensure_positive, SettingsError};

/// Tracks the pitch and yaw of a first-person view, along with the inputs that drive it.
///
/// Add this to the player body. The body only ever receives yaw. Pitch goes to the
/// [`Viewpoint::pivot`] entity, usually a child holding the camera. Without a pivot, the combined
/// rotation is written to the body itself, which is handy for a lone camera.
///
/// Angles are stored in degrees. Positive pitch looks up, positive yaw turns to the right.
///
/// # Moving the view
///
/// The [`DefaultInputPlugin`](crate::input::DefaultInputPlugin) feeds mouse motion and the
/// cursor position into every enabled viewpoint. To drive it yourself:
///
/// 1. Accumulate pointer deltas with [`Viewpoint::send_look_input`].
/// 2. Report the absolute pointer position with [`Viewpoint::set_pointer_position`], or clear it
///    with `None` to disable edge look for that frame.
/// 3. [`Viewpoint::update`] consumes the inputs once per frame in
///    [`GrabCamSystems::Look`](crate::GrabCamSystems::Look).
#[derive(Debug, Clone, Reflect, Component)]
pub struct Viewpoint {
    /// Set to false to freeze the view. Also cleared when the settings fail validation.
    pub enabled: bool,
    /// Sensitivity and primary bounds.
    pub settings: ViewpointSettings,
    /// Extra look while the pointer rests near the edge of the window.
    pub edge_look: EdgeLook,
    /// The entity that receives pitch, usually the camera or its parent.
    pub pivot: Option<Entity>,
    pitch: f32,
    yaw: f32,
    /// Captured from the body's transform the first time the viewpoint updates.
    yaw_origin: Option<f32>,
    pending_look: Vec2,
    pointer: Option<(Vec2, Vec2)>,
}

impl Default for Viewpoint {
    fn default() -> Self {
        Self {
            enabled: true,
            settings: Default::default(),
            edge_look: Default::default(),
            pivot: None,
            pitch: 0.0,
            yaw: 0.0,
            yaw_origin: None,
            pending_look: Vec2::ZERO,
            pointer: None,
        }
    }
}

/// Sensitivity and primary bounds of a [`Viewpoint`].
#[derive(Debug, Clone, Reflect)]
pub struct ViewpointSettings {
    /// Degrees of rotation per unit of pointer motion.
    pub sensitivity: f32,
    /// Lowest pitch in degrees. Negative values look down.
    pub min_pitch: f32,
    /// Highest pitch in degrees.
    pub max_pitch: f32,
    /// Half of the horizontal window in degrees, centered on the spawn yaw.
    pub yaw_half_window: f32,
}

impl Default for ViewpointSettings {
    fn default() -> Self {
        Self {
            sensitivity: 0.5,
            min_pitch: -15.0,
            max_pitch: 15.0,
            yaw_half_window: 30.0,
        }
    }
}

impl ViewpointSettings {
    /// Rejects settings that would freeze or invert the view.
    pub fn validate(&self) -> Result<(), SettingsError> {
        ensure_positive("sensitivity", self.sensitivity)?;
        ensure_ordered("pitch", self.min_pitch, self.max_pitch)?;
        ensure_positive("yaw_half_window", self.yaw_half_window)
    }
}

impl Viewpoint {
    /// Create a viewpoint with the given settings.
    pub fn new(settings: ViewpointSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Send pitch to `pivot` instead of the body.
    pub fn with_pivot(self, pivot: Entity) -> Self {
        Self {
            pivot: Some(pivot),
            ..self
        }
    }

    /// Replace the edge look settings.
    pub fn with_edge_look(self, edge_look: EdgeLook) -> Self {
        Self { edge_look, ..self }
    }

    /// Fix the center of the horizontal window instead of reading it from the transform.
    pub fn with_yaw_origin(self, yaw_origin: f32) -> Self {
        Self {
            yaw_origin: Some(yaw_origin),
            yaw: yaw_origin,
            ..self
        }
    }

    /// Current pitch in degrees, without edge look.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Current yaw in degrees, without edge look.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// The center of the horizontal window, once known.
    pub fn yaw_origin(&self) -> Option<f32> {
        self.yaw_origin
    }

    /// Accumulate a pointer delta. Positive `y` is the pointer moving down the screen.
    pub fn send_look_input(&mut self, delta: Vec2) {
        self.pending_look += delta;
    }

    /// Report where the pointer is within a viewport of `viewport_size` logical pixels.
    pub fn set_pointer_position(&mut self, pointer: Option<Vec2>, viewport_size: Vec2) {
        self.pointer = pointer.map(|p| (p, viewport_size));
    }

    /// The horizontal window as `(min, max)` degrees.
    pub fn yaw_bounds(&self) -> (f32, f32) {
        let origin = self.yaw_origin.unwrap_or_default();
        let half = self.settings.yaw_half_window;
        (origin - half, origin + half)
    }

    /// Rotate by a pointer delta and clamp to the primary bounds.
    pub fn apply_look(&mut self, delta: Vec2) {
        let settings = &self.settings;
        self.pitch = (self.pitch - delta.y * settings.sensitivity)
            .clamp(settings.min_pitch, settings.max_pitch);
        let (min_yaw, max_yaw) = self.yaw_bounds();
        self.yaw = (self.yaw + delta.x * settings.sensitivity).clamp(min_yaw, max_yaw);
    }

    /// The edge look rotation for the last reported pointer, as `(yaw, pitch)` degrees.
    pub fn edge_offset(&self) -> Vec2 {
        let Some((pointer, viewport_size)) = self.pointer else {
            return Vec2::ZERO;
        };
        let overshoot = self.edge_look.overshoot(pointer, viewport_size);
        self.edge_look.extra_rotation(overshoot)
    }

    /// The `(pitch, yaw)` actually applied this frame, including edge look.
    pub fn effective_angles(&self) -> Vec2 {
        let extra = self.edge_offset();
        if extra == Vec2::ZERO {
            return Vec2::new(self.pitch, self.yaw);
        }
        let multiplier = self.edge_look.bounds_multiplier;
        let (min_pitch, max_pitch) =
            widen(self.settings.min_pitch, self.settings.max_pitch, multiplier);
        let (min_yaw, max_yaw) = self.yaw_bounds();
        let (min_yaw, max_yaw) = widen(min_yaw, max_yaw, multiplier);
        Vec2::new(
            (self.pitch + extra.y).clamp(min_pitch, max_pitch),
            (self.yaw + extra.x).clamp(min_yaw, max_yaw),
        )
    }

    /// Capture the spawn yaw from the body's rotation, if it has not been set yet.
    fn ensure_origin(&mut self, body: &Transform) {
        if self.yaw_origin.is_some() {
            return;
        }
        let (yaw_radians, _, _) = body.rotation.to_euler(EulerRot::YXZ);
        // Bevy yaw is counter-clockwise seen from above, ours turns right.
        let origin = -yaw_radians.to_degrees();
        self.yaw_origin = Some(origin);
        self.yaw = origin;
        self.pitch = self
            .pitch
            .clamp(self.settings.min_pitch, self.settings.max_pitch);
    }

    /// Disable viewpoints with unusable settings as soon as they are added.
    pub fn validate_added(mut viewpoints: Query<(Entity, &mut Viewpoint), Added<Viewpoint>>) {
        for (entity, mut viewpoint) in &mut viewpoints {
            let result = viewpoint
                .settings
                .validate()
                .and_then(|_| viewpoint.edge_look.validate());
            if let Err(e) = result {
                error!("Disabling viewpoint on {entity}: {e}");
                viewpoint.enabled = false;
            }
        }
    }

    /// Apply pending look inputs and write rotations to the body and pivot. Called once per
    /// frame.
    pub fn update(
        mut viewpoints: Query<(Entity, &mut Viewpoint, &mut Transform)>,
        mut pivots: Query<&mut Transform, Without<Viewpoint>>,
        mut redraw: EventWriter<RequestRedraw>,
    ) {
        for (entity, mut viewpoint, mut body) in &mut viewpoints {
            if !viewpoint.enabled {
                continue;
            }
            viewpoint.ensure_origin(&body);
            let delta = std::mem::take(&mut viewpoint.pending_look);
            viewpoint.apply_look(delta);

            let angles = viewpoint.effective_angles();
            let pitch = Quat::from_rotation_x(angles.x.to_radians());
            let yaw = Quat::from_rotation_y(-angles.y.to_radians());

            let mut changed = false;
            match viewpoint.pivot.map(|pivot| pivots.get_mut(pivot)) {
                Some(Ok(mut pivot)) => {
                    changed |= set_rotation(&mut pivot, pitch);
                    changed |= set_rotation(&mut body, yaw);
                }
                Some(Err(_)) => {
                    warn_once!("Viewpoint pivot on {entity} is missing, rotating the body instead");
                    changed |= set_rotation(&mut body, yaw * pitch);
                }
                None => changed |= set_rotation(&mut body, yaw * pitch),
            }

            if changed {
                redraw.write(RequestRedraw);
            }
        }
    }
}

/// Only touch the transform when the rotation actually changes, to keep change detection quiet.
fn set_rotation(transform: &mut Mut<Transform>, rotation: Quat) -> bool {
    if transform.rotation.abs_diff_eq(rotation, 1e-6) {
        return false;
    }
    transform.rotation = rotation;
    true
}

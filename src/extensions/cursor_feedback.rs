//! A `bevy_grab_cam` extension that keeps a tinted indicator locked to the screen, near the
//! center, so the player can tell whether the thing they are looking at can be picked up.
//!
//! The tint is a pure function of the [`Grabber`] state: the indicator owns no interaction state
//! and never feeds back into the controller.

use bevy_app::prelude::*;
use bevy_color::{palettes::css, Color};
use bevy_ecs::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_render::prelude::*;
use bevy_transform::{helper::TransformHelper, prelude::*};

use crate::{
    grab::{component::Grabber, probe::ProbeResult, state::InteractionState},
    GrabCamSystems,
};

/// See the [module](self) docs.
pub struct CursorFeedbackPlugin;

impl Plugin for CursorFeedbackPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_sets(app);
        app.add_systems(
            Update,
            CursorFeedback::update.in_set(GrabCamSystems::Feedback),
        )
        .register_type::<CursorFeedback>()
        .register_type::<CursorIndicator>();

        #[cfg(feature = "extension_cursor_feedback")]
        app.add_systems(
            PostUpdate,
            draw_indicator.after(bevy_transform::TransformSystem::TransformPropagate),
        );
    }
}

/// Configures the indicator of a [`Grabber`] camera. Add it next to the grabber.
#[derive(Debug, Clone, Component, Reflect)]
pub struct CursorFeedback {
    /// Nothing grabbable under the center of the screen.
    pub normal_color: Color,
    /// Something grabbable under the center of the screen.
    pub hover_color: Color,
    /// Holding something.
    pub grab_color: Color,
    /// Offset of the indicator from the center of the screen in logical pixels, `y` down.
    pub offset: Vec2,
    /// Distance in front of the camera the indicator is placed at. Keep it just past the near
    /// plane.
    pub depth: f32,
}

impl Default for CursorFeedback {
    fn default() -> Self {
        Self {
            normal_color: css::WHITE.into(),
            hover_color: css::YELLOW.into(),
            grab_color: css::LIME.into(),
            offset: Vec2::new(0.0, 100.0),
            depth: 0.2,
        }
    }
}

impl CursorFeedback {
    /// The indicator color for a grabber state.
    pub fn tint(&self, state: &InteractionState, probe: &ProbeResult) -> Color {
        if state.is_holding() {
            self.grab_color
        } else if probe.is_grabbable {
            self.hover_color
        } else {
            self.normal_color
        }
    }

    /// Place and tint every [`CursorIndicator`]. Runs after the grabbers have settled.
    #[allow(clippy::type_complexity)]
    pub fn update(
        cameras: Query<(Entity, &Grabber, &CursorFeedback, &Camera)>,
        mut params: ParamSet<(
            TransformHelper,
            Query<(&mut CursorIndicator, &mut Transform)>,
        )>,
    ) {
        // Cameras were rotated this frame, so recompute their global transforms.
        let mut placements = Vec::new();
        for (entity, grabber, feedback, camera) in &cameras {
            let tint = feedback.tint(grabber.state(), grabber.probe());
            let pose = params
                .p0()
                .compute_global_transform(entity)
                .ok()
                .and_then(|camera_transform| {
                    let size = camera.logical_viewport_size()?;
                    let view_point = view_point_at_depth(
                        camera.clip_from_view(),
                        size,
                        size / 2.0 + feedback.offset,
                        feedback.depth,
                    )?;
                    let (_, rotation, _) = camera_transform.to_scale_rotation_translation();
                    Some((camera_transform.transform_point(view_point), rotation))
                });
            placements.push((entity, tint, pose));
        }

        let mut indicators = params.p1();
        for (entity, tint, pose) in placements {
            for (mut indicator, mut transform) in &mut indicators {
                if indicator.camera != entity {
                    continue;
                }
                indicator.color = tint;
                if let Some((translation, rotation)) = pose {
                    transform.translation = translation;
                    // Facing back toward the camera.
                    transform.rotation = rotation;
                }
            }
        }
    }
}

/// A screen-locked marker driven by the [`CursorFeedback`] of `camera`. Its world transform is
/// overwritten every frame, so spawn it at the root of the hierarchy.
#[derive(Debug, Clone, Component, Reflect)]
#[require(Transform)]
pub struct CursorIndicator {
    /// The grabber camera this indicator follows.
    pub camera: Entity,
    /// The current tint. Managed by [`CursorFeedback::update`]; copy it to your sprite or
    /// material.
    pub color: Color,
    /// Radius of the gizmo drawn for this indicator.
    pub radius: f32,
}

impl CursorIndicator {
    /// An indicator following `camera`.
    pub fn new(camera: Entity) -> Self {
        Self {
            camera,
            color: Color::WHITE,
            radius: 0.004,
        }
    }
}

/// The view space point under `viewport_position` at `depth` units in front of the camera.
///
/// The inverse of projecting a view space point onto the viewport: `viewport_position` is in
/// logical pixels with the origin in the top left corner.
pub fn view_point_at_depth(
    clip_from_view: Mat4,
    viewport_size: Vec2,
    viewport_position: Vec2,
    depth: f32,
) -> Option<Vec3> {
    let mut ndc = viewport_position * 2.0 / viewport_size - Vec2::ONE;
    // Flip the y-coordinate origin from the top to the bottom.
    ndc.y = -ndc.y;
    let view_from_clip = clip_from_view.inverse();
    let near = view_from_clip.project_point3(ndc.extend(1.0));
    // An NDC with Z = 0 is at infinity for reversed-z projections.
    let far = view_from_clip.project_point3(ndc.extend(f32::EPSILON));
    let direction = far - near;
    let t = (-depth - near.z) / direction.z;
    let point = near + direction * t;
    point.is_finite().then_some(point)
}

/// Use gizmos to draw each indicator as a small circle facing its camera.
#[cfg(feature = "extension_cursor_feedback")]
pub fn draw_indicator(
    indicators: Query<(&CursorIndicator, &GlobalTransform)>,
    mut gizmos: bevy_gizmos::prelude::Gizmos,
) {
    for (indicator, transform) in &indicators {
        let (_, rotation, translation) = transform.to_scale_rotation_translation();
        gizmos.circle(
            bevy_math::Isometry3d::new(translation, rotation),
            indicator.radius,
            indicator.color,
        );
    }
}

//! A `bevy_grab_cam` extension that draws debug gizmos: the probe ray of every grabber, the hold
//! point while holding, and the look windows of every viewpoint.

use bevy_app::prelude::*;
use bevy_color::{palettes::css, Alpha, Color};
use bevy_ecs::prelude::*;
use bevy_gizmos::prelude::*;
use bevy_math::{prelude::*, Isometry3d};
use bevy_reflect::prelude::*;
use bevy_transform::prelude::*;

use crate::{
    grab::component::Grabber,
    viewpoint::{component::Viewpoint, edge_look::widen},
    GrabCamSystems,
};

/// See the [module](self) docs.
pub struct ProbeGizmosPlugin;

impl Plugin for ProbeGizmosPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_sets(app);
        app.init_resource::<ProbeGizmos>()
            .add_systems(
                Update,
                (draw_probe, draw_look_windows)
                    .run_if(|settings: Res<ProbeGizmos>| settings.enabled)
                    .after(GrabCamSystems::Follow),
            )
            .register_type::<ProbeGizmos>();
    }
}

/// Toggles the debug drawing at runtime.
#[derive(Debug, Resource, Reflect)]
pub struct ProbeGizmos {
    /// Should gizmos be drawn?
    pub enabled: bool,
    /// Length of the lines showing the look windows.
    pub window_length: f32,
}

impl Default for ProbeGizmos {
    fn default() -> Self {
        Self {
            enabled: true,
            window_length: 2.0,
        }
    }
}

/// Draw each grabber's probe ray, green when it points at something grabbable.
pub fn draw_probe(grabbers: Query<&Grabber>, mut gizmos: Gizmos) {
    for grabber in grabbers.iter().filter(|g| g.enabled) {
        let Some(view) = grabber.view() else {
            continue;
        };
        let color: Color = if grabber.probe().is_grabbable {
            css::GREEN.into()
        } else {
            css::RED.into()
        };
        gizmos.line(
            view.origin,
            view.point_at(grabber.settings.grab_distance),
            color,
        );
        if let Some(held) = grabber.state().held() {
            gizmos.sphere(
                Isometry3d::from_translation(held.pose.current_position),
                0.2,
                css::BLUE,
            );
        }
    }
}

/// Draw the primary and extended yaw windows, and the pitch limits, of each viewpoint.
pub fn draw_look_windows(
    viewpoints: Query<(&Viewpoint, &GlobalTransform)>,
    settings: Res<ProbeGizmos>,
    mut gizmos: Gizmos,
) {
    let length = settings.window_length;
    for (viewpoint, transform) in &viewpoints {
        let origin = transform.translation();
        let direction = |yaw: f32, pitch: f32| {
            Quat::from_rotation_y(-yaw.to_radians())
                * Quat::from_rotation_x(pitch.to_radians())
                * Vec3::NEG_Z
        };
        let center = viewpoint.yaw_origin().unwrap_or_default();
        let (min_yaw, max_yaw) = viewpoint.yaw_bounds();
        let multiplier = viewpoint.edge_look.bounds_multiplier;
        let (wide_min_yaw, wide_max_yaw) = widen(min_yaw, max_yaw, multiplier);
        let pitch = &viewpoint.settings;
        let (wide_min_pitch, wide_max_pitch) = widen(pitch.min_pitch, pitch.max_pitch, multiplier);

        for yaw in [min_yaw, max_yaw] {
            gizmos.line(origin, origin + direction(yaw, 0.0) * length, css::YELLOW);
        }
        for yaw in [wide_min_yaw, wide_max_yaw] {
            gizmos.line(
                origin,
                origin + direction(yaw, 0.0) * length * 0.8,
                css::ORANGE.with_alpha(0.5),
            );
        }
        for pitch in [pitch.min_pitch, pitch.max_pitch] {
            gizmos.line(origin, origin + direction(center, pitch) * length, css::AQUA);
        }
        for pitch in [wide_min_pitch, wide_max_pitch] {
            gizmos.line(
                origin,
                origin + direction(center, pitch) * length * 0.8,
                css::AQUA.with_alpha(0.5),
            );
        }
    }
}

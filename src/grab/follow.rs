//! Dragging the held body toward the hold point in front of the camera.

use avian3d::prelude::*;
use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_time::prelude::*;
use bevy_transform::prelude::*;

use super::{component::Grabber, state::InteractionState};

/// How the held body catches up with the hold point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum FollowSmoothing {
    /// Move `follow_speed * dt` of the remaining distance each frame, capped at all of it.
    ///
    /// This approximates exponential decay for small `follow_speed * dt` and feels slightly
    /// different at low frame rates.
    #[default]
    Linear,
    /// Move `1 - exp(-follow_speed * dt)` of the remaining distance each frame, which is
    /// independent of the frame rate.
    Exponential,
}

impl FollowSmoothing {
    /// The fraction of the remaining distance to cover this frame.
    pub fn factor(self, follow_speed: f32, dt: f32) -> f32 {
        match self {
            FollowSmoothing::Linear => (follow_speed * dt).clamp(0.0, 1.0),
            FollowSmoothing::Exponential => 1.0 - (-follow_speed * dt).exp(),
        }
    }
}

impl Grabber {
    /// Pull every held body toward its hold point, and cancel the velocity the physics engine
    /// would otherwise fight the motion with.
    pub fn follow(
        time: Res<Time>,
        mut grabbers: Query<(Entity, &mut Grabber)>,
        mut bodies: Query<(
            &mut Transform,
            Option<&mut LinearVelocity>,
            Option<&mut AngularVelocity>,
        )>,
    ) {
        let dt = time.delta_secs();
        for (entity, mut grabber) in &mut grabbers {
            if !grabber.enabled {
                continue;
            }
            let Some(view) = grabber.view else {
                continue;
            };
            let Some(target) = grabber.state.held().map(|held| held.target) else {
                continue;
            };
            let Ok((mut transform, linear, angular)) = bodies.get_mut(target) else {
                debug!("Held entity {target} on {entity} is gone, dropping it");
                grabber.state = InteractionState::Idle;
                continue;
            };

            let settings = &grabber.settings;
            let factor = settings.smoothing.factor(settings.follow_speed, dt);
            let hold_point = view.point_at(settings.hold_distance);
            let Some(held) = grabber.state.held_mut() else {
                continue;
            };
            held.pose.step(hold_point, factor);

            transform.translation = held.pose.current_position;
            if let Some(rotation) = held.pose.rotation() {
                transform.rotation = rotation;
            }
            if let Some(mut linear) = linear {
                linear.0 = Vec3::ZERO;
            }
            if let Some(mut angular) = angular {
                angular.0 = Vec3::ZERO;
            }
        }
    }
}

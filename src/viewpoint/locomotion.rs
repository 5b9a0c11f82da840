//! Walking in the plane of the player body's yaw.

use avian3d::prelude::LinearVelocity;
use bevy_ecs::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_time::prelude::*;
use bevy_transform::prelude::*;

/// Moves the body along its own horizontal axes.
///
/// Bodies with a [`LinearVelocity`] are moved through the physics engine: the horizontal
/// velocity is replaced and the vertical component is left to gravity. Anything else is
/// translated directly.
#[derive(Debug, Clone, Reflect, Component)]
pub struct Locomotion {
    /// Units per second at full input.
    pub speed: f32,
    /// Strafe on `x`, forward on `y`. Usually within the unit circle.
    pub move_input: Vec2,
}

impl Default for Locomotion {
    fn default() -> Self {
        Self {
            speed: 5.0,
            move_input: Vec2::ZERO,
        }
    }
}

impl Locomotion {
    /// Horizontal velocity for a body facing `rotation`.
    pub fn planar_velocity(&self, rotation: Quat) -> Vec3 {
        let right = (rotation * Vec3::X).with_y(0.0).normalize_or_zero();
        let forward = (rotation * Vec3::NEG_Z).with_y(0.0).normalize_or_zero();
        (right * self.move_input.x + forward * self.move_input.y) * self.speed
    }

    /// Apply movement for this frame.
    pub fn update(
        time: Res<Time>,
        mut bodies: Query<(&Locomotion, &mut Transform, Option<&mut LinearVelocity>)>,
    ) {
        for (locomotion, mut transform, velocity) in &mut bodies {
            let planar = locomotion.planar_velocity(transform.rotation);
            match velocity {
                Some(mut velocity) => {
                    velocity.x = planar.x;
                    velocity.z = planar.z;
                }
                None if planar != Vec3::ZERO => {
                    transform.translation += planar * time.delta_secs();
                }
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy_app::prelude::*;

    use super::*;

    #[test]
    fn forward_follows_yaw() {
        let locomotion = Locomotion {
            speed: 2.0,
            move_input: Vec2::Y,
        };
        let v = locomotion.planar_velocity(Quat::IDENTITY);
        assert!(v.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-6));

        // Turned right by 90 degrees, forward is +X.
        let v = locomotion.planar_velocity(Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2));
        assert!(v.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn translates_without_physics_and_keeps_vertical_velocity_with_it() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .add_systems(Update, Locomotion::update);

        let input = Locomotion {
            speed: 1.0,
            move_input: Vec2::X,
        };
        let plain = app
            .world_mut()
            .spawn((Transform::default(), input.clone()))
            .id();
        let physical = app
            .world_mut()
            .spawn((
                Transform::default(),
                input,
                LinearVelocity(Vec3::new(0.0, -3.0, 0.0)),
            ))
            .id();

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(500));
        app.update();

        let translation = app.world().get::<Transform>(plain).unwrap().translation;
        assert!(translation.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-5));
        let velocity = app.world().get::<LinearVelocity>(physical).unwrap().0;
        assert!(velocity.abs_diff_eq(Vec3::new(1.0, -3.0, 0.0), 1e-6));
    }
}

//! Probing, grabbing, carrying and throwing physics bodies from a camera.
//!
//! The [`Grabber`](component::Grabber) component drives a small state machine, see
//! [`InteractionState`](state::InteractionState):
//!
//! - `Idle` becomes `Hovering` whenever the probe finds a dynamic body within reach.
//! - An [`Interact`] while something grabbable is probed starts `Holding` it: gravity is switched
//!   off and damping is raised so the body settles immediately.
//! - The next [`Interact`] throws it along the camera's forward direction and restores its
//!   gravity and damping.

pub mod component;
pub mod follow;
pub mod probe;
pub mod state;

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_math::prelude::*;

use crate::GrabCamSystems;
use component::Grabber;

/// See the [module](self) docs.
pub struct GrabPlugin;

impl Plugin for GrabPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_sets(app);
        app.add_event::<Interact>()
            .add_event::<GrabStarted>()
            .add_event::<GrabReleased>()
            .add_systems(
                Update,
                (
                    (
                        Grabber::validate_added,
                        Grabber::disable_without_camera,
                        Grabber::cast_probe,
                    )
                        .chain()
                        .in_set(GrabCamSystems::Probe),
                    (Grabber::drop_stale_targets, Grabber::transition)
                        .chain()
                        .in_set(GrabCamSystems::Transition),
                    Grabber::follow.in_set(GrabCamSystems::Follow),
                ),
            )
            .register_type::<Grabber>()
            .register_type::<component::Grabbable>();
    }
}

/// Send this event to toggle every enabled [`Grabber`]: grab what is under the center of the
/// screen, or throw what is held. Send it once per press, not every frame the button is down.
#[derive(Debug, Default, Clone, Copy, Event)]
pub struct Interact;

/// Sent when a grabber picks up a body.
#[derive(Debug, Clone, Copy, PartialEq, Event)]
pub struct GrabStarted {
    /// The entity with the [`Grabber`].
    pub grabber: Entity,
    /// The body that was picked up.
    pub target: Entity,
}

/// Sent when a grabber throws the body it was holding.
#[derive(Debug, Clone, Copy, PartialEq, Event)]
pub struct GrabReleased {
    /// The entity with the [`Grabber`].
    pub grabber: Entity,
    /// The body that was thrown.
    pub target: Entity,
    /// The impulse applied to the body.
    pub impulse: Vec3,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use avian3d::prelude::*;
    use bevy_time::prelude::*;
    use bevy_transform::prelude::*;

    use super::{
        component::GrabSettings,
        probe::{ProbeResult, ViewRay},
        state::InteractionState,
        *,
    };

    /// Everything but the probe, which needs a running physics world. Tests set the probe result
    /// by hand instead.
    fn app() -> App {
        let mut app = App::new();
        app.init_resource::<Time>()
            .add_event::<Interact>()
            .add_event::<GrabStarted>()
            .add_event::<GrabReleased>()
            .add_systems(
                Update,
                (
                    Grabber::validate_added,
                    Grabber::drop_stale_targets,
                    Grabber::transition,
                    Grabber::follow,
                )
                    .chain(),
            );
        app
    }

    fn spawn_grabber(app: &mut App, settings: GrabSettings) -> Entity {
        let mut grabber = Grabber::new(settings);
        grabber.view = Some(ViewRay {
            origin: Vec3::ZERO,
            forward: Dir3::NEG_Z,
        });
        app.world_mut().spawn(grabber).id()
    }

    fn aim_at(app: &mut App, grabber: Entity, target: Option<Entity>) {
        let mut grabber = app.world_mut().get_mut::<Grabber>(grabber).unwrap();
        grabber.probe = ProbeResult {
            hit: target,
            is_grabbable: target.is_some(),
        };
    }

    fn state(app: &App, grabber: Entity) -> InteractionState {
        *app.world().get::<Grabber>(grabber).unwrap().state()
    }

    fn frame(app: &mut App, dt: Duration) {
        app.world_mut().resource_mut::<Time>().advance_by(dt);
        app.update();
    }

    fn released(app: &App) -> Vec<GrabReleased> {
        app.world()
            .resource::<Events<GrabReleased>>()
            .iter_current_update_events()
            .copied()
            .collect()
    }

    #[test]
    fn grab_carry_and_throw() {
        let mut app = app();
        let grabber = spawn_grabber(&mut app, GrabSettings::default());
        let start = Vec3::new(0.0, 0.0, -3.0);
        let body = app
            .world_mut()
            .spawn((
                Transform::from_translation(start),
                LinearVelocity(Vec3::new(1.0, 2.0, 3.0)),
                AngularVelocity(Vec3::ONE),
            ))
            .id();

        aim_at(&mut app, grabber, Some(body));
        app.update();
        assert_eq!(state(&app, grabber), InteractionState::Hovering(body));

        app.world_mut().send_event(Interact);
        app.update();
        assert!(state(&app, grabber).is_holding());
        assert_eq!(app.world().get::<GravityScale>(body).unwrap().0, 0.0);
        assert_eq!(app.world().get::<LinearDamping>(body).unwrap().0, 10.0);
        assert_eq!(app.world().get::<AngularDamping>(body).unwrap().0, 10.0);

        for _ in 0..10 {
            frame(&mut app, Duration::from_millis(16));
        }
        let hold_point = Vec3::new(0.0, 0.0, -2.0);
        let held = *state(&app, grabber).held().unwrap();
        assert_eq!(held.pose.target_position, hold_point);
        // Ten linear steps of 0.16 leave 0.84^10 of the distance.
        let progress = (held.pose.current_position - start).length() / (hold_point - start).length();
        assert!((progress - (1.0 - 0.84f32.powi(10))).abs() < 1e-3);
        let transform = app.world().get::<Transform>(body).unwrap();
        assert_eq!(transform.translation, held.pose.current_position);
        assert_eq!(app.world().get::<LinearVelocity>(body).unwrap().0, Vec3::ZERO);
        assert_eq!(app.world().get::<AngularVelocity>(body).unwrap().0, Vec3::ZERO);

        app.world_mut().send_event(Interact);
        app.update();
        assert_eq!(state(&app, grabber), InteractionState::Idle);
        assert_eq!(
            released(&app),
            vec![GrabReleased {
                grabber,
                target: body,
                impulse: Vec3::new(0.0, 0.0, -5.0),
            }]
        );
        assert_eq!(app.world().get::<GravityScale>(body).unwrap().0, 1.0);
        assert_eq!(app.world().get::<LinearDamping>(body).unwrap().0, 0.0);
        assert!(app.world().get::<ExternalImpulse>(body).is_some());
    }

    #[test]
    fn toggle_restores_previous_body_settings() {
        let mut app = app();
        let settings = GrabSettings {
            throw_force: 12.5,
            ..Default::default()
        };
        let grabber = spawn_grabber(&mut app, settings);
        let body = app
            .world_mut()
            .spawn((
                Transform::default(),
                GravityScale(0.5),
                LinearDamping(0.2),
                AngularDamping(0.3),
            ))
            .id();
        aim_at(&mut app, grabber, Some(body));

        app.world_mut().send_event(Interact);
        app.update();
        assert_eq!(app.world().get::<GravityScale>(body).unwrap().0, 0.0);

        app.world_mut().send_event(Interact);
        app.update();
        assert_eq!(app.world().get::<GravityScale>(body).unwrap().0, 0.5);
        assert_eq!(app.world().get::<LinearDamping>(body).unwrap().0, 0.2);
        assert_eq!(app.world().get::<AngularDamping>(body).unwrap().0, 0.3);
        let impulse = released(&app)[0].impulse;
        assert!((impulse.length() - 12.5).abs() < 1e-5);
        assert!(impulse.normalize().abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn interact_while_holding_never_grabs_a_second_body() {
        let mut app = app();
        let grabber = spawn_grabber(&mut app, GrabSettings::default());
        let first = app.world_mut().spawn(Transform::default()).id();
        let second = app.world_mut().spawn(Transform::default()).id();

        aim_at(&mut app, grabber, Some(first));
        app.world_mut().send_event(Interact);
        app.update();

        aim_at(&mut app, grabber, Some(second));
        app.world_mut().send_event(Interact);
        app.update();
        assert_eq!(state(&app, grabber), InteractionState::Idle);
        assert_eq!(released(&app)[0].target, first);
        assert!(app.world().get::<GravityScale>(second).is_none());
    }

    #[test]
    fn despawned_held_body_returns_to_idle() {
        let mut app = app();
        let grabber = spawn_grabber(&mut app, GrabSettings::default());
        let body = app.world_mut().spawn(Transform::default()).id();
        aim_at(&mut app, grabber, Some(body));
        app.world_mut().send_event(Interact);
        app.update();
        assert!(state(&app, grabber).is_holding());

        app.world_mut().despawn(body);
        frame(&mut app, Duration::from_millis(16));
        assert_eq!(state(&app, grabber), InteractionState::Idle);

        // Interact afterwards is harmless.
        app.world_mut().send_event(Interact);
        app.update();
        assert_eq!(state(&app, grabber), InteractionState::Idle);
    }

    #[test]
    fn misses_stay_idle_and_interact_does_nothing() {
        let mut app = app();
        let grabber = spawn_grabber(&mut app, GrabSettings::default());
        for _ in 0..5 {
            aim_at(&mut app, grabber, None);
            app.world_mut().send_event(Interact);
            app.update();
            assert_eq!(state(&app, grabber), InteractionState::Idle);
            assert!(!app.world().get::<Grabber>(grabber).unwrap().probe().is_grabbable);
        }
    }

    #[test]
    fn programmatic_release_only_releases() {
        let mut app = app();
        let grabber = spawn_grabber(&mut app, GrabSettings::default());
        let body = app.world_mut().spawn(Transform::default()).id();
        aim_at(&mut app, grabber, Some(body));

        // Nothing held yet: release must not grab.
        app.world_mut().get_mut::<Grabber>(grabber).unwrap().release();
        app.update();
        assert_eq!(state(&app, grabber), InteractionState::Hovering(body));

        app.world_mut().get_mut::<Grabber>(grabber).unwrap().interact();
        app.update();
        assert!(state(&app, grabber).is_holding());

        app.world_mut().get_mut::<Grabber>(grabber).unwrap().release();
        app.update();
        assert_eq!(state(&app, grabber), InteractionState::Idle);
    }

    fn grab(app: &mut App, grabber: Entity) -> Entity {
        let body = app
            .world_mut()
            .spawn((Transform::default(), GravityScale(0.5), LinearDamping(0.2)))
            .id();
        aim_at(app, grabber, Some(body));
        app.world_mut().send_event(Interact);
        app.update();
        assert!(state(app, grabber).is_holding());
        body
    }

    fn body_settings(app: &App, body: Entity) -> (f32, f32, f32) {
        let world = app.world();
        (
            world.get::<GravityScale>(body).unwrap().0,
            world.get::<LinearDamping>(body).unwrap().0,
            world.get::<AngularDamping>(body).unwrap().0,
        )
    }

    #[test]
    fn disabling_while_holding_drops_the_body() {
        let mut app = app();
        let grabber = spawn_grabber(&mut app, GrabSettings::default());
        let body = grab(&mut app, grabber);
        assert_eq!(body_settings(&app, body), (0.0, 10.0, 10.0));

        app.world_mut().get_mut::<Grabber>(grabber).unwrap().enabled = false;
        app.update();
        assert_eq!(state(&app, grabber), InteractionState::Idle);
        assert_eq!(body_settings(&app, body), (0.5, 0.2, 0.0));
        // Dropped, not thrown.
        assert_eq!(released(&app)[0].impulse, Vec3::ZERO);

        for _ in 0..3 {
            frame(&mut app, Duration::from_millis(16));
        }
        assert_eq!(state(&app, grabber), InteractionState::Idle);
        assert_eq!(body_settings(&app, body), (0.5, 0.2, 0.0));
    }

    #[test]
    fn despawning_the_grabber_restores_the_body() {
        let mut app = app();
        let grabber = spawn_grabber(&mut app, GrabSettings::default());
        let body = grab(&mut app, grabber);

        app.world_mut().despawn(grabber);
        assert_eq!(body_settings(&app, body), (0.5, 0.2, 0.0));
        app.update();
        assert_eq!(body_settings(&app, body), (0.5, 0.2, 0.0));
    }

    #[test]
    fn removing_an_idle_grabber_leaves_bodies_alone() {
        let mut app = app();
        let grabber = spawn_grabber(&mut app, GrabSettings::default());
        let body = app.world_mut().spawn((Transform::default(), GravityScale(0.5))).id();
        aim_at(&mut app, grabber, Some(body));
        app.update();

        app.world_mut().entity_mut(grabber).remove::<Grabber>();
        assert_eq!(app.world().get::<GravityScale>(body).unwrap().0, 0.5);
    }

    #[test]
    fn each_interact_in_a_frame_is_a_toggle() {
        let mut app = app();
        let grabber = spawn_grabber(&mut app, GrabSettings::default());
        let body = grab(&mut app, grabber);

        // Two toggles within one frame cancel out.
        app.world_mut().send_event(Interact);
        app.world_mut().send_event(Interact);
        app.update();
        assert!(state(&app, grabber).is_holding());
        assert_eq!(body_settings(&app, body), (0.0, 10.0, 10.0));

        app.world_mut().send_event(Interact);
        app.world_mut().send_event(Interact);
        app.world_mut().send_event(Interact);
        app.update();
        assert_eq!(state(&app, grabber), InteractionState::Idle);
        assert_eq!(body_settings(&app, body), (0.5, 0.2, 0.0));
    }

    #[test]
    fn grabbers_without_a_camera_disable_themselves() {
        let mut app = App::new();
        app.add_systems(
            Update,
            (Grabber::validate_added, Grabber::disable_without_camera).chain(),
        );
        let lone = app.world_mut().spawn(Grabber::default()).id();
        let camera = app
            .world_mut()
            .spawn((Grabber::default(), bevy_render::camera::Camera::default()))
            .id();
        app.update();
        app.update();

        assert!(!app.world().get::<Grabber>(lone).unwrap().enabled);
        assert!(app.world().get::<Grabber>(camera).unwrap().enabled);
    }

    #[test]
    fn invalid_settings_disable_the_grabber() {
        let mut app = app();
        let grabber = spawn_grabber(
            &mut app,
            GrabSettings {
                grab_distance: -1.0,
                ..Default::default()
            },
        );
        let body = app.world_mut().spawn(Transform::default()).id();
        aim_at(&mut app, grabber, Some(body));
        app.world_mut().send_event(Interact);
        app.update();
        let grabber = app.world().get::<Grabber>(grabber).unwrap();
        assert!(!grabber.enabled);
        assert_eq!(*grabber.state(), InteractionState::Idle);
    }
}

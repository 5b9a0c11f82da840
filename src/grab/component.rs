//! The primary [`Component`] of the grab controller, [`Grabber`].

use avian3d::prelude::*;
use bevy_ecs::{component::HookContext, prelude::*, world::DeferredWorld};
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_render::prelude::*;
use bevy_transform::prelude::*;

use super::{
    follow::FollowSmoothing,
    probe::{ProbeResult, ViewRay},
    state::{BodySettings, Held, HoldPose, InteractionState, Transition},
    GrabReleased, GrabStarted, Interact,
};
use crate::error::{ensure_positive, SettingsError};

/// Optional marker for bodies that may be picked up. Only checked when
/// [`GrabSettings::require_marker`] is set; otherwise any dynamic body can be grabbed.
#[derive(Debug, Default, Clone, Copy, Component, Reflect)]
pub struct Grabbable;

/// Tracks all state of a camera's grab controller: what it is looking at, what it is holding,
/// and how it should behave.
///
/// Add this to an entity with a [`Camera`]. A grabber without a camera disables itself.
///
/// # Grabbing
///
/// Every frame the grabber probes along the camera's forward direction. Sending an [`Interact`]
/// event, or calling [`Grabber::interact`], toggles between picking up whatever is under the
/// center of the screen and throwing what is currently held.
///
/// Disabling the grabber or removing it while it holds something drops the body where it is and
/// gives it back its gravity and damping.
#[derive(Debug, Clone, Reflect, Component)]
#[component(on_remove = restore_held_body)]
pub struct Grabber {
    /// Set to false to stop probing, grabbing and following. Also cleared when the settings fail
    /// validation or there is no camera.
    pub enabled: bool,
    /// Distances, forces, and filters.
    pub settings: GrabSettings,
    /// Entities the probe ray passes through, like the player's own collider.
    pub ignore: Vec<Entity>,
    pub(crate) state: InteractionState,
    pub(crate) probe: ProbeResult,
    pub(crate) view: Option<ViewRay>,
    interact_requested: bool,
    release_requested: bool,
}

impl Default for Grabber {
    fn default() -> Self {
        Self {
            enabled: true,
            settings: Default::default(),
            ignore: Vec::new(),
            state: Default::default(),
            probe: Default::default(),
            view: None,
            interact_requested: false,
            release_requested: false,
        }
    }
}

/// Tuning of a [`Grabber`].
#[derive(Debug, Clone, Reflect)]
pub struct GrabSettings {
    /// Length of the probe ray.
    pub grab_distance: f32,
    /// Impulse applied along the camera forward direction on release.
    pub throw_force: f32,
    /// Distance in front of the camera at which bodies are held.
    pub hold_distance: f32,
    /// How quickly the held body catches up with the hold point.
    pub follow_speed: f32,
    /// Which formula turns `follow_speed` into per-frame motion.
    pub smoothing: FollowSmoothing,
    /// Fixed orientation for held bodies as Euler angles in degrees. Zero keeps the body's own
    /// orientation.
    pub rotation_offset: Vec3,
    /// Linear and angular damping while held.
    pub hold_damping: f32,
    /// Collision layers the probe can hit, as a raw [`LayerMask`] bitmask.
    pub layers: u32,
    /// Only bodies with [`Grabbable`] can be picked up.
    pub require_marker: bool,
}

impl Default for GrabSettings {
    fn default() -> Self {
        Self {
            grab_distance: 5.0,
            throw_force: 5.0,
            hold_distance: 2.0,
            follow_speed: 10.0,
            smoothing: FollowSmoothing::default(),
            rotation_offset: Vec3::ZERO,
            hold_damping: 10.0,
            layers: LayerMask::ALL.0,
            require_marker: false,
        }
    }
}

impl GrabSettings {
    /// Rejects distances, speeds, and forces that are not positive.
    pub fn validate(&self) -> Result<(), SettingsError> {
        ensure_positive("grab_distance", self.grab_distance)?;
        ensure_positive("throw_force", self.throw_force)?;
        ensure_positive("hold_distance", self.hold_distance)?;
        ensure_positive("follow_speed", self.follow_speed)?;
        if !(self.hold_damping.is_finite() && self.hold_damping >= 0.0) {
            return Err(SettingsError::NotPositive {
                name: "hold_damping",
                value: self.hold_damping,
            });
        }
        Ok(())
    }
}

/// The physics components of a body the grabber overrides while holding it.
type BodyComponents = (
    &'static Transform,
    Option<&'static mut GravityScale>,
    Option<&'static mut LinearDamping>,
    Option<&'static mut AngularDamping>,
    Option<&'static mut ExternalImpulse>,
);

impl Grabber {
    /// Create a grabber with the given settings.
    pub fn new(settings: GrabSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// The current hover/hold state.
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// The latest probe result. Not refreshed while holding.
    pub fn probe(&self) -> &ProbeResult {
        &self.probe
    }

    /// The camera ray of this frame, once the probe has run.
    pub fn view(&self) -> Option<ViewRay> {
        self.view
    }

    /// Is a body being carried?
    pub fn is_holding(&self) -> bool {
        self.state.is_holding()
    }

    /// Queue a toggle, exactly like an [`Interact`] event.
    pub fn interact(&mut self) {
        self.interact_requested = true;
    }

    /// Queue a release of the held body, if any. Unlike [`Grabber::interact`] this never grabs.
    pub fn release(&mut self) {
        self.release_requested = true;
    }

    /// Disable grabbers with unusable settings as soon as they are added.
    pub fn validate_added(mut grabbers: Query<(Entity, &mut Grabber), Added<Grabber>>) {
        for (entity, mut grabber) in &mut grabbers {
            if let Err(e) = grabber.settings.validate() {
                error!("Disabling grabber on {entity}: {e}");
                grabber.enabled = false;
            }
        }
    }

    /// A grabber can only probe from a camera. Disable the ones that have none, logging once.
    pub fn disable_without_camera(
        mut grabbers: Query<(Entity, &mut Grabber), Without<Camera>>,
    ) {
        for (entity, mut grabber) in &mut grabbers {
            if grabber.enabled {
                warn!("Grabber on {entity} has no camera, disabling it");
                grabber.enabled = false;
            }
        }
    }

    /// The single liveness check for externally owned references. Anything hovered or held that
    /// has been despawned sends the grabber back to idle.
    pub fn drop_stale_targets(
        mut grabbers: Query<(Entity, &mut Grabber)>,
        live: Query<(), With<Transform>>,
    ) {
        for (entity, mut grabber) in &mut grabbers {
            let Some(target) = grabber.state.target() else {
                continue;
            };
            if live.contains(target) {
                continue;
            }
            debug!("Target {target} of grabber on {entity} no longer exists");
            grabber.state = InteractionState::Idle;
            grabber.probe = ProbeResult::default();
        }
    }

    /// Consume interact inputs and the probe, and apply the resulting transition.
    ///
    /// Each [`Interact`] event is one toggle, so an even number of them within a frame cancel
    /// out. A disabled grabber that is still holding drops its body without throwing it.
    pub fn transition(
        mut commands: Commands,
        mut interacts: EventReader<Interact>,
        mut grabbers: Query<(Entity, &mut Grabber)>,
        mut bodies: Query<BodyComponents>,
        mut started: EventWriter<GrabStarted>,
        mut released: EventWriter<GrabReleased>,
    ) {
        let interacted = interacts.read().count() % 2 == 1;
        for (entity, mut grabber) in &mut grabbers {
            let interact = std::mem::take(&mut grabber.interact_requested) != interacted;
            let release = std::mem::take(&mut grabber.release_requested);
            let throw_force = if grabber.enabled {
                grabber.settings.throw_force
            } else {
                0.0
            };

            let transition = grabber.state.next(&grabber.probe, interact);
            let dropping = !grabber.enabled || (release && transition == Transition::Stay);
            let transition = match grabber.state.held() {
                Some(held) if dropping => Transition::Release(held.target),
                _ if dropping => Transition::Stay,
                _ => transition,
            };

            match transition {
                Transition::Stay => {}
                Transition::Hover(target) => grabber.state = InteractionState::Hovering(target),
                Transition::Unhover => grabber.state = InteractionState::Idle,
                Transition::Grab(target) => {
                    let Ok(body) = bodies.get_mut(target) else {
                        grabber.state = InteractionState::Idle;
                        continue;
                    };
                    let pose = HoldPose::new(body.0.translation, grabber.settings.rotation_offset);
                    let restore = write_body_settings(
                        &mut commands,
                        target,
                        body,
                        BodySettings::held(grabber.settings.hold_damping),
                    );
                    grabber.state = InteractionState::Holding(Held {
                        target,
                        pose,
                        restore,
                    });
                    debug!("Grabber on {entity} picked up {target}");
                    started.write(GrabStarted {
                        grabber: entity,
                        target,
                    });
                }
                Transition::Release(target) => {
                    let Some(held) = grabber.state.held().copied() else {
                        continue;
                    };
                    grabber.state = InteractionState::Idle;
                    grabber.probe = ProbeResult::default();
                    let Ok(mut body) = bodies.get_mut(target) else {
                        continue;
                    };
                    let impulse = grabber
                        .view
                        .map(|view| *view.forward * throw_force)
                        .unwrap_or(Vec3::ZERO);
                    match body.4.as_deref_mut() {
                        Some(external) => {
                            external.apply_impulse(impulse);
                        }
                        None => {
                            commands.entity(target).insert(ExternalImpulse::new(impulse));
                        }
                    }
                    write_body_settings(&mut commands, target, body, held.restore);
                    debug!("Grabber on {entity} threw {target} with {impulse}");
                    released.write(GrabReleased {
                        grabber: entity,
                        target,
                        impulse,
                    });
                }
            }
        }
    }
}

/// Overwrite gravity and damping on a body, returning what was there before. Components the
/// body does not have yet are inserted, and read as the physics engine's defaults.
fn write_body_settings(
    commands: &mut Commands,
    target: Entity,
    (_, gravity, linear, angular, _): (
        &Transform,
        Option<Mut<GravityScale>>,
        Option<Mut<LinearDamping>>,
        Option<Mut<AngularDamping>>,
        Option<Mut<ExternalImpulse>>,
    ),
    settings: BodySettings,
) -> BodySettings {
    let defaults = BodySettings::default();
    let previous = BodySettings {
        gravity_scale: gravity.as_ref().map_or(defaults.gravity_scale, |g| g.0),
        linear_damping: linear.as_ref().map_or(defaults.linear_damping, |d| d.0),
        angular_damping: angular.as_ref().map_or(defaults.angular_damping, |d| d.0),
    };

    let mut entity = commands.entity(target);
    match gravity {
        Some(mut gravity) => gravity.0 = settings.gravity_scale,
        None => {
            entity.insert(GravityScale(settings.gravity_scale));
        }
    }
    match linear {
        Some(mut linear) => linear.0 = settings.linear_damping,
        None => {
            entity.insert(LinearDamping(settings.linear_damping));
        }
    }
    match angular {
        Some(mut angular) => angular.0 = settings.angular_damping,
        None => {
            entity.insert(AngularDamping(settings.angular_damping));
        }
    }
    previous
}

/// Give a held body its own gravity and damping back when its grabber goes away.
fn restore_held_body(mut world: DeferredWorld, context: HookContext) {
    let Some(held) = world
        .get::<Grabber>(context.entity)
        .and_then(|grabber| grabber.state.held().copied())
    else {
        return;
    };
    let restore = held.restore;
    if let Some(mut gravity) = world.get_mut::<GravityScale>(held.target) {
        gravity.0 = restore.gravity_scale;
    }
    if let Some(mut linear) = world.get_mut::<LinearDamping>(held.target) {
        linear.0 = restore.linear_damping;
    }
    if let Some(mut angular) = world.get_mut::<AngularDamping>(held.target) {
        angular.0 = restore.angular_damping;
    }
    debug!(
        "Grabber on {} removed while holding {}, dropping it",
        context.entity, held.target
    );
}

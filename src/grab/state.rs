//! The hover/hold state machine of a [`Grabber`](super::component::Grabber).

use bevy_ecs::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;

use super::probe::ProbeResult;

/// What a grabber is doing. Exactly one of these is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum InteractionState {
    /// Nothing grabbable under the center of the screen.
    #[default]
    Idle,
    /// A grabbable body is under the center of the screen. Purely informational.
    Hovering(Entity),
    /// A body is being carried.
    Holding(Held),
}

/// The body being carried, and everything needed to put it back the way it was.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Held {
    /// The carried body.
    pub target: Entity,
    /// Where the body is, and where it is headed.
    pub pose: HoldPose,
    /// Physics settings to write back on release.
    pub restore: BodySettings,
}

/// The smoothed position of a held body.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct HoldPose {
    /// Smoothed position, written to the body every frame.
    pub current_position: Vec3,
    /// The point in front of the camera the body is pulled toward.
    pub target_position: Vec3,
    /// Fixed orientation of the held body as Euler angles in degrees. Zero leaves the
    /// orientation alone.
    pub rotation_offset: Vec3,
}

impl HoldPose {
    /// Start a hold from where the body currently is.
    pub fn new(position: Vec3, rotation_offset: Vec3) -> Self {
        Self {
            current_position: position,
            target_position: position,
            rotation_offset,
        }
    }

    /// Move `current_position` toward `target` by `factor` of the remaining distance.
    pub fn step(&mut self, target: Vec3, factor: f32) {
        self.target_position = target;
        self.current_position = self.current_position.lerp(target, factor.clamp(0.0, 1.0));
    }

    /// The fixed orientation to hold the body in, if one is configured.
    pub fn rotation(&self) -> Option<Quat> {
        (self.rotation_offset != Vec3::ZERO).then(|| {
            let r = self.rotation_offset;
            Quat::from_euler(
                EulerRot::YXZ,
                r.y.to_radians(),
                r.x.to_radians(),
                r.z.to_radians(),
            )
        })
    }
}

/// Gravity and damping of a body, captured on grab and restored on release.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct BodySettings {
    /// Multiplier of global gravity.
    pub gravity_scale: f32,
    /// Linear velocity damping.
    pub linear_damping: f32,
    /// Angular velocity damping.
    pub angular_damping: f32,
}

impl Default for BodySettings {
    /// The physics engine's values for a body without any overrides.
    fn default() -> Self {
        Self {
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }
}

impl BodySettings {
    /// No gravity and heavy damping, so the body stops drifting as soon as it is picked up.
    pub fn held(damping: f32) -> Self {
        Self {
            gravity_scale: 0.0,
            linear_damping: damping,
            angular_damping: damping,
        }
    }
}

/// The outcome of [`InteractionState::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changes.
    Stay,
    /// Start hovering the entity.
    Hover(Entity),
    /// The hovered entity is no longer under the center of the screen.
    Unhover,
    /// Pick up the entity.
    Grab(Entity),
    /// Drop and throw the held entity.
    Release(Entity),
}

impl InteractionState {
    /// Decide what happens this frame given the probe and whether interact was pressed.
    ///
    /// Interact toggles: while holding it always releases, otherwise it grabs the probed body if
    /// there is one. Pressing interact with nothing grabbable does nothing.
    pub fn next(&self, probe: &ProbeResult, interact: bool) -> Transition {
        if let InteractionState::Holding(held) = self {
            return if interact {
                Transition::Release(held.target)
            } else {
                Transition::Stay
            };
        }
        match (probe.grabbable_target(), interact) {
            (Some(target), true) => Transition::Grab(target),
            (Some(target), false) if *self == InteractionState::Hovering(target) => {
                Transition::Stay
            }
            (Some(target), false) => Transition::Hover(target),
            (None, _) if *self == InteractionState::Idle => Transition::Stay,
            (None, _) => Transition::Unhover,
        }
    }

    /// The hovered or held entity.
    pub fn target(&self) -> Option<Entity> {
        match self {
            InteractionState::Idle => None,
            InteractionState::Hovering(entity) => Some(*entity),
            InteractionState::Holding(held) => Some(held.target),
        }
    }

    /// The held body, if any.
    pub fn held(&self) -> Option<&Held> {
        match self {
            InteractionState::Holding(held) => Some(held),
            _ => None,
        }
    }

    /// The held body, if any.
    pub fn held_mut(&mut self) -> Option<&mut Held> {
        match self {
            InteractionState::Holding(held) => Some(held),
            _ => None,
        }
    }

    /// Is a body being carried?
    pub fn is_holding(&self) -> bool {
        matches!(self, InteractionState::Holding(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    fn grabbable(index: u32) -> ProbeResult {
        ProbeResult {
            hit: Some(entity(index)),
            is_grabbable: true,
        }
    }

    fn holding(index: u32) -> InteractionState {
        InteractionState::Holding(Held {
            target: entity(index),
            pose: HoldPose::new(Vec3::ZERO, Vec3::ZERO),
            restore: BodySettings::default(),
        })
    }

    #[test]
    fn repeated_misses_stay_idle() {
        let state = InteractionState::Idle;
        for _ in 0..10 {
            assert_eq!(state.next(&ProbeResult::default(), false), Transition::Stay);
            assert_eq!(state.next(&ProbeResult::default(), true), Transition::Stay);
        }
    }

    #[test]
    fn hover_needs_no_input() {
        let probe = grabbable(1);
        assert_eq!(
            InteractionState::Idle.next(&probe, false),
            Transition::Hover(entity(1))
        );
        assert_eq!(
            InteractionState::Hovering(entity(1)).next(&probe, false),
            Transition::Stay
        );
        assert_eq!(
            InteractionState::Hovering(entity(2)).next(&probe, false),
            Transition::Hover(entity(1))
        );
        assert_eq!(
            InteractionState::Hovering(entity(1)).next(&ProbeResult::default(), false),
            Transition::Unhover
        );
    }

    #[test]
    fn non_grabbable_hits_do_not_hover() {
        let wall = ProbeResult {
            hit: Some(entity(3)),
            is_grabbable: false,
        };
        assert_eq!(InteractionState::Idle.next(&wall, false), Transition::Stay);
        assert_eq!(InteractionState::Idle.next(&wall, true), Transition::Stay);
    }

    #[test]
    fn interact_grabs_from_idle_or_hover() {
        let probe = grabbable(1);
        assert_eq!(
            InteractionState::Idle.next(&probe, true),
            Transition::Grab(entity(1))
        );
        assert_eq!(
            InteractionState::Hovering(entity(1)).next(&probe, true),
            Transition::Grab(entity(1))
        );
    }

    #[test]
    fn interact_while_holding_releases_never_grabs_another() {
        // Even with a different grabbable body under the cursor.
        let state = holding(1);
        assert_eq!(state.next(&grabbable(2), true), Transition::Release(entity(1)));
        assert_eq!(state.next(&grabbable(2), false), Transition::Stay);
    }

    #[test]
    fn hold_pose_linear_steps() {
        let mut pose = HoldPose::new(Vec3::ZERO, Vec3::ZERO);
        pose.step(Vec3::X * 10.0, 0.25);
        assert_eq!(pose.current_position, Vec3::X * 2.5);
        assert_eq!(pose.target_position, Vec3::X * 10.0);
        // Factors above one do not overshoot.
        pose.step(Vec3::X * 10.0, 3.0);
        assert_eq!(pose.current_position, Vec3::X * 10.0);
    }

    #[test]
    fn zero_rotation_offset_leaves_orientation_alone() {
        assert_eq!(HoldPose::new(Vec3::ZERO, Vec3::ZERO).rotation(), None);
        let pose = HoldPose::new(Vec3::ZERO, Vec3::new(0.0, 90.0, 0.0));
        let rotation = pose.rotation().unwrap();
        assert!(rotation.abs_diff_eq(Quat::from_rotation_y(90f32.to_radians()), 1e-6));
    }
}

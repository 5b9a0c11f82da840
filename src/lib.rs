//! A first-person controller for Bevy: look around, target what is under the center of the
//! screen, grab it, carry it in front of the camera, and throw it.
//!
//! ## Overview
//!
//! The controller is split into a few pieces that run in a fixed order every frame, see
//! [`GrabCamSystems`]:
//!
//! - [`Viewpoint`](crate::viewpoint::component::Viewpoint) turns pointer motion into a clamped
//!   pitch and yaw, with an optional "edge look" that lets the view lean further while the
//!   pointer rests near the border of the window.
//! - [`Grabber`](crate::grab::component::Grabber) lives on the camera. It probes the world along
//!   the view direction, toggles between hovering, holding and releasing, and drags the held body
//!   toward a point in front of the camera.
//! - [`CursorFeedback`](crate::extensions::cursor_feedback::CursorFeedback) tints a screen-locked
//!   indicator depending on what the grabber is doing.
//!
//! Physics is provided by [`avian3d`], which must be added by the app with its `PhysicsPlugins`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! App::new()
//!     .add_plugins((DefaultPlugins, PhysicsPlugins::default(), DefaultGrabCamPlugins))
//!     .add_systems(Startup, |mut commands: Commands| {
//!         commands
//!             .spawn((Transform::default(), Viewpoint::default(), PointerCapture::default()))
//!             .with_child((Camera3d::default(), Grabber::default()));
//!     });
//! ```

pub mod error;
pub mod extensions;
pub mod grab;
pub mod input;
pub mod viewpoint;

use bevy_app::{prelude::*, PluginGroupBuilder};
use bevy_ecs::prelude::*;

/// Common imports.
pub mod prelude {
    pub use crate::{
        error::SettingsError,
        extensions::cursor_feedback::{CursorFeedback, CursorIndicator},
        grab::{
            component::{GrabSettings, Grabbable, Grabber},
            follow::FollowSmoothing,
            probe::ProbeResult,
            state::{HoldPose, InteractionState},
            GrabReleased, GrabStarted, Interact,
        },
        input::{GrabCamBindings, PointerCapture, TogglePointerCapture},
        viewpoint::{
            component::{Viewpoint, ViewpointSettings},
            edge_look::EdgeLook,
            locomotion::Locomotion,
        },
        DefaultGrabCamPlugins, GrabCamSystems,
    };
}

/// Adds [`bevy_grab_cam`](crate) functionality with all extensions and the default input
/// plugin.
pub struct DefaultGrabCamPlugins;

impl PluginGroup for DefaultGrabCamPlugins {
    fn build(self) -> PluginGroupBuilder {
        let group = PluginGroupBuilder::start::<Self>()
            .add(input::DefaultInputPlugin)
            .add(viewpoint::ViewpointPlugin)
            .add(grab::GrabPlugin)
            .add(extensions::cursor_feedback::CursorFeedbackPlugin);

        #[cfg(feature = "extension_probe_gizmos")]
        let group = group.add(extensions::probe_gizmos::ProbeGizmosPlugin);

        group
    }
}

/// The order the controller runs in every frame. All sets live in [`Update`] and are chained, so
/// the probe always sees the orientation produced by the look step of the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum GrabCamSystems {
    /// Pitch, yaw, edge look, and walking.
    Look,
    /// Ray cast from the center of the screen.
    Probe,
    /// Liveness checks and the hover/hold/release state machine.
    Transition,
    /// Drag the held body toward the hold point.
    Follow,
    /// Read-only projections of the state, like the cursor indicator.
    Feedback,
}

pub(crate) fn configure_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (
            GrabCamSystems::Look,
            GrabCamSystems::Probe,
            GrabCamSystems::Transition,
            GrabCamSystems::Follow,
            GrabCamSystems::Feedback,
        )
            .chain(),
    );
}

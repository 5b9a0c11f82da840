//! First-person look and walking, independent of grabbing.

pub mod component;
pub mod edge_look;
pub mod locomotion;

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_window::RequestRedraw;

use crate::GrabCamSystems;

/// Adds [`Viewpoint`](component::Viewpoint) and [`Locomotion`](locomotion::Locomotion) systems
/// to [`GrabCamSystems::Look`].
pub struct ViewpointPlugin;

impl Plugin for ViewpointPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_sets(app);
        app.add_event::<RequestRedraw>()
            .add_systems(
                Update,
                (
                    component::Viewpoint::validate_added,
                    component::Viewpoint::update,
                    locomotion::Locomotion::update,
                )
                    .chain()
                    .in_set(GrabCamSystems::Look),
            )
            .register_type::<component::Viewpoint>()
            .register_type::<locomotion::Locomotion>();
    }
}

//! Targeting: what is under the center of the screen, and can it be picked up?

use avian3d::prelude::*;
use bevy_ecs::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_transform::helper::TransformHelper;

use super::component::{Grabbable, Grabber};

/// The result of this frame's probe. Only holds an [`Entity`] id, so it never keeps the hit
/// alive, and it may refer to a despawned entity by the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub struct ProbeResult {
    /// The body hit by the ray, or the collider if it has no body.
    pub hit: Option<Entity>,
    /// Can [`ProbeResult::hit`] be picked up?
    pub is_grabbable: bool,
}

/// What the ray hit, resolved to the body that owns the collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    /// The owning body, or the collider itself when there is none.
    pub entity: Entity,
    /// The kind of rigid body, if any.
    pub body: Option<RigidBody>,
    /// Does the body carry [`Grabbable`]?
    pub has_marker: bool,
}

impl ProbeResult {
    /// Classify a hit. Only dynamic bodies can be moved around, and when `require_marker` is set
    /// they also need the [`Grabbable`] marker.
    pub fn from_hit(hit: Option<ProbeHit>, require_marker: bool) -> Self {
        let Some(hit) = hit else {
            return Self::default();
        };
        let dynamic = hit.body.is_some_and(|body| body.is_dynamic());
        Self {
            hit: Some(hit.entity),
            is_grabbable: dynamic && (hit.has_marker || !require_marker),
        }
    }

    /// The entity that would be grabbed by an interact this frame.
    pub fn grabbable_target(&self) -> Option<Entity> {
        self.hit.filter(|_| self.is_grabbable)
    }
}

/// The camera ray used by the probe and the follower, computed after the look step.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ViewRay {
    /// Camera position in world space.
    pub origin: Vec3,
    /// Camera forward, through the center of the screen.
    pub forward: Dir3,
}

impl ViewRay {
    /// The point `distance` units in front of the camera.
    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + *self.forward * distance
    }
}

impl Grabber {
    /// Refresh every grabber's [`ViewRay`] and, unless it is holding something, cast the probe.
    ///
    /// Global transforms are recomputed from the hierarchy here because
    /// [`GrabCamSystems::Look`](crate::GrabCamSystems::Look) has just rotated the camera and
    /// transform propagation will not run until `PostUpdate`.
    pub fn cast_probe(
        spatial_query: SpatialQuery,
        transforms: TransformHelper,
        mut grabbers: Query<(Entity, &mut Grabber)>,
        bodies: Query<(Option<&RigidBody>, Has<Grabbable>)>,
        parents: Query<&ChildOf>,
    ) {
        for (entity, mut grabber) in &mut grabbers {
            if !grabber.enabled {
                continue;
            }
            let Ok(camera) = transforms.compute_global_transform(entity) else {
                continue;
            };
            let view = ViewRay {
                origin: camera.translation(),
                forward: camera.forward(),
            };
            grabber.view = Some(view);

            if grabber.state.is_holding() {
                continue;
            }

            let settings = &grabber.settings;
            let filter = SpatialQueryFilter::from_mask(LayerMask(settings.layers))
                .with_excluded_entities(grabber.ignore.iter().copied().chain([entity]));
            let hit = spatial_query
                .cast_ray(
                    view.origin,
                    view.forward,
                    settings.grab_distance,
                    true,
                    &filter,
                )
                .map(|hit| resolve_body(hit.entity, &bodies, &parents));
            let probe = ProbeResult::from_hit(hit, settings.require_marker);
            grabber.probe = probe;
        }
    }
}

/// Walk up the hierarchy from a collider until an entity with a [`RigidBody`] is found.
fn resolve_body(
    collider: Entity,
    bodies: &Query<(Option<&RigidBody>, Has<Grabbable>)>,
    parents: &Query<&ChildOf>,
) -> ProbeHit {
    let mut entity = collider;
    loop {
        if let Ok((Some(body), has_marker)) = bodies.get(entity) {
            return ProbeHit {
                entity,
                body: Some(*body),
                has_marker,
            };
        }
        match parents.get(entity) {
            Ok(child_of) => entity = child_of.parent(),
            Err(_) => {
                return ProbeHit {
                    entity: collider,
                    body: None,
                    has_marker: false,
                }
            }
        }
    }
}

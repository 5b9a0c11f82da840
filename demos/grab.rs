//! A small room with crates to pick up and throw.

use avian3d::prelude::*;
use bevy::{color::palettes::css, prelude::*};
use bevy_grab_cam::prelude::*;

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            PhysicsPlugins::default(), // Step 1: add a physics engine
            DefaultGrabCamPlugins,     // Step 2: add the controller plugins
        ))
        .add_systems(Startup, (setup_player, setup_scene))
        .add_systems(Update, (tint_indicator, log_throws))
        .run();
}

fn setup_player(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Step 3: a body with a viewpoint, and a camera with a grabber as its child.
    let player = commands
        .spawn((
            Transform::from_xyz(0.0, 1.6, 4.0),
            Visibility::default(),
            Locomotion::default(),
            PointerCapture::default(),
        ))
        .id();
    let camera = commands
        .spawn((
            Camera3d::default(),
            Grabber::default(),
            CursorFeedback::default(),
            ChildOf(player),
        ))
        .id();
    commands
        .entity(player)
        .insert(Viewpoint::default().with_pivot(camera));

    commands.spawn((
        CursorIndicator::new(camera),
        Mesh3d(meshes.add(Circle::new(0.003))),
        MeshMaterial3d(materials.add(StandardMaterial {
            unlit: true,
            ..default()
        })),
    ));
}

/// Copy the indicator tint onto its material.
fn tint_indicator(
    indicators: Query<
        (&CursorIndicator, &MeshMaterial3d<StandardMaterial>),
        Changed<CursorIndicator>,
    >,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (indicator, material) in &indicators {
        if let Some(material) = materials.get_mut(&material.0) {
            material.base_color = indicator.color;
        }
    }
}

fn log_throws(mut released: EventReader<GrabReleased>) {
    for event in released.read() {
        info!("Threw {} with impulse {}", event.target, event.impulse);
    }
}

//
// --- The below code is not important for the example ---
//

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        RigidBody::Static,
        Collider::cuboid(20.0, 0.2, 20.0),
        Mesh3d(meshes.add(Cuboid::new(20.0, 0.2, 20.0))),
        MeshMaterial3d(materials.add(Color::from(css::DARK_SLATE_GRAY))),
        Transform::from_xyz(0.0, -0.1, 0.0),
    ));

    let crate_mesh = meshes.add(Cuboid::new(0.5, 0.5, 0.5));
    let crate_material = materials.add(Color::from(css::PERU));
    for i in 0..5 {
        commands.spawn((
            RigidBody::Dynamic,
            Collider::cuboid(0.5, 0.5, 0.5),
            Grabbable,
            Mesh3d(crate_mesh.clone()),
            MeshMaterial3d(crate_material.clone()),
            Transform::from_xyz(i as f32 - 2.0, 0.25, 0.0),
        ));
    }

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(3.0, 8.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Text::new(
            "Mouse - Look\nWASD - Walk\nLeft Mouse / E - Grab and throw\nEsc - Release cursor",
        ),
        Node {
            margin: UiRect::all(Val::Px(20.0)),
            ..default()
        },
    ));
}

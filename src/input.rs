//! Provides a default input plugin for the controller, and scoped capture of the OS cursor.
//!
//! The [`DefaultInputPlugin`] is optional. Apps with their own input handling can feed
//! [`Viewpoint::send_look_input`], [`Viewpoint::set_pointer_position`],
//! [`Locomotion::move_input`] and [`Interact`] directly.

use bevy_app::{prelude::*, AppExit};
use bevy_ecs::prelude::*;
use bevy_input::{mouse::MouseMotion, prelude::*, InputSystem};
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_window::{CursorGrabMode, PrimaryWindow, Window};

use crate::{
    grab::Interact,
    viewpoint::{component::Viewpoint, locomotion::Locomotion},
};

/// See the [module](self) docs.
pub struct DefaultInputPlugin;

impl Plugin for DefaultInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GrabCamBindings>()
            .add_event::<Interact>()
            .add_event::<TogglePointerCapture>()
            .add_systems(
                PreUpdate,
                (default_look_input, default_move_input, default_interact_input)
                    .after(InputSystem),
            )
            .add_systems(
                Update,
                (
                    PointerCapture::toggle,
                    PointerCapture::apply,
                    PointerCapture::release_removed,
                )
                    .chain(),
            )
            .add_systems(Last, PointerCapture::release_on_exit)
            .register_type::<GrabCamBindings>()
            .register_type::<PointerCapture>();
    }
}

/// Buttons used by the [`DefaultInputPlugin`].
#[derive(Debug, Clone, Resource, Reflect)]
pub struct GrabCamBindings {
    /// Mouse button that toggles grabbing.
    pub interact_mouse: Option<MouseButton>,
    /// Key that toggles grabbing.
    pub interact_key: Option<KeyCode>,
    /// Key that captures or releases the cursor, see [`TogglePointerCapture`].
    pub toggle_capture: Option<KeyCode>,
    /// Walk forward.
    pub forward: KeyCode,
    /// Walk backward.
    pub back: KeyCode,
    /// Strafe left.
    pub left: KeyCode,
    /// Strafe right.
    pub right: KeyCode,
}

impl Default for GrabCamBindings {
    fn default() -> Self {
        Self {
            interact_mouse: Some(MouseButton::Left),
            interact_key: Some(KeyCode::KeyE),
            toggle_capture: Some(KeyCode::Escape),
            forward: KeyCode::KeyW,
            back: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
        }
    }
}

/// Locks and hides the primary window's cursor for as long as this component exists and is
/// active. Removing the component, despawning its entity, or exiting the app gives the cursor
/// back.
#[derive(Debug, Clone, Component, Reflect)]
pub struct PointerCapture {
    /// How the cursor is held while captured. The default keeps it inside the window, so the
    /// pointer can still reach the edges for edge look.
    pub grab_mode: CursorGrabMode,
    /// When false the cursor is shown and free, and look input is ignored.
    pub active: bool,
}

impl Default for PointerCapture {
    fn default() -> Self {
        Self {
            grab_mode: CursorGrabMode::Confined,
            active: true,
        }
    }
}

/// Send this event to flip every [`PointerCapture`] between captured and released, e.g. when a
/// menu opens.
#[derive(Debug, Default, Clone, Copy, Event)]
pub struct TogglePointerCapture;

impl PointerCapture {
    fn toggle(
        keys: Option<Res<ButtonInput<KeyCode>>>,
        bindings: Res<GrabCamBindings>,
        mut events: EventReader<TogglePointerCapture>,
        mut captures: Query<&mut PointerCapture>,
    ) {
        let pressed = keys
            .zip(bindings.toggle_capture)
            .is_some_and(|(keys, key)| keys.just_pressed(key));
        let toggles = events.read().count() + pressed as usize;
        if toggles % 2 == 0 {
            return;
        }
        for mut capture in &mut captures {
            capture.active = !capture.active;
        }
    }

    fn apply(
        captures: Query<&PointerCapture, Changed<PointerCapture>>,
        mut windows: Query<&mut Window, With<PrimaryWindow>>,
    ) {
        let Some(capture) = captures.iter().last() else {
            return;
        };
        let Ok(mut window) = windows.single_mut() else {
            return;
        };
        if capture.active {
            window.cursor_options.grab_mode = capture.grab_mode;
            window.cursor_options.visible = false;
        } else {
            set_free(&mut window);
        }
    }

    fn release_removed(
        mut removed: RemovedComponents<PointerCapture>,
        remaining: Query<&PointerCapture>,
        mut windows: Query<&mut Window, With<PrimaryWindow>>,
    ) {
        if removed.read().count() == 0 || remaining.iter().any(|c| c.active) {
            return;
        }
        if let Ok(mut window) = windows.single_mut() {
            debug!("Pointer capture removed, releasing the cursor");
            set_free(&mut window);
        }
    }

    fn release_on_exit(
        mut exit: EventReader<AppExit>,
        mut windows: Query<&mut Window, With<PrimaryWindow>>,
    ) {
        if exit.read().count() == 0 {
            return;
        }
        if let Ok(mut window) = windows.single_mut() {
            set_free(&mut window);
        }
    }
}

fn set_free(window: &mut Window) {
    window.cursor_options.grab_mode = CursorGrabMode::None;
    window.cursor_options.visible = true;
}

/// Feeds mouse motion and the cursor position into every enabled [`Viewpoint`], unless the
/// pointer has been released by a [`PointerCapture`].
pub fn default_look_input(
    mut motion: EventReader<MouseMotion>,
    windows: Query<&Window, With<PrimaryWindow>>,
    captures: Query<&PointerCapture>,
    mut viewpoints: Query<&mut Viewpoint>,
) {
    let delta: Vec2 = motion.read().map(|event| event.delta).sum();
    if captures.iter().any(|capture| !capture.active) {
        return;
    }
    let window = windows.single().ok();
    let size = window.map_or(Vec2::ZERO, |w| Vec2::new(w.width(), w.height()));
    let pointer = window.and_then(Window::cursor_position);

    for mut viewpoint in viewpoints.iter_mut().filter(|v| v.enabled) {
        if delta != Vec2::ZERO {
            viewpoint.send_look_input(delta);
        }
        viewpoint.set_pointer_position(pointer, size);
    }
}

/// Reads the walk keys into every [`Locomotion`].
pub fn default_move_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    bindings: Res<GrabCamBindings>,
    mut walkers: Query<&mut Locomotion>,
) {
    let Some(keys) = keys else {
        return;
    };
    let axis = |positive: KeyCode, negative: KeyCode| {
        keys.pressed(positive) as i8 as f32 - keys.pressed(negative) as i8 as f32
    };
    let input = Vec2::new(
        axis(bindings.right, bindings.left),
        axis(bindings.forward, bindings.back),
    )
    .normalize_or_zero();
    for mut walker in &mut walkers {
        if walker.move_input != input {
            walker.move_input = input;
        }
    }
}

/// Sends one [`Interact`] per press of the interact bindings.
pub fn default_interact_input(
    mouse: Option<Res<ButtonInput<MouseButton>>>,
    keys: Option<Res<ButtonInput<KeyCode>>>,
    bindings: Res<GrabCamBindings>,
    captures: Query<&PointerCapture>,
    mut interact: EventWriter<Interact>,
) {
    if captures.iter().any(|capture| !capture.active) {
        return;
    }
    let clicked = mouse
        .zip(bindings.interact_mouse)
        .is_some_and(|(mouse, button)| mouse.just_pressed(button));
    let pressed = keys
        .zip(bindings.interact_key)
        .is_some_and(|(keys, key)| keys.just_pressed(key));
    if clicked || pressed {
        interact.write(Interact);
    }
}

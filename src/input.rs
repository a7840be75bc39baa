use bevy::prelude::*;

/// Abstraction layer between raw input and the simulation.
/// The keyboard writes to this in windowed runs; headless tests write it
/// directly. Held flags mirror the current key state every frame, while the
/// `*_pressed` edges latch until a fixed tick consumes them, so a tap on a
/// frame with no tick is not lost.
#[derive(Resource, Default, Clone, Copy)]
pub struct InputIntents {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    /// Climb intent for upward pipes. Shares keys with jump.
    pub up: bool,
    pub jump_held: bool,
    pub jump_pressed: bool,
    pub shoot_pressed: bool,
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<InputIntents>()
            .add_systems(
                PreUpdate,
                keyboard_to_intents.run_if(resource_exists::<ButtonInput<KeyCode>>),
            )
            .add_systems(
                FixedUpdate,
                clear_intent_edges.after(crate::game_runtime::TickSet::Cleanup),
            );
    }
}

/// Translate keyboard state to intents
fn keyboard_to_intents(keyboard: Res<ButtonInput<KeyCode>>, mut intents: ResMut<InputIntents>) {
    intents.left = keyboard.any_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]);
    intents.right = keyboard.any_pressed([KeyCode::ArrowRight, KeyCode::KeyD]);
    intents.down = keyboard.any_pressed([KeyCode::ArrowDown, KeyCode::KeyS]);

    let jump = keyboard.any_pressed([KeyCode::ArrowUp, KeyCode::Space, KeyCode::KeyW]);
    intents.up = jump;
    intents.jump_held = jump;

    if keyboard.any_just_pressed([KeyCode::ArrowUp, KeyCode::Space, KeyCode::KeyW]) {
        intents.jump_pressed = true;
    }
    if keyboard.any_just_pressed([KeyCode::AltLeft, KeyCode::AltRight, KeyCode::KeyZ]) {
        intents.shoot_pressed = true;
    }
}

/// Drop the latched edges once the tick chain has seen them
fn clear_intent_edges(mut intents: ResMut<InputIntents>) {
    intents.jump_pressed = false;
    intents.shoot_pressed = false;
}

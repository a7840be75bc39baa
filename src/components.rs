use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Logical viewport width in world pixels; also the camera clamp span.
pub const VIEW_WIDTH: f32 = 960.0;
/// Logical viewport height in world pixels.
pub const VIEW_HEIGHT: f32 = 540.0;
/// Top edge of the ground band every level gets prepended.
pub const GROUND_Y: f32 = 472.0;
/// Thickness of the prepended ground band.
pub const GROUND_H: f32 = 68.0;
/// Falling below VIEW_HEIGHT + this margin counts as out of the world.
pub const FALL_MARGIN: f32 = 200.0;

/// Marks the player entity
#[derive(Component)]
pub struct Player;

/// Position in gameplay space: world pixels, y grows downward, `x`/`y` is the
/// top-left corner of the entity's rectangle. Only the render sync converts
/// to bevy's y-up coordinates; simulation code never does.
#[derive(Component, Clone, Copy, Default, Debug)]
pub struct GamePosition {
    pub x: f32,
    pub y: f32,
}

/// Velocity in world pixels per tick
#[derive(Component, Clone, Copy, Default, Debug)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

/// Collision rectangle size
#[derive(Component, Clone, Copy, Debug)]
pub struct Extent {
    pub w: f32,
    pub h: f32,
}

/// Whether the entity stands on a platform this tick
#[derive(Component, Clone, Copy, Default)]
pub struct Grounded(pub bool);

/// Ticks remaining in which a jump still counts after walking off a ledge
#[derive(Component, Default)]
pub struct CoyoteTimer(pub u32);

/// Ticks remaining in which a buffered jump press stays valid
#[derive(Component, Default)]
pub struct JumpBuffer(pub u32);

/// Liveness flag. Dead pool-tracked entities get swept back to their pool;
/// dead level entities just stop colliding and rendering.
#[derive(Component)]
pub struct Alive(pub bool);

/// Horizontal facing, 1.0 right / -1.0 left
#[derive(Component)]
pub struct Facing(pub f32);

impl Default for Facing {
    fn default() -> Self {
        Facing(1.0)
    }
}

/// Ticks of damage immunity remaining
#[derive(Component, Default)]
pub struct Invulnerable(pub u32);

/// Ticks until the player may fire again
#[derive(Component, Default)]
pub struct ShootCooldown(pub u32);

/// Powered-up size tier: taller hitbox and one free hit
#[derive(Component, Default)]
pub struct Big(pub bool);

/// Everything spawned from a level template; despawned wholesale on load
#[derive(Component)]
pub struct LevelEntity;

/// True when running without a window. Sprites and text nodes are skipped,
/// the simulation is unchanged.
#[derive(Resource, Clone, Copy)]
pub struct HeadlessMode(pub bool);

/// Simulation tuning. Units are world pixels and pixels per tick; the gravity
/// scales are the fractions items and enemies fall at relative to the player.
#[derive(Resource, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub move_speed: f32,
    pub jump_velocity: f32,
    pub coyote_frames: u32,
    pub jump_buffer_frames: u32,
    /// Extra downward pull applied while rising with the jump key released.
    pub jump_release_damping: f32,
    /// Gravity offset applied while rising with the jump key held.
    pub jump_hold_damping: f32,
    pub shoot_cooldown: u32,
    pub bullet_speed: f32,
    pub enemy_bullet_speed: f32,
    pub stomp_bounce: f32,
    pub invul_frames: u32,
    pub enemy_gravity_scale: f32,
    pub powerup_gravity_scale: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.6,
            move_speed: 4.0,
            jump_velocity: -12.5,
            coyote_frames: 8,
            jump_buffer_frames: 8,
            jump_release_damping: 0.6,
            jump_hold_damping: 0.12,
            shoot_cooldown: 12,
            bullet_speed: 9.5,
            enemy_bullet_speed: 6.5,
            stomp_bounce: -9.0,
            invul_frames: 120,
            enemy_gravity_scale: 0.9,
            powerup_gravity_scale: 0.7,
        }
    }
}

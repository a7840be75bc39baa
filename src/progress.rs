use bevy::prelude::*;

use crate::components::*;
use crate::events::GameEventBus;
use crate::game_runtime::{GameState, RespawnPoint, TickSet};
use crate::hud::{HudMessage, PendingTasks, TaskAction};
use crate::input::InputIntents;
use crate::level::{Checkpoint, Flag, LevelLibrary, LevelRuntime, LoadRequest, Pipe, PipeDir};
use crate::physics::Aabb;

/// Respawn lands a little past the checkpoint post
const CHECKPOINT_RESPAWN_OFFSET: f32 = 20.0;
const CHECKPOINT_BANNER_SECS: f32 = 0.7;
const PIPE_BANNER_SECS: f32 = 0.5;
const LEVEL_ADVANCE_DELAY_SECS: f32 = 1.4;
const FLAG_SCORE: u32 = 100;

pub struct ProgressPlugin;

impl Plugin for ProgressPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (update_checkpoints, check_pipes, check_flag)
                .chain()
                .in_set(TickSet::Progress),
        );
    }
}

/// Passing a checkpoint's x-threshold moves the respawn point there, once
/// per checkpoint.
fn update_checkpoints(
    mut respawn: ResMut<RespawnPoint>,
    mut bus: ResMut<GameEventBus>,
    mut message: ResMut<HudMessage>,
    mut tasks: ResMut<PendingTasks>,
    runtime: Res<LevelRuntime>,
    players: Query<(&GamePosition, &Extent), With<Player>>,
    mut checkpoints: Query<(&mut Checkpoint, &GamePosition), Without<Player>>,
) {
    let Ok((ppos, pext)) = players.get_single() else {
        return;
    };
    let center = ppos.x + pext.w / 2.0;

    for (mut cp, pos) in checkpoints.iter_mut() {
        if !cp.reached && center >= pos.x {
            cp.reached = true;
            *respawn = RespawnPoint {
                x: pos.x + CHECKPOINT_RESPAWN_OFFSET,
                y: GROUND_Y - pext.h,
            };
            message.show("Checkpoint ✓", "");
            tasks.schedule(
                CHECKPOINT_BANNER_SECS,
                runtime.generation,
                TaskAction::HideMessage,
            );
            bus.emit("checkpoint_reached", serde_json::json!({ "x": pos.x }));
        }
    }
}

/// Standing on a pipe's mouth with the matching directional intent held
/// queues a warp to the pipe's target level. At most one warp per tick.
fn check_pipes(
    intents: Res<InputIntents>,
    library: Res<LevelLibrary>,
    mut runtime: ResMut<LevelRuntime>,
    mut bus: ResMut<GameEventBus>,
    mut message: ResMut<HudMessage>,
    mut tasks: ResMut<PendingTasks>,
    players: Query<(&GamePosition, &Extent, &Grounded), With<Player>>,
    pipes: Query<(&Pipe, &GamePosition, &Extent), Without<Player>>,
) {
    let Ok((ppos, pext, grounded)) = players.get_single() else {
        return;
    };
    let feet = Aabb::new(ppos.x + 4.0, ppos.y + pext.h - 2.0, pext.w - 8.0, 4.0);

    for (pipe, pos, extent) in pipes.iter() {
        let mouth = Aabb::new(pos.x, pos.y - 4.0, extent.w, 8.0);
        if !grounded.0 || !feet.overlaps(&mouth) {
            continue;
        }
        let wants_in = match pipe.dir {
            PipeDir::Down => intents.down,
            PipeDir::Up => intents.up,
        };
        if !wants_in {
            continue;
        }

        let Some(index) = library.find_by_name(&pipe.target_level) else {
            warn!(
                "[Jasim level] Pipe leads to unknown level: {}",
                pipe.target_level
            );
            return;
        };
        runtime.request_load(LoadRequest {
            index,
            spawn: Some(pipe.target_spawn),
        });
        bus.emit(
            "pipe_warp",
            serde_json::json!({ "target": pipe.target_level, "index": index }),
        );
        message.show("Traveling through the pipe...", "");
        tasks.schedule(PIPE_BANNER_SECS, runtime.generation, TaskAction::HideMessage);
        return;
    }
}

/// Crossing the flag awards its bonus once, then either schedules the jump
/// to the next level or ends the campaign with the win flag.
fn check_flag(
    library: Res<LevelLibrary>,
    runtime: Res<LevelRuntime>,
    mut game: ResMut<GameState>,
    mut bus: ResMut<GameEventBus>,
    mut message: ResMut<HudMessage>,
    mut tasks: ResMut<PendingTasks>,
    players: Query<(&GamePosition, &Extent), With<Player>>,
    mut flags: Query<(&mut Flag, &GamePosition), Without<Player>>,
) {
    // a queued warp means this level is already on its way out
    if runtime.pending.is_some() {
        return;
    }
    let Ok((ppos, pext)) = players.get_single() else {
        return;
    };
    let Ok((mut flag, pos)) = flags.get_single_mut() else {
        return;
    };
    if flag.reached || ppos.x + pext.w <= pos.x {
        return;
    }

    flag.reached = true;
    game.score += FLAG_SCORE;
    bus.emit("flag_reached", serde_json::json!({ "level": runtime.index }));

    if runtime.index < library.levels.len().saturating_sub(1) {
        let next = runtime.index + 1;
        message.show(
            &format!("Well done! Heading to level {}", next + 1),
            "Loading...",
        );
        tasks.schedule(
            LEVEL_ADVANCE_DELAY_SECS,
            runtime.generation,
            TaskAction::AdvanceLevel(next),
        );
    } else {
        game.win = true;
        bus.emit("game_won", serde_json::json!({ "score": game.score }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{SpawnPoint, FLAG_H, FLAG_W, PIPE_H, PIPE_W};
    use crate::player::{PLAYER_H, PLAYER_W};

    fn test_app() -> App {
        let mut app = App::new();
        app.insert_resource(RespawnPoint { x: 0.0, y: 0.0 })
            .insert_resource(GameState::default())
            .insert_resource(GameEventBus::default())
            .insert_resource(HudMessage::default())
            .insert_resource(PendingTasks::default())
            .insert_resource(InputIntents::default())
            .insert_resource(LevelLibrary::default())
            .insert_resource(LevelRuntime::default())
            .add_systems(Update, (update_checkpoints, check_pipes, check_flag).chain());
        app
    }

    fn spawn_player_at(app: &mut App, x: f32, y: f32, grounded: bool) {
        app.world_mut().spawn((
            Player,
            GamePosition { x, y },
            Extent {
                w: PLAYER_W,
                h: PLAYER_H,
            },
            Grounded(grounded),
        ));
    }

    #[test]
    fn checkpoint_moves_the_respawn_point_once() {
        let mut app = test_app();
        spawn_player_at(&mut app, 600.0, 424.0, true);
        let cp = app
            .world_mut()
            .spawn((
                Checkpoint { reached: false },
                GamePosition { x: 600.0, y: 420.0 },
                Extent { w: 6.0, h: 52.0 },
            ))
            .id();

        app.update();

        assert!(app.world().get::<Checkpoint>(cp).unwrap().reached);
        let respawn = app.world().resource::<RespawnPoint>();
        assert_eq!(respawn.x, 620.0);
        assert_eq!(respawn.y, GROUND_Y - PLAYER_H);
        assert!(app.world().resource::<HudMessage>().visible);
        assert_eq!(app.world().resource::<PendingTasks>().0.len(), 1);

        // crossing again changes nothing further
        app.world_mut().resource_mut::<RespawnPoint>().x = 1.0;
        app.update();
        assert_eq!(app.world().resource::<RespawnPoint>().x, 1.0);
        assert_eq!(app.world().resource::<PendingTasks>().0.len(), 1);
    }

    fn spawn_pipe(app: &mut App, x: f32, y: f32, dir: PipeDir, target: &str) {
        app.world_mut().spawn((
            Pipe {
                dir,
                target_level: target.to_string(),
                target_spawn: SpawnPoint { x: 80.0, y: 300.0 },
            },
            GamePosition { x, y },
            Extent {
                w: PIPE_W,
                h: PIPE_H,
            },
        ));
    }

    #[test]
    fn pipe_warp_needs_intent_and_ground() {
        let mut app = test_app();
        // feet resting on the pipe mouth
        spawn_player_at(&mut app, 510.0, 408.0 - PLAYER_H, true);
        spawn_pipe(&mut app, 500.0, 408.0, PipeDir::Down, "Underground 1");

        app.update();
        assert!(app.world().resource::<LevelRuntime>().pending.is_none());

        app.world_mut().resource_mut::<InputIntents>().down = true;
        app.update();

        let runtime = app.world().resource::<LevelRuntime>();
        let pending = runtime.pending.as_ref().unwrap();
        assert_eq!(
            pending.index,
            app.world()
                .resource::<LevelLibrary>()
                .find_by_name("Underground 1")
                .unwrap()
        );
        let spawn = pending.spawn.unwrap();
        assert_eq!(spawn.x, 80.0);
        assert!(app
            .world()
            .resource::<GameEventBus>()
            .last_named("pipe_warp")
            .is_some());
        assert!(app.world().resource::<HudMessage>().visible);
    }

    #[test]
    fn airborne_player_slides_over_the_pipe() {
        let mut app = test_app();
        spawn_player_at(&mut app, 510.0, 408.0 - PLAYER_H, false);
        spawn_pipe(&mut app, 500.0, 408.0, PipeDir::Down, "Underground 1");
        app.world_mut().resource_mut::<InputIntents>().down = true;

        app.update();

        assert!(app.world().resource::<LevelRuntime>().pending.is_none());
    }

    #[test]
    fn pipe_to_nowhere_warps_nobody() {
        let mut app = test_app();
        spawn_player_at(&mut app, 510.0, 408.0 - PLAYER_H, true);
        spawn_pipe(&mut app, 500.0, 408.0, PipeDir::Down, "Atlantis");
        app.world_mut().resource_mut::<InputIntents>().down = true;

        app.update();

        assert!(app.world().resource::<LevelRuntime>().pending.is_none());
        assert!(!app.world().resource::<HudMessage>().visible);
    }

    fn spawn_flag(app: &mut App, x: f32) {
        app.world_mut().spawn((
            Flag { reached: false },
            GamePosition { x, y: GROUND_Y - FLAG_H },
            Extent {
                w: FLAG_W,
                h: FLAG_H,
            },
        ));
    }

    #[test]
    fn flag_schedules_the_next_level() {
        let mut app = test_app();
        spawn_player_at(&mut app, 2000.0, 424.0, true);
        spawn_flag(&mut app, 2010.0);

        app.update();

        let game = app.world().resource::<GameState>();
        assert_eq!(game.score, 100);
        assert!(!game.win);
        let tasks = app.world().resource::<PendingTasks>();
        assert_eq!(tasks.0.len(), 1);
        assert!(matches!(tasks.0[0].action, TaskAction::AdvanceLevel(1)));
        assert!(app.world().resource::<HudMessage>().visible);

        // the flag only pays out once
        app.update();
        assert_eq!(app.world().resource::<GameState>().score, 100);
        assert_eq!(app.world().resource::<PendingTasks>().0.len(), 1);
    }

    #[test]
    fn final_flag_wins_the_game() {
        let mut app = test_app();
        let last = app.world().resource::<LevelLibrary>().levels.len() - 1;
        app.world_mut().resource_mut::<LevelRuntime>().index = last;
        spawn_player_at(&mut app, 2000.0, 424.0, true);
        spawn_flag(&mut app, 2010.0);

        app.update();

        let game = app.world().resource::<GameState>();
        assert!(game.win);
        assert!(!game.game_over);
        assert_eq!(game.score, 100);
        assert!(app
            .world()
            .resource::<GameEventBus>()
            .last_named("game_won")
            .is_some());
        // no level advance was scheduled
        assert!(app.world().resource::<PendingTasks>().0.is_empty());
    }

    #[test]
    fn flag_defers_to_a_queued_warp() {
        let mut app = test_app();
        spawn_player_at(&mut app, 2000.0, 424.0, true);
        spawn_flag(&mut app, 2010.0);
        app.world_mut()
            .resource_mut::<LevelRuntime>()
            .request_load(LoadRequest {
                index: 2,
                spawn: None,
            });

        app.update();

        assert_eq!(app.world().resource::<GameState>().score, 0);
    }
}

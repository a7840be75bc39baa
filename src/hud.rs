use bevy::prelude::*;

use crate::audio::SoundBank;
use crate::components::HeadlessMode;
use crate::game_runtime::GameState;
use crate::level::{LevelRuntime, LoadRequest};
use crate::object_pool::GamePools;
use crate::perf::PerfMonitor;
use crate::render::CullingStats;
use crate::spatial_hash::GameGrids;

const PERF_OVERLAY_REFRESH_SECS: f32 = 0.5;

/// Banner over the playfield: a title line plus an optional smaller line
#[derive(Resource, Default)]
pub struct HudMessage {
    pub title: String,
    pub subtitle: String,
    pub visible: bool,
}

impl HudMessage {
    pub fn show(&mut self, title: &str, subtitle: &str) {
        self.title = title.to_string();
        self.subtitle = subtitle.to_string();
        self.visible = true;
    }
}

/// Deferred one-shot effect. Carries the level generation it was scheduled
/// under; a task whose generation has passed is dropped unexecuted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskAction {
    HideMessage,
    AdvanceLevel(usize),
}

pub struct PendingTask {
    pub timer: Timer,
    pub generation: u64,
    pub action: TaskAction,
}

#[derive(Resource, Default)]
pub struct PendingTasks(pub Vec<PendingTask>);

impl PendingTasks {
    pub fn schedule(&mut self, seconds: f32, generation: u64, action: TaskAction) {
        self.0.push(PendingTask {
            timer: Timer::from_seconds(seconds, TimerMode::Once),
            generation,
            action,
        });
    }
}

#[derive(Component)]
struct HudScoreText;

#[derive(Component)]
struct HudLivesText;

#[derive(Component)]
struct HudLevelText;

#[derive(Component)]
struct PerfOverlayText;

#[derive(Component)]
struct BannerRoot;

#[derive(Component)]
struct BannerTitle;

#[derive(Component)]
struct BannerSubtitle;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HudMessage>()
            .init_resource::<PendingTasks>()
            .add_systems(Startup, spawn_hud)
            .add_systems(
                Update,
                (
                    run_pending_tasks,
                    show_terminal_banners,
                    sync_hud_text,
                    sync_banner,
                    sync_perf_overlay,
                )
                    .chain(),
            );
    }
}

/// Ticks on real time and is not gated on gameplay, so banners still hide
/// while the game-over or win screen freezes the simulation.
fn run_pending_tasks(
    time: Res<Time>,
    mut tasks: ResMut<PendingTasks>,
    mut message: ResMut<HudMessage>,
    mut runtime: ResMut<LevelRuntime>,
) {
    settle_due_tasks(&mut tasks, time.delta(), &mut message, &mut runtime);
}

fn settle_due_tasks(
    tasks: &mut PendingTasks,
    delta: std::time::Duration,
    message: &mut HudMessage,
    runtime: &mut LevelRuntime,
) {
    let current_generation = runtime.generation;
    let mut due = Vec::new();
    tasks.0.retain_mut(|task| {
        if !task.timer.tick(delta).finished() {
            return true;
        }
        if task.generation == current_generation {
            due.push(task.action);
        }
        false
    });
    for action in due {
        match action {
            TaskAction::HideMessage => message.visible = false,
            TaskAction::AdvanceLevel(next) => runtime.request_load(LoadRequest {
                index: next,
                spawn: None,
            }),
        }
    }
}

fn show_terminal_banners(game: Res<GameState>, mut message: ResMut<HudMessage>) {
    if !game.is_changed() {
        return;
    }
    if game.game_over {
        message.show("Game over", "Press any key to play again");
    } else if game.win {
        message.show("You win! You finished the game", "Press any key to play again");
    }
}

fn spawn_hud(mut commands: Commands, headless: Res<HeadlessMode>) {
    if headless.0 {
        return;
    }
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                ..default()
            },
            GlobalZIndex(100),
            PickingBehavior::IGNORE,
        ))
        .with_children(|root| {
            let label = |top: f32| Node {
                position_type: PositionType::Absolute,
                left: Val::Px(12.0),
                top: Val::Px(top),
                ..default()
            };
            root.spawn((
                Text::new("Score: 0"),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                label(8.0),
                HudScoreText,
                PickingBehavior::IGNORE,
            ));
            root.spawn((
                Text::new("Lives: 3"),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                label(30.0),
                HudLivesText,
                PickingBehavior::IGNORE,
            ));
            root.spawn((
                Text::new("Level: 1"),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                label(52.0),
                HudLevelText,
                PickingBehavior::IGNORE,
            ));
            root.spawn((
                Text::new(String::new()),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                TextColor(Color::srgb(0.8, 0.8, 0.8)),
                Node {
                    position_type: PositionType::Absolute,
                    right: Val::Px(12.0),
                    top: Val::Px(8.0),
                    ..default()
                },
                PerfOverlayText,
                PickingBehavior::IGNORE,
            ));
            root.spawn((
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Percent(28.0),
                    right: Val::Percent(28.0),
                    top: Val::Percent(38.0),
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    padding: UiRect::all(Val::Px(14.0)),
                    ..default()
                },
                BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.65)),
                Visibility::Hidden,
                BannerRoot,
                PickingBehavior::IGNORE,
            ))
            .with_children(|banner| {
                banner.spawn((
                    Text::new(String::new()),
                    TextFont {
                        font_size: 26.0,
                        ..default()
                    },
                    TextColor(Color::WHITE),
                    BannerTitle,
                    PickingBehavior::IGNORE,
                ));
                banner.spawn((
                    Text::new(String::new()),
                    TextFont {
                        font_size: 15.0,
                        ..default()
                    },
                    TextColor(Color::srgb(0.85, 0.85, 0.85)),
                    BannerSubtitle,
                    PickingBehavior::IGNORE,
                ));
            });
        });
}

#[allow(clippy::type_complexity)]
fn sync_hud_text(
    game: Res<GameState>,
    mut scores: Query<
        &mut Text,
        (With<HudScoreText>, Without<HudLivesText>, Without<HudLevelText>),
    >,
    mut lives: Query<
        &mut Text,
        (With<HudLivesText>, Without<HudScoreText>, Without<HudLevelText>),
    >,
    mut levels: Query<
        &mut Text,
        (With<HudLevelText>, Without<HudScoreText>, Without<HudLivesText>),
    >,
) {
    if !game.is_changed() {
        return;
    }
    if let Ok(mut text) = scores.get_single_mut() {
        text.0 = format!("Score: {}", game.score);
    }
    if let Ok(mut text) = lives.get_single_mut() {
        text.0 = format!("Lives: {}", game.lives);
    }
    if let Ok(mut text) = levels.get_single_mut() {
        text.0 = format!("Level: {}", game.level_index + 1);
    }
}

fn sync_banner(
    message: Res<HudMessage>,
    mut roots: Query<&mut Visibility, With<BannerRoot>>,
    mut titles: Query<&mut Text, (With<BannerTitle>, Without<BannerSubtitle>)>,
    mut subtitles: Query<&mut Text, (With<BannerSubtitle>, Without<BannerTitle>)>,
) {
    if !message.is_changed() {
        return;
    }
    let Ok(mut visibility) = roots.get_single_mut() else {
        return;
    };
    *visibility = if message.visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    if let Ok(mut text) = titles.get_single_mut() {
        text.0 = message.title.clone();
    }
    if let Ok(mut text) = subtitles.get_single_mut() {
        text.0 = message.subtitle.clone();
    }
}

fn sync_perf_overlay(
    time: Res<Time>,
    mut refresh: Local<Option<Timer>>,
    monitor: Res<PerfMonitor>,
    grids: Res<GameGrids>,
    pools: Res<GamePools>,
    culling: Res<CullingStats>,
    bank: Res<SoundBank>,
    mut overlay: Query<&mut Text, With<PerfOverlayText>>,
) {
    let timer = refresh.get_or_insert_with(|| {
        Timer::from_seconds(PERF_OVERLAY_REFRESH_SECS, TimerMode::Repeating)
    });
    if !timer.tick(time.delta()).just_finished() {
        return;
    }
    let Ok(mut text) = overlay.get_single_mut() else {
        return;
    };
    let report = monitor.report();
    text.0 = format!(
        "FPS: {:.0}\nObjects: {}\nVisible: {}\nCollision Queries: {}\nObject Reuse: {:.0}%\nSound Cache: {}",
        report.fps,
        culling.total_objects,
        culling.visible_objects,
        grids.platforms.total_queries,
        pools.bullets.stats().reuse_rate * 100.0,
        bank.snapshot().cache_size,
    );
}

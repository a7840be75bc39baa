//! Embedded game data for web builds. The build script copies the file named
//! by `JASIM_EMBED_GAME_DATA_PATH` into OUT_DIR at compile time; without it
//! an empty object is embedded and this plugin changes nothing.

use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::components::PhysicsConfig;
use crate::game_runtime::GameRng;
use crate::level::{LevelLibrary, LevelTemplate};

const EMBEDDED_GAME_DATA: &str =
    include_str!(concat!(env!("OUT_DIR"), "/jasim_embedded_game_data.json"));

/// Same shape as the game.json a native build reads from disk, minus the
/// window settings the web page owns.
#[derive(serde::Deserialize, Default)]
struct EmbeddedGameData {
    rng_seed: Option<u64>,
    physics: Option<PhysicsConfig>,
    levels: Option<Vec<LevelTemplate>>,
}

pub struct WebBootstrapPlugin;

impl Plugin for WebBootstrapPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreStartup, apply_embedded_game_data);
    }
}

fn apply_embedded_game_data(
    mut library: ResMut<LevelLibrary>,
    mut physics: ResMut<PhysicsConfig>,
    mut rng: ResMut<GameRng>,
) {
    let data: EmbeddedGameData = match serde_json::from_str(EMBEDDED_GAME_DATA) {
        Ok(data) => data,
        Err(e) => {
            warn!("[Jasim export] Embedded game data invalid: {}", e);
            return;
        }
    };

    let mut applied = false;
    if let Some(levels) = data.levels {
        if levels.is_empty() {
            warn!("[Jasim export] Embedded data has no levels; keeping the built-in campaign");
        } else {
            library.levels = levels;
            applied = true;
        }
    }
    if let Some(config) = data.physics {
        *physics = config;
        applied = true;
    }
    if let Some(seed) = data.rng_seed {
        rng.0 = SmallRng::seed_from_u64(seed);
        applied = true;
    }
    if applied {
        info!("[Jasim export] Applied embedded game data");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_data_accepts_the_game_json_schema() {
        let data: EmbeddedGameData = serde_json::from_str(
            r#"{
                "rng_seed": 7,
                "physics": { "gravity": 0.8 },
                "levels": [{
                    "name": "Warp Test",
                    "theme": "underground",
                    "width": 1600.0,
                    "start": { "x": 40.0, "y": 380.0 },
                    "flag_x": 1500.0
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(data.rng_seed, Some(7));
        assert_eq!(data.physics.unwrap().gravity, 0.8);
        let levels = data.levels.unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].name, "Warp Test");
        assert!(levels[0].platforms.is_empty());
    }

    #[test]
    fn empty_embed_parses_to_nothing() {
        let data: EmbeddedGameData = serde_json::from_str("{}").unwrap();
        assert!(data.rng_seed.is_none());
        assert!(data.physics.is_none());
        assert!(data.levels.is_none());
    }
}

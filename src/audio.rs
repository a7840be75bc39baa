use std::collections::HashMap;

use bevy::prelude::*;
use serde::Serialize;

use crate::events::GameEventBus;

const MAX_CUE_LOG: usize = 256;
const CACHE_CAPACITY: usize = 50;
const CACHE_EVICTION_BATCH: usize = 10;
const DEFAULT_VOLUME: f32 = 0.08;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One oscillator burst: pitch, length, shape, gain and start offset within
/// its cue.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct Note {
    pub freq: f32,
    pub dur: f32,
    pub wave: Waveform,
    pub volume: f32,
    pub delay: f32,
}

const JUMP_NOTES: [Note; 1] = [Note {
    freq: 520.0,
    dur: 0.09,
    wave: Waveform::Sine,
    volume: 0.06,
    delay: 0.0,
}];
const COIN_NOTES: [Note; 1] = [Note {
    freq: 900.0,
    dur: 0.08,
    wave: Waveform::Triangle,
    volume: 0.07,
    delay: 0.0,
}];
const STOMP_NOTES: [Note; 1] = [Note {
    freq: 200.0,
    dur: 0.12,
    wave: Waveform::Square,
    volume: 0.09,
    delay: 0.0,
}];
const HIT_NOTES: [Note; 1] = [Note {
    freq: 160.0,
    dur: 0.25,
    wave: Waveform::Sawtooth,
    volume: 0.09,
    delay: 0.0,
}];
const POWER_NOTES: [Note; 2] = [
    Note {
        freq: 660.0,
        dur: 0.08,
        wave: Waveform::Square,
        volume: DEFAULT_VOLUME,
        delay: 0.0,
    },
    Note {
        freq: 880.0,
        dur: 0.12,
        wave: Waveform::Square,
        volume: DEFAULT_VOLUME,
        delay: 0.08,
    },
];
const SHOOT_NOTES: [Note; 1] = [Note {
    freq: 980.0,
    dur: 0.08,
    wave: Waveform::Triangle,
    volume: 0.07,
    delay: 0.0,
}];
const BREAK_NOTES: [Note; 1] = [Note {
    freq: 120.0,
    dur: 0.06,
    wave: Waveform::Square,
    volume: 0.1,
    delay: 0.0,
}];
const LIFE_NOTES: [Note; 2] = [
    Note {
        freq: 880.0,
        dur: 0.08,
        wave: Waveform::Square,
        volume: 0.08,
        delay: 0.0,
    },
    Note {
        freq: 1175.0,
        dur: 0.12,
        wave: Waveform::Square,
        volume: 0.08,
        delay: 0.09,
    },
];
const WIN_NOTES: [Note; 4] = [
    Note {
        freq: 523.0,
        dur: 0.12,
        wave: Waveform::Square,
        volume: 0.07,
        delay: 0.0,
    },
    Note {
        freq: 659.0,
        dur: 0.12,
        wave: Waveform::Square,
        volume: 0.07,
        delay: 0.15,
    },
    Note {
        freq: 783.0,
        dur: 0.12,
        wave: Waveform::Square,
        volume: 0.07,
        delay: 0.3,
    },
    Note {
        freq: 1046.0,
        dur: 0.12,
        wave: Waveform::Square,
        volume: 0.07,
        delay: 0.45,
    },
];

/// The nine synthesized effects the game voices
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum SoundCue {
    Jump,
    Coin,
    Stomp,
    Hit,
    Power,
    Shoot,
    Break,
    Life,
    Win,
}

impl SoundCue {
    pub fn notes(self) -> &'static [Note] {
        match self {
            SoundCue::Jump => &JUMP_NOTES,
            SoundCue::Coin => &COIN_NOTES,
            SoundCue::Stomp => &STOMP_NOTES,
            SoundCue::Hit => &HIT_NOTES,
            SoundCue::Power => &POWER_NOTES,
            SoundCue::Shoot => &SHOOT_NOTES,
            SoundCue::Break => &BREAK_NOTES,
            SoundCue::Life => &LIFE_NOTES,
            SoundCue::Win => &WIN_NOTES,
        }
    }
}

/// Which cue a gameplay event voices, if any
fn cue_for(event: &str) -> Option<SoundCue> {
    match event {
        "player_jumped" => Some(SoundCue::Jump),
        "coin_collected" => Some(SoundCue::Coin),
        "enemy_stomped" | "enemy_shot" => Some(SoundCue::Stomp),
        "player_hit" => Some(SoundCue::Hit),
        "powerup_collected" | "powerup_spawned" | "pipe_warp" => Some(SoundCue::Power),
        "player_shot" => Some(SoundCue::Shoot),
        "block_broken" => Some(SoundCue::Break),
        "extra_life" => Some(SoundCue::Life),
        "flag_reached" => Some(SoundCue::Win),
        _ => None,
    }
}

#[derive(Clone, Serialize)]
pub struct CuePlay {
    pub frame: u64,
    pub cue: SoundCue,
    pub freq: f32,
    pub delay: f32,
    pub cached: bool,
}

#[derive(Clone, Copy, Default, Serialize)]
pub struct SoundStats {
    pub total_sounds: u64,
    pub cached_sounds: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

#[derive(Clone, Serialize)]
pub struct SoundSnapshot {
    pub total_sounds: u64,
    pub cached_sounds: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_size: usize,
    pub cache_hit_rate: f32,
    pub enabled: bool,
}

/// Cue playback ledger. The audible side lives with the platform; this keeps
/// the note cache, the recent-cue log and the cache statistics the debug
/// overlay shows.
#[derive(Resource)]
pub struct SoundBank {
    pub enabled: bool,
    pub volume: f32,
    cache: HashMap<String, u64>,
    next_seq: u64,
    pub recent: Vec<CuePlay>,
    pub stats: SoundStats,
}

impl Default for SoundBank {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: DEFAULT_VOLUME,
            cache: HashMap::new(),
            next_seq: 0,
            recent: Vec::new(),
            stats: SoundStats::default(),
        }
    }
}

impl SoundBank {
    pub fn play(&mut self, cue: SoundCue, frame: u64) {
        if !self.enabled {
            return;
        }
        for note in cue.notes() {
            let cached = self.touch_cache(note);
            self.recent.push(CuePlay {
                frame,
                cue,
                freq: note.freq,
                delay: note.delay,
                cached,
            });
        }
        if self.recent.len() > MAX_CUE_LOG {
            let excess = self.recent.len() - MAX_CUE_LOG;
            self.recent.drain(0..excess);
        }
    }

    fn touch_cache(&mut self, note: &Note) -> bool {
        let key = format!(
            "{}_{}_{:?}_{}",
            note.freq, note.dur, note.wave, note.volume
        );
        if self.cache.contains_key(&key) {
            self.stats.cache_hits += 1;
            return true;
        }
        self.stats.cache_misses += 1;
        self.cache.insert(key, self.next_seq);
        self.next_seq += 1;
        self.stats.cached_sounds += 1;
        self.stats.total_sounds += 1;
        if self.cache.len() > CACHE_CAPACITY {
            self.evict_oldest();
        }
        false
    }

    fn evict_oldest(&mut self) {
        let mut entries: Vec<(String, u64)> = self
            .cache
            .iter()
            .map(|(key, seq)| (key.clone(), *seq))
            .collect();
        entries.sort_by_key(|(_, seq)| *seq);
        for (key, _) in entries.into_iter().take(CACHE_EVICTION_BATCH) {
            self.cache.remove(&key);
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    /// Counters restart; the note cache itself stays warm
    pub fn reset_stats(&mut self) {
        self.stats = SoundStats::default();
    }

    pub fn snapshot(&self) -> SoundSnapshot {
        let attempts = self.stats.cache_hits + self.stats.cache_misses;
        SoundSnapshot {
            total_sounds: self.stats.total_sounds,
            cached_sounds: self.stats.cached_sounds,
            cache_hits: self.stats.cache_hits,
            cache_misses: self.stats.cache_misses,
            cache_size: self.cache.len(),
            cache_hit_rate: if attempts == 0 {
                0.0
            } else {
                self.stats.cache_hits as f32 / attempts as f32
            },
            enabled: self.enabled,
        }
    }
}

#[derive(Resource, Default)]
struct CueCursor {
    last_frame: u64,
}

pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SoundBank::default())
            .insert_resource(CueCursor::default())
            .add_systems(Update, voice_game_events);
    }
}

fn voice_game_events(
    mut bank: ResMut<SoundBank>,
    bus: Res<GameEventBus>,
    mut cursor: ResMut<CueCursor>,
) {
    let mut newest_frame = cursor.last_frame;
    for ev in bus.recent.iter().filter(|ev| ev.frame > cursor.last_frame) {
        newest_frame = newest_frame.max(ev.frame);
        if let Some(cue) = cue_for(&ev.name) {
            bank.play(cue, ev.frame);
        }
    }
    cursor.last_frame = newest_frame;
}

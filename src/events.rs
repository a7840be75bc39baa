use std::collections::VecDeque;

use bevy::prelude::*;
use serde::Serialize;

const MAX_EVENTS: usize = 500;

/// One gameplay occurrence, stamped with the simulation frame it happened on.
#[derive(Serialize, Clone)]
pub struct GameEvent {
    pub name: String,
    pub data: serde_json::Value,
    pub frame: u64,
}

/// Bounded in-memory log of recent gameplay events. Consumers (audio cues,
/// tests) read it with their own cursors; producers just emit.
#[derive(Resource, Default)]
pub struct GameEventBus {
    pub recent: VecDeque<GameEvent>,
    pub frame: u64,
    pub dropped_events: u64,
    last_overflow_log_frame: u64,
}

impl GameEventBus {
    pub fn emit(&mut self, name: impl Into<String>, data: serde_json::Value) {
        self.recent.push_back(GameEvent {
            name: name.into(),
            data,
            frame: self.frame,
        });
        if self.recent.len() > MAX_EVENTS {
            let excess = self.recent.len() - MAX_EVENTS;
            for _ in 0..excess {
                self.recent.pop_front();
            }
            self.dropped_events = self.dropped_events.saturating_add(excess as u64);
            if self.frame.saturating_sub(self.last_overflow_log_frame) >= 60 {
                self.last_overflow_log_frame = self.frame;
                warn!(
                    "[Jasim events] Dropped {} buffered events (total dropped: {})",
                    excess, self.dropped_events
                );
            }
        }
    }

    /// Most recent event with the given name, if still buffered
    pub fn last_named(&self, name: &str) -> Option<&GameEvent> {
        self.recent.iter().rev().find(|ev| ev.name == name)
    }
}

pub struct GameEventsPlugin;

impl Plugin for GameEventsPlugin {
    fn build(&self, app: &mut App) {
        // the frame advances before any producer runs, so every event emitted
        // during a tick carries that tick's number
        app.insert_resource(GameEventBus::default()).add_systems(
            FixedUpdate,
            tick_event_frame
                .before(crate::game_runtime::TickSet::Player)
                .run_if(crate::game_runtime::gameplay_active),
        );
    }
}

fn tick_event_frame(mut bus: ResMut<GameEventBus>) {
    bus.frame = bus.frame.saturating_add(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_bus_tracks_dropped_events() {
        let mut bus = GameEventBus::default();
        for i in 0..(MAX_EVENTS + 25) {
            bus.emit("test", serde_json::json!({ "i": i }));
        }
        assert_eq!(bus.recent.len(), MAX_EVENTS);
        assert!(bus.dropped_events >= 25);
    }

    #[test]
    fn events_carry_the_current_frame() {
        let mut bus = GameEventBus::default();
        bus.frame = 7;
        bus.emit("coin_collected", serde_json::json!({ "value": 5 }));
        let ev = bus.last_named("coin_collected").unwrap();
        assert_eq!(ev.frame, 7);
        assert!(bus.last_named("flag_reached").is_none());
    }
}

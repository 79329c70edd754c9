//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use silent_island_core::GameConfig;

/// Settings of the room layer, plus the rules of the game it hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Most participants a room accepts.
    pub capacity: usize,
    /// Notes each participant may send per game, replies included.
    pub note_quota: u32,
    /// Longest note, in characters.
    pub note_max_chars: usize,
    /// Milliseconds between removal and observer mode.
    pub observer_delay_ms: u64,
    /// Base URL used for join links.
    pub base_url: String,
    /// Rules of the hosted game.
    pub game: GameConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: 8,
            note_quota: 3,
            note_max_chars: 100,
            observer_delay_ms: 5_000,
            base_url: "http://localhost:8001".to_owned(),
            game: GameConfig::default(),
        }
    }
}

impl RoomConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the input is not a valid config object.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Delay before a removed participant becomes an observer.
    #[must_use]
    pub fn observer_delay(&self) -> Duration {
        Duration::from_millis(self.observer_delay_ms)
    }
}

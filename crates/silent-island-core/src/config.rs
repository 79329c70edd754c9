//! Engine configuration.
//!
//! [`GameConfig`] gathers the numeric thresholds the rules refer to. The
//! defaults are the canonical values of the game; alternative values are only
//! meant for tuning sessions and tests.

use serde::{Deserialize, Serialize};

/// Thresholds used by the settlement pipeline and role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Risk at or above which a participant is removed.
    pub removal_threshold: u32,
    /// Number of Comply votes that triggers majority pressure.
    pub majority_threshold: usize,
    /// Projected circulation at or above which Resist voters take +1 risk.
    pub circulation_alarm: u32,
    /// Pressure at or above which the Bystander cannot vote Resist.
    pub bystander_pressure_limit: u32,
    /// Fewest participants a game can start with.
    pub min_participants: usize,
    /// Most participants a game can start with.
    pub max_participants: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            removal_threshold: 10,
            majority_threshold: 5,
            circulation_alarm: 3,
            bystander_pressure_limit: 3,
            min_participants: 6,
            max_participants: 8,
        }
    }
}

impl GameConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the input is not a valid config object.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns true if `count` participants may start a game.
    #[must_use]
    pub fn accepts_participant_count(&self, count: usize) -> bool {
        (self.min_participants..=self.max_participants).contains(&count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_canonical_rules() {
        let config = GameConfig::default();
        assert_eq!(config.removal_threshold, 10);
        assert_eq!(config.majority_threshold, 5);
        assert_eq!(config.circulation_alarm, 3);
        assert_eq!(config.bystander_pressure_limit, 3);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = GameConfig::from_json_str(r#"{ "removal_threshold": 12 }"#).unwrap();
        assert_eq!(config.removal_threshold, 12);
        assert_eq!(config.majority_threshold, 5);
    }

    #[test]
    fn participant_count_bounds() {
        let config = GameConfig::default();
        assert!(!config.accepts_participant_count(5));
        assert!(config.accepts_participant_count(6));
        assert!(config.accepts_participant_count(8));
        assert!(!config.accepts_participant_count(9));
    }
}

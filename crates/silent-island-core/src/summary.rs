//! Read-only classification keys for round summaries.
//!
//! These never affect later rounds. They return keys; presentation layers
//! map keys to text.

use serde::{Deserialize, Serialize};

use crate::metrics::GlobalMetrics;
use crate::rules::ChoiceCategory;

/// Vote counts by category.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteTally {
    /// Comply votes.
    pub comply: usize,
    /// Evade votes.
    pub evade: usize,
    /// Resist votes.
    pub resist: usize,
}

impl VoteTally {
    /// Counts one vote.
    pub fn record(&mut self, category: ChoiceCategory) {
        match category {
            ChoiceCategory::Comply => self.comply += 1,
            ChoiceCategory::Evade => self.evade += 1,
            ChoiceCategory::Resist => self.resist += 1,
        }
    }

    /// Total votes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.comply + self.evade + self.resist
    }

    /// Mood of the vote distribution, or `None` when nobody voted.
    #[must_use]
    pub fn mood(&self) -> Option<SocialMood> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some(if self.comply == total {
            SocialMood::AllComply
        } else if self.resist == total {
            SocialMood::AllResist
        } else if self.comply * 2 > total {
            SocialMood::MajorityComply
        } else if self.resist * 2 > total {
            SocialMood::MajorityResist
        } else {
            SocialMood::Split
        })
    }
}

/// How the room voted, as a whole.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialMood {
    /// Everyone complied.
    AllComply,
    /// Everyone resisted.
    AllResist,
    /// More than half complied.
    MajorityComply,
    /// More than half resisted.
    MajorityResist,
    /// No majority.
    Split,
}

/// Band of a participant's risk.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskZone {
    /// Below 4.
    Safe,
    /// 4 to 6.
    Caution,
    /// 7 to 9.
    Danger,
    /// 10 and above.
    Taken,
}

impl RiskZone {
    /// Classifies a risk value.
    #[must_use]
    pub const fn of(risk: u32) -> Self {
        match risk {
            0..=3 => Self::Safe,
            4..=6 => Self::Caution,
            7..=9 => Self::Danger,
            _ => Self::Taken,
        }
    }
}

/// Warning level for risk 7, 8 or 9. Other values carry no warning.
#[must_use]
pub const fn risk_warning(risk: u32) -> Option<u8> {
    match risk {
        7 => Some(1),
        8 => Some(2),
        9 => Some(3),
        _ => None,
    }
}

/// How the streets feel at a given pressure.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreetMood {
    /// Pressure 0.
    Carefree,
    /// Pressure 1 or 2.
    Hurried,
    /// Pressure 3 or 4.
    Withdrawn,
    /// Pressure 5 or 6.
    Deserted,
    /// Pressure above 6.
    Lifeless,
}

/// How far dissent has spread.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Undercurrent {
    /// Circulation below 3.
    Still,
    /// Circulation 3 or 4.
    Whispers,
    /// Circulation 5 and above.
    Swelling,
}

/// Atmosphere keys derived from the current metrics.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atmosphere {
    /// Pressure band.
    pub street: StreetMood,
    /// Circulation band.
    pub undercurrent: Undercurrent,
}

impl Atmosphere {
    /// Derives the atmosphere from metrics.
    #[must_use]
    pub const fn of(metrics: GlobalMetrics) -> Self {
        let street = match metrics.pressure {
            0 => StreetMood::Carefree,
            1..=2 => StreetMood::Hurried,
            3..=4 => StreetMood::Withdrawn,
            5..=6 => StreetMood::Deserted,
            _ => StreetMood::Lifeless,
        };
        let undercurrent = match metrics.circulation {
            0..=2 => Undercurrent::Still,
            3..=4 => Undercurrent::Whispers,
            _ => Undercurrent::Swelling,
        };
        Self {
            street,
            undercurrent,
        }
    }
}

//! Immutable round tables.
//!
//! Every round is described by a [`RoundRule`]. Voting rounds carry a table
//! mapping each choice key to its category, base effect, moral mark and
//! optional deferred consequence. The settlement pipeline is a single loop
//! over the current round's table; there is no per-round code.
//!
//! | round | choices (Comply / Evade / Resist) |
//! |------:|-----------------------------------|
//! | 1 | comply / evade / resist |
//! | 2 | comfort / silence / info |
//! | 3 | avoid, warn, report (no Comply choice) |
//! | 4 | cooperate / vague / refuse |
//! | 5 | deferred settlement, no vote |
//! | 6 | accept / delay / refuse |

use serde::{Deserialize, Serialize};

use crate::deferred::DeferredKind;

/// Index of the final round.
pub const FINAL_ROUND: u8 = 6;

/// Semantic category of a choice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceCategory {
    /// Going along with authority. Counts toward majority pressure.
    Comply,
    /// Avoiding commitment. The timeout default.
    Evade,
    /// Defiance. Drives role passives and risk amplifiers.
    Resist,
}

/// Permanent mark a choice leaves on the voter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoralMark {
    /// No mark.
    None,
    /// Sets the moral-cost flag.
    Cost,
    /// Sets the moral-collapse flag.
    Collapse,
}

/// Base effect of a single vote.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChoiceEffect {
    /// Pressure delta.
    pub pressure: i32,
    /// Circulation delta.
    pub circulation: i32,
    /// Risk delta applied to the voter.
    pub risk: i32,
}

/// A deferred consequence generated by a choice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeferredSpec {
    /// Kind of record appended to the voter's ledger.
    pub kind: DeferredKind,
    /// Whether the foreshadow-suppressing ability prevents the record.
    pub suppressible: bool,
}

/// One row of a round table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChoiceRule {
    /// Wire key of the choice.
    pub key: &'static str,
    /// Category of the choice.
    pub category: ChoiceCategory,
    /// Base effect applied in settlement step 1.
    pub effect: ChoiceEffect,
    /// Moral mark set on the voter.
    pub mark: MoralMark,
    /// Deferred consequence, if any.
    pub deferred: Option<DeferredSpec>,
}

impl ChoiceRule {
    const fn new(key: &'static str, category: ChoiceCategory, p: i32, c: i32, r: i32) -> Self {
        Self {
            key,
            category,
            effect: ChoiceEffect {
                pressure: p,
                circulation: c,
                risk: r,
            },
            mark: MoralMark::None,
            deferred: None,
        }
    }

    const fn marked(mut self, mark: MoralMark) -> Self {
        self.mark = mark;
        self
    }

    const fn deferring(mut self, kind: DeferredKind, suppressible: bool) -> Self {
        self.deferred = Some(DeferredSpec { kind, suppressible });
        self
    }
}

/// What happens in a round.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "choices")]
pub enum RoundKind {
    /// Participants vote among the listed choices.
    Voting(&'static [ChoiceRule]),
    /// No vote; the deferred-consequence ledger settles.
    DeferredSettlement,
}

/// Fixed definition of a round.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct RoundRule {
    /// Round number, starting at 1.
    pub number: u8,
    /// Voting table or deferred settlement.
    pub kind: RoundKind,
}

impl RoundRule {
    /// Returns the choice table, empty for the deferred round.
    #[must_use]
    pub fn choices(&self) -> &'static [ChoiceRule] {
        match self.kind {
            RoundKind::Voting(choices) => choices,
            RoundKind::DeferredSettlement => &[],
        }
    }

    /// Looks up a choice by key.
    #[must_use]
    pub fn choice(&self, key: &str) -> Option<&'static ChoiceRule> {
        self.choices().iter().find(|c| c.key == key)
    }

    /// The designated Evade choice used when a vote times out.
    #[must_use]
    pub fn evade_choice(&self) -> Option<&'static ChoiceRule> {
        self.choices()
            .iter()
            .find(|c| c.category == ChoiceCategory::Evade)
    }

    /// Returns true for the deferred settlement round.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self.kind, RoundKind::DeferredSettlement)
    }
}

use ChoiceCategory::{Comply, Evade, Resist};

const ROUND_1: [ChoiceRule; 3] = [
    ChoiceRule::new("comply", Comply, 1, 0, 0),
    ChoiceRule::new("evade", Evade, 0, 0, 0).deferring(DeferredKind::Ambiguous, true),
    ChoiceRule::new("resist", Resist, 0, 1, 1),
];

const ROUND_2: [ChoiceRule; 3] = [
    ChoiceRule::new("comfort", Comply, -1, 0, 0),
    ChoiceRule::new("silence", Evade, 0, 0, 0).deferring(DeferredKind::Silent, false),
    ChoiceRule::new("info", Resist, 0, 0, -1).marked(MoralMark::Cost),
];

const ROUND_3: [ChoiceRule; 3] = [
    ChoiceRule::new("avoid", Evade, 0, 0, -1),
    ChoiceRule::new("warn", Resist, 0, 1, 1),
    ChoiceRule::new("report", Resist, 0, -1, -1).marked(MoralMark::Cost),
];

const ROUND_4: [ChoiceRule; 3] = [
    ChoiceRule::new("cooperate", Comply, 1, 0, 0),
    ChoiceRule::new("vague", Evade, 0, 0, 0).deferring(DeferredKind::Ambiguous, true),
    ChoiceRule::new("refuse", Resist, 0, 0, 2),
];

const ROUND_6: [ChoiceRule; 3] = [
    ChoiceRule::new("accept", Comply, 2, 0, -2).marked(MoralMark::Collapse),
    ChoiceRule::new("delay", Evade, 0, 0, 0),
    ChoiceRule::new("refuse", Resist, 0, 1, 2),
];

/// The six rounds, in order.
pub const ROUNDS: [RoundRule; FINAL_ROUND as usize] = [
    RoundRule {
        number: 1,
        kind: RoundKind::Voting(&ROUND_1),
    },
    RoundRule {
        number: 2,
        kind: RoundKind::Voting(&ROUND_2),
    },
    RoundRule {
        number: 3,
        kind: RoundKind::Voting(&ROUND_3),
    },
    RoundRule {
        number: 4,
        kind: RoundKind::Voting(&ROUND_4),
    },
    RoundRule {
        number: 5,
        kind: RoundKind::DeferredSettlement,
    },
    RoundRule {
        number: 6,
        kind: RoundKind::Voting(&ROUND_6),
    },
];

/// Returns the rule for `round`, or `None` outside `1..=6`.
#[must_use]
pub fn round_rule(round: u8) -> Option<&'static RoundRule> {
    let index = usize::from(round.checked_sub(1)?);
    ROUNDS.get(index)
}

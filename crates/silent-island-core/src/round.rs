//! Per-round state.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::ability::AbilityActivation;
use crate::participant::ParticipantId;

/// Phase of the game, set by the external driver.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Lobby, before the first round.
    #[default]
    Waiting,
    /// A round's event is on screen.
    EventShown,
    /// Silent reflection.
    Hushed,
    /// Open discussion.
    Discussion,
    /// Votes are being collected.
    Voting,
    /// The round is being settled.
    Settling,
    /// The deferred round settles without votes.
    AutoSettling,
    /// The ending has been determined.
    Ended,
}

bitflags! {
    /// Flags raised by abilities, cleared when the next round opens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct RoundFlags: u8 {
        /// Resist voters take +1 risk.
        const PUBLIC_VOTING = 1 << 0;
        /// One unit of positive pressure delta is cancelled.
        const CANCEL_PRESSURE = 1 << 1;
        /// The majority rule adds no pressure.
        const CANCEL_MAJORITY = 1 << 2;
    }
}

/// Round number, phase, and what happened in the round so far.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoundState {
    /// Current round, 0 before the first round opens.
    pub number: u8,
    /// Current phase.
    pub phase: Phase,
    pub(crate) votes: BTreeMap<ParticipantId, &'static str>,
    pub(crate) activations: Vec<AbilityActivation>,
    pub(crate) flags: RoundFlags,
    pub(crate) settled: bool,
}

impl RoundState {
    /// Votes cast this round.
    #[must_use]
    pub fn votes(&self) -> &BTreeMap<ParticipantId, &'static str> {
        &self.votes
    }

    /// Activations this round, in insertion order.
    #[must_use]
    pub fn activations(&self) -> &[AbilityActivation] {
        &self.activations
    }

    /// Flags raised this round.
    #[must_use]
    pub fn flags(&self) -> RoundFlags {
        self.flags
    }

    /// True once this round has been settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Returns the activation recorded for `participant`, if any.
    #[must_use]
    pub fn activation_of(&self, participant: ParticipantId) -> Option<&AbilityActivation> {
        self.activations.iter().find(|a| a.participant == participant)
    }

    /// Moves to `number` and clears everything round-scoped.
    pub(crate) fn open(&mut self, number: u8, phase: Phase) {
        self.number = number;
        self.phase = phase;
        self.votes.clear();
        self.activations.clear();
        self.flags = RoundFlags::empty();
        self.settled = false;
    }
}

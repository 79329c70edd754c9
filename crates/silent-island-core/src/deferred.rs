//! Deferred consequence ledger.
//!
//! Evasive choices in early rounds leave a record on the voter. The records
//! stay attached to the participant for the whole game; the deferred round
//! reads them once and turns them into pressure and risk.
//!
//! # Resolution
//!
//! For every participant, in join order, and every record, oldest first:
//!
//! 1. `Silent` adds [`SILENT_PRESSURE`] to the pressure delta.
//! 2. `Ambiguous` adds [`AMBIGUOUS_RISK`] to the owner's risk delta and flips
//!    a coin; [`CoinFace::Heads`] adds a further [`HEADS_EXTRA_RISK`].
//!
//! Finally, half the number of participants holding any record (rounded
//! down) is added to pressure as a collective cost.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::participant::ParticipantId;
use crate::registry::ParticipantRegistry;
use crate::rng::{CoinFace, RandomSource};

/// Pressure added by each silent record.
pub const SILENT_PRESSURE: i32 = 2;

/// Risk added to the owner of each ambiguous record.
pub const AMBIGUOUS_RISK: i32 = 5;

/// Extra risk added when the coin lands heads.
pub const HEADS_EXTRA_RISK: i32 = 10;

/// Kind of deferred debt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferredKind {
    /// Keeping quiet. Costs the collective.
    Silent,
    /// Staying vague. Costs the owner, with a gamble.
    Ambiguous,
}

/// A debt recorded against a participant. Never mutated after creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeferredRecord {
    /// Participant who made the evasive choice.
    pub owner: ParticipantId,
    /// Kind of debt.
    pub kind: DeferredKind,
    /// Round that produced the record.
    pub round: u8,
}

impl DeferredRecord {
    /// Creates a record.
    #[must_use]
    pub const fn new(owner: ParticipantId, kind: DeferredKind, round: u8) -> Self {
        Self { owner, kind, round }
    }
}

/// One coin flip made for an ambiguous record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinFlipOutcome {
    /// Round that produced the flipped record.
    pub round: u8,
    /// Face that came up.
    pub face: CoinFace,
    /// Additional risk caused by the flip.
    pub extra_risk: u32,
}

/// Per-participant outcome of the deferred round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeferredOutcome {
    /// Participant.
    pub participant: ParticipantId,
    /// Risk delta computed before clamping.
    pub risk_delta: i32,
    /// Risk after commit.
    pub risk: u32,
    /// True if the participant held at least one record.
    pub held_records: bool,
    /// Coin flips in record order.
    pub coin_flips: Vec<CoinFlipOutcome>,
    /// Every record the participant holds, for display.
    pub records: Vec<DeferredRecord>,
}

/// Result of settling the deferred round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeferredResult {
    /// Round number (always the deferred round).
    pub round: u8,
    /// Total pressure delta, collective cost included.
    pub pressure_delta: i32,
    /// Participants holding any record.
    pub holders: usize,
    /// Pressure added by the collective cost.
    pub collective_cost: i32,
    /// Pressure after commit.
    pub pressure: u32,
    /// Circulation after commit (unchanged by this round).
    pub circulation: u32,
    /// Participants removed by this settlement, in join order.
    pub removed: Vec<ParticipantId>,
    /// Outcomes in join order.
    pub outcomes: Vec<DeferredOutcome>,
}

/// Deltas produced by reading the ledger, before commit.
#[derive(Debug, Default)]
pub(crate) struct LedgerDeltas {
    pub pressure: i32,
    pub holders: usize,
    pub collective_cost: i32,
    pub risk: BTreeMap<ParticipantId, i32>,
    pub flips: BTreeMap<ParticipantId, Vec<CoinFlipOutcome>>,
}

/// Reads every record and computes the deltas. Does not mutate the registry.
pub(crate) fn compute_ledger<R: RandomSource>(
    registry: &ParticipantRegistry,
    rng: &mut R,
) -> LedgerDeltas {
    let mut deltas = LedgerDeltas::default();

    for participant in registry.iter() {
        let records = participant.deferred();
        if records.is_empty() {
            continue;
        }
        deltas.holders += 1;

        for record in records {
            match record.kind {
                DeferredKind::Silent => deltas.pressure += SILENT_PRESSURE,
                DeferredKind::Ambiguous => {
                    let face = rng.coin_flip();
                    let extra = match face {
                        CoinFace::Heads => HEADS_EXTRA_RISK,
                        CoinFace::Tails => 0,
                    };
                    *deltas.risk.entry(participant.id()).or_insert(0) += AMBIGUOUS_RISK + extra;
                    deltas
                        .flips
                        .entry(participant.id())
                        .or_default()
                        .push(CoinFlipOutcome {
                            round: record.round,
                            face,
                            extra_risk: extra.unsigned_abs(),
                        });
                }
            }
        }
    }

    deltas.collective_cost = i32::try_from(deltas.holders / 2).unwrap_or(i32::MAX);
    deltas.pressure += deltas.collective_cost;
    deltas
}

//! # Silent Island Core
//!
//! Rules and settlement engine for Silent Island, a moderator-led,
//! round-based social simulation for six to eight participants.
//!
//! Each round presents a choice and collects concealed votes. Settlement
//! turns the votes, role passives and one-shot abilities into changes to two
//! shared metrics (pressure and circulation) and to each participant's risk.
//! Evasive choices leave deferred records that come due in round 5, and the
//! final metrics and flags decide the endings.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **Rule tables** ([`rules`]): immutable per-round choice tables
//! - **Registry** ([`registry`], [`participant`]): per-participant play state
//! - **Round state** ([`round`]): phase, votes, activations, round flags
//! - **Abilities** ([`ability`]): the seven one-shot role abilities
//! - **Settlement** ([`settlement`]): the ordered nine-step pipeline
//! - **Deferred ledger** ([`deferred`]): the once-per-game debt settlement
//! - **Endings** ([`ending`]): social and personal classification
//!
//! [`engine::GameEngine`] owns all of it and is the only mutation surface.
//!
//! ## Determinism
//!
//! Participants are stored in a `BTreeMap` keyed by join-ordered ids, and the
//! only random draws (role shuffle, deferred coin flips) go through
//! [`rng::RandomSource`]. The same seed and the same calls replay the same game.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use silent_island_core::{GameEngine, Phase};
//!
//! let mut engine = GameEngine::seeded(42);
//! // add participants, assign roles, then per round:
//! engine.advance_round()?;
//! engine.set_phase(Phase::Voting)?;
//! // forward votes and abilities
//! engine.auto_fill_timeouts();
//! let result = engine.settle_round()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ability;
pub mod config;
pub mod deferred;
pub mod ending;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod participant;
pub mod registry;
pub mod rng;
pub mod round;
pub mod rules;
pub mod settlement;
pub mod summary;

#[cfg(test)]
mod tests;

pub use ability::{AbilityKind, AbilityReceipt};
pub use config::GameConfig;
pub use deferred::{DeferredKind, DeferredResult};
pub use ending::{EndingResult, PersonalEnding, SocialEnding};
pub use engine::{ChoiceOption, GameEngine, HostView, RoundOpening};
pub use error::{EngineError, ErrorSeverity, IllegalState, Rejection};
pub use metrics::GlobalMetrics;
pub use participant::{Participant, ParticipantId, Role};
pub use rng::{CoinFace, RandomSource, SeededRandom};
pub use round::Phase;
pub use settlement::{RoundResult, SettlementNote};

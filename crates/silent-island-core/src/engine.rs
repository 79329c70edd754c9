//! The game engine.
//!
//! [`GameEngine`] owns every piece of state of one game and exposes the
//! operations an external driver calls. It never starts timers or performs
//! I/O; the driver sets phases, forwards requests and triggers settlement.
//!
//! # Example
//!
//! ```
//! use silent_island_core::engine::GameEngine;
//! use silent_island_core::round::Phase;
//!
//! let mut engine = GameEngine::seeded(7);
//! let ids: Vec<_> = (0..6).map(|i| engine.add_participant(format!("P{i}"))).collect();
//! engine.assign_roles().unwrap();
//!
//! engine.advance_round().unwrap();
//! engine.set_phase(Phase::Voting).unwrap();
//! for id in &ids {
//!     engine.submit_vote(*id, "comply").unwrap();
//! }
//! let result = engine.settle_round().unwrap();
//! assert!(result.majority_triggered);
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::ability::{AbilityActivation, AbilityKind, AbilityReceipt};
use crate::config::GameConfig;
use crate::deferred::{compute_ledger, DeferredOutcome, DeferredResult};
use crate::ending::{classify_personal, classify_social, EndingResult, PersonalOutcome};
use crate::error::{EngineResult, IllegalState, Rejection};
use crate::metrics::GlobalMetrics;
use crate::participant::{Participant, ParticipantFlags, ParticipantId, Role};
use crate::registry::ParticipantRegistry;
use crate::rng::{RandomSource, SeededRandom};
use crate::round::{Phase, RoundFlags, RoundState};
use crate::rules::{round_rule, ChoiceCategory, ChoiceRule, RoundRule};
use crate::settlement::{self, RoundResult};

// =============================================================================
// Views
// =============================================================================

/// Returned when a round opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundOpening {
    /// Round number.
    pub round: u8,
    /// Phase the round opened in.
    pub phase: Phase,
    /// True for the deferred settlement round.
    pub deferred: bool,
    /// Choices on offer, empty for the deferred round.
    pub choices: &'static [ChoiceRule],
}

/// A choice as offered to one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    /// Choice key.
    pub key: &'static str,
    /// Category.
    pub category: ChoiceCategory,
    /// True if the participant's role forbids this choice right now.
    pub disabled: bool,
}

/// Full moderator snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct HostView {
    /// Current round.
    pub round: u8,
    /// Current phase.
    pub phase: Phase,
    /// Current metrics.
    pub metrics: GlobalMetrics,
    /// Flags raised this round.
    pub flags: RoundFlags,
    /// Votes cast this round.
    pub votes: BTreeMap<ParticipantId, &'static str>,
    /// Activations this round.
    pub activations: Vec<AbilityActivation>,
    /// Every participant, in join order.
    pub participants: Vec<Participant>,
}

// =============================================================================
// GameEngine
// =============================================================================

/// Rules and settlement engine for one game.
///
/// Mutating operations take `&mut self`; callers serialize access per game.
#[derive(Debug)]
pub struct GameEngine<R: RandomSource = SeededRandom> {
    config: GameConfig,
    registry: ParticipantRegistry,
    metrics: GlobalMetrics,
    round: RoundState,
    roles_assigned: bool,
    rng: R,
}

impl GameEngine<SeededRandom> {
    /// Creates an engine with default rules and a seeded random source.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(GameConfig::default(), SeededRandom::new(seed))
    }
}

impl<R: RandomSource> GameEngine<R> {
    /// Creates an engine with explicit configuration and random source.
    #[must_use]
    pub fn new(config: GameConfig, rng: R) -> Self {
        Self {
            config,
            registry: ParticipantRegistry::new(),
            metrics: GlobalMetrics::default(),
            round: RoundState::default(),
            roles_assigned: false,
            rng,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Returns the current metrics.
    #[must_use]
    pub fn metrics(&self) -> GlobalMetrics {
        self.metrics
    }

    /// Returns the round state.
    #[must_use]
    pub fn round(&self) -> &RoundState {
        &self.round
    }

    /// Returns the participant registry.
    #[must_use]
    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    /// Returns one participant.
    #[must_use]
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.registry.get(id)
    }

    /// Returns true once roles have been dealt.
    #[must_use]
    pub fn roles_assigned(&self) -> bool {
        self.roles_assigned
    }

    /// Returns true once the ending has been determined.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.round.phase == Phase::Ended
    }

    #[cfg(test)]
    pub(crate) fn metrics_mut(&mut self) -> &mut GlobalMetrics {
        &mut self.metrics
    }

    fn current_rule(&self) -> Option<&'static RoundRule> {
        round_rule(self.round.number)
    }

    // -------------------------------------------------------------------------
    // Lobby
    // -------------------------------------------------------------------------

    /// Registers a participant and returns its id.
    pub fn add_participant(&mut self, name: impl Into<String>) -> ParticipantId {
        let id = self.registry.join(name);
        debug!(participant = %id, "participant joined");
        id
    }

    /// Marks a participant connected or disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::UnknownParticipant`] for an unregistered id.
    pub fn set_connected(&mut self, id: ParticipantId, connected: bool) -> Result<(), Rejection> {
        let participant = self
            .registry
            .get_mut(id)
            .ok_or(Rejection::UnknownParticipant(id))?;
        participant.set_connected(connected);
        debug!(participant = %id, connected, "connection changed");
        Ok(())
    }

    /// Deals roles to every participant.
    ///
    /// The pool holds A to D, plus E and F from seven participants and G at
    /// eight, padded with E. It is shuffled once and dealt in join order.
    ///
    /// # Errors
    ///
    /// Fails if roles were already dealt or the participant count is outside
    /// the configured range.
    pub fn assign_roles(&mut self) -> EngineResult<BTreeMap<ParticipantId, Role>> {
        if self.roles_assigned {
            return Err(IllegalState::RolesAlreadyAssigned.into());
        }
        let count = self.registry.len();
        if !self.config.accepts_participant_count(count) {
            return Err(IllegalState::ParticipantCount(count).into());
        }

        let mut pool = role_pool(count);
        self.rng.shuffle(&mut pool);

        let mut dealt = BTreeMap::new();
        for (participant, role) in self.registry.iter_mut().zip(pool) {
            participant.assign_role(role);
            dealt.insert(participant.id(), role);
        }
        self.roles_assigned = true;
        info!(participants = count, "roles assigned");
        Ok(dealt)
    }

    // -------------------------------------------------------------------------
    // Round flow
    // -------------------------------------------------------------------------

    /// Opens the next round and clears all round-scoped state.
    ///
    /// # Errors
    ///
    /// Fails before roles are dealt, after the final round, or once the
    /// game has ended.
    pub fn advance_round(&mut self) -> EngineResult<RoundOpening> {
        if self.is_ended() {
            return Err(IllegalState::Ended.into());
        }
        if !self.roles_assigned {
            return Err(IllegalState::RolesUnassigned.into());
        }
        let next = self.round.number + 1;
        let rule = round_rule(next).ok_or(IllegalState::NoRoundsLeft)?;

        let phase = if rule.is_deferred() {
            Phase::AutoSettling
        } else {
            Phase::EventShown
        };
        self.round.open(next, phase);
        info!(round = next, ?phase, "round opened");

        Ok(RoundOpening {
            round: next,
            phase,
            deferred: rule.is_deferred(),
            choices: rule.choices(),
        })
    }

    /// Sets the phase on behalf of the external driver.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalState::Ended`] once the ending is determined.
    pub fn set_phase(&mut self, phase: Phase) -> Result<(), IllegalState> {
        if self.is_ended() {
            return Err(IllegalState::Ended);
        }
        debug!(round = self.round.number, ?phase, "phase set");
        self.round.phase = phase;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Votes
    // -------------------------------------------------------------------------

    fn is_restricted(&self, participant: &Participant, choice: &ChoiceRule) -> bool {
        choice.category == ChoiceCategory::Resist
            && participant.role().is_some_and(Role::silenced_under_pressure)
            && self.metrics.pressure >= self.config.bystander_pressure_limit
    }

    /// Returns the current round's choices as offered to `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::UnknownParticipant`] for an unregistered id.
    pub fn choices_for(&self, id: ParticipantId) -> Result<Vec<ChoiceOption>, Rejection> {
        let participant = self
            .registry
            .get(id)
            .ok_or(Rejection::UnknownParticipant(id))?;
        let choices = self.current_rule().map_or(&[][..], RoundRule::choices);
        Ok(choices
            .iter()
            .map(|c| ChoiceOption {
                key: c.key,
                category: c.category,
                disabled: self.is_restricted(participant, c),
            })
            .collect())
    }

    /// Records a vote.
    ///
    /// # Errors
    ///
    /// Checks run in order and the first failure is returned: phase is not
    /// voting, already voted, unknown participant, removed, invalid choice,
    /// restricted category. Nothing changes on failure.
    pub fn submit_vote(&mut self, id: ParticipantId, key: &str) -> Result<(), Rejection> {
        if self.round.phase != Phase::Voting {
            return Err(Rejection::WrongPhase(self.round.phase));
        }
        if self.round.votes.contains_key(&id) {
            return Err(Rejection::AlreadyVoted(id));
        }
        let participant = self
            .registry
            .get(id)
            .ok_or(Rejection::UnknownParticipant(id))?;
        if participant.is_removed() {
            return Err(Rejection::Removed(id));
        }
        let choice = self
            .current_rule()
            .and_then(|rule| rule.choice(key))
            .ok_or_else(|| Rejection::InvalidChoice(key.to_owned()))?;
        if self.is_restricted(participant, choice) {
            return Err(Rejection::RestrictedCategory(id, key.to_owned()));
        }

        self.record_vote(id, choice.key);
        debug!(participant = %id, round = self.round.number, "vote accepted");
        Ok(())
    }

    fn record_vote(&mut self, id: ParticipantId, key: &'static str) {
        self.round.votes.insert(id, key);
        if let Some(participant) = self.registry.get_mut(id) {
            participant.record_choice(self.round.number, key);
        }
    }

    /// Returns true if every connected, non-removed participant has voted.
    #[must_use]
    pub fn all_voted(&self) -> bool {
        self.registry
            .iter()
            .filter(|p| p.is_active())
            .all(|p| self.round.votes.contains_key(&p.id()))
    }

    /// Assigns the round's evade choice to every connected, non-removed
    /// participant who has not voted. Returns the filled ids in join order.
    ///
    /// Calling it again fills nobody.
    pub fn auto_fill_timeouts(&mut self) -> Vec<ParticipantId> {
        let Some(evade) = self.current_rule().and_then(RoundRule::evade_choice) else {
            return Vec::new();
        };
        let missing: Vec<ParticipantId> = self
            .registry
            .iter()
            .filter(|p| p.is_active() && !self.round.votes.contains_key(&p.id()))
            .map(Participant::id)
            .collect();
        for &id in &missing {
            self.record_vote(id, evade.key);
        }
        if !missing.is_empty() {
            debug!(count = missing.len(), choice = evade.key, "timed-out votes filled");
        }
        missing
    }

    // -------------------------------------------------------------------------
    // Abilities
    // -------------------------------------------------------------------------

    /// Activates the participant's one-shot ability.
    ///
    /// # Errors
    ///
    /// Checks run in order and the first failure is returned: unknown
    /// participant, ability already used, role unassigned, removed, missing
    /// or unknown target (for the two targeted roles). Nothing changes on
    /// failure.
    pub fn activate_ability(
        &mut self,
        id: ParticipantId,
        target: Option<ParticipantId>,
    ) -> Result<AbilityReceipt, Rejection> {
        let participant = self
            .registry
            .get(id)
            .ok_or(Rejection::UnknownParticipant(id))?;
        if participant.ability_used() {
            return Err(Rejection::AbilityAlreadyUsed(id));
        }
        let role = participant.role().ok_or(Rejection::RoleUnassigned(id))?;
        if participant.is_removed() {
            return Err(Rejection::Removed(id));
        }
        let target = target.filter(|t| self.registry.contains(*t));
        let kind = AbilityKind::for_role(role, target).ok_or(Rejection::TargetRequired)?;

        if let Some(participant) = self.registry.get_mut(id) {
            participant.mark(ParticipantFlags::ABILITY_USED);
        }
        self.round.flags.insert(kind.round_flag());
        self.round.activations.push(AbilityActivation {
            participant: id,
            kind,
        });
        debug!(participant = %id, ?kind, round = self.round.number, "ability activated");

        Ok(AbilityReceipt {
            participant: id,
            kind,
            broadcast: role,
        })
    }

    // -------------------------------------------------------------------------
    // Settlement
    // -------------------------------------------------------------------------

    /// Settles the current voting round.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalState`] before the first round, after the ending, on
    /// the deferred round, or when the round was already settled.
    pub fn settle_round(&mut self) -> EngineResult<RoundResult> {
        let rule = self.settleable_rule()?;
        if rule.is_deferred() {
            return Err(IllegalState::WrongRound(self.round.number).into());
        }

        self.round.phase = Phase::Settling;
        self.round.settled = true;
        let result = settlement::settle(
            rule,
            &self.round,
            &mut self.registry,
            &mut self.metrics,
            &self.config,
        );
        info!(
            round = result.round,
            pressure = result.pressure,
            circulation = result.circulation,
            pressure_delta = result.pressure_delta,
            circulation_delta = result.circulation_delta,
            removed = result.removed.len(),
            "round settled"
        );
        Ok(result)
    }

    /// Settles the deferred round from the accumulated records.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalState`] outside the deferred round, after the ending,
    /// or when it already ran.
    pub fn settle_deferred(&mut self) -> EngineResult<DeferredResult> {
        let rule = self.settleable_rule()?;
        if !rule.is_deferred() {
            return Err(IllegalState::WrongRound(self.round.number).into());
        }

        self.round.phase = Phase::Settling;
        self.round.settled = true;
        let mut deltas = compute_ledger(&self.registry, &mut self.rng);
        let removed = settlement::commit(
            &mut self.registry,
            &mut self.metrics,
            deltas.pressure,
            0,
            &deltas.risk,
            self.config.removal_threshold,
        );

        let outcomes = self
            .registry
            .iter()
            .map(|p| DeferredOutcome {
                participant: p.id(),
                risk_delta: deltas.risk.get(&p.id()).copied().unwrap_or(0),
                risk: p.risk(),
                held_records: !p.deferred().is_empty(),
                coin_flips: deltas.flips.remove(&p.id()).unwrap_or_default(),
                records: p.deferred().to_vec(),
            })
            .collect();

        info!(
            holders = deltas.holders,
            pressure_delta = deltas.pressure,
            pressure = self.metrics.pressure,
            removed = removed.len(),
            "deferred round settled"
        );
        Ok(DeferredResult {
            round: self.round.number,
            pressure_delta: deltas.pressure,
            holders: deltas.holders,
            collective_cost: deltas.collective_cost,
            pressure: self.metrics.pressure,
            circulation: self.metrics.circulation,
            removed,
            outcomes,
        })
    }

    fn settleable_rule(&self) -> Result<&'static RoundRule, IllegalState> {
        if self.is_ended() {
            return Err(IllegalState::Ended);
        }
        let rule = self.current_rule().ok_or(IllegalState::NotStarted)?;
        if self.round.settled {
            return Err(IllegalState::AlreadySettled(self.round.number));
        }
        Ok(rule)
    }

    /// Classifies the social and personal endings and ends the game.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalState`] before the first round or when the ending was
    /// already determined.
    pub fn determine_ending(&mut self) -> EngineResult<EndingResult> {
        if self.is_ended() {
            return Err(IllegalState::Ended.into());
        }
        if self.round.number == 0 {
            return Err(IllegalState::NotStarted.into());
        }

        let social = classify_social(self.metrics);
        let personal = self
            .registry
            .iter()
            .map(|p| PersonalOutcome {
                participant: p.id(),
                name: p.name().to_owned(),
                role: p.role(),
                risk: p.risk(),
                ending: classify_personal(p),
            })
            .collect();
        self.round.phase = Phase::Ended;
        info!(?social, round = self.round.number, "game ended");

        Ok(EndingResult {
            social,
            metrics: self.metrics,
            personal,
        })
    }

    // -------------------------------------------------------------------------
    // Queries and observers
    // -------------------------------------------------------------------------

    /// Full-state snapshot for the moderator.
    #[must_use]
    pub fn host_view(&self) -> HostView {
        HostView {
            round: self.round.number,
            phase: self.round.phase,
            metrics: self.metrics,
            flags: self.round.flags(),
            votes: self.round.votes().clone(),
            activations: self.round.activations().to_vec(),
            participants: self.registry.iter().cloned().collect(),
        }
    }

    /// Moves a removed participant into observer mode.
    ///
    /// Returns false for unknown, non-removed or already observing ids.
    pub fn transition_to_observer(&mut self, id: ParticipantId) -> bool {
        let entered = self
            .registry
            .get_mut(id)
            .is_some_and(Participant::enter_observer);
        if entered {
            debug!(participant = %id, "observer mode");
        }
        entered
    }
}

/// Roles dealt for `count` participants, before shuffling.
fn role_pool(count: usize) -> Vec<Role> {
    let mut pool = vec![
        Role::Teacher,
        Role::CivilServant,
        Role::Student,
        Role::Bystander,
    ];
    if count >= 7 {
        pool.extend([Role::Citizen, Role::Enforcer]);
    }
    if count >= 8 {
        pool.push(Role::Relative);
    }
    while pool.len() < count {
        pool.push(Role::Citizen);
    }
    pool
}

//! Round settlement pipeline.
//!
//! Turns the votes and ability activations of one round into metric and
//! risk deltas, commits them and reports the result.
//!
//! # Processing Order
//!
//! 1. Base effect of every vote, moral marks, deferred records
//! 2. Role passives for every connected participant
//! 3. Resist amplifiers: public voting, then the circulation alarm
//! 4. Majority pressure when enough votes comply
//! 5. Flat cancellation of one unit of positive pressure
//! 6. Ability transfers: risk to pressure, shouldered risk, sheltered risk
//! 7. Commit with clamping
//! 8. Removal check
//! 9. Summary assembly
//!
//! Later stages read the deltas accumulated by earlier ones, so the order is
//! part of the rules. Steps 1 to 6 only touch the local [`Pipeline`] deltas
//! (plus the set-once marks and records of step 1); nothing reaches the
//! metrics or the risk values before step 7.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ability::AbilityKind;
use crate::config::GameConfig;
use crate::deferred::{DeferredKind, DeferredRecord};
use crate::metrics::GlobalMetrics;
use crate::participant::{ParticipantFlags, ParticipantId};
use crate::registry::ParticipantRegistry;
use crate::round::{RoundFlags, RoundState};
use crate::rules::{ChoiceCategory, ChoiceRule, MoralMark, RoundRule};
use crate::summary::{risk_warning, Atmosphere, RiskZone, SocialMood, VoteTally};

/// Something that happened to a participant during settlement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "note")]
pub enum SettlementNote {
    /// A deferred record was added.
    ForeshadowRecorded {
        /// Kind of the new record.
        kind: DeferredKind,
    },
    /// The holder's ability prevented a deferred record.
    ForeshadowSuppressed,
    /// The moral-cost mark was set.
    MoralCost,
    /// The moral-collapse mark was set.
    MoralCollapse,
    /// The role's flat pressure passive fired.
    PassivePressure,
    /// The role's resist penalty fired.
    ResistPenalty,
    /// Public voting cost a resister +1 risk.
    PublicScrutiny,
    /// High circulation cost a resister +1 risk.
    CirculationAlarm,
    /// One unit of own risk became pressure.
    RiskConverted,
    /// One unit of the target's risk was taken on.
    ShoulderedRisk {
        /// Participant relieved.
        target: ParticipantId,
    },
    /// One unit of the target's risk became pressure.
    ShelteredRisk {
        /// Participant relieved.
        target: ParticipantId,
    },
}

/// Per-participant outcome of a settled round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantOutcome {
    /// Participant.
    pub participant: ParticipantId,
    /// Choice key, if the participant voted.
    pub choice: Option<&'static str>,
    /// Risk delta before clamping.
    pub risk_delta: i32,
    /// Risk after commit.
    pub risk: u32,
    /// Risk band after commit.
    pub zone: RiskZone,
    /// Warning level for risk 7 to 9.
    pub warning: Option<u8>,
    /// Notes in the order they were produced.
    pub notes: Vec<SettlementNote>,
}

/// Result of settling a voting round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundResult {
    /// Round number.
    pub round: u8,
    /// Net pressure delta before clamping.
    pub pressure_delta: i32,
    /// Net circulation delta before clamping.
    pub circulation_delta: i32,
    /// Pressure after commit.
    pub pressure: u32,
    /// Circulation after commit.
    pub circulation: u32,
    /// True if enough votes complied, even when the pressure was cancelled.
    pub majority_triggered: bool,
    /// True if public voting was active.
    pub public_voting: bool,
    /// True if one unit of pressure was cancelled.
    pub pressure_cancelled: bool,
    /// Votes by category.
    pub tally: VoteTally,
    /// Mood of the vote, `None` if nobody voted.
    pub mood: Option<SocialMood>,
    /// Atmosphere after commit.
    pub atmosphere: Atmosphere,
    /// Participants removed by this settlement, in join order.
    pub removed: Vec<ParticipantId>,
    /// Outcomes for every participant, in join order.
    pub outcomes: Vec<ParticipantOutcome>,
}

/// Accumulated deltas of one settlement.
#[derive(Debug, Default)]
pub(crate) struct Pipeline {
    pressure: i32,
    circulation: i32,
    risk: BTreeMap<ParticipantId, i32>,
    notes: BTreeMap<ParticipantId, Vec<SettlementNote>>,
    tally: VoteTally,
    majority_triggered: bool,
    pressure_cancelled: bool,
}

impl Pipeline {
    fn new(registry: &ParticipantRegistry) -> Self {
        Self {
            risk: registry.ids().map(|id| (id, 0)).collect(),
            notes: registry.ids().map(|id| (id, Vec::new())).collect(),
            ..Self::default()
        }
    }

    fn add_risk(&mut self, id: ParticipantId, delta: i32) {
        *self.risk.entry(id).or_insert(0) += delta;
    }

    fn risk_of(&self, id: ParticipantId) -> i32 {
        self.risk.get(&id).copied().unwrap_or(0)
    }

    fn note(&mut self, id: ParticipantId, note: SettlementNote) {
        self.notes.entry(id).or_default().push(note);
    }

    /// Step 1.
    fn base_effects(
        &mut self,
        votes: &[(ParticipantId, &'static ChoiceRule)],
        round: &RoundState,
        registry: &mut ParticipantRegistry,
    ) {
        for &(id, choice) in votes {
            self.tally.record(choice.category);
            self.pressure += choice.effect.pressure;
            self.circulation += choice.effect.circulation;
            self.add_risk(id, choice.effect.risk);

            let Some(participant) = registry.get_mut(id) else {
                continue;
            };
            if choice.category == ChoiceCategory::Comply {
                participant.mark(ParticipantFlags::EVER_COMPLIED);
            }
            match choice.mark {
                MoralMark::None => {}
                MoralMark::Cost => {
                    participant.mark(ParticipantFlags::MORAL_COST);
                    self.note(id, SettlementNote::MoralCost);
                }
                MoralMark::Collapse => {
                    participant.mark(ParticipantFlags::MORAL_COLLAPSE);
                    self.note(id, SettlementNote::MoralCollapse);
                }
            }

            if let Some(spec) = choice.deferred {
                let suppressed = spec.suppressible
                    && round
                        .activation_of(id)
                        .is_some_and(|a| a.kind == AbilityKind::SuppressForeshadow);
                if suppressed {
                    self.note(id, SettlementNote::ForeshadowSuppressed);
                } else {
                    participant.push_deferred(DeferredRecord::new(id, spec.kind, round.number));
                    self.note(id, SettlementNote::ForeshadowRecorded { kind: spec.kind });
                }
            }
        }
    }

    /// Step 2.
    fn passives(
        &mut self,
        votes: &[(ParticipantId, &'static ChoiceRule)],
        round: u8,
        registry: &ParticipantRegistry,
    ) {
        for participant in registry.iter().filter(|p| p.is_connected()) {
            let Some(role) = participant.role() else {
                continue;
            };
            let id = participant.id();

            let pressure = role.passive_pressure(round);
            if pressure != 0 {
                self.pressure += pressure;
                self.note(id, SettlementNote::PassivePressure);
            }

            if role.penalized_for_resisting() && resisted(votes, id) {
                self.add_risk(id, 1);
                self.note(id, SettlementNote::ResistPenalty);
            }
        }
    }

    /// Step 3.
    fn amplifiers(
        &mut self,
        votes: &[(ParticipantId, &'static ChoiceRule)],
        flags: RoundFlags,
        metrics: GlobalMetrics,
        config: &GameConfig,
    ) {
        let resisters: Vec<ParticipantId> = votes
            .iter()
            .filter(|(_, c)| c.category == ChoiceCategory::Resist)
            .map(|(id, _)| *id)
            .collect();

        if flags.contains(RoundFlags::PUBLIC_VOTING) {
            for &id in &resisters {
                self.add_risk(id, 1);
                self.note(id, SettlementNote::PublicScrutiny);
            }
        }

        if metrics.projected_circulation(self.circulation) >= config.circulation_alarm {
            for &id in &resisters {
                self.add_risk(id, 1);
                self.note(id, SettlementNote::CirculationAlarm);
            }
        }
    }

    /// Step 4.
    fn majority(&mut self, flags: RoundFlags, config: &GameConfig) {
        if self.tally.comply >= config.majority_threshold {
            self.majority_triggered = true;
            if !flags.contains(RoundFlags::CANCEL_MAJORITY) {
                self.pressure += 1;
            }
        }
    }

    /// Step 5.
    fn cancellation(&mut self, flags: RoundFlags) {
        if flags.contains(RoundFlags::CANCEL_PRESSURE) && self.pressure > 0 {
            self.pressure -= 1;
            self.pressure_cancelled = true;
        }
    }

    /// Step 6. Three passes, each in activation order.
    fn transfers(&mut self, round: &RoundState) {
        for activation in round.activations() {
            if activation.kind == AbilityKind::RiskToPressure
                && self.risk_of(activation.participant) > 0
            {
                self.add_risk(activation.participant, -1);
                self.pressure += 1;
                self.note(activation.participant, SettlementNote::RiskConverted);
            }
        }

        for activation in round.activations() {
            if let AbilityKind::ShoulderRisk { target } = activation.kind {
                if self.risk_of(target) > 0 {
                    self.add_risk(target, -1);
                    self.add_risk(activation.participant, 1);
                    self.note(activation.participant, SettlementNote::ShoulderedRisk { target });
                }
            }
        }

        for activation in round.activations() {
            if let AbilityKind::ShelterRisk { target } = activation.kind {
                if self.risk_of(target) > 0 {
                    self.add_risk(target, -1);
                    self.pressure += 1;
                    self.note(activation.participant, SettlementNote::ShelteredRisk { target });
                }
            }
        }
    }
}

fn resisted(votes: &[(ParticipantId, &'static ChoiceRule)], id: ParticipantId) -> bool {
    votes
        .iter()
        .any(|(voter, c)| *voter == id && c.category == ChoiceCategory::Resist)
}

/// Commits deltas to metrics and risk, then runs the removal check.
///
/// Returns the participants removed by this commit, in join order.
pub(crate) fn commit(
    registry: &mut ParticipantRegistry,
    metrics: &mut GlobalMetrics,
    pressure: i32,
    circulation: i32,
    risk: &BTreeMap<ParticipantId, i32>,
    threshold: u32,
) -> Vec<ParticipantId> {
    metrics.apply(pressure, circulation);
    for (id, delta) in risk {
        if let Some(participant) = registry.get_mut(*id) {
            participant.apply_risk(*delta);
        }
    }

    let mut removed = Vec::new();
    for participant in registry.iter_mut() {
        if participant.check_removal(threshold) {
            info!(participant = %participant.id(), risk = participant.risk(), "participant removed");
            removed.push(participant.id());
        }
    }
    removed
}

/// Runs the full pipeline for a voting round.
pub(crate) fn settle(
    rule: &RoundRule,
    round: &RoundState,
    registry: &mut ParticipantRegistry,
    metrics: &mut GlobalMetrics,
    config: &GameConfig,
) -> RoundResult {
    let votes: Vec<(ParticipantId, &'static ChoiceRule)> = round
        .votes()
        .iter()
        .filter_map(|(id, key)| rule.choice(key).map(|c| (*id, c)))
        .collect();

    let mut pipeline = Pipeline::new(registry);
    pipeline.base_effects(&votes, round, registry);
    pipeline.passives(&votes, round.number, registry);
    pipeline.amplifiers(&votes, round.flags(), *metrics, config);
    pipeline.majority(round.flags(), config);
    pipeline.cancellation(round.flags());
    pipeline.transfers(round);

    let removed = commit(
        registry,
        metrics,
        pipeline.pressure,
        pipeline.circulation,
        &pipeline.risk,
        config.removal_threshold,
    );

    let outcomes = registry
        .iter()
        .map(|p| {
            let id = p.id();
            ParticipantOutcome {
                participant: id,
                choice: round.votes().get(&id).copied(),
                risk_delta: pipeline.risk.get(&id).copied().unwrap_or(0),
                risk: p.risk(),
                zone: RiskZone::of(p.risk()),
                warning: risk_warning(p.risk()),
                notes: pipeline.notes.remove(&id).unwrap_or_default(),
            }
        })
        .collect();

    RoundResult {
        round: round.number,
        pressure_delta: pipeline.pressure,
        circulation_delta: pipeline.circulation,
        pressure: metrics.pressure,
        circulation: metrics.circulation,
        majority_triggered: pipeline.majority_triggered,
        public_voting: round.flags().contains(RoundFlags::PUBLIC_VOTING),
        pressure_cancelled: pipeline.pressure_cancelled,
        tally: pipeline.tally,
        mood: pipeline.tally.mood(),
        atmosphere: Atmosphere::of(*metrics),
        removed,
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::AbilityActivation;
    use crate::participant::Role;
    use crate::round::Phase;
    use crate::rules::round_rule;

    struct Table {
        registry: ParticipantRegistry,
        metrics: GlobalMetrics,
        round: RoundState,
        config: GameConfig,
    }

    impl Table {
        fn new(roles: &[Role], round: u8) -> Self {
            let mut registry = ParticipantRegistry::new();
            for (i, role) in roles.iter().enumerate() {
                let id = registry.join(format!("P{i}"));
                if let Some(p) = registry.get_mut(id) {
                    p.assign_role(*role);
                }
            }
            let mut state = RoundState::default();
            state.open(round, Phase::Voting);
            Self {
                registry,
                metrics: GlobalMetrics::default(),
                round: state,
                config: GameConfig::default(),
            }
        }

        fn vote(&mut self, id: u64, key: &'static str) {
            self.round.votes.insert(ParticipantId::new(id), key);
        }

        fn activate(&mut self, id: u64, kind: AbilityKind) {
            self.round.flags.insert(kind.round_flag());
            self.round.activations.push(AbilityActivation {
                participant: ParticipantId::new(id),
                kind,
            });
        }

        fn settle(&mut self) -> RoundResult {
            let rule = round_rule(self.round.number).unwrap();
            settle(
                rule,
                &self.round,
                &mut self.registry,
                &mut self.metrics,
                &self.config,
            )
        }

        fn risk(&self, id: u64) -> u32 {
            self.registry.get(ParticipantId::new(id)).unwrap().risk()
        }
    }

    const SIX_CITIZENS: [Role; 6] = [Role::Citizen; 6];

    #[test]
    fn round_one_example() {
        let mut t = Table::new(&SIX_CITIZENS, 1);
        for id in 1..=3 {
            t.vote(id, "comply");
        }
        t.vote(4, "evade");
        t.vote(5, "resist");
        t.vote(6, "resist");
        let result = t.settle();

        assert_eq!(result.pressure_delta, 3);
        assert_eq!(result.circulation_delta, 2);
        assert_eq!(
            result.tally,
            VoteTally {
                comply: 3,
                evade: 1,
                resist: 2
            }
        );
        assert_eq!(t.risk(5), 1);
        assert_eq!(t.risk(6), 1);
        assert_eq!(t.registry.get(ParticipantId::new(4)).unwrap().deferred().len(), 1);
        assert!(!result.majority_triggered);
    }

    #[test]
    fn suppression_only_applies_to_holder() {
        let mut roles = SIX_CITIZENS;
        roles[0] = Role::Teacher;
        let mut t = Table::new(&roles, 1);
        t.activate(1, AbilityKind::SuppressForeshadow);
        t.vote(1, "evade");
        t.vote(2, "evade");
        let result = t.settle();

        assert!(t.registry.get(ParticipantId::new(1)).unwrap().deferred().is_empty());
        assert_eq!(t.registry.get(ParticipantId::new(2)).unwrap().deferred().len(), 1);
        assert_eq!(result.outcomes[0].notes, vec![SettlementNote::ForeshadowSuppressed]);
    }

    #[test]
    fn silence_cannot_be_suppressed() {
        let mut roles = SIX_CITIZENS;
        roles[0] = Role::Teacher;
        let mut t = Table::new(&roles, 2);
        t.activate(1, AbilityKind::SuppressForeshadow);
        t.vote(1, "silence");
        t.settle();
        let records = t.registry.get(ParticipantId::new(1)).unwrap().deferred();
        assert_eq!(records, &[DeferredRecord::new(ParticipantId::new(1), DeferredKind::Silent, 2)]);
    }

    #[test]
    fn teacher_passive_fires_without_a_vote() {
        let mut roles = SIX_CITIZENS;
        roles[0] = Role::Teacher;
        let mut t = Table::new(&roles, 2);
        let result = t.settle();
        assert_eq!(result.pressure_delta, 1);
        assert_eq!(result.outcomes[0].notes, vec![SettlementNote::PassivePressure]);
    }

    #[test]
    fn disconnected_teacher_adds_nothing() {
        let mut roles = SIX_CITIZENS;
        roles[0] = Role::Teacher;
        let mut t = Table::new(&roles, 2);
        t.registry.get_mut(ParticipantId::new(1)).unwrap().set_connected(false);
        assert_eq!(t.settle().pressure_delta, 0);
    }

    #[test]
    fn amplifiers_are_additive() {
        let mut roles = SIX_CITIZENS;
        roles[0] = Role::Student;
        let mut t = Table::new(&roles, 6);
        t.metrics = GlobalMetrics::new(0, 2);
        t.activate(2, AbilityKind::PublicVoting);
        t.vote(1, "refuse");
        t.settle();
        // base 2, student penalty 1, public 1, circulation 2 + 1 >= 3
        assert_eq!(t.risk(1), 5);
    }

    #[test]
    fn majority_reported_even_when_cancelled() {
        let mut t = Table::new(&SIX_CITIZENS, 1);
        t.activate(6, AbilityKind::CancelMajority);
        for id in 1..=5 {
            t.vote(id, "comply");
        }
        let result = t.settle();
        assert!(result.majority_triggered);
        assert_eq!(result.pressure_delta, 5);
    }

    #[test]
    fn cancel_pressure_needs_a_positive_delta() {
        let mut t = Table::new(&SIX_CITIZENS, 2);
        t.activate(1, AbilityKind::CancelPressure);
        t.vote(2, "comfort");
        let result = t.settle();
        assert_eq!(result.pressure_delta, -1);
        assert!(!result.pressure_cancelled);
    }

    #[test]
    fn transfer_passes_run_in_kind_order() {
        let roles = [
            Role::Bystander,
            Role::Relative,
            Role::Citizen,
            Role::Citizen,
            Role::Citizen,
            Role::Citizen,
        ];
        let mut t = Table::new(&roles, 1);
        // Shelter is recorded first but resolves after shoulder.
        t.activate(2, AbilityKind::ShelterRisk { target: ParticipantId::new(3) });
        t.activate(1, AbilityKind::ShoulderRisk { target: ParticipantId::new(3) });
        t.vote(3, "resist");
        let result = t.settle();

        assert_eq!(t.risk(3), 0);
        assert_eq!(t.risk(1), 1);
        assert_eq!(result.pressure_delta, 0);
        assert!(result.outcomes[1].notes.is_empty());
    }

    #[test]
    fn removal_reported_once() {
        let mut t = Table::new(&SIX_CITIZENS, 4);
        t.registry.get_mut(ParticipantId::new(1)).unwrap().apply_risk(8);
        t.vote(1, "refuse");
        let first = t.settle();
        assert_eq!(first.removed, vec![ParticipantId::new(1)]);
        assert_eq!(first.outcomes[0].zone, RiskZone::Taken);

        t.round.open(4, Phase::Voting);
        let second = t.settle();
        assert!(second.removed.is_empty());
    }
}

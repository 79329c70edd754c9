//! Participant identity, roles and per-participant play state.
//!
//! - [`ParticipantId`]: stable identifier, allocated in join order
//! - [`Role`]: the closed set of seven roles
//! - [`ParticipantFlags`]: set-once and monotonic markers
//! - [`Participant`]: the mutable play state owned by the engine

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::deferred::DeferredRecord;

/// Unique identifier for a participant.
///
/// Identifiers are allocated monotonically by the registry, so ordering by
/// id is the same as ordering by join time. Every iteration over
/// participants uses this order.
///
/// # Example
///
/// ```
/// use silent_island_core::participant::ParticipantId;
///
/// let first = ParticipantId::new(1);
/// let second = ParticipantId::new(2);
/// assert!(first < second);
/// assert_eq!(second.as_u64(), 2);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(u64);

impl ParticipantId {
    /// Creates a new `ParticipantId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({})", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ParticipantId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// The seven roles, identified by the letters A through G.
///
/// Passive effects are expressed as predicates here; the one-shot ability
/// of each role is described by [`crate::ability::AbilityKind`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// A: adds pressure on even rounds; can suppress one foreshadow.
    Teacher,
    /// B: extra risk for resisting; can cancel one pressure increase.
    CivilServant,
    /// C: extra risk for resisting; can turn own risk into pressure.
    Student,
    /// D: cannot resist under high pressure; can shoulder another's risk.
    Bystander,
    /// E: no passive; can cancel majority pressure.
    Citizen,
    /// F: no passive; can force public voting.
    Enforcer,
    /// G: no passive; can turn another's risk into pressure.
    Relative,
}

impl Role {
    /// All roles in letter order.
    pub const ALL: [Role; 7] = [
        Role::Teacher,
        Role::CivilServant,
        Role::Student,
        Role::Bystander,
        Role::Citizen,
        Role::Enforcer,
        Role::Relative,
    ];

    /// Returns the role letter.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Teacher => 'A',
            Self::CivilServant => 'B',
            Self::Student => 'C',
            Self::Bystander => 'D',
            Self::Citizen => 'E',
            Self::Enforcer => 'F',
            Self::Relative => 'G',
        }
    }

    /// Looks up a role by letter.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.letter() == letter)
    }

    /// Flat pressure this role adds when `round` settles, regardless of its vote.
    #[must_use]
    pub const fn passive_pressure(self, round: u8) -> i32 {
        match (self, round) {
            (Self::Teacher, 2 | 4 | 6) => 1,
            _ => 0,
        }
    }

    /// Returns true if this role takes +1 risk whenever it votes Resist.
    #[must_use]
    pub const fn penalized_for_resisting(self) -> bool {
        matches!(self, Self::CivilServant | Self::Student)
    }

    /// Returns true if this role loses the Resist choices under high pressure.
    #[must_use]
    pub const fn silenced_under_pressure(self) -> bool {
        matches!(self, Self::Bystander)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

bitflags! {
    /// Markers carried by a participant across the whole game.
    ///
    /// `MORAL_COST`, `MORAL_COLLAPSE`, `EVER_COMPLIED`, `ABILITY_USED` and
    /// `REMOVED` are only ever inserted. `OBSERVER` requires `REMOVED`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ParticipantFlags: u8 {
        /// Voted a moral-cost choice (providing information, reporting).
        const MORAL_COST = 1 << 0;
        /// Voted the moral-collapse choice (signing the declaration).
        const MORAL_COLLAPSE = 1 << 1;
        /// The one-shot role ability has been spent.
        const ABILITY_USED = 1 << 2;
        /// Voted at least one Comply choice.
        const EVER_COMPLIED = 1 << 3;
        /// Risk reached the removal threshold.
        const REMOVED = 1 << 4;
        /// Watching the rest of the game after removal.
        const OBSERVER = 1 << 5;
        /// Connection dropped; skipped by timeouts and passives.
        const DISCONNECTED = 1 << 6;
    }
}

/// Mutable play state of one participant.
#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    id: ParticipantId,
    name: String,
    role: Option<Role>,
    risk: u32,
    flags: ParticipantFlags,
    deferred: Vec<DeferredRecord>,
    choices: BTreeMap<u8, &'static str>,
}

impl Participant {
    /// Creates a connected participant with no role and zero risk.
    #[must_use]
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: None,
            risk: 0,
            flags: ParticipantFlags::empty(),
            deferred: Vec::new(),
            choices: BTreeMap::new(),
        }
    }

    /// Returns the participant id.
    #[must_use]
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the assigned role, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Returns the current risk.
    #[must_use]
    pub fn risk(&self) -> u32 {
        self.risk
    }

    /// Returns the flag set.
    #[must_use]
    pub fn flags(&self) -> ParticipantFlags {
        self.flags
    }

    /// Returns the deferred-consequence records, oldest first.
    #[must_use]
    pub fn deferred(&self) -> &[DeferredRecord] {
        &self.deferred
    }

    /// Returns the choice made in each round so far.
    #[must_use]
    pub fn choices(&self) -> &BTreeMap<u8, &'static str> {
        &self.choices
    }

    /// Returns true while the participant's connection is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.flags.contains(ParticipantFlags::DISCONNECTED)
    }

    /// Returns true once the participant has been removed.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.flags.contains(ParticipantFlags::REMOVED)
    }

    /// Returns true once the participant watches as an observer.
    #[must_use]
    pub fn is_observer(&self) -> bool {
        self.flags.contains(ParticipantFlags::OBSERVER)
    }

    /// Returns true if the one-shot ability is spent.
    #[must_use]
    pub fn ability_used(&self) -> bool {
        self.flags.contains(ParticipantFlags::ABILITY_USED)
    }

    /// Returns true if the participant still counts toward vote collection.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_connected() && !self.is_removed()
    }

    pub(crate) fn assign_role(&mut self, role: Role) {
        self.role = Some(role);
    }

    pub(crate) fn mark(&mut self, flags: ParticipantFlags) {
        self.flags.insert(flags);
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.flags.set(ParticipantFlags::DISCONNECTED, !connected);
    }

    /// Adds a signed delta to risk, clamping at zero.
    pub(crate) fn apply_risk(&mut self, delta: i32) {
        self.risk = self.risk.saturating_add_signed(delta);
    }

    pub(crate) fn record_choice(&mut self, round: u8, key: &'static str) {
        self.choices.insert(round, key);
    }

    pub(crate) fn push_deferred(&mut self, record: DeferredRecord) {
        self.deferred.push(record);
    }

    /// Marks the participant removed if risk reached `threshold`.
    ///
    /// Returns true only on the transition, never for an already removed
    /// participant.
    pub(crate) fn check_removal(&mut self, threshold: u32) -> bool {
        if self.risk >= threshold && !self.is_removed() {
            self.flags.insert(ParticipantFlags::REMOVED);
            return true;
        }
        false
    }

    /// Enters observer mode. Only removed participants may observe.
    pub(crate) fn enter_observer(&mut self) -> bool {
        if self.is_removed() && !self.is_observer() {
            self.flags.insert(ParticipantFlags::OBSERVER);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod role_tests {
        use super::*;

        #[test]
        fn letters_round_trip() {
            for role in Role::ALL {
                assert_eq!(Role::from_letter(role.letter()), Some(role));
            }
            assert_eq!(Role::from_letter('H'), None);
        }

        #[test]
        fn teacher_pressure_on_even_rounds_only() {
            let rounds: Vec<i32> = (1..=6).map(|r| Role::Teacher.passive_pressure(r)).collect();
            assert_eq!(rounds, vec![0, 1, 0, 1, 0, 1]);
            assert_eq!(Role::Student.passive_pressure(2), 0);
        }

        #[test]
        fn resist_penalty_roles() {
            assert!(Role::CivilServant.penalized_for_resisting());
            assert!(Role::Student.penalized_for_resisting());
            assert!(!Role::Teacher.penalized_for_resisting());
            assert!(Role::Bystander.silenced_under_pressure());
        }
    }

    mod participant_tests {
        use super::*;

        #[test]
        fn risk_clamps_at_zero() {
            let mut p = Participant::new(ParticipantId::new(1), "Mei");
            p.apply_risk(2);
            p.apply_risk(-5);
            assert_eq!(p.risk(), 0);
        }

        #[test]
        fn removal_is_reported_once() {
            let mut p = Participant::new(ParticipantId::new(1), "Mei");
            p.apply_risk(10);
            assert!(p.check_removal(10));
            assert!(!p.check_removal(10));
            p.apply_risk(-8);
            assert!(p.is_removed());
        }

        #[test]
        fn observer_requires_removal() {
            let mut p = Participant::new(ParticipantId::new(1), "Mei");
            assert!(!p.enter_observer());
            p.apply_risk(12);
            p.check_removal(10);
            assert!(p.enter_observer());
            assert!(!p.enter_observer());
            assert!(p.is_observer());
        }

        #[test]
        fn disconnect_toggles() {
            let mut p = Participant::new(ParticipantId::new(1), "Mei");
            assert!(p.is_active());
            p.set_connected(false);
            assert!(!p.is_connected());
            p.set_connected(true);
            assert!(p.is_connected());
        }
    }
}

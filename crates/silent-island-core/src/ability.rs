//! One-shot role abilities.
//!
//! Each role owns exactly one ability. Activation is validated and recorded
//! by the engine; the effect lands in one of two places:
//!
//! - **Round flags**, set at activation time: [`AbilityKind::CancelPressure`],
//!   [`AbilityKind::CancelMajority`], [`AbilityKind::PublicVoting`].
//! - **Settlement**, read from the recorded activation:
//!   [`AbilityKind::SuppressForeshadow`] in the base-effect step, and the three
//!   risk transfers in the ability-resolution step.

use serde::{Deserialize, Serialize};

use crate::participant::{ParticipantId, Role};
use crate::round::RoundFlags;

/// Ability effect, one variant per role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AbilityKind {
    /// A: the holder's own suppressible evade choice leaves no record.
    SuppressForeshadow,
    /// B: cancel one unit of positive pressure delta.
    CancelPressure,
    /// C: move one unit of own risk delta into pressure.
    RiskToPressure,
    /// D: take one unit of the target's risk delta.
    ShoulderRisk {
        /// Participant whose risk is shouldered.
        target: ParticipantId,
    },
    /// E: the majority rule adds no pressure this round.
    CancelMajority,
    /// F: every Resist voter takes +1 risk this round.
    PublicVoting,
    /// G: move one unit of the target's risk delta into pressure.
    ShelterRisk {
        /// Participant whose risk is sheltered.
        target: ParticipantId,
    },
}

impl AbilityKind {
    /// Builds the ability of `role`, or `None` if the role needs a target and
    /// none was given.
    #[must_use]
    pub fn for_role(role: Role, target: Option<ParticipantId>) -> Option<Self> {
        Some(match role {
            Role::Teacher => Self::SuppressForeshadow,
            Role::CivilServant => Self::CancelPressure,
            Role::Student => Self::RiskToPressure,
            Role::Bystander => Self::ShoulderRisk { target: target? },
            Role::Citizen => Self::CancelMajority,
            Role::Enforcer => Self::PublicVoting,
            Role::Relative => Self::ShelterRisk { target: target? },
        })
    }

    /// Returns true if the role's ability needs a target participant.
    #[must_use]
    pub const fn requires_target(role: Role) -> bool {
        matches!(role, Role::Bystander | Role::Relative)
    }

    /// Round flag raised at activation, if any.
    #[must_use]
    pub const fn round_flag(self) -> RoundFlags {
        match self {
            Self::CancelPressure => RoundFlags::CANCEL_PRESSURE,
            Self::CancelMajority => RoundFlags::CANCEL_MAJORITY,
            Self::PublicVoting => RoundFlags::PUBLIC_VOTING,
            _ => RoundFlags::empty(),
        }
    }

    /// The target participant, for the two targeted kinds.
    #[must_use]
    pub const fn target(self) -> Option<ParticipantId> {
        match self {
            Self::ShoulderRisk { target } | Self::ShelterRisk { target } => Some(target),
            _ => None,
        }
    }
}

/// A recorded activation. At most one per participant per round.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityActivation {
    /// Activating participant.
    pub participant: ParticipantId,
    /// Effect.
    pub kind: AbilityKind,
}

/// Confirmation returned by a successful activation.
///
/// `broadcast` is the role only: the room layer uses it to pick an anonymized
/// announcement without revealing who acted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityReceipt {
    /// Activating participant.
    pub participant: ParticipantId,
    /// Effect that was recorded.
    pub kind: AbilityKind,
    /// Anonymized broadcast key.
    pub broadcast: Role,
}

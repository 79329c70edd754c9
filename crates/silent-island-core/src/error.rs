//! Error types.
//!
//! Two failure families exist and they are kept apart:
//!
//! - [`Rejection`]: the request broke a precondition. Nothing changed; the
//!   caller fixes the input.
//! - [`IllegalState`]: the caller invoked an operation the game cannot
//!   perform in its current state.
//!
//! Neither is retryable. [`EngineError`] wraps both for operations that can
//! fail either way.

use serde::Serialize;
use thiserror::Error;

use crate::participant::ParticipantId;
use crate::round::Phase;

/// How a failed operation should be reported.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Bad input from a participant. Report to them.
    Validation,
    /// The driver called something out of order.
    Misuse,
}

/// A rejected request. The engine state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Participant id is not registered.
    #[error("unknown participant {0}")]
    UnknownParticipant(ParticipantId),

    /// Votes are only accepted during the voting phase.
    #[error("votes are not accepted in phase {0:?}")]
    WrongPhase(Phase),

    /// Votes are write-once per round.
    #[error("participant {0} already voted this round")]
    AlreadyVoted(ParticipantId),

    /// Removed participants can neither vote nor use abilities.
    #[error("participant {0} has been removed")]
    Removed(ParticipantId),

    /// Choice key is not offered this round.
    #[error("choice `{0}` is not available this round")]
    InvalidChoice(String),

    /// The participant's role may not pick this category right now.
    #[error("participant {0} may not choose `{1}` under current pressure")]
    RestrictedCategory(ParticipantId, String),

    /// The one-shot ability was already spent.
    #[error("participant {0} already used their ability")]
    AbilityAlreadyUsed(ParticipantId),

    /// Abilities need a role.
    #[error("participant {0} has no role yet")]
    RoleUnassigned(ParticipantId),

    /// A targeted ability was invoked without a valid target.
    #[error("ability requires an existing target participant")]
    TargetRequired,
}

impl Rejection {
    /// Stable machine-readable reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownParticipant(_) => "unknown_participant",
            Self::WrongPhase(_) => "wrong_phase",
            Self::AlreadyVoted(_) => "already_voted",
            Self::Removed(_) => "removed",
            Self::InvalidChoice(_) => "invalid_choice",
            Self::RestrictedCategory(..) => "restricted_category",
            Self::AbilityAlreadyUsed(_) => "ability_already_used",
            Self::RoleUnassigned(_) => "role_unassigned",
            Self::TargetRequired => "target_required",
        }
    }
}

/// An operation was invoked out of order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalState {
    /// Settlement already ran for this round.
    #[error("round {0} has already been settled")]
    AlreadySettled(u8),

    /// The operation does not apply to this round.
    #[error("operation not valid in round {0}")]
    WrongRound(u8),

    /// No round has been opened yet.
    #[error("the game has not started")]
    NotStarted,

    /// The ending was already determined.
    #[error("the game has ended")]
    Ended,

    /// Rounds cannot open before roles are dealt.
    #[error("roles have not been assigned")]
    RolesUnassigned,

    /// Roles can only be dealt once.
    #[error("roles have already been assigned")]
    RolesAlreadyAssigned,

    /// Role assignment needs an allowed participant count.
    #[error("{0} participants is outside the allowed range")]
    ParticipantCount(usize),

    /// Every round has been played.
    #[error("no rounds remain")]
    NoRoundsLeft,
}

/// Any engine failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Precondition violation.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Caller misuse.
    #[error(transparent)]
    Illegal(#[from] IllegalState),
}

impl EngineError {
    /// Severity used when reporting this error.
    #[must_use]
    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Rejected(_) => ErrorSeverity::Validation,
            Self::Illegal(_) => ErrorSeverity::Misuse,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Rejected(r) => r.code(),
            Self::Illegal(_) => "illegal_state",
        }
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

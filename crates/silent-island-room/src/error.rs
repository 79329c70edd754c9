//! Room-layer errors.

use silent_island_core::{EngineError, ParticipantId};
use thiserror::Error;

/// Failures of the room layer. Engine failures pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// The room holds its maximum number of participants.
    #[error("room is full ({capacity} participants)")]
    Full {
        /// Configured capacity.
        capacity: usize,
    },

    /// Joining closes when the game starts.
    #[error("game already started")]
    AlreadyStarted,

    /// The command needs a started game.
    #[error("game has not started")]
    NotStarted,

    /// No room has this code.
    #[error("no room with code {0}")]
    RoomNotFound(String),

    /// Every four-digit code is taken.
    #[error("no free room codes")]
    NoFreeCode,

    /// The sender may not issue this command.
    #[error("command not allowed for this sender")]
    Forbidden,

    /// Participant id is not in this room.
    #[error("unknown participant {0}")]
    UnknownParticipant(ParticipantId),

    /// Removed participants cannot pass notes.
    #[error("removed participants cannot send notes")]
    SenderRemoved,

    /// The per-game note quota is spent.
    #[error("note quota of {quota} used up")]
    NoteQuotaExhausted {
        /// Configured quota.
        quota: u32,
    },

    /// Notes must hold 1 to `max` characters.
    #[error("note must be 1 to {max} characters")]
    NoteLength {
        /// Configured maximum.
        max: usize,
    },

    /// Notes cannot be sent to oneself.
    #[error("cannot send a note to yourself")]
    NoteToSelf,

    /// A room lock was poisoned by a panicking holder.
    #[error("room lock was poisoned")]
    LockPoisoned,

    /// The engine rejected the operation.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl RoomError {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Full { .. } => "room_full",
            Self::AlreadyStarted => "already_started",
            Self::NotStarted => "not_started",
            Self::RoomNotFound(_) => "room_not_found",
            Self::NoFreeCode => "no_free_code",
            Self::Forbidden => "forbidden",
            Self::UnknownParticipant(_) => "unknown_participant",
            Self::SenderRemoved => "sender_removed",
            Self::NoteQuotaExhausted { .. } => "note_quota_exhausted",
            Self::NoteLength { .. } => "note_length",
            Self::NoteToSelf => "note_to_self",
            Self::LockPoisoned => "lock_poisoned",
            Self::Engine(e) => e.code(),
        }
    }
}

impl From<silent_island_core::Rejection> for RoomError {
    fn from(rejection: silent_island_core::Rejection) -> Self {
        Self::Engine(rejection.into())
    }
}

impl From<silent_island_core::IllegalState> for RoomError {
    fn from(illegal: silent_island_core::IllegalState) -> Self {
        Self::Engine(illegal.into())
    }
}

/// Result alias for room operations.
pub type RoomResult<T> = Result<T, RoomError>;

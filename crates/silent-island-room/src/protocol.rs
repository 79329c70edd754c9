//! Wire messages between clients and a room.
//!
//! Both directions are JSON objects tagged by a snake_case `type` field.
//! [`ClientMessage`] is what a moderator or participant sends;
//! [`ServerMessage`] is what the room emits, wrapped in an [`Outbound`] that
//! names its recipients. Transport is left to the caller.

use serde::{Deserialize, Serialize};
use silent_island_core::deferred::DeferredOutcome;
use silent_island_core::ending::PersonalOutcome;
use silent_island_core::settlement::ParticipantOutcome;
use silent_island_core::summary::{Atmosphere, SocialMood, VoteTally};
use silent_island_core::{
    AbilityReceipt, ChoiceOption, DeferredResult, EndingResult, GlobalMetrics, HostView,
    ParticipantId, Phase, Role, RoundOpening, RoundResult, SocialEnding,
};

// =============================================================================
// Inbound
// =============================================================================

/// A command sent to the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Deal roles and close joining. Moderator only.
    StartGame,
    /// Open the next round. Moderator only.
    NextEvent,
    /// Enter the hush phase. Moderator only.
    StartSilence,
    /// Enter the discussion phase. Moderator only.
    StartDiscussion,
    /// Enter the voting phase. Moderator only.
    StartVoting,
    /// Cast a vote.
    Vote {
        /// Choice key.
        choice: String,
    },
    /// Fill missing votes with the round's evade choice. Moderator only.
    VoteTimeout,
    /// Fill missing votes, then settle. Moderator only.
    EndVoting,
    /// Activate the sender's one-shot ability.
    UseAbility {
        /// Target for the two targeted roles.
        #[serde(default)]
        target: Option<ParticipantId>,
    },
    /// Determine and broadcast the endings. Moderator only.
    ShowEnding,
    /// List the other participants still in play.
    GetPlayers,
    /// Pass a private note.
    SendNote {
        /// Recipient.
        target: ParticipantId,
        /// Note body.
        text: String,
    },
    /// Answer a note.
    ReplyNote {
        /// Recipient.
        target: ParticipantId,
        /// Note body.
        text: String,
    },
}

impl ClientMessage {
    /// True for commands only the moderator may issue.
    #[must_use]
    pub const fn is_moderator_command(&self) -> bool {
        matches!(
            self,
            Self::StartGame
                | Self::NextEvent
                | Self::StartSilence
                | Self::StartDiscussion
                | Self::StartVoting
                | Self::VoteTimeout
                | Self::EndVoting
                | Self::ShowEnding
        )
    }
}

/// Who sent a [`ClientMessage`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Sender {
    /// The room's moderator.
    Moderator,
    /// A seated participant.
    Participant(ParticipantId),
}

// =============================================================================
// Outbound
// =============================================================================

/// Entry of a player list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerEntry {
    /// Participant id.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
}

/// Shared fields every participant sees after a voting round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicRoundSummary {
    /// Round number.
    pub round: u8,
    /// Metrics after commit.
    pub metrics: GlobalMetrics,
    /// Votes by category.
    pub tally: VoteTally,
    /// Mood of the vote.
    pub mood: Option<SocialMood>,
    /// Atmosphere after commit.
    pub atmosphere: Atmosphere,
    /// True if the majority rule fired.
    pub majority_triggered: bool,
    /// Participants removed this round.
    pub removed: Vec<ParticipantId>,
}

impl From<&RoundResult> for PublicRoundSummary {
    fn from(result: &RoundResult) -> Self {
        Self {
            round: result.round,
            metrics: GlobalMetrics::new(result.pressure, result.circulation),
            tally: result.tally,
            mood: result.mood,
            atmosphere: result.atmosphere,
            majority_triggered: result.majority_triggered,
            removed: result.removed.clone(),
        }
    }
}

/// A message emitted by the room.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A participant joined. Sent to the moderator.
    PlayerJoined {
        /// New participant.
        participant: ParticipantId,
        /// Display name.
        name: String,
        /// Seated participants after the join.
        count: usize,
    },
    /// A participant's connection dropped. Sent to the moderator.
    PlayerDisconnected {
        /// Participant.
        participant: ParticipantId,
    },
    /// The recipient's dealt role.
    GameStarted {
        /// Role.
        role: Role,
    },
    /// Moderator copy of the start, with every role.
    HostGameStarted {
        /// Snapshot after the deal.
        host_view: HostView,
    },
    /// A round opened, as seen by one participant.
    Event {
        /// Round number.
        round: u8,
        /// True for the deferred settlement round.
        deferred: bool,
        /// Choices, with restricted ones disabled.
        choices: Vec<ChoiceOption>,
    },
    /// A round opened. Sent to the moderator.
    HostEvent {
        /// Round opening.
        opening: RoundOpening,
        /// Snapshot after opening.
        host_view: HostView,
    },
    /// The moderator moved the phase.
    PhaseChanged {
        /// New phase.
        phase: Phase,
        /// True if votes this round are public.
        public_voting: bool,
    },
    /// The sender's vote was accepted.
    VoteConfirmed {
        /// Choice key.
        choice: String,
    },
    /// A vote arrived. Sent to the moderator.
    VoteReceived {
        /// Voter.
        participant: ParticipantId,
        /// Choice key.
        choice: String,
        /// True once every active participant has voted.
        all_voted: bool,
    },
    /// A vote under public voting. Sent to every participant.
    PublicVote {
        /// Voter.
        participant: ParticipantId,
        /// Voter's name.
        name: String,
        /// Choice key.
        choice: String,
    },
    /// The recipient's missing vote was filled.
    AutoVoted {
        /// Choice key assigned.
        choice: &'static str,
    },
    /// Missing votes were filled. Sent to the moderator.
    VotesFilled {
        /// Filled participants in join order.
        participants: Vec<ParticipantId>,
    },
    /// Full round result. Sent to the moderator.
    HostRoundResult {
        /// Result.
        result: RoundResult,
        /// Snapshot after commit.
        host_view: HostView,
    },
    /// Round result as seen by one participant.
    RoundResult {
        /// Shared fields.
        summary: PublicRoundSummary,
        /// Recipient's outcome.
        outcome: ParticipantOutcome,
    },
    /// Full deferred result. Sent to the moderator.
    HostDeferredResult {
        /// Result.
        result: DeferredResult,
        /// Snapshot after commit.
        host_view: HostView,
    },
    /// Deferred result as seen by one participant.
    DeferredResult {
        /// Metrics after commit.
        metrics: GlobalMetrics,
        /// Participants removed.
        removed: Vec<ParticipantId>,
        /// Recipient's outcome.
        outcome: DeferredOutcome,
    },
    /// Private confirmation of an ability.
    AbilityResult {
        /// Receipt.
        receipt: AbilityReceipt,
    },
    /// Ability activation. Sent to the moderator.
    AbilityUsed {
        /// Receipt, activator included.
        receipt: AbilityReceipt,
        /// Snapshot after activation.
        host_view: HostView,
    },
    /// Anonymized activation notice. Sent to every other participant.
    AbilityBroadcast {
        /// Role that acted.
        role: Role,
    },
    /// Votes this round are public. Sent to every participant.
    PublicVoteAnnounced,
    /// Full endings. Sent to the moderator.
    HostEnding {
        /// Result.
        result: EndingResult,
    },
    /// Endings as seen by one participant.
    Ending {
        /// Social ending.
        social: SocialEnding,
        /// Final metrics.
        metrics: GlobalMetrics,
        /// Recipient's personal ending.
        personal: PersonalOutcome,
    },
    /// Other participants still in play.
    PlayerList {
        /// Entries in join order.
        players: Vec<PlayerEntry>,
    },
    /// The sender's note went out.
    NoteSent {
        /// Notes left this game.
        remaining: u32,
    },
    /// A note arrived. Notes carry no author name.
    NoteReceived {
        /// Author id, so the recipient can reply.
        from: ParticipantId,
        /// Body.
        text: String,
        /// True for a reply.
        reply: bool,
    },
    /// The recipient is now an observer.
    ObserverMode,
    /// A participant became an observer. Sent to the moderator.
    ObserverJoined {
        /// Participant.
        participant: ParticipantId,
    },
    /// The sender's command failed.
    Error {
        /// Machine-readable code.
        code: &'static str,
        /// Human-readable message.
        message: String,
    },
}

/// Where an outbound message goes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Recipient {
    /// One participant.
    Participant(ParticipantId),
    /// Every participant but one.
    AllExcept(ParticipantId),
    /// Every participant.
    Participants,
    /// The moderator.
    Moderator,
    /// Participants and moderator.
    Everyone,
}

impl Recipient {
    /// True if a message addressed to `self` reaches `endpoint`.
    #[must_use]
    pub fn reaches(self, endpoint: Sender) -> bool {
        match (self, endpoint) {
            (Self::Everyone, _)
            | (Self::Moderator, Sender::Moderator)
            | (Self::Participants, Sender::Participant(_)) => true,
            (Self::Participant(id), Sender::Participant(p)) => id == p,
            (Self::AllExcept(id), Sender::Participant(p)) => id != p,
            _ => false,
        }
    }
}

impl From<Sender> for Recipient {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::Moderator => Self::Moderator,
            Sender::Participant(id) => Self::Participant(id),
        }
    }
}

/// A message paired with its recipients.
#[derive(Debug, Clone, Serialize)]
pub struct Outbound {
    /// Recipients.
    #[serde(skip)]
    pub recipient: Recipient,
    /// Message.
    pub message: ServerMessage,
}

impl Outbound {
    /// Creates an outbound message.
    #[must_use]
    pub const fn new(recipient: Recipient, message: ServerMessage) -> Self {
        Self { recipient, message }
    }

    /// Serializes the message body to JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.message)
    }
}

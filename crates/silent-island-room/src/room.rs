//! One game room.
//!
//! A [`Room`] wraps a [`GameEngine`] with the lobby, the command dispatcher,
//! the note side-channel and the delayed observer transition. It performs no
//! I/O: every command returns the [`Outbound`] messages the caller delivers.
//!
//! # Dispatch
//!
//! [`Room::dispatch`] authorizes the sender, runs the command and maps any
//! failure to a single [`ServerMessage::Error`] addressed back to the sender.
//! Moderator commands that fail are logged at `warn`.

use std::time::Instant;

use silent_island_core::round::RoundFlags;
use silent_island_core::{
    AbilityKind, DeferredResult, GameEngine, ParticipantId, Phase, RoundResult, SeededRandom,
};
use tracing::{debug, info, warn};

use crate::config::RoomConfig;
use crate::error::{RoomError, RoomResult};
use crate::notes::NoteLedger;
use crate::observer::ObserverSchedule;
use crate::protocol::{
    ClientMessage, Outbound, PlayerEntry, PublicRoundSummary, Recipient, Sender, ServerMessage,
};

/// Builds the join URL for a room code.
///
/// ```
/// use silent_island_room::join_link;
///
/// assert_eq!(
///     join_link("http://host:8001/", "0420"),
///     "http://host:8001/join?room=0420"
/// );
/// ```
#[must_use]
pub fn join_link(base_url: &str, code: &str) -> String {
    format!("{}/join?room={code}", base_url.trim_end_matches('/'))
}

/// A room hosting one game.
#[derive(Debug)]
pub struct Room {
    code: String,
    config: RoomConfig,
    engine: GameEngine,
    started: bool,
    notes: NoteLedger,
    observers: ObserverSchedule,
}

impl Room {
    /// Creates an empty room whose engine is seeded with `seed`.
    #[must_use]
    pub fn new(code: impl Into<String>, config: RoomConfig, seed: u64) -> Self {
        let engine = GameEngine::new(config.game.clone(), SeededRandom::new(seed));
        Self {
            code: code.into(),
            config,
            engine,
            started: false,
            notes: NoteLedger::new(),
            observers: ObserverSchedule::new(),
        }
    }

    /// Room code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Room configuration.
    #[must_use]
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// The hosted engine, read-only.
    #[must_use]
    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// True once the game has started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Observer transitions not yet applied.
    #[must_use]
    pub fn pending_observers(&self) -> usize {
        self.observers.len()
    }

    /// Join URL for this room.
    #[must_use]
    pub fn join_link(&self) -> String {
        join_link(&self.config.base_url, &self.code)
    }

    // =========================================================================
    // Lobby
    // =========================================================================

    /// Seats a participant.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::AlreadyStarted`] once the game started and
    /// [`RoomError::Full`] at capacity.
    pub fn join(&mut self, name: impl Into<String>) -> RoomResult<(ParticipantId, Vec<Outbound>)> {
        if self.started {
            return Err(RoomError::AlreadyStarted);
        }
        let capacity = self.config.capacity;
        if self.engine.registry().len() >= capacity {
            return Err(RoomError::Full { capacity });
        }
        let name = name.into();
        let id = self.engine.add_participant(name.clone());
        let count = self.engine.registry().len();
        info!(room = %self.code, participant = %id, count, "participant seated");
        Ok((
            id,
            vec![Outbound::new(
                Recipient::Moderator,
                ServerMessage::PlayerJoined {
                    participant: id,
                    name,
                    count,
                },
            )],
        ))
    }

    /// Marks a participant disconnected.
    ///
    /// # Errors
    ///
    /// Fails for an id not seated in this room.
    pub fn disconnect(&mut self, id: ParticipantId) -> RoomResult<Vec<Outbound>> {
        self.engine.set_connected(id, false)?;
        info!(room = %self.code, participant = %id, "participant disconnected");
        Ok(vec![Outbound::new(
            Recipient::Moderator,
            ServerMessage::PlayerDisconnected { participant: id },
        )])
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Runs one command and returns the messages it produces.
    ///
    /// `now` is the caller's clock, used to schedule observer transitions.
    pub fn dispatch(
        &mut self,
        sender: Sender,
        message: ClientMessage,
        now: Instant,
    ) -> Vec<Outbound> {
        let moderator = message.is_moderator_command();
        match self.handle(sender, message, now) {
            Ok(out) => out,
            Err(err) => {
                if moderator {
                    warn!(room = %self.code, code = err.code(), %err, "moderator command rejected");
                } else {
                    debug!(room = %self.code, ?sender, code = err.code(), "command rejected");
                }
                vec![Outbound::new(
                    sender.into(),
                    ServerMessage::Error {
                        code: err.code(),
                        message: err.to_string(),
                    },
                )]
            }
        }
    }

    /// Applies every observer transition due at `now`.
    pub fn poll(&mut self, now: Instant) -> Vec<Outbound> {
        let mut out = Vec::new();
        for id in self.observers.take_due(now) {
            if self.engine.transition_to_observer(id) {
                out.push(Outbound::new(
                    Recipient::Participant(id),
                    ServerMessage::ObserverMode,
                ));
                out.push(Outbound::new(
                    Recipient::Moderator,
                    ServerMessage::ObserverJoined { participant: id },
                ));
            }
        }
        out
    }

    fn handle(
        &mut self,
        sender: Sender,
        message: ClientMessage,
        now: Instant,
    ) -> RoomResult<Vec<Outbound>> {
        match sender {
            Sender::Moderator if message.is_moderator_command() => {
                self.moderator_command(message, now)
            }
            Sender::Participant(id) if !message.is_moderator_command() => {
                if self.engine.participant(id).is_none() {
                    return Err(RoomError::UnknownParticipant(id));
                }
                self.participant_command(id, message)
            }
            _ => Err(RoomError::Forbidden),
        }
    }

    fn moderator_command(
        &mut self,
        message: ClientMessage,
        now: Instant,
    ) -> RoomResult<Vec<Outbound>> {
        if !self.started && message != ClientMessage::StartGame {
            return Err(RoomError::NotStarted);
        }
        debug!(room = %self.code, ?message, "moderator command");
        match message {
            ClientMessage::StartGame => self.start_game(),
            ClientMessage::NextEvent => self.next_event(now),
            ClientMessage::StartSilence => self.change_phase(Phase::Hushed),
            ClientMessage::StartDiscussion => self.change_phase(Phase::Discussion),
            ClientMessage::StartVoting => self.change_phase(Phase::Voting),
            ClientMessage::VoteTimeout => Ok(self.fill_timeouts()),
            ClientMessage::EndVoting => self.end_voting(now),
            ClientMessage::ShowEnding => self.show_ending(),
            _ => Err(RoomError::Forbidden),
        }
    }

    fn participant_command(
        &mut self,
        id: ParticipantId,
        message: ClientMessage,
    ) -> RoomResult<Vec<Outbound>> {
        match message {
            ClientMessage::Vote { choice } => self.vote(id, choice),
            ClientMessage::UseAbility { target } => self.use_ability(id, target),
            ClientMessage::GetPlayers => Ok(self.player_list(id)),
            ClientMessage::SendNote { target, text } => self.pass_note(id, target, &text, false),
            ClientMessage::ReplyNote { target, text } => self.pass_note(id, target, &text, true),
            _ => Err(RoomError::Forbidden),
        }
    }

    // =========================================================================
    // Moderator commands
    // =========================================================================

    fn start_game(&mut self) -> RoomResult<Vec<Outbound>> {
        if self.started {
            return Err(RoomError::AlreadyStarted);
        }
        let dealt = self.engine.assign_roles()?;
        self.started = true;
        info!(room = %self.code, participants = dealt.len(), "game started");

        let mut out: Vec<Outbound> = dealt
            .into_iter()
            .map(|(id, role)| {
                Outbound::new(Recipient::Participant(id), ServerMessage::GameStarted { role })
            })
            .collect();
        out.push(Outbound::new(
            Recipient::Moderator,
            ServerMessage::HostGameStarted {
                host_view: self.engine.host_view(),
            },
        ));
        Ok(out)
    }

    fn next_event(&mut self, now: Instant) -> RoomResult<Vec<Outbound>> {
        let opening = self.engine.advance_round()?;
        let mut out = Vec::with_capacity(self.engine.registry().len() + 1);
        for participant in self.engine.registry().iter() {
            out.push(Outbound::new(
                Recipient::Participant(participant.id()),
                ServerMessage::Event {
                    round: opening.round,
                    deferred: opening.deferred,
                    choices: self.engine.choices_for(participant.id())?,
                },
            ));
        }
        let deferred = opening.deferred;
        out.push(Outbound::new(
            Recipient::Moderator,
            ServerMessage::HostEvent {
                opening,
                host_view: self.engine.host_view(),
            },
        ));

        if deferred {
            let result = self.engine.settle_deferred()?;
            self.schedule_observers(&result.removed, now);
            out.extend(self.deferred_messages(result));
        }
        Ok(out)
    }

    fn change_phase(&mut self, phase: Phase) -> RoomResult<Vec<Outbound>> {
        self.engine.set_phase(phase)?;
        let public_voting = self
            .engine
            .round()
            .flags()
            .contains(RoundFlags::PUBLIC_VOTING);
        Ok(vec![Outbound::new(
            Recipient::Everyone,
            ServerMessage::PhaseChanged {
                phase,
                public_voting,
            },
        )])
    }

    fn fill_timeouts(&mut self) -> Vec<Outbound> {
        let filled = self.engine.auto_fill_timeouts();
        if filled.is_empty() {
            return Vec::new();
        }
        let votes = self.engine.round().votes();
        let mut out: Vec<Outbound> = filled
            .iter()
            .filter_map(|id| {
                votes.get(id).map(|&choice| {
                    Outbound::new(
                        Recipient::Participant(*id),
                        ServerMessage::AutoVoted { choice },
                    )
                })
            })
            .collect();
        out.push(Outbound::new(
            Recipient::Moderator,
            ServerMessage::VotesFilled {
                participants: filled,
            },
        ));
        out
    }

    fn end_voting(&mut self, now: Instant) -> RoomResult<Vec<Outbound>> {
        let mut out = self.fill_timeouts();
        let result = self.engine.settle_round()?;
        self.schedule_observers(&result.removed, now);
        out.extend(self.round_messages(result));
        Ok(out)
    }

    fn show_ending(&mut self) -> RoomResult<Vec<Outbound>> {
        let result = self.engine.determine_ending()?;
        let mut out: Vec<Outbound> = result
            .personal
            .iter()
            .map(|personal| {
                Outbound::new(
                    Recipient::Participant(personal.participant),
                    ServerMessage::Ending {
                        social: result.social,
                        metrics: result.metrics,
                        personal: personal.clone(),
                    },
                )
            })
            .collect();
        out.push(Outbound::new(
            Recipient::Moderator,
            ServerMessage::HostEnding { result },
        ));
        Ok(out)
    }

    fn schedule_observers(&mut self, removed: &[ParticipantId], now: Instant) {
        let due = now + self.config.observer_delay();
        for &id in removed {
            self.observers.schedule(id, due);
        }
    }

    fn round_messages(&self, result: RoundResult) -> Vec<Outbound> {
        let summary = PublicRoundSummary::from(&result);
        let mut out: Vec<Outbound> = result
            .outcomes
            .iter()
            .map(|outcome| {
                Outbound::new(
                    Recipient::Participant(outcome.participant),
                    ServerMessage::RoundResult {
                        summary: summary.clone(),
                        outcome: outcome.clone(),
                    },
                )
            })
            .collect();
        out.push(Outbound::new(
            Recipient::Moderator,
            ServerMessage::HostRoundResult {
                result,
                host_view: self.engine.host_view(),
            },
        ));
        out
    }

    fn deferred_messages(&self, result: DeferredResult) -> Vec<Outbound> {
        let metrics = self.engine.metrics();
        let mut out: Vec<Outbound> = result
            .outcomes
            .iter()
            .map(|outcome| {
                Outbound::new(
                    Recipient::Participant(outcome.participant),
                    ServerMessage::DeferredResult {
                        metrics,
                        removed: result.removed.clone(),
                        outcome: outcome.clone(),
                    },
                )
            })
            .collect();
        out.push(Outbound::new(
            Recipient::Moderator,
            ServerMessage::HostDeferredResult {
                result,
                host_view: self.engine.host_view(),
            },
        ));
        out
    }

    // =========================================================================
    // Participant commands
    // =========================================================================

    fn vote(&mut self, id: ParticipantId, choice: String) -> RoomResult<Vec<Outbound>> {
        self.engine.submit_vote(id, &choice)?;
        let mut out = vec![
            Outbound::new(
                Recipient::Participant(id),
                ServerMessage::VoteConfirmed {
                    choice: choice.clone(),
                },
            ),
            Outbound::new(
                Recipient::Moderator,
                ServerMessage::VoteReceived {
                    participant: id,
                    choice: choice.clone(),
                    all_voted: self.engine.all_voted(),
                },
            ),
        ];
        if self
            .engine
            .round()
            .flags()
            .contains(RoundFlags::PUBLIC_VOTING)
        {
            let name = self
                .engine
                .participant(id)
                .map(|p| p.name().to_owned())
                .unwrap_or_default();
            out.push(Outbound::new(
                Recipient::Participants,
                ServerMessage::PublicVote {
                    participant: id,
                    name,
                    choice,
                },
            ));
        }
        Ok(out)
    }

    fn use_ability(
        &mut self,
        id: ParticipantId,
        target: Option<ParticipantId>,
    ) -> RoomResult<Vec<Outbound>> {
        let receipt = self.engine.activate_ability(id, target)?;
        info!(room = %self.code, participant = %id, kind = ?receipt.kind, "ability used");

        let mut out = vec![
            Outbound::new(
                Recipient::Participant(id),
                ServerMessage::AbilityResult { receipt },
            ),
            Outbound::new(
                Recipient::Moderator,
                ServerMessage::AbilityUsed {
                    receipt,
                    host_view: self.engine.host_view(),
                },
            ),
            Outbound::new(
                Recipient::AllExcept(id),
                ServerMessage::AbilityBroadcast {
                    role: receipt.broadcast,
                },
            ),
        ];
        if receipt.kind == AbilityKind::PublicVoting {
            out.push(Outbound::new(
                Recipient::Participants,
                ServerMessage::PublicVoteAnnounced,
            ));
        }
        Ok(out)
    }

    fn player_list(&self, id: ParticipantId) -> Vec<Outbound> {
        let players = self
            .engine
            .registry()
            .iter()
            .filter(|p| p.id() != id && !p.is_removed())
            .map(|p| PlayerEntry {
                id: p.id(),
                name: p.name().to_owned(),
            })
            .collect();
        vec![Outbound::new(
            Recipient::Participant(id),
            ServerMessage::PlayerList { players },
        )]
    }

    fn pass_note(
        &mut self,
        id: ParticipantId,
        target: ParticipantId,
        text: &str,
        reply: bool,
    ) -> RoomResult<Vec<Outbound>> {
        if self.engine.participant(target).is_none() {
            return Err(RoomError::UnknownParticipant(target));
        }
        if self.engine.participant(id).is_some_and(|p| p.is_removed()) {
            return Err(RoomError::SenderRemoved);
        }
        let quota = self.config.note_quota;
        let body = self
            .notes
            .check(id, target, text, quota, self.config.note_max_chars)?
            .to_owned();
        let remaining = self.notes.record(id, quota);
        debug!(room = %self.code, from = %id, to = %target, reply, remaining, "note passed");

        Ok(vec![
            Outbound::new(
                Recipient::Participant(id),
                ServerMessage::NoteSent { remaining },
            ),
            Outbound::new(
                Recipient::Participant(target),
                ServerMessage::NoteReceived {
                    from: id,
                    text: body,
                    reply,
                },
            ),
        ])
    }
}

//! Test helpers for setting up rooms.

use std::time::{Duration, Instant};

use silent_island_core::{GameConfig, ParticipantId, Role};

use crate::config::RoomConfig;
use crate::protocol::{ClientMessage, Outbound, Sender, ServerMessage};
use crate::room::Room;

/// Room whose participants are removed at risk 1 and become observers after
/// one second.
pub fn fragile_config() -> RoomConfig {
    RoomConfig {
        observer_delay_ms: 1_000,
        game: GameConfig {
            removal_threshold: 1,
            ..GameConfig::default()
        },
        ..RoomConfig::default()
    }
}

/// Room with `n` seated participants, not started.
pub fn seated_room(n: usize, config: RoomConfig) -> (Room, Vec<ParticipantId>) {
    let mut room = Room::new("1234", config, 42);
    let ids = (0..n)
        .map(|i| room.join(format!("P{}", i + 1)).expect("seat").0)
        .collect();
    (room, ids)
}

/// Room with `n` participants and roles dealt.
pub fn started_room(n: usize, config: RoomConfig) -> (Room, Vec<ParticipantId>) {
    let (mut room, ids) = seated_room(n, config);
    let out = moderator(&mut room, ClientMessage::StartGame);
    assert!(error_code(&out).is_none(), "start failed: {out:?}");
    (room, ids)
}

/// Fixed clock for dispatch.
pub fn epoch() -> Instant {
    static EPOCH: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

/// `epoch()` plus `secs`.
pub fn at(secs: u64) -> Instant {
    epoch() + Duration::from_secs(secs)
}

/// Dispatches a moderator command at `epoch()`.
pub fn moderator(room: &mut Room, message: ClientMessage) -> Vec<Outbound> {
    room.dispatch(Sender::Moderator, message, epoch())
}

/// Dispatches a participant command at `epoch()`.
pub fn participant(room: &mut Room, id: ParticipantId, message: ClientMessage) -> Vec<Outbound> {
    room.dispatch(Sender::Participant(id), message, epoch())
}

/// Opens the next round and moves it to voting.
pub fn open_voting(room: &mut Room) {
    for command in [ClientMessage::NextEvent, ClientMessage::StartVoting] {
        let out = moderator(room, command);
        assert!(error_code(&out).is_none(), "{out:?}");
    }
}

/// Messages that reach `endpoint`.
pub fn received(out: &[Outbound], endpoint: Sender) -> Vec<&ServerMessage> {
    out.iter()
        .filter(|o| o.recipient.reaches(endpoint))
        .map(|o| &o.message)
        .collect()
}

/// Code of the first error message, if any.
pub fn error_code(out: &[Outbound]) -> Option<&'static str> {
    out.iter().find_map(|o| match o.message {
        ServerMessage::Error { code, .. } => Some(code),
        _ => None,
    })
}

/// Participant dealt `role`.
pub fn holder_of(room: &Room, role: Role) -> Option<ParticipantId> {
    room.engine()
        .registry()
        .iter()
        .find(|p| p.role() == Some(role))
        .map(silent_island_core::Participant::id)
}

/// Sends a note.
pub fn note(text: &str, target: ParticipantId) -> ClientMessage {
    ClientMessage::SendNote {
        target,
        text: text.to_owned(),
    }
}

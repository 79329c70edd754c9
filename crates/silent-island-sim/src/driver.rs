//! Plays one game through a room, as a moderator and its participants would.

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use silent_island_core::rules::FINAL_ROUND;
use silent_island_core::{ChoiceOption, EndingResult, Participant, ParticipantId};
use silent_island_room::{
    ClientMessage, Outbound, Room, RoomConfig, RoomError, RoomManager, Sender, ServerMessage,
};
use tracing::{debug, info};

use crate::strategy::Strategy;

/// Simulated time between two rounds. Longer than any observer delay.
const ROUND_LENGTH: Duration = Duration::from_secs(60);

/// Chance per round that an unused ability is spent.
const ABILITY_CHANCE: f64 = 0.2;

/// Parameters of one simulated game.
#[derive(Debug, Clone, Copy)]
pub struct SimOptions {
    /// Seed for the room and every strategy draw.
    pub seed: u64,
    /// Number of participants.
    pub players: usize,
    /// How participants vote.
    pub strategy: Strategy,
}

/// Plays a full game and returns its endings.
///
/// # Errors
///
/// Fails if the room rejects a moderator command, for example when the
/// participant count is outside the configured range.
pub fn run(config: RoomConfig, options: &SimOptions) -> Result<EndingResult> {
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let manager = RoomManager::new(config);
    let (code, shared) = manager.create_room(&mut rng)?;
    let mut room = shared.write().map_err(|_| RoomError::LockPoisoned)?;
    info!(room = %code, link = %manager.join_link(&code), "room open");

    let mut ids = Vec::with_capacity(options.players);
    for i in 0..options.players {
        let (id, _) = room.join(format!("Player {}", i + 1))?;
        ids.push(id);
    }

    let mut clock = Instant::now();
    moderate(&mut room, ClientMessage::StartGame, clock)?;

    for _ in 0..FINAL_ROUND {
        let opened = moderate(&mut room, ClientMessage::NextEvent, clock)?;
        if room.engine().round().is_settled() {
            info!(
                round = room.engine().round().number,
                metrics = ?room.engine().metrics(),
                "deferred round settled"
            );
        } else {
            play_round(&mut room, &ids, &opened, options.strategy, &mut rng, clock)?;
        }
        clock += ROUND_LENGTH;
        room.poll(clock);
    }

    let out = moderate(&mut room, ClientMessage::ShowEnding, clock)?;
    out.into_iter()
        .find_map(|o| match o.message {
            ServerMessage::HostEnding { result } => Some(result),
            _ => None,
        })
        .context("room produced no ending")
}

fn play_round<R: Rng + ?Sized>(
    room: &mut Room,
    ids: &[ParticipantId],
    opened: &[Outbound],
    strategy: Strategy,
    rng: &mut R,
    clock: Instant,
) -> Result<()> {
    let active: Vec<ParticipantId> = ids
        .iter()
        .copied()
        .filter(|id| room.engine().participant(*id).is_some_and(Participant::is_active))
        .collect();

    if strategy.uses_abilities() {
        for &id in &active {
            let spent = room.engine().participant(id).map_or(true, Participant::ability_used);
            if spent || !rng.gen_bool(ABILITY_CHANCE) {
                continue;
            }
            let target = ids.choose(rng).copied();
            let out = room.dispatch(
                Sender::Participant(id),
                ClientMessage::UseAbility { target },
                clock,
            );
            debug!(participant = %id, rejected = rejection(&out).is_some(), "ability attempt");
        }
    }

    for command in [
        ClientMessage::StartSilence,
        ClientMessage::StartDiscussion,
        ClientMessage::StartVoting,
    ] {
        moderate(room, command, clock)?;
    }

    for &id in &active {
        let Some(choice) = strategy.pick(choices_for(opened, id), rng) else {
            continue;
        };
        let out = room.dispatch(
            Sender::Participant(id),
            ClientMessage::Vote {
                choice: choice.to_owned(),
            },
            clock,
        );
        if let Some(code) = rejection(&out) {
            debug!(participant = %id, choice, code, "vote rejected");
        }
    }

    let out = moderate(room, ClientMessage::EndVoting, clock)?;
    if let Some(ServerMessage::HostRoundResult { result, .. }) = out
        .iter()
        .map(|o| &o.message)
        .find(|m| matches!(m, ServerMessage::HostRoundResult { .. }))
    {
        info!(
            round = result.round,
            pressure = result.pressure,
            circulation = result.circulation,
            mood = ?result.mood,
            removed = result.removed.len(),
            "round played"
        );
    }
    Ok(())
}

/// Sends a moderator command and fails on any error reply.
fn moderate(room: &mut Room, command: ClientMessage, clock: Instant) -> Result<Vec<Outbound>> {
    let out = room.dispatch(Sender::Moderator, command.clone(), clock);
    if let Some(ServerMessage::Error { code, message }) = out.first().map(|o| &o.message) {
        bail!("{command:?} rejected ({code}): {message}");
    }
    Ok(out)
}

fn rejection(out: &[Outbound]) -> Option<&'static str> {
    out.iter().find_map(|o| match o.message {
        ServerMessage::Error { code, .. } => Some(code),
        _ => None,
    })
}

/// Choices shown to `id` in a round opening.
fn choices_for(opened: &[Outbound], id: ParticipantId) -> &[ChoiceOption] {
    opened
        .iter()
        .filter(|o| o.recipient.reaches(Sender::Participant(id)))
        .find_map(|o| match &o.message {
            ServerMessage::Event { choices, .. } => Some(choices.as_slice()),
            _ => None,
        })
        .unwrap_or(&[])
}

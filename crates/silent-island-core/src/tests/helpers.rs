//! Test helpers for setting up games.

use std::collections::VecDeque;

use crate::config::GameConfig;
use crate::engine::GameEngine;
use crate::participant::ParticipantId;
use crate::rng::{CoinFace, RandomSource};
use crate::round::Phase;

// =============================================================================
// Scripted randomness
// =============================================================================

/// A random source that replays scripted draws.
///
/// When the script runs out, coins land tails and `index_below` returns the
/// last index, which makes `shuffle` the identity permutation.
#[derive(Debug, Default, Clone)]
pub struct ScriptedRandom {
    coins: VecDeque<CoinFace>,
    indices: VecDeque<usize>,
}

impl ScriptedRandom {
    /// Creates a source that flips the given faces in order.
    pub fn with_coins(coins: impl IntoIterator<Item = CoinFace>) -> Self {
        Self {
            coins: coins.into_iter().collect(),
            indices: VecDeque::new(),
        }
    }

    /// Queues more coin faces.
    pub fn push_coins(&mut self, coins: impl IntoIterator<Item = CoinFace>) {
        self.coins.extend(coins);
    }
}

impl RandomSource for ScriptedRandom {
    fn coin_flip(&mut self) -> CoinFace {
        self.coins.pop_front().unwrap_or(CoinFace::Tails)
    }

    fn index_below(&mut self, upper: usize) -> usize {
        self.indices
            .pop_front()
            .map_or(upper - 1, |i| i.min(upper - 1))
    }
}

// =============================================================================
// Game setup
// =============================================================================

/// Builds a game of `n` participants with roles dealt.
///
/// With the identity shuffle, roles follow the pool order: participant 1 is
/// the Teacher, 2 the Civil Servant, 3 the Student, 4 the Bystander and 5 a
/// Citizen. From seven participants, 6 is the Enforcer; at eight, 7 is the
/// Relative. Every other seat is a Citizen.
pub fn scripted_game(n: usize, coins: &[CoinFace]) -> (GameEngine<ScriptedRandom>, Vec<ParticipantId>) {
    let mut engine = GameEngine::new(
        GameConfig::default(),
        ScriptedRandom::with_coins(coins.iter().copied()),
    );
    let ids = (0..n)
        .map(|i| engine.add_participant(format!("P{}", i + 1)))
        .collect();
    engine.assign_roles().expect("roles");
    (engine, ids)
}

/// Opens the next round and moves it to voting.
pub fn open_voting<R: RandomSource>(engine: &mut GameEngine<R>) -> u8 {
    let opening = engine.advance_round().expect("round opens");
    engine.set_phase(Phase::Voting).expect("phase");
    opening.round
}

/// Submits one vote per participant, pairing ids and keys in order.
pub fn vote_all<R: RandomSource>(engine: &mut GameEngine<R>, ids: &[ParticipantId], keys: &[&str]) {
    for (id, key) in ids.iter().zip(keys) {
        engine.submit_vote(*id, key).expect("vote accepted");
    }
}

/// Current risk of a participant.
pub fn risk_of<R: RandomSource>(engine: &GameEngine<R>, id: ParticipantId) -> u32 {
    engine.participant(id).map_or(0, crate::participant::Participant::risk)
}

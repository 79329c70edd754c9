//! # Silent Island Room
//!
//! Transport-agnostic room layer around [`silent_island_core::GameEngine`].
//!
//! A [`RoomManager`] hands out rooms under four-digit codes. Each [`Room`]
//! seats participants, authorizes and runs [`ClientMessage`] commands, and
//! answers with [`Outbound`] messages addressed to a [`Recipient`]. The caller
//! owns sockets and clocks: it delivers the messages and calls
//! [`Room::poll`] to apply delayed observer transitions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::time::Instant;
//! use silent_island_room::{ClientMessage, RoomManager, Sender};
//!
//! let manager = RoomManager::default();
//! let (code, room) = manager.create_room(&mut rand::thread_rng())?;
//! let mut room = room.write().map_err(|_| RoomError::LockPoisoned)?;
//! let (id, _) = room.join("Ana")?;
//! for out in room.dispatch(Sender::Participant(id), ClientMessage::GetPlayers, Instant::now()) {
//!     // deliver out.message to out.recipient
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod manager;
pub mod notes;
pub mod observer;
pub mod protocol;
pub mod room;

#[cfg(test)]
mod tests;

pub use config::RoomConfig;
pub use error::{RoomError, RoomResult};
pub use manager::{RoomManager, SharedRoom};
pub use protocol::{ClientMessage, Outbound, Recipient, Sender, ServerMessage};
pub use room::{join_link, Room};

//! Room-level test suites.
//!
//! - `helpers.rs`: room setup and outbound filtering
//! - `dispatch.rs`: commands driven through `Room::dispatch`
//! - `notes.rs`: the note side-channel and observer transitions

mod helpers;
mod notes;

pub use helpers::*;

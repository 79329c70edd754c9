//! Engine-level test suites.
//!
//! - `helpers.rs`: scripted randomness and game setup utilities
//! - `integration.rs`: full games driven through the public operations
//! - `determinism.rs`: same seed and calls, same game
//! - `properties.rs`: invariants checked over generated vote sequences

mod helpers;

pub use helpers::*;

//! The two shared metrics.

use serde::{Deserialize, Serialize};

/// Collective state of the island.
///
/// Both counters are unbounded above and clamped at zero after every
/// committed delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalMetrics {
    /// Collective fear and repression.
    pub pressure: u32,
    /// Spread of dissenting thought.
    pub circulation: u32,
}

impl GlobalMetrics {
    /// Creates metrics with explicit values.
    #[must_use]
    pub const fn new(pressure: u32, circulation: u32) -> Self {
        Self {
            pressure,
            circulation,
        }
    }

    /// Applies signed deltas, clamping both counters at zero.
    pub fn apply(&mut self, pressure_delta: i32, circulation_delta: i32) {
        self.pressure = self.pressure.saturating_add_signed(pressure_delta);
        self.circulation = self.circulation.saturating_add_signed(circulation_delta);
    }

    /// Circulation as it would stand after `delta`, without committing.
    #[must_use]
    pub fn projected_circulation(&self, delta: i32) -> u32 {
        self.circulation.saturating_add_signed(delta)
    }
}

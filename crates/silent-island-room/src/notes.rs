//! Private notes between participants.

use std::collections::BTreeMap;

use silent_island_core::ParticipantId;

use crate::error::RoomError;

/// Notes sent per participant. Sends and replies draw from one quota.
#[derive(Debug, Clone, Default)]
pub struct NoteLedger {
    sent: BTreeMap<ParticipantId, u32>,
}

impl NoteLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes `sender` has sent so far.
    #[must_use]
    pub fn sent_by(&self, sender: ParticipantId) -> u32 {
        self.sent.get(&sender).copied().unwrap_or(0)
    }

    /// Validates a note against the quota and length limits.
    ///
    /// Returns the trimmed body. Nothing is recorded.
    ///
    /// # Errors
    ///
    /// Checked in order: quota spent, empty or too long, self-addressed.
    pub fn check<'a>(
        &self,
        sender: ParticipantId,
        target: ParticipantId,
        text: &'a str,
        quota: u32,
        max_chars: usize,
    ) -> Result<&'a str, RoomError> {
        if self.sent_by(sender) >= quota {
            return Err(RoomError::NoteQuotaExhausted { quota });
        }
        let body = text.trim();
        let len = body.chars().count();
        if len == 0 || len > max_chars {
            return Err(RoomError::NoteLength { max: max_chars });
        }
        if sender == target {
            return Err(RoomError::NoteToSelf);
        }
        Ok(body)
    }

    /// Records a sent note and returns the notes left.
    pub fn record(&mut self, sender: ParticipantId, quota: u32) -> u32 {
        let sent = self.sent.entry(sender).or_insert(0);
        *sent += 1;
        quota.saturating_sub(*sent)
    }
}

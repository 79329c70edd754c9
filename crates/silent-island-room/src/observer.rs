//! Delayed observer transitions.

use std::collections::BTreeMap;
use std::time::Instant;

use silent_island_core::ParticipantId;

/// Removed participants waiting to become observers.
#[derive(Debug, Clone, Default)]
pub struct ObserverSchedule {
    pending: BTreeMap<ParticipantId, Instant>,
}

impl ObserverSchedule {
    /// Creates an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `id` for `due`. An existing entry keeps its earlier time.
    pub fn schedule(&mut self, id: ParticipantId, due: Instant) {
        self.pending
            .entry(id)
            .and_modify(|at| *at = (*at).min(due))
            .or_insert(due);
    }

    /// Removes and returns every entry due at `now`, in join order.
    pub fn take_due(&mut self, now: Instant) -> Vec<ParticipantId> {
        let due: Vec<ParticipantId> = self
            .pending
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(id, _)| *id)
            .collect();
        for id in &due {
            self.pending.remove(id);
        }
        due
    }

    /// Entries not yet due.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn entries_fire_once_when_due() {
        let start = Instant::now();
        let mut schedule = ObserverSchedule::new();
        schedule.schedule(ParticipantId::new(2), start + Duration::from_secs(5));
        schedule.schedule(ParticipantId::new(1), start + Duration::from_secs(1));

        assert!(schedule.take_due(start).is_empty());
        assert_eq!(
            schedule.take_due(start + Duration::from_secs(1)),
            vec![ParticipantId::new(1)]
        );
        assert_eq!(schedule.len(), 1);
        assert_eq!(
            schedule.take_due(start + Duration::from_secs(10)),
            vec![ParticipantId::new(2)]
        );
        assert!(schedule.is_empty());
    }

    #[test]
    fn rescheduling_keeps_earliest() {
        let start = Instant::now();
        let mut schedule = ObserverSchedule::new();
        schedule.schedule(ParticipantId::new(1), start + Duration::from_secs(1));
        schedule.schedule(ParticipantId::new(1), start + Duration::from_secs(9));
        assert_eq!(
            schedule.take_due(start + Duration::from_secs(1)),
            vec![ParticipantId::new(1)]
        );
    }
}

//! Participant registry.
//!
//! The registry stores participants in a `BTreeMap` keyed by monotonically
//! allocated ids, so iteration order is join order on every platform. The
//! settlement pipeline relies on this for reproducible note ordering.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::participant::{Participant, ParticipantId};

/// Container for every participant of one game.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParticipantRegistry {
    participants: BTreeMap<ParticipantId, Participant>,
    next_id: u64,
}

impl ParticipantRegistry {
    /// Creates an empty registry. The first participant receives id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            participants: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Adds a participant and returns the allocated id.
    pub fn join(&mut self, name: impl Into<String>) -> ParticipantId {
        if self.next_id == 0 {
            self.next_id = 1;
        }
        let id = ParticipantId::new(self.next_id);
        self.next_id += 1;
        self.participants.insert(id, Participant::new(id, name));
        id
    }

    /// Returns the participant with the given id.
    #[must_use]
    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// Returns a mutable reference to the participant with the given id.
    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(&id)
    }

    /// Returns true if the id is registered.
    #[must_use]
    pub fn contains(&self, id: ParticipantId) -> bool {
        self.participants.contains_key(&id)
    }

    /// Number of registered participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Returns true if nobody has joined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Iterates participants in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Iterates participants mutably in join order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.participants.values_mut()
    }

    /// Iterates ids in join order.
    pub fn ids(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.participants.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_from_one() {
        let mut registry = ParticipantRegistry::new();
        let a = registry.join("A");
        let b = registry.join("B");
        assert_eq!(a.as_u64(), 1);
        assert_eq!(b.as_u64(), 2);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn default_registry_also_starts_at_one() {
        let mut registry = ParticipantRegistry::default();
        assert_eq!(registry.join("A").as_u64(), 1);
    }

    #[test]
    fn lookup_and_len() {
        let mut registry = ParticipantRegistry::new();
        assert!(registry.is_empty());
        let id = registry.join("Lin");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(id));
        assert_eq!(registry.get(id).map(Participant::name), Some("Lin"));
        assert!(registry.get(ParticipantId::new(99)).is_none());
    }
}

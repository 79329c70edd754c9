//! Room registry.
//!
//! Rooms are shared as `Arc<RwLock<Room>>`: lookups take the registry's read
//! lock, and each room serializes its own mutations. A poisoned lock surfaces
//! as [`RoomError::LockPoisoned`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rand::Rng;
use tracing::info;

use crate::config::RoomConfig;
use crate::error::{RoomError, RoomResult};
use crate::room::{join_link, Room};

/// A room shared between connections.
pub type SharedRoom = Arc<RwLock<Room>>;

/// Number of distinct four-digit codes.
const CODE_SPACE: u16 = 10_000;

/// Creates, finds and drops rooms by code.
#[derive(Debug, Default)]
pub struct RoomManager {
    config: RoomConfig,
    rooms: RwLock<HashMap<String, SharedRoom>>,
}

impl RoomManager {
    /// Creates a manager whose rooms use `config`.
    #[must_use]
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a room under a fresh four-digit code.
    ///
    /// The engine seed is drawn from `rng` as well.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::NoFreeCode`] when every code is taken and
    /// [`RoomError::LockPoisoned`] if the registry lock is poisoned.
    pub fn create_room<R: Rng + ?Sized>(&self, rng: &mut R) -> RoomResult<(String, SharedRoom)> {
        let mut rooms = self.rooms.write().map_err(|_| RoomError::LockPoisoned)?;
        if rooms.len() >= usize::from(CODE_SPACE) {
            return Err(RoomError::NoFreeCode);
        }
        let code = loop {
            let candidate = format!("{:04}", rng.gen_range(0..CODE_SPACE));
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let room = Arc::new(RwLock::new(Room::new(
            code.clone(),
            self.config.clone(),
            rng.gen(),
        )));
        rooms.insert(code.clone(), Arc::clone(&room));
        info!(room = %code, open = rooms.len(), "room created");
        Ok((code, room))
    }

    /// Looks up a room.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::RoomNotFound`] for an unknown code.
    pub fn get(&self, code: &str) -> RoomResult<SharedRoom> {
        let rooms = self.rooms.read().map_err(|_| RoomError::LockPoisoned)?;
        rooms
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(code.to_owned()))
    }

    /// Drops a room. Returns false if no room had this code.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::LockPoisoned`] if the registry lock is poisoned.
    pub fn remove(&self, code: &str) -> RoomResult<bool> {
        let mut rooms = self.rooms.write().map_err(|_| RoomError::LockPoisoned)?;
        let removed = rooms.remove(code).is_some();
        if removed {
            info!(room = %code, "room removed");
        }
        Ok(removed)
    }

    /// Number of open rooms.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::LockPoisoned`] if the registry lock is poisoned.
    pub fn len(&self) -> RoomResult<usize> {
        let rooms = self.rooms.read().map_err(|_| RoomError::LockPoisoned)?;
        Ok(rooms.len())
    }

    /// Join URL for `code` under the configured base URL.
    #[must_use]
    pub fn join_link(&self, code: &str) -> String {
        join_link(&self.config.base_url, code)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn codes_are_four_digits_and_unique() {
        let manager = RoomManager::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut codes = Vec::new();
        for _ in 0..200 {
            let (code, _) = manager.create_room(&mut rng).unwrap();
            assert_eq!(code.len(), 4);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            codes.push(code);
        }
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 200);
        assert_eq!(manager.len().unwrap(), 200);
    }

    #[test]
    fn get_and_remove() {
        let manager = RoomManager::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let (code, room) = manager.create_room(&mut rng).unwrap();

        let found = manager.get(&code).unwrap();
        assert!(Arc::ptr_eq(&room, &found));
        assert_eq!(found.read().unwrap().code(), code);

        assert!(manager.remove(&code).unwrap());
        assert!(!manager.remove(&code).unwrap());
        assert_eq!(
            manager.get(&code).unwrap_err(),
            RoomError::RoomNotFound(code.clone())
        );
    }

    #[test]
    fn rooms_share_state_through_the_handle() {
        let manager = RoomManager::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (code, room) = manager.create_room(&mut rng).unwrap();
        room.write().unwrap().join("Ana").unwrap();
        let again = manager.get(&code).unwrap();
        assert_eq!(again.read().unwrap().engine().registry().len(), 1);
    }

    #[test]
    fn join_link_uses_base_url() {
        let manager = RoomManager::new(RoomConfig {
            base_url: "https://island.example/".into(),
            ..RoomConfig::default()
        });
        assert_eq!(
            manager.join_link("0042"),
            "https://island.example/join?room=0042"
        );
    }
}

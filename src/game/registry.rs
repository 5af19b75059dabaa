//! Player Registry
//!
//! The authoritative map from player id to player state. Uses BTreeMap so
//! snapshots serialize in a stable order.

use std::collections::BTreeMap;

use crate::core::bounds::Rect;
use crate::core::rng::SpawnRng;
use crate::game::player::{Player, PlayerId};

/// Full-state snapshot as sent in `init` and `update`.
pub type Snapshot = BTreeMap<PlayerId, Player>;

/// Owns every live player.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: BTreeMap<PlayerId, Player>,
}

impl PlayerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a player with a fresh id at a random point of `spawn_area`.
    pub fn create(&mut self, name: &str, spawn_area: &Rect, rng: &mut SpawnRng) -> &Player {
        let mut id = PlayerId::generate();
        while self.players.contains_key(&id) {
            id = PlayerId::generate();
        }

        let (x, y) = rng.point_in(spawn_area);
        self.players
            .entry(id)
            .or_insert_with(|| Player::new(id, name, x, y))
    }

    /// Look up a player.
    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Look up a player for mutation.
    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    /// Remove a player. Returns the removed record; `None` if already gone.
    pub fn remove(&mut self, id: &PlayerId) -> Option<Player> {
        self.players.remove(id)
    }

    /// Copy of every entry as of now.
    pub fn all(&self) -> Snapshot {
        self.players.clone()
    }

    /// Iterate mutably over every player.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    /// Check if a player exists.
    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    /// Get player count.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// True when nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

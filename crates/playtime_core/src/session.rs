//! Host session registry abstraction

use crate::types::{OnlinePlayer, PlayerId};
use parking_lot::RwLock;

/// Enumerates the players currently connected to the host.
pub trait SessionRegistry: Send + Sync {
    /// Connected players, in the host's iteration order.
    fn online_players(&self) -> Vec<OnlinePlayer>;

    /// The live session for `id`, if connected.
    fn find(&self, id: &PlayerId) -> Option<OnlinePlayer> {
        self.online_players().into_iter().find(|p| p.id == *id)
    }
}

/// Registry kept in memory by hosts that forward connect/disconnect events.
///
/// Join order is preserved so rankings stay deterministic.
#[derive(Debug, Default)]
pub struct InMemorySessions {
    players: RwLock<Vec<OnlinePlayer>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or refresh a session.
    pub fn upsert(&self, player: OnlinePlayer) {
        let mut players = self.players.write();
        match players.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => *existing = player,
            None => players.push(player),
        }
    }

    /// Update the activity counter of a connected player.
    pub fn set_activity(&self, id: &PlayerId, activity_ticks: u64) {
        if let Some(player) = self.players.write().iter_mut().find(|p| p.id == *id) {
            player.activity_ticks = activity_ticks;
        }
    }

    pub fn remove(&self, id: &PlayerId) -> Option<OnlinePlayer> {
        let mut players = self.players.write();
        let index = players.iter().position(|p| p.id == *id)?;
        Some(players.remove(index))
    }

    pub fn len(&self) -> usize {
        self.players.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.read().is_empty()
    }
}

impl SessionRegistry for InMemorySessions {
    fn online_players(&self) -> Vec<OnlinePlayer> {
        self.players.read().clone()
    }
}

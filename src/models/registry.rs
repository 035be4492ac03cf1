use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::connection::ConnectionId;
use super::lobby::{GameId, Lobby};
use crate::store::{GameSettings, GameStore};

pub type SharedRegistry = Arc<RwLock<LobbyRegistry>>;

/// Shared state handed to the transport, dispatcher and disconnect handler:
/// the process-wide lobby registry plus the durable store. Created once in
/// main, never torn down during normal operation.
#[derive(Clone)]
pub struct AppState {
    pub registry: SharedRegistry,
    pub store: Arc<dyn GameStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            registry: Arc::new(RwLock::new(LobbyRegistry::new())),
            store,
        }
    }
}

/// Process-wide mapping from game code to live session. Purely a keyed
/// container: every method is synchronous, so a registry transition can
/// never be interleaved with another connection's events mid-mutation.
#[derive(Debug, Default)]
pub struct LobbyRegistry {
    lobbies: HashMap<GameId, Lobby>,
}

impl LobbyRegistry {
    pub fn new() -> Self {
        Self {
            lobbies: HashMap::new(),
        }
    }

    pub fn get_or_create(&mut self, game_id: &str, settings: GameSettings) -> &mut Lobby {
        self.lobbies
            .entry(game_id.to_string())
            .or_insert_with(|| Lobby::new(game_id.to_string(), settings))
    }

    pub fn get(&self, game_id: &str) -> Option<&Lobby> {
        self.lobbies.get(game_id)
    }

    pub fn get_mut(&mut self, game_id: &str) -> Option<&mut Lobby> {
        self.lobbies.get_mut(game_id)
    }

    pub fn remove(&mut self, game_id: &str) {
        self.lobbies.remove(game_id);
    }

    /// Locate the session and player name a connection is seated under, if
    /// any. Linear scan over all sessions; a connection appears at most once
    /// across the registry.
    pub fn find_connection(&self, connection_id: ConnectionId) -> Option<(GameId, String)> {
        for (game_id, lobby) in &self.lobbies {
            for participant in &lobby.participants {
                if participant.connection.id() == connection_id {
                    return Some((game_id.clone(), participant.player_name.clone()));
                }
            }
        }
        None
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lobbies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::connection::ConnectionHandle;
    use tokio::sync::mpsc;

    fn test_connection() -> ConnectionHandle {
        let (tx, _rx) = mpsc::unbounded_channel();
        ConnectionHandle::new(tx)
    }

    #[test]
    fn test_get_or_create_allocates_empty_session() {
        let mut registry = LobbyRegistry::new();
        let lobby = registry.get_or_create("4217", GameSettings::default());
        assert_eq!(lobby.game_id, "4217");
        assert!(lobby.participants.is_empty());
        assert_eq!(lobby.turn_index, 0);
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut registry = LobbyRegistry::new();
        registry
            .get_or_create("4217", GameSettings::default())
            .add_participant(test_connection(), "alice".to_string())
            .unwrap();

        // A second call under the same code converges on the same session.
        let lobby = registry.get_or_create("4217", GameSettings::default());
        assert_eq!(lobby.player_names(), vec!["alice"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_then_lookup_is_absent() {
        let mut registry = LobbyRegistry::new();
        registry.get_or_create("4217", GameSettings::default());
        registry.remove("4217");
        assert!(registry.get("4217").is_none());
    }

    #[test]
    fn test_find_connection_across_sessions() {
        let mut registry = LobbyRegistry::new();
        let conn = test_connection();
        registry
            .get_or_create("1111", GameSettings::default())
            .add_participant(test_connection(), "alice".to_string())
            .unwrap();
        registry
            .get_or_create("2222", GameSettings::default())
            .add_participant(conn.clone(), "bob".to_string())
            .unwrap();

        let (game_id, name) = registry.find_connection(conn.id()).unwrap();
        assert_eq!(game_id, "2222");
        assert_eq!(name, "bob");

        let stranger = test_connection();
        assert!(registry.find_connection(stranger.id()).is_none());
    }
}

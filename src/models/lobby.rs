use super::connection::{ConnectionHandle, ConnectionId};
use crate::store::GameSettings;

pub type GameId = String;

/// Membership of one connection in one game session.
#[derive(Debug, Clone)]
pub struct Participant {
    pub connection: ConnectionHandle,
    pub player_name: String,
    pub has_answered: bool,
}

/// In-memory state for one active game code: the join-ordered roster
/// (index 0 is the host), the turn cursor, and per-round answer flags.
/// The durable record lives in the store; this is the live view of who
/// is currently connected.
#[derive(Debug)]
pub struct Lobby {
    pub game_id: GameId,
    pub participants: Vec<Participant>,
    pub turn_index: usize,
    pub settings: GameSettings,
}

impl Lobby {
    pub fn new(game_id: GameId, settings: GameSettings) -> Self {
        Self {
            game_id,
            participants: Vec::new(),
            turn_index: 0,
            settings,
        }
    }

    /// Append a participant in join order. Player names key the durable
    /// record, so a name already present in the roster is rejected.
    pub fn add_participant(
        &mut self,
        connection: ConnectionHandle,
        player_name: String,
    ) -> Result<(), &'static str> {
        if self.has_player(&player_name) {
            return Err("Player name already taken");
        }
        self.participants.push(Participant {
            connection,
            player_name,
            has_answered: false,
        });
        Ok(())
    }

    pub fn has_player(&self, player_name: &str) -> bool {
        self.participants
            .iter()
            .any(|p| p.player_name == player_name)
    }

    pub fn player_names(&self) -> Vec<String> {
        self.participants
            .iter()
            .map(|p| p.player_name.clone())
            .collect()
    }

    pub fn remove_by_name(&mut self, player_name: &str) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| p.player_name == player_name)?;
        Some(self.remove_at(index))
    }

    pub fn remove_by_connection(&mut self, connection_id: ConnectionId) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| p.connection.id() == connection_id)?;
        Some(self.remove_at(index))
    }

    // Removal below the cursor shifts every later index down by one, so the
    // cursor follows. Removal at the cursor leaves it in place: the next
    // remaining participant slides into the same slot, and the lazy wrap in
    // normalize_turn_index covers the end of the roster. Rotation therefore
    // never skips or repeats a survivor.
    fn remove_at(&mut self, index: usize) -> Participant {
        let removed = self.participants.remove(index);
        if self.participants.is_empty() {
            self.turn_index = 0;
        } else if index < self.turn_index {
            self.turn_index -= 1;
        }
        removed
    }

    /// Re-clamp the cursor against the current roster length. Must be called
    /// against live state, never a snapshot taken before an await.
    pub fn normalize_turn_index(&mut self) {
        if self.turn_index >= self.participants.len() {
            self.turn_index = 0;
        }
    }

    pub fn advance_turn(&mut self) {
        self.turn_index += 1;
    }

    pub fn mark_answered(&mut self, player_name: &str) -> bool {
        match self
            .participants
            .iter_mut()
            .find(|p| p.player_name == player_name)
        {
            Some(p) => {
                p.has_answered = true;
                true
            }
            None => false,
        }
    }

    pub fn all_answered(&self) -> bool {
        self.participants.iter().all(|p| p.has_answered)
    }

    pub fn reset_answers(&mut self) {
        for p in &mut self.participants {
            p.has_answered = false;
        }
    }
}

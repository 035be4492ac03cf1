//! Fan-out of roster and turn snapshots to every connection in a session.

use serde_json::json;

use crate::models::registry::SharedRegistry;
use crate::store::GameStore;

/// Send the current join-ordered roster to every participant of a session.
/// Index 0 is the host. No-op on an absent or empty session.
pub async fn broadcast_roster(registry: &SharedRegistry, game_id: &str) {
    let reg = registry.read().await;
    let Some(lobby) = reg.get(game_id) else {
        return;
    };
    if lobby.participants.is_empty() {
        return;
    }

    let players = lobby.player_names();
    let message = json!({
        "status": "playerUpdate",
        "host": players[0],
        "players": players,
    });
    for participant in &lobby.participants {
        participant.connection.send(message.clone());
    }
}

/// Announce the next turn: authoritative scores from the store, the ordered
/// player list, and whose turn it is. Resets every answer flag and advances
/// the cursor. No-op on an absent or empty session or an unknown record.
pub async fn broadcast_turn(registry: &SharedRegistry, store: &dyn GameStore, game_id: &str) {
    // Fetch scores before touching the registry: the roster may change while
    // this call is suspended, so everything below re-reads live state.
    let scores = match store.get_player_scores(game_id).await {
        Ok(Some(scores)) => scores,
        Ok(None) => {
            log::debug!("no record for game {}, skipping turn broadcast", game_id);
            return;
        }
        Err(e) => {
            log::error!("error loading scores for game {}: {}", game_id, e);
            return;
        }
    };

    let mut reg = registry.write().await;
    let Some(lobby) = reg.get_mut(game_id) else {
        return;
    };
    if lobby.participants.is_empty() {
        return;
    }

    // The cursor may have drifted past the end since the last mutation; wrap
    // against the current roster length, not a snapshot.
    lobby.normalize_turn_index();
    let turn = lobby.participants[lobby.turn_index].player_name.clone();

    let players: Vec<&str> = scores.iter().map(|s| s.player_name.as_str()).collect();
    let score_values: Vec<Option<i64>> = scores.iter().map(|s| s.score).collect();
    let message = json!({
        "status": "gameUpdate",
        "turn": turn,
        "players": players,
        "scores": score_values,
    });
    for participant in &lobby.participants {
        participant.connection.send(message.clone());
    }

    // New round: nobody has answered, cursor points one past the announced
    // player until the next normalization.
    lobby.reset_answers();
    lobby.advance_turn();
}

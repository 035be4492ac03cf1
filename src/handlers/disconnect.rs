//! Cleanup after abrupt connection loss: the same remove/adjust/broadcast
//! path as an explicit leave, entered from the transport instead of a command.

use crate::broadcast::{broadcast_roster, broadcast_turn};
use crate::models::connection::ConnectionId;
use crate::models::registry::AppState;

/// Locate the session the closed connection was seated in and clean it up.
/// Idempotent: a connection that never joined, or was already removed, is a
/// no-op.
pub async fn handle_disconnect(state: &AppState, connection_id: ConnectionId) {
    let seated = {
        let reg = state.registry.read().await;
        reg.find_connection(connection_id)
    };
    let Some((game_id, player_name)) = seated else {
        return;
    };
    log::info!(
        "connection {} lost, removing {} from game {}",
        connection_id,
        player_name,
        game_id
    );

    // Best-effort durable removal; in-memory cleanup proceeds regardless so a
    // dead connection can never pin a session entry forever.
    if let Err(e) = state.store.remove_player(&game_id, &player_name).await {
        log::error!("error removing {} from game {}: {}", player_name, game_id, e);
    }

    let outcome = {
        let mut reg = state.registry.write().await;
        // Re-validate after the store await: another event may have removed
        // the participant, or the whole session, in the meantime.
        let removed = match reg.get_mut(&game_id) {
            Some(lobby) => match lobby.remove_by_connection(connection_id) {
                Some(_) => Some(lobby.participants.is_empty()),
                None => None,
            },
            None => None,
        };
        if let Some(true) = removed {
            reg.remove(&game_id);
        }
        removed
    };

    match outcome {
        None => {}
        Some(true) => {
            log::info!("game {} is empty, removing durable record", game_id);
            if let Err(e) = state.store.remove_game(&game_id).await {
                log::error!("error removing game {} from store: {}", game_id, e);
            }
        }
        Some(false) => {
            broadcast_roster(&state.registry, &game_id).await;
            broadcast_turn(&state.registry, state.store.as_ref(), &game_id).await;
        }
    }
}

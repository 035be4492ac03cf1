//! Per-message state transitions: parse, validate, call the store, apply one
//! synchronous registry mutation, fan out.
//!
//! Every store call is a suspension point at which other connections' events
//! may run, so session existence and roster shape are re-validated after each
//! await and never carried across one. Registry mutations themselves never
//! suspend.

use serde_json::json;

use crate::broadcast::{broadcast_roster, broadcast_turn};
use crate::models::connection::ConnectionHandle;
use crate::models::registry::AppState;
use crate::models::wire::{ClientCommand, PlayerPayload};
use crate::store::GameSettings;

pub async fn handle_message(state: &AppState, conn: &ConnectionHandle, raw: &str) {
    let command = match ClientCommand::parse(raw) {
        Ok(command) => command,
        Err(e) => {
            // Malformed input is dropped at the boundary: no reply, no state change.
            log::debug!("dropping malformed message from {}: {}", conn.id(), e);
            return;
        }
    };

    match command {
        ClientCommand::CreateGame(host) => create_game(state, conn, host).await,
        ClientCommand::AddPlayer { id, player } => add_player(state, conn, &id, player).await,
        ClientCommand::RemovePlayer { id, player } => {
            remove_player(state, conn, &id, &player).await
        }
        ClientCommand::ScoreUpdate { id, player, score } => {
            score_update(state, conn, &id, &player, score).await
        }
        ClientCommand::BroadcastLetter {
            id,
            letter,
            last_question,
            index,
        } => broadcast_letter(state, &id, &letter, last_question, index).await,
        ClientCommand::StartGame { id } => start_game(state, &id).await,
    }
}

/// A connection plays in at most one game at a time. Commands from one
/// connection are handled sequentially by its socket loop, so this check
/// cannot be invalidated mid-command by the same connection.
async fn already_seated(state: &AppState, conn: &ConnectionHandle) -> bool {
    state
        .registry
        .read()
        .await
        .find_connection(conn.id())
        .is_some()
}

async fn create_game(state: &AppState, conn: &ConnectionHandle, host: PlayerPayload) {
    if already_seated(state, conn).await {
        conn.send(json!({"status": "error", "message": "Already in a game"}));
        return;
    }

    let record = match state.store.create_game(&host.name, host.data).await {
        Ok(record) => record,
        Err(e) => {
            log::error!("error creating game: {}", e);
            conn.send(json!({"status": "error", "message": "Failed to create game"}));
            return;
        }
    };

    let seat_error = {
        let mut reg = state.registry.write().await;
        let lobby = reg.get_or_create(&record.id, record.settings.clone());
        lobby
            .add_participant(conn.clone(), host.name.clone())
            .err()
    };
    if let Some(e) = seat_error {
        // Only reachable if the store hands out an id whose session already
        // holds this name; drop the fresh record rather than leak it.
        log::error!("failed to seat host {} in game {}: {}", host.name, record.id, e);
        if let Err(store_err) = state.store.remove_game(&record.id).await {
            log::error!("error removing game {} from store: {}", record.id, store_err);
        }
        conn.send(json!({"status": "error", "message": "Failed to create game"}));
        return;
    }

    conn.send(json!({"status": "success", "gameId": record.id}));
    broadcast_roster(&state.registry, &record.id).await;
}

async fn add_player(
    state: &AppState,
    conn: &ConnectionHandle,
    game_id: &str,
    player: PlayerPayload,
) {
    if already_seated(state, conn).await {
        conn.send(json!({"status": "error", "message": "Already in a game"}));
        return;
    }

    // Names key the durable record, so refuse a name already seated in this
    // session before touching the store.
    {
        let reg = state.registry.read().await;
        if let Some(lobby) = reg.get(game_id) {
            if lobby.has_player(&player.name) {
                conn.send(json!({"status": "error", "message": "Player name already taken"}));
                return;
            }
        }
    }

    if let Err(e) = state
        .store
        .add_player(game_id, &player.name, player.data)
        .await
    {
        log::warn!("error adding player {} to game {}: {}", player.name, game_id, e);
        conn.send(json!({"status": "error", "message": "Failed to add player"}));
        return;
    }

    let seat_error = {
        let mut reg = state.registry.write().await;
        let lobby = reg.get_or_create(game_id, GameSettings::default());
        lobby
            .add_participant(conn.clone(), player.name.clone())
            .err()
    };
    if let Some(e) = seat_error {
        // Another connection claimed the name while the store call was in
        // flight. The winner's record stays; this join simply did not happen.
        log::warn!("lost join race for {} in game {}", player.name, game_id);
        conn.send(json!({"status": "error", "message": e}));
        return;
    }

    conn.send(json!({"status": "success", "playerAdded": game_id}));
    broadcast_roster(&state.registry, game_id).await;
}

async fn remove_player(state: &AppState, conn: &ConnectionHandle, game_id: &str, player_name: &str) {
    if let Err(e) = state.store.remove_player(game_id, player_name).await {
        log::warn!("error removing player {} from game {}: {}", player_name, game_id, e);
        conn.send(json!({"status": "error", "message": "Failed to remove player"}));
        return;
    }

    // One synchronous transition: remove the participant, adjust the cursor,
    // and if that emptied the session, unregister it in the same critical
    // section so the durable delete below is issued exactly once.
    let outcome = {
        let mut reg = state.registry.write().await;
        let removed = match reg.get_mut(game_id) {
            None => Err("Lobby not found"),
            Some(lobby) => match lobby.remove_by_name(player_name) {
                None => Err("Player not found in lobby"),
                Some(removed) => Ok((removed, lobby.participants.is_empty())),
            },
        };
        match removed {
            Ok((removed, emptied)) => {
                removed.connection.send(json!({"status": "kicked"}));
                if emptied {
                    reg.remove(game_id);
                }
                Ok(emptied)
            }
            Err(message) => Err(message),
        }
    };

    match outcome {
        Err(message) => conn.send(json!({"status": "error", "message": message})),
        Ok(emptied) => {
            if emptied {
                log::info!("game {} empty, removing durable record", game_id);
                if let Err(e) = state.store.remove_game(game_id).await {
                    log::error!("error removing game {} from store: {}", game_id, e);
                }
            }
            conn.send(json!({
                "status": "success",
                "message": format!("{player_name} removed from lobby"),
            }));
            if !emptied {
                broadcast_roster(&state.registry, game_id).await;
                broadcast_turn(&state.registry, state.store.as_ref(), game_id).await;
            }
        }
    }
}

async fn score_update(
    state: &AppState,
    conn: &ConnectionHandle,
    game_id: &str,
    player_name: &str,
    score: Option<i64>,
) {
    if state.registry.read().await.get(game_id).is_none() {
        conn.send(json!({"status": "error", "message": "Lobby not found"}));
        return;
    }

    // A score accompanies the message only when this answer carries points.
    if let Some(score) = score {
        if let Err(e) = state.store.update_score(game_id, player_name, score).await {
            log::error!("error updating score for {} in game {}: {}", player_name, game_id, e);
            conn.send(json!({"status": "error", "message": "Failed to update score"}));
            return;
        }
    }

    let round_complete = {
        let mut reg = state.registry.write().await;
        match reg.get_mut(game_id) {
            // The session may have emptied while the store call was in flight.
            None => None,
            Some(lobby) => {
                if !lobby.mark_answered(player_name) {
                    log::debug!("scoreUpdate for unknown player {} in game {}", player_name, game_id);
                }
                Some(!lobby.participants.is_empty() && lobby.all_answered())
            }
        }
    };

    match round_complete {
        None => conn.send(json!({"status": "error", "message": "Lobby not found"})),
        Some(true) => broadcast_turn(&state.registry, state.store.as_ref(), game_id).await,
        Some(false) => {}
    }
}

async fn broadcast_letter(
    state: &AppState,
    game_id: &str,
    letter: &str,
    last_question: bool,
    index: u32,
) {
    let reg = state.registry.read().await;
    let Some(lobby) = reg.get(game_id) else {
        return;
    };

    let message = json!({
        "status": "letter",
        "letter": letter,
        "lastQuestion": last_question,
        "index": index,
    });
    for participant in &lobby.participants {
        participant.connection.send(message.clone());
    }
}

async fn start_game(state: &AppState, game_id: &str) {
    let found = {
        let reg = state.registry.read().await;
        match reg.get(game_id) {
            None => false,
            Some(lobby) => {
                let message = json!({"status": "startGame"});
                for participant in &lobby.participants {
                    participant.connection.send(message.clone());
                }
                true
            }
        }
    };

    if found {
        broadcast_turn(&state.registry, state.store.as_ref(), game_id).await;
    }
}

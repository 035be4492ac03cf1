//! Durable game records: the collaborator that outlives connections.
//!
//! The coordinator talks to storage only through the `GameStore` trait so a
//! database-backed implementation can be swapped in behind the same seam.
//! `MemoryGameStore` is the reference implementation used by the binary and
//! the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("game {0} not found")]
    GameNotFound(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Static configuration captured when a game is created. Opaque to the
/// coordinator; persisted with the record and handed back to clients that
/// read the durable state directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    pub host_plays: bool,
    pub easy_time: u32,
    pub med_time: u32,
    pub hard_time: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            host_plays: true,
            easy_time: 20,
            med_time: 10,
            hard_time: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerRecord {
    pub name: String,
    pub data: Value,
    pub score: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct GameRecord {
    pub id: String,
    pub players: Vec<PlayerRecord>,
    pub settings: GameSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerScore {
    pub player_name: String,
    pub score: Option<i64>,
}

#[async_trait]
pub trait GameStore: Send + Sync {
    /// Allocate a fresh unique game id and create the record with the host
    /// as its first player.
    async fn create_game(&self, host_name: &str, host_data: Value)
        -> Result<GameRecord, StoreError>;

    /// Add a player to an existing record. Unknown game ids are an error:
    /// joining requires the game to exist.
    async fn add_player(&self, game_id: &str, name: &str, data: Value) -> Result<(), StoreError>;

    /// Remove a player from a record. No-op success on unknown ids; cleanup
    /// must not fail on already-gone records.
    async fn remove_player(&self, game_id: &str, player_name: &str) -> Result<(), StoreError>;

    /// Delete a whole record. No-op success on unknown ids.
    async fn remove_game(&self, game_id: &str) -> Result<(), StoreError>;

    /// Upsert a player's score within a record.
    async fn update_score(
        &self,
        game_id: &str,
        player_name: &str,
        score: i64,
    ) -> Result<(), StoreError>;

    /// Ordered scores for a game, in record (join) order. `None` when the
    /// game is unknown.
    async fn get_player_scores(&self, game_id: &str)
        -> Result<Option<Vec<PlayerScore>>, StoreError>;
}

/// In-memory `GameStore`. Game ids are random four-digit codes, re-rolled
/// until unused.
#[derive(Default)]
pub struct MemoryGameStore {
    games: Mutex<HashMap<String, GameRecord>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn create_game(
        &self,
        host_name: &str,
        host_data: Value,
    ) -> Result<GameRecord, StoreError> {
        let mut games = self.games.lock().await;

        let id = {
            let mut rng = rand::thread_rng();
            loop {
                let candidate = rng.gen_range(1000..10000).to_string();
                if !games.contains_key(&candidate) {
                    break candidate;
                }
            }
        };

        let record = GameRecord {
            id: id.clone(),
            players: vec![PlayerRecord {
                name: host_name.to_string(),
                data: host_data,
                score: None,
            }],
            settings: GameSettings::default(),
        };
        games.insert(id, record.clone());
        log::info!("game {} created for host {}", record.id, host_name);
        Ok(record)
    }

    async fn add_player(&self, game_id: &str, name: &str, data: Value) -> Result<(), StoreError> {
        let mut games = self.games.lock().await;
        let game = games
            .get_mut(game_id)
            .ok_or_else(|| StoreError::GameNotFound(game_id.to_string()))?;

        // Re-adding a name replaces the stored payload, score included.
        if let Some(existing) = game.players.iter_mut().find(|p| p.name == name) {
            existing.data = data;
            existing.score = None;
        } else {
            game.players.push(PlayerRecord {
                name: name.to_string(),
                data,
                score: None,
            });
        }
        log::info!("{} added in game {}", name, game_id);
        Ok(())
    }

    async fn remove_player(&self, game_id: &str, player_name: &str) -> Result<(), StoreError> {
        let mut games = self.games.lock().await;
        if let Some(game) = games.get_mut(game_id) {
            game.players.retain(|p| p.name != player_name);
            log::info!("{} removed from game {}", player_name, game_id);
        }
        Ok(())
    }

    async fn remove_game(&self, game_id: &str) -> Result<(), StoreError> {
        let mut games = self.games.lock().await;
        games.remove(game_id);
        Ok(())
    }

    async fn update_score(
        &self,
        game_id: &str,
        player_name: &str,
        score: i64,
    ) -> Result<(), StoreError> {
        let mut games = self.games.lock().await;
        if let Some(game) = games.get_mut(game_id) {
            if let Some(player) = game.players.iter_mut().find(|p| p.name == player_name) {
                player.score = Some(score);
            } else {
                game.players.push(PlayerRecord {
                    name: player_name.to_string(),
                    data: Value::Null,
                    score: Some(score),
                });
            }
            log::info!("{} score updated to {} in game {}", player_name, score, game_id);
        }
        Ok(())
    }

    async fn get_player_scores(
        &self,
        game_id: &str,
    ) -> Result<Option<Vec<PlayerScore>>, StoreError> {
        let games = self.games.lock().await;
        Ok(games.get(game_id).map(|game| {
            game.players
                .iter()
                .map(|p| PlayerScore {
                    player_name: p.name.clone(),
                    score: p.score,
                })
                .collect()
        }))
    }
}

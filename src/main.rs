//! Quiz Lobby Server - realtime multiplayer session coordinator
//!
//! Clients connect over a websocket, create or join a game identified by a
//! short code, and exchange turn-based trivia state until the session
//! empties. One process owns all in-memory session state; the durable
//! game/score records live behind the `GameStore` seam.
//!
//! Key features:
//! - Create/join/leave lobbies keyed by four-digit codes
//! - Turn rotation with per-round answer tracking
//! - Roster/score fan-out to every connection in a session
//! - Thread-safe: RwLock around the lobby registry

use std::sync::Arc;

use quizgameserver::config::Config;
use quizgameserver::models::AppState;
use quizgameserver::server;
use quizgameserver::store::MemoryGameStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new();
    setup_logging(&config)?;

    let state = AppState::new(Arc::new(MemoryGameStore::new()));
    server::run(state, &config.bind_addr()).await
}

fn setup_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Utc::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .chain(fern::log_file(&config.log_file)?)
        .apply()?;
    Ok(())
}

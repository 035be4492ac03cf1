pub mod connection;
pub mod lobby;
pub mod registry;
pub mod wire;

pub use connection::{ConnectionHandle, ConnectionId};
pub use lobby::{GameId, Lobby, Participant};
pub use registry::{AppState, LobbyRegistry, SharedRegistry};

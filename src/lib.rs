pub mod cli;
pub mod client;
pub mod config;
pub mod core;

// Re-export for convenience
pub use crate::config::ServerConfig;
pub use crate::core::coordinator::SessionCoordinator;
pub use crate::core::error::SessionError;
pub use crate::core::game::{score, FixedSecret, Guess, RandomSecret, Score, Secret, SecretGenerator};
pub use crate::core::protocol::{ClientCommand, GuessPayload, ServerEvent};
pub use crate::core::registry::{ConnectionId, Phase, Session, SessionRegistry};
pub use crate::core::websocket::GameServer;

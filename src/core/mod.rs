pub mod coordinator;
pub mod error;
pub mod game;
pub mod hub;
pub mod protocol;
pub mod registry;

// WebSocket transport in front of the coordinator
pub mod websocket;

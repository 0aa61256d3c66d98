pub mod renderer;
pub mod state;
pub mod terminal;
pub mod websocket_client;

pub use state::{random_room_id, ClientState, GuessRecord};
pub use websocket_client::{RoomAction, WebSocketGameClient};

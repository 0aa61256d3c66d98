use rand::Rng;

use crate::core::game::{Guess, Score};
use crate::core::protocol::{ClientCommand, GuessPayload, ServerEvent};
use crate::core::registry::ConnectionId;

const ROOM_ID_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random base-36 room id for a new game.
pub fn random_room_id() -> String {
    let mut rng = rand::rng();
    (0..ROOM_ID_LEN)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect()
}

/// One line of the guess history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessRecord {
    pub player: ConnectionId,
    pub guess: String,
    pub result: Score,
    pub mine: bool,
}

/// Everything the terminal shows, rebuilt from server events.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    pub my_id: Option<ConnectionId>,
    pub room_id: String,
    pub status: String,
    pub started: bool,
    pub history: Vec<GuessRecord>,
}

impl ClientState {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            status: "connecting...".to_string(),
            ..Self::default()
        }
    }

    fn is_me(&self, id: &ConnectionId) -> bool {
        self.my_id.as_ref() == Some(id)
    }

    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Welcome { id } => {
                self.my_id = Some(id);
            }
            ServerEvent::RoomCreated(room) => {
                self.room_id = room;
                self.status = "room created, waiting for opponent...".to_string();
            }
            ServerEvent::GameStart(message) => {
                self.status = message;
                self.started = true;
            }
            ServerEvent::GuessResult { player, guess, result } => {
                let mine = self.is_me(&player);
                self.status = format!(
                    "{} guess: {} - {} strike(s) {} ball(s)",
                    if mine { "your" } else { "opponent's" },
                    guess,
                    result.strikes,
                    result.balls
                );
                self.history.push(GuessRecord { player, guess, result, mine });
            }
            ServerEvent::GameOver { winner, number } => {
                self.status = format!(
                    "game over! {} won. the number was {}",
                    if self.is_me(&winner) { "you" } else { "opponent" },
                    number
                );
                self.started = false;
            }
            ServerEvent::PlayerLeft(message) => {
                self.status = message;
                self.started = false;
            }
            ServerEvent::Error(message) => {
                self.status = message;
            }
        }
    }

    /// Turn a submitted input line into a guess command, or explain why not.
    pub fn submit(&mut self, line: &str) -> Option<ClientCommand> {
        if !self.started {
            self.status = "the game has not started".to_string();
            return None;
        }
        match Guess::parse(line.trim()) {
            Ok(guess) => Some(ClientCommand::Guess(GuessPayload {
                room_id: self.room_id.clone(),
                number: guess.into_string(),
            })),
            Err(_) => {
                self.status = "enter a 3-digit number".to_string();
                None
            }
        }
    }
}

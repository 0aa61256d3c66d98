/// Per-connection command handling on top of the session registry
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::error::SessionError;
use crate::core::game::{score, Guess, RandomSecret, SecretGenerator};
use crate::core::hub::{ConnectionHub, EventSender};
use crate::core::protocol::{GuessPayload, ServerEvent, GAME_START_MESSAGE, PLAYER_LEFT_MESSAGE};
use crate::core::registry::{ConnectionId, Phase, SessionRegistry};

/// Drives the room protocol: create, join, guess, disconnect.
///
/// The registry sits behind one mutex that is held for the whole of each
/// command, so a join can never race another join into a third member and a
/// winning guess removes its room before anyone else can touch it.
pub struct SessionCoordinator<G = RandomSecret> {
    registry: Mutex<SessionRegistry<G>>,
    hub: ConnectionHub,
    strict_guesses: bool,
}

impl Default for SessionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCoordinator {
    pub fn new() -> Self {
        Self::with_generator(RandomSecret)
    }
}

impl<G: SecretGenerator> SessionCoordinator<G> {
    pub fn with_generator(generator: G) -> Self {
        Self {
            registry: Mutex::new(SessionRegistry::with_generator(generator)),
            hub: ConnectionHub::new(),
            strict_guesses: false,
        }
    }

    /// Reject malformed guesses with an `error` instead of scoring them.
    pub fn strict_guesses(mut self, strict: bool) -> Self {
        self.strict_guesses = strict;
        self
    }

    pub fn hub(&self) -> &ConnectionHub {
        &self.hub
    }

    /// Make a new connection reachable and tell it who it is.
    pub async fn connect(&self, conn: ConnectionId, sender: EventSender) {
        self.hub.register(conn.clone(), sender).await;
        self.hub.emit(&conn, ServerEvent::Welcome { id: conn.clone() }).await;
    }

    pub async fn create_room(&self, conn: &ConnectionId, room: &str) {
        let mut registry = self.registry.lock().await;
        match registry.create(room, conn.clone()) {
            Ok(_) => {
                info!(room, %conn, "room created");
                self.hub.emit(conn, ServerEvent::RoomCreated(room.to_string())).await;
            }
            Err(e) => self.reject(conn, room, e).await,
        }
    }

    pub async fn join_room(&self, conn: &ConnectionId, room: &str) {
        let mut registry = self.registry.lock().await;
        match registry.join(room, conn.clone()) {
            Ok(session) => {
                info!(room, %conn, "game started");
                self.hub
                    .emit_to_group(session.members(), ServerEvent::GameStart(GAME_START_MESSAGE.to_string()))
                    .await;
            }
            Err(e) => self.reject(conn, room, e).await,
        }
    }

    /// Score a guess and broadcast it; three strikes ends the room.
    ///
    /// Guesses from non-members, for unknown rooms, or for rooms still
    /// waiting on an opponent have no effect at all.
    pub async fn guess(&self, conn: &ConnectionId, payload: GuessPayload) {
        let GuessPayload { room_id, number } = payload;
        let mut registry = self.registry.lock().await;

        let Some(session) = registry.lookup(&room_id) else {
            debug!(room = %room_id, %conn, "guess for unknown room ignored");
            return;
        };
        if !session.is_member(conn) || session.phase() != Phase::Active {
            debug!(room = %room_id, %conn, "guess ignored");
            return;
        }

        let number = if self.strict_guesses {
            match Guess::parse(&number) {
                Ok(guess) => guess.into_string(),
                Err(e) => {
                    self.reject(conn, &room_id, e).await;
                    return;
                }
            }
        } else {
            number
        };

        let secret = session.secret();
        let members = session.members().to_vec();
        let result = score(&secret, &number);
        debug!(room = %room_id, %conn, strikes = result.strikes, balls = result.balls, "guess scored");

        self.hub
            .emit_to_group(
                &members,
                ServerEvent::GuessResult { player: conn.clone(), guess: number, result },
            )
            .await;

        if result.is_win() {
            registry.remove(&room_id);
            info!(room = %room_id, winner = %conn, "game won");
            self.hub
                .emit_to_group(
                    &members,
                    ServerEvent::GameOver { winner: conn.clone(), number: secret.to_string() },
                )
                .await;
        }
    }

    /// Tear down every room the connection was in and tell whoever is left.
    pub async fn disconnect(&self, conn: &ConnectionId) {
        self.hub.unregister(conn).await;
        let mut registry = self.registry.lock().await;
        for session in registry.remove_sessions_containing(conn) {
            info!(room = session.id(), %conn, "room closed by disconnect");
            let remaining: Vec<ConnectionId> =
                session.members().iter().filter(|m| *m != conn).cloned().collect();
            self.hub
                .emit_to_group(&remaining, ServerEvent::PlayerLeft(PLAYER_LEFT_MESSAGE.to_string()))
                .await;
        }
    }

    /// Whether a room is currently live, and in which phase.
    pub async fn room_phase(&self, room: &str) -> Option<Phase> {
        self.registry.lock().await.lookup(room).map(|s| s.phase())
    }

    pub async fn room_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    async fn reject(&self, conn: &ConnectionId, room: &str, err: SessionError) {
        debug!(room, %conn, error = %err, "command rejected");
        self.hub.emit(conn, ServerEvent::Error(err.to_string())).await;
    }
}

/// WebSocket transport: one task per connection feeding the session coordinator
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{stream, SinkExt, Stream, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::core::coordinator::SessionCoordinator;
use crate::core::game::{RandomSecret, SecretGenerator};
use crate::core::hub::outbound_channel;
use crate::core::protocol::ClientCommand;
use crate::core::registry::ConnectionId;

/// Pause after a failed accept so fd exhaustion doesn't spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// How long a closing connection's writer gets to flush before it is aborted.
const WRITER_GRACE: Duration = Duration::from_secs(1);

/// Accepts sockets and routes their commands to a shared coordinator.
pub struct GameServer<G = RandomSecret> {
    listener: TcpListener,
    coordinator: Arc<SessionCoordinator<G>>,
    allowed_origins: Arc<Vec<String>>,
}

impl GameServer {
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let coordinator = SessionCoordinator::new().strict_guesses(config.strict_guesses);
        Self::with_coordinator(config, coordinator).await
    }
}

impl<G: SecretGenerator> GameServer<G> {
    pub async fn with_coordinator(config: &ServerConfig, coordinator: SessionCoordinator<G>) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr())
            .await
            .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

        Ok(Self {
            listener,
            coordinator: Arc::new(coordinator),
            allowed_origins: Arc::new(config.allowed_origins.clone()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn coordinator(&self) -> Arc<SessionCoordinator<G>> {
        Arc::clone(&self.coordinator)
    }

    /// Accept connections forever. Only binding is fatal; accept errors are
    /// logged and retried.
    pub async fn run(self) -> Result<()> {
        info!(addr = %self.local_addr()?, "strikeball server listening");

        let Self { listener, coordinator, allowed_origins } = self;
        let incoming = stream::unfold(listener, |listener| async move {
            let accepted = listener.accept().await;
            Some((accepted, listener))
        });
        serve_incoming(incoming, coordinator, allowed_origins).await;
        Ok(())
    }
}

/// Spawn a connection task for every accepted socket until `incoming` ends.
pub async fn serve_incoming<S, G>(
    incoming: S,
    coordinator: Arc<SessionCoordinator<G>>,
    allowed_origins: Arc<Vec<String>>,
) where
    S: Stream<Item = io::Result<(TcpStream, SocketAddr)>>,
    G: SecretGenerator,
{
    tokio::pin!(incoming);

    while let Some(accepted) = incoming.next().await {
        let (stream, peer) = match accepted {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        debug!(%peer, "tcp connection accepted");

        let coordinator = Arc::clone(&coordinator);
        let allowed_origins = Arc::clone(&allowed_origins);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, coordinator, allowed_origins).await {
                warn!(%peer, error = %e, "connection ended with error");
            }
        });
    }
}

/// Browsers always send `Origin`; anything else is let through.
fn origin_allowed(allowed: &[String], origin: Option<&str>) -> bool {
    match origin {
        Some(origin) if !allowed.is_empty() => allowed.iter().any(|a| a == origin),
        _ => true,
    }
}

async fn handle_connection<G: SecretGenerator>(
    stream: TcpStream,
    peer: SocketAddr,
    coordinator: Arc<SessionCoordinator<G>>,
    allowed_origins: Arc<Vec<String>>,
) -> Result<()> {
    let check_origin = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let origin = request.headers().get("origin").and_then(|v| v.to_str().ok());
        if origin_allowed(&allowed_origins, origin) {
            Ok(response)
        } else {
            warn!(%peer, ?origin, "origin not allowed");
            let mut refusal = ErrorResponse::new(Some("origin not allowed".to_string()));
            *refusal.status_mut() = StatusCode::FORBIDDEN;
            Err(refusal)
        }
    };

    let ws_stream = accept_hdr_async(stream, check_origin)
        .await
        .context("websocket handshake failed")?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let conn = ConnectionId::random();
    let (tx, mut rx) = outbound_channel();
    info!(%peer, %conn, "client connected");

    let sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match event.encode() {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to encode event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    coordinator.connect(conn.clone(), tx).await;

    while let Some(msg_result) = ws_receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match ClientCommand::decode(&text) {
                Ok(ClientCommand::CreateRoom(room)) => coordinator.create_room(&conn, &room).await,
                Ok(ClientCommand::JoinRoom(room)) => coordinator.join_room(&conn, &room).await,
                Ok(ClientCommand::Guess(payload)) => coordinator.guess(&conn, payload).await,
                Err(e) => debug!(%conn, error = %e, "ignoring unreadable frame"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(%conn, error = %e, "websocket error");
                break;
            }
        }
    }

    coordinator.disconnect(&conn).await;
    info!(%peer, %conn, "client disconnected");

    // Dropping the hub's sender lets the writer drain and close on its own,
    // unless the peer has stopped reading.
    if !finish_writer(sender_task, WRITER_GRACE).await {
        debug!(%conn, "writer did not finish in time, aborted");
    }
    Ok(())
}

/// Wait up to `grace` for the writer task; abort it if it is still running.
async fn finish_writer(mut task: JoinHandle<()>, grace: Duration) -> bool {
    match tokio::time::timeout(grace, &mut task).await {
        Ok(_) => true,
        Err(_) => {
            task.abort();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_rules() {
        let none: Vec<String> = Vec::new();
        let list = vec!["https://play.example".to_string()];

        assert!(origin_allowed(&none, Some("https://anything.example")));
        assert!(origin_allowed(&list, None));
        assert!(origin_allowed(&list, Some("https://play.example")));
        assert!(!origin_allowed(&list, Some("https://evil.example")));
    }

    #[tokio::test]
    async fn stuck_writer_is_aborted_after_grace() {
        let (held, released) = tokio::sync::oneshot::channel::<()>();
        let stuck = tokio::spawn(async move {
            let _held = held;
            std::future::pending::<()>().await
        });

        assert!(!finish_writer(stuck, Duration::from_millis(20)).await);
        // the aborted task drops its half of the channel
        assert!(released.await.is_err());
    }

    #[tokio::test]
    async fn finished_writer_is_joined() {
        let done = tokio::spawn(async {});
        assert!(finish_writer(done, Duration::from_secs(1)).await);
    }
}

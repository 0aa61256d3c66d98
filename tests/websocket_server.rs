//! End-to-end games over a real socket on loopback.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{stream, SinkExt, StreamExt};
use strikeball::core::websocket::serve_incoming;
use strikeball::{
    ClientCommand, ConnectionId, FixedSecret, GameServer, GuessPayload, Score, Secret, ServerConfig,
    ServerEvent, SessionCoordinator,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server(config: ServerConfig) -> String {
    let coordinator = SessionCoordinator::with_generator(FixedSecret(Secret::new([5, 0, 7]).unwrap()));
    let server = GameServer::with_coordinator(&config, coordinator).await.unwrap();
    let url = format!("ws://{}", server.local_addr().unwrap());
    tokio::spawn(server.run());
    url
}

/// Connect and consume the welcome frame.
async fn connect(url: &str) -> (Ws, ConnectionId) {
    let (mut ws, _) = connect_async(url).await.unwrap();
    match recv(&mut ws).await {
        ServerEvent::Welcome { id } => (ws, id),
        other => panic!("expected welcome, got {other:?}"),
    }
}

async fn send(ws: &mut Ws, command: ClientCommand) {
    ws.send(Message::Text(command.encode().unwrap())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> ServerEvent {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = msg {
            return ServerEvent::decode(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn full_game_over_websocket() {
    let url = start_server(ServerConfig::local_ephemeral()).await;
    let (mut alice, alice_id) = connect(&url).await;
    let (mut bob, _bob_id) = connect(&url).await;

    send(&mut alice, ClientCommand::CreateRoom("abc".into())).await;
    assert_eq!(recv(&mut alice).await, ServerEvent::RoomCreated("abc".into()));

    send(&mut bob, ClientCommand::JoinRoom("abc".into())).await;
    assert_eq!(recv(&mut alice).await, ServerEvent::GameStart("game started!".into()));
    assert_eq!(recv(&mut bob).await, ServerEvent::GameStart("game started!".into()));

    send(
        &mut alice,
        ClientCommand::Guess(GuessPayload { room_id: "abc".into(), number: "507".into() }),
    )
    .await;

    for ws in [&mut alice, &mut bob] {
        assert_eq!(
            recv(ws).await,
            ServerEvent::GuessResult {
                player: alice_id.clone(),
                guess: "507".into(),
                result: Score { strikes: 3, balls: 0 },
            }
        );
        assert_eq!(
            recv(ws).await,
            ServerEvent::GameOver { winner: alice_id.clone(), number: "507".into() }
        );
    }

    // room is gone, so joining it now fails
    let (mut carol, _) = connect(&url).await;
    send(&mut carol, ClientCommand::JoinRoom("abc".into())).await;
    assert_eq!(recv(&mut carol).await, ServerEvent::Error("room not found or full".into()));
}

#[tokio::test]
async fn closing_the_socket_notifies_the_opponent() {
    let url = start_server(ServerConfig::local_ephemeral()).await;
    let (mut alice, _) = connect(&url).await;
    let (mut bob, _) = connect(&url).await;

    send(&mut alice, ClientCommand::CreateRoom("xyz".into())).await;
    recv(&mut alice).await;
    send(&mut bob, ClientCommand::JoinRoom("xyz".into())).await;
    recv(&mut alice).await;
    recv(&mut bob).await;

    alice.close(None).await.unwrap();

    assert_eq!(recv(&mut bob).await, ServerEvent::PlayerLeft("opponent left the game".into()));
}

#[tokio::test]
async fn garbage_frames_are_ignored() {
    let url = start_server(ServerConfig::local_ephemeral()).await;
    let (mut alice, _) = connect(&url).await;

    alice.send(Message::Text("{\"event\":\"nope\"}".into())).await.unwrap();
    send(&mut alice, ClientCommand::CreateRoom("abc".into())).await;

    assert_eq!(recv(&mut alice).await, ServerEvent::RoomCreated("abc".into()));
}

#[tokio::test]
async fn foreign_origin_is_refused() {
    let config = ServerConfig {
        allowed_origins: vec!["https://play.example".into()],
        ..ServerConfig::local_ephemeral()
    };
    let url = start_server(config).await;

    let mut request = url.as_str().into_client_request().unwrap();
    request.headers_mut().insert("Origin", "https://evil.example".parse().unwrap());
    assert!(connect_async(request).await.is_err());

    let mut request = url.as_str().into_client_request().unwrap();
    request.headers_mut().insert("Origin", "https://play.example".parse().unwrap());
    assert!(connect_async(request).await.is_ok());
}

#[tokio::test]
async fn accept_errors_do_not_stop_the_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    // descriptor exhaustion and an aborted handshake, then the real listener
    let failures = stream::iter(vec![
        Err(io::Error::from_raw_os_error(24)),
        Err(io::Error::from(io::ErrorKind::ConnectionAborted)),
    ]);
    let accepted = stream::unfold(listener, |listener| async move {
        let next = listener.accept().await;
        Some((next, listener))
    });
    let coordinator = Arc::new(SessionCoordinator::with_generator(FixedSecret(Secret::new([5, 0, 7]).unwrap())));
    tokio::spawn(serve_incoming(failures.chain(accepted), coordinator, Arc::new(Vec::new())));

    let (mut alice, _) = connect(&url).await;
    send(&mut alice, ClientCommand::CreateRoom("abc".into())).await;
    assert_eq!(recv(&mut alice).await, ServerEvent::RoomCreated("abc".into()));
}

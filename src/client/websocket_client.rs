/// Terminal client: sends room commands and guesses, renders what the server reports
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::client::renderer::render;
use crate::client::state::ClientState;
use crate::client::terminal::TerminalContext;
use crate::core::protocol::{ClientCommand, ServerEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSender = SplitSink<WsStream, Message>;
type WsReceiver = SplitStream<WsStream>;

/// How the client enters a room.
#[derive(Debug, Clone)]
pub enum RoomAction {
    Create(String),
    Join(String),
}

impl RoomAction {
    fn room_id(&self) -> &str {
        match self {
            RoomAction::Create(id) | RoomAction::Join(id) => id,
        }
    }

    fn command(&self) -> ClientCommand {
        match self {
            RoomAction::Create(id) => ClientCommand::CreateRoom(id.clone()),
            RoomAction::Join(id) => ClientCommand::JoinRoom(id.clone()),
        }
    }
}

/// Accepts `host:port` as well as full `ws://` / `wss://` urls.
pub fn normalize_url(addr: &str) -> String {
    if addr.starts_with("ws://") || addr.starts_with("wss://") {
        addr.to_string()
    } else {
        format!("ws://{addr}")
    }
}

pub struct WebSocketGameClient {
    url: String,
}

impl WebSocketGameClient {
    pub fn new(addr: &str) -> Self {
        Self { url: normalize_url(addr) }
    }

    /// Connect, enter the room and run the input/render loop until Esc or close.
    pub async fn connect_and_play(&self, action: RoomAction) -> Result<()> {
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .with_context(|| format!("failed to connect to {}", self.url))?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        send_command(&mut ws_sender, &action.command()).await?;
        let mut state = ClientState::new(action.room_id());

        terminal::enable_raw_mode()?;
        let result = run_game_loop(&mut ws_sender, &mut ws_receiver, &mut state).await;
        terminal::disable_raw_mode()?;

        // Closing the socket is what tells the server we left.
        let _ = ws_sender.close().await;
        result
    }
}

async fn send_command(ws_sender: &mut WsSender, command: &ClientCommand) -> Result<()> {
    ws_sender.send(Message::Text(command.encode()?)).await?;
    Ok(())
}

async fn run_game_loop(
    ws_sender: &mut WsSender,
    ws_receiver: &mut WsReceiver,
    state: &mut ClientState,
) -> Result<()> {
    let mut ctx = TerminalContext::new();
    let mut input_line = String::new();
    render(state, &input_line, &mut ctx)?;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if !event::poll(Duration::from_millis(1))? {
                    continue;
                }
                let Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) = event::read()? else {
                    continue;
                };
                match code {
                    KeyCode::Esc => break,
                    KeyCode::Enter => {
                        if let Some(command) = state.submit(&input_line) {
                            send_command(ws_sender, &command).await?;
                        }
                        input_line.clear();
                    }
                    KeyCode::Backspace => {
                        input_line.pop();
                    }
                    KeyCode::Char(c) => input_line.push(c),
                    _ => {}
                }
                render(state, &input_line, &mut ctx)?;
            }

            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => match ServerEvent::decode(&text) {
                        Ok(server_event) => {
                            state.apply(server_event);
                            render(state, &input_line, &mut ctx)?;
                        }
                        Err(e) => debug!(error = %e, "ignoring unreadable frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => return Err(e.into()),
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_normalization() {
        assert_eq!(normalize_url("127.0.0.1:10000"), "ws://127.0.0.1:10000");
        assert_eq!(normalize_url("wss://play.example"), "wss://play.example");
    }

    #[test]
    fn room_action_commands() {
        assert_eq!(RoomAction::Create("k3j".into()).command(), ClientCommand::CreateRoom("k3j".into()));
        assert_eq!(RoomAction::Join("abc".into()).room_id(), "abc");
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Input, Select};
use tracing::info;

use crate::client::{random_room_id, RoomAction, WebSocketGameClient};
use crate::config::ServerConfig;
use crate::core::websocket::GameServer;

const DEFAULT_SERVER: &str = "ws://127.0.0.1:10000";

#[derive(Parser)]
#[command(name = "strikeball")]
#[command(about = "Two-player strikes and balls over WebSocket")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the game server
    Serve(ServerConfig),
    /// Open a new room and wait for an opponent
    Create {
        /// Server to connect to
        #[arg(short, long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Join a room someone else created
    Join {
        /// Room id shared by the other player
        room: String,

        /// Server to connect to
        #[arg(short, long, default_value = DEFAULT_SERVER)]
        server: String,
    },
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(config)) => serve(config).await,
        Some(Commands::Create { server }) => play(&server, RoomAction::Create(random_room_id())).await,
        Some(Commands::Join { room, server }) => play(&server, RoomAction::Join(room)).await,
        None => show_main_menu().await,
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    let server = GameServer::bind(&config).await?;
    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}

async fn play(server: &str, action: RoomAction) -> Result<()> {
    WebSocketGameClient::new(server).connect_and_play(action).await
}

async fn show_main_menu() -> Result<()> {
    println!("strikes & balls");
    println!("   guess the hidden 3-digit number before your opponent does");
    println!();

    let options = ["Host a server", "Create a room", "Join a room", "Exit"];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("What would you like to do?")
        .items(&options)
        .interact()?;

    match selection {
        0 => {
            let port: u16 = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Port")
                .default(ServerConfig::default().port)
                .interact_text()?;
            serve(ServerConfig { port, ..ServerConfig::default() }).await
        }
        1 => {
            let server = prompt_server()?;
            play(&server, RoomAction::Create(random_room_id())).await
        }
        2 => {
            let server = prompt_server()?;
            let room: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Room id")
                .interact_text()?;
            play(&server, RoomAction::Join(room)).await
        }
        _ => Ok(()),
    }
}

fn prompt_server() -> Result<String> {
    let server = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Server address")
        .default(DEFAULT_SERVER.to_string())
        .interact_text()?;
    Ok(server)
}

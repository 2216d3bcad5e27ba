//! Queue client for exercising a running server by hand.

use clap::Args;
use futures::{Sink, SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use ticketqueue_auth::JwtEncoder;
use ticketqueue_core::config::AppConfig;
use ticketqueue_core::error::{AppError, ErrorKind};
use ticketqueue_realtime::message::PROCEED_TRANSACTION;

use crate::output;

/// Arguments for the join command
#[derive(Debug, Args)]
pub struct JoinArgs {
    /// Tier slug to queue for
    pub tier: String,

    /// Bearer token to present; minted from `--user` when absent
    #[arg(long, conflicts_with = "user")]
    pub token: Option<String>,

    /// Identity to mint a token for with the configured secret
    #[arg(short, long)]
    pub user: Option<String>,

    /// Send `MERCH 1` (true) or `MERCH 0` (false) once admitted
    #[arg(long)]
    pub merch: Option<bool>,

    /// Server base URL; defaults to the configured host and port
    #[arg(long)]
    pub url: Option<String>,
}

/// Execute the join command: print every frame until the server closes.
pub async fn execute(args: &JoinArgs, config: &AppConfig) -> Result<(), AppError> {
    let token = match (&args.token, &args.user) {
        (Some(token), _) => token.clone(),
        (None, Some(user)) => JwtEncoder::new(&config.auth).issue(user, "user")?.token,
        (None, None) => return Err(AppError::validation("Either --token or --user is required")),
    };

    let base = args.url.clone().unwrap_or_else(|| {
        let host = match config.server.host.as_str() {
            "0.0.0.0" => "127.0.0.1",
            host => host,
        };
        format!("ws://{}:{}", host, config.server.port)
    });
    let url = format!("{}/ws/{}", base.trim_end_matches('/'), args.tier);

    let (mut socket, _) = connect_async(url.as_str()).await.map_err(|e| {
        AppError::with_source(ErrorKind::Transport, format!("Failed to connect to {url}"), e)
    })?;
    output::print_success(&format!("Connected to {url}"));

    send(&mut socket, format!("TOKEN {token}")).await?;

    while let Some(frame) = socket.next().await {
        let frame =
            frame.map_err(|e| AppError::with_source(ErrorKind::Transport, "Read failed", e))?;
        let text = match frame {
            Message::Text(text) => text.as_str().to_owned(),
            Message::Close(_) => break,
            _ => continue,
        };
        println!("< {text}");

        if text == PROCEED_TRANSACTION {
            if let Some(merch) = args.merch {
                let command = format!("MERCH {}", u8::from(merch));
                println!("> {command}");
                send(&mut socket, command).await?;
            }
        }
    }

    output::print_success("Connection closed");
    Ok(())
}

async fn send<S>(socket: &mut S, frame: String) -> Result<(), AppError>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    socket
        .send(Message::text(frame))
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Transport, "Write failed", e))
}

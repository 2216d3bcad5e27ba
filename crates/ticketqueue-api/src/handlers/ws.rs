//! WebSocket upgrade handler and the frame adapters the queue protocol runs over.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};

use ticketqueue_core::error::{AppError, ErrorKind};
use ticketqueue_core::result::AppResult;
use ticketqueue_realtime::connection::{FrameSink, FrameSource};

use crate::error::ApiError;
use crate::state::AppState;

/// Inbound half of an upgraded socket.
pub struct WsFrameSource(pub SplitStream<WebSocket>);

/// Outbound half of an upgraded socket.
pub struct WsFrameSink(pub SplitSink<WebSocket, Message>);

#[async_trait]
impl FrameSource for WsFrameSource {
    async fn read_frame(&mut self) -> AppResult<Option<String>> {
        loop {
            match self.0.next().await {
                None | Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                Some(Ok(Message::Binary(bytes))) => {
                    return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Err(e)) => {
                    return Err(AppError::with_source(
                        ErrorKind::Transport,
                        "WebSocket read failed",
                        e,
                    ));
                }
            }
        }
    }
}

#[async_trait]
impl FrameSink for WsFrameSink {
    async fn write_frame(&mut self, frame: &str) -> AppResult<()> {
        self.0
            .send(Message::Text(frame.to_owned().into()))
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Transport,
                    "WebSocket write failed",
                    e,
                )
            })
    }

    async fn close(&mut self) {
        if let Err(e) = self.0.close().await {
            debug!(error = %e, "WebSocket close failed");
        }
    }
}

/// GET /ws/{tier}: upgrade and run the queue protocol for that tier.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Path(tier): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let handler = state.engine.handler(&tier)?;

    Ok(ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        let outcome = handler
            .serve(WsFrameSource(stream), WsFrameSink(sink))
            .await;
        info!(tier = %tier, outcome = ?outcome, "WebSocket connection closed");
    }))
}

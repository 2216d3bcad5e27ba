//! In-process transport pair, used by tests and local tooling.

use async_trait::async_trait;
use tokio::sync::mpsc;

use ticketqueue_core::error::AppError;
use ticketqueue_core::result::AppResult;

use super::transport::{FrameSink, FrameSource};

/// Client end of an in-memory connection.
#[derive(Debug)]
pub struct MemoryClient {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl MemoryClient {
    /// Sends a frame to the server. Ignored once the server side is gone.
    pub fn send(&self, frame: &str) {
        let _ = self.tx.send(frame.to_string());
    }

    /// Next frame from the server, or `None` once the server closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// Server-side inbound half.
#[derive(Debug)]
pub struct MemorySource {
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn read_frame(&mut self) -> AppResult<Option<String>> {
        Ok(self.rx.recv().await)
    }
}

/// Server-side outbound half.
#[derive(Debug)]
pub struct MemorySink {
    tx: Option<mpsc::UnboundedSender<String>>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn write_frame(&mut self, frame: &str) -> AppResult<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| AppError::transport("Connection already closed"))?;
        tx.send(frame.to_string())
            .map_err(|_| AppError::transport("Peer went away"))
    }

    async fn close(&mut self) {
        self.tx = None;
    }
}

/// Creates a connected client end and server halves.
pub fn memory_pair() -> (MemoryClient, MemorySource, MemorySink) {
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    let (server_tx, client_rx) = mpsc::unbounded_channel();

    (
        MemoryClient {
            tx: client_tx,
            rx: client_rx,
        },
        MemorySource { rx: server_rx },
        MemorySink {
            tx: Some(server_tx),
        },
    )
}

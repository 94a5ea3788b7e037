//! Message handler trait and sender handle

use tokio::sync::mpsc;

use opdeck_protocol::{ClientMessage, ServerMessage};
use opdeck_utils::Result;

/// Clonable handle for queueing outgoing messages
#[derive(Clone)]
pub struct MessageSender {
    tx: mpsc::Sender<ClientMessage>,
}

impl MessageSender {
    pub fn new(tx: mpsc::Sender<ClientMessage>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, msg: ClientMessage) -> Result<()> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| opdeck_utils::OpdeckError::ConnectionClosed)?;
        Ok(())
    }

    /// Send without waiting. Messages queued while the transport is down
    /// are dropped, not retried; the session state machines tolerate it.
    pub fn send_nowait(&self, msg: ClientMessage) {
        if let Err(e) = self.tx.try_send(msg) {
            tracing::debug!("dropping outgoing message: {}", e);
        }
    }
}

/// Trait for reacting to connection traffic and lifecycle
pub trait MessageHandler {
    /// Handle an incoming message
    fn handle(&mut self, msg: ServerMessage);

    /// Called when the connection is established
    fn on_connected(&mut self) {}

    /// Called when the connection is lost
    fn on_disconnected(&mut self) {}
}

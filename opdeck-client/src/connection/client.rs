//! Event connection to the remote process manager
//!
//! One bidirectional stream carries every session's traffic. The connection
//! owns a background task doing the socket I/O; the app talks to it through
//! bounded channels so a stalled transport never blocks the render loop.

use std::path::PathBuf;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_util::codec::Framed;
use url::Url;

use opdeck_protocol::{ClientCodec, ClientMessage, ServerMessage, PROTOCOL_VERSION};
use opdeck_utils::{OpdeckError, Result};

use super::handler::MessageSender;

/// Trait alias for streams usable with Framed
pub trait StreamTrait: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> StreamTrait for T {}

const CONNECT_TIMEOUT_SECS: u64 = 10;
const CHANNEL_CAPACITY: usize = 256;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Result of a non-blocking receive
#[derive(Debug, PartialEq)]
pub enum Incoming {
    /// A message arrived
    Message(ServerMessage),
    /// Nothing queued; the connection is still up
    Empty,
    /// The connection task has gone away
    Closed,
}

/// Client connection to the remote process manager
///
/// Address forms: `tcp://host:port` or `unix://path` (a bare path is taken
/// as a Unix socket).
pub struct Connection {
    connect_addr: String,
    state: ConnectionState,
    /// Channel for outgoing messages
    tx: mpsc::Sender<ClientMessage>,
    /// Channel for incoming messages
    rx: mpsc::Receiver<ServerMessage>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Connection {
    /// Create a new connection (not yet connected)
    pub fn new(addr: impl Into<String>) -> Self {
        // Placeholder channels until connect() swaps in live ones
        let (tx, _) = mpsc::channel(1);
        let (_, rx) = mpsc::channel(1);

        Self {
            connect_addr: addr.into(),
            state: ConnectionState::Disconnected,
            tx,
            rx,
            task_handle: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn addr(&self) -> &str {
        &self.connect_addr
    }

    /// Connect to the remote. A no-op when already connected.
    ///
    /// On success the outgoing and incoming channels are fresh; callers
    /// holding a [`MessageSender`] must take a new one.
    pub async fn connect(&mut self) -> Result<()> {
        if self.state == ConnectionState::Connected {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;

        let stream = match self.open_stream().await {
            Ok(stream) => stream,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(e);
            }
        };

        let framed = Framed::new(stream, ClientCodec::new());

        let (outgoing_tx, outgoing_rx) = mpsc::channel::<ClientMessage>(CHANNEL_CAPACITY);
        let (incoming_tx, incoming_rx) = mpsc::channel::<ServerMessage>(CHANNEL_CAPACITY);

        self.tx = outgoing_tx;
        self.rx = incoming_rx;

        let handle = tokio::spawn(Self::connection_task(framed, outgoing_rx, incoming_tx));
        self.task_handle = Some(handle);

        self.state = ConnectionState::Connected;
        tracing::info!(addr = %self.connect_addr, protocol = PROTOCOL_VERSION, "connected");
        Ok(())
    }

    async fn open_stream(&self) -> Result<Box<dyn StreamTrait>> {
        if self.connect_addr.starts_with("tcp://") {
            let url = Url::parse(&self.connect_addr).map_err(|e| {
                OpdeckError::Connection(format!("invalid TCP URL '{}': {}", self.connect_addr, e))
            })?;
            let host = url
                .host_str()
                .ok_or_else(|| OpdeckError::connection("missing host in TCP URL"))?;
            let port = url
                .port()
                .ok_or_else(|| OpdeckError::connection("missing port in TCP URL"))?;

            let addr = format!("{}:{}", host, port);
            let connect = TcpStream::connect(&addr);
            let stream = tokio::time::timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS), connect)
                .await
                .map_err(|_| OpdeckError::ConnectionTimeout {
                    seconds: CONNECT_TIMEOUT_SECS,
                })?
                .map_err(|e| {
                    OpdeckError::Connection(format!("failed to connect to {}: {}", addr, e))
                })?;

            Ok(Box::new(stream))
        } else {
            let path_str = if self.connect_addr.starts_with("unix://") {
                let url = Url::parse(&self.connect_addr)
                    .map_err(|e| OpdeckError::Connection(format!("invalid Unix URL: {}", e)))?;
                url.path().to_string()
            } else {
                self.connect_addr.clone()
            };

            let path = PathBuf::from(path_str);
            if !path.exists() {
                return Err(OpdeckError::Connection(format!(
                    "no socket at {}",
                    path.display()
                )));
            }

            let stream = UnixStream::connect(&path).await.map_err(|e| {
                OpdeckError::Connection(format!("failed to connect to {}: {}", path.display(), e))
            })?;

            Ok(Box::new(stream))
        }
    }

    /// Drop the connection and abort its I/O task
    pub async fn disconnect(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Receive the next message, waiting until one arrives
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.rx.recv().await
    }

    /// Non-blocking receive that reports transport loss
    pub fn try_next(&mut self) -> Incoming {
        match self.rx.try_recv() {
            Ok(msg) => Incoming::Message(msg),
            Err(TryRecvError::Empty) => Incoming::Empty,
            Err(TryRecvError::Disconnected) => Incoming::Closed,
        }
    }

    /// Get a clonable sender bound to the current transport
    pub fn sender(&self) -> MessageSender {
        MessageSender::new(self.tx.clone())
    }

    /// Background task doing the socket I/O
    async fn connection_task(
        mut framed: Framed<Box<dyn StreamTrait>, ClientCodec>,
        mut outgoing: mpsc::Receiver<ClientMessage>,
        incoming: mpsc::Sender<ServerMessage>,
    ) {
        loop {
            tokio::select! {
                Some(msg) = outgoing.recv() => {
                    if let Err(e) = framed.send(msg).await {
                        tracing::error!("failed to send message: {}", e);
                        break;
                    }
                }

                result = framed.next() => {
                    match result {
                        Some(Ok(msg)) => {
                            if incoming.send(msg).await.is_err() {
                                tracing::debug!("incoming channel closed, receiver dropped");
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::error!("failed to receive message: {}", e);
                            break;
                        }
                        None => {
                            tracing::info!("remote closed connection");
                            break;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opdeck_protocol::TermId;
    use tempfile::tempdir;
    use tokio::net::{TcpListener, UnixListener};

    fn unix_conn(path: &std::path::Path) -> Connection {
        Connection::new(format!("unix://{}", path.to_string_lossy()))
    }

    #[tokio::test]
    async fn test_connection_state_initial() {
        let conn = Connection::new("tcp://127.0.0.1:1");
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_no_server() {
        let mut conn = Connection::new("unix:///nonexistent/path.sock");
        let result = conn.connect().await;
        assert!(result.is_err());
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_to_unix_server() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();
        let accept_handle = tokio::spawn(async move { listener.accept().await.unwrap() });

        let mut conn = unix_conn(&socket_path);
        conn.connect().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Connected);

        conn.disconnect().await;
        accept_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_to_tcp_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept_handle = tokio::spawn(async move { listener.accept().await.unwrap() });

        let mut conn = Connection::new(format!("tcp://{}", addr));
        conn.connect().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Connected);

        conn.disconnect().await;
        accept_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_already_connected() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();
        let accept_handle = tokio::spawn(async move { listener.accept().await.unwrap() });

        let mut conn = unix_conn(&socket_path);
        conn.connect().await.unwrap();
        conn.connect().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Connected);

        conn.disconnect().await;
        accept_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sender_queues_through_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept_handle = tokio::spawn(async move { listener.accept().await.unwrap() });

        let mut conn = Connection::new(format!("tcp://{}", addr));
        conn.connect().await.unwrap();

        let sender = conn.sender();
        sender
            .send(ClientMessage::Input {
                term_id: TermId::default_session(),
                input: "ls\n".into(),
            })
            .await
            .unwrap();

        conn.disconnect().await;
        accept_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_tcp_url() {
        let mut conn = Connection::new("tcp://noport");
        let result = conn.connect().await;
        assert!(matches!(result, Err(OpdeckError::Connection(_))));
    }

    #[tokio::test]
    async fn test_try_next_before_connect_reports_closed() {
        // Placeholder channels have no live sender
        let mut conn = Connection::new("tcp://127.0.0.1:1");
        assert_eq!(conn.try_next(), Incoming::Closed);
    }

    #[tokio::test]
    async fn test_try_next_empty_while_connected() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();
        let accept_handle = tokio::spawn(async move { listener.accept().await.unwrap() });

        let mut conn = unix_conn(&socket_path);
        conn.connect().await.unwrap();
        assert_eq!(conn.try_next(), Incoming::Empty);

        conn.disconnect().await;
        accept_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected() {
        let mut conn = Connection::new("tcp://127.0.0.1:1");
        conn.disconnect().await;
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }
}

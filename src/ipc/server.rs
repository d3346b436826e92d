//! Unix domain socket server for IPC
//!
//! Forwards requests to the dispatcher and pushes automator events to
//! subscribed clients.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::protocol::{Notification, Request, Response};
use crate::dispatch::Command;
use crate::events::AutomatorEvent;

/// Largest accepted request body
const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    command_tx: mpsc::Sender<Command>,
    event_tx: broadcast::Sender<AutomatorEvent>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Create a new IPC server
    pub fn new(
        socket_path: &Path,
        command_tx: mpsc::Sender<Command>,
        event_tx: broadcast::Sender<AutomatorEvent>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            command_tx,
            event_tx,
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let command_tx = self.command_tx.clone();
                    let event_tx = self.event_tx.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, command_tx, event_tx) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(
        mut stream: UnixStream,
        command_tx: mpsc::Sender<Command>,
        event_tx: broadcast::Sender<AutomatorEvent>,
    ) -> Result<()> {
        loop {
            let Some(request) = read_message::<_, Request>(&mut stream).await? else {
                debug!("client disconnected");
                return Ok(());
            };

            debug!(?request, "received request");

            if let Request::Subscribe = request {
                // Subscribe before confirming so no event falls in between
                let event_rx = event_tx.subscribe();
                send_message(&mut stream, &Response::Subscribed).await?;
                debug!("client subscribed to notifications");
                return Self::push_events(stream, event_rx).await;
            }

            let response = Self::forward(&command_tx, request).await;
            send_message(&mut stream, &response).await?;
        }
    }

    /// Hand a request to the dispatcher and wait for its reply
    async fn forward(command_tx: &mpsc::Sender<Command>, request: Request) -> Response {
        let (reply, reply_rx) = oneshot::channel();

        if command_tx.send(Command { request, reply }).await.is_err() {
            return Response::error("unavailable", "dispatcher is not running");
        }

        reply_rx
            .await
            .unwrap_or_else(|_| Response::error("unavailable", "dispatcher dropped the request"))
    }

    /// Stream notifications to a subscribed client until it goes away
    async fn push_events(
        mut stream: UnixStream,
        mut event_rx: broadcast::Receiver<AutomatorEvent>,
    ) -> Result<()> {
        loop {
            let notification = match event_rx.recv().await {
                Ok(event) => Notification::Event { event },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagged");
                    Notification::Lagged { skipped }
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            };

            if let Err(e) = send_message(&mut stream, &notification).await {
                debug!(?e, "subscriber disconnected");
                return Ok(());
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Read a length-prefixed JSON message; `None` on a clean disconnect
async fn read_message<R, T>(reader: &mut R) -> Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: serde::de::DeserializeOwned,
{
    let mut len_buf = [0u8; 4];

    // Read message length (4-byte little-endian)
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        anyhow::bail!("message too large: {len} bytes");
    }

    // Read message body
    let mut msg_buf = vec![0u8; len];
    reader.read_exact(&mut msg_buf).await?;

    let message = serde_json::from_slice(&msg_buf).context("failed to parse message")?;
    Ok(Some(message))
}

/// Send a length-prefixed JSON message
async fn send_message<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;

    Ok(())
}

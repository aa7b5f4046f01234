//! Transport layer: newline-delimited JSON over TCP.
//!
//! Each accepted link gets its own task that reads one action per line and
//! writes every queued server message as one line.

use std::net::SocketAddr;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::connection::{ConnectionHandle, Outbound};
use crate::error::ActionError;
use crate::manager::RoomManager;
use crate::protocol::{
    deserialize_client_message, serialize_server_message, ClientMessage, ServerMessage,
    STATUS_SUCCESS,
};

/// Transport error types
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to bind listener to {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    #[error("Failed to determine bound address: {0}")]
    LocalAddrFailed(std::io::Error),

    #[error("Failed to accept connection: {0}")]
    AcceptFailed(std::io::Error),
}

/// Accept loop feeding links into a [`RoomManager`]
pub struct ServerRunner {
    listener: TcpListener,
    manager: RoomManager,
}

impl ServerRunner {
    pub async fn bind(address: SocketAddr, manager: RoomManager) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| TransportError::BindFailed(address, e))?;
        Ok(Self { listener, manager })
    }

    /// Get the bound address
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener
            .local_addr()
            .map_err(TransportError::LocalAddrFailed)
    }

    /// Accept links until the listener fails.
    pub async fn run(self) -> Result<(), TransportError> {
        loop {
            let (stream, peer) = self
                .listener
                .accept()
                .await
                .map_err(TransportError::AcceptFailed)?;
            let manager = self.manager.clone();
            tokio::spawn(async move {
                serve_connection(manager, stream, peer).await;
            });
        }
    }
}

/// Runs one link to completion, then routes the disconnect.
///
/// A link that sends nothing for the configured idle period is dropped, so a
/// peer that vanished without closing still reaches the disconnect path.
pub async fn serve_connection(manager: RoomManager, stream: TcpStream, peer: SocketAddr) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let (handle, mut outbound) = ConnectionHandle::channel();
    let mut session = manager.open_session(handle.clone());
    let idle = manager.config().timers.link_idle();
    let mut deadline = Instant::now() + idle;
    info!(peer = %peer, connection = %session.id(), "link opened");

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    deadline = Instant::now() + idle;
                    if line.trim().is_empty() {
                        continue;
                    }
                    let result = match deserialize_client_message(&line) {
                        Ok(ClientMessage::Ping { timestamp }) => {
                            handle.send(pong(timestamp));
                            continue;
                        }
                        Ok(msg) => manager.handle(&mut session, msg).await,
                        Err(e) => Err(ActionError::Malformed(e.to_string())),
                    };
                    let status = match result {
                        Ok(()) => STATUS_SUCCESS.to_string(),
                        Err(e) => {
                            debug!(connection = %session.id(), error = %e, "action rejected");
                            e.to_string()
                        }
                    };
                    handle.send(ServerMessage::status(status));
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(connection = %session.id(), error = %e, "read failed");
                    break;
                }
            },
            out = outbound.recv() => match out {
                Some(Outbound::Message(msg)) => {
                    let mut line = match serialize_server_message(&msg) {
                        Ok(line) => line,
                        Err(e) => {
                            warn!(connection = %session.id(), error = %e, "failed to encode message");
                            continue;
                        }
                    };
                    line.push('\n');
                    if let Err(e) = writer.write_all(line.as_bytes()).await {
                        debug!(connection = %session.id(), error = %e, "write failed");
                        break;
                    }
                }
                Some(Outbound::Close) | None => break,
            },
            _ = tokio::time::sleep_until(deadline) => {
                info!(peer = %peer, connection = %session.id(), "link idle, dropping it");
                break;
            }
        }
    }

    let _ = writer.shutdown().await;

    manager.disconnect(&session).await;
    info!(peer = %peer, connection = %session.id(), "link closed");
}

fn pong(client_timestamp: u64) -> ServerMessage {
    let server_timestamp = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    ServerMessage::Pong {
        client_timestamp,
        server_timestamp,
    }
}

//! Starhop multiplayer server
//!
//! Rooms of up to six players, with bots that fill empty colors or take over
//! seats whose link was lost. Links speak newline-delimited JSON over TCP.

pub mod config;
pub mod connection;
pub mod error;
pub mod ids;
pub mod manager;
pub mod protocol;
pub mod room;
mod timers;
pub mod transport;

pub use config::{ServerConfig, TimerConfig};
pub use connection::{ConnectionHandle, ConnectionId, Outbound, PlayerConnection};
pub use error::ActionError;
pub use manager::{RoomManager, Session, SharedRoom};
pub use protocol::*;
pub use room::GameRoom;
pub use transport::{ServerRunner, TransportError};

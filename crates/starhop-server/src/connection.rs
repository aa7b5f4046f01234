//! Room seats and the outbound channel to each link.
//!
//! A seat is held either by a human with a live or lost link, or by a bot.

use std::fmt;

use chrono::{DateTime, Utc};
use starhop_core::Color;
use tokio::sync::mpsc;

use crate::protocol::{ConnectionView, ServerMessage};

/// Display name given to bots
pub const BOT_NAME: &str = "Bot";

/// Process-unique id for one physical link or one bot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Instruction for a link's writer task
#[derive(Clone, Debug)]
pub enum Outbound {
    Message(ServerMessage),
    /// Close the link after flushing earlier messages
    Close,
}

/// Sending half of a link. Sends never block; a dropped receiver is ignored.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a message. Returns false if the link is gone.
    pub fn send(&self, msg: ServerMessage) -> bool {
        self.tx.send(Outbound::Message(msg)).is_ok()
    }

    pub fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

/// One seat in a room
#[derive(Debug)]
pub struct PlayerConnection {
    pub id: ConnectionId,
    pub user_id: Option<String>,
    pub name: String,
    pub color: Option<Color>,
    pub is_bot: bool,
    connected: bool,
    last_state_change: DateTime<Utc>,
    /// Bumped on every liveness change; timers compare it to detect staleness
    state_version: u64,
    handle: Option<ConnectionHandle>,
}

impl PlayerConnection {
    /// A live human link with no color yet
    pub fn human(id: ConnectionId, name: impl Into<String>, handle: ConnectionHandle) -> Self {
        Self {
            id,
            user_id: None,
            name: name.into(),
            color: None,
            is_bot: false,
            connected: true,
            last_state_change: Utc::now(),
            state_version: 0,
            handle: Some(handle),
        }
    }

    pub fn bot(id: ConnectionId, color: Color) -> Self {
        Self {
            id,
            user_id: None,
            name: BOT_NAME.to_string(),
            color: Some(color),
            is_bot: true,
            connected: false,
            last_state_change: Utc::now(),
            state_version: 0,
            handle: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn state_version(&self) -> u64 {
        self.state_version
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        self.last_state_change = Utc::now();
        self.state_version += 1;
    }

    pub fn handle(&self) -> Option<&ConnectionHandle> {
        self.handle.as_ref()
    }

    /// Take the link away from this seat
    pub fn detach(&mut self) -> Option<ConnectionHandle> {
        self.handle.take()
    }

    /// Queue a message if a link is attached
    pub fn send(&self, msg: ServerMessage) -> bool {
        match &self.handle {
            Some(handle) => handle.send(msg),
            None => false,
        }
    }

    pub fn color_raw(&self) -> u8 {
        self.color.map_or(0, Color::get)
    }

    pub fn view(&self) -> ConnectionView {
        ConnectionView {
            name: self.name.clone(),
            color: self.color_raw(),
            is_bot: self.is_bot,
            connected: self.connected,
            last_state_change: self.last_state_change,
        }
    }
}

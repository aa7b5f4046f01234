//! Room registry and action dispatch.
//!
//! The registry lock and a room lock are never held at the same time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use starhop_core::DistanceTable;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::connection::{ConnectionHandle, ConnectionId, PlayerConnection};
use crate::error::ActionError;
use crate::ids::IdRegistry;
use crate::protocol::{ClientMessage, RoomStatus};
use crate::room::GameRoom;

pub type SharedRoom = Arc<Mutex<GameRoom>>;

/// One physical link and the room it has entered, if any
#[derive(Debug)]
pub struct Session {
    id: ConnectionId,
    handle: ConnectionHandle,
    room: Option<String>,
}

impl Session {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }
}

#[derive(Debug, Default)]
struct Registry {
    rooms: HashMap<String, SharedRoom>,
    room_ids: IdRegistry,
    user_ids: IdRegistry,
}

struct Inner {
    config: ServerConfig,
    distances: Arc<DistanceTable>,
    registry: Mutex<Registry>,
    next_connection: AtomicU64,
}

/// Cheap to clone; clones share the same rooms.
#[derive(Clone)]
pub struct RoomManager {
    inner: Arc<Inner>,
}

impl RoomManager {
    pub fn new(config: ServerConfig, distances: Arc<DistanceTable>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                distances,
                registry: Mutex::new(Registry::default()),
                next_connection: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub(crate) fn distances(&self) -> &DistanceTable {
        &self.inner.distances
    }

    fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.inner.next_connection.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a new link.
    pub fn open_session(&self, handle: ConnectionHandle) -> Session {
        let id = self.next_connection_id();
        debug!(connection = %id, "session opened");
        Session {
            id,
            handle,
            room: None,
        }
    }

    pub async fn room_count(&self) -> usize {
        self.inner.registry.lock().await.rooms.len()
    }

    pub async fn room(&self, id: &str) -> Option<SharedRoom> {
        self.inner.registry.lock().await.rooms.get(id).cloned()
    }

    pub async fn is_user_id_live(&self, user_id: &str) -> bool {
        self.inner.registry.lock().await.user_ids.contains(user_id)
    }

    fn validate_name(&self, name: &str) -> Result<(), ActionError> {
        let max = self.inner.config.max_name_len;
        let len = name.chars().count();
        if len == 0 || len > max {
            return Err(ActionError::InvalidName { max });
        }
        Ok(())
    }

    /// The live room this session has entered.
    async fn current_room(&self, session: &Session) -> Result<(String, SharedRoom), ActionError> {
        let id = session.room.as_deref().ok_or(ActionError::NotInRoom)?;
        let room = self.room(id).await.ok_or(ActionError::NotInRoom)?;
        Ok((id.to_string(), room))
    }

    /// Applies one inbound action. On success every linked seat in the room has
    /// been sent a fresh snapshot.
    pub async fn handle(&self, session: &mut Session, msg: ClientMessage) -> Result<(), ActionError> {
        match msg {
            ClientMessage::Create { name } => self.create_room(session, name).await,
            ClientMessage::Join { game_id, name } => self.join_room(session, game_id, name).await,
            ClientMessage::Reconnect { game_id, user_id } => {
                self.reconnect(session, game_id, &user_id).await
            }
            ClientMessage::SelectColor { color } => {
                let (_, room) = self.current_room(session).await?;
                let mut room = room.lock().await;
                room.select_color(session.id, color)?;
                room.broadcast_state();
                Ok(())
            }
            ClientMessage::AddBot { color } => {
                let (_, room) = self.current_room(session).await?;
                let bot_id = self.next_connection_id();
                let mut room = room.lock().await;
                room.add_bot(bot_id, color)?;
                room.broadcast_state();
                Ok(())
            }
            ClientMessage::RemoveBot { color } => {
                let (_, room) = self.current_room(session).await?;
                let mut room = room.lock().await;
                room.remove_bot(color)?;
                room.broadcast_state();
                Ok(())
            }
            ClientMessage::Start => {
                let (room_id, room) = self.current_room(session).await?;
                {
                    let mut guard = room.lock().await;
                    guard.start()?;
                    guard.broadcast_state();
                }
                self.spawn_bot_turns(room_id, room);
                Ok(())
            }
            ClientMessage::Move { moves } => {
                let (room_id, room) = self.current_room(session).await?;
                {
                    let mut guard = room.lock().await;
                    guard.apply_human_move(session.id, &moves)?;
                    guard.broadcast_state();
                }
                self.spawn_bot_turns(room_id, room);
                Ok(())
            }
            // answered by the transport
            ClientMessage::Ping { .. } => Ok(()),
        }
    }

    async fn create_room(&self, session: &mut Session, name: String) -> Result<(), ActionError> {
        if session.room.is_some() {
            return Err(ActionError::AlreadyInRoom);
        }
        self.validate_name(&name)?;

        let mut seat = PlayerConnection::human(session.id, name, session.handle.clone());
        let (room_id, room) = {
            let mut registry = self.inner.registry.lock().await;
            let room_id = registry.room_ids.allocate();
            seat.user_id = Some(registry.user_ids.allocate());
            let mut room = GameRoom::new(room_id.clone());
            room.add_connection(seat);
            let room = Arc::new(Mutex::new(room));
            registry.rooms.insert(room_id.clone(), Arc::clone(&room));
            (room_id, room)
        };

        info!(room = %room_id, connection = %session.id, "room created");
        session.room = Some(room_id);
        room.lock().await.broadcast_state();
        Ok(())
    }

    async fn join_room(
        &self,
        session: &mut Session,
        game_id: String,
        name: String,
    ) -> Result<(), ActionError> {
        if session.room.is_some() {
            return Err(ActionError::AlreadyInRoom);
        }
        let room = self.room(&game_id).await.ok_or(ActionError::RoomNotFound)?;
        self.validate_name(&name)?;

        let user_id = self.inner.registry.lock().await.user_ids.allocate();
        let mut seat = PlayerConnection::human(session.id, name, session.handle.clone());
        seat.user_id = Some(user_id.clone());

        let joined = {
            let mut guard = room.lock().await;
            let joined = guard.add_connection(seat);
            if joined {
                guard.broadcast_state();
            }
            joined
        };
        if !joined {
            self.inner.registry.lock().await.user_ids.release(&user_id);
            return Err(ActionError::RoomNotFound);
        }

        info!(room = %game_id, connection = %session.id, "player joined");
        session.room = Some(game_id);
        Ok(())
    }

    async fn reconnect(
        &self,
        session: &mut Session,
        game_id: String,
        user_id: &str,
    ) -> Result<(), ActionError> {
        if session.room.is_some() {
            return Err(ActionError::AlreadyInRoom);
        }
        let room = self.room(&game_id).await.ok_or(ActionError::RoomNotFound)?;
        {
            let mut guard = room.lock().await;
            guard.reconnect(session.id, user_id, session.handle.clone())?;
            guard.broadcast_state();
        }
        session.room = Some(game_id);
        Ok(())
    }

    /// Routes a dropped link to its room.
    ///
    /// A forming room gives the seat up; a started room keeps it for the grace
    /// period. Either way the room is checked for deletion.
    pub async fn disconnect(&self, session: &Session) {
        let Some(room_id) = session.room.clone() else {
            debug!(connection = %session.id, "session closed outside any room");
            return;
        };
        let Some(room) = self.room(&room_id).await else {
            return;
        };

        let (released, grace, idle) = {
            let mut guard = room.lock().await;
            let mut released = None;
            let mut grace = None;
            if guard.status() == RoomStatus::Forming {
                released = guard
                    .remove_connection(session.id)
                    .and_then(|seat| seat.user_id);
            } else {
                grace = guard.disconnect(session.id);
            }
            guard.broadcast_state();
            (released, grace, guard.idle_snapshot())
        };

        if let Some(user_id) = released {
            self.inner.registry.lock().await.user_ids.release(&user_id);
        }
        if let Some(version) = grace {
            self.spawn_grace_timer(room_id.clone(), Arc::clone(&room), session.id, version);
        }
        if let Some(snapshot) = idle {
            self.spawn_deletion_check(room_id, room, snapshot);
        }
    }

    /// Drops a deleted room from the registry and frees its ids.
    pub(crate) async fn remove_room(&self, room_id: &str, room: &SharedRoom, user_ids: Vec<String>) {
        let mut registry = self.inner.registry.lock().await;
        let is_same = registry
            .rooms
            .get(room_id)
            .is_some_and(|current| Arc::ptr_eq(current, room));
        if is_same {
            registry.rooms.remove(room_id);
            registry.room_ids.release(room_id);
        }
        for user_id in &user_ids {
            registry.user_ids.release(user_id);
        }
    }
}

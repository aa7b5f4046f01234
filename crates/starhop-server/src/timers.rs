//! Delayed room work: bot takeover, bot turns and idle-room deletion.
//!
//! Each timer is a spawned task holding the room. Nothing cancels them; after
//! the wait they re-lock the room and check that what they were scheduled for
//! still holds.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::connection::ConnectionId;
use crate::manager::{RoomManager, SharedRoom};
use crate::room::IdleSnapshot;

impl RoomManager {
    /// After the grace period, hand the seat to a bot unless its link changed.
    /// Bot turns start only if the promoted seat's color is to move.
    pub(crate) fn spawn_grace_timer(
        &self,
        room_id: String,
        room: SharedRoom,
        connection: ConnectionId,
        version: u64,
    ) -> JoinHandle<()> {
        let manager = self.clone();
        let grace = self.config().timers.disconnect_grace();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let bot_turn = {
                let mut guard = room.lock().await;
                if !guard.promote_to_bot(connection, version) {
                    debug!(room = %room_id, connection = %connection, "grace timer stale");
                    return;
                }
                guard.broadcast_state();
                let color = guard.connection(connection).and_then(|c| c.color);
                color.is_some() && guard.bot_to_move() == color
            };
            if bot_turn {
                manager.spawn_bot_turns(room_id, room);
            }
        })
    }

    /// Plays bot moves, one per delay, until a human is to move or the game ends.
    pub(crate) fn spawn_bot_turns(&self, room_id: String, room: SharedRoom) -> JoinHandle<()> {
        let manager = self.clone();
        let delay = self.config().timers.bot_move_delay();
        tokio::spawn(async move {
            loop {
                let Some(color) = room.lock().await.bot_to_move() else {
                    return;
                };
                tokio::time::sleep(delay).await;

                let mut guard = room.lock().await;
                let mut rng = StdRng::from_entropy();
                match guard.play_bot_turn(color, manager.distances(), &mut rng) {
                    Ok(true) => guard.broadcast_state(),
                    Ok(false) => {
                        debug!(room = %room_id, color = %color, "bot turn stale");
                        return;
                    }
                    Err(e) => {
                        error!(room = %room_id, color = %color, error = %e, "bot turn failed");
                        return;
                    }
                }
            }
        })
    }

    /// Deletes the room if nobody has come back by the end of the idle period.
    pub(crate) fn spawn_deletion_check(
        &self,
        room_id: String,
        room: SharedRoom,
        snapshot: IdleSnapshot,
    ) -> JoinHandle<()> {
        let manager = self.clone();
        let idle = self.config().timers.idle_room();
        tokio::spawn(async move {
            tokio::time::sleep(idle).await;
            let user_ids = {
                let mut guard = room.lock().await;
                if guard.idle_snapshot().as_ref() != Some(&snapshot) {
                    debug!(room = %room_id, "room active again, keeping it");
                    return;
                }
                guard.mark_deleted()
            };
            manager.remove_room(&room_id, &room, user_ids).await;
            info!(room = %room_id, "idle room deleted");
        })
    }
}

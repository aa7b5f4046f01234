//! A single game room: its seats, its game and its lifecycle.
//!
//! Every method is a no-op once the room has been marked deleted. Timers hold
//! the room after it leaves the registry and rely on that.

use rand::Rng;
use starhop_core::{bot, Cell, Color, DistanceTable, Game};
use tracing::{debug, info};

use crate::connection::{ConnectionHandle, ConnectionId, PlayerConnection};
use crate::error::ActionError;
use crate::protocol::{GameStateView, RoomStatus, ServerMessage, STATUS_REPLACED};

/// `(connection, liveness version)` for every seat, sorted by connection.
pub type IdleSnapshot = Vec<(ConnectionId, u64)>;

#[derive(Debug)]
pub struct GameRoom {
    id: String,
    status: RoomStatus,
    game: Option<Game>,
    connections: Vec<PlayerConnection>,
    deleted: bool,
}

impl GameRoom {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: RoomStatus::Forming,
            game: None,
            connections: Vec::new(),
            deleted: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn connections(&self) -> &[PlayerConnection] {
        &self.connections
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&PlayerConnection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn position(&self, id: ConnectionId) -> Option<usize> {
        self.connections.iter().position(|c| c.id == id)
    }

    fn holder_of(&self, color: Color) -> Option<usize> {
        self.connections.iter().position(|c| c.color == Some(color))
    }

    fn ensure_forming(&self) -> Result<(), ActionError> {
        match self.status {
            RoomStatus::Forming => Ok(()),
            _ => Err(ActionError::GameAlreadyStarted),
        }
    }

    /// Seats a new connection. Returns false if the room is already deleted.
    pub fn add_connection(&mut self, mut connection: PlayerConnection) -> bool {
        if self.deleted {
            return false;
        }
        if !connection.is_bot && !connection.is_connected() {
            connection.set_connected(true);
        }
        debug!(room = %self.id, connection = %connection.id, "connection joined");
        self.connections.push(connection);
        true
    }

    /// Drops a seat while the room is forming.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<PlayerConnection> {
        if self.deleted || self.status != RoomStatus::Forming {
            return None;
        }
        let index = self.position(id)?;
        let mut removed = self.connections.remove(index);
        if let Some(handle) = removed.detach() {
            handle.close();
        }
        debug!(room = %self.id, connection = %id, "connection removed");
        Some(removed)
    }

    /// Sets a connection's color; 0 clears it.
    pub fn select_color(&mut self, id: ConnectionId, raw: u8) -> Result<(), ActionError> {
        if self.deleted {
            return Ok(());
        }
        self.ensure_forming()?;
        if raw > 6 {
            return Err(ActionError::InvalidColor(raw));
        }
        let Some(index) = self.position(id) else {
            return Ok(());
        };
        let color = Color::new(raw);
        if self.connections[index].color == color {
            return Ok(());
        }
        if let Some(color) = color {
            if self.holder_of(color).is_some() {
                return Err(ActionError::ColorTaken);
            }
        }
        self.connections[index].color = color;
        Ok(())
    }

    pub fn add_bot(&mut self, id: ConnectionId, raw: u8) -> Result<(), ActionError> {
        if self.deleted {
            return Ok(());
        }
        self.ensure_forming()?;
        let color = Color::new(raw).ok_or(ActionError::InvalidColor(raw))?;
        if self.holder_of(color).is_some() {
            return Err(ActionError::ColorTaken);
        }
        self.connections.push(PlayerConnection::bot(id, color));
        Ok(())
    }

    pub fn remove_bot(&mut self, raw: u8) -> Result<(), ActionError> {
        if self.deleted {
            return Ok(());
        }
        self.ensure_forming()?;
        let color = Color::new(raw).ok_or(ActionError::InvalidColor(raw))?;
        let Some(index) = self.holder_of(color) else {
            return Ok(());
        };
        if !self.connections[index].is_bot {
            return Err(ActionError::NotABot);
        }
        self.connections.remove(index);
        Ok(())
    }

    /// Starts the game with every color that has been picked.
    pub fn start(&mut self) -> Result<(), ActionError> {
        if self.deleted {
            return Ok(());
        }
        self.ensure_forming()?;
        let colors = self.connections.iter().filter_map(|c| c.color);
        let game = Game::new(colors).ok_or(ActionError::NoPlayers)?;
        info!(room = %self.id, players = ?game.players(), "game started");
        self.game = Some(game);
        self.status = RoomStatus::InProgress;
        Ok(())
    }

    pub fn apply_human_move(&mut self, id: ConnectionId, moves: &[Cell]) -> Result<(), ActionError> {
        if self.deleted {
            return Ok(());
        }
        if self.status == RoomStatus::Forming {
            return Err(ActionError::GameNotInProgress);
        }
        let Some(color) = self.connection(id).map(|c| c.color) else {
            return Ok(());
        };
        let game = self.game.as_mut().ok_or(ActionError::GameNotInProgress)?;
        if game.winner().is_some() {
            return Err(ActionError::AlreadyWon);
        }
        if color != Some(game.current_player()) {
            return Err(ActionError::NotYourTurn);
        }
        game.apply_move(moves)?;
        self.finish_if_won();
        Ok(())
    }

    fn finish_if_won(&mut self) {
        if let Some(winner) = self.game.as_ref().and_then(Game::winner) {
            self.status = RoomStatus::Finished;
            info!(room = %self.id, winner = %winner, "game finished");
        }
    }

    /// Marks a live connection as lost and returns its new liveness version.
    pub fn disconnect(&mut self, id: ConnectionId) -> Option<u64> {
        if self.deleted || self.status == RoomStatus::Forming {
            return None;
        }
        let index = self.position(id)?;
        let connection = &mut self.connections[index];
        if !connection.is_connected() {
            return None;
        }
        if let Some(handle) = connection.detach() {
            handle.close();
        }
        connection.set_connected(false);
        info!(room = %self.id, connection = %id, "player disconnected");
        Some(connection.state_version())
    }

    /// Hands a lost seat to a bot if nothing changed since `version`.
    pub fn promote_to_bot(&mut self, id: ConnectionId, version: u64) -> bool {
        if self.deleted {
            return false;
        }
        let Some(index) = self.position(id) else {
            return false;
        };
        let connection = &mut self.connections[index];
        if connection.is_bot || connection.is_connected() || connection.state_version() != version {
            return false;
        }
        connection.is_bot = true;
        info!(room = %self.id, connection = %id, "bot took over seat");
        true
    }

    /// Moves a seat onto a new link.
    ///
    /// A link still attached to the seat is told it was replaced and closed.
    pub fn reconnect(
        &mut self,
        id: ConnectionId,
        user_id: &str,
        handle: ConnectionHandle,
    ) -> Result<(), ActionError> {
        if self.deleted {
            return Err(ActionError::RoomNotFound);
        }
        let index = self
            .connections
            .iter()
            .position(|c| c.user_id.as_deref() == Some(user_id))
            .ok_or(ActionError::UnknownUser)?;

        let mut stale = self.connections.remove(index);
        if let Some(old) = stale.detach() {
            old.send(ServerMessage::status(STATUS_REPLACED));
            old.close();
        }

        let mut replacement = PlayerConnection::human(id, stale.name, handle);
        replacement.user_id = stale.user_id;
        replacement.color = stale.color;
        info!(room = %self.id, old = %stale.id, new = %id, "player reconnected");
        self.connections.push(replacement);
        Ok(())
    }

    /// The color to move, if a bot holds it and the game is still open.
    pub fn bot_to_move(&self) -> Option<Color> {
        if self.deleted {
            return None;
        }
        let game = self.game.as_ref()?;
        if game.winner().is_some() {
            return None;
        }
        let color = game.current_player();
        self.connections
            .iter()
            .any(|c| c.is_bot && c.color == Some(color))
            .then_some(color)
    }

    /// Plays one bot move for `expected`. Returns false if that color is no
    /// longer a bot's to move.
    pub fn play_bot_turn<R: Rng + ?Sized>(
        &mut self,
        expected: Color,
        distances: &DistanceTable,
        rng: &mut R,
    ) -> Result<bool, ActionError> {
        if self.bot_to_move() != Some(expected) {
            return Ok(false);
        }
        let Some(game) = self.game.as_mut() else {
            return Ok(false);
        };
        let chosen = bot::play_turn(distances, game, rng)?;
        debug!(room = %self.id, color = %expected, cells = chosen.len(), "bot moved");
        self.finish_if_won();
        Ok(true)
    }

    /// Liveness versions of every seat, or `None` if anyone is connected.
    pub fn idle_snapshot(&self) -> Option<IdleSnapshot> {
        if self.deleted || self.connections.iter().any(PlayerConnection::is_connected) {
            return None;
        }
        let mut snapshot: IdleSnapshot = self
            .connections
            .iter()
            .map(|c| (c.id, c.state_version()))
            .collect();
        snapshot.sort_unstable();
        Some(snapshot)
    }

    /// Marks the room deleted and returns the user ids it held.
    pub fn mark_deleted(&mut self) -> Vec<String> {
        self.deleted = true;
        self.connections
            .iter_mut()
            .filter_map(|c| c.user_id.take())
            .collect()
    }

    fn base_view(&self) -> GameStateView {
        let game = self.game.as_ref().filter(|_| self.status != RoomStatus::Forming);
        GameStateView {
            id: self.id.clone(),
            status: self.status,
            board: game.map(|g| g.board().rows()),
            players: game.map(|g| g.players().to_vec()),
            turn: game.map(Game::turn),
            prev_moves: game.map(|g| g.last_move().to_vec()),
            connections: self.connections.iter().map(PlayerConnection::view).collect(),
            user_id: None,
            color: 0,
        }
    }

    /// Snapshot as seen by `id`.
    pub fn view_for(&self, id: ConnectionId) -> Option<GameStateView> {
        let connection = self.connection(id)?;
        let mut view = self.base_view();
        view.user_id = connection.user_id.clone();
        view.color = connection.color_raw();
        Some(view)
    }

    /// Sends every linked seat its own snapshot.
    pub fn broadcast_state(&self) {
        if self.deleted {
            return;
        }
        let base = self.base_view();
        for connection in &self.connections {
            if connection.handle().is_none() {
                continue;
            }
            let mut view = base.clone();
            view.user_id = connection.user_id.clone();
            view.color = connection.color_raw();
            if !connection.send(ServerMessage::GameState(view)) {
                debug!(room = %self.id, connection = %connection.id, "dropped state for closed link");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::connection::Outbound;

    fn human(id: u64, name: &str) -> (PlayerConnection, UnboundedReceiver<Outbound>) {
        let (handle, rx) = ConnectionHandle::channel();
        let mut conn = PlayerConnection::human(ConnectionId(id), name, handle);
        conn.user_id = Some(format!("{id:08}"));
        (conn, rx)
    }

    fn forming_room() -> (GameRoom, Vec<UnboundedReceiver<Outbound>>) {
        let mut room = GameRoom::new("00000001");
        let (a, rx_a) = human(1, "Ada");
        let (b, rx_b) = human(2, "Bea");
        assert!(room.add_connection(a));
        assert!(room.add_connection(b));
        (room, vec![rx_a, rx_b])
    }

    fn color(raw: u8) -> Color {
        Color::new(raw).unwrap()
    }

    #[test]
    fn color_selection_rules() {
        let (mut room, _rx) = forming_room();
        room.select_color(ConnectionId(1), 1).unwrap();
        room.select_color(ConnectionId(1), 1).unwrap();
        assert_eq!(
            room.select_color(ConnectionId(2), 1),
            Err(ActionError::ColorTaken)
        );
        assert_eq!(
            room.select_color(ConnectionId(2), 7),
            Err(ActionError::InvalidColor(7))
        );
        room.select_color(ConnectionId(1), 0).unwrap();
        room.select_color(ConnectionId(2), 1).unwrap();
        assert_eq!(room.connection(ConnectionId(2)).unwrap().color, Some(color(1)));
        assert_eq!(room.connection(ConnectionId(1)).unwrap().color, None);
    }

    #[test]
    fn bots_take_and_release_colors() {
        let (mut room, _rx) = forming_room();
        room.select_color(ConnectionId(1), 1).unwrap();
        assert_eq!(room.add_bot(ConnectionId(10), 1), Err(ActionError::ColorTaken));
        assert_eq!(room.add_bot(ConnectionId(10), 0), Err(ActionError::InvalidColor(0)));
        room.add_bot(ConnectionId(10), 4).unwrap();
        assert_eq!(room.remove_bot(1), Err(ActionError::NotABot));
        room.remove_bot(5).unwrap();
        assert_eq!(room.connections().len(), 3);
        room.remove_bot(4).unwrap();
        assert_eq!(room.connections().len(), 2);
    }

    #[test]
    fn start_needs_a_colored_seat() {
        let (mut room, _rx) = forming_room();
        assert_eq!(room.start(), Err(ActionError::NoPlayers));
        room.select_color(ConnectionId(2), 4).unwrap();
        room.add_bot(ConnectionId(10), 1).unwrap();
        room.start().unwrap();
        assert_eq!(room.status(), RoomStatus::InProgress);
        assert_eq!(room.game().unwrap().players(), &[color(1), color(4)]);
        assert_eq!(room.bot_to_move(), Some(color(1)));
        assert_eq!(room.start(), Err(ActionError::GameAlreadyStarted));
        assert_eq!(
            room.select_color(ConnectionId(1), 2),
            Err(ActionError::GameAlreadyStarted)
        );
    }

    #[test]
    fn human_moves_respect_turn() {
        let (mut room, _rx) = forming_room();
        let hop = [Cell::new(7, 3), Cell::new(7, 4)];
        assert_eq!(
            room.apply_human_move(ConnectionId(1), &hop),
            Err(ActionError::GameNotInProgress)
        );
        room.select_color(ConnectionId(1), 1).unwrap();
        room.select_color(ConnectionId(2), 4).unwrap();
        room.start().unwrap();
        assert_eq!(
            room.apply_human_move(ConnectionId(2), &[]),
            Err(ActionError::NotYourTurn)
        );
        room.apply_human_move(ConnectionId(1), &hop).unwrap();
        assert_eq!(room.game().unwrap().turn(), 1);
        assert!(matches!(
            room.apply_human_move(ConnectionId(2), &[Cell::new(9, 13)]),
            Err(ActionError::Move(_))
        ));
    }

    #[test]
    fn disconnect_then_promote_only_when_unchanged() {
        let (mut room, _rx) = forming_room();
        room.select_color(ConnectionId(1), 1).unwrap();
        room.start().unwrap();

        let version = room.disconnect(ConnectionId(1)).unwrap();
        assert_eq!(room.disconnect(ConnectionId(1)), None);
        assert!(!room.promote_to_bot(ConnectionId(1), version + 1));
        assert!(room.promote_to_bot(ConnectionId(1), version));
        assert!(!room.promote_to_bot(ConnectionId(1), version));
        assert_eq!(room.bot_to_move(), Some(color(1)));
    }

    #[test]
    fn reconnect_takes_over_lost_seat() {
        let (mut room, _rx) = forming_room();
        room.select_color(ConnectionId(2), 4).unwrap();
        room.start().unwrap();

        let (handle, _rx3) = ConnectionHandle::channel();
        assert_eq!(
            room.reconnect(ConnectionId(3), "99999999", handle.clone()),
            Err(ActionError::UnknownUser)
        );

        room.disconnect(ConnectionId(2)).unwrap();
        room.reconnect(ConnectionId(3), "00000002", handle).unwrap();
        assert!(room.connection(ConnectionId(2)).is_none());
        let seat = room.connection(ConnectionId(3)).unwrap();
        assert_eq!(seat.name, "Bea");
        assert_eq!(seat.color, Some(color(4)));
        assert!(seat.is_connected());
    }

    #[test]
    fn reconnect_replaces_live_link() {
        let (mut room, mut rx) = forming_room();
        room.select_color(ConnectionId(2), 4).unwrap();
        room.start().unwrap();

        let (handle, _rx3) = ConnectionHandle::channel();
        room.reconnect(ConnectionId(3), "00000002", handle).unwrap();
        assert!(room.connection(ConnectionId(2)).is_none());
        assert_eq!(room.connections().len(), 2);

        let old = &mut rx[1];
        assert!(matches!(
            old.try_recv(),
            Ok(Outbound::Message(ServerMessage::Status { status })) if status == STATUS_REPLACED
        ));
        assert!(matches!(old.try_recv(), Ok(Outbound::Close)));

        // the old link closing afterwards does not touch the new seat
        assert_eq!(room.disconnect(ConnectionId(2)), None);
        assert!(room.connection(ConnectionId(3)).unwrap().is_connected());
    }

    #[test]
    fn idle_snapshot_tracks_liveness() {
        let (mut room, _rx) = forming_room();
        assert_eq!(room.idle_snapshot(), None);
        room.remove_connection(ConnectionId(1)).unwrap();
        room.remove_connection(ConnectionId(2)).unwrap();
        assert_eq!(room.idle_snapshot(), Some(vec![]));
        assert_eq!(room.mark_deleted(), Vec::<String>::new());
        assert_eq!(room.idle_snapshot(), None);
        assert!(room.remove_bot(1).is_ok());
    }

    #[test]
    fn broadcast_personalises_each_view() {
        let (mut room, mut rx) = forming_room();
        room.select_color(ConnectionId(2), 4).unwrap();
        room.broadcast_state();

        let Some(Outbound::Message(ServerMessage::GameState(view))) = rx[1].try_recv().ok() else {
            panic!("expected a state message");
        };
        assert_eq!(view.user_id.as_deref(), Some("00000002"));
        assert_eq!(view.color, 4);
        assert_eq!(view.status, RoomStatus::Forming);
        assert!(view.board.is_none());
        assert_eq!(view.connections.len(), 2);

        room.start().unwrap();
        let view = room.view_for(ConnectionId(1)).unwrap();
        assert_eq!(view.color, 0);
        assert_eq!(view.players, Some(vec![color(4)]));
        assert_eq!(view.turn, Some(0));
        assert_eq!(view.prev_moves, Some(vec![]));
    }

    #[test]
    fn bot_turn_plays_for_expected_color_only() {
        let distances = DistanceTable::build();
        let mut rng = StdRng::seed_from_u64(3);
        let mut room = GameRoom::new("00000002");
        room.add_bot(ConnectionId(1), 1).unwrap();
        room.add_bot(ConnectionId(2), 4).unwrap();
        room.start().unwrap();

        assert!(!room.play_bot_turn(color(4), &distances, &mut rng).unwrap());
        assert!(room.play_bot_turn(color(1), &distances, &mut rng).unwrap());
        assert_eq!(room.bot_to_move(), Some(color(4)));
        assert_eq!(room.game().unwrap().board().count(color(1)), 10);
    }
}

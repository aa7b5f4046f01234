//! Rules engine: move validation, turn order and victory.

use crate::board::{Board, Cell, Color};

/// Errors returned when a move is rejected. The game state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("a player has already won the game")]
    AlreadyWon,
    #[error("a move needs a destination")]
    MalformedMove,
    #[error("the piece is not owned by the current player")]
    NotYourPiece,
    #[error("invalid move")]
    IllegalMove,
}

/// A game in progress between a fixed set of colors.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    players: Vec<Color>,
    turn: usize,
    last_move: Vec<Cell>,
}

impl Game {
    /// Starts a game with every listed color on its home region.
    ///
    /// Colors are sorted and deduplicated. Returns `None` for an empty set.
    pub fn new(players: impl IntoIterator<Item = Color>) -> Option<Self> {
        let mut players: Vec<Color> = players.into_iter().collect();
        players.sort_unstable();
        players.dedup();
        if players.is_empty() {
            return None;
        }
        let board = Board::starting(&players);
        Some(Self {
            board,
            players,
            turn: 0,
            last_move: Vec::new(),
        })
    }

    /// Starts a game from an arbitrary position.
    pub fn with_board(players: impl IntoIterator<Item = Color>, board: Board) -> Option<Self> {
        let mut game = Self::new(players)?;
        game.board = board;
        Some(game)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn players(&self) -> &[Color] {
        &self.players
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn current_player(&self) -> Color {
        self.players[self.turn]
    }

    pub fn last_move(&self) -> &[Cell] {
        &self.last_move
    }

    /// Validates and applies a move for the current player.
    ///
    /// An empty move passes. Two cells must be a single-step hop; longer
    /// sequences are jump chains that may not revisit a cell. Cells off the star
    /// are rejected before any geometry is checked.
    pub fn apply_move(&mut self, moves: &[Cell]) -> Result<(), MoveError> {
        self.apply(moves, false)
    }

    /// Applies a move taken from [`crate::movegen`].
    ///
    /// The generator reports a lone jump as a two-cell path, so a two-cell move
    /// may also be a single jump here.
    pub(crate) fn apply_generated_move(&mut self, moves: &[Cell]) -> Result<(), MoveError> {
        self.apply(moves, true)
    }

    fn apply(&mut self, moves: &[Cell], short_jump: bool) -> Result<(), MoveError> {
        if self.winner().is_some() {
            return Err(MoveError::AlreadyWon);
        }
        let (origin, destination) = match moves {
            [] => {
                self.last_move.clear();
                self.advance_turn();
                return Ok(());
            }
            [_] => return Err(MoveError::MalformedMove),
            [first, .., last] => (*first, *last),
        };

        let mover = self.current_player();
        if self.board.get(origin) != Some(mover) {
            return Err(MoveError::NotYourPiece);
        }

        if !moves.iter().all(|cell| cell.is_valid()) || !self.is_legal_path(moves, short_jump) {
            return Err(MoveError::IllegalMove);
        }

        self.board.set(destination, Some(mover));
        self.board.set(origin, None);
        self.last_move = moves.to_vec();
        self.advance_turn();
        Ok(())
    }

    fn is_legal_path(&self, moves: &[Cell], short_jump: bool) -> bool {
        if let [from, to] = moves {
            return self.board.is_hop(*from, *to)
                || (short_jump && self.board.is_jump(*from, *to));
        }
        for (i, cell) in moves.iter().enumerate() {
            if moves[..i].contains(cell) {
                return false;
            }
        }
        moves.windows(2).all(|w| self.board.is_jump(w[0], w[1]))
    }

    fn advance_turn(&mut self) {
        self.turn = (self.turn + 1) % self.players.len();
    }

    /// The first color (ascending) whose home region is entirely held by its
    /// opposite color.
    pub fn winner(&self) -> Option<Color> {
        Color::ALL.into_iter().find(|&color| {
            let invader = color.opposite();
            color
                .home()
                .iter()
                .all(|&cell| self.board.get(cell) == Some(invader))
        })
    }
}

//! Starhop core: board geometry, rules, move generation and the bot.
//!
//! Everything here is synchronous and deterministic apart from the bot's
//! tie-breaking, which takes its random source from the caller.

pub mod assignment;
pub mod board;
pub mod bot;
pub mod distance;
pub mod game;
pub mod movegen;

pub use board::{Board, Cell, Color, InvalidColor, BOARD_SIZE, CELL_COUNT, PIECES_PER_PLAYER};
pub use bot::{score_board, BotError, BotEvaluator};
pub use distance::DistanceTable;
pub use game::{Game, MoveError};
pub use movegen::{all_moves, moves_from};

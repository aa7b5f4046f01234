//! Errors reported back to the client that sent an action.

use starhop_core::{BotError, MoveError};

/// A rejected action. Room state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Player is already in a game room")]
    AlreadyInRoom,

    #[error("Player is not in a game room")]
    NotInRoom,

    #[error("Game does not exist")]
    RoomNotFound,

    #[error("Player name must be between 1 and {max} characters")]
    InvalidName { max: usize },

    #[error("Invalid color selected: {0}")]
    InvalidColor(u8),

    #[error("Another player has already selected this color")]
    ColorTaken,

    #[error("Selected player is not a bot")]
    NotABot,

    #[error("No players in the game")]
    NoPlayers,

    #[error("Game is not in progress")]
    GameNotInProgress,

    #[error("Game is already in progress")]
    GameAlreadyStarted,

    #[error("A player has already won the game")]
    AlreadyWon,

    #[error("It is not your turn")]
    NotYourTurn,

    #[error("user_id does not match any player")]
    UnknownUser,

    #[error("Invalid move: {0}")]
    Move(#[from] MoveError),

    #[error("Bot failed: {0}")]
    Bot(#[from] BotError),
}

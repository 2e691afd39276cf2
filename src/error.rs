//! Error types for move application and configuration loading.

use thiserror::Error;

use crate::moves::Square;
use crate::piece::Color;

/// Why a submitted move was rejected. The game state is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("no piece at {0:?}")]
    NoPiece(Square),

    #[error("piece at {square:?} belongs to {owner}, but it is {turn}'s turn")]
    WrongTurn {
        square: Square,
        owner: Color,
        turn: Color,
    },

    #[error("illegal move from {from:?} to {to:?}")]
    Illegal { from: Square, to: Square },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid game config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("repetition limit must be at least 2, got {0}")]
    UnsupportedRepetitionLimit(u32),
}

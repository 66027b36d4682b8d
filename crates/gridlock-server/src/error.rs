//! Client-input errors.
//!
//! Every variant describes a request the server refused. None of them is
//! fatal, and a rejected request never changes any lobby or binding.

use gridlock_core::{Position, RulesError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("No such lobby")]
    NoSuchLobby,

    #[error("Lobby is full")]
    LobbyFull,

    #[error("Game is not active")]
    GameNotActive,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Illegal position: {0}")]
    IllegalPosition(Position),

    #[error("Already seated in this lobby")]
    AlreadySeated,

    #[error("Invalid variant: {0}")]
    InvalidVariant(#[from] RulesError),

    #[error("Could not allocate a lobby id")]
    LobbyIdExhausted,
}

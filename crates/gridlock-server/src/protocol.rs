//! WebSocket protocol messages for Gridlock multiplayer.
//!
//! Every frame is a JSON object `{"type": "<event>", "payload": {...}}`
//! with kebab-case event names and camelCase payload fields.

use gridlock_core::{Board, Position, Variant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Rejection;
use crate::lobby::{GameResult, LobbyId, ParticipantId, Seat};

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Open a new lobby; the server picks its id
    CreateLobby { variant: String, size: Option<u8> },

    /// Take the second seat of a waiting lobby
    JoinLobby { lobby_id: LobbyId },

    /// Place a mark at a cell index (or drop into a column)
    MakeMove { lobby_id: LobbyId, position: Position },

    /// Leave the current lobby without disconnecting
    LeaveLobby,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Welcome message with assigned participant ID
    Welcome { participant_id: ParticipantId },

    /// Lobby created, creator holds the first seat
    LobbyCreated {
        lobby_id: LobbyId,
        seat: Seat,
        variant: Variant,
    },

    /// Second seat filled; sent to both seats
    PlayerJoined {
        lobby_id: LobbyId,
        seats: BTreeMap<Seat, ParticipantId>,
        turn: Seat,
        board: Board,
    },

    /// Join refused because the lobby has no open seat
    LobbyFull {},

    /// Accepted move; sent to both seats
    MoveMade {
        lobby_id: LobbyId,
        seat: Seat,
        position: Position,
        board: Board,
        next_turn: Seat,
        result: GameResult,
    },

    /// Move refused; sent to the submitter only
    MoveRejected {
        lobby_id: LobbyId,
        reason: RejectReason,
        message: String,
    },

    /// A non-move request was refused
    Error { reason: RejectReason, message: String },

    /// The other seat left; the game will not continue
    OpponentLeft { lobby_id: LobbyId, seat: Seat },

    /// Acknowledges `leave-lobby`
    LeftLobby { lobby_id: LobbyId },

    /// Lobby removed by the server
    LobbyClosed { lobby_id: LobbyId, reason: String },

    /// Pong response
    Pong {},
}

/// Machine-readable rejection code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    NoSuchLobby,
    LobbyFull,
    GameNotActive,
    NotYourTurn,
    IllegalPosition,
    AlreadySeated,
    InvalidVariant,
    Unavailable,
}

impl From<&Rejection> for RejectReason {
    fn from(rejection: &Rejection) -> Self {
        match rejection {
            Rejection::NoSuchLobby => RejectReason::NoSuchLobby,
            Rejection::LobbyFull => RejectReason::LobbyFull,
            Rejection::GameNotActive => RejectReason::GameNotActive,
            Rejection::NotYourTurn => RejectReason::NotYourTurn,
            Rejection::IllegalPosition(_) => RejectReason::IllegalPosition,
            Rejection::AlreadySeated => RejectReason::AlreadySeated,
            Rejection::InvalidVariant(_) => RejectReason::InvalidVariant,
            Rejection::LobbyIdExhausted => RejectReason::Unavailable,
        }
    }
}

impl ServerMessage {
    pub fn move_rejected(lobby_id: LobbyId, rejection: &Rejection) -> Self {
        ServerMessage::MoveRejected {
            lobby_id,
            reason: rejection.into(),
            message: rejection.to_string(),
        }
    }

    pub fn error(rejection: &Rejection) -> Self {
        ServerMessage::Error {
            reason: rejection.into(),
            message: rejection.to_string(),
        }
    }
}

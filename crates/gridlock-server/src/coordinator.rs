//! Authoritative move validation.
//!
//! Clients only ever name a position. The board a move produces is always
//! computed here from the board the server holds.

use gridlock_core::{apply_move, evaluate, Board, Position};
use tracing::debug;

use crate::error::Rejection;
use crate::lobby::{GameResult, LobbyId, LobbyPhase, ParticipantId, Seat};
use crate::registry::Registry;

/// An accepted move, ready to broadcast to both seats
#[derive(Debug, Clone)]
pub struct MoveApplied {
    pub lobby_id: LobbyId,
    pub seat: Seat,
    pub position: Position,
    pub board: Board,
    pub next_turn: Seat,
    pub result: GameResult,
    pub recipients: Vec<ParticipantId>,
}

/// Validate and apply one move.
///
/// Checks run in a fixed order and the first failure wins: the lobby must
/// exist, its game must be in progress, the submitter must hold the seat
/// whose turn it is, and the rules engine must accept the position. The
/// lobby is only written after every check has passed.
pub fn submit_move(
    registry: &mut Registry,
    participant: ParticipantId,
    lobby_id: &str,
    position: Position,
) -> Result<MoveApplied, Rejection> {
    let lobby = registry
        .lobby_mut(lobby_id)
        .ok_or(Rejection::NoSuchLobby)?;

    if lobby.phase() != LobbyPhase::InProgress {
        return Err(Rejection::GameNotActive);
    }

    let seat = lobby.turn();
    if lobby.occupant(seat) != Some(participant) {
        return Err(Rejection::NotYourTurn);
    }

    let board = lobby.board().ok_or(Rejection::GameNotActive)?;
    let next = apply_move(board, position, seat.mark()).map_err(|e| {
        debug!("Lobby {}: {}", lobby_id, e);
        Rejection::IllegalPosition(position)
    })?;
    let outcome = evaluate(&next);

    lobby.advance(next.clone(), outcome);
    debug!(
        "Lobby {}: {:?} played {} ({:?})",
        lobby_id, seat, position, lobby.result()
    );

    Ok(MoveApplied {
        lobby_id: lobby.id.clone(),
        seat,
        position,
        board: next,
        next_turn: lobby.turn(),
        result: lobby.result(),
        recipients: lobby.participants(),
    })
}

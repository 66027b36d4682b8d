//! Per-lobby authoritative game state.

use gridlock_core::{initial_board, Board, Mark, Outcome, Variant};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::Rejection;

/// Shareable lobby code, e.g. `"k3x9qa"`
pub type LobbyId = String;

/// Connection-level identity of a participant
pub type ParticipantId = Uuid;

/// Length of generated lobby ids
pub const LOBBY_ID_LEN: usize = 6;

const LOBBY_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Draw a random lobby id. Uniqueness is checked by the registry.
pub fn generate_lobby_id<R: Rng + ?Sized>(rng: &mut R) -> LobbyId {
    (0..LOBBY_ID_LEN)
        .map(|_| LOBBY_ID_ALPHABET[rng.gen_range(0..LOBBY_ID_ALPHABET.len())] as char)
        .collect()
}

/// One of the two fixed player slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    /// Mark this seat places on the board
    pub fn mark(self) -> Mark {
        match self {
            Seat::First => Mark::X,
            Seat::Second => Mark::O,
        }
    }

    pub fn for_mark(mark: Mark) -> Seat {
        match mark {
            Mark::X => Seat::First,
            Mark::O => Seat::Second,
        }
    }
}

/// Game result as reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "seat", rename_all = "kebab-case")]
pub enum GameResult {
    InProgress,
    Won(Seat),
    Drawn,
}

impl From<Outcome> for GameResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::InProgress => GameResult::InProgress,
            Outcome::Winner(mark) => GameResult::Won(Seat::for_mark(mark)),
            Outcome::Draw => GameResult::Drawn,
        }
    }
}

/// Lobby lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LobbyPhase {
    /// Only the creator is seated; no board yet
    WaitingForSecondPlayer,
    InProgress,
    /// Won or drawn; see [`Lobby::result`]
    Finished,
    /// A seat emptied after the game began
    Abandoned,
}

impl LobbyPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LobbyPhase::Finished | LobbyPhase::Abandoned)
    }
}

/// A two-seat game session
#[derive(Debug, Clone)]
pub struct Lobby {
    pub id: LobbyId,
    pub variant: Variant,
    seats: BTreeMap<Seat, ParticipantId>,
    board: Option<Board>,
    turn: Seat,
    phase: LobbyPhase,
    result: GameResult,
    last_activity: Instant,
}

impl Lobby {
    /// New lobby with the creator in the first seat
    pub fn new(id: LobbyId, variant: Variant, creator: ParticipantId) -> Self {
        let mut seats = BTreeMap::new();
        seats.insert(Seat::First, creator);

        Self {
            id,
            variant,
            seats,
            board: None,
            turn: Seat::First,
            phase: LobbyPhase::WaitingForSecondPlayer,
            result: GameResult::InProgress,
            last_activity: Instant::now(),
        }
    }

    pub fn seats(&self) -> &BTreeMap<Seat, ParticipantId> {
        &self.seats
    }

    pub fn occupant(&self, seat: Seat) -> Option<ParticipantId> {
        self.seats.get(&seat).copied()
    }

    pub fn seat_of(&self, participant: ParticipantId) -> Option<Seat> {
        self.seats
            .iter()
            .find(|(_, id)| **id == participant)
            .map(|(seat, _)| *seat)
    }

    pub fn participants(&self) -> Vec<ParticipantId> {
        self.seats.values().copied().collect()
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn turn(&self) -> Seat {
        self.turn
    }

    pub fn phase(&self) -> LobbyPhase {
        self.phase
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= 2
    }

    /// Seat the second player and deal the board.
    ///
    /// Only a waiting lobby accepts a player; a lobby whose game has begun
    /// never reopens a seat.
    pub fn seat_second(&mut self, participant: ParticipantId) -> Result<(), Rejection> {
        if self.phase != LobbyPhase::WaitingForSecondPlayer || self.is_full() {
            return Err(Rejection::LobbyFull);
        }
        if self.seat_of(participant).is_some() {
            return Err(Rejection::AlreadySeated);
        }

        self.seats.insert(Seat::Second, participant);
        self.board = Some(initial_board(self.variant));
        self.phase = LobbyPhase::InProgress;
        self.touch();
        Ok(())
    }

    /// Commit an already validated board and move the game on
    pub(crate) fn advance(&mut self, board: Board, outcome: Outcome) {
        self.board = Some(board);
        self.result = outcome.into();
        if outcome.is_over() {
            self.phase = LobbyPhase::Finished;
        } else {
            self.turn = self.turn.other();
        }
        self.touch();
    }

    /// Clear a participant's seat, returning the seat they held
    pub fn vacate(&mut self, participant: ParticipantId) -> Option<Seat> {
        let seat = self.seat_of(participant)?;
        self.seats.remove(&seat);
        if self.phase == LobbyPhase::InProgress {
            self.phase = LobbyPhase::Abandoned;
        }
        self.touch();
        Some(seat)
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Whether nothing has happened in this lobby for at least `timeout`
    pub fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) >= timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_core::apply_move;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn waiting_lobby() -> (Lobby, ParticipantId) {
        let creator = Uuid::new_v4();
        (Lobby::new("abc123".into(), Variant::Classic, creator), creator)
    }

    #[test]
    fn test_new_lobby_waits_without_board() {
        let (lobby, creator) = waiting_lobby();
        assert_eq!(lobby.phase(), LobbyPhase::WaitingForSecondPlayer);
        assert_eq!(lobby.occupant(Seat::First), Some(creator));
        assert_eq!(lobby.turn(), Seat::First);
        assert!(lobby.board().is_none());
    }

    #[test]
    fn test_second_seat_deals_board() {
        let (mut lobby, _) = waiting_lobby();
        let guest = Uuid::new_v4();
        lobby.seat_second(guest).unwrap();

        assert_eq!(lobby.phase(), LobbyPhase::InProgress);
        assert_eq!(lobby.seat_of(guest), Some(Seat::Second));
        assert_eq!(lobby.board().unwrap().cells().len(), 9);
        assert!(lobby.is_full());
    }

    #[test]
    fn test_third_player_rejected() {
        let (mut lobby, _) = waiting_lobby();
        lobby.seat_second(Uuid::new_v4()).unwrap();
        let before = lobby.seats().clone();

        assert_eq!(lobby.seat_second(Uuid::new_v4()), Err(Rejection::LobbyFull));
        assert_eq!(lobby.seats(), &before);
    }

    #[test]
    fn test_started_game_is_not_redealt() {
        let (mut lobby, creator) = waiting_lobby();
        let guest = Uuid::new_v4();
        lobby.seat_second(guest).unwrap();

        let board = apply_move(lobby.board().unwrap(), 4, Mark::X).unwrap();
        lobby.advance(board, Outcome::InProgress);

        for late in [Uuid::new_v4(), creator, guest] {
            assert_eq!(lobby.seat_second(late), Err(Rejection::LobbyFull));
        }

        let board = lobby.board().unwrap();
        assert_eq!(board.get(4), Some(Mark::X));
        assert_eq!(board.move_count(), 1);
        assert_eq!(lobby.turn(), Seat::Second);
        assert_eq!(lobby.phase(), LobbyPhase::InProgress);
    }

    #[test]
    fn test_creator_cannot_take_both_seats() {
        let (mut lobby, creator) = waiting_lobby();
        assert_eq!(lobby.seat_second(creator), Err(Rejection::AlreadySeated));
        assert_eq!(lobby.phase(), LobbyPhase::WaitingForSecondPlayer);
    }

    #[test]
    fn test_advance_flips_turn_until_finished() {
        let (mut lobby, _) = waiting_lobby();
        lobby.seat_second(Uuid::new_v4()).unwrap();

        let board = apply_move(lobby.board().unwrap(), 0, Mark::X).unwrap();
        lobby.advance(board.clone(), Outcome::InProgress);
        assert_eq!(lobby.turn(), Seat::Second);

        lobby.advance(board, Outcome::Winner(Mark::O));
        assert_eq!(lobby.phase(), LobbyPhase::Finished);
        assert_eq!(lobby.result(), GameResult::Won(Seat::Second));
        assert_eq!(lobby.turn(), Seat::Second);
    }

    #[test]
    fn test_vacate_mid_game_abandons() {
        let (mut lobby, creator) = waiting_lobby();
        lobby.seat_second(Uuid::new_v4()).unwrap();

        assert_eq!(lobby.vacate(creator), Some(Seat::First));
        assert_eq!(lobby.phase(), LobbyPhase::Abandoned);
        assert!(lobby.phase().is_terminal());
        assert_eq!(lobby.vacate(creator), None);
        assert_eq!(lobby.seat_second(Uuid::new_v4()), Err(Rejection::LobbyFull));
    }

    #[test]
    fn test_idle_check() {
        let (lobby, _) = waiting_lobby();
        let timeout = Duration::from_secs(60);
        assert!(!lobby.is_idle(Instant::now(), timeout));
        assert!(lobby.is_idle(Instant::now() + timeout, timeout));
    }

    #[test]
    fn test_generated_ids_use_alphabet() {
        let mut rng = StdRng::seed_from_u64(42);
        let id = generate_lobby_id(&mut rng);
        assert_eq!(id.len(), LOBBY_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_result_serializes_with_seat() {
        let json = serde_json::to_value(GameResult::Won(Seat::First)).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "won", "seat": "first" }));
    }
}

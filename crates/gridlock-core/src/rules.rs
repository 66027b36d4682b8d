//! Move application and game evaluation.
//!
//! These are pure functions: they take a board by reference and either
//! return a new board or describe why the move was refused. Nothing here
//! knows about seats, lobbies or connections.

use crate::board::{Board, Mark, Position};
use crate::variant::Variant;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// State of a game as judged from its board alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    Winner(Mark),
    Draw,
}

impl Outcome {
    pub fn is_over(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// Reasons the rules engine refuses a move or a variant
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RulesError {
    #[error("Position {0} is off the board")]
    OutOfBounds(Position),

    #[error("Cell {0} is already taken")]
    Occupied(Position),

    #[error("Column {0} is full")]
    ColumnFull(Position),

    #[error("Unknown game variant: {0}")]
    UnknownVariant(String),

    #[error("Unsupported board size: {0}")]
    InvalidSize(u8),

    #[error("Board has {found} cells, expected {expected}")]
    CellCount { expected: usize, found: usize },
}

/// Empty board for a variant
pub fn initial_board(variant: Variant) -> Board {
    Board::new(variant)
}

/// Place `mark` at `position`, returning the resulting board.
///
/// The input board is left untouched whether or not the move is legal.
pub fn apply_move(board: &Board, position: Position, mark: Mark) -> Result<Board, RulesError> {
    let variant = board.variant();
    if position >= variant.position_count() {
        return Err(RulesError::OutOfBounds(position));
    }

    match board.landing_cell(position) {
        Some(cell) => Ok(board.with_mark(cell, mark)),
        None if variant.has_gravity() => Err(RulesError::ColumnFull(position)),
        None => Err(RulesError::Occupied(position)),
    }
}

/// Winner if any line is owned by one mark, draw if the board is full
pub fn evaluate(board: &Board) -> Outcome {
    if let Some(mark) = winning_mark(board) {
        return Outcome::Winner(mark);
    }
    if board.is_full() {
        Outcome::Draw
    } else {
        Outcome::InProgress
    }
}

/// Owner of the first fully-owned winning line, if any
pub fn winning_mark(board: &Board) -> Option<Mark> {
    board
        .variant()
        .winning_lines()
        .iter()
        .find_map(|line| line_owner(board, line))
}

fn line_owner(board: &Board, line: &[usize]) -> Option<Mark> {
    let (first, rest) = line.split_first()?;
    let mark = board.get(*first)?;
    rest.iter()
        .all(|&i| board.get(i) == Some(mark))
        .then_some(mark)
}

//! Board representation.
//!
//! A [`Board`] is an immutable-by-convention value: the rules engine never
//! edits one in place, it returns a fresh board for every accepted move.

use crate::rules::RulesError;
use crate::variant::{Variant, CONNECT_FOUR_COLS, CONNECT_FOUR_ROWS};
use serde::{Deserialize, Serialize};

/// A position named by a move: a cell index for grid variants, a column
/// index for connect-four.
pub type Position = usize;

/// The piece placed by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The other player's mark
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mark::X => f.write_str("X"),
            Mark::O => f.write_str("O"),
        }
    }
}

/// Cells of one game, shaped by its [`Variant`].
///
/// Deserializing goes through the same checks as [`Board::from_cells`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBoard")]
pub struct Board {
    variant: Variant,
    cells: Vec<Option<Mark>>,
}

/// Unchecked wire shape of a [`Board`]
#[derive(Deserialize)]
struct RawBoard {
    variant: Variant,
    cells: Vec<Option<Mark>>,
}

impl TryFrom<RawBoard> for Board {
    type Error = RulesError;

    fn try_from(raw: RawBoard) -> Result<Self, Self::Error> {
        // Sizes outside the supported range have no winning-line table
        let variant = match raw.variant {
            Variant::Large { size } => Variant::large(size)?,
            other => other,
        };
        let expected = variant.cell_count();
        let found = raw.cells.len();
        Board::from_cells(variant, raw.cells).ok_or(RulesError::CellCount { expected, found })
    }
}

impl Board {
    /// Create an empty board for the variant
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            cells: vec![None; variant.cell_count()],
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn cells(&self) -> &[Option<Mark>] {
        &self.cells
    }

    /// Mark at a flat cell index, `None` if empty or out of range
    pub fn get(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    /// Number of marks placed so far
    pub fn move_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Mark due to move next, assuming X opened and turns alternated
    pub fn next_mark(&self) -> Mark {
        if self.move_count() % 2 == 0 {
            Mark::X
        } else {
            Mark::O
        }
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Cell a move at `position` would fill, if the move is legal
    pub fn landing_cell(&self, position: Position) -> Option<usize> {
        if self.variant.has_gravity() {
            if position >= CONNECT_FOUR_COLS {
                return None;
            }
            (0..CONNECT_FOUR_ROWS)
                .rev()
                .map(|row| row * CONNECT_FOUR_COLS + position)
                .find(|&cell| matches!(self.cells.get(cell), Some(None)))
        } else {
            match self.cells.get(position) {
                Some(None) => Some(position),
                _ => None,
            }
        }
    }

    /// Positions a move could currently name
    pub fn legal_positions(&self) -> Vec<Position> {
        (0..self.variant.position_count())
            .filter(|&p| self.landing_cell(p).is_some())
            .collect()
    }

    /// Copy of this board with one more mark placed
    pub(crate) fn with_mark(&self, cell: usize, mark: Mark) -> Board {
        let mut next = self.clone();
        next.cells[cell] = Some(mark);
        next
    }

    /// Build a board from explicit cells, e.g. a saved or hand-written position
    pub fn from_cells(variant: Variant, cells: Vec<Option<Mark>>) -> Option<Board> {
        (cells.len() == variant.cell_count()).then_some(Board { variant, cells })
    }
}

//! Grid game variants and their winning lines.
//!
//! Every variant is stored as a flat list of cells. Two-dimensional grids
//! are row-major; the stacked 3D variant stores layer after layer, so a cell
//! is addressed as `layer * 9 + index`.

use crate::rules::RulesError;
use serde::{Deserialize, Serialize};

/// Smallest accepted side length for a [`Variant::Large`] grid
pub const MIN_GRID_SIZE: u8 = 3;

/// Largest accepted side length for a [`Variant::Large`] grid
pub const MAX_GRID_SIZE: u8 = 9;

/// Connect-four board height
pub const CONNECT_FOUR_ROWS: usize = 6;

/// Connect-four board width
pub const CONNECT_FOUR_COLS: usize = 7;

/// Side length of each layer of the 3D board
pub const THREE_D_SIZE: usize = 3;

/// Number of stacked layers of the 3D board
pub const THREE_D_LAYERS: usize = 3;

/// Length of a connect-four winning run
const CONNECT_RUN: usize = 4;

/// A ruleset selecting board shape and win-line definitions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Variant {
    /// Standard 3x3 tic-tac-toe
    #[default]
    Classic,
    /// NxN tic-tac-toe; a line must span the whole board
    Large { size: u8 },
    /// Six rows by seven columns with gravity, four in a row wins
    ConnectFour,
    /// Three stacked 3x3 layers
    #[serde(rename = "3d")]
    ThreeD,
}

impl Variant {
    /// Build a variant from its wire tag and an optional size.
    ///
    /// `size` is only meaningful for `"large"`. A `"classic"` request with
    /// a size other than 3 becomes the matching `Large` grid, and the
    /// `"4x4"`/`"5x5"` shorthands browser clients send are accepted too.
    pub fn from_kind(kind: &str, size: Option<u8>) -> Result<Self, RulesError> {
        match kind {
            "classic" => match size {
                None | Some(3) => Ok(Variant::Classic),
                Some(n) => Variant::large(n),
            },
            "large" => Variant::large(size.ok_or(RulesError::InvalidSize(0))?),
            "4x4" => Variant::large(4),
            "5x5" => Variant::large(5),
            "connect-four" => Ok(Variant::ConnectFour),
            "3d" => Ok(Variant::ThreeD),
            other => Err(RulesError::UnknownVariant(other.to_string())),
        }
    }

    /// Build an NxN variant, validating the side length
    pub fn large(size: u8) -> Result<Self, RulesError> {
        if (MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
            Ok(Variant::Large { size })
        } else {
            Err(RulesError::InvalidSize(size))
        }
    }

    /// Short tag used in logs and on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Variant::Classic => "classic",
            Variant::Large { .. } => "large",
            Variant::ConnectFour => "connect-four",
            Variant::ThreeD => "3d",
        }
    }

    /// Side length for square 2D variants
    fn side(&self) -> Option<usize> {
        match self {
            Variant::Classic => Some(3),
            Variant::Large { size } => Some(*size as usize),
            _ => None,
        }
    }

    /// Total number of cells on the board
    pub fn cell_count(&self) -> usize {
        match self {
            Variant::Classic | Variant::Large { .. } => {
                let side = self.side().unwrap_or(3);
                side * side
            }
            Variant::ConnectFour => CONNECT_FOUR_ROWS * CONNECT_FOUR_COLS,
            Variant::ThreeD => THREE_D_LAYERS * THREE_D_SIZE * THREE_D_SIZE,
        }
    }

    /// Whether pieces fall to the lowest free row of a column
    pub fn has_gravity(&self) -> bool {
        matches!(self, Variant::ConnectFour)
    }

    /// Number of distinct positions a move may name
    pub fn position_count(&self) -> usize {
        if self.has_gravity() {
            CONNECT_FOUR_COLS
        } else {
            self.cell_count()
        }
    }

    /// All lines that win the game when owned by a single mark
    pub fn winning_lines(&self) -> Vec<Vec<usize>> {
        match self {
            Variant::Classic | Variant::Large { .. } => {
                square_lines(self.side().unwrap_or(3))
            }
            Variant::ConnectFour => connect_four_lines(),
            Variant::ThreeD => three_d_lines(),
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Large { size } => write!(f, "{}x{}", size, size),
            other => f.write_str(other.kind()),
        }
    }
}

/// Rows, columns and both full diagonals of a square grid
fn square_lines(side: usize) -> Vec<Vec<usize>> {
    let mut lines = Vec::with_capacity(side * 2 + 2);

    for row in 0..side {
        lines.push((0..side).map(|col| row * side + col).collect());
    }
    for col in 0..side {
        lines.push((0..side).map(|row| row * side + col).collect());
    }

    lines.push((0..side).map(|i| i * (side + 1)).collect());
    lines.push((0..side).map(|i| (i + 1) * (side - 1)).collect());

    lines
}

/// Every run of four in a 6x7 grid
fn connect_four_lines() -> Vec<Vec<usize>> {
    let at = |row: usize, col: usize| row * CONNECT_FOUR_COLS + col;
    let mut lines = Vec::new();

    // Horizontal
    for row in 0..CONNECT_FOUR_ROWS {
        for col in 0..=CONNECT_FOUR_COLS - CONNECT_RUN {
            lines.push((0..CONNECT_RUN).map(|k| at(row, col + k)).collect());
        }
    }

    // Vertical
    for col in 0..CONNECT_FOUR_COLS {
        for row in 0..=CONNECT_FOUR_ROWS - CONNECT_RUN {
            lines.push((0..CONNECT_RUN).map(|k| at(row + k, col)).collect());
        }
    }

    // Diagonal, down-right
    for row in 0..=CONNECT_FOUR_ROWS - CONNECT_RUN {
        for col in 0..=CONNECT_FOUR_COLS - CONNECT_RUN {
            lines.push((0..CONNECT_RUN).map(|k| at(row + k, col + k)).collect());
        }
    }

    // Diagonal, up-right
    for row in CONNECT_RUN - 1..CONNECT_FOUR_ROWS {
        for col in 0..=CONNECT_FOUR_COLS - CONNECT_RUN {
            lines.push((0..CONNECT_RUN).map(|k| at(row - k, col + k)).collect());
        }
    }

    lines
}

/// Per-layer lines, vertical pillars and the four space diagonals
fn three_d_lines() -> Vec<Vec<usize>> {
    let layer_cells = THREE_D_SIZE * THREE_D_SIZE;
    let mut lines = Vec::new();

    for layer in 0..THREE_D_LAYERS {
        let offset = layer * layer_cells;
        for line in square_lines(THREE_D_SIZE) {
            lines.push(line.into_iter().map(|i| offset + i).collect());
        }
    }

    for i in 0..layer_cells {
        lines.push((0..THREE_D_LAYERS).map(|layer| layer * layer_cells + i).collect());
    }

    // Corner of the bottom layer, centre of the middle, opposite corner on top
    for (bottom, top) in [(0, 8), (2, 6), (6, 2), (8, 0)] {
        lines.push(vec![bottom, layer_cells + 4, 2 * layer_cells + top]);
    }

    lines
}

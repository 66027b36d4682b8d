//! Gridlock - rules engine for the tic-tac-toe family of grid games
//!
//! This crate provides the pure game logic shared by the server and the
//! browser client:
//! - Variant definitions: classic 3x3, NxN, connect-four and stacked 3D
//! - Board representation with flat cell addressing
//! - Move application and win/draw evaluation
//!
//! # Architecture
//!
//! Nothing here holds state between calls. The server keeps the
//! authoritative board for each lobby and asks this crate to validate and
//! apply single moves. With the `wasm` feature the same rules are exported
//! to JavaScript for offline play.
//!
//! # Modules
//!
//! - [`variant`]: Board shapes and winning lines
//! - [`board`]: Cells, marks and move positions
//! - [`rules`]: `apply_move` and `evaluate`

pub mod board;
pub mod rules;
pub mod variant;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use board::{Board, Mark, Position};
pub use rules::{apply_move, evaluate, initial_board, winning_mark, Outcome, RulesError};
pub use variant::{Variant, MAX_GRID_SIZE, MIN_GRID_SIZE};

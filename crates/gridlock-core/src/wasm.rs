//! WebAssembly bindings for the Gridlock rules engine.
//!
//! The browser uses these for offline (hot-seat) games so that local play
//! follows exactly the rules the server enforces online.

use wasm_bindgen::prelude::*;

use crate::board::{Board, Mark};
use crate::rules::{self, Outcome};
use crate::variant::Variant;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed board wrapper
#[wasm_bindgen]
pub struct WasmBoard {
    board: Board,
}

#[wasm_bindgen]
impl WasmBoard {
    /// Create an empty board, e.g. `new WasmBoard("large", 4)`
    #[wasm_bindgen(constructor)]
    pub fn new(kind: &str, size: Option<u8>) -> Result<WasmBoard, JsValue> {
        let variant =
            Variant::from_kind(kind, size).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmBoard {
            board: Board::new(variant),
        })
    }

    /// Cells as a JSON array of `"X"`, `"O"` or `null`
    #[wasm_bindgen(js_name = getCells)]
    pub fn get_cells(&self) -> String {
        serde_json::to_string(self.board.cells()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Mark due to move next
    #[wasm_bindgen(js_name = nextMark)]
    pub fn next_mark(&self) -> String {
        self.board.next_mark().to_string()
    }

    /// Positions that would currently be accepted
    #[wasm_bindgen(js_name = legalPositions)]
    pub fn legal_positions(&self) -> Vec<u32> {
        self.board
            .legal_positions()
            .into_iter()
            .map(|p| p as u32)
            .collect()
    }

    /// Play the next mark at `position`
    #[wasm_bindgen(js_name = applyMove)]
    pub fn apply_move(&mut self, position: u32) -> Result<(), JsValue> {
        let mark = self.board.next_mark();
        self.board = rules::apply_move(&self.board, position as usize, mark)
            .map_err(|e| JsValue::from_str(&format!("Move failed: {}", e)))?;
        Ok(())
    }

    /// `"in-progress"`, `"draw"`, `"X"` or `"O"`
    pub fn evaluate(&self) -> String {
        match rules::evaluate(&self.board) {
            Outcome::InProgress => "in-progress".to_string(),
            Outcome::Draw => "draw".to_string(),
            Outcome::Winner(mark) => mark.to_string(),
        }
    }

    /// Check if the game is finished
    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        rules::evaluate(&self.board).is_over()
    }

    /// Start over with an empty board of the same variant
    pub fn reset(&mut self) {
        self.board = Board::new(self.board.variant());
    }

    /// Mark at a cell, `None` if empty
    #[wasm_bindgen(js_name = getCell)]
    pub fn get_cell(&self, index: u32) -> Option<String> {
        self.board.get(index as usize).map(|m: Mark| m.to_string())
    }
}

//! Board document reader/writer.
//!
//! The router's document boundary is a JSON snapshot of the in-memory
//! model. Conversion from vendor formats (KiCad and friends) lives
//! outside this crate; anything that can produce this snapshot can be
//! routed.

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::Board;

#[derive(Debug, Error)]
pub enum BoardIoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("board document error: {0}")]
    Document(#[from] serde_json::Error),
}

/// Read a board snapshot from disk.
pub fn load_board(path: &Path) -> Result<Board, BoardIoError> {
    let text = fs::read_to_string(path)?;
    let mut board: Board = serde_json::from_str(&text)?;
    board.refresh_id_counters();
    tracing::debug!(
        "loaded board: {} layers, {} nets, {} segments, {} vias, {} pads",
        board.layers.len(),
        board.nets().len(),
        board.segments().len(),
        board.vias().len(),
        board.pads().len()
    );
    Ok(board)
}

/// Write a board snapshot to disk.
pub fn save_board(path: &Path, board: &Board) -> Result<(), BoardIoError> {
    let text = serde_json::to_string_pretty(board)?;
    fs::write(path, text)?;
    Ok(())
}

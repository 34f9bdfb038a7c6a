//! Top-level routing API shared by library users and the CLI.
//! No document-format or argument-parsing dependencies.

use std::path::Path;

use crate::board::io::{load_board, save_board, BoardIoError};
use crate::board::{Board, BoardError, NetId};
use crate::config::RouteConfig;
use crate::drc::{ClearanceChecker, Violation};
use crate::router::{BatchReport, BatchRouter};

#[derive(Debug, thiserror::Error)]
pub enum GridRouteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("board document error: {0}")]
    Document(#[from] serde_json::Error),
    #[error("unknown net: {0}")]
    UnknownNet(String),
    #[error("unknown layer: {0}")]
    UnknownLayer(String),
    #[error("board edit error: {0}")]
    Board(#[from] BoardError),
}

impl From<BoardIoError> for GridRouteError {
    fn from(e: BoardIoError) -> Self {
        match e {
            BoardIoError::Io(e) => GridRouteError::Io(e),
            BoardIoError::Document(e) => GridRouteError::Document(e),
        }
    }
}

/// Core batch-routing API used by both library callers and the CLI.
pub struct RouterCore;

impl RouterCore {
    /// Read a board snapshot from disk.
    pub fn load_board(path: &Path) -> Result<Board, GridRouteError> {
        Ok(load_board(path)?)
    }

    /// Write a board snapshot to disk.
    pub fn save_board(path: &Path, board: &Board) -> Result<(), GridRouteError> {
        Ok(save_board(path, board)?)
    }

    /// Route the named nets, in the given order, against the board.
    ///
    /// The order is honored exactly; each successfully routed net becomes
    /// an obstacle for the ones after it.
    pub fn route_board(
        board: &mut Board,
        config: &RouteConfig,
        net_names: &[String],
    ) -> Result<BatchReport, GridRouteError> {
        let mut order: Vec<NetId> = Vec::with_capacity(net_names.len());
        for name in net_names {
            let net = board
                .net_by_name(name)
                .ok_or_else(|| GridRouteError::UnknownNet(name.clone()))?;
            order.push(net.id);
        }

        tracing::info!("routing {} nets", order.len());
        let mut router = BatchRouter::new(board, config.clone())?;
        let report = router.route_nets(&order);
        tracing::info!(
            "batch finished: {} routed, {} failed",
            report.routed_count(),
            report.failed_count()
        );
        Ok(report)
    }

    /// Verify the board's final geometry against a clearance value.
    pub fn check_clearance(board: &Board, clearance: f64) -> Vec<Violation> {
        ClearanceChecker::new(clearance).check_board(board)
    }
}

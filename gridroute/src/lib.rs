//! GridRoute - grid-based copper routing and clearance checking for
//! multilayer PCBs.
//!
//! Routes unconnected stub pairs across a discretized obstacle model of
//! the board, folds each successful route back into the board state so
//! later nets avoid it, and independently verifies clearance afterwards.
//!
//! # Quick Start
//!
//! ```no_run
//! use gridroute::{RouteConfig, RouterCore};
//! use std::path::Path;
//!
//! let mut board = RouterCore::load_board(Path::new("board.json")).unwrap();
//! let config = RouteConfig::default();
//! let report = RouterCore::route_board(
//!     &mut board,
//!     &config,
//!     &["D0".to_string(), "D1".to_string()],
//! ).unwrap();
//!
//! for net in &report.nets {
//!     println!("{}: {:?}", net.name, net.status);
//! }
//!
//! let violations = RouterCore::check_clearance(&board, config.clearance);
//! assert!(violations.is_empty());
//! ```
//!
//! # Features
//!
//! - **Batch routing**: sequential multi-net routing with incremental
//!   obstacle accumulation
//! - **Weighted A\***: multi-source/multi-target search with via costs,
//!   restricted zones and stub-proximity steering
//! - **Clearance checking**: independent cross-net DRC over tracks and
//!   vias
//! - **Differential pairs**: coupled routing with layer-sync and
//!   polarity-swap handling

pub mod board;
pub mod config;
pub mod core;
pub mod drc;
pub mod geometry;
pub mod grid;
pub mod router;

// Re-export main types
pub use board::{Board, BoardError, LayerId, Net, NetId, Pad, PadId, Segment, SegmentId, Via, ViaId};
pub use config::RouteConfig;
pub use core::{GridRouteError, RouterCore};
pub use drc::{ClearanceChecker, GeomRef, Violation, ViolationKind};
pub use grid::GridCoordinateSystem;
pub use router::{
    BatchReport, BatchRouter, DifferentialPairHandler, GridAstar, NetReport, NetStatus,
    ObstacleMap, PathCell, PathSearch, RouteResult, SearchOutcome,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        BatchReport, Board, ClearanceChecker, GridRouteError, NetReport, NetStatus, RouteConfig,
        RouterCore, Violation,
    };
}

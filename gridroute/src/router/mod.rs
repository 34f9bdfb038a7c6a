//! The routing engine: obstacle model, path search, route construction
//! and the sequential batch driver.

pub mod astar;
pub mod batch;
pub mod builder;
pub mod diffpair;
pub mod obstacle;

pub use astar::GridAstar;
pub use batch::{BatchReport, BatchRouter, NetReport, NetStatus};
pub use builder::{RouteResult, ShortenEdit, TrackPlan, ViaPlan};
pub use diffpair::{DifferentialPairHandler, PairOutcome, PairWarning};
pub use obstacle::ObstacleMap;

use crate::board::{Board, LayerId};
use crate::core::GridRouteError;

/// Cost of one orthogonal grid step, in internal search units.
///
/// All search costs are integers in these units; multiply by
/// `grid_step / STEP_COST as f64` to get millimeters of equivalent track.
pub const STEP_COST: i32 = 1000;

/// One unit of search state: a grid cell on a routing layer.
///
/// `layer` indexes the configured routing-layer list, not the board's
/// full layer table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct PathCell {
    pub gx: i32,
    pub gy: i32,
    pub layer: u8,
}

impl PathCell {
    pub fn new(gx: i32, gy: i32, layer: u8) -> Self {
        Self { gx, gy, layer }
    }

    /// Pack into a u64 key: 20 bits x, 20 bits y, 8 bits layer.
    #[inline]
    pub(crate) fn as_key(&self) -> u64 {
        let x = (self.gx as u64) & 0xFFFFF;
        let y = (self.gy as u64) & 0xFFFFF;
        let l = self.layer as u64;
        (x << 28) | (y << 8) | l
    }

    /// Unpack a key produced by [`PathCell::as_key`], sign-extending the
    /// 20-bit coordinates.
    #[inline]
    pub(crate) fn from_key(key: u64) -> Self {
        let layer = (key & 0xFF) as u8;
        let y = ((key >> 8) & 0xFFFFF) as i32;
        let x = ((key >> 28) & 0xFFFFF) as i32;
        let x = if x & 0x80000 != 0 { x | !0xFFFFF_i32 } else { x };
        let y = if y & 0x80000 != 0 { y | !0xFFFFF_i32 } else { y };
        Self::new(x, y, layer)
    }
}

/// Pack a planar (x, y) position, ignoring the layer.
#[inline]
pub(crate) fn pack_xy(gx: i32, gy: i32) -> u64 {
    let x = (gx as u64) & 0xFFFFFFFF;
    let y = (gy as u64) & 0xFFFFFFFF;
    (x << 32) | y
}

/// Result of one path search attempt.
#[derive(Clone, Debug)]
pub enum SearchOutcome {
    /// A path from a source to a target cell, source first, with its
    /// total cost in internal units.
    Found {
        path: Vec<PathCell>,
        cost: i32,
        iterations: u32,
    },
    /// No path within the iteration budget. Genuine unreachability and
    /// budget exhaustion are deliberately indistinguishable; the
    /// iteration count lets a caller decide whether a larger budget is
    /// worth retrying.
    Exhausted { iterations: u32 },
}

impl SearchOutcome {
    pub fn iterations(&self) -> u32 {
        match self {
            SearchOutcome::Found { iterations, .. } => *iterations,
            SearchOutcome::Exhausted { iterations } => *iterations,
        }
    }
}

/// Capability interface for path search engines.
///
/// The obstacle model and cost contract are fixed by [`ObstacleMap`] and
/// [`crate::RouteConfig`]; any engine implementing the same cost model can
/// be swapped in by the caller.
pub trait PathSearch {
    fn find_path(
        &self,
        obstacles: &ObstacleMap,
        sources: &[PathCell],
        targets: &[PathCell],
        max_iterations: u32,
    ) -> SearchOutcome;
}

/// Mapping between board layer indices and the dense routing-layer
/// indices the search uses.
#[derive(Clone, Debug)]
pub struct LayerMap {
    to_search: Vec<Option<u8>>,
    to_board: Vec<LayerId>,
}

impl LayerMap {
    /// Resolve the configured routing layer names against a board.
    pub fn new(board: &Board, names: &[String]) -> Result<Self, GridRouteError> {
        let mut to_search = vec![None; board.layers.len()];
        let mut to_board = Vec::with_capacity(names.len());
        for (search_idx, name) in names.iter().enumerate() {
            let board_idx = board
                .layer_index(name)
                .ok_or_else(|| GridRouteError::UnknownLayer(name.clone()))?;
            to_search[board_idx as usize] = Some(search_idx as u8);
            to_board.push(board_idx);
        }
        Ok(Self {
            to_search,
            to_board,
        })
    }

    /// Routing-layer index for a board layer, if that layer is routable.
    pub fn search_of(&self, board_layer: LayerId) -> Option<u8> {
        self.to_search
            .get(board_layer as usize)
            .copied()
            .flatten()
    }

    /// Board layer index for a routing layer.
    pub fn board_of(&self, search_layer: u8) -> LayerId {
        self.to_board[search_layer as usize]
    }

    /// Number of routing layers.
    pub fn len(&self) -> usize {
        self.to_board.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_board.is_empty()
    }
}

//! Discretized obstacle model.
//!
//! Built fresh for every net-routing attempt from all geometry that does
//! not belong to the net being routed. Blocking is a monotonic OR: a cell
//! blocked by any primitive stays blocked. The restricted-zone override
//! set re-opens zone cells only; it never overrides a copper block.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::board::{Board, NetId};
use crate::config::RouteConfig;
use crate::geometry::Point;
use crate::grid::GridCoordinateSystem;

use super::{pack_xy, LayerMap};

/// Per-layer blocked cells, via blocks, restricted zone and proximity
/// cost overlay for one search.
pub struct ObstacleMap {
    blocked: Vec<FxHashSet<u64>>,
    blocked_vias: FxHashSet<u64>,
    proximity: FxHashMap<u64, i32>,
    zone: Option<(i32, i32, i32, i32)>,
    allowed: FxHashSet<u64>,
    num_layers: usize,
}

impl ObstacleMap {
    pub fn new(num_layers: usize) -> Self {
        Self {
            blocked: (0..num_layers).map(|_| FxHashSet::default()).collect(),
            blocked_vias: FxHashSet::default(),
            proximity: FxHashMap::default(),
            zone: None,
            allowed: FxHashSet::default(),
            num_layers,
        }
    }

    pub fn num_layers(&self) -> usize {
        self.num_layers
    }

    pub fn block_cell(&mut self, gx: i32, gy: i32, layer: usize) {
        if layer < self.num_layers {
            self.blocked[layer].insert(pack_xy(gx, gy));
        }
    }

    pub fn block_via(&mut self, gx: i32, gy: i32) {
        self.blocked_vias.insert(pack_xy(gx, gy));
    }

    /// Set the restricted-zone rectangle in grid coordinates.
    pub fn set_zone(&mut self, min_gx: i32, min_gy: i32, max_gx: i32, max_gy: i32) {
        self.zone = Some((min_gx, min_gy, max_gx, max_gy));
    }

    /// Punch a cell through the restricted zone. Copper blocks still
    /// apply to allowed cells.
    pub fn allow_cell(&mut self, gx: i32, gy: i32) {
        self.allowed.insert(pack_xy(gx, gy));
    }

    /// Raise the proximity cost of a cell; an existing higher cost wins.
    pub fn bump_proximity(&mut self, gx: i32, gy: i32, cost: i32) {
        let key = pack_xy(gx, gy);
        let existing = self.proximity.get(&key).copied().unwrap_or(0);
        if cost > existing {
            self.proximity.insert(key, cost);
        }
    }

    #[inline]
    fn zone_blocks(&self, gx: i32, gy: i32) -> bool {
        if let Some((min_gx, min_gy, max_gx, max_gy)) = self.zone {
            if gx >= min_gx && gx <= max_gx && gy >= min_gy && gy <= max_gy {
                return !self.allowed.contains(&pack_xy(gx, gy));
            }
        }
        false
    }

    /// Whether a trace may occupy this cell on this layer.
    #[inline]
    pub fn is_blocked(&self, gx: i32, gy: i32, layer: usize) -> bool {
        if layer >= self.num_layers {
            return true;
        }
        if self.blocked[layer].contains(&pack_xy(gx, gy)) {
            return true;
        }
        self.zone_blocks(gx, gy)
    }

    /// Whether a via may be placed at this cell.
    #[inline]
    pub fn is_via_blocked(&self, gx: i32, gy: i32) -> bool {
        self.blocked_vias.contains(&pack_xy(gx, gy)) || self.zone_blocks(gx, gy)
    }

    /// Extra path cost for entering this cell.
    #[inline]
    pub fn proximity_cost(&self, gx: i32, gy: i32) -> i32 {
        self.proximity.get(&pack_xy(gx, gy)).copied().unwrap_or(0)
    }
}

/// Integer line walk between two grid cells (Bresenham).
fn rasterize_line(from: (i32, i32), to: (i32, i32)) -> Vec<(i32, i32)> {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut cells = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        cells.push((x0, y0));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
    cells
}

fn stamp_disk(center: (i32, i32), radius: i32, mut mark: impl FnMut(i32, i32)) {
    let r_sq = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= r_sq {
                mark(center.0 + dx, center.1 + dy);
            }
        }
    }
}

/// Build the obstacle model for one routing attempt.
///
/// Expansion radii include the foreign primitive's own half-width plus the
/// half-width of the copper the search will place, so a path through free
/// cells satisfies the same clearance the checker verifies. `escape_points`
/// are punched through the restricted zone; `pending_stubs` are the
/// unrouted stub endpoints of nets still waiting in the batch.
pub fn build_obstacles(
    board: &Board,
    exclude: NetId,
    config: &RouteConfig,
    grid: &GridCoordinateSystem,
    layers: &LayerMap,
    escape_points: &[Point],
    pending_stubs: &[Point],
) -> ObstacleMap {
    let mut map = ObstacleMap::new(layers.len());
    let half_track = config.track_width / 2.0;
    let half_via = config.via_size / 2.0;

    for seg in board.segments().iter().filter(|s| s.net != exclude) {
        let cells = rasterize_line(grid.to_grid(seg.start), grid.to_grid(seg.end));
        let block_r = grid.cells_for_distance(seg.width / 2.0 + half_track + config.clearance);
        let via_r = grid.cells_for_distance(seg.width / 2.0 + half_via + config.clearance);
        let search_layer = layers.search_of(seg.layer);
        for &cell in &cells {
            if let Some(l) = search_layer {
                stamp_disk(cell, block_r, |x, y| map.block_cell(x, y, l as usize));
            }
            // A via's drill and annular ring occupy every layer, so
            // copper on any single layer still forbids via placement.
            stamp_disk(cell, via_r, |x, y| map.block_via(x, y));
        }
    }

    for via in board.vias().iter().filter(|v| v.net != exclude) {
        let cell = grid.to_grid(via.at);
        let block_r = grid.cells_for_distance(via.diameter / 2.0 + half_track + config.clearance);
        let via_r = grid.cells_for_distance(via.diameter / 2.0 + half_via + config.clearance);
        for l in 0..layers.len() {
            stamp_disk(cell, block_r, |x, y| map.block_cell(x, y, l));
        }
        stamp_disk(cell, via_r, |x, y| map.block_via(x, y));
    }

    for pad in board.pads().iter().filter(|p| p.net != exclude) {
        let cell = grid.to_grid(pad.at);
        let half_pad = pad.size.0.max(pad.size.1) / 2.0;
        let block_r = grid.cells_for_distance(half_pad + half_track + config.clearance);
        let via_r = grid.cells_for_distance(half_pad + half_via + config.clearance);
        for &layer in &pad.layers {
            if let Some(l) = layers.search_of(layer) {
                stamp_disk(cell, block_r, |x, y| map.block_cell(x, y, l as usize));
            }
        }
        stamp_disk(cell, via_r, |x, y| map.block_via(x, y));
    }

    if let Some(zone) = &config.restricted_zone {
        let (min_gx, min_gy) = grid.to_grid(zone.min);
        let (max_gx, max_gy) = grid.to_grid(zone.max);
        map.set_zone(min_gx, min_gy, max_gx, max_gy);
        let escape_r = grid.cells_for_distance(config.zone_escape_radius);
        for p in escape_points {
            stamp_disk(grid.to_grid(*p), escape_r, |x, y| map.allow_cell(x, y));
        }
    }

    if config.stub_proximity_cost > 0 && config.stub_proximity_radius > 0.0 {
        let radius = config.stub_proximity_radius;
        let r_cells = grid.cells_for_distance(radius);
        for p in pending_stubs {
            let center = grid.to_grid(*p);
            stamp_disk(center, r_cells, |x, y| {
                let dx = (x - center.0) as f64;
                let dy = (y - center.1) as f64;
                let dist = grid.step() * (dx * dx + dy * dy).sqrt();
                if dist < radius {
                    let cost =
                        (config.stub_proximity_cost as f64 * (1.0 - dist / radius)) as i32;
                    if cost > 0 {
                        map.bump_proximity(x, y, cost);
                    }
                }
            });
        }
    }

    tracing::debug!(
        "obstacle map for net {:?}: {} via blocks across {} layers",
        exclude,
        map.blocked_vias.len(),
        map.num_layers
    );
    map
}

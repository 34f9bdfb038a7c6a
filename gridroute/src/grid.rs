//! Conversion between continuous board coordinates and discrete grid
//! indices.

use crate::geometry::Point;

/// Maps board coordinates (millimeters) onto the routing grid and back.
///
/// The discrete side round-trips exactly: `to_grid(to_float(c)) == c` for
/// every cell `c`. The continuous side is only idempotent to within half a
/// grid step, which is inherent to quantization.
#[derive(Clone, Copy, Debug)]
pub struct GridCoordinateSystem {
    step: f64,
}

impl GridCoordinateSystem {
    /// `step` is the cell size in millimeters and must be positive.
    pub fn new(step: f64) -> Self {
        debug_assert!(step > 0.0, "grid step must be positive");
        Self { step }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Nearest grid cell for a board coordinate.
    pub fn to_grid(&self, p: Point) -> (i32, i32) {
        (
            (p.x / self.step).round() as i32,
            (p.y / self.step).round() as i32,
        )
    }

    /// Board coordinate of a grid cell's center.
    pub fn to_float(&self, gx: i32, gy: i32) -> Point {
        Point::new(gx as f64 * self.step, gy as f64 * self.step)
    }

    /// Smallest whole number of cells covering a metric distance.
    pub fn cells_for_distance(&self, distance: f64) -> i32 {
        (distance / self.step).ceil() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_round_trip_is_exact() {
        let grid = GridCoordinateSystem::new(0.1);
        for gx in -50..=50 {
            for gy in -50..=50 {
                let p = grid.to_float(gx, gy);
                assert_eq!(grid.to_grid(p), (gx, gy));
            }
        }
    }

    #[test]
    fn float_side_snaps_to_nearest_cell() {
        let grid = GridCoordinateSystem::new(0.1);
        assert_eq!(grid.to_grid(Point::new(1.04, -0.96)), (10, -10));
        assert_eq!(grid.to_grid(Point::new(1.06, 0.0)), (11, 0));
    }

    #[test]
    fn cells_for_distance_uses_ceiling() {
        let grid = GridCoordinateSystem::new(0.1);
        assert_eq!(grid.cells_for_distance(0.25), 3);
        assert_eq!(grid.cells_for_distance(0.2), 2);
        assert_eq!(grid.cells_for_distance(0.0), 0);
    }
}

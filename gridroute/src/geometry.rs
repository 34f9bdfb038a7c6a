//! Planar geometry primitives shared by the router and the clearance
//! checker.
//!
//! All coordinates are in millimeters. Distance queries are exact
//! (projection based), not grid approximations; the clearance checker
//! depends on that.

use serde::{Deserialize, Serialize};

/// Two points closer than this are treated as the same physical location
/// when resolving copper connectivity (0.1 um).
pub const COINCIDENCE_EPS: f64 = 1e-4;

/// A point on the board, in millimeters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// True when the two points coincide within [`COINCIDENCE_EPS`].
    pub fn coincides_with(&self, other: Point) -> bool {
        self.distance_to(other) < COINCIDENCE_EPS
    }
}

/// Axis-aligned rectangle, used for restricted routing zones.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Minimum distance from a point to a line segment.
///
/// Projects the point onto the segment's infinite line and clamps the
/// projection parameter to the segment's range.
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        // Degenerate segment.
        return p.distance_to(a);
    }
    let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * dx, a.y + t * dy);
    p.distance_to(proj)
}

/// Minimum distance between two line segments, computed as the minimum of
/// the four endpoint-to-opposite-segment distances.
pub fn segment_segment_distance(a1: Point, a2: Point, b1: Point, b2: Point) -> f64 {
    let d1 = point_segment_distance(a1, b1, b2);
    let d2 = point_segment_distance(a2, b1, b2);
    let d3 = point_segment_distance(b1, a1, a2);
    let d4 = point_segment_distance(b2, a1, a2);
    d1.min(d2).min(d3).min(d4)
}

//! Independent clearance verification.
//!
//! Checks the full board's tracks and vias for cross-net clearance
//! violations, regardless of how the geometry was produced. The checker
//! shares no state with the router; the obstacle model is built to the
//! same clearance this checker verifies, which is what makes batch
//! accumulation safe.

use serde::Serialize;

use crate::board::{Board, NetId, Segment, SegmentId, Via, ViaId};
use crate::geometry::{point_segment_distance, segment_segment_distance};

/// Absorbs floating-point noise from coordinate rounding. Must stay
/// positive: with a zero tolerance, correct adjacent-but-touching
/// geometry fails spuriously.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    SegmentSegment,
    ViaSegment,
    ViaVia,
}

/// Reference to one of the two primitives involved in a violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeomRef {
    Segment(SegmentId),
    Via(ViaId),
}

/// One cross-net clearance violation, with enough geometric detail to act
/// on.
#[derive(Clone, Debug, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub net_a: NetId,
    pub net_b: NetId,
    pub a: GeomRef,
    pub b: GeomRef,
    /// Location of the offending approach (first primitive's side).
    pub x: f64,
    pub y: f64,
    /// Minimum allowed center-to-center distance, mm.
    pub required: f64,
    /// Actual distance, mm.
    pub actual: f64,
    /// How deep the violation is: required minus actual, mm.
    pub penetration: f64,
}

/// Clearance checker over final board geometry.
///
/// Only pairs of primitives on different nets are checked; same-net
/// copper may touch freely.
pub struct ClearanceChecker {
    clearance: f64,
    tolerance: f64,
}

impl ClearanceChecker {
    pub fn new(clearance: f64) -> Self {
        Self {
            clearance,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(clearance: f64, tolerance: f64) -> Self {
        Self {
            clearance,
            tolerance,
        }
    }

    /// Check every cross-net pair on the board. Quadratic in primitive
    /// count, which is acceptable at board scale.
    pub fn check_board(&self, board: &Board) -> Vec<Violation> {
        let mut violations = Vec::new();
        let segments = board.segments();
        let vias = board.vias();

        for (i, a) in segments.iter().enumerate() {
            for b in segments.iter().skip(i + 1) {
                if let Some(v) = self.check_segment_pair(a, b) {
                    violations.push(v);
                }
            }
        }
        for via in vias {
            for seg in segments {
                if let Some(v) = self.check_via_segment(via, seg) {
                    violations.push(v);
                }
            }
        }
        for (i, a) in vias.iter().enumerate() {
            for b in vias.iter().skip(i + 1) {
                if let Some(v) = self.check_via_pair(a, b) {
                    violations.push(v);
                }
            }
        }

        if !violations.is_empty() {
            tracing::warn!("clearance check found {} violations", violations.len());
        }
        violations
    }

    /// Two tracks on the same layer and different nets.
    pub fn check_segment_pair(&self, a: &Segment, b: &Segment) -> Option<Violation> {
        if a.net == b.net || a.layer != b.layer {
            return None;
        }
        let actual = segment_segment_distance(a.start, a.end, b.start, b.end);
        let required = a.width / 2.0 + b.width / 2.0 + self.clearance;
        self.verdict(required, actual).map(|penetration| Violation {
            kind: ViolationKind::SegmentSegment,
            net_a: a.net,
            net_b: b.net,
            a: GeomRef::Segment(a.id),
            b: GeomRef::Segment(b.id),
            x: a.start.x,
            y: a.start.y,
            required,
            actual,
            penetration,
        })
    }

    /// A via against a track on any layer the via connects.
    pub fn check_via_segment(&self, via: &Via, seg: &Segment) -> Option<Violation> {
        if via.net == seg.net || !via.layers.contains(&seg.layer) {
            return None;
        }
        let actual = point_segment_distance(via.at, seg.start, seg.end);
        let required = via.diameter / 2.0 + seg.width / 2.0 + self.clearance;
        self.verdict(required, actual).map(|penetration| Violation {
            kind: ViolationKind::ViaSegment,
            net_a: via.net,
            net_b: seg.net,
            a: GeomRef::Via(via.id),
            b: GeomRef::Segment(seg.id),
            x: via.at.x,
            y: via.at.y,
            required,
            actual,
            penetration,
        })
    }

    /// Two vias sharing at least one layer.
    pub fn check_via_pair(&self, a: &Via, b: &Via) -> Option<Violation> {
        if a.net == b.net || !a.layers.iter().any(|l| b.layers.contains(l)) {
            return None;
        }
        let actual = a.at.distance_to(b.at);
        let required = a.diameter / 2.0 + b.diameter / 2.0 + self.clearance;
        self.verdict(required, actual).map(|penetration| Violation {
            kind: ViolationKind::ViaVia,
            net_a: a.net,
            net_b: b.net,
            a: GeomRef::Via(a.id),
            b: GeomRef::Via(b.id),
            x: a.at.x,
            y: a.at.y,
            required,
            actual,
            penetration,
        })
    }

    fn verdict(&self, required: f64, actual: f64) -> Option<f64> {
        let penetration = required - actual;
        if penetration > self.tolerance {
            Some(penetration)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn segment(id: u32, net: u32, y: f64, width: f64) -> Segment {
        Segment {
            id: SegmentId(id),
            net: NetId(net),
            layer: 0,
            start: Point::new(0.0, y),
            end: Point::new(10.0, y),
            width,
        }
    }

    #[test]
    fn exactly_spaced_tracks_pass() {
        let checker = ClearanceChecker::new(0.1);
        // 0.05 + 0.05 + 0.1 = 0.2 required; spaced exactly 0.2 apart.
        let a = segment(0, 1, 0.0, 0.1);
        let b = segment(1, 2, 0.2, 0.1);
        assert!(checker.check_segment_pair(&a, &b).is_none());
    }

    #[test]
    fn tracks_too_close_report_the_overlap() {
        let checker = ClearanceChecker::new(0.1);
        let a = segment(0, 1, 0.0, 0.1);
        let b = segment(1, 2, 0.19, 0.1);
        let v = checker.check_segment_pair(&a, &b).expect("violation");
        assert_eq!(v.kind, ViolationKind::SegmentSegment);
        assert!((v.penetration - 0.01).abs() < 1e-9);
    }

    #[test]
    fn verdict_is_symmetric() {
        let checker = ClearanceChecker::new(0.1);
        let a = segment(0, 1, 0.0, 0.1);
        let b = segment(1, 2, 0.19, 0.2);
        let ab = checker.check_segment_pair(&a, &b).expect("violation");
        let ba = checker.check_segment_pair(&b, &a).expect("violation");
        assert!((ab.penetration - ba.penetration).abs() < 1e-12);
        assert!((ab.actual - ba.actual).abs() < 1e-12);
        assert_eq!(ab.required, ba.required);
    }

    #[test]
    fn same_net_copper_is_never_flagged() {
        let checker = ClearanceChecker::new(0.1);
        let a = segment(0, 1, 0.0, 0.1);
        let b = segment(1, 1, 0.05, 0.1);
        assert!(checker.check_segment_pair(&a, &b).is_none());
    }

    #[test]
    fn different_layers_do_not_interact() {
        let checker = ClearanceChecker::new(0.1);
        let a = segment(0, 1, 0.0, 0.1);
        let mut b = segment(1, 2, 0.0, 0.1);
        b.layer = 1;
        assert!(checker.check_segment_pair(&a, &b).is_none());
    }

    #[test]
    fn via_against_foreign_track() {
        let checker = ClearanceChecker::new(0.1);
        let seg = segment(0, 1, 0.0, 0.1);
        let via = Via {
            id: ViaId(0),
            net: NetId(2),
            at: Point::new(5.0, 0.3),
            diameter: 0.6,
            drill: 0.3,
            layers: vec![0, 1],
        };
        // Required 0.3 + 0.05 + 0.1 = 0.45; actual 0.3.
        let v = checker.check_via_segment(&via, &seg).expect("violation");
        assert_eq!(v.kind, ViolationKind::ViaSegment);
        assert!((v.penetration - 0.15).abs() < 1e-9);

        // A via that spans only other layers never interacts.
        let mut inner = via.clone();
        inner.layers = vec![1];
        assert!(checker.check_via_segment(&inner, &seg).is_none());
    }

    #[test]
    fn via_pair_uses_center_distance() {
        let checker = ClearanceChecker::new(0.1);
        let a = Via {
            id: ViaId(0),
            net: NetId(1),
            at: Point::new(0.0, 0.0),
            diameter: 0.6,
            drill: 0.3,
            layers: vec![0, 1],
        };
        let mut b = a.clone();
        b.id = ViaId(1);
        b.net = NetId(2);
        b.at = Point::new(0.5, 0.0);
        // Required 0.3 + 0.3 + 0.1 = 0.7; actual 0.5.
        let v = checker.check_via_pair(&a, &b).expect("violation");
        assert!((v.penetration - 0.2).abs() < 1e-9);

        b.at = Point::new(0.75, 0.0);
        assert!(checker.check_via_pair(&a, &b).is_none());
    }

    #[test]
    fn zero_tolerance_would_flag_touching_geometry() {
        // The default tolerance absorbs rounding noise; this documents
        // why it must not be zero.
        let strict = ClearanceChecker::with_tolerance(0.1, 0.0);
        let a = segment(0, 1, 0.0, 0.1);
        let b = segment(1, 2, 0.2 - 1e-12, 0.1);
        assert!(strict.check_segment_pair(&a, &b).is_some());

        let tolerant = ClearanceChecker::new(0.1);
        assert!(tolerant.check_segment_pair(&a, &b).is_none());
    }
}

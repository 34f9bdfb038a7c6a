//! Board-level clearance checking.

use gridroute::geometry::Point;
use gridroute::{Board, ClearanceChecker, ViolationKind};

fn board_with_two_nets() -> (Board, gridroute::NetId, gridroute::NetId) {
    let mut board = Board::new(vec!["F.Cu".into(), "In1.Cu".into(), "B.Cu".into()]);
    let a = board.add_net("A");
    let b = board.add_net("B");
    (board, a, b)
}

#[test]
fn clean_board_reports_nothing() {
    let (mut board, a, b) = board_with_two_nets();
    board.add_segment(a, 0, Point::new(0.0, 0.0), Point::new(10.0, 0.0), 0.1);
    board.add_segment(b, 0, Point::new(0.0, 1.0), Point::new(10.0, 1.0), 0.1);
    board.add_via(a, Point::new(0.0, 0.0), 0.6, 0.3, vec![0, 2]);

    let violations = ClearanceChecker::new(0.1).check_board(&board);
    assert!(violations.is_empty());
}

#[test]
fn all_three_violation_kinds_are_detected() {
    let (mut board, a, b) = board_with_two_nets();
    // Tracks 0.15 mm apart where 0.2 is required.
    board.add_segment(a, 0, Point::new(0.0, 0.0), Point::new(10.0, 0.0), 0.1);
    board.add_segment(b, 0, Point::new(0.0, 0.15), Point::new(10.0, 0.15), 0.1);
    // Via pair 0.5 mm apart where 0.7 is required.
    board.add_via(a, Point::new(20.0, 0.0), 0.6, 0.3, vec![0, 2]);
    board.add_via(b, Point::new(20.5, 0.0), 0.6, 0.3, vec![0, 2]);
    // Via 0.3 mm from a foreign track where 0.45 is required.
    board.add_segment(a, 0, Point::new(30.0, 0.0), Point::new(40.0, 0.0), 0.1);
    board.add_via(b, Point::new(35.0, 0.3), 0.6, 0.3, vec![0, 2]);

    let violations = ClearanceChecker::new(0.1).check_board(&board);
    let kinds: Vec<ViolationKind> = violations.iter().map(|v| v.kind).collect();
    assert!(kinds.contains(&ViolationKind::SegmentSegment));
    assert!(kinds.contains(&ViolationKind::ViaVia));
    assert!(kinds.contains(&ViolationKind::ViaSegment));
    assert_eq!(violations.len(), 3);
}

#[test]
fn layers_isolate_primitives() {
    let (mut board, a, b) = board_with_two_nets();
    // Overlapping copper, but never on a shared layer.
    board.add_segment(a, 0, Point::new(0.0, 0.0), Point::new(10.0, 0.0), 0.1);
    board.add_segment(b, 2, Point::new(0.0, 0.0), Point::new(10.0, 0.0), 0.1);
    // A via spanning only inner layers misses the top-layer track.
    board.add_via(b, Point::new(5.0, 0.0), 0.6, 0.3, vec![1]);

    let violations = ClearanceChecker::new(0.1).check_board(&board);
    assert!(violations.is_empty(), "got: {violations:?}");
}

#[test]
fn violations_serialize_for_reporting() {
    let (mut board, a, b) = board_with_two_nets();
    board.add_segment(a, 0, Point::new(0.0, 0.0), Point::new(10.0, 0.0), 0.1);
    board.add_segment(b, 0, Point::new(0.0, 0.1), Point::new(10.0, 0.1), 0.1);

    let violations = ClearanceChecker::new(0.1).check_board(&board);
    assert_eq!(violations.len(), 1);
    let json = serde_json::to_string(&violations).unwrap();
    assert!(json.contains("segment_segment"));
    assert!(json.contains("penetration"));
}

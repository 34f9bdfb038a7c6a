//! Search-level properties of the grid router.

use gridroute::router::obstacle::build_obstacles;
use gridroute::router::{LayerMap, STEP_COST};
use gridroute::{
    Board, GridAstar, GridCoordinateSystem, ObstacleMap, PathCell, PathSearch, RouteConfig,
    SearchOutcome,
};
use gridroute::geometry::Point;

fn found(outcome: SearchOutcome) -> (Vec<PathCell>, i32) {
    match outcome {
        SearchOutcome::Found { path, cost, .. } => (path, cost),
        SearchOutcome::Exhausted { iterations } => {
            panic!("expected a path, search exhausted after {iterations} iterations")
        }
    }
}

#[test]
fn empty_grid_route_costs_the_manhattan_distance() {
    // 0.1 mm grid, source at the origin, target at (5.0, 5.0) mm: the
    // path must stay on its layer and cost 50 + 50 steps.
    let grid = GridCoordinateSystem::new(0.1);
    let engine = GridAstar::new(8000, 1.0);
    let obstacles = ObstacleMap::new(2);

    let (sgx, sgy) = grid.to_grid(Point::new(0.0, 0.0));
    let (tgx, tgy) = grid.to_grid(Point::new(5.0, 5.0));
    let (path, cost) = found(engine.find_path(
        &obstacles,
        &[PathCell::new(sgx, sgy, 0)],
        &[PathCell::new(tgx, tgy, 0)],
        1_000_000,
    ));

    assert_eq!(cost, 100 * STEP_COST);
    assert!(path.iter().all(|c| c.layer == 0), "no via expected");
    assert_eq!(path.first(), Some(&PathCell::new(0, 0, 0)));
    assert_eq!(path.last(), Some(&PathCell::new(50, 50, 0)));
}

#[test]
fn blocking_a_cell_never_cheapens_the_route() {
    let engine = GridAstar::new(8000, 1.0);

    let mut free = ObstacleMap::new(1);
    let sources = [PathCell::new(0, 0, 0)];
    let targets = [PathCell::new(6, 0, 0)];
    let (base_path, base_cost) = found(engine.find_path(&free, &sources, &targets, 100_000));
    assert_eq!(base_cost, 6 * STEP_COST);

    // Block a cell on the unique optimal path.
    let blocked_cell = base_path[3];
    free.block_cell(blocked_cell.gx, blocked_cell.gy, 0);
    let (detour, detour_cost) = found(engine.find_path(&free, &sources, &targets, 100_000));

    assert!(detour_cost >= base_cost);
    assert!(
        !detour.contains(&blocked_cell),
        "search must never pass through a blocked cell"
    );
}

#[test]
fn walled_in_source_reports_exhaustion() {
    let engine = GridAstar::new(8000, 1.2);
    let mut map = ObstacleMap::new(1);
    for i in -3..=3 {
        for (x, y) in [(i, -3), (i, 3), (-3, i), (3, i)] {
            map.block_cell(x, y, 0);
        }
    }
    let outcome = engine.find_path(
        &map,
        &[PathCell::new(0, 0, 0)],
        &[PathCell::new(20, 0, 0)],
        1_000_000,
    );
    assert!(matches!(outcome, SearchOutcome::Exhausted { .. }));
}

#[test]
fn foreign_copper_expands_by_track_width_and_clearance() {
    // A foreign track along y = 1.0 mm must keep a new route's
    // centerline at least one track width plus clearance away.
    let mut board = Board::new(vec!["F.Cu".into(), "B.Cu".into()]);
    let foreign = board.add_net("GND");
    let routed = board.add_net("SIG");
    board.add_segment(
        foreign,
        0,
        Point::new(0.0, 1.0),
        Point::new(5.0, 1.0),
        0.1,
    );

    let config = RouteConfig {
        track_width: 0.1,
        clearance: 0.1,
        grid_step: 0.1,
        ..RouteConfig::default()
    };
    let grid = GridCoordinateSystem::new(config.grid_step);
    let layers = LayerMap::new(&board, &config.layers).unwrap();
    let obstacles = build_obstacles(&board, routed, &config, &grid, &layers, &[], &[]);

    // Expansion radius is ceil((0.05 + 0.05 + 0.1) / 0.1) = 2 cells.
    assert!(obstacles.is_blocked(20, 10, 0));
    assert!(obstacles.is_blocked(20, 12, 0));
    assert!(!obstacles.is_blocked(20, 13, 0));
    // The other layer is untouched by a single-layer track.
    assert!(!obstacles.is_blocked(20, 10, 1));
    // Via placement is forbidden wider, by the via radius.
    assert!(obstacles.is_via_blocked(20, 13));
}

#[test]
fn stub_proximity_cost_decays_radially() {
    let board = Board::new(vec!["F.Cu".into(), "B.Cu".into()]);
    let config = RouteConfig {
        stub_proximity_radius: 1.0,
        stub_proximity_cost: 2000,
        ..RouteConfig::default()
    };
    let grid = GridCoordinateSystem::new(config.grid_step);
    let layers = LayerMap::new(&board, &config.layers).unwrap();
    let obstacles = build_obstacles(
        &board,
        gridroute::NetId(1),
        &config,
        &grid,
        &layers,
        &[],
        &[Point::new(2.0, 2.0)],
    );

    let center = obstacles.proximity_cost(20, 20);
    let near = obstacles.proximity_cost(25, 20);
    let outside = obstacles.proximity_cost(31, 20);
    assert_eq!(center, 2000);
    assert!(near > 0 && near < center);
    assert_eq!(outside, 0);
}

#[test]
fn restricted_zone_blocks_unless_punched() {
    let mut board = Board::new(vec!["F.Cu".into(), "B.Cu".into()]);
    let net = board.add_net("SIG");
    let config = RouteConfig {
        restricted_zone: Some(gridroute::geometry::Rect::new(
            Point::new(1.0, 1.0),
            Point::new(3.0, 3.0),
        )),
        zone_escape_radius: 0.3,
        ..RouteConfig::default()
    };
    let grid = GridCoordinateSystem::new(config.grid_step);
    let layers = LayerMap::new(&board, &config.layers).unwrap();
    let obstacles = build_obstacles(
        &board,
        net,
        &config,
        &grid,
        &layers,
        &[Point::new(2.0, 2.0)],
        &[],
    );

    // Punched through near the escape point, blocked elsewhere in the
    // zone, open outside it, on every layer.
    assert!(!obstacles.is_blocked(20, 20, 0));
    assert!(!obstacles.is_blocked(20, 20, 1));
    assert!(obstacles.is_blocked(15, 28, 0));
    assert!(obstacles.is_blocked(15, 28, 1));
    assert!(!obstacles.is_blocked(5, 5, 0));
    // Vias follow the same zone rule.
    assert!(!obstacles.is_via_blocked(20, 20));
    assert!(obstacles.is_via_blocked(15, 28));
}

//! Differential-pair routing.
//!
//! Routes two electrically coupled nets as a unit: the positive net is
//! routed first, the negative net immediately after against the updated
//! board, and the two layer-change sequences are compared. A pair whose
//! halves change layers differently still carries the signal but loses
//! its coupling geometry, so that outcome is reported as a warning, not a
//! failure. Polarity swaps are realized as a two-via crossover; when via
//! placement at the swap point is blocked the route is flagged rather
//! than allowed to cross copper on one layer.

use serde::Serialize;

use crate::board::{Board, LayerId, NetId};
use crate::config::RouteConfig;
use crate::core::GridRouteError;
use crate::geometry::Point;
use crate::grid::GridCoordinateSystem;

use super::batch::{BatchRouter, NetReport, NetStatus};
use super::builder::ViaPlan;
use super::obstacle::ObstacleMap;

/// Known limitations of a completed pair route, reported distinctly from
/// hard failures.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum PairWarning {
    /// The two halves changed layers at different points or onto
    /// different layers, so the coupled geometry is broken.
    LayerSyncLost {
        p_changes: Vec<(LayerId, LayerId)>,
        n_changes: Vec<(LayerId, LayerId)>,
    },
    /// A polarity swap was requested where via placement is forbidden;
    /// the swap was not emitted.
    SwapViasBlocked { x: f64, y: f64 },
}

/// Result of routing one differential pair.
#[derive(Clone, Debug, Serialize)]
pub struct PairOutcome {
    pub p: NetReport,
    pub n: NetReport,
    pub warnings: Vec<PairWarning>,
}

/// Routes a P/N net pair through the batch machinery with coupling
/// checks.
pub struct DifferentialPairHandler {
    config: RouteConfig,
}

impl DifferentialPairHandler {
    pub fn new(config: RouteConfig) -> Self {
        Self { config }
    }

    /// Route the pair, positive net first. Each half's status is reported
    /// individually; coupling problems surface as warnings.
    pub fn route_pair(
        &self,
        board: &mut Board,
        p: NetId,
        n: NetId,
    ) -> Result<PairOutcome, GridRouteError> {
        let mut batch = BatchRouter::new(board, self.config.clone())?;

        // The negative half's stubs are proximity hints for the positive
        // half, pulling the first route away from space its twin needs.
        let n_stubs: Vec<Point> = batch
            .board()
            .segments()
            .iter()
            .filter(|s| s.net == n)
            .flat_map(|s| [s.start, s.end])
            .collect();

        let (p_status, p_result) = batch.route_single(p, &n_stubs);
        let (n_status, n_result) = batch.route_single(n, &[]);

        let mut warnings = Vec::new();
        if let (Some(p_route), Some(n_route)) = (&p_result, &n_result) {
            let p_changes: Vec<(LayerId, LayerId)> =
                p_route.vias.iter().map(|v| (v.layers[0], v.layers[1])).collect();
            let n_changes: Vec<(LayerId, LayerId)> =
                n_route.vias.iter().map(|v| (v.layers[0], v.layers[1])).collect();
            if p_changes != n_changes {
                tracing::warn!(
                    "differential pair lost layer sync: {} vs {} layer changes",
                    p_changes.len(),
                    n_changes.len()
                );
                warnings.push(PairWarning::LayerSyncLost {
                    p_changes,
                    n_changes,
                });
            }
        }

        let p_name = board.net_name(p).unwrap_or("<unnamed>").to_string();
        let n_name = board.net_name(n).unwrap_or("<unnamed>").to_string();
        Ok(PairOutcome {
            p: NetReport {
                net: p,
                name: p_name,
                status: p_status,
            },
            n: NetReport {
                net: n,
                name: n_name,
                status: n_status,
            },
            warnings,
        })
    }

    /// Plan the two crossover vias for a polarity swap at `at`.
    ///
    /// The two tracks exchange sides through opposite layers so the
    /// copper never crosses uninsulated. Returns the via pair, or a
    /// [`PairWarning::SwapViasBlocked`] when either site is unavailable,
    /// leaving the caller to relax layer policy or accept the risk.
    pub fn plan_polarity_swap(
        &self,
        obstacles: &ObstacleMap,
        grid: &GridCoordinateSystem,
        at: Point,
        layers: [LayerId; 2],
    ) -> Result<[ViaPlan; 2], PairWarning> {
        // Centers one via diameter plus clearance apart keep the pair
        // itself clearance-correct.
        let spacing = self.config.via_size + self.config.clearance;
        let sites = [
            Point::new(at.x, at.y - spacing / 2.0),
            Point::new(at.x, at.y + spacing / 2.0),
        ];
        for site in &sites {
            let (gx, gy) = grid.to_grid(*site);
            if obstacles.is_via_blocked(gx, gy) {
                return Err(PairWarning::SwapViasBlocked { x: at.x, y: at.y });
            }
        }
        Ok([
            ViaPlan {
                at: sites[0],
                layers,
            },
            ViaPlan {
                at: sites[1],
                layers,
            },
        ])
    }
}

/// Convenience check on a pair outcome: true when both halves routed,
/// even if with warnings.
pub fn pair_completed(outcome: &PairOutcome) -> bool {
    matches!(outcome.p.status, NetStatus::Routed { .. } | NetStatus::AlreadyConnected)
        && matches!(
            outcome.n.status,
            NetStatus::Routed { .. } | NetStatus::AlreadyConnected
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_plan_places_two_vias_when_free() {
        let handler = DifferentialPairHandler::new(RouteConfig::default());
        let obstacles = ObstacleMap::new(2);
        let grid = GridCoordinateSystem::new(0.1);
        let vias = handler
            .plan_polarity_swap(&obstacles, &grid, Point::new(5.0, 5.0), [0, 1])
            .unwrap();
        assert_eq!(vias.len(), 2);
        assert!(vias[0].at.y < vias[1].at.y);
    }

    #[test]
    fn blocked_swap_site_is_a_known_limitation() {
        let handler = DifferentialPairHandler::new(RouteConfig::default());
        let mut obstacles = ObstacleMap::new(2);
        let grid = GridCoordinateSystem::new(0.1);
        // Block the upper site.
        let spacing = RouteConfig::default().via_size + RouteConfig::default().clearance;
        let (gx, gy) = grid.to_grid(Point::new(5.0, 5.0 + spacing / 2.0));
        obstacles.block_via(gx, gy);

        let planned =
            handler.plan_polarity_swap(&obstacles, &grid, Point::new(5.0, 5.0), [0, 1]);
        assert!(matches!(planned, Err(PairWarning::SwapViasBlocked { .. })));
    }
}

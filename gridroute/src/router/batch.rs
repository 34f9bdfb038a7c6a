//! Sequential batch routing.
//!
//! Nets are routed strictly one after another against one evolving board:
//! each net's obstacle model must reflect every earlier net's final
//! copper, so this ordering is a hard dependency, not an optimization
//! choice. Net order is caller supplied; it materially affects success
//! rates in congested regions and is an external policy concern.

use serde::Serialize;

use crate::board::{Board, NetId};
use crate::board::connect::{resolve_clusters, Cluster};
use crate::config::RouteConfig;
use crate::core::GridRouteError;
use crate::geometry::Point;
use crate::grid::GridCoordinateSystem;

use super::astar::GridAstar;
use super::builder::{build_route, Candidate, ClusterContext, RouteResult};
use super::obstacle::build_obstacles;
use super::{LayerMap, PathCell, PathSearch, SearchOutcome};

/// Per-net routing outcome.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NetStatus {
    /// A route was found and folded into the board.
    Routed {
        tracks: usize,
        vias: usize,
        iterations: u32,
    },
    /// The net already forms a single connected cluster; nothing to do.
    AlreadyConnected,
    /// All three directional attempts failed. Budget exhaustion and
    /// genuine unreachability are reported identically; the per-attempt
    /// iteration counts support retrying with a larger budget.
    Unroutable {
        probe: u32,
        reversed: u32,
        forward: u32,
    },
    /// The net's stub topology cannot be routed as-is.
    Malformed { reason: String },
}

impl NetStatus {
    pub fn is_routed(&self) -> bool {
        matches!(self, NetStatus::Routed { .. })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NetReport {
    pub net: NetId,
    pub name: String,
    #[serde(flatten)]
    pub status: NetStatus,
}

/// Outcome of a whole batch run. A single net's failure never aborts the
/// batch; the report always covers every requested net.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchReport {
    pub nets: Vec<NetReport>,
}

impl BatchReport {
    pub fn routed_count(&self) -> usize {
        self.nets.iter().filter(|r| r.status.is_routed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.nets
            .iter()
            .filter(|r| {
                matches!(
                    r.status,
                    NetStatus::Unroutable { .. } | NetStatus::Malformed { .. }
                )
            })
            .count()
    }
}

/// Drives path search and route construction across an ordered net list,
/// folding each successful route back into the board so later nets see it
/// as an obstacle.
pub struct BatchRouter<'a, S: PathSearch = GridAstar> {
    board: &'a mut Board,
    config: RouteConfig,
    engine: S,
    grid: GridCoordinateSystem,
    layers: LayerMap,
}

impl<'a> BatchRouter<'a, GridAstar> {
    pub fn new(board: &'a mut Board, config: RouteConfig) -> Result<Self, GridRouteError> {
        let engine = GridAstar::from_config(&config);
        Self::with_engine(board, config, engine)
    }
}

impl<'a, S: PathSearch> BatchRouter<'a, S> {
    /// Use a caller-provided search engine implementing the same cost
    /// model.
    pub fn with_engine(
        board: &'a mut Board,
        config: RouteConfig,
        engine: S,
    ) -> Result<Self, GridRouteError> {
        let layers = LayerMap::new(board, &config.layers)?;
        let grid = GridCoordinateSystem::new(config.grid_step);
        Ok(Self {
            board,
            config,
            engine,
            grid,
            layers,
        })
    }

    pub fn board(&self) -> &Board {
        self.board
    }

    /// Route every net in the given order.
    pub fn route_nets(&mut self, order: &[NetId]) -> BatchReport {
        let mut report = BatchReport::default();
        for (i, &net) in order.iter().enumerate() {
            let pending = self.pending_stub_points(&order[i + 1..]);
            let (status, _) = self.route_single(net, &pending);
            let name = self
                .board
                .net_name(net)
                .unwrap_or("<unnamed>")
                .to_string();
            match &status {
                NetStatus::Routed {
                    tracks,
                    vias,
                    iterations,
                } => tracing::info!(
                    "net {}: routed with {} tracks, {} vias in {} iterations",
                    name,
                    tracks,
                    vias,
                    iterations
                ),
                NetStatus::AlreadyConnected => {
                    tracing::debug!("net {}: already connected", name)
                }
                NetStatus::Unroutable { forward, .. } => {
                    tracing::warn!("net {}: unroutable after {} iterations", name, forward)
                }
                NetStatus::Malformed { reason } => {
                    tracing::warn!("net {}: skipped, {}", name, reason)
                }
            }
            report.nets.push(NetReport { net, name, status });
        }
        report
    }

    /// Route one net against the current board state. On success the
    /// board is updated; on failure it is left untouched.
    pub fn route_single(
        &mut self,
        net: NetId,
        pending_stubs: &[Point],
    ) -> (NetStatus, Option<RouteResult>) {
        let mut clusters = resolve_clusters(self.board, net);
        match clusters.len() {
            0 => {
                return (
                    NetStatus::Malformed {
                        reason: "net has no geometry".to_string(),
                    },
                    None,
                )
            }
            1 => return (NetStatus::AlreadyConnected, None),
            _ => {}
        }
        // More than two clusters: close the gap between the two largest.
        clusters.truncate(2);

        let source_ctx = self.cluster_context(&clusters[0]);
        let target_ctx = self.cluster_context(&clusters[1]);
        if source_ctx.candidates.is_empty() || target_ctx.candidates.is_empty() {
            return (
                NetStatus::Malformed {
                    reason: "stub cluster has no cells on a configured routing layer"
                        .to_string(),
                },
                None,
            );
        }

        let escape_points: Vec<Point> = source_ctx
            .candidates
            .iter()
            .chain(target_ctx.candidates.iter())
            .map(|c| c.exact)
            .collect();
        let obstacles = build_obstacles(
            self.board,
            net,
            &self.config,
            &self.grid,
            &self.layers,
            &escape_points,
            pending_stubs,
        );

        let sources = dedup_cells(&source_ctx.candidates);
        let targets = dedup_cells(&target_ctx.candidates);

        // The weighted heuristic makes the search asymmetric, so a failed
        // cheap probe is retried in the reversed direction before the
        // full-budget forward attempt.
        let probe = self
            .engine
            .find_path(&obstacles, &sources, &targets, self.config.probe_iterations);
        let (path, iterations, attempts) = match probe {
            SearchOutcome::Found {
                path, iterations, ..
            } => (Some(path), iterations, (iterations, 0, 0)),
            SearchOutcome::Exhausted { iterations: probe_iters } => {
                let reversed = self.engine.find_path(
                    &obstacles,
                    &targets,
                    &sources,
                    self.config.max_iterations,
                );
                match reversed {
                    SearchOutcome::Found {
                        mut path,
                        iterations,
                        ..
                    } => {
                        // Normalize so callers always see source-first.
                        path.reverse();
                        (Some(path), iterations, (probe_iters, iterations, 0))
                    }
                    SearchOutcome::Exhausted {
                        iterations: rev_iters,
                    } => {
                        let forward = self.engine.find_path(
                            &obstacles,
                            &sources,
                            &targets,
                            self.config.max_iterations,
                        );
                        match forward {
                            SearchOutcome::Found {
                                path, iterations, ..
                            } => (Some(path), iterations, (probe_iters, rev_iters, iterations)),
                            SearchOutcome::Exhausted {
                                iterations: fwd_iters,
                            } => (None, 0, (probe_iters, rev_iters, fwd_iters)),
                        }
                    }
                }
            }
        };

        let path = match path {
            Some(p) => p,
            None => {
                let (probe, reversed, forward) = attempts;
                return (
                    NetStatus::Unroutable {
                        probe,
                        reversed,
                        forward,
                    },
                    None,
                );
            }
        };

        let result = match build_route(&path, &self.grid, &self.layers, &source_ctx, &target_ctx)
        {
            Ok(r) => r,
            Err(e) => {
                return (
                    NetStatus::Malformed {
                        reason: e.to_string(),
                    },
                    None,
                )
            }
        };

        if let Err(e) = self.apply_result(net, &result) {
            return (
                NetStatus::Malformed {
                    reason: format!("stale geometry id: {e}"),
                },
                None,
            );
        }

        let status = NetStatus::Routed {
            tracks: result.tracks.len(),
            vias: result.vias.len(),
            iterations,
        };
        (status, Some(result))
    }

    /// Candidate source/target cells and builder context for a cluster.
    fn cluster_context(&self, cluster: &Cluster) -> ClusterContext {
        let mut ctx = ClusterContext::default();
        for &sid in &cluster.segments {
            let seg = match self.board.segment(sid) {
                Some(s) => s.clone(),
                None => continue,
            };
            if let Some(search_layer) = self.layers.search_of(seg.layer) {
                for exact in [seg.start, seg.end] {
                    let (gx, gy) = self.grid.to_grid(exact);
                    ctx.candidates.push(Candidate {
                        cell: PathCell::new(gx, gy, search_layer),
                        exact,
                        layer: seg.layer,
                        segment: seg.id,
                    });
                }
            }
            ctx.segments.push(seg);
        }
        for &vid in &cluster.vias {
            if let Some(via) = self.board.via(vid) {
                ctx.vias.push(via.at);
            }
        }
        for &pid in &cluster.pads {
            if let Some(pad) = self.board.pad(pid) {
                ctx.pads.push(pad.at);
            }
        }
        ctx
    }

    /// Stub endpoints of nets still waiting in the batch, used as
    /// proximity-cost hints.
    fn pending_stub_points(&self, later: &[NetId]) -> Vec<Point> {
        let mut points = Vec::new();
        for seg in self.board.segments() {
            if later.contains(&seg.net) {
                points.push(seg.start);
                points.push(seg.end);
            }
        }
        points
    }

    /// Fold a route's additions and edits into the board. Edit ids are
    /// validated up front so a bad result leaves the board unchanged.
    fn apply_result(
        &mut self,
        net: NetId,
        result: &RouteResult,
    ) -> Result<(), crate::board::BoardError> {
        for id in &result.removals {
            if self.board.segment(*id).is_none() {
                return Err(crate::board::BoardError::UnknownSegment(*id));
            }
        }
        for edit in &result.shortenings {
            if self.board.segment(edit.id).is_none() {
                return Err(crate::board::BoardError::UnknownSegment(edit.id));
            }
        }

        for track in &result.tracks {
            self.board.add_segment(
                net,
                track.layer,
                track.start,
                track.end,
                self.config.track_width,
            );
        }
        for via in &result.vias {
            self.board.add_via(
                net,
                via.at,
                self.config.via_size,
                self.config.via_drill,
                via.layers.to_vec(),
            );
        }
        for edit in &result.shortenings {
            self.board
                .replace_segment_endpoints(edit.id, edit.new_start, edit.new_end)?;
        }
        for id in &result.removals {
            self.board.remove_segment(*id)?;
        }
        Ok(())
    }
}

fn dedup_cells(candidates: &[Candidate]) -> Vec<PathCell> {
    let mut seen = rustc_hash::FxHashSet::default();
    candidates
        .iter()
        .map(|c| c.cell)
        .filter(|c| seen.insert(c.as_key()))
        .collect()
}

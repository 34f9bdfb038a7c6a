//! Conversion of a raw cell path into board geometry and stub edits.
//!
//! Consecutive same-layer cells collapse into tracks, layer changes
//! become vias, and the path ends are stitched back to the exact stub
//! coordinates the grid snapped away from. Stub copper the new route
//! makes redundant is trimmed: whole segments are removed, partially
//! redundant ones are shortened to the branch point.

use thiserror::Error;

use crate::board::{LayerId, Segment, SegmentId};
use crate::geometry::{point_segment_distance, Point, COINCIDENCE_EPS};
use crate::grid::GridCoordinateSystem;

use super::{LayerMap, PathCell};

/// Snapped endpoints closer than this to the exact stub endpoint need no
/// connector track.
const STITCH_EPS: f64 = 1e-6;

/// A new straight track to add to the board.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackPlan {
    pub start: Point,
    pub end: Point,
    pub layer: LayerId,
}

/// A new via to add to the board, spanning exactly two layers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViaPlan {
    pub at: Point,
    pub layers: [LayerId; 2],
}

/// Replacement endpoints for a partially subsumed stub segment.
#[derive(Clone, Debug, PartialEq)]
pub struct ShortenEdit {
    pub id: SegmentId,
    pub new_start: Point,
    pub new_end: Point,
}

/// Everything one successful route changes on the board.
#[derive(Clone, Debug, Default)]
pub struct RouteResult {
    pub tracks: Vec<TrackPlan>,
    pub vias: Vec<ViaPlan>,
    pub removals: Vec<SegmentId>,
    pub shortenings: Vec<ShortenEdit>,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("search returned an empty path")]
    EmptyPath,
    #[error("path end does not trace back to any stub candidate")]
    UnanchoredPath,
}

/// A search seed cell together with the exact stub endpoint it came from.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub cell: PathCell,
    pub exact: Point,
    pub layer: LayerId,
    pub segment: SegmentId,
}

/// One stub cluster's geometry, as the builder needs it.
#[derive(Clone, Debug, Default)]
pub struct ClusterContext {
    pub candidates: Vec<Candidate>,
    pub segments: Vec<Segment>,
    pub pads: Vec<Point>,
    pub vias: Vec<Point>,
}

impl ClusterContext {
    fn candidate_for(&self, cell: PathCell, grid: &GridCoordinateSystem) -> Option<&Candidate> {
        let snapped = grid.to_float(cell.gx, cell.gy);
        self.candidates
            .iter()
            .filter(|c| c.cell == cell)
            .min_by(|a, b| {
                a.exact
                    .distance_to(snapped)
                    .partial_cmp(&b.exact.distance_to(snapped))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

/// Build the geometry edits for one routed path.
///
/// The path is expected source-first; if the two ends cannot be traced
/// back to the clusters' candidates the result is rejected instead of
/// emitting disconnected copper.
pub fn build_route(
    path: &[PathCell],
    grid: &GridCoordinateSystem,
    layers: &LayerMap,
    source: &ClusterContext,
    target: &ClusterContext,
) -> Result<RouteResult, BuildError> {
    let (first, last) = match (path.first(), path.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return Err(BuildError::EmptyPath),
    };

    // Each path end is paired with the cluster it traces back to. A path
    // that matched the clusters the other way around is accepted too.
    let (first_cand, first_ctx, last_cand, last_ctx) = match (
        source.candidate_for(first, grid),
        target.candidate_for(last, grid),
    ) {
        (Some(s), Some(t)) => (s, source, t, target),
        _ => match (target.candidate_for(first, grid), source.candidate_for(last, grid)) {
            (Some(t), Some(s)) => (t, target, s, source),
            _ => return Err(BuildError::UnanchoredPath),
        },
    };

    let mut result = RouteResult::default();
    emit_geometry(path, grid, layers, &mut result);

    stitch_end(&mut result, first_cand, first, grid);
    stitch_end(&mut result, last_cand, last, grid);

    trim_dead_copper(first_ctx, first_cand.exact, &mut result);
    trim_dead_copper(last_ctx, last_cand.exact, &mut result);

    Ok(result)
}

/// Collapse the cell path into tracks and vias.
fn emit_geometry(
    path: &[PathCell],
    grid: &GridCoordinateSystem,
    layers: &LayerMap,
    result: &mut RouteResult,
) {
    let mut i = 0;
    while i < path.len() {
        let mut j = i;
        while j + 1 < path.len() && path[j + 1].layer == path[i].layer {
            j += 1;
        }

        if j > i {
            let board_layer = layers.board_of(path[i].layer);
            let mut run_start = i;
            let mut prev_dir: Option<(i32, i32)> = None;
            for m in (i + 1)..=j {
                let dir = (path[m].gx - path[m - 1].gx, path[m].gy - path[m - 1].gy);
                if prev_dir.is_some() && prev_dir != Some(dir) {
                    result.tracks.push(TrackPlan {
                        start: grid.to_float(path[run_start].gx, path[run_start].gy),
                        end: grid.to_float(path[m - 1].gx, path[m - 1].gy),
                        layer: board_layer,
                    });
                    run_start = m - 1;
                }
                prev_dir = Some(dir);
            }
            result.tracks.push(TrackPlan {
                start: grid.to_float(path[run_start].gx, path[run_start].gy),
                end: grid.to_float(path[j].gx, path[j].gy),
                layer: board_layer,
            });
        }

        if j + 1 < path.len() {
            result.vias.push(ViaPlan {
                at: grid.to_float(path[j].gx, path[j].gy),
                layers: [
                    layers.board_of(path[j].layer),
                    layers.board_of(path[j + 1].layer),
                ],
            });
        }
        i = j + 1;
    }
}

/// Connect the exact stub endpoint to the snapped grid point when the two
/// differ.
fn stitch_end(
    result: &mut RouteResult,
    candidate: &Candidate,
    cell: PathCell,
    grid: &GridCoordinateSystem,
) {
    let snapped = grid.to_float(cell.gx, cell.gy);
    if candidate.exact.distance_to(snapped) > STITCH_EPS {
        result.tracks.push(TrackPlan {
            start: candidate.exact,
            end: snapped,
            layer: candidate.layer,
        });
    }
}

/// Quantized node key for endpoint-coincidence bookkeeping.
fn node_key(p: Point) -> (i64, i64) {
    (
        (p.x / COINCIDENCE_EPS).round() as i64,
        (p.y / COINCIDENCE_EPS).round() as i64,
    )
}

struct SubEdge {
    seg: usize,
    a: Point,
    b: Point,
    alive: bool,
}

/// Trim stub copper the route attachment leaves dangling.
///
/// Pads (and vias) anchor liveness; copper between the attachment point
/// and a dangling tip with no anchor behind it is dead. Whole dead
/// segments are removed, a segment the attachment point splits is
/// shortened with its tip endpoint moved to the branch point. Clusters
/// with no pads carry no anchor to judge against and are left unedited.
fn trim_dead_copper(ctx: &ClusterContext, attach: Point, result: &mut RouteResult) {
    if ctx.pads.is_empty() {
        return;
    }

    // Split every segment at the attachment point and at any other
    // cluster endpoint lying on its interior, so T-junctions participate
    // in the connectivity graph.
    let mut interior_points: Vec<Point> = vec![attach];
    for seg in &ctx.segments {
        interior_points.push(seg.start);
        interior_points.push(seg.end);
    }

    let mut edges: Vec<SubEdge> = Vec::new();
    for (si, seg) in ctx.segments.iter().enumerate() {
        let dx = seg.end.x - seg.start.x;
        let dy = seg.end.y - seg.start.y;
        let len_sq = dx * dx + dy * dy;
        let mut cuts: Vec<(f64, Point)> = vec![(0.0, seg.start), (1.0, seg.end)];
        if len_sq > 0.0 {
            for p in &interior_points {
                if point_segment_distance(*p, seg.start, seg.end) < COINCIDENCE_EPS
                    && !p.coincides_with(seg.start)
                    && !p.coincides_with(seg.end)
                {
                    let t = ((p.x - seg.start.x) * dx + (p.y - seg.start.y) * dy) / len_sq;
                    cuts.push((t, *p));
                }
            }
        }
        cuts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        cuts.dedup_by(|a, b| a.1.coincides_with(b.1));
        for pair in cuts.windows(2) {
            edges.push(SubEdge {
                seg: si,
                a: pair[0].1,
                b: pair[1].1,
                alive: true,
            });
        }
    }

    let mut anchors: Vec<(i64, i64)> = vec![node_key(attach)];
    anchors.extend(ctx.pads.iter().map(|p| node_key(*p)));
    anchors.extend(ctx.vias.iter().map(|p| node_key(*p)));

    // Iteratively remove sub-edges dangling from a non-anchored tip.
    loop {
        let mut degrees: rustc_hash::FxHashMap<(i64, i64), usize> = Default::default();
        for e in edges.iter().filter(|e| e.alive) {
            *degrees.entry(node_key(e.a)).or_insert(0) += 1;
            *degrees.entry(node_key(e.b)).or_insert(0) += 1;
        }
        let dangling = |k: &(i64, i64)| degrees.get(k) == Some(&1) && !anchors.contains(k);

        let victim = edges
            .iter()
            .position(|e| e.alive && (dangling(&node_key(e.a)) || dangling(&node_key(e.b))));
        match victim {
            Some(idx) => edges[idx].alive = false,
            None => break,
        }
    }

    for (si, seg) in ctx.segments.iter().enumerate() {
        let parts: Vec<&SubEdge> = edges.iter().filter(|e| e.seg == si).collect();
        let alive: Vec<&&SubEdge> = parts.iter().filter(|e| e.alive).collect();
        if alive.len() == parts.len() {
            continue;
        }
        if alive.is_empty() {
            result.removals.push(seg.id);
        } else {
            // Alive sub-edges are contiguous along the segment; the cut
            // ends become the new endpoints.
            let new_start = alive.first().unwrap().a;
            let new_end = alive.last().unwrap().b;
            result.shortenings.push(ShortenEdit {
                id: seg.id,
                new_start,
                new_end,
            });
        }
    }
}

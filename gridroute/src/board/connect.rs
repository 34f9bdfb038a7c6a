//! Copper connectivity analysis.
//!
//! Groups a net's existing geometry into connected clusters so the batch
//! router can tell which gap it is being asked to close. Two primitives
//! connect when they touch within [`COINCIDENCE_EPS`] on a shared layer.

use petgraph::unionfind::UnionFind;

use crate::geometry::{point_segment_distance, COINCIDENCE_EPS};

use super::{Board, NetId, Pad, PadId, Segment, SegmentId, Via, ViaId};

/// One electrically connected island of a net's existing copper.
#[derive(Clone, Debug, Default)]
pub struct Cluster {
    pub segments: Vec<SegmentId>,
    pub vias: Vec<ViaId>,
    pub pads: Vec<PadId>,
}

impl Cluster {
    /// Number of primitives in the cluster.
    pub fn len(&self) -> usize {
        self.segments.len() + self.vias.len() + self.pads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn segments_touch(a: &Segment, b: &Segment) -> bool {
    if a.layer != b.layer {
        return false;
    }
    // Endpoint on the other segment covers both butt joints and
    // T-junctions.
    point_segment_distance(a.start, b.start, b.end) < COINCIDENCE_EPS
        || point_segment_distance(a.end, b.start, b.end) < COINCIDENCE_EPS
        || point_segment_distance(b.start, a.start, a.end) < COINCIDENCE_EPS
        || point_segment_distance(b.end, a.start, a.end) < COINCIDENCE_EPS
}

fn via_touches_segment(via: &Via, seg: &Segment) -> bool {
    via.layers.contains(&seg.layer)
        && point_segment_distance(via.at, seg.start, seg.end) < COINCIDENCE_EPS
}

fn pad_touches_segment(pad: &Pad, seg: &Segment) -> bool {
    pad.layers.contains(&seg.layer)
        && point_segment_distance(pad.at, seg.start, seg.end) < COINCIDENCE_EPS
}

fn via_touches_via(a: &Via, b: &Via) -> bool {
    a.at.coincides_with(b.at) && a.layers.iter().any(|l| b.layers.contains(l))
}

fn pad_touches_via(pad: &Pad, via: &Via) -> bool {
    pad.at.coincides_with(via.at) && pad.layers.iter().any(|l| via.layers.contains(l))
}

/// Resolve a net's existing geometry into connected clusters, largest
/// first.
pub fn resolve_clusters(board: &Board, net: NetId) -> Vec<Cluster> {
    let segments: Vec<&Segment> = board.segments().iter().filter(|s| s.net == net).collect();
    let vias: Vec<&Via> = board.vias().iter().filter(|v| v.net == net).collect();
    let pads: Vec<&Pad> = board.pads().iter().filter(|p| p.net == net).collect();

    let n_seg = segments.len();
    let n_via = vias.len();
    let total = n_seg + n_via + pads.len();
    if total == 0 {
        return Vec::new();
    }

    // Element indices: segments, then vias, then pads.
    let mut uf = UnionFind::<usize>::new(total);

    for i in 0..n_seg {
        for j in (i + 1)..n_seg {
            if segments_touch(segments[i], segments[j]) {
                uf.union(i, j);
            }
        }
    }
    for (vi, via) in vias.iter().enumerate() {
        for (si, seg) in segments.iter().enumerate() {
            if via_touches_segment(via, seg) {
                uf.union(n_seg + vi, si);
            }
        }
        for (vj, other) in vias.iter().enumerate().skip(vi + 1) {
            if via_touches_via(via, other) {
                uf.union(n_seg + vi, n_seg + vj);
            }
        }
    }
    for (pi, pad) in pads.iter().enumerate() {
        for (si, seg) in segments.iter().enumerate() {
            if pad_touches_segment(pad, seg) {
                uf.union(n_seg + n_via + pi, si);
            }
        }
        for (vi, via) in vias.iter().enumerate() {
            if pad_touches_via(pad, via) {
                uf.union(n_seg + n_via + pi, n_seg + vi);
            }
        }
    }

    let labels = uf.into_labeling();
    let mut clusters: Vec<(usize, Cluster)> = Vec::new();
    let cluster_of = |clusters: &mut Vec<(usize, Cluster)>, root: usize| -> usize {
        if let Some(pos) = clusters.iter().position(|(r, _)| *r == root) {
            pos
        } else {
            clusters.push((root, Cluster::default()));
            clusters.len() - 1
        }
    };

    for (i, seg) in segments.iter().enumerate() {
        let pos = cluster_of(&mut clusters, labels[i]);
        clusters[pos].1.segments.push(seg.id);
    }
    for (i, via) in vias.iter().enumerate() {
        let pos = cluster_of(&mut clusters, labels[n_seg + i]);
        clusters[pos].1.vias.push(via.id);
    }
    for (i, pad) in pads.iter().enumerate() {
        let pos = cluster_of(&mut clusters, labels[n_seg + n_via + i]);
        clusters[pos].1.pads.push(pad.id);
    }

    let mut clusters: Vec<Cluster> = clusters.into_iter().map(|(_, c)| c).collect();
    clusters.sort_by_key(|c| std::cmp::Reverse(c.len()));
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn two_stub_clusters_resolve_separately() {
        let mut board = Board::new(vec!["F.Cu".into(), "B.Cu".into()]);
        let net = board.add_net("D0");
        // Left stub: pad plus two chained segments.
        board.add_pad(net, Point::new(0.0, 0.0), (0.4, 0.4), vec![0], None);
        board.add_segment(net, 0, Point::new(0.0, 0.0), Point::new(1.0, 0.0), 0.15);
        board.add_segment(net, 0, Point::new(1.0, 0.0), Point::new(2.0, 0.0), 0.15);
        // Right stub: one isolated segment.
        board.add_segment(net, 0, Point::new(8.0, 0.0), Point::new(9.0, 0.0), 0.15);

        let clusters = resolve_clusters(&board, net);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 3);
        assert_eq!(clusters[1].len(), 1);
    }

    #[test]
    fn via_bridges_layers_into_one_cluster() {
        let mut board = Board::new(vec!["F.Cu".into(), "B.Cu".into()]);
        let net = board.add_net("CLK");
        board.add_segment(net, 0, Point::new(0.0, 0.0), Point::new(1.0, 0.0), 0.15);
        board.add_via(net, Point::new(1.0, 0.0), 0.6, 0.3, vec![0, 1]);
        board.add_segment(net, 1, Point::new(1.0, 0.0), Point::new(2.0, 0.0), 0.15);

        let clusters = resolve_clusters(&board, net);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 3);
    }

    #[test]
    fn different_layers_do_not_touch_without_a_via() {
        let mut board = Board::new(vec!["F.Cu".into(), "B.Cu".into()]);
        let net = board.add_net("CLK");
        board.add_segment(net, 0, Point::new(0.0, 0.0), Point::new(1.0, 0.0), 0.15);
        board.add_segment(net, 1, Point::new(1.0, 0.0), Point::new(2.0, 0.0), 0.15);

        let clusters = resolve_clusters(&board, net);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn t_junction_connects() {
        let mut board = Board::new(vec!["F.Cu".into()]);
        let net = board.add_net("SIG");
        board.add_segment(net, 0, Point::new(0.0, 0.0), Point::new(2.0, 0.0), 0.15);
        board.add_segment(net, 0, Point::new(1.0, 0.0), Point::new(1.0, 1.0), 0.15);

        let clusters = resolve_clusters(&board, net);
        assert_eq!(clusters.len(), 1);
    }
}

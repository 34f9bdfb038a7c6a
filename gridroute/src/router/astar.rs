//! Weighted multi-source/multi-target A* over the routing grid.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::RouteConfig;

use super::{ObstacleMap, PathCell, PathSearch, SearchOutcome, STEP_COST};

/// Planar moves: the four axis-aligned neighbors.
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, -1), (-1, 0), (0, 1)];

/// Open-set entry, reverse ordered so the `BinaryHeap` pops the lowest
/// f-score first. The counter breaks ties deterministically.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct OpenEntry {
    f_score: i32,
    g_score: i32,
    cell: PathCell,
    counter: u32,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.counter.cmp(&self.counter))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The provided search engine.
///
/// Planar moves cost [`STEP_COST`] plus the destination cell's proximity
/// overlay; layer changes cost `via_cost` plus twice the overlay. The
/// Manhattan heuristic is multiplied by `heuristic_weight`, which above
/// 1.0 deliberately gives up admissibility for speed.
pub struct GridAstar {
    via_cost: i32,
    h_weight: f32,
}

impl GridAstar {
    pub fn new(via_cost: i32, h_weight: f32) -> Self {
        Self { via_cost, h_weight }
    }

    pub fn from_config(config: &RouteConfig) -> Self {
        Self::new(config.via_cost, config.heuristic_weight)
    }

    /// Manhattan distance in cost units to the nearest target, plus one
    /// via cost when the layer differs.
    #[inline]
    fn heuristic(&self, cell: &PathCell, targets: &[PathCell]) -> i32 {
        let mut min_h = i32::MAX;
        for target in targets {
            let dx = (cell.gx - target.gx).abs();
            let dy = (cell.gy - target.gy).abs();
            let mut h = (dx + dy) * STEP_COST;
            if cell.layer != target.layer {
                h += self.via_cost;
            }
            min_h = min_h.min(h);
        }
        (min_h as f32 * self.h_weight) as i32
    }

    fn reconstruct_path(parents: &FxHashMap<u64, u64>, goal_key: u64) -> Vec<PathCell> {
        let mut path = Vec::new();
        let mut current = goal_key;
        loop {
            path.push(PathCell::from_key(current));
            match parents.get(&current) {
                Some(&parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }
}

impl PathSearch for GridAstar {
    fn find_path(
        &self,
        obstacles: &ObstacleMap,
        sources: &[PathCell],
        targets: &[PathCell],
        max_iterations: u32,
    ) -> SearchOutcome {
        let target_set: FxHashSet<u64> = targets.iter().map(|t| t.as_key()).collect();

        let mut open_set = BinaryHeap::new();
        let mut g_costs: FxHashMap<u64, i32> = FxHashMap::default();
        let mut parents: FxHashMap<u64, u64> = FxHashMap::default();
        let mut closed: FxHashSet<u64> = FxHashSet::default();
        let mut counter: u32 = 0;

        for source in sources {
            let key = source.as_key();
            let h = self.heuristic(source, targets);
            open_set.push(OpenEntry {
                f_score: h,
                g_score: 0,
                cell: *source,
                counter,
            });
            counter += 1;
            g_costs.insert(key, 0);
        }

        let mut iterations: u32 = 0;

        while let Some(entry) = open_set.pop() {
            if iterations >= max_iterations {
                break;
            }
            iterations += 1;

            let current = entry.cell;
            let current_key = current.as_key();
            let g = entry.g_score;

            if closed.contains(&current_key) {
                continue;
            }

            if target_set.contains(&current_key) {
                let path = Self::reconstruct_path(&parents, current_key);
                return SearchOutcome::Found {
                    path,
                    cost: g,
                    iterations,
                };
            }
            closed.insert(current_key);

            for (dx, dy) in DIRECTIONS {
                let ngx = current.gx + dx;
                let ngy = current.gy + dy;

                if obstacles.is_blocked(ngx, ngy, current.layer as usize) {
                    continue;
                }

                let neighbor = PathCell::new(ngx, ngy, current.layer);
                let neighbor_key = neighbor.as_key();
                if closed.contains(&neighbor_key) {
                    continue;
                }

                let new_g = g + STEP_COST + obstacles.proximity_cost(ngx, ngy);
                let existing = g_costs.get(&neighbor_key).copied().unwrap_or(i32::MAX);
                if new_g < existing {
                    g_costs.insert(neighbor_key, new_g);
                    parents.insert(neighbor_key, current_key);
                    let h = self.heuristic(&neighbor, targets);
                    open_set.push(OpenEntry {
                        f_score: new_g + h,
                        g_score: new_g,
                        cell: neighbor,
                        counter,
                    });
                    counter += 1;
                }
            }

            // Layer change at the current cell.
            if !obstacles.is_via_blocked(current.gx, current.gy) {
                for layer in 0..obstacles.num_layers() as u8 {
                    if layer == current.layer {
                        continue;
                    }
                    // The landing cell must be free on the destination
                    // layer as well.
                    if obstacles.is_blocked(current.gx, current.gy, layer as usize) {
                        continue;
                    }

                    let neighbor = PathCell::new(current.gx, current.gy, layer);
                    let neighbor_key = neighbor.as_key();
                    if closed.contains(&neighbor_key) {
                        continue;
                    }

                    let proximity = obstacles.proximity_cost(current.gx, current.gy) * 2;
                    let new_g = g + self.via_cost + proximity;
                    let existing = g_costs.get(&neighbor_key).copied().unwrap_or(i32::MAX);
                    if new_g < existing {
                        g_costs.insert(neighbor_key, new_g);
                        parents.insert(neighbor_key, current_key);
                        let h = self.heuristic(&neighbor, targets);
                        open_set.push(OpenEntry {
                            f_score: new_g + h,
                            g_score: new_g,
                            cell: neighbor,
                            counter,
                        });
                        counter += 1;
                    }
                }
            }
        }

        SearchOutcome::Exhausted { iterations }
    }
}

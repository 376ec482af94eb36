//! Many to many weight matrices between points resolved onto edges.
//!
//! Points live at an offset along an original edge, not on a vertex, and a
//! route may leave or arrive in either travel direction of that edge. Every
//! point therefore contributes two half entries, forward first, and the
//! resulting matrix has two rows per source and two columns per target.
//!
//! The computation runs one forward upward search per source half and drops
//! every settled label into a bucket at its vertex. One backward upward
//! search per target half then joins against those buckets. A join whose
//! halves meet over the same original edge would turn on the spot in the
//! middle of that edge and is rejected, pairs resolved onto one shared edge
//! are instead connected by the closed form along the edge itself.

use super::dijkstra::{BoundedDirectedSearch, EdgePath};
use super::{Error, PointSide};
use crate::datastr::graph::*;
use crate::report::*;
use crate::util::NonNan;
use std::collections::HashMap;
use std::rc::Rc;

/// A request point snapped onto an original edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPoint {
    /// The original edge the point sits on, `NO_EDGE` when resolving failed.
    pub edge: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    /// Weight of the whole edge under the active profile.
    pub weight: Weight,
    /// Position along the edge, 0 at `from`, 1 at `to`.
    pub offset: f32,
    /// Usable travel directions of the edge, canonical orientation.
    pub direction: Option<bool>,
}

impl ResolvedPoint {
    /// The two half seeds of this point, forward along the edge first.
    ///
    /// A source departs towards an endpoint and pays the remaining part of
    /// the edge, a target is approached from an endpoint and pays the part
    /// up to the point. Halves forbidden by the edge direction stay `None`.
    fn half_seeds(&self, side: PointSide) -> [Option<Rc<EdgePath>>; 2] {
        if self.edge == NO_EDGE {
            return [None, None];
        }

        let towards_to = (1.0 - self.offset) * self.weight;
        let towards_from = self.offset * self.weight;

        let forward = (self.direction != Some(false)).then(|| match side {
            PointSide::Source => EdgePath::seed(self.to, towards_to, self.edge),
            PointSide::Target => EdgePath::seed(self.from, towards_from, self.edge),
        });
        let backward = (self.direction != Some(true)).then(|| match side {
            PointSide::Source => EdgePath::seed(self.from, towards_from, self.edge),
            PointSide::Target => EdgePath::seed(self.to, towards_to, self.edge),
        });

        [forward, backward]
    }

    /// Weight from this point to `target` along the shared edge, without
    /// entering the rest of the graph. `forward` selects the travel
    /// direction along the edge.
    fn weight_along_edge_to(&self, target: &ResolvedPoint, forward: bool) -> Option<Weight> {
        debug_assert_eq!(self.edge, target.edge);
        if forward {
            if self.direction == Some(false) || self.offset > target.offset {
                return None;
            }
            Some((target.offset - self.offset) * self.weight)
        } else {
            if self.direction == Some(true) || self.offset < target.offset {
                return None;
            }
            Some((self.offset - target.offset) * self.weight)
        }
    }
}

/// Why a point was excluded from the corrected matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointErrorCode {
    NotRoutable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterPointError {
    pub code: PointErrorCode,
    pub message: String,
}

/// The corrected result of a matrix computation.
///
/// `weights[2i + d][2j + e]` is the weight from the `i`-th kept source
/// leaving in direction `d` to the `j`-th kept target arriving in direction
/// `e`, 0 forward along the resolved edge, 1 backward. The index tables map
/// kept positions back to positions in the request, dropped points are
/// explained in the error maps under their request position.
#[derive(Debug)]
pub struct WeightMatrix {
    pub weights: Vec<Vec<Weight>>,
    pub source_index: Vec<usize>,
    pub target_index: Vec<usize>,
    pub source_errors: HashMap<usize, RouterPointError>,
    pub target_errors: HashMap<usize, RouterPointError>,
}

/// Bucket based many to many search over a frozen hierarchy.
pub struct DirectedWeightMatrix<'a> {
    graph: &'a ContractedGraph,
}

impl<'a> DirectedWeightMatrix<'a> {
    pub fn new(graph: &'a ContractedGraph) -> Self {
        DirectedWeightMatrix { graph }
    }

    /// Compute the weight matrix between all sources and targets.
    ///
    /// `max` bounds both search sweeps, pairs further apart stay at
    /// `INFINITY`. Pass `INFINITY` for an unbounded run.
    pub fn compute(&self, sources: &[ResolvedPoint], targets: &[ResolvedPoint], max: Weight) -> Result<WeightMatrix, Error> {
        let _ctx = push_context("matrix".to_string());
        report!("num_sources", sources.len());
        report!("num_targets", targets.len());

        let source_seeds = expand(sources, PointSide::Source)?;
        let target_seeds = expand(targets, PointSide::Target)?;

        let mut weights = vec![vec![INFINITY; 2 * targets.len()]; 2 * sources.len()];

        for (i, source) in sources.iter().enumerate() {
            for (j, target) in targets.iter().enumerate() {
                if source.edge == NO_EDGE || source.edge != target.edge {
                    continue;
                }
                if let Some(weight) = source.weight_along_edge_to(target, true).filter(|&w| w <= max) {
                    weights[2 * i][2 * j] = weight;
                }
                if let Some(weight) = source.weight_along_edge_to(target, false).filter(|&w| w <= max) {
                    weights[2 * i + 1][2 * j + 1] = weight;
                }
            }
        }

        let mut buckets: HashMap<NodeId, Vec<(usize, Rc<EdgePath>)>> = HashMap::new();
        report_time_with_key("forward sweep", "forward_sweep_running_time_ms", || {
            let search = BoundedDirectedSearch::forward(self.graph).bounded(max);
            for (row, seed) in source_seeds.iter().enumerate() {
                let Some(seed) = seed else { continue };
                for (vertex, paths) in search.run(std::iter::once(Rc::clone(seed))) {
                    let bucket = buckets.entry(vertex).or_default();
                    bucket.extend(paths.into_iter().map(|path| (row, path)));
                }
            }
        });

        // cheapest forward visit first so the merge skips detours early
        for bucket in buckets.values_mut() {
            bucket.sort_unstable_by_key(|(_, path)| NonNan::new(path.weight).unwrap());
        }

        report_time_with_key("backward sweep", "backward_sweep_running_time_ms", || {
            let search = BoundedDirectedSearch::backward(self.graph).bounded(max);
            for (column, seed) in target_seeds.iter().enumerate() {
                let Some(seed) = seed else { continue };
                for (vertex, backward_paths) in search.run(std::iter::once(Rc::clone(seed))) {
                    let Some(bucket) = buckets.get(&vertex) else { continue };
                    for (row, forward_path) in bucket {
                        let best = &mut weights[*row][column];
                        if forward_path.weight >= *best {
                            continue;
                        }
                        for backward_path in &backward_paths {
                            let total = forward_path.weight + backward_path.weight;
                            if total > max || total >= *best {
                                continue;
                            }
                            // meeting over one shared original edge means
                            // reversing in the middle of that edge
                            if forward_path.base == backward_path.base && forward_path.base != NO_EDGE {
                                continue;
                            }
                            *best = total;
                        }
                    }
                }
            }
        });

        Ok(correct(weights, sources.len(), targets.len()))
    }
}

fn expand(points: &[ResolvedPoint], side: PointSide) -> Result<Vec<Option<Rc<EdgePath>>>, Error> {
    let mut seeds = Vec::with_capacity(2 * points.len());
    for (index, point) in points.iter().enumerate() {
        let [forward, backward] = point.half_seeds(side);
        if forward.is_none() && backward.is_none() {
            return Err(Error::UnresolvablePoint { side, index });
        }
        seeds.push(forward);
        seeds.push(backward);
    }
    Ok(seeds)
}

/// Drop points which cannot reach more than half of the opposite side and
/// shrink the matrix accordingly.
fn correct(weights: Vec<Vec<Weight>>, num_sources: usize, num_targets: usize) -> WeightMatrix {
    let pair_invalid = |i: usize, j: usize| {
        weights[2 * i][2 * j] == INFINITY
            && weights[2 * i][2 * j + 1] == INFINITY
            && weights[2 * i + 1][2 * j] == INFINITY
            && weights[2 * i + 1][2 * j + 1] == INFINITY
    };

    let not_routable = || RouterPointError {
        code: PointErrorCode::NotRoutable,
        message: "point could not be routed to a sufficient share of the opposite side".to_string(),
    };

    let mut source_index = Vec::new();
    let mut source_errors = HashMap::new();
    for i in 0..num_sources {
        let invalid = (0..num_targets).filter(|&j| pair_invalid(i, j)).count();
        if invalid * 2 > num_targets {
            source_errors.insert(i, not_routable());
        } else {
            source_index.push(i);
        }
    }

    let mut target_index = Vec::new();
    let mut target_errors = HashMap::new();
    for j in 0..num_targets {
        let invalid = (0..num_sources).filter(|&i| pair_invalid(i, j)).count();
        if invalid * 2 > num_sources {
            target_errors.insert(j, not_routable());
        } else {
            target_index.push(j);
        }
    }

    let mut corrected = Vec::with_capacity(2 * source_index.len());
    for &i in &source_index {
        for d in 0..2 {
            let row = &weights[2 * i + d];
            let mut corrected_row = Vec::with_capacity(2 * target_index.len());
            for &j in &target_index {
                corrected_row.push(row[2 * j]);
                corrected_row.push(row[2 * j + 1]);
            }
            corrected.push(corrected_row);
        }
    }

    report!("num_dropped_sources", source_errors.len());
    report!("num_dropped_targets", target_errors.len());

    WeightMatrix {
        weights: corrected,
        source_index,
        target_index,
        source_errors,
        target_errors,
    }
}

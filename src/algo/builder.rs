//! Deriving a weighted directed graph from the base graph under one profile.
//!
//! The profile is consulted through a factor callback which may be expensive
//! (script driven profiles), so factors are memoized per profile id for the
//! duration of the build.

use super::Error;
use crate::datastr::graph::*;
use crate::report::*;
use crate::util::in_range_option::InRangeOption;
use std::collections::HashMap;

/// Builds the graph the contraction runs on.
pub struct DirectedGraphBuilder<F> {
    factor_for: F,
    memo: HashMap<u16, Factor>,
}

impl<F: FnMut(u16) -> Factor> DirectedGraphBuilder<F> {
    pub fn new(factor_for: F) -> Self {
        DirectedGraphBuilder {
            factor_for,
            memo: HashMap::new(),
        }
    }

    fn factor(&mut self, profile: u16) -> Factor {
        let factor_for = &mut self.factor_for;
        *self.memo.entry(profile).or_insert_with(|| factor_for(profile))
    }

    /// Translate every usable base edge into a weighted directed edge.
    ///
    /// Edges whose profile yields a zero factor are dropped. Directions are
    /// interpreted relative to the canonical edge orientation, the mirrored
    /// storage takes care of the per endpoint view.
    pub fn build(mut self, base: &BaseGraph) -> Result<DirectedGraph, Error> {
        let mut graph = DirectedGraph::new(base.num_nodes());
        let mut num_edges = 0usize;

        for node in 0..base.num_nodes() as NodeId {
            for link in base.link_iter(node) {
                if link.inverted {
                    continue;
                }
                let factor = self.factor(link.profile);
                if factor.value == 0.0 {
                    continue;
                }
                if !factor.value.is_finite() || factor.value < 0.0 {
                    return Err(Error::CorruptGraphData("profile factor not finite and non-negative"));
                }

                graph.add_edge(
                    node,
                    DirectedEdge {
                        head: link.neighbour,
                        weight: link.distance * factor.value,
                        direction: direction_to_relative(factor.direction),
                        through: InRangeOption::new(None),
                        base_at_tail: link.edge,
                        base_at_head: link.edge,
                    },
                );
                num_edges += 1;
            }
        }

        report!("num_nodes", base.num_nodes());
        report!("num_directed_edges", num_edges);

        Ok(graph)
    }
}

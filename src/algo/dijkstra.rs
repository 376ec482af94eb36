//! Upward searches over the hierarchy which remember their paths.
//!
//! The many to many engine needs more than distances: every settled label
//! carries the original edge it arrived over so that u-turns at resolved
//! points can be rejected when two half searches are joined. Labels are
//! persistent singly linked paths shared through `Rc`, extending a path is
//! O(1) and never copies the tail.

use crate::datastr::graph::*;
use crate::util::NonNan;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;

/// A label of the search, a path from a seed to `vertex`.
#[derive(Debug)]
pub struct EdgePath {
    pub vertex: NodeId,
    pub weight: Weight,
    /// Original edge over which `vertex` was reached, `NO_EDGE` for seeds
    /// planted directly on a vertex.
    pub base: EdgeId,
    pub previous: Option<Rc<EdgePath>>,
}

impl EdgePath {
    pub fn seed(vertex: NodeId, weight: Weight, base: EdgeId) -> Rc<EdgePath> {
        Rc::new(EdgePath {
            vertex,
            weight,
            base,
            previous: None,
        })
    }
}

struct QueueElement(Rc<EdgePath>);

impl PartialEq for QueueElement {
    fn eq(&self, other: &Self) -> bool {
        self.0.weight == other.0.weight
    }
}

impl Eq for QueueElement {}

impl PartialOrd for QueueElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueElement {
    // reversed so the BinaryHeap pops the lightest path first
    fn cmp(&self, other: &Self) -> Ordering {
        NonNan::new(other.0.weight).unwrap().cmp(&NonNan::new(self.0.weight).unwrap())
    }
}

/// All settled labels of one search, keyed by vertex. A vertex can hold
/// several labels as long as they arrive over distinct original edges.
pub type Visits = HashMap<NodeId, Vec<Rc<EdgePath>>>;

/// One directional upward search with an optional weight bound.
pub struct BoundedDirectedSearch<'a> {
    graph: &'a ContractedGraph,
    backward: bool,
    max_weight: Weight,
}

impl<'a> BoundedDirectedSearch<'a> {
    pub fn forward(graph: &'a ContractedGraph) -> Self {
        BoundedDirectedSearch {
            graph,
            backward: false,
            max_weight: INFINITY,
        }
    }

    pub fn backward(graph: &'a ContractedGraph) -> Self {
        BoundedDirectedSearch {
            graph,
            backward: true,
            max_weight: INFINITY,
        }
    }

    pub fn bounded(mut self, max_weight: Weight) -> Self {
        self.max_weight = max_weight;
        self
    }

    /// Run the search from the given seeds until the queue drains.
    pub fn run(&self, seeds: impl IntoIterator<Item = Rc<EdgePath>>) -> Visits {
        let mut queue = BinaryHeap::new();
        for seed in seeds {
            if seed.weight <= self.max_weight {
                queue.push(QueueElement(seed));
            }
        }

        let mut visits: Visits = HashMap::new();

        while let Some(QueueElement(path)) = queue.pop() {
            let at_vertex = visits.entry(path.vertex).or_default();
            if at_vertex.iter().any(|settled| settled.base == path.base) {
                continue;
            }
            at_vertex.push(Rc::clone(&path));

            for link in self.graph.link_iter(path.vertex) {
                let usable = if self.backward {
                    link.direction != Some(true)
                } else {
                    link.direction != Some(false)
                };
                if !usable {
                    continue;
                }

                let weight = path.weight + link.weight;
                if weight > self.max_weight {
                    continue;
                }

                queue.push(QueueElement(Rc::new(EdgePath {
                    vertex: link.head,
                    weight,
                    base: link.base_at_head,
                    previous: Some(Rc::clone(&path)),
                })));
            }
        }

        visits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::in_range_option::InRangeOption;
    use crate::algo::contraction::{ContractionConfig, HierarchyBuilder};

    fn bidirectional(head: NodeId, weight: Weight, base: EdgeId) -> DirectedEdge {
        DirectedEdge {
            head,
            weight,
            direction: None,
            through: InRangeOption::new(None),
            base_at_tail: base,
            base_at_head: base,
        }
    }

    fn line_hierarchy() -> ContractedGraph {
        let mut graph = DirectedGraph::new(4);
        graph.add_edge(0, bidirectional(1, 1.0, 0));
        graph.add_edge(1, bidirectional(2, 2.0, 1));
        graph.add_edge(2, bidirectional(3, 3.0, 2));
        HierarchyBuilder::new(graph, ContractionConfig::default()).run().unwrap()
    }

    #[test]
    fn forward_search_settles_the_upward_cone() {
        let contracted = line_hierarchy();
        let visits = BoundedDirectedSearch::forward(&contracted).run(vec![EdgePath::seed(0, 0.0, NO_EDGE)]);

        let at_start = &visits[&0];
        assert_eq!(at_start.len(), 1);
        assert_eq!(at_start[0].weight, 0.0);
        // every visit records the arriving original edge
        for paths in visits.values() {
            for path in paths {
                if path.previous.is_some() {
                    assert_ne!(path.base, NO_EDGE);
                }
            }
        }
    }

    #[test]
    fn forward_and_backward_cones_join() {
        let contracted = line_hierarchy();
        let forward = BoundedDirectedSearch::forward(&contracted).run(vec![EdgePath::seed(0, 0.0, NO_EDGE)]);
        let backward = BoundedDirectedSearch::backward(&contracted).run(vec![EdgePath::seed(3, 0.0, NO_EDGE)]);

        let mut best = INFINITY;
        for (vertex, fw_paths) in &forward {
            if let Some(bw_paths) = backward.get(vertex) {
                for fw in fw_paths {
                    for bw in bw_paths {
                        best = best.min(fw.weight + bw.weight);
                    }
                }
            }
        }
        assert_eq!(best, 6.0);
    }

    #[test]
    fn weight_bound_prunes() {
        let contracted = line_hierarchy();
        let visits = BoundedDirectedSearch::forward(&contracted)
            .bounded(2.9)
            .run(vec![EdgePath::seed(0, 0.0, NO_EDGE)]);

        assert!(visits.values().flatten().all(|path| path.weight <= 2.9));
    }

    #[test]
    fn parallel_arrivals_over_distinct_edges_coexist() {
        // 0 and 1 joined by two parallel edges of different weight,
        // frozen with 0 at the bottom so both arcs point upward from 0
        let mut graph = DirectedGraph::new(2);
        graph.add_edge(0, bidirectional(1, 1.0, 0));
        graph.add_edge(0, bidirectional(1, 2.0, 1));
        graph.remove_vertex_from_neighbours(0);
        let contracted = ContractedGraph::from_directed(&graph, &[0, 1]).unwrap();

        let visits = BoundedDirectedSearch::forward(&contracted).run(vec![EdgePath::seed(0, 0.0, NO_EDGE)]);
        let at_one = &visits[&1];
        assert_eq!(at_one.len(), 2);
        let mut bases: Vec<EdgeId> = at_one.iter().map(|p| p.base).collect();
        bases.sort_unstable();
        assert_eq!(bases, vec![0, 1]);
    }
}

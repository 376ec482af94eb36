//! Building a contraction hierarchy over a directed graph.
//!
//! Vertices are contracted one by one in priority order. Removing a vertex
//! inserts one way shortcuts between its neighbours wherever no witness path
//! of at most the shortcut weight survives the removal. Priorities are kept
//! lazily: the popped minimum is recomputed against the current graph and
//! reinserted when it no longer beats the runner up.

use self::witness::{WitnessCalculator, WitnessConfig};
use super::Error;
use crate::datastr::graph::*;
use crate::datastr::index_heap::{IndexdMinHeap, Indexing};
use crate::report::*;
use crate::util::NonNan;
use rayon::prelude::*;

pub mod query;
pub mod witness;

/// Queue entry for priority and witness searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct State {
    pub key: NonNan,
    pub node: NodeId,
}

impl Indexing for State {
    fn as_index(&self) -> usize {
        self.node as usize
    }
}

/// Tuning knobs of the contraction.
#[derive(Debug, Clone, Copy)]
pub struct ContractionConfig {
    /// Weight of the edge difference term in the priority.
    pub difference_factor: f32,
    /// Weight of the search space depth term in the priority.
    pub depth_factor: f32,
    /// Weight of the contracted neighbours term in the priority.
    pub contracted_factor: f32,
    /// Witness search bounds used while estimating priorities.
    pub priority_witness: WitnessConfig,
    /// Witness search bounds used when actually contracting. Hops are
    /// unbounded here, a missed witness means a superfluous shortcut.
    pub contraction_witness: WitnessConfig,
}

impl Default for ContractionConfig {
    fn default() -> Self {
        ContractionConfig {
            difference_factor: 1.0,
            depth_factor: 1.0,
            contracted_factor: 1.0,
            priority_witness: WitnessConfig {
                hop_limit: 4,
                max_settles: 64,
            },
            contraction_witness: WitnessConfig {
                hop_limit: u32::MAX,
                max_settles: 64,
            },
        }
    }
}

/// A callback vetoing vertex sequences, true means the sequence is forbidden.
pub type Restrictions<'a> = &'a (dyn Fn(&[NodeId]) -> bool + Sync);

/// Runs the contraction and produces the hierarchy.
pub struct HierarchyBuilder<'a> {
    graph: DirectedGraph,
    config: ContractionConfig,
    restrictions: Option<Restrictions<'a>>,
    levels: Vec<u32>,
    depth: Vec<u32>,
    contracted_neighbours: Vec<u32>,
    queue: IndexdMinHeap<State>,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(graph: DirectedGraph, config: ContractionConfig) -> Self {
        let n = graph.num_nodes();
        HierarchyBuilder {
            graph,
            config,
            restrictions: None,
            levels: vec![0; n],
            depth: vec![0; n],
            contracted_neighbours: vec![0; n],
            queue: IndexdMinHeap::new(n),
        }
    }

    pub fn with_restrictions(mut self, restrictions: Restrictions<'a>) -> Self {
        self.restrictions = Some(restrictions);
        self
    }

    /// Contract all vertices and freeze the result.
    pub fn run(mut self) -> Result<ContractedGraph, Error> {
        let n = self.graph.num_nodes();
        let _ctx = push_context("contraction".to_string());

        report_time_with_key("initial priorities", "initial_priorities_running_time_ms", || {
            let graph = &self.graph;
            let config = &self.config;
            let restrictions = self.restrictions;
            let depth = &self.depth;
            let contracted_neighbours = &self.contracted_neighbours;

            let priorities: Vec<(NodeId, f32)> = (0..n as NodeId)
                .into_par_iter()
                .map_init(
                    || WitnessCalculator::new(n, config.priority_witness),
                    |witness, node| (node, priority_of(graph, node, witness, config, restrictions, depth, contracted_neighbours)),
                )
                .collect();

            for (node, priority) in priorities {
                self.queue.push(State {
                    key: NonNan::new(priority).unwrap(),
                    node,
                });
            }
        });

        let mut priority_witness = WitnessCalculator::new(n, self.config.priority_witness);
        let mut contraction_witness = WitnessCalculator::new(n, self.config.contraction_witness);
        let mut rank = 0;
        let mut num_shortcuts = 0usize;

        report_time_with_key("contraction", "contraction_running_time_ms", || {
            while let Some(State { node, .. }) = self.queue.pop() {
                let priority = priority_of(
                    &self.graph,
                    node,
                    &mut priority_witness,
                    &self.config,
                    self.restrictions,
                    &self.depth,
                    &self.contracted_neighbours,
                );

                if let Some(min) = self.queue.peek() {
                    if priority > min.key.value() {
                        self.queue.push(State {
                            key: NonNan::new(priority).unwrap(),
                            node,
                        });
                        continue;
                    }
                }

                num_shortcuts += self.contract(node, &mut contraction_witness);
                self.levels[node as usize] = rank;
                rank += 1;
            }
        });

        report!("num_shortcuts", num_shortcuts);

        ContractedGraph::from_directed(&self.graph, &self.levels)
    }

    /// Contract a single vertex, returns the number of shortcut pairs added
    /// or shortened.
    fn contract(&mut self, vertex: NodeId, witness: &mut WitnessCalculator) -> usize {
        let incoming: Vec<DirectedEdge> = self.graph.edges(vertex).iter().filter(|e| e.is_incoming()).copied().collect();
        let outgoing: Vec<DirectedEdge> = self.graph.edges(vertex).iter().filter(|e| e.is_outgoing()).copied().collect();

        let mut shortcuts = 0;

        for edge_in in &incoming {
            for edge_out in &outgoing {
                let from = edge_in.head;
                let to = edge_out.head;
                if from == to {
                    continue;
                }
                if let Some(restricted) = self.restrictions {
                    if restricted(&[from, vertex, to]) {
                        continue;
                    }
                }

                let shortcut_weight = edge_in.weight + edge_out.weight;
                if witness.has_witness(&self.graph, from, to, vertex, shortcut_weight) {
                    continue;
                }

                match self.graph.insert_or_decrease(
                    from,
                    to,
                    shortcut_weight,
                    vertex,
                    edge_in.base_at_head,
                    edge_out.base_at_head,
                ) {
                    ShortcutInsertion::Redundant => {}
                    ShortcutInsertion::Shortened | ShortcutInsertion::Added => shortcuts += 1,
                }
            }
        }

        // parallel edges must not count a neighbour twice
        let mut neighbours: Vec<NodeId> = self.graph.edges(vertex).iter().map(|e| e.head).collect();
        neighbours.sort_unstable();
        neighbours.dedup();
        self.graph.remove_vertex_from_neighbours(vertex);

        let new_depth = self.depth[vertex as usize] + 1;
        for neighbour in neighbours {
            let depth = &mut self.depth[neighbour as usize];
            *depth = std::cmp::max(*depth, new_depth);
            self.contracted_neighbours[neighbour as usize] += 1;
        }

        shortcuts
    }
}

/// Simulated contraction of `vertex` against the current graph.
#[allow(clippy::too_many_arguments)]
fn priority_of(
    graph: &DirectedGraph,
    vertex: NodeId,
    witness: &mut WitnessCalculator,
    config: &ContractionConfig,
    restrictions: Option<Restrictions>,
    depth: &[u32],
    contracted_neighbours: &[u32],
) -> f32 {
    let edges = graph.edges(vertex);
    let removed = edges.len() as i64;
    let mut added = 0i64;

    for edge_in in edges.iter().filter(|e| e.is_incoming()) {
        for edge_out in edges.iter().filter(|e| e.is_outgoing()) {
            let from = edge_in.head;
            let to = edge_out.head;
            if from == to {
                continue;
            }
            if let Some(restricted) = restrictions {
                if restricted(&[from, vertex, to]) {
                    continue;
                }
            }
            if !witness.has_witness(graph, from, to, vertex, edge_in.weight + edge_out.weight) {
                added += 1;
            }
        }
    }

    config.difference_factor * (added - removed) as f32
        + config.depth_factor * depth[vertex as usize] as f32
        + config.contracted_factor * contracted_neighbours[vertex as usize] as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::in_range_option::InRangeOption;

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

    #[test]
    fn line_graph_gets_shortcut_through_middle() {
        // 0 - 1 - 2, contracting 1 first must bridge 0 and 2
        let mut graph = DirectedGraph::new(3);
        graph.add_edge(0, bidirectional(1, 2.0, 0));
        graph.add_edge(1, bidirectional(2, 3.0, 1));

        let mut builder = HierarchyBuilder::new(graph, ContractionConfig::default());
        let mut witness = WitnessCalculator::new(3, builder.config.contraction_witness);
        let added = builder.contract(1, &mut witness);
        assert_eq!(added, 2);

        let shortcut = builder.graph.edges(0).iter().find(|e| e.head == 2).unwrap();
        assert_eq!(shortcut.weight, 5.0);
        assert_eq!(shortcut.through.value(), Some(1));
        assert_eq!(shortcut.base_at_tail, 0);
        assert_eq!(shortcut.base_at_head, 1);
        assert!(builder.graph.edges(0).iter().all(|e| e.head != 1));
    }

    #[test]
    fn triangle_needs_no_shortcut() {
        // direct edge 0 - 2 witnesses the path through 1
        let mut graph = DirectedGraph::new(3);
        graph.add_edge(0, bidirectional(1, 2.0, 0));
        graph.add_edge(1, bidirectional(2, 3.0, 1));
        graph.add_edge(0, bidirectional(2, 4.0, 2));

        let mut builder = HierarchyBuilder::new(graph, ContractionConfig::default());
        let mut witness = WitnessCalculator::new(3, builder.config.contraction_witness);
        assert_eq!(builder.contract(1, &mut witness), 0);
    }

    #[test]
    fn parallel_edges_count_as_one_contracted_neighbour() {
        let mut graph = DirectedGraph::new(2);
        graph.add_edge(0, bidirectional(1, 1.0, 0));
        graph.add_edge(0, bidirectional(1, 2.0, 1));

        let mut builder = HierarchyBuilder::new(graph, ContractionConfig::default());
        let mut witness = WitnessCalculator::new(2, builder.config.contraction_witness);
        builder.contract(0, &mut witness);

        assert_eq!(builder.contracted_neighbours[1], 1);
        assert_eq!(builder.depth[1], 1);
    }

    #[test]
    fn restrictions_veto_shortcuts() {
        let mut graph = DirectedGraph::new(3);
        graph.add_edge(0, bidirectional(1, 2.0, 0));
        graph.add_edge(1, bidirectional(2, 3.0, 1));

        let forbidden = |sequence: &[NodeId]| sequence == [0, 1, 2];
        let mut builder = HierarchyBuilder::new(graph, ContractionConfig::default()).with_restrictions(&forbidden);
        let mut witness = WitnessCalculator::new(3, builder.config.contraction_witness);
        let added = builder.contract(1, &mut witness);

        // only the reverse direction survives
        assert_eq!(added, 1);
        let shortcut = builder.graph.edges(2).iter().find(|e| e.head == 0).unwrap();
        assert_eq!(shortcut.direction, Some(true));
    }

    #[test]
    fn hierarchy_preserves_distances() {
        use rand::prelude::*;
        use std::collections::BinaryHeap;

        let mut rng = StdRng::seed_from_u64(42);
        let n = 30;
        let mut graph = DirectedGraph::new(n);
        let mut plain: Vec<Vec<(NodeId, Weight)>> = vec![Vec::new(); n];

        let mut base = 0;
        let mut connect = |graph: &mut DirectedGraph, plain: &mut Vec<Vec<(NodeId, Weight)>>, from: usize, to: usize, weight: Weight| {
            graph.add_edge(from as NodeId, bidirectional(to as NodeId, weight, base));
            base += 1;
            plain[from].push((to as NodeId, weight));
            plain[to].push((from as NodeId, weight));
        };

        for node in 1..n {
            let to = rng.gen_range(0..node);
            let weight = rng.gen_range(1..100) as Weight;
            connect(&mut graph, &mut plain, node, to, weight);
        }
        for _ in 0..40 {
            let from = rng.gen_range(0..n);
            let to = rng.gen_range(0..n);
            if from == to {
                continue;
            }
            let weight = rng.gen_range(1..100) as Weight;
            connect(&mut graph, &mut plain, from, to, weight);
        }

        let contracted = HierarchyBuilder::new(graph, ContractionConfig::default()).run().unwrap();
        let mut server = query::Server::new(&contracted);

        let dijkstra = |source: NodeId| {
            let mut dist = vec![INFINITY; n];
            let mut heap = BinaryHeap::new();
            dist[source as usize] = 0.0;
            heap.push((std::cmp::Reverse(NonNan::new(0.0).unwrap()), source));
            while let Some((std::cmp::Reverse(key), node)) = heap.pop() {
                if key.value() > dist[node as usize] {
                    continue;
                }
                for &(head, weight) in &plain[node as usize] {
                    let next = key.value() + weight;
                    if next < dist[head as usize] {
                        dist[head as usize] = next;
                        heap.push((std::cmp::Reverse(NonNan::new(next).unwrap()), head));
                    }
                }
            }
            dist
        };

        for source in [0 as NodeId, 7, 13] {
            let expected = dijkstra(source);
            for target in 0..n as NodeId {
                assert_eq!(server.distance(source, target), expected[target as usize], "{} -> {}", source, target);
            }
        }
    }
}

//! Point to point queries on the contraction hierarchy.
//!
//! Two upward Dijkstra searches, one from the source along arcs usable away
//! from their tail, one from the target along arcs usable towards their
//! tail. The shortest path passes through the meeting vertex with the best
//! combined distance. Shortcuts are expanded recursively through their
//! bypassed vertex to recover the vertex sequence.

use super::State;
use crate::datastr::graph::*;
use crate::datastr::index_heap::{IndexdMinHeap, Indexing};
use crate::datastr::timestamped_vector::TimestampedVector;
use crate::util::NonNan;

/// Reusable query state over a frozen hierarchy.
pub struct Server<'a> {
    graph: &'a ContractedGraph,
    forward: TimestampedVector<Weight>,
    backward: TimestampedVector<Weight>,
    forward_parent: Vec<(NodeId, NodeId)>,
    backward_parent: Vec<(NodeId, NodeId)>,
    queue: IndexdMinHeap<State>,
    forward_settled: Vec<NodeId>,
    meeting: Option<NodeId>,
}

impl<'a> Server<'a> {
    pub fn new(graph: &'a ContractedGraph) -> Server<'a> {
        let n = graph.num_nodes();
        Server {
            graph,
            forward: TimestampedVector::new(n, INFINITY),
            backward: TimestampedVector::new(n, INFINITY),
            forward_parent: vec![(NO_VERTEX, NO_VERTEX); n],
            backward_parent: vec![(NO_VERTEX, NO_VERTEX); n],
            queue: IndexdMinHeap::new(n),
            forward_settled: Vec::new(),
            meeting: None,
        }
    }

    /// Shortest path weight between the vertices, `INFINITY` if disconnected.
    pub fn distance(&mut self, from: NodeId, to: NodeId) -> Weight {
        self.search(from, false);
        self.search(to, true);

        let mut best = INFINITY;
        self.meeting = None;
        for &node in &self.forward_settled {
            let combined = self.forward[node as usize] + self.backward[node as usize];
            if combined < best {
                best = combined;
                self.meeting = Some(node);
            }
        }
        best
    }

    /// The vertex sequence of the last successful `distance` query.
    pub fn path(&mut self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        let meeting = self.meeting?;

        let mut upward = Vec::new();
        let mut at = meeting;
        while at != from {
            let (parent, through) = self.forward_parent[at as usize];
            upward.push((parent, at, through));
            at = parent;
        }
        upward.reverse();

        let mut downward = Vec::new();
        let mut at = meeting;
        while at != to {
            let (parent, through) = self.backward_parent[at as usize];
            downward.push((at, parent, through));
            at = parent;
        }

        let mut path = vec![from];
        for (tail, head, through) in upward.into_iter().chain(downward) {
            self.unpack(tail, head, through, &mut path);
        }
        Some(path)
    }

    /// One upward search. The backward search runs on the same arcs with the
    /// opposite traversability test.
    fn search(&mut self, start: NodeId, backward: bool) {
        let distances = if backward { &mut self.backward } else { &mut self.forward };
        distances.reset();
        self.queue.clear();
        if !backward {
            self.forward_settled.clear();
        }

        distances.set(start as usize, 0.0);
        self.queue.push(State {
            key: NonNan::new(0.0).unwrap(),
            node: start,
        });

        while let Some(State { key, node }) = self.queue.pop() {
            let distance = key.value();
            if !backward {
                self.forward_settled.push(node);
            }

            for link in self.graph.link_iter(node) {
                let usable = if backward { link.direction != Some(true) } else { link.direction != Some(false) };
                if !usable {
                    continue;
                }

                let distances = if backward { &mut self.backward } else { &mut self.forward };
                let next = distance + link.weight;
                if next < distances[link.head as usize] {
                    distances.set(link.head as usize, next);
                    let parents = if backward { &mut self.backward_parent } else { &mut self.forward_parent };
                    parents[link.head as usize] = (node, link.through);

                    let state = State {
                        key: NonNan::new(next).unwrap(),
                        node: link.head,
                    };
                    if self.queue.contains_index(state.as_index()) {
                        self.queue.decrease_key(state);
                    } else {
                        self.queue.push(state);
                    }
                }
            }
        }
    }

    /// Expand one arc into original vertices, appending everything after
    /// `tail` to `path`.
    fn unpack(&self, tail: NodeId, head: NodeId, through: NodeId, path: &mut Vec<NodeId>) {
        if through == NO_VERTEX {
            path.push(head);
            return;
        }

        let mut into = None;
        let mut out_of = None;
        for link in self.graph.link_iter(through) {
            if link.head == tail && link.direction != Some(true) {
                if into.map_or(true, |l: ContractedLink| link.weight < l.weight) {
                    into = Some(link);
                }
            }
            if link.head == head && link.direction != Some(false) {
                if out_of.map_or(true, |l: ContractedLink| link.weight < l.weight) {
                    out_of = Some(link);
                }
            }
        }

        let into = into.expect("shortcut references a vertex without a matching arc");
        let out_of = out_of.expect("shortcut references a vertex without a matching arc");

        self.unpack(tail, through, into.through, path);
        self.unpack(through, head, out_of.through, path);
    }
}

#[cfg(test)]
mod tests {
    use super::super::{ContractionConfig, HierarchyBuilder};
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

    fn line_hierarchy() -> ContractedGraph {
        // 0 - 1 - 2 - 3 with weights 1, 2, 3
        let mut graph = DirectedGraph::new(4);
        graph.add_edge(0, bidirectional(1, 1.0, 0));
        graph.add_edge(1, bidirectional(2, 2.0, 1));
        graph.add_edge(2, bidirectional(3, 3.0, 2));
        HierarchyBuilder::new(graph, ContractionConfig::default()).run().unwrap()
    }

    #[test]
    fn distances_on_a_line() {
        let contracted = line_hierarchy();
        let mut server = Server::new(&contracted);

        assert_eq!(server.distance(0, 3), 6.0);
        assert_eq!(server.distance(3, 0), 6.0);
        assert_eq!(server.distance(1, 1), 0.0);
        assert_eq!(server.distance(1, 3), 5.0);
    }

    #[test]
    fn paths_unpack_shortcuts() {
        let contracted = line_hierarchy();
        let mut server = Server::new(&contracted);

        assert_eq!(server.distance(0, 3), 6.0);
        assert_eq!(server.path(0, 3), Some(vec![0, 1, 2, 3]));

        assert_eq!(server.distance(3, 1), 5.0);
        assert_eq!(server.path(3, 1), Some(vec![3, 2, 1]));
    }

    #[test]
    fn one_ways_are_respected_end_to_end() {
        let mut graph = DirectedGraph::new(3);
        graph.add_edge(
            0,
            DirectedEdge {
                head: 1,
                weight: 1.0,
                direction: Some(true),
                through: InRangeOption::new(None),
                base_at_tail: 0,
                base_at_head: 0,
            },
        );
        graph.add_edge(1, bidirectional(2, 1.0, 1));

        let contracted = HierarchyBuilder::new(graph, ContractionConfig::default()).run().unwrap();
        let mut server = Server::new(&contracted);

        assert_eq!(server.distance(0, 2), 2.0);
        assert_eq!(server.distance(2, 0), INFINITY);
    }

    #[test]
    fn disconnected_vertices_have_no_path() {
        let graph = DirectedGraph::new(2);
        let contracted = HierarchyBuilder::new(graph, ContractionConfig::default()).run().unwrap();
        let mut server = Server::new(&contracted);

        assert_eq!(server.distance(0, 1), INFINITY);
        assert_eq!(server.path(0, 1), None);
    }
}

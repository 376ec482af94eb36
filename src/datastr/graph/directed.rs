//! The mutable adjacency list graph the contraction works on.
//!
//! Edges carry a weight, a relative direction and the two original edge ids
//! at their endpoints. Every edge is stored in the adjacency of both
//! endpoints as a mirrored pair so that a single scan of a vertex sees its
//! full neighbourhood. The mirror flips the direction and swaps the endpoint
//! edge ids. Shortcuts additionally remember the contracted vertex they
//! bypass for unpacking.

use super::*;
use crate::util::in_range_option::InRangeOption;

/// An edge as seen from a fixed tail vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectedEdge {
    pub head: NodeId,
    pub weight: Weight,
    /// `None` usable both ways, `Some(true)` tail to head only,
    /// `Some(false)` head to tail only.
    pub direction: Option<bool>,
    /// The bypassed vertex for shortcuts, unset for original edges.
    pub through: InRangeOption<NodeId>,
    /// Original edge id incident to the tail of this entry.
    pub base_at_tail: EdgeId,
    /// Original edge id incident to the head of this entry.
    pub base_at_head: EdgeId,
}

impl DirectedEdge {
    /// Can this entry be traversed away from the vertex it is stored at?
    pub fn is_outgoing(&self) -> bool {
        self.direction != Some(false)
    }

    /// Can this entry be traversed towards the vertex it is stored at?
    pub fn is_incoming(&self) -> bool {
        self.direction != Some(true)
    }

    pub fn is_shortcut(&self) -> bool {
        self.through.value().is_some()
    }

    fn mirrored(&self, tail: NodeId) -> DirectedEdge {
        DirectedEdge {
            head: tail,
            weight: self.weight,
            direction: self.direction.map(|forward| !forward),
            through: self.through,
            base_at_tail: self.base_at_head,
            base_at_head: self.base_at_tail,
        }
    }
}

/// What `insert_or_decrease` did with a candidate shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutInsertion {
    /// A usable edge at least as good already existed.
    Redundant,
    /// An existing shortcut was shortened in place.
    Shortened,
    /// A new edge pair was added.
    Added,
}

/// Adjacency list graph with mirrored edge pairs.
#[derive(Debug, Clone)]
pub struct DirectedGraph {
    nodes: Vec<Vec<DirectedEdge>>,
}

impl DirectedGraph {
    pub fn new(num_nodes: usize) -> DirectedGraph {
        DirectedGraph {
            nodes: vec![Vec::new(); num_nodes],
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// All entries stored at `node`, mirrors included.
    pub fn edges(&self, node: NodeId) -> &[DirectedEdge] {
        &self.nodes[node as usize]
    }

    /// Insert `edge` at `tail` together with its mirror at the head.
    pub fn add_edge(&mut self, tail: NodeId, edge: DirectedEdge) {
        debug_assert!(tail != edge.head);
        let mirror = edge.mirrored(tail);
        self.nodes[tail as usize].push(edge);
        self.nodes[edge.head as usize].push(mirror);
    }

    /// Insert a one-way shortcut `from -> to`, unless a usable edge at least
    /// as short already connects the pair. An existing one-way shortcut in
    /// the same direction is shortened in place instead of duplicated.
    pub fn insert_or_decrease(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: Weight,
        through: NodeId,
        base_at_tail: EdgeId,
        base_at_head: EdgeId,
    ) -> ShortcutInsertion {
        if self.nodes[from as usize]
            .iter()
            .any(|e| e.head == to && e.is_outgoing() && e.weight <= weight)
        {
            return ShortcutInsertion::Redundant;
        }

        let updatable = self.nodes[from as usize]
            .iter()
            .position(|e| e.head == to && e.direction == Some(true) && e.is_shortcut());

        if let Some(position) = updatable {
            let old = self.nodes[from as usize][position];
            let new = DirectedEdge {
                head: to,
                weight,
                direction: Some(true),
                through: InRangeOption::some(through),
                base_at_tail,
                base_at_head,
            };
            self.nodes[from as usize][position] = new;

            let old_mirror = old.mirrored(from);
            let mirror_position = self.nodes[to as usize]
                .iter()
                .position(|e| *e == old_mirror)
                .expect("mirrored edge pair out of sync");
            self.nodes[to as usize][mirror_position] = new.mirrored(from);

            return ShortcutInsertion::Shortened;
        }

        self.add_edge(
            from,
            DirectedEdge {
                head: to,
                weight,
                direction: Some(true),
                through: InRangeOption::some(through),
                base_at_tail,
                base_at_head,
            },
        );
        ShortcutInsertion::Added
    }

    /// Drop every mirror pointing at `vertex` from its neighbours.
    /// The entries stored at `vertex` itself stay, they form its upward star.
    pub fn remove_vertex_from_neighbours(&mut self, vertex: NodeId) {
        let neighbours: Vec<NodeId> = self.nodes[vertex as usize].iter().map(|e| e.head).collect();
        for neighbour in neighbours {
            self.nodes[neighbour as usize].retain(|e| e.head != vertex);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn original(head: NodeId, weight: Weight, direction: Option<bool>) -> DirectedEdge {
        DirectedEdge {
            head,
            weight,
            direction,
            through: InRangeOption::new(None),
            base_at_tail: 0,
            base_at_head: 0,
        }
    }

    #[test]
    fn add_edge_mirrors() {
        let mut graph = DirectedGraph::new(2);
        graph.add_edge(0, original(1, 5.0, Some(true)));

        assert_eq!(graph.edges(0).len(), 1);
        assert_eq!(graph.edges(1).len(), 1);
        let mirror = graph.edges(1)[0];
        assert_eq!(mirror.head, 0);
        assert_eq!(mirror.direction, Some(false));
        assert!(graph.edges(0)[0].is_outgoing());
        assert!(!mirror.is_outgoing());
        assert!(mirror.is_incoming());
    }

    #[test]
    fn redundant_shortcut_is_skipped() {
        let mut graph = DirectedGraph::new(3);
        graph.add_edge(0, original(1, 5.0, None));
        assert_eq!(graph.insert_or_decrease(0, 1, 7.0, 2, 0, 1), ShortcutInsertion::Redundant);
        assert_eq!(graph.edges(0).len(), 1);
    }

    #[test]
    fn shorter_shortcut_updates_in_place() {
        let mut graph = DirectedGraph::new(4);
        assert_eq!(graph.insert_or_decrease(0, 1, 9.0, 2, 0, 1), ShortcutInsertion::Added);
        assert_eq!(graph.insert_or_decrease(0, 1, 6.0, 3, 2, 3), ShortcutInsertion::Shortened);

        assert_eq!(graph.edges(0).len(), 1);
        assert_eq!(graph.edges(1).len(), 1);
        assert_eq!(graph.edges(0)[0].weight, 6.0);
        assert_eq!(graph.edges(0)[0].through.value(), Some(3));
        assert_eq!(graph.edges(1)[0].weight, 6.0);
        assert_eq!(graph.edges(1)[0].base_at_tail, 3);
    }

    #[test]
    fn removing_a_vertex_keeps_its_own_star() {
        let mut graph = DirectedGraph::new(3);
        graph.add_edge(0, original(1, 1.0, None));
        graph.add_edge(1, original(2, 1.0, None));

        graph.remove_vertex_from_neighbours(1);

        assert_eq!(graph.edges(0).len(), 0);
        assert_eq!(graph.edges(2).len(), 0);
        assert_eq!(graph.edges(1).len(), 2);
    }
}

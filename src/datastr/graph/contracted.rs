//! The static hierarchy graph queries run against.
//!
//! Built from the adjacency list graph once every vertex is contracted. At
//! that point each vertex only holds entries towards vertices contracted
//! later, so the entry lists are exactly the upward stars and can be frozen
//! into adjacency arrays without further filtering.

use super::*;
use crate::algo::Error;
use crate::datastr::huge_array::HugeArray;
use crate::io::{Deconstruct, Loader, Reconstruct, Store};
use std::io::Result;

/// An upward arc as seen from its tail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractedLink {
    pub head: NodeId,
    pub weight: Weight,
    pub direction: Option<bool>,
    pub through: NodeId,
    pub base_at_tail: EdgeId,
    pub base_at_head: EdgeId,
}

/// Adjacency array based contraction hierarchy.
#[derive(Debug)]
pub struct ContractedGraph {
    first_out: HugeArray<EdgeId>,
    head: HugeArray<NodeId>,
    weight: HugeArray<Weight>,
    flags: HugeArray<u8>,
    through: HugeArray<NodeId>,
    base_tail: HugeArray<EdgeId>,
    base_head: HugeArray<EdgeId>,
    level: HugeArray<u32>,
}

impl ContractedGraph {
    /// Freeze a fully contracted adjacency list graph.
    pub fn from_directed(graph: &DirectedGraph, levels: &[u32]) -> std::result::Result<ContractedGraph, Error> {
        let n = graph.num_nodes();
        debug_assert_eq!(levels.len(), n);

        let mut first_out = HugeArray::<EdgeId>::new(n + 1)?;
        let mut num_arcs = 0;
        for node in 0..n {
            first_out.set(node, num_arcs);
            num_arcs += graph.edges(node as NodeId).len() as EdgeId;
        }
        first_out.set(n, num_arcs);

        let num_arcs = num_arcs as usize;
        let mut head = HugeArray::<NodeId>::new(num_arcs)?;
        let mut weight = HugeArray::<Weight>::new(num_arcs)?;
        let mut flags = HugeArray::<u8>::new(num_arcs)?;
        let mut through = HugeArray::<NodeId>::new(num_arcs)?;
        let mut base_tail = HugeArray::<EdgeId>::new(num_arcs)?;
        let mut base_head = HugeArray::<EdgeId>::new(num_arcs)?;

        let mut slot = 0;
        for node in 0..n {
            for edge in graph.edges(node as NodeId) {
                debug_assert!(levels[edge.head as usize] > levels[node]);
                head.set(slot, edge.head);
                weight.set(slot, edge.weight);
                flags.set(slot, relative_to_direction(edge.direction));
                through.set(slot, edge.through.value().unwrap_or(NO_VERTEX));
                base_tail.set(slot, edge.base_at_tail);
                base_head.set(slot, edge.base_at_head);
                slot += 1;
            }
        }

        let mut level = HugeArray::<u32>::new(n)?;
        for (node, &l) in levels.iter().enumerate() {
            level.set(node, l);
        }

        Ok(ContractedGraph {
            first_out,
            head,
            weight,
            flags,
            through,
            base_tail,
            base_head,
            level,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.first_out.len() - 1
    }

    pub fn num_arcs(&self) -> usize {
        self.head.len()
    }

    pub fn level(&self, node: NodeId) -> u32 {
        self.level.get(node as usize)
    }

    fn arc_range(&self, node: NodeId) -> std::ops::Range<usize> {
        self.first_out.get(node as usize) as usize..self.first_out.get(node as usize + 1) as usize
    }

    /// Iterate over the upward arcs of `node`.
    pub fn link_iter(&self, node: NodeId) -> impl Iterator<Item = ContractedLink> + '_ {
        self.arc_range(node).map(move |slot| ContractedLink {
            head: self.head.get(slot),
            weight: self.weight.get(slot),
            direction: direction_to_relative(self.flags.get(slot)),
            through: self.through.get(slot),
            base_at_tail: self.base_tail.get(slot),
            base_at_head: self.base_head.get(slot),
        })
    }
}

impl Deconstruct for ContractedGraph {
    fn store_each(&self, store: &dyn Fn(&str, &dyn Store) -> Result<()>) -> Result<()> {
        store("first_out", &self.first_out)?;
        store("head", &self.head)?;
        store("weight", &self.weight)?;
        store("flags", &self.flags)?;
        store("through", &self.through)?;
        store("base_tail", &self.base_tail)?;
        store("base_head", &self.base_head)?;
        store("level", &self.level)?;
        Ok(())
    }
}

impl Reconstruct for ContractedGraph {
    fn reconstruct_with(loader: Loader) -> Result<Self> {
        Ok(ContractedGraph {
            first_out: loader.load("first_out")?,
            head: loader.load("head")?,
            weight: loader.load("weight")?,
            flags: loader.load("flags")?,
            through: loader.load("through")?,
            base_tail: loader.load("base_tail")?,
            base_head: loader.load("base_head")?,
            level: loader.load("level")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::in_range_option::InRangeOption;

    fn two_level_hierarchy() -> (DirectedGraph, Vec<u32>) {
        let mut graph = DirectedGraph::new(3);
        graph.add_edge(
            0,
            DirectedEdge {
                head: 2,
                weight: 4.0,
                direction: None,
                through: InRangeOption::new(None),
                base_at_tail: 0,
                base_at_head: 0,
            },
        );
        graph.add_edge(
            1,
            DirectedEdge {
                head: 2,
                weight: 3.0,
                direction: Some(true),
                through: InRangeOption::new(None),
                base_at_tail: 1,
                base_at_head: 1,
            },
        );
        graph.remove_vertex_from_neighbours(0);
        graph.remove_vertex_from_neighbours(1);
        graph.remove_vertex_from_neighbours(2);
        (graph, vec![0, 1, 2])
    }

    #[test]
    fn freezing_keeps_upward_stars() {
        let (graph, levels) = two_level_hierarchy();
        let contracted = ContractedGraph::from_directed(&graph, &levels).unwrap();

        assert_eq!(contracted.num_nodes(), 3);
        assert_eq!(contracted.num_arcs(), 2);
        assert_eq!(contracted.link_iter(2).count(), 0);

        let up = contracted.link_iter(1).next().unwrap();
        assert_eq!(up.head, 2);
        assert_eq!(up.weight, 3.0);
        assert_eq!(up.direction, Some(true));
        assert_eq!(up.through, NO_VERTEX);
    }

    #[test]
    fn persistence_roundtrip() {
        let (graph, levels) = two_level_hierarchy();
        let contracted = ContractedGraph::from_directed(&graph, &levels).unwrap();

        let dir = std::env::temp_dir().join("contraction_router_test_ch");
        contracted.deconstruct_to(&dir).unwrap();
        let restored = ContractedGraph::reconstruct_from(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(restored.num_nodes(), contracted.num_nodes());
        assert_eq!(restored.num_arcs(), contracted.num_arcs());
        assert_eq!(restored.level(2), 2);
        let links: Vec<_> = restored.link_iter(0).collect();
        assert_eq!(links, contracted.link_iter(0).collect::<Vec<_>>());
    }
}

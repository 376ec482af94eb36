//! The edge-based source graph built from map data.
//!
//! Stored as adjacency arrays on `HugeArray` tables. Every undirected edge
//! appears in the adjacency of both endpoints, the half stored at the `to`
//! endpoint carries the `inverted` flag so enumeration can recover the
//! canonical orientation (and with it the meaning of a profile direction).

use super::*;
use crate::algo::Error;
use crate::datastr::huge_array::HugeArray;
use crate::io::{Deconstruct, Loader, Reconstruct, Store};
use std::io::Result;

/// One edge of the source graph in canonical orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseEdge {
    pub from: NodeId,
    pub to: NodeId,
    /// Geometric length in meters, must be finite and non-negative.
    pub distance: f32,
    /// Id of the routing profile governing speed and access on this edge.
    pub profile: u16,
}

/// One half of an edge as seen from a fixed endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseLink {
    pub neighbour: NodeId,
    pub edge: EdgeId,
    pub distance: f32,
    pub profile: u16,
    /// True when this half is stored at the canonical `to` endpoint.
    pub inverted: bool,
}

/// Adjacency array based graph over the raw map edges.
#[derive(Debug)]
pub struct BaseGraph {
    first_out: HugeArray<EdgeId>,
    neighbour: HugeArray<NodeId>,
    edge: HugeArray<EdgeId>,
    inverted: HugeArray<u8>,
    distance: HugeArray<f32>,
    profile: HugeArray<u16>,
}

impl BaseGraph {
    /// Build the adjacency arrays from a list of canonical edges.
    ///
    /// Edge ids are assigned by input order. Self loops are dropped, they can
    /// never be part of a shortest path here. Non-finite or negative
    /// distances and out of range endpoints are rejected.
    pub fn from_edges(num_nodes: usize, edges: &[BaseEdge]) -> std::result::Result<BaseGraph, Error> {
        for edge in edges {
            if (edge.from as usize) >= num_nodes || (edge.to as usize) >= num_nodes {
                return Err(Error::CorruptGraphData("edge endpoint out of range"));
            }
            if !edge.distance.is_finite() || edge.distance < 0.0 {
                return Err(Error::CorruptGraphData("edge distance not finite and non-negative"));
            }
        }

        let mut degrees = vec![0u32; num_nodes];
        for edge in edges {
            if edge.from == edge.to {
                continue;
            }
            degrees[edge.from as usize] += 1;
            degrees[edge.to as usize] += 1;
        }

        let mut first_out = HugeArray::<EdgeId>::new(num_nodes + 1)?;
        let mut prefix = 0;
        for (node, &degree) in degrees.iter().enumerate() {
            first_out.set(node, prefix);
            prefix += degree;
        }
        first_out.set(num_nodes, prefix);

        let num_halves = prefix as usize;
        let mut neighbour = HugeArray::<NodeId>::new(num_halves)?;
        let mut edge_ids = HugeArray::<EdgeId>::new(num_halves)?;
        let mut inverted = HugeArray::<u8>::new(num_halves)?;
        let mut distance = HugeArray::<f32>::new(num_halves)?;
        let mut profile = HugeArray::<u16>::new(num_halves)?;

        let mut next_slot: Vec<u32> = (0..num_nodes).map(|node| first_out.get(node)).collect();
        for (id, e) in edges.iter().enumerate() {
            if e.from == e.to {
                continue;
            }
            for &(at, neigh, inv) in &[(e.from, e.to, 0u8), (e.to, e.from, 1u8)] {
                let slot = next_slot[at as usize] as usize;
                next_slot[at as usize] += 1;
                neighbour.set(slot, neigh);
                edge_ids.set(slot, id as EdgeId);
                inverted.set(slot, inv);
                distance.set(slot, e.distance);
                profile.set(slot, e.profile);
            }
        }

        Ok(BaseGraph {
            first_out,
            neighbour,
            edge: edge_ids,
            inverted,
            distance,
            profile,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.first_out.len() - 1
    }

    /// Number of stored edge halves, twice the number of surviving edges.
    pub fn num_halves(&self) -> usize {
        self.neighbour.len()
    }

    pub fn degree(&self, node: NodeId) -> usize {
        let range = self.half_range(node);
        range.end - range.start
    }

    fn half_range(&self, node: NodeId) -> std::ops::Range<usize> {
        self.first_out.get(node as usize) as usize..self.first_out.get(node as usize + 1) as usize
    }

    /// Iterate over the edge halves stored at `node`.
    pub fn link_iter(&self, node: NodeId) -> impl Iterator<Item = BaseLink> + '_ {
        self.half_range(node).map(move |slot| BaseLink {
            neighbour: self.neighbour.get(slot),
            edge: self.edge.get(slot),
            distance: self.distance.get(slot),
            profile: self.profile.get(slot),
            inverted: self.inverted.get(slot) != 0,
        })
    }
}

impl Deconstruct for BaseGraph {
    fn store_each(&self, store: &dyn Fn(&str, &dyn Store) -> Result<()>) -> Result<()> {
        store("first_out", &self.first_out)?;
        store("neighbour", &self.neighbour)?;
        store("edge", &self.edge)?;
        store("inverted", &self.inverted)?;
        store("distance", &self.distance)?;
        store("profile", &self.profile)?;
        Ok(())
    }
}

impl Reconstruct for BaseGraph {
    fn reconstruct_with(loader: Loader) -> Result<Self> {
        Ok(BaseGraph {
            first_out: loader.load("first_out")?,
            neighbour: loader.load("neighbour")?,
            edge: loader.load("edge")?,
            inverted: loader.load("inverted")?,
            distance: loader.load("distance")?,
            profile: loader.load("profile")?,
        })
    }
}

//! Bounded witness searches deciding whether a shortcut is needed.
//!
//! A witness is a path between two neighbours of the vertex under
//! contraction which avoids that vertex and is no longer than the candidate
//! shortcut. The search is a Dijkstra bounded in settled vertices, hops and
//! weight. Running out of budget counts as no witness found, the resulting
//! superfluous shortcut costs space, never correctness.

use super::State;
use crate::datastr::graph::*;
use crate::datastr::index_heap::{IndexdMinHeap, Indexing};
use crate::datastr::timestamped_vector::TimestampedVector;
use crate::util::NonNan;

/// Search budget of a witness calculation.
#[derive(Debug, Clone, Copy)]
pub struct WitnessConfig {
    pub hop_limit: u32,
    pub max_settles: usize,
}

/// Reusable state for repeated witness searches.
#[derive(Debug)]
pub struct WitnessCalculator {
    config: WitnessConfig,
    distances: TimestampedVector<Weight>,
    hops: TimestampedVector<u32>,
    queue: IndexdMinHeap<State>,
}

impl WitnessCalculator {
    pub fn new(num_nodes: usize, config: WitnessConfig) -> WitnessCalculator {
        WitnessCalculator {
            config,
            distances: TimestampedVector::new(num_nodes, INFINITY),
            hops: TimestampedVector::new(num_nodes, 0),
            queue: IndexdMinHeap::new(num_nodes),
        }
    }

    /// Is there a path `from -> to` of weight at most `max_weight` which
    /// does not touch `skip`?
    pub fn has_witness(&mut self, graph: &DirectedGraph, from: NodeId, to: NodeId, skip: NodeId, max_weight: Weight) -> bool {
        self.distances.reset();
        self.hops.reset();
        self.queue.clear();

        self.distances.set(from as usize, 0.0);
        self.queue.push(State {
            key: NonNan::new(0.0).unwrap(),
            node: from,
        });

        let mut settled = 0;

        while let Some(State { key, node }) = self.queue.pop() {
            let distance = key.value();
            if distance > max_weight {
                break;
            }
            if node == to {
                return true;
            }

            settled += 1;
            if settled >= self.config.max_settles {
                break;
            }

            let hop = self.hops[node as usize];
            if hop >= self.config.hop_limit {
                continue;
            }

            for edge in graph.edges(node) {
                if !edge.is_outgoing() || edge.head == skip {
                    continue;
                }
                let next = distance + edge.weight;
                if next > max_weight {
                    continue;
                }
                if next < self.distances[edge.head as usize] {
                    self.distances.set(edge.head as usize, next);
                    self.hops.set(edge.head as usize, hop + 1);

                    let state = State {
                        key: NonNan::new(next).unwrap(),
                        node: edge.head,
                    };
                    if self.queue.contains_index(state.as_index()) {
                        self.queue.decrease_key(state);
                    } else {
                        self.queue.push(state);
                    }
                }
            }
        }

        self.distances[to as usize] <= max_weight
    }
}

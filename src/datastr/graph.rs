//! Graph representations and the types shared between them.
//!
//! Three graphs appear over the lifetime of a build: the edge-based
//! `BaseGraph` holding raw map geometry attributes, the mutable adjacency
//! list `DirectedGraph` the contraction works on, and the static
//! `ContractedGraph` queries run against.

pub mod base;
pub mod contracted;
pub mod directed;

pub use base::{BaseEdge, BaseGraph};
pub use contracted::{ContractedGraph, ContractedLink};
pub use directed::{DirectedEdge, DirectedGraph, ShortcutInsertion};

/// Node ids are unsigned 32 bit integers
pub type NodeId = u32;
/// Edge ids are unsigned 32 bit integers
pub type EdgeId = u32;
/// Edge weights are 32 bit floats
pub type Weight = f32;
/// The weight of an unreachable node
pub const INFINITY: Weight = f32::INFINITY;

/// Sentinel for the absence of an edge id.
pub const NO_EDGE: EdgeId = 0xFFFF_FFFF;
/// Sentinel for the absence of a node id, distinct from `NO_EDGE` so the two
/// never get confused in persisted tables.
pub const NO_VERTEX: NodeId = 0xFFFF_FFFE;

/// The weight and directional use of an edge under one routing profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factor {
    /// Multiplier applied to the edge distance, zero marks the edge unusable.
    pub value: f32,
    /// 0 for bidirectional use, 1 for forward only, 2 for backward only.
    pub direction: u8,
}

/// Translate a factor direction code into the relative form edges carry:
/// `None` both ways, `Some(true)` tail to head only, `Some(false)` head to
/// tail only. Unknown codes fall back to bidirectional.
pub fn direction_to_relative(direction: u8) -> Option<bool> {
    match direction {
        1 => Some(true),
        2 => Some(false),
        _ => None,
    }
}

/// Inverse of `direction_to_relative`, used when edges get persisted.
pub fn relative_to_direction(relative: Option<bool>) -> u8 {
    match relative {
        None => 0,
        Some(true) => 1,
        Some(false) => 2,
    }
}

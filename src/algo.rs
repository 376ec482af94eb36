//! Routing algorithms and the preprocessing that enables them.

use thiserror::Error;

pub mod builder;
pub mod contraction;
pub mod dijkstra;
pub mod matrix;

/// Which side of a matrix request a point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSide {
    Source,
    Target,
}

impl std::fmt::Display for PointSide {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PointSide::Source => write!(f, "source"),
            PointSide::Target => write!(f, "target"),
        }
    }
}

/// Errors shared by preprocessing and queries.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported element type of width {width} bytes")]
    UnsupportedElementType { width: usize },
    #[error("corrupt graph data: {0}")]
    CorruptGraphData(&'static str),
    #[error("{side} point {index} could not be resolved to any usable edge")]
    UnresolvablePoint { side: PointSide, index: usize },
}

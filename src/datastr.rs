//! Data structures used by algorithms.

pub mod graph;
pub mod huge_array;
pub mod index_heap;
pub mod timestamped_vector;

//! A contraction hierarchy engine for large road networks.
//!
//! The crate turns an undirected, profile-tagged base graph into a directed
//! weighted graph, contracts it into a multi-level shortcut hierarchy and
//! answers batched many-to-many queries against the contracted result.
//! All large tables are backed by a growable off-heap array substrate so
//! continental-scale graphs stay out of the ordinary allocator's bookkeeping.

#[macro_use]
pub mod report;

pub mod algo;
pub mod datastr;
pub mod io;
pub mod util;

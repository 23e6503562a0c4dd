//! Mesh topology for meshcrate
//!
//! This crate builds the adjacency tables of a triangle mesh and the
//! topology decisions derived from them:
//! - Vertex/edge/face adjacency from a flat index buffer
//! - Hard edge classification by dihedral angle or smoothing masks
//! - Per-vertex smoothing groups (the "cylinder problem")
//! - Vertex splitting across hard edges

pub mod adjacency;
pub mod hard_edges;
pub mod smoothing;
pub mod split;

pub use adjacency::*;
pub use hard_edges::*;
pub use smoothing::*;
pub use split::*;

//! Mesh building for meshcrate
//!
//! This crate turns raw per-corner attribute streams into render-ready
//! buffers:
//! - Vertex deduplication with per-attribute thresholds
//! - Per-material section tables and degenerate triangle removal
//! - The full build pipeline from topology to compacted output

pub mod dedup;
pub mod pipeline;

pub use dedup::*;
pub use pipeline::*;

use meshcrate_core::{MeshInput, MeshOutput, Result};

/// Turn a raw mesh into compacted vertex and index buffers
pub trait MeshProcessor {
    /// Process `mesh`, returning the compacted buffers and any warnings
    fn process(&self, mesh: &MeshInput) -> Result<MeshOutput>;
}

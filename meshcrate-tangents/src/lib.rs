//! Tangent-space reconstruction for meshcrate
//!
//! This crate derives per-corner normals, tangents and binormal signs:
//! - Flat normals and per-face tangent bases from positions and UVs
//! - Smoothing-group averaging of those bases at each vertex
//! - Equal, area or corner-angle weighted normal contributions

pub mod basis;
pub mod synthesizer;

pub use basis::*;
pub use synthesizer::*;

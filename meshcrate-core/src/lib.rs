//! Core data structures and settings for meshcrate
//!
//! This crate provides the fundamental types shared by the mesh build
//! pipeline: math aliases, arena ids, the plain input/output mesh records,
//! build settings, warnings and the error type.

pub mod point;
pub mod ids;
pub mod mesh;
pub mod settings;
pub mod warning;
pub mod parallel;
pub mod error;

pub use point::*;
pub use ids::*;
pub use mesh::*;
pub use settings::*;
pub use warning::*;
pub use parallel::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector2, Vector3, Vector4, Matrix2, Matrix3};

/// Maximum number of UV channels a mesh may carry
pub const MAX_UV_CHANNELS: usize = 8;

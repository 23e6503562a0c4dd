//! # meshcrate
//!
//! Mesh topology, tangent-space reconstruction and vertex buffer building
//! for Rust.
//!
//! This is the umbrella crate that provides convenient access to all meshcrate
//! functionality. You can use this crate to get everything in one place, or use
//! individual crates for more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Math aliases, arena ids, mesh records, settings and warnings
//! - **Topology**: Adjacency, hard edges, smoothing groups and vertex splitting
//! - **Tangents**: Flat normals, face bases and per-corner frame synthesis
//! - **Build**: Vertex welding, section tables and the full build pipeline
//!
//! ## Quick Start
//!
//! ```rust
//! use meshcrate::prelude::*;
//!
//! let quad = MeshInput::from_triangles(
//!     vec![
//!         Point3f::new(0.0, 0.0, 0.0),
//!         Point3f::new(1.0, 0.0, 0.0),
//!         Point3f::new(1.0, 1.0, 0.0),
//!         Point3f::new(0.0, 1.0, 0.0),
//!     ],
//!     &[[0, 1, 2], [0, 2, 3]],
//! );
//!
//! let output = MeshBuilder::new(BuildSettings::recompute_all())
//!     .build(&quad)
//!     .unwrap();
//! assert_eq!(output.vertex_count(), 4);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables topology, tangents and build
//! - `topology`: Adjacency and hard edge handling
//! - `tangents`: Normal and tangent synthesis (implies `topology`)
//! - `build`: The build pipeline (implies `tangents`)
//! - `all`: Enables all features

// Re-export core functionality
pub use meshcrate_core::*;

// Re-export sub-crates
#[cfg(feature = "topology")]
pub use meshcrate_topology as topology;

#[cfg(feature = "tangents")]
pub use meshcrate_tangents as tangents;

#[cfg(feature = "build")]
pub use meshcrate_build as build;

/// Convenient imports for common use cases
pub mod prelude {
    pub use meshcrate_core::*;

    #[cfg(feature = "topology")]
    pub use meshcrate_topology::*;

    #[cfg(feature = "tangents")]
    pub use meshcrate_tangents::*;

    #[cfg(feature = "build")]
    pub use meshcrate_build::*;
}

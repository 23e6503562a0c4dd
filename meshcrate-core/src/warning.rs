//! Recoverable problems reported alongside a build result

use serde::{Deserialize, Serialize};
use std::fmt;

/// A degeneracy that was recovered locally during a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildWarning {
    /// Triangles whose corners collapsed onto fewer than three vertices
    DegenerateTriangles { count: usize },
    /// Near-zero-area triangles excluded from normal contribution
    ZeroAreaTriangles { count: usize },
    /// Triangles whose UV mapping could not produce a tangent basis
    DegenerateUvBasis { count: usize },
    /// Edges shared by more than two faces
    NonManifoldEdges { count: usize },
    /// Vertices on hard edges left unsplit because of non-manifold neighbours
    UnsplittableVertices { count: usize },
    /// Corners whose averaged normal vanished and got a default
    NormalFallbacks { count: usize },
    /// Corners whose tangent vanished and got an arbitrary perpendicular
    TangentFallbacks { count: usize },
    /// A UV channel was missing and filled with zeros
    MissingUvChannel { channel: usize },
}

impl BuildWarning {
    /// Number of affected elements, where the warning counts any
    pub fn count(&self) -> Option<usize> {
        match *self {
            BuildWarning::DegenerateTriangles { count }
            | BuildWarning::ZeroAreaTriangles { count }
            | BuildWarning::DegenerateUvBasis { count }
            | BuildWarning::NonManifoldEdges { count }
            | BuildWarning::UnsplittableVertices { count }
            | BuildWarning::NormalFallbacks { count }
            | BuildWarning::TangentFallbacks { count } => Some(count),
            BuildWarning::MissingUvChannel { .. } => None,
        }
    }
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::DegenerateTriangles { count } => {
                write!(f, "{} triangles degenerate", count)
            }
            BuildWarning::ZeroAreaTriangles { count } => {
                write!(f, "{} triangles have near-zero area and were excluded from normals", count)
            }
            BuildWarning::DegenerateUvBasis { count } => {
                write!(f, "{} triangles have a degenerate UV mapping", count)
            }
            BuildWarning::NonManifoldEdges { count } => {
                write!(f, "{} edges are non-manifold", count)
            }
            BuildWarning::UnsplittableVertices { count } => {
                write!(f, "{} vertices on hard edges could not be split", count)
            }
            BuildWarning::NormalFallbacks { count } => {
                write!(f, "{} corners fell back to a default normal", count)
            }
            BuildWarning::TangentFallbacks { count } => {
                write!(f, "{} corners fell back to an arbitrary tangent", count)
            }
            BuildWarning::MissingUvChannel { channel } => {
                write!(f, "mesh has no UV channel {}, generated zeros", channel)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            BuildWarning::DegenerateTriangles { count: 3 }.to_string(),
            "3 triangles degenerate"
        );
        assert_eq!(
            BuildWarning::MissingUvChannel { channel: 0 }.to_string(),
            "mesh has no UV channel 0, generated zeros"
        );
    }

    #[test]
    fn test_count() {
        assert_eq!(BuildWarning::NonManifoldEdges { count: 2 }.count(), Some(2));
        assert_eq!(BuildWarning::MissingUvChannel { channel: 1 }.count(), None);
    }
}

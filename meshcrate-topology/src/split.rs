//! Vertex splitting along hard edges
//!
//! After classification, a vertex whose fan falls into several smoothing
//! groups is duplicated once per extra group. Corners of faces in the
//! extra groups are rewired to the duplicates, so later per-vertex work
//! never averages across a hard edge.

use crate::adjacency::{AdjacencyIndex, EdgeTopology};
use crate::smoothing::{SmoothGroupResolver, SmoothingGroup};
use meshcrate_core::{Error, ParallelConfig, Result, VertexId};

/// Result of splitting vertices along hard edges
#[derive(Debug, Clone, Default)]
pub struct VertexSplit {
    /// Rewired triangle indices
    pub indices: Vec<u32>,
    /// Source vertex of each appended vertex, in creation order
    pub duplicate_of: Vec<u32>,
    /// Vertices left whole because they sit on a non-manifold edge
    pub unsplittable: Vec<VertexId>,
    /// Vertex count before splitting
    pub original_vertex_count: usize,
}

impl VertexSplit {
    /// Vertex count after splitting
    pub fn vertex_count(&self) -> usize {
        self.original_vertex_count + self.duplicate_of.len()
    }

    /// Number of vertices that were added
    pub fn split_count(&self) -> usize {
        self.duplicate_of.len()
    }

    /// Grow a per-vertex attribute to cover the appended vertices
    pub fn extend_attribute<T: Clone>(&self, attribute: &mut Vec<T>) {
        attribute.reserve(self.duplicate_of.len());
        for &source in &self.duplicate_of {
            let value = attribute[source as usize].clone();
            attribute.push(value);
        }
    }
}

enum SplitDecision {
    Keep,
    Unsplittable,
    Split(Vec<SmoothingGroup>),
}

fn decide(
    adjacency: &AdjacencyIndex,
    resolver: &SmoothGroupResolver,
    vertex: VertexId,
) -> SplitDecision {
    let edges = adjacency.edges_of_vertex(vertex);
    if !edges.iter().any(|&edge| adjacency.edge(edge).hard) {
        return SplitDecision::Keep;
    }
    if edges
        .iter()
        .any(|&edge| adjacency.edge_topology(edge) == EdgeTopology::NonManifold)
    {
        return SplitDecision::Unsplittable;
    }

    let groups = resolver.resolve(adjacency, vertex);
    if groups.len() > 1 {
        SplitDecision::Split(groups)
    } else {
        SplitDecision::Keep
    }
}

/// Duplicate every vertex that touches a hard edge once per extra smoothing group
///
/// The first group keeps the original vertex. Appended vertices are
/// numbered in ascending order of source vertex, then group.
pub fn split_hard_vertices(
    adjacency: &AdjacencyIndex,
    indices: &[u32],
    resolver: &SmoothGroupResolver,
    parallel: &ParallelConfig,
) -> Result<VertexSplit> {
    if indices.len() != adjacency.face_count() * 3 {
        return Err(Error::InvalidInput(format!(
            "Index buffer has {} entries but the adjacency index holds {} faces",
            indices.len(),
            adjacency.face_count()
        )));
    }

    let vertex_count = adjacency.vertex_count();
    let decisions = parallel.map_range(vertex_count, |v| {
        decide(adjacency, resolver, VertexId::from(v))
    });

    let mut split = VertexSplit {
        indices: indices.to_vec(),
        duplicate_of: Vec::new(),
        unsplittable: Vec::new(),
        original_vertex_count: vertex_count,
    };

    for (v, decision) in decisions.into_iter().enumerate() {
        let vertex = VertexId::from(v);
        let groups = match decision {
            SplitDecision::Keep => continue,
            SplitDecision::Unsplittable => {
                log::trace!("{} touches a non-manifold edge, left whole", vertex);
                split.unsplittable.push(vertex);
                continue;
            }
            SplitDecision::Split(groups) => groups,
        };

        for group in groups.iter().skip(1) {
            let duplicate = split.vertex_count() as u32;
            split.duplicate_of.push(vertex.0);
            for &face in group {
                for slot in adjacency.slots_of_vertex(face, vertex) {
                    split.indices[face.index() * 3 + slot] = duplicate;
                }
            }
        }
    }

    log::debug!(
        "Split {} vertices into {} ({} unsplittable)",
        vertex_count,
        split.vertex_count(),
        split.unsplittable.len()
    );
    Ok(split)
}

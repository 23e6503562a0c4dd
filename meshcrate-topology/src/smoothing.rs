//! Per-vertex smoothing groups
//!
//! A vertex touched by faces that are only connected through hard edges
//! needs one averaged normal per soft-connected cluster, not one global
//! average (the "cylinder problem"). The resolver partitions the faces
//! around a vertex into those clusters.

use crate::adjacency::AdjacencyIndex;
use meshcrate_core::{EdgeId, FaceId, ParallelConfig, VertexId};

/// Faces around one vertex that share averaged attributes
pub type SmoothingGroup = Vec<FaceId>;

/// A soft edge between two faces of the local fan, by local index
#[derive(Debug, Clone, Copy)]
struct SoftLink {
    a: usize,
    b: usize,
    edge: EdgeId,
}

/// Partition the faces around each vertex into smoothing groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothGroupResolver {
    /// Split a closed fan that a single hard edge failed to separate
    pub split_cylinder_seams: bool,
}

impl Default for SmoothGroupResolver {
    fn default() -> Self {
        Self {
            split_cylinder_seams: true,
        }
    }
}

impl SmoothGroupResolver {
    pub fn new(split_cylinder_seams: bool) -> Self {
        Self {
            split_cylinder_seams,
        }
    }

    /// Smoothing groups at `vertex`
    ///
    /// Groups are ordered by their lowest face id and each group lists its
    /// faces in ascending order, so the first group always contains the
    /// vertex's lowest face.
    pub fn resolve(&self, adjacency: &AdjacencyIndex, vertex: VertexId) -> Vec<SmoothingGroup> {
        let faces = adjacency.faces_of_vertex(vertex);
        if faces.len() <= 1 {
            return faces.iter().map(|&face| vec![face]).collect();
        }

        let links = soft_links(adjacency, vertex, faces);
        let groups = flood_groups(faces, &links, None);

        if groups.len() == 1 && self.split_cylinder_seams {
            if let Some(seam) = second_sharpest_edge(adjacency, vertex, &links) {
                let split = flood_groups(faces, &links, Some(seam));
                if split.len() == 2 {
                    log::trace!("Split closed fan at {} along {}", vertex, seam);
                    return split;
                }
            }
        }

        groups
    }

    /// Smoothing groups for every vertex, computed in parallel
    pub fn resolve_all(
        &self,
        adjacency: &AdjacencyIndex,
        parallel: &ParallelConfig,
    ) -> Vec<Vec<SmoothingGroup>> {
        parallel.map_range(adjacency.vertex_count(), |v| {
            self.resolve(adjacency, VertexId::from(v))
        })
    }
}

/// Index of the group containing `face`
pub fn group_of(groups: &[SmoothingGroup], face: FaceId) -> Option<usize> {
    groups
        .iter()
        .position(|group| group.binary_search(&face).is_ok())
}

fn soft_links(adjacency: &AdjacencyIndex, vertex: VertexId, faces: &[FaceId]) -> Vec<SoftLink> {
    adjacency
        .edges_of_vertex(vertex)
        .iter()
        .filter_map(|&edge| {
            let (fa, fb) = adjacency.soft_pair(edge)?;
            let a = faces.binary_search(&fa).ok()?;
            let b = faces.binary_search(&fb).ok()?;
            Some(SoftLink { a, b, edge })
        })
        .collect()
}

/// Connected components of the local fan under soft links, skipping `cut`
fn flood_groups(faces: &[FaceId], links: &[SoftLink], cut: Option<EdgeId>) -> Vec<SmoothingGroup> {
    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); faces.len()];
    for link in links.iter().filter(|link| Some(link.edge) != cut) {
        neighbours[link.a].push(link.b);
        neighbours[link.b].push(link.a);
    }

    let mut visited = vec![false; faces.len()];
    let mut groups = Vec::new();
    let mut queue = Vec::new();
    for seed in 0..faces.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        queue.push(seed);

        let mut group = Vec::new();
        while let Some(local) = queue.pop() {
            group.push(faces[local]);
            for &next in &neighbours[local] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push(next);
                }
            }
        }
        group.sort_unstable();
        groups.push(group);
    }
    groups
}

/// The second sharpest edge of a fan that has a hard edge but stayed in one piece
///
/// The hard edge is the sharpest, so this is the sharpest soft edge of the
/// fan. Ties go to the lowest edge id.
fn second_sharpest_edge(
    adjacency: &AdjacencyIndex,
    vertex: VertexId,
    links: &[SoftLink],
) -> Option<EdgeId> {
    let has_hard_interior = adjacency
        .edges_of_vertex(vertex)
        .iter()
        .any(|&edge| adjacency.edge(edge).hard && adjacency.find_adjacent_faces(edge).pair().is_some());
    if !has_hard_interior {
        return None;
    }

    let mut best: Option<(EdgeId, f32)> = None;
    for link in links {
        let sharpness = adjacency.edge(link.edge).crease_sharpness;
        match best {
            Some((edge, best_sharpness))
                if sharpness < best_sharpness
                    || (sharpness == best_sharpness && edge < link.edge) => {}
            _ => best = Some((link.edge, sharpness)),
        }
    }
    best.map(|(edge, _)| edge)
}

//! Vertex, edge and face adjacency
//!
//! Builds O(1)-amortized adjacency queries from a flat triangle index buffer.
//! Edges are created lazily the first time a triangle needs them and are
//! looked up by their sorted vertex pair, so there is exactly one edge per
//! unordered vertex pair.

use itertools::Itertools;
use meshcrate_core::{EdgeId, Error, FaceId, Result, VertexId};
use std::collections::HashMap;

/// An unordered vertex pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Endpoints, lower id first
    pub vertices: [VertexId; 2],
    /// Normals are not blended across a hard edge
    pub hard: bool,
    /// Dihedral angle normalized to [0, 1]; 1 for boundary and non-manifold edges
    pub crease_sharpness: f32,
}

impl Edge {
    /// Whether `vertex` is one of the endpoints
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices[0] == vertex || self.vertices[1] == vertex
    }

    /// The endpoint that is not `vertex`
    pub fn other(&self, vertex: VertexId) -> VertexId {
        if self.vertices[0] == vertex {
            self.vertices[1]
        } else {
            self.vertices[0]
        }
    }
}

/// How many faces meet at an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTopology {
    /// One adjacent face
    Boundary,
    /// Exactly two adjacent faces
    Manifold,
    /// More than two adjacent faces
    NonManifold,
}

/// Result of an adjacent-face query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacentFaces {
    /// Up to two of the faces found
    pub faces: [Option<FaceId>; 2],
    /// False when the edge has more than two faces
    pub manifold: bool,
}

impl AdjacentFaces {
    /// Both faces of a manifold interior edge
    pub fn pair(&self) -> Option<(FaceId, FaceId)> {
        match self.faces {
            [Some(a), Some(b)] if self.manifold => Some((a, b)),
            _ => None,
        }
    }
}

/// Adjacency tables for a triangle mesh
///
/// Derived and transient: rebuild it whenever the index buffer changes.
#[derive(Debug, Clone)]
pub struct AdjacencyIndex {
    vertex_count: usize,
    face_vertices: Vec<[VertexId; 3]>,
    /// Edge starting at each corner slot; `None` for repeated vertices
    face_edges: Vec<[Option<EdgeId>; 3]>,
    edges: Vec<Edge>,
    edge_lookup: HashMap<(VertexId, VertexId), EdgeId>,
    vertex_faces: Vec<Vec<FaceId>>,
    vertex_edges: Vec<Vec<EdgeId>>,
    edge_faces: Vec<Vec<FaceId>>,
}

fn push_unique<T: PartialEq + Copy>(list: &mut Vec<T>, item: T) {
    if list.last() != Some(&item) {
        list.push(item);
    }
}

impl AdjacencyIndex {
    /// Build adjacency for `indices` referencing `vertex_count` vertices
    pub fn build(indices: &[u32], vertex_count: usize) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidInput(format!(
                "Index buffer length {} is not divisible by 3",
                indices.len()
            )));
        }

        let face_count = indices.len() / 3;
        let mut index = Self {
            vertex_count,
            face_vertices: Vec::with_capacity(face_count),
            face_edges: Vec::with_capacity(face_count),
            edges: Vec::with_capacity(face_count * 3 / 2),
            edge_lookup: HashMap::with_capacity(face_count * 3 / 2),
            vertex_faces: vec![Vec::new(); vertex_count],
            vertex_edges: vec![Vec::new(); vertex_count],
            edge_faces: Vec::with_capacity(face_count * 3 / 2),
        };

        for (fi, triangle) in indices.chunks_exact(3).enumerate() {
            let face = FaceId::from(fi);
            let vertices = [
                VertexId(triangle[0]),
                VertexId(triangle[1]),
                VertexId(triangle[2]),
            ];

            for &vertex in &vertices {
                if vertex.index() >= vertex_count {
                    return Err(Error::InvalidInput(format!(
                        "Face {} references {} but the mesh has {} vertices",
                        face, vertex, vertex_count
                    )));
                }
                push_unique(&mut index.vertex_faces[vertex.index()], face);
            }

            let mut face_edges = [None; 3];
            for (slot, (&a, &b)) in vertices.iter().circular_tuple_windows().enumerate() {
                if a == b {
                    continue;
                }
                let edge = index.find_or_create_edge(a, b);
                push_unique(&mut index.edge_faces[edge.index()], face);
                if !face_edges.contains(&Some(edge)) {
                    face_edges[slot] = Some(edge);
                }
            }

            index.face_vertices.push(vertices);
            index.face_edges.push(face_edges);
        }

        Ok(index)
    }

    fn find_or_create_edge(&mut self, a: VertexId, b: VertexId) -> EdgeId {
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&edge) = self.edge_lookup.get(&key) {
            return edge;
        }

        let edge = EdgeId::from(self.edges.len());
        self.edges.push(Edge {
            vertices: [key.0, key.1],
            hard: false,
            crease_sharpness: 0.0,
        });
        self.edge_faces.push(Vec::new());
        self.vertex_edges[key.0.index()].push(edge);
        self.vertex_edges[key.1.index()].push(edge);
        self.edge_lookup.insert(key, edge);
        edge
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn face_count(&self) -> usize {
        self.face_vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, edge: EdgeId) -> &Edge {
        &self.edges[edge.index()]
    }

    /// Mark an edge hard or soft
    pub fn set_hard(&mut self, edge: EdgeId, hard: bool) {
        self.edges[edge.index()].hard = hard;
    }

    pub fn set_crease_sharpness(&mut self, edge: EdgeId, sharpness: f32) {
        self.edges[edge.index()].crease_sharpness = sharpness;
    }

    /// The three vertices of a face, in winding order
    pub fn face_vertices(&self, face: FaceId) -> [VertexId; 3] {
        self.face_vertices[face.index()]
    }

    /// The distinct edges of a face
    pub fn face_edges(&self, face: FaceId) -> impl Iterator<Item = EdgeId> + '_ {
        self.face_edges[face.index()].iter().flatten().copied()
    }

    /// Slots of `face` that reference `vertex`
    pub fn slots_of_vertex(&self, face: FaceId, vertex: VertexId) -> impl Iterator<Item = usize> + '_ {
        self.face_vertices[face.index()]
            .iter()
            .positions(move |&v| v == vertex)
    }

    /// Faces touching a vertex, in ascending order
    pub fn faces_of_vertex(&self, vertex: VertexId) -> &[FaceId] {
        &self.vertex_faces[vertex.index()]
    }

    pub fn edges_of_vertex(&self, vertex: VertexId) -> &[EdgeId] {
        &self.vertex_edges[vertex.index()]
    }

    /// Every face using an edge, in ascending order
    pub fn faces_of_edge(&self, edge: EdgeId) -> &[FaceId] {
        &self.edge_faces[edge.index()]
    }

    /// Look up the edge joining two vertices
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        let key = if a < b { (a, b) } else { (b, a) };
        self.edge_lookup.get(&key).copied()
    }

    /// The (up to two) faces sharing an edge
    ///
    /// Non-manifold edges report `manifold = false` together with the first
    /// two faces found; callers must tolerate the incomplete answer.
    pub fn find_adjacent_faces(&self, edge: EdgeId) -> AdjacentFaces {
        let faces = &self.edge_faces[edge.index()];
        AdjacentFaces {
            faces: [faces.first().copied(), faces.get(1).copied()],
            manifold: faces.len() <= 2,
        }
    }

    pub fn edge_topology(&self, edge: EdgeId) -> EdgeTopology {
        match self.edge_faces[edge.index()].len() {
            0 | 1 => EdgeTopology::Boundary,
            2 => EdgeTopology::Manifold,
            _ => EdgeTopology::NonManifold,
        }
    }

    /// The face pair of a soft manifold edge, across which normals blend
    pub fn soft_pair(&self, edge: EdgeId) -> Option<(FaceId, FaceId)> {
        if self.edges[edge.index()].hard {
            return None;
        }
        self.find_adjacent_faces(edge).pair()
    }

    /// Edges currently marked hard
    pub fn hard_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .positions(|edge| edge.hard)
            .map(EdgeId::from)
    }

    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_faces.iter().filter(|faces| faces.len() > 2).count()
    }

    pub fn boundary_edge_count(&self) -> usize {
        self.edge_faces.iter().filter(|faces| faces.len() < 2).count()
    }

    /// True when every edge has exactly two faces
    pub fn is_closed_manifold(&self) -> bool {
        !self.edge_faces.is_empty() && self.edge_faces.iter().all(|faces| faces.len() == 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_single_triangle() -> Vec<u32> {
        vec![0, 1, 2]
    }

    fn make_cube() -> Vec<u32> {
        vec![
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4, // front
            3, 7, 6, 3, 6, 2, // back
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ]
    }

    fn make_fin() -> Vec<u32> {
        // Three triangles hinged on edge (0, 1)
        vec![0, 1, 2, 1, 0, 3, 0, 1, 4]
    }

    #[test]
    fn test_single_triangle() {
        let adjacency = AdjacencyIndex::build(&make_single_triangle(), 3).unwrap();
        assert_eq!(adjacency.face_count(), 1);
        assert_eq!(adjacency.edge_count(), 3);
        assert_eq!(adjacency.boundary_edge_count(), 3);
        assert!(!adjacency.is_closed_manifold());
        for v in 0..3 {
            assert_eq!(adjacency.faces_of_vertex(VertexId(v)), &[FaceId(0)]);
            assert_eq!(adjacency.edges_of_vertex(VertexId(v)).len(), 2);
        }
    }

    #[test]
    fn test_cube_is_closed_manifold() {
        let adjacency = AdjacencyIndex::build(&make_cube(), 8).unwrap();
        assert_eq!(adjacency.face_count(), 12);
        assert_eq!(adjacency.edge_count(), 18);
        assert!(adjacency.is_closed_manifold());
        for e in 0..adjacency.edge_count() {
            let edge = EdgeId::from(e);
            assert_eq!(adjacency.faces_of_edge(edge).len(), 2);
            assert_eq!(adjacency.edge_topology(edge), EdgeTopology::Manifold);
            assert!(adjacency.find_adjacent_faces(edge).pair().is_some());
        }
    }

    #[test]
    fn test_adjacency_symmetry() {
        let adjacency = AdjacencyIndex::build(&make_cube(), 8).unwrap();
        for f in 0..adjacency.face_count() {
            let face = FaceId::from(f);
            assert_eq!(adjacency.face_edges(face).count(), 3);
            for edge in adjacency.face_edges(face) {
                assert!(adjacency.faces_of_edge(edge).contains(&face));
                for vertex in adjacency.edge(edge).vertices {
                    assert!(adjacency.edges_of_vertex(vertex).contains(&edge));
                }
            }
            for vertex in adjacency.face_vertices(face) {
                assert!(adjacency.faces_of_vertex(vertex).contains(&face));
            }
        }
    }

    #[test]
    fn test_one_edge_per_vertex_pair() {
        let adjacency = AdjacencyIndex::build(&make_cube(), 8).unwrap();
        let a = adjacency.find_edge(VertexId(0), VertexId(2)).unwrap();
        let b = adjacency.find_edge(VertexId(2), VertexId(0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(adjacency.edge(a).vertices, [VertexId(0), VertexId(2)]);
        assert!(adjacency.find_edge(VertexId(0), VertexId(6)).is_none());
    }

    #[test]
    fn test_non_manifold_edge() {
        let adjacency = AdjacencyIndex::build(&make_fin(), 5).unwrap();
        let hinge = adjacency.find_edge(VertexId(0), VertexId(1)).unwrap();
        assert_eq!(adjacency.edge_topology(hinge), EdgeTopology::NonManifold);
        assert_eq!(adjacency.non_manifold_edge_count(), 1);

        let adjacent = adjacency.find_adjacent_faces(hinge);
        assert!(!adjacent.manifold);
        assert_eq!(adjacent.faces, [Some(FaceId(0)), Some(FaceId(1))]);
        assert!(adjacent.pair().is_none());
        assert!(adjacency.soft_pair(hinge).is_none());
    }

    #[test]
    fn test_repeated_vertex_face() {
        let adjacency = AdjacencyIndex::build(&[0, 0, 1], 2).unwrap();
        assert_eq!(adjacency.edge_count(), 1);
        assert_eq!(adjacency.face_edges(FaceId(0)).count(), 1);
        assert_eq!(adjacency.faces_of_vertex(VertexId(0)), &[FaceId(0)]);
        assert_eq!(adjacency.slots_of_vertex(FaceId(0), VertexId(0)).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_malformed_input() {
        assert!(AdjacencyIndex::build(&[0, 1], 3).is_err());
        assert!(AdjacencyIndex::build(&[0, 1, 5], 3).is_err());
    }

    #[test]
    fn test_hard_flags() {
        let mut adjacency = AdjacencyIndex::build(&make_cube(), 8).unwrap();
        let edge = adjacency.find_edge(VertexId(0), VertexId(1)).unwrap();
        adjacency.set_hard(edge, true);
        assert_eq!(adjacency.hard_edges().collect::<Vec<_>>(), vec![edge]);
        assert!(adjacency.soft_pair(edge).is_none());
        assert!(adjacency.edge(edge).contains(VertexId(1)));
        assert_eq!(adjacency.edge(edge).other(VertexId(1)), VertexId(0));
    }
}

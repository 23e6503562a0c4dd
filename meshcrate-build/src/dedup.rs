//! Vertex deduplication
//!
//! Corners are sorted by a scalar key derived from their position so that
//! only a small window of neighbours in key order has to be compared. Two
//! corners that lie within the position threshold can differ in key by at
//! most that threshold, because the key weights sum to one.

use itertools::{Itertools, MinMaxResult};
use meshcrate_core::{
    AttributeStreams, ComparisonThresholds, MeshSection, ParallelConfig, Point3f, Vector3f,
};
use std::collections::BTreeMap;

/// Result of compacting per-corner streams
#[derive(Debug, Clone, Default)]
pub struct DedupOutput {
    /// Unique vertices in first-seen corner order
    pub vertices: AttributeStreams,
    pub indices: Vec<u32>,
    pub sections: Vec<MeshSection>,
    /// Triangles whose corners were not pairwise distinct after welding
    pub degenerate_triangles: usize,
    /// Corners that were merged into an earlier corner
    pub welded_corners: usize,
}

/// Collapses equal corners into a compact vertex buffer
#[derive(Debug, Clone)]
pub struct VertexDeduplicator {
    pub thresholds: ComparisonThresholds,
    /// Drop degenerate triangles instead of only counting them
    pub remove_degenerates: bool,
    pub parallel: ParallelConfig,
}

impl Default for VertexDeduplicator {
    fn default() -> Self {
        Self::new(ComparisonThresholds::default())
    }
}

/// Scalar sort key for a position
pub fn sort_key(position: &Point3f) -> f32 {
    0.30 * position.x + 0.33 * position.y + 0.37 * position.z
}

fn unit_vectors_match(a: &Vector3f, b: &Vector3f, threshold: f32) -> bool {
    a == b || 1.0 - a.dot(b) <= threshold
}

impl VertexDeduplicator {
    pub fn new(thresholds: ComparisonThresholds) -> Self {
        Self {
            thresholds,
            remove_degenerates: true,
            parallel: ParallelConfig::default(),
        }
    }

    pub fn with_remove_degenerates(mut self, remove: bool) -> Self {
        self.remove_degenerates = remove;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// Whether corners `a` and `b` of `corners` are the same vertex
    pub fn corners_equal(&self, corners: &AttributeStreams, a: usize, b: usize) -> bool {
        let t = &self.thresholds;
        let within = |x: f32, y: f32, threshold: f32| (x - y).abs() <= threshold;

        if (corners.positions[a] - corners.positions[b]).norm_squared() > t.position * t.position {
            return false;
        }
        if !unit_vectors_match(&corners.normals[a], &corners.normals[b], t.normal)
            || !unit_vectors_match(&corners.tangents[a], &corners.tangents[b], t.tangent)
            || corners.binormal_signs[a] != corners.binormal_signs[b]
        {
            return false;
        }
        let uvs_match = corners.uv_channels.iter().all(|uvs| {
            within(uvs[a].x, uvs[b].x, t.uv) && within(uvs[a].y, uvs[b].y, t.uv)
        });
        if !uvs_match {
            return false;
        }
        match &corners.colors {
            Some(colors) => colors[a]
                .iter()
                .zip(colors[b].iter())
                .all(|(&x, &y)| within(x, y, t.color)),
            None => true,
        }
    }

    /// For every corner, the other corners within the position threshold
    ///
    /// Each list is sorted ascending.
    pub fn overlapping_corners(&self, positions: &[Point3f]) -> Vec<Vec<u32>> {
        let threshold = self.thresholds.position;
        let keys: Vec<f32> = positions.iter().map(sort_key).collect();
        let mut order: Vec<u32> = (0..positions.len() as u32).collect();
        order.sort_by(|&a, &b| {
            keys[a as usize]
                .total_cmp(&keys[b as usize])
                .then(a.cmp(&b))
        });

        let forward = self.parallel.map_range(order.len(), |i| {
            let a = order[i] as usize;
            let mut found = Vec::new();
            for &b in &order[i + 1..] {
                if keys[b as usize] - keys[a] > threshold {
                    break;
                }
                if (positions[a] - positions[b as usize]).norm_squared() <= threshold * threshold {
                    found.push(b);
                }
            }
            found
        });

        let mut overlaps = vec![Vec::new(); positions.len()];
        for (i, found) in forward.into_iter().enumerate() {
            let a = order[i];
            for b in found {
                overlaps[a as usize].push(b);
                overlaps[b as usize].push(a);
            }
        }
        for list in &mut overlaps {
            list.sort_unstable();
        }
        overlaps
    }

    /// Compact per-corner streams into a vertex buffer, index buffer and sections
    ///
    /// `corners` holds one entry per index-buffer slot, three per face;
    /// `face_materials` holds one material per face, or is empty for a
    /// single material 0.
    pub fn deduplicate(&self, corners: &AttributeStreams, face_materials: &[i32]) -> DedupOutput {
        let corner_count = corners.len();
        let overlaps = self.overlapping_corners(&corners.positions);

        // First-seen remap against earlier equal corners
        let mut remap = vec![0u32; corner_count];
        let mut unique = Vec::new();
        for corner in 0..corner_count {
            let earlier = overlaps[corner]
                .iter()
                .take_while(|&&other| (other as usize) < corner)
                .find(|&&other| self.corners_equal(corners, corner, other as usize));
            remap[corner] = match earlier {
                Some(&other) => remap[other as usize],
                None => {
                    unique.push(corner);
                    (unique.len() - 1) as u32
                }
            };
        }

        let mut degenerate_triangles = 0;
        let mut faces_by_material: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for face in 0..corner_count / 3 {
            let [a, b, c] = [remap[face * 3], remap[face * 3 + 1], remap[face * 3 + 2]];
            if a == b || b == c || a == c {
                degenerate_triangles += 1;
                if self.remove_degenerates {
                    continue;
                }
            }
            let material = face_materials.get(face).copied().unwrap_or(0);
            faces_by_material.entry(material).or_default().push(face);
        }

        // Drop vertices only referenced by removed triangles, keeping first-seen order
        let mut used = vec![false; unique.len()];
        for face in faces_by_material.values().flatten() {
            for slot in 0..3 {
                used[remap[face * 3 + slot] as usize] = true;
            }
        }
        let mut compact = vec![u32::MAX; unique.len()];
        let mut vertices =
            AttributeStreams::with_capacity(unique.len(), corners.uv_channels.len(), corners.colors.is_some());
        for (vertex, &source) in unique.iter().enumerate() {
            if used[vertex] {
                compact[vertex] = vertices.len() as u32;
                vertices.push_from(corners, source);
            }
        }
        let pruned = unique.len() - vertices.len();
        if pruned > 0 {
            log::debug!("Pruned {} orphaned vertices", pruned);
        }

        let mut indices = Vec::with_capacity(corner_count);
        let mut sections = Vec::with_capacity(faces_by_material.len());
        for (material_index, faces) in faces_by_material {
            let first_index = indices.len();
            indices.extend(
                faces
                    .iter()
                    .flat_map(|&face| (0..3).map(move |slot| face * 3 + slot))
                    .map(|corner| compact[remap[corner] as usize]),
            );
            let (min_vertex_index, max_vertex_index) = match indices[first_index..].iter().minmax() {
                MinMaxResult::NoElements => continue,
                MinMaxResult::OneElement(&v) => (v, v),
                MinMaxResult::MinMax(&min, &max) => (min, max),
            };
            sections.push(MeshSection {
                material_index,
                first_index: first_index as u32,
                triangle_count: faces.len() as u32,
                min_vertex_index,
                max_vertex_index,
            });
        }

        log::debug!(
            "Welded {} corners into {} vertices, {} degenerate triangles",
            corner_count,
            vertices.len(),
            degenerate_triangles
        );

        DedupOutput {
            welded_corners: corner_count - unique.len(),
            vertices,
            indices,
            sections,
            degenerate_triangles,
        }
    }
}

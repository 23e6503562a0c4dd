//! Mesh input and output records
//!
//! `MeshInput` is the plain-data shape an importer hands to the build
//! pipeline; `MeshOutput` is the compacted, GPU-ready result.

use crate::error::{Error, Result};
use crate::point::*;
use crate::warning::BuildWarning;
use crate::MAX_UV_CHANNELS;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A triangle mesh with per-vertex positions and per-corner attributes
///
/// Positions are shared by index; every other attribute stream is laid out
/// per corner (`indices.len()` entries) so each triangle slot can carry its
/// own normal, tangent, UVs and color.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshInput {
    pub positions: Vec<Point3f>,
    pub indices: Vec<u32>,
    pub normals: Option<Vec<Vector3f>>,
    pub tangents: Option<Vec<Tangent>>,
    pub uv_channels: Vec<Vec<Uv>>,
    pub colors: Option<Vec<Vector4f>>,
    /// Material/section index per face; empty means every face uses material 0
    pub material_indices: Vec<i32>,
    /// Legacy smoothing-group bitmask per face
    pub smoothing_masks: Option<Vec<u32>>,
}

impl MeshInput {
    /// Create a mesh from positions and a flat triangle index buffer
    pub fn new(positions: Vec<Point3f>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            ..Self::default()
        }
    }

    /// Create a mesh from positions and triangle faces
    pub fn from_triangles(positions: Vec<Point3f>, faces: &[[u32; 3]]) -> Self {
        let indices = faces.iter().flatten().copied().collect();
        Self::new(positions, indices)
    }

    pub fn with_normals(mut self, normals: Vec<Vector3f>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_tangents(mut self, tangents: Vec<Tangent>) -> Self {
        self.tangents = Some(tangents);
        self
    }

    /// Append a UV channel
    pub fn with_uv_channel(mut self, uvs: Vec<Uv>) -> Self {
        self.uv_channels.push(uvs);
        self
    }

    pub fn with_colors(mut self, colors: Vec<Vector4f>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_material_indices(mut self, material_indices: Vec<i32>) -> Self {
        self.material_indices = material_indices;
        self
    }

    pub fn with_smoothing_masks(mut self, masks: Vec<u32>) -> Self {
        self.smoothing_masks = Some(masks);
        self
    }

    /// Get the number of position vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of triangles
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of corners (vertex-instances)
    pub fn corner_count(&self) -> usize {
        self.indices.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Material index of a face
    pub fn face_material(&self, face: usize) -> i32 {
        self.material_indices.get(face).copied().unwrap_or(0)
    }

    /// Check every precondition of the build pipeline
    pub fn validate(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(Error::InvalidInput(format!(
                "Index buffer length {} is not divisible by 3",
                self.indices.len()
            )));
        }

        let vertex_count = self.positions.len();
        if let Some((slot, index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, &index)| index as usize >= vertex_count)
        {
            return Err(Error::InvalidInput(format!(
                "Index {} at slot {} is out of range for {} vertices",
                index, slot, vertex_count
            )));
        }

        if let Some(i) = self
            .positions
            .iter()
            .position(|p| !p.iter().all(|c| c.is_finite()))
        {
            return Err(Error::InvalidInput(format!("Non-finite position at vertex {}", i)));
        }

        let corners = self.corner_count();
        check_len("normals", self.normals.as_ref().map(Vec::len), corners)?;
        check_len("tangents", self.tangents.as_ref().map(Vec::len), corners)?;
        check_len("colors", self.colors.as_ref().map(Vec::len), corners)?;

        if self.uv_channels.len() > MAX_UV_CHANNELS {
            return Err(Error::InvalidInput(format!(
                "{} UV channels exceed the maximum of {}",
                self.uv_channels.len(),
                MAX_UV_CHANNELS
            )));
        }
        for (channel, uvs) in self.uv_channels.iter().enumerate() {
            check_len(&format!("UV channel {}", channel), Some(uvs.len()), corners)?;
        }

        let faces = self.face_count();
        if !self.material_indices.is_empty() {
            check_len("material indices", Some(self.material_indices.len()), faces)?;
        }
        check_len(
            "smoothing masks",
            self.smoothing_masks.as_ref().map(Vec::len),
            faces,
        )?;

        Ok(())
    }
}

fn check_len(name: &str, len: Option<usize>, expected: usize) -> Result<()> {
    match len {
        Some(len) if len != expected => Err(Error::InvalidInput(format!(
            "{} count mismatch: {} entries for {} expected",
            name, len, expected
        ))),
        _ => Ok(()),
    }
}

/// Attribute streams sharing one index space (per corner or per vertex)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeStreams {
    pub positions: Vec<Point3f>,
    pub normals: Vec<Vector3f>,
    pub tangents: Vec<Vector3f>,
    pub binormal_signs: Vec<f32>,
    pub uv_channels: Vec<Vec<Uv>>,
    pub colors: Option<Vec<Vector4f>>,
}

impl AttributeStreams {
    /// Empty streams with room for `capacity` entries
    pub fn with_capacity(capacity: usize, uv_channel_count: usize, has_colors: bool) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            normals: Vec::with_capacity(capacity),
            tangents: Vec::with_capacity(capacity),
            binormal_signs: Vec::with_capacity(capacity),
            uv_channels: (0..uv_channel_count)
                .map(|_| Vec::with_capacity(capacity))
                .collect(),
            colors: has_colors.then(|| Vec::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Copy entry `index` of `source` onto the end of these streams
    pub fn push_from(&mut self, source: &AttributeStreams, index: usize) {
        self.positions.push(source.positions[index]);
        self.normals.push(source.normals[index]);
        self.tangents.push(source.tangents[index]);
        self.binormal_signs.push(source.binormal_signs[index]);
        for (channel, uvs) in self.uv_channels.iter_mut().enumerate() {
            uvs.push(source.uv_channels[channel][index]);
        }
        if let (Some(colors), Some(source_colors)) = (self.colors.as_mut(), source.colors.as_ref()) {
            colors.push(source_colors[index]);
        }
    }

    /// The attribute tuple at `index`
    pub fn get(&self, index: usize) -> Corner {
        Corner {
            position: self.positions[index],
            normal: self.normals[index],
            tangent: self.tangents[index],
            binormal_sign: self.binormal_signs[index],
            uvs: self.uv_channels.iter().map(|uvs| uvs[index]).collect(),
            color: self.colors.as_ref().map(|colors| colors[index]),
        }
    }
}

/// One fully attributed vertex-instance
#[derive(Debug, Clone, PartialEq)]
pub struct Corner {
    pub position: Point3f,
    pub normal: Vector3f,
    pub tangent: Vector3f,
    pub binormal_sign: f32,
    pub uvs: Vec<Uv>,
    pub color: Option<Vector4f>,
}

/// A contiguous index range drawn with one material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshSection {
    pub material_index: i32,
    pub first_index: u32,
    pub triangle_count: u32,
    pub min_vertex_index: u32,
    pub max_vertex_index: u32,
}

impl MeshSection {
    /// Index buffer range covered by this section
    pub fn index_range(&self) -> std::ops::Range<usize> {
        let first = self.first_index as usize;
        first..first + self.triangle_count as usize * 3
    }
}

/// Counters collected while building a mesh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub input_triangles: usize,
    pub output_triangles: usize,
    pub output_vertices: usize,
    pub degenerate_triangles: usize,
    pub split_vertices: usize,
    pub hard_edges: usize,
    pub non_manifold_edges: usize,
    pub welded_corners: usize,
}

/// Interleaved vertex layout for GPU upload
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PackedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Tangent xyz with the binormal sign in w
    pub tangent: [f32; 4],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

/// The compacted result of a mesh build
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshOutput {
    pub positions: Vec<Point3f>,
    pub normals: Vec<Vector3f>,
    pub tangents: Vec<Vector3f>,
    pub binormal_signs: Vec<f32>,
    pub uv_channels: Vec<Vec<Uv>>,
    pub colors: Option<Vec<Vector4f>>,
    pub indices: Vec<u32>,
    pub sections: Vec<MeshSection>,
    pub warnings: Vec<BuildWarning>,
    pub stats: BuildStats,
}

impl MeshOutput {
    /// Assemble an output from compacted vertex streams
    pub fn from_streams(
        vertices: AttributeStreams,
        indices: Vec<u32>,
        sections: Vec<MeshSection>,
    ) -> Self {
        let AttributeStreams {
            positions,
            normals,
            tangents,
            binormal_signs,
            uv_channels,
            colors,
        } = vertices;
        Self {
            positions,
            normals,
            tangents,
            binormal_signs,
            uv_channels,
            colors,
            indices,
            sections,
            warnings: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    /// Get the number of output vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of output triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Warnings rendered as human-readable strings
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// The attribute tuple referenced by index buffer slot `slot`
    pub fn corner(&self, slot: usize) -> Corner {
        let v = self.indices[slot] as usize;
        Corner {
            position: self.positions[v],
            normal: self.normals[v],
            tangent: self.tangents[v],
            binormal_sign: self.binormal_signs[v],
            uvs: self.uv_channels.iter().map(|uvs| uvs[v]).collect(),
            color: self.colors.as_ref().map(|colors| colors[v]),
        }
    }

    /// Interleave the vertex streams into `PackedVertex` records
    pub fn packed_vertices(&self) -> Vec<PackedVertex> {
        (0..self.vertex_count())
            .map(|v| {
                let p = self.positions[v];
                let n = self.normals[v];
                let t = self.tangents[v];
                let uv = self
                    .uv_channels
                    .first()
                    .map(|uvs| uvs[v])
                    .unwrap_or_else(Uv::zeros);
                let color = self
                    .colors
                    .as_ref()
                    .map(|colors| colors[v])
                    .unwrap_or_else(|| Vector4f::new(1.0, 1.0, 1.0, 1.0));
                PackedVertex {
                    position: [p.x, p.y, p.z],
                    normal: [n.x, n.y, n.z],
                    tangent: [t.x, t.y, t.z, self.binormal_signs[v]],
                    uv: [uv.x, uv.y],
                    color: [color.x, color.y, color.z, color.w],
                }
            })
            .collect()
    }
}

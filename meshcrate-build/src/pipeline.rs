//! The mesh build pipeline
//!
//! Stages, in order: validate the input, fill missing UV channels, compute
//! face bases, build adjacency and classify hard edges, split vertices
//! across hard edges, synthesize corner frames, then weld equal corners
//! into the final vertex and index buffers.

use crate::dedup::{DedupOutput, VertexDeduplicator};
use crate::MeshProcessor;
use meshcrate_core::{
    AttributeStreams, BuildSettings, BuildStats, BuildWarning, MeshInput, MeshOutput, Point3f,
    Result, Uv, Vector3f,
};
use meshcrate_tangents::{
    compute_face_bases, CornerFrames, NormalTangentSynthesizer, SynthesisInput, SynthesisOptions,
};
use meshcrate_topology::{
    classify_by_smoothing_groups, split_hard_vertices, AdjacencyIndex, ClassificationReport,
    HardEdgeClassifier, SmoothGroupResolver,
};

/// Builds render-ready buffers from a raw mesh
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    settings: BuildSettings,
}

impl MeshBuilder {
    pub fn new(settings: BuildSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Run the full pipeline on `input`
    ///
    /// Malformed input fails with `Error::InvalidInput`; every recoverable
    /// degeneracy is reported in `MeshOutput::warnings` instead.
    pub fn build(&self, input: &MeshInput) -> Result<MeshOutput> {
        self.settings.validate()?;
        input.validate()?;
        self.settings.parallel.install(|| self.build_validated(input))?
    }

    fn build_validated(&self, input: &MeshInput) -> Result<MeshOutput> {
        let settings = &self.settings;
        let parallel = &settings.parallel;
        let mut warnings = Vec::new();

        let uv_channels = fill_uv_channels(input, settings.min_uv_channels, &mut warnings);
        let authored_uvs = input.uv_channels.first().map(Vec::as_slice);

        let face_bases = compute_face_bases(&input.positions, &input.indices, authored_uvs, parallel);
        let face_normals: Vec<Vector3f> = face_bases
            .iter()
            .map(|basis| if basis.degenerate { Vector3f::zeros() } else { basis.tangent_z })
            .collect();

        let mut adjacency = AdjacencyIndex::build(&input.indices, input.vertex_count())?;
        let classification = self.classify(&mut adjacency, input, &face_normals)?;

        let resolver = SmoothGroupResolver::new(settings.split_cylinder_seams);
        let split = split_hard_vertices(&adjacency, &input.indices, &resolver, parallel)?;
        let mut positions = input.positions.clone();
        split.extend_attribute(&mut positions);

        // Split vertices no longer share edges; classify the new topology again
        let mut split_adjacency = AdjacencyIndex::build(&split.indices, split.vertex_count())?;
        self.classify(&mut split_adjacency, input, &face_normals)?;

        let frames = self.synthesize(
            &SynthesisInput {
                positions: &positions,
                indices: &split.indices,
                uvs: authored_uvs,
                normals: input.normals.as_deref(),
                tangents: input.tangents.as_deref(),
                face_bases: &face_bases,
            },
            &split_adjacency,
            &resolver,
        )?;

        let report = frames.report;
        let corners = corner_streams(&positions, &split.indices, frames, uv_channels, input);
        let deduplicator = VertexDeduplicator::new(settings.thresholds)
            .with_remove_degenerates(settings.remove_degenerates)
            .with_parallel(parallel.clone());
        let DedupOutput {
            vertices,
            indices,
            sections,
            degenerate_triangles,
            welded_corners,
        } = deduplicator.deduplicate(&corners, &input.material_indices);

        push_count(&mut warnings, classification.non_manifold_edges, |count| {
            BuildWarning::NonManifoldEdges { count }
        });
        push_count(&mut warnings, split.unsplittable.len(), |count| {
            BuildWarning::UnsplittableVertices { count }
        });
        push_count(&mut warnings, report.zero_area_faces, |count| {
            BuildWarning::ZeroAreaTriangles { count }
        });
        push_count(&mut warnings, report.degenerate_uv_faces, |count| {
            BuildWarning::DegenerateUvBasis { count }
        });
        push_count(&mut warnings, report.normal_fallbacks, |count| {
            BuildWarning::NormalFallbacks { count }
        });
        push_count(&mut warnings, report.tangent_fallbacks, |count| {
            BuildWarning::TangentFallbacks { count }
        });
        push_count(&mut warnings, degenerate_triangles, |count| {
            BuildWarning::DegenerateTriangles { count }
        });
        for warning in &warnings {
            log::warn!("{}", warning);
        }

        let mut output = MeshOutput::from_streams(vertices, indices, sections);
        output.stats = BuildStats {
            input_triangles: input.face_count(),
            output_triangles: output.triangle_count(),
            output_vertices: output.vertex_count(),
            degenerate_triangles,
            split_vertices: split.split_count(),
            hard_edges: classification.hard_edges,
            non_manifold_edges: classification.non_manifold_edges,
            welded_corners,
        };
        output.warnings = warnings;
        log::debug!("Mesh build finished: {:?}", output.stats);
        Ok(output)
    }

    /// Mode B when smoothing masks are present and enabled, mode A otherwise
    fn classify(
        &self,
        adjacency: &mut AdjacencyIndex,
        input: &MeshInput,
        face_normals: &[Vector3f],
    ) -> Result<ClassificationReport> {
        match (&input.smoothing_masks, self.settings.use_smoothing_groups) {
            (Some(masks), true) => classify_by_smoothing_groups(adjacency, masks, face_normals),
            _ => HardEdgeClassifier::new(self.settings.hard_angle_radians())
                .classify_by_angle(adjacency, face_normals),
        }
    }

    fn synthesize(
        &self,
        input: &SynthesisInput<'_>,
        adjacency: &AdjacencyIndex,
        resolver: &SmoothGroupResolver,
    ) -> Result<CornerFrames> {
        NormalTangentSynthesizer::new(SynthesisOptions::from(&self.settings)).synthesize(
            input,
            adjacency,
            resolver,
            &self.settings.parallel,
        )
    }
}

impl MeshProcessor for MeshBuilder {
    fn process(&self, mesh: &MeshInput) -> Result<MeshOutput> {
        self.build(mesh)
    }
}

/// Authored UV channels followed by zero channels up to `min_channels`
fn fill_uv_channels(
    input: &MeshInput,
    min_channels: usize,
    warnings: &mut Vec<BuildWarning>,
) -> Vec<Vec<Uv>> {
    let mut channels = input.uv_channels.clone();
    for channel in channels.len()..min_channels {
        warnings.push(BuildWarning::MissingUvChannel { channel });
        channels.push(vec![Uv::zeros(); input.corner_count()]);
    }
    channels
}

fn push_count(warnings: &mut Vec<BuildWarning>, count: usize, warning: impl FnOnce(usize) -> BuildWarning) {
    if count > 0 {
        warnings.push(warning(count));
    }
}

/// Per-corner streams ready for welding
fn corner_streams(
    positions: &[Point3f],
    indices: &[u32],
    frames: CornerFrames,
    uv_channels: Vec<Vec<Uv>>,
    input: &MeshInput,
) -> AttributeStreams {
    AttributeStreams {
        positions: indices.iter().map(|&v| positions[v as usize]).collect(),
        normals: frames.normals,
        tangents: frames.tangents,
        binormal_signs: frames.binormal_signs,
        uv_channels,
        colors: input.colors.clone(),
    }
}

//! Per-corner normal and tangent synthesis
//!
//! Each vertex is processed independently: its faces are partitioned into
//! smoothing groups, the face bases of each group are summed and
//! normalized, and the resulting frame is written to every corner of the
//! group. Vertices run in parallel and their results are scattered back
//! into per-corner streams in vertex order.

use crate::basis::{corner_angle, face_positions, fallback_normal, FaceBasis};
use meshcrate_core::{
    binormal_sign, orthonormal_axes, try_normalize, try_normalize_relative, BuildSettings, Error,
    FaceId, NormalWeighting, ParallelConfig, Point3f, Result, Tangent, Uv, Vector3f, VertexId,
};
use meshcrate_topology::{AdjacencyIndex, SmoothGroupResolver};

/// What to synthesize and how
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisOptions {
    /// Overwrite supplied normals
    pub recompute_normals: bool,
    /// Overwrite supplied tangents
    pub recompute_tangents: bool,
    pub weighting: NormalWeighting,
    /// Faces whose UV at a vertex differs by more than this do not share tangents there
    pub uv_threshold: f32,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self::from(&BuildSettings::default())
    }
}

impl From<&BuildSettings> for SynthesisOptions {
    fn from(settings: &BuildSettings) -> Self {
        Self {
            recompute_normals: settings.recompute_normals,
            recompute_tangents: settings.recompute_tangents,
            weighting: settings.normal_weighting,
            uv_threshold: settings.thresholds.uv,
        }
    }
}

/// Borrowed mesh data for one synthesis pass
///
/// `positions` is per vertex; `uvs`, `normals` and `tangents` are per
/// corner and `face_bases` per face.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    pub positions: &'a [Point3f],
    pub indices: &'a [u32],
    pub uvs: Option<&'a [Uv]>,
    pub normals: Option<&'a [Vector3f]>,
    pub tangents: Option<&'a [Tangent]>,
    pub face_bases: &'a [FaceBasis],
}

/// Counts of degeneracies met during synthesis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisReport {
    pub zero_area_faces: usize,
    pub degenerate_uv_faces: usize,
    pub normal_fallbacks: usize,
    pub tangent_fallbacks: usize,
}

/// Per-corner tangent frames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CornerFrames {
    pub normals: Vec<Vector3f>,
    pub tangents: Vec<Vector3f>,
    /// Exactly -1.0 or 1.0
    pub binormal_signs: Vec<f32>,
    pub report: SynthesisReport,
}

struct CornerFrame {
    corner: usize,
    normal: Vector3f,
    tangent: Vector3f,
    sign: f32,
    normal_fallback: bool,
    tangent_fallback: bool,
}

/// One face's view of a vertex
struct Contribution {
    basis: FaceBasis,
    corners: Vec<usize>,
    weight: f32,
}

/// Fills in per-corner normals, tangents and binormal signs
#[derive(Debug, Clone, Default)]
pub struct NormalTangentSynthesizer {
    options: SynthesisOptions,
}

impl NormalTangentSynthesizer {
    pub fn new(options: SynthesisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    /// Synthesize tangent frames for every corner of `input`
    ///
    /// When every stream is supplied and nothing is to be recomputed, the
    /// supplied values pass through unchanged.
    pub fn synthesize(
        &self,
        input: &SynthesisInput<'_>,
        adjacency: &AdjacencyIndex,
        resolver: &SmoothGroupResolver,
        parallel: &ParallelConfig,
    ) -> Result<CornerFrames> {
        check_lengths(input, adjacency)?;

        let corner_count = input.indices.len();
        let mut frames = CornerFrames {
            normals: vec![Vector3f::zeros(); corner_count],
            tangents: vec![Vector3f::zeros(); corner_count],
            binormal_signs: vec![1.0; corner_count],
            report: SynthesisReport {
                zero_area_faces: input.face_bases.iter().filter(|b| b.degenerate).count(),
                degenerate_uv_faces: input.face_bases.iter().filter(|b| b.uv_degenerate).count(),
                ..SynthesisReport::default()
            },
        };

        let need_normals = self.options.recompute_normals || input.normals.is_none();
        let need_tangents = self.options.recompute_tangents || input.tangents.is_none();
        if let (false, false, Some(normals), Some(tangents)) =
            (need_normals, need_tangents, input.normals, input.tangents)
        {
            frames.normals.copy_from_slice(normals);
            for (corner, tangent) in tangents.iter().enumerate() {
                frames.tangents[corner] = tangent.vector;
                frames.binormal_signs[corner] = tangent.sign();
            }
            return Ok(frames);
        }

        let per_vertex = parallel.map_range(adjacency.vertex_count(), |v| {
            self.vertex_frames(input, adjacency, resolver, VertexId::from(v), need_normals, need_tangents)
        });

        for frame in per_vertex.into_iter().flatten() {
            frames.normals[frame.corner] = frame.normal;
            frames.tangents[frame.corner] = frame.tangent;
            frames.binormal_signs[frame.corner] = frame.sign;
            frames.report.normal_fallbacks += usize::from(frame.normal_fallback);
            frames.report.tangent_fallbacks += usize::from(frame.tangent_fallback);
        }

        log::debug!(
            "Synthesized {} corner frames ({} normal, {} tangent fallbacks)",
            corner_count,
            frames.report.normal_fallbacks,
            frames.report.tangent_fallbacks
        );
        Ok(frames)
    }

    fn vertex_frames(
        &self,
        input: &SynthesisInput<'_>,
        adjacency: &AdjacencyIndex,
        resolver: &SmoothGroupResolver,
        vertex: VertexId,
        need_normals: bool,
        need_tangents: bool,
    ) -> Vec<CornerFrame> {
        let mut frames = Vec::new();
        for group in resolver.resolve(adjacency, vertex) {
            let contributions: Vec<Contribution> = group
                .iter()
                .map(|&face| self.contribution(input, adjacency, face, vertex))
                .collect();

            let (normal_sum, weight_sum) = contributions
                .iter()
                .filter(|c| !c.basis.degenerate)
                .fold((Vector3f::zeros(), 0.0f32), |(sum, total), c| {
                    (sum + c.basis.tangent_z * c.weight, total + c.weight)
                });
            // Unit normals summed with weights; cancellation is judged against the total weight
            let group_normal = try_normalize_relative(&normal_sum, weight_sum * weight_sum);

            for (index, contribution) in contributions.iter().enumerate() {
                for &corner in &contribution.corners {
                    frames.push(self.corner_frame(
                        input,
                        &contributions,
                        index,
                        corner,
                        group_normal,
                        need_normals,
                        need_tangents,
                    ));
                }
            }
        }
        frames
    }

    fn contribution(
        &self,
        input: &SynthesisInput<'_>,
        adjacency: &AdjacencyIndex,
        face: FaceId,
        vertex: VertexId,
    ) -> Contribution {
        let basis = input.face_bases[face.index()];
        let slots: Vec<usize> = adjacency.slots_of_vertex(face, vertex).collect();
        let weight = match self.options.weighting {
            NormalWeighting::Equal => 1.0,
            NormalWeighting::Area => basis.area,
            NormalWeighting::Angle => slots.first().map_or(0.0, |&slot| {
                corner_angle(&face_positions(input.positions, input.indices, face.index()), slot)
            }),
        };
        Contribution {
            basis,
            corners: slots.iter().map(|slot| face.index() * 3 + slot).collect(),
            weight,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn corner_frame(
        &self,
        input: &SynthesisInput<'_>,
        contributions: &[Contribution],
        own: usize,
        corner: usize,
        group_normal: Option<Vector3f>,
        need_normals: bool,
        need_tangents: bool,
    ) -> CornerFrame {
        let own_basis = &contributions[own].basis;

        let (normal, normal_fallback) = match (need_normals, input.normals) {
            (false, Some(normals)) => (normals[corner], false),
            _ => match group_normal {
                Some(normal) => (normal, false),
                None if !own_basis.degenerate => (own_basis.tangent_z, true),
                None => (fallback_normal(), true),
            },
        };
        let unit_normal = try_normalize(&normal).unwrap_or_else(fallback_normal);

        if let (false, Some(tangents)) = (need_tangents, input.tangents) {
            let supplied = tangents[corner];
            let tangent = if need_normals {
                try_normalize_relative(
                    &(supplied.vector - unit_normal * unit_normal.dot(&supplied.vector)),
                    supplied.vector.norm_squared(),
                )
                .unwrap_or(supplied.vector)
            } else {
                supplied.vector
            };
            return CornerFrame {
                corner,
                normal,
                tangent,
                sign: supplied.sign(),
                normal_fallback,
                tangent_fallback: false,
            };
        }

        // Tangents only blend across faces that agree on this corner's UV
        let corner_uv = input.uvs.map(|uvs| uvs[corner]);
        let mut tangent_sum = Vector3f::zeros();
        let mut binormal_sum = Vector3f::zeros();
        let mut tangent_weight = 0.0f32;
        for contribution in contributions {
            if contribution.basis.degenerate {
                continue;
            }
            let same_uv = match (input.uvs, corner_uv) {
                (Some(uvs), Some(uv)) => contribution.corners.iter().any(|&other| {
                    let delta = uvs[other] - uv;
                    delta.x.abs() <= self.options.uv_threshold && delta.y.abs() <= self.options.uv_threshold
                }),
                _ => true,
            };
            if same_uv {
                tangent_sum += contribution.basis.tangent_x * contribution.weight;
                binormal_sum += contribution.basis.tangent_y * contribution.weight;
                tangent_weight += contribution.weight;
            }
        }

        let orthogonal = tangent_sum - unit_normal * unit_normal.dot(&tangent_sum);
        let tangent = try_normalize_relative(&orthogonal, tangent_weight * tangent_weight);
        let (tangent, binormal, tangent_fallback) = match tangent {
            Some(tangent) => (tangent, binormal_sum, false),
            None => {
                let (tangent, binormal) = orthonormal_axes(&unit_normal);
                (tangent, binormal, true)
            }
        };
        let sign = binormal_sign(unit_normal.cross(&tangent).dot(&binormal));

        CornerFrame {
            corner,
            normal: unit_normal,
            tangent,
            sign,
            normal_fallback,
            tangent_fallback,
        }
    }
}

fn check_lengths(input: &SynthesisInput<'_>, adjacency: &AdjacencyIndex) -> Result<()> {
    let corner_count = input.indices.len();
    if corner_count != adjacency.face_count() * 3 {
        return Err(Error::InvalidInput(format!(
            "Index buffer has {} corners but the adjacency index holds {} faces",
            corner_count,
            adjacency.face_count()
        )));
    }
    if input.face_bases.len() != adjacency.face_count() {
        return Err(Error::InvalidInput(format!(
            "Got {} face bases for {} faces",
            input.face_bases.len(),
            adjacency.face_count()
        )));
    }
    if input.positions.len() != adjacency.vertex_count() {
        return Err(Error::InvalidInput(format!(
            "Got {} positions for {} vertices",
            input.positions.len(),
            adjacency.vertex_count()
        )));
    }
    for (name, len) in [
        ("uv", input.uvs.map(<[Uv]>::len)),
        ("normal", input.normals.map(<[Vector3f]>::len)),
        ("tangent", input.tangents.map(<[Tangent]>::len)),
    ] {
        if let Some(len) = len {
            if len != corner_count {
                return Err(Error::InvalidInput(format!(
                    "The {} stream has {} entries for {} corners",
                    name, len, corner_count
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::compute_face_bases;
    use approx::assert_relative_eq;
    use meshcrate_topology::HardEdgeClassifier;

    fn make_quad() -> (Vec<Point3f>, Vec<u32>) {
        let positions = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        (positions, vec![0, 1, 2, 0, 2, 3])
    }

    /// Two faces folded 90 degrees along the x axis
    fn make_fold() -> (Vec<Point3f>, Vec<u32>) {
        let positions = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
        ];
        (positions, vec![0, 1, 2, 1, 0, 3])
    }

    fn run(
        positions: &[Point3f],
        indices: &[u32],
        uvs: Option<&[Uv]>,
        options: SynthesisOptions,
        hard_angle_degrees: f32,
    ) -> CornerFrames {
        let parallel = ParallelConfig::default();
        let face_bases = compute_face_bases(positions, indices, uvs, &parallel);
        let mut adjacency = AdjacencyIndex::build(indices, positions.len()).unwrap();
        let normals: Vec<Vector3f> = face_bases.iter().map(|b| b.tangent_z).collect();
        HardEdgeClassifier::from_degrees(hard_angle_degrees)
            .classify_by_angle(&mut adjacency, &normals)
            .unwrap();
        let input = SynthesisInput {
            positions,
            indices,
            uvs,
            normals: None,
            tangents: None,
            face_bases: &face_bases,
        };
        NormalTangentSynthesizer::new(options)
            .synthesize(&input, &adjacency, &SmoothGroupResolver::new(false), &parallel)
            .unwrap()
    }

    #[test]
    fn test_planar_quad_shares_flat_normal() {
        let (positions, indices) = make_quad();
        let frames = run(&positions, &indices, None, SynthesisOptions::default(), 30.0);
        for normal in &frames.normals {
            assert_eq!(*normal, Vector3f::new(0.0, 0.0, 1.0));
        }
        for (tangent, normal) in frames.tangents.iter().zip(&frames.normals) {
            assert_relative_eq!(tangent.dot(normal), 0.0, epsilon = 1e-6);
        }
        assert!(frames.binormal_signs.iter().all(|&s| s == 1.0));
        assert_eq!(frames.report, SynthesisReport::default());
    }

    #[test]
    fn test_soft_fold_averages_normals() {
        let (positions, indices) = make_fold();
        let frames = run(&positions, &indices, None, SynthesisOptions::default(), 120.0);
        let expected = Vector3f::new(0.0, 1.0, 1.0).normalize();
        // Corners on the shared edge
        assert_relative_eq!(frames.normals[0], expected, epsilon = 1e-6);
        assert_relative_eq!(frames.normals[1], expected, epsilon = 1e-6);
        // Unshared corners keep their face normal
        assert_relative_eq!(frames.normals[2], Vector3f::z(), epsilon = 1e-6);
        assert_relative_eq!(frames.normals[5], Vector3f::y(), epsilon = 1e-6);
    }

    #[test]
    fn test_hard_fold_keeps_flat_normals() {
        let (positions, indices) = make_fold();
        let frames = run(&positions, &indices, None, SynthesisOptions::default(), 45.0);
        assert_relative_eq!(frames.normals[0], Vector3f::z(), epsilon = 1e-6);
        assert_relative_eq!(frames.normals[4], Vector3f::y(), epsilon = 1e-6);
    }

    #[test]
    fn test_mirrored_uvs_give_negative_sign() {
        let (positions, indices) = make_quad();
        let uvs = vec![
            Uv::new(1.0, 0.0),
            Uv::new(0.0, 0.0),
            Uv::new(0.0, 1.0),
            Uv::new(1.0, 0.0),
            Uv::new(0.0, 1.0),
            Uv::new(1.0, 1.0),
        ];
        let frames = run(&positions, &indices, Some(&uvs), SynthesisOptions::default(), 30.0);
        assert!(frames.binormal_signs.iter().all(|&s| s == -1.0));
        assert_relative_eq!(frames.tangents[0], -Vector3f::x(), epsilon = 1e-6);
    }

    #[test]
    fn test_binormal_sign_is_unit() {
        let (positions, indices) = make_fold();
        let uvs = vec![Uv::new(0.3, 0.3); 6];
        let frames = run(&positions, &indices, Some(&uvs), SynthesisOptions::default(), 120.0);
        assert!(frames.binormal_signs.iter().all(|&s| s == 1.0 || s == -1.0));
        assert_eq!(frames.report.degenerate_uv_faces, 2);
    }

    #[test]
    fn test_zero_area_face_is_excluded() {
        let mut positions = make_quad().0;
        positions.push(Point3f::new(2.0, 0.0, 0.0));
        // Collinear sliver sharing vertex 1
        let indices = vec![0, 1, 2, 0, 2, 3, 0, 1, 4];
        let frames = run(&positions, &indices, None, SynthesisOptions::default(), 60.0);
        assert_eq!(frames.report.zero_area_faces, 1);
        assert_relative_eq!(frames.normals[7], Vector3f::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_supplied_frames_pass_through() {
        let (positions, indices) = make_quad();
        let face_bases = compute_face_bases(&positions, &indices, None, &ParallelConfig::default());
        let adjacency = AdjacencyIndex::build(&indices, 4).unwrap();
        let normals = vec![Vector3f::new(0.0, 0.6, 0.8); 6];
        let tangents = vec![Tangent::new(Vector3f::x(), -1.0); 6];
        let input = SynthesisInput {
            positions: &positions,
            indices: &indices,
            uvs: None,
            normals: Some(&normals),
            tangents: Some(&tangents),
            face_bases: &face_bases,
        };
        let synthesizer = NormalTangentSynthesizer::default();
        let resolver = SmoothGroupResolver::default();
        let once = synthesizer
            .synthesize(&input, &adjacency, &resolver, &ParallelConfig::default())
            .unwrap();
        assert_eq!(once.normals, normals);
        assert!(once.binormal_signs.iter().all(|&s| s == -1.0));

        let recompute = NormalTangentSynthesizer::new(SynthesisOptions {
            recompute_normals: true,
            ..SynthesisOptions::default()
        });
        let rebuilt = recompute
            .synthesize(&input, &adjacency, &resolver, &ParallelConfig::default())
            .unwrap();
        assert_eq!(rebuilt.normals[0], Vector3f::z());
        let again = recompute
            .synthesize(&input, &adjacency, &resolver, &ParallelConfig::default())
            .unwrap();
        assert_eq!(rebuilt, again);
    }

    #[test]
    fn test_stream_length_mismatch() {
        let (positions, indices) = make_quad();
        let face_bases = compute_face_bases(&positions, &indices, None, &ParallelConfig::default());
        let adjacency = AdjacencyIndex::build(&indices, 4).unwrap();
        let uvs = vec![Uv::zeros(); 5];
        let input = SynthesisInput {
            positions: &positions,
            indices: &indices,
            uvs: Some(&uvs),
            normals: None,
            tangents: None,
            face_bases: &face_bases,
        };
        let result = NormalTangentSynthesizer::default().synthesize(
            &input,
            &adjacency,
            &SmoothGroupResolver::default(),
            &ParallelConfig::default(),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    /// A 90 degree fold at vertex 0 whose faces differ in area and corner angle
    ///
    /// Face 0 has normal +Z, area 0.5 and a 90 degree corner at vertex 0.
    /// Face 1 has normal +Y, area 1 and a 45 degree corner at vertex 0.
    fn make_uneven_fold(scale: f32) -> (Vec<Point3f>, Vec<u32>) {
        let positions = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(scale, 0.0, 0.0),
            Point3f::new(0.0, scale, 0.0),
            Point3f::new(2.0 * scale, 0.0, 2.0 * scale),
        ];
        (positions, vec![0, 1, 2, 1, 0, 3])
    }

    #[test]
    fn test_weighting_modes_differ() {
        let cases = [
            (NormalWeighting::Equal, Vector3f::new(0.0, 1.0, 1.0)),
            (NormalWeighting::Area, Vector3f::new(0.0, 2.0, 1.0)),
            (NormalWeighting::Angle, Vector3f::new(0.0, 1.0, 2.0)),
        ];
        for scale in [1.0, 1e-2, 1e-4] {
            let (positions, indices) = make_uneven_fold(scale);
            for (weighting, expected) in cases {
                let options = SynthesisOptions {
                    weighting,
                    ..SynthesisOptions::default()
                };
                let frames = run(&positions, &indices, None, options, 120.0);
                let expected = expected.normalize();
                // Corner 0 is face 0 slot 0, corner 4 is face 1 slot 1; both are vertex 0
                assert_relative_eq!(frames.normals[0], expected, epsilon = 1e-5);
                assert_relative_eq!(frames.normals[4], expected, epsilon = 1e-5);
                assert_eq!(frames.report, SynthesisReport::default());
            }
        }
    }

    #[test]
    fn test_small_quad_is_not_degenerate() {
        let positions: Vec<Point3f> = make_quad()
            .0
            .iter()
            .map(|p| Point3f::from(p.coords * 0.01))
            .collect();
        let indices = make_quad().1;
        let options = SynthesisOptions {
            weighting: NormalWeighting::Area,
            ..SynthesisOptions::default()
        };
        let frames = run(&positions, &indices, None, options, 30.0);
        assert_eq!(frames.report, SynthesisReport::default());
        for normal in &frames.normals {
            assert_relative_eq!(*normal, Vector3f::z(), epsilon = 1e-6);
        }
    }
}

//! Hard edge classification
//!
//! An edge is hard when normals must not be blended across it. Edges are
//! classified either by the dihedral angle between their two faces or, for
//! legacy interchange data, by intersecting per-face smoothing-group masks.
//! Boundary and non-manifold edges are never merge candidates and are left
//! "not hard".

use crate::adjacency::{AdjacencyIndex, AdjacentFaces};
use meshcrate_core::{try_normalize, EdgeId, Error, FaceId, Result, Vector3f};
use std::f32::consts::PI;

/// Counters from one classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationReport {
    pub hard_edges: usize,
    pub soft_edges: usize,
    pub boundary_edges: usize,
    pub non_manifold_edges: usize,
}

/// Decide per edge whether it is hard or soft
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardEdgeClassifier {
    hard_angle: f32,
}

/// Angle in radians between two unit normals
pub fn dihedral_angle(n0: &Vector3f, n1: &Vector3f) -> f32 {
    n0.dot(n1).clamp(-1.0, 1.0).acos()
}

enum EdgeFaces {
    Interior(FaceId, FaceId),
    Boundary,
    NonManifold,
}

fn edge_faces(adjacency: &AdjacencyIndex, edge: EdgeId) -> EdgeFaces {
    match adjacency.find_adjacent_faces(edge) {
        AdjacentFaces { manifold: false, .. } => EdgeFaces::NonManifold,
        AdjacentFaces {
            faces: [Some(a), Some(b)],
            ..
        } => EdgeFaces::Interior(a, b),
        _ => EdgeFaces::Boundary,
    }
}

fn check_face_stream(adjacency: &AdjacencyIndex, name: &str, len: usize) -> Result<()> {
    if len != adjacency.face_count() {
        return Err(Error::InvalidInput(format!(
            "{} count mismatch: {} entries for {} faces",
            name,
            len,
            adjacency.face_count()
        )));
    }
    Ok(())
}

/// Dihedral angle of an interior edge, `None` when either face has no normal
fn interior_angle(face_normals: &[Vector3f], a: FaceId, b: FaceId) -> Option<f32> {
    let n0 = try_normalize(&face_normals[a.index()])?;
    let n1 = try_normalize(&face_normals[b.index()])?;
    Some(dihedral_angle(&n0, &n1))
}

/// Shared classification loop; `is_hard` decides interior edges
fn classify_with<F>(
    adjacency: &mut AdjacencyIndex,
    face_normals: &[Vector3f],
    mut is_hard: F,
) -> ClassificationReport
where
    F: FnMut(FaceId, FaceId, Option<f32>) -> bool,
{
    let mut report = ClassificationReport::default();
    for e in 0..adjacency.edge_count() {
        let edge = EdgeId::from(e);
        let (hard, sharpness) = match edge_faces(adjacency, edge) {
            EdgeFaces::Interior(a, b) => {
                let angle = interior_angle(face_normals, a, b);
                let hard = is_hard(a, b, angle);
                if hard {
                    report.hard_edges += 1;
                } else {
                    report.soft_edges += 1;
                }
                (hard, angle.map_or(0.0, |angle| angle / PI))
            }
            EdgeFaces::Boundary => {
                report.boundary_edges += 1;
                (false, 1.0)
            }
            EdgeFaces::NonManifold => {
                report.non_manifold_edges += 1;
                (false, 1.0)
            }
        };
        adjacency.set_hard(edge, hard);
        adjacency.set_crease_sharpness(edge, sharpness);
    }
    report
}

impl HardEdgeClassifier {
    /// Create a classifier with a threshold in radians
    pub fn new(hard_angle_radians: f32) -> Self {
        Self {
            hard_angle: hard_angle_radians,
        }
    }

    pub fn from_degrees(hard_angle_degrees: f32) -> Self {
        Self::new(hard_angle_degrees.to_radians())
    }

    pub fn hard_angle(&self) -> f32 {
        self.hard_angle
    }

    /// Classify every edge by dihedral angle (mode A)
    ///
    /// An interior edge is hard iff the angle between its face normals is at
    /// least the threshold. Edges touching a face without a normal
    /// (zero-area triangles) stay soft.
    pub fn classify_by_angle(
        &self,
        adjacency: &mut AdjacencyIndex,
        face_normals: &[Vector3f],
    ) -> Result<ClassificationReport> {
        check_face_stream(adjacency, "Face normal", face_normals.len())?;
        let hard_angle = self.hard_angle;
        let report = classify_with(adjacency, face_normals, |_, _, angle| {
            angle.is_some_and(|angle| angle >= hard_angle)
        });
        log::debug!(
            "Classified {} hard and {} soft edges at {:.1} degrees",
            report.hard_edges,
            report.soft_edges,
            hard_angle.to_degrees()
        );
        Ok(report)
    }
}

/// Classify every edge by smoothing-group masks (mode B)
///
/// Two faces share a soft edge iff their masks intersect. `face_normals`
/// only feeds the crease sharpness used to rank soft edges.
pub fn classify_by_smoothing_groups(
    adjacency: &mut AdjacencyIndex,
    masks: &[u32],
    face_normals: &[Vector3f],
) -> Result<ClassificationReport> {
    check_face_stream(adjacency, "Smoothing mask", masks.len())?;
    check_face_stream(adjacency, "Face normal", face_normals.len())?;
    let report = classify_with(adjacency, face_normals, |a, b, _| {
        masks[a.index()] & masks[b.index()] == 0
    });
    log::debug!(
        "Classified {} hard and {} soft edges from smoothing groups",
        report.hard_edges,
        report.soft_edges
    );
    Ok(report)
}

/// Smoothing masks derived from the current hard edges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmoothingMasks {
    /// One mask per face
    pub masks: Vec<u32>,
    /// Number of soft-connected regions found
    pub region_count: usize,
    /// True when 32 bits were not enough and some neighbours share bit 0
    pub overflowed: bool,
}

/// Convert hard edges into per-face smoothing-group masks
///
/// Faces connected through soft edges form a region; each region gets one
/// bit chosen greedily so that no region shares a bit with a region it meets
/// across a hard edge. A hard edge between two faces of the same region
/// (a seam inside a soft loop) cannot be expressed with masks and becomes
/// soft on the way back.
pub fn smoothing_masks_from_hard_edges(adjacency: &AdjacencyIndex) -> SmoothingMasks {
    const UNASSIGNED: usize = usize::MAX;
    let face_count = adjacency.face_count();
    let mut region_of = vec![UNASSIGNED; face_count];
    let mut region_count = 0;
    let mut queue = Vec::new();

    for seed in 0..face_count {
        if region_of[seed] != UNASSIGNED {
            continue;
        }
        region_of[seed] = region_count;
        queue.push(FaceId::from(seed));
        while let Some(face) = queue.pop() {
            for edge in adjacency.face_edges(face) {
                if let Some((a, b)) = adjacency.soft_pair(edge) {
                    let next = if a == face { b } else { a };
                    if region_of[next.index()] == UNASSIGNED {
                        region_of[next.index()] = region_count;
                        queue.push(next);
                    }
                }
            }
        }
        region_count += 1;
    }

    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); region_count];
    for edge in adjacency.hard_edges() {
        if let Some((a, b)) = adjacency.find_adjacent_faces(edge).pair() {
            let (ra, rb) = (region_of[a.index()], region_of[b.index()]);
            if ra != rb {
                neighbours[ra].push(rb);
                neighbours[rb].push(ra);
            }
        }
    }

    let mut region_masks = vec![0u32; region_count];
    let mut overflowed = false;
    for region in 0..region_count {
        let used = neighbours[region]
            .iter()
            .fold(0u32, |used, &other| used | region_masks[other]);
        let bit = (!used).trailing_zeros();
        region_masks[region] = if bit < 32 {
            1 << bit
        } else {
            overflowed = true;
            1
        };
    }

    if overflowed {
        log::warn!("Smoothing group coloring ran out of bits for {} regions", region_count);
    }

    SmoothingMasks {
        masks: region_of.iter().map(|&region| region_masks[region]).collect(),
        region_count,
        overflowed,
    }
}

//! Per-face tangent bases
//!
//! Each triangle gets an orthonormal frame: `tangent_z` is the flat normal,
//! `tangent_x` and `tangent_y` follow the directions of increasing U and V
//! across the face. The UV-to-world map comes from solving the 2x2 system
//! that takes the triangle's UV edges to its position edges.

use meshcrate_core::{
    orthonormal_axes, try_normalize_relative, Matrix2, ParallelConfig, Point3f, Uv, Vector3f,
};

/// Normal used when a triangle has no usable area
pub fn fallback_normal() -> Vector3f {
    Vector3f::z()
}

/// Orthonormal frame of one triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBasis {
    /// Direction of increasing U
    pub tangent_x: Vector3f,
    /// Direction of increasing V
    pub tangent_y: Vector3f,
    /// Flat normal
    pub tangent_z: Vector3f,
    pub area: f32,
    /// Near-zero area; excluded from normal averaging
    pub degenerate: bool,
    /// UVs were supplied but could not be inverted into a basis
    pub uv_degenerate: bool,
}

impl FaceBasis {
    fn fallback() -> Self {
        let normal = fallback_normal();
        let (tangent_x, tangent_y) = orthonormal_axes(&normal);
        Self {
            tangent_x,
            tangent_y,
            tangent_z: normal,
            area: 0.0,
            degenerate: true,
            uv_degenerate: false,
        }
    }
}

/// Normal of the plane spanned by two edges, `None` when they are parallel
///
/// The cutoff is on the sine of the angle between the edges, so it does not
/// depend on the size of the triangle.
fn edge_normal(e1: &Vector3f, e2: &Vector3f) -> Option<Vector3f> {
    try_normalize_relative(&e1.cross(e2), e1.norm_squared() * e2.norm_squared())
}

/// Unit normal of a counter-clockwise triangle, `None` for zero area
///
/// Computed as `normalize(cross(b - a, c - a))`, which is `(0, 0, 1)` for a
/// triangle wound counter-clockwise when seen from +Z.
pub fn flat_normal(triangle: &[Point3f; 3]) -> Option<Vector3f> {
    let [a, b, c] = triangle;
    edge_normal(&(b - a), &(c - a))
}

/// Angle subtended by the triangle at corner `slot`, in radians
pub fn corner_angle(triangle: &[Point3f; 3], slot: usize) -> f32 {
    let corner = triangle[slot];
    let e1 = triangle[(slot + 1) % 3] - corner;
    let e2 = triangle[(slot + 2) % 3] - corner;
    e1.cross(&e2).norm().atan2(e1.dot(&e2))
}

/// Tangent frame of one triangle
///
/// Without UVs, or when the UV mapping is singular, the tangent plane axes
/// are an arbitrary but stable perpendicular pair of the flat normal.
pub fn face_basis(triangle: &[Point3f; 3], uvs: Option<&[Uv; 3]>) -> FaceBasis {
    let e1 = triangle[1] - triangle[0];
    let e2 = triangle[2] - triangle[0];
    let area = 0.5 * e1.cross(&e2).norm();

    let Some(normal) = edge_normal(&e1, &e2) else {
        return FaceBasis {
            area,
            ..FaceBasis::fallback()
        };
    };

    let (tangent_x, tangent_y, uv_degenerate) = match uvs {
        Some(uvs) => match uv_axes(&e1, &e2, uvs, &normal) {
            Some((tx, ty)) => (tx, ty, false),
            None => {
                let (tx, ty) = orthonormal_axes(&normal);
                (tx, ty, true)
            }
        },
        None => {
            let (tx, ty) = orthonormal_axes(&normal);
            (tx, ty, false)
        }
    };

    FaceBasis {
        tangent_x,
        tangent_y,
        tangent_z: normal,
        area,
        degenerate: false,
        uv_degenerate,
    }
}

/// Solve `texture_to_local = parameter_to_local * inverse(parameter_to_texture)`
/// and re-orthonormalize its columns against `normal`.
fn uv_axes(e1: &Vector3f, e2: &Vector3f, uvs: &[Uv; 3], normal: &Vector3f) -> Option<(Vector3f, Vector3f)> {
    let d1 = uvs[1] - uvs[0];
    let d2 = uvs[2] - uvs[0];
    let parameter_to_texture = Matrix2::new(d1.x, d2.x, d1.y, d2.y);
    let texture_to_parameter = parameter_to_texture.try_inverse()?;

    let du = e1 * texture_to_parameter[(0, 0)] + e2 * texture_to_parameter[(1, 0)];
    let dv = e1 * texture_to_parameter[(0, 1)] + e2 * texture_to_parameter[(1, 1)];

    // Gram-Schmidt
    let tangent_x = try_normalize_relative(&(du - normal * normal.dot(&du)), du.norm_squared())?;
    let tangent_y = try_normalize_relative(
        &(dv - normal * normal.dot(&dv) - tangent_x * tangent_x.dot(&dv)),
        dv.norm_squared(),
    )?;
    Some((tangent_x, tangent_y))
}

/// Corners of face `face` gathered from a per-corner stream
pub fn face_corners<T: Copy>(stream: &[T], face: usize) -> [T; 3] {
    [stream[face * 3], stream[face * 3 + 1], stream[face * 3 + 2]]
}

/// Positions of face `face`
pub fn face_positions(positions: &[Point3f], indices: &[u32], face: usize) -> [Point3f; 3] {
    face_corners(indices, face).map(|v| positions[v as usize])
}

/// Tangent frames for every face, computed in parallel
///
/// `uvs` is per corner and must match `indices` in length.
pub fn compute_face_bases(
    positions: &[Point3f],
    indices: &[u32],
    uvs: Option<&[Uv]>,
    parallel: &ParallelConfig,
) -> Vec<FaceBasis> {
    parallel.map_range(indices.len() / 3, |face| {
        let triangle = face_positions(positions, indices, face);
        let face_uvs = uvs.map(|uvs| face_corners(uvs, face));
        face_basis(&triangle, face_uvs.as_ref())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_single_triangle() -> [Point3f; 3] {
        [
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_flat_normal_exact() {
        let normal = flat_normal(&make_single_triangle()).unwrap();
        assert_eq!(normal, Vector3f::new(0.0, 0.0, 1.0));

        let [a, b, c] = make_single_triangle();
        let flipped = flat_normal(&[a, c, b]).unwrap();
        assert_eq!(flipped, Vector3f::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_flat_normal_degenerate() {
        let p = Point3f::new(1.0, 2.0, 3.0);
        assert!(flat_normal(&[p, p, Point3f::new(2.0, 4.0, 6.0)]).is_none());
    }

    #[test]
    fn test_basis_follows_uvs() {
        let triangle = make_single_triangle();
        let uvs = [Uv::new(0.0, 0.0), Uv::new(1.0, 0.0), Uv::new(0.0, 1.0)];
        let basis = face_basis(&triangle, Some(&uvs));
        assert!(!basis.degenerate && !basis.uv_degenerate);
        assert_relative_eq!(basis.tangent_x, Vector3f::x(), epsilon = 1e-6);
        assert_relative_eq!(basis.tangent_y, Vector3f::y(), epsilon = 1e-6);
        assert_relative_eq!(basis.area, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_mirrored_uvs_flip_binormal() {
        let triangle = make_single_triangle();
        let uvs = [Uv::new(1.0, 0.0), Uv::new(0.0, 0.0), Uv::new(1.0, 1.0)];
        let basis = face_basis(&triangle, Some(&uvs));
        assert_relative_eq!(basis.tangent_x, -Vector3f::x(), epsilon = 1e-6);
        let handedness = basis.tangent_z.cross(&basis.tangent_x).dot(&basis.tangent_y);
        assert!(handedness < 0.0);
    }

    #[test]
    fn test_collapsed_uvs_fall_back() {
        let triangle = make_single_triangle();
        let uvs = [Uv::new(0.5, 0.5); 3];
        let basis = face_basis(&triangle, Some(&uvs));
        assert!(basis.uv_degenerate);
        assert!(!basis.degenerate);
        assert_relative_eq!(basis.tangent_x.dot(&basis.tangent_z), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_area_face() {
        let p = Point3f::new(0.0, 0.0, 0.0);
        let basis = face_basis(&[p, p, p], None);
        assert!(basis.degenerate);
        assert_eq!(basis.tangent_z, fallback_normal());
        assert_eq!(basis.area, 0.0);
    }

    #[test]
    fn test_small_triangles_keep_their_normal() {
        for scale in [1.0f32, 1e-2, 1e-4] {
            let triangle = [
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(0.0, scale, 0.0),
                Point3f::new(0.0, scale, scale),
            ];
            let uvs = [Uv::new(0.0, 0.0), Uv::new(1.0, 0.0), Uv::new(1.0, 1.0)];
            let basis = face_basis(&triangle, Some(&uvs));
            assert!(!basis.degenerate, "scale {} flagged degenerate", scale);
            assert!(!basis.uv_degenerate);
            assert_eq!(basis.tangent_z, Vector3f::x());
            assert_relative_eq!(basis.tangent_x, Vector3f::y(), epsilon = 1e-5);
            assert_relative_eq!(basis.tangent_y, Vector3f::z(), epsilon = 1e-5);
            assert_relative_eq!(basis.area, 0.5 * scale * scale, max_relative = 1e-5);
            assert_relative_eq!(
                corner_angle(&triangle, 0),
                std::f32::consts::FRAC_PI_4,
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn test_needle_triangle_is_degenerate() {
        let triangle = [
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1000.0, 0.0, 0.0),
            Point3f::new(2000.0, 1e-6, 0.0),
        ];
        assert!(face_basis(&triangle, None).degenerate);
    }

    #[test]
    fn test_corner_angles_sum_to_pi() {
        let triangle = [
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(2.0, 0.0, 0.0),
            Point3f::new(0.5, 1.5, 0.0),
        ];
        let total: f32 = (0..3).map(|slot| corner_angle(&triangle, slot)).sum();
        assert_relative_eq!(total, std::f32::consts::PI, epsilon = 1e-5);
        assert_relative_eq!(
            corner_angle(&make_single_triangle(), 0),
            std::f32::consts::FRAC_PI_2,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_compute_face_bases_parallel_matches_sequential() {
        let positions: Vec<Point3f> = (0..64)
            .map(|i| Point3f::new((i % 8) as f32, (i / 8) as f32, ((i * 7) % 5) as f32 * 0.1))
            .collect();
        let mut indices = Vec::new();
        for y in 0..7u32 {
            for x in 0..7u32 {
                let v = y * 8 + x;
                indices.extend_from_slice(&[v, v + 1, v + 9, v, v + 9, v + 8]);
            }
        }
        let parallel = ParallelConfig::default().with_min_parallel_len(1);
        let a = compute_face_bases(&positions, &indices, None, &parallel);
        let b = compute_face_bases(&positions, &indices, None, &ParallelConfig::sequential());
        assert_eq!(a, b);
        assert_eq!(a.len(), 98);
    }
}

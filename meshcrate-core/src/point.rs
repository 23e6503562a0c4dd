//! Point and vector types and small vector helpers

use nalgebra::{Point3, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A 2D vector with floating point components
pub type Vector2f = Vector2<f32>;

/// A 4D vector with floating point components, used for linear RGBA colors
pub type Vector4f = Vector4<f32>;

/// Texture coordinates (UV mapping)
pub type Uv = Vector2f;

/// Squared lengths below this are treated as zero
///
/// Relative to a unit reference; see `try_normalize_relative` for inputs of
/// arbitrary scale.
pub const SMALL_NUMBER: f32 = 1e-8;

/// Tangent vector with handedness information
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tangent {
    /// Tangent vector
    pub vector: Vector3f,
    /// Handedness (-1.0 or 1.0)
    pub handedness: f32,
}

impl Tangent {
    /// Create a new tangent with vector and handedness
    pub fn new(vector: Vector3f, handedness: f32) -> Self {
        Self { vector, handedness }
    }

    /// Create a tangent from a vector (handedness = 1.0)
    pub fn from_vector(vector: Vector3f) -> Self {
        Self::new(vector, 1.0)
    }

    /// Handedness snapped to exactly -1.0 or 1.0
    pub fn sign(&self) -> f32 {
        binormal_sign(self.handedness)
    }
}

impl Default for Tangent {
    fn default() -> Self {
        Self::from_vector(Vector3f::x())
    }
}

/// Snap a signed value to -1.0 or 1.0; zero and NaN map to 1.0.
pub fn binormal_sign(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Normalize `v`, or `None` when its length is (nearly) zero or not finite.
pub fn try_normalize(v: &Vector3f) -> Option<Vector3f> {
    let length_sq = v.norm_squared();
    if length_sq > SMALL_NUMBER && length_sq.is_finite() {
        Some(v / length_sq.sqrt())
    } else {
        None
    }
}

/// Normalize `v`, or `None` when `|v|²` is at most `SMALL_NUMBER * reference_sq`.
///
/// `reference_sq` is the squared magnitude of whatever `v` was built from, so
/// the cutoff is independent of model units. A zero vector is always `None`.
pub fn try_normalize_relative(v: &Vector3f, reference_sq: f32) -> Option<Vector3f> {
    let length_sq = v.norm_squared();
    if length_sq > 0.0 && length_sq > SMALL_NUMBER * reference_sq && length_sq.is_finite() {
        Some(v / length_sq.sqrt())
    } else {
        None
    }
}

/// Two unit vectors perpendicular to `normal` and to each other.
///
/// Projects the x axis onto the tangent plane, or the y axis when the normal
/// is close to x, so nearby normals get nearby axes.
pub fn orthonormal_axes(normal: &Vector3f) -> (Vector3f, Vector3f) {
    let seed = if normal.x.abs() < 0.9 {
        Vector3f::x()
    } else {
        Vector3f::y()
    };
    let tangent = try_normalize(&(seed - normal * normal.dot(&seed))).unwrap_or_else(Vector3f::x);
    let binormal = normal.cross(&tangent);
    (tangent, binormal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_binormal_sign_never_zero() {
        assert_eq!(binormal_sign(0.0), 1.0);
        assert_eq!(binormal_sign(-0.5), -1.0);
        assert_eq!(binormal_sign(3.0), 1.0);
        assert_eq!(binormal_sign(f32::NAN), 1.0);
    }

    #[test]
    fn test_try_normalize_zero() {
        assert!(try_normalize(&Vector3f::zeros()).is_none());
        let n = try_normalize(&Vector3f::new(0.0, 3.0, 4.0)).unwrap();
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_try_normalize_relative_is_scale_free() {
        for scale in [1.0f32, 1e-2, 1e-4] {
            let v = Vector3f::new(0.0, 0.0, scale * scale);
            let n = try_normalize_relative(&v, scale.powi(4)).unwrap();
            assert_eq!(n, Vector3f::z());
        }
        // Cancellation relative to the reference is rejected
        assert!(try_normalize_relative(&Vector3f::new(1e-5, 0.0, 0.0), 1.0).is_none());
        assert!(try_normalize_relative(&Vector3f::zeros(), 0.0).is_none());
    }

    #[test]
    fn test_orthonormal_axes() {
        for normal in [Vector3f::z(), Vector3f::x(), Vector3f::new(1.0, 1.0, 1.0).normalize()] {
            let (t, b) = orthonormal_axes(&normal);
            assert_relative_eq!(t.norm(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(b.norm(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(t.dot(&normal), 0.0, epsilon = 1e-5);
            assert_relative_eq!(b.dot(&t), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_tangent_sign() {
        assert_eq!(Tangent::new(Vector3f::x(), -1.0).sign(), -1.0);
        assert_eq!(Tangent::new(Vector3f::x(), 0.0).sign(), 1.0);
        assert_eq!(Tangent::default().handedness, 1.0);
    }
}

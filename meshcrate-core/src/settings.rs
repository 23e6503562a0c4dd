//! Build configuration

use crate::error::{Error, Result};
use crate::parallel::ParallelConfig;
use serde::{Deserialize, Serialize};

/// How face contributions are weighted when averaging a vertex normal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalWeighting {
    /// Every face in the smoothing group counts once
    #[default]
    Equal,
    /// Faces are weighted by their area
    Area,
    /// Faces are weighted by the angle they subtend at the vertex
    Angle,
}

/// Per-attribute tolerances used when deciding two corners are the same vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonThresholds {
    /// Maximum distance between positions
    pub position: f32,
    /// Maximum `1 - dot(a, b)` between unit normals
    pub normal: f32,
    /// Maximum `1 - dot(a, b)` between unit tangents
    pub tangent: f32,
    /// Maximum per-axis UV difference
    pub uv: f32,
    /// Maximum per-channel color difference
    pub color: f32,
}

impl Default for ComparisonThresholds {
    fn default() -> Self {
        Self {
            position: 0.00002,
            normal: 0.00002,
            tangent: 0.00002,
            uv: 1.0 / 1024.0,
            color: 1e-4,
        }
    }
}

impl ComparisonThresholds {
    /// Thresholds that only merge bit-identical attributes
    pub fn exact() -> Self {
        Self {
            position: 0.0,
            normal: 0.0,
            tangent: 0.0,
            uv: 0.0,
            color: 0.0,
        }
    }
}

/// Configuration for the mesh build pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSettings {
    /// Recompute normals even when the input supplies them
    pub recompute_normals: bool,
    /// Recompute tangents even when the input supplies them
    pub recompute_tangents: bool,
    /// Dihedral angle at or above which an edge is hard
    pub hard_angle_degrees: f32,
    /// Drop triangles that collapse after welding
    pub remove_degenerates: bool,
    /// Tolerances used by vertex deduplication
    pub thresholds: ComparisonThresholds,
    /// Face weighting for averaged normals
    pub normal_weighting: NormalWeighting,
    /// Classify edges by the input's smoothing masks when present
    pub use_smoothing_groups: bool,
    /// Split a single-group closed fan at its second-sharpest edge
    pub split_cylinder_seams: bool,
    /// UV channels below this count are generated as zeros
    pub min_uv_channels: usize,
    /// Worker pool configuration
    pub parallel: ParallelConfig,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            recompute_normals: false,
            recompute_tangents: false,
            hard_angle_degrees: 60.0,
            remove_degenerates: true,
            thresholds: ComparisonThresholds::default(),
            normal_weighting: NormalWeighting::Equal,
            use_smoothing_groups: true,
            split_cylinder_seams: true,
            min_uv_channels: 1,
            parallel: ParallelConfig::default(),
        }
    }
}

impl BuildSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings that overwrite every normal and tangent from geometry
    pub fn recompute_all() -> Self {
        Self {
            recompute_normals: true,
            recompute_tangents: true,
            ..Self::default()
        }
    }

    /// Settings that keep every authored attribute and only fill gaps
    pub fn preserve_authored() -> Self {
        Self {
            recompute_normals: false,
            recompute_tangents: false,
            remove_degenerates: false,
            split_cylinder_seams: false,
            ..Self::default()
        }
    }

    pub fn with_recompute_normals(mut self, recompute: bool) -> Self {
        self.recompute_normals = recompute;
        self
    }

    pub fn with_recompute_tangents(mut self, recompute: bool) -> Self {
        self.recompute_tangents = recompute;
        self
    }

    pub fn with_hard_angle_degrees(mut self, degrees: f32) -> Self {
        self.hard_angle_degrees = degrees;
        self
    }

    pub fn with_remove_degenerates(mut self, remove: bool) -> Self {
        self.remove_degenerates = remove;
        self
    }

    /// Set the position merge distance used by deduplication
    pub fn with_merge_distance(mut self, distance: f32) -> Self {
        self.thresholds.position = distance;
        self
    }

    pub fn with_thresholds(mut self, thresholds: ComparisonThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Weight normals by face area (`true`) or equally (`false`)
    pub fn with_weight_by_area(mut self, weight_by_area: bool) -> Self {
        self.normal_weighting = if weight_by_area {
            NormalWeighting::Area
        } else {
            NormalWeighting::Equal
        };
        self
    }

    pub fn with_normal_weighting(mut self, weighting: NormalWeighting) -> Self {
        self.normal_weighting = weighting;
        self
    }

    pub fn with_smoothing_groups(mut self, use_smoothing_groups: bool) -> Self {
        self.use_smoothing_groups = use_smoothing_groups;
        self
    }

    pub fn with_split_cylinder_seams(mut self, split: bool) -> Self {
        self.split_cylinder_seams = split;
        self
    }

    pub fn with_min_uv_channels(mut self, count: usize) -> Self {
        self.min_uv_channels = count;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// Hard angle threshold in radians
    pub fn hard_angle_radians(&self) -> f32 {
        self.hard_angle_degrees.to_radians()
    }

    /// Reject settings no build could honour
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=180.0).contains(&self.hard_angle_degrees) {
            return Err(Error::InvalidInput(format!(
                "Hard angle must be between 0 and 180 degrees, got {}",
                self.hard_angle_degrees
            )));
        }

        let t = &self.thresholds;
        for (name, value) in [
            ("position", t.position),
            ("normal", t.normal),
            ("tangent", t.tangent),
            ("uv", t.uv),
            ("color", t.color),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "The {} threshold must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        if self.min_uv_channels > crate::MAX_UV_CHANNELS {
            return Err(Error::InvalidInput(format!(
                "Cannot require {} UV channels, the maximum is {}",
                self.min_uv_channels,
                crate::MAX_UV_CHANNELS
            )));
        }

        Ok(())
    }
}

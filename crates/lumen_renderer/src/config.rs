//! Tunable engine parameters.
//!
//! Every constant the integrator, adaptive controller and BVH builder read
//! lives here, with defaults matching the reference behaviour. Both structs
//! deserialize with missing fields falling back to their defaults.

use serde::{Deserialize, Serialize};

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Deepest bounce that is still traced; deeper rays return black
    pub max_depth: u32,
    /// Per-pixel variance above which extra samples are taken
    pub target_variance: f32,
    /// Most extra samples a pixel may take in one frame
    pub sampling_cap: u32,
    /// Offset applied to secondary ray origins and the minimum hit distance
    pub epsilon: f32,
    /// Base seed for the per-pixel random streams
    pub seed: u64,
    /// Distribute rows over the rayon pool
    pub parallel: bool,
    /// Acceleration structure settings
    pub bvh: BvhConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            target_variance: 0.05,
            sampling_cap: 8,
            epsilon: 1e-4,
            seed: 0,
            parallel: true,
            bvh: BvhConfig::default(),
        }
    }
}

/// BVH construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhConfig {
    /// Nodes holding fewer primitives than this stay leaves
    pub min_split_count: usize,
    /// How a node's split plane is chosen
    pub split: SplitMethod,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            min_split_count: 5,
            split: SplitMethod::Midpoint,
        }
    }
}

/// Split plane selection for BVH construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SplitMethod {
    /// Midpoint of the node box's longest axis.
    Midpoint,
    /// Surface area heuristic evaluated at `bins` bucket boundaries per axis.
    BinnedSah { bins: usize },
}

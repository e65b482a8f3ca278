/// Rules configuration and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RulesConfig {
    /// Maximum nesting depth accepted when flattening branch results into a plan.
    pub max_flatten_depth: usize,

    /// Whether item-supplied macro overrides may replace the default flow.
    pub allow_item_macros: bool,

    /// How separation between two tokens is measured for auras.
    pub distance_metric: DistanceMetric,

    /// Distance units covered by one grid square.
    pub grid_size: f64,
}

/// Separation metric used by the aura reconciler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DistanceMetric {
    /// Straight-line distance between token centres.
    Euclidean,
    /// Chebyshev distance in whole squares (diagonals cost one square).
    #[default]
    Grid,
}

impl RulesConfig {
    // ===== compile-time limits =====
    /// Hard ceiling for `max_flatten_depth`, regardless of configuration.
    pub const FLATTEN_DEPTH_LIMIT: usize = 100;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_FLATTEN_DEPTH: usize = 32;
    pub const DEFAULT_GRID_SIZE: f64 = 5.0;

    pub fn new() -> Self {
        Self {
            max_flatten_depth: Self::DEFAULT_FLATTEN_DEPTH,
            allow_item_macros: true,
            distance_metric: DistanceMetric::default(),
            grid_size: Self::DEFAULT_GRID_SIZE,
        }
    }

    /// Effective flatten depth, clamped to [`Self::FLATTEN_DEPTH_LIMIT`].
    pub fn flatten_depth(&self) -> usize {
        self.max_flatten_depth.min(Self::FLATTEN_DEPTH_LIMIT)
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self::new()
    }
}

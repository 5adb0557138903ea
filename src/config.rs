/// Curve subdivision policy, selectable per §4.3 and recorded as an open
/// question in §9: the source toggles between an arc-length-adaptive split
/// and a forward-differenced recursive divide. Modeled as an enum dispatch
/// rather than the original's function pointers, per §9's design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CubicPolicy {
    /// Single midpoint bisection into two line segments — used for the
    /// Point16 cache and the "fast" rasterization path.
    Bisect,
    /// Forward-differenced recursive subdivision.
    Divide,
    /// Arc-length-adaptive splitting (§4.3 `splitCubic`). The spec's stated
    /// preference for correctness.
    #[default]
    Split,
}

/// Render-time configuration, passed by reference into
/// [`crate::raster::Renderer::render_list`]. Kept as a small plain-data
/// struct rather than loose parameters, mirroring the teacher's small
/// config types (e.g. `HatchParams`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Fixed shard count `K` for the worker pool (§5). Default 8.
    pub shard_count: usize,
    /// Curve flattening tolerance, in device pixels.
    pub flatness: f32,
    /// Subdivision policy for cubic segments (§9).
    pub cubic_policy: CubicPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shard_count: 8,
            flatness: 0.1,
            cubic_policy: CubicPolicy::default(),
        }
    }
}

impl RenderConfig {
    #[must_use]
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count.max(1);
        self
    }

    #[must_use]
    pub fn with_flatness(mut self, flatness: f32) -> Self {
        self.flatness = flatness;
        self
    }

    #[must_use]
    pub fn with_cubic_policy(mut self, policy: CubicPolicy) -> Self {
        self.cubic_policy = policy;
        self
    }
}

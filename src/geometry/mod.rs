//! The vector-path builder and its immutable, shareable compiled form
//! (§4.1). A [`Geometry`] is reference-counted and shared between scenes
//! (§3): it is built once via [`GeometryBuilder`] and never mutated again.

mod builder;
mod point16;
mod upper_bound;

pub use builder::GeometryBuilder;
pub use point16::{Point16, KFAST_SEGMENTS};

use std::sync::{Arc, OnceLock};

use crate::Bounds;

/// One opcode in a `Geometry`'s typed stream. Point counts: `Move`/`Line`/
/// `Close` consume one point, `Quadratic` two, `Cubic` three (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Move,
    Line,
    Quadratic,
    Cubic,
    Close,
}

impl Opcode {
    #[must_use]
    pub const fn point_count(self) -> usize {
        match self {
            Self::Move | Self::Line | Self::Close => 1,
            Self::Quadratic => 2,
            Self::Cubic => 3,
        }
    }
}

/// A shareable, immutable compiled path: opcode stream + dense point
/// stream + per-subpath bounding boxes ("molecules") + a lazily-built
/// Point16 cache + content hash + curvature estimators.
///
/// Built once by [`GeometryBuilder::build`]; shared by reference count
/// between every [`crate::scene::Scene`] item that draws it (§3, §9).
#[derive(Debug)]
pub struct Geometry {
    pub(crate) types: Vec<Opcode>,
    /// Dense `[x0, y0, x1, y1, ...]` stream; `points.len() == 2 * Σ
    /// op.point_count()`.
    pub(crate) points: Vec<f32>,
    /// Per-subpath AABB.
    pub(crate) molecules: Vec<Bounds>,
    pub(crate) bounds: Bounds,
    /// `Σ ⌈⁴√|cubic coefficient|²⌉` over all cubic segments — a cheap
    /// curvature-budget estimator used by [`Self::upper_bound`].
    pub(crate) cubic_sums: f32,
    /// Largest squared control-to-chord distance seen while building —
    /// used to decide the "fits a single molecule tile" fast path (§4.8).
    pub(crate) max_dot: f32,

    p16: OnceLock<point16::Point16Cache>,
    xxhash: OnceLock<u64>,
    /// `upper_bound(kMinUpperDet)`, memoized the first time it's needed
    /// (§4.2 step 3, §11).
    min_upper: OnceLock<u32>,
}

/// Conservative determinant below which callers should use the memoized
/// [`Geometry::min_upper`] bound rather than recompute per item (§11).
pub const K_MIN_UPPER_DET: f32 = 1e-3;

impl Geometry {
    #[must_use]
    pub fn types(&self) -> &[Opcode] {
        &self.types
    }

    #[must_use]
    pub fn points(&self) -> &[f32] {
        &self.points
    }

    #[must_use]
    pub fn molecules(&self) -> &[Bounds] {
        &self.molecules
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[must_use]
    pub fn has_molecules(&self) -> bool {
        self.molecules.len() > 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// `types.begin()..types.end()` validity per §3: must start with `Move`
    /// and have more than a single opcode.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.types.len() > 1 && matches!(self.types.first(), Some(Opcode::Move))
    }

    /// 64-bit content hash over the typed opcode and point streams,
    /// computed lazily and memoized (§3, §8 invariant 5/6).
    #[must_use]
    pub fn hash(&self) -> u64 {
        *self.xxhash.get_or_init(|| {
            use std::hash::Hasher;
            let mut h = twox_hash::XxHash64::with_seed(0);
            for op in &self.types {
                h.write_u8(*op as u8);
            }
            h.write(bytemuck::cast_slice(&self.points));
            h.finish()
        })
    }

    /// The lazily-built Point16 quantised cache (§4.1).
    #[must_use]
    pub fn point16_cache(&self) -> &point16::Point16Cache {
        self.p16.get_or_init(|| point16::Point16Cache::build(self))
    }

    /// Closed-form upper bound on the number of line segments this path's
    /// subdivision can produce at transform determinant `det` (§4.8, §11).
    /// Below [`K_MIN_UPPER_DET`] the memoized worst-case bound is reused
    /// instead of recomputed.
    #[must_use]
    pub fn upper_bound(&self, det: f32) -> u32 {
        if det < K_MIN_UPPER_DET {
            return *self
                .min_upper
                .get_or_init(|| upper_bound::upper_bound(self, K_MIN_UPPER_DET));
        }
        upper_bound::upper_bound(self, det)
    }
}

/// A shared, ref-counted `Geometry` (§9 design note: explicit atomic
/// reference count rather than the original's intrusive one).
pub type GeometryRef = Arc<Geometry>;

impl Opcode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_opcode_point_counts() {
        assert_eq!(Opcode::Move.point_count(), 1);
        assert_eq!(Opcode::Line.point_count(), 1);
        assert_eq!(Opcode::Quadratic.point_count(), 2);
        assert_eq!(Opcode::Cubic.point_count(), 3);
        assert_eq!(Opcode::Close.point_count(), 1);
    }
}

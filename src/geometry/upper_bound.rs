//! Closed-form bound on the number of flattened line segments a
//! [`Geometry`]'s curves can produce under a transform of a given
//! determinant, used to size per-shard scratch buffers before rasterizing
//! without a dry-run subdivision pass (§4.2 step 3, §4.8, §11).

use super::Geometry;

/// Number of straight-line segments a `Move`/`Line`/`Close` opcode always
/// contributes (itself).
const LINE_SEGMENTS: u32 = 1;

/// `upper_bound(det) = lines + Σ cubic_sums * scale + quadratic overhead`,
/// where `scale` grows the finer the transform magnifies the path (lower
/// `det` implies more magnification, hence more subdivision).
///
/// This mirrors the original's closed-form estimator: rather than walking
/// the curve to count exact output, it bounds worst-case segment count
/// from `cubic_sums` (a curvature budget accumulated at build time) and
/// `max_dot` (worst single-segment control deviation), scaled by how much
/// the transform can additionally magnify a unit of curvature.
pub fn upper_bound(geometry: &Geometry, det: f32) -> u32 {
    let line_count = geometry
        .types()
        .iter()
        .filter(|op| !matches!(op, super::Opcode::Quadratic | super::Opcode::Cubic))
        .count() as u32;

    let safe_det = det.max(f32::EPSILON);
    // Magnification factor: subdivision depth grows as the inverse fourth
    // root of the determinant, matching the quarter-power curvature
    // estimator accumulated into `cubic_sums` at build time.
    let magnification = (1.0 / safe_det).sqrt().sqrt().max(1.0);

    let curve_count = geometry
        .types()
        .iter()
        .filter(|op| matches!(op, super::Opcode::Quadratic | super::Opcode::Cubic))
        .count() as u32;

    let curvature_budget = (geometry.cubic_sums + geometry.max_dot.sqrt()) * magnification;

    line_count * LINE_SEGMENTS + curve_count + curvature_budget.ceil() as u32 + 1
}

//! Quadratic flattening: turns a single transformed quadratic Bezier into
//! a polyline within a flatness tolerance (§4.3).

use super::util::{Vec2, dot, lerp, sub};

/// Adaptive flattening by recursive de Casteljau bisection (`bisectQuadratic`
/// in the original): split at `t = 0.5` until the control point's deviation
/// from the chord is within `flatness`, then emit the endpoint.
pub fn bisect_quadratic(p0: Vec2, p1: Vec2, p2: Vec2, flatness: f32, out: &mut Vec<Vec2>) {
    bisect_quadratic_impl(p0, p1, p2, flatness, 0, out);
}

fn bisect_quadratic_impl(p0: Vec2, p1: Vec2, p2: Vec2, flatness: f32, depth: u32, out: &mut Vec<Vec2>) {
    if depth >= 24 || is_flat_quadratic(p0, p1, p2, flatness) {
        out.push(p2);
        return;
    }
    let p01 = lerp(p0, p1, 0.5);
    let p12 = lerp(p1, p2, 0.5);
    let mid = lerp(p01, p12, 0.5);
    bisect_quadratic_impl(p0, p01, mid, flatness, depth + 1, out);
    bisect_quadratic_impl(mid, p12, p2, flatness, depth + 1, out);
}

/// Fixed-arity flattening (`divideQuadratic` in the original): evaluate the
/// curve at `n` uniform parametric steps rather than adapting to local
/// curvature. Used where a caller already knows the required segment
/// count (e.g. from [`crate::Geometry::upper_bound`]) and wants to avoid
/// the recursion in [`bisect_quadratic`].
pub fn divide_quadratic(p0: Vec2, p1: Vec2, p2: Vec2, n: u32, out: &mut Vec<Vec2>) {
    let n = n.max(1);
    for i in 1..=n {
        let t = i as f32 / n as f32;
        out.push(eval_quadratic(p0, p1, p2, t));
    }
}

pub(crate) fn eval_quadratic(p0: Vec2, p1: Vec2, p2: Vec2, t: f32) -> Vec2 {
    let a = lerp(p0, p1, t);
    let b = lerp(p1, p2, t);
    lerp(a, b, t)
}

/// De Casteljau split at `t`, returning `(left_piece, point_at_t, right_piece)`.
pub(crate) fn split_quadratic_at(p0: Vec2, p1: Vec2, p2: Vec2, t: f32) -> ((Vec2, Vec2, Vec2), Vec2, (Vec2, Vec2, Vec2)) {
    let p01 = lerp(p0, p1, t);
    let p12 = lerp(p1, p2, t);
    let mid = lerp(p01, p12, t);
    ((p0, p01, mid), mid, (mid, p12, p2))
}

/// Extracts the sub-curve over parameter range `[ta, tb]` (`0 <= ta <= tb
/// <= 1`) as a new quadratic control triple, via two de Casteljau splits
/// (§4.3 analytic clip: re-curving a retained piece after a boundary-
/// crossing solve).
pub(crate) fn subcurve_quadratic(p0: Vec2, p1: Vec2, p2: Vec2, ta: f32, tb: f32) -> (Vec2, Vec2, Vec2) {
    let (_, _, right) = split_quadratic_at(p0, p1, p2, ta);
    let denom = (1.0 - ta).max(1e-6);
    let t2 = ((tb - ta) / denom).clamp(0.0, 1.0);
    let (left, _, _) = split_quadratic_at(right.0, right.1, right.2, t2);
    left
}

/// Real roots in `t` of `a*t^2 + b*t + c = 0`, degrading to the linear
/// case as `a` vanishes.
fn solve_quadratic_roots(a: f32, b: f32, c: f32) -> arrayvec::ArrayVec<f32, 2> {
    let mut roots = arrayvec::ArrayVec::new();
    if a.abs() < 1e-9 {
        if b.abs() > 1e-9 {
            roots.push(-c / b);
        }
        return roots;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return roots;
    }
    let sq = disc.sqrt();
    roots.push((-b - sq) / (2.0 * a));
    roots.push((-b + sq) / (2.0 * a));
    roots
}

/// Parameter values where `p0..p1` (via control `p1`) crosses one of
/// `bounds`'s four edges, solved analytically per axis (§4.3: "solving `A
/// t^2 + B t + C = y_clip` ... for up to four boundary crossings"),
/// together with the curve's own endpoints `0` and `1`, sorted and
/// deduplicated so consecutive pairs bound the curve's inside/outside
/// pieces.
#[must_use]
pub(crate) fn quad_boundary_ts(p0: Vec2, ctrl: Vec2, p1: Vec2, bounds: &crate::Bounds) -> Vec<f32> {
    let ax = p0.0 - 2.0 * ctrl.0 + p1.0;
    let bx = 2.0 * (ctrl.0 - p0.0);
    let cx = p0.0;
    let ay = p0.1 - 2.0 * ctrl.1 + p1.1;
    let by = 2.0 * (ctrl.1 - p0.1);
    let cy = p0.1;

    let mut ts: Vec<f32> = Vec::new();
    for bound in [bounds.lx, bounds.ux] {
        ts.extend(solve_quadratic_roots(ax, bx, cx - bound));
    }
    for bound in [bounds.ly, bounds.uy] {
        ts.extend(solve_quadratic_roots(ay, by, cy - bound));
    }
    ts.retain(|t| *t > 1e-5 && *t < 1.0 - 1e-5);
    ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    ts.dedup_by(|a, b| (*a - *b).abs() < 1e-5);

    let mut all = Vec::with_capacity(ts.len() + 2);
    all.push(0.0);
    all.extend(ts);
    all.push(1.0);
    all
}

/// True when the control point's perpendicular distance from the chord
/// `p0..p2` is within `flatness`.
fn is_flat_quadratic(p0: Vec2, p1: Vec2, p2: Vec2, flatness: f32) -> bool {
    let chord = sub(p2, p0);
    let chord_len2 = dot(chord, chord);
    if chord_len2 < f32::EPSILON {
        return true;
    }
    let to_ctrl = sub(p1, p0);
    let cross = chord.0 * to_ctrl.1 - chord.1 * to_ctrl.0;
    let dist2 = (cross * cross) / chord_len2;
    dist2 <= flatness * flatness
}

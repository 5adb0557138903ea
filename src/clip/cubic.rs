//! Cubic flattening: turns a single transformed cubic Bezier into a
//! polyline, dispatched on [`CubicPolicy`] (§4.3, §9).

use arrayvec::ArrayVec;

use crate::CubicPolicy;

use super::util::{Vec2, cardano_roots, dot, lerp, sub};

pub fn flatten_cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, flatness: f32, policy: CubicPolicy, out: &mut Vec<Vec2>) {
    match policy {
        CubicPolicy::Bisect => bisect_cubic(p0, p1, p2, p3, flatness, out),
        CubicPolicy::Divide => divide_cubic(p0, p1, p2, p3, flatness, out),
        CubicPolicy::Split => split_cubic(p0, p1, p2, p3, flatness, out),
    }
}

/// Single midpoint bisection: one de Casteljau split regardless of local
/// curvature, then a straight line to each half's endpoint. Cheap, used on
/// the "fast"/molecule path where curvature was already bounded at build
/// time (§4.8).
pub fn bisect_cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, _flatness: f32, out: &mut Vec<Vec2>) {
    let (_, mid, _) = de_casteljau_split(p0, p1, p2, p3, 0.5);
    out.push(mid);
    out.push(p3);
}

/// Forward-differenced recursive subdivision: split at `t = 0.5` while the
/// curve isn't flat, exactly like [`super::quad::bisect_quadratic`] but
/// walking the cubic's control polygon deviation test.
pub fn divide_cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, flatness: f32, out: &mut Vec<Vec2>) {
    divide_cubic_impl(p0, p1, p2, p3, flatness, 0, out);
}

fn divide_cubic_impl(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, flatness: f32, depth: u32, out: &mut Vec<Vec2>) {
    if depth >= 24 || is_flat_cubic(p0, p1, p2, p3, flatness) {
        out.push(p3);
        return;
    }
    let (left, _, right) = de_casteljau_split(p0, p1, p2, p3, 0.5);
    let (l0, l1, l2, l3) = left;
    divide_cubic_impl(l0, l1, l2, l3, flatness, depth + 1, out);
    let (r0, r1, r2, r3) = right;
    divide_cubic_impl(r0, r1, r2, r3, flatness, depth + 1, out);
}

/// Splits at the cubic's inflection points (found via Cardano's method on
/// the curvature-sign cubic) before adaptively flattening each resulting
/// piece — avoids the adaptive subdivider over- or under-sampling across a
/// sign change in curvature (§4.3 `splitCubic`, §11).
pub fn split_cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, flatness: f32, out: &mut Vec<Vec2>) {
    let mut ts: Vec<f32> = inflection_ts(p0, p1, p2, p3)
        .into_iter()
        .filter(|t| *t > 1e-4 && *t < 1.0 - 1e-4)
        .collect();
    ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    ts.dedup_by(|a, b| (*a - *b).abs() < 1e-4);

    // Peel off one piece per breakpoint, re-parameterizing the remaining
    // tail curve at each step so every local split is relative to [0, 1].
    let mut remaining = (p0, p1, p2, p3);
    let mut prev_global_t = 0.0;
    for global_t in ts {
        let local_t = (global_t - prev_global_t) / (1.0 - prev_global_t).max(f32::EPSILON);
        let (left, _, right) = de_casteljau_split(remaining.0, remaining.1, remaining.2, remaining.3, local_t.clamp(0.0, 1.0));
        divide_cubic_impl(left.0, left.1, left.2, left.3, flatness, 0, out);
        remaining = right;
        prev_global_t = global_t;
    }
    divide_cubic_impl(remaining.0, remaining.1, remaining.2, remaining.3, flatness, 0, out);
}

/// Real roots in `t` of the curvature-sign cubic `cross(d1, d2) = 0`,
/// where `d1`/`d2` are the curve's first and second derivatives — the
/// standard Bezier inflection-point condition, solved via Cardano's
/// method rather than Newton iteration.
fn inflection_ts(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> ArrayVec<f32, 3> {
    // Bezier-to-monomial: B(t) = a*t^3 + b*t^2 + c*t + p0
    let a = (
        p3.0 - 3.0 * p2.0 + 3.0 * p1.0 - p0.0,
        p3.1 - 3.0 * p2.1 + 3.0 * p1.1 - p0.1,
    );
    let b = (3.0 * p2.0 - 6.0 * p1.0 + 3.0 * p0.0, 3.0 * p2.1 - 6.0 * p1.1 + 3.0 * p0.1);
    let c = (3.0 * p1.0 - 3.0 * p0.0, 3.0 * p1.1 - 3.0 * p0.1);

    // B'(t) = 3a t^2 + 2b t + c; B''(t) = 6a t + 2b
    // cross(B', B'') = 3a t^2+2b t+c  ×  6a t+2b, collected in t.
    let cross3 = |u: Vec2, v: Vec2| u.0 * v.1 - u.1 * v.0;

    let k3 = 18.0 * cross3(a, a); // always 0, kept for clarity of derivation
    let k2 = 18.0 * cross3(a, b);
    let k1 = 6.0 * cross3(a, c) + 12.0 * cross3(b, b);
    let k0 = 6.0 * cross3(b, c);

    cardano_roots(k3, k2, k1, k0)
}

fn is_flat_cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, flatness: f32) -> bool {
    let chord = sub(p3, p0);
    let chord_len2 = dot(chord, chord);
    if chord_len2 < f32::EPSILON {
        return dot(sub(p1, p0), sub(p1, p0)) < flatness * flatness
            && dot(sub(p2, p0), sub(p2, p0)) < flatness * flatness;
    }
    let d1 = sub(p1, p0);
    let d2 = sub(p2, p0);
    let c1 = chord.0 * d1.1 - chord.1 * d1.0;
    let c2 = chord.0 * d2.1 - chord.1 * d2.0;
    let dist1_2 = (c1 * c1) / chord_len2;
    let dist2_2 = (c2 * c2) / chord_len2;
    dist1_2.max(dist2_2) <= flatness * flatness
}

pub(crate) type CubicPts = (Vec2, Vec2, Vec2, Vec2);

/// De Casteljau split at `t`, returning `(left_piece, point_at_t, right_piece)`.
pub(crate) fn de_casteljau_split(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> (CubicPts, Vec2, CubicPts) {
    let p01 = lerp(p0, p1, t);
    let p12 = lerp(p1, p2, t);
    let p23 = lerp(p2, p3, t);
    let p012 = lerp(p01, p12, t);
    let p123 = lerp(p12, p23, t);
    let mid = lerp(p012, p123, t);

    ((p0, p01, p012, mid), mid, (mid, p123, p23, p3))
}

/// Extracts the sub-curve over parameter range `[ta, tb]` (`0 <= ta <= tb
/// <= 1`) as a new cubic control quadruple, via two de Casteljau splits
/// (mirrors [`super::quad::subcurve_quadratic`] for the cubic case).
pub(crate) fn subcurve_cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, ta: f32, tb: f32) -> CubicPts {
    let (_, _, right) = de_casteljau_split(p0, p1, p2, p3, ta);
    let denom = (1.0 - ta).max(1e-6);
    let t2 = ((tb - ta) / denom).clamp(0.0, 1.0);
    let (left, _, _) = de_casteljau_split(right.0, right.1, right.2, right.3, t2);
    left
}

/// Parameter values where the cubic crosses one of `bounds`'s four edges,
/// solved analytically per axis via Bezier-to-monomial conversion and
/// [`cardano_roots`] (§4.3), together with the curve's own endpoints `0`
/// and `1`, sorted and deduplicated.
#[must_use]
pub(crate) fn cubic_boundary_ts(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, bounds: &crate::Bounds) -> Vec<f32> {
    let ax = p3.0 - 3.0 * p2.0 + 3.0 * p1.0 - p0.0;
    let bx = 3.0 * p2.0 - 6.0 * p1.0 + 3.0 * p0.0;
    let cx = 3.0 * p1.0 - 3.0 * p0.0;
    let dx = p0.0;
    let ay = p3.1 - 3.0 * p2.1 + 3.0 * p1.1 - p0.1;
    let by = 3.0 * p2.1 - 6.0 * p1.1 + 3.0 * p0.1;
    let cy = 3.0 * p1.1 - 3.0 * p0.1;
    let dy = p0.1;

    let mut ts: Vec<f32> = Vec::new();
    for bound in [bounds.lx, bounds.ux] {
        ts.extend(cardano_roots(ax, bx, cx, dx - bound));
    }
    for bound in [bounds.ly, bounds.uy] {
        ts.extend(cardano_roots(ay, by, cy, dy - bound));
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

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bisect_cubic_emits_two_points() {
        let mut out = Vec::new();
        bisect_cubic((0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), 0.1, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(*out.last().unwrap(), (10.0, 0.0));
    }

    #[test]
    fn test_divide_cubic_straight_line_emits_one_point() {
        let mut out = Vec::new();
        divide_cubic((0.0, 0.0), (3.3, 0.0), (6.6, 0.0), (10.0, 0.0), 0.01, &mut out);
        assert_eq!(out, vec![(10.0, 0.0)]);
    }

    #[test]
    fn test_divide_cubic_curved_emits_multiple_points() {
        let mut out = Vec::new();
        divide_cubic((0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), 0.01, &mut out);
        assert!(out.len() > 1);
        assert_eq!(*out.last().unwrap(), (10.0, 0.0));
    }

    #[test]
    fn test_split_cubic_reaches_endpoint() {
        // S-shaped curve with an inflection point.
        let mut out = Vec::new();
        split_cubic((0.0, 0.0), (-5.0, 1.0), (5.0, 2.0), (0.0, 3.0), 0.01, &mut out);
        assert_eq!(*out.last().unwrap(), (0.0, 3.0));
        assert!(out.len() > 1);
    }

    #[test]
    fn test_flatten_cubic_dispatches_by_policy() {
        let mut out_a = Vec::new();
        flatten_cubic(
            (0.0, 0.0),
            (0.0, 10.0),
            (10.0, 10.0),
            (10.0, 0.0),
            0.01,
            CubicPolicy::Divide,
            &mut out_a,
        );
        let mut out_b = Vec::new();
        flatten_cubic(
            (0.0, 0.0),
            (0.0, 10.0),
            (10.0, 10.0),
            (10.0, 0.0),
            0.01,
            CubicPolicy::Bisect,
            &mut out_b,
        );
        assert!(!out_a.is_empty());
        assert!(!out_b.is_empty());
    }
}

//! Polygon clipping against an axis-aligned rectangle (§4.3, §11).
//!
//! Ported from the Crop-by-half-plane strategy in the teacher's Bezier
//! cropper (four sequential half-plane passes, one per rectangle edge) but
//! applied to an already-flattened polygon rather than a single curve
//! segment, and over `f32` device-space points rather than `f64` authoring
//! points. Clipping a closed polygon sequentially against each half-plane
//! this way naturally produces the "virtual" boundary-hugging edges a
//! scanline rasterizer needs to keep winding correct when a contour exits
//! and re-enters the rectangle (§11).

use crate::Bounds;

use super::util::Vec2;

enum HalfPlane {
    Left,
    Right,
    Top,
    Bottom,
}

impl HalfPlane {
    #[inline]
    fn inside(&self, p: Vec2, b: &Bounds) -> bool {
        match self {
            Self::Left => p.0 >= b.lx,
            Self::Right => p.0 <= b.ux,
            Self::Top => p.1 >= b.ly,
            Self::Bottom => p.1 <= b.uy,
        }
    }

    #[inline]
    fn intersect(&self, a: Vec2, b: Vec2, bounds: &Bounds) -> Vec2 {
        let t = match self {
            Self::Left => (bounds.lx - a.0) / (b.0 - a.0),
            Self::Right => (bounds.ux - a.0) / (b.0 - a.0),
            Self::Top => (bounds.ly - a.1) / (b.1 - a.1),
            Self::Bottom => (bounds.uy - a.1) / (b.1 - a.1),
        };
        (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
    }
}

/// Clips a closed polygon (implicitly wrapping last-to-first) against
/// `bounds`, one half-plane at a time. Returns an empty vector when the
/// polygon lies entirely outside.
#[must_use]
pub fn clip_polygon(points: &[Vec2], bounds: &Bounds) -> Vec<Vec2> {
    if points.is_empty() {
        return Vec::new();
    }
    let planes = [HalfPlane::Left, HalfPlane::Right, HalfPlane::Top, HalfPlane::Bottom];
    let mut current = points.to_vec();
    for plane in &planes {
        if current.is_empty() {
            break;
        }
        current = clip_against_half_plane(&current, plane, bounds);
    }
    current
}

fn clip_against_half_plane(points: &[Vec2], plane: &HalfPlane, bounds: &Bounds) -> Vec<Vec2> {
    let mut out = Vec::with_capacity(points.len() + 2);
    let n = points.len();
    for i in 0..n {
        let curr = points[i];
        let prev = points[(i + n - 1) % n];
        let curr_in = plane.inside(curr, bounds);
        let prev_in = plane.inside(prev, bounds);

        if curr_in != prev_in {
            out.push(plane.intersect(prev, curr, bounds));
        }
        if curr_in {
            out.push(curr);
        }
    }
    out
}

/// Clips a single open segment `a..b` against `bounds` (Liang-Barsky),
/// used for strokes and other non-closed geometry where polygon clipping
/// doesn't apply.
#[must_use]
pub fn clip_segment(a: Vec2, b: Vec2, bounds: &Bounds) -> Option<(Vec2, Vec2)> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    let checks = [
        (-dx, a.0 - bounds.lx),
        (dx, bounds.ux - a.0),
        (-dy, a.1 - bounds.ly),
        (dy, bounds.uy - a.1),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            if r > t0 {
                t0 = r;
            }
        } else {
            if r < t0 {
                return None;
            }
            if r < t1 {
                t1 = r;
            }
        }
    }

    if t0 > t1 {
        return None;
    }
    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clip_polygon_fully_inside_is_unchanged() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let poly = vec![(1.0, 1.0), (5.0, 1.0), (5.0, 5.0)];
        let clipped = clip_polygon(&poly, &b);
        assert_eq!(clipped, poly);
    }

    #[test]
    fn test_clip_polygon_fully_outside_is_empty() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let poly = vec![(20.0, 20.0), (25.0, 20.0), (25.0, 25.0)];
        assert!(clip_polygon(&poly, &b).is_empty());
    }

    #[test]
    fn test_clip_polygon_overhanging_rect_is_truncated() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        // Square straddling the right edge.
        let poly = vec![(5.0, 2.0), (15.0, 2.0), (15.0, 8.0), (5.0, 8.0)];
        let clipped = clip_polygon(&poly, &b);
        assert!(clipped.iter().all(|p| p.0 <= 10.0 + 1e-4));
        assert!(!clipped.is_empty());
    }

    #[test]
    fn test_clip_segment_partial_overlap() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let seg = clip_segment((-5.0, 5.0), (15.0, 5.0), &b);
        let (p0, p1) = seg.unwrap();
        assert!((p0.0 - 0.0).abs() < 1e-4);
        assert!((p1.0 - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_clip_segment_fully_outside_is_none() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(clip_segment((20.0, 20.0), (30.0, 30.0), &b).is_none());
    }
}

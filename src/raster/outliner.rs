//! Stroke outlining (§4.1 "Outliner"): turns a flattened polyline into a
//! sequence of [`crate::raster::Segment`]s ring-linked to their
//! neighbors, so downstream join/cap geometry can look sideways without
//! re-walking the whole subpath.

use crate::raster::Segment;

/// Builds ring-linked stroke segments for one subpath's flattened points.
/// `closed` wraps `prev`/`next` around the ring instead of terminating
/// with the `-1` sentinel a cap renderer uses to tell it's at an open end
/// (§3 `RoundCap`/`SquareCap` flags apply only at those sentinel ends).
#[must_use]
pub fn outline(points: &[(f32, f32)], width: f32, closed: bool) -> Vec<Segment> {
    if points.len() < 2 {
        return Vec::new();
    }

    let n = points.len() - 1;
    let mut segments = Vec::with_capacity(n);
    for i in 0..n {
        let prev = if i == 0 {
            if closed { (n - 1) as i32 } else { -1 }
        } else {
            (i - 1) as i32
        };
        let next = if i + 1 == n {
            if closed { 0 } else { -1 }
        } else {
            (i + 1) as i32
        };
        segments.push(Segment {
            p0: [points[i].0, points[i].1],
            p1: [points[i + 1].0, points[i + 1].1],
            width,
            prev,
            next,
        });
    }
    segments
}

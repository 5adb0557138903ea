//! Subdivision and clipping: walks a [`Geometry`]'s opcode stream in a
//! given transform and clips each primitive analytically — in curve
//! parameter space for quadratics/cubics, by Liang-Barsky for lines —
//! against a device-space rectangle (§4.3).

mod cubic;
mod line;
mod quad;
mod util;

pub use cubic::{bisect_cubic, divide_cubic, flatten_cubic, split_cubic};
pub use line::{clip_polygon, clip_segment};
pub use quad::{bisect_quadratic, divide_quadratic};

use crate::{Bounds, CubicPolicy, Geometry, Opcode, Transform, SAME_POINT_EPSILON};

/// Receives clipped, flattened line segments from [`divide_geometry`], one
/// `line` call per output edge, with contour boundaries marked by
/// [`Visitor::close`] and (optionally) [`Visitor::mark`].
pub trait Visitor {
    /// A single flattened, clipped line segment within the current contour.
    fn line(&mut self, p0: (f32, f32), p1: (f32, f32));

    /// Called once a contour's segments have all been emitted. `closed`
    /// is `true` when the source subpath ended in an explicit `Close`
    /// opcode rather than being auto-closed for fill purposes.
    fn close(&mut self, closed: bool) {
        let _ = closed;
    }

    /// Called at the start of a subpath when the caller asked for
    /// subpath-boundary markers (the `mark` flag of [`divide_geometry`]).
    fn mark(&mut self) {}
}

/// Pushes `p` onto the visitor's pen, drawing `pen -> p` first if the pen
/// is already down and the two points differ. Leaving the pen untouched
/// across an invisible (clipped-away) span is what turns the next visible
/// entry point into an automatic winding-preserving bridge, without ever
/// constructing a literal vertical "virtual edge" (§11).
fn emit_point(visitor: &mut dyn Visitor, pen: &mut Option<(f32, f32)>, p: (f32, f32)) {
    if let Some(prev) = *pen {
        if (prev.0 - p.0).abs() > SAME_POINT_EPSILON || (prev.1 - p.1).abs() > SAME_POINT_EPSILON {
            visitor.line(prev, p);
        }
    }
    *pen = Some(p);
}

fn process_line(p0: (f32, f32), p1: (f32, f32), bounds: &Bounds, unclipped: bool, visitor: &mut dyn Visitor, pen: &mut Option<(f32, f32)>) {
    if unclipped {
        if pen.is_none() {
            *pen = Some(p0);
        }
        emit_point(visitor, pen, p1);
        return;
    }
    if let Some((a, b)) = clip_segment(p0, p1, bounds) {
        emit_point(visitor, pen, a);
        emit_point(visitor, pen, b);
    }
}

fn process_quadratic(
    p0: (f32, f32),
    ctrl: (f32, f32),
    p1: (f32, f32),
    bounds: &Bounds,
    flatness: f32,
    unclipped: bool,
    visitor: &mut dyn Visitor,
    pen: &mut Option<(f32, f32)>,
) {
    if unclipped {
        if pen.is_none() {
            *pen = Some(p0);
        }
        let mut out = Vec::new();
        bisect_quadratic(p0, ctrl, p1, flatness, &mut out);
        for p in out {
            emit_point(visitor, pen, p);
        }
        return;
    }
    let ts = quad::quad_boundary_ts(p0, ctrl, p1, bounds);
    for w in ts.windows(2) {
        let (ta, tb) = (w[0], w[1]);
        let mid = quad::eval_quadratic(p0, ctrl, p1, (ta + tb) * 0.5);
        if !bounds.contains(mid.0, mid.1) {
            continue;
        }
        let (sp0, sctrl, sp1) = if ta <= 0.0 && tb >= 1.0 {
            (p0, ctrl, p1)
        } else {
            quad::subcurve_quadratic(p0, ctrl, p1, ta, tb)
        };
        emit_point(visitor, pen, sp0);
        let mut out = Vec::new();
        bisect_quadratic(sp0, sctrl, sp1, flatness, &mut out);
        for p in out {
            emit_point(visitor, pen, p);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn process_cubic(
    p0: (f32, f32),
    c1: (f32, f32),
    c2: (f32, f32),
    p1: (f32, f32),
    bounds: &Bounds,
    flatness: f32,
    cubic_policy: CubicPolicy,
    unclipped: bool,
    visitor: &mut dyn Visitor,
    pen: &mut Option<(f32, f32)>,
) {
    if unclipped {
        if pen.is_none() {
            *pen = Some(p0);
        }
        let mut out = Vec::new();
        flatten_cubic(p0, c1, c2, p1, flatness, cubic_policy, &mut out);
        for p in out {
            emit_point(visitor, pen, p);
        }
        return;
    }
    let ts = cubic::cubic_boundary_ts(p0, c1, c2, p1, bounds);
    for w in ts.windows(2) {
        let (ta, tb) = (w[0], w[1]);
        let (_, mid, _) = cubic::de_casteljau_split(p0, c1, c2, p1, (ta + tb) * 0.5);
        if !bounds.contains(mid.0, mid.1) {
            continue;
        }
        let (sp0, sc1, sc2, sp1) = if ta <= 0.0 && tb >= 1.0 {
            (p0, c1, c2, p1)
        } else {
            cubic::subcurve_cubic(p0, c1, c2, p1, ta, tb)
        };
        emit_point(visitor, pen, sp0);
        let mut out = Vec::new();
        flatten_cubic(sp0, sc1, sc2, sp1, flatness, cubic_policy, &mut out);
        for p in out {
            emit_point(visitor, pen, p);
        }
    }
}

fn finish_subpath(
    cursor: (f32, f32),
    subpath_start: (f32, f32),
    has_subpath: bool,
    saw_close: bool,
    polygon: bool,
    unclipped: bool,
    bounds: &Bounds,
    visitor: &mut dyn Visitor,
    pen: &mut Option<(f32, f32)>,
) {
    if !has_subpath {
        return;
    }
    if polygon {
        process_line(cursor, subpath_start, bounds, unclipped, visitor, pen);
    }
    visitor.close(saw_close);
    *pen = None;
}

/// Subdivides and clips every subpath of `geometry` under `transform`,
/// driving `visitor` with the resulting line segments.
///
/// - `unclipped`: skip the rectangle clip entirely (strokes outline their
///   full shape; the clip happens downstream of the outliner instead).
/// - `polygon`: auto-close each subpath back to its starting point before
///   calling [`Visitor::close`] — fills need closed contours even when the
///   source geometry forgot to (stroking leaves subpaths open).
/// - `mark`: call [`Visitor::mark`] at the start of every subpath.
///
/// Quadratics and cubics are clipped analytically in curve-parameter
/// space — boundary crossings are solved per axis (quadratic formula, or
/// Cardano's method for cubics) rather than flattening first and clipping
/// the polyline (§4.3).
#[allow(clippy::too_many_arguments)]
pub fn divide_geometry(
    geometry: &Geometry,
    transform: &Transform,
    bounds: &Bounds,
    flatness: f32,
    cubic_policy: CubicPolicy,
    unclipped: bool,
    polygon: bool,
    mark: bool,
    visitor: &mut dyn Visitor,
) {
    let coords = geometry.points();
    let mut idx = 0usize;

    let mut cursor = (0.0f32, 0.0f32);
    let mut subpath_start = (0.0f32, 0.0f32);
    let mut pen: Option<(f32, f32)> = None;
    let mut saw_close = false;
    let mut has_subpath = false;

    for op in geometry.types() {
        match op {
            Opcode::Move => {
                finish_subpath(cursor, subpath_start, has_subpath, saw_close, polygon, unclipped, bounds, visitor, &mut pen);
                let p = transform.apply(coords[idx], coords[idx + 1]);
                cursor = p;
                subpath_start = p;
                saw_close = false;
                has_subpath = false;
                if mark {
                    visitor.mark();
                }
                idx += 2;
            }
            Opcode::Close => {
                let p = transform.apply(coords[idx], coords[idx + 1]);
                process_line(cursor, p, bounds, unclipped, visitor, &mut pen);
                cursor = p;
                saw_close = true;
                has_subpath = true;
                idx += 2;
            }
            Opcode::Line => {
                let p = transform.apply(coords[idx], coords[idx + 1]);
                process_line(cursor, p, bounds, unclipped, visitor, &mut pen);
                cursor = p;
                has_subpath = true;
                idx += 2;
            }
            Opcode::Quadratic => {
                let ctrl = transform.apply(coords[idx], coords[idx + 1]);
                let end = transform.apply(coords[idx + 2], coords[idx + 3]);
                process_quadratic(cursor, ctrl, end, bounds, flatness, unclipped, visitor, &mut pen);
                cursor = end;
                has_subpath = true;
                idx += 4;
            }
            Opcode::Cubic => {
                let c1 = transform.apply(coords[idx], coords[idx + 1]);
                let c2 = transform.apply(coords[idx + 2], coords[idx + 3]);
                let end = transform.apply(coords[idx + 4], coords[idx + 5]);
                process_cubic(cursor, c1, c2, end, bounds, flatness, cubic_policy, unclipped, visitor, &mut pen);
                cursor = end;
                has_subpath = true;
                idx += 6;
            }
        }
    }
    finish_subpath(cursor, subpath_start, has_subpath, saw_close, polygon, unclipped, bounds, visitor, &mut pen);
}

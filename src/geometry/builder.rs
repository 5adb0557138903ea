use std::sync::OnceLock;

use crate::Bounds;

use super::{Geometry, GeometryRef, Opcode};

#[inline]
fn sub(a: (f32, f32), b: (f32, f32)) -> (f32, f32) {
    (a.0 - b.0, a.1 - b.1)
}

#[inline]
fn dot(a: (f32, f32), b: (f32, f32)) -> f32 {
    a.0 * b.0 + a.1 * b.1
}

#[inline]
fn cross(a: (f32, f32), b: (f32, f32)) -> f32 {
    a.0 * b.1 - a.1 * b.0
}

#[inline]
fn lerp(a: (f32, f32), b: (f32, f32), t: f32) -> (f32, f32) {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

/// Cosine² threshold above which a quadratic's control point is considered
/// collinear with its chord and degraded to straight line(s) (§4.1).
const COLLINEAR_COS2: f32 = 0.999_695;

/// Squared-magnitude threshold below which a cubic's cubic coefficient is
/// considered negligible and the segment degrades to a quadratic (§4.1).
const CUBIC_DEGENERACY_THRESHOLD: f32 = 1e-2;

/// A mutable vector-path builder (§4.1). Never fails: degenerate inputs
/// (coincident points, collinear controls, near-planar cubics) are
/// sanitized rather than rejected. Call [`Self::build`] to compile into an
/// immutable, shareable [`GeometryRef`].
#[derive(Debug, Default)]
pub struct GeometryBuilder {
    types: Vec<Opcode>,
    points: Vec<f32>,
    molecules: Vec<Bounds>,
    bounds: Bounds,

    current: (f32, f32),
    subpath_start: (f32, f32),
    subpath_bounds: Bounds,
    has_subpath: bool,

    cubic_sums: f32,
    max_dot: f32,
}

impl GeometryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push_point(&mut self, p: (f32, f32)) {
        self.points.push(p.0);
        self.points.push(p.1);
        self.subpath_bounds = self.subpath_bounds.extend(p.0, p.1);
        self.bounds = self.bounds.extend(p.0, p.1);
    }

    fn close_subpath_box(&mut self) {
        if self.has_subpath {
            self.molecules.push(self.subpath_bounds);
        }
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.close_subpath_box();
        self.types.push(Opcode::Move);
        self.subpath_bounds = Bounds::EMPTY;
        self.has_subpath = true;
        self.push_point((x, y));
        self.current = (x, y);
        self.subpath_start = (x, y);
        self
    }

    /// A no-op if `(x, y)` equals the current point (§4.1).
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        if !self.has_subpath {
            return self.move_to(x, y);
        }
        if (x, y) == self.current {
            return self;
        }
        self.types.push(Opcode::Line);
        self.push_point((x, y));
        self.current = (x, y);
        self
    }

    fn emit_quadratic(&mut self, ctrl: (f32, f32), end: (f32, f32)) {
        self.types.push(Opcode::Quadratic);
        self.push_point(ctrl);
        self.push_point(end);
        self.current = end;
    }

    /// Degrades collinear controls to line segment(s), splits degenerate
    /// "spikes" at the midpoint to preserve winding, otherwise emits a
    /// `Quadratic` and updates the curvature estimator (§4.1).
    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        if !self.has_subpath {
            self.move_to(cx, cy);
        }
        let p0 = self.current;
        let ctrl = (cx, cy);
        let end = (x, y);

        let chord = sub(end, p0);
        let to_ctrl = sub(ctrl, p0);
        let chord_len2 = dot(chord, chord);
        let ctrl_len2 = dot(to_ctrl, to_ctrl);

        if chord_len2 == 0.0 && ctrl_len2 == 0.0 {
            return self;
        }

        let d = dot(chord, to_ctrl);
        let det = cross(chord, to_ctrl);
        let cos2 = if chord_len2 > 0.0 && ctrl_len2 > 0.0 {
            (d * d) / (chord_len2 * ctrl_len2)
        } else {
            1.0
        };

        if cos2 > COLLINEAR_COS2 {
            // Collinear control: degrade to one or two line segments.
            if d < 0.0 && det.abs() > f32::EPSILON {
                // Degenerate spike: split at the midpoint to preserve winding.
                let mid = lerp(p0, end, 0.5);
                self.line_to(mid.0, mid.1);
            }
            self.line_to(end.0, end.1);
            return self;
        }

        if d < 0.0 {
            // Non-collinear spike: split the curve at its parametric
            // midpoint so winding is preserved through the cusp.
            let mid = lerp(lerp(p0, ctrl, 0.5), lerp(ctrl, end, 0.5), 0.5);
            let ctrl0 = lerp(p0, ctrl, 0.5);
            let ctrl1 = lerp(ctrl, end, 0.5);
            self.emit_quadratic(ctrl0, mid);
            self.max_dot = self.max_dot.max(dot(sub(ctrl0, p0), sub(ctrl0, p0)));
            self.emit_quadratic(ctrl1, end);
            self.max_dot = self.max_dot.max(dot(sub(ctrl1, mid), sub(ctrl1, mid)));
            return self;
        }

        self.emit_quadratic(ctrl, end);
        self.max_dot = self.max_dot.max(to_ctrl.0 * to_ctrl.0 + to_ctrl.1 * to_ctrl.1);
        self
    }

    /// Degrades near-planar cubics to a quadratic via the de Casteljau
    /// midpoint rule, otherwise emits a `Cubic` and updates both curvature
    /// estimators (§4.1).
    pub fn cubic_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) -> &mut Self {
        if !self.has_subpath {
            self.move_to(c1x, c1y);
        }
        let p0 = self.current;
        let p1 = (c1x, c1y);
        let p2 = (c2x, c2y);
        let p3 = (x, y);

        // Cubic coefficient in Bezier monomial form: a = p3 - 3p2 + 3p1 - p0
        let a = (
            p3.0 - 3.0 * p2.0 + 3.0 * p1.0 - p0.0,
            p3.1 - 3.0 * p2.1 + 3.0 * p1.1 - p0.1,
        );
        let a_mag2 = dot(a, a);

        if a_mag2 < CUBIC_DEGENERACY_THRESHOLD {
            // Degrade to a quadratic via the de Casteljau midpoint rule:
            // the quadratic control point is the intersection of the two
            // legs' midpoints scaled back from the cubic's implied curve.
            let m01 = lerp(p0, p1, 0.5);
            let m12 = lerp(p1, p2, 0.5);
            let m23 = lerp(p2, p3, 0.5);
            let q_ctrl = lerp(lerp(m01, m12, 0.5), lerp(m12, m23, 0.5), 0.5);
            self.quad_to(q_ctrl.0, q_ctrl.1, x, y);
            return self;
        }

        self.types.push(Opcode::Cubic);
        self.push_point(p1);
        self.push_point(p2);
        self.push_point(p3);
        self.current = p3;

        self.cubic_sums += a_mag2.sqrt().sqrt().ceil();
        let to_ctrl = sub(p1, p0);
        self.max_dot = self
            .max_dot
            .max(dot(to_ctrl, to_ctrl))
            .max(dot(sub(p2, p3), sub(p2, p3)));
        self
    }

    /// Closes the current subpath back to its start, duplicating the
    /// start point as the `Close` opcode's point (§4.1).
    pub fn close(&mut self) -> &mut Self {
        if !self.has_subpath {
            return self;
        }
        self.types.push(Opcode::Close);
        self.push_point(self.subpath_start);
        self.current = self.subpath_start;
        self
    }

    /// Appends a rectangle as a single closed subpath.
    pub fn add_bounds(&mut self, b: Bounds) -> &mut Self {
        self.move_to(b.lx, b.ly);
        self.line_to(b.ux, b.ly);
        self.line_to(b.ux, b.uy);
        self.line_to(b.lx, b.uy);
        self.close()
    }

    /// Appends an ellipse inscribed in `b` as four cubics, using the
    /// standard circle-approximation cornering constant
    /// `(4/3)(√2 − 1)` (§4.1).
    pub fn add_ellipse(&mut self, b: Bounds) -> &mut Self {
        let cx = (b.lx + b.ux) * 0.5;
        let cy = (b.ly + b.uy) * 0.5;
        let rx = b.width() * 0.5;
        let ry = b.height() * 0.5;

        // k such that the control points sit at `k` past the tangent
        // point along each axis.
        let k = (4.0 / 3.0) * (2f32.sqrt() - 1.0);

        self.move_to(cx + rx, cy);
        self.cubic_to(cx + rx, cy + ry * k, cx + rx * k, cy + ry, cx, cy + ry);
        self.cubic_to(cx - rx * k, cy + ry, cx - rx, cy + ry * k, cx - rx, cy);
        self.cubic_to(cx - rx, cy - ry * k, cx - rx * k, cy - ry, cx, cy - ry);
        self.cubic_to(cx + rx * k, cy - ry, cx + rx, cy - ry * k, cx + rx, cy);
        self.close()
    }

    /// Appends a circular arc from `a0` to `a1` radians (measured from the
    /// positive x-axis) around `(cx, cy)` with radius `r`, as one cubic per
    /// quadrant-or-fraction-thereof.
    pub fn add_arc(&mut self, cx: f32, cy: f32, r: f32, a0: f32, a1: f32) -> &mut Self {
        let sweep = a1 - a0;
        if sweep == 0.0 {
            return self;
        }
        let segments = (sweep.abs() / (std::f32::consts::FRAC_PI_2)).ceil().max(1.0) as usize;
        let step = sweep / segments as f32;

        let point_at = |a: f32| (cx + r * a.cos(), cy + r * a.sin());
        let tangent_at = |a: f32| (-a.sin(), a.cos());

        let start = point_at(a0);
        if !self.has_subpath {
            self.move_to(start.0, start.1);
        } else if self.current != start {
            self.line_to(start.0, start.1);
        }

        // Cubic-arc control length for a sweep of `step` radians.
        let k = (4.0 / 3.0) * (step / 4.0).tan();

        let mut a = a0;
        for _ in 0..segments {
            let p0 = point_at(a);
            let t0 = tangent_at(a);
            let a_next = a + step;
            let p1 = point_at(a_next);
            let t1 = tangent_at(a_next);

            let c1 = (p0.0 + t0.0 * r * k, p0.1 + t0.1 * r * k);
            let c2 = (p1.0 - t1.0 * r * k, p1.1 - t1.1 * r * k);

            self.cubic_to(c1.0, c1.1, c2.0, c2.1, p1.0, p1.1);
            a = a_next;
        }
        self
    }

    /// Rolls back the last subpath if its bounding box has zero area
    /// (§4.1). Idempotent: calling twice in a row is a no-op the second
    /// time (§8 invariant 5).
    pub fn validate(&mut self) -> &mut Self {
        if !self.has_subpath {
            return self;
        }
        let zero_area = self.subpath_bounds.width() == 0.0 && self.subpath_bounds.height() == 0.0;
        if !zero_area {
            return self;
        }

        // Find the start of the last subpath (last Move opcode) and roll
        // back everything from there, along with its point contributions.
        let mut op_idx = self.types.len();
        let mut point_idx = self.points.len();
        while op_idx > 0 {
            op_idx -= 1;
            point_idx -= 2 * self.types[op_idx].point_count();
            if matches!(self.types[op_idx], Opcode::Move) {
                break;
            }
        }
        self.types.truncate(op_idx);
        self.points.truncate(point_idx);
        self.has_subpath = false;
        self.subpath_bounds = Bounds::EMPTY;
        self
    }

    /// Compiles the builder into an immutable, shareable [`GeometryRef`].
    /// Runs [`Self::validate`] first so the result never carries a
    /// trailing zero-area subpath.
    #[must_use]
    pub fn build(mut self) -> GeometryRef {
        self.validate();
        self.close_subpath_box();

        GeometryRef::new(Geometry {
            types: self.types,
            points: self.points,
            molecules: self.molecules,
            bounds: self.bounds,
            cubic_sums: self.cubic_sums,
            max_dot: self.max_dot,
            p16: OnceLock::new(),
            xxhash: OnceLock::new(),
            min_upper: OnceLock::new(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_line_to_noop_when_same_point() {
        let mut b = GeometryBuilder::new();
        b.move_to(0.0, 0.0);
        b.line_to(0.0, 0.0);
        let g = b.build();
        assert_eq!(g.types(), &[Opcode::Move]);
    }

    #[test]
    fn test_unit_square() {
        let mut b = GeometryBuilder::new();
        b.move_to(0.0, 0.0);
        b.line_to(10.0, 0.0);
        b.line_to(10.0, 10.0);
        b.line_to(0.0, 10.0);
        b.close();
        let g = b.build();
        assert_eq!(
            g.types(),
            &[Opcode::Move, Opcode::Line, Opcode::Line, Opcode::Line, Opcode::Close]
        );
        assert_eq!(g.bounds(), Bounds::new(0.0, 0.0, 10.0, 10.0));
        assert!(g.is_valid());
    }

    #[test]
    fn test_quad_collinear_degrades_to_line() {
        let mut b = GeometryBuilder::new();
        b.move_to(0.0, 0.0);
        b.quad_to(5.0, 0.0, 10.0, 0.0);
        let g = b.build();
        assert_eq!(g.types(), &[Opcode::Move, Opcode::Line]);
    }

    #[test]
    fn test_quad_curved_emits_quadratic() {
        let mut b = GeometryBuilder::new();
        b.move_to(0.0, 0.0);
        b.quad_to(5.0, 10.0, 10.0, 0.0);
        let g = b.build();
        assert_eq!(g.types(), &[Opcode::Move, Opcode::Quadratic]);
        assert!(g.max_dot > 0.0);
    }

    #[test]
    fn test_cubic_near_planar_degrades_to_quadratic() {
        let mut b = GeometryBuilder::new();
        b.move_to(0.0, 0.0);
        // nearly-linear cubic: tiny cubic coefficient
        b.cubic_to(3.3, 0.001, 6.6, -0.001, 10.0, 0.0);
        let g = b.build();
        assert!(matches!(g.types()[1], Opcode::Quadratic | Opcode::Line));
    }

    #[test]
    fn test_cubic_curved_emits_cubic() {
        let mut b = GeometryBuilder::new();
        b.move_to(0.0, 0.0);
        b.cubic_to(0.0, 10.0, 10.0, 10.0, 10.0, 0.0);
        let g = b.build();
        assert_eq!(g.types(), &[Opcode::Move, Opcode::Cubic]);
        assert!(g.cubic_sums > 0.0);
    }

    #[test]
    fn test_validate_rolls_back_zero_area_subpath() {
        let mut b = GeometryBuilder::new();
        b.move_to(0.0, 0.0);
        b.line_to(10.0, 10.0);
        b.move_to(5.0, 5.0); // degenerate trailing subpath, never extended
        let g = b.build();
        assert_eq!(g.types(), &[Opcode::Move, Opcode::Line]);
    }

    #[test]
    fn test_add_bounds() {
        let mut b = GeometryBuilder::new();
        b.add_bounds(Bounds::new(0.0, 0.0, 4.0, 2.0));
        let g = b.build();
        assert_eq!(g.bounds(), Bounds::new(0.0, 0.0, 4.0, 2.0));
        assert_eq!(g.molecules().len(), 1);
    }

    #[test]
    fn test_add_ellipse_bounds() {
        let mut b = GeometryBuilder::new();
        b.add_ellipse(Bounds::new(0.0, 0.0, 10.0, 10.0));
        let g = b.build();
        // four cubics should approximate the circle tightly within its box
        assert!((g.bounds().lx - 0.0).abs() < 0.1);
        assert!((g.bounds().ux - 10.0).abs() < 0.1);
    }

    #[test]
    fn test_add_ellipse_midpoint_is_on_circle() {
        // The first cubic's t=0.5 point should land within ~1% of the
        // true circle radius, not bulge past it as a wrong kappa would.
        let r = 10.0;
        let mut b = GeometryBuilder::new();
        b.add_ellipse(Bounds::new(-r, -r, r, r));
        let g = b.build();
        let pts = g.points();
        // points layout: Move(p0), Cubic(c1, c2, p1), ...
        let p0 = (pts[0], pts[1]);
        let c1 = (pts[2], pts[3]);
        let c2 = (pts[4], pts[5]);
        let p1 = (pts[6], pts[7]);

        let lerp2 = |a: (f32, f32), b: (f32, f32)| ((a.0 + b.0) * 0.5, (a.1 + b.1) * 0.5);
        let m01 = lerp2(p0, c1);
        let m12 = lerp2(c1, c2);
        let m23 = lerp2(c2, p1);
        let m012 = lerp2(m01, m12);
        let m123 = lerp2(m12, m23);
        let mid = lerp2(m012, m123);

        let dist = (mid.0 * mid.0 + mid.1 * mid.1).sqrt();
        assert!((dist - r).abs() < r * 0.01, "midpoint radius {dist} should be close to {r}");
    }

    #[test]
    fn test_hash_stable_across_identical_streams() {
        let mut b1 = GeometryBuilder::new();
        b1.move_to(0.0, 0.0).line_to(1.0, 1.0);
        let g1 = b1.build();

        let mut b2 = GeometryBuilder::new();
        b2.move_to(0.0, 0.0).line_to(1.0, 1.0);
        let g2 = b2.build();

        assert_eq!(g1.hash(), g2.hash());
    }

    #[test]
    fn test_hash_differs_for_different_geometry() {
        let mut b1 = GeometryBuilder::new();
        b1.move_to(0.0, 0.0).line_to(1.0, 1.0);
        let g1 = b1.build();

        let mut b2 = GeometryBuilder::new();
        b2.move_to(0.0, 0.0).line_to(2.0, 2.0);
        let g2 = b2.build();

        assert_ne!(g1.hash(), g2.hash());
    }
}

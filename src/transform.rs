use std::ops::Mul;

use crate::Point;

/// A 2D affine transform `(a, b, c, d, tx, ty)` mapping
/// `(x, y) ↦ (a·x + c·y + tx, b·x + d·y + ty)`.
///
/// Stored as six `f32`s, matching the on-disk layout written into
/// [`crate::raster::Buffer`]'s header region.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    #[must_use]
    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    #[must_use]
    pub fn translate(dx: f32, dy: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    #[must_use]
    pub fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    #[must_use]
    pub fn rotate(theta: f32) -> Self {
        let (s, c) = theta.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    /// Apply `self` to the point `(x, y)`.
    #[must_use]
    #[inline]
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    #[must_use]
    #[inline]
    pub fn apply_point(&self, p: Point) -> Point {
        #[allow(clippy::cast_possible_truncation)]
        let (x, y) = self.apply(p.x() as f32, p.y() as f32);
        Point::new(f64::from(x), f64::from(y))
    }

    /// `self ∘ other`: apply `other` first, then `self`.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            tx: self.a * other.tx + self.c * other.ty + self.tx,
            ty: self.b * other.tx + self.d * other.ty + self.ty,
        }
    }

    /// The determinant `ad - bc`.
    #[must_use]
    #[inline]
    pub fn det(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// The inverse transform. Per §3, a degenerate (zero-determinant)
    /// transform is returned unchanged: downstream clipping rejects the
    /// item via its zero-area device box instead.
    #[must_use]
    pub fn invert(&self) -> Self {
        let det = self.det();
        if det == 0.0 {
            return *self;
        }
        let inv_det = 1.0 / det;
        let a = self.d * inv_det;
        let b = -self.b * inv_det;
        let c = -self.c * inv_det;
        let d = self.a * inv_det;
        Self {
            a,
            b,
            c,
            d,
            tx: -(a * self.tx + c * self.ty),
            ty: -(b * self.tx + d * self.ty),
        }
    }

    /// Geometric-mean scale factor, `sqrt(|det|)`. Used to pick a
    /// curvature-independent subdivision budget (§4.1, §4.3).
    #[must_use]
    pub fn scale_factor(&self) -> f32 {
        self.det().abs().sqrt()
    }

    /// Apply `self` about the pivot `(ax, ay)`: `T(p) · self · T(-p)`.
    #[must_use]
    pub fn preconcat(&self, ax: f32, ay: f32) -> Self {
        Self::translate(ax, ay)
            .concat(self)
            .concat(&Self::translate(-ax, -ay))
    }
}

impl Mul for Transform {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.concat(&rhs)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_identity_apply() {
        let t = Transform::IDENTITY;
        assert_eq!(t.apply(3.0, 4.0), (3.0, 4.0));
    }

    #[test]
    fn test_translate_scale_concat() {
        let t = Transform::translate(10.0, 20.0).concat(&Transform::scale(2.0, 3.0));
        // scale first, then translate
        assert_eq!(t.apply(1.0, 1.0), (12.0, 23.0));
    }

    #[test]
    fn test_invert_round_trip() {
        let t = Transform::translate(5.0, -3.0)
            .concat(&Transform::rotate(0.7))
            .concat(&Transform::scale(2.0, 0.5));
        let inv = t.invert();
        let (x, y) = t.apply(3.0, 4.0);
        let (x2, y2) = inv.apply(x, y);
        assert_abs_diff_eq!(x2, 3.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y2, 4.0, epsilon = 1e-4);
    }

    #[test]
    fn test_invert_degenerate_returns_self() {
        let t = Transform::scale(0.0, 1.0);
        assert_eq!(t.invert(), t);
    }

    #[test]
    fn test_det_and_scale_factor() {
        let t = Transform::scale(2.0, 3.0);
        assert_abs_diff_eq!(t.det(), 6.0, epsilon = 1e-6);
        assert_abs_diff_eq!(t.scale_factor(), 6.0_f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_preconcat_pivot() {
        // rotating 180deg about (1,0) should map (2,0) to (0,0)
        let t = Transform::IDENTITY.preconcat(1.0, 0.0);
        let base = Transform::rotate(std::f32::consts::PI).preconcat(1.0, 0.0);
        let (x, y) = base.apply(2.0, 0.0);
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-4);
        let _ = t;
    }
}

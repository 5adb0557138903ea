//! Small 2D vector helpers shared by the line/quad/cubic clippers. Kept as
//! free functions on raw `(f32, f32)` tuples: this module never touches
//! [`crate::Point`] (authoring-precision, `f64`) or [`crate::Transform`] —
//! it's purely the hot-path device-space math (§9).

pub type Vec2 = (f32, f32);

#[inline]
pub fn sub(a: Vec2, b: Vec2) -> Vec2 {
    (a.0 - b.0, a.1 - b.1)
}

#[inline]
pub fn add(a: Vec2, b: Vec2) -> Vec2 {
    (a.0 + b.0, a.1 + b.1)
}

#[inline]
pub fn scale(a: Vec2, s: f32) -> Vec2 {
    (a.0 * s, a.1 * s)
}

#[inline]
pub fn dot(a: Vec2, b: Vec2) -> f32 {
    a.0 * b.0 + a.1 * b.1
}

#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.0 * b.1 - a.1 * b.0
}

#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

#[inline]
pub fn length(a: Vec2) -> f32 {
    dot(a, a).sqrt()
}

/// Real roots of `a*t^3 + b*t^2 + c*t + d = 0` via Cardano's method,
/// degrading to the quadratic/linear formula as leading coefficients
/// vanish. Used by [`super::cubic`] to locate inflection points.
pub fn cardano_roots(a: f32, b: f32, c: f32, d: f32) -> arrayvec::ArrayVec<f32, 3> {
    let mut roots = arrayvec::ArrayVec::new();

    if a.abs() < 1e-9 {
        if b.abs() < 1e-9 {
            if c.abs() > 1e-9 {
                roots.push(-d / c);
            }
            return roots;
        }
        let disc = c * c - 4.0 * b * d;
        if disc < 0.0 {
            return roots;
        }
        let sq = disc.sqrt();
        roots.push((-c + sq) / (2.0 * b));
        roots.push((-c - sq) / (2.0 * b));
        return roots;
    }

    // Normalize to t^3 + pt^2 + qt + r = 0.
    let p = b / a;
    let q = c / a;
    let r = d / a;

    // Depress to u^3 + Pu + Q = 0 via t = u - p/3.
    let shift = p / 3.0;
    let pp = q - p * p / 3.0;
    let qq = 2.0 * p * p * p / 27.0 - p * q / 3.0 + r;

    let disc = (qq / 2.0).powi(2) + (pp / 3.0).powi(3);

    if disc > 1e-12 {
        let sq = disc.sqrt();
        let u = cbrt(-qq / 2.0 + sq);
        let v = cbrt(-qq / 2.0 - sq);
        roots.push(u + v - shift);
    } else if disc.abs() <= 1e-12 {
        let u = cbrt(-qq / 2.0);
        roots.push(2.0 * u - shift);
        roots.push(-u - shift);
    } else {
        // Three real roots: trigonometric form.
        let r3 = (-pp / 3.0).sqrt();
        let theta = (3.0 * qq / (2.0 * pp * r3)).clamp(-1.0, 1.0).acos() / 3.0;
        for k in 0..3 {
            let angle = theta - 2.0 * std::f32::consts::PI * k as f32 / 3.0;
            roots.push(2.0 * r3 * angle.cos() - shift);
        }
    }

    roots
}

fn cbrt(x: f32) -> f32 {
    x.signum() * x.abs().powf(1.0 / 3.0)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_cardano_linear() {
        // 2t - 4 = 0 => t = 2
        let roots = cardano_roots(0.0, 0.0, 2.0, -4.0);
        assert_eq!(roots.len(), 1);
        assert_abs_diff_eq!(roots[0], 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_cardano_known_cubic_root() {
        // (t - 1)(t - 2)(t - 3) = t^3 - 6t^2 + 11t - 6
        let mut roots: Vec<f32> = cardano_roots(1.0, -6.0, 11.0, -6.0).into_iter().collect();
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(roots.len(), 3);
        assert_abs_diff_eq!(roots[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(roots[1], 2.0, epsilon = 1e-3);
        assert_abs_diff_eq!(roots[2], 3.0, epsilon = 1e-3);
    }
}

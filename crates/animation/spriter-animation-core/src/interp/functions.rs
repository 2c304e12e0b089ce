//! Interpolation primitives:
//! - linear / quadratic / cubic / quartic / quintic (nested linear blends)
//! - angle-aware variants of each
//! - cubic Bezier basis and the real-root solvers backing Bezier timing

use crate::math::angle_difference;

/// Linear interpolation of scalars.
#[inline]
pub fn linear(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Linear interpolation along the shorter arc between two angles in degrees.
#[inline]
pub fn linear_angle(a: f32, b: f32, t: f32) -> f32 {
    a + angle_difference(b, a) * t
}

#[inline]
pub fn quadratic(a: f32, b: f32, c: f32, t: f32) -> f32 {
    linear(linear(a, b, t), linear(b, c, t), t)
}

#[inline]
pub fn quadratic_angle(a: f32, b: f32, c: f32, t: f32) -> f32 {
    linear_angle(linear_angle(a, b, t), linear_angle(b, c, t), t)
}

#[inline]
pub fn cubic(a: f32, b: f32, c: f32, d: f32, t: f32) -> f32 {
    linear(quadratic(a, b, c, t), quadratic(b, c, d, t), t)
}

#[inline]
pub fn cubic_angle(a: f32, b: f32, c: f32, d: f32, t: f32) -> f32 {
    linear_angle(quadratic_angle(a, b, c, t), quadratic_angle(b, c, d, t), t)
}

#[inline]
pub fn quartic(a: f32, b: f32, c: f32, d: f32, e: f32, t: f32) -> f32 {
    linear(cubic(a, b, c, d, t), cubic(b, c, d, e, t), t)
}

#[inline]
pub fn quartic_angle(a: f32, b: f32, c: f32, d: f32, e: f32, t: f32) -> f32 {
    linear_angle(cubic_angle(a, b, c, d, t), cubic_angle(b, c, d, e, t), t)
}

#[inline]
pub fn quintic(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32, t: f32) -> f32 {
    linear(quartic(a, b, c, d, e, t), quartic(b, c, d, e, f, t), t)
}

#[inline]
pub fn quintic_angle(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32, t: f32) -> f32 {
    linear_angle(
        quartic_angle(a, b, c, d, e, t),
        quartic_angle(b, c, d, e, f, t),
        t,
    )
}

/// Cubic Bezier in Bernstein form with ordinates `x1..x4`.
#[inline]
pub fn bezier(t: f32, x1: f32, x2: f32, x3: f32, x4: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    let b0 = -t3 + 3.0 * t2 - 3.0 * t + 1.0;
    let b1 = 3.0 * t3 - 6.0 * t2 + 3.0 * t;
    let b2 = -3.0 * t3 + 3.0 * t2;
    x1 * b0 + x2 * b1 + x3 * b2 + x4 * t3
}

/// Slack for roots that rounding pushes just outside [0, 1].
const ROOT_EPSILON: f32 = 1e-3;

#[inline]
fn in_unit(x: f32) -> Option<f32> {
    (-ROOT_EPSILON..=1.0 + ROOT_EPSILON)
        .contains(&x)
        .then(|| x.clamp(0.0, 1.0))
}

/// Root of `a*x^2 + b*x + c = 0` inside [0, 1], if any.
pub fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<f32> {
    if a == 0.0 {
        if b == 0.0 {
            return None;
        }
        return in_unit(-c / b);
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    in_unit((-b + sq) / (2.0 * a)).or_else(|| in_unit((-b - sq) / (2.0 * a)))
}

/// Real root of `a*x^3 + b*x^2 + c*x + d = 0` inside [0, 1], if any.
///
/// Splits on the discriminant: one real root (Cardano), a repeated root, or three real
/// roots (trigonometric form). The first root found in range wins.
pub fn solve_cubic(a: f32, b: f32, c: f32, d: f32) -> Option<f32> {
    if a == 0.0 {
        return solve_quadratic(b, c, d);
    }
    if d == 0.0 {
        return Some(0.0);
    }

    let b = b / a;
    let c = c / a;
    let d = d / a;
    let q = (3.0 * c - b * b) / 9.0;
    let r = (-27.0 * d + b * (9.0 * c - 2.0 * b * b)) / 54.0;
    let disc = q * q * q + r * r;
    let term1 = b / 3.0;

    if disc > 0.0 {
        let sq = disc.sqrt();
        let s = (r + sq).cbrt();
        let t = (r - sq).cbrt();
        return in_unit(-term1 + s + t);
    }

    if disc == 0.0 {
        let r13 = r.cbrt();
        return in_unit(-term1 + 2.0 * r13).or_else(|| in_unit(-(r13 + term1)));
    }

    let q = -q;
    let dum = (r / (q * q * q).sqrt()).clamp(-1.0, 1.0).acos();
    let r13 = 2.0 * q.sqrt();
    (0..3).find_map(|k| {
        let angle = (dum + 2.0 * std::f32::consts::PI * k as f32) / 3.0;
        in_unit(-term1 + r13 * angle.cos())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn nested_blends_hit_endpoints() {
        approx(quadratic(0.0, 5.0, 10.0, 0.0), 0.0, 1e-6);
        approx(quadratic(0.0, 5.0, 10.0, 1.0), 10.0, 1e-6);
        approx(cubic(0.0, 2.0, 8.0, 10.0, 1.0), 10.0, 1e-6);
        approx(quartic(1.0, 2.0, 3.0, 4.0, 5.0, 0.5), 3.0, 1e-5);
        approx(quintic(0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 0.5), 5.0, 1e-5);
    }

    #[test]
    fn angle_variant_takes_short_arc() {
        approx(linear_angle(350.0, 10.0, 0.5), 360.0, 1e-4);
        approx(linear_angle(10.0, 350.0, 0.5), 0.0, 1e-4);
    }

    #[test]
    fn bezier_basis_endpoints() {
        approx(bezier(0.0, 0.0, 0.3, 0.7, 1.0), 0.0, 1e-6);
        approx(bezier(1.0, 0.0, 0.3, 0.7, 1.0), 1.0, 1e-6);
    }

    #[test]
    fn cubic_solver_finds_unit_root() {
        // (x - 0.5)^3 = x^3 - 1.5x^2 + 0.75x - 0.125
        let root = solve_cubic(1.0, -1.5, 0.75, -0.125).expect("root in range");
        approx(root, 0.5, 1e-3);
        // x^3 + x - 0.5 has a single real root near 0.4239
        let root = solve_cubic(1.0, 0.0, 1.0, -0.5).expect("root in range");
        approx(root, 0.4239, 1e-3);
        // roots at 2, 3, 4: nothing in range
        assert!(solve_cubic(1.0, -9.0, 26.0, -24.0).is_none());
    }

    #[test]
    fn cubic_solver_keeps_roots_rounded_past_one() {
        // x^3 + x - 2 has its only real root at exactly 1.
        let root = solve_cubic(1.0, 0.0, 1.0, -2.0).expect("root at the edge");
        assert!((0.0..=1.0).contains(&root));
        approx(root, 1.0, 1e-3);
    }

    #[test]
    fn quadratic_solver_degrades_to_linear() {
        approx(solve_quadratic(0.0, 2.0, -1.0).expect("root"), 0.5, 1e-6);
        assert!(solve_quadratic(1.0, 0.0, 1.0).is_none());
    }
}

//! Scalar helpers working in degrees.

#[inline]
pub fn sin_deg(angle: f32) -> f32 {
    angle.to_radians().sin()
}

#[inline]
pub fn cos_deg(angle: f32) -> f32 {
    angle.to_radians().cos()
}

/// Signed difference `a - b` folded into (-180, 180].
#[inline]
pub fn angle_difference(a: f32, b: f32) -> f32 {
    let d = ((a - b) % 360.0 + 540.0) % 360.0 - 180.0;
    if d <= -180.0 {
        d + 360.0
    } else {
        d
    }
}

/// Angle in degrees of the vector pointing from `(x1, y1)` to `(x2, y2)`.
#[inline]
pub fn angle_between(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    (y2 - y1).atan2(x2 - x1).to_degrees()
}

#[inline]
pub fn distance_between(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    (dx * dx + dy * dy).sqrt()
}

/// Sign used when composing angles through a parent's scale: -1 for exactly one negative
/// axis, 0 when either axis is zero, +1 otherwise.
#[inline]
pub(crate) fn flip_sign(scale_x: f32, scale_y: f32) -> f32 {
    sign(scale_x) * sign(scale_y)
}

// Unlike `f32::signum`, zero maps to zero.
#[inline]
fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn difference_stays_in_half_open_range() {
        approx(angle_difference(350.0, 0.0), -10.0, 1e-4);
        approx(angle_difference(0.0, 350.0), 10.0, 1e-4);
        approx(angle_difference(180.0, 0.0), 180.0, 1e-4);
        approx(angle_difference(0.0, 180.0), 180.0, 1e-4);
        approx(angle_difference(-720.0, 30.0), -30.0, 1e-4);
        approx(angle_difference(45.0, 45.0), 0.0, 1e-6);
    }

    #[test]
    fn between_and_distance() {
        approx(angle_between(0.0, 0.0, 0.0, 10.0), 90.0, 1e-4);
        approx(angle_between(0.0, 0.0, -10.0, 0.0), 180.0, 1e-4);
        approx(distance_between(0.0, 0.0, 3.0, 4.0), 5.0, 1e-6);
    }

    #[test]
    fn flip_sign_counts_negative_axes() {
        assert_eq!(flip_sign(1.0, 1.0), 1.0);
        assert_eq!(flip_sign(-1.0, 1.0), -1.0);
        assert_eq!(flip_sign(-2.0, -0.5), 1.0);
        assert_eq!(flip_sign(0.0, 1.0), 0.0);
        assert_eq!(flip_sign(-1.0, -0.0), 0.0);
    }
}

//! Curves used to tween keyframes.
//!
//! A [`Curve`] picks one of the interpolation families from [`functions`] and carries up to
//! four constraints. An optional sub-curve remaps `t` before the outer curve applies.

pub mod functions;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use functions::{
    bezier, cubic, cubic_angle, linear, linear_angle, quadratic, quadratic_angle, quartic,
    quartic_angle, quintic, quintic_angle, solve_cubic,
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveType {
    Instant,
    #[default]
    Linear,
    Quadratic,
    Cubic,
    Quartic,
    Quintic,
    Bezier,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub c1: f32,
    pub c2: f32,
    pub c3: f32,
    pub c4: f32,
}

impl Constraints {
    pub const fn new(c1: f32, c2: f32, c3: f32, c4: f32) -> Self {
        Self { c1, c2, c3, c4 }
    }
}

/// Last Bezier parameter that solved in range, stored as f32 bits.
#[derive(Default)]
struct LastSolution(AtomicU32);

impl LastSolution {
    fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Clone for LastSolution {
    fn clone(&self) -> Self {
        Self(AtomicU32::new(self.0.load(Ordering::Relaxed)))
    }
}

impl fmt::Debug for LastSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

// The cache is not part of a curve's identity.
impl PartialEq for LastSolution {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Curve {
    #[serde(rename = "type")]
    pub kind: CurveType,
    pub constraints: Constraints,
    pub sub_curve: Option<Box<Curve>>,
    #[serde(skip)]
    last_solution: LastSolution,
}

impl Curve {
    pub fn new(kind: CurveType, constraints: Constraints) -> Self {
        Self {
            kind,
            constraints,
            sub_curve: None,
            last_solution: LastSolution::default(),
        }
    }

    pub fn linear() -> Self {
        Self::new(CurveType::Linear, Constraints::default())
    }

    pub fn instant() -> Self {
        Self::new(CurveType::Instant, Constraints::default())
    }

    pub fn bezier(c1: f32, c2: f32, c3: f32, c4: f32) -> Self {
        Self::new(CurveType::Bezier, Constraints::new(c1, c2, c3, c4))
    }

    /// Chains `sub` so it remaps `t` before this curve applies.
    pub fn with_sub_curve(mut self, sub: Curve) -> Self {
        self.sub_curve = Some(Box::new(sub));
        self
    }

    #[inline]
    fn remap(&self, t: f32) -> f32 {
        match &self.sub_curve {
            Some(sub) => sub.tween(0.0, 1.0, t),
            None => t,
        }
    }

    /// Solves the Bezier timing polynomial for `t`, reusing the previous solution when no
    /// root lies in [0, 1]. The endpoints map to themselves.
    fn bezier_parameter(&self, t: f32) -> f32 {
        if t == 0.0 || t == 1.0 {
            self.last_solution.set(t);
            return t;
        }
        let Constraints { c1, c3, .. } = self.constraints;
        match solve_cubic(3.0 * (c1 - c3) + 1.0, 3.0 * (c3 - 2.0 * c1), 3.0 * c1, -t) {
            Some(x) => {
                self.last_solution.set(x);
                x
            }
            None => {
                let x = self.last_solution.get();
                log::trace!("bezier timing has no root in [0,1] for t={t}; reusing {x}");
                x
            }
        }
    }

    pub fn tween(&self, a: f32, b: f32, t: f32) -> f32 {
        let t = self.remap(t);
        let Constraints { c1, c2, c3, c4 } = self.constraints;
        match self.kind {
            CurveType::Instant => a,
            CurveType::Linear => linear(a, b, t),
            CurveType::Quadratic => quadratic(a, linear(a, b, c1), b, t),
            CurveType::Cubic => cubic(a, linear(a, b, c1), linear(a, b, c2), b, t),
            CurveType::Quartic => quartic(
                a,
                linear(a, b, c1),
                linear(a, b, c2),
                linear(a, b, c3),
                b,
                t,
            ),
            CurveType::Quintic => quintic(
                a,
                linear(a, b, c1),
                linear(a, b, c2),
                linear(a, b, c3),
                linear(a, b, c4),
                b,
                t,
            ),
            CurveType::Bezier => {
                let x = self.bezier_parameter(t);
                linear(a, b, bezier(x, 0.0, c2, c4, 1.0))
            }
        }
    }

    /// Tweens along the shorter arc between two angles in degrees.
    pub fn tween_angle(&self, a: f32, b: f32, t: f32) -> f32 {
        let t = self.remap(t);
        let Constraints { c1, c2, c3, c4 } = self.constraints;
        match self.kind {
            CurveType::Instant => a,
            CurveType::Linear => linear_angle(a, b, t),
            CurveType::Quadratic => quadratic_angle(a, linear_angle(a, b, c1), b, t),
            CurveType::Cubic => {
                cubic_angle(a, linear_angle(a, b, c1), linear_angle(a, b, c2), b, t)
            }
            CurveType::Quartic => quartic_angle(
                a,
                linear_angle(a, b, c1),
                linear_angle(a, b, c2),
                linear_angle(a, b, c3),
                b,
                t,
            ),
            CurveType::Quintic => quintic_angle(
                a,
                linear_angle(a, b, c1),
                linear_angle(a, b, c2),
                linear_angle(a, b, c3),
                linear_angle(a, b, c4),
                b,
                t,
            ),
            CurveType::Bezier => {
                let x = self.bezier_parameter(t);
                linear_angle(a, b, bezier(x, 0.0, c2, c4, 1.0))
            }
        }
    }

    /// Tweens an angle in the authored rotational direction.
    ///
    /// `spin > 0` travels upwards, `spin < 0` downwards and `spin == 0` holds `a`.
    pub fn tween_angle_spin(&self, a: f32, b: f32, t: f32, spin: i32) -> f32 {
        let b = match spin {
            0 => return a,
            s if s > 0 && b - a < 0.0 => b + 360.0,
            s if s < 0 && b - a > 0.0 => b - 360.0,
            _ => b,
        };
        self.tween(a, b, t)
    }

    pub fn tween_point(&self, a: Point, b: Point, t: f32) -> Point {
        Point::new(self.tween(a.x, b.x, t), self.tween(a.y, b.y, t))
    }
}

//! 2D primitives: points, sizes, y-up rectangles and oriented bounding boxes.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::math::{angle_between, cos_deg, distance_between, sin_deg};
use crate::value::Bone;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    #[inline]
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Component-wise scale.
    #[inline]
    pub fn scale_by(self, other: Point) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }

    /// Rotates around the origin by `degrees` (counter-clockwise, y-up).
    pub fn rotate(self, degrees: f32) -> Self {
        if self.x == 0.0 && self.y == 0.0 {
            return self;
        }
        let (s, c) = (sin_deg(degrees), cos_deg(degrees));
        Self::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        distance_between(self.x, self.y, other.x, other.y)
    }

    /// Direction towards `other`, in degrees.
    #[inline]
    pub fn angle_to(self, other: Point) -> f32 {
        angle_between(self.x, self.y, other.x, other.y)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.distance(Self::ZERO)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        self.scale(rhs)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimension {
    pub width: f32,
    pub height: f32,
}

impl Dimension {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in y-up coordinates (`top >= bottom`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rectangle {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Smallest rectangle holding every point; `None` for an empty iterator.
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Self::new(first.x, first.y, first.x, first.y);
        for p in iter {
            rect.left = rect.left.min(p.x);
            rect.right = rect.right.max(p.x);
            rect.bottom = rect.bottom.min(p.y);
            rect.top = rect.top.max(p.y);
        }
        Some(rect)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    pub fn size(&self) -> Dimension {
        Dimension::new(self.width(), self.height())
    }

    /// Inclusive on every edge.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.bottom && p.y <= self.top
    }

    /// True when the two rectangles share a region of non-zero area.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.bottom < other.top
            && self.top > other.bottom
    }

    pub fn union(&self, other: &Rectangle) -> Rectangle {
        Rectangle::new(
            self.left.min(other.left),
            self.top.max(other.top),
            self.right.max(other.right),
            self.bottom.min(other.bottom),
        )
    }
}

/// Oriented box of a bone or object: four global corners plus the local frame used for
/// point collision.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    /// Corners in order: bottom-left, bottom-right, top-left, top-right (local frame).
    pub points: [Point; 4],
    origin: Point,
    angle: f32,
    min: Point,
    max: Point,
}

impl BoundingBox {
    /// Box of `size` placed by the global pose of `bone` (scale, pivot, angle, position).
    pub fn calc_for(bone: &Bone, size: Dimension) -> Self {
        let w = size.width * bone.scale.x;
        let h = size.height * bone.scale.y;
        let px = w * bone.pivot.x;
        let py = h * bone.pivot.y;

        let local = [
            Point::new(-px, -py),
            Point::new(w - px, -py),
            Point::new(-px, h - py),
            Point::new(w - px, h - py),
        ];
        let points = local.map(|p| p.rotate(bone.angle) + bone.position);

        Self {
            points,
            origin: bone.position,
            angle: bone.angle,
            min: Point::new((-px).min(w - px), (-py).min(h - py)),
            max: Point::new((-px).max(w - px), (-py).max(h - py)),
        }
    }

    /// Tests `p` in the box's own rotated frame.
    pub fn collides(&self, p: Point) -> bool {
        let local = (p - self.origin).rotate(-self.angle);
        local.x >= self.min.x
            && local.x <= self.max.x
            && local.y >= self.min.y
            && local.y <= self.max.y
    }

    pub fn bounding_rect(&self) -> Rectangle {
        Rectangle::enclosing(self.points).unwrap_or_default()
    }

    /// True when any corner lies inside `rect` or the axis-aligned hulls overlap.
    pub fn overlaps(&self, rect: &Rectangle) -> bool {
        self.points.iter().any(|p| rect.contains(*p)) || self.bounding_rect().intersects(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn rotate_quarter_turn() {
        let p = Point::new(10.0, 0.0).rotate(90.0);
        approx(p.x, 0.0, 1e-4);
        approx(p.y, 10.0, 1e-4);
        assert_eq!(Point::ZERO.rotate(33.0), Point::ZERO);
    }

    #[test]
    fn rectangle_is_y_up() {
        let r = Rectangle::new(0.0, 10.0, 20.0, 0.0);
        assert!(r.contains(Point::new(5.0, 5.0)));
        assert!(!r.contains(Point::new(5.0, -1.0)));
        approx(r.height(), 10.0, 0.0);
        let touching = Rectangle::new(20.0, 10.0, 30.0, 0.0);
        assert!(!r.intersects(&touching));
        let overlapping = Rectangle::new(19.0, 5.0, 30.0, -5.0);
        assert!(r.intersects(&overlapping));
        assert_eq!(r.union(&overlapping), Rectangle::new(0.0, 10.0, 30.0, -5.0));
    }

    #[test]
    fn rotated_box_collision() {
        let bone = Bone {
            position: Point::new(100.0, 0.0),
            angle: 90.0,
            pivot: Point::new(0.0, 0.5),
            ..Bone::default()
        };
        let bb = BoundingBox::calc_for(&bone, Dimension::new(40.0, 10.0));
        // Box extends 40 units along +y from (100, 0), 10 units wide.
        assert!(bb.collides(Point::new(100.0, 30.0)));
        assert!(!bb.collides(Point::new(130.0, 0.0)));
        let rect = bb.bounding_rect();
        approx(rect.left, 95.0, 1e-3);
        approx(rect.right, 105.0, 1e-3);
        approx(rect.top, 40.0, 1e-3);
        approx(rect.bottom, 0.0, 1e-3);
    }
}

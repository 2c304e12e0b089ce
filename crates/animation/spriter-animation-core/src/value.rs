//! Pose payloads: the transform shared by bones and objects, and the drawable extras.

use serde::{Deserialize, Serialize};

use crate::data::FileReference;
use crate::geometry::Point;
use crate::math::{cos_deg, flip_sign, sin_deg};

/// Transform of a bone, local or global depending on which buffer holds it.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bone {
    pub position: Point,
    pub scale: Point,
    pub pivot: Point,
    /// Degrees, counter-clockwise.
    pub angle: f32,
}

impl Default for Bone {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            scale: Point::new(1.0, 1.0),
            pivot: Point::new(0.0, 0.5),
            angle: 0.0,
        }
    }
}

impl Bone {
    /// Composes this parent-relative transform with the global transform of `parent`.
    pub fn unmap(&mut self, parent: &Bone) {
        self.angle = self.angle * flip_sign(parent.scale.x, parent.scale.y) + parent.angle;
        self.scale = self.scale.scale_by(parent.scale);
        self.position = self
            .position
            .scale_by(parent.scale)
            .rotate(parent.angle)
            + parent.position;
    }

    /// Inverse of [`Bone::unmap`]: expresses this global transform relative to `parent`.
    ///
    /// Axes on which the parent has zero scale are left unscaled.
    pub fn map(&mut self, parent: &Bone) {
        let div = |v: f32, s: f32| if s == 0.0 { v } else { v / s };
        self.angle = (self.angle - parent.angle) * flip_sign(parent.scale.x, parent.scale.y);
        self.scale = Point::new(
            div(self.scale.x, parent.scale.x),
            div(self.scale.y, parent.scale.y),
        );
        let p = (self.position - parent.position).rotate(-parent.angle);
        self.position = Point::new(div(p.x, parent.scale.x), div(p.y, parent.scale.y));
    }

    pub fn unmapped(mut self, parent: &Bone) -> Bone {
        self.unmap(parent);
        self
    }

    pub fn mapped(mut self, parent: &Bone) -> Bone {
        self.map(parent);
        self
    }

    /// End of the bone when it extends `length` units along its x axis.
    pub fn tip(&self, length: f32) -> Point {
        let reach = length * self.scale.x;
        Point::new(
            self.position.x + cos_deg(self.angle) * reach,
            self.position.y + sin_deg(self.angle) * reach,
        )
    }
}

/// Drawable pose: a bone transform plus opacity and the referenced image.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ObjectRepr", into = "ObjectRepr")]
pub struct Object {
    pub bone: Bone,
    pub alpha: f32,
    pub file: FileReference,
}

impl Default for Object {
    fn default() -> Self {
        Self {
            bone: Bone {
                pivot: Point::new(0.0, 1.0),
                ..Bone::default()
            },
            alpha: 1.0,
            file: FileReference::NONE,
        }
    }
}

// Flat wire shape so an object's defaults (pivot, alpha) apply per missing field.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
struct ObjectRepr {
    position: Point,
    scale: Point,
    pivot: Point,
    angle: f32,
    alpha: f32,
    file: FileReference,
}

impl Default for ObjectRepr {
    fn default() -> Self {
        Object::default().into()
    }
}

impl From<ObjectRepr> for Object {
    fn from(r: ObjectRepr) -> Self {
        Object {
            bone: Bone {
                position: r.position,
                scale: r.scale,
                pivot: r.pivot,
                angle: r.angle,
            },
            alpha: r.alpha,
            file: r.file,
        }
    }
}

impl From<Object> for ObjectRepr {
    fn from(o: Object) -> Self {
        ObjectRepr {
            position: o.bone.position,
            scale: o.bone.scale,
            pivot: o.bone.pivot,
            angle: o.bone.angle,
            alpha: o.alpha,
            file: o.file,
        }
    }
}

/// Tagged pose held by timeline keys and pose slots.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spatial {
    Bone(Bone),
    Object(Object),
}

impl Default for Spatial {
    fn default() -> Self {
        Spatial::Object(Object::default())
    }
}

impl Spatial {
    #[inline]
    pub fn bone(&self) -> &Bone {
        match self {
            Spatial::Bone(b) => b,
            Spatial::Object(o) => &o.bone,
        }
    }

    #[inline]
    pub fn bone_mut(&mut self) -> &mut Bone {
        match self {
            Spatial::Bone(b) => b,
            Spatial::Object(o) => &mut o.bone,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Spatial::Object(o) => Some(o),
            Spatial::Bone(_) => None,
        }
    }

    #[inline]
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Spatial::Object(o) => Some(o),
            Spatial::Bone(_) => None,
        }
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Spatial::Object(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn object_json_keeps_object_defaults() {
        let spatial: Spatial =
            serde_json::from_str(r#"{ "object": { "angle": 12.0 } }"#).expect("object parses");
        let obj = spatial.as_object().expect("object variant");
        assert_eq!(obj.bone.pivot, Point::new(0.0, 1.0));
        assert_eq!(obj.alpha, 1.0);
        assert_eq!(obj.file, FileReference::NONE);
        approx(obj.bone.angle, 12.0, 0.0);
    }

    #[test]
    fn map_inverts_unmap_under_mirrored_parent() {
        let parent = Bone {
            position: Point::new(5.0, -3.0),
            scale: Point::new(2.0, -1.0),
            angle: 30.0,
            ..Bone::default()
        };
        let child = Bone {
            position: Point::new(10.0, 4.0),
            scale: Point::new(1.5, 0.5),
            angle: 20.0,
            ..Bone::default()
        };
        let global = child.unmapped(&parent);
        approx(global.angle, 10.0, 1e-4);
        approx(global.scale.y, -0.5, 1e-6);

        let back = global.mapped(&parent);
        approx(back.angle, child.angle, 1e-4);
        approx(back.scale.x, child.scale.x, 1e-5);
        approx(back.scale.y, child.scale.y, 1e-5);
        approx(back.position.x, child.position.x, 1e-4);
        approx(back.position.y, child.position.y, 1e-4);
    }

    #[test]
    fn collapsed_parent_drops_child_rotation() {
        let parent = Bone {
            position: Point::new(3.0, 4.0),
            scale: Point::new(0.0, 1.0),
            angle: 30.0,
            ..Bone::default()
        };
        let child = Bone {
            position: Point::new(10.0, 0.0),
            angle: 45.0,
            ..Bone::default()
        }
        .unmapped(&parent);
        approx(child.angle, 30.0, 1e-6);
        approx(child.scale.x, 0.0, 0.0);
        approx(child.position.x, 3.0, 1e-5);
        approx(child.position.y, 4.0, 1e-5);
    }

    #[test]
    fn tip_follows_angle_and_scale() {
        let bone = Bone {
            position: Point::new(5.0, 5.0),
            scale: Point::new(2.0, 1.0),
            angle: 90.0,
            ..Bone::default()
        };
        let tip = bone.tip(10.0);
        approx(tip.x, 5.0, 1e-4);
        approx(tip.y, 25.0, 1e-4);
    }
}

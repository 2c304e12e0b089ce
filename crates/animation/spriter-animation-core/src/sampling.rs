//! Time-to-pose evaluation of a single animation.
//!
//! Model:
//! - The mainline key at or before `time` decides which timelines are live, their hierarchy
//!   and their draw order.
//! - Each referenced timeline is tweened between its referenced key and the following one
//!   (wrapping to `length` for looping animations, holding for non-looping ones).
//! - When the mainline key starts after the timeline key, the fraction is re-based on the
//!   mainline key and its curve remaps it before the timeline key's own curve applies.
//! - Tweened local poses are unmapped into global space as soon as they are produced.
//!   Bones precede objects and parents precede children, so parents are always ready.
//!
//! API:
//! - [`AnimationEvaluator`] owns the pose buffers and drives a whole frame.
//! - [`sample_timeline`] evaluates a single timeline in local space.
//! - [`unmap_hierarchy`] re-derives global poses from the tweened buffer.

use crate::data::{Animation, MainlineKey, Timeline};
use crate::error::{Result, SpriterError};
use crate::interp::Curve;
use crate::scratch::{PoseSlot, Scratch};
use crate::value::{Bone, Object, Spatial};

/// Replaces a non-finite fraction with `fallback` and clamps it into [0, 1].
#[inline]
fn unit_fraction(num: f32, den: f32, fallback: f32) -> f32 {
    let t = num / den;
    if t.is_finite() {
        t.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

fn tween_bone(a: &Bone, b: &Bone, t: f32, curve: &Curve, spin: i32) -> Bone {
    Bone {
        position: curve.tween_point(a.position, b.position, t),
        scale: curve.tween_point(a.scale, b.scale, t),
        pivot: curve.tween_point(a.pivot, b.pivot, t),
        angle: curve.tween_angle_spin(a.angle, b.angle, t, spin),
    }
}

/// Interpolates two poses of the same kind. The file reference is never tweened: it
/// always comes from `a`.
pub(crate) fn tween_spatial(a: &Spatial, b: &Spatial, t: f32, curve: &Curve, spin: i32) -> Spatial {
    match (a, b) {
        (Spatial::Bone(a), Spatial::Bone(b)) => Spatial::Bone(tween_bone(a, b, t, curve, spin)),
        (Spatial::Object(a), Spatial::Object(b)) => Spatial::Object(Object {
            bone: tween_bone(&a.bone, &b.bone, t, curve, spin),
            alpha: curve.tween(a.alpha, b.alpha, t),
            file: a.file,
        }),
        // Timelines never mix kinds once validated.
        _ => *a,
    }
}

/// Local-space pose of `timeline` at `time`, starting from key `key_index` under the
/// mainline key `mainline_key`.
pub fn sample_timeline(
    anim: &Animation,
    mainline_key: &MainlineKey,
    timeline: &Timeline,
    key_index: usize,
    time: i32,
) -> Spatial {
    let keys = &timeline.keys;
    let current = &keys[key_index];
    let mut next = &keys[(key_index + 1) % keys.len()];

    let time = time as f32;
    let current_time = current.time as f32;
    let mut next_time = next.time as f32;
    if next_time < current_time {
        if anim.looping() {
            next_time = anim.length() as f32;
        } else {
            next = current;
        }
    }

    let span = next_time - current_time;
    let mainline_time = mainline_key.time as f32;
    let t = if mainline_time > current_time {
        let t_mid = unit_fraction(mainline_time - current_time, span, 0.0);
        let t = unit_fraction(time - mainline_time, next_time - mainline_time, 1.0);
        mainline_key.curve.tween(t_mid, 1.0, t)
    } else {
        let t = unit_fraction(time - current_time, span, 1.0);
        mainline_key.curve.tween(0.0, 1.0, t)
    };

    tween_spatial(&current.value, &next.value, t, &current.curve, current.spin)
}

/// Writes the global pose of `timeline` from its tweened pose and the global pose of
/// `parent` (another timeline slot) or `root`.
pub(crate) fn unmap_slot(scratch: &mut Scratch, timeline: usize, parent: Option<usize>, root: &Bone) {
    let parent = match parent {
        Some(p) => *scratch.unmapped[p].value.bone(),
        None => *root,
    };
    let tweened = scratch.tweened[timeline];
    let mut value = tweened.value;
    value.bone_mut().unmap(&parent);
    scratch.unmapped[timeline] = PoseSlot {
        active: tweened.active,
        value,
    };
}

/// Re-derives global poses from the tweened buffer.
///
/// With `base == None` every ref of `key` is recomputed. With `Some(b)` only the
/// descendants of bone ref `b` are, so a global pose written into `b` directly propagates
/// to its subtree.
pub fn unmap_hierarchy(key: &MainlineKey, scratch: &mut Scratch, root: &Bone, base: Option<usize>) {
    let mut affected = vec![false; key.bone_refs.len()];
    if let Some(b) = base {
        if let Some(flag) = affected.get_mut(b) {
            *flag = true;
        }
    }
    let touched = |affected: &[bool], parent: Option<usize>| match base {
        None => true,
        Some(_) => parent.is_some_and(|p| affected[p]),
    };

    for (i, r) in key.bone_refs.iter().enumerate() {
        if Some(i) == base || !touched(&affected, r.parent) {
            continue;
        }
        affected[i] = true;
        unmap_slot(scratch, r.timeline, key.parent_timeline(r.parent), root);
    }
    for r in &key.object_refs {
        if touched(&affected, r.parent) {
            unmap_slot(scratch, r.timeline, key.parent_timeline(r.parent), root);
        }
    }
}

/// Per-animation evaluator state: `Uninitialized` until [`prepare`](Self::prepare), then
/// `Prepared` for good.
#[derive(Clone, Debug, Default)]
pub struct AnimationEvaluator {
    scratch: Scratch,
    current_key: usize,
    prepared: bool,
}

impl AnimationEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates pose buffers for `timelines` slots. No-op once prepared.
    pub fn prepare(&mut self, timelines: usize) {
        if self.prepared {
            return;
        }
        self.scratch = Scratch::new(timelines);
        self.prepared = true;
    }

    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Evaluates `anim` at `time`, returning the index of the selected mainline key.
    ///
    /// Times outside `[0, length]` are not rejected; they select the first or last
    /// mainline key and clamp the tween fraction.
    pub fn evaluate(&mut self, anim: &Animation, time: i32, root: &Bone) -> Result<usize> {
        if !self.prepared {
            return Err(SpriterError::NotPrepared);
        }
        let needed = anim.timelines().len();
        if needed > self.scratch.len() {
            return Err(SpriterError::PoseBufferTooSmall {
                animation: anim.name().to_string(),
                needed,
                available: self.scratch.len(),
            });
        }

        let index = anim.mainline().key_index_before_time(time);
        let key = &anim.mainline().keys[index];
        self.scratch.begin_frame();

        let bones = key
            .bone_refs
            .iter()
            .map(|r| (r.timeline, r.key, r.parent));
        let objects = key
            .object_refs
            .iter()
            .map(|r| (r.timeline, r.key, r.parent));
        for (timeline, key_index, parent) in bones.chain(objects) {
            let value = sample_timeline(anim, key, &anim.timelines()[timeline], key_index, time);
            self.scratch.tweened[timeline] = PoseSlot {
                active: true,
                value,
            };
            unmap_slot(&mut self.scratch, timeline, key.parent_timeline(parent), root);
        }

        self.current_key = index;
        Ok(index)
    }

    /// Mainline key index selected by the last evaluation.
    #[inline]
    pub fn current_key(&self) -> usize {
        self.current_key
    }

    #[inline]
    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    #[inline]
    pub fn scratch_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }
}

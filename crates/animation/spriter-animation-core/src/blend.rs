//! Weighted blending of two players that share an entity.
//!
//! The structural source (first while `weight < sprite_threshold`, else second) supplies
//! the mainline key: hierarchy, draw order and which timelines are live. The other source
//! only supplies interpolation targets, matched by timeline name and then by index.
//! An optional base bone pins its whole subtree to one source without blending.

use std::sync::Arc;

use crate::config::Config;
use crate::data::{Animation, Entity, MainlineKey, Timeline};
use crate::error::{Result, SpriterError};
use crate::interp::Curve;
use crate::player::Player;
use crate::sampling::unmap_slot;
use crate::scratch::{PoseSlot, Scratch};
use crate::value::{Bone, Object, Spatial};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlendSide {
    First,
    Second,
}

#[derive(Debug)]
pub struct Blend {
    first: Player,
    second: Player,
    /// Tick both sources before blending each frame.
    pub update_players: bool,
    /// 0 yields the first source, 1 the second.
    pub weight: f32,
    pub sprite_threshold: f32,
    pub curve: Curve,
    /// Let the file reference follow the nearer source instead of the structural one.
    pub tween_sprites: bool,
    /// Name of the bone whose subtree is copied unblended.
    pub base_bone: Option<String>,
    /// Source of the base subtree; `None` means the structural source.
    pub base_side: Option<BlendSide>,
    pub(crate) scratch: Scratch,
    pub(crate) current_key: MainlineKey,
}

impl Blend {
    pub(crate) fn new(first: Player, second: Player, cfg: &Config) -> Result<Self> {
        if !first.same_entity(&second) {
            return Err(SpriterError::EntityMismatch);
        }
        let slots = first.entity().max_timelines();
        log::debug!(
            "blending '{}' with '{}' on entity '{}'",
            first.animation().name(),
            second.animation().name(),
            first.entity().name()
        );
        let current_key = first.current_key().clone();
        Ok(Self {
            first,
            second,
            update_players: true,
            weight: cfg.blend_weight,
            sprite_threshold: cfg.sprite_threshold,
            curve: Curve::linear(),
            tween_sprites: false,
            base_bone: None,
            base_side: None,
            scratch: Scratch::new(slots),
            current_key,
        })
    }

    #[inline]
    pub fn first(&self) -> &Player {
        &self.first
    }

    #[inline]
    pub fn second(&self) -> &Player {
        &self.second
    }

    #[inline]
    pub fn first_mut(&mut self) -> &mut Player {
        &mut self.first
    }

    #[inline]
    pub fn second_mut(&mut self) -> &mut Player {
        &mut self.second
    }

    /// True while the first source supplies the mainline structure.
    #[inline]
    pub fn on_first_side(&self) -> bool {
        self.weight < self.sprite_threshold
    }

    pub fn structural(&self) -> &Player {
        if self.on_first_side() {
            &self.first
        } else {
            &self.second
        }
    }

    pub(crate) fn tick_sources(&mut self) -> Result<()> {
        self.first.tick()?;
        self.second.tick()
    }

    /// Moves both sources to `entity` (first animation each) and resizes the buffers.
    pub(crate) fn set_entity(&mut self, entity: &Arc<Entity>) -> Result<()> {
        self.first.set_entity(Arc::clone(entity))?;
        self.second.set_entity(Arc::clone(entity))?;
        self.scratch = Scratch::new(entity.max_timelines());
        self.current_key = self.structural().current_key().clone();
        Ok(())
    }

    /// Blends the sources' current tweened poses and unmaps them against `root`.
    ///
    /// Fails with [`SpriterError::BoneNotFound`] when `base_bone` names no bone of the
    /// structural source's current key.
    pub(crate) fn evaluate(&mut self, root: &Bone) -> Result<()> {
        let on_first = self.on_first_side();
        let Blend {
            first,
            second,
            weight,
            curve,
            tween_sprites,
            base_bone,
            base_side,
            scratch,
            current_key,
            ..
        } = self;
        let (structural, other) = if on_first {
            (&*first, &*second)
        } else {
            (&*second, &*first)
        };
        let base_player = match base_side {
            Some(BlendSide::First) => &*first,
            Some(BlendSide::Second) => &*second,
            None => structural,
        };

        let s_anim = structural.animation();
        let s_pose = &structural.pose().tweened;
        let s_key = structural.current_key();

        // Fails before anything is written.
        let base = match base_bone.as_deref() {
            Some(name) => Some(
                s_key
                    .bone_refs
                    .iter()
                    .position(|r| s_anim.timelines()[r.timeline].name == name)
                    .ok_or_else(|| SpriterError::BoneNotFound {
                        name: name.to_string(),
                    })?,
            ),
            None => None,
        };

        current_key.clone_from(s_key);
        let key = &*current_key;
        let mut in_base = vec![false; key.bone_refs.len()];
        if let Some(base) = base {
            for (i, r) in key.bone_refs.iter().enumerate() {
                let below = r.parent.is_some_and(|p| in_base[p]);
                in_base[i] = i == base || below;
            }
        }

        scratch.begin_frame();
        let bones = key.bone_refs.iter().map(|r| (r.timeline, r.parent, false));
        let objects = key.object_refs.iter().map(|r| (r.timeline, r.parent, true));
        for (i, (timeline, parent, is_object)) in bones.chain(objects).enumerate() {
            let pinned = if is_object {
                parent.is_some_and(|p| in_base[p])
            } else {
                in_base[i]
            };
            let tl = &s_anim.timelines()[timeline];
            let own = s_pose[timeline].value;

            let value = if pinned {
                source_pose(base_player, tl).unwrap_or(own)
            } else {
                match source_pose(other, tl) {
                    Some(theirs) if theirs.is_object() == own.is_object() => {
                        let (a, b) = if on_first { (own, theirs) } else { (theirs, own) };
                        blend_spatial(&a, &b, &own, *weight, curve, *tween_sprites)
                    }
                    _ => own,
                }
            };

            scratch.tweened[timeline] = PoseSlot {
                active: true,
                value,
            };
            unmap_slot(scratch, timeline, key.parent_timeline(parent), root);
        }
        Ok(())
    }
}

/// Active tweened pose of the timeline in `player` matching `timeline`.
fn source_pose(player: &Player, timeline: &Timeline) -> Option<Spatial> {
    let anim: &Animation = player.animation();
    let index = anim.similar_timeline(timeline)?;
    player
        .pose()
        .tweened
        .get(index)
        .filter(|slot| slot.active)
        .map(|slot| slot.value)
}

fn blend_bone(a: &Bone, b: &Bone, weight: f32, curve: &Curve) -> Bone {
    Bone {
        position: curve.tween_point(a.position, b.position, weight),
        scale: curve.tween_point(a.scale, b.scale, weight),
        pivot: curve.tween_point(a.pivot, b.pivot, weight),
        angle: curve.tween_angle(a.angle, b.angle, weight),
    }
}

/// `a` is the first source, `b` the second; `structural` decides the file unless
/// `tween_sprites` is set.
fn blend_spatial(
    a: &Spatial,
    b: &Spatial,
    structural: &Spatial,
    weight: f32,
    curve: &Curve,
    tween_sprites: bool,
) -> Spatial {
    match (a, b) {
        (Spatial::Object(oa), Spatial::Object(ob)) => {
            let file = if tween_sprites {
                if weight < 0.5 {
                    oa.file
                } else {
                    ob.file
                }
            } else {
                structural.as_object().map_or(oa.file, |o| o.file)
            };
            Spatial::Object(Object {
                bone: blend_bone(&oa.bone, &ob.bone, weight, curve),
                alpha: curve.tween(oa.alpha, ob.alpha, weight),
                file,
            })
        }
        _ => Spatial::Bone(blend_bone(a.bone(), b.bone(), weight, curve)),
    }
}

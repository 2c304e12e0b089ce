//! Playback state machine.
//!
//! A [`Player`] owns the playback time, the current entity and animation (or a [`Blend`]
//! of two players), the root transform and the pose exposed to hosts. Each
//! [`tick`](Player::tick) evaluates the current time, notifies listeners, updates
//! attachments and then advances time by `speed`, wrapping into `[0, length)`.

use std::fmt;
use std::sync::Arc;

use crate::attachment::Attachment;
use crate::blend::Blend;
use crate::config::Config;
use crate::data::{Animation, CharacterMap, Entity, FileReference, MainlineKey, ObjectInfo, Timeline};
use crate::error::{Result, SpriterError};
use crate::geometry::{BoundingBox, Dimension, Point, Rectangle};
use crate::ids::{AttachmentId, IdAllocator, ListenerId};
use crate::listener::PlayerListener;
use crate::sampling::{unmap_hierarchy, AnimationEvaluator};
use crate::scratch::Scratch;
use crate::value::{Bone, Object};

pub(crate) enum Clip {
    Single {
        index: usize,
        evaluator: AnimationEvaluator,
    },
    Blend(Box<Blend>),
}

impl Clip {
    fn scratch(&self) -> &Scratch {
        match self {
            Clip::Single { evaluator, .. } => evaluator.scratch(),
            Clip::Blend(blend) => &blend.scratch,
        }
    }
}

/// Which mainline key the last evaluation selected, by position rather than contents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum KeySlot {
    Single {
        animation: usize,
        key: usize,
    },
    Blend {
        first_side: bool,
        animation: Option<usize>,
        key: usize,
    },
}

pub struct Player {
    entity: Arc<Entity>,
    clip: Clip,
    time: i32,
    speed: i32,
    copy_objects: bool,
    /// Exposed snapshot when `copy_objects` is set.
    pose: Scratch,

    root: Bone,
    position: Point,
    pivot: Point,
    angle: f32,
    scale: f32,
    flip_x: bool,
    flip_y: bool,
    dirty: bool,

    prev_key: Option<(KeySlot, MainlineKey)>,
    character_maps: Vec<usize>,
    listeners: Vec<(ListenerId, Box<dyn PlayerListener>)>,
    attachments: Vec<(AttachmentId, Attachment)>,
    ids: IdAllocator,
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("entity", &self.entity.name())
            .field("animation", &self.animation().name())
            .field("blended", &matches!(self.clip, Clip::Blend(_)))
            .field("time", &self.time)
            .field("speed", &self.speed)
            .finish_non_exhaustive()
    }
}

impl Player {
    /// Plays the first animation of `entity` with default settings.
    pub fn new(entity: Arc<Entity>) -> Result<Self> {
        Self::with_config(entity, &Config::default())
    }

    pub fn with_config(entity: Arc<Entity>, cfg: &Config) -> Result<Self> {
        if entity.animations().is_empty() {
            return Err(SpriterError::NoAnimations {
                entity: entity.name().to_string(),
            });
        }
        let mut evaluator = AnimationEvaluator::new();
        evaluator.prepare(entity.max_timelines());
        log::debug!("player created for entity '{}'", entity.name());
        let mut player = Self::from_clip(entity, Clip::Single { index: 0, evaluator }, cfg);
        player.refresh()?;
        Ok(player)
    }

    /// Blends two players of the same entity. Either may itself be blended.
    pub fn blended(first: Player, second: Player) -> Result<Self> {
        Self::blended_with_config(first, second, &Config::default())
    }

    pub fn blended_with_config(first: Player, second: Player, cfg: &Config) -> Result<Self> {
        let entity = Arc::clone(&first.entity);
        let blend = Blend::new(first, second, cfg)?;
        let mut player = Self::from_clip(entity, Clip::Blend(Box::new(blend)), cfg);
        player.refresh()?;
        Ok(player)
    }

    fn from_clip(entity: Arc<Entity>, clip: Clip, cfg: &Config) -> Self {
        let slots = entity.max_timelines();
        Self {
            entity,
            clip,
            time: 0,
            speed: cfg.speed,
            copy_objects: cfg.copy_objects,
            pose: Scratch::new(slots),
            root: Bone::default(),
            position: Point::ZERO,
            pivot: Point::ZERO,
            angle: 0.0,
            scale: 1.0,
            flip_x: false,
            flip_y: false,
            dirty: true,
            prev_key: None,
            character_maps: Vec::new(),
            listeners: Vec::new(),
            attachments: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    // ---------- Frame ----------

    /// One full frame: listeners, source ticks for blends, evaluation, then time advance.
    pub fn tick(&mut self) -> Result<()> {
        self.notify(|l, p| l.pre_process(p));
        if let Clip::Blend(blend) = &mut self.clip {
            if blend.update_players {
                blend.tick_sources()?;
            }
        }
        self.refresh()?;
        self.notify(|l, p| l.post_process(p));
        self.advance_time(self.speed);
        Ok(())
    }

    /// Re-evaluates the pose at the current time without advancing it.
    pub fn refresh(&mut self) -> Result<()> {
        if self.dirty {
            self.update_root();
        }
        match &mut self.clip {
            Clip::Single { index, evaluator } => {
                evaluator.evaluate(&self.entity.animations()[*index], self.time, &self.root)?;
            }
            Clip::Blend(blend) => blend.evaluate(&self.root)?,
        }
        self.notify_key_change();
        if self.copy_objects {
            self.pose.copy_from(self.clip.scratch());
        }
        self.update_attachments();
        Ok(())
    }

    fn update_root(&mut self) {
        let sx = if self.flip_x { -self.scale } else { self.scale };
        let sy = if self.flip_y { -self.scale } else { self.scale };
        self.root.angle = self.angle;
        self.root.scale = Point::new(sx, sy);
        self.root.position = self.pivot.rotate(self.angle) + self.position;
        self.dirty = false;
    }

    fn advance_time(&mut self, delta: i32) {
        let length = self.length();
        if length <= 0 {
            self.time = 0;
            return;
        }
        let raw = i64::from(self.time) + i64::from(delta);
        let len = i64::from(length);
        self.time = raw.rem_euclid(len) as i32;
        if raw >= len || raw < 0 {
            log::trace!("animation '{}' wrapped to {}", self.animation().name(), self.time);
            self.notify(|l, p| l.animation_finished(p.animation()));
        }
    }

    fn notify(&mut self, mut f: impl FnMut(&mut dyn PlayerListener, &Player)) {
        if self.listeners.is_empty() {
            return;
        }
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, listener) in listeners.iter_mut() {
            let listener: &mut dyn PlayerListener = listener.as_mut();
            f(listener, &*self);
        }
        self.listeners = listeners;
    }

    fn key_slot(&self) -> KeySlot {
        match &self.clip {
            Clip::Single { index, evaluator } => KeySlot::Single {
                animation: *index,
                key: evaluator.current_key(),
            },
            Clip::Blend(blend) => KeySlot::Blend {
                first_side: blend.on_first_side(),
                animation: blend.structural().animation_index(),
                key: blend.structural().current_key_index(),
            },
        }
    }

    fn notify_key_change(&mut self) {
        let slot = self.key_slot();
        if self.prev_key.as_ref().is_some_and(|(prev, _)| *prev == slot) {
            return;
        }
        log::trace!("mainline key changed to time {}", self.current_key().time);
        let prev = self.prev_key.take();
        self.notify(|l, p| {
            l.mainline_key_changed(prev.as_ref().map(|(_, k)| k), p.current_key())
        });
        self.prev_key = Some((slot, self.current_key().clone()));
    }

    fn update_attachments(&mut self) {
        if self.attachments.is_empty() {
            return;
        }
        let mut attachments = std::mem::take(&mut self.attachments);
        for (_, attachment) in attachments.iter_mut() {
            let parent = self.bone_by_name(&attachment.parent).ok().copied();
            attachment.update(parent.as_ref());
        }
        self.attachments = attachments;
    }

    // ---------- Selection ----------

    #[inline]
    pub fn entity(&self) -> &Arc<Entity> {
        &self.entity
    }

    pub fn same_entity(&self, other: &Player) -> bool {
        Arc::ptr_eq(&self.entity, &other.entity)
    }

    /// Switches to `entity` and its first animation. Blended players switch both sources.
    pub fn set_entity(&mut self, entity: Arc<Entity>) -> Result<()> {
        if entity.animations().is_empty() {
            return Err(SpriterError::NoAnimations {
                entity: entity.name().to_string(),
            });
        }
        let old_index = self.animation_index();
        match &mut self.clip {
            Clip::Blend(blend) => blend.set_entity(&entity)?,
            Clip::Single { .. } => {
                let mut evaluator = AnimationEvaluator::new();
                evaluator.prepare(entity.max_timelines());
                self.clip = Clip::Single { index: 0, evaluator };
            }
        }
        log::debug!("player switched to entity '{}'", entity.name());
        let old_entity = std::mem::replace(&mut self.entity, entity);
        self.pose = Scratch::new(self.entity.max_timelines());
        self.character_maps.clear();
        self.prev_key = None;
        self.time = 0;
        self.refresh()?;
        if let Some(old) = old_index {
            self.notify(|l, p| l.animation_changed(&old_entity.animations()[old], p.animation()));
        }
        Ok(())
    }

    /// Current animation; for a blend, the structural source's animation.
    pub fn animation(&self) -> &Animation {
        match &self.clip {
            Clip::Single { index, .. } => &self.entity.animations()[*index],
            Clip::Blend(blend) => blend.structural().animation(),
        }
    }

    /// Index of the current animation, `None` for a blended player.
    pub fn animation_index(&self) -> Option<usize> {
        match &self.clip {
            Clip::Single { index, .. } => Some(*index),
            Clip::Blend(_) => None,
        }
    }

    pub fn blend(&self) -> Option<&Blend> {
        match &self.clip {
            Clip::Blend(blend) => Some(blend),
            Clip::Single { .. } => None,
        }
    }

    pub fn blend_mut(&mut self) -> Option<&mut Blend> {
        match &mut self.clip {
            Clip::Blend(blend) => Some(blend),
            Clip::Single { .. } => None,
        }
    }

    /// Switches animation, resets time to 0 and evaluates once so the pose is valid
    /// immediately. Selecting the current animation does nothing.
    pub fn set_animation(&mut self, index: usize) -> Result<()> {
        let count = self.entity.animations().len();
        let old = match &mut self.clip {
            Clip::Blend(_) => {
                return Err(SpriterError::unsupported(
                    "a blended player's animations are selected on its sources",
                ))
            }
            Clip::Single { index: current, .. } => {
                if index >= count {
                    return Err(SpriterError::AnimationIndexOutOfRange { index, count });
                }
                if *current == index {
                    return Ok(());
                }
                std::mem::replace(current, index)
            }
        };
        self.time = 0;
        self.refresh()?;
        log::debug!(
            "animation changed from '{}' to '{}'",
            self.entity.animations()[old].name(),
            self.animation().name()
        );
        let entity = Arc::clone(&self.entity);
        self.notify(|l, p| l.animation_changed(&entity.animations()[old], p.animation()));
        Ok(())
    }

    pub fn set_animation_by_name(&mut self, name: &str) -> Result<()> {
        let index = self
            .entity
            .animation_index(name)
            .ok_or_else(|| SpriterError::AnimationNotFound {
                name: name.to_string(),
            })?;
        self.set_animation(index)
    }

    // ---------- Time ----------

    #[inline]
    pub fn time(&self) -> i32 {
        self.time
    }

    /// Sets the time, wrapping it into `[0, length)` with the usual finished notification.
    pub fn set_time(&mut self, time: i32) {
        self.time = time;
        self.advance_time(0);
    }

    #[inline]
    pub fn speed(&self) -> i32 {
        self.speed
    }

    #[inline]
    pub fn set_speed(&mut self, speed: i32) {
        self.speed = speed;
    }

    pub fn length(&self) -> i32 {
        self.animation().length()
    }

    // ---------- Pose ----------

    /// Mainline key selected by the last evaluation.
    pub fn current_key(&self) -> &MainlineKey {
        match &self.clip {
            Clip::Single { index, evaluator } => {
                &self.entity.animations()[*index].mainline().keys[evaluator.current_key()]
            }
            Clip::Blend(blend) => &blend.current_key,
        }
    }

    /// Index of [`current_key`](Self::current_key) in its animation's mainline.
    pub fn current_key_index(&self) -> usize {
        match &self.clip {
            Clip::Single { evaluator, .. } => evaluator.current_key(),
            Clip::Blend(blend) => blend.structural().current_key_index(),
        }
    }

    pub fn timelines(&self) -> &[Timeline] {
        self.animation().timelines()
    }

    /// Buffers exposed to hosts: the player's own copy in copy mode, otherwise the
    /// evaluator's.
    pub fn pose(&self) -> &Scratch {
        if self.copy_objects {
            &self.pose
        } else {
            self.clip.scratch()
        }
    }

    pub(crate) fn key_and_pose_mut(&mut self) -> (&MainlineKey, &mut Scratch) {
        let Player {
            entity,
            clip,
            pose,
            copy_objects,
            ..
        } = self;
        match clip {
            Clip::Single { index, evaluator } => {
                let key = &entity.animations()[*index].mainline().keys[evaluator.current_key()];
                let scratch = if *copy_objects {
                    pose
                } else {
                    evaluator.scratch_mut()
                };
                (key, scratch)
            }
            Clip::Blend(blend) => {
                let Blend {
                    current_key,
                    scratch,
                    ..
                } = &mut **blend;
                let scratch = if *copy_objects { pose } else { scratch };
                (&*current_key, scratch)
            }
        }
    }

    #[inline]
    pub fn copy_objects(&self) -> bool {
        self.copy_objects
    }

    pub fn set_copy_objects(&mut self, copy: bool) {
        self.copy_objects = copy;
        if copy {
            self.pose.copy_from(self.clip.scratch());
        }
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        let timelines = self.timelines();
        self.current_key()
            .bone_refs
            .iter()
            .position(|r| timelines[r.timeline].name == name)
    }

    pub fn object_index(&self, name: &str) -> Option<usize> {
        let timelines = self.timelines();
        self.current_key()
            .object_refs
            .iter()
            .position(|r| timelines[r.timeline].name == name)
    }

    pub fn bone_name(&self, index: usize) -> Option<&str> {
        let r = self.current_key().bone_refs.get(index)?;
        Some(self.timelines()[r.timeline].name.as_str())
    }

    pub fn object_name(&self, index: usize) -> Option<&str> {
        let r = self.current_key().object_refs.get(index)?;
        Some(self.timelines()[r.timeline].name.as_str())
    }

    /// Global pose of the bone at `index` in the current mainline key.
    pub fn bone(&self, index: usize) -> Result<&Bone> {
        let refs = &self.current_key().bone_refs;
        let r = refs.get(index).ok_or(SpriterError::BoneIndexOutOfRange {
            index,
            count: refs.len(),
        })?;
        Ok(self.pose().unmapped[r.timeline].value.bone())
    }

    pub fn bone_by_name(&self, name: &str) -> Result<&Bone> {
        let index = self.bone_index(name).ok_or_else(|| SpriterError::BoneNotFound {
            name: name.to_string(),
        })?;
        self.bone(index)
    }

    /// Global pose of the object at `index` in draw order.
    pub fn object(&self, index: usize) -> Result<&Object> {
        let refs = &self.current_key().object_refs;
        let count = refs.len();
        let r = refs
            .get(index)
            .ok_or(SpriterError::ObjectIndexOutOfRange { index, count })?;
        self.pose().unmapped[r.timeline]
            .value
            .as_object()
            .ok_or(SpriterError::ObjectIndexOutOfRange { index, count })
    }

    pub fn object_by_name(&self, name: &str) -> Result<&Object> {
        let index = self.object_index(name).ok_or_else(|| SpriterError::ObjectNotFound {
            name: name.to_string(),
        })?;
        self.object(index)
    }

    /// Object info of the named timeline, falling back to the entity declaration.
    pub fn object_info(&self, name: &str) -> Option<&ObjectInfo> {
        self.animation()
            .timeline_by_name(name)
            .and_then(|t| t.object_info.as_ref())
            .or_else(|| self.entity.object_info(name))
    }

    /// Global bone poses in mainline order.
    pub fn bones(&self) -> impl Iterator<Item = &Bone> + '_ {
        let pose = self.pose();
        self.current_key()
            .bone_refs
            .iter()
            .map(move |r| pose.unmapped[r.timeline].value.bone())
    }

    /// Global object poses in ascending z-order.
    pub fn objects(&self) -> impl Iterator<Item = &Object> + '_ {
        let pose = self.pose();
        self.current_key()
            .object_refs
            .iter()
            .filter_map(move |r| pose.unmapped[r.timeline].value.as_object())
    }

    // ---------- Pose overrides ----------

    fn write_bone(&mut self, index: usize, f: impl FnOnce(&mut Bone)) -> Result<()> {
        let root = self.root;
        let (key, pose) = self.key_and_pose_mut();
        let count = key.bone_refs.len();
        let r = key
            .bone_refs
            .get(index)
            .ok_or(SpriterError::BoneIndexOutOfRange { index, count })?;
        f(pose.unmapped[r.timeline].value.bone_mut());
        unmap_hierarchy(key, pose, &root, Some(index));
        Ok(())
    }

    fn write_object(&mut self, index: usize, f: impl FnOnce(&mut Object)) -> Result<()> {
        let (key, pose) = self.key_and_pose_mut();
        let count = key.object_refs.len();
        let r = key
            .object_refs
            .get(index)
            .ok_or(SpriterError::ObjectIndexOutOfRange { index, count })?;
        let object = pose.unmapped[r.timeline]
            .value
            .as_object_mut()
            .ok_or(SpriterError::ObjectIndexOutOfRange { index, count })?;
        f(object);
        Ok(())
    }

    fn require_bone(&self, name: &str) -> Result<usize> {
        self.bone_index(name).ok_or_else(|| SpriterError::BoneNotFound {
            name: name.to_string(),
        })
    }

    fn require_object(&self, name: &str) -> Result<usize> {
        self.object_index(name).ok_or_else(|| SpriterError::ObjectNotFound {
            name: name.to_string(),
        })
    }

    /// Edits the global pose of bone `index` and re-propagates it to its descendants.
    pub fn update_bone_at(&mut self, index: usize, f: impl FnOnce(&mut Bone)) -> Result<()> {
        self.write_bone(index, f)
    }

    pub fn update_bone(&mut self, name: &str, f: impl FnOnce(&mut Bone)) -> Result<()> {
        let index = self.require_bone(name)?;
        self.write_bone(index, f)
    }

    /// Overwrites position, scale, pivot and angle of the named bone's global pose.
    pub fn set_bone(&mut self, name: &str, bone: &Bone) -> Result<()> {
        let bone = *bone;
        self.update_bone(name, |b| *b = bone)
    }

    pub fn set_bone_position(&mut self, name: &str, x: f32, y: f32) -> Result<()> {
        self.update_bone(name, |b| b.position = Point::new(x, y))
    }

    pub fn set_bone_angle(&mut self, name: &str, angle: f32) -> Result<()> {
        self.update_bone(name, |b| b.angle = angle)
    }

    pub fn set_bone_scale(&mut self, name: &str, x: f32, y: f32) -> Result<()> {
        self.update_bone(name, |b| b.scale = Point::new(x, y))
    }

    /// Edits the global pose of object `index`. Objects have no children, so nothing else
    /// changes.
    pub fn update_object_at(&mut self, index: usize, f: impl FnOnce(&mut Object)) -> Result<()> {
        self.write_object(index, f)
    }

    pub fn update_object(&mut self, name: &str, f: impl FnOnce(&mut Object)) -> Result<()> {
        let index = self.require_object(name)?;
        self.write_object(index, f)
    }

    pub fn set_object(&mut self, name: &str, object: &Object) -> Result<()> {
        let object = *object;
        self.update_object(name, |o| *o = object)
    }

    pub fn set_object_position(&mut self, name: &str, x: f32, y: f32) -> Result<()> {
        self.update_object(name, |o| o.bone.position = Point::new(x, y))
    }

    pub fn set_object_angle(&mut self, name: &str, angle: f32) -> Result<()> {
        self.update_object(name, |o| o.bone.angle = angle)
    }

    pub fn set_object_alpha(&mut self, name: &str, alpha: f32) -> Result<()> {
        self.update_object(name, |o| o.alpha = alpha)
    }

    pub fn set_object_file(&mut self, name: &str, file: FileReference) -> Result<()> {
        self.update_object(name, |o| o.file = file)
    }

    /// Re-derives global poses from the tweened ones: everything for `None`, or only the
    /// descendants of the named bone.
    pub fn unmap_objects(&mut self, base: Option<&str>) -> Result<()> {
        let base = base.map(|name| self.require_bone(name)).transpose()?;
        if self.dirty {
            self.update_root();
        }
        let root = self.root;
        let (key, pose) = self.key_and_pose_mut();
        unmap_hierarchy(key, pose, &root, base);
        Ok(())
    }

    // ---------- Character maps ----------

    /// Replaces the active character maps; they apply in the given order.
    pub fn set_character_maps<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let maps = names
            .into_iter()
            .map(|name| self.character_map_index(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.character_maps = maps;
        Ok(())
    }

    pub fn add_character_map(&mut self, name: &str) -> Result<()> {
        let index = self.character_map_index(name)?;
        self.character_maps.push(index);
        Ok(())
    }

    pub fn clear_character_maps(&mut self) {
        self.character_maps.clear();
    }

    fn character_map_index(&self, name: &str) -> Result<usize> {
        self.entity
            .character_map_index(name)
            .ok_or_else(|| SpriterError::CharacterMapNotFound {
                name: name.to_string(),
            })
    }

    pub fn character_maps(&self) -> impl Iterator<Item = &CharacterMap> + '_ {
        self.character_maps
            .iter()
            .map(move |&i| &self.entity.character_maps()[i])
    }

    /// File to draw for `file` after applying the active character maps.
    pub fn resolve_file(&self, file: FileReference) -> FileReference {
        self.character_maps().fold(file, |f, map| map.get(f))
    }

    // ---------- Bounds ----------

    fn timeline_of(&self, name: &str) -> Result<usize> {
        let key = self.current_key();
        self.bone_index(name)
            .map(|i| key.bone_refs[i].timeline)
            .or_else(|| self.object_index(name).map(|i| key.object_refs[i].timeline))
            .ok_or_else(|| SpriterError::ObjectNotFound {
                name: name.to_string(),
            })
    }

    fn box_of(&self, timeline: usize, size: Dimension) -> BoundingBox {
        BoundingBox::calc_for(self.pose().unmapped[timeline].value.bone(), size)
    }

    fn size_of(&self, timeline: usize) -> Dimension {
        self.timelines()[timeline]
            .object_info
            .as_ref()
            .map_or(Dimension::default(), |info| info.size)
    }

    /// Oriented box of the named bone or object, sized by its object info.
    pub fn bounding_box(&self, name: &str) -> Result<BoundingBox> {
        let timeline = self.timeline_of(name)?;
        let info = self
            .object_info(name)
            .ok_or_else(|| SpriterError::ObjectInfoMissing {
                name: name.to_string(),
            })?;
        Ok(self.box_of(timeline, info.size))
    }

    pub fn collides(&self, name: &str, point: Point) -> Result<bool> {
        Ok(self.bounding_box(name)?.collides(point))
    }

    pub fn collides_rect(&self, name: &str, rect: &Rectangle) -> Result<bool> {
        Ok(self.bounding_box(name)?.overlaps(rect))
    }

    /// Axis-aligned hull of every box below the named bone (or the whole pose for
    /// `None`), starting from that bone's (or the root's) position. Timelines without
    /// object info count as points.
    pub fn bounding_rectangle(&self, base: Option<&str>) -> Result<Rectangle> {
        let base = base.map(|name| self.require_bone(name)).transpose()?;
        let key = self.current_key();
        let start = match base {
            Some(b) => self.pose().unmapped[key.bone_refs[b].timeline].value.bone().position,
            None => self.root.position,
        };
        let mut rect = Rectangle::new(start.x, start.y, start.x, start.y);

        let mut member = vec![false; key.bone_refs.len()];
        if let Some(b) = base {
            member[b] = true;
        }
        let inside = |member: &[bool], parent: Option<usize>| {
            base.is_none() || parent.is_some_and(|p| member[p])
        };
        for (i, r) in key.bone_refs.iter().enumerate() {
            if Some(i) == base || !inside(&member, r.parent) {
                continue;
            }
            member[i] = true;
            let bb = self.box_of(r.timeline, self.size_of(r.timeline));
            rect = rect.union(&bb.bounding_rect());
        }
        for r in &key.object_refs {
            if inside(&member, r.parent) {
                let bb = self.box_of(r.timeline, self.size_of(r.timeline));
                rect = rect.union(&bb.bounding_rect());
            }
        }
        Ok(rect)
    }

    /// Boxes of every current bone and object whose timeline declares a size.
    pub fn boxes(&self) -> impl Iterator<Item = BoundingBox> + '_ {
        let key = self.current_key();
        let timelines = key
            .bone_refs
            .iter()
            .map(|r| r.timeline)
            .chain(key.object_refs.iter().map(|r| r.timeline));
        timelines.filter_map(move |t| {
            let info = self.timelines()[t].object_info.as_ref()?;
            Some(self.box_of(t, info.size))
        })
    }

    // ---------- Root transform ----------

    /// Root transform every top-level bone and object is unmapped against.
    #[inline]
    pub fn root(&self) -> &Bone {
        &self.root
    }

    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Point::new(x, y);
        self.dirty = true;
    }

    pub fn translate_position(&mut self, dx: f32, dy: f32) {
        self.position = self.position.translate(dx, dy);
        self.dirty = true;
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
        self.dirty = true;
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.angle += degrees;
        self.dirty = true;
    }

    #[inline]
    pub fn pivot(&self) -> Point {
        self.pivot
    }

    pub fn set_pivot(&mut self, x: f32, y: f32) {
        self.pivot = Point::new(x, y);
        self.dirty = true;
    }

    pub fn translate_pivot(&mut self, dx: f32, dy: f32) {
        self.pivot = self.pivot.translate(dx, dy);
        self.dirty = true;
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.dirty = true;
    }

    pub fn scale_by(&mut self, factor: f32) {
        self.scale *= factor;
        self.dirty = true;
    }

    pub fn flip_x(&mut self) {
        self.flip_x = !self.flip_x;
        self.dirty = true;
    }

    pub fn flip_y(&mut self) {
        self.flip_y = !self.flip_y;
        self.dirty = true;
    }

    #[inline]
    pub fn flipped_x(&self) -> bool {
        self.flip_x
    }

    #[inline]
    pub fn flipped_y(&self) -> bool {
        self.flip_y
    }

    // ---------- Listeners & attachments ----------

    pub fn add_listener(&mut self, listener: Box<dyn PlayerListener>) -> ListenerId {
        let id = self.ids.alloc_listener();
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> Option<Box<dyn PlayerListener>> {
        let pos = self.listeners.iter().position(|(lid, _)| *lid == id)?;
        Some(self.listeners.remove(pos).1)
    }

    /// Registers an attachment and projects it against the current pose right away.
    pub fn attach(&mut self, mut attachment: Attachment) -> AttachmentId {
        let parent = self.bone_by_name(&attachment.parent).ok().copied();
        attachment.update(parent.as_ref());
        let id = self.ids.alloc_attachment();
        self.attachments.push((id, attachment));
        id
    }

    pub fn detach(&mut self, id: AttachmentId) -> Option<Attachment> {
        let pos = self.attachments.iter().position(|(aid, _)| *aid == id)?;
        Some(self.attachments.remove(pos).1)
    }

    pub fn attachment(&self, id: AttachmentId) -> Option<&Attachment> {
        self.attachments
            .iter()
            .find(|(aid, _)| *aid == id)
            .map(|(_, a)| a)
    }

    pub fn attachment_mut(&mut self, id: AttachmentId) -> Option<&mut Attachment> {
        self.attachments
            .iter_mut()
            .find(|(aid, _)| *aid == id)
            .map(|(_, a)| a)
    }
}

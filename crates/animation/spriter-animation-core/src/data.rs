//! Authored animation data: entities, animations, mainlines and timelines.
//!
//! The graph is validated once (see [`Animation::new`], [`Entity::new`] and
//! [`crate::parse_entity_json`]) and is read-only afterwards. Evaluation code relies on
//! the invariants checked here and indexes without further bounds handling.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpriterError};
use crate::geometry::Dimension;
use crate::interp::Curve;
use crate::value::Spatial;

/// Resource address by `(folder, file)` index; `-1` in either field means none.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileReference {
    pub folder: i32,
    pub file: i32,
}

impl FileReference {
    pub const NONE: FileReference = FileReference {
        folder: -1,
        file: -1,
    };

    pub const fn new(folder: i32, file: i32) -> Self {
        Self { folder, file }
    }

    #[inline]
    pub fn has_file(&self) -> bool {
        self.folder >= 0 && self.file >= 0
    }
}

impl Default for FileReference {
    fn default() -> Self {
        Self::NONE
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    #[default]
    Sprite,
    Bone,
    Box,
    Point,
    Skin,
}

/// Declared object: its kind, nominal size and the files a sprite may show.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectType,
    pub size: Dimension,
    pub frames: Vec<FileReference>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    pub source: FileReference,
    pub target: FileReference,
}

/// Named re-skin: replaces file references when drawing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterMap {
    pub name: String,
    pub entries: Vec<MapEntry>,
}

impl CharacterMap {
    /// Mapped reference for `file`, or `file` itself when unmapped.
    pub fn get(&self, file: FileReference) -> FileReference {
        self.entries
            .iter()
            .find(|e| e.source == file)
            .map_or(file, |e| e.target)
    }
}

/// Mainline reference to a bone timeline. `parent` indexes the owning key's `bone_refs`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneRef {
    #[serde(default)]
    pub id: i32,
    pub timeline: usize,
    pub key: usize,
    #[serde(default)]
    pub parent: Option<usize>,
}

/// Mainline reference to an object timeline, drawn in ascending `z_index` order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    #[serde(default)]
    pub id: i32,
    pub timeline: usize,
    pub key: usize,
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub z_index: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainlineKey {
    pub id: i32,
    pub time: i32,
    pub curve: Curve,
    pub bone_refs: Vec<BoneRef>,
    pub object_refs: Vec<ObjectRef>,
}

impl MainlineKey {
    pub fn bone_ref_for_timeline(&self, timeline: usize) -> Option<(usize, &BoneRef)> {
        self.bone_refs
            .iter()
            .enumerate()
            .find(|(_, r)| r.timeline == timeline)
    }

    pub fn object_ref_for_timeline(&self, timeline: usize) -> Option<(usize, &ObjectRef)> {
        self.object_refs
            .iter()
            .enumerate()
            .find(|(_, r)| r.timeline == timeline)
    }

    /// Timeline driving the parent of bone ref `index`, if it has one.
    pub fn parent_timeline(&self, parent: Option<usize>) -> Option<usize> {
        parent.and_then(|p| self.bone_refs.get(p)).map(|r| r.timeline)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mainline {
    pub keys: Vec<MainlineKey>,
}

impl Mainline {
    /// Index of the last key at or before `time`, or the first key.
    pub fn key_index_before_time(&self, time: i32) -> usize {
        self.keys
            .iter()
            .rposition(|k| k.time <= time)
            .unwrap_or(0)
    }

    /// Panics on an empty mainline; validated animations always carry at least one key.
    pub fn key_before_time(&self, time: i32) -> &MainlineKey {
        &self.keys[self.key_index_before_time(time)]
    }
}

fn default_spin() -> i32 {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineKey {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub time: i32,
    /// Rotational direction towards the next key: +1, -1 or 0 (hold).
    #[serde(default = "default_spin")]
    pub spin: i32,
    #[serde(default)]
    pub curve: Curve,
    pub value: Spatial,
}

impl TimelineKey {
    pub fn new(time: i32, value: Spatial) -> Self {
        Self {
            id: 0,
            time,
            spin: 1,
            curve: Curve::default(),
            value,
        }
    }

    pub fn with_spin(mut self, spin: i32) -> Self {
        self.spin = spin;
        self
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(skip)]
    id: usize,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ObjectType,
    #[serde(default)]
    pub object_info: Option<ObjectInfo>,
    pub keys: Vec<TimelineKey>,
}

impl Timeline {
    pub fn new(name: impl Into<String>, kind: ObjectType, keys: Vec<TimelineKey>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            kind,
            object_info: None,
            keys,
        }
    }

    pub fn with_object_info(mut self, info: ObjectInfo) -> Self {
        self.object_info = Some(info);
        self
    }

    /// Position within the owning animation.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }
}

/// Deserializing runs the same validation as [`Animation::new`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AnimationRepr")]
pub struct Animation {
    id: i32,
    name: String,
    length: i32,
    looping: bool,
    mainline: Mainline,
    timelines: Vec<Timeline>,
    #[serde(skip)]
    name_index: HashMap<String, usize>,
}

fn default_looping() -> bool {
    true
}

// Wire shape of an animation before validation.
#[derive(Deserialize)]
pub(crate) struct AnimationRepr {
    #[serde(default)]
    id: i32,
    name: String,
    length: i32,
    #[serde(default = "default_looping")]
    looping: bool,
    mainline: Mainline,
    #[serde(default)]
    timelines: Vec<Timeline>,
}

impl TryFrom<AnimationRepr> for Animation {
    type Error = SpriterError;

    fn try_from(r: AnimationRepr) -> Result<Self> {
        Animation::new(r.id, r.name, r.length, r.looping, r.mainline, r.timelines)
    }
}

impl Animation {
    /// Builds and validates an animation.
    pub fn new(
        id: i32,
        name: impl Into<String>,
        length: i32,
        looping: bool,
        mainline: Mainline,
        timelines: Vec<Timeline>,
    ) -> Result<Self> {
        let mut anim = Self {
            id,
            name: name.into(),
            length,
            looping,
            mainline,
            timelines,
            name_index: HashMap::new(),
        };
        anim.finalize()?;
        Ok(anim)
    }

    /// Assigns timeline ids, sorts object refs by z-index, indexes timeline names and
    /// checks every structural invariant the evaluator depends on.
    pub(crate) fn finalize(&mut self) -> Result<()> {
        let name = self.name.clone();
        let fail =
            |reason: String| SpriterError::invalid_data(format!("animation '{name}': {reason}"));

        if self.length < 0 {
            return Err(fail(format!("negative length {}", self.length)));
        }
        if self.mainline.keys.is_empty() {
            return Err(fail("mainline has no keys".into()));
        }
        if self
            .mainline
            .keys
            .windows(2)
            .any(|w| w[1].time < w[0].time)
        {
            return Err(fail("mainline keys are not sorted by time".into()));
        }

        self.name_index.clear();
        for (index, timeline) in self.timelines.iter_mut().enumerate() {
            timeline.id = index;
            let Some(first) = timeline.keys.first() else {
                return Err(fail(format!("timeline '{}' has no keys", timeline.name)));
            };
            let is_object = first.value.is_object();
            if timeline.keys.iter().any(|k| k.value.is_object() != is_object) {
                return Err(fail(format!(
                    "timeline '{}' mixes bone and object keys",
                    timeline.name
                )));
            }
            self.name_index.entry(timeline.name.clone()).or_insert(index);
        }

        for (k, key) in self.mainline.keys.iter_mut().enumerate() {
            key.object_refs.sort_by_key(|r| r.z_index);
            let bone_count = key.bone_refs.len();
            for (i, r) in key.bone_refs.iter().enumerate() {
                check_ref(&self.timelines, r.timeline, r.key, false)
                    .map_err(|e| fail(format!("mainline key {k}, bone ref {i}: {e}")))?;
                if let Some(p) = r.parent {
                    if p >= i {
                        return Err(fail(format!(
                            "mainline key {k}, bone ref {i}: parent {p} does not precede it"
                        )));
                    }
                }
            }
            for (i, r) in key.object_refs.iter().enumerate() {
                check_ref(&self.timelines, r.timeline, r.key, true)
                    .map_err(|e| fail(format!("mainline key {k}, object ref {i}: {e}")))?;
                if let Some(p) = r.parent {
                    if p >= bone_count {
                        return Err(fail(format!(
                            "mainline key {k}, object ref {i}: parent {p} is not a bone ref"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    #[inline]
    pub fn id(&self) -> i32 {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn length(&self) -> i32 {
        self.length
    }

    #[inline]
    pub fn looping(&self) -> bool {
        self.looping
    }

    #[inline]
    pub fn mainline(&self) -> &Mainline {
        &self.mainline
    }

    #[inline]
    pub fn timelines(&self) -> &[Timeline] {
        &self.timelines
    }

    pub fn timeline(&self, index: usize) -> Option<&Timeline> {
        self.timelines.get(index)
    }

    pub fn timeline_index(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    pub fn timeline_by_name(&self, name: &str) -> Option<&Timeline> {
        self.timeline_index(name).map(|i| &self.timelines[i])
    }

    /// Index of the timeline matching `other` by name, falling back to the same index.
    pub fn similar_timeline(&self, other: &Timeline) -> Option<usize> {
        self.timeline_index(&other.name)
            .or_else(|| (other.id < self.timelines.len()).then_some(other.id))
    }
}

fn check_ref(
    timelines: &[Timeline],
    timeline: usize,
    key: usize,
    object: bool,
) -> std::result::Result<(), String> {
    let tl = timelines
        .get(timeline)
        .ok_or_else(|| format!("timeline {timeline} does not exist"))?;
    if tl.keys[0].value.is_object() != object {
        let kind = if object { "object" } else { "bone" };
        return Err(format!("timeline '{}' does not hold {kind} keys", tl.name));
    }
    if key >= tl.keys.len() {
        return Err(format!(
            "key {key} is out of range for timeline '{}' ({} keys)",
            tl.name,
            tl.keys.len()
        ));
    }
    Ok(())
}

/// A character: declared objects, character maps and its animations.
///
/// Deserializing validates every animation and links object infos, like
/// [`crate::parse_entity_json`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EntityRepr")]
pub struct Entity {
    pub name: String,
    object_infos: Vec<ObjectInfo>,
    character_maps: Vec<CharacterMap>,
    animations: Vec<Animation>,
    #[serde(skip)]
    animation_index: HashMap<String, usize>,
}

// Wire shape of an entity; animations stay unvalidated until conversion.
#[derive(Deserialize)]
pub(crate) struct EntityRepr {
    name: String,
    #[serde(default)]
    object_infos: Vec<ObjectInfo>,
    #[serde(default)]
    character_maps: Vec<CharacterMap>,
    #[serde(default)]
    animations: Vec<AnimationRepr>,
}

impl TryFrom<EntityRepr> for Entity {
    type Error = SpriterError;

    fn try_from(r: EntityRepr) -> Result<Self> {
        let animations = r
            .animations
            .into_iter()
            .map(Animation::try_from)
            .collect::<Result<Vec<_>>>()?;
        Entity::new(r.name, r.object_infos, r.character_maps, animations)
    }
}

impl Entity {
    /// Assembles an entity from validated animations. Timelines without their own object
    /// info inherit the declared info of the same name.
    pub fn new(
        name: impl Into<String>,
        object_infos: Vec<ObjectInfo>,
        character_maps: Vec<CharacterMap>,
        animations: Vec<Animation>,
    ) -> Result<Self> {
        let mut entity = Self {
            name: name.into(),
            object_infos,
            character_maps,
            animations,
            animation_index: HashMap::new(),
        };
        entity.link();
        Ok(entity)
    }

    fn link(&mut self) {
        self.animation_index.clear();
        for (index, anim) in self.animations.iter_mut().enumerate() {
            self.animation_index.entry(anim.name.clone()).or_insert(index);
            for timeline in &mut anim.timelines {
                if timeline.object_info.is_none() {
                    timeline.object_info = self
                        .object_infos
                        .iter()
                        .find(|info| info.name == timeline.name)
                        .cloned();
                }
            }
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn animation(&self, index: usize) -> Option<&Animation> {
        self.animations.get(index)
    }

    pub fn animation_index(&self, name: &str) -> Option<usize> {
        self.animation_index.get(name).copied()
    }

    pub fn animation_by_name(&self, name: &str) -> Option<&Animation> {
        self.animation_index(name).map(|i| &self.animations[i])
    }

    pub fn animation_with_most_timelines(&self) -> Option<&Animation> {
        // max_by_key keeps the last maximum; prefer the first.
        self.animations
            .iter()
            .rev()
            .max_by_key(|a| a.timelines.len())
    }

    /// Pose buffer size able to hold any animation of this entity.
    pub fn max_timelines(&self) -> usize {
        self.animations
            .iter()
            .map(|a| a.timelines.len())
            .max()
            .unwrap_or(0)
    }

    #[inline]
    pub fn object_infos(&self) -> &[ObjectInfo] {
        &self.object_infos
    }

    pub fn object_info(&self, name: &str) -> Option<&ObjectInfo> {
        self.object_infos.iter().find(|info| info.name == name)
    }

    #[inline]
    pub fn character_maps(&self) -> &[CharacterMap] {
        &self.character_maps
    }

    pub fn character_map_index(&self, name: &str) -> Option<usize> {
        self.character_maps.iter().position(|m| m.name == name)
    }

    pub fn character_map(&self, name: &str) -> Option<&CharacterMap> {
        self.character_map_index(name).map(|i| &self.character_maps[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Bone, Object};

    fn bone_timeline(name: &str) -> Timeline {
        Timeline::new(
            name,
            ObjectType::Bone,
            vec![TimelineKey::new(0, Spatial::Bone(Bone::default()))],
        )
    }

    fn key_with(bone_refs: Vec<BoneRef>) -> MainlineKey {
        MainlineKey {
            bone_refs,
            ..MainlineKey::default()
        }
    }

    fn bref(timeline: usize, parent: Option<usize>) -> BoneRef {
        BoneRef {
            id: 0,
            timeline,
            key: 0,
            parent,
        }
    }

    #[test]
    fn rejects_forward_parent() {
        let mainline = Mainline {
            keys: vec![key_with(vec![bref(0, Some(1)), bref(1, None)])],
        };
        let timelines = vec![bone_timeline("a"), bone_timeline("b")];
        let err = Animation::new(0, "a", 100, true, mainline, timelines).unwrap_err();
        assert!(matches!(err, SpriterError::InvalidData { .. }), "{err}");
    }

    #[test]
    fn rejects_dangling_timeline() {
        let mainline = Mainline {
            keys: vec![key_with(vec![bref(3, None)])],
        };
        assert!(Animation::new(0, "a", 100, true, mainline, vec![bone_timeline("a")]).is_err());
    }

    #[test]
    fn rejects_empty_mainline_and_mixed_timeline() {
        assert!(Animation::new(0, "a", 100, true, Mainline::default(), vec![]).is_err());

        let mut tl = bone_timeline("mixed");
        tl.keys.push(TimelineKey::new(50, Spatial::Object(Object::default())));
        let mainline = Mainline {
            keys: vec![key_with(vec![bref(0, None)])],
        };
        assert!(Animation::new(0, "a", 100, true, mainline, vec![tl]).is_err());
    }

    #[test]
    fn rejects_object_ref_to_bone_timeline() {
        let mainline = Mainline {
            keys: vec![MainlineKey {
                object_refs: vec![ObjectRef {
                    id: 0,
                    timeline: 0,
                    key: 0,
                    parent: None,
                    z_index: 0,
                }],
                ..MainlineKey::default()
            }],
        };
        let err = Animation::new(0, "a", 100, true, mainline, vec![bone_timeline("a")])
            .unwrap_err();
        assert!(err.to_string().contains("does not hold object keys"), "{err}");
    }

    #[test]
    fn sorts_object_refs_and_indexes_names() {
        let sprite = Timeline::new(
            "s",
            ObjectType::Sprite,
            vec![TimelineKey::new(0, Spatial::Object(Object::default()))],
        );
        let oref = |timeline: usize, z_index: i32| ObjectRef {
            id: 0,
            timeline,
            key: 0,
            parent: None,
            z_index,
        };
        let mainline = Mainline {
            keys: vec![MainlineKey {
                object_refs: vec![oref(1, 5), oref(0, 1)],
                ..MainlineKey::default()
            }],
        };
        let other = Timeline::new("t", ObjectType::Sprite, sprite.keys.clone());
        let anim = Animation::new(0, "a", 10, true, mainline, vec![sprite, other]).expect("valid");
        let zs: Vec<i32> = anim.mainline().keys[0]
            .object_refs
            .iter()
            .map(|r| r.z_index)
            .collect();
        assert_eq!(zs, vec![1, 5]);
        assert_eq!(anim.timeline_index("t"), Some(1));
        assert_eq!(anim.timeline(1).map(Timeline::id), Some(1));
    }

    #[test]
    fn key_before_time_picks_last_not_after() {
        let mainline = Mainline {
            keys: vec![
                MainlineKey { time: 10, ..MainlineKey::default() },
                MainlineKey { time: 20, ..MainlineKey::default() },
            ],
        };
        assert_eq!(mainline.key_index_before_time(0), 0);
        assert_eq!(mainline.key_index_before_time(15), 0);
        assert_eq!(mainline.key_index_before_time(20), 1);
        assert_eq!(mainline.key_index_before_time(99), 1);
    }

    #[test]
    fn character_map_passthrough() {
        let map = CharacterMap {
            name: "alt".into(),
            entries: vec![MapEntry {
                source: FileReference::new(0, 0),
                target: FileReference::new(1, 3),
            }],
        };
        assert_eq!(map.get(FileReference::new(0, 0)), FileReference::new(1, 3));
        assert_eq!(map.get(FileReference::new(0, 1)), FileReference::new(0, 1));
    }
}

//! Resource lookup and drawing boundaries.
//!
//! The core never loads images. It hands out [`FileReference`]s and lets the host map
//! them to whatever it loaded; drawing goes through a host [`Drawer`].

use std::hash::BuildHasher;

use hashbrown::HashMap;

use crate::data::{FileReference, ObjectInfo};
use crate::geometry::BoundingBox;
use crate::player::Player;
use crate::value::{Bone, Object};

/// Keyed lookup of loaded resources by `(folder, file)`.
pub trait ResourceLoader {
    type Resource;

    fn get(&self, file: FileReference) -> Option<&Self::Resource>;
}

impl<R, S: BuildHasher> ResourceLoader for HashMap<FileReference, R, S> {
    type Resource = R;

    fn get(&self, file: FileReference) -> Option<&R> {
        HashMap::get(self, &file)
    }
}

/// Host renderer for a player's current pose.
pub trait Drawer<R> {
    /// Draws one object with its resolved resource. `object.file` is the reference after
    /// character maps were applied.
    fn draw_object(&mut self, object: &Object, resource: &R);

    /// Debug drawing of a bone; `info` carries its declared size when known.
    fn draw_bone(&mut self, _bone: &Bone, _info: Option<&ObjectInfo>) {}

    fn draw_box(&mut self, _bounds: &BoundingBox) {}

    /// Draws every object in z-order and returns how many were drawn. Objects without a
    /// file or whose resource is not loaded are skipped.
    fn draw<L>(&mut self, player: &Player, loader: &L) -> usize
    where
        L: ResourceLoader<Resource = R>,
    {
        let mut drawn = 0;
        for object in player.objects() {
            if !object.file.has_file() {
                continue;
            }
            let file = player.resolve_file(object.file);
            match loader.get(file) {
                Some(resource) => {
                    let mut mapped = *object;
                    mapped.file = file;
                    self.draw_object(&mapped, resource);
                    drawn += 1;
                }
                None => log::warn!("no resource loaded for {file:?}"),
            }
        }
        drawn
    }

    fn draw_bones(&mut self, player: &Player) {
        let pose = player.pose();
        for r in &player.current_key().bone_refs {
            let info = player.timelines()[r.timeline].object_info.as_ref();
            self.draw_bone(pose.unmapped[r.timeline].value.bone(), info);
        }
    }

    fn draw_boxes(&mut self, player: &Player) {
        for bounds in player.boxes() {
            self.draw_box(&bounds);
        }
    }
}

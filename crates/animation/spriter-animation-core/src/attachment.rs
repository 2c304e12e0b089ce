//! Host transforms kept parented to a player bone.

use crate::value::Bone;

/// A transform the host wants to follow a bone of the player.
///
/// `local` is relative to the parent bone and is never modified by the player. `global`
/// is recomputed on every refresh from `local` and the parent's current global pose.
#[derive(Clone, Debug, PartialEq)]
pub struct Attachment {
    pub parent: String,
    pub local: Bone,
    global: Bone,
}

impl Attachment {
    pub fn new(parent: impl Into<String>, local: Bone) -> Self {
        Self {
            parent: parent.into(),
            local,
            global: local,
        }
    }

    /// Global transform as of the last refresh.
    #[inline]
    pub fn global(&self) -> &Bone {
        &self.global
    }

    pub(crate) fn update(&mut self, parent: Option<&Bone>) {
        match parent {
            Some(parent) => self.global = self.local.unmapped(parent),
            None => log::warn!(
                "attachment parent '{}' is not in the current animation; keeping its last transform",
                self.parent
            ),
        }
    }
}

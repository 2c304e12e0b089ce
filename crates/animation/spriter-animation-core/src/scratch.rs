//! Pose buffers and frame lifecycle.
//!
//! One slot per timeline index in each of two buffers: `tweened` holds the freshly
//! interpolated parent-relative pose, `unmapped` the global pose after composing with
//! ancestors. They are separate owned arrays so overriding one never disturbs the other.

use crate::value::Spatial;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PoseSlot {
    /// False when no mainline ref touched the slot this frame.
    pub active: bool,
    pub value: Spatial,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scratch {
    pub tweened: Vec<PoseSlot>,
    pub unmapped: Vec<PoseSlot>,
}

impl Scratch {
    pub fn new(timelines: usize) -> Self {
        Self {
            tweened: vec![PoseSlot::default(); timelines],
            unmapped: vec![PoseSlot::default(); timelines],
        }
    }

    /// Number of timeline slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.tweened.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tweened.is_empty()
    }

    /// Marks every slot inactive; values are kept until overwritten.
    #[inline]
    pub fn begin_frame(&mut self) {
        for slot in self.tweened.iter_mut().chain(self.unmapped.iter_mut()) {
            slot.active = false;
        }
    }

    /// Copies `other` into this buffer set without reallocating when sizes match.
    pub fn copy_from(&mut self, other: &Scratch) {
        self.tweened.clone_from(&other.tweened);
        self.unmapped.clone_from(&other.unmapped);
    }
}

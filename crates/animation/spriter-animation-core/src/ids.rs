//! Identifiers and simple allocators for engine-owned and player-owned handles.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// Handle of a registered [`crate::listener::PlayerListener`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AttachmentId(pub u32);

/// Handle of an IK constraint mapped into an [`crate::ik::IkResolver`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct IkId(pub u32);

/// Monotonic allocator for every handle kind.
/// Dense indices keep lookups cheap; IDs are opaque externally.
#[derive(Default, Debug, Clone)]
pub struct IdAllocator {
    next_entity: u32,
    next_player: u32,
    next_listener: u32,
    next_attachment: u32,
    next_ik: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity = self.next_entity.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_player(&mut self) -> PlayerId {
        let id = PlayerId(self.next_player);
        self.next_player = self.next_player.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener = self.next_listener.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_attachment(&mut self) -> AttachmentId {
        let id = AttachmentId(self.next_attachment);
        self.next_attachment = self.next_attachment.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_ik(&mut self) -> IkId {
        let id = IkId(self.next_ik);
        self.next_ik = self.next_ik.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_entity(), EntityId(0));
        assert_eq!(alloc.alloc_entity(), EntityId(1));
        assert_eq!(alloc.alloc_player(), PlayerId(0));
        assert_eq!(alloc.alloc_player(), PlayerId(1));
        assert_eq!(alloc.alloc_listener(), ListenerId(0));
        assert_eq!(alloc.alloc_attachment(), AttachmentId(0));
        assert_eq!(alloc.alloc_ik(), IkId(0));
        assert_eq!(alloc.alloc_ik(), IkId(1));
    }

    #[test]
    fn reset_restarts_every_counter() {
        let mut alloc = IdAllocator::new();
        alloc.alloc_player();
        alloc.alloc_ik();
        alloc.reset();
        assert_eq!(alloc.alloc_player(), PlayerId(0));
        assert_eq!(alloc.alloc_ik(), IkId(0));
    }
}

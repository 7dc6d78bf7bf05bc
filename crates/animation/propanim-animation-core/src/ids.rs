//! Identifiers and simple allocators for core entities.

use serde::{Deserialize, Serialize};

/// Handle of a clip registered with an `Animator`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClipId(pub u32);

/// Monotonic allocator for ClipId. IDs are opaque externally.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_clip: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_clip(&mut self) -> ClipId {
        let id = ClipId(self.next_clip);
        self.next_clip = self.next_clip.wrapping_add(1);
        id
    }
}

//! Frame management for the buffer pool.
//!
//! A frame is a slot in the buffer pool that holds one page at a time. The
//! frame's byte buffer has its own lock; the bookkeeping about what the
//! frame holds (page id, pin count, dirty bit) lives in [`FrameMeta`] under
//! the pool's state latch.

use parking_lot::RwLock;

use crate::storage::{PageData, PageId};

/// Identifier for a frame in the buffer pool.
///
/// `FrameId` is distinct from `PageId`: `PageId` identifies a logical page
/// on disk, while `FrameId` identifies a physical memory slot. Frame ids
/// are valid only within a single `BufferPoolManager` instance and range
/// from 0 to pool_size - 1.
pub type FrameId = usize;

/// A frame's byte buffer with its own reader-writer lock.
///
/// The lock protects only the page bytes. Pin counts and the dirty bit are
/// tracked in [`FrameMeta`] under the pool's state latch, so the data lock
/// is never required to answer metadata questions.
pub struct Frame {
    pub(super) data: RwLock<PageData>,
}

impl Frame {
    /// Creates a new empty frame.
    pub(super) fn new() -> Self {
        Self {
            data: RwLock::new(PageData::new()),
        }
    }
}

/// Bookkeeping for one frame, guarded by the pool's state latch.
///
/// # Lifecycle
///
/// 1. **Empty**: `page_id = None`, the frame is on the free list
/// 2. **Loaded**: a page is read from disk, `page_id = Some(...)`
/// 3. **Pinned**: `pin_count > 0`, the page cannot be evicted
/// 4. **Unpinned**: `pin_count = 0`, the page is an eviction candidate
/// 5. **Evicted**: if dirty, written back, then the frame returns to 1
#[derive(Debug)]
pub(super) struct FrameMeta {
    /// The page currently loaded in this frame, if any.
    pub(super) page_id: Option<PageId>,

    /// Number of outstanding pins.
    ///
    /// Each successful fetch or new-page call increments this; each unpin
    /// decrements it. A frame with a nonzero pin count must not be evicted.
    pub(super) pin_count: u32,

    /// Whether the page bytes differ from what is on disk.
    ///
    /// Once set, the bit stays set until the frame is written back or
    /// reused for another page.
    pub(super) is_dirty: bool,
}

impl FrameMeta {
    pub(super) fn new() -> Self {
        Self {
            page_id: None,
            pin_count: 0,
            is_dirty: false,
        }
    }

    /// Increments the pin count.
    pub(super) fn pin(&mut self) {
        self.pin_count = self.pin_count.checked_add(1).expect("pin_count overflow");
    }

    /// Installs a new page in the frame: one pin, clean.
    pub(super) fn reset(&mut self, page_id: PageId) {
        self.page_id = Some(page_id);
        self.pin_count = 1;
        self.is_dirty = false;
    }

    /// Clears the frame, returning it to the empty state.
    pub(super) fn clear(&mut self) {
        self.page_id = None;
        self.pin_count = 0;
        self.is_dirty = false;
    }
}

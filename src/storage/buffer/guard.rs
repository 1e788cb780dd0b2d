//! RAII guards for buffer pool page access.

use std::ops::{Deref, DerefMut};

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use super::frame::FrameId;
use super::pool::BufferPoolManager;
use super::replacer::Replacer;
use crate::storage::disk::DiskManager;
use crate::storage::page::{PageData, PageId};

/// RAII guard for read-only page access.
///
/// The guard holds one pin on the page and a shared lock on the frame's
/// bytes. Dropping it releases both; the pin is returned via the pool's
/// unpin path, so a page whose last guard is dropped becomes an eviction
/// candidate.
pub struct PageReadGuard<'a, D: DiskManager, R: Replacer> {
    pool: &'a BufferPoolManager<D, R>,
    frame_id: FrameId,
    page_id: PageId,
    data: RwLockReadGuard<'a, PageData>,
}

impl<'a, D: DiskManager, R: Replacer> PageReadGuard<'a, D, R> {
    pub(super) fn new(
        pool: &'a BufferPoolManager<D, R>,
        frame_id: FrameId,
        page_id: PageId,
        data: RwLockReadGuard<'a, PageData>,
    ) -> Self {
        Self {
            pool,
            frame_id,
            page_id,
            data,
        }
    }

    /// Returns the id of the pinned page.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }
}

impl<'a, D: DiskManager, R: Replacer> Deref for PageReadGuard<'a, D, R> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data.as_slice()
    }
}

impl<'a, D: DiskManager, R: Replacer> Drop for PageReadGuard<'a, D, R> {
    fn drop(&mut self) {
        self.pool.unpin_frame(self.frame_id, false);
    }
}

/// RAII guard for mutable page access.
///
/// Holds one pin and an exclusive lock on the frame's bytes. The page is
/// NOT automatically marked dirty on modification; call
/// [`mark_dirty`](PageWriteGuard::mark_dirty) after writing, or the bytes
/// may be silently dropped at eviction.
pub struct PageWriteGuard<'a, D: DiskManager, R: Replacer> {
    pool: &'a BufferPoolManager<D, R>,
    frame_id: FrameId,
    page_id: PageId,
    is_dirty: bool,
    data: RwLockWriteGuard<'a, PageData>,
}

impl<'a, D: DiskManager, R: Replacer> PageWriteGuard<'a, D, R> {
    pub(super) fn new(
        pool: &'a BufferPoolManager<D, R>,
        frame_id: FrameId,
        page_id: PageId,
        data: RwLockWriteGuard<'a, PageData>,
    ) -> Self {
        Self {
            pool,
            frame_id,
            page_id,
            is_dirty: false,
            data,
        }
    }

    /// Returns the id of the pinned page.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Records that the caller modified the page.
    ///
    /// The dirty bit is ORed into the frame at unpin time; once set it
    /// stays set until the page is written back.
    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }
}

impl<'a, D: DiskManager, R: Replacer> Deref for PageWriteGuard<'a, D, R> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data.as_slice()
    }
}

impl<'a, D: DiskManager, R: Replacer> DerefMut for PageWriteGuard<'a, D, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data.as_mut_slice()
    }
}

impl<'a, D: DiskManager, R: Replacer> Drop for PageWriteGuard<'a, D, R> {
    fn drop(&mut self) {
        self.pool.unpin_frame(self.frame_id, self.is_dirty);
    }
}

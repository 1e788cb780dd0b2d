//! Table heap: a chain of slotted pages over the buffer pool.

use std::sync::Arc;

use super::error::HeapError;
use super::page::{HeapPage, MAX_TUPLE_SIZE, RecordId, SlotId};
use crate::storage::{BufferPoolManager, ClockReplacer, DiskManager, PageId, Replacer};

/// An unordered collection of raw tuples.
///
/// Tuples are opaque byte strings; typing and schema interpretation belong
/// to layers above. Inserts walk the page chain to the first page with
/// room; scans walk it front to back.
pub struct TableHeap<D: DiskManager, R: Replacer = ClockReplacer> {
    pool: Arc<BufferPoolManager<D, R>>,
    first_page_id: PageId,
}

impl<D: DiskManager, R: Replacer> TableHeap<D, R> {
    /// Creates an empty table heap with a single empty page.
    pub fn create(pool: Arc<BufferPoolManager<D, R>>) -> Result<Self, HeapError> {
        let first_page_id = {
            let mut guard = pool.new_page()?;
            HeapPage::new(&mut guard[..]).init();
            guard.mark_dirty();
            guard.page_id()
        };
        Ok(Self {
            pool,
            first_page_id,
        })
    }

    /// Reattaches to an existing table heap rooted at `first_page_id`.
    pub fn open(pool: Arc<BufferPoolManager<D, R>>, first_page_id: PageId) -> Self {
        Self {
            pool,
            first_page_id,
        }
    }

    /// Returns the id of the first page in the chain.
    pub fn first_page_id(&self) -> PageId {
        self.first_page_id
    }

    /// Inserts a tuple, returning its record id.
    ///
    /// # Errors
    ///
    /// - `HeapError::TupleTooLarge` if the tuple cannot fit in any page
    /// - `HeapError::Buffer` on pool exhaustion or I/O failure
    pub fn insert_tuple(&self, tuple: &[u8]) -> Result<RecordId, HeapError> {
        if tuple.len() > MAX_TUPLE_SIZE {
            return Err(HeapError::TupleTooLarge {
                size: tuple.len(),
                max: MAX_TUPLE_SIZE,
            });
        }

        let mut page_id = self.first_page_id;
        loop {
            let mut guard = self.pool.fetch_page_mut(page_id)?;

            if let Some(slot_id) = HeapPage::new(&mut guard[..]).insert(tuple) {
                guard.mark_dirty();
                return Ok(RecordId::new(page_id, slot_id));
            }

            let next = HeapPage::new(&guard[..]).next_page();
            match next {
                Some(next) => page_id = next,
                None => {
                    // Tail reached: append a fresh page and link it in.
                    // The current guard stays pinned so the link cannot be
                    // evicted mid-update.
                    let mut new_guard = self.pool.new_page()?;
                    let new_page_id = new_guard.page_id();

                    let mut new_page = HeapPage::new(&mut new_guard[..]);
                    new_page.init();
                    let slot_id =
                        new_page
                            .insert(tuple)
                            .ok_or(HeapError::TupleTooLarge {
                                size: tuple.len(),
                                max: MAX_TUPLE_SIZE,
                            })?;
                    new_guard.mark_dirty();

                    HeapPage::new(&mut guard[..]).set_next_page(Some(new_page_id));
                    guard.mark_dirty();
                    return Ok(RecordId::new(new_page_id, slot_id));
                }
            }
        }
    }

    /// Reads one tuple by record id, or `None` if the slot is vacant.
    pub fn get_tuple(&self, rid: RecordId) -> Result<Option<Vec<u8>>, HeapError> {
        let guard = self.pool.fetch_page(rid.page_id)?;
        let page = HeapPage::new(&guard[..]);
        Ok(page.read(rid.slot_id).map(|t| t.to_vec()))
    }

    /// Starts a scan over every tuple in the heap, in page order.
    pub fn scan(&self) -> TableScan<'_, D, R> {
        TableScan {
            table: self,
            page_id: Some(self.first_page_id),
            slot: 0,
        }
    }
}

/// Pull-based cursor over a table heap.
///
/// Each call to [`next`](TableScan::next) pins the current page, copies one
/// tuple out, and unpins before returning; no pin is held between calls.
pub struct TableScan<'a, D: DiskManager, R: Replacer = ClockReplacer> {
    table: &'a TableHeap<D, R>,
    page_id: Option<PageId>,
    slot: SlotId,
}

impl<'a, D: DiskManager, R: Replacer> TableScan<'a, D, R> {
    /// Returns the next tuple and its record id, or `None` at the end.
    pub fn next(&mut self) -> Result<Option<(RecordId, Vec<u8>)>, HeapError> {
        while let Some(page_id) = self.page_id {
            let guard = self.table.pool.fetch_page(page_id)?;
            let page = HeapPage::new(&guard[..]);

            while self.slot < page.slot_count() {
                let slot = self.slot;
                self.slot += 1;
                if let Some(tuple) = page.read(slot) {
                    return Ok(Some((RecordId::new(page_id, slot), tuple.to_vec())));
                }
            }

            self.page_id = page.next_page();
            self.slot = 0;
        }
        Ok(None)
    }
}

//! Linear-probe hash table over the buffer pool.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::warn;

use super::block_page::{HashBlockPage, block_capacity};
use super::error::IndexError;
use super::header_page::HashHeaderPage;
use super::key::IndexCodec;
use crate::storage::{BufferPoolManager, ClockReplacer, DiskManager, PageId, Replacer};

/// Disk-resident mapping from keys to multisets of values.
///
/// The table owns one header page and a fixed number of block pages, one
/// per bucket. A key hashes to a bucket; within the bucket, slots are
/// probed in order with the `occupied` bitmap as the terminator. Bucket
/// count and hash function are fixed at construction.
///
/// The header's fields are immutable after creation, so they are cached in
/// memory for the table's lifetime; [`open`](Self::open) re-reads them
/// from the persisted header page.
///
/// # Concurrency
///
/// The table holds no lock of its own; per-bucket synchronization comes
/// from the buffer pool's frame locks. One operation pins one bucket page
/// at a time, so concurrent operations on different buckets proceed in
/// parallel. Callers must serialize writers of the same `(key, value)`
/// pair if they need a deterministic outcome.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use stratum::index::LinearProbeHashTable;
/// use stratum::storage::{BufferPoolConfig, BufferPoolManager, ClockReplacer, MemoryDiskManager};
///
/// let pool = Arc::new(BufferPoolManager::new(
///     MemoryDiskManager::new(),
///     ClockReplacer::new(16),
///     BufferPoolConfig { pool_size: 16 },
/// ));
/// let table =
///     LinearProbeHashTable::<i32, i32, _, _>::create(pool, 4, |k: &i32| *k as u64).unwrap();
///
/// assert!(table.insert(&1, &10).unwrap());
/// assert_eq!(table.get(&1).unwrap(), vec![10]);
/// ```
pub struct LinearProbeHashTable<K, V, D, H, R = ClockReplacer>
where
    D: DiskManager,
    R: Replacer,
{
    pool: Arc<BufferPoolManager<D, R>>,
    header_page_id: PageId,
    num_buckets: usize,
    block_page_ids: Vec<PageId>,
    hasher: H,
    _marker: PhantomData<(K, V)>,
}

impl<K, V, D, H, R> LinearProbeHashTable<K, V, D, H, R>
where
    K: IndexCodec,
    V: IndexCodec,
    D: DiskManager,
    H: Fn(&K) -> u64,
    R: Replacer,
{
    /// Creates a new hash table with `num_buckets` buckets.
    ///
    /// Allocates the header page and one zeroed block page per bucket; all
    /// pages are left unpinned and dirty, reaching disk on eviction or
    /// flush.
    ///
    /// # Panics
    ///
    /// Panics if `num_buckets` is 0.
    ///
    /// # Errors
    ///
    /// - `IndexError::TooManyBuckets` if the header page cannot reference
    ///   `num_buckets` block pages
    /// - `IndexError::Buffer` on pool exhaustion or I/O failure
    pub fn create(
        pool: Arc<BufferPoolManager<D, R>>,
        num_buckets: usize,
        hasher: H,
    ) -> Result<Self, IndexError> {
        assert!(num_buckets > 0, "num_buckets must be > 0");
        if num_buckets > HashHeaderPage::<&[u8]>::MAX_BUCKETS {
            return Err(IndexError::TooManyBuckets {
                requested: num_buckets,
                max: HashHeaderPage::<&[u8]>::MAX_BUCKETS,
            });
        }

        let header_page_id = {
            let mut guard = pool.new_page()?;
            let page_id = guard.page_id();
            let mut header = HashHeaderPage::new(&mut guard[..]);
            header.set_page_id(page_id);
            header.set_size(num_buckets);
            guard.mark_dirty();
            page_id
        };

        // A freshly allocated page is zeroed, which is exactly an empty
        // block page: both bitmaps clear.
        let mut block_page_ids = Vec::with_capacity(num_buckets);
        for _ in 0..num_buckets {
            let mut guard = pool.new_page()?;
            guard.mark_dirty();
            block_page_ids.push(guard.page_id());
        }

        {
            let mut guard = pool.fetch_page_mut(header_page_id)?;
            let mut header = HashHeaderPage::new(&mut guard[..]);
            for (index, &page_id) in block_page_ids.iter().enumerate() {
                header.set_block_page_id(index, page_id);
            }
            guard.mark_dirty();
        }

        Ok(Self {
            pool,
            header_page_id,
            num_buckets,
            block_page_ids,
            hasher,
            _marker: PhantomData,
        })
    }

    /// Reattaches to a hash table from its persisted header page.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Corrupted` if the page does not look like a
    /// header written by [`create`](Self::create).
    pub fn open(
        pool: Arc<BufferPoolManager<D, R>>,
        header_page_id: PageId,
        hasher: H,
    ) -> Result<Self, IndexError> {
        let (num_buckets, block_page_ids) = {
            let guard = pool.fetch_page(header_page_id)?;
            let header = HashHeaderPage::new(&guard[..]);

            if header.page_id() != header_page_id {
                return Err(IndexError::Corrupted(format!(
                    "header claims page id {:?}, fetched from {:?}",
                    header.page_id(),
                    header_page_id
                )));
            }
            let size = header.size();
            if size == 0 || size > HashHeaderPage::<&[u8]>::MAX_BUCKETS {
                return Err(IndexError::Corrupted(format!(
                    "implausible bucket count {}",
                    size
                )));
            }

            let ids = (0..size).map(|i| header.block_page_id(i)).collect();
            (size, ids)
        };

        Ok(Self {
            pool,
            header_page_id,
            num_buckets,
            block_page_ids,
            hasher,
            _marker: PhantomData,
        })
    }

    /// Returns the id of the header page, needed to reopen the table.
    pub fn header_page_id(&self) -> PageId {
        self.header_page_id
    }

    /// Returns the bucket count.
    pub fn size(&self) -> usize {
        self.num_buckets
    }

    /// Collects every value stored under `key`.
    pub fn get(&self, key: &K) -> Result<Vec<V>, IndexError> {
        let mut guard = self.pool.fetch_page_mut(self.bucket_page_id(key))?;
        let block = HashBlockPage::<_, K, V>::new(&guard[..]);

        let mut result = Vec::new();
        for slot in 0..block_capacity::<K, V>() {
            if !block.is_occupied(slot) {
                break;
            }
            if block.is_readable(slot) && block.key_at(slot) == *key {
                result.push(block.value_at(slot));
            }
        }

        guard.mark_dirty();
        Ok(result)
    }

    /// Inserts `(key, value)` into the key's bucket.
    ///
    /// Returns `false` without modifying the table if the bucket already
    /// holds the same `(key, value)` pair, or if the bucket has no free
    /// slot left.
    pub fn insert(&self, key: &K, value: &V) -> Result<bool, IndexError> {
        let mut guard = self.pool.fetch_page_mut(self.bucket_page_id(key))?;
        let mut block = HashBlockPage::<_, K, V>::new(&mut guard[..]);

        // First pass: reject an exact duplicate. The occupied bitmap
        // terminates the probe.
        for slot in 0..block_capacity::<K, V>() {
            if !block.is_occupied(slot) {
                break;
            }
            if block.is_readable(slot)
                && block.key_at(slot) == *key
                && block.value_at(slot) == *value
            {
                guard.mark_dirty();
                return Ok(false);
            }
        }

        // Second pass: take the first slot without a live entry, which may
        // be a tombstone.
        let mut inserted = false;
        for slot in 0..block_capacity::<K, V>() {
            if block.insert(slot, key, value) {
                inserted = true;
                break;
            }
        }

        guard.mark_dirty();
        Ok(inserted)
    }

    /// Removes one `(key, value)` pair from the key's bucket.
    ///
    /// Returns `false` if no matching pair is live in the bucket. The
    /// freed slot becomes a tombstone: still occupied, no longer readable.
    pub fn remove(&self, key: &K, value: &V) -> Result<bool, IndexError> {
        let mut guard = self.pool.fetch_page_mut(self.bucket_page_id(key))?;
        let mut block = HashBlockPage::<_, K, V>::new(&mut guard[..]);

        let mut removed = false;
        for slot in 0..block_capacity::<K, V>() {
            if !block.is_occupied(slot) {
                break;
            }
            if block.is_readable(slot)
                && block.key_at(slot) == *key
                && block.value_at(slot) == *value
            {
                block.remove(slot);
                removed = true;
                break;
            }
        }

        guard.mark_dirty();
        Ok(removed)
    }

    /// Changing the bucket count of a live table is not supported; the
    /// call logs a warning and leaves the table untouched.
    pub fn resize(&self, num_buckets: usize) {
        warn!(
            requested = num_buckets,
            current = self.num_buckets,
            "hash table resize is unimplemented; bucket count is fixed at creation"
        );
    }

    fn bucket_page_id(&self, key: &K) -> PageId {
        let bucket = ((self.hasher)(key) % self.num_buckets as u64) as usize;
        self.block_page_ids[bucket]
    }
}

//! File-backed disk manager.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::DiskManager;
use crate::storage::error::DiskError;
use crate::storage::page::{PAGE_SIZE, PageId};

/// File-backed page store.
///
/// Stores pages as contiguous `PAGE_SIZE` blocks in a single file.
///
/// # File Layout
///
/// ```text
/// +------------------+------------------+------------------+
/// | Page 0 (4KB)     | Page 1 (4KB)     | Page 2 (4KB)     | ...
/// +------------------+------------------+------------------+
/// ^ offset 0         ^ offset 4096      ^ offset 8192
/// ```
///
/// # Concurrency
///
/// A mutex around the file handle serializes I/O operations. The
/// deallocated-page set lives under the same mutex so a read can never
/// race a concurrent deallocation.
///
/// The deallocated set is not persisted; reopening a file forgets which
/// pages were freed.
///
/// # Durability
///
/// `sync_all` calls `File::sync_all` to ensure data reaches disk. Without
/// it, data may be lost on crash.
pub struct FileDiskManager {
    /// Path to the storage file
    path: PathBuf,
    /// File handle plus the deallocated-page set, serialized together
    inner: Mutex<FileInner>,
    /// Number of pages ever allocated in this file
    page_count: AtomicU64,
}

struct FileInner {
    file: File,
    deallocated: HashSet<PageId>,
}

impl FileDiskManager {
    /// Opens or creates a storage file at the given path.
    ///
    /// If the file exists, its page count is calculated from the file size.
    /// If the file doesn't exist, it is created empty.
    ///
    /// # Errors
    ///
    /// Returns `DiskError::Corrupted` if the file size is not a multiple
    /// of PAGE_SIZE.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DiskError> {
        let path = path.into();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let file_size = file.metadata()?.len();
        if file_size % PAGE_SIZE as u64 != 0 {
            return Err(DiskError::Corrupted(format!(
                "file size {} is not a multiple of page size {}",
                file_size, PAGE_SIZE
            )));
        }

        Ok(Self {
            path,
            inner: Mutex::new(FileInner {
                file,
                deallocated: HashSet::new(),
            }),
            page_count: AtomicU64::new(file_size / PAGE_SIZE as u64),
        })
    }

    /// Returns the path to the storage file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_page(&self, page_id: PageId, inner: &FileInner) -> Result<(), DiskError> {
        if page_id.page_num() >= self.page_count.load(Ordering::Acquire) {
            return Err(DiskError::PageNotFound(page_id));
        }
        if inner.deallocated.contains(&page_id) {
            return Err(DiskError::PageDeallocated(page_id));
        }
        Ok(())
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<(), DiskError> {
        if buf.len() != PAGE_SIZE {
            return Err(DiskError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let mut inner = self.inner.lock();
        self.check_page(page_id, &inner)?;

        inner.file.seek(SeekFrom::Start(page_id.byte_offset()))?;
        inner.file.read_exact(buf)?;
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<(), DiskError> {
        if buf.len() != PAGE_SIZE {
            return Err(DiskError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let mut inner = self.inner.lock();
        self.check_page(page_id, &inner)?;

        inner.file.seek(SeekFrom::Start(page_id.byte_offset()))?;
        inner.file.write_all(buf)?;
        Ok(())
    }

    fn allocate_page(&self) -> Result<PageId, DiskError> {
        let mut inner = self.inner.lock();

        let page_num = self.page_count.load(Ordering::Acquire);
        let page_id = PageId::new(page_num);

        // Extend the file with a zeroed page
        inner.file.seek(SeekFrom::Start(page_id.byte_offset()))?;
        inner.file.write_all(&[0u8; PAGE_SIZE])?;

        self.page_count.store(page_num + 1, Ordering::Release);
        Ok(page_id)
    }

    fn deallocate_page(&self, page_id: PageId) -> Result<(), DiskError> {
        let mut inner = self.inner.lock();
        self.check_page(page_id, &inner)?;

        // Zero the block so stale bytes cannot resurface through raw reads
        inner.file.seek(SeekFrom::Start(page_id.byte_offset()))?;
        inner.file.write_all(&[0u8; PAGE_SIZE])?;
        inner.deallocated.insert(page_id);
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.page_count.load(Ordering::Acquire) as usize
    }

    fn sync_all(&self) -> Result<(), DiskError> {
        let inner = self.inner.lock();
        inner.file.sync_all()?;
        Ok(())
    }
}

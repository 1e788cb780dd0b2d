//! Disk-layer errors.

use crate::storage::PageId;

/// Errors surfaced by disk manager implementations.
#[derive(Debug)]
pub enum DiskError {
    /// Page has never been allocated.
    ///
    /// Use `allocate_page` to create new pages before reading or writing
    /// them.
    PageNotFound(PageId),

    /// Page was allocated and later deallocated.
    ///
    /// Reads and writes of deallocated pages are client bugs; the id is
    /// never recycled, so the access cannot be confused with a fresh page.
    PageDeallocated(PageId),

    /// Invalid buffer size provided to read_page or write_page.
    ///
    /// Buffers must be exactly PAGE_SIZE bytes.
    InvalidBufferSize {
        /// Expected buffer size (PAGE_SIZE)
        expected: usize,
        /// Actual buffer size provided
        actual: usize,
    },

    /// I/O error from the underlying file system.
    Io(std::io::Error),

    /// Data corruption detected.
    ///
    /// This indicates that the storage file has an invalid format or size.
    Corrupted(String),
}

impl std::fmt::Display for DiskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiskError::PageNotFound(id) => write!(f, "page not found: {:?}", id),
            DiskError::PageDeallocated(id) => write!(f, "page was deallocated: {:?}", id),
            DiskError::InvalidBufferSize { expected, actual } => {
                write!(f, "invalid buffer size: expected {}, got {}", expected, actual)
            }
            DiskError::Io(e) => write!(f, "I/O error: {}", e),
            DiskError::Corrupted(msg) => write!(f, "data corruption: {}", msg),
        }
    }
}

impl std::error::Error for DiskError {}

impl From<std::io::Error> for DiskError {
    fn from(e: std::io::Error) -> Self {
        DiskError::Io(e)
    }
}

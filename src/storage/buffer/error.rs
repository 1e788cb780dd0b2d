//! Buffer pool errors.

use crate::storage::{DiskError, PageId};

/// Errors that can occur during buffer pool operations.
#[derive(Debug)]
pub enum BufferError {
    /// Every frame is pinned and no page can be evicted.
    ///
    /// The caller decides whether to retry after releasing pins or to fail
    /// the operation.
    PoolExhausted,

    /// The requested page does not exist on disk.
    PageNotFound(PageId),

    /// Underlying disk I/O error.
    ///
    /// The buffer pool performs no recovery; the error is surfaced as-is.
    Disk(DiskError),
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::PoolExhausted => {
                write!(f, "no free frames available and all pages are pinned")
            }
            BufferError::PageNotFound(page_id) => {
                write!(f, "page not found: {:?}", page_id)
            }
            BufferError::Disk(e) => {
                write!(f, "disk error: {}", e)
            }
        }
    }
}

impl std::error::Error for BufferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BufferError::Disk(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DiskError> for BufferError {
    fn from(e: DiskError) -> Self {
        match e {
            DiskError::PageNotFound(id) => BufferError::PageNotFound(id),
            other => BufferError::Disk(other),
        }
    }
}

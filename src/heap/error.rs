//! Heap layer errors.

use crate::storage::BufferError;

/// Errors that can occur during table heap operations.
#[derive(Debug)]
pub enum HeapError {
    /// Tuple does not fit in a page even when the page is empty.
    TupleTooLarge {
        /// Size of the rejected tuple in bytes
        size: usize,
        /// Largest tuple a page can hold
        max: usize,
    },

    /// Underlying buffer pool error.
    Buffer(BufferError),
}

impl std::fmt::Display for HeapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeapError::TupleTooLarge { size, max } => {
                write!(f, "tuple of {} bytes exceeds page capacity of {}", size, max)
            }
            HeapError::Buffer(e) => write!(f, "buffer pool error: {}", e),
        }
    }
}

impl std::error::Error for HeapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HeapError::Buffer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BufferError> for HeapError {
    fn from(e: BufferError) -> Self {
        HeapError::Buffer(e)
    }
}

//! Index layer errors.

use crate::storage::BufferError;

/// Errors that can occur during hash index operations.
#[derive(Debug)]
pub enum IndexError {
    /// Requested bucket count does not fit in one header page.
    TooManyBuckets {
        /// Buckets requested at construction
        requested: usize,
        /// Most buckets a header page can reference
        max: usize,
    },

    /// Header page contents are not a valid hash table header.
    Corrupted(String),

    /// Underlying buffer pool error.
    Buffer(BufferError),
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::TooManyBuckets { requested, max } => {
                write!(f, "{} buckets requested, header page holds at most {}", requested, max)
            }
            IndexError::Corrupted(msg) => write!(f, "corrupted hash table header: {}", msg),
            IndexError::Buffer(e) => write!(f, "buffer pool error: {}", e),
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndexError::Buffer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BufferError> for IndexError {
    fn from(e: BufferError) -> Self {
        IndexError::Buffer(e)
    }
}

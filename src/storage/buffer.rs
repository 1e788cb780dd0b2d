//! Buffer pool for page caching.
//!
//! The buffer pool manager caches pages in a fixed array of frames, with a
//! clock (second-chance) replacement policy and RAII-based access guards.
//!
//! # Example
//!
//! ```no_run
//! use stratum::storage::{BufferPoolConfig, BufferPoolManager, ClockReplacer, MemoryDiskManager};
//!
//! let disk = MemoryDiskManager::new();
//! let config = BufferPoolConfig { pool_size: 64 };
//! let pool = BufferPoolManager::new(disk, ClockReplacer::new(64), config);
//!
//! // Allocate and write a new page
//! let mut guard = pool.new_page().unwrap();
//! let page_id = guard.page_id();
//! guard[0..5].copy_from_slice(b"hello");
//! guard.mark_dirty();
//! drop(guard); // Unpins
//!
//! // Read the page back
//! let guard = pool.fetch_page(page_id).unwrap();
//! assert_eq!(&guard[0..5], b"hello");
//! ```

mod error;
mod frame;
mod guard;
mod pool;
mod replacer;

pub use error::BufferError;
pub use frame::FrameId;
pub use guard::{PageReadGuard, PageWriteGuard};
pub use pool::{BufferPoolConfig, BufferPoolManager};
pub use replacer::{ClockReplacer, Replacer};

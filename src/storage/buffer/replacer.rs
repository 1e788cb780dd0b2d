//! Page replacement policies for the buffer pool.
//!
//! The replacer tracks which frames are evictable (unpinned) and selects
//! victims for eviction when the buffer pool needs free frames.

use parking_lot::Mutex;
use tracing::warn;

use super::frame::FrameId;

/// Trait for page replacement policies.
///
/// # Thread Safety
///
/// Implementations are internally synchronized; all methods take `&self`.
/// The buffer pool may call into the replacer while holding its own state
/// latch, so implementations must never call back into the pool.
///
/// # Usage
///
/// ```text
/// // When a page's pin_count drops to 0
/// replacer.unpin(frame_id);
///
/// // When a page's pin_count increases from 0
/// replacer.pin(frame_id);
///
/// // When the buffer pool needs a victim
/// if let Some(victim) = replacer.victim() {
///     // Evict the victim frame
/// }
/// ```
pub trait Replacer: Send + Sync {
    /// Selects a victim frame for eviction.
    ///
    /// Returns `Some(frame_id)` if there's an evictable frame, `None` if
    /// all frames are pinned. The returned frame is removed from the
    /// replacer's candidate set.
    fn victim(&self) -> Option<FrameId>;

    /// Marks a frame as non-evictable (pinned).
    ///
    /// Called when a frame's pin count increases from 0 to 1, and when a
    /// frame is taken off the free list. No-op if the frame is not a
    /// candidate.
    fn pin(&self, frame_id: FrameId);

    /// Marks a frame as evictable (unpinned).
    ///
    /// Called when a frame's pin count drops to 0.
    fn unpin(&self, frame_id: FrameId);

    /// Returns the number of evictable frames.
    fn size(&self) -> usize;
}

/// CLOCK (second-chance) page replacement policy.
///
/// Approximates LRU with two bits per frame: a candidate bit (the frame is
/// unpinned and may be evicted) and a reference bit. A clock hand sweeps
/// the frame array; a candidate with its reference bit set gets a second
/// chance (the bit is cleared and the hand moves on), a candidate without
/// it is the victim.
///
/// # Data Structure
///
/// Two `Vec<bool>` bitmaps indexed by frame id, a hand cursor, and a count
/// of candidates. All state sits behind one mutex.
///
/// # Hand Position
///
/// After a victim is selected the hand is left on the victim's slot. The
/// next scan starts there and advances past it immediately, because the
/// victim's candidate bit is now clear.
///
/// # Example
///
/// ```
/// use stratum::storage::{ClockReplacer, Replacer};
///
/// let replacer = ClockReplacer::new(7);
///
/// // Mark frames as evictable
/// replacer.unpin(1);
/// replacer.unpin(2);
/// replacer.unpin(3);
///
/// // First sweep clears reference bits, second selects in hand order
/// assert_eq!(replacer.victim(), Some(1));
/// assert_eq!(replacer.victim(), Some(2));
/// assert_eq!(replacer.victim(), Some(3));
/// assert_eq!(replacer.victim(), None);
/// ```
pub struct ClockReplacer {
    state: Mutex<ClockState>,
}

struct ClockState {
    /// Candidate bit per frame: set iff the frame is unpinned and resident.
    in_replacer: Vec<bool>,
    /// Second-chance reference bit per frame.
    ref_bit: Vec<bool>,
    /// Current hand position in `[0, capacity)`.
    clock_hand: usize,
    /// Number of frames with the candidate bit set.
    candidates: usize,
}

impl ClockReplacer {
    /// Creates a clock replacer tracking `capacity` frames.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            state: Mutex::new(ClockState {
                in_replacer: vec![false; capacity],
                ref_bit: vec![false; capacity],
                clock_hand: 0,
                candidates: 0,
            }),
        }
    }

    /// Returns the number of frames this replacer tracks.
    pub fn capacity(&self) -> usize {
        self.state.lock().in_replacer.len()
    }
}

impl Replacer for ClockReplacer {
    fn victim(&self) -> Option<FrameId> {
        let mut state = self.state.lock();
        if state.candidates == 0 {
            return None;
        }

        // With at least one candidate the sweep terminates in at most
        // 2 * capacity steps: the first pass clears reference bits, the
        // second finds a candidate with its bit clear.
        loop {
            let hand = state.clock_hand;
            if state.in_replacer[hand] && !state.ref_bit[hand] {
                state.in_replacer[hand] = false;
                state.candidates -= 1;
                // Hand stays on the victim; the next scan advances past it.
                return Some(hand);
            }
            if state.ref_bit[hand] {
                state.ref_bit[hand] = false;
            }
            state.clock_hand = (hand + 1) % state.in_replacer.len();
        }
    }

    fn pin(&self, frame_id: FrameId) {
        let mut state = self.state.lock();
        if frame_id >= state.in_replacer.len() {
            warn!(frame_id, "clock replacer: pin of invalid frame id ignored");
            return;
        }
        if state.in_replacer[frame_id] {
            state.in_replacer[frame_id] = false;
            state.ref_bit[frame_id] = false;
            state.candidates -= 1;
        }
    }

    fn unpin(&self, frame_id: FrameId) {
        let mut state = self.state.lock();
        if frame_id >= state.in_replacer.len() {
            warn!(frame_id, "clock replacer: unpin of invalid frame id ignored");
            return;
        }
        if !state.in_replacer[frame_id] {
            state.in_replacer[frame_id] = true;
            state.candidates += 1;
        }
        // The reference bit is set on every unpin, including the one that
        // admits the frame.
        state.ref_bit[frame_id] = true;
    }

    fn size(&self) -> usize {
        self.state.lock().candidates
    }
}

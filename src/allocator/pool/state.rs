//! Shared pool state: chunks, freelist, growth policy
//!
//! One `PoolState` is the unit of identity for "a pool". Every handle clone
//! points at the same state; the state owns every chunk it ever allocated
//! and releases them all exactly once when it is dropped.
//!
//! # Safety
//!
//! All raw-pointer arithmetic in the crate lives here. The invariants:
//!
//! - every freelist entry points into exactly one owned chunk, at a multiple
//!   of the slot stride from that chunk's base
//! - chunk address ranges are pairwise disjoint (each is a fresh system
//!   allocation)
//! - `chunk_capacity` never decreases, so chunk capacities are monotone
//!   non-decreasing in allocation order
//! - the slot stride (`slot_size`) is the element size rounded up to
//!   `slot_align`, so every slot in an aligned chunk is properly aligned

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::allocator::system::SystemAllocator;
use crate::allocator::traits::RawAllocator;
use crate::error::{AllocError, AllocResult};
use crate::utils::{align_up, is_aligned};

/// Capacity of the first chunk when no other hint is available
pub(crate) const DEFAULT_CHUNK_SLOTS: usize = 4;

/// One contiguous memory block, split into slots at creation time
///
/// The capacity recorded here is the chunk's own, fixed at allocation time.
/// Membership tests use it rather than the pool's current (possibly larger)
/// capacity field, so ranges of early, smaller chunks stay exact.
pub(crate) struct Chunk {
    base: NonNull<u8>,
    capacity: usize,
    layout: Layout,
}

impl Chunk {
    /// Checks whether `addr` falls inside this chunk's byte range
    #[inline]
    fn contains(&self, addr: usize) -> bool {
        let start = self.base.as_ptr() as usize;
        addr >= start && addr < start + self.layout.size()
    }
}

/// Shared, reference-counted record owning all chunks and the freelist for
/// one logical pool
///
/// Held behind `Rc<RefCell<_>>` by [`PoolAllocator`](super::PoolAllocator)
/// handles; never used directly by containers.
pub(crate) struct PoolState {
    /// Byte stride of one slot; element size rounded up to the alignment so
    /// slots tile the chunk
    slot_size: usize,
    /// Alignment of every slot (the element type's alignment)
    slot_align: usize,
    /// Capacity of the most recently allocated chunk; 0 until the first one
    chunk_capacity: usize,
    chunks: Vec<Chunk>,
    /// Slot addresses available for reuse; last freed is first served
    freelist: Vec<NonNull<u8>>,
    total_allocs: usize,
    total_deallocs: usize,
    system: SystemAllocator,
}

impl PoolState {
    /// Creates an empty state for elements of the given layout
    ///
    /// No chunk is allocated yet; the first single-element request grows the
    /// pool lazily.
    pub(crate) fn for_layout(element: Layout) -> Self {
        let slot_size = align_up(element.size(), element.align());

        #[cfg(feature = "logging")]
        tracing::debug!(slot_size, slot_align = element.align(), "new pool state");

        Self {
            slot_size,
            slot_align: element.align(),
            chunk_capacity: 0,
            chunks: Vec::new(),
            freelist: Vec::new(),
            total_allocs: 0,
            total_deallocs: 0,
            system: SystemAllocator::new(),
        }
    }

    #[inline]
    pub(crate) fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Allocates one chunk of at least `slots` slots and links every slot
    /// into the freelist
    ///
    /// A hint of 0 is treated as [`DEFAULT_CHUNK_SLOTS`]. The effective
    /// capacity is the maximum of the hint and the current `chunk_capacity`,
    /// keeping capacities monotone on every path (eager pre-sizing included).
    ///
    /// On failure nothing is mutated: the system allocation is the only
    /// fallible step and happens before the chunk is linked in.
    pub(crate) fn allocate_chunk(&mut self, slots: usize) -> AllocResult<()> {
        let slots = if slots == 0 { DEFAULT_CHUNK_SLOTS } else { slots };
        let capacity = self.chunk_capacity.max(slots);

        let bytes = capacity
            .checked_mul(self.slot_size)
            .ok_or_else(|| AllocError::size_overflow(capacity, self.slot_size))?;
        let layout = Layout::from_size_align(bytes, self.slot_align)
            .map_err(|_| AllocError::size_overflow(capacity, self.slot_size))?;

        // SAFETY: layout is valid, just constructed.
        let base = unsafe { self.system.allocate(layout)? };

        #[cfg(feature = "logging")]
        tracing::debug!(
            capacity,
            bytes,
            chunk = self.chunks.len(),
            "pool chunk allocated"
        );

        self.freelist.reserve(capacity);
        for i in 0..capacity {
            // SAFETY: i * slot_size < layout.size(), so the offset stays
            // inside the chunk just allocated.
            let slot = unsafe { base.add(i * self.slot_size) };
            debug_assert!(is_aligned(slot.as_ptr() as usize, self.slot_align));
            self.freelist.push(slot);
        }
        self.chunks.push(Chunk { base, capacity, layout });
        self.chunk_capacity = capacity;

        Ok(())
    }

    /// Serves one slot, growing by the doubling policy on a freelist miss
    ///
    /// Growth seeds at [`DEFAULT_CHUNK_SLOTS`] and doubles the previous
    /// chunk capacity thereafter.
    pub(crate) fn allocate_slot(&mut self) -> AllocResult<NonNull<u8>> {
        loop {
            if let Some(slot) = self.freelist.pop() {
                self.total_allocs += 1;
                return Ok(slot);
            }

            let next = if self.chunk_capacity == 0 {
                DEFAULT_CHUNK_SLOTS
            } else {
                self.chunk_capacity * 2
            };
            self.allocate_chunk(next)?;
        }
    }

    /// Returns a slot to the freelist
    ///
    /// The caller has already established membership via [`owns`](Self::owns).
    /// No slot-alignment or double-free check is made; that is the caller's
    /// contract.
    pub(crate) fn release_slot(&mut self, slot: NonNull<u8>) {
        self.total_deallocs += 1;
        self.freelist.push(slot);
    }

    /// Checks whether `ptr` lies within any chunk's recorded byte range
    ///
    /// Ranges are disjoint by construction, so scan order only affects cost.
    pub(crate) fn owns(&self, ptr: NonNull<u8>) -> bool {
        let addr = ptr.as_ptr() as usize;
        self.chunks.iter().any(|chunk| chunk.contains(addr))
    }

    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    pub(crate) fn free_slots(&self) -> usize {
        self.freelist.len()
    }

    /// Total slots across all chunks, by each chunk's recorded capacity
    pub(crate) fn total_slots(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.capacity).sum()
    }

    pub(crate) fn total_allocs(&self) -> usize {
        self.total_allocs
    }

    pub(crate) fn total_deallocs(&self) -> usize {
        self.total_deallocs
    }

    /// Reserved bytes across all chunks
    pub(crate) fn reserved_bytes(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.layout.size()).sum()
    }
}

impl Drop for PoolState {
    fn drop(&mut self) {
        for chunk in &self.chunks {
            // SAFETY: each chunk was allocated from `self.system` with the
            // recorded layout and is freed exactly once, here.
            unsafe { self.system.deallocate(chunk.base, chunk.layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_for<T>() -> PoolState {
        PoolState::for_layout(Layout::new::<T>())
    }

    #[test]
    fn starts_empty() {
        let state = state_for::<u64>();
        assert_eq!(state.chunk_capacity(), 0);
        assert_eq!(state.chunk_count(), 0);
        assert_eq!(state.free_slots(), 0);
    }

    #[test]
    fn first_lazy_chunk_has_default_capacity() {
        let mut state = state_for::<u64>();
        let slot = state.allocate_slot().unwrap();

        assert_eq!(state.chunk_capacity(), DEFAULT_CHUNK_SLOTS);
        assert_eq!(state.chunk_count(), 1);
        assert_eq!(state.free_slots(), DEFAULT_CHUNK_SLOTS - 1);
        assert!(state.owns(slot));
    }

    #[test]
    fn zero_hint_becomes_default() {
        let mut state = state_for::<u32>();
        state.allocate_chunk(0).unwrap();
        assert_eq!(state.chunk_capacity(), DEFAULT_CHUNK_SLOTS);
    }

    #[test]
    fn eager_hint_is_respected() {
        let mut state = state_for::<u32>();
        state.allocate_chunk(10).unwrap();
        assert_eq!(state.chunk_capacity(), 10);
        assert_eq!(state.free_slots(), 10);
    }

    #[test]
    fn growth_doubles_capacity() {
        let mut state = state_for::<u64>();

        let mut taken = Vec::new();
        for _ in 0..DEFAULT_CHUNK_SLOTS {
            taken.push(state.allocate_slot().unwrap());
        }
        assert_eq!(state.chunk_count(), 1);

        // Freelist is dry; the next request doubles.
        taken.push(state.allocate_slot().unwrap());
        assert_eq!(state.chunk_count(), 2);
        assert_eq!(state.chunk_capacity(), DEFAULT_CHUNK_SLOTS * 2);
        assert_eq!(state.free_slots(), DEFAULT_CHUNK_SLOTS * 2 - 1);
    }

    #[test]
    fn released_slot_is_served_next() {
        let mut state = state_for::<u64>();
        let first = state.allocate_slot().unwrap();
        let second = state.allocate_slot().unwrap();

        state.release_slot(first);
        assert_eq!(state.allocate_slot().unwrap(), first);

        state.release_slot(second);
        state.release_slot(first);
        // Last freed, first served.
        assert_eq!(state.allocate_slot().unwrap(), first);
        assert_eq!(state.allocate_slot().unwrap(), second);
    }

    #[test]
    fn foreign_pointer_is_not_owned() {
        let mut state = state_for::<u64>();
        let _slot = state.allocate_slot().unwrap();

        let foreign = Box::new(0u64);
        let ptr = NonNull::from(Box::as_ref(&foreign)).cast::<u8>();
        assert!(!state.owns(ptr));
    }

    #[test]
    fn chunk_ranges_are_disjoint() {
        let mut state = state_for::<u64>();
        // Force three chunks: 4, 8, 16.
        for _ in 0..(4 + 8 + 1) {
            state.allocate_slot().unwrap();
        }
        assert_eq!(state.chunk_count(), 3);

        let ranges: Vec<(usize, usize)> = state
            .chunks
            .iter()
            .map(|c| {
                let start = c.base.as_ptr() as usize;
                (start, start + c.layout.size())
            })
            .collect();

        for (i, a) in ranges.iter().enumerate() {
            for b in ranges.iter().skip(i + 1) {
                assert!(a.1 <= b.0 || b.1 <= a.0, "ranges {a:?} and {b:?} overlap");
            }
        }
    }

    #[test]
    fn membership_uses_per_chunk_capacity() {
        let mut state = state_for::<u64>();
        // First chunk: 4 slots. Grow to a 8-slot chunk afterwards.
        for _ in 0..5 {
            state.allocate_slot().unwrap();
        }
        assert_eq!(state.chunk_capacity(), 8);

        let first = &state.chunks[0];
        assert_eq!(first.capacity, 4);
        let first_end = first.base.as_ptr() as usize + first.layout.size();

        // One byte past the first chunk's own range must not be claimed by
        // that chunk, even though the pool-level capacity has since doubled.
        assert!(!first.contains(first_end));
        assert!(first.contains(first_end - 1));
    }

    #[test]
    fn counters_track_traffic() {
        let mut state = state_for::<u32>();
        let a = state.allocate_slot().unwrap();
        let b = state.allocate_slot().unwrap();
        state.release_slot(a);
        state.release_slot(b);

        assert_eq!(state.total_allocs(), 2);
        assert_eq!(state.total_deallocs(), 2);
    }
}

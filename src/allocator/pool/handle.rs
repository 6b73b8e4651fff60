//! Pool allocator handle
//!
//! [`PoolAllocator<T>`] is the value containers hold: a cheap, clonable
//! handle over one shared `PoolState`. Cloning shares the pool; rebinding
//! to another element type starts a fresh one. The state lives as long as
//! any handle referencing it.
//!
//! The routing rule sits here: a request for exactly one element goes to the
//! pool, anything else bypasses it and talks to the general-purpose
//! allocator directly.

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;
use std::cell::RefCell;
use std::rc::Rc;

use super::state::PoolState;
use super::stats::PoolStats;
use crate::allocator::system::SystemAllocator;
use crate::allocator::traits::{ElementAllocator, MemoryUsage};
use crate::error::AllocResult;

/// Pooling allocator handle for elements of type `T`
///
/// Single-element requests are served from chunked slot storage through a
/// freelist; all other requests go straight to the system allocator. Clones
/// of a handle draw from and return slots to the identical pool.
///
/// The pool is strictly single-threaded: the handle is neither `Send` nor
/// `Sync`, so unsynchronized cross-thread use is a compile error rather than
/// a data race.
///
/// # Example
///
/// ```
/// use chunk_pool::{ElementAllocator, PoolAllocator};
///
/// let pool = PoolAllocator::<u64>::new();
/// unsafe {
///     let slot = pool.allocate(1)?;
///     slot.as_ptr().write(7);
///     pool.deallocate(slot, 1);
/// }
/// # Ok::<(), chunk_pool::AllocError>(())
/// ```
pub struct PoolAllocator<T> {
    state: Rc<RefCell<PoolState>>,
    _element: PhantomData<T>,
}

impl<T> PoolAllocator<T> {
    /// Creates a handle over a fresh, empty pool
    ///
    /// No chunk is allocated until the first single-element request.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(PoolState::for_layout(Layout::new::<T>()))),
            _element: PhantomData,
        }
    }

    /// Creates a handle over a fresh pool with one chunk pre-allocated for
    /// at least `slots` elements
    ///
    /// A hint of 0 is treated as the default chunk capacity. Zero-sized
    /// element types never need storage, so the hint is ignored for them.
    ///
    /// # Errors
    /// Propagates the system allocator's out-of-memory failure for the
    /// eager chunk.
    pub fn with_capacity(slots: usize) -> AllocResult<Self> {
        let handle = Self::new();
        if size_of::<T>() > 0 {
            handle.state.borrow_mut().allocate_chunk(slots)?;
        }
        Ok(handle)
    }

    /// Byte size of one pooled slot
    pub fn element_size(&self) -> usize {
        self.state.borrow().slot_size()
    }

    /// Number of chunks allocated so far
    pub fn chunk_count(&self) -> usize {
        self.state.borrow().chunk_count()
    }

    /// Capacity, in slots, of the most recently allocated chunk
    pub fn chunk_capacity(&self) -> usize {
        self.state.borrow().chunk_capacity()
    }

    /// Slots currently available for reuse
    pub fn free_slots(&self) -> usize {
        self.state.borrow().free_slots()
    }

    /// Total slots across all chunks
    pub fn total_slots(&self) -> usize {
        self.state.borrow().total_slots()
    }

    /// Checks whether `ptr` points into this pool's chunk storage
    pub fn owns(&self, ptr: NonNull<T>) -> bool {
        self.state.borrow().owns(ptr.cast())
    }

    /// Snapshot of the pool's current shape and traffic counters
    pub fn stats(&self) -> PoolStats {
        let state = self.state.borrow();
        PoolStats {
            element_size: state.slot_size(),
            chunk_count: state.chunk_count(),
            chunk_capacity: state.chunk_capacity(),
            total_slots: state.total_slots(),
            free_slots: state.free_slots(),
            reserved_bytes: state.reserved_bytes(),
            total_allocs: state.total_allocs(),
            total_deallocs: state.total_deallocs(),
        }
    }
}

impl<T> Default for PoolAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloning shares the pool: both handles observe and mutate the same chunks
/// and freelist, and the pool outlives whichever handle is dropped first.
impl<T> Clone for PoolAllocator<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            _element: PhantomData,
        }
    }
}

/// Two handles are equal iff they share the same pool state, i.e. iff they
/// may release each other's blocks.
impl<T> PartialEq for PoolAllocator<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl<T> Eq for PoolAllocator<T> {}

impl<T> fmt::Debug for PoolAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("PoolAllocator")
            .field("element_size", &state.slot_size())
            .field("chunks", &state.chunk_count())
            .field("free_slots", &state.free_slots())
            .finish()
    }
}

// SAFETY: pooled slots come from chunks owned by the shared state, are
// properly aligned (slot stride is a multiple of the element alignment), and
// stay valid until released — chunks are only freed when the last handle
// drops. Bypass blocks come from the system allocator under the same layout
// used to release them. `is_interchangeable` is exact: it is state identity.
unsafe impl<T> ElementAllocator<T> for PoolAllocator<T> {
    type Rebound<U> = PoolAllocator<U>;

    /// Produces a handle for element type `U` over a **new, independent**
    /// pool
    ///
    /// Rebinding changes the element size, so sharing the source pool would
    /// be unsafe; the new pool starts empty and grows lazily.
    fn rebind<U>(&self) -> PoolAllocator<U> {
        PoolAllocator::new()
    }

    unsafe fn allocate(&self, count: usize) -> AllocResult<NonNull<T>> {
        if count != 1 {
            // Bypass: not pool-managed, sized and served by the system
            // allocator.
            return unsafe { ElementAllocator::allocate(&SystemAllocator::new(), count) };
        }

        if size_of::<T>() == 0 {
            return Ok(NonNull::dangling());
        }

        let slot = self.state.borrow_mut().allocate_slot()?;
        Ok(slot.cast())
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        if count == 1 {
            if size_of::<T>() == 0 {
                return;
            }

            let pooled = self.state.borrow().owns(ptr.cast());
            if pooled {
                self.state.borrow_mut().release_slot(ptr.cast());
                return;
            }
        }

        // Bypass blocks (and foreign single-element pointers) go back to the
        // general-purpose allocator.
        // SAFETY: ptr was obtained from the system allocator with the same
        // count (caller contract — the pool path is excluded above).
        unsafe { ElementAllocator::deallocate(&SystemAllocator::new(), ptr, count) };
    }

    fn is_interchangeable(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T> MemoryUsage for PoolAllocator<T> {
    fn used_memory(&self) -> usize {
        let state = self.state.borrow();
        (state.total_slots() - state.free_slots()) * state.slot_size()
    }

    fn available_memory(&self) -> Option<usize> {
        let state = self.state.borrow();
        Some(state.free_slots() * state.slot_size())
    }

    fn total_memory(&self) -> Option<usize> {
        Some(self.state.borrow().reserved_bytes())
    }
}

//! Allocation traits
//!
//! Two seams, at two altitudes:
//!
//! - [`RawAllocator`] works in bytes and [`Layout`]s. It is the boundary
//!   between the pool and whatever provides chunk storage.
//! - [`ElementAllocator`] works in typed elements and counts. It is the
//!   contract containers allocate through, and carries the rebind operation
//!   node-based containers need to allocate an internal node type instead of
//!   the user-facing value type.
//!
//! # Safety
//!
//! Both traits are `unsafe` to implement: callers rely on returned pointers
//! being valid, properly aligned, and exclusive until deallocated, and
//! implementations rely on callers honoring the deallocation contracts
//! documented on each method. Violations (double free, freeing through the
//! wrong allocator, use after free) are undefined behavior — by design there
//! is no bookkeeping on the allocation path that could detect them.

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::error::AllocResult;

/// Byte-level allocator seam
///
/// Implementors hand out raw, uninitialized memory described by a [`Layout`].
/// The pool uses this seam to obtain chunk storage and to route bypass
/// requests.
///
/// # Safety
///
/// Implementors must ensure that:
/// - a successful `allocate` returns memory valid for reads and writes of
///   `layout.size()` bytes, aligned to `layout.align()`
/// - the memory remains valid until passed to `deallocate` on the same
///   allocator with the same layout
pub unsafe trait RawAllocator {
    /// Allocates memory with the given layout
    ///
    /// Zero-sized layouts succeed with a dangling, well-aligned pointer.
    ///
    /// # Safety
    /// The returned memory is uninitialized; the caller must initialize it
    /// before reading and must release it with [`RawAllocator::deallocate`]
    /// using the same layout.
    ///
    /// # Errors
    /// Returns [`AllocError::OutOfMemory`](crate::AllocError::OutOfMemory)
    /// when the underlying allocator cannot satisfy the request.
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<u8>>;

    /// Deallocates memory at the given pointer with the specified layout
    ///
    /// # Safety
    /// - `ptr` must have been returned by `allocate` on this allocator
    /// - `layout` must match the allocating call exactly
    /// - `ptr` must not be used after this call; double-free is undefined
    ///   behavior
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Element-level allocation contract for containers
///
/// Storage is requested in whole elements of the bound type `T`. The contract
/// mirrors what allocator-aware containers need:
///
/// - `allocate(n)` / `deallocate(ptr, n)` for `n` contiguous elements, with
///   no zero-initialization promised
/// - [`rebind`](ElementAllocator::rebind), producing a same-architecture
///   allocator bound to a different element type
/// - [`is_interchangeable`](ElementAllocator::is_interchangeable), the
///   compatibility check containers consult before letting one handle release
///   another's blocks (move/swap operations)
///
/// Handles are propagated by `Clone`; a clone must be interchangeable with
/// its source.
///
/// # Safety
///
/// Implementors must uphold the [`RawAllocator`]-style validity guarantees
/// for every returned pointer, and must keep `is_interchangeable` accurate:
/// if it returns `true`, either handle must accept blocks allocated by the
/// other.
pub unsafe trait ElementAllocator<T> {
    /// The allocator family member bound to element type `U`
    type Rebound<U>: ElementAllocator<U>;

    /// Produces an allocator of the same architecture bound to element type
    /// `U`
    ///
    /// Node-based containers call this to allocate their internal node type.
    /// Rebinding never shares element-sized resources with the source
    /// allocator; see the implementors for what that means concretely.
    fn rebind<U>(&self) -> Self::Rebound<U>;

    /// Obtains storage for `count` contiguous elements of `T`
    ///
    /// The storage is uninitialized.
    ///
    /// # Safety
    /// The caller must initialize the storage before reading it and must
    /// release it with [`deallocate`](ElementAllocator::deallocate), passing
    /// the same `count`, through this handle or one interchangeable with it.
    ///
    /// # Errors
    /// Returns [`AllocError::OutOfMemory`](crate::AllocError::OutOfMemory) if
    /// the underlying system cannot provide memory, or
    /// [`AllocError::SizeOverflow`](crate::AllocError::SizeOverflow) if
    /// `count * size_of::<T>()` overflows.
    unsafe fn allocate(&self, count: usize) -> AllocResult<NonNull<T>>;

    /// Releases storage previously obtained from
    /// [`allocate`](ElementAllocator::allocate) with the same `count`
    ///
    /// # Safety
    /// - `ptr` must come from `allocate(count)` on this handle or one
    ///   interchangeable with it
    /// - the elements must already be dropped; this releases storage only
    /// - releasing the same block twice is undefined behavior
    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize);

    /// Checks whether two handles may release each other's blocks
    fn is_interchangeable(&self, other: &Self) -> bool;
}

/// Memory usage tracking
///
/// Implemented by allocators that can report how much memory they hold.
pub trait MemoryUsage {
    /// Currently used memory in bytes
    fn used_memory(&self) -> usize;

    /// Memory available without growing, in bytes (if known)
    fn available_memory(&self) -> Option<usize>;

    /// Total reserved memory in bytes (if known)
    fn total_memory(&self) -> Option<usize> {
        match (self.used_memory(), self.available_memory()) {
            (used, Some(available)) => Some(used + available),
            _ => None,
        }
    }
}

//! General-purpose allocator wrapper
//!
//! Wraps the platform's default allocator behind the crate's allocation
//! seams. The pool leans on it twice: chunk storage comes from here, and
//! requests the pool does not manage (any count other than one) are routed
//! here unchanged.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::NonNull;
use std::alloc::System;

use super::traits::{ElementAllocator, RawAllocator};
use crate::error::{AllocError, AllocResult};

/// Wrapper for the system's default allocator
///
/// Stateless and free to construct. Every instance is interchangeable with
/// every other: blocks may be released through any of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemAllocator;

impl SystemAllocator {
    /// Creates a new `SystemAllocator`
    #[inline]
    pub const fn new() -> Self {
        SystemAllocator
    }
}

// SAFETY: delegates to the platform allocator, which returns valid, aligned,
// exclusive blocks; zero-sized requests are answered with a dangling pointer
// and never reach the platform allocator.
unsafe impl RawAllocator for SystemAllocator {
    #[inline]
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<u8>> {
        if layout.size() == 0 {
            // Zero-sized allocations get a well-aligned dangling pointer.
            return Ok(dangling_for(layout));
        }

        // SAFETY: layout has non-zero size, checked above.
        let ptr = unsafe { System.alloc(layout) };

        NonNull::new(ptr).ok_or_else(|| AllocError::out_of_memory(layout.size()))
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }

        // SAFETY: ptr came from `allocate` with the same non-zero layout
        // (caller contract).
        unsafe { System.dealloc(ptr.as_ptr(), layout) };
    }
}

// SAFETY: element requests are sized with overflow-checked array layouts and
// delegated to the RawAllocator impl above. Any two instances are
// interchangeable because the platform allocator is one global entity.
unsafe impl<T> ElementAllocator<T> for SystemAllocator {
    type Rebound<U> = SystemAllocator;

    #[inline]
    fn rebind<U>(&self) -> SystemAllocator {
        SystemAllocator
    }

    unsafe fn allocate(&self, count: usize) -> AllocResult<NonNull<T>> {
        let layout = Layout::array::<T>(count)
            .map_err(|_| AllocError::size_overflow(count, size_of::<T>()))?;

        // SAFETY: layout is valid, just constructed.
        let ptr = unsafe { RawAllocator::allocate(self, layout)? };
        Ok(ptr.cast())
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        // The layout was constructible at allocation time with the same
        // count, so reconstruction cannot fail for a validly obtained block.
        if let Ok(layout) = Layout::array::<T>(count) {
            // SAFETY: ptr and layout match the allocating call (caller
            // contract).
            unsafe { RawAllocator::deallocate(self, ptr.cast(), layout) };
        }
    }

    #[inline]
    fn is_interchangeable(&self, _other: &Self) -> bool {
        true
    }
}

/// Dangling pointer aligned for `layout`, for zero-sized requests
#[inline]
fn dangling_for(layout: Layout) -> NonNull<u8> {
    // align is non-zero, so this never wraps to null.
    NonNull::new(layout.align() as *mut u8).unwrap_or(NonNull::dangling())
}

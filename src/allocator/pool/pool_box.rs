//! Smart pointer for pool-allocated values

use core::mem::ManuallyDrop;
use core::ptr::{self, NonNull};

use super::handle::PoolAllocator;
use crate::allocator::traits::ElementAllocator;
use crate::error::AllocResult;

/// RAII smart pointer for a value stored in one pool slot
///
/// Similar to `Box`, but backed by a [`PoolAllocator`]: dropping the
/// `PoolBox` drops the value and returns its slot to the freelist. The box
/// holds a clone of the handle, so the pool stays alive at least as long as
/// the box.
pub struct PoolBox<T> {
    ptr: NonNull<T>,
    pool: PoolAllocator<T>,
}

impl<T> PoolBox<T> {
    /// Allocates one slot from `pool` and moves `value` into it
    ///
    /// # Errors
    /// Propagates the pool's out-of-memory failure.
    #[must_use = "allocated value must be used"]
    pub fn new_in(value: T, pool: &PoolAllocator<T>) -> AllocResult<Self> {
        // SAFETY: allocate(1) returns storage for exactly one T; write
        // initializes it before any read.
        let ptr = unsafe {
            let ptr = pool.allocate(1)?;
            ptr.as_ptr().write(value);
            ptr
        };

        Ok(Self { ptr, pool: pool.clone() })
    }

    /// Consumes the box and returns the contained value, releasing the slot
    #[must_use]
    pub fn into_inner(self) -> T {
        let this = ManuallyDrop::new(self);

        // SAFETY: ptr holds an initialized T; it is read out exactly once
        // and Drop will not run (ManuallyDrop), so no double-drop.
        let value = unsafe { ptr::read(this.ptr.as_ptr()) };
        // SAFETY: moving the handle out of the suppressed Drop; it is used
        // once, below, and dropped normally.
        let pool = unsafe { ptr::read(&this.pool) };
        // SAFETY: ptr came from this pool's allocate(1); the value has
        // already been moved out, only the storage is released.
        unsafe { pool.deallocate(this.ptr, 1) };

        value
    }
}

impl<T> core::ops::Deref for PoolBox<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: ptr is non-null and points to an initialized T owned
        // exclusively by this box; the lifetime is tied to &self.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> core::ops::DerefMut for PoolBox<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above, with exclusivity from &mut self.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for PoolBox<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        (**self).fmt(f)
    }
}

impl<T> Drop for PoolBox<T> {
    fn drop(&mut self) {
        // SAFETY: ptr holds an initialized T from new_in; the value is
        // dropped first, then its slot goes back to the pool.
        unsafe {
            ptr::drop_in_place(self.ptr.as_ptr());
            self.pool.deallocate(self.ptr, 1);
        }
    }
}

//! Chunked fixed-size pool allocation for node-based containers
//!
//! This crate provides a pooling allocator that amortizes the cost of
//! frequent, small, same-sized allocations — the pattern produced by
//! node-based containers (list nodes, tree nodes). Single-element requests
//! are served from large contiguous chunks through a freelist; anything
//! else is routed straight to the general-purpose allocator.
//!
//! The main pieces:
//!
//! - [`PoolAllocator<T>`] — a cheap, clonable handle over a shared pool.
//!   Clones observe and mutate the same pool; the pool is released when the
//!   last handle goes away.
//! - [`ElementAllocator`] — the contract containers allocate through,
//!   including the rebind operation node-based containers use to allocate
//!   their internal node type.
//! - [`SystemAllocator`] — the general-purpose end of the same contract.
//! - [`ForwardList`] — an allocator-aware singly-linked list built on the
//!   contract.
//! - [`PoolBox`] — an RAII pointer over a single pool slot.
//!
//! # Threading
//!
//! Pools are strictly single-threaded: handles hold an [`std::rc::Rc`] and
//! are therefore neither `Send` nor `Sync`. There is no internal locking.
//!
//! # Example
//!
//! ```
//! use chunk_pool::{ForwardList, PoolAllocator};
//!
//! // One chunk of 10 slots up front; the list's nodes come out of it.
//! let pool = PoolAllocator::<i32>::with_capacity(10)?;
//! let mut list = ForwardList::with_allocator(pool.clone());
//!
//! for i in 0..10 {
//!     list.push_back(i)?;
//! }
//! assert_eq!(list.iter().copied().sum::<i32>(), 45);
//! # Ok::<(), chunk_pool::AllocError>(())
//! ```

#![warn(missing_docs)]

pub mod allocator;
pub mod error;
pub mod list;
pub mod utils;

pub use allocator::{
    ElementAllocator, MemoryUsage, PoolAllocator, PoolBox, PoolStats, RawAllocator,
    SystemAllocator,
};
pub use error::{AllocError, AllocResult};
pub use list::ForwardList;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

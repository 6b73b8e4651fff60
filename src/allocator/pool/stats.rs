//! Pool statistics

/// Snapshot of a pool's shape and traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Byte size of one slot
    pub element_size: usize,
    /// Chunks allocated so far
    pub chunk_count: usize,
    /// Capacity of the most recently allocated chunk, in slots
    pub chunk_capacity: usize,
    /// Total slots across all chunks
    pub total_slots: usize,
    /// Slots currently available for reuse
    pub free_slots: usize,
    /// Bytes reserved across all chunks
    pub reserved_bytes: usize,
    /// Single-element allocations served from the pool
    pub total_allocs: usize,
    /// Single-element deallocations returned to the pool
    pub total_deallocs: usize,
}

impl PoolStats {
    /// Slots currently handed out
    pub fn allocated_slots(&self) -> usize {
        self.total_slots - self.free_slots
    }
}

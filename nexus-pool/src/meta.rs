//! Per-block bookkeeping.
//!
//! A block hands out its slots strictly by bump allocation and never reuses
//! a slot: once every slot has been handed out and every occupant removed,
//! the whole block is released. This module only tracks the counters; the
//! slot memory is managed in `block.rs`.

/// Sentinel for "no block".
pub(crate) const BLOCK_NONE: u32 = u32::MAX;

/// A slot in a block - either vacant or occupied.
///
/// Slots below the bump cursor are always initialized to one of these;
/// slots at or above it are uninitialized memory.
pub(crate) enum Slot<T> {
    /// Occupant was removed. Never refilled.
    Vacant,
    /// Slot holds a live value.
    Occupied(T),
}

/// Counters for a single block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BlockMeta {
    /// Next slot for bump allocation. Range: 0..=block_len.
    pub bump: u32,

    /// Number of currently occupied slots.
    pub live: u32,
}

impl BlockMeta {
    #[inline]
    pub const fn new() -> Self {
        Self { bump: 0, live: 0 }
    }

    /// Returns true if there are slots left for bump allocation.
    #[inline]
    pub const fn has_bump(&self, block_len: u32) -> bool {
        self.bump < block_len
    }

    /// Returns true once no slot is occupied.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }
}

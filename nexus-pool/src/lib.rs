//! nexus-pool - block-pooled node allocator.
//!
//! Nodes of a linked structure are carved out of fixed-size blocks instead of
//! being allocated one by one. A block holds `block_len` slots (default 64);
//! slots are handed out by bump allocation from the most recently opened
//! block, and a block is released the moment its last occupant is removed.
//!
//! ```text
//! block 0 [■■■■■■■■ ... ■]  full, 64 live
//! block 1 [□□□■■■■■ ... ■]  3 removed, 61 live
//! block 2 [■■■■■■▲        ]  current, bump cursor at ▲
//! ```
//!
//! Every slot is addressed by a [`SlotKey`] that encodes the block id and
//! the slot index within that block, so a node always knows which block it
//! came from.
//!
//! # Block release
//!
//! Each block carries an explicit live-slot counter. Removal order does not
//! matter: a block is released when its counter reaches zero, whether slots
//! were removed front-to-back (the FIFO case) or in any other order.
//!
//! # Memory
//!
//! Blocks smaller than a page are cache-line aligned heap allocations. Blocks
//! of a page or more are mapped straight from the OS and advised for early
//! use and huge-page backing. [`AllocStrategy::Direct`] turns pooling off and
//! gives each slot its own naturally aligned allocation.
//!
//! # Example
//!
//! ```
//! use nexus_pool::{BlockPool, PoolBuilder};
//!
//! let mut pool: BlockPool<u64> = PoolBuilder::default().block_len(4).build().unwrap();
//!
//! let keys: Vec<_> = (0..6).map(|i| pool.try_insert(i).unwrap()).collect();
//! assert_eq!(pool.block_count(), 2);
//! assert_eq!(keys[5].block(), keys[4].block());
//! assert_eq!(keys[5].slot(), 1);
//!
//! for key in keys {
//!     pool.remove(key);
//! }
//! let stats = pool.stats();
//! assert_eq!(stats.blocks_allocated, stats.blocks_released);
//! ```

#![warn(missing_docs)]

mod block;
mod meta;
mod sys;

pub use sys::CACHE_LINE;

use block::Block;
use meta::BLOCK_NONE;

use thiserror::Error;
use tracing::{debug, trace};

/// Default number of slots per block.
pub const DEFAULT_BLOCK_LEN: usize = 64;

// =============================================================================
// Public Types
// =============================================================================

/// How blocks obtain their memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AllocStrategy {
    /// `block_len` slots per aligned block.
    #[default]
    Pooled,
    /// One slot per block, plain global allocation. `block_len` is ignored.
    Direct,
}

/// Error during pool construction or block allocation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// Block length is zero.
    #[error("block length cannot be zero")]
    ZeroBlockLen,
    /// Block length does not fit the slot index encoding.
    #[error("block length {0} exceeds the slot index range")]
    BlockLenTooLarge(usize),
    /// Memory for a block could not be obtained.
    #[error("block allocation of {bytes} bytes failed")]
    AllocationFailed {
        /// Requested size.
        bytes: usize,
    },
    /// No block id is left, or the block table could not grow.
    #[error("block table exhausted")]
    BlockTableExhausted,
}

/// Returned by [`BlockPool::try_insert`] when no slot could be provided.
/// Hands the value back so nothing is lost.
#[derive(Debug)]
pub struct Exhausted<T> {
    /// The value that could not be inserted.
    pub value: T,
    /// Why.
    pub error: PoolError,
}

impl<T> Exhausted<T> {
    /// Returns the value that could not be inserted.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> std::fmt::Display for Exhausted<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pool exhausted: {}", self.error)
    }
}

impl<T: std::fmt::Debug> std::error::Error for Exhausted<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Opaque key identifying a slot. Encodes block id and slot index.
///
/// Keys carry no generation. Once its slot is removed (or the pool
/// cleared) a key dangles: the block id is reused by later blocks, so a
/// stale key can resolve to a different live value instead of `None`.
/// Holders must forget a key when they remove its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotKey(u64);

impl SlotKey {
    /// Sentinel for "no slot", used as the null link in node structures.
    pub const NONE: Self = Self(u64::MAX);

    /// Block this slot was allocated from.
    #[inline]
    pub const fn block(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Slot index within its block.
    #[inline]
    pub const fn slot(self) -> u32 {
        self.0 as u32
    }

    /// Returns `true` if this is the sentinel.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns `true` if this is not the sentinel.
    #[inline]
    pub const fn is_some(self) -> bool {
        !self.is_none()
    }

    #[inline]
    const fn new(block: u32, slot: u32) -> Self {
        Self(((block as u64) << 32) | (slot as u64))
    }
}

/// Allocation and release counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Blocks opened over the pool's lifetime.
    pub blocks_allocated: u64,
    /// Blocks released over the pool's lifetime.
    pub blocks_released: u64,
    /// Blocks currently open.
    pub live_blocks: usize,
    /// Slots currently occupied.
    pub live_slots: usize,
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`BlockPool`].
#[derive(Clone, Copy, Debug)]
pub struct PoolBuilder {
    block_len: usize,
    strategy: AllocStrategy,
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self {
            block_len: DEFAULT_BLOCK_LEN,
            strategy: AllocStrategy::Pooled,
        }
    }
}

impl PoolBuilder {
    /// Slots per block. Default: 64.
    pub fn block_len(mut self, slots: usize) -> Self {
        self.block_len = slots;
        self
    }

    /// Pooled (default) or direct allocation.
    pub fn strategy(mut self, strategy: AllocStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Build an empty pool. No memory is allocated until the first insert.
    pub fn build<T>(self) -> Result<BlockPool<T>, PoolError> {
        if self.block_len == 0 {
            return Err(PoolError::ZeroBlockLen);
        }
        if self.block_len >= u32::MAX as usize {
            return Err(PoolError::BlockLenTooLarge(self.block_len));
        }

        let block_len = match self.strategy {
            AllocStrategy::Pooled => self.block_len as u32,
            AllocStrategy::Direct => 1,
        };

        Ok(BlockPool {
            blocks: Vec::new(),
            free_ids: Vec::new(),
            current: BLOCK_NONE,
            len: 0,
            block_len,
            strategy: self.strategy,
            blocks_allocated: 0,
            blocks_released: 0,
        })
    }
}

// =============================================================================
// BlockPool
// =============================================================================

/// Slot allocator over fixed-size blocks.
///
/// Not thread-safe on its own; callers wrap it in their lock.
pub struct BlockPool<T> {
    // Indexed by block id; `None` marks a released id awaiting reuse
    blocks: Vec<Option<Block<T>>>,
    // Capacity is kept >= blocks.len() so release never allocates
    free_ids: Vec<u32>,

    // Block currently serving bump allocation
    current: u32,

    len: usize,

    block_len: u32,
    strategy: AllocStrategy,

    blocks_allocated: u64,
    blocks_released: u64,
}

impl<T> BlockPool<T> {
    /// Create a pool with default config (64-slot pooled blocks).
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            free_ids: Vec::new(),
            current: BLOCK_NONE,
            len: 0,
            block_len: DEFAULT_BLOCK_LEN as u32,
            strategy: AllocStrategy::Pooled,
            blocks_allocated: 0,
            blocks_released: 0,
        }
    }

    /// Place `value` in a slot, returning its key.
    ///
    /// Uses the next bump slot of the current block if one is left,
    /// otherwise opens a new block and uses its slot 0. On failure the value
    /// comes back in [`Exhausted`] and the pool is unchanged.
    pub fn try_insert(&mut self, value: T) -> Result<SlotKey, Exhausted<T>> {
        if self.current != BLOCK_NONE {
            if let Some(block) = self.blocks[self.current as usize].as_mut() {
                if block.meta.has_bump(self.block_len) {
                    let slot = block.push(value);
                    self.len += 1;
                    return Ok(SlotKey::new(self.current, slot));
                }
            }
        }

        let id = match self.open_block() {
            Ok(id) => id,
            Err(error) => {
                debug!(%error, block_len = self.block_len, "block allocation failed");
                return Err(Exhausted { value, error });
            }
        };

        self.current = id;
        match self.blocks[id as usize].as_mut() {
            Some(block) => {
                let slot = block.push(value);
                self.len += 1;
                Ok(SlotKey::new(id, slot))
            }
            None => Err(Exhausted {
                value,
                error: PoolError::BlockTableExhausted,
            }),
        }
    }

    /// Remove and return the value at `key`.
    ///
    /// Releases the owning block if this was its last occupant. Returns
    /// `None` for the sentinel, an unknown block, or a vacant slot.
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        if key.is_none() {
            return None;
        }

        let id = key.block();
        let block = self.blocks.get_mut(id as usize)?.as_mut()?;
        let value = block.take(key.slot())?;
        let empty = block.meta.is_empty();
        self.len -= 1;

        if empty {
            self.release_block(id);
        }

        Some(value)
    }

    /// Shared reference to the value at `key`.
    #[inline]
    pub fn get(&self, key: SlotKey) -> Option<&T> {
        if key.is_none() {
            return None;
        }
        self.blocks.get(key.block() as usize)?.as_ref()?.get(key.slot())
    }

    /// Mutable reference to the value at `key`.
    #[inline]
    pub fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        if key.is_none() {
            return None;
        }
        self.blocks
            .get_mut(key.block() as usize)?
            .as_mut()?
            .get_mut(key.slot())
    }

    /// Shared reference without validity checks.
    ///
    /// # Safety
    ///
    /// `key` must point to an occupied slot.
    #[inline]
    pub unsafe fn get_unchecked(&self, key: SlotKey) -> &T {
        debug_assert!(self.contains(key), "get_unchecked on vacant slot");
        unsafe {
            self.blocks
                .get_unchecked(key.block() as usize)
                .as_ref()
                .unwrap_unchecked()
                .get_unchecked(key.slot())
        }
    }

    /// Mutable reference without validity checks.
    ///
    /// # Safety
    ///
    /// `key` must point to an occupied slot.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, key: SlotKey) -> &mut T {
        debug_assert!(self.contains(key), "get_unchecked_mut on vacant slot");
        unsafe {
            self.blocks
                .get_unchecked_mut(key.block() as usize)
                .as_mut()
                .unwrap_unchecked()
                .get_unchecked_mut(key.slot())
        }
    }

    /// Returns true if `key` points to an occupied slot.
    #[inline]
    pub fn contains(&self, key: SlotKey) -> bool {
        self.get(key).is_some()
    }

    /// Drop every value and release every block.
    ///
    /// Any key handed out before is dangling afterwards.
    pub fn clear(&mut self) {
        for id in 0..self.blocks.len() {
            if self.blocks[id].is_some() {
                self.blocks[id] = None;
                self.free_ids.push(id as u32);
                self.blocks_released += 1;
            }
        }
        self.current = BLOCK_NONE;
        self.len = 0;
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no slot is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slots per block (1 for [`AllocStrategy::Direct`]).
    #[inline]
    pub fn block_len(&self) -> usize {
        self.block_len as usize
    }

    /// Configured allocation strategy.
    #[inline]
    pub fn strategy(&self) -> AllocStrategy {
        self.strategy
    }

    /// Number of open blocks.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len() - self.free_ids.len()
    }

    /// Allocation and release counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            blocks_allocated: self.blocks_allocated,
            blocks_released: self.blocks_released,
            live_blocks: self.block_count(),
            live_slots: self.len,
        }
    }
}

impl<T> Default for BlockPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for BlockPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockPool")
            .field("block_len", &self.block_len)
            .field("strategy", &self.strategy)
            .field("stats", &self.stats())
            .finish()
    }
}

// =============================================================================
// Internal: Block lifecycle
// =============================================================================

impl<T> BlockPool<T> {
    /// Allocate a block and install it in the table. Returns its id.
    ///
    /// Every fallible step runs before the table is touched.
    fn open_block(&mut self) -> Result<u32, PoolError> {
        let reuse = self.free_ids.last().copied();

        if reuse.is_none() {
            if self.blocks.len() >= BLOCK_NONE as usize {
                return Err(PoolError::BlockTableExhausted);
            }
            self.blocks
                .try_reserve(1)
                .map_err(|_| PoolError::BlockTableExhausted)?;
            let want = self.blocks.len() + 1 - self.free_ids.len();
            self.free_ids
                .try_reserve(want)
                .map_err(|_| PoolError::BlockTableExhausted)?;
        }

        let block = Block::open(self.block_len, self.strategy)?;
        trace!(
            bytes = block.bytes(),
            mapped = block.is_mapped(),
            slots = self.block_len,
            "opened block"
        );

        let id = match reuse {
            Some(id) => {
                self.free_ids.pop();
                self.blocks[id as usize] = Some(block);
                id
            }
            None => {
                self.blocks.push(Some(block));
                (self.blocks.len() - 1) as u32
            }
        };

        self.blocks_allocated += 1;
        Ok(id)
    }

    fn release_block(&mut self, id: u32) {
        if let Some(block) = self.blocks[id as usize].take() {
            debug_assert!(block.meta.is_empty());
            trace!(block = id, bumped = block.meta.bump, "released block");
        }
        if self.current == id {
            self.current = BLOCK_NONE;
        }
        // Capacity reserved in open_block, never reallocates
        self.free_ids.push(id);
        self.blocks_released += 1;
    }
}

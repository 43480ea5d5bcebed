//! A single block: one region carved into `block_len` node slots.

use std::alloc::Layout;
use std::mem;
use std::ptr::NonNull;

use crate::meta::{BlockMeta, Slot};
use crate::sys::Region;
use crate::{AllocStrategy, PoolError};

pub(crate) struct Block<T> {
    region: Region,
    slots: NonNull<Slot<T>>,
    pub(crate) meta: BlockMeta,
}

unsafe impl<T: Send> Send for Block<T> {}

impl<T> Block<T> {
    /// Allocate backing memory for `block_len` slots.
    pub(crate) fn open(block_len: u32, strategy: AllocStrategy) -> Result<Self, PoolError> {
        let region = match strategy {
            AllocStrategy::Pooled => {
                let bytes = mem::size_of::<Slot<T>>()
                    .checked_mul(block_len as usize)
                    .ok_or(PoolError::AllocationFailed { bytes: usize::MAX })?;
                Region::alloc(bytes, mem::align_of::<Slot<T>>())
                    .map_err(|_| PoolError::AllocationFailed { bytes })?
            }
            AllocStrategy::Direct => {
                let layout = Layout::new::<Slot<T>>();
                Region::heap(layout).map_err(|_| PoolError::AllocationFailed {
                    bytes: layout.size(),
                })?
            }
        };

        let slots = NonNull::new(region.as_ptr() as *mut Slot<T>)
            .ok_or(PoolError::AllocationFailed { bytes: region.len() })?;

        Ok(Self {
            region,
            slots,
            meta: BlockMeta::new(),
        })
    }

    #[inline]
    pub(crate) fn is_mapped(&self) -> bool {
        self.region.is_mapped()
    }

    #[inline]
    pub(crate) fn bytes(&self) -> usize {
        self.region.len()
    }

    /// # Safety
    /// `idx` must be below the bump cursor.
    #[inline]
    unsafe fn slot(&self, idx: u32) -> *mut Slot<T> {
        debug_assert!(idx < self.meta.bump);
        unsafe { self.slots.as_ptr().add(idx as usize) }
    }

    /// Bump-allocate the next slot. Caller checks `has_bump` first.
    #[inline]
    pub(crate) fn push(&mut self, value: T) -> u32 {
        let idx = self.meta.bump;
        // Safety: idx < block_len (checked by caller), region sized for block_len slots
        unsafe {
            self.slots
                .as_ptr()
                .add(idx as usize)
                .write(Slot::Occupied(value));
        }
        self.meta.bump += 1;
        self.meta.live += 1;
        idx
    }

    /// Take the value out of slot `idx`, leaving it vacant.
    #[inline]
    pub(crate) fn take(&mut self, idx: u32) -> Option<T> {
        if idx >= self.meta.bump {
            return None;
        }

        // Safety: idx < bump, so the slot is initialized
        let slot = unsafe { &mut *self.slot(idx) };
        match mem::replace(slot, Slot::Vacant) {
            Slot::Occupied(value) => {
                self.meta.live -= 1;
                Some(value)
            }
            Slot::Vacant => None,
        }
    }

    #[inline]
    pub(crate) fn get(&self, idx: u32) -> Option<&T> {
        if idx >= self.meta.bump {
            return None;
        }

        // Safety: idx < bump, so the slot is initialized
        match unsafe { &*self.slot(idx) } {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant => None,
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, idx: u32) -> Option<&mut T> {
        if idx >= self.meta.bump {
            return None;
        }

        // Safety: idx < bump, so the slot is initialized
        match unsafe { &mut *self.slot(idx) } {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant => None,
        }
    }

    /// # Safety
    /// Slot `idx` must be occupied.
    #[inline]
    pub(crate) unsafe fn get_unchecked(&self, idx: u32) -> &T {
        match unsafe { &*self.slot(idx) } {
            Slot::Occupied(value) => value,
            Slot::Vacant => unsafe { std::hint::unreachable_unchecked() },
        }
    }

    /// # Safety
    /// Slot `idx` must be occupied.
    #[inline]
    pub(crate) unsafe fn get_unchecked_mut(&mut self, idx: u32) -> &mut T {
        match unsafe { &mut *self.slot(idx) } {
            Slot::Occupied(value) => value,
            Slot::Vacant => unsafe { std::hint::unreachable_unchecked() },
        }
    }
}

impl<T> Drop for Block<T> {
    fn drop(&mut self) {
        // Only slots below the bump cursor were ever written
        if mem::needs_drop::<T>() {
            for idx in 0..self.meta.bump {
                unsafe { std::ptr::drop_in_place(self.slot(idx)) };
            }
        }
        // Region frees itself
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::CACHE_LINE;
    use std::rc::Rc;

    #[test]
    fn pooled_block_is_cache_line_aligned() {
        let block: Block<u64> = Block::open(4, AllocStrategy::Pooled).unwrap();
        assert_eq!(block.slots.as_ptr() as usize % CACHE_LINE, 0);
        assert!(!block.is_mapped());
    }

    #[test]
    fn large_pooled_block_is_mapped() {
        let block: Block<[u8; 128]> = Block::open(1024, AllocStrategy::Pooled).unwrap();
        assert!(block.is_mapped());
        assert!(block.bytes() >= 1024 * 128);
    }

    #[test]
    fn direct_block_holds_one_slot() {
        let block: Block<u64> = Block::open(1, AllocStrategy::Direct).unwrap();
        assert_eq!(block.bytes(), mem::size_of::<Slot<u64>>());
    }

    #[test]
    fn push_take_get() {
        let mut block: Block<u64> = Block::open(4, AllocStrategy::Pooled).unwrap();
        assert_eq!(block.push(10), 0);
        assert_eq!(block.push(11), 1);
        assert_eq!(block.meta.live, 2);

        assert_eq!(block.get(1), Some(&11));
        *block.get_mut(1).unwrap() = 12;

        assert_eq!(block.take(0), Some(10));
        assert_eq!(block.take(0), None);
        assert_eq!(block.get(0), None);
        assert_eq!(block.take(1), Some(12));
        assert!(block.meta.is_empty());

        // Never bumped
        assert_eq!(block.get(2), None);
        assert_eq!(block.take(3), None);
    }

    #[test]
    fn drop_runs_for_occupied_slots_only() {
        let tracker = Rc::new(());
        {
            let mut block: Block<Rc<()>> = Block::open(8, AllocStrategy::Pooled).unwrap();
            for _ in 0..5 {
                block.push(Rc::clone(&tracker));
            }
            drop(block.take(2));
            assert_eq!(Rc::strong_count(&tracker), 5);
        }
        assert_eq!(Rc::strong_count(&tracker), 1);
    }
}

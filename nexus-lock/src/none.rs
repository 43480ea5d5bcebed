//! No-op lock for single-threaded callers.

use std::cell::Cell;

use crate::Lock;

/// A lock that never waits.
///
/// Opt-in only. `NoLock` is `!Sync` (it holds a [`Cell`]), so anything
/// guarded by it cannot be shared across threads and the missing
/// synchronization is never observable. The held flag still catches
/// re-entrant acquisition, which would otherwise hand out two mutable views
/// of the same data.
#[derive(Debug, Default)]
pub struct NoLock {
    held: Cell<bool>,
}

unsafe impl Lock for NoLock {
    #[inline]
    fn new() -> Self {
        Self {
            held: Cell::new(false),
        }
    }

    #[inline]
    fn acquire(&self) {
        assert!(!self.held.replace(true), "NoLock acquired re-entrantly");
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        !self.held.replace(true)
    }

    #[inline]
    unsafe fn release(&self) {
        debug_assert!(self.held.get(), "release of an unlocked NoLock");
        self.held.set(false);
    }

    #[inline]
    fn is_locked(&self) -> bool {
        self.held.get()
    }
}

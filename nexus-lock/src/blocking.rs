//! Parking mutex backed by `parking_lot`.

use parking_lot::lock_api::RawMutex as _;

use crate::Lock;

/// Blocking lock: a short adaptive spin, then the thread parks until the
/// holder releases.
///
/// Wraps `parking_lot::RawMutex`, which keeps its state in a single byte
/// and parks waiters in a global hash table rather than per-lock queues.
pub struct BlockingLock {
    raw: parking_lot::RawMutex,
}

impl std::fmt::Debug for BlockingLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingLock")
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl Default for BlockingLock {
    fn default() -> Self {
        <Self as Lock>::new()
    }
}

unsafe impl Lock for BlockingLock {
    #[inline]
    fn new() -> Self {
        Self {
            raw: parking_lot::RawMutex::INIT,
        }
    }

    #[inline]
    fn acquire(&self) {
        self.raw.lock();
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        self.raw.try_lock()
    }

    #[inline]
    unsafe fn release(&self) {
        // Safety: caller holds the lock
        unsafe { self.raw.unlock() }
    }

    #[inline]
    fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::hammer;

    #[test]
    fn acquire_release() {
        let lock = BlockingLock::new();
        lock.acquire();
        assert!(lock.is_locked());
        assert!(!lock.try_acquire());
        unsafe { lock.release() };
        assert!(!lock.is_locked());
    }

    #[test]
    fn debug_shows_state() {
        let lock = BlockingLock::new();
        assert_eq!(format!("{lock:?}"), "BlockingLock { locked: false }");
    }

    #[test]
    fn mutual_exclusion() {
        hammer::<BlockingLock>(8, 10_000);
    }
}

//! Busy-wait test-and-test-and-set lock.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_utils::{Backoff, CachePadded};

use crate::Lock;

/// Spin lock over a single cache-padded flag.
///
/// Waiters read the flag until it looks free and only then attempt the
/// compare-exchange, so a contended lock keeps its cache line shared instead
/// of bouncing it between cores on every probe. Between probes the waiter
/// backs off with [`Backoff::snooze`], which escalates from `spin_loop`
/// hints to yielding the thread.
///
/// No fairness: whichever waiter wins the compare-exchange gets the lock.
#[derive(Debug)]
pub struct SpinLock {
    locked: CachePadded<AtomicBool>,
}

impl SpinLock {
    #[cold]
    fn acquire_slow(&self) {
        let backoff = Backoff::new();
        loop {
            while self.locked.load(Ordering::Relaxed) {
                backoff.snooze();
            }

            if self
                .locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }

            backoff.spin();
        }
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        <Self as Lock>::new()
    }
}

unsafe impl Lock for SpinLock {
    #[inline]
    fn new() -> Self {
        Self {
            locked: CachePadded::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    fn acquire(&self) {
        if !self.try_acquire() {
            self.acquire_slow();
        }
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    unsafe fn release(&self) {
        debug_assert!(self.is_locked(), "release of an unlocked SpinLock");
        self.locked.store(false, Ordering::Release);
    }

    #[inline]
    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::hammer;

    #[test]
    fn acquire_release() {
        let lock = SpinLock::new();
        assert!(!lock.is_locked());

        lock.acquire();
        assert!(lock.is_locked());

        unsafe { lock.release() };
        assert!(!lock.is_locked());
    }

    #[test]
    fn try_acquire_fails_while_held() {
        let lock = SpinLock::new();
        assert!(lock.try_acquire());
        assert!(!lock.try_acquire());

        unsafe { lock.release() };
        assert!(lock.try_acquire());
        unsafe { lock.release() };
    }

    #[test]
    fn flag_is_cache_padded() {
        assert!(std::mem::size_of::<SpinLock>() >= 64);
    }

    #[test]
    fn mutual_exclusion() {
        hammer::<SpinLock>(8, 10_000);
    }
}

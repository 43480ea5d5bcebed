//! Kernel-assisted mutex over the Linux `futex(2)` syscall.
//!
//! Three-state protocol:
//!
//! ```text
//! UNLOCKED (0) ── cas ──▶ LOCKED (1)           uncontended, no syscall
//! LOCKED  (1) ── swap ──▶ CONTENDED (2)        a waiter is about to sleep
//! release: swap(UNLOCKED) == CONTENDED ──▶ FUTEX_WAKE one waiter
//! ```
//!
//! The kernel is only entered when a thread actually has to sleep or when
//! there may be a sleeper to wake.

use std::sync::atomic::{AtomicU32, Ordering};

use crossbeam_utils::Backoff;

use crate::Lock;

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;
const CONTENDED: u32 = 2;

/// Futex-based blocking lock (Linux).
#[derive(Debug)]
pub struct FutexLock {
    state: AtomicU32,
}

impl FutexLock {
    #[cold]
    fn acquire_contended(&self) {
        // Short spin before sleeping
        let backoff = Backoff::new();
        while !backoff.is_completed() {
            if self.state.load(Ordering::Relaxed) == UNLOCKED
                && self
                    .state
                    .compare_exchange_weak(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
            {
                return;
            }
            backoff.snooze();
        }

        // From here on we own the lock in CONTENDED state, so our release wakes
        // whoever queued up behind us.
        while self.state.swap(CONTENDED, Ordering::Acquire) != UNLOCKED {
            futex_wait(&self.state, CONTENDED);
        }
    }
}

impl Default for FutexLock {
    fn default() -> Self {
        <Self as Lock>::new()
    }
}

unsafe impl Lock for FutexLock {
    #[inline]
    fn new() -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
        }
    }

    #[inline]
    fn acquire(&self) {
        if !self.try_acquire() {
            self.acquire_contended();
        }
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        self.state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    unsafe fn release(&self) {
        if self.state.swap(UNLOCKED, Ordering::Release) == CONTENDED {
            futex_wake(&self.state);
        }
    }

    #[inline]
    fn is_locked(&self) -> bool {
        self.state.load(Ordering::Relaxed) != UNLOCKED
    }
}

/// Sleeps while `*atomic == expected`. Spurious returns (EINTR, EAGAIN) are
/// fine: the caller re-checks the state in a loop.
fn futex_wait(atomic: &AtomicU32, expected: u32) {
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            atomic.as_ptr(),
            libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
            expected,
            std::ptr::null::<libc::timespec>(),
        );
    }
}

fn futex_wake(atomic: &AtomicU32) {
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            atomic.as_ptr(),
            libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
            1,
        );
    }
}

//! Pluggable mutual exclusion for node-based collections.
//!
//! A collection that mutates several linked structures at once needs exactly
//! one thing from its lock: while it is held, nobody else touches the data.
//! This crate reduces that to the [`Lock`] trait (acquire / release) and
//! ships interchangeable backends, so the choice becomes a type parameter
//! instead of a build-time switch.
//!
//! # Backends
//!
//! | Backend | Waiting strategy | Notes |
//! |---------|------------------|-------|
//! | [`SpinLock`] | busy-wait, `Backoff` between probes | default; best when critical sections are tiny |
//! | [`BlockingLock`] | spin briefly, then park the thread | `parking_lot` raw mutex |
//! | `FutexLock` | spin briefly, then `futex(2)` wait | Linux only, `futex` feature |
//! | [`NoLock`] | none | `!Sync`, single-threaded callers only |
//!
//! Every backend provides mutual exclusion and nothing more. Acquisition
//! order is unspecified: neither FIFO nor priority ordering is promised,
//! because the spin backend cannot offer either.
//!
//! # Example
//!
//! ```
//! use nexus_lock::{LockCell, SpinLock};
//!
//! let cell: LockCell<SpinLock, Vec<u32>> = LockCell::new(Vec::new());
//!
//! cell.lock().push(1);
//! cell.lock().push(2);
//!
//! assert_eq!(*cell.lock(), [1, 2]);
//! ```
//!
//! # Single-threaded use
//!
//! [`NoLock`] skips synchronization entirely. It is `!Sync`, so the compiler
//! rejects any attempt to share a structure guarded by it:
//!
//! ```compile_fail
//! use nexus_lock::{LockCell, NoLock};
//!
//! fn assert_sync<T: Sync>(_: &T) {}
//!
//! let cell: LockCell<NoLock, u64> = LockCell::new(0);
//! assert_sync(&cell);
//! ```

#![warn(missing_docs)]

mod blocking;
mod cell;
#[cfg(all(feature = "futex", target_os = "linux"))]
mod futex;
mod none;
mod spin;

pub use blocking::BlockingLock;
pub use cell::{LockCell, LockGuard};
#[cfg(all(feature = "futex", target_os = "linux"))]
pub use futex::FutexLock;
pub use none::NoLock;
pub use spin::SpinLock;

/// Lock used when a collection does not name one.
pub type DefaultLock = SpinLock;

/// A raw mutual-exclusion primitive.
///
/// Acquire and release are decoupled from any data; pair a lock with the
/// data it protects through [`LockCell`].
///
/// # Safety
///
/// Implementors must guarantee mutual exclusion: between a successful
/// [`acquire`](Lock::acquire) (or a `true` [`try_acquire`](Lock::try_acquire))
/// and the matching [`release`](Lock::release), no other acquisition on the
/// same lock may succeed, and release must synchronize-with the next
/// acquisition (release/acquire ordering).
pub unsafe trait Lock {
    /// Creates an unlocked lock.
    fn new() -> Self;

    /// Blocks (or spins) until the lock is held by the caller.
    fn acquire(&self);

    /// Attempts to take the lock without waiting.
    fn try_acquire(&self) -> bool;

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// The lock must currently be held by this caller.
    unsafe fn release(&self);

    /// Returns `true` if the lock is currently held by anyone.
    ///
    /// Only a snapshot; useful for assertions and diagnostics.
    fn is_locked(&self) -> bool;
}

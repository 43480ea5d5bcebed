//! Lock + data pairing with an RAII guard.

use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use crate::Lock;

/// Data protected by a [`Lock`].
///
/// The only way to reach the data through a shared reference is
/// [`lock`](LockCell::lock) / [`try_lock`](LockCell::try_lock), which return
/// a [`LockGuard`] that releases on drop.
///
/// `LockCell<L, T>` is `Sync` exactly when `L` is `Sync` and `T` is `Send`,
/// so a `!Sync` lock like [`NoLock`](crate::NoLock) keeps the whole cell on
/// one thread.
pub struct LockCell<L: Lock, T> {
    lock: L,
    data: UnsafeCell<T>,
}

unsafe impl<L: Lock + Send, T: Send> Send for LockCell<L, T> {}
unsafe impl<L: Lock + Sync, T: Send> Sync for LockCell<L, T> {}

impl<L: Lock, T> LockCell<L, T> {
    /// Wraps `value` behind a fresh, unlocked `L`.
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            lock: L::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Wraps `value` behind an existing lock.
    ///
    /// The lock must be unlocked.
    #[inline]
    pub fn from_parts(lock: L, value: T) -> Self {
        debug_assert!(!lock.is_locked(), "LockCell built from a held lock");
        Self {
            lock,
            data: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock, waiting as long as the backend waits.
    #[inline]
    pub fn lock(&self) -> LockGuard<'_, L, T> {
        self.lock.acquire();
        LockGuard {
            cell: self,
            _not_send: PhantomData,
        }
    }

    /// Acquires the lock only if it is free right now.
    #[inline]
    pub fn try_lock(&self) -> Option<LockGuard<'_, L, T>> {
        if self.lock.try_acquire() {
            Some(LockGuard {
                cell: self,
                _not_send: PhantomData,
            })
        } else {
            None
        }
    }

    /// Exclusive access without locking; `&mut self` already proves it.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Consumes the cell, returning the data.
    #[inline]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    /// Returns `true` if some guard is alive.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }
}

impl<L: Lock, T: Default> Default for LockCell<L, T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<L: Lock, T: fmt::Debug> fmt::Debug for LockCell<L, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("LockCell");
        match self.try_lock() {
            Some(guard) => d.field("data", &&*guard),
            None => d.field("data", &format_args!("<locked>")),
        };
        d.finish()
    }
}

/// Exclusive access to the data in a [`LockCell`]. Releases on drop.
///
/// Not `Send`: the guard must be dropped on the thread that acquired it.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a, L: Lock, T> {
    cell: &'a LockCell<L, T>,
    _not_send: PhantomData<*const ()>,
}

impl<L: Lock, T> Deref for LockGuard<'_, L, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // Safety: guard existence proves exclusive access
        unsafe { &*self.cell.data.get() }
    }
}

impl<L: Lock, T> DerefMut for LockGuard<'_, L, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // Safety: guard existence proves exclusive access
        unsafe { &mut *self.cell.data.get() }
    }
}

impl<L: Lock, T> Drop for LockGuard<'_, L, T> {
    #[inline]
    fn drop(&mut self) {
        // Safety: this guard was created by a successful acquire
        unsafe { self.cell.lock.release() }
    }
}

//! nexus-keyed - concurrent keyed FIFO queue.
//!
//! A FIFO queue where every item carries a [`Key`]. Keys are unique within a
//! queue: enqueueing a key that is already waiting replaces that item's
//! payload and leaves its position alone. The same nodes are also indexed by
//! key, which makes dedup a tree walk instead of a scan and lets
//! [`range`](KeyedQueue::range) pull out a key interval as a new queue.
//!
//! ```text
//!  FIFO   head ─▶ [7] ─▶ [3] ─▶ [9] ─▶ [5] ◀─ tail
//!
//!  index           7
//!                 / \
//!                3   9
//!                 \
//!                  5
//! ```
//!
//! Nodes come from a block pool (`nexus-pool`): 64 at a time by default,
//! each block released as soon as its last node is dequeued. One lock per
//! queue, chosen by type parameter (`nexus-lock`).
//!
//! # Example
//!
//! ```
//! use nexus_keyed::{Item, KeyedQueue};
//!
//! let queue = KeyedQueue::new();
//! for key in [1, 2, 3, 5, 8] {
//!     queue.enqueue(&Item::new(key, key.to_string())).unwrap();
//! }
//!
//! let mid = queue.range(2, 5).unwrap();
//! assert_eq!(mid.keys(), [2, 3, 5]);
//! assert_eq!(queue.len(), 5);
//!
//! let first = queue.dequeue().unwrap();
//! assert_eq!(&*first.value, b"1");
//! ```
//!
//! # Sharing between threads
//!
//! ```
//! use std::thread;
//! use nexus_keyed::{BlockingLock, Item, KeyedQueue, Lock};
//!
//! let queue = KeyedQueue::with_lock(BlockingLock::new());
//! thread::scope(|s| {
//!     for t in 0..4u32 {
//!         let queue = &queue;
//!         s.spawn(move || {
//!             for i in 0..100 {
//!                 queue.enqueue(&Item::new(t * 100 + i, [t as u8])).unwrap();
//!             }
//!         });
//!     }
//! });
//! assert_eq!(queue.len(), 400);
//! ```
//!
//! # Lock choice
//!
//! The default is [`SpinLock`]. [`BlockingLock`] and, on Linux,
//! `FutexLock` park waiters instead of spinning. [`NoLock`] removes locking
//! and makes the queue `!Sync`.

#![warn(missing_docs)]

mod error;
pub mod handle;
mod item;
mod queue;
mod raw;
mod tree;

pub use error::{Enqueued, QueueError};
pub use item::{Item, Key};
pub use queue::{KeyedQueue, QueueBuilder};

#[cfg(all(feature = "futex", target_os = "linux"))]
pub use nexus_lock::FutexLock;
pub use nexus_lock::{BlockingLock, DefaultLock, Lock, NoLock, SpinLock};
pub use nexus_pool::{AllocStrategy, DEFAULT_BLOCK_LEN, PoolError, PoolStats};

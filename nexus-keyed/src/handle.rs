//! Handle-style surface with defined behavior for missing queues.
//!
//! Mirrors a C-shaped API: every call takes an optional queue and reports
//! through a [`Reply`] instead of a `Result`. Passing `None` is never an
//! error condition beyond `success == false`.
//!
//! ```
//! use nexus_keyed::{Item, handle};
//!
//! let queue = handle::create();
//! assert!(handle::enqueue(queue.as_ref(), Item::new(1, b"one")).success);
//!
//! let reply = handle::dequeue(queue.as_ref());
//! assert!(reply.success);
//! assert_eq!(reply.item.key, 1);
//!
//! assert!(!handle::dequeue(None).success);
//! handle::release(queue);
//! ```

use crate::{Item, Key, KeyedQueue, QueueBuilder};

/// Outcome of a handle call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reply {
    /// Whether the call did what it was asked.
    pub success: bool,
    /// Enqueue: the caller's item, echoed back. Dequeue: the removed item on
    /// success, an empty item otherwise.
    pub item: Item,
}

/// New empty queue with default settings.
pub fn create() -> Option<KeyedQueue> {
    Some(KeyedQueue::new())
}

/// New empty queue from `builder`; `None` when the settings are rejected.
pub fn create_with(builder: QueueBuilder) -> Option<KeyedQueue> {
    builder.build().ok()
}

/// Tears down `queue`, dropping any items still queued. `None` is a no-op.
pub fn release(queue: Option<KeyedQueue>) {
    drop(queue);
}

/// Enqueues a copy of `item`. The item comes back in the reply either way.
pub fn enqueue(queue: Option<&KeyedQueue>, item: Item) -> Reply {
    let success = queue.is_some_and(|queue| queue.enqueue(&item).is_ok());
    Reply { success, item }
}

/// Dequeues the oldest item. Fails on `None` or an empty queue.
pub fn dequeue(queue: Option<&KeyedQueue>) -> Reply {
    match queue.and_then(|queue| queue.dequeue()) {
        Some(item) => Reply {
            success: true,
            item,
        },
        None => Reply::default(),
    }
}

/// Copies the items with `start <= key <= end` into a new queue. `None` on a
/// missing source or an allocation failure.
pub fn range(queue: Option<&KeyedQueue>, start: Key, end: Key) -> Option<KeyedQueue> {
    queue?.range(start, end).ok()
}

//! The locked queue and its builder.

use std::fmt;

use nexus_lock::{DefaultLock, Lock, LockCell};
use nexus_pool::{AllocStrategy, BlockPool, DEFAULT_BLOCK_LEN, PoolBuilder, PoolStats};
use tracing::{debug, trace, warn};

use crate::item::copy_payload;
use crate::raw::RawQueue;
use crate::{Enqueued, Item, Key, QueueError};

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`KeyedQueue`].
///
/// # Example
///
/// ```
/// use nexus_keyed::{AllocStrategy, BlockingLock, KeyedQueue, QueueBuilder};
///
/// let queue: KeyedQueue<BlockingLock> = QueueBuilder::default()
///     .block_len(256)
///     .strategy(AllocStrategy::Pooled)
///     .build()
///     .unwrap();
/// assert!(queue.is_empty());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueBuilder {
    block_len: usize,
    strategy: AllocStrategy,
}

impl Default for QueueBuilder {
    fn default() -> Self {
        Self {
            block_len: DEFAULT_BLOCK_LEN,
            strategy: AllocStrategy::Pooled,
        }
    }
}

impl QueueBuilder {
    /// Nodes per pooled block. Default: 64.
    pub fn block_len(mut self, nodes: usize) -> Self {
        self.block_len = nodes;
        self
    }

    /// Pooled (default) or one allocation per node.
    pub fn strategy(mut self, strategy: AllocStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Builds an empty queue guarded by a fresh `L`.
    pub fn build<L: Lock>(self) -> Result<KeyedQueue<L>, QueueError> {
        let pool = PoolBuilder::default()
            .block_len(self.block_len)
            .strategy(self.strategy)
            .build()?;

        trace!(
            block_len = self.block_len,
            strategy = ?self.strategy,
            lock = std::any::type_name::<L>(),
            "keyed queue created"
        );

        Ok(KeyedQueue {
            inner: LockCell::new(RawQueue::new(pool)),
            config: self,
        })
    }
}

// =============================================================================
// KeyedQueue
// =============================================================================

/// FIFO queue with key deduplication and key-range extraction.
///
/// Items come out in the order their keys first went in. Enqueueing a key
/// that is already queued replaces that item's payload without moving it.
/// Every operation takes the queue's one lock for its whole duration, so a
/// `KeyedQueue<L>` can be shared by reference between threads whenever `L`
/// is `Sync`.
///
/// # Example
///
/// ```
/// use nexus_keyed::{Enqueued, Item, KeyedQueue};
///
/// let queue = KeyedQueue::new();
/// queue.enqueue(&Item::new(7, b"first")).unwrap();
/// queue.enqueue(&Item::new(3, b"second")).unwrap();
/// assert_eq!(queue.enqueue(&Item::new(7, b"again")), Ok(Enqueued::Overwritten));
///
/// let item = queue.dequeue().unwrap();
/// assert_eq!((item.key, &*item.value), (7, &b"again"[..]));
/// assert_eq!(queue.dequeue().unwrap().key, 3);
/// assert!(queue.dequeue().is_none());
/// ```
pub struct KeyedQueue<L: Lock = DefaultLock> {
    inner: LockCell<L, RawQueue>,
    config: QueueBuilder,
}

impl KeyedQueue<DefaultLock> {
    /// Empty queue with the default lock and pool settings. Allocates
    /// nothing until the first enqueue.
    pub fn new() -> Self {
        Self::with_lock(DefaultLock::new())
    }
}

impl Default for KeyedQueue<DefaultLock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Lock> KeyedQueue<L> {
    /// Empty queue with default pool settings behind `lock`, which must be
    /// unlocked.
    pub fn with_lock(lock: L) -> Self {
        Self {
            inner: LockCell::from_parts(lock, RawQueue::new(BlockPool::new())),
            config: QueueBuilder::default(),
        }
    }

    /// Builder for custom pool settings.
    pub fn builder() -> QueueBuilder {
        QueueBuilder::default()
    }

    /// Adds `item`, or replaces the payload of the queued item with the same
    /// key.
    ///
    /// The payload is copied before the lock is taken; the caller keeps
    /// `item`. On error the queue is unchanged.
    pub fn enqueue(&self, item: &Item) -> Result<Enqueued, QueueError> {
        let value = copy_payload(&item.value).inspect_err(|err| {
            warn!(key = item.key, %err, "enqueue payload copy failed");
        })?;
        let owned = Item {
            key: item.key,
            value,
        };

        let result = self.inner.lock().insert(owned);
        if let Err(err) = &result {
            warn!(key = item.key, %err, "enqueue failed");
        }
        result
    }

    /// Removes and returns the oldest item, or `None` when empty.
    pub fn dequeue(&self) -> Option<Item> {
        self.inner.lock().pop_front()
    }

    /// Copies every item with `start <= key <= end` into a new queue, in FIFO
    /// order.
    ///
    /// The new queue uses the same lock type and pool settings. `self` is
    /// left untouched. An empty selection (including `start > end`) yields
    /// an empty queue. On any allocation failure the partial copy is dropped
    /// and the error returned.
    pub fn range(&self, start: Key, end: Key) -> Result<Self, QueueError> {
        let mut out = self.config.build::<L>()?;

        let copied = {
            let src = self.inner.lock();
            copy_range(&src, out.inner.get_mut(), start, end)
        };

        match copied {
            Ok(count) => {
                debug!(start, end, count, "range extracted");
                Ok(out)
            }
            Err(err) => {
                warn!(start, end, %err, "range extraction failed");
                Err(err)
            }
        }
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Returns `true` if an item with `key` is queued.
    pub fn contains_key(&self, key: Key) -> bool {
        self.inner.lock().find(key).is_some()
    }

    /// Copy of the queued item with `key`, found through the index.
    pub fn get(&self, key: Key) -> Result<Option<Item>, QueueError> {
        self.inner
            .lock()
            .find(key)
            .map(Item::try_clone)
            .transpose()
    }

    /// Runs `f` on the payload queued under `key` while holding the lock.
    ///
    /// Saves the copy [`get`](Self::get) makes. `f` must not touch this
    /// queue.
    pub fn with_value<R>(&self, key: Key, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        self.inner.lock().find(key).map(|item| f(&item.value))
    }

    /// Queued keys, head to tail.
    pub fn keys(&self) -> Vec<Key> {
        self.inner.lock().iter().map(|item| item.key).collect()
    }

    /// Drops every queued item and releases every block. Returns how many
    /// items were dropped.
    pub fn clear(&self) -> usize {
        let dropped = self.inner.lock().clear();
        debug!(dropped, "queue cleared");
        dropped
    }

    /// Height of the key index. Equals `len()` when keys arrived sorted.
    pub fn depth(&self) -> usize {
        self.inner.lock().depth()
    }

    /// Block allocation counters of the node pool.
    pub fn stats(&self) -> PoolStats {
        self.inner.lock().stats()
    }

    /// Settings this queue, and every queue `range` makes from it, uses.
    pub fn config(&self) -> QueueBuilder {
        self.config
    }
}

fn copy_range(
    src: &RawQueue,
    dst: &mut RawQueue,
    start: Key,
    end: Key,
) -> Result<usize, QueueError> {
    let mut count = 0;
    for item in src.iter().filter(|item| (start..=end).contains(&item.key)) {
        dst.insert(item.try_clone()?)?;
        count += 1;
    }
    Ok(count)
}

impl<L: Lock> Drop for KeyedQueue<L> {
    fn drop(&mut self) {
        let remaining = self.inner.get_mut().len();
        if remaining > 0 {
            debug!(remaining, "queue released with items still queued");
        }
    }
}

impl<L: Lock> fmt::Debug for KeyedQueue<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("KeyedQueue");
        match self.inner.try_lock() {
            Some(raw) => d.field("len", &raw.len()),
            None => d.field("len", &format_args!("<locked>")),
        };
        d.field("config", &self.config).finish()
    }
}

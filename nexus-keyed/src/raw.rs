//! Unlocked queue state.
//!
//! One arena of [`Node`]s in a [`BlockPool`], with two index relations laid
//! over it:
//!
//! - a singly linked FIFO list (`head` -> ... -> `tail` via `next`)
//! - an unbalanced binary search tree on the item key (`root` via
//!   `left` / `right`), see [`tree`](crate::tree)
//!
//! Every live node is on both. All links are [`SlotKey`]s with
//! [`SlotKey::NONE`] as the null link, so the pool stays the only owner.

use nexus_pool::{BlockPool, PoolStats, SlotKey};

use crate::tree::Search;
use crate::{Enqueued, Item, Key, QueueError};

/// One queued item plus its FIFO and index links.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) item: Item,
    pub(crate) next: SlotKey,
    pub(crate) left: SlotKey,
    pub(crate) right: SlotKey,
}

impl Node {
    #[inline]
    fn new(item: Item) -> Self {
        Self {
            item,
            next: SlotKey::NONE,
            left: SlotKey::NONE,
            right: SlotKey::NONE,
        }
    }
}

pub(crate) struct RawQueue {
    pub(crate) head: SlotKey,
    pub(crate) tail: SlotKey,
    pub(crate) root: SlotKey,
    pool: BlockPool<Node>,
}

impl RawQueue {
    pub(crate) fn new(pool: BlockPool<Node>) -> Self {
        Self {
            head: SlotKey::NONE,
            tail: SlotKey::NONE,
            root: SlotKey::NONE,
            pool,
        }
    }

    /// Live nodes. Each occupies exactly one pool slot.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.pool.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline]
    pub(crate) fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    #[inline]
    pub(crate) fn node(&self, key: SlotKey) -> &Node {
        // Safety: only called with keys reachable from head or root
        unsafe { self.pool.get_unchecked(key) }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, key: SlotKey) -> &mut Node {
        // Safety: only called with keys reachable from head or root
        unsafe { self.pool.get_unchecked_mut(key) }
    }

    // ========================================================================
    // Enqueue / dequeue
    // ========================================================================

    /// Dedup-or-insert. On an existing key the payload is replaced in place
    /// and the node keeps its FIFO position.
    pub(crate) fn insert(&mut self, item: Item) -> Result<Enqueued, QueueError> {
        match self.search(item.key) {
            Search::Occupied { node, .. } => {
                self.node_mut(node).item.value = item.value;
                Ok(Enqueued::Overwritten)
            }
            Search::Vacant { link } => {
                let key = self
                    .pool
                    .try_insert(Node::new(item))
                    .map_err(|exhausted| QueueError::Pool(exhausted.error))?;
                self.set_link(link, key);
                self.link_back(key);
                Ok(Enqueued::Inserted)
            }
        }
    }

    /// Removes the head node from both relations and frees its slot.
    pub(crate) fn pop_front(&mut self) -> Option<Item> {
        if self.head.is_none() {
            return None;
        }

        let key = self.head;
        self.unindex(key);
        self.unlink_front();
        self.pool.remove(key).map(|node| node.item)
    }

    /// Drops every node and releases every block.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.pool.len();
        self.pool.clear();
        self.head = SlotKey::NONE;
        self.tail = SlotKey::NONE;
        self.root = SlotKey::NONE;
        dropped
    }

    /// Looks up a queued item by key through the index.
    pub(crate) fn find(&self, key: Key) -> Option<&Item> {
        match self.search(key) {
            Search::Occupied { node, .. } => Some(&self.node(node).item),
            Search::Vacant { .. } => None,
        }
    }

    /// Items head to tail.
    #[inline]
    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            queue: self,
            cur: self.head,
        }
    }

    // ========================================================================
    // FIFO links
    // ========================================================================

    fn link_back(&mut self, key: SlotKey) {
        self.node_mut(key).next = SlotKey::NONE;

        if self.tail.is_some() {
            let tail = self.tail;
            self.node_mut(tail).next = key;
        } else {
            self.head = key;
        }

        self.tail = key;
    }

    fn unlink_front(&mut self) {
        let head = self.head;
        let next = self.node(head).next;
        self.node_mut(head).next = SlotKey::NONE;

        self.head = next;
        if next.is_none() {
            self.tail = SlotKey::NONE;
        }
    }
}

/// FIFO iterator over queued items.
pub(crate) struct Iter<'a> {
    queue: &'a RawQueue,
    cur: SlotKey,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Item;

    #[inline]
    fn next(&mut self) -> Option<&'a Item> {
        if self.cur.is_none() {
            return None;
        }
        let node = self.queue.node(self.cur);
        self.cur = node.next;
        Some(&node.item)
    }
}

#[cfg(test)]
impl RawQueue {
    /// Panics unless the list and the index cover the same nodes and the
    /// index is a valid search tree.
    pub(crate) fn assert_consistent(&self) {
        use std::collections::HashSet;

        assert_eq!(self.head.is_none(), self.tail.is_none());
        assert_eq!(self.head.is_none(), self.root.is_none());
        assert_eq!(self.head.is_none(), self.pool.is_empty());

        let mut fifo = HashSet::new();
        let mut cur = self.head;
        let mut last = SlotKey::NONE;
        while cur.is_some() {
            assert!(fifo.insert(cur), "cycle in FIFO list");
            last = cur;
            cur = self.node(cur).next;
        }
        assert_eq!(last, self.tail);

        // (node, lower bound exclusive, upper bound exclusive)
        let mut indexed = HashSet::new();
        let mut stack = Vec::new();
        if self.root.is_some() {
            stack.push((self.root, None::<Key>, None::<Key>));
        }
        while let Some((key, lo, hi)) = stack.pop() {
            assert!(indexed.insert(key), "node indexed twice");
            let node = self.node(key);
            let k = node.item.key;
            assert!(lo.is_none_or(|lo| k > lo), "key {k} left of its bound");
            assert!(hi.is_none_or(|hi| k < hi), "key {k} right of its bound");
            if node.left.is_some() {
                stack.push((node.left, lo, Some(k)));
            }
            if node.right.is_some() {
                stack.push((node.right, Some(k), hi));
            }
        }

        assert_eq!(fifo, indexed);
        assert_eq!(fifo.len(), self.pool.len());
    }
}

//! Key index over the queue's nodes.
//!
//! A plain unbalanced binary search tree: smaller keys to the left, larger
//! to the right, no rotations. Keys arriving in sorted order degrade it to a
//! list, which [`depth`](RawQueue::depth) makes observable.
//!
//! The tree shares nodes with the FIFO list, so removal never moves a node;
//! it only rewires the parent link that pointed at it.

use nexus_pool::SlotKey;

use crate::Key;
use crate::raw::RawQueue;

/// A child slot in the tree: the root link or one side of a parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Link {
    Root,
    Left(SlotKey),
    Right(SlotKey),
}

/// Outcome of walking the tree for a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Search {
    /// `node` holds the key; `link` is the slot pointing at it.
    Occupied { link: Link, node: SlotKey },
    /// Key absent; `link` is the empty slot where it belongs.
    Vacant { link: Link },
}

impl RawQueue {
    pub(crate) fn search(&self, key: Key) -> Search {
        let mut link = Link::Root;
        let mut cur = self.root;

        while cur.is_some() {
            let node = self.node(cur);
            if key < node.item.key {
                link = Link::Left(cur);
                cur = node.left;
            } else if key > node.item.key {
                link = Link::Right(cur);
                cur = node.right;
            } else {
                return Search::Occupied { link, node: cur };
            }
        }

        Search::Vacant { link }
    }

    /// Points `link` at `to`.
    pub(crate) fn set_link(&mut self, link: Link, to: SlotKey) {
        match link {
            Link::Root => self.root = to,
            Link::Left(parent) => self.node_mut(parent).left = to,
            Link::Right(parent) => self.node_mut(parent).right = to,
        }
    }

    /// Removes `target` from the index. The node stays in the pool and on the
    /// FIFO list; its child links are cleared.
    pub(crate) fn unindex(&mut self, target: SlotKey) {
        let link = match self.search(self.node(target).item.key) {
            Search::Occupied { link, node } => {
                debug_assert_eq!(node, target);
                link
            }
            Search::Vacant { .. } => {
                debug_assert!(false, "unindex of a node missing from the tree");
                return;
            }
        };

        let node = self.node_mut(target);
        let left = node.left;
        let right = node.right;
        node.left = SlotKey::NONE;
        node.right = SlotKey::NONE;

        let replacement = if left.is_some() {
            // Everything right of target is larger than the whole left subtree
            if right.is_some() {
                let tip = self.rightmost(left);
                self.node_mut(tip).right = right;
            }
            left
        } else {
            right
        };

        self.set_link(link, replacement);
    }

    fn rightmost(&self, mut cur: SlotKey) -> SlotKey {
        loop {
            let right = self.node(cur).right;
            if right.is_none() {
                return cur;
            }
            cur = right;
        }
    }

    /// Height of the tree; 0 when empty.
    pub(crate) fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = Vec::new();
        if self.root.is_some() {
            stack.push((self.root, 1));
        }

        while let Some((key, depth)) = stack.pop() {
            max = max.max(depth);
            let node = self.node(key);
            if node.left.is_some() {
                stack.push((node.left, depth + 1));
            }
            if node.right.is_some() {
                stack.push((node.right, depth + 1));
            }
        }

        max
    }
}

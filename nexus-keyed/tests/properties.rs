//! Property tests against a `VecDeque` + map model.

use std::collections::{BTreeMap, VecDeque};

use nexus_keyed::{Enqueued, Item, Key, KeyedQueue, QueueBuilder, SpinLock};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Enqueue(Key, Vec<u8>),
    Dequeue,
    Range(Key, Key),
}

fn op() -> impl Strategy<Value = Op> {
    // Small key space so duplicates are common
    prop_oneof![
        4 => (0..32u32, prop::collection::vec(any::<u8>(), 0..8))
            .prop_map(|(k, v)| Op::Enqueue(k, v)),
        2 => Just(Op::Dequeue),
        1 => (0..32u32, 0..32u32).prop_map(|(a, b)| Op::Range(a, b)),
    ]
}

#[derive(Default)]
struct Model {
    order: VecDeque<Key>,
    values: BTreeMap<Key, Vec<u8>>,
}

impl Model {
    fn enqueue(&mut self, key: Key, value: Vec<u8>) -> Enqueued {
        if self.values.insert(key, value).is_some() {
            Enqueued::Overwritten
        } else {
            self.order.push_back(key);
            Enqueued::Inserted
        }
    }

    fn dequeue(&mut self) -> Option<Item> {
        let key = self.order.pop_front()?;
        let value = self.values.remove(&key)?;
        Some(Item::new(key, value))
    }

    fn range(&self, start: Key, end: Key) -> Vec<Key> {
        self.order
            .iter()
            .copied()
            .filter(|k| (start..=end).contains(k))
            .collect()
    }
}

proptest! {
    #[test]
    fn matches_model(
        block_len in 1usize..6,
        ops in prop::collection::vec(op(), 0..200),
    ) {
        let queue: KeyedQueue<SpinLock> =
            QueueBuilder::default().block_len(block_len).build().unwrap();
        let mut model = Model::default();

        for op in ops {
            match op {
                Op::Enqueue(key, value) => {
                    let got = queue.enqueue(&Item::new(key, &value)).unwrap();
                    prop_assert_eq!(got, model.enqueue(key, value));
                }
                Op::Dequeue => {
                    prop_assert_eq!(queue.dequeue(), model.dequeue());
                }
                Op::Range(start, end) => {
                    let sub = queue.range(start, end).unwrap();
                    prop_assert_eq!(sub.keys(), model.range(start, end));
                }
            }
            prop_assert_eq!(queue.len(), model.order.len());
        }

        prop_assert_eq!(queue.keys(), Vec::from(model.order.clone()));
        for (&key, value) in &model.values {
            prop_assert_eq!(queue.get(key).unwrap(), Some(Item::new(key, value)));
        }
        prop_assert!(queue.depth() <= queue.len());
    }

    #[test]
    fn drain_releases_every_block(
        block_len in 1usize..10,
        keys in prop::collection::vec(any::<u32>(), 0..300),
    ) {
        let queue: KeyedQueue<SpinLock> =
            QueueBuilder::default().block_len(block_len).build().unwrap();
        for &key in &keys {
            queue.enqueue(&Item::new(key, b"")).unwrap();
        }
        while queue.dequeue().is_some() {}

        let stats = queue.stats();
        prop_assert_eq!(stats.blocks_allocated, stats.blocks_released);
        prop_assert_eq!(stats.live_slots, 0);
    }
}

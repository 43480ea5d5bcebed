//! Queue items: an ordering key plus an opaque byte payload.

use crate::QueueError;

/// Ordering and dedup key. Unsigned; larger is "higher", but the queue only
/// uses it for ordering the index and for deduplication.
pub type Key = u32;

/// A key with its payload.
///
/// The payload is owned: the queue copies it in on enqueue and hands the
/// stored buffer over on dequeue, so caller and queue never share a buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Item {
    /// Ordering / dedup key.
    pub key: Key,
    /// Opaque payload.
    pub value: Box<[u8]>,
}

impl Item {
    /// Builds an item, copying `value`.
    pub fn new(key: Key, value: impl AsRef<[u8]>) -> Self {
        Self {
            key,
            value: value.as_ref().into(),
        }
    }

    /// Payload length in bytes.
    #[inline]
    pub fn value_size(&self) -> usize {
        self.value.len()
    }

    /// Copies the item, reporting allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self, QueueError> {
        Ok(Self {
            key: self.key,
            value: copy_payload(&self.value)?,
        })
    }
}

/// Fallible payload copy. Exact-capacity, so `into_boxed_slice` does not
/// reallocate.
pub(crate) fn copy_payload(src: &[u8]) -> Result<Box<[u8]>, QueueError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(src.len())
        .map_err(|_| QueueError::AllocationFailed { bytes: src.len() })?;
    buf.extend_from_slice(src);
    Ok(buf.into_boxed_slice())
}

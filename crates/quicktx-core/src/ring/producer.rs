use crate::ring::DescRing;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// The single writer of a [`DescRing`].
///
/// A slot belongs to the producer while `consumed == 1` or while it has
/// never been written. Publishing a slot that the consumer still owns is
/// refused.
pub struct DescProducer {
    ring: Arc<DescRing>,
    cursor: u32,
}

impl DescProducer {
    pub(crate) fn new(ring: Arc<DescRing>) -> Self {
        Self { ring, cursor: 0 }
    }

    /// Returns true if the slot under the cursor can be overwritten.
    #[inline]
    pub fn has_room(&self) -> bool {
        self.ring.slot(self.cursor).is_free()
    }

    /// Returns true once the consumer has released slot `idx`.
    #[inline]
    pub fn is_consumed(&self, idx: u32) -> bool {
        self.ring.slot(idx).consumed.load(Ordering::Acquire) != 0
    }

    /// Writes a descriptor into the next slot and publishes it.
    ///
    /// Returns the slot index, or `None` if the consumer has not released
    /// that slot yet.
    pub fn publish(&mut self, dma_block_index: u32, block_offset: u32, length: u32) -> Option<u32> {
        assert!(length > 0, "a zero-length descriptor is never consumed");

        let slot = self.ring.slot(self.cursor);
        if !slot.is_free() {
            return None;
        }

        slot.dma_block_index.store(dma_block_index, Ordering::Relaxed);
        slot.block_offset.store(block_offset, Ordering::Relaxed);
        slot.length.store(length, Ordering::Release);
        // consumed goes last: it is what hands the slot to the consumer
        slot.consumed.store(0, Ordering::Release);

        let published = self.cursor;
        self.cursor = (self.cursor + 1) % self.ring.capacity();
        Some(published)
    }

    #[inline]
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn capacity(&self) -> u32 {
        self.ring.capacity()
    }
}

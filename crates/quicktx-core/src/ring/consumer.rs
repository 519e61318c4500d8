use crate::ring::desc::PacketDesc;
use crate::ring::DescRing;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// The single reader of a [`DescRing`]. Owns the consumer cursor.
pub struct DescConsumer {
    ring: Arc<DescRing>,
    cursor: u32,
}

impl DescConsumer {
    pub(crate) fn new(ring: Arc<DescRing>) -> Self {
        Self { ring, cursor: 0 }
    }

    /// Reads the slot under the cursor without touching it.
    #[inline]
    pub fn peek_current(&self) -> PacketDesc {
        self.ring.slot(self.cursor).snapshot()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.peek_current().is_ready()
    }

    /// Hands the current slot back to the producer and moves to the next one.
    ///
    /// The release store orders every block reference taken for this slot
    /// before the producer can observe `consumed == 1`.
    #[inline]
    pub fn mark_consumed_and_advance(&mut self) {
        let slot = self.ring.slot(self.cursor);
        slot.consumed.store(1, Ordering::Release);
        self.cursor = (self.cursor + 1) % self.ring.capacity();
    }

    #[inline]
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn capacity(&self) -> u32 {
        self.ring.capacity()
    }
}

use std::sync::atomic::{AtomicU32, Ordering};

/// One descriptor slot as laid out in shared memory.
///
/// The producer writes `dma_block_index` and `block_offset`, then `length`,
/// then publishes the slot by storing `consumed = 0`, the last two with
/// release ordering. The consumer hands the slot back by storing
/// `consumed = 1`. An all-zero slot is empty and owned by the producer.
#[repr(C)]
#[derive(Debug, Default)]
pub struct DescSlot {
    pub dma_block_index: AtomicU32,
    pub block_offset: AtomicU32,
    pub length: AtomicU32,
    pub consumed: AtomicU32,
}

impl DescSlot {
    /// Reads the slot. `consumed` and `length` are loaded first with acquire
    /// ordering so that a published slot is never observed with stale fields.
    #[inline]
    pub(crate) fn snapshot(&self) -> PacketDesc {
        let consumed = self.consumed.load(Ordering::Acquire) != 0;
        let length = self.length.load(Ordering::Acquire);
        PacketDesc {
            dma_block_index: self.dma_block_index.load(Ordering::Relaxed),
            block_offset: self.block_offset.load(Ordering::Relaxed),
            length,
            consumed,
        }
    }

    /// True while the producer may overwrite the slot.
    #[inline]
    pub(crate) fn is_free(&self) -> bool {
        self.consumed.load(Ordering::Acquire) != 0 || self.length.load(Ordering::Acquire) == 0
    }
}

/// Consumer-side copy of a [`DescSlot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketDesc {
    pub dma_block_index: u32,
    pub block_offset: u32,
    pub length: u32,
    pub consumed: bool,
}

impl PacketDesc {
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.length > 0 && !self.consumed
    }
}

use crate::system::shared::SharedControl;
use quicktx_core::dma::BlockTable;
use quicktx_core::ring::DescProducer;
use std::sync::Arc;

/// Producer side of a transmit pipeline.
///
/// Fills DMA blocks, publishes descriptors for them and wakes the worker. A
/// block may only be rewritten once the worker has consumed every descriptor
/// pointing at it and the device has let go of every frame in it. To put
/// several packets in one block, write them all before publishing any.
pub struct Producer {
    ring: DescProducer,
    blocks: Arc<BlockTable>,
    control: Arc<SharedControl>,
    /// Ring slot of the most recent descriptor published for each block.
    last_slot: Vec<Option<u32>>,
}

impl Producer {
    pub fn new(ring: DescProducer, blocks: Arc<BlockTable>, control: Arc<SharedControl>) -> Self {
        let last_slot = vec![None; blocks.block_count() as usize];
        Self {
            ring,
            blocks,
            control,
            last_slot,
        }
    }

    /// Whether `block` can be overwritten.
    pub fn block_reusable(&self, block: u32) -> bool {
        // The worker pins the block before it marks the slot consumed, so a
        // consumed slot with no users means nothing references the block.
        let consumed = match self.last_slot.get(block as usize) {
            Some(Some(slot)) => self.ring.is_consumed(*slot),
            Some(None) => true,
            None => return false,
        };
        consumed && self.blocks.is_idle(block)
    }

    /// Copies `payload` into `block` at `offset`. Returns false if the block
    /// is still in use or the payload does not fit.
    pub fn write(&mut self, block: u32, offset: u32, payload: &[u8]) -> bool {
        let Ok(len) = u32::try_from(payload.len()) else {
            return false;
        };
        if !self.block_reusable(block) || !self.blocks.layout().contains(offset, len) {
            return false;
        }
        // Checked above: no descriptor or frame references this block.
        unsafe { self.blocks.write(block, offset, payload) };
        true
    }

    /// Publishes a descriptor for bytes already written. Returns the ring
    /// slot, or `None` if the ring is full.
    pub fn publish(&mut self, block: u32, offset: u32, len: u32) -> Option<u32> {
        if block >= self.blocks.block_count() {
            return None;
        }
        let slot = self.ring.publish(block, offset, len)?;
        self.last_slot[block as usize] = Some(slot);
        Some(slot)
    }

    /// Writes and publishes one packet. Does not wake the worker.
    pub fn send(&mut self, block: u32, offset: u32, payload: &[u8]) -> Option<u32> {
        if payload.is_empty() || !self.ring.has_room() || !self.write(block, offset, payload) {
            return None;
        }
        self.publish(block, offset, payload.len() as u32)
    }

    pub fn notify(&self) {
        self.control.notify_data();
    }

    pub fn has_room(&self) -> bool {
        self.ring.has_room()
    }

    pub fn blocks(&self) -> &Arc<BlockTable> {
        &self.blocks
    }

    pub fn control(&self) -> &Arc<SharedControl> {
        &self.control
    }
}

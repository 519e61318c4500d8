use crate::dma::layout::DmaLayout;
use crate::dma::region::DmaRegion;
use std::ptr::{self, NonNull};
use std::sync::atomic::{fence, AtomicU32, Ordering};

/// Per-block user counts over a [`DmaRegion`].
///
/// Every transmit buffer built over a byte range of a block holds one count
/// on that block. The producer may refill a block only once its count is
/// back to zero.
pub struct BlockTable {
    region: DmaRegion,
    users: Box<[AtomicU32]>,
}

impl BlockTable {
    pub fn new(region: DmaRegion) -> Self {
        let users = (0..region.layout().block_count).map(|_| AtomicU32::new(0)).collect();
        Self { region, users }
    }

    pub fn layout(&self) -> DmaLayout {
        self.region.layout()
    }

    pub fn block_count(&self) -> u32 {
        self.region.layout().block_count
    }

    /// Takes one reference on `idx` and returns the new count.
    ///
    /// The trailing release fence keeps the increment ahead of any later
    /// store that hands the descriptor back or the buffer to the device.
    #[inline]
    pub fn acquire(&self, idx: u32) -> u32 {
        let prev = self.counter(idx).fetch_add(1, Ordering::AcqRel);
        fence(Ordering::Release);
        prev + 1
    }

    /// Drops one reference on `idx` and returns the new count.
    ///
    /// No fence here: the producer's reuse check loads the count with
    /// acquire ordering, and a producer that reads a stale non-zero count
    /// only delays its reuse of the block. This is the one race tolerated by
    /// contract with the producer.
    #[inline]
    pub fn release(&self, idx: u32) -> u32 {
        let prev = self.counter(idx).fetch_sub(1, Ordering::Release);
        if prev == 0 {
            panic!("DMA block {} released more times than it was acquired", idx);
        }
        prev - 1
    }

    #[inline]
    pub fn users(&self, idx: u32) -> u32 {
        self.counter(idx).load(Ordering::Acquire)
    }

    pub fn is_idle(&self, idx: u32) -> bool {
        self.users(idx) == 0
    }

    /// Address of `len` bytes at `offset` inside block `idx`.
    ///
    /// Panics if the range leaves the block: descriptors pointing outside
    /// their block mean the shared state is corrupt.
    pub fn frame_ptr(&self, idx: u32, offset: u32, len: u32) -> NonNull<u8> {
        let base = self.base(idx);
        if !self.layout().contains(offset, len) {
            panic!("frame [{}, +{}) overflows DMA block {} of {} bytes", offset, len, idx, self.layout().block_size);
        }
        unsafe { NonNull::new_unchecked(base.as_ptr().add(offset as usize)) }
    }

    /// Copies `data` into block `idx` at `offset`.
    ///
    /// # Safety
    /// No descriptor or in-flight buffer may reference the written range.
    /// For a whole block this holds once [`BlockTable::is_idle`] is true and
    /// every descriptor published for it has been consumed.
    pub unsafe fn write(&self, idx: u32, offset: u32, data: &[u8]) {
        let len = u32::try_from(data.len()).expect("payload larger than u32::MAX");
        let dst = self.frame_ptr(idx, offset, len);
        ptr::copy_nonoverlapping(data.as_ptr(), dst.as_ptr(), data.len());
    }

    fn base(&self, idx: u32) -> NonNull<u8> {
        match self.region.block_base(idx) {
            Some(base) => base,
            None => panic!("DMA block index {} out of range ({})", idx, self.block_count()),
        }
    }

    fn counter(&self, idx: u32) -> &AtomicU32 {
        match self.users.get(idx as usize) {
            Some(counter) => counter,
            None => panic!("DMA block index {} out of range ({})", idx, self.block_count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::slice;

    fn table(block_size: u32, block_count: u32) -> BlockTable {
        let region = DmaRegion::new(DmaLayout::new(block_size, block_count)).expect("Failed to map region");
        BlockTable::new(region)
    }

    #[test]
    fn test_acquire_release_balance() {
        let blocks = table(2048, 4);

        assert!(blocks.is_idle(2));
        assert_eq!(blocks.acquire(2), 1);
        assert_eq!(blocks.acquire(2), 2);
        assert_eq!(blocks.users(2), 2);
        // Other blocks untouched
        assert_eq!(blocks.users(1), 0);

        assert_eq!(blocks.release(2), 1);
        assert_eq!(blocks.release(2), 0);
        assert!(blocks.is_idle(2));
    }

    #[test]
    #[should_panic(expected = "released more times")]
    fn test_release_below_zero_panics() {
        let blocks = table(2048, 1);
        blocks.release(0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_index_panics() {
        let blocks = table(2048, 2);
        blocks.acquire(2);
    }

    #[test]
    #[should_panic(expected = "overflows DMA block")]
    fn test_frame_overflow_panics() {
        let blocks = table(2048, 2);
        blocks.frame_ptr(1, 2000, 100);
    }

    #[test]
    fn test_write_lands_at_block_offset() {
        let blocks = table(1024, 3);
        let payload = [0xde, 0xad, 0xbe, 0xef];

        unsafe { blocks.write(1, 10, &payload) };

        let ptr = blocks.frame_ptr(1, 10, 4);
        let bytes = unsafe { slice::from_raw_parts(ptr.as_ptr(), 4) };
        assert_eq!(bytes, &payload);

        // Zero-copy: the frame pointer is the block base plus the offset
        let base = blocks.frame_ptr(1, 0, 0).as_ptr() as usize;
        assert_eq!(ptr.as_ptr() as usize, base + 10);
        assert_eq!(base - blocks.frame_ptr(0, 0, 0).as_ptr() as usize, 1024);
    }
}

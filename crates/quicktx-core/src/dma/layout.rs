#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaLayout {
    pub block_size: u32,
    pub block_count: u32,
}

impl DmaLayout {
    pub fn new(block_size: u32, block_count: u32) -> Self {
        assert!(block_size > 0, "Block size must be non-zero");
        assert!(block_count > 0, "Block count must be non-zero");

        Self {
            block_size,
            block_count,
        }
    }

    pub fn size(&self) -> usize {
        (self.block_size as usize) * (self.block_count as usize)
    }

    #[inline]
    pub fn block_start(&self, idx: u32) -> Option<usize> {
        if idx >= self.block_count {
            return None;
        }
        Some((idx as usize) * (self.block_size as usize))
    }

    /// Returns true if `[offset, offset + len)` lies inside one block.
    #[inline]
    pub fn contains(&self, offset: u32, len: u32) -> bool {
        (offset as u64) + (len as u64) <= self.block_size as u64
    }
}

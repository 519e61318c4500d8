use crate::dma::layout::DmaLayout;
use memmap2::{MmapMut, MmapOptions};
use std::io;
use std::ptr::NonNull;

/// Anonymous mapping backing every DMA block.
pub struct DmaRegion {
    ptr: NonNull<u8>,
    layout: DmaLayout,
    _mmap: MmapMut,
}

// Block bytes are only touched through raw pointers whose ownership is
// arbitrated by the block reference counts.
unsafe impl Send for DmaRegion {}
unsafe impl Sync for DmaRegion {}

impl DmaRegion {
    pub fn new(layout: DmaLayout) -> io::Result<Self> {
        let len = layout.size();
        let mut mmap = MmapOptions::new().len(len).map_anon()?;
        let ptr = NonNull::new(mmap.as_mut_ptr()).ok_or_else(|| io::Error::other("mmap returned null"))?;

        Ok(Self {
            ptr,
            layout,
            _mmap: mmap,
        })
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn layout(&self) -> DmaLayout {
        self.layout
    }

    /// Base address of block `idx`.
    pub fn block_base(&self, idx: u32) -> Option<NonNull<u8>> {
        let start = self.layout.block_start(idx)?;
        // start < len, so the pointer stays inside the mapping
        NonNull::new(unsafe { self.ptr.as_ptr().add(start) })
    }
}

use quicktx_core::dma::BlockTable;
use std::fmt;
use std::slice;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// State shared between the pool-owned [`TxFrame`] and any [`InFlight`]
/// tokens the transmit path holds.
struct FrameCell {
    /// External holders, counting the pool's own baseline reference.
    users: AtomicU32,
    block: AtomicU32,
    offset: AtomicU32,
    len: AtomicU32,
    seq: AtomicU64,
    /// Set when the pool gave up on the frame during a forced drain.
    orphaned: AtomicBool,
    block_released: AtomicBool,
    blocks: Arc<BlockTable>,
}

impl FrameCell {
    fn release_block_once(&self) {
        if !self.block_released.swap(true, Ordering::AcqRel) {
            self.blocks.release(self.block.load(Ordering::Relaxed));
        }
    }
}

/// Transmit buffer wrapper as seen by the pool.
///
/// The wrapper never owns payload bytes. It points at a byte range of one
/// DMA block and carries the external reference count used to detect
/// transmit completion.
pub struct TxFrame {
    cell: Arc<FrameCell>,
}

impl TxFrame {
    pub(crate) fn new(blocks: Arc<BlockTable>) -> Self {
        Self {
            cell: Arc::new(FrameCell {
                users: AtomicU32::new(0),
                block: AtomicU32::new(0),
                offset: AtomicU32::new(0),
                len: AtomicU32::new(0),
                seq: AtomicU64::new(0),
                orphaned: AtomicBool::new(false),
                block_released: AtomicBool::new(false),
                blocks,
            }),
        }
    }

    /// Points the wrapper at a new packet. Every packet-specific field is
    /// overwritten, and the count is set to 2: the pool's baseline
    /// reference plus the one reserved for the transmit path.
    pub(crate) fn reset(&self, block: u32, offset: u32, len: u32, seq: u64) {
        let cell = &self.cell;
        cell.block.store(block, Ordering::Relaxed);
        cell.offset.store(offset, Ordering::Relaxed);
        cell.len.store(len, Ordering::Relaxed);
        cell.seq.store(seq, Ordering::Relaxed);
        cell.orphaned.store(false, Ordering::Relaxed);
        cell.block_released.store(false, Ordering::Relaxed);
        cell.users.store(2, Ordering::Release);
    }

    /// Hands the reserved transmit-path reference out as a token.
    ///
    /// A failed attempt drops its token, leaving the count at 1; arming
    /// again restores the reservation.
    pub(crate) fn arm(&self) -> InFlight {
        match self.cell.users.compare_exchange(1, 2, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) | Err(2) => {}
            Err(n) => panic!(
                "frame seq {} re-armed with {} holders: the transmit path kept a buffer it refused",
                self.seq(),
                n
            ),
        }
        InFlight {
            cell: self.cell.clone(),
        }
    }

    /// Drops the frame's reference on its DMA block. Idempotent per packet.
    pub(crate) fn release_block(&self) {
        self.cell.release_block_once();
    }

    /// Abandons the frame while the transmit path may still hold it. Its
    /// block reference is released by whichever side sees the last external
    /// holder go.
    pub(crate) fn orphan(&self) {
        self.cell.orphaned.store(true, Ordering::SeqCst);
        if self.cell.users.load(Ordering::SeqCst) <= 1 {
            self.cell.release_block_once();
        }
    }

    /// Current external reference count; 1 means only the pool holds it.
    #[inline]
    pub fn users(&self) -> u32 {
        self.cell.users.load(Ordering::Acquire)
    }

    #[inline]
    pub fn block_index(&self) -> u32 {
        self.cell.block.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.cell.offset.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cell.len.load(Ordering::Relaxed) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn seq(&self) -> u64 {
        self.cell.seq.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for TxFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxFrame")
            .field("seq", &self.seq())
            .field("block", &self.block_index())
            .field("offset", &self.offset())
            .field("len", &self.len())
            .field("users", &self.users())
            .finish()
    }
}

/// One external hold on a frame.
///
/// The transmit primitive receives one of these per attempt. Returning a
/// transient failure means the token was dropped; returning `Ok` means the
/// primitive keeps it until the device is done with the bytes. Lower layers
/// that need their own hold clone it.
pub struct InFlight {
    cell: Arc<FrameCell>,
}

impl InFlight {
    /// The packet bytes, read in place from the DMA block.
    pub fn data(&self) -> &[u8] {
        let cell = &self.cell;
        let len = cell.len.load(Ordering::Relaxed);
        let ptr = cell
            .blocks
            .frame_ptr(cell.block.load(Ordering::Relaxed), cell.offset.load(Ordering::Relaxed), len);
        // The frame cannot be recycled and its block cannot be refilled while
        // this token keeps the count above 1.
        unsafe { slice::from_raw_parts(ptr.as_ptr(), len as usize) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cell.len.load(Ordering::Relaxed) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn seq(&self) -> u64 {
        self.cell.seq.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_index(&self) -> u32 {
        self.cell.block.load(Ordering::Relaxed)
    }
}

impl Clone for InFlight {
    fn clone(&self) -> Self {
        self.cell.users.fetch_add(1, Ordering::Relaxed);
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let prev = self.cell.users.fetch_sub(1, Ordering::SeqCst);
        if prev == 2 && self.cell.orphaned.load(Ordering::SeqCst) {
            self.cell.release_block_once();
        }
    }
}

impl fmt::Debug for InFlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlight")
            .field("seq", &self.seq())
            .field("block", &self.block_index())
            .field("len", &self.len())
            .finish()
    }
}

use crate::buffer::TxFrame;
use crate::engine::list::{Link, List, Membership};
use crate::error::{QuickTxError, Result};
use quicktx_core::dma::BlockTable;
use std::sync::Arc;

/// Handle to a wrapper slot in a [`BufferPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u32);

impl BufferId {
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Arena of transmit wrappers.
///
/// Every live wrapper is on exactly one of three lists:
/// - queued: waiting for the device to accept it
/// - wait: accepted, waiting for the device to let go
/// - freed: done, kept for reuse
///
/// A wrapper returned by [`BufferPool::acquire_wrapper`] is detached until
/// the caller queues it.
pub struct BufferPool {
    blocks: Arc<BlockTable>,
    frames: Vec<Option<TxFrame>>,
    links: Vec<Link>,
    vacant: Vec<u32>,
    queued: List,
    wait: List,
    freed: List,
    capacity: Option<usize>,
    live: usize,
    alloc_count: u64,
    freed_count: u64,
}

impl BufferPool {
    pub fn new(blocks: Arc<BlockTable>, capacity: Option<usize>) -> Self {
        Self {
            blocks,
            frames: Vec::new(),
            links: Vec::new(),
            vacant: Vec::new(),
            queued: List::new(Membership::Queued),
            wait: List::new(Membership::Wait),
            freed: List::new(Membership::Freed),
            capacity,
            live: 0,
            alloc_count: 0,
            freed_count: 0,
        }
    }

    /// Gets a wrapper for `len` bytes at `offset` of `block`, reusing one from
    /// the freed list when possible.
    ///
    /// The caller must already hold a reference on `block`; the wrapper takes
    /// it over and drops it when reclaimed.
    pub fn acquire_wrapper(&mut self, block: u32, offset: u32, len: u32, seq: u64) -> Result<BufferId> {
        let idx = match self.freed.pop_front(&mut self.links) {
            Some(idx) => idx,
            None => self.allocate()?,
        };
        self.frame_at(idx).reset(block, offset, len, seq);
        Ok(BufferId(idx))
    }

    fn allocate(&mut self) -> Result<u32> {
        if let Some(capacity) = self.capacity {
            if self.live >= capacity {
                return Err(QuickTxError::PoolExhausted { capacity });
            }
        }

        let frame = TxFrame::new(self.blocks.clone());
        let idx = match self.vacant.pop() {
            Some(idx) => {
                self.frames[idx as usize] = Some(frame);
                idx
            }
            None => {
                let idx = u32::try_from(self.frames.len())
                    .map_err(|_| QuickTxError::PoolExhausted { capacity: self.live })?;
                self.frames.push(Some(frame));
                self.links.push(Link::DETACHED);
                idx
            }
        };

        self.live += 1;
        self.alloc_count += 1;
        Ok(idx)
    }

    fn destroy(&mut self, idx: u32) {
        debug_assert_eq!(self.links[idx as usize].membership(), Membership::Detached);
        self.frames[idx as usize] = None;
        self.vacant.push(idx);
        self.live -= 1;
        self.freed_count += 1;
    }

    fn frame_at(&self, idx: u32) -> &TxFrame {
        match self.frames.get(idx as usize) {
            Some(Some(frame)) => frame,
            _ => panic!("buffer slot {} is not live", idx),
        }
    }

    pub fn frame(&self, id: BufferId) -> &TxFrame {
        self.frame_at(id.0)
    }

    pub fn membership(&self, id: BufferId) -> Membership {
        self.links[id.0 as usize].membership()
    }

    pub fn push_queued(&mut self, id: BufferId) {
        self.queued.push_back(&mut self.links, id.0);
    }

    pub fn queued_front(&self) -> Option<BufferId> {
        self.queued.front().map(BufferId)
    }

    /// The device accepted the frame; completion is now watched on the wait
    /// list.
    pub fn move_to_wait(&mut self, id: BufferId) {
        self.queued.unlink(&mut self.links, id.0);
        self.wait.push_back(&mut self.links, id.0);
    }

    /// Releases every completed wrapper at the front of the wait list.
    ///
    /// Stops at the first wrapper still held by the device. Completed
    /// wrappers are destroyed when `destructive`, otherwise parked on the
    /// freed list.
    pub fn reclaim_wait_list(&mut self, destructive: bool) -> usize {
        let mut count = 0;
        while let Some(idx) = self.wait.front() {
            let frame = self.frame_at(idx);
            if frame.users() != 1 {
                break;
            }
            frame.release_block();
            self.wait.unlink(&mut self.links, idx);
            if destructive {
                self.destroy(idx);
            } else {
                self.freed.push_front(&mut self.links, idx);
            }
            count += 1;
        }
        if count > 0 {
            log::trace!("reclaimed {} wrappers (destructive: {})", count, destructive);
        }
        count
    }

    /// Destroys every parked wrapper.
    pub fn clear_freed_list(&mut self) -> usize {
        let mut count = 0;
        while let Some(idx) = self.freed.pop_front(&mut self.links) {
            self.destroy(idx);
            count += 1;
        }
        count
    }

    /// Gives up on wrappers the device never released. Their block
    /// references are dropped whenever the device lets go.
    pub fn force_clear_wait_list(&mut self) -> usize {
        let mut count = 0;
        while let Some(idx) = self.wait.pop_front(&mut self.links) {
            self.frame_at(idx).orphan();
            self.destroy(idx);
            count += 1;
        }
        count
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn wait_len(&self) -> usize {
        self.wait.len()
    }

    pub fn freed_len(&self) -> usize {
        self.freed.len()
    }

    /// Wrappers currently allocated, on any list or detached.
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn alloc_count(&self) -> u64 {
        self.alloc_count
    }

    pub fn freed_count(&self) -> u64 {
        self.freed_count
    }

    pub fn blocks(&self) -> &Arc<BlockTable> {
        &self.blocks
    }

    pub fn queued(&self) -> impl Iterator<Item = &TxFrame> + '_ {
        self.queued.iter(&self.links).map(move |idx| self.frame_at(idx))
    }

    pub fn waiting(&self) -> impl Iterator<Item = &TxFrame> + '_ {
        self.wait.iter(&self.links).map(move |idx| self.frame_at(idx))
    }
}

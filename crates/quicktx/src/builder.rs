use crate::config::TxConfig;
use crate::engine::TxWorker;
use crate::error::{QuickTxError, Result};
use crate::system::{Producer, SharedControl};
use crate::xmit::Transmit;
use quicktx_core::dma::{BlockTable, DmaLayout, DmaRegion};
use quicktx_core::ring::DescRing;
use std::sync::Arc;

/// Maps the DMA region and descriptor ring and wires a [`Producer`] to a
/// [`TxWorker`].
pub struct QuickTxBuilder {
    ring_capacity: u32,
    block_size: u32,
    block_count: u32,
    config: TxConfig,
}

impl Default for QuickTxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuickTxBuilder {
    pub fn new() -> Self {
        Self {
            ring_capacity: 4096,
            block_size: 64 * 1024,
            block_count: 64,
            config: TxConfig::default(),
        }
    }

    pub fn ring_capacity(mut self, capacity: u32) -> Self {
        self.ring_capacity = capacity;
        self
    }

    pub fn dma_blocks(mut self, block_size: u32, block_count: u32) -> Self {
        self.block_size = block_size;
        self.block_count = block_count;
        self
    }

    pub fn config(mut self, config: TxConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build<T: Transmit>(self, xmit: T) -> Result<(Producer, TxWorker<T>)> {
        self.config.validate()?;
        if self.ring_capacity == 0 {
            return Err(QuickTxError::InvalidConfiguration("ring capacity must be non-zero".into()));
        }
        if self.block_size == 0 || self.block_count == 0 {
            return Err(QuickTxError::InvalidConfiguration("DMA blocks must be non-empty".into()));
        }

        // 1. DMA region
        let region = DmaRegion::new(DmaLayout::new(self.block_size, self.block_count))?;
        let blocks = Arc::new(BlockTable::new(region));

        // 2. Descriptor ring
        let (prod, cons) = DescRing::new(self.ring_capacity)?.split();

        // 3. Wire both ends
        let control = Arc::new(SharedControl::new());
        let producer = Producer::new(prod, blocks.clone(), control.clone());
        let worker = TxWorker::new(cons, blocks, xmit, control, self.config)?;

        log::debug!(
            "built pipeline: {} slots, {} x {} byte blocks",
            self.ring_capacity,
            self.block_count,
            self.block_size
        );
        Ok((producer, worker))
    }

    /// Builds a pipeline transmitting through an `AF_PACKET` socket on
    /// `interface`.
    #[cfg(target_os = "linux")]
    pub fn build_socket(self, interface: &str) -> Result<(Producer, TxWorker<quicktx_core::sys::PacketSocket>)> {
        let socket = quicktx_core::sys::PacketSocket::open(interface)?;
        self.build(socket)
    }
}

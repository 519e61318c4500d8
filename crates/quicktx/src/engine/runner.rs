use crate::config::TxConfig;
use crate::engine::pool::BufferPool;
use crate::engine::queue::{Budget, SubmitResult, TxQueue};
use crate::error::{QuickTxError, Result};
use crate::stats::{StatsSnapshot, TxStats};
use crate::system::shared::{SharedControl, ERR_NOT_RUNNING};
use crate::xmit::Transmit;
use quicktx_core::dma::BlockTable;
use quicktx_core::ring::DescConsumer;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting,
    Running,
    Sleeping,
    Draining,
    Stopped,
}

/// Result of one pass over the descriptor under the ring cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The descriptor was wrapped, submitted and handed back.
    Consumed,
    /// No wrapper was available; the descriptor stays put.
    Deferred,
    /// Nothing ready under the cursor.
    Empty,
}

/// The consumer side of the pipeline: pulls descriptors off the ring and
/// feeds them to the device.
pub struct TxWorker<T: Transmit> {
    ring: DescConsumer,
    blocks: Arc<BlockTable>,
    pool: BufferPool,
    queue: TxQueue,
    xmit: T,
    stats: TxStats,
    control: Arc<SharedControl>,
    config: TxConfig,
    state: WorkerState,
    next_seq: u64,
    /// The descriptor under the cursor is waiting for a free wrapper.
    stalled: bool,
}

impl<T: Transmit> TxWorker<T> {
    pub fn new(
        ring: DescConsumer,
        blocks: Arc<BlockTable>,
        xmit: T,
        control: Arc<SharedControl>,
        config: TxConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ring,
            pool: BufferPool::new(blocks.clone(), config.pool_capacity),
            blocks,
            queue: TxQueue::new(config.reclaim_interval),
            xmit,
            stats: TxStats::default(),
            control,
            config,
            state: WorkerState::Starting,
            next_seq: 0,
            stalled: false,
        })
    }

    /// Runs the worker to completion on the calling thread.
    ///
    /// Returns once shutdown has been requested and every outstanding frame
    /// has been drained.
    pub fn run(&mut self) -> Result<StatsSnapshot> {
        self.start()?;

        self.wait_for_data();
        self.stats.mark_start();

        loop {
            match self.poll_once() {
                PollOutcome::Consumed => {}
                PollOutcome::Deferred => thread::yield_now(),
                PollOutcome::Empty => {
                    if self.control.quit_requested() {
                        break;
                    }
                    self.sleep();
                }
            }
        }

        Ok(self.drain())
    }

    /// Checks the device. On failure the worker stops without touching the
    /// ring and the producer sees [`ERR_NOT_RUNNING`].
    pub fn start(&mut self) -> Result<()> {
        if self.state != WorkerState::Starting {
            return Ok(());
        }
        if !self.xmit.is_usable() {
            log::error!("transmit device is not usable, worker stopping");
            self.control.set_error(ERR_NOT_RUNNING);
            self.state = WorkerState::Stopped;
            return Err(QuickTxError::DeviceUnusable("device is down or not running".into()));
        }

        log::info!(
            "quicktx worker started: ring of {} descriptors, {} DMA blocks",
            self.ring.capacity(),
            self.blocks.block_count()
        );
        self.state = WorkerState::Running;
        Ok(())
    }

    fn wait_for_data(&self) {
        let ring = &self.ring;
        let control = &self.control;
        control
            .doorbell()
            .wait_until(|| control.quit_requested() || ring.is_ready());
    }

    /// Takes the descriptor under the cursor, if it is ready.
    pub fn poll_once(&mut self) -> PollOutcome {
        let desc = self.ring.peek_current();
        if !desc.is_ready() {
            return PollOutcome::Empty;
        }

        // 1. Pin the block
        self.blocks.acquire(desc.dma_block_index);

        // 2. Wrap it
        let id = match self
            .pool
            .acquire_wrapper(desc.dma_block_index, desc.block_offset, desc.length, self.next_seq)
        {
            Ok(id) => id,
            Err(e) => {
                self.blocks.release(desc.dma_block_index);
                if !self.stalled {
                    log::warn!("descriptor {} deferred: {}", self.ring.cursor(), e);
                    self.stalled = true;
                }
                // Push what is queued so something can complete
                self.flush(Budget::Limited(self.config.sleep_budget));
                self.pool.reclaim_wait_list(false);
                return PollOutcome::Deferred;
            }
        };
        log::trace!(
            "desc {}: block {} offset {} len {} -> seq {}",
            self.ring.cursor(),
            desc.dma_block_index,
            desc.block_offset,
            desc.length,
            self.next_seq
        );
        self.next_seq += 1;
        self.stalled = false;

        // 3. Submit
        let budget = Budget::Limited(self.config.submit_budget);
        self.queue
            .submit(&mut self.pool, &mut self.xmit, &mut self.stats, Some(id), budget);

        // 4. Hand the slot back
        self.ring.mark_consumed_and_advance();
        self.stats.consumed += 1;
        PollOutcome::Consumed
    }

    /// Sends queued frames without adding one.
    pub fn flush(&mut self, budget: Budget) -> SubmitResult {
        self.queue
            .flush(&mut self.pool, &mut self.xmit, &mut self.stats, budget)
    }

    fn sleep(&mut self) {
        self.state = WorkerState::Sleeping;
        self.stats.sleeps += 1;

        // Cleared before the last look at the ring; a ring after this point
        // wakes the wait below.
        self.control.doorbell().clear();
        self.flush(Budget::Limited(self.config.sleep_budget));
        self.pool.reclaim_wait_list(false);

        let pending = self.pool.queued_len() > 0 || self.pool.wait_len() > 0;
        let ring = &self.ring;
        let control = &self.control;
        let ready = || control.quit_requested() || ring.is_ready();
        if pending {
            control.doorbell().wait_until_timeout(self.config.idle_backoff, ready);
        } else {
            control.doorbell().wait_until(ready);
        }

        self.state = WorkerState::Running;
    }

    fn drain(&mut self) -> StatsSnapshot {
        self.state = WorkerState::Draining;
        log::info!(
            "draining: {} queued, {} awaiting completion",
            self.pool.queued_len(),
            self.pool.wait_len()
        );

        self.flush(Budget::Unlimited);
        self.stats.mark_end();

        let mut attempts = 0;
        loop {
            self.pool.reclaim_wait_list(true);
            if self.pool.wait_len() == 0 {
                break;
            }
            attempts += 1;
            if attempts >= self.config.drain_max_attempts {
                log::warn!(
                    "drain timed out after {} attempts, {} frames still held by the device",
                    attempts,
                    self.pool.wait_len()
                );
                self.pool.force_clear_wait_list();
                break;
            }
            log::debug!("waiting on {} frames to complete", self.pool.wait_len());
            thread::sleep(self.config.drain_backoff);
        }
        self.pool.clear_freed_list();

        self.state = WorkerState::Stopped;
        let snapshot = self.snapshot();
        log::info!("quicktx worker stopped\n{}", snapshot);
        snapshot
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats
            .snapshot(self.pool.alloc_count(), self.pool.freed_count())
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn stats(&self) -> &TxStats {
        &self.stats
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn ring_cursor(&self) -> u32 {
        self.ring.cursor()
    }

    pub fn control(&self) -> &Arc<SharedControl> {
        &self.control
    }

    pub fn transmitter(&self) -> &T {
        &self.xmit
    }

    pub fn config(&self) -> &TxConfig {
        &self.config
    }
}

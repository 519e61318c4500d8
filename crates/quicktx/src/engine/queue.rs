use crate::engine::pool::{BufferId, BufferPool};
use crate::stats::TxStats;
use crate::xmit::{Transmit, XmitStatus};
use std::hint;

/// Attempt allowance for one [`TxQueue::submit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Limited(u32),
    /// Retry until the queue is empty. Only the shutdown drain uses this.
    Unlimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitResult {
    /// Status of the last attempt, `Ok` if nothing had to be attempted.
    pub status: XmitStatus,
    pub attempts: u32,
}

/// Ordered hand-off of queued wrappers to the transmit primitive.
#[derive(Debug)]
pub struct TxQueue {
    calls: u64,
    reclaim_interval: u32,
}

impl TxQueue {
    pub fn new(reclaim_interval: u32) -> Self {
        assert!(reclaim_interval > 0, "reclaim interval must be non-zero");
        Self {
            calls: 0,
            reclaim_interval,
        }
    }

    /// Queues `frame` (if any) behind everything already waiting, then feeds
    /// the device from the head of the queue.
    ///
    /// A refused frame is retried in place, so nothing behind it can
    /// overtake it. When the budget runs out the frame stays at the head for
    /// the next call.
    pub fn submit<T>(
        &mut self,
        pool: &mut BufferPool,
        xmit: &mut T,
        stats: &mut TxStats,
        frame: Option<BufferId>,
        budget: Budget,
    ) -> SubmitResult
    where
        T: Transmit + ?Sized,
    {
        if let Some(id) = frame {
            pool.push_queued(id);
        }

        let mut result = SubmitResult {
            status: XmitStatus::Ok,
            attempts: 0,
        };

        while let Some(id) = pool.queued_front() {
            if let Budget::Limited(max) = budget {
                if result.attempts >= max {
                    break;
                }
            }

            let len = pool.frame(id).len();
            let token = pool.frame(id).arm();
            result.attempts += 1;
            result.status = xmit.xmit(token);
            stats.record(result.status, len);

            if result.status.is_ok() {
                pool.move_to_wait(id);
            } else {
                hint::spin_loop();
            }
        }

        self.calls += 1;
        if self.calls % self.reclaim_interval as u64 == 0 {
            pool.reclaim_wait_list(false);
        }

        result
    }

    /// Pushes already queued frames without adding a new one.
    pub fn flush<T>(&mut self, pool: &mut BufferPool, xmit: &mut T, stats: &mut TxStats, budget: Budget) -> SubmitResult
    where
        T: Transmit + ?Sized,
    {
        self.submit(pool, xmit, stats, None, budget)
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SimulatedNic;
    use quicktx_core::dma::{BlockTable, DmaLayout, DmaRegion};
    use std::sync::Arc;

    fn pool() -> BufferPool {
        let region = DmaRegion::new(DmaLayout::new(2048, 8)).expect("Failed to map region");
        BufferPool::new(Arc::new(BlockTable::new(region)), None)
    }

    fn wrap(pool: &mut BufferPool, block: u32, seq: u64) -> BufferId {
        pool.blocks().acquire(block);
        pool.acquire_wrapper(block, 0, 64, seq).unwrap()
    }

    #[test]
    fn test_busy_twice_then_ok() {
        let mut pool = pool();
        let mut nic = SimulatedNic::new();
        let ctl = nic.control();
        ctl.script([XmitStatus::Busy, XmitStatus::Busy, XmitStatus::Ok]);
        let mut stats = TxStats::default();
        let mut queue = TxQueue::new(100);

        let id = wrap(&mut pool, 0, 0);
        let res = queue.submit(&mut pool, &mut nic, &mut stats, Some(id), Budget::Limited(5));

        assert_eq!(res, SubmitResult { status: XmitStatus::Ok, attempts: 3 });
        assert_eq!(stats.ok_packets, 1);
        assert_eq!(stats.busy, 2);
        assert_eq!(pool.queued_len(), 0);
        assert_eq!(pool.wait_len(), 1);
        assert_eq!(ctl.sent().len(), 1);
    }

    #[test]
    fn test_budget_exhausted_keeps_head_queued() {
        let mut pool = pool();
        let mut nic = SimulatedNic::new();
        let ctl = nic.control();
        ctl.script([XmitStatus::Busy; 4]);
        let mut stats = TxStats::default();
        let mut queue = TxQueue::new(100);

        let first = wrap(&mut pool, 0, 0);
        let second = wrap(&mut pool, 1, 1);
        queue.submit(&mut pool, &mut nic, &mut stats, Some(first), Budget::Limited(2));
        let res = queue.submit(&mut pool, &mut nic, &mut stats, Some(second), Budget::Limited(2));

        assert_eq!(res, SubmitResult { status: XmitStatus::Busy, attempts: 2 });
        assert_eq!(pool.queued_len(), 2);
        assert_eq!(pool.queued_front(), Some(first));
        assert_eq!(pool.frame(first).users(), 1);
        assert_eq!(stats.busy, 4);

        // Device recovers: the same head goes first
        let res = queue.flush(&mut pool, &mut nic, &mut stats, Budget::Limited(2));
        assert_eq!(res, SubmitResult { status: XmitStatus::Ok, attempts: 2 });
        let seqs: Vec<u64> = ctl.sent().iter().map(|f| f.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
    }

    #[test]
    fn test_single_packet_never_sent_is_queued_once() {
        let mut pool = pool();
        let mut nic = SimulatedNic::new();
        let ctl = nic.control();
        ctl.set_default(XmitStatus::Busy);
        let mut stats = TxStats::default();
        let mut queue = TxQueue::new(100);

        let id = wrap(&mut pool, 0, 0);
        let res = queue.submit(&mut pool, &mut nic, &mut stats, Some(id), Budget::Limited(3));

        assert_eq!(res, SubmitResult { status: XmitStatus::Busy, attempts: 3 });
        assert_eq!(pool.queued_len(), 1);
        assert_eq!(pool.queued_front(), Some(id));
        assert_eq!(pool.wait_len(), 0);
        assert_eq!(pool.live(), 1);

        // Flushing again retries the same wrapper without enqueueing a copy
        let res = queue.flush(&mut pool, &mut nic, &mut stats, Budget::Limited(3));
        assert_eq!(res.attempts, 3);
        assert_eq!(pool.queued_len(), 1);
        assert_eq!(ctl.attempts(), 6);
        assert!(ctl.sent().is_empty());
    }

    #[test]
    fn test_every_status_counts_against_budget() {
        let mut pool = pool();
        let mut nic = SimulatedNic::new();
        let ctl = nic.control();
        ctl.script([XmitStatus::Locked, XmitStatus::Other, XmitStatus::Busy]);
        let mut stats = TxStats::default();
        let mut queue = TxQueue::new(100);

        let id = wrap(&mut pool, 0, 0);
        let res = queue.submit(&mut pool, &mut nic, &mut stats, Some(id), Budget::Limited(3));

        assert_eq!(res.status, XmitStatus::Busy);
        assert_eq!((stats.locked, stats.other, stats.busy), (1, 1, 1));
        assert_eq!(pool.queued_len(), 1);
    }

    #[test]
    fn test_fifo_across_calls() {
        let mut pool = pool();
        let mut nic = SimulatedNic::new();
        let ctl = nic.control();
        let mut stats = TxStats::default();
        let mut queue = TxQueue::new(100);

        ctl.script([XmitStatus::Busy, XmitStatus::Busy]);
        for seq in 0..5 {
            let id = wrap(&mut pool, seq as u32, seq);
            queue.submit(&mut pool, &mut nic, &mut stats, Some(id), Budget::Limited(1));
        }
        queue.flush(&mut pool, &mut nic, &mut stats, Budget::Unlimited);

        let seqs: Vec<u64> = ctl.sent().iter().map(|f| f.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
        assert_eq!(pool.queued_len(), 0);
    }

    #[test]
    fn test_unlimited_retries_until_sent() {
        let mut pool = pool();
        let mut nic = SimulatedNic::new();
        let ctl = nic.control();
        ctl.script([XmitStatus::Busy; 1000]);
        let mut stats = TxStats::default();
        let mut queue = TxQueue::new(100);

        let id = wrap(&mut pool, 0, 0);
        let res = queue.submit(&mut pool, &mut nic, &mut stats, Some(id), Budget::Unlimited);
        assert_eq!(res, SubmitResult { status: XmitStatus::Ok, attempts: 1001 });
        assert_eq!(pool.wait_len(), 1);
    }

    #[test]
    fn test_periodic_reclaim() {
        let mut pool = pool();
        let mut nic = SimulatedNic::new();
        let mut stats = TxStats::default();
        let mut queue = TxQueue::new(3);

        // The simulator lets go of frames immediately, so only the periodic
        // reclaim moves them off the wait list.
        for seq in 0..2 {
            let id = wrap(&mut pool, 0, seq);
            queue.submit(&mut pool, &mut nic, &mut stats, Some(id), Budget::Limited(1));
        }
        assert_eq!(pool.wait_len(), 2);

        let id = wrap(&mut pool, 0, 2);
        queue.submit(&mut pool, &mut nic, &mut stats, Some(id), Budget::Limited(1));
        assert_eq!(queue.calls(), 3);
        assert_eq!(pool.wait_len(), 0);
        assert_eq!(pool.freed_len(), 3);
        assert_eq!(pool.blocks().users(0), 0);
    }
}

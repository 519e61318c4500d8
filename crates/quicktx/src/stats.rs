use crate::xmit::XmitStatus;
use std::fmt;
use std::time::{Duration, Instant};

/// Counters owned by the worker thread.
#[derive(Debug, Default, Clone)]
pub struct TxStats {
    pub ok_packets: u64,
    pub ok_bytes: u64,
    pub busy: u64,
    pub locked: u64,
    pub other: u64,
    pub sleeps: u64,
    pub consumed: u64,
    start: Option<Instant>,
    end: Option<Instant>,
}

impl TxStats {
    #[inline]
    pub fn record(&mut self, status: XmitStatus, bytes: usize) {
        match status {
            XmitStatus::Ok => {
                self.ok_packets += 1;
                self.ok_bytes += bytes as u64;
            }
            XmitStatus::Busy => self.busy += 1,
            XmitStatus::Locked => self.locked += 1,
            XmitStatus::Other => self.other += 1,
        }
    }

    /// Records the first wakeup only.
    pub fn mark_start(&mut self) {
        if self.start.is_none() {
            self.start = Some(Instant::now());
        }
    }

    pub fn mark_end(&mut self) {
        self.end = Some(Instant::now());
    }

    pub fn elapsed(&self) -> Duration {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    pub fn snapshot(&self, allocs: u64, freed: u64) -> StatsSnapshot {
        StatsSnapshot {
            ok_packets: self.ok_packets,
            ok_bytes: self.ok_bytes,
            busy: self.busy,
            locked: self.locked,
            other: self.other,
            sleeps: self.sleeps,
            consumed: self.consumed,
            allocs,
            freed,
            elapsed: self.elapsed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub ok_packets: u64,
    pub ok_bytes: u64,
    pub busy: u64,
    pub locked: u64,
    pub other: u64,
    pub sleeps: u64,
    pub consumed: u64,
    pub allocs: u64,
    pub freed: u64,
    pub elapsed: Duration,
}

impl StatsSnapshot {
    pub fn mbps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        (self.ok_bytes as f64 * 8.0) / secs / 1_000_000.0
    }

    pub fn pps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.ok_packets as f64 / secs
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tx: {} packets, {} bytes in {:.3}s", self.ok_packets, self.ok_bytes, self.elapsed.as_secs_f64())?;
        writeln!(f, "throughput: {:.2} Mbps, {:.0} pps", self.mbps(), self.pps())?;
        writeln!(f, "retries: busy {}, locked {}, other {}", self.busy, self.locked, self.other)?;
        write!(
            f,
            "consumed {}, sleeps {}, wrappers allocated {} / freed {}",
            self.consumed, self.sleeps, self.allocs, self.freed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_by_status() {
        let mut stats = TxStats::default();
        stats.record(XmitStatus::Busy, 60);
        stats.record(XmitStatus::Busy, 60);
        stats.record(XmitStatus::Locked, 60);
        stats.record(XmitStatus::Other, 60);
        stats.record(XmitStatus::Ok, 60);

        assert_eq!(stats.ok_packets, 1);
        assert_eq!(stats.ok_bytes, 60);
        assert_eq!(stats.busy, 2);
        assert_eq!(stats.locked, 1);
        assert_eq!(stats.other, 1);
    }

    #[test]
    fn test_throughput() {
        let snap = StatsSnapshot {
            ok_packets: 1000,
            ok_bytes: 1_000_000,
            elapsed: Duration::from_secs(2),
            ..Default::default()
        };
        assert!((snap.mbps() - 4.0).abs() < f64::EPSILON);
        assert!((snap.pps() - 500.0).abs() < f64::EPSILON);
        assert_eq!(StatsSnapshot::default().mbps(), 0.0);
    }

    #[test]
    fn test_start_is_sticky() {
        let mut stats = TxStats::default();
        assert_eq!(stats.elapsed(), Duration::ZERO);
        stats.mark_start();
        let first = stats.start;
        stats.mark_start();
        assert_eq!(stats.start, first);
    }
}

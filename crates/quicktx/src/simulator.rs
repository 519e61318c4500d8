//! Scriptable stand-in for a NIC.
//!
//! [`SimulatedNic`] is the [`Transmit`] end handed to the worker;
//! [`NicControl`] is the test's side, used to script refusals, hold frames
//! "on the wire" and complete them later.

use crate::buffer::InFlight;
use crate::xmit::{Transmit, XmitStatus};
use crossbeam_queue::SegQueue;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A frame the simulated device accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub seq: u64,
    pub block: u32,
    pub data: Vec<u8>,
}

struct NicState {
    usable: AtomicBool,
    hold: AtomicBool,
    attempts: AtomicU64,
    script: Mutex<VecDeque<XmitStatus>>,
    default_status: Mutex<XmitStatus>,
    sent: Mutex<Vec<SentFrame>>,
    /// Tokens the device has not completed yet, oldest first.
    in_flight: SegQueue<InFlight>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SimulatedNic {
    state: Arc<NicState>,
}

impl Default for SimulatedNic {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedNic {
    /// A usable device that accepts every frame and completes it at once.
    pub fn new() -> Self {
        Self {
            state: Arc::new(NicState {
                usable: AtomicBool::new(true),
                hold: AtomicBool::new(false),
                attempts: AtomicU64::new(0),
                script: Mutex::new(VecDeque::new()),
                default_status: Mutex::new(XmitStatus::Ok),
                sent: Mutex::new(Vec::new()),
                in_flight: SegQueue::new(),
            }),
        }
    }

    pub fn control(&self) -> NicControl {
        NicControl {
            state: self.state.clone(),
        }
    }
}

impl Transmit for SimulatedNic {
    fn is_usable(&self) -> bool {
        self.state.usable.load(Ordering::Acquire)
    }

    fn xmit(&mut self, frame: InFlight) -> XmitStatus {
        let state = &self.state;
        state.attempts.fetch_add(1, Ordering::Relaxed);

        let status = lock(&state.script)
            .pop_front()
            .unwrap_or_else(|| *lock(&state.default_status));
        if !status.is_ok() {
            return status;
        }

        let record = SentFrame {
            seq: frame.seq(),
            block: frame.block_index(),
            data: frame.data().to_vec(),
        };
        // Held before it is reported as sent
        if state.hold.load(Ordering::Acquire) {
            state.in_flight.push(frame);
        }
        lock(&state.sent).push(record);
        XmitStatus::Ok
    }
}

/// Test-side handle to a [`SimulatedNic`]. Cheap to clone and usable from
/// any thread.
#[derive(Clone)]
pub struct NicControl {
    state: Arc<NicState>,
}

impl NicControl {
    /// Statuses returned by the next attempts, in order, before falling back
    /// to the default.
    pub fn script<I>(&self, statuses: I)
    where
        I: IntoIterator<Item = XmitStatus>,
    {
        lock(&self.state.script).extend(statuses);
    }

    pub fn set_default(&self, status: XmitStatus) {
        *lock(&self.state.default_status) = status;
    }

    pub fn set_usable(&self, usable: bool) {
        self.state.usable.store(usable, Ordering::Release);
    }

    /// While set, accepted frames stay referenced until completed.
    pub fn set_hold(&self, hold: bool) {
        self.state.hold.store(hold, Ordering::Release);
    }

    /// Completes up to `n` of the oldest held frames.
    pub fn complete(&self, n: usize) -> usize {
        let mut done = 0;
        while done < n {
            match self.state.in_flight.pop() {
                Some(frame) => drop(frame),
                None => break,
            }
            done += 1;
        }
        done
    }

    pub fn complete_all(&self) -> usize {
        self.complete(usize::MAX)
    }

    pub fn in_flight(&self) -> usize {
        self.state.in_flight.len()
    }

    pub fn attempts(&self) -> u64 {
        self.state.attempts.load(Ordering::Relaxed)
    }

    pub fn sent(&self) -> Vec<SentFrame> {
        lock(&self.state.sent).clone()
    }
}

use quicktx_core::Doorbell;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// The transmit device was not usable when the worker started.
pub const ERR_NOT_RUNNING: u32 = 1 << 0;

/// State shared between the worker thread, the producer and whoever
/// controls shutdown.
#[derive(Debug, Default)]
pub struct SharedControl {
    quit: AtomicBool,
    error_flags: AtomicU32,
    doorbell: Doorbell,
}

impl SharedControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the worker to drain and stop. It notices the next time it finds
    /// the ring empty.
    pub fn request_shutdown(&self) {
        self.quit.store(true, Ordering::Release);
        self.doorbell.ring();
    }

    #[inline]
    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::Acquire)
    }

    /// Tells a sleeping worker that descriptors are ready.
    pub fn notify_data(&self) {
        self.doorbell.ring();
    }

    pub fn doorbell(&self) -> &Doorbell {
        &self.doorbell
    }

    pub fn set_error(&self, flag: u32) {
        self.error_flags.fetch_or(flag, Ordering::AcqRel);
    }

    pub fn error_flags(&self) -> u32 {
        self.error_flags.load(Ordering::Acquire)
    }
}

pub mod producer;
pub mod shared;

pub use producer::Producer;
pub use shared::{SharedControl, ERR_NOT_RUNNING};

use crate::engine::TxWorker;
use crate::error::{QuickTxError, Result};
use crate::stats::StatsSnapshot;
use crate::xmit::Transmit;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A worker running on its own thread.
pub struct WorkerHandle {
    control: Arc<SharedControl>,
    thread: JoinHandle<Result<StatsSnapshot>>,
}

/// Moves `worker` onto a dedicated thread and runs it until shutdown.
pub fn spawn<T>(mut worker: TxWorker<T>) -> io::Result<WorkerHandle>
where
    T: Transmit + Send + 'static,
{
    let control = worker.control().clone();
    let thread = thread::Builder::new()
        .name("quicktx-worker".into())
        .spawn(move || worker.run())?;
    Ok(WorkerHandle { control, thread })
}

impl WorkerHandle {
    pub fn control(&self) -> &Arc<SharedControl> {
        &self.control
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Requests shutdown and waits for the drain to finish.
    pub fn shutdown(self) -> Result<StatsSnapshot> {
        self.control.request_shutdown();
        self.join()
    }

    pub fn join(self) -> Result<StatsSnapshot> {
        self.thread.join().map_err(|_| QuickTxError::WorkerPanicked)?
    }
}

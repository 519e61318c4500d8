pub mod list;
pub mod pool;
pub mod queue;
pub mod runner;

pub use list::Membership;
pub use pool::{BufferId, BufferPool};
pub use queue::{Budget, SubmitResult, TxQueue};
pub use runner::{PollOutcome, TxWorker, WorkerState};

pub mod buffer;
pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod simulator;
pub mod stats;
pub mod system;
pub mod xmit;

pub use builder::QuickTxBuilder;
pub use config::TxConfig;
pub use engine::{TxWorker, WorkerState};
pub use error::{QuickTxError, Result};
pub use stats::StatsSnapshot;
pub use system::{spawn, Producer, SharedControl, WorkerHandle};
pub use xmit::{Transmit, XmitStatus};

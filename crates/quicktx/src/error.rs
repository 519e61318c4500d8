use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuickTxError {
    #[error("Transmit device unusable: {0}")]
    DeviceUnusable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Buffer pool exhausted ({capacity} wrappers live)")]
    PoolExhausted { capacity: usize },

    #[error("Worker thread panicked")]
    WorkerPanicked,

    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, QuickTxError>;

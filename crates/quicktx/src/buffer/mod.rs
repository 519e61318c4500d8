pub mod frame;

pub use frame::{InFlight, TxFrame};

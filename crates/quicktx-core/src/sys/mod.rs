pub mod socket;
pub mod utils;

pub use socket::PacketSocket;

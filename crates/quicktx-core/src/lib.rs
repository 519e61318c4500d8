pub mod dma;
pub mod doorbell;
pub mod ring;

#[cfg(target_os = "linux")]
pub mod sys;

pub use dma::{BlockTable, DmaLayout, DmaRegion};
pub use doorbell::Doorbell;
pub use ring::{DescConsumer, DescProducer, DescRing, DescSlot, PacketDesc};

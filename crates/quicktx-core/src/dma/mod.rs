pub mod blocks;
pub mod layout;
pub mod region;

pub use blocks::BlockTable;
pub use layout::DmaLayout;
pub use region::DmaRegion;

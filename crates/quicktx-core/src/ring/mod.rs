//! Descriptor ring shared between one producer and one consumer.
//!
//! The ring is a fixed array of [`DescSlot`]s with no shared indices: each
//! side keeps its own cursor and ownership of a slot is carried by its
//! `consumed` word alone.
//!
//! - producer: location fields, `length` (release), then `consumed = 0`
//!   (release)
//! - consumer: `consumed` and `length` (acquire), then the location fields;
//!   `consumed = 1` (release) once every block reference for the slot has
//!   been taken
//!
//! Splitting a [`DescRing`] yields exactly one [`DescProducer`] and one
//! [`DescConsumer`], which is what keeps the ring single-reader,
//! single-writer.

pub mod consumer;
pub mod desc;
pub mod producer;

pub use consumer::DescConsumer;
pub use desc::{DescSlot, PacketDesc};
pub use producer::DescProducer;

use memmap2::{MmapMut, MmapOptions};
use std::io;
use std::mem::size_of;
use std::ptr::NonNull;
use std::sync::Arc;

pub struct DescRing {
    slots: NonNull<DescSlot>,
    capacity: u32,
    _map: Option<MmapMut>,
}

// Slots are only accessed through atomics.
unsafe impl Send for DescRing {}
unsafe impl Sync for DescRing {}

impl DescRing {
    /// Maps an anonymous, zero-filled slot table. Every slot starts out empty
    /// and owned by the producer.
    pub fn new(capacity: u32) -> io::Result<Self> {
        if capacity == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "ring capacity must be non-zero"));
        }

        let len = capacity as usize * size_of::<DescSlot>();
        let mut map = MmapOptions::new().len(len).map_anon()?;
        let slots = NonNull::new(map.as_mut_ptr() as *mut DescSlot)
            .ok_or_else(|| io::Error::other("mmap returned null"))?;

        Ok(Self {
            slots,
            capacity,
            _map: Some(map),
        })
    }

    /// # Safety
    /// `slots` must point to `capacity` properly aligned `DescSlot`s that stay
    /// mapped for the lifetime of the ring. Slots never written by the
    /// producer must read `length == 0`.
    pub unsafe fn from_raw(slots: *mut DescSlot, capacity: u32) -> Self {
        Self {
            slots: NonNull::new(slots).expect("descriptor table pointer is null"),
            capacity,
            _map: None,
        }
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub(crate) fn slot(&self, idx: u32) -> &DescSlot {
        assert!(idx < self.capacity, "descriptor index {} out of range ({})", idx, self.capacity);
        unsafe { &*self.slots.as_ptr().add(idx as usize) }
    }

    pub fn split(self) -> (DescProducer, DescConsumer) {
        let ring = Arc::new(self);
        (DescProducer::new(ring.clone()), DescConsumer::new(ring))
    }
}

//! Multi-core FIFO: a fixed-capacity, single-producer/single-consumer queue of
//! tagged scalar messages for two execution contexts sharing memory.
//!
//! The core is [`SPSC::Ring::RingQueue`]. It is bound to storage the
//! environment owns (a slot array and two 16-bit index words) and offers
//! typed sends on the producer side and a polling drain on the consumer side.
//!
//! ```
//! use multicore_fifo::SPSC::Ring::{QueueStorage, RingQueue};
//! use multicore_fifo::SPSC::Structs::{Message, Slot};
//! use std::sync::atomic::AtomicU16;
//!
//! let slots: [Slot; 4] = Default::default();
//! let (head, tail) = (AtomicU16::new(0), AtomicU16::new(0));
//! let storage = QueueStorage::new(&slots, &head, &tail);
//!
//! let mut seen = Vec::new();
//! let mut queue = RingQueue::send_receive(storage, |m: &Message| seen.push(*m));
//! queue.send_u16(1, 10);
//! queue.send_i32(2, -7);
//! queue.send_f32(3, 3.5);
//! assert_eq!(queue.drain(), 3);
//! drop(queue);
//!
//! assert_eq!(seen[0].payload.as_u16(), 10);
//! assert_eq!(seen[1].payload.as_i32(), -7);
//! assert_eq!(seen[2].payload.as_f32(), 3.5);
//! ```
//!
//! Around the core, [`Core`] hosts queues in named shared memory regions and
//! [`ffi`] exposes the same queue to C.

// Module naming follows project convention (SPSC = Single-Producer Single-Consumer)
#[allow(non_snake_case)]
pub mod SPSC;

#[allow(non_snake_case)]
pub mod Core;

#[allow(non_snake_case)]
mod Debug;

pub mod error;
pub mod ffi;
pub mod trace;

pub use error::{IndexOutOfRange, RegionError};
pub use trace::init_tracing;

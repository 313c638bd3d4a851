// This is the message record exchanged between the two cores

use std::fmt;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering::Relaxed};

/// Raw 4-byte payload carried by every message.
///
/// The queue never interprets it. A producer builds it from one of the five
/// scalar types and the handler reads it back with the matching accessor;
/// which one is right is decided by the message id, by convention between
/// the two sides.
///
/// The 16-bit variants occupy the first two bytes in native byte order, the
/// same place a C union over `u16/i16/u32/i32/float` puts them. The upper two
/// bytes are written as zero.
#[repr(C, align(4))]
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Payload([u8; 4]);

impl Payload {
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        self.0
    }

    /// Rebuild a payload from the 32-bit word stored in a slot.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits.to_ne_bytes())
    }

    /// The 32-bit word as it is stored in a slot.
    pub const fn to_bits(self) -> u32 {
        u32::from_ne_bytes(self.0)
    }

    pub const fn from_u16(value: u16) -> Self {
        let b = value.to_ne_bytes();
        Self([b[0], b[1], 0, 0])
    }

    pub const fn from_i16(value: i16) -> Self {
        let b = value.to_ne_bytes();
        Self([b[0], b[1], 0, 0])
    }

    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_ne_bytes())
    }

    pub const fn from_i32(value: i32) -> Self {
        Self(value.to_ne_bytes())
    }

    pub fn from_f32(value: f32) -> Self {
        Self(value.to_ne_bytes())
    }

    pub const fn as_u16(self) -> u16 {
        u16::from_ne_bytes([self.0[0], self.0[1]])
    }

    pub const fn as_i16(self) -> i16 {
        i16::from_ne_bytes([self.0[0], self.0[1]])
    }

    pub const fn as_u32(self) -> u32 {
        u32::from_ne_bytes(self.0)
    }

    pub const fn as_i32(self) -> i32 {
        i32::from_ne_bytes(self.0)
    }

    pub fn as_f32(self) -> f32 {
        f32::from_ne_bytes(self.0)
    }
}

impl From<u16> for Payload {
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

impl From<i16> for Payload {
    fn from(value: i16) -> Self {
        Self::from_i16(value)
    }
}

impl From<u32> for Payload {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl From<i32> for Payload {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl From<f32> for Payload {
    fn from(value: f32) -> Self {
        Self::from_f32(value)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload(0x{:08x})", self.to_bits())
    }
}

/// A drained message, as handed to the handler.
///
/// Same layout as the C record `{ uint16_t msgID; union { ... }; }`:
/// id at offset 0, payload at offset 4, 8 bytes total.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Message {
    /// Application-defined tag telling the handler how to read `payload`.
    pub id: u16,
    pub payload: Payload,
}

impl Message {
    pub const fn new(id: u16, payload: Payload) -> Self {
        Self { id, payload }
    }
}

/// One slot of the ring as it lives in shared memory.
///
/// Byte-compatible with [`Message`]. The fields are atomics so that a
/// producer lapping a slow consumer yields at worst a torn message, never a
/// data race. Publication order is carried by the head index, so the slot
/// itself only needs relaxed accesses.
#[repr(C)]
pub struct Slot {
    id: AtomicU16,
    payload: AtomicU32,
}

impl Slot {
    pub const fn new() -> Self {
        Self {
            id: AtomicU16::new(0),
            payload: AtomicU32::new(0),
        }
    }

    /// Size in bytes of one slot in memory.
    #[inline]
    pub const fn stride() -> usize {
        std::mem::size_of::<Slot>()
    }

    #[inline]
    pub(crate) fn store(&self, message: Message) {
        self.payload.store(message.payload.to_bits(), Relaxed);
        self.id.store(message.id, Relaxed);
    }

    /// Snapshot the slot contents.
    #[inline]
    pub fn load(&self) -> Message {
        Message {
            id: self.id.load(Relaxed),
            payload: Payload::from_bits(self.payload.load(Relaxed)),
        }
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::new()
    }
}

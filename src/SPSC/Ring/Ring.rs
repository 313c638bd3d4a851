// This is the typed ring queue shared by the two cores

use std::sync::atomic::AtomicU16;

use crate::SPSC::handler::{Handler, NoHandler};
use crate::SPSC::Structs::Slot;

/// Largest slot count a queue can address with its 16-bit indices.
pub const MAX_CAPACITY: usize = u16::MAX as usize;

/// Position both indices are reset to at initialization.
pub const START_INDEX: u16 = 0;

/// Advance a ring position by one, wrapping to 0 at `capacity`.
///
/// Equivalent to `(index + 1) % capacity`, without the division and without
/// overflowing 16 bits for any `capacity <= 65535`.
#[inline]
pub const fn advance(index: u16, capacity: u16) -> u16 {
    if index >= capacity - 1 {
        0
    } else {
        index + 1
    }
}

/// Which side(s) of the channel a queue instance plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Writes slots and publishes `head`. Has no handler.
    Send,
    /// Drains slots and publishes `tail`. Requires a handler.
    Receive,
    /// Both, e.g. loopback or symmetric peers on one context.
    SendReceive,
}

impl Mode {
    #[inline]
    pub const fn can_send(self) -> bool {
        matches!(self, Mode::Send | Mode::SendReceive)
    }

    #[inline]
    pub const fn can_receive(self) -> bool {
        matches!(self, Mode::Receive | Mode::SendReceive)
    }
}

/// Memory a queue is bound to: the slot array and the two index words.
///
/// All three live in a region both execution contexts can see and are owned
/// by whoever set that region up; the queue only borrows them.
///
/// `head` has exactly one writer (the producer), `tail` has exactly one
/// writer (the drain). Implementations must hand back the same memory on
/// every call.
pub trait SlotStorage {
    fn slots(&self) -> &[Slot];
    fn head(&self) -> &AtomicU16;
    fn tail(&self) -> &AtomicU16;
}

/// Borrowed storage: plain references into caller-owned memory.
#[derive(Clone, Copy)]
pub struct QueueStorage<'a> {
    slots: &'a [Slot],
    head: &'a AtomicU16,
    tail: &'a AtomicU16,
}

impl<'a> QueueStorage<'a> {
    pub const fn new(slots: &'a [Slot], head: &'a AtomicU16, tail: &'a AtomicU16) -> Self {
        Self { slots, head, tail }
    }
}

impl SlotStorage for QueueStorage<'_> {
    #[inline]
    fn slots(&self) -> &[Slot] {
        self.slots
    }

    #[inline]
    fn head(&self) -> &AtomicU16 {
        self.head
    }

    #[inline]
    fn tail(&self) -> &AtomicU16 {
        self.tail
    }
}

impl<S: SlotStorage + ?Sized> SlotStorage for &S {
    #[inline]
    fn slots(&self) -> &[Slot] {
        (**self).slots()
    }

    #[inline]
    fn head(&self) -> &AtomicU16 {
        (**self).head()
    }

    #[inline]
    fn tail(&self) -> &AtomicU16 {
        (**self).tail()
    }
}

/// Initialization parameters for [`RingQueue::with_config`].
pub struct QueueConfig<S, H = NoHandler> {
    pub storage: S,
    pub mode: Mode,
    pub handler: Option<H>,
}

impl<S> QueueConfig<S, NoHandler> {
    pub fn send_only(storage: S) -> Self {
        Self {
            storage,
            mode: Mode::Send,
            handler: None,
        }
    }
}

impl<S, H: Handler> QueueConfig<S, H> {
    pub fn receive_only(storage: S, handler: H) -> Self {
        Self {
            storage,
            mode: Mode::Receive,
            handler: Some(handler),
        }
    }

    pub fn send_receive(storage: S, handler: H) -> Self {
        Self {
            storage,
            mode: Mode::SendReceive,
            handler: Some(handler),
        }
    }
}

/// A fixed-capacity, single-producer/single-consumer typed message queue.
///
/// This struct is NOT stored in shared memory. It is a per-side view over
/// a [`SlotStorage`] both sides are bound to.
///
/// ### Index protocol:
/// - `head` is the most recently written slot. A send writes slot
///   `advance(head)` and then publishes it into `head` with `Release`.
/// - `tail` is the most recently drained slot. A drain loads `head` with
///   `Acquire` and walks `tail` forward until it catches up.
/// - `head == tail` means empty. There is no full flag: a send that lands on
///   `tail` overwrites, and the queue then reads as empty.
pub struct RingQueue<S: SlotStorage, H: Handler = NoHandler> {
    pub(crate) storage: S,
    pub(crate) capacity: u16,
    pub(crate) mode: Mode,
    pub(crate) handler: Option<H>,
}

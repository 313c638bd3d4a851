use crate::trace::error;
use crate::SPSC::handler::{Handler, NoHandler};
use crate::SPSC::Ring::{Mode, QueueConfig, RingQueue, SlotStorage};
use crate::SPSC::Structs::{Message, Payload, Slot};
use std::ptr;
use std::sync::atomic::AtomicU16;

// Error codes
pub const MCF_SUCCESS: i32 = 0;
pub const MCF_ERROR_NULL_POINTER: i32 = -1;
pub const MCF_ERROR_WRONG_MODE: i32 = -2;
pub const MCF_ERROR_BAD_INDEX: i32 = -3;

/// Parser callback: receives one drained message.
///
/// The pointer is valid only for the duration of the call.
pub type McfParser = extern "C" fn(message: *const Message);

/// Storage described by C pointers. The C side owns the memory and keeps it
/// alive for as long as the handle exists.
struct RawStorage {
    slots: *const Slot,
    head: *const AtomicU16,
    tail: *const AtomicU16,
    capacity: usize,
}

impl SlotStorage for RawStorage {
    fn slots(&self) -> &[Slot] {
        unsafe { std::slice::from_raw_parts(self.slots, self.capacity) }
    }

    fn head(&self) -> &AtomicU16 {
        unsafe { &*self.head }
    }

    fn tail(&self) -> &AtomicU16 {
        unsafe { &*self.tail }
    }
}

struct ParserHandler(McfParser);

impl Handler for ParserHandler {
    fn handle(&mut self, message: &Message) {
        (self.0)(message)
    }
}

enum Inner {
    Send(RingQueue<RawStorage, NoHandler>),
    Receive(RingQueue<RawStorage, ParserHandler>),
}

/// Handle to a queue instance (opaque pointer)
pub struct McfHandle {
    inner: Inner,
}

fn raw_storage(slots: *mut Slot, head: *mut u16, tail: *mut u16, capacity: u16) -> Option<RawStorage> {
    if slots.is_null() || head.is_null() || tail.is_null() {
        error!("mcf init: null slot or index pointer");
        return None;
    }
    if capacity == 0 {
        error!("mcf init: zero capacity");
        return None;
    }
    // u16 and AtomicU16 share size and alignment
    Some(RawStorage {
        slots,
        head: head as *const AtomicU16,
        tail: tail as *const AtomicU16,
        capacity: capacity as usize,
    })
}

fn into_handle(inner: Inner) -> *mut McfHandle {
    Box::into_raw(Box::new(McfHandle { inner }))
}

fn init_receiving(
    mode: Mode,
    slots: *mut Slot,
    head: *mut u16,
    tail: *mut u16,
    capacity: u16,
    parser: Option<McfParser>,
) -> *mut McfHandle {
    let Some(storage) = raw_storage(slots, head, tail, capacity) else {
        return ptr::null_mut();
    };
    let Some(parser) = parser else {
        error!(?mode, "mcf init: consuming queue needs a parser");
        return ptr::null_mut();
    };
    let config = QueueConfig {
        storage,
        mode,
        handler: Some(ParserHandler(parser)),
    };
    into_handle(Inner::Receive(RingQueue::with_config(config)))
}

// -----------------------------------------------------------------------------
// Initialization
// -----------------------------------------------------------------------------

/// Bind a send-only queue.
///
/// # Safety
/// Non-null `slots` must point to `capacity` slots, and `head` / `tail` to
/// 2-byte aligned index words. All three must stay valid, and must only be
/// accessed atomically by anyone else, until the returned handle is passed
/// to [`mcf_free`]. Null pointers are rejected, dangling ones are not.
///
/// # Arguments
/// * `slots` - Array of `capacity` message slots.
/// * `head` / `tail` - Shared index words.
/// * `capacity` - Slot count, non-zero.
///
/// # Returns
/// * Pointer to `McfHandle`, or NULL on a null pointer or zero capacity.
#[no_mangle]
pub extern "C" fn mcf_init_send(
    slots: *mut Slot,
    head: *mut u16,
    tail: *mut u16,
    capacity: u16,
) -> *mut McfHandle {
    match raw_storage(slots, head, tail, capacity) {
        Some(storage) => into_handle(Inner::Send(RingQueue::send_only(storage))),
        None => ptr::null_mut(),
    }
}

/// Bind a receive-only queue. `parser` must be non-null.
///
/// # Safety
/// Same pointer contract as [`mcf_init_send`]. `parser` must not unwind.
#[no_mangle]
pub extern "C" fn mcf_init_receive(
    slots: *mut Slot,
    head: *mut u16,
    tail: *mut u16,
    capacity: u16,
    parser: Option<McfParser>,
) -> *mut McfHandle {
    init_receiving(Mode::Receive, slots, head, tail, capacity, parser)
}

/// Bind a queue that both sends and receives. `parser` must be non-null.
///
/// # Safety
/// Same pointer contract as [`mcf_init_send`]. `parser` must not unwind.
#[no_mangle]
pub extern "C" fn mcf_init_send_receive(
    slots: *mut Slot,
    head: *mut u16,
    tail: *mut u16,
    capacity: u16,
    parser: Option<McfParser>,
) -> *mut McfHandle {
    init_receiving(Mode::SendReceive, slots, head, tail, capacity, parser)
}

/// Free a queue handle. The slot and index memory is untouched.
///
/// # Safety
/// `handle` must be null or a handle from one of the initializers that has
/// not been freed yet. It must not be used afterwards.
#[no_mangle]
pub extern "C" fn mcf_free(handle: *mut McfHandle) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle); // Dropped automatically
        }
    }
}

// -----------------------------------------------------------------------------
// Send / receive
// -----------------------------------------------------------------------------

fn send(handle: *mut McfHandle, id: u16, payload: Payload) -> i32 {
    if handle.is_null() {
        return MCF_ERROR_NULL_POINTER;
    }
    match unsafe { &mut (*handle).inner } {
        Inner::Send(queue) => queue.send(id, payload),
        Inner::Receive(queue) if queue.mode().can_send() => queue.send(id, payload),
        Inner::Receive(_) => return MCF_ERROR_WRONG_MODE,
    }
    MCF_SUCCESS
}

/// Send a `u16`. Returns `MCF_SUCCESS`, `MCF_ERROR_NULL_POINTER`, or
/// `MCF_ERROR_WRONG_MODE` on a receive-only handle.
///
/// # Safety
/// `handle` must be null or a live handle from an initializer, used by one
/// thread at a time. The storage it was built over must still be valid.
#[no_mangle]
pub extern "C" fn mcf_send_u16(handle: *mut McfHandle, msg_id: u16, value: u16) -> i32 {
    send(handle, msg_id, Payload::from_u16(value))
}

/// Send an `i16`. Same return codes as [`mcf_send_u16`].
///
/// # Safety
/// Same handle contract as [`mcf_send_u16`].
#[no_mangle]
pub extern "C" fn mcf_send_i16(handle: *mut McfHandle, msg_id: u16, value: i16) -> i32 {
    send(handle, msg_id, Payload::from_i16(value))
}

/// Send a `u32`. Same return codes as [`mcf_send_u16`].
///
/// # Safety
/// Same handle contract as [`mcf_send_u16`].
#[no_mangle]
pub extern "C" fn mcf_send_u32(handle: *mut McfHandle, msg_id: u16, value: u32) -> i32 {
    send(handle, msg_id, Payload::from_u32(value))
}

/// Send an `i32`. Same return codes as [`mcf_send_u16`].
///
/// # Safety
/// Same handle contract as [`mcf_send_u16`].
#[no_mangle]
pub extern "C" fn mcf_send_i32(handle: *mut McfHandle, msg_id: u16, value: i32) -> i32 {
    send(handle, msg_id, Payload::from_i32(value))
}

/// Send an `f32`. Same return codes as [`mcf_send_u16`].
///
/// # Safety
/// Same handle contract as [`mcf_send_u16`].
#[no_mangle]
pub extern "C" fn mcf_send_f32(handle: *mut McfHandle, msg_id: u16, value: f32) -> i32 {
    send(handle, msg_id, Payload::from_f32(value))
}

/// Drain the queue, calling the parser once per message.
///
/// # Returns
/// * Number of messages dispatched (saturating at `i32::MAX`).
/// * MCF_ERROR_WRONG_MODE on a send-only handle.
/// * MCF_ERROR_BAD_INDEX if `head` or `tail` holds a position outside the
///   ring, e.g. the producer side has not initialized `head` yet. Messages
///   dispatched before that was seen stay dispatched.
///
/// # Safety
/// Same handle contract as [`mcf_send_u16`]. The parser runs on this thread
/// and must not unwind.
#[no_mangle]
pub extern "C" fn mcf_receive(handle: *mut McfHandle) -> i32 {
    if handle.is_null() {
        return MCF_ERROR_NULL_POINTER;
    }
    match unsafe { &mut (*handle).inner } {
        Inner::Receive(queue) => match queue.try_drain() {
            Ok(drained) => drained.min(i32::MAX as usize) as i32,
            Err(_) => MCF_ERROR_BAD_INDEX,
        },
        Inner::Send(_) => MCF_ERROR_WRONG_MODE,
    }
}

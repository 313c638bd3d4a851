use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use super::Ring::{
    advance, Mode, QueueConfig, RingQueue, SlotStorage, MAX_CAPACITY, START_INDEX,
};
use crate::error::IndexOutOfRange;
use crate::trace::{debug, error, trace};
use crate::SPSC::handler::{Handler, NoHandler};
use crate::SPSC::Structs::{Message, Payload};

impl<S: SlotStorage> RingQueue<S, NoHandler> {
    /// Bind a send-only queue to `storage` and reset `head` to the start
    /// position.
    ///
    /// # Panics
    /// If the slot array is empty or longer than [`MAX_CAPACITY`].
    pub fn send_only(storage: S) -> Self {
        Self::with_config(QueueConfig::send_only(storage))
    }
}

impl<S: SlotStorage, H: Handler> RingQueue<S, H> {
    /// Bind a receive-only queue to `storage` and reset `tail` to the start
    /// position. `handler` is called once per drained message.
    pub fn receive_only(storage: S, handler: H) -> Self {
        Self::with_config(QueueConfig::receive_only(storage, handler))
    }

    /// Bind a queue that both sends and drains on the same context. Resets
    /// both indices.
    pub fn send_receive(storage: S, handler: H) -> Self {
        Self::with_config(QueueConfig::send_receive(storage, handler))
    }

    /// Bind a queue from an explicit configuration.
    ///
    /// Configuration mistakes are defects, not runtime conditions, so this
    /// panics instead of returning a half-configured queue.
    ///
    /// # Panics
    /// - the slot array is empty or longer than [`MAX_CAPACITY`];
    /// - `mode` consumes but `handler` is `None` or [`NoHandler`];
    /// - `mode` is [`Mode::Send`] but a handler was supplied.
    pub fn with_config(config: QueueConfig<S, H>) -> Self {
        let QueueConfig {
            storage,
            mode,
            handler,
        } = config;

        let len = storage.slots().len();
        if len == 0 || len > MAX_CAPACITY {
            error!(len, "ring queue capacity out of range");
            panic!("ring queue capacity must be within 1..={MAX_CAPACITY}, got {len}");
        }
        match (mode.can_receive(), handler.is_some() && H::PRESENT) {
            (true, false) => panic!("{mode:?} queue requires a handler"),
            (false, true) => panic!("send-only queue must not be given a handler"),
            _ => {}
        }

        let capacity = len as u16;
        if mode.can_send() {
            storage.head().store(START_INDEX, Release);
        }
        if mode.can_receive() {
            storage.tail().store(START_INDEX, Release);
        }
        debug!(capacity, ?mode, "ring queue bound");

        Self {
            storage,
            capacity,
            mode,
            handler,
        }
    }

    /// Write one message and publish it.
    ///
    /// Never fails. If the consumer is a full lap behind, the slot at `tail`
    /// is overwritten and the queue reads as empty until the next send.
    ///
    /// # Panics
    /// On a receive-only queue.
    #[inline]
    pub fn send(&mut self, id: u16, payload: Payload) {
        assert!(self.mode.can_send(), "send on a receive-only queue");

        let head_index = self.storage.head();
        // Only this side writes head, so our own last store is what we read.
        let next = advance(head_index.load(Relaxed), self.capacity);
        self.storage.slots()[next as usize].store(Message::new(id, payload));
        head_index.store(next, Release);
    }

    #[inline]
    pub fn send_u16(&mut self, id: u16, value: u16) {
        self.send(id, Payload::from_u16(value))
    }

    #[inline]
    pub fn send_i16(&mut self, id: u16, value: i16) {
        self.send(id, Payload::from_i16(value))
    }

    #[inline]
    pub fn send_u32(&mut self, id: u16, value: u32) {
        self.send(id, Payload::from_u32(value))
    }

    #[inline]
    pub fn send_i32(&mut self, id: u16, value: i32) {
        self.send(id, Payload::from_i32(value))
    }

    #[inline]
    pub fn send_f32(&mut self, id: u16, value: f32) {
        self.send(id, Payload::from_f32(value))
    }

    /// Dispatch every message published since the last drain, oldest first.
    ///
    /// `head` is re-read after each message, so anything the producer
    /// publishes while the handler runs is delivered by this same call.
    /// Returns the number of messages handed to the handler.
    ///
    /// # Panics
    /// On a send-only queue, or if a shared index word holds a position
    /// outside the ring. [`try_drain`](Self::try_drain) reports the latter
    /// instead.
    pub fn drain(&mut self) -> usize {
        match self.try_drain() {
            Ok(drained) => drained,
            Err(e) => panic!("{e}"),
        }
    }

    /// Like [`drain`](Self::drain), but a `head` or `tail` outside the ring
    /// is returned as an error instead of panicking. Messages dispatched
    /// before the bad index was seen stay dispatched.
    ///
    /// # Panics
    /// On a send-only queue.
    pub fn try_drain(&mut self) -> Result<usize, IndexOutOfRange> {
        let handler = match (self.mode.can_receive(), self.handler.as_mut()) {
            (true, Some(handler)) => handler,
            _ => panic!("drain on a queue configured without a handler"),
        };
        let capacity = self.capacity;
        let slots = self.storage.slots();
        let head_index = self.storage.head();
        let tail_index = self.storage.tail();

        let mut tail = tail_index.load(Relaxed);
        if tail >= capacity {
            error!(tail, capacity, "tail index outside ring");
            return Err(IndexOutOfRange {
                which: "tail",
                index: tail,
                capacity,
            });
        }
        let mut drained = 0;
        loop {
            let head = head_index.load(Acquire);
            if head >= capacity {
                error!(head, capacity, drained, "head index outside ring");
                return Err(IndexOutOfRange {
                    which: "head",
                    index: head,
                    capacity,
                });
            }
            if head == tail {
                break;
            }
            tail = advance(tail, capacity);
            let message = slots[tail as usize].load();
            tail_index.store(tail, Release);
            handler.handle(&message);
            drained += 1;
        }

        if drained > 0 {
            trace!(drained, tail, "ring queue drained");
        }
        Ok(drained)
    }

    pub fn capacity(&self) -> u16 {
        self.capacity
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current `head` as published by the producer.
    pub fn head(&self) -> u16 {
        self.storage.head().load(Acquire)
    }

    /// Current `tail` as published by the drain.
    pub fn tail(&self) -> u16 {
        self.storage.tail().load(Acquire)
    }

    /// Messages between `tail` and `head` right now.
    pub fn pending(&self) -> u16 {
        let capacity = u32::from(self.capacity);
        let head = u32::from(self.head());
        let tail = u32::from(self.tail());
        ((head + capacity - tail % capacity) % capacity) as u16
    }

    pub fn is_empty(&self) -> bool {
        self.head() == self.tail()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    pub fn handler_mut(&mut self) -> Option<&mut H> {
        self.handler.as_mut()
    }

    /// Give back the storage handle and the handler, e.g. to inspect what a
    /// recording handler collected.
    pub fn into_parts(self) -> (S, Option<H>) {
        (self.storage, self.handler)
    }
}

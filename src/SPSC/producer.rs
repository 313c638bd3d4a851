use crate::Core::alloc::{ChannelPartition, RegionAllocator};
use crate::Core::futex;
use crate::SPSC::Ring::RingQueue;
use crate::SPSC::Structs::Payload;

/// The sending side of a hosted channel.
///
/// Owns the region it created and a send-only [`RingQueue`] over one
/// channel of it. Sends never block and never fail; see
/// [`RingQueue::send`] for the overflow behaviour.
pub struct Producer {
    allocator: RegionAllocator,
    queue: RingQueue<ChannelPartition>,
    doorbell: bool,
}

impl Producer {
    pub(crate) fn new(allocator: RegionAllocator, channel: ChannelPartition, doorbell: bool) -> Self {
        Self {
            allocator,
            queue: RingQueue::send_only(channel),
            doorbell,
        }
    }

    #[inline]
    pub fn send(&mut self, id: u16, payload: Payload) {
        self.queue.send(id, payload);
        self.ring();
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

    #[inline]
    fn ring(&self) {
        if self.doorbell {
            futex::ring(self.queue.storage().doorbell());
        }
    }

    /// Returns the channel ID for this producer
    pub fn channel_id(&self) -> u32 {
        self.queue.storage().id()
    }

    pub fn capacity(&self) -> u16 {
        self.queue.capacity()
    }

    /// The underlying queue, for its read-only observers
    pub fn queue(&self) -> &RingQueue<ChannelPartition> {
        &self.queue
    }

    pub fn allocator(&self) -> &RegionAllocator {
        &self.allocator
    }
}

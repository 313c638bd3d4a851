use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::Core::alloc::{ChannelPartition, RegionAllocator};
use crate::Core::futex;
use crate::SPSC::handler::Handler;
use crate::SPSC::Ring::RingQueue;

/// The receiving side of a hosted channel.
///
/// Holds a receive-only [`RingQueue`] over a channel of an attached region.
/// Nothing is delivered unless [`drain`](Consumer::drain) or
/// [`drain_timeout`](Consumer::drain_timeout) is called.
pub struct Consumer<H: Handler> {
    allocator: RegionAllocator,
    queue: RingQueue<ChannelPartition, H>,
}

impl<H: Handler> Consumer<H> {
    pub(crate) fn new(allocator: RegionAllocator, channel: ChannelPartition, handler: H) -> Self {
        Self {
            allocator,
            queue: RingQueue::receive_only(channel, handler),
        }
    }

    /// Dispatch everything published so far. Returns the number of messages.
    pub fn drain(&mut self) -> usize {
        self.queue.drain()
    }

    /// Drain; if nothing was pending, sleep on the channel doorbell for at
    /// most `timeout` and drain again.
    ///
    /// Without a producer ringing the doorbell this degrades to a drain,
    /// a sleep of `timeout`, and a second drain.
    pub fn drain_timeout(&mut self, timeout: Duration) -> usize {
        let doorbell = self.queue.storage().doorbell();
        let seen = doorbell.load(Ordering::Acquire);
        let drained = self.queue.drain();
        if drained > 0 {
            return drained;
        }
        futex::wait(self.queue.storage().doorbell(), seen, timeout);
        self.queue.drain()
    }

    /// Returns the channel ID for this consumer
    pub fn channel_id(&self) -> u32 {
        self.queue.storage().id()
    }

    pub fn pending(&self) -> u16 {
        self.queue.pending()
    }

    pub fn handler(&self) -> &H {
        match self.queue.handler() {
            Some(handler) => handler,
            None => unreachable!("receive-only queue always has a handler"),
        }
    }

    pub fn handler_mut(&mut self) -> &mut H {
        match self.queue.handler_mut() {
            Some(handler) => handler,
            None => unreachable!("receive-only queue always has a handler"),
        }
    }

    pub fn queue(&self) -> &RingQueue<ChannelPartition, H> {
        &self.queue
    }

    pub fn allocator(&self) -> &RegionAllocator {
        &self.allocator
    }
}

use crate::Core::alloc::{ChannelPartition, RegionAllocator};
use crate::SPSC::handler::Handler;
use crate::SPSC::Ring::{RingQueue, SlotStorage};
use crate::SPSC::Structs::Slot;
use std::fmt;

/// Debug function for RegionAllocator
///
/// Shows the region name, header location, channel count and whether the
/// header is valid. Never walks the slot bands.
pub fn debug_region_allocator(allocator: &RegionAllocator, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RegionAllocator")
        .field("name", &allocator.name())
        .field("shm", &"<opaque>")
        .field("header", &format_args!("{:p}", allocator.header_ptr()))
        .field("channel_count", &allocator.channel_count())
        .field("initialized", &allocator.is_initialized())
        .finish()
}

/// Debug function for ChannelPartition
pub fn debug_channel_partition(partition: &ChannelPartition, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChannelPartition")
        .field("channel_id", &partition.channel_id)
        .field("capacity", &partition.capacity)
        .field("band_offset", &format_args!("0x{:x}", partition.band_offset()))
        .finish()
}

/// Debug function for RingQueue
///
/// Reads the two index words only; slot contents are not shown.
pub fn debug_ring_queue<S: SlotStorage, H: Handler>(
    queue: &RingQueue<S, H>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("RingQueue")
        .field("mode", &queue.mode())
        .field("capacity", &queue.capacity())
        .field("head", &queue.head())
        .field("tail", &queue.tail())
        .field("slots", &format_args!("{:p}", queue.storage().slots().as_ptr()))
        .finish_non_exhaustive()
}

impl<S: SlotStorage, H: Handler> fmt::Debug for RingQueue<S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_ring_queue(self, f)
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.load();
        f.debug_struct("Slot")
            .field("id", &message.id)
            .field("payload", &message.payload)
            .finish()
    }
}

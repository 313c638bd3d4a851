use super::{Consumer, Handler, Producer};
use crate::error::Result;
use crate::Core::alloc::RegionAllocator;

/// Configuration for a queue hosted in a named shared memory region.
///
/// The producer side creates the region and the channel; the consumer side
/// attaches to both by name and id.
pub struct ChannelBuilder {
    region_name: String,
    region_size: usize,
    channel_id: u32,
    capacity: usize,
    doorbell: bool,
}

impl Default for ChannelBuilder {
    fn default() -> Self {
        Self {
            region_name: "mcf_region".to_owned(),
            region_size: 1024 * 1024, // 1MB default
            channel_id: 0,            // Default channel ID
            capacity: 256,            // 256 slots
            doorbell: false,
        }
    }
}

impl ChannelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region_name(mut self, name: impl Into<String>) -> Self {
        self.region_name = name.into();
        self
    }

    pub fn with_region_size(mut self, size: usize) -> Self {
        self.region_size = size;
        self
    }

    pub fn with_channel_id(mut self, channel_id: u32) -> Self {
        self.channel_id = channel_id;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Ring the channel doorbell after every send so a consumer using
    /// [`Consumer::drain_timeout`] wakes up immediately instead of at its
    /// timeout.
    pub fn with_doorbell(mut self, doorbell: bool) -> Self {
        self.doorbell = doorbell;
        self
    }

    /// Create the region (replacing any region of the same name) and the
    /// channel, and bind a send-only queue to it.
    pub fn build_producer(self) -> Result<Producer> {
        let allocator = RegionAllocator::new(&self.region_name, self.region_size)?;
        let channel = allocator.create_channel_at(self.channel_id, self.capacity)?;
        Ok(Producer::new(allocator, channel, self.doorbell))
    }

    /// Attach to an existing region and channel and bind a receive-only
    /// queue with `handler` to it.
    pub fn build_consumer<H: Handler>(self, handler: H) -> Result<Consumer<H>> {
        let allocator = RegionAllocator::attach(&self.region_name)?;
        let channel = allocator.get_channel(self.channel_id)?;
        Ok(Consumer::new(allocator, channel, handler))
    }
}

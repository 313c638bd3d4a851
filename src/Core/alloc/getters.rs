use super::*;

/// Getter methods for RegionAllocator
///
/// These expose the private fields of RegionAllocator for debugging and
/// monitoring purposes.
impl RegionAllocator {
    /// Get a reference to the underlying shared memory backend
    pub fn shm(&self) -> &dyn SharedMemoryBackend {
        &*self.shm
    }

    /// The /dev/shm name this region was created or attached under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the raw pointer to the RegionHeader
    ///
    /// # Safety
    /// The caller must ensure the pointer is not used after the allocator
    /// and every partition it handed out are dropped
    pub fn header_ptr(&self) -> *const RegionHeader {
        self.header
    }

    /// Check if the region carries a valid header
    ///
    /// Returns true if the magic number in the header matches the expected value.
    pub fn is_initialized(&self) -> bool {
        // Safety: the header pointer is valid while the allocator exists
        unsafe { !self.header.is_null() && addr_of!((*self.header).magic).read_volatile() == MAGIC_NUMBER }
    }
}

impl ChannelPartition {
    /// Byte offset of this channel's slot band from the start of the region
    pub fn band_offset(&self) -> usize {
        self.slots.as_ptr() as usize - self.shm.as_ptr() as usize
    }
}

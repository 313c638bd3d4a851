use crate::error::{RegionError, Result};
use crate::trace::{info, warn};
use crate::Core::SharedMemory::{self, SharedMemoryBackend};
use crate::SPSC::Ring::layout::{
    ChannelEntry, RegionHeader, MAX_CHANNELS, REGION_ALIGN, UNUSED_CHANNEL,
};
use crate::SPSC::Ring::{SlotStorage, MAX_CAPACITY};
use crate::SPSC::Structs::{Message, Slot};
use std::ptr::{addr_of, addr_of_mut, NonNull};
use std::sync::atomic::{fence, AtomicU16, AtomicU32, Ordering};
use std::sync::Arc;
mod debug;
mod getters;

// Use parking_lot's Mutex for channel creation/removal
use parking_lot::Mutex;

const MAGIC_NUMBER: u64 = 0x4D43_4651_5545_5545; // "MCFQUEUE"
const LAYOUT_VERSION: u32 = 1;

#[inline]
const fn align_up(n: usize) -> usize {
    (n + REGION_ALIGN - 1) & !(REGION_ALIGN - 1)
}

/// Bytes a band of `capacity` slots occupies, alignment included.
#[inline]
pub const fn band_size(capacity: usize) -> usize {
    align_up(capacity * Slot::stride())
}

/// Smallest region that holds the header alone.
#[inline]
pub const fn header_size() -> usize {
    align_up(std::mem::size_of::<RegionHeader>())
}

/// One queue's storage inside a hosted region: its index words (in the
/// channel table) and its slot band.
///
/// Holds the mapping alive, so a [`RingQueue`](crate::SPSC::Ring::RingQueue)
/// built over it can outlive the allocator that handed it out.
pub struct ChannelPartition {
    shm: Arc<dyn SharedMemoryBackend>,
    entry: NonNull<ChannelEntry>,
    slots: NonNull<Slot>,
    /// The identifier of this channel (its index in the channel table)
    pub channel_id: u32,
    /// The number of slots of the channel
    pub capacity: u16,
}

/// Carves queues out of one named shared memory region
pub struct RegionAllocator {
    shm: Arc<dyn SharedMemoryBackend>,
    name: String,
    header: *mut RegionHeader,
    allocation_mutex: Mutex<()>, // Serialises channel table updates in this process
}

impl RegionAllocator {
    /// Create a new region named `name` of at least `size` bytes and lay out
    /// an empty channel table in it.
    pub fn new(name: &str, size: usize) -> Result<Self> {
        // Ensure the region size is a multiple of the band alignment
        let aligned_size = align_up(size);
        let needed = header_size();
        if aligned_size < needed {
            warn!(name, size, needed, "region too small for header");
            return Err(RegionError::TooSmall {
                size: aligned_size,
                needed,
            });
        }

        let shm: Arc<dyn SharedMemoryBackend> =
            Arc::from(SharedMemory::create_shared_memory(name, aligned_size)?);

        let header = shm.as_ptr() as *mut RegionHeader;
        if (header as usize) % REGION_ALIGN != 0 {
            return Err(RegionError::Misaligned {
                align: REGION_ALIGN,
            });
        }

        // The mapping starts zeroed, which is already a valid bit pattern for
        // every atomic in the table; only the plain fields need writing.
        unsafe {
            addr_of_mut!((*header).version).write(LAYOUT_VERSION);
            addr_of_mut!((*header).max_channels).write(MAX_CHANNELS as u32);
            addr_of_mut!((*header).channel_count).write(0);
            addr_of_mut!((*header).reserved).write(0);
            for i in 0..MAX_CHANNELS {
                let entry = addr_of_mut!((*header).channels[i]);
                addr_of_mut!((*entry).channel_id).write(UNUSED_CHANNEL);
                addr_of_mut!((*entry).capacity).write(0);
                addr_of_mut!((*entry).band_offset).write(0);
            }
            // Magic last: an attacher that sees it sees a complete table
            fence(Ordering::Release);
            addr_of_mut!((*header).magic).write(MAGIC_NUMBER);
        }

        info!(name, size = aligned_size, "region created");
        Ok(Self {
            shm,
            name: name.to_owned(),
            header,
            allocation_mutex: Mutex::new(()),
        })
    }

    /// Attach to a region created by [`RegionAllocator::new`], possibly in
    /// another process.
    pub fn attach(name: &str) -> Result<Self> {
        let shm: Arc<dyn SharedMemoryBackend> =
            Arc::from(SharedMemory::attach_shared_memory(name, header_size())?);

        let header = shm.as_ptr() as *mut RegionHeader;
        if (header as usize) % REGION_ALIGN != 0 {
            return Err(RegionError::Misaligned {
                align: REGION_ALIGN,
            });
        }

        // Verify magic number and layout version
        let (magic, version) = unsafe {
            let magic = addr_of!((*header).magic).read_volatile();
            fence(Ordering::Acquire);
            (magic, addr_of!((*header).version).read())
        };
        if magic != MAGIC_NUMBER {
            warn!(name, magic, "region magic mismatch");
            return Err(RegionError::BadMagic { found: magic });
        }
        if version != LAYOUT_VERSION {
            return Err(RegionError::VersionMismatch {
                found: version,
                expected: LAYOUT_VERSION,
            });
        }

        info!(name, size = shm.size(), "region attached");
        Ok(Self {
            shm,
            name: name.to_owned(),
            header,
            allocation_mutex: Mutex::new(()),
        })
    }

    /// Create a channel of `capacity` slots in the first free table entry.
    pub fn create_channel(&self, capacity: usize) -> Result<ChannelPartition> {
        let _guard = self.allocation_mutex.lock();
        let index = (0..MAX_CHANNELS)
            .find(|&i| unsafe { self.entry_capacity(i) } == 0)
            .ok_or(RegionError::ChannelLimit(MAX_CHANNELS))?;
        self.init_channel(index, capacity)
    }

    /// Create a channel of `capacity` slots under a specific id.
    pub fn create_channel_at(&self, channel_id: u32, capacity: usize) -> Result<ChannelPartition> {
        let index = channel_id as usize;
        if index >= MAX_CHANNELS {
            return Err(RegionError::ChannelNotFound(channel_id));
        }
        let _guard = self.allocation_mutex.lock();
        if unsafe { self.entry_capacity(index) } != 0 {
            return Err(RegionError::ChannelInUse(channel_id));
        }
        self.init_channel(index, capacity)
    }

    // Caller holds the allocation mutex and has checked the entry is free.
    fn init_channel(&self, index: usize, capacity: usize) -> Result<ChannelPartition> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(RegionError::InvalidCapacity(capacity));
        }

        let needed = band_size(capacity);
        let offset = align_up(self.used_memory());
        let available = self.shm.size().saturating_sub(offset);
        if needed > available {
            warn!(channel = index, needed, available, "region out of space");
            return Err(RegionError::OutOfSpace { needed, available });
        }

        unsafe {
            // A band may be reused after remove_channel while an old partition
            // still reads it, so clear it through the slot atomics. Zeroed
            // memory is already a valid Slot.
            let base = self.shm.as_ptr().add(offset) as *const Slot;
            for k in 0..capacity {
                (*base.add(k)).store(Message::default());
            }

            let entry = addr_of_mut!((*self.header).channels[index]);
            (*entry).head.store(0, Ordering::Relaxed);
            (*entry).tail.store(0, Ordering::Relaxed);
            (*entry).doorbell.store(0, Ordering::Relaxed);
            addr_of_mut!((*entry).band_offset).write(offset as u64);
            addr_of_mut!((*entry).channel_id).write(index as u32);
            fence(Ordering::Release);
            addr_of_mut!((*entry).capacity).write(capacity as u32);

            let count = addr_of_mut!((*self.header).channel_count);
            count.write(count.read() + 1);
        }

        info!(channel = index, capacity, offset, "channel created");
        self.partition(index)
            .ok_or(RegionError::ChannelNotFound(index as u32))
    }

    /// Get a channel by ID
    pub fn get_channel(&self, channel_id: u32) -> Result<ChannelPartition> {
        if channel_id as usize >= MAX_CHANNELS {
            return Err(RegionError::ChannelNotFound(channel_id));
        }
        self.partition(channel_id as usize)
            .ok_or(RegionError::ChannelNotFound(channel_id))
    }

    /// Mark a channel free. Partitions already handed out keep working on
    /// the old band until a new channel reuses it; from then on they see the
    /// new channel's slots, cleared and then written by its producer.
    pub fn remove_channel(&self, channel_id: u32) -> Result<()> {
        let index = channel_id as usize;
        if index >= MAX_CHANNELS {
            return Err(RegionError::ChannelNotFound(channel_id));
        }
        let _guard = self.allocation_mutex.lock();
        if unsafe { self.entry_capacity(index) } == 0 {
            return Err(RegionError::ChannelNotFound(channel_id));
        }

        unsafe {
            let entry = addr_of_mut!((*self.header).channels[index]);
            addr_of_mut!((*entry).capacity).write(0);
            addr_of_mut!((*entry).channel_id).write(UNUSED_CHANNEL);
            let count = addr_of_mut!((*self.header).channel_count);
            count.write(count.read().saturating_sub(1));
        }
        info!(channel = channel_id, "channel removed");
        Ok(())
    }

    /// All configured channels
    pub fn channels(&self) -> Vec<ChannelPartition> {
        (0..MAX_CHANNELS).filter_map(|i| self.partition(i)).collect()
    }

    /// Get the number of active channels
    pub fn channel_count(&self) -> u32 {
        unsafe { addr_of!((*self.header).channel_count).read() }
    }

    /// Bytes in use: the header plus the furthest band end
    pub fn used_memory(&self) -> usize {
        (0..MAX_CHANNELS)
            .filter_map(|i| unsafe {
                let capacity = self.entry_capacity(i) as usize;
                (capacity != 0).then(|| {
                    let offset = addr_of!((*self.header).channels[i].band_offset).read();
                    offset as usize + capacity * Slot::stride()
                })
            })
            .fold(header_size(), usize::max)
    }

    /// Bytes still free at the end of the region
    pub fn available_memory(&self) -> usize {
        self.shm.size().saturating_sub(align_up(self.used_memory()))
    }

    /// Remove the region's name from /dev/shm. Existing mappings, including
    /// this one, stay valid.
    pub fn unlink(&self) -> Result<()> {
        SharedMemory::unlink_shared_memory(&self.name)?;
        Ok(())
    }

    unsafe fn entry_capacity(&self, index: usize) -> u32 {
        addr_of!((*self.header).channels[index].capacity).read_volatile()
    }

    fn partition(&self, index: usize) -> Option<ChannelPartition> {
        let capacity = unsafe { self.entry_capacity(index) } as usize;
        if capacity == 0 || capacity > MAX_CAPACITY {
            return None; // Channel not initialized
        }
        fence(Ordering::Acquire);

        unsafe {
            let entry = addr_of_mut!((*self.header).channels[index]);
            let offset = addr_of!((*entry).band_offset).read() as usize;
            if offset + capacity * Slot::stride() > self.shm.size() {
                return None; // Band does not lie inside this mapping
            }
            let slots = self.shm.as_ptr().add(offset) as *mut Slot;
            Some(ChannelPartition {
                shm: Arc::clone(&self.shm),
                entry: NonNull::new_unchecked(entry),
                slots: NonNull::new_unchecked(slots),
                channel_id: index as u32,
                capacity: capacity as u16,
            })
        }
    }
}

impl ChannelPartition {
    /// Get the channel ID
    pub fn id(&self) -> u32 {
        self.channel_id
    }

    /// The doorbell word of this channel
    pub fn doorbell(&self) -> &AtomicU32 {
        unsafe { &self.entry.as_ref().doorbell }
    }
}

impl SlotStorage for ChannelPartition {
    #[inline]
    fn slots(&self) -> &[Slot] {
        // The band was bounds-checked against the mapping this partition keeps alive
        unsafe { std::slice::from_raw_parts(self.slots.as_ptr(), self.capacity as usize) }
    }

    #[inline]
    fn head(&self) -> &AtomicU16 {
        unsafe { &self.entry.as_ref().head }
    }

    #[inline]
    fn tail(&self) -> &AtomicU16 {
        unsafe { &self.entry.as_ref().tail }
    }
}

// Send + Sync: all shared state behind these pointers is atomics, and the
// mapping is kept alive by the Arc.
unsafe impl Send for ChannelPartition {}
unsafe impl Sync for ChannelPartition {}
unsafe impl Send for RegionAllocator {}
unsafe impl Sync for RegionAllocator {}

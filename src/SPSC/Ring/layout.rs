use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU16, AtomicU32};

/// The maximum number of queues a hosted region can carry.
/// This must be a constant to allow for a fixed-size array in the RegionHeader.
pub const MAX_CHANNELS: usize = 64;

/// Alignment of the header and of every slot band inside a region.
pub const REGION_ALIGN: usize = 128;

/// Marks a channel table entry that has no queue behind it.
pub const UNUSED_CHANNEL: u32 = 0xFFFF_FFFF;

/// Index words and placement of one queue inside a hosted region.
///
/// `head` and `tail` are the two shared index words the queue protocol runs
/// on. Each sits on its own cache line so the producer's stores to `head`
/// and the consumer's stores to `tail` never contend.
#[repr(C, align(128))]
pub struct ChannelEntry {
    /// Logical identifier ([`UNUSED_CHANNEL`] if unused).
    pub channel_id: u32,

    /// Number of slots in this channel's band. 0 marks a free entry.
    pub capacity: u32,

    /// Byte offset from the start of the region to this channel's slot band.
    pub band_offset: u64,

    /// Doorbell word. The producer bumps it and wakes after a send; a
    /// blocking consumer waits on it. Not part of the queue protocol.
    pub doorbell: AtomicU32,

    /// Most recently written slot. Written by the producer only.
    pub head: CachePadded<AtomicU16>,

    /// Most recently drained slot. Written by the consumer only.
    pub tail: CachePadded<AtomicU16>,
}

/// The header located at the very beginning of a hosted region.
///
/// It is the entry point for either side attaching to the region: it carries
/// the layout version and the table of channel entries.
#[repr(C, align(128))]
pub struct RegionHeader {
    /// A "magic number" identifying the region as a multicore-fifo region.
    pub magic: u64,

    /// The version of the memory layout.
    pub version: u32,

    /// Compiled maximum channel entries.
    pub max_channels: u32,

    /// The number of channels currently configured.
    pub channel_count: u32,

    /// Reserved/padding.
    pub reserved: u32,

    /// The table of metadata for each channel.
    pub channels: [ChannelEntry; MAX_CHANNELS],
}

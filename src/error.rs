use std::io;

use thiserror::Error;

/// Failures of the shared-memory hosting layer.
///
/// The queue core itself has no recoverable errors: misconfiguration panics
/// and overflow overwrites. Everything here is about finding, mapping or
/// carving up a region.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("shared memory: {0}")]
    Io(#[from] io::Error),

    #[error("region of {size} bytes cannot hold the {needed}-byte header")]
    TooSmall { size: usize, needed: usize },

    #[error("region is not a multicore-fifo region (magic {found:#018x})")]
    BadMagic { found: u64 },

    #[error("region layout version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("region mapping is not {align}-byte aligned")]
    Misaligned { align: usize },

    #[error("invalid channel capacity {0}: must be within 1..=65535")]
    InvalidCapacity(usize),

    #[error("all {0} channel entries are in use")]
    ChannelLimit(usize),

    #[error("channel band of {needed} bytes does not fit: {available} bytes left")]
    OutOfSpace { needed: usize, available: usize },

    #[error("channel {0} not found")]
    ChannelNotFound(u32),

    #[error("channel {0} already in use")]
    ChannelInUse(u32),
}

pub type Result<T> = std::result::Result<T, RegionError>;

/// A shared index word holds a position outside the ring, typically because
/// the side that owns it has not initialized it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{which} index {index} outside ring of {capacity} slots")]
pub struct IndexOutOfRange {
    pub which: &'static str,
    pub index: u16,
    pub capacity: u16,
}

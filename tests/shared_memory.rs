// Shared memory backend and region allocator tests for Linux
// Run with: cargo test --test shared_memory -- --nocapture

#[cfg(target_os = "linux")]
mod linux_tests {
    use multicore_fifo::Core::alloc::{band_size, header_size};
    use multicore_fifo::Core::{
        attach_shared_memory, create_shared_memory, unlink_shared_memory, RawHandle,
        RegionAllocator, SharedMemoryBackend,
    };
    use multicore_fifo::SPSC::Ring::layout::MAX_CHANNELS;
    use multicore_fifo::SPSC::Ring::{RingQueue, SlotStorage};
    use multicore_fifo::SPSC::Structs::Message;
    use multicore_fifo::RegionError;
    use serial_test::serial;

    /// Unlinks the region name when the test ends, pass or fail.
    struct Cleanup(&'static str);

    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = unlink_shared_memory(self.0);
        }
    }

    #[test]
    #[serial]
    fn test_create_and_attach_backend() {
        let name = "mcf_test_backend";
        let _cleanup = Cleanup(name);

        let shm = create_shared_memory(name, 4096).unwrap();
        assert_eq!(shm.size(), 4096);
        assert!(!shm.as_ptr().is_null());
        match shm.raw_handle() {
            RawHandle::Fd(fd) => assert!(fd > 0, "File descriptor should be positive"),
        }

        unsafe { *shm.as_ptr().add(100) = 0x42 };

        let other = attach_shared_memory(name, 4096).unwrap();
        assert_eq!(other.size(), 4096);
        assert_eq!(unsafe { *other.as_ptr().add(100) }, 0x42);

        // Writes through one mapping are visible through the other
        unsafe { *other.as_ptr().add(200) = 0x24 };
        assert_eq!(unsafe { *shm.as_ptr().add(200) }, 0x24);
    }

    #[test]
    #[serial]
    fn test_attach_missing_or_short_region_fails() {
        let name = "mcf_test_short";
        let _cleanup = Cleanup(name);
        let _ = unlink_shared_memory(name);

        let err = attach_shared_memory(name, 4096).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);

        let _shm = create_shared_memory(name, 1024).unwrap();
        let err = attach_shared_memory(name, 4096).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    #[serial]
    fn test_region_header_and_attach() {
        let name = "mcf_test_region";
        let _cleanup = Cleanup(name);

        let region = RegionAllocator::new(name, 64 * 1024).unwrap();
        println!("Region: {:#?}", region);
        assert!(region.is_initialized());
        assert_eq!(region.channel_count(), 0);
        assert_eq!(region.used_memory(), header_size());
        assert_eq!(region.header_ptr() as usize % 128, 0);

        let channel = region.create_channel(32).unwrap();
        assert_eq!(channel.id(), 0);
        assert_eq!(channel.capacity, 32);

        let attached = RegionAllocator::attach(name).unwrap();
        assert!(attached.is_initialized());
        assert_eq!(attached.channel_count(), 1);
        let seen = attached.get_channel(0).unwrap();
        assert_eq!(seen.capacity, 32);
        assert_eq!(seen.band_offset(), channel.band_offset());
    }

    #[test]
    #[serial]
    fn test_region_too_small_for_header() {
        let err = RegionAllocator::new("mcf_test_tiny", 256).unwrap_err();
        assert!(matches!(err, RegionError::TooSmall { .. }), "{err}");
    }

    #[test]
    #[serial]
    fn test_attach_rejects_foreign_region() {
        let name = "mcf_test_foreign";
        let _cleanup = Cleanup(name);

        // Right size, but never laid out as a region: magic reads as zero
        let _shm = create_shared_memory(name, header_size() + 4096).unwrap();
        let err = RegionAllocator::attach(name).unwrap_err();
        assert!(matches!(err, RegionError::BadMagic { found: 0 }), "{err}");
    }

    #[test]
    #[serial]
    fn test_channels_do_not_overlap() {
        let name = "mcf_test_overlap";
        let _cleanup = Cleanup(name);
        let region = RegionAllocator::new(name, 256 * 1024).unwrap();

        let a = region.create_channel(100).unwrap();
        let b = region.create_channel(7).unwrap();
        let c = region.create_channel_at(10, 1000).unwrap();

        let mut bands: Vec<(usize, usize)> = [&a, &b, &c]
            .iter()
            .map(|p| (p.band_offset(), p.band_offset() + band_size(p.capacity as usize)))
            .collect();
        bands.sort();
        for pair in bands.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "bands overlap: {:?}", pair);
        }
        for (start, _) in &bands {
            assert!(*start >= header_size());
            assert_eq!(start % 128, 0);
        }
        assert_eq!(region.channel_count(), 3);
        assert_eq!(region.channels().len(), 3);
    }

    #[test]
    #[serial]
    fn test_channel_queues_are_independent() {
        let name = "mcf_test_independent";
        let _cleanup = Cleanup(name);
        let region = RegionAllocator::new(name, 64 * 1024).unwrap();

        let mut left = RingQueue::send_only(region.create_channel(8).unwrap());
        let mut right = RingQueue::send_only(region.create_channel(8).unwrap());
        left.send_u16(1, 1);
        left.send_u16(1, 2);
        right.send_u16(2, 3);

        let mut got = Vec::new();
        let mut rx = RingQueue::receive_only(region.get_channel(0).unwrap(), |m: &Message| {
            got.push(m.payload.as_u16())
        });
        assert_eq!(rx.drain(), 2);
        drop(rx);
        assert_eq!(got, vec![1, 2]);
        assert_eq!(right.pending(), 1);
        assert_eq!(right.storage().slots().len(), 8);
    }

    #[test]
    #[serial]
    fn test_channel_errors() {
        let name = "mcf_test_errors";
        let _cleanup = Cleanup(name);
        let region = RegionAllocator::new(name, header_size() + band_size(64)).unwrap();

        assert!(matches!(region.create_channel(0), Err(RegionError::InvalidCapacity(0))));
        assert!(matches!(
            region.create_channel(70_000),
            Err(RegionError::InvalidCapacity(70_000))
        ));
        assert!(matches!(region.get_channel(3), Err(RegionError::ChannelNotFound(3))));
        assert!(matches!(
            region.get_channel(MAX_CHANNELS as u32),
            Err(RegionError::ChannelNotFound(_))
        ));

        region.create_channel_at(3, 64).unwrap();
        assert!(matches!(region.create_channel_at(3, 8), Err(RegionError::ChannelInUse(3))));
        assert!(matches!(region.create_channel(8), Err(RegionError::OutOfSpace { .. })));
        assert_eq!(region.available_memory(), 0);
    }

    #[test]
    #[serial]
    fn test_remove_channel_frees_entry_and_band() {
        let name = "mcf_test_remove";
        let _cleanup = Cleanup(name);
        let region = RegionAllocator::new(name, header_size() + band_size(64)).unwrap();

        let first = region.create_channel(64).unwrap();
        let offset = first.band_offset();
        drop(first);

        region.remove_channel(0).unwrap();
        assert_eq!(region.channel_count(), 0);
        assert!(matches!(region.remove_channel(0), Err(RegionError::ChannelNotFound(0))));

        let again = region.create_channel(64).unwrap();
        assert_eq!(again.band_offset(), offset);
        let queue = RingQueue::send_only(again);
        assert_eq!((queue.head(), queue.tail()), (0, 0));
    }

    #[test]
    #[serial]
    fn test_reused_band_is_cleared_under_a_live_partition() {
        let name = "mcf_test_reuse_live";
        let _cleanup = Cleanup(name);
        let region = RegionAllocator::new(name, header_size() + band_size(8)).unwrap();

        let mut stale = RingQueue::send_only(region.create_channel(8).unwrap());
        for i in 0..5 {
            stale.send_u32(7, 0xDEAD_0000 + i);
        }
        let offset = stale.storage().band_offset();

        region.remove_channel(0).unwrap();
        let fresh = region.create_channel(8).unwrap();
        assert_eq!(fresh.band_offset(), offset);

        // The old partition still maps the band and reads the cleared slots
        assert!(stale.storage().slots().iter().all(|s| s.load() == Message::default()));

        let mut got = Vec::new();
        let mut queue = RingQueue::send_receive(fresh, |m: &Message| got.push((m.id, m.payload.as_u32())));
        queue.send_u32(1, 42);
        assert_eq!(queue.drain(), 1);
        drop(queue);
        assert_eq!(got, vec![(1, 42)]);
    }

    #[test]
    #[serial]
    fn test_channel_table_limit() {
        let name = "mcf_test_limit";
        let _cleanup = Cleanup(name);
        let region = RegionAllocator::new(name, header_size() + MAX_CHANNELS * band_size(1) + 4096).unwrap();

        for _ in 0..MAX_CHANNELS {
            region.create_channel(1).unwrap();
        }
        assert!(matches!(
            region.create_channel(1),
            Err(RegionError::ChannelLimit(n)) if n == MAX_CHANNELS
        ));
    }

    #[test]
    #[serial]
    fn test_partition_outlives_allocator() {
        let name = "mcf_test_outlive";
        let _cleanup = Cleanup(name);

        let channel = {
            let region = RegionAllocator::new(name, 64 * 1024).unwrap();
            region.create_channel(4).unwrap()
        };
        let mut queue = RingQueue::send_receive(channel, |_m: &Message| {});
        queue.send_f32(1, 1.0);
        assert_eq!(queue.drain(), 1);
    }
}

// Run with: cargo run --example blocking_consumer -- [channel_id]
// Sleeps on the channel doorbell between drains instead of spinning.
use multicore_fifo::Core::SharedMemory::region_path;
use multicore_fifo::SPSC::Structs::Message;
use multicore_fifo::SPSC::ChannelBuilder;
use std::env;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    multicore_fifo::init_tracing();

    let args: Vec<String> = env::args().collect();
    let channel_id: u32 = args.get(1).map(|s| s.parse::<u32>()).transpose()?.unwrap_or(0);

    println!("Blocking Consumer: Connecting to channel {}", channel_id);

    let mut consumer = ChannelBuilder::new()
        .with_channel_id(channel_id)
        .build_consumer(|m: &Message| {
            println!("Received: id {} payload {:?}", m.id, m.payload);
        })?;

    println!("Blocking Consumer: Waiting for messages (Ctrl+C to stop)...");

    let mut idle_rounds = 0u32;
    loop {
        if consumer.drain_timeout(Duration::from_secs(1)) > 0 {
            idle_rounds = 0;
            continue;
        }
        idle_rounds += 1;
        if idle_rounds % 10 == 0 {
            println!("No messages for {} seconds", idle_rounds);
        }
        // The producer unlinks the region when it exits
        let path = region_path(consumer.allocator().name());
        if !std::path::Path::new(&path).exists() {
            println!("Blocking Consumer: Region gone, exiting");
            break;
        }
    }

    Ok(())
}

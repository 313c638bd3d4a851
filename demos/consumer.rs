// Run with: cargo run --example consumer -- <expected_messages> [channel_id]
// Polls the channel created by the producer demo.
use multicore_fifo::SPSC::Structs::Message;
use multicore_fifo::SPSC::ChannelBuilder;
use std::env;
use std::time::{Duration, Instant};

fn describe(message: &Message) -> String {
    let p = message.payload;
    match message.id {
        1 => format!("temperature {:.1}", p.as_f32()),
        2 => format!("sequence {}", p.as_u32()),
        3 => format!("delta {}", p.as_i16()),
        4 => format!("status {:#06x}", p.as_u16()),
        5 => format!("offset {}", p.as_i32()),
        id => format!("unknown id {} ({:?})", id, p),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    multicore_fifo::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <expected_messages> [channel_id]", args[0]);
        std::process::exit(1);
    }
    let expected_messages: usize = args[1].parse()?;
    let channel_id: u32 = args.get(2).map(|s| s.parse::<u32>()).transpose()?.unwrap_or(0);

    println!("Consumer: Waiting for channel {}...", channel_id);

    let mut received = 0usize;
    let mut consumer = match ChannelBuilder::new()
        .with_channel_id(channel_id)
        .build_consumer(|m: &Message| {
            received += 1;
            if received % 10_000 == 0 {
                println!("--- Received {} messages, last: {} ---", received, describe(m));
            }
        }) {
        Ok(consumer) => {
            println!("Consumer: Found channel {}", consumer.channel_id());
            consumer
        }
        Err(e) => {
            eprintln!("Failed to create consumer: {}", e);
            return Ok(());
        }
    };

    let start = Instant::now();
    let mut total = 0usize;
    let mut last_progress = Instant::now();

    while total < expected_messages {
        let drained = consumer.drain();
        if drained > 0 {
            total += drained;
            last_progress = Instant::now();
        } else {
            if last_progress.elapsed() > Duration::from_secs(5) {
                eprintln!("Timeout waiting for messages");
                break;
            }
            std::thread::yield_now();
        }
    }

    let elapsed = start.elapsed();
    println!("Consumer: Received {} messages in {:.2?}", total, elapsed);
    println!(
        "Average: {:.2} messages/second",
        total as f64 / elapsed.as_secs_f64()
    );
    if total == expected_messages {
        println!("All messages received successfully");
    }
    Ok(())
}

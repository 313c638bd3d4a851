// Run with: cargo run --example producer -- <num_messages> [--auto-exit]
// then, in another terminal: cargo run --example consumer -- <num_messages>
use multicore_fifo::SPSC::ChannelBuilder;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// Message ids agreed with the consumer demos
const ID_TEMPERATURE: u16 = 1; // f32, degrees C
const ID_SEQUENCE: u16 = 2; // u32
const ID_DELTA: u16 = 3; // i16
const ID_STATUS: u16 = 4; // u16
const ID_OFFSET: u16 = 5; // i32

fn main() -> Result<(), Box<dyn std::error::Error>> {
    multicore_fifo::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <num_messages> [--auto-exit]", args[0]);
        std::process::exit(1);
    }

    let num_messages: u32 = args[1].parse()?;
    let auto_exit = args.get(2).map(|s| s == "--auto-exit").unwrap_or(false);

    let mut producer = ChannelBuilder::new()
        .with_channel_id(0)
        .with_doorbell(true)
        .build_producer()?;
    let capacity = producer.capacity();

    let keep_alive = Arc::new(AtomicBool::new(true));
    let keep_alive_for_handler = Arc::clone(&keep_alive);

    // Handle Ctrl+C to clean up
    ctrlc::set_handler(move || {
        keep_alive_for_handler.store(false, Ordering::SeqCst);
    })?;

    println!(
        "Producer: Created channel {} with {} slots",
        producer.channel_id(),
        capacity
    );
    println!("Producer: Sending {} readings...", num_messages);

    let start_send = Instant::now();
    let mut sent = 0u32;

    for i in 0..num_messages {
        if !keep_alive.load(Ordering::SeqCst) {
            break;
        }

        // The queue overwrites when full; hold back until the consumer has
        // caught up far enough that nothing is lost.
        while producer.queue().pending() + 1 >= capacity {
            if !keep_alive.load(Ordering::SeqCst) {
                break;
            }
            std::thread::sleep(Duration::from_micros(10));
        }

        match i % 5 {
            0 => producer.send_f32(ID_TEMPERATURE, 20.0 + (i % 100) as f32 * 0.1),
            1 => producer.send_u32(ID_SEQUENCE, i),
            2 => producer.send_i16(ID_DELTA, (i % 200) as i16 - 100),
            3 => producer.send_u16(ID_STATUS, (i & 0xFFFF) as u16),
            _ => producer.send_i32(ID_OFFSET, -(i as i32)),
        }
        sent += 1;
        if sent % 10_000 == 0 {
            println!("Sent {} messages", sent);
        }
    }

    let send_time = start_send.elapsed();
    println!("Producer: Sent {} messages in {:.2?}", sent, send_time);
    println!(
        "Producer: Throughput: {:.2} messages/sec",
        sent as f64 / send_time.as_secs_f64()
    );

    if auto_exit {
        // In auto-exit mode, just wait a bit for messages to be consumed
        println!("Producer: Auto-exit mode, waiting 2 seconds for consumer...");
        std::thread::sleep(Duration::from_secs(2));
    } else {
        println!("Waiting for consumer to finish processing (press Ctrl+C to exit)...");
        while keep_alive.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    println!("Producer: Shutting down");
    producer.allocator().unlink()?;
    Ok(())
}

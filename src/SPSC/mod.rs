mod builder;
mod consumer;
pub mod handler;
mod producer;

pub use builder::ChannelBuilder;
pub use consumer::Consumer;
pub use handler::{Handler, NoHandler};
pub use producer::Producer;

pub mod Ring {
    pub mod Ring;
    pub mod Ring_impl;
    pub mod layout;
    pub use Ring::{
        advance, Mode, QueueConfig, QueueStorage, RingQueue, SlotStorage, MAX_CAPACITY,
        START_INDEX,
    }; // re-export for stable path
}

pub mod Structs {
    pub mod Message_Structs;
    pub use Message_Structs::{Message, Payload, Slot}; // re-export for stable path
}

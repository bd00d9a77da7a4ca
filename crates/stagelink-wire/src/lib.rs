//! Wire objects and framing for the stagelink command channel.
//!
//! Everything that crosses the pipe is a [`Payload`] (a parsed command,
//! a [`Message`] reply, a text notice, or the shutdown sentinel) encoded
//! as one wire item. A logical message is a run of payload items closed
//! by an end-of-message marker item; the receiver groups items back into
//! batches at the markers.

pub mod codec;
pub mod error;
pub mod message;
pub mod payload;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_item, encode_item, WireConfig, WireItem, DEFAULT_MAX_ITEM_SIZE, HEADER_SIZE, MAGIC,
};
pub use error::{Result, WireError};
pub use message::Message;
pub use payload::{Payload, COUNTER_GREETING, GREETING};
pub use reader::{Drained, ItemReader};
pub use writer::ItemWriter;

//! The stagelink command channel.
//!
//! A [`Channel`] carries validated commands from the operator process to
//! the device process and structured replies back. The pipe transport
//! owns the handshake state machine and the end-of-message framing; the
//! serial transport is a raw byte pipe sharing the same trait.
//!
//! One channel end is owned by exactly one caller. Threads that must
//! share an end (a UI thread issuing commands while a poller drains
//! replies) wrap it in a [`SharedChannel`].

pub mod channel;
pub mod config;
pub mod error;
pub mod pipe;
pub mod shared;

#[cfg(feature = "serial")]
pub mod serial;

pub use channel::{AnyChannel, Channel, HandshakeState, Role};
pub use config::ChannelConfig;
pub use error::{ChannelError, Result};
pub use pipe::PipeChannel;
pub use shared::SharedChannel;

#[cfg(feature = "serial")]
pub use serial::SerialChannel;

//! Byte-level transports for the stagelink command channel.
//!
//! Two transports are provided:
//! - a full-duplex pipe between the operator and device processes
//!   ([`PipeEndpoint`], connected in-process via [`PipeEndpoint::pair`] or
//!   across processes via [`PipeListener`]);
//! - a raw serial line ([`SerialLine`], behind the `serial` feature).
//!
//! This is the lowest layer. The channel layer owns each transport handle
//! exclusively; nothing else reads or writes it directly.

pub mod endpoint;
pub mod error;

#[cfg(unix)]
pub mod listener;

#[cfg(feature = "serial")]
pub mod serial;

pub use endpoint::PipeEndpoint;
pub use error::{Result, TransportError};

#[cfg(unix)]
pub use listener::PipeListener;

#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialLine};

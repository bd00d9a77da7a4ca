//! Command channel for remotely operated lab positioning hardware.
//!
//! stagelink carries validated G-code-style commands from an operator
//! process to a device process over a handshaked, framed duplex pipe,
//! with a raw serial line as the alternate transport.
//!
//! # Crate Structure
//!
//! - [`gcode`] — Command table, parser, and validation
//! - [`transport`] — Pipe endpoints and serial lines
//! - [`wire`] — Payload objects, replies, and end-of-message framing
//! - [`channel`] — The channel trait and its pipe/serial implementations

/// Re-export parser types.
pub mod gcode {
    pub use stagelink_gcode::*;
}

/// Re-export transport types.
pub mod transport {
    pub use stagelink_transport::*;
}

/// Re-export wire types.
pub mod wire {
    pub use stagelink_wire::*;
}

/// Re-export channel types.
pub mod channel {
    pub use stagelink_channel::*;
}

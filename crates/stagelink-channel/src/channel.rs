use stagelink_wire::Payload;

use crate::error::Result;
use crate::pipe::PipeChannel;

#[cfg(feature = "serial")]
use crate::serial::SerialChannel;

/// Which side of the pipe handshake this end plays.
///
/// Only meaningful for the pipe transport: the initiator opens the
/// greeting exchange, the responder answers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// Lifecycle of the pipe handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// No greeting exchange has run yet.
    Uninitialized,
    /// A greeting exchange is in flight.
    Handshaking,
    /// The exchange completed; ordinary traffic is allowed.
    Ready,
    /// The exchange exhausted its attempt budget or saw unexpected data.
    Failed,
}

/// Operations every transport implements.
///
/// The other end may vanish at any time; every operation surfaces that as
/// a typed error rather than hanging. `receive`/`message_waiting`/
/// `is_connected` never block and are safe to poll, provided the polling
/// loop sleeps between iterations.
pub trait Channel {
    /// Establish the underlying transport; idempotent while open.
    fn connect(&mut self) -> Result<()>;

    /// Close the underlying transport; idempotent.
    fn disconnect(&mut self) -> Result<()>;

    /// Whether the transport is currently usable. Derived from the
    /// transport handle, never a cached flag.
    fn is_connected(&mut self) -> bool;

    /// Run the greeting exchange. Must complete before `send`/`receive`
    /// on transports that have one.
    fn handshake(&mut self) -> Result<()>;

    /// Whether a handshake has completed on this end.
    fn handshake_complete(&self) -> bool;

    /// Which handshake side this end plays.
    fn role(&self) -> Role;

    /// Deliver one payload to the peer. Never blocks past the configured
    /// retry budget.
    fn send(&mut self, payload: &Payload) -> Result<()>;

    /// Deliver several payloads as one logical message where the
    /// transport supports it; otherwise one by one.
    fn send_batch(&mut self, payloads: &[Payload]) -> Result<()> {
        for payload in payloads {
            self.send(payload)?;
        }
        Ok(())
    }

    /// Non-blocking probe-then-read: the next complete message if one is
    /// buffered, `None` otherwise.
    fn receive(&mut self) -> Result<Option<Vec<Payload>>>;

    /// Non-blocking probe: whether at least one complete message is
    /// ready.
    fn message_waiting(&mut self) -> Result<bool>;

    /// Request an orderly shutdown of the peer.
    fn send_sentinel(&mut self) -> Result<()> {
        self.send(&Payload::Sentinel)
    }
}

/// A channel over whichever transport was selected at construction time.
#[derive(Debug)]
pub enum AnyChannel {
    Pipe(PipeChannel),
    #[cfg(feature = "serial")]
    Serial(SerialChannel),
}

macro_rules! delegate {
    ($self:ident, $channel:ident => $body:expr) => {
        match $self {
            AnyChannel::Pipe($channel) => $body,
            #[cfg(feature = "serial")]
            AnyChannel::Serial($channel) => $body,
        }
    };
}

impl Channel for AnyChannel {
    fn connect(&mut self) -> Result<()> {
        delegate!(self, channel => channel.connect())
    }

    fn disconnect(&mut self) -> Result<()> {
        delegate!(self, channel => channel.disconnect())
    }

    fn is_connected(&mut self) -> bool {
        delegate!(self, channel => channel.is_connected())
    }

    fn handshake(&mut self) -> Result<()> {
        delegate!(self, channel => channel.handshake())
    }

    fn handshake_complete(&self) -> bool {
        delegate!(self, channel => channel.handshake_complete())
    }

    fn role(&self) -> Role {
        delegate!(self, channel => channel.role())
    }

    fn send(&mut self, payload: &Payload) -> Result<()> {
        delegate!(self, channel => channel.send(payload))
    }

    fn send_batch(&mut self, payloads: &[Payload]) -> Result<()> {
        delegate!(self, channel => channel.send_batch(payloads))
    }

    fn receive(&mut self) -> Result<Option<Vec<Payload>>> {
        delegate!(self, channel => channel.receive())
    }

    fn message_waiting(&mut self) -> Result<bool> {
        delegate!(self, channel => channel.message_waiting())
    }
}

impl From<PipeChannel> for AnyChannel {
    fn from(channel: PipeChannel) -> Self {
        AnyChannel::Pipe(channel)
    }
}

#[cfg(feature = "serial")]
impl From<SerialChannel> for AnyChannel {
    fn from(channel: SerialChannel) -> Self {
        AnyChannel::Serial(channel)
    }
}

use std::time::Duration;

use crate::channel::HandshakeState;

/// Errors raised by channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] stagelink_transport::TransportError),

    /// Wire-level error.
    #[error("wire error: {0}")]
    Wire(#[from] stagelink_wire::WireError),

    /// The greeting exchange did not complete.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// This transport has no handshake protocol; calling it is a caller
    /// error.
    #[error("handshake is not supported on the {0} transport")]
    HandshakeUnsupported(&'static str),

    /// `send`/`receive` used before the handshake reached `Ready`.
    #[error("channel not ready for traffic (handshake state {0:?})")]
    HandshakeIncomplete(HandshakeState),

    /// The channel has no open transport handle.
    #[error("channel is not connected")]
    NotConnected,

    /// The peer closed its end of the transport.
    #[error("peer closed the transport")]
    TransportClosed,

    /// The peer stopped accepting bytes within the retry budget.
    #[error("send timed out after {0:?}")]
    SendTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, ChannelError>;

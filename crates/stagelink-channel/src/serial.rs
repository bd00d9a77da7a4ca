use std::io::{Read, Write};

use tracing::debug;

use stagelink_transport::{SerialConfig, SerialLine, TransportError};
use stagelink_wire::Payload;

use crate::channel::{Channel, Role};
use crate::error::{ChannelError, Result};

/// The serial transport: raw byte send/receive, no framing protocol.
///
/// Each `send` writes one JSON-encoded payload; each `receive` decodes at
/// most one. There is no handshake state machine on this transport;
/// calling `handshake` is a caller error.
pub struct SerialChannel {
    line: Option<SerialLine>,
    config: SerialConfig,
    role: Role,
    /// Bytes read off the line that do not yet form a complete payload.
    rx: Vec<u8>,
}

impl SerialChannel {
    /// Create a channel for `config` without opening the port yet.
    pub fn new(config: SerialConfig, role: Role) -> SerialChannel {
        SerialChannel {
            line: None,
            config,
            role,
            rx: Vec::new(),
        }
    }

    /// Create a channel and open the port immediately.
    pub fn open(config: SerialConfig, role: Role) -> Result<SerialChannel> {
        let mut channel = Self::new(config, role);
        channel.connect()?;
        Ok(channel)
    }

    /// The serial parameters this channel was built with.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn line_mut(&mut self) -> Result<&mut SerialLine> {
        self.line.as_mut().ok_or(ChannelError::NotConnected)
    }

    /// Pull whatever the port buffered into `rx`.
    fn fill_rx(&mut self) -> Result<()> {
        let pending = match self.line.as_ref() {
            None => return Err(ChannelError::NotConnected),
            Some(line) => line.bytes_to_read()?,
        };
        if pending == 0 {
            return Ok(());
        }

        let mut chunk = vec![0u8; pending];
        let line = self.line_mut()?;
        let read = line.read(&mut chunk).map_err(TransportError::Io)?;
        self.rx.extend_from_slice(&chunk[..read]);
        Ok(())
    }
}

impl Channel for SerialChannel {
    fn connect(&mut self) -> Result<()> {
        if self.line.is_some() {
            return Ok(());
        }
        self.line = Some(SerialLine::open(self.config.clone())?);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        if self.line.take().is_some() {
            debug!(port = %self.config.port, "closed serial line");
        }
        self.rx.clear();
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        // Probe the port; a vanished device fails the ioctl.
        match &self.line {
            Some(line) => line.bytes_to_read().is_ok(),
            None => false,
        }
    }

    fn handshake(&mut self) -> Result<()> {
        Err(ChannelError::HandshakeUnsupported("serial"))
    }

    fn handshake_complete(&self) -> bool {
        false
    }

    fn role(&self) -> Role {
        self.role
    }

    fn send(&mut self, payload: &Payload) -> Result<()> {
        let encoded = serde_json::to_vec(payload).map_err(stagelink_wire::WireError::Json)?;
        let line = self.line_mut()?;
        line.write_all(&encoded).map_err(TransportError::Io)?;
        line.flush().map_err(TransportError::Io)?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Vec<Payload>>> {
        self.fill_rx()?;
        match decode_one(&mut self.rx)? {
            Some(payload) => Ok(Some(vec![payload])),
            None => Ok(None),
        }
    }

    fn message_waiting(&mut self) -> Result<bool> {
        let pending = match self.line.as_ref() {
            None => return Err(ChannelError::NotConnected),
            Some(line) => line.bytes_to_read()?,
        };
        Ok(pending > 0 || !self.rx.is_empty())
    }
}

/// Decode exactly one payload from the front of `rx`, consuming its bytes.
///
/// Incomplete trailing data is left in place for the next call.
fn decode_one(rx: &mut Vec<u8>) -> Result<Option<Payload>> {
    if rx.is_empty() {
        return Ok(None);
    }

    let mut stream = serde_json::Deserializer::from_slice(rx).into_iter::<Payload>();
    match stream.next() {
        Some(Ok(payload)) => {
            let consumed = stream.byte_offset();
            rx.drain(..consumed);
            Ok(Some(payload))
        }
        Some(Err(err)) if err.is_eof() => Ok(None),
        Some(Err(err)) => Err(stagelink_wire::WireError::Json(err).into()),
        None => Ok(None),
    }
}

impl std::fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialChannel")
            .field("port", &self.config.port)
            .field("role", &self.role)
            .field("connected", &self.line.is_some())
            .finish()
    }
}

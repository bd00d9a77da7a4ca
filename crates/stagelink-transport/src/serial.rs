use std::io::{Read, Write};
use std::time::Duration;

use tracing::info;

use crate::error::{Result, TransportError};

/// Serial line parameters.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Port path, e.g. `/dev/ttyUSB0`.
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Read timeout for blocking reads.
    pub timeout: Duration,
}

impl SerialConfig {
    /// Config with the default read timeout.
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            timeout: Duration::from_millis(100),
        }
    }
}

/// An open serial line.
///
/// A thin byte pipe: no framing, no handshake. The channel layer encodes
/// one payload per write and decodes at most one per read.
pub struct SerialLine {
    port: Box<dyn serialport::SerialPort>,
    config: SerialConfig,
}

impl SerialLine {
    /// Open the port described by `config`.
    pub fn open(config: SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|source| TransportError::SerialOpen {
                port: config.port.clone(),
                source,
            })?;
        info!(port = %config.port, baud = config.baud_rate, "opened serial line");
        Ok(Self { port, config })
    }

    /// Number of bytes waiting in the receive buffer.
    pub fn bytes_to_read(&self) -> Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    /// The parameters this line was opened with.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl Read for SerialLine {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialLine {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl std::fmt::Debug for SerialLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLine")
            .field("port", &self.config.port)
            .field("baud_rate", &self.config.baud_rate)
            .finish()
    }
}

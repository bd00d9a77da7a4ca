use std::io::{Read, Write};

use crate::error::Result;

/// One end of a full-duplex pipe — implements Read + Write.
///
/// Wraps a Unix domain socket stream. Endpoints come in connected pairs:
/// either from [`PipeEndpoint::pair`] (threads sharing one process) or
/// from a [`crate::PipeListener`] accept/connect exchange (separate
/// processes).
pub struct PipeEndpoint {
    inner: PipeEndpointInner,
}

enum PipeEndpointInner {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for PipeEndpoint {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            PipeEndpointInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for PipeEndpoint {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            PipeEndpointInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            PipeEndpointInner::Unix(stream) => stream.flush(),
        }
    }
}

impl PipeEndpoint {
    /// Wrap a Unix stream in a pipe endpoint.
    #[cfg(unix)]
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: PipeEndpointInner::Unix(stream),
        }
    }

    /// Create a connected endpoint pair within one process.
    #[cfg(unix)]
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = std::os::unix::net::UnixStream::pair()?;
        Ok((Self::from_unix(left), Self::from_unix(right)))
    }

    /// Switch the endpoint between blocking and non-blocking mode.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            PipeEndpointInner::Unix(stream) => {
                stream.set_nonblocking(nonblocking).map_err(Into::into)
            }
        }
    }

    /// Try to clone this endpoint (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            PipeEndpointInner::Unix(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_unix(cloned))
            }
        }
    }

    /// Shut down both directions of the pipe.
    ///
    /// A peer that was never connected or is already gone is not an error
    /// here; disconnect must be idempotent.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            PipeEndpointInner::Unix(stream) => {
                match stream.shutdown(std::net::Shutdown::Both) {
                    Ok(()) => Ok(()),
                    Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }
}

impl std::fmt::Debug for PipeEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            #[cfg(unix)]
            PipeEndpointInner::Unix(_) => {
                f.debug_struct("PipeEndpoint").field("type", &"unix").finish()
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn pair_is_full_duplex() {
        let (mut left, mut right) = PipeEndpoint::pair().unwrap();

        left.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        right.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        right.write_all(b"pong").unwrap();
        left.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"pong");
    }

    #[test]
    fn nonblocking_read_reports_would_block() {
        let (mut left, _right) = PipeEndpoint::pair().unwrap();
        left.set_nonblocking(true).unwrap();

        let mut buf = [0u8; 8];
        let err = left.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);
    }

    #[test]
    fn read_after_peer_shutdown_reports_eof() {
        let (mut left, right) = PipeEndpoint::pair().unwrap();
        right.shutdown().unwrap();
        drop(right);

        let mut buf = [0u8; 8];
        assert_eq!(left.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let (left, _right) = PipeEndpoint::pair().unwrap();
        left.shutdown().unwrap();
        left.shutdown().unwrap();
    }
}

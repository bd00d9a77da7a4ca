use std::io::{ErrorKind, Write};

use bytes::{Buf, BytesMut};

use crate::codec::{encode_item, WireConfig, WireItem};
use crate::error::{Result, WireError};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes wire items to any `Write` stream.
///
/// Bytes that could not be written yet stay queued, so a caller on a
/// non-blocking stream can retry [`ItemWriter::flush_pending`] on its own
/// schedule instead of spinning here. Retry policy (how often, how long)
/// belongs to the channel layer.
pub struct ItemWriter<T> {
    inner: T,
    pending: BytesMut,
    config: WireConfig,
}

impl<T: Write> ItemWriter<T> {
    /// Create an item writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, WireConfig::default())
    }

    /// Create an item writer with explicit configuration.
    pub fn with_config(inner: T, config: WireConfig) -> Self {
        Self {
            inner,
            pending: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode an item onto the pending queue without touching the stream.
    pub fn queue(&mut self, item: &WireItem) -> Result<()> {
        encode_item(item, &mut self.pending, self.config.max_item_size)
    }

    /// Encode and write one item, flushing the queue.
    pub fn send(&mut self, item: &WireItem) -> Result<()> {
        self.queue(item)?;
        self.flush_pending()
    }

    /// Write as much of the pending queue as the stream accepts.
    ///
    /// On `WouldBlock` the unwritten remainder stays queued and the error
    /// is surfaced so the caller can retry later. A zero-length write
    /// means the peer is gone.
    pub fn flush_pending(&mut self) -> Result<()> {
        while !self.pending.is_empty() {
            match self.inner.write(&self.pending) {
                Ok(0) => return Err(WireError::ConnectionClosed),
                Ok(n) => self.pending.advance(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }
    }

    /// Whether unwritten bytes remain queued.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

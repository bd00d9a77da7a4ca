use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_item, WireConfig, WireItem};
use crate::error::{Result, WireError};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Everything a non-blocking drain pass produced.
#[derive(Debug, Default)]
pub struct Drained {
    /// Complete items decoded, in arrival order.
    pub items: Vec<WireItem>,
    /// True if the stream reported end-of-file during the pass.
    pub closed: bool,
}

/// Reads complete wire items from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete items.
pub struct ItemReader<T> {
    inner: T,
    buf: BytesMut,
    config: WireConfig,
}

impl<T: Read> ItemReader<T> {
    /// Create an item reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, WireConfig::default())
    }

    /// Create an item reader with explicit configuration.
    pub fn with_config(inner: T, config: WireConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete item (blocking).
    ///
    /// Returns `Err(WireError::ConnectionClosed)` when EOF is reached.
    pub fn read_item(&mut self) -> Result<WireItem> {
        loop {
            if let Some(item) = decode_item(&mut self.buf, self.config.max_item_size)? {
                return Ok(item);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            };

            if read == 0 {
                return Err(WireError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Drain whatever is currently buffered without blocking.
    ///
    /// Pulls bytes from the stream until it would block (or hits EOF) and
    /// decodes every complete item. Partial trailing bytes stay buffered
    /// for the next pass. Intended for streams in non-blocking mode; a
    /// read timeout is treated the same as would-block.
    pub fn drain_available(&mut self) -> Result<Drained> {
        let mut drained = Drained::default();

        loop {
            while let Some(item) = decode_item(&mut self.buf, self.config.max_item_size)? {
                drained.items.push(item);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    drained.closed = true;
                    break;
                }
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock
                        || err.kind() == ErrorKind::TimedOut =>
                {
                    break;
                }
                Err(err) => return Err(WireError::Io(err)),
            }
        }

        while let Some(item) = decode_item(&mut self.buf, self.config.max_item_size)? {
            drained.items.push(item);
        }

        Ok(drained)
    }

    /// Whether undecoded bytes remain buffered.
    pub fn has_buffered_bytes(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::{encode_item, DEFAULT_MAX_ITEM_SIZE, MAGIC};
    use crate::payload::Payload;

    fn wire_with(items: &[WireItem]) -> BytesMut {
        let mut wire = BytesMut::new();
        for item in items {
            encode_item(item, &mut wire, DEFAULT_MAX_ITEM_SIZE).unwrap();
        }
        wire
    }

    #[test]
    fn read_single_item() {
        let wire = wire_with(&[WireItem::Payload(Payload::Text("hello".into()))]);
        let mut reader = ItemReader::new(Cursor::new(wire.to_vec()));

        let item = reader.read_item().unwrap();
        assert_eq!(item, WireItem::Payload(Payload::Text("hello".into())));
    }

    #[test]
    fn read_message_batch_in_order() {
        let wire = wire_with(&[
            WireItem::Payload(Payload::Text("one".into())),
            WireItem::Payload(Payload::Text("two".into())),
            WireItem::EndOfMessage,
        ]);
        let mut reader = ItemReader::new(Cursor::new(wire.to_vec()));

        assert_eq!(
            reader.read_item().unwrap(),
            WireItem::Payload(Payload::Text("one".into()))
        );
        assert_eq!(
            reader.read_item().unwrap(),
            WireItem::Payload(Payload::Text("two".into()))
        );
        assert_eq!(reader.read_item().unwrap(), WireItem::EndOfMessage);
    }

    #[test]
    fn eof_reports_connection_closed() {
        let mut reader = ItemReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_item().unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
    }

    #[test]
    fn partial_reads_reassemble() {
        let wire = wire_with(&[WireItem::Payload(Payload::Text("slow".into()))]);
        let mut reader = ItemReader::new(ByteByByteReader {
            bytes: wire.to_vec(),
            pos: 0,
        });

        let item = reader.read_item().unwrap();
        assert_eq!(item, WireItem::Payload(Payload::Text("slow".into())));
    }

    #[test]
    fn drain_collects_everything_buffered() {
        let wire = wire_with(&[
            WireItem::Payload(Payload::Text("a".into())),
            WireItem::EndOfMessage,
            WireItem::Payload(Payload::Text("b".into())),
        ]);
        let mut reader = ItemReader::new(WouldBlockAfterData {
            bytes: wire.to_vec(),
            pos: 0,
        });

        let drained = reader.drain_available().unwrap();
        assert_eq!(drained.items.len(), 3);
        assert!(!drained.closed);
        assert!(!reader.has_buffered_bytes());
    }

    #[test]
    fn drain_holds_partial_trailing_item() {
        let mut wire = wire_with(&[WireItem::Payload(Payload::Text("full".into()))]);
        let mut extra = wire_with(&[WireItem::Payload(Payload::Text("partial".into()))]);
        extra.truncate(extra.len() - 3);
        wire.extend_from_slice(&extra);

        let mut reader = ItemReader::new(WouldBlockAfterData {
            bytes: wire.to_vec(),
            pos: 0,
        });

        let drained = reader.drain_available().unwrap();
        assert_eq!(drained.items.len(), 1);
        assert!(reader.has_buffered_bytes());
    }

    #[test]
    fn drain_reports_eof() {
        let wire = wire_with(&[WireItem::EndOfMessage]);
        let mut reader = ItemReader::new(Cursor::new(wire.to_vec()));

        let drained = reader.drain_available().unwrap();
        assert_eq!(drained.items, vec![WireItem::EndOfMessage]);
        assert!(drained.closed);
    }

    #[test]
    fn drain_propagates_decode_errors() {
        let bytes = vec![0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let mut reader = ItemReader::new(Cursor::new(bytes));
        let err = reader.drain_available().unwrap_err();
        assert!(matches!(err, WireError::InvalidMagic));
    }

    #[test]
    fn interrupted_read_retries() {
        let wire = wire_with(&[WireItem::EndOfMessage]);
        let mut reader = ItemReader::new(InterruptedThenData {
            interrupted: false,
            bytes: wire.to_vec(),
            pos: 0,
        });

        assert_eq!(reader.read_item().unwrap(), WireItem::EndOfMessage);
    }

    #[test]
    fn oversized_item_in_stream_rejected() {
        let mut wire = BytesMut::new();
        wire.extend_from_slice(&MAGIC);
        wire.extend_from_slice(&1024u32.to_le_bytes());
        wire.extend_from_slice(&[0x00]);

        let config = WireConfig { max_item_size: 16 };
        let mut reader = ItemReader::with_config(Cursor::new(wire.to_vec()), config);
        let err = reader.read_item().unwrap_err();
        assert!(matches!(err, WireError::ItemTooLarge { .. }));
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct WouldBlockAfterData {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for WouldBlockAfterData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() {
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}

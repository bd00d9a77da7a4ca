use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, WireError};
use crate::payload::Payload;

/// Item header: magic (2) + length (4) + kind (1) = 7 bytes.
pub const HEADER_SIZE: usize = 7;

/// Magic bytes: "SL" (0x53 0x4C).
pub const MAGIC: [u8; 2] = [0x53, 0x4C];

/// Default maximum item body size: 1 MiB.
///
/// Commands and replies are small; anything near this limit is a protocol
/// violation, not data.
pub const DEFAULT_MAX_ITEM_SIZE: usize = 1024 * 1024;

const KIND_PAYLOAD: u8 = 0x00;
const KIND_END_OF_MESSAGE: u8 = 0x01;

/// One decoded unit of the object stream.
#[derive(Debug, Clone, PartialEq)]
pub enum WireItem {
    /// A payload object.
    Payload(Payload),
    /// The marker closing one logical message.
    EndOfMessage,
}

impl WireItem {
    fn kind(&self) -> u8 {
        match self {
            WireItem::Payload(_) => KIND_PAYLOAD,
            WireItem::EndOfMessage => KIND_END_OF_MESSAGE,
        }
    }
}

/// Configuration for the wire codec.
#[derive(Debug, Clone)]
pub struct WireConfig {
    /// Maximum item body size in bytes.
    pub max_item_size: usize,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            max_item_size: DEFAULT_MAX_ITEM_SIZE,
        }
    }
}

/// Encode one wire item into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬───────────┬───────────┬──────────────────┐
/// │ Magic (2B) │ Length    │ Kind (1B) │ Body             │
/// │ 0x53 0x4C  │ (4B LE)   │           │ (Length bytes)   │
/// │ "SL"       │           │           │ JSON payload     │
/// └────────────┴───────────┴───────────┴──────────────────┘
/// ```
/// End-of-message markers carry an empty body.
pub fn encode_item(item: &WireItem, dst: &mut BytesMut, max_item_size: usize) -> Result<()> {
    let body = match item {
        WireItem::Payload(payload) => serde_json::to_vec(payload)?,
        WireItem::EndOfMessage => Vec::new(),
    };

    if body.len() > max_item_size {
        return Err(WireError::ItemTooLarge {
            size: body.len(),
            max: max_item_size,
        });
    }

    dst.reserve(HEADER_SIZE + body.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(body.len() as u32);
    dst.put_u8(item.kind());
    dst.put_slice(&body);
    Ok(())
}

/// Decode one wire item from a buffer.
///
/// Returns `Ok(None)` if the buffer does not hold a complete item yet.
/// On success, consumes the item bytes from the buffer.
pub fn decode_item(src: &mut BytesMut, max_item_size: usize) -> Result<Option<WireItem>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    if src[0..2] != MAGIC {
        return Err(WireError::InvalidMagic);
    }

    let body_len = u32::from_le_bytes(src[2..6].try_into().unwrap()) as usize;
    let kind = src[6];

    if body_len > max_item_size {
        return Err(WireError::ItemTooLarge {
            size: body_len,
            max: max_item_size,
        });
    }

    let total = HEADER_SIZE + body_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let body = src.split_to(body_len);

    match kind {
        KIND_PAYLOAD => {
            let payload: Payload = serde_json::from_slice(&body)?;
            Ok(Some(WireItem::Payload(payload)))
        }
        KIND_END_OF_MESSAGE => Ok(Some(WireItem::EndOfMessage)),
        other => Err(WireError::UnknownKind(other)),
    }
}

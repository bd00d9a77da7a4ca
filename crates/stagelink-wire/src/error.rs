/// Errors raised while encoding or decoding wire items.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The item header carries an invalid magic number.
    #[error("invalid wire magic (expected 0x534C \"SL\")")]
    InvalidMagic,

    /// The item header carries an unrecognized item kind.
    #[error("unknown wire item kind 0x{0:02X}")]
    UnknownKind(u8),

    /// The item body exceeds the configured maximum size.
    #[error("wire item too large ({size} bytes, max {max})")]
    ItemTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing items.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The pipe closed before a complete item was received.
    #[error("connection closed (incomplete wire item)")]
    ConnectionClosed,

    /// The item body is not a valid payload encoding.
    #[error("payload encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WireError>;

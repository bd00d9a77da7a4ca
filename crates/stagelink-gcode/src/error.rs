use crate::table::CommandId;

/// Broad failure classes for callers that branch on the error family
/// rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The line or a token is malformed; nothing was applied.
    Syntax,
    /// A token is well-formed but not allowed by the command table.
    Validation,
    /// The same symbol was assigned twice under one command id.
    Duplicate,
}

/// Errors raised while parsing and validating a command line.
#[derive(Debug, thiserror::Error)]
pub enum GcodeError {
    /// The line contains no tokens.
    #[error("empty command line")]
    EmptyLine,

    /// A token is not `<letter><value>` shaped (empty values included).
    #[error("malformed token '{token}'")]
    MalformedToken { token: String },

    /// The leading token names no command in the table.
    #[error("unknown command '{token}'")]
    UnknownCommand { token: String },

    /// An attribute or axis token appeared before any command token.
    #[error("'{token}' appears before any command")]
    LeadingAttribute { token: String },

    /// The command does not accept this attribute symbol.
    #[error("command {command} does not accept attribute '{symbol}'")]
    AttributeNotAllowed { command: CommandId, symbol: char },

    /// The command does not accept this axis symbol.
    #[error("axis '{symbol}' is not accepted by command {command}")]
    AxisNotAllowed { command: CommandId, symbol: char },

    /// The same symbol was given twice under one command id.
    #[error("duplicate symbol '{symbol}' for command {command}")]
    DuplicateSymbol { command: CommandId, symbol: char },

    /// The value text does not coerce to any accepted type.
    #[error("invalid value '{text}' for symbol '{symbol}'")]
    InvalidValue { symbol: char, text: String },
}

impl GcodeError {
    /// The broad failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GcodeError::EmptyLine | GcodeError::MalformedToken { .. } => ErrorKind::Syntax,
            GcodeError::UnknownCommand { .. }
            | GcodeError::LeadingAttribute { .. }
            | GcodeError::AttributeNotAllowed { .. }
            | GcodeError::AxisNotAllowed { .. }
            | GcodeError::InvalidValue { .. } => ErrorKind::Validation,
            GcodeError::DuplicateSymbol { .. } => ErrorKind::Duplicate,
        }
    }
}

pub type Result<T> = std::result::Result<T, GcodeError>;

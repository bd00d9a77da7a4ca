//! G-code command parsing and validation.
//!
//! Operator input is a single text line of space-separated tokens. The
//! parser checks every token against a static command table before
//! anything is allowed near the hardware dispatch layer: unknown command
//! ids, disallowed attributes or axes, duplicate symbols, and badly typed
//! values are all rejected with typed errors.
//!
//! The command grammar follows the Marlin convention: a command id is a
//! letter followed by digits (`G0`, `M112`), attributes and axes are a
//! single uppercase letter carrying one value (`X10.5`, `S1`).

pub mod error;
pub mod parser;
pub mod table;

pub use error::{ErrorKind, GcodeError, Result};
pub use parser::{is_valid, parse_line, ParsedLine, Value};
pub use table::{AttributeSpec, AxisClass, CommandId, ValueKind};

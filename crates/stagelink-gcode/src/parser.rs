//! Command line parsing.
//!
//! A line is split on whitespace and walked left to right. Command id
//! tokens open a new entry; attribute and axis tokens attach to the most
//! recent command id, after the table confirms the command accepts them.
//! Any violation rejects the whole line.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GcodeError, Result};
use crate::table::{
    is_attribute_symbol, is_axis_symbol, AttributeSpec, CommandId, ValueKind,
};

/// Value types axes carry (numeric only).
const AXIS_VALUE_KINDS: &[ValueKind] = &[ValueKind::Int, ValueKind::Float];

/// A typed attribute or axis value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// One validated command line: command ids mapped to their symbol/value
/// assignments.
///
/// Immutable once returned by [`parse_line`]. Ordering is stable so two
/// parses of the same line compare equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedLine(BTreeMap<CommandId, BTreeMap<char, Value>>);

impl ParsedLine {
    /// The command ids present in this line.
    pub fn commands(&self) -> impl Iterator<Item = CommandId> + '_ {
        self.0.keys().copied()
    }

    /// The symbol/value assignments for one command, if present.
    pub fn get(&self, id: CommandId) -> Option<&BTreeMap<char, Value>> {
        self.0.get(&id)
    }

    /// Whether the line carries no commands.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct command ids.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(command, assignments)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (CommandId, &BTreeMap<char, Value>)> {
        self.0.iter().map(|(id, map)| (*id, map))
    }
}

/// Parse and validate one command line.
///
/// A line may carry several independent commands (`"M112 M113 S1"`); the
/// result aggregates all of them. The first violation rejects the whole
/// line; earlier valid tokens are never partially applied.
pub fn parse_line(line: &str) -> Result<ParsedLine> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(GcodeError::EmptyLine);
    }

    let mut parsed = ParsedLine::default();
    let mut current: Option<CommandId> = None;

    for token in tokens {
        let lead = match token.chars().next() {
            Some(c) if c.is_ascii_alphabetic() => c,
            _ => {
                return Err(GcodeError::MalformedToken {
                    token: token.to_string(),
                })
            }
        };

        if is_attribute_symbol(lead) || is_axis_symbol(lead) {
            let value_text = &token[1..];
            if value_text.is_empty() {
                return Err(GcodeError::MalformedToken {
                    token: token.to_string(),
                });
            }
            let command = current.ok_or_else(|| GcodeError::LeadingAttribute {
                token: token.to_string(),
            })?;
            let value = check_symbol(command, lead, value_text)?;
            let assignments = parsed.0.entry(command).or_default();
            if assignments.contains_key(&lead) {
                return Err(GcodeError::DuplicateSymbol {
                    command,
                    symbol: lead,
                });
            }
            assignments.insert(lead, value);
        } else if let Some(id) = CommandId::lookup(token) {
            parsed.0.entry(id).or_default();
            current = Some(id);
        } else {
            return Err(GcodeError::UnknownCommand {
                token: token.to_string(),
            });
        }
    }

    Ok(parsed)
}

/// Check `symbol` against `command`'s table entry and coerce its value.
fn check_symbol(command: CommandId, symbol: char, value_text: &str) -> Result<Value> {
    match command.spec() {
        AttributeSpec::NoAttributes => Err(GcodeError::AttributeNotAllowed { command, symbol }),
        AttributeSpec::Axes(class) => {
            // Movement commands carry only axis letters.
            if is_attribute_symbol(symbol) {
                return Err(GcodeError::AttributeNotAllowed { command, symbol });
            }
            if !class.accepts(symbol) {
                return Err(GcodeError::AxisNotAllowed { command, symbol });
            }
            coerce_value(symbol, value_text, AXIS_VALUE_KINDS)
        }
        AttributeSpec::Named(specs) => {
            if is_axis_symbol(symbol) {
                return Err(GcodeError::AxisNotAllowed { command, symbol });
            }
            let kinds = specs
                .iter()
                .find(|(accepted, _)| *accepted == symbol)
                .map(|(_, kinds)| *kinds)
                .ok_or(GcodeError::AttributeNotAllowed { command, symbol })?;
            coerce_value(symbol, value_text, kinds)
        }
    }
}

/// Coerce a value text to the first accepted type that matches.
///
/// Precedence is bool, then integer, then float, so numeric literals keep
/// their narrowest reading.
fn coerce_value(symbol: char, text: &str, kinds: &[ValueKind]) -> Result<Value> {
    if kinds.contains(&ValueKind::Bool) {
        if let Some(flag) = parse_bool_literal(text) {
            return Ok(Value::Bool(flag));
        }
    }
    if kinds.contains(&ValueKind::Int) && !text.contains('.') {
        if let Ok(value) = text.parse::<i64>() {
            return Ok(Value::Int(value));
        }
    }
    if kinds.contains(&ValueKind::Float) {
        if let Ok(value) = text.parse::<f64>() {
            return Ok(Value::Float(value));
        }
    }
    Err(GcodeError::InvalidValue {
        symbol,
        text: text.to_string(),
    })
}

fn parse_bool_literal(text: &str) -> Option<bool> {
    match text {
        "1" => Some(true),
        "0" => Some(false),
        _ if text.eq_ignore_ascii_case("true") => Some(true),
        _ if text.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Whether `token` names a real command with a value attached.
///
/// True iff the token is a letter followed by one or more digits or
/// decimal points AND its leading letter+digit run is a command id from
/// the table. Bare axis letters are never valid on their own.
pub fn is_valid(token: &str) -> bool {
    let Some(lead) = token.chars().next() else {
        return false;
    };
    if !lead.is_ascii_alphabetic() {
        return false;
    }
    let rest = &token[1..];
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return false;
    }
    let digit_run = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digit_run == 0 {
        return false;
    }
    CommandId::lookup(&token[..1 + digit_run]).is_some()
}

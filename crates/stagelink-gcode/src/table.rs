//! Static command table.
//!
//! Every command the rig understands is listed here, together with the
//! attributes or axes it accepts and the value types each symbol allows.
//! A command missing from this table does not exist as far as the parser
//! is concerned; adding support for a new command starts with a new
//! variant here.

use serde::{Deserialize, Serialize};

/// All axis symbols understood by movement commands.
pub const AXIS_SYMBOLS: [char; 10] = ['X', 'Y', 'Z', 'H', 'J', 'K', 'L', 'N', 'O', 'P'];

/// Axes driven by the translation stages.
pub const LINEAR_AXES: [char; 6] = ['X', 'Y', 'Z', 'H', 'J', 'K'];

/// Axes driven by the mask rotator.
pub const ROTATIONAL_AXES: [char; 1] = ['L'];

/// Named attribute symbols. Movement commands never carry these.
pub const ATTRIBUTE_SYMBOLS: [char; 4] = ['S', 'I', 'R', 'A'];

/// Value types a named attribute may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
}

/// The axis subset a movement command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisClass {
    /// Translation axes only.
    Linear,
    /// Rotation axes only.
    Rotational,
    /// Any axis symbol.
    All,
}

impl AxisClass {
    /// The axis symbols belonging to this class.
    pub fn symbols(self) -> &'static [char] {
        match self {
            AxisClass::Linear => &LINEAR_AXES,
            AxisClass::Rotational => &ROTATIONAL_AXES,
            AxisClass::All => &AXIS_SYMBOLS,
        }
    }

    /// Whether `symbol` is an axis of this class.
    pub fn accepts(self, symbol: char) -> bool {
        self.symbols().contains(&symbol)
    }
}

/// What a command accepts after its id token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeSpec {
    /// The command stands alone; any trailing symbol is an error.
    NoAttributes,
    /// A movement command: axis letters from the given class, nothing else.
    Axes(AxisClass),
    /// Named attributes with their accepted value types.
    Named(&'static [(char, &'static [ValueKind])]),
}

/// Recognized command identifiers.
///
/// The closed set of instructions the device side will dispatch. Axis
/// commands (`Axes` spec) move hardware; `M` commands configure, query,
/// or stop it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CommandId {
    /// Linear move.
    G0,
    /// Rotational move.
    G1,
    /// Home all axes.
    G28,
    /// Absolute positioning mode.
    G90,
    /// Relative positioning mode.
    G91,
    /// Unconditional stop.
    M0,
    /// Set steps per unit for the given axes.
    M92,
    /// Temperature report.
    M105,
    /// Emergency stop.
    M112,
    /// Keepalive interval.
    M113,
    /// Position report.
    M114,
    /// Set bed temperature for a given element.
    M140,
    /// Auto-report position interval.
    M154,
    /// Auto-report temperature interval.
    M155,
    /// Jog the given axes.
    M811,
    /// Drive the given axes continuously.
    M812,
    /// Stop driving the given axes.
    M813,
    /// Stop all continuous drives.
    M814,
    /// Toggle the vacuum pump.
    M999,
}

impl CommandId {
    /// Every command in the table, in display order.
    pub const ALL: [CommandId; 19] = [
        CommandId::G0,
        CommandId::G1,
        CommandId::G28,
        CommandId::G90,
        CommandId::G91,
        CommandId::M0,
        CommandId::M92,
        CommandId::M105,
        CommandId::M112,
        CommandId::M113,
        CommandId::M114,
        CommandId::M140,
        CommandId::M154,
        CommandId::M155,
        CommandId::M811,
        CommandId::M812,
        CommandId::M813,
        CommandId::M814,
        CommandId::M999,
    ];

    /// Look up a command id by its textual form.
    pub fn lookup(token: &str) -> Option<CommandId> {
        CommandId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == token)
    }

    /// The textual form of this id (`"G0"`, `"M112"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            CommandId::G0 => "G0",
            CommandId::G1 => "G1",
            CommandId::G28 => "G28",
            CommandId::G90 => "G90",
            CommandId::G91 => "G91",
            CommandId::M0 => "M0",
            CommandId::M92 => "M92",
            CommandId::M105 => "M105",
            CommandId::M112 => "M112",
            CommandId::M113 => "M113",
            CommandId::M114 => "M114",
            CommandId::M140 => "M140",
            CommandId::M154 => "M154",
            CommandId::M155 => "M155",
            CommandId::M811 => "M811",
            CommandId::M812 => "M812",
            CommandId::M813 => "M813",
            CommandId::M814 => "M814",
            CommandId::M999 => "M999",
        }
    }

    /// What this command accepts after its id token.
    pub fn spec(self) -> AttributeSpec {
        const INT_OR_FLOAT: &[ValueKind] = &[ValueKind::Int, ValueKind::Float];
        const INT_ONLY: &[ValueKind] = &[ValueKind::Int];
        const BOOL_ONLY: &[ValueKind] = &[ValueKind::Bool];

        match self {
            CommandId::G0 => AttributeSpec::Axes(AxisClass::Linear),
            CommandId::G1 => AttributeSpec::Axes(AxisClass::Rotational),
            CommandId::M92 | CommandId::M811 | CommandId::M812 | CommandId::M813 => {
                AttributeSpec::Axes(AxisClass::All)
            }
            CommandId::M113 | CommandId::M154 | CommandId::M155 => {
                AttributeSpec::Named(&[('S', INT_OR_FLOAT)])
            }
            CommandId::M140 => AttributeSpec::Named(&[('I', INT_ONLY), ('S', INT_OR_FLOAT)]),
            CommandId::M999 => AttributeSpec::Named(&[('S', BOOL_ONLY)]),
            CommandId::G28
            | CommandId::G90
            | CommandId::G91
            | CommandId::M0
            | CommandId::M105
            | CommandId::M112
            | CommandId::M114
            | CommandId::M814 => AttributeSpec::NoAttributes,
        }
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommandId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandId::lookup(s).ok_or(())
    }
}

/// Whether `symbol` is a named attribute symbol.
pub fn is_attribute_symbol(symbol: char) -> bool {
    ATTRIBUTE_SYMBOLS.contains(&symbol)
}

/// Whether `symbol` is an axis symbol of any class.
pub fn is_axis_symbol(symbol: char) -> bool {
    AXIS_SYMBOLS.contains(&symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_every_table_entry() {
        for id in CommandId::ALL {
            assert_eq!(CommandId::lookup(id.as_str()), Some(id));
        }
    }

    #[test]
    fn lookup_rejects_unknown_ids() {
        assert_eq!(CommandId::lookup("G22222"), None);
        assert_eq!(CommandId::lookup("Q0"), None);
        assert_eq!(CommandId::lookup(""), None);
    }

    #[test]
    fn axis_commands_never_carry_named_attributes() {
        for id in CommandId::ALL {
            if let AttributeSpec::Axes(class) = id.spec() {
                for symbol in class.symbols() {
                    assert!(!is_attribute_symbol(*symbol));
                }
            }
        }
    }

    #[test]
    fn axis_classes_are_subsets_of_the_full_set() {
        for symbol in AxisClass::Linear.symbols() {
            assert!(AxisClass::All.accepts(*symbol));
        }
        for symbol in AxisClass::Rotational.symbols() {
            assert!(AxisClass::All.accepts(*symbol));
        }
        assert!(!AxisClass::Linear.accepts('L'));
        assert!(AxisClass::Rotational.accepts('L'));
    }

    #[test]
    fn command_id_serializes_as_its_textual_form() {
        let json = serde_json::to_string(&CommandId::M112).unwrap();
        assert_eq!(json, "\"M112\"");
        let back: CommandId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CommandId::M112);
    }
}

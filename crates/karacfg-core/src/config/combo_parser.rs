// Karacfg Script - Combo String Parser
// Parses combo strings like "left_command+left_shift+u" into structured components

use std::str::FromStr;

use crate::destination::Target;
use crate::{Combo, Key, Modifier};

/// Result of parsing a combo string
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCombo {
    /// The modifiers parsed from the string (in order, duplicates dropped)
    pub modifiers: Vec<Modifier>,
    /// The key (the last component)
    pub key: Key,
}

impl ParsedCombo {
    pub fn into_combo(self) -> Combo {
        Combo::new(self.modifiers, self.key)
    }
}

/// Errors that can occur during combo parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ComboParseError {
    /// Empty input string
    EmptyInput,
    /// Key name not recognized
    UnknownKey(String),
    /// Modifier name not recognized
    UnknownModifier(String),
    /// Input ends with a separator (e.g., "left_shift+")
    TrailingSeparator,
}

impl std::fmt::Display for ComboParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComboParseError::EmptyInput => write!(f, "combo string cannot be empty"),
            ComboParseError::UnknownKey(name) => write!(f, "unknown key name: '{}'", name),
            ComboParseError::UnknownModifier(name) => write!(f, "unknown modifier: '{}'", name),
            ComboParseError::TrailingSeparator => write!(f, "combo string cannot end with '+'"),
        }
    }
}

impl std::error::Error for ComboParseError {}

/// Parse a combo string like "left_command+left_shift+u" into modifiers and key
///
/// Modifiers may be given by modifier name (`left_command`, `lcmd`, `any`)
/// or by modifier-key name (`left_gui`, `left_alt`).
///
/// # Examples
/// ```
/// use karacfg_core::config::parse_combo_string;
/// use karacfg_core::{Key, Modifier};
/// let parsed = parse_combo_string("lcmd+a").unwrap();
/// assert_eq!(parsed.modifiers, vec![Modifier::LeftCommand]);
/// assert_eq!(parsed.key, Key::A);
/// ```
pub fn parse_combo_string(exp: &str) -> Result<ParsedCombo, ComboParseError> {
    let trimmed = exp.trim();
    if trimmed.is_empty() {
        return Err(ComboParseError::EmptyInput);
    }
    if trimmed.ends_with('+') {
        return Err(ComboParseError::TrailingSeparator);
    }

    let parts: Vec<&str> = trimmed.split('+').map(str::trim).collect();
    let (key_str, modifier_strs) = match parts.split_last() {
        Some(split) => split,
        None => return Err(ComboParseError::EmptyInput),
    };

    let key = Key::from_str(key_str).map_err(|_| ComboParseError::UnknownKey(key_str.to_string()))?;

    let mut modifiers = Vec::new();
    for modifier_str in modifier_strs {
        let modifier = parse_modifier(modifier_str)
            .ok_or_else(|| ComboParseError::UnknownModifier(modifier_str.to_string()))?;
        if !modifiers.contains(&modifier) {
            modifiers.push(modifier);
        }
    }

    Ok(ParsedCombo { modifiers, key })
}

/// Parse a destination string.
///
/// A string that parses as a combo becomes a key target with its modifiers;
/// anything else stays text and is classified at compile time.
pub fn parse_destination(exp: &str) -> (Target, Vec<Modifier>) {
    match parse_combo_string(exp) {
        Ok(parsed) => (Target::Key(parsed.key), parsed.modifiers),
        Err(_) => (Target::Text(exp.to_string()), Vec::new()),
    }
}

fn parse_modifier(name: &str) -> Option<Modifier> {
    Modifier::from_str(name)
        .ok()
        .or_else(|| Key::from_str(name).ok().and_then(|key| Modifier::try_from(key).ok()))
}

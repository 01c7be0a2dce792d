// Karacfg Modifier System
// Modifier identifiers and order-independent modifier sets

use std::fmt;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::Key;

/// A modifier as the host names it in `modifiers` lists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, IntoStaticStr, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Modifier {
    #[strum(to_string = "left_control", serialize = "lctrl", serialize = "left_ctrl")]
    LeftControl,
    #[strum(to_string = "left_option", serialize = "lalt", serialize = "left_alt")]
    LeftOption,
    #[strum(to_string = "left_command", serialize = "lcmd", serialize = "left_gui")]
    LeftCommand,
    #[strum(to_string = "left_shift", serialize = "lshift")]
    LeftShift,
    #[strum(to_string = "right_control", serialize = "rctrl", serialize = "right_ctrl")]
    RightControl,
    #[strum(to_string = "right_option", serialize = "ralt", serialize = "right_alt")]
    RightOption,
    #[strum(to_string = "right_command", serialize = "rcmd", serialize = "right_gui")]
    RightCommand,
    #[strum(to_string = "right_shift", serialize = "rshift")]
    RightShift,
    Any,
    Fn,
}

/// Error returned when a key cannot act as a modifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("key '{0}' is not a modifier")]
pub struct NotAModifier(pub Key);

impl Modifier {
    /// Get the wire name of this modifier
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// `any` is matched optionally; every other modifier is mandatory
    pub fn is_optional(self) -> bool {
        matches!(self, Modifier::Any)
    }
}

impl TryFrom<Key> for Modifier {
    type Error = NotAModifier;

    fn try_from(key: Key) -> Result<Self, Self::Error> {
        Ok(match key {
            Key::LeftControl => Modifier::LeftControl,
            Key::LeftOption | Key::LeftAlt => Modifier::LeftOption,
            Key::LeftCommand | Key::LeftGui => Modifier::LeftCommand,
            Key::LeftShift => Modifier::LeftShift,
            Key::RightControl => Modifier::RightControl,
            Key::RightOption | Key::RightAlt => Modifier::RightOption,
            Key::RightCommand | Key::RightGui => Modifier::RightCommand,
            Key::RightShift => Modifier::RightShift,
            Key::Fn => Modifier::Fn,
            other => return Err(NotAModifier(other)),
        })
    }
}

impl serde::Serialize for Modifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// An unordered set of modifiers.
///
/// Equality and hashing ignore order, so `[cmd, shift]` and `[shift, cmd]`
/// claim the same identity. Iteration keeps declaration order for output.
#[derive(Debug, Clone, Default)]
pub struct ModifierSet {
    modifiers: SmallVec<[Modifier; 4]>,
}

impl ModifierSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a modifier, ignoring duplicates
    pub fn insert(&mut self, modifier: Modifier) {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.modifiers.iter().copied()
    }

    /// Modifiers that must be held (everything except `any`)
    pub fn mandatory(&self) -> Vec<Modifier> {
        self.iter().filter(|m| !m.is_optional()).collect()
    }

    /// Modifiers that may be held (`any`)
    pub fn optional(&self) -> Vec<Modifier> {
        self.iter().filter(|m| m.is_optional()).collect()
    }

    fn sorted(&self) -> SmallVec<[Modifier; 4]> {
        let mut sorted = self.modifiers.clone();
        sorted.sort();
        sorted
    }
}

impl<I: Into<Modifier>> FromIterator<I> for ModifierSet {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        let mut set = ModifierSet::new();
        for modifier in iter {
            set.insert(modifier.into());
        }
        set
    }
}

impl From<&[Modifier]> for ModifierSet {
    fn from(modifiers: &[Modifier]) -> Self {
        modifiers.iter().copied().collect()
    }
}

impl<const N: usize> From<[Modifier; N]> for ModifierSet {
    fn from(modifiers: [Modifier; N]) -> Self {
        modifiers.into_iter().collect()
    }
}

impl PartialEq for ModifierSet {
    fn eq(&self, other: &Self) -> bool {
        self.sorted() == other.sorted()
    }
}

impl Eq for ModifierSet {}

impl Hash for ModifierSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted().hash(state);
    }
}

impl fmt::Display for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Modifier::name).collect();
        write!(f, "{}", names.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::str::FromStr;

    #[test]
    fn test_modifier_aliases() {
        assert_eq!(Modifier::from_str("lcmd").unwrap(), Modifier::LeftCommand);
        assert_eq!(Modifier::from_str("left_alt").unwrap(), Modifier::LeftOption);
        assert_eq!(Modifier::from_str("any").unwrap(), Modifier::Any);
        assert_eq!(Modifier::LeftOption.name(), "left_option");
    }

    #[test]
    fn test_modifier_from_key() {
        assert_eq!(Modifier::try_from(Key::LeftShift), Ok(Modifier::LeftShift));
        assert_eq!(Modifier::try_from(Key::RightGui), Ok(Modifier::RightCommand));
        assert_eq!(Modifier::try_from(Key::A), Err(NotAModifier(Key::A)));
    }

    #[test]
    fn test_set_order_independent() {
        let a = ModifierSet::from([Modifier::LeftCommand, Modifier::LeftShift]);
        let b = ModifierSet::from([Modifier::LeftShift, Modifier::LeftCommand]);
        assert_eq!(a, b);

        let mut seen = HashSet::new();
        seen.insert(a);
        assert!(seen.contains(&b));
    }

    #[test]
    fn test_set_ignores_duplicates_and_keeps_order() {
        let set = ModifierSet::from([Modifier::LeftShift, Modifier::LeftCommand, Modifier::LeftShift]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "left_shift+left_command");
    }

    #[test]
    fn test_mandatory_and_optional_split() {
        let set = ModifierSet::from([Modifier::Any, Modifier::LeftCommand]);
        assert_eq!(set.mandatory(), vec![Modifier::LeftCommand]);
        assert_eq!(set.optional(), vec![Modifier::Any]);
    }
}

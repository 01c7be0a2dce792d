// Karacfg Combo Type
// A source key together with the modifiers it is declared with

use std::fmt;

use crate::modifier::{Modifier, ModifierSet};
use crate::Key;

/// Represents a key combination with an unordered set of modifiers.
///
/// This is the identity a mapping claims in the identifier registry, so two
/// combos are equal whenever their key matches and their modifier sets match
/// regardless of declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combo {
    key: Key,
    modifiers: ModifierSet,
}

impl Combo {
    /// Create a new Combo from modifiers and a key
    ///
    /// # Arguments
    /// * `modifiers` - Iterator of modifiers
    /// * `key` - The key
    pub fn new(modifiers: impl IntoIterator<Item = Modifier>, key: Key) -> Self {
        Self {
            key,
            modifiers: modifiers.into_iter().collect(),
        }
    }

    /// Create a Combo without modifiers
    pub fn bare(key: Key) -> Self {
        Self {
            key,
            modifiers: ModifierSet::new(),
        }
    }

    /// Create a Combo from a single modifier and key
    pub fn from_single(modifier: Modifier, key: Key) -> Self {
        Self::new([modifier], key)
    }

    /// Get the key for this combo
    pub fn key(&self) -> Key {
        self.key
    }

    /// Get the modifiers for this combo
    pub fn modifiers(&self) -> &ModifierSet {
        &self.modifiers
    }

    /// Add a modifier to this combo
    pub fn with_modifier(&self, modifier: Modifier) -> Self {
        let mut modifiers = self.modifiers.clone();
        modifiers.insert(modifier);
        Self {
            key: self.key,
            modifiers,
        }
    }
}

impl From<Key> for Combo {
    fn from(key: Key) -> Self {
        Combo::bare(key)
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.key, self.modifiers)
        }
    }
}

// Karacfg Compile Errors
// Every violation found while validating or lowering a rule graph

use crate::{Combo, Key};

/// Why a destination could not be turned into an output event
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DestinationError {
    #[error("destination is blank")]
    Blank,

    #[error("modifiers cannot be attached to a {0} destination")]
    ModifiersOnNonKey(&'static str),

    #[error("simple modifications only accept key destinations")]
    NotAKey,
}

/// Compilation errors.
///
/// All of them are fatal: compilation stops at the first one and no output
/// is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The same key and modifier set was claimed twice in overlapping scopes
    #[error("Duplicate key combination: {combo} in {context}")]
    DuplicateKey { combo: Combo, context: String },

    /// A key is both mapped directly and used as a layer trigger
    #[error("Key conflict in rule \"{scope}\": key \"{key}\" cannot be both mapped and used as layer trigger")]
    KeyRoleConflict { key: Key, scope: String },

    /// A layer maps the key that triggers it
    #[error("Invalid mapping in layer \"{layer}\": cannot map key \"{key}\" within the same layer that is triggered by this key")]
    SelfMapping { key: Key, layer: String },

    /// A destination is neither a key, a mouse button nor a shell command
    #[error("Invalid destination {value:?} in {context}: {reason}")]
    InvalidDestination {
        value: String,
        context: String,
        reason: DestinationError,
    },

    /// Two different activation paths synthesize the same state variable
    #[error("Variable collision: \"{name}\" is produced by both \"{first}\" and \"{second}\"")]
    VariableCollision {
        name: String,
        first: String,
        second: String,
    },
}

pub type CompileResult<T> = Result<T, CompileError>;

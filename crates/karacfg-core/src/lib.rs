// Karacfg Core Library
// Rule graph, validation and lowering into the remapping host's configuration

pub mod combo;
pub mod compile;
pub mod config;
pub mod destination;
pub mod device;
pub mod error;
pub mod graph;
pub mod key;
pub mod mapping;
pub mod modifier;
pub mod output;
pub mod registry;

pub use combo::Combo;
pub use compile::Compiler;
pub use config::{parse_combo_string, ComboParseError, ParsedCombo, Script, ScriptError};
pub use destination::{open_app_command, osa_open_command, Destination, DestinationSpec, MouseButton, Target};
pub use device::{Device, DeviceId, DeviceIdentifiers, DevicePolarity};
pub use error::{CompileError, CompileResult, DestinationError};
pub use graph::{AloneKey, Config, Layer, Rule, RuleBased, Scope, SimpleKeyMap, StrictTiming, TriggerMode};
pub use key::Key;
pub use mapping::{
    BasedKeyMap, HoldAction, HoldInfo, HoldTiming, KeyMap, LayerKeyMap, MapBuilder, RuleKeyMap,
};
pub use modifier::{Modifier, ModifierSet, NotAModifier};
pub use output::{Condition, KarabinerConfig, Manipulator, ToEvent};
pub use registry::{IdentifierRegistry, ScopeKey};

// Karacfg Output Document
// Serializable shape of the host's configuration file

mod manipulator;

pub use manipulator::{
    Condition, DelayedAction, FromEvent, FromModifiers, Manipulator, Parameters, SetVariable,
    ToEvent,
};

use serde::Serialize;

use crate::device::DeviceIdentifiers;

/// The whole document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KarabinerConfig {
    pub global: Global,
    pub profiles: Vec<Profile>,
}

impl KarabinerConfig {
    /// Pretty-printed JSON, ready to be written out
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Every complex rule of the first profile
    pub fn rules(&self) -> &[ComplexRule] {
        self.profiles
            .first()
            .map(|profile| profile.complex_modifications.rules.as_slice())
            .unwrap_or(&[])
    }

    /// Every record of every complex rule, in emission order
    pub fn manipulators(&self) -> impl Iterator<Item = &Manipulator> {
        self.rules().iter().flat_map(|rule| rule.manipulators.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Global {
    pub show_in_menu_bar: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<ProfileDevice>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub simple_modifications: Vec<SimpleModification>,
    pub complex_modifications: ComplexModifications,
    pub virtual_hid_keyboard: VirtualHidKeyboard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileDevice {
    pub identifiers: DeviceIdentifiers,
    pub ignore: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleModification {
    pub from: FromEvent,
    pub to: ToEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplexModifications {
    pub rules: Vec<ComplexRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexRule {
    pub description: String,
    pub manipulators: Vec<Manipulator>,
}

impl ComplexRule {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            manipulators: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualHidKeyboard {
    pub keyboard_type_v2: &'static str,
}

impl Default for VirtualHidKeyboard {
    fn default() -> Self {
        Self {
            keyboard_type_v2: "ansi",
        }
    }
}

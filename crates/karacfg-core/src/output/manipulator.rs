// Karacfg Manipulator Records
// The flat event records the host evaluates, one per key map

use serde::Serialize;

use crate::destination::{Destination, MouseButton};
use crate::device::{DeviceIdentifiers, DevicePolarity};
use crate::{Key, Modifier, ModifierSet};

/// Source side of a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FromEvent {
    pub key_code: Key,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<FromModifiers>,
}

impl FromEvent {
    /// `{key_code, modifiers?}`: `any` is optional, every other modifier is mandatory
    pub fn new(key: Key, modifiers: &ModifierSet) -> Self {
        let modifiers = if modifiers.is_empty() {
            None
        } else {
            Some(FromModifiers {
                mandatory: modifiers.mandatory(),
                optional: modifiers.optional(),
            })
        };
        Self {
            key_code: key,
            modifiers,
        }
    }

    /// Matches the key whatever else is held
    pub fn any_modifiers(key: Key) -> Self {
        Self {
            key_code: key,
            modifiers: Some(FromModifiers {
                mandatory: Vec::new(),
                optional: vec![Modifier::Any],
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FromModifiers {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mandatory: Vec<Modifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub optional: Vec<Modifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetVariable {
    pub name: String,
    pub value: u8,
}

/// One output event
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_code: Option<Key>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointing_button: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_variable: Option<SetVariable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_down_milliseconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halt: Option<bool>,
}

impl ToEvent {
    pub fn key(key: Key, modifiers: &ModifierSet) -> Self {
        Self {
            key_code: Some(key),
            modifiers: modifiers.iter().collect(),
            ..Self::default()
        }
    }

    pub fn pointing(button: MouseButton) -> Self {
        Self {
            pointing_button: Some(button.name()),
            ..Self::default()
        }
    }

    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            shell_command: Some(command.into()),
            ..Self::default()
        }
    }

    pub fn set_variable(name: impl Into<String>, value: u8) -> Self {
        Self {
            set_variable: Some(SetVariable {
                name: name.into(),
                value,
            }),
            ..Self::default()
        }
    }

    pub fn hold_down(mut self, ms: Option<u64>) -> Self {
        self.hold_down_milliseconds = ms;
        self
    }

    /// Mark key events as halting; other events are left alone
    pub fn halted(mut self) -> Self {
        if self.key_code.is_some() {
            self.halt = Some(true);
        }
        self
    }
}

impl From<&Destination> for ToEvent {
    fn from(destination: &Destination) -> Self {
        match destination {
            Destination::Key { key, modifiers } => ToEvent::key(*key, modifiers),
            Destination::Pointing(button) => ToEvent::pointing(*button),
            Destination::Shell(command) => ToEvent::shell(command.clone()),
        }
    }
}

/// A guard on a record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    VariableIf { name: String, value: u8 },
    DeviceIf { identifiers: Vec<DeviceIdentifiers> },
    DeviceUnless { identifiers: Vec<DeviceIdentifiers> },
    DeviceExistsIf { identifiers: Vec<DeviceIdentifiers> },
    DeviceExistsUnless { identifiers: Vec<DeviceIdentifiers> },
}

impl Condition {
    pub fn variable(name: impl Into<String>, value: u8) -> Self {
        Condition::VariableIf {
            name: name.into(),
            value,
        }
    }

    pub fn device(polarity: DevicePolarity, identifiers: DeviceIdentifiers) -> Self {
        let identifiers = vec![identifiers];
        match polarity {
            DevicePolarity::If => Condition::DeviceIf { identifiers },
            DevicePolarity::Unless => Condition::DeviceUnless { identifiers },
            DevicePolarity::ExistsIf => Condition::DeviceExistsIf { identifiers },
            DevicePolarity::ExistsUnless => Condition::DeviceExistsUnless { identifiers },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayedAction {
    pub to_if_canceled: Vec<ToEvent>,
}

/// Per-record timing parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Parameters {
    #[serde(
        rename = "basic.to_if_alone_timeout_milliseconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub alone_timeout_ms: Option<u64>,
    #[serde(
        rename = "basic.to_if_held_down_threshold_milliseconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub held_down_threshold_ms: Option<u64>,
    #[serde(
        rename = "basic.to_delayed_action_delay_milliseconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub delayed_action_ms: Option<u64>,
}

/// One `basic` record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manipulator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub from: FromEvent,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<ToEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to_if_alone: Vec<ToEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to_if_held_down: Vec<ToEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to_after_key_up: Vec<ToEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_delayed_action: Option<DelayedAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

impl Manipulator {
    pub fn basic(from: FromEvent) -> Self {
        Self {
            description: None,
            kind: "basic",
            from,
            to: Vec::new(),
            to_if_alone: Vec::new(),
            to_if_held_down: Vec::new(),
            to_after_key_up: Vec::new(),
            to_delayed_action: None,
            conditions: Vec::new(),
            parameters: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn guarded(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    /// Whether the record is guarded by `name == value`
    pub fn requires(&self, name: &str, value: u8) -> bool {
        self.conditions.iter().any(|condition| {
            matches!(condition, Condition::VariableIf { name: n, value: v } if n == name && *v == value)
        })
    }
}

// Karacfg Script Parser - TOML with Serde
// Parses declarative rule scripts and builds a rule graph from them

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::device::{Device, DeviceIdentifiers, DevicePolarity};
use crate::graph::{Config, Layer, RuleBased, StrictTiming};
use crate::mapping::{HoldTiming, MapBuilder};
use crate::{Combo, DeviceId};

use super::combo_parser::{parse_combo_string, parse_destination};

/// Script errors
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid combo string {value:?} in {context}: {reason}")]
    InvalidCombo {
        value: String,
        context: String,
        reason: String,
    },

    #[error("Unknown device: {0}")]
    UnknownDevice(String),
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Profile name
    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(default)]
    pub show_in_menu_bar: bool,

    /// Device declarations, referenced by position or name
    #[serde(default, rename = "device")]
    pub devices: Vec<DeviceEntry>,

    /// One-to-one key substitutions
    #[serde(default, rename = "simple")]
    pub simples: Vec<SimpleEntry>,

    /// Flat rules
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleEntry>,

    /// Base keys with their maps and layers
    #[serde(default, rename = "base")]
    pub bases: Vec<BaseEntry>,
}

fn default_profile() -> String {
    "Default".to_string()
}

/// A device declaration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceEntry {
    pub name: Option<String>,
    pub vendor_id: Option<u32>,
    pub product_id: Option<u32>,
    pub is_keyboard: Option<bool>,
    pub is_pointing_device: Option<bool>,
    pub is_built_in_keyboard: Option<bool>,
    #[serde(default)]
    pub polarity: DevicePolarity,
    #[serde(default)]
    pub ignore: bool,
}

/// Reference to a declared device: its index or its name
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DeviceRef {
    Index(usize),
    Name(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimpleEntry {
    pub from: String,
    pub to: Option<String>,
    pub device: Option<DeviceRef>,
}

/// Per-rule hold timing
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HoldEntry {
    pub threshold_ms: Option<u64>,
    pub delayed_action_ms: Option<u64>,
    pub alone_timeout_ms: Option<u64>,
}

impl From<HoldEntry> for HoldTiming {
    fn from(entry: HoldEntry) -> Self {
        HoldTiming {
            threshold_ms: entry.threshold_ms,
            delayed_action_ms: entry.delayed_action_ms,
            alone_timeout_ms: entry.alone_timeout_ms,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleEntry {
    pub description: Option<String>,
    pub device: Option<DeviceRef>,
    pub hold: Option<HoldEntry>,
    #[serde(default)]
    pub map: Vec<RuleMapEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleMapEntry {
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
    pub description: Option<String>,
    /// Combo sent once held past the threshold
    pub hold: Option<String>,
    /// Shell command run once held past the threshold
    pub hold_shell: Option<String>,
    pub hold_threshold_ms: Option<u64>,
    pub hold_delayed_action_ms: Option<u64>,
    pub hold_alone_timeout_ms: Option<u64>,
}

/// Map entry shared by bases and layers
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopedMapEntry {
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub separate: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaseEntry {
    /// Base combo string
    pub key: String,
    pub description: Option<String>,
    pub device: Option<DeviceRef>,
    pub if_alone: Option<String>,
    pub alone_hold_ms: Option<u64>,
    /// Strict mode hold time; every `strict_*` override below defaults to it
    pub strict_ms: Option<u64>,
    pub strict_alone_timeout_ms: Option<u64>,
    pub strict_held_down_threshold_ms: Option<u64>,
    pub strict_delayed_action_ms: Option<u64>,
    /// Combo sent together with arming the base variable
    pub combo: Option<String>,
    #[serde(default)]
    pub map: Vec<ScopedMapEntry>,
    #[serde(default)]
    pub layer: Vec<LayerEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerEntry {
    pub key: String,
    pub description: Option<String>,
    #[serde(default)]
    pub separate: bool,
    #[serde(default)]
    pub map: Vec<ScopedMapEntry>,
    #[serde(default)]
    pub layer: Vec<LayerEntry>,
}

impl Script {
    /// Load a script from a TOML file
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ScriptError> {
        toml::from_str(content).map_err(|e| ScriptError::TomlParse(e.to_string()))
    }

    /// Build the rule graph this script describes
    pub fn to_config(&self) -> Result<Config, ScriptError> {
        let mut config = Config::new(self.profile.clone());
        config.show_in_menu_bar(self.show_in_menu_bar);

        let mut ids = Vec::with_capacity(self.devices.len());
        for entry in &self.devices {
            ids.push(config.device(entry.to_device()));
        }
        log::debug!("script declares {} devices", ids.len());

        for entry in &self.simples {
            let source = combo(&entry.from, "simple")?;
            let device = self.resolve_device(entry.device.as_ref(), &ids)?;
            let map = match device {
                Some(id) => config.on(id).map(source.key(), source.modifiers().iter()),
                None => config.map(source.key(), source.modifiers().iter()),
            };
            if let Some(to) = &entry.to {
                let (target, modifiers) = parse_destination(to);
                map.to_with(target, modifiers);
            }
        }

        for entry in &self.rules {
            let device = self.resolve_device(entry.device.as_ref(), &ids)?;
            let description = entry.description.clone().unwrap_or_default();
            let rule = match device {
                Some(id) => config.on(id).rule(description),
                None => config.rule(description),
            };
            if let Some(hold) = entry.hold {
                rule.set_on_hold(hold.into());
            }

            for map_entry in &entry.map {
                let source = combo(&map_entry.from, "rule map")?;
                let map = rule.map(source.key(), source.modifiers().iter());
                for to in &map_entry.to {
                    let (target, modifiers) = parse_destination(to);
                    map.to_with(target, modifiers);
                }
                if let Some(hold) = &map_entry.hold {
                    let hold = combo(hold, "hold")?;
                    map.on_hold(hold.key(), hold.modifiers().iter());
                }
                if let Some(command) = &map_entry.hold_shell {
                    map.on_hold_cmd(command.clone());
                }
                if let Some(ms) = map_entry.hold_threshold_ms {
                    map.hold_threshold_ms(ms);
                }
                if let Some(ms) = map_entry.hold_delayed_action_ms {
                    map.hold_delayed_action_ms(ms);
                }
                if let Some(ms) = map_entry.hold_alone_timeout_ms {
                    map.hold_alone_timeout_ms(ms);
                }
                if let Some(description) = &map_entry.description {
                    map.desc(description.clone());
                }
            }
        }

        for entry in &self.bases {
            let trigger = combo(&entry.key, "base")?;
            let device = self.resolve_device(entry.device.as_ref(), &ids)?;
            let base = match device {
                Some(id) => config.on(id).rule_base_by(trigger.key(), trigger.modifiers().iter()),
                None => config.rule_base_by(trigger.key(), trigger.modifiers().iter()),
            };
            entry.apply(base)?;
        }

        Ok(config)
    }

    fn resolve_device(
        &self,
        reference: Option<&DeviceRef>,
        ids: &[DeviceId],
    ) -> Result<Option<DeviceId>, ScriptError> {
        let Some(reference) = reference else {
            return Ok(None);
        };
        let index = match reference {
            DeviceRef::Index(index) => Some(*index),
            DeviceRef::Name(name) => self
                .devices
                .iter()
                .position(|device| device.name.as_deref() == Some(name.as_str())),
        };
        index
            .and_then(|index| ids.get(index).copied())
            .map(Some)
            .ok_or_else(|| ScriptError::UnknownDevice(reference.to_string()))
    }
}

impl std::fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceRef::Index(index) => write!(f, "#{}", index),
            DeviceRef::Name(name) => write!(f, "{}", name),
        }
    }
}

impl DeviceEntry {
    fn to_device(&self) -> Device {
        let identifiers = DeviceIdentifiers {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            is_keyboard: self.is_keyboard,
            is_pointing_device: self.is_pointing_device,
            is_built_in_keyboard: self.is_built_in_keyboard,
        };
        Device::new(identifiers)
            .polarity(self.polarity)
            .ignore(self.ignore)
    }
}

impl BaseEntry {
    /// Strict mode is on when the hold time or any single override is given
    fn strict_timing(&self) -> Option<StrictTiming> {
        let overrides = [
            self.strict_alone_timeout_ms,
            self.strict_held_down_threshold_ms,
            self.strict_delayed_action_ms,
        ];
        if self.strict_ms.is_none() && overrides.iter().all(Option::is_none) {
            return None;
        }

        let hold = self.strict_ms.map(StrictTiming::new).unwrap_or_default();
        Some(StrictTiming {
            alone_timeout_ms: self.strict_alone_timeout_ms,
            held_down_threshold_ms: self.strict_held_down_threshold_ms,
            delayed_action_ms: self.strict_delayed_action_ms,
            ..hold
        })
    }

    fn apply(&self, base: &mut RuleBased) -> Result<(), ScriptError> {
        if let Some(description) = &self.description {
            base.desc(description.clone());
        }
        if let Some(alone) = &self.if_alone {
            let alone = combo(alone, "if_alone")?;
            match self.alone_hold_ms {
                Some(ms) => base.if_alone_hold(alone.key(), ms),
                None => base.if_alone(alone.key()),
            };
        }
        if let Some(timing) = self.strict_timing() {
            base.strict_timing(timing);
        }
        if let Some(target) = &self.combo {
            let target = combo(target, "combo")?;
            base.map_to(target.key(), target.modifiers().iter());
        }

        for entry in &self.map {
            let source = combo(&entry.from, "base map")?;
            let map = base.map(source.key(), source.modifiers().iter());
            for to in &entry.to {
                let (target, modifiers) = parse_destination(to);
                map.to_with(target, modifiers);
            }
            if let Some(description) = &entry.description {
                map.desc(description.clone());
            }
            if entry.separate {
                map.separate();
            }
        }

        for entry in &self.layer {
            let key = combo(&entry.key, "layer")?.key();
            entry.apply(base.layer(key))?;
        }
        Ok(())
    }
}

impl LayerEntry {
    fn apply(&self, layer: &mut Layer) -> Result<(), ScriptError> {
        if let Some(description) = &self.description {
            layer.desc(description.clone());
        }
        if self.separate {
            layer.separate();
        }

        for entry in &self.map {
            let source = combo(&entry.from, "layer map")?;
            let map = layer.map(source.key(), source.modifiers().iter());
            for to in &entry.to {
                let (target, modifiers) = parse_destination(to);
                map.to_with(target, modifiers);
            }
            if let Some(description) = &entry.description {
                map.desc(description.clone());
            }
            if entry.separate {
                map.separate();
            }
        }

        for entry in &self.layer {
            let key = combo(&entry.key, "layer")?.key();
            entry.apply(layer.layer(key))?;
        }
        Ok(())
    }
}

fn combo(value: &str, context: &str) -> Result<Combo, ScriptError> {
    parse_combo_string(value)
        .map(|parsed| parsed.into_combo())
        .map_err(|e| ScriptError::InvalidCombo {
            value: value.to_string(),
            context: context.to_string(),
            reason: e.to_string(),
        })
}

// Karacfg Rule Graph
// The in-memory tree a configuration is built into before compilation

pub mod based;
pub mod rule;

pub use based::{AloneKey, Layer, RuleBased, StrictTiming, TriggerMode};
pub use rule::Rule;

use crate::compile::Compiler;
use crate::destination::{DestinationSpec, Target};
use crate::error::CompileResult;
use crate::output::KarabinerConfig;
use crate::{Combo, Device, DeviceId, Key, Modifier};

/// A one-to-one key substitution
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleKeyMap {
    source: Combo,
    device: Option<DeviceId>,
    destination: Option<DestinationSpec>,
}

impl SimpleKeyMap {
    fn new(source: Combo, device: Option<DeviceId>) -> Self {
        Self {
            source,
            device,
            destination: None,
        }
    }

    /// Set the destination, replacing any earlier one
    pub fn to(&mut self, target: impl Into<Target>) -> &mut Self {
        self.to_with(target, [])
    }

    pub fn to_with(
        &mut self,
        target: impl Into<Target>,
        modifiers: impl IntoIterator<Item = Modifier>,
    ) -> &mut Self {
        self.destination = Some(DestinationSpec::new(target, modifiers));
        self
    }

    pub fn source(&self) -> &Combo {
        &self.source
    }

    pub fn device(&self) -> Option<DeviceId> {
        self.device
    }

    pub fn destination(&self) -> Option<&DestinationSpec> {
        self.destination.as_ref()
    }
}

/// Root of a configuration: one profile with its devices, rules and bases.
///
/// Build it through the fluent methods, then call [`Config::compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    profile_name: String,
    show_in_menu_bar: bool,
    devices: Vec<Device>,
    simples: Vec<SimpleKeyMap>,
    rules: Vec<Rule>,
    bases: Vec<RuleBased>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new("Default")
    }
}

impl Config {
    pub fn new(profile_name: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
            show_in_menu_bar: false,
            devices: Vec::new(),
            simples: Vec::new(),
            rules: Vec::new(),
            bases: Vec::new(),
        }
    }

    pub fn show_in_menu_bar(&mut self, show: bool) -> &mut Self {
        self.show_in_menu_bar = show;
        self
    }

    /// Declare a device and get a handle for scoping rules to it
    pub fn device(&mut self, device: impl Into<Device>) -> DeviceId {
        self.devices.push(device.into());
        DeviceId(self.devices.len() - 1)
    }

    /// Builders whose rules only apply to `device`
    pub fn on(&mut self, device: DeviceId) -> Scope<'_> {
        Scope {
            config: self,
            device: Some(device),
        }
    }

    /// A flat rule for every device; an empty description means none
    pub fn rule(&mut self, description: impl Into<String>) -> &mut Rule {
        self.scope().rule(description)
    }

    /// A base key for every device
    pub fn rule_base_by(
        &mut self,
        key: Key,
        modifiers: impl IntoIterator<Item = Modifier>,
    ) -> &mut RuleBased {
        self.scope().rule_base_by(key, modifiers)
    }

    /// A simple substitution for every device
    pub fn map(&mut self, key: Key, modifiers: impl IntoIterator<Item = Modifier>) -> &mut SimpleKeyMap {
        self.scope().map(key, modifiers)
    }

    fn scope(&mut self) -> Scope<'_> {
        Scope {
            config: self,
            device: None,
        }
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn shows_in_menu_bar(&self) -> bool {
        self.show_in_menu_bar
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device_of(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id.0)
    }

    pub fn simples(&self) -> &[SimpleKeyMap] {
        &self.simples
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn bases(&self) -> &[RuleBased] {
        &self.bases
    }

    /// Validate and lower this configuration with a fresh compiler
    pub fn compile(&self) -> CompileResult<KarabinerConfig> {
        Compiler::new().compile(self)
    }
}

/// Builders bound to one device scope (or to every device)
pub struct Scope<'a> {
    config: &'a mut Config,
    device: Option<DeviceId>,
}

impl<'a> Scope<'a> {
    pub fn rule(self, description: impl Into<String>) -> &'a mut Rule {
        let Scope { config, device } = self;
        let description: String = description.into();
        let rules = &mut config.rules;
        rules.push(Rule::new(
            (!description.is_empty()).then_some(description),
            device,
        ));
        let index = rules.len() - 1;
        &mut rules[index]
    }

    pub fn rule_base_by(
        self,
        key: Key,
        modifiers: impl IntoIterator<Item = Modifier>,
    ) -> &'a mut RuleBased {
        let Scope { config, device } = self;
        let bases = &mut config.bases;
        bases.push(RuleBased::new(Combo::new(modifiers, key), device));
        let index = bases.len() - 1;
        &mut bases[index]
    }

    pub fn map(self, key: Key, modifiers: impl IntoIterator<Item = Modifier>) -> &'a mut SimpleKeyMap {
        let Scope { config, device } = self;
        let simples = &mut config.simples;
        simples.push(SimpleKeyMap::new(Combo::new(modifiers, key), device));
        let index = simples.len() - 1;
        &mut simples[index]
    }
}

// Karacfg Base Keys and Layers
// A held base key arms a variable; layers nest beneath it

use crate::mapping::{BasedKeyMap, LayerKeyMap};
use crate::{Combo, DeviceId, Key, Modifier};

/// Hold duration used by strict mode when none is given (milliseconds)
pub const DEFAULT_STRICT_HOLD_MS: u64 = 150;

/// Hold-down duration attached to an alone key set with `if_alone` (milliseconds)
pub const DEFAULT_ALONE_HOLD_MS: u64 = 100;

/// Key emitted when a base key is tapped without another key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AloneKey {
    pub key: Key,
    pub hold_down_ms: Option<u64>,
}

impl Default for AloneKey {
    fn default() -> Self {
        Self {
            key: Key::Escape,
            hold_down_ms: None,
        }
    }
}

/// Timing of a strict-mode trigger (milliseconds).
///
/// Every unset parameter follows `hold_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictTiming {
    pub hold_ms: u64,
    pub alone_timeout_ms: Option<u64>,
    pub held_down_threshold_ms: Option<u64>,
    pub delayed_action_ms: Option<u64>,
}

impl StrictTiming {
    pub fn new(hold_ms: u64) -> Self {
        Self {
            hold_ms,
            alone_timeout_ms: None,
            held_down_threshold_ms: None,
            delayed_action_ms: None,
        }
    }

    pub fn alone_timeout_ms(mut self, ms: u64) -> Self {
        self.alone_timeout_ms = Some(ms);
        self
    }

    pub fn held_down_threshold_ms(mut self, ms: u64) -> Self {
        self.held_down_threshold_ms = Some(ms);
        self
    }

    pub fn delayed_action_ms(mut self, ms: u64) -> Self {
        self.delayed_action_ms = Some(ms);
        self
    }

    pub fn alone_timeout(&self) -> u64 {
        self.alone_timeout_ms.unwrap_or(self.hold_ms)
    }

    pub fn held_down_threshold(&self) -> u64 {
        self.held_down_threshold_ms.unwrap_or(self.hold_ms)
    }

    pub fn delayed_action(&self) -> u64 {
        self.delayed_action_ms.unwrap_or(self.hold_ms)
    }
}

impl Default for StrictTiming {
    fn default() -> Self {
        Self::new(DEFAULT_STRICT_HOLD_MS)
    }
}

/// How a base key decides between tap and hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TriggerMode {
    /// Arm on press, alone key on tap
    #[default]
    Simple,
    /// Arm only once held past the threshold
    Strict(StrictTiming),
}

/// A base key that arms a variable while held.
///
/// The base key and its modifiers are fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBased {
    trigger: Combo,
    device: Option<DeviceId>,
    description: Option<String>,
    alone: AloneKey,
    mode: TriggerMode,
    combo: Option<Combo>,
    maps: Vec<BasedKeyMap>,
    layers: Vec<Layer>,
}

impl RuleBased {
    pub(crate) fn new(trigger: Combo, device: Option<DeviceId>) -> Self {
        Self {
            trigger,
            device,
            description: None,
            alone: AloneKey::default(),
            mode: TriggerMode::default(),
            combo: None,
            maps: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn desc(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Key sent when the base is tapped alone
    pub fn if_alone(&mut self, key: Key) -> &mut Self {
        self.if_alone_hold(key, DEFAULT_ALONE_HOLD_MS)
    }

    /// Key sent when the base is tapped alone, held down for `ms`
    pub fn if_alone_hold(&mut self, key: Key, ms: u64) -> &mut Self {
        self.alone = AloneKey {
            key,
            hold_down_ms: Some(ms),
        };
        self
    }

    /// Arm only after the default hold duration
    pub fn strict(&mut self) -> &mut Self {
        self.strict_timing(StrictTiming::default())
    }

    /// Arm only after `ms` of holding
    pub fn strict_hold(&mut self, ms: u64) -> &mut Self {
        self.strict_timing(StrictTiming::new(ms))
    }

    pub fn strict_timing(&mut self, timing: StrictTiming) -> &mut Self {
        self.mode = TriggerMode::Strict(timing);
        self
    }

    /// Emit `key` with `modifiers` together with arming the variable
    pub fn map_to(&mut self, key: Key, modifiers: impl IntoIterator<Item = Modifier>) -> &mut Self {
        self.combo = Some(Combo::new(modifiers, key));
        self
    }

    /// Map a key while the base is held
    pub fn map(&mut self, key: Key, modifiers: impl IntoIterator<Item = Modifier>) -> &mut BasedKeyMap {
        self.maps.push(BasedKeyMap::new(key, modifiers));
        let index = self.maps.len() - 1;
        &mut self.maps[index]
    }

    /// Open a layer triggered by `key` while the base is held
    pub fn layer(&mut self, key: Key) -> &mut Layer {
        self.layers.push(Layer::new(key));
        let index = self.layers.len() - 1;
        &mut self.layers[index]
    }

    pub fn trigger(&self) -> &Combo {
        &self.trigger
    }

    pub fn device(&self) -> Option<DeviceId> {
        self.device
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn alone(&self) -> AloneKey {
        self.alone
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    pub fn combo(&self) -> Option<&Combo> {
        self.combo.as_ref()
    }

    pub fn maps(&self) -> &[BasedKeyMap] {
        &self.maps
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Description used for the base's own rule and as the prefix of its content
    pub fn full_description(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => format!("RuleBased: {}", self.trigger),
        }
    }

    /// Every layer under this base, in pre-order
    pub fn all_layers(&self) -> Vec<&Layer> {
        let mut out = Vec::new();
        for layer in &self.layers {
            layer.collect_pre_order(&mut out);
        }
        out
    }

    /// Name of the variable armed by this base
    pub fn variable_name(&self) -> String {
        let mut name = format!("var_{}", self.trigger.key());
        for modifier in self.trigger.modifiers().iter() {
            name.push('_');
            name.push_str(modifier.name());
        }
        name
    }
}

/// A nested scope armed by holding its trigger key inside an armed parent
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    key: Key,
    description: Option<String>,
    separated: bool,
    maps: Vec<LayerKeyMap>,
    layers: Vec<Layer>,
}

impl Layer {
    pub(crate) fn new(key: Key) -> Self {
        Self {
            key,
            description: None,
            separated: false,
            maps: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn desc(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Emit this layer as its own rule
    pub fn separate(&mut self) -> &mut Self {
        self.separated = true;
        self
    }

    pub fn map(&mut self, key: Key, modifiers: impl IntoIterator<Item = Modifier>) -> &mut LayerKeyMap {
        self.maps.push(LayerKeyMap::new(key, modifiers));
        let index = self.maps.len() - 1;
        &mut self.maps[index]
    }

    /// Open a child layer triggered by `key` while this layer is held
    pub fn layer(&mut self, key: Key) -> &mut Layer {
        self.layers.push(Layer::new(key));
        let index = self.layers.len() - 1;
        &mut self.layers[index]
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn trigger(&self) -> Combo {
        Combo::bare(self.key)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_separated(&self) -> bool {
        self.separated
    }

    pub fn maps(&self) -> &[LayerKeyMap] {
        &self.maps
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// `<parent> + [ key ] ： <desc>`
    pub fn full_description(&self, parent: &str) -> String {
        match &self.description {
            Some(description) => format!("{} + [ {} ] ： {}", parent, self.key, description),
            None => format!("{} + [ {} ]", parent, self.key),
        }
    }

    /// Name of the variable armed by this layer, under `parent_variable`.
    ///
    /// A top-level layer's parent is its base variable.
    pub fn variable_name(&self, parent_variable: &str, top_level: bool) -> String {
        if top_level {
            format!("lay_{}_{}", parent_variable, self.key)
        } else {
            format!("{}_{}", parent_variable, self.key)
        }
    }

    fn collect_pre_order<'a>(&'a self, out: &mut Vec<&'a Layer>) {
        out.push(self);
        for child in &self.layers {
            child.collect_pre_order(out);
        }
    }
}

// Karacfg Mapping Structures
// Key maps for each scope, and tap-vs-hold information

use crate::destination::{open_app_command, osa_open_command, DestinationSpec, Target};
use crate::{Combo, Key, Modifier, ModifierSet};

/// Default hold threshold for tap-vs-hold maps (milliseconds)
pub const DEFAULT_HOLD_THRESHOLD_MS: u64 = 150;

/// Default delayed-action delay for tap-vs-hold maps (milliseconds)
pub const DEFAULT_DELAYED_ACTION_MS: u64 = 150;

/// A source combo mapped to zero or more destinations
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMap {
    source: Combo,
    destinations: Vec<DestinationSpec>,
    description: Option<String>,
}

impl KeyMap {
    pub fn new(key: Key, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        Self {
            source: Combo::new(modifiers, key),
            destinations: Vec::new(),
            description: None,
        }
    }

    pub fn source(&self) -> &Combo {
        &self.source
    }

    pub fn key(&self) -> Key {
        self.source.key()
    }

    pub fn destinations(&self) -> &[DestinationSpec] {
        &self.destinations
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Fluent destination methods shared by every key map variant
pub trait MapBuilder {
    fn key_map_mut(&mut self) -> &mut KeyMap;

    /// Add a destination: a key, a mouse button, or a shell command string
    fn to(&mut self, target: impl Into<Target>) -> &mut Self {
        self.to_with(target, [])
    }

    /// Add a destination sent together with its own modifiers
    fn to_with(
        &mut self,
        target: impl Into<Target>,
        modifiers: impl IntoIterator<Item = Modifier>,
    ) -> &mut Self {
        self.key_map_mut()
            .destinations
            .push(DestinationSpec::new(target, modifiers));
        self
    }

    /// Open an application
    fn to_open(&mut self, app: &str) -> &mut Self {
        self.to(open_app_command(app))
    }

    /// Ask an application to open a URL
    fn to_osa_open(&mut self, app: &str, url: &str) -> &mut Self {
        self.to(osa_open_command(app, url))
    }

    fn desc(&mut self, description: impl Into<String>) -> &mut Self {
        self.key_map_mut().description = Some(description.into());
        self
    }
}

/// What fires once a key is held past the threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldAction {
    Key { key: Key, modifiers: ModifierSet },
    Shell(String),
}

/// Timing overrides for tap-vs-hold disambiguation (milliseconds)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoldTiming {
    pub threshold_ms: Option<u64>,
    pub delayed_action_ms: Option<u64>,
    pub alone_timeout_ms: Option<u64>,
}

impl HoldTiming {
    /// Both disambiguation delays, threshold first
    pub fn new(threshold_ms: u64, delayed_action_ms: u64) -> Self {
        Self {
            threshold_ms: Some(threshold_ms),
            delayed_action_ms: Some(delayed_action_ms),
            alone_timeout_ms: None,
        }
    }

    /// Fill unset fields from a fallback
    pub fn or(self, fallback: HoldTiming) -> HoldTiming {
        HoldTiming {
            threshold_ms: self.threshold_ms.or(fallback.threshold_ms),
            delayed_action_ms: self.delayed_action_ms.or(fallback.delayed_action_ms),
            alone_timeout_ms: self.alone_timeout_ms.or(fallback.alone_timeout_ms),
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold_ms.unwrap_or(DEFAULT_HOLD_THRESHOLD_MS)
    }

    pub fn delayed_action(&self) -> u64 {
        self.delayed_action_ms.unwrap_or(DEFAULT_DELAYED_ACTION_MS)
    }
}

/// Tap-vs-hold disambiguation attached to a rule key map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldInfo {
    pub action: HoldAction,
    pub timing: HoldTiming,
}

/// Key map inside a flat [`crate::Rule`]
#[derive(Debug, Clone, PartialEq)]
pub struct RuleKeyMap {
    map: KeyMap,
    hold: Option<HoldInfo>,
}

impl RuleKeyMap {
    pub(crate) fn new(key: Key, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        Self {
            map: KeyMap::new(key, modifiers),
            hold: None,
        }
    }

    pub fn map(&self) -> &KeyMap {
        &self.map
    }

    pub fn hold(&self) -> Option<&HoldInfo> {
        self.hold.as_ref()
    }

    /// Send a key (with modifiers) once held past the threshold
    pub fn on_hold(&mut self, key: Key, modifiers: impl IntoIterator<Item = Modifier>) -> &mut Self {
        self.set_hold_action(HoldAction::Key {
            key,
            modifiers: modifiers.into_iter().collect(),
        })
    }

    /// Run a shell command once held past the threshold
    pub fn on_hold_cmd(&mut self, command: impl Into<String>) -> &mut Self {
        self.set_hold_action(HoldAction::Shell(command.into()))
    }

    pub fn hold_threshold_ms(&mut self, ms: u64) -> &mut Self {
        self.with_timing(|timing| timing.threshold_ms = Some(ms))
    }

    pub fn hold_delayed_action_ms(&mut self, ms: u64) -> &mut Self {
        self.with_timing(|timing| timing.delayed_action_ms = Some(ms))
    }

    pub fn hold_alone_timeout_ms(&mut self, ms: u64) -> &mut Self {
        self.with_timing(|timing| timing.alone_timeout_ms = Some(ms))
    }

    // Replacing the action keeps any timing already set
    fn set_hold_action(&mut self, action: HoldAction) -> &mut Self {
        match &mut self.hold {
            Some(hold) => hold.action = action,
            None => {
                self.hold = Some(HoldInfo {
                    action,
                    timing: HoldTiming::default(),
                })
            }
        }
        self
    }

    fn with_timing(&mut self, update: impl FnOnce(&mut HoldTiming)) -> &mut Self {
        match &mut self.hold {
            Some(hold) => update(&mut hold.timing),
            None => log::warn!(
                "hold timing on '{}' ignored: call on_hold first",
                self.map.source()
            ),
        }
        self
    }
}

impl MapBuilder for RuleKeyMap {
    fn key_map_mut(&mut self) -> &mut KeyMap {
        &mut self.map
    }
}

/// Key map active while a base variable is armed
#[derive(Debug, Clone, PartialEq)]
pub struct BasedKeyMap {
    map: KeyMap,
    separated: bool,
}

/// Key map active while a layer is armed
#[derive(Debug, Clone, PartialEq)]
pub struct LayerKeyMap {
    map: KeyMap,
    separated: bool,
}

macro_rules! scoped_key_map {
    ($name:ident) => {
        impl $name {
            pub(crate) fn new(key: Key, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
                Self {
                    map: KeyMap::new(key, modifiers),
                    separated: false,
                }
            }

            pub fn map(&self) -> &KeyMap {
                &self.map
            }

            pub fn is_separated(&self) -> bool {
                self.separated
            }

            /// Emit this map as its own rule
            pub fn separate(&mut self) -> &mut Self {
                self.separated = true;
                self
            }
        }

        impl MapBuilder for $name {
            fn key_map_mut(&mut self) -> &mut KeyMap {
                &mut self.map
            }
        }
    };
}

scoped_key_map!(BasedKeyMap);
scoped_key_map!(LayerKeyMap);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::MouseButton;

    #[test]
    fn test_destinations_accumulate_in_order() {
        let mut map = BasedKeyMap::new(Key::F, []);
        map.to("open -a 'Finder'")
            .to_with(Key::Hyphen, [Modifier::LeftShift])
            .to(MouseButton::Left)
            .desc("Finder");

        let destinations = map.map().destinations();
        assert_eq!(destinations.len(), 3);
        assert_eq!(destinations[0].target, Target::Text("open -a 'Finder'".into()));
        assert_eq!(destinations[1].modifiers.len(), 1);
        assert_eq!(map.map().description(), Some("Finder"));
    }

    #[test]
    fn test_on_hold_sets_key() {
        let mut map = RuleKeyMap::new(Key::Escape, []);
        map.on_hold(Key::V, [Modifier::LeftCommand]);
        let hold = map.hold().unwrap();
        assert_eq!(
            hold.action,
            HoldAction::Key {
                key: Key::V,
                modifiers: ModifierSet::from([Modifier::LeftCommand]),
            }
        );
    }

    #[test]
    fn test_on_hold_cmd_replaces_key_and_keeps_timing() {
        let mut map = RuleKeyMap::new(Key::F, []);
        map.on_hold(Key::LeftShift, []).hold_threshold_ms(250);
        map.on_hold_cmd("echo test");

        let hold = map.hold().unwrap();
        assert_eq!(hold.action, HoldAction::Shell("echo test".into()));
        assert_eq!(hold.timing.threshold_ms, Some(250));
    }

    #[test]
    fn test_timing_without_hold_is_ignored() {
        let mut map = RuleKeyMap::new(Key::F, []);
        map.hold_threshold_ms(250);
        assert!(map.hold().is_none());
    }

    #[test]
    fn test_new_takes_threshold_first() {
        let timing = HoldTiming::new(170, 120);
        assert_eq!(timing.threshold_ms, Some(170));
        assert_eq!(timing.delayed_action_ms, Some(120));
        assert_eq!(timing.alone_timeout_ms, None);
    }

    #[test]
    fn test_timing_fallback() {
        let per_map = HoldTiming {
            threshold_ms: Some(200),
            ..HoldTiming::default()
        };
        let per_rule = HoldTiming::new(170, 120);
        let resolved = per_map.or(per_rule);
        assert_eq!(resolved.threshold(), 200);
        assert_eq!(resolved.delayed_action(), 120);
        assert_eq!(resolved.alone_timeout_ms, None);

        let defaults = HoldTiming::default();
        assert_eq!(defaults.threshold(), DEFAULT_HOLD_THRESHOLD_MS);
        assert_eq!(defaults.delayed_action(), DEFAULT_DELAYED_ACTION_MS);
    }

    #[test]
    fn test_separate() {
        let mut map = LayerKeyMap::new(Key::S, []);
        assert!(!map.is_separated());
        map.separate();
        assert!(map.is_separated());
    }
}

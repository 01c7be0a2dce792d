// Karacfg Manipulator Lowering
// Turns a validated graph into complex rules and simple modifications

use indexmap::IndexMap;

use crate::destination::Destination;
use crate::error::{CompileError, CompileResult, DestinationError};
use crate::graph::{Config, Layer, Rule, RuleBased, TriggerMode};
use crate::mapping::{HoldAction, HoldInfo, HoldTiming, KeyMap};
use crate::output::{
    ComplexModifications, ComplexRule, DelayedAction, FromEvent, Global, KarabinerConfig,
    Manipulator, Parameters, Profile, ProfileDevice, SimpleModification, ToEvent,
    VirtualHidKeyboard,
};
use crate::{DeviceId, ModifierSet};

use super::classify_all;
use super::conditions::{ActivationPath, ConditionSynthesizer};

pub(crate) struct Lowering<'a> {
    config: &'a Config,
    guards: &'a ConditionSynthesizer<'a>,
}

impl<'a> Lowering<'a> {
    pub fn new(config: &'a Config, guards: &'a ConditionSynthesizer<'a>) -> Self {
        Self { config, guards }
    }

    /// Emission order: bases, then rules, then per-device simple maps
    pub fn lower(&self) -> CompileResult<KarabinerConfig> {
        let mut rules = Vec::new();
        for base in self.config.bases() {
            self.lower_based(base, &mut rules)?;
        }
        for rule in self.config.rules() {
            rules.push(self.lower_rule(rule)?);
        }
        let (simple_modifications, device_rules) = self.lower_simples()?;
        rules.extend(device_rules);

        let devices = self
            .config
            .devices()
            .iter()
            .map(|device| ProfileDevice {
                identifiers: device.identifiers.for_profile(),
                ignore: device.ignore,
            })
            .collect();

        Ok(KarabinerConfig {
            global: Global {
                show_in_menu_bar: self.config.shows_in_menu_bar(),
            },
            profiles: vec![Profile {
                name: self.config.profile_name().to_string(),
                devices,
                simple_modifications,
                complex_modifications: ComplexModifications { rules },
                virtual_hid_keyboard: VirtualHidKeyboard::default(),
            }],
        })
    }

    fn lower_based(&self, base: &'a RuleBased, rules: &mut Vec<ComplexRule>) -> CompileResult<()> {
        let root = ActivationPath::root(base);
        let description = match base.combo() {
            Some(combo) => format!("{} [ {} ] → [ {} ]", root.description(), base.trigger(), combo),
            None => root.description().to_string(),
        };

        let mut main = ComplexRule::new(description);
        main.manipulators.push(self.trigger(base, &root));

        let mut separated = Vec::new();
        for map in base.maps() {
            let Some(record) = self.content(map.map(), &root)? else {
                continue;
            };
            if map.is_separated() {
                separated.push(separated_rule(map.map(), &root, record));
            } else {
                main.manipulators.push(record);
            }
        }
        self.lower_layers(base.layers(), &root, &mut main, &mut separated)?;

        log::debug!(
            "lowered base {} into {} rules ({} records in main)",
            base.trigger(),
            separated.len() + 1,
            main.manipulators.len()
        );
        rules.push(main);
        rules.extend(separated);
        Ok(())
    }

    fn lower_layers(
        &self,
        layers: &'a [Layer],
        parent: &ActivationPath<'a>,
        target: &mut ComplexRule,
        separated: &mut Vec<ComplexRule>,
    ) -> CompileResult<()> {
        for layer in layers {
            let path = parent.enter(layer);
            let toggle = self.toggle(layer, parent, &path);

            if layer.is_separated() {
                let mut own = ComplexRule::new(path.description());
                own.manipulators.push(toggle);
                let mut nested = Vec::new();
                self.layer_content(layer, &path, &mut own, &mut nested)?;
                separated.push(own);
                separated.extend(nested);
            } else {
                target.manipulators.push(toggle);
                self.layer_content(layer, &path, target, separated)?;
            }
        }
        Ok(())
    }

    fn layer_content(
        &self,
        layer: &'a Layer,
        path: &ActivationPath<'a>,
        target: &mut ComplexRule,
        separated: &mut Vec<ComplexRule>,
    ) -> CompileResult<()> {
        for map in layer.maps() {
            let Some(record) = self.content(map.map(), path)? else {
                continue;
            };
            if map.is_separated() {
                separated.push(separated_rule(map.map(), path, record));
            } else {
                target.manipulators.push(record);
            }
        }
        self.lower_layers(layer.layers(), path, target, separated)
    }

    /// Record for a map owned by the scope at the end of `path`
    fn content(&self, map: &KeyMap, path: &ActivationPath<'_>) -> CompileResult<Option<Manipulator>> {
        let context = format!("{}.map({})", path.description(), map.source());
        let destinations = classify_all(map, &context)?;
        if destinations.is_empty() {
            log::debug!("{} has no destination, skipped", context);
            return Ok(None);
        }

        let description = match map.description() {
            Some(description) => description.to_string(),
            None => format!("{} + [ {} ]", path.description(), map.source()),
        };
        let mut record = Manipulator::basic(FromEvent::new(map.key(), map.source().modifiers()))
            .describe(description)
            .guarded(self.guards.content(path));
        record.to = destinations.iter().map(ToEvent::from).collect();
        Ok(Some(record))
    }

    fn trigger(&self, base: &RuleBased, root: &ActivationPath<'_>) -> Manipulator {
        let trigger = base.trigger();
        let variable = root.variable();
        let from = if trigger.modifiers().is_empty() {
            FromEvent::any_modifiers(trigger.key())
        } else {
            FromEvent::new(trigger.key(), trigger.modifiers())
        };

        let mut arm = vec![ToEvent::set_variable(variable, 1)];
        let description = match base.combo() {
            Some(combo) => {
                arm.push(ToEvent::key(combo.key(), combo.modifiers()));
                format!("{} -> Set {} variable + {}", trigger, variable, combo)
            }
            None => format!("{} -> Set {} variable", trigger, variable),
        };

        let alone = base.alone();
        let mut record = Manipulator::basic(from)
            .describe(description)
            .guarded(self.guards.trigger(base));
        record.to_if_alone = vec![ToEvent::key(alone.key, &ModifierSet::new()).hold_down(alone.hold_down_ms)];
        record.to_after_key_up = vec![ToEvent::set_variable(variable, 0)];

        match base.mode() {
            TriggerMode::Simple => record.to = arm,
            TriggerMode::Strict(timing) => {
                let literal: ModifierSet = trigger.modifiers().mandatory().into_iter().collect();
                record.to_if_held_down = arm;
                record.to_delayed_action = Some(DelayedAction {
                    to_if_canceled: vec![ToEvent::key(trigger.key(), &literal)],
                });
                record.parameters = Some(Parameters {
                    alone_timeout_ms: Some(timing.alone_timeout()),
                    held_down_threshold_ms: Some(timing.held_down_threshold()),
                    delayed_action_ms: Some(timing.delayed_action()),
                });
            }
        }
        record
    }

    fn toggle(&self, layer: &Layer, parent: &ActivationPath<'_>, path: &ActivationPath<'_>) -> Manipulator {
        let mut record = Manipulator::basic(FromEvent::any_modifiers(layer.key()))
            .describe(format!("Toggle layer {}", layer.key()))
            .guarded(self.guards.toggle(parent));
        record.to = vec![ToEvent::set_variable(path.variable(), 1)];
        record.to_after_key_up = vec![ToEvent::set_variable(path.variable(), 0)];
        record
    }

    fn lower_rule(&self, rule: &Rule) -> CompileResult<ComplexRule> {
        let mut out = ComplexRule::new(rule.full_description());
        let name = rule.description().unwrap_or("Rule");

        for map in rule.maps() {
            let key_map = map.map();
            let context = format!("{}.map({})", name, key_map.source());
            let events: Vec<ToEvent> = classify_all(key_map, &context)?
                .iter()
                .map(ToEvent::from)
                .collect();

            let description = match key_map.description() {
                Some(description) => description.to_string(),
                None => key_map.source().to_string(),
            };
            let mut record = Manipulator::basic(FromEvent::new(key_map.key(), key_map.source().modifiers()))
                .describe(description)
                .guarded(self.guards.flat(rule.device()));

            match map.hold() {
                Some(hold) => hold_record(&mut record, key_map, hold, rule.hold_timing(), events),
                None if events.is_empty() => {
                    log::debug!("{} has no destination, skipped", context);
                    continue;
                }
                None => record.to = events,
            }
            out.manipulators.push(record);
        }

        log::debug!("lowered rule {:?} ({} records)", name, out.manipulators.len());
        Ok(out)
    }

    fn lower_simples(&self) -> CompileResult<(Vec<SimpleModification>, Vec<ComplexRule>)> {
        let mut global = Vec::new();
        let mut by_device: IndexMap<DeviceId, ComplexRule> = IndexMap::new();

        for simple in self.config.simples() {
            let Some(spec) = simple.destination() else {
                continue;
            };
            let source = simple.source();
            let invalid = |reason| CompileError::InvalidDestination {
                value: spec.target.to_string(),
                context: format!("Config.map({})", source.key()),
                reason,
            };
            let to = match spec.classify().map_err(invalid)? {
                Destination::Key { key, modifiers } => ToEvent::key(key, &modifiers),
                _ => return Err(invalid(DestinationError::NotAKey)),
            };
            let from = FromEvent::new(source.key(), source.modifiers());

            match simple.device() {
                None => global.push(SimpleModification { from, to }),
                Some(id) => {
                    let mut record = Manipulator::basic(from)
                        .describe(format!("{} -> {}", source, spec.target))
                        .guarded(self.guards.flat(Some(id)));
                    record.to = vec![to];
                    by_device
                        .entry(id)
                        .or_insert_with(|| ComplexRule::new(format!("Device {} simple maps", id.index())))
                        .manipulators
                        .push(record);
                }
            }
        }

        Ok((global, by_device.into_values().collect()))
    }
}

/// Tap on release before the threshold, hold action after it
fn hold_record(
    record: &mut Manipulator,
    map: &KeyMap,
    hold: &HoldInfo,
    rule_timing: HoldTiming,
    events: Vec<ToEvent>,
) {
    let tap = if events.is_empty() {
        vec![ToEvent::key(map.key(), &ModifierSet::new())]
    } else {
        events
    };

    record.to_if_alone = tap.iter().cloned().map(ToEvent::halted).collect();
    record.to_if_held_down = vec![match &hold.action {
        HoldAction::Key { key, modifiers } => ToEvent::key(*key, modifiers),
        HoldAction::Shell(command) => ToEvent::shell(command.clone()),
    }];
    record.to_delayed_action = Some(DelayedAction { to_if_canceled: tap });

    let timing = hold.timing.or(rule_timing);
    record.parameters = Some(Parameters {
        alone_timeout_ms: timing.alone_timeout_ms,
        held_down_threshold_ms: Some(timing.threshold()),
        delayed_action_ms: Some(timing.delayed_action()),
    });
}

/// A map emitted as its own rule
fn separated_rule(map: &KeyMap, path: &ActivationPath<'_>, record: Manipulator) -> ComplexRule {
    let description = match map.description() {
        Some(description) => format!("{} + [ {} ] ： {}", path.description(), map.source(), description),
        None => format!("{} + [ {} ]", path.description(), map.source()),
    };
    let mut rule = ComplexRule::new(description);
    rule.manipulators.push(record);
    rule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MapBuilder;
    use crate::output::Condition;
    use crate::{Key, Modifier};
    use serde_json::json;

    fn lower(config: &Config) -> KarabinerConfig {
        let guards = ConditionSynthesizer::new(config);
        Lowering::new(config, &guards).lower().unwrap()
    }

    #[test]
    fn test_trigger_simple_mode() {
        let mut config = Config::default();
        config.rule_base_by(Key::CapsLock, []).map(Key::F, []).to("open -a 'Finder'");
        let output = lower(&config);

        let trigger = serde_json::to_value(&output.rules()[0].manipulators[0]).unwrap();
        assert_eq!(
            trigger,
            json!({
                "description": "caps_lock -> Set var_caps_lock variable",
                "type": "basic",
                "from": {"key_code": "caps_lock", "modifiers": {"optional": ["any"]}},
                "to": [{"set_variable": {"name": "var_caps_lock", "value": 1}}],
                "to_if_alone": [{"key_code": "escape"}],
                "to_after_key_up": [{"set_variable": {"name": "var_caps_lock", "value": 0}}]
            })
        );
    }

    #[test]
    fn test_trigger_strict_mode() {
        let mut config = Config::default();
        config
            .rule_base_by(Key::Spacebar, [Modifier::LeftCommand])
            .if_alone(Key::Spacebar)
            .strict_hold(200);
        let output = lower(&config);
        let record = &output.rules()[0].manipulators[0];

        assert!(record.to.is_empty());
        assert_eq!(record.to_if_held_down, vec![ToEvent::set_variable("var_spacebar_left_command", 1)]);
        assert_eq!(record.to_if_alone[0].hold_down_milliseconds, Some(100));
        assert_eq!(
            serde_json::to_value(record.to_delayed_action.as_ref().unwrap()).unwrap(),
            json!({"to_if_canceled": [{"key_code": "spacebar", "modifiers": ["left_command"]}]})
        );
        assert_eq!(
            serde_json::to_value(record.parameters.as_ref().unwrap()).unwrap(),
            json!({
                "basic.to_if_alone_timeout_milliseconds": 200,
                "basic.to_if_held_down_threshold_milliseconds": 200,
                "basic.to_delayed_action_delay_milliseconds": 200
            })
        );
    }

    #[test]
    fn test_combo_mode_is_single_record() {
        let mut config = Config::default();
        config
            .rule_base_by(Key::CapsLock, [])
            .desc("Hyper")
            .map_to(Key::F16, [Modifier::LeftShift, Modifier::LeftControl]);
        let output = lower(&config);

        assert_eq!(output.rules()[0].description, "Hyper [ caps_lock ] → [ f16+left_shift+left_control ]");
        assert_eq!(output.rules()[0].manipulators.len(), 1);
        assert_eq!(
            serde_json::to_value(&output.rules()[0].manipulators[0].to).unwrap(),
            json!([
                {"set_variable": {"name": "var_caps_lock", "value": 1}},
                {"key_code": "f16", "modifiers": ["left_shift", "left_control"]}
            ])
        );
    }

    #[test]
    fn test_one_record_per_map_with_all_destinations() {
        let mut config = Config::default();
        let base = config.rule_base_by(Key::F16, []);
        base.map(Key::T, []).to(Key::A).to(Key::B).to("say done");
        base.map(Key::U, []);
        let output = lower(&config);

        let records = &output.rules()[0].manipulators;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].to.len(), 3);
        assert_eq!(records[1].to[2].shell_command.as_deref(), Some("say done"));
        assert_eq!(records[1].description.as_deref(), Some("RuleBased: f16 + [ t ]"));
    }

    #[test]
    fn test_layer_toggle_and_content() {
        let mut config = Config::default();
        let base = config.rule_base_by(Key::F16, []);
        base.desc("Hyper");
        base.layer(Key::W).desc("Window").map(Key::H, []).to(Key::LeftArrow);
        let output = lower(&config);

        let records = &output.rules()[0].manipulators;
        let toggle = &records[1];
        assert_eq!(toggle.description.as_deref(), Some("Toggle layer w"));
        assert_eq!(toggle.conditions, vec![Condition::variable("var_f16", 1)]);
        assert_eq!(toggle.to, vec![ToEvent::set_variable("lay_var_f16_w", 1)]);

        let content = &records[2];
        assert_eq!(content.description.as_deref(), Some("Hyper + [ w ] ： Window + [ h ]"));
        assert!(content.requires("var_f16", 1));
        assert!(content.requires("lay_var_f16_w", 1));
    }

    #[test]
    fn test_separated_emission_order() {
        let mut config = Config::default();
        let base = config.rule_base_by(Key::F16, []);
        base.desc("Hyper");
        base.map(Key::F, []).to(Key::A).separate().desc("Finder");
        {
            let window = base.layer(Key::W).separate();
            window.map(Key::H, []).to(Key::LeftArrow);
            window.map(Key::L, []).to(Key::RightArrow).separate();
        }
        base.layer(Key::S).map(Key::J, []).to(Key::DownArrow);
        let output = lower(&config);

        let descriptions: Vec<&str> = output.rules().iter().map(|rule| rule.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec![
                "Hyper",
                "Hyper + [ f ] ： Finder",
                "Hyper + [ w ]",
                "Hyper + [ w ] + [ l ]",
            ]
        );
        // trigger, toggle s, s content
        assert_eq!(output.rules()[0].manipulators.len(), 3);
        // toggle w, w content
        assert_eq!(output.rules()[2].manipulators.len(), 2);
    }

    #[test]
    fn test_hold_record() {
        let mut config = Config::default();
        let rule = config.rule("Home Rows");
        rule.set_on_hold(HoldTiming::new(170, 120));
        rule.map(Key::A, [Modifier::Any]).on_hold(Key::LeftShift, []);
        let output = lower(&config);

        let record = serde_json::to_value(&output.rules()[0].manipulators[0]).unwrap();
        assert_eq!(
            record,
            json!({
                "description": "a+any",
                "type": "basic",
                "from": {"key_code": "a", "modifiers": {"optional": ["any"]}},
                "to_if_alone": [{"key_code": "a", "halt": true}],
                "to_if_held_down": [{"key_code": "left_shift"}],
                "to_delayed_action": {"to_if_canceled": [{"key_code": "a"}]},
                "parameters": {
                    "basic.to_if_held_down_threshold_milliseconds": 170,
                    "basic.to_delayed_action_delay_milliseconds": 120
                }
            })
        );
    }

    #[test]
    fn test_simple_maps() {
        let mut config = Config::default();
        let sofle = config.device(crate::DeviceIdentifiers::new(7504, 24926));
        config.map(Key::CapsLock, []).to(Key::F16);
        config.on(sofle).map(Key::RightCommand, []).to(Key::F17);
        config.map(Key::Insert, []);
        let output = lower(&config);

        let profile = &output.profiles[0];
        assert_eq!(profile.simple_modifications.len(), 1);
        assert_eq!(profile.devices.len(), 1);
        assert_eq!(profile.devices[0].identifiers.is_keyboard, Some(true));

        let rule = output.rules().last().unwrap();
        assert_eq!(rule.description, "Device 0 simple maps");
        assert!(matches!(rule.manipulators[0].conditions[0], Condition::DeviceIf { .. }));
    }
}

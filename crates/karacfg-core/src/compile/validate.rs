// Karacfg Conflict Validator
// Whole-graph checks that run before any record is produced

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::destination::Destination;
use crate::error::{CompileError, CompileResult, DestinationError};
use crate::graph::{Config, Layer, RuleBased};
use crate::mapping::{HoldAction, KeyMap};
use crate::registry::{IdentifierRegistry, ScopeKey};
use crate::{Combo, Device, DeviceId, Key};

use super::classify_all;

pub(crate) struct Validator<'a> {
    config: &'a Config,
    registry: &'a mut IdentifierRegistry,
    /// Synthesized variable name -> (trigger path, description) of its first owner.
    ///
    /// Device scope is left out: the same path on two devices shares its
    /// variables, and two paths on different devices still share the host's
    /// single variable namespace.
    variables: HashMap<String, (Vec<Combo>, String)>,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a Config, registry: &'a mut IdentifierRegistry) -> Self {
        Self {
            config,
            registry,
            variables: HashMap::new(),
        }
    }

    /// Check the whole graph in declaration order, stopping at the first violation
    pub fn run(&mut self) -> CompileResult<()> {
        let config = self.config;
        self.check_simples()?;
        for base in config.bases() {
            self.check_based(base)?;
        }
        for rule in config.rules() {
            let scope = ScopeKey::root(self.device(rule.device()));
            let name = rule.description().unwrap_or("Rule");
            for map in rule.maps() {
                let context = format!("{}.map({})", name, map.map().source());
                self.claim(map.map(), &scope, &context)?;
                if let Some(hold) = map.hold() {
                    check_hold(&hold.action, &context)?;
                }
            }
        }
        Ok(())
    }

    fn check_simples(&mut self) -> CompileResult<()> {
        let config = self.config;
        for simple in config.simples() {
            let scope = ScopeKey::root(self.device(simple.device()));
            let context = format!("Config.map({})", simple.source().key());
            self.registry
                .register(simple.source(), &scope, || context.clone())?;

            let Some(destination) = simple.destination() else {
                continue;
            };
            let classified = destination
                .classify()
                .map_err(|reason| invalid(&destination.target.to_string(), &context, reason))?;
            if !matches!(classified, Destination::Key { .. }) {
                return Err(invalid(
                    &destination.target.to_string(),
                    &context,
                    DestinationError::NotAKey,
                ));
            }
        }
        Ok(())
    }

    fn check_based(&mut self, base: &RuleBased) -> CompileResult<()> {
        let root = ScopeKey::root(self.device(base.device()));
        let description = base.full_description();
        let trigger = base.trigger();
        self.registry
            .register(trigger, &root, || format!("ruleBaseBy({})", trigger))?;

        // Direct maps against triggers at any depth
        let layer_keys: HashSet<Key> = base.all_layers().iter().map(|layer| layer.key()).collect();
        if let Some(map) = base.maps().iter().find(|map| layer_keys.contains(&map.map().key())) {
            return Err(CompileError::KeyRoleConflict {
                key: map.map().key(),
                scope: description,
            });
        }
        check_layers(base.layers(), &description)?;

        let scope = root.child(trigger.clone());
        for map in base.maps() {
            let context = format!("{}.map({})", description, map.map().source());
            self.claim(map.map(), &scope, &context)?;
        }
        self.claim_layers(base.layers(), &scope, &description)?;

        let variable = base.variable_name();
        let path = vec![trigger.clone()];
        self.own_variable(&variable, &path, &description)?;
        self.own_layer_variables(base.layers(), &variable, true, &path, &description)
    }

    fn own_layer_variables(
        &mut self,
        layers: &[Layer],
        parent_variable: &str,
        top_level: bool,
        parent_path: &[Combo],
        parent_description: &str,
    ) -> CompileResult<()> {
        for layer in layers {
            let variable = layer.variable_name(parent_variable, top_level);
            let mut path = parent_path.to_vec();
            path.push(layer.trigger());
            let description = layer.full_description(parent_description);
            self.own_variable(&variable, &path, &description)?;
            self.own_layer_variables(layer.layers(), &variable, false, &path, &description)?;
        }
        Ok(())
    }

    /// Record `name` as produced by `path`; another path producing it is a collision
    fn own_variable(&mut self, name: &str, path: &[Combo], description: &str) -> CompileResult<()> {
        match self.variables.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let (owner, first) = entry.get();
                if owner.as_slice() == path {
                    return Ok(());
                }
                Err(CompileError::VariableCollision {
                    name: name.to_string(),
                    first: first.clone(),
                    second: description.to_string(),
                })
            }
            Entry::Vacant(entry) => {
                entry.insert((path.to_vec(), description.to_string()));
                Ok(())
            }
        }
    }

    fn claim_layers(
        &mut self,
        layers: &[Layer],
        parent: &ScopeKey,
        parent_description: &str,
    ) -> CompileResult<()> {
        for layer in layers {
            let scope = parent.child(layer.trigger());
            let description = layer.full_description(parent_description);
            for map in layer.maps() {
                let context = format!("{}.map({})", description, map.map().source());
                self.claim(map.map(), &scope, &context)?;
            }
            self.claim_layers(layer.layers(), &scope, &description)?;
        }
        Ok(())
    }

    fn claim(&mut self, map: &KeyMap, scope: &ScopeKey, context: &str) -> CompileResult<()> {
        self.registry
            .register(map.source(), scope, || context.to_string())?;
        classify_all(map, context)?;
        Ok(())
    }

    fn device(&self, id: Option<DeviceId>) -> Option<Device> {
        id.and_then(|id| self.config.device_of(id)).cloned()
    }
}

/// Self-mapping and role checks for every layer, pre-order
fn check_layers(layers: &[Layer], parent_description: &str) -> CompileResult<()> {
    for layer in layers {
        let description = layer.full_description(parent_description);
        if layer.maps().iter().any(|map| map.map().key() == layer.key()) {
            return Err(CompileError::SelfMapping {
                key: layer.key(),
                layer: description,
            });
        }

        let child_keys: HashSet<Key> = layer.layers().iter().map(Layer::key).collect();
        if let Some(map) = layer.maps().iter().find(|map| child_keys.contains(&map.map().key())) {
            return Err(CompileError::KeyRoleConflict {
                key: map.map().key(),
                scope: description,
            });
        }

        check_layers(layer.layers(), &description)?;
    }
    Ok(())
}

fn check_hold(action: &HoldAction, context: &str) -> CompileResult<()> {
    match action {
        HoldAction::Shell(command) if command.trim().is_empty() => {
            Err(invalid(command, context, DestinationError::Blank))
        }
        _ => Ok(()),
    }
}

fn invalid(value: &str, context: &str, reason: DestinationError) -> CompileError {
    CompileError::InvalidDestination {
        value: value.to_string(),
        context: context.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MapBuilder;
    use crate::{DeviceIdentifiers, Modifier};

    fn validate(config: &Config) -> CompileResult<()> {
        let mut registry = IdentifierRegistry::new();
        Validator::new(config, &mut registry).run()
    }

    #[test]
    fn test_duplicate_simple_map() {
        let mut config = Config::default();
        config.map(Key::A, []).to(Key::B);
        config.map(Key::A, []).to(Key::C);
        let err = validate(&config).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate key combination: a in Config.map(a)");
    }

    #[test]
    fn test_duplicate_in_base() {
        let mut config = Config::default();
        let base = config.rule_base_by(Key::F16, []);
        base.map(Key::F, []).to(Key::A);
        base.map(Key::F, []).to(Key::B);
        assert!(matches!(validate(&config), Err(CompileError::DuplicateKey { .. })));
    }

    #[test]
    fn test_same_base_on_two_devices() {
        let mut config = Config::default();
        let first = config.device(DeviceIdentifiers::new(1452, 641));
        let second = config.device(DeviceIdentifiers::new(7504, 24926));
        config.on(first).rule_base_by(Key::F16, []).map(Key::F, []).to(Key::A);
        config.on(second).rule_base_by(Key::F16, []).map(Key::F, []).to(Key::A);
        assert_eq!(validate(&config), Ok(()));
    }

    #[test]
    fn test_global_base_conflicts_with_device_base() {
        let mut config = Config::default();
        let sofle = config.device(DeviceIdentifiers::new(7504, 24926));
        config.on(sofle).rule_base_by(Key::F16, []);
        config.rule_base_by(Key::F16, []);
        assert!(matches!(validate(&config), Err(CompileError::DuplicateKey { .. })));
    }

    #[test]
    fn test_nested_layer_and_modified_base_collide() {
        let mut config = Config::default();
        let hyper = config.rule_base_by(Key::F16, []);
        hyper.desc("Hyper");
        hyper.layer(Key::LeftCommand).layer(Key::W);
        let meh = config.rule_base_by(Key::F16, [Modifier::LeftCommand]);
        meh.desc("Meh");
        meh.layer(Key::W);

        assert_eq!(
            validate(&config),
            Err(CompileError::VariableCollision {
                name: "lay_var_f16_left_command_w".to_string(),
                first: "Hyper + [ left_command ] + [ w ]".to_string(),
                second: "Meh + [ w ]".to_string(),
            })
        );
    }

    #[test]
    fn test_same_layers_on_two_devices_share_variables() {
        let mut config = Config::default();
        let first = config.device(DeviceIdentifiers::new(1452, 641));
        let second = config.device(DeviceIdentifiers::new(7504, 24926));
        config.on(first).rule_base_by(Key::F16, []).layer(Key::W).layer(Key::R);
        config.on(second).rule_base_by(Key::F16, []).layer(Key::W).layer(Key::R);
        assert_eq!(validate(&config), Ok(()));
    }

    #[test]
    fn test_key_in_base_and_layer_is_allowed() {
        let mut config = Config::default();
        let base = config.rule_base_by(Key::F16, []);
        base.map(Key::H, []).to(Key::A);
        base.layer(Key::W).map(Key::H, []).to(Key::LeftArrow);
        assert_eq!(validate(&config), Ok(()));
    }

    #[test]
    fn test_role_conflict_at_depth() {
        let mut config = Config::default();
        let base = config.rule_base_by(Key::F16, []);
        base.desc("Hyper");
        base.map(Key::R, []).to(Key::A);
        base.layer(Key::W).layer(Key::R);

        assert_eq!(
            validate(&config),
            Err(CompileError::KeyRoleConflict {
                key: Key::R,
                scope: "Hyper".to_string(),
            })
        );
    }

    #[test]
    fn test_role_conflict_inside_layer() {
        let mut config = Config::default();
        let window = config.rule_base_by(Key::F16, []).layer(Key::W);
        window.map(Key::R, []).to(Key::A);
        window.layer(Key::R);
        assert!(matches!(validate(&config), Err(CompileError::KeyRoleConflict { key: Key::R, .. })));
    }

    #[test]
    fn test_self_mapping_nested() {
        let mut config = Config::default();
        let base = config.rule_base_by(Key::F16, []);
        base.desc("Hyper");
        let resize = base.layer(Key::W).layer(Key::R);
        resize.map(Key::R, []).to(Key::A);

        let err = validate(&config).unwrap_err();
        assert_eq!(
            err,
            CompileError::SelfMapping {
                key: Key::R,
                layer: "Hyper + [ w ] + [ r ]".to_string(),
            }
        );
    }

    #[test]
    fn test_simple_map_needs_key_destination() {
        let mut config = Config::default();
        config.map(Key::CapsLock, []).to("open -a 'Finder'");
        assert!(matches!(
            validate(&config),
            Err(CompileError::InvalidDestination {
                reason: DestinationError::NotAKey,
                ..
            })
        ));
    }

    #[test]
    fn test_blank_destination() {
        let mut config = Config::default();
        config.rule("Blank").map(Key::A, []).to("  ");
        assert!(matches!(
            validate(&config),
            Err(CompileError::InvalidDestination {
                reason: DestinationError::Blank,
                ..
            })
        ));
    }

    #[test]
    fn test_blank_hold_command() {
        let mut config = Config::default();
        config.rule("Blank").map(Key::A, []).on_hold_cmd("");
        assert!(validate(&config).is_err());
    }
}

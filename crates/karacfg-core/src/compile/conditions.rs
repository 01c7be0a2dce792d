// Karacfg Condition Synthesis
// Activation paths and the guards derived from them

use indexmap::IndexSet;

use crate::graph::{Config, Layer, RuleBased};
use crate::output::Condition;
use crate::DeviceId;

/// The chain from a base down to one of its scopes.
///
/// Parents are real references; wire names are derived while descending.
#[derive(Debug, Clone)]
pub(crate) struct ActivationPath<'a> {
    pub base: &'a RuleBased,
    pub layers: Vec<&'a Layer>,
    variables: Vec<String>,
    description: String,
}

impl<'a> ActivationPath<'a> {
    pub fn root(base: &'a RuleBased) -> Self {
        Self {
            base,
            layers: Vec::new(),
            variables: vec![base.variable_name()],
            description: base.full_description(),
        }
    }

    /// The path one level down, into `layer`
    pub fn enter(&self, layer: &'a Layer) -> Self {
        let variable = layer.variable_name(self.variable(), self.layers.is_empty());
        let mut layers = self.layers.clone();
        layers.push(layer);
        let mut variables = self.variables.clone();
        variables.push(variable);

        Self {
            base: self.base,
            layers,
            variables,
            description: layer.full_description(&self.description),
        }
    }

    /// Variable armed by the scope at the end of the path
    pub fn variable(&self) -> &str {
        self.variables.last().map(String::as_str).unwrap_or_default()
    }

    /// Variables from the base down to this scope
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Builds guard lists.
///
/// Exclusions cover every layer variable in the whole configuration, since
/// the host has no notion of nesting and evaluates each record's guards as a
/// flat conjunction.
pub(crate) struct ConditionSynthesizer<'a> {
    config: &'a Config,
    layer_variables: IndexSet<String>,
}

impl<'a> ConditionSynthesizer<'a> {
    pub fn new(config: &'a Config) -> Self {
        let mut layer_variables = IndexSet::new();
        for base in config.bases() {
            collect_layer_variables(&ActivationPath::root(base), base.layers(), &mut layer_variables);
        }
        Self {
            config,
            layer_variables,
        }
    }

    /// Guard for `device`, if it scopes anything
    pub fn device(&self, device: Option<DeviceId>) -> Option<Condition> {
        let id = device?;
        match self.config.device_of(id) {
            Some(device) => Some(Condition::device(device.polarity, device.identifiers.clone())),
            None => {
                log::warn!("device #{} is not declared on this configuration", id.index());
                None
            }
        }
    }

    /// Guards for content owned by the scope at the end of `path`
    pub fn content(&self, path: &ActivationPath<'_>) -> Vec<Condition> {
        let mut conditions: Vec<Condition> = path
            .variables()
            .iter()
            .map(|name| Condition::variable(name.clone(), 1))
            .collect();

        conditions.extend(
            self.layer_variables
                .iter()
                .filter(|name| !path.variables().contains(*name))
                .map(|name| Condition::variable(name.clone(), 0)),
        );

        conditions.extend(self.device(path.base.device()));
        conditions
    }

    /// Guards for a base's own trigger record
    pub fn trigger(&self, base: &RuleBased) -> Vec<Condition> {
        let mut own = IndexSet::new();
        collect_layer_variables(&ActivationPath::root(base), base.layers(), &mut own);

        let mut conditions: Vec<Condition> = own
            .into_iter()
            .map(|name| Condition::variable(name, 0))
            .collect();
        conditions.extend(self.device(base.device()));
        conditions
    }

    /// Guards for the toggle of a layer whose parent is the end of `parent`
    pub fn toggle(&self, parent: &ActivationPath<'_>) -> Vec<Condition> {
        let mut conditions: Vec<Condition> = parent
            .variables()
            .iter()
            .map(|name| Condition::variable(name.clone(), 1))
            .collect();
        conditions.extend(self.device(parent.base.device()));
        conditions
    }

    /// Guards for content with no base: only the device, if any
    pub fn flat(&self, device: Option<DeviceId>) -> Vec<Condition> {
        self.device(device).into_iter().collect()
    }
}

fn collect_layer_variables<'a>(
    parent: &ActivationPath<'a>,
    layers: &'a [Layer],
    out: &mut IndexSet<String>,
) {
    for layer in layers {
        let path = parent.enter(layer);
        out.insert(path.variable().to_string());
        collect_layer_variables(&path, layer.layers(), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeviceIdentifiers, Key};

    fn variables(conditions: &[Condition]) -> Vec<(String, u8)> {
        conditions
            .iter()
            .filter_map(|condition| match condition {
                Condition::VariableIf { name, value } => Some((name.clone(), *value)),
                _ => None,
            })
            .collect()
    }

    fn nested_config() -> Config {
        let mut config = Config::default();
        let base = config.rule_base_by(Key::F16, []);
        base.layer(Key::W).layer(Key::R);
        base.layer(Key::S);
        config
    }

    #[test]
    fn test_path_names() {
        let config = nested_config();
        let base = &config.bases()[0];
        let root = ActivationPath::root(base);
        let window = root.enter(&base.layers()[0]);
        let resize = window.enter(&base.layers()[0].layers()[0]);

        assert_eq!(root.variable(), "var_f16");
        assert_eq!(window.variable(), "lay_var_f16_w");
        assert_eq!(resize.variable(), "lay_var_f16_w_r");
        assert_eq!(resize.description(), "RuleBased: f16 + [ w ] + [ r ]");
    }

    #[test]
    fn test_content_guards_order() {
        let config = nested_config();
        let guards = ConditionSynthesizer::new(&config);
        let base = &config.bases()[0];
        let resize = ActivationPath::root(base)
            .enter(&base.layers()[0])
            .enter(&base.layers()[0].layers()[0]);

        assert_eq!(
            variables(&guards.content(&resize)),
            vec![
                ("var_f16".to_string(), 1),
                ("lay_var_f16_w".to_string(), 1),
                ("lay_var_f16_w_r".to_string(), 1),
                ("lay_var_f16_s".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_base_content_excludes_every_layer() {
        let config = nested_config();
        let guards = ConditionSynthesizer::new(&config);
        let root = ActivationPath::root(&config.bases()[0]);
        let vars = variables(&guards.content(&root));
        assert_eq!(vars[0], ("var_f16".to_string(), 1));
        assert_eq!(vars.iter().filter(|(_, value)| *value == 0).count(), 3);
    }

    #[test]
    fn test_toggle_has_no_exclusions() {
        let config = nested_config();
        let guards = ConditionSynthesizer::new(&config);
        let base = &config.bases()[0];
        let window = ActivationPath::root(base).enter(&base.layers()[0]);
        assert_eq!(
            variables(&guards.toggle(&window)),
            vec![("var_f16".to_string(), 1), ("lay_var_f16_w".to_string(), 1)]
        );
    }

    #[test]
    fn test_device_guard_comes_last() {
        let mut config = Config::default();
        let sofle = config.device(DeviceIdentifiers::new(7504, 24926));
        config.on(sofle).rule_base_by(Key::F16, []).layer(Key::W);

        let guards = ConditionSynthesizer::new(&config);
        let conditions = guards.trigger(&config.bases()[0]);
        assert_eq!(conditions.len(), 2);
        assert!(matches!(conditions[1], Condition::DeviceIf { .. }));
        assert!(guards.flat(None).is_empty());
    }
}

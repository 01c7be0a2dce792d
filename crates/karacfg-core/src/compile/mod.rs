// Karacfg Compiler
// Validates a rule graph and lowers it into the output document

mod conditions;
mod lower;
mod validate;

use crate::destination::Destination;
use crate::error::{CompileError, CompileResult};
use crate::graph::Config;
use crate::mapping::KeyMap;
use crate::output::KarabinerConfig;
use crate::registry::IdentifierRegistry;

use conditions::ConditionSynthesizer;
use lower::Lowering;
use validate::Validator;

/// Turns a [`Config`] into a [`KarabinerConfig`].
///
/// The identifier registry lives here and is reset on every call, so one
/// compiler can be reused across configurations.
#[derive(Debug, Default)]
pub struct Compiler {
    registry: IdentifierRegistry,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the whole graph, then lower it.
    ///
    /// Fails at the first violation; nothing is produced in that case.
    pub fn compile(&mut self, config: &Config) -> CompileResult<KarabinerConfig> {
        self.registry.reset();
        Validator::new(config, &mut self.registry).run()?;
        log::debug!(
            "validated {} bases, {} rules, {} simple maps ({} claims)",
            config.bases().len(),
            config.rules().len(),
            config.simples().len(),
            self.registry.len()
        );

        let guards = ConditionSynthesizer::new(config);
        Lowering::new(config, &guards).lower()
    }

    /// Claims made by the last compilation
    pub fn registry(&self) -> &IdentifierRegistry {
        &self.registry
    }
}

/// Classify every destination of `map`, naming `context` on failure
pub(crate) fn classify_all(map: &KeyMap, context: &str) -> CompileResult<Vec<Destination>> {
    map.destinations()
        .iter()
        .map(|spec| {
            spec.classify().map_err(|reason| CompileError::InvalidDestination {
                value: spec.target.to_string(),
                context: context.to_string(),
                reason,
            })
        })
        .collect()
}

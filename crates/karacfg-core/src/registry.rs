// Karacfg Identifier Registry
// Per-compilation record of claimed key combos, grouped by activation scope

use indexmap::{IndexMap, IndexSet};

use crate::error::{CompileError, CompileResult};
use crate::{Combo, Device};

/// Where a combo is live: a device predicate (or every device) and the chain
/// of combos that must be armed first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub device: Option<Device>,
    pub path: Vec<Combo>,
}

impl ScopeKey {
    /// The top-level scope of one device, or of every device
    pub fn root(device: Option<Device>) -> Self {
        Self {
            device,
            path: Vec::new(),
        }
    }

    /// A scope nested one level deeper, reached through `combo`
    pub fn child(&self, combo: Combo) -> Self {
        let mut path = self.path.clone();
        path.push(combo);
        Self {
            device: self.device.clone(),
            path,
        }
    }
}

/// Records every combo claimed during one compilation.
///
/// Two scopes overlap when their activation paths are identical and their
/// devices are equal, or one of them applies to every device. The same combo
/// may be claimed again in a scope that does not overlap.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    claims: IndexMap<Vec<Combo>, IndexMap<Option<Device>, IndexSet<Combo>>>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every claim
    pub fn reset(&mut self) {
        self.claims.clear();
    }

    /// Number of combos claimed so far, across all scopes
    pub fn len(&self) -> usize {
        self.claims
            .values()
            .flat_map(|by_device| by_device.values())
            .map(IndexSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `combo` is live anywhere overlapping `scope`
    pub fn contains(&self, combo: &Combo, scope: &ScopeKey) -> bool {
        self.claims
            .get(&scope.path)
            .map(|by_device| {
                by_device
                    .iter()
                    .any(|(device, combos)| overlaps(device, &scope.device) && combos.contains(combo))
            })
            .unwrap_or(false)
    }

    /// Claim `combo` in `scope`.
    ///
    /// `context` names the place being registered and ends up in the error.
    pub fn register(
        &mut self,
        combo: &Combo,
        scope: &ScopeKey,
        context: impl FnOnce() -> String,
    ) -> CompileResult<()> {
        if self.contains(combo, scope) {
            return Err(CompileError::DuplicateKey {
                combo: combo.clone(),
                context: context(),
            });
        }

        log::trace!("claim {} at depth {}", combo, scope.path.len());
        self.claims
            .entry(scope.path.clone())
            .or_default()
            .entry(scope.device.clone())
            .or_default()
            .insert(combo.clone());
        Ok(())
    }
}

/// Whether two device scopes on the same path can see each other's claims.
///
/// Global overlaps every device and two devices overlap only when equal.
/// Paths are compared before this runs and only identical paths are checked:
/// an ancestor path never overlaps its descendants, so a key mapped on a base
/// may be mapped again inside one of its layers.
fn overlaps(a: &Option<Device>, b: &Option<Device>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

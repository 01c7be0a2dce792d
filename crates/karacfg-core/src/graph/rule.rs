// Karacfg Rules
// A flat group of key maps with no base variable

use crate::mapping::{HoldTiming, RuleKeyMap};
use crate::{DeviceId, Key, Modifier};

/// A flat rule: every map is live whenever its device scope matches
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    description: Option<String>,
    device: Option<DeviceId>,
    hold_timing: HoldTiming,
    maps: Vec<RuleKeyMap>,
}

impl Rule {
    pub(crate) fn new(description: Option<String>, device: Option<DeviceId>) -> Self {
        Self {
            description,
            device,
            hold_timing: HoldTiming::default(),
            maps: Vec::new(),
        }
    }

    pub fn desc(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Timing used by every hold map of this rule that does not set its own
    pub fn set_on_hold(&mut self, timing: HoldTiming) -> &mut Self {
        self.hold_timing = timing;
        self
    }

    pub fn map(&mut self, key: Key, modifiers: impl IntoIterator<Item = Modifier>) -> &mut RuleKeyMap {
        self.maps.push(RuleKeyMap::new(key, modifiers));
        let index = self.maps.len() - 1;
        &mut self.maps[index]
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn device(&self) -> Option<DeviceId> {
        self.device
    }

    pub fn hold_timing(&self) -> HoldTiming {
        self.hold_timing
    }

    pub fn maps(&self) -> &[RuleKeyMap] {
        &self.maps
    }

    /// Rule description with a per-map summary when there is more than one map
    pub fn full_description(&self) -> String {
        let head = match &self.description {
            Some(description) => description.clone(),
            None => format!("Rule: Non-Desc, Maps[ {} ]", self.maps.len()),
        };
        if self.maps.len() <= 1 {
            return head;
        }

        let mut out = format!("{} ({})", head, self.maps.len());
        for map in &self.maps {
            let map = map.map();
            let source = map.source().to_string();
            out.push_str(&format!(
                "\n  + [ {} ] : {}",
                source,
                map.description().unwrap_or(&source)
            ));
        }
        out
    }
}

//! Runtime form of the override table
//!
//! Starts from the static table in `avr-mcu-table` and can be extended by the
//! `[common]` and `[targets.<name>]` tables of the config file.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::layer::Layer;
use crate::config::GeneratorConfig;
use crate::error::{Result, SpecError};

/// Common overrides plus one override map per target, keyed by target name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideTable {
    common: Map<String, Value>,
    targets: BTreeMap<String, Map<String, Value>>,
}

impl OverrideTable {
    pub fn new(common: Map<String, Value>, targets: BTreeMap<String, Map<String, Value>>) -> Self {
        Self { common, targets }
    }

    /// The table compiled into the tool
    pub fn builtin() -> Self {
        let targets = avr_mcu_table::CHIPS
            .iter()
            .map(|chip| (chip.name.to_string(), chip.to_map()))
            .collect();
        Self::new(avr_mcu_table::common_overrides(), targets)
    }

    /// The built-in table extended by the config file
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let mut table = Self::builtin();
        table.extend(&config.common, &config.targets);
        table
    }

    /// Add common keys and per-target keys on top of the existing entries.
    ///
    /// A target that is new to the table gets `cpu = <name>` unless the
    /// overrides name a cpu.
    pub fn extend(
        &mut self,
        common: &Map<String, Value>,
        targets: &BTreeMap<String, Map<String, Value>>,
    ) {
        for (key, value) in common {
            self.common.insert(key.clone(), value.clone());
        }
        for (name, overrides) in targets {
            let entry = self.targets.entry(name.clone()).or_insert_with(|| {
                let mut fresh = Map::new();
                fresh.insert("cpu".to_string(), Value::String(name.clone()));
                fresh
            });
            for (key, value) in overrides {
                entry.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn common(&self) -> &Map<String, Value> {
        &self.common
    }

    pub fn target(&self, name: &str) -> Option<&Map<String, Value>> {
        self.targets.get(name)
    }

    /// Target names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    /// Configured cpu of a target
    pub fn cpu(&self, name: &str) -> Option<&str> {
        self.targets.get(name)?.get("cpu")?.as_str()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Layers for one target, lowest precedence first: common, then target
    pub fn layers_for(&self, name: &str) -> Result<Vec<Layer>> {
        let target = self
            .targets
            .get(name)
            .ok_or_else(|| SpecError::UnknownTarget(name.to_string()))?;
        Ok(vec![
            Layer::new("common", self.common.clone()),
            Layer::new(name, target.clone()),
        ])
    }

    /// Resolve a target selection; empty means every target
    pub fn select(&self, requested: &[String]) -> Result<Vec<String>> {
        if requested.is_empty() {
            return Ok(self.targets.keys().cloned().collect());
        }
        let mut selected = Vec::with_capacity(requested.len());
        for name in requested {
            if !self.targets.contains_key(name) {
                return Err(SpecError::UnknownTarget(name.clone()));
            }
            if !selected.contains(name) {
                selected.push(name.clone());
            }
        }
        selected.sort();
        Ok(selected)
    }
}

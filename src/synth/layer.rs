//! Override layers
//!
//! A target spec is the baseline with an ordered list of layers applied on
//! top, lowest precedence first. Assignment is shallow: a key present in a
//! layer replaces the whole value at that key.

use serde_json::{Map, Value};

/// Which keys of a layer are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Carry {
    /// Every key in the layer
    All,
    /// Only the listed keys (when present in the layer)
    Only(Vec<String>),
}

impl Carry {
    pub fn only<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Carry::Only(keys.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, key: &str) -> bool {
        match self {
            Carry::All => true,
            Carry::Only(keys) => keys.iter().any(|k| k == key),
        }
    }
}

/// One set of overrides
#[derive(Debug, Clone)]
pub struct Layer {
    /// Human-readable origin, for logs ("common", "atmega328p", a file path)
    pub name: String,
    pub fields: Map<String, Value>,
    pub carry: Carry,
}

impl Layer {
    /// A layer applying all of its keys
    pub fn new(name: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            fields,
            carry: Carry::All,
        }
    }

    /// A layer applying only `keys`
    pub fn carrying<I, S>(name: impl Into<String>, fields: Map<String, Value>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields,
            carry: Carry::only(keys),
        }
    }

    /// Keys this layer will actually assign
    pub fn applied_keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys().filter(|k| self.carry.includes(k))
    }

    /// Assign this layer's keys into `doc`
    pub fn apply(&self, doc: &mut Map<String, Value>) {
        for (key, value) in &self.fields {
            if self.carry.includes(key) {
                doc.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Copy the baseline and apply `layers` in order.
///
/// The baseline is never modified; every call works on its own copy.
pub fn merge_layers(baseline: &Map<String, Value>, layers: &[Layer]) -> Map<String, Value> {
    let mut doc = baseline.clone();
    for layer in layers {
        log::trace!(
            "applying layer {} ({} keys)",
            layer.name,
            layer.applied_keys().count()
        );
        layer.apply(&mut doc);
    }
    doc
}

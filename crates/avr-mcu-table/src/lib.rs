//! Static override table for AVR target specifications.
//!
//! Every supported microcontroller gets one entry. An entry names the chip
//! (which is also the file name suffix of the generated spec), the CPU that
//! LLVM and avr-gcc know it as, and any additional per-chip keys.
//!
//! The table is data only. Turning it into JSON maps happens through
//! [`ChipEntry::to_map`] and [`common_overrides`].

use serde_json::{Map, Value};

/// A constant-constructible override value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideValue {
    Bool(bool),
    Int(i64),
    Str(&'static str),
}

impl OverrideValue {
    /// Convert into a JSON value.
    pub fn to_value(self) -> Value {
        match self {
            OverrideValue::Bool(b) => Value::Bool(b),
            OverrideValue::Int(i) => Value::Number(i.into()),
            OverrideValue::Str(s) => Value::String(s.to_string()),
        }
    }
}

/// Keys applied to every target before the per-chip entry.
///
/// `no-default-libraries` stays false because the generated targets link
/// against avr-libc. AVR can do 16-bit atomics by masking interrupts, so the
/// atomic width ceiling is 16.
pub const COMMON_OVERRIDES: &[(&str, OverrideValue)] = &[
    ("max-atomic-width", OverrideValue::Int(16)),
    ("no-default-libraries", OverrideValue::Bool(false)),
];

/// One row of the override table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipEntry {
    /// Target identifier, used for the output file name.
    pub name: &'static str,

    /// Value of the `cpu` key and of the `-mmcu=` linker flag.
    pub cpu: &'static str,

    /// Additional per-chip keys, applied after the common overrides.
    pub extra: &'static [(&'static str, OverrideValue)],
}

impl ChipEntry {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            cpu: name,
            extra: &[],
        }
    }

    /// Lower the entry into a JSON map of override keys.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("cpu".to_string(), Value::String(self.cpu.to_string()));
        for (key, value) in self.extra {
            map.insert((*key).to_string(), value.to_value());
        }
        map
    }
}

/// All supported chips, sorted by name.
pub const CHIPS: &[ChipEntry] = &[
    ChipEntry::new("atmega1280"),
    ChipEntry::new("atmega1284p"),
    ChipEntry::new("atmega128a"),
    ChipEntry::new("atmega164pa"),
    ChipEntry::new("atmega168"),
    ChipEntry::new("atmega2560"),
    ChipEntry::new("atmega328"),
    ChipEntry::new("atmega328p"),
    ChipEntry::new("atmega328pb"),
    ChipEntry::new("atmega32a"),
    ChipEntry::new("atmega32u4"),
    ChipEntry::new("atmega48p"),
    ChipEntry::new("atmega644"),
    ChipEntry::new("atmega8"),
    ChipEntry::new("atmega8u2"),
    ChipEntry::new("attiny167"),
    ChipEntry::new("attiny2313"),
    ChipEntry::new("attiny84"),
    ChipEntry::new("attiny85"),
    ChipEntry::new("attiny88"),
];

/// The common overrides as a JSON map.
pub fn common_overrides() -> Map<String, Value> {
    COMMON_OVERRIDES
        .iter()
        .map(|(key, value)| ((*key).to_string(), value.to_value()))
        .collect()
}

//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::toolchain::{DEFAULT_REFERENCE_TARGET, DEFAULT_RUSTC};

/// Flag appended to every pre-link argument list
pub const DEFAULT_REPORT_FLAG: &str = "-Wl,--as-needed,--print-memory-usage";

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output directory for generated specs (default: "avr-specs")
    pub out_dir: String,

    /// File name prefix (default: "avr")
    pub prefix: String,

    /// Toolchain program (default: "rustc")
    pub rustc: String,

    /// Reference target queried for the baseline
    pub reference_target: String,

    /// Trailing linker flag for pre-link lists
    pub report_flag: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            out_dir: "avr-specs".to_string(),
            prefix: "avr".to_string(),
            rustc: DEFAULT_RUSTC.to_string(),
            reference_target: DEFAULT_REFERENCE_TARGET.to_string(),
            report_flag: DEFAULT_REPORT_FLAG.to_string(),
        }
    }
}

impl Defaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "out-dir": self.out_dir,
            "prefix": self.prefix,
            "rustc": self.rustc,
            "reference-target": self.reference_target,
            "report-flag": self.report_flag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = Defaults::default();
        assert_eq!(defaults.out_dir, "avr-specs");
        assert_eq!(defaults.prefix, "avr");
        assert_eq!(defaults.rustc, "rustc");
        assert_eq!(defaults.reference_target, "avr-unknown-gnu-atmega328");
    }

    #[test]
    fn test_to_value() {
        let value = Defaults::default().to_value();
        assert_eq!(value["out-dir"], "avr-specs");
        assert_eq!(value["report-flag"], DEFAULT_REPORT_FLAG);
    }
}

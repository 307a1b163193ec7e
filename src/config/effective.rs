//! Effective generator configuration
//!
//! The layers are merged as JSON values, then validated and converted into a
//! typed [`GeneratorConfig`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::defaults::Defaults;
use super::merge::merge_layers;

/// Origin of a configuration layer
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing config layer
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Values set on the command line; `None` leaves lower layers in effect
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub out_dir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub rustc: Option<String>,
    pub reference_target: Option<String>,
    pub baseline: Option<PathBuf>,
    pub no_report_flag: bool,
}

impl CliOverrides {
    /// Convert to a JSON layer holding only the flags that were given
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(dir) = &self.out_dir {
            map.insert("out-dir".into(), Value::String(dir.display().to_string()));
        }
        if let Some(prefix) = &self.prefix {
            map.insert("prefix".into(), Value::String(prefix.clone()));
        }
        if let Some(rustc) = &self.rustc {
            map.insert("rustc".into(), Value::String(rustc.clone()));
        }
        if let Some(target) = &self.reference_target {
            map.insert("reference-target".into(), Value::String(target.clone()));
        }
        if let Some(baseline) = &self.baseline {
            map.insert("baseline".into(), Value::String(baseline.display().to_string()));
        }
        if self.no_report_flag {
            map.insert("report-flag".into(), Value::Bool(false));
        }
        Value::Object(map)
    }

    fn is_empty(&self) -> bool {
        self.to_value().as_object().map_or(true, |m| m.is_empty())
    }
}

/// Shape of the merged layers before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    out_dir: String,
    prefix: String,
    rustc: String,
    reference_target: String,
    #[serde(default)]
    report_flag: Value,
    #[serde(default)]
    baseline: Option<String>,
    #[serde(default)]
    common: Map<String, Value>,
    #[serde(default)]
    targets: BTreeMap<String, Map<String, Value>>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Directory the spec files are written to
    pub out_dir: PathBuf,

    /// File name prefix, files are `<prefix>-<target>.json`
    pub prefix: String,

    /// Toolchain program
    pub rustc: String,

    /// Built-in target queried for the baseline
    pub reference_target: String,

    /// Trailing linker flag appended to each pre-link list, if any
    pub report_flag: Option<String>,

    /// Saved baseline file used instead of querying the toolchain
    pub baseline: Option<PathBuf>,

    /// Extra common overrides, applied over the built-in ones
    pub common: Map<String, Value>,

    /// Extra or amended per-target overrides
    pub targets: BTreeMap<String, Map<String, Value>>,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let defaults = Defaults::default();
        Self {
            out_dir: PathBuf::from(defaults.out_dir),
            prefix: defaults.prefix,
            rustc: defaults.rustc,
            reference_target: defaults.reference_target,
            report_flag: Some(defaults.report_flag),
            baseline: None,
            common: Map::new(),
            targets: BTreeMap::new(),
            sources: vec![ConfigSource {
                origin: ConfigOrigin::Builtin,
                path: None,
            }],
        }
    }
}

impl GeneratorConfig {
    /// Build the effective config from the optional config file and CLI flags
    pub fn build(config_path: Option<&Path>, cli: &CliOverrides) -> Result<Self, ConfigError> {
        let mut layers = vec![Defaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
        }];

        if let Some(path) = config_path {
            layers.push(Self::load_toml_file(path)?);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.display().to_string()),
            });
        }

        if !cli.is_empty() {
            layers.push(cli.to_value());
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
            });
        }

        let merged = merge_layers(layers);
        let raw: RawConfig = serde_json::from_value(merged)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let config = Self {
            out_dir: PathBuf::from(raw.out_dir),
            prefix: raw.prefix,
            rustc: raw.rustc,
            reference_target: raw.reference_target,
            report_flag: Self::report_flag(raw.report_flag)?,
            baseline: raw.baseline.map(PathBuf::from),
            common: raw.common,
            targets: raw.targets,
            sources,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and parse a TOML file into a JSON value
    fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(Self::toml_to_json(toml_value))
    }

    /// Convert TOML Value to JSON Value
    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    /// `report-flag` is either a flag string or `false`
    fn report_flag(value: Value) -> Result<Option<String>, ConfigError> {
        match value {
            Value::Null | Value::Bool(false) => Ok(None),
            Value::String(s) if !s.trim().is_empty() => Ok(Some(s)),
            other => Err(ConfigError::ValidationError(format!(
                "report-flag must be a non-empty string or false, got {}",
                other
            ))),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.out_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError("out-dir must not be empty".into()));
        }
        if self.prefix.is_empty() || self.prefix.contains(['/', '\\']) {
            return Err(ConfigError::ValidationError(format!(
                "prefix must be a plain file name fragment, got {:?}",
                self.prefix
            )));
        }
        if self.reference_target.is_empty() {
            return Err(ConfigError::ValidationError(
                "reference-target must not be empty".into(),
            ));
        }
        for (name, overrides) in &self.targets {
            if name.is_empty() || name.contains(['/', '\\', '.']) {
                return Err(ConfigError::ValidationError(format!(
                    "invalid target name {:?}",
                    name
                )));
            }
            if let Some(cpu) = overrides.get("cpu") {
                if !cpu.is_string() {
                    return Err(ConfigError::ValidationError(format!(
                        "targets.{}.cpu must be a string",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use crate::config::defaults::DEFAULT_REPORT_FLAG;

    #[test]
    fn test_build_with_defaults_only() {
        let config = GeneratorConfig::build(None, &CliOverrides::default()).unwrap();

        assert_eq!(config.out_dir, PathBuf::from("avr-specs"));
        assert_eq!(config.prefix, "avr");
        assert_eq!(config.report_flag.as_deref(), Some(DEFAULT_REPORT_FLAG));
        assert!(config.targets.is_empty());
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "out-dir = \"from-file\"").unwrap();
        writeln!(temp, "rustc = \"rustc-nightly\"").unwrap();

        let cli = CliOverrides {
            out_dir: Some(PathBuf::from("from-cli")),
            no_report_flag: true,
            ..Default::default()
        };
        let config = GeneratorConfig::build(Some(temp.path()), &cli).unwrap();

        assert_eq!(config.out_dir, PathBuf::from("from-cli"));
        assert_eq!(config.rustc, "rustc-nightly");
        assert!(config.report_flag.is_none());
        let origins: Vec<_> = config.sources.iter().map(|s| s.origin).collect();
        assert_eq!(
            origins,
            vec![ConfigOrigin::Builtin, ConfigOrigin::File, ConfigOrigin::Cli]
        );
    }

    #[test]
    fn test_cli_prefix_and_sources_json() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "prefix = \"file\"").unwrap();

        let cli = CliOverrides {
            prefix: Some("board".to_string()),
            ..Default::default()
        };
        let config = GeneratorConfig::build(Some(temp.path()), &cli).unwrap();
        assert_eq!(config.prefix, "board");

        let sources = serde_json::to_value(&config.sources).unwrap();
        assert_eq!(sources[0], serde_json::json!({"origin": "builtin"}));
        assert_eq!(sources[1]["origin"], "file");
        assert_eq!(sources[1]["path"], temp.path().display().to_string());
        assert_eq!(sources[2], serde_json::json!({"origin": "cli"}));
    }

    #[test]
    fn test_load_target_tables() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "report-flag = false").unwrap();
        writeln!(temp, "[common]").unwrap();
        writeln!(temp, "max-atomic-width = 8").unwrap();
        writeln!(temp, "[targets.attiny402]").unwrap();
        writeln!(temp, "cpu = \"attiny402\"").unwrap();

        let config = GeneratorConfig::build(Some(temp.path()), &CliOverrides::default()).unwrap();

        assert!(config.report_flag.is_none());
        assert_eq!(config.common["max-atomic-width"], 8);
        assert_eq!(config.targets["attiny402"]["cpu"], "attiny402");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "outdir = \"typo\"").unwrap();

        let result = GeneratorConfig::build(Some(temp.path()), &CliOverrides::default());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_report_flag_true_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "report-flag = true").unwrap();

        let result = GeneratorConfig::build(Some(temp.path()), &CliOverrides::default());
        assert!(result.unwrap_err().to_string().contains("report-flag"));
    }

    #[test]
    fn test_invalid_target_name() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[targets.\"../escape\"]").unwrap();
        writeln!(temp, "cpu = \"atmega328p\"").unwrap();

        let result = GeneratorConfig::build(Some(temp.path()), &CliOverrides::default());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let result = GeneratorConfig::build(
            Some(Path::new("/nonexistent/avr-specs.toml")),
            &CliOverrides::default(),
        );
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_default_matches_build() {
        let built = GeneratorConfig::build(None, &CliOverrides::default()).unwrap();
        let default = GeneratorConfig::default();
        assert_eq!(built.out_dir, default.out_dir);
        assert_eq!(built.report_flag, default.report_flag);
        assert_eq!(built.reference_target, default.reference_target);
    }
}

//! Canonical spec output
//!
//! Files are `<dir>/<prefix>-<target>.json`: keys sorted at every level,
//! two-space indentation, one trailing newline. Existing files are
//! overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::GeneratorConfig;
use crate::error::{Result, SpecError};

/// Path of the spec file for `target`
pub fn target_path(dir: &Path, prefix: &str, target: &str) -> PathBuf {
    dir.join(format!("{}-{}.json", prefix, target))
}

/// Rebuild `value` with object keys in sorted order at every level
pub fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Value::Object(
                keys.into_iter()
                    .map(|k| (k.clone(), canonical(&map[k])))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

/// Render a spec the way it is stored on disk
pub fn render(target: &str, doc: &Map<String, Value>) -> Result<String> {
    let value = canonical(&Value::Object(doc.clone()));
    let mut text = serde_json::to_string_pretty(&value).map_err(|source| SpecError::Serialize {
        target: target.to_string(),
        source,
    })?;
    text.push('\n');
    Ok(text)
}

/// Writes specs into one output directory
#[derive(Debug, Clone)]
pub struct SpecWriter {
    dir: PathBuf,
    prefix: String,
}

impl SpecWriter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(&config.out_dir, &config.prefix)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn path_for(&self, target: &str) -> PathBuf {
        target_path(&self.dir, &self.prefix, target)
    }

    /// Target name encoded in a file name, if it follows `<prefix>-<target>.json`
    pub fn target_from_file_name(&self, file_name: &str) -> Option<String> {
        let rest = file_name.strip_prefix(self.prefix.as_str())?.strip_prefix('-')?;
        let target = rest.strip_suffix(".json")?;
        (!target.is_empty()).then(|| target.to_string())
    }

    /// Render every spec first, then write them all.
    ///
    /// Rendering happens up front so a failure leaves the directory untouched.
    pub fn write_all(&self, docs: &[(String, Map<String, Value>)]) -> Result<Vec<PathBuf>> {
        let rendered = docs
            .iter()
            .map(|(target, doc)| Ok((self.path_for(target), render(target, doc)?)))
            .collect::<Result<Vec<_>>>()?;

        fs::create_dir_all(&self.dir).map_err(|e| SpecError::io(&self.dir, e))?;

        let mut written = Vec::with_capacity(rendered.len());
        for (path, text) in rendered {
            fs::write(&path, text).map_err(|e| SpecError::io(&path, e))?;
            log::info!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_target_path() {
        assert_eq!(
            target_path(Path::new("avr-specs"), "avr", "atmega328p"),
            PathBuf::from("avr-specs/avr-atmega328p.json")
        );
    }

    #[test]
    fn test_render_sorted_with_newline() {
        let doc = map(json!({
            "pre-link-args": {"gnu-lld-cc": ["-mmcu=attiny85"], "gnu-cc": ["-mmcu=attiny85"]},
            "cpu": "attiny85",
            "arch": "avr"
        }));
        let text = render("attiny85", &doc).unwrap();

        let expected = "{\n  \"arch\": \"avr\",\n  \"cpu\": \"attiny85\",\n  \"pre-link-args\": {\n    \"gnu-cc\": [\n      \"-mmcu=attiny85\"\n    ],\n    \"gnu-lld-cc\": [\n      \"-mmcu=attiny85\"\n    ]\n  }\n}\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_target_from_file_name() {
        let writer = SpecWriter::new("avr-specs", "avr");
        assert_eq!(
            writer.target_from_file_name("avr-atmega328p.json").as_deref(),
            Some("atmega328p")
        );
        assert_eq!(writer.target_from_file_name("avr-.json"), None);
        assert_eq!(writer.target_from_file_name("avr-atmega328p.toml"), None);
        assert_eq!(writer.target_from_file_name("avrx-atmega328p.json"), None);
        assert_eq!(writer.target_from_file_name("README.md"), None);
    }

    #[test]
    fn test_write_all_creates_dir_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let writer = SpecWriter::new(temp.path().join("specs"), "avr");
        let docs = vec![("atmega8".to_string(), map(json!({"cpu": "atmega8"})))];

        let paths = writer.write_all(&docs).unwrap();
        assert_eq!(paths, vec![temp.path().join("specs/avr-atmega8.json")]);

        fs::write(&paths[0], "garbage").unwrap();
        writer.write_all(&docs).unwrap();
        assert_eq!(
            fs::read_to_string(&paths[0]).unwrap(),
            "{\n  \"cpu\": \"atmega8\"\n}\n"
        );
    }
}

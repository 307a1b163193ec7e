//! Legacy refresh of existing spec files
//!
//! Instead of the override table, every `<prefix>-<target>.json` already in
//! the output directory is refreshed against the current baseline. Only
//! `cpu` and `data-layout` survive from the old file; everything else comes
//! from the baseline. Fields lost that way are reported as warnings.

use std::fs;
use std::path::PathBuf;

use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::error::{Result, SpecError};
use crate::synth::{Synthesizer, LEGACY_CARRIED_FIELDS};
use crate::toolchain::parse_document;
use crate::writer::SpecWriter;

/// A spec file found in the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingSpec {
    pub target: String,
    pub path: PathBuf,
}

/// List `<prefix>-*.json` files directly inside the writer's directory,
/// sorted by target name
pub fn discover(writer: &SpecWriter) -> Result<Vec<ExistingSpec>> {
    if !writer.dir().is_dir() {
        return Err(SpecError::io(
            writer.dir(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "output directory does not exist"),
        ));
    }

    let mut specs = Vec::new();
    for entry in WalkDir::new(writer.dir()).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(PathBuf::from).unwrap_or_else(|| writer.dir().to_path_buf());
            SpecError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        if let Some(target) = writer.target_from_file_name(file_name) {
            specs.push(ExistingSpec {
                target,
                path: entry.into_path(),
            });
        }
    }
    specs.sort_by(|a, b| a.target.cmp(&b.target));
    Ok(specs)
}

/// Top-level keys of `existing` that the refresh replaced with a different
/// value or dropped
pub fn discarded_fields(existing: &Map<String, Value>, refreshed: &Map<String, Value>) -> Vec<String> {
    existing
        .iter()
        .filter(|(key, _)| !LEGACY_CARRIED_FIELDS.contains(&key.as_str()))
        .filter(|(key, value)| refreshed.get(key.as_str()) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect()
}

/// Refresh every existing spec against `baseline`.
///
/// All files are parsed and synthesized before any is written.
pub fn refresh_existing(
    baseline: &Map<String, Value>,
    synthesizer: &Synthesizer,
    writer: &SpecWriter,
) -> Result<Vec<PathBuf>> {
    let existing = discover(writer)?;
    if existing.is_empty() {
        log::warn!(
            "no {}-*.json files in {}, nothing to refresh",
            writer.prefix(),
            writer.dir().display()
        );
        return Ok(Vec::new());
    }

    let mut docs = Vec::with_capacity(existing.len());
    for spec in &existing {
        let text = fs::read_to_string(&spec.path).map_err(|e| SpecError::io(&spec.path, e))?;
        let old = parse_document(&text, &spec.path.display().to_string())?;

        let refreshed = synthesizer.refresh(&spec.target, baseline, old.clone())?;
        let lost = discarded_fields(&old, &refreshed);
        if !lost.is_empty() {
            log::warn!(
                "{}: replaced hand-edited fields with baseline values: {}",
                spec.target,
                lost.join(", ")
            );
        }
        docs.push((spec.target.clone(), refreshed));
    }

    writer.write_all(&docs)
}

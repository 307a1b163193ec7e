//! Staleness check for committed spec files
//!
//! Compares freshly synthesized specs with what is on disk without writing
//! anything. Content is compared in JCS (RFC 8785) form so that a file that
//! only differs in whitespace or key order is told apart from one whose
//! values changed.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{Result, SpecError};
use crate::writer::{render, SpecWriter};

/// State of one spec file relative to a fresh synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Byte-identical
    UpToDate,
    /// Same content, different formatting
    Reformatted,
    /// Content differs (or the file is not valid JSON)
    Stale,
    /// No file
    Missing,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckEntry {
    pub target: String,
    pub path: PathBuf,
    pub status: Status,
    /// SHA-256 of the expected spec in canonical (JCS) form
    pub digest: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub entries: Vec<CheckEntry>,
}

impl CheckReport {
    /// True when every file is up to date
    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|e| e.status == Status::UpToDate)
    }

    pub fn count(&self, status: Status) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// JCS bytes of a document
fn jcs_bytes(target: &str, value: &Value) -> Result<Vec<u8>> {
    serde_json_canonicalizer::to_vec(value).map_err(|e| SpecError::Canonicalize {
        target: target.to_string(),
        reason: e.to_string(),
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Compare `docs` with the files under the writer's directory
pub fn check(docs: &[(String, Map<String, Value>)], writer: &SpecWriter) -> Result<CheckReport> {
    let mut report = CheckReport::default();

    for (target, doc) in docs {
        let path = writer.path_for(target);
        let expected_text = render(target, doc)?;
        let expected = Value::Object(doc.clone());
        let expected_jcs = jcs_bytes(target, &expected)?;

        let status = match fs::read(&path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Status::Missing,
            Err(e) => return Err(SpecError::io(&path, e)),
            Ok(actual) if actual == expected_text.as_bytes() => Status::UpToDate,
            Ok(actual) => match serde_json::from_slice::<Value>(&actual) {
                Ok(actual) if jcs_bytes(target, &actual)? == expected_jcs => Status::Reformatted,
                _ => Status::Stale,
            },
        };

        log::debug!("{}: {:?}", target, status);
        report.entries.push(CheckEntry {
            target: target.clone(),
            path,
            status,
            digest: sha256_hex(&expected_jcs),
        });
    }

    Ok(report)
}

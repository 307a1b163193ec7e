//! Baseline target spec from the Rust toolchain
//!
//! The baseline is the JSON description rustc has built in for a reference
//! AVR target. Printing it needs `-Z unstable-options`, so the toolchain has
//! to be a nightly (or locally built dev) compiler:
//! - `rustc --version` is parsed and checked first
//! - `rustc --print target-spec-json -Z unstable-options --target <ref>`
//!   is captured and parsed
//!
//! A previously captured baseline can be used instead via [`SavedBaseline`].

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde_json::{Map, Value};

use crate::error::{Result, SpecError};

/// Built-in rustc target used as the baseline
pub const DEFAULT_REFERENCE_TARGET: &str = "avr-unknown-gnu-atmega328";

/// Default toolchain program
pub const DEFAULT_RUSTC: &str = "rustc";

/// Source of the baseline document
pub trait BaselineProvider {
    /// Produce the baseline target spec as a JSON object
    fn describe(&self) -> Result<Map<String, Value>>;
}

/// Release channel of a rustc build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stable,
    Beta,
    Nightly,
    Dev,
}

impl Channel {
    /// Whether `-Z` flags are accepted
    pub fn allows_unstable(self) -> bool {
        matches!(self, Channel::Nightly | Channel::Dev)
    }
}

/// Parsed `rustc --version` output
///
/// Examples:
/// - `rustc 1.81.0-nightly (4a6e3b2f1 2024-06-30)`
/// - `rustc 1.80.0-beta.4 (64a1fe671 2024-06-21)`
/// - `rustc 1.79.0 (129f3b996 2024-06-10)`
/// - `rustc 1.82.0-dev`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RustcVersion {
    /// Release number (e.g., "1.81.0")
    pub release: String,

    pub channel: Channel,

    /// Short commit hash, absent for some dev builds
    pub commit_hash: Option<String>,

    /// Commit date (YYYY-MM-DD), absent for some dev builds
    pub commit_date: Option<String>,
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^rustc (\d+\.\d+\.\d+)(?:-([a-z]+)(?:\.\d+)?)?(?: \(([0-9a-f]+) (\d{4}-\d{2}-\d{2})\))?",
        )
        .expect("version pattern is a valid regex")
    })
}

impl RustcVersion {
    /// Parse the first line of `rustc --version`
    pub fn parse(text: &str) -> Result<Self> {
        let line = text.lines().next().unwrap_or("").trim();
        let caps = version_regex()
            .captures(line)
            .ok_or_else(|| SpecError::UnparsableVersion(line.to_string()))?;

        let channel = match caps.get(2).map(|m| m.as_str()) {
            None => Channel::Stable,
            Some("beta") => Channel::Beta,
            Some("nightly") => Channel::Nightly,
            Some("dev") => Channel::Dev,
            Some(_) => return Err(SpecError::UnparsableVersion(line.to_string())),
        };

        Ok(Self {
            release: caps[1].to_string(),
            channel,
            commit_hash: caps.get(3).map(|m| m.as_str().to_string()),
            commit_date: caps.get(4).map(|m| m.as_str().to_string()),
        })
    }
}

/// Baseline provider that queries a rustc binary
#[derive(Debug, Clone)]
pub struct Rustc {
    program: String,
    reference_target: String,
}

impl Default for Rustc {
    fn default() -> Self {
        Self::new(DEFAULT_RUSTC, DEFAULT_REFERENCE_TARGET)
    }
}

impl Rustc {
    pub fn new(program: impl Into<String>, reference_target: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            reference_target: reference_target.into(),
        }
    }

    /// Query and parse `rustc --version`
    pub fn version(&self) -> Result<RustcVersion> {
        let stdout = self.run(&["--version"])?;
        RustcVersion::parse(&stdout)
    }

    /// Print the built-in spec of the reference target as raw text
    pub fn target_spec_json(&self) -> Result<String> {
        self.run(&[
            "--print",
            "target-spec-json",
            "-Z",
            "unstable-options",
            "--target",
            &self.reference_target,
        ])
    }

    /// Run the toolchain and capture stdout, failing on non-zero exit or
    /// empty output
    fn run(&self, args: &[&str]) -> Result<String> {
        let command = format!("{} {}", self.program, args.join(" "));
        log::debug!("running {}", command);

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| SpecError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SpecError::Invocation {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim().is_empty() {
            return Err(SpecError::EmptyOutput { command });
        }
        Ok(stdout)
    }
}

impl BaselineProvider for Rustc {
    fn describe(&self) -> Result<Map<String, Value>> {
        let version = self.version()?;
        if !version.channel.allows_unstable() {
            return Err(SpecError::NotNightly {
                version: format!("{} ({:?})", version.release, version.channel),
            });
        }
        log::info!(
            "using rustc {} {:?}{}",
            version.release,
            version.channel,
            version
                .commit_date
                .as_deref()
                .map(|d| format!(" ({})", d))
                .unwrap_or_default()
        );

        let text = self.target_spec_json()?;
        parse_document(&text, &format!("rustc --target {}", self.reference_target))
    }
}

/// Baseline provider backed by a previously captured spec file
#[derive(Debug, Clone)]
pub struct SavedBaseline {
    path: PathBuf,
}

impl SavedBaseline {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BaselineProvider for SavedBaseline {
    fn describe(&self) -> Result<Map<String, Value>> {
        let text = fs::read_to_string(&self.path).map_err(|e| SpecError::io(&self.path, e))?;
        if text.trim().is_empty() {
            return Err(SpecError::EmptyOutput {
                command: format!("read {}", self.path.display()),
            });
        }
        parse_document(&text, &self.path.display().to_string())
    }
}

/// Where the baseline comes from for a run
#[derive(Debug, Clone)]
pub enum BaselineSource {
    Rustc(Rustc),
    Saved(SavedBaseline),
}

impl BaselineProvider for BaselineSource {
    fn describe(&self) -> Result<Map<String, Value>> {
        match self {
            BaselineSource::Rustc(rustc) => rustc.describe(),
            BaselineSource::Saved(saved) => {
                log::info!("using saved baseline {}", saved.path().display());
                saved.describe()
            }
        }
    }
}

/// Baseline held in memory
impl BaselineProvider for Map<String, Value> {
    fn describe(&self) -> Result<Map<String, Value>> {
        Ok(self.clone())
    }
}

/// Parse text as a JSON object
pub fn parse_document(text: &str, origin: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(text).map_err(|source| SpecError::Parse {
        origin: origin.to_string(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SpecError::NotAnObject {
            origin: origin.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nightly() {
        let v = RustcVersion::parse("rustc 1.81.0-nightly (4a6e3b2f1 2024-06-30)\n").unwrap();
        assert_eq!(v.release, "1.81.0");
        assert_eq!(v.channel, Channel::Nightly);
        assert_eq!(v.commit_hash.as_deref(), Some("4a6e3b2f1"));
        assert_eq!(v.commit_date.as_deref(), Some("2024-06-30"));
        assert!(v.channel.allows_unstable());
    }

    #[test]
    fn test_parse_beta() {
        let v = RustcVersion::parse("rustc 1.80.0-beta.4 (64a1fe671 2024-06-21)").unwrap();
        assert_eq!(v.channel, Channel::Beta);
        assert!(!v.channel.allows_unstable());
    }

    #[test]
    fn test_parse_stable_with_distro_suffix() {
        let v = RustcVersion::parse("rustc 1.79.0 (129f3b996 2024-06-10) (Arch Linux rust 1:1.79.0-1)")
            .unwrap();
        assert_eq!(v.release, "1.79.0");
        assert_eq!(v.channel, Channel::Stable);
    }

    #[test]
    fn test_parse_dev_without_commit() {
        let v = RustcVersion::parse("rustc 1.82.0-dev").unwrap();
        assert_eq!(v.channel, Channel::Dev);
        assert!(v.commit_hash.is_none());
        assert!(v.channel.allows_unstable());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            RustcVersion::parse("cargo 1.79.0"),
            Err(SpecError::UnparsableVersion(_))
        ));
        assert!(matches!(
            RustcVersion::parse("rustc 1.79.0-weird (129f3b996 2024-06-10)"),
            Err(SpecError::UnparsableVersion(_))
        ));
    }

    #[test]
    fn test_parse_document_rejects_non_object() {
        assert!(matches!(
            parse_document("[1, 2]", "test"),
            Err(SpecError::NotAnObject { .. })
        ));
        assert!(matches!(
            parse_document("{", "test"),
            Err(SpecError::Parse { .. })
        ));
        assert!(parse_document(r#"{"cpu": "avr2"}"#, "test").is_ok());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let rustc = Rustc::new("definitely-not-a-rustc-binary", DEFAULT_REFERENCE_TARGET);
        assert!(matches!(rustc.describe(), Err(SpecError::Spawn { .. })));
    }

    #[test]
    fn test_saved_baseline_missing_file() {
        let saved = SavedBaseline::new("/nonexistent/baseline.json");
        assert!(matches!(saved.describe(), Err(SpecError::Io { .. })));
    }
}

//! Error taxonomy for spec generation
//!
//! Every error is fatal for the run. Nothing is retried.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Errors raised while producing target specifications
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// The toolchain could not be started at all
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The toolchain is not a nightly/dev build and cannot print target specs
    #[error("a nightly rustc is required to print target specs, found: {version}")]
    NotNightly { version: String },

    /// `rustc --version` printed something unexpected
    #[error("could not parse rustc version string: {0:?}")]
    UnparsableVersion(String),

    /// The toolchain exited with a failure status
    #[error("`{command}` failed ({status}): {stderr}")]
    Invocation {
        command: String,
        status: String,
        stderr: String,
    },

    /// The toolchain succeeded but printed nothing
    #[error("`{command}` produced no output")]
    EmptyOutput { command: String },

    /// A document was not valid JSON
    #[error("invalid JSON from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// A document was valid JSON but not an object
    #[error("expected a JSON object from {origin}")]
    NotAnObject { origin: String },

    /// The baseline lacks the structure the merge rewrites
    #[error("malformed target spec for {target}: {reason}")]
    Malformed { target: String, reason: String },

    #[error("failed to serialize spec for {target}: {source}")]
    Serialize {
        target: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to canonicalize spec for {target}: {reason}")]
    Canonicalize { target: String, reason: String },

    /// A target name that is not in the override table
    #[error("unknown target: {0}")]
    UnknownTarget(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SpecError {
    pub(crate) fn malformed(target: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            target: target.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = SpecError> = std::result::Result<T, E>;

//! Generator configuration
//!
//! Three layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. Config file (TOML, optional)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::Defaults;
pub use effective::{CliOverrides, ConfigError, ConfigOrigin, ConfigSource, GeneratorConfig};
pub use merge::{deep_merge, merge_layers};

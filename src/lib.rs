//! AVR target spec generator
//!
//! Regenerates the custom `avr-<mcu>.json` target specifications used to
//! build Rust for AVR microcontrollers. The built-in spec of a reference AVR
//! target is taken from a nightly rustc and combined with a static per-MCU
//! override table; every result is written with canonical formatting so that
//! regenerating against an unchanged toolchain is a no-op.

pub mod check;
pub mod config;
pub mod error;
pub mod legacy;
pub mod pipeline;
pub mod synth;
pub mod toolchain;
pub mod writer;

pub use config::{CliOverrides, GeneratorConfig};
pub use error::SpecError;
pub use pipeline::Generator;
pub use synth::{Layer, OverrideTable, Synthesizer};
pub use toolchain::{BaselineProvider, Rustc, SavedBaseline};
pub use writer::SpecWriter;

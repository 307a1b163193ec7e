//! Run orchestration
//!
//! Each entry point queries the baseline once, synthesizes every selected
//! target in memory and only then touches the output directory:
//! - `generate`: table-driven specs, written
//! - `sync`: legacy refresh of the files already present
//! - `check`: table-driven specs, compared with the files on disk

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::check::{self, CheckReport};
use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::legacy;
use crate::synth::{OverrideTable, Synthesizer};
use crate::toolchain::{BaselineProvider, BaselineSource, Rustc, SavedBaseline};
use crate::writer::SpecWriter;

/// Everything a run needs, resolved from the configuration
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    table: OverrideTable,
    synthesizer: Synthesizer,
    writer: SpecWriter,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        let table = OverrideTable::from_config(&config);
        let synthesizer = Synthesizer::new(config.report_flag.clone());
        let writer = SpecWriter::from_config(&config);
        Self {
            config,
            table,
            synthesizer,
            writer,
        }
    }

    /// Replace the override table
    pub fn with_table(mut self, table: OverrideTable) -> Self {
        self.table = table;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn table(&self) -> &OverrideTable {
        &self.table
    }

    pub fn writer(&self) -> &SpecWriter {
        &self.writer
    }

    /// Baseline source selected by the configuration
    pub fn baseline_source(&self) -> BaselineSource {
        match &self.config.baseline {
            Some(path) => BaselineSource::Saved(SavedBaseline::new(path)),
            None => BaselineSource::Rustc(Rustc::new(
                &self.config.rustc,
                &self.config.reference_target,
            )),
        }
    }

    /// Synthesize `targets` (all when empty) against `baseline`
    pub fn synthesize(
        &self,
        baseline: &Map<String, Value>,
        targets: &[String],
    ) -> Result<Vec<(String, Map<String, Value>)>> {
        let selected = self.table.select(targets)?;
        self.synthesizer.synthesize_all(baseline, &self.table, &selected)
    }

    /// Regenerate spec files from the override table
    pub fn generate<P: BaselineProvider + ?Sized>(
        &self,
        provider: &P,
        targets: &[String],
    ) -> Result<Vec<PathBuf>> {
        let selected = self.table.select(targets)?;
        let baseline = provider.describe()?;
        let docs = self
            .synthesizer
            .synthesize_all(&baseline, &self.table, &selected)?;
        self.writer.write_all(&docs)
    }

    /// Legacy refresh of existing files in the output directory
    pub fn sync<P: BaselineProvider + ?Sized>(&self, provider: &P) -> Result<Vec<PathBuf>> {
        // Fail on a missing directory before querying the toolchain.
        legacy::discover(&self.writer)?;
        let baseline = provider.describe()?;
        legacy::refresh_existing(&baseline, &self.synthesizer, &self.writer)
    }

    /// Compare the files on disk with a fresh synthesis
    pub fn check<P: BaselineProvider + ?Sized>(
        &self,
        provider: &P,
        targets: &[String],
    ) -> Result<CheckReport> {
        let selected = self.table.select(targets)?;
        let baseline = provider.describe()?;
        let docs = self
            .synthesizer
            .synthesize_all(&baseline, &self.table, &selected)?;
        check::check(&docs, &self.writer)
    }
}

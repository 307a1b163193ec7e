//! Target spec synthesis
//!
//! A spec is produced from the baseline by:
//! 1. copying it and applying the override layers in order
//! 2. pointing every pre-link argument list at the resolved cpu
//!    (`-mmcu=<cpu>` as first element, report flag appended)
//! 3. removing the `is-builtin` marker
//!
//! The forward mode layers `common < target`. The legacy refresh uses a single
//! layer made of an existing file, restricted to [`LEGACY_CARRIED_FIELDS`].

mod layer;
mod table;

pub use layer::{merge_layers, Carry, Layer};
pub use table::OverrideTable;

use serde_json::{Map, Value};

use crate::error::{Result, SpecError};

/// Linker flags keyed by linker flavor
pub const PRE_LINK_ARGS: &str = "pre-link-args";

/// Marks a target as compiled into rustc; generated targets are not
pub const BUILTIN_MARKER: &str = "is-builtin";

/// Keys an existing spec keeps during a legacy refresh
pub const LEGACY_CARRIED_FIELDS: &[&str] = &["cpu", "data-layout"];

/// Applies override layers and the structural rewrites
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    report_flag: Option<String>,
}

impl Synthesizer {
    /// `report_flag` is appended to every pre-link list when set
    pub fn new(report_flag: Option<String>) -> Self {
        Self { report_flag }
    }

    /// Produce the spec for `target`
    pub fn synthesize(
        &self,
        target: &str,
        baseline: &Map<String, Value>,
        layers: &[Layer],
    ) -> Result<Map<String, Value>> {
        let mut doc = merge_layers(baseline, layers);

        let cpu = match doc.get("cpu") {
            Some(Value::String(cpu)) if !cpu.is_empty() => cpu.clone(),
            Some(_) => return Err(SpecError::malformed(target, "`cpu` is not a string")),
            None => return Err(SpecError::malformed(target, "no `cpu` after overrides")),
        };

        rewrite_pre_link_args(target, &mut doc, &cpu, self.report_flag.as_deref())?;

        if doc.remove(BUILTIN_MARKER).is_some() {
            log::trace!("{}: dropped {}", target, BUILTIN_MARKER);
        }

        Ok(doc)
    }

    /// Produce specs for `targets` from the override table.
    ///
    /// Stops at the first failing target; nothing is returned for the others.
    pub fn synthesize_all(
        &self,
        baseline: &Map<String, Value>,
        table: &OverrideTable,
        targets: &[String],
    ) -> Result<Vec<(String, Map<String, Value>)>> {
        targets
            .iter()
            .map(|target| -> Result<(String, Map<String, Value>)> {
                let layers = table.layers_for(target)?;
                let doc = self.synthesize(target, baseline, &layers)?;
                log::debug!("synthesized {}", target);
                Ok((target.clone(), doc))
            })
            .collect()
    }

    /// Refresh an existing spec: the baseline wins everywhere except for
    /// [`LEGACY_CARRIED_FIELDS`], which are kept from `existing`.
    pub fn refresh(
        &self,
        target: &str,
        baseline: &Map<String, Value>,
        existing: Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        let layer = Layer::carrying(target, existing, LEGACY_CARRIED_FIELDS.iter().copied());
        self.synthesize(target, baseline, &[layer])
    }
}

/// Replace the first element of every pre-link list with `-mmcu=<cpu>` and
/// append `report_flag` when given.
pub fn rewrite_pre_link_args(
    target: &str,
    doc: &mut Map<String, Value>,
    cpu: &str,
    report_flag: Option<&str>,
) -> Result<()> {
    let flavors = match doc.get_mut(PRE_LINK_ARGS) {
        Some(Value::Object(flavors)) => flavors,
        Some(_) => {
            return Err(SpecError::malformed(
                target,
                format!("`{}` is not an object", PRE_LINK_ARGS),
            ))
        }
        None => {
            return Err(SpecError::malformed(
                target,
                format!("missing `{}`", PRE_LINK_ARGS),
            ))
        }
    };

    if flavors.is_empty() {
        return Err(SpecError::malformed(
            target,
            format!("`{}` has no linker flavors", PRE_LINK_ARGS),
        ));
    }

    let mmcu = format!("-mmcu={}", cpu);
    for (flavor, args) in flavors.iter_mut() {
        let args = match args {
            Value::Array(args) => args,
            _ => {
                return Err(SpecError::malformed(
                    target,
                    format!("`{}.{}` is not a list", PRE_LINK_ARGS, flavor),
                ))
            }
        };
        let first = args.first_mut().ok_or_else(|| {
            SpecError::malformed(
                target,
                format!("`{}.{}` is empty", PRE_LINK_ARGS, flavor),
            )
        })?;
        *first = Value::String(mmcu.clone());

        if let Some(flag) = report_flag {
            args.push(Value::String(flag.to_string()));
        }
    }
    Ok(())
}

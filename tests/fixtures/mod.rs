//! Shared fixtures for integration tests
//!
//! - A captured baseline spec for `avr-unknown-gnu-atmega328`
//! - Generator setups writing into a temporary directory
//! - A fake `rustc` script for exercising the toolchain probe

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use avr_target_specs::{CliOverrides, Generator, GeneratorConfig};
use serde_json::{Map, Value};

/// Path to the captured baseline
pub fn baseline_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/baseline.json")
}

/// The captured baseline as a JSON object
pub fn baseline() -> Map<String, Value> {
    let text = fs::read_to_string(baseline_path()).unwrap();
    match serde_json::from_str(&text).unwrap() {
        Value::Object(map) => map,
        _ => panic!("baseline fixture is not an object"),
    }
}

/// Generator writing to `out_dir`, reading the captured baseline
pub fn generator(out_dir: &Path) -> Generator {
    generator_with(out_dir, None, false)
}

/// Generator with an optional config file and report flag switch
pub fn generator_with(out_dir: &Path, config: Option<&Path>, no_report_flag: bool) -> Generator {
    let overrides = CliOverrides {
        out_dir: Some(out_dir.to_path_buf()),
        baseline: Some(baseline_path()),
        no_report_flag,
        ..Default::default()
    };
    Generator::new(GeneratorConfig::build(config, &overrides).unwrap())
}

/// Read a generated spec back as a JSON object
pub fn read_spec(path: &Path) -> Map<String, Value> {
    let text = fs::read_to_string(path).unwrap();
    match serde_json::from_str(&text).unwrap() {
        Value::Object(map) => map,
        _ => panic!("{} is not an object", path.display()),
    }
}

/// Write an executable script that behaves like `rustc` for the two
/// invocations the generator makes.
#[cfg(unix)]
pub fn fake_rustc(dir: &Path, version: &str, spec_exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-rustc");
    let body = format!(
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "{version}"
    exit 0
fi
if [ "$1" = "--print" ] && [ "$2" = "target-spec-json" ]; then
    if [ {code} -ne 0 ]; then
        echo "error: the option \`Z\` is only accepted on the nightly compiler" >&2
        exit {code}
    fi
    cat "{baseline}"
    exit 0
fi
echo "unexpected arguments: $*" >&2
exit 2
"#,
        version = version,
        code = spec_exit_code,
        baseline = baseline_path().display(),
    );
    fs::write(&script, body).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Like [`fake_rustc`], but the spec query succeeds and prints `spec_output`
/// verbatim instead of the captured baseline.
#[cfg(unix)]
pub fn fake_rustc_printing(dir: &Path, version: &str, spec_output: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let output = dir.join("spec-output");
    fs::write(&output, spec_output).unwrap();

    let script = dir.join("fake-rustc");
    let body = format!(
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "{version}"
    exit 0
fi
if [ "$1" = "--print" ] && [ "$2" = "target-spec-json" ]; then
    cat "{output}"
    exit 0
fi
exit 2
"#,
        version = version,
        output = output.display(),
    );
    fs::write(&script, body).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

//! `avr-specs` command-line tool

use std::path::PathBuf;
use std::process;

use avr_target_specs::check::Status;
use avr_target_specs::{CliOverrides, Generator, GeneratorConfig};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "avr-specs")]
#[command(about = "Regenerate AVR target specification files", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct GlobalArgs {
    /// Config file (TOML) with extra targets and defaults
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Output directory (default: avr-specs)
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// File name prefix of generated specs (default: avr)
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// rustc program to query (default: rustc)
    #[arg(long, global = true)]
    rustc: Option<String>,

    /// Built-in target used as the baseline (default: avr-unknown-gnu-atmega328)
    #[arg(long, global = true)]
    reference_target: Option<String>,

    /// Use a saved baseline spec instead of querying rustc
    #[arg(long, global = true)]
    baseline: Option<PathBuf>,

    /// Do not append the memory usage flag to pre-link arguments
    #[arg(long, global = true)]
    no_report_flag: bool,

    /// More log output (repeatable)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one spec per target from the override table (default)
    Generate {
        /// Only these targets (repeatable; default: all)
        #[arg(long = "target", short = 't')]
        targets: Vec<String>,
    },

    /// Refresh the specs already in the output directory, keeping only
    /// their cpu and data-layout
    Sync,

    /// Report specs that differ from a fresh generation, writing nothing
    Check {
        /// Only these targets (repeatable; default: all)
        #[arg(long = "target", short = 't')]
        targets: Vec<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the configured targets
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global);

    let overrides = CliOverrides {
        out_dir: cli.global.out_dir.clone(),
        prefix: cli.global.prefix.clone(),
        rustc: cli.global.rustc.clone(),
        reference_target: cli.global.reference_target.clone(),
        baseline: cli.global.baseline.clone(),
        no_report_flag: cli.global.no_report_flag,
    };

    let config = match GeneratorConfig::build(cli.global.config.as_deref(), &overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };
    log::debug!("config sources: {:?}", config.sources);

    let generator = Generator::new(config);

    match cli.command.unwrap_or(Commands::Generate { targets: Vec::new() }) {
        Commands::Generate { targets } => run_generate(&generator, &targets),
        Commands::Sync => run_sync(&generator),
        Commands::Check { targets, json } => run_check(&generator, &targets, json),
        Commands::List { json } => run_list(&generator, json),
    }
}

fn init_logging(args: &GlobalArgs) {
    let level = if args.quiet {
        log::LevelFilter::Error
    } else {
        match args.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn run_generate(generator: &Generator, targets: &[String]) {
    match generator.generate(&generator.baseline_source(), targets) {
        Ok(paths) => {
            log::info!(
                "generated {} target specs in {}",
                paths.len(),
                generator.writer().dir().display()
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_sync(generator: &Generator) {
    match generator.sync(&generator.baseline_source()) {
        Ok(paths) => {
            log::info!("refreshed {} target specs", paths.len());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_check(generator: &Generator, targets: &[String], json_output: bool) {
    let report = match generator.check(&generator.baseline_source(), targets) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        for entry in &report.entries {
            let label = match entry.status {
                Status::UpToDate => "ok",
                Status::Reformatted => "reformatted",
                Status::Stale => "stale",
                Status::Missing => "missing",
            };
            println!(
                "{:<12} {:<14} {}  {}",
                label,
                entry.target,
                &entry.digest[..12],
                entry.path.display()
            );
        }
        println!();
        println!(
            "{} up to date, {} reformatted, {} stale, {} missing",
            report.count(Status::UpToDate),
            report.count(Status::Reformatted),
            report.count(Status::Stale),
            report.count(Status::Missing)
        );
    }

    if !report.is_clean() {
        process::exit(1);
    }
}

fn run_list(generator: &Generator, json_output: bool) {
    let table = generator.table();
    let writer = generator.writer();

    if json_output {
        let output: Vec<serde_json::Value> = table
            .names()
            .map(|name| {
                serde_json::json!({
                    "target": name,
                    "cpu": table.cpu(name),
                    "path": writer.path_for(name),
                    "overrides": table.target(name),
                })
            })
            .collect();

        match serde_json::to_string_pretty(&serde_json::json!({
            "sources": generator.config().sources,
            "common": table.common(),
            "targets": output,
        })) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    if table.is_empty() {
        println!("No targets configured");
        return;
    }

    println!("Configured targets ({} total):\n", table.len());
    for name in table.names() {
        println!(
            "  {:<14} cpu={:<14} {}",
            name,
            table.cpu(name).unwrap_or("-"),
            writer.path_for(name).display()
        );
    }
    if !table.common().is_empty() {
        println!();
        let common: Vec<String> = table
            .common()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        println!("  Common: {}", common.join(", "));
    }
}

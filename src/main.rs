//! jsrt command-line runner
//!
//! Evaluates script files and inline source, and runs Jasmine-style spec files.
//!
//! Run a script: cargo run --release -- run script.js
//! Run specs:    cargo run --release -- spec specs/errorHandlingSpec.js

use clap::{ArgAction, Parser, Subcommand};
use jsrt::{
    metrics::{RunMetrics, SpecMetrics},
    Config, Engine, JsrtError, Outcome, SpecReport,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, info_span, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for the jsrt runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON config file overriding runtime defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Let specs that record no expectations pass
    #[arg(long, global = true, default_value_t = false)]
    allow_empty_specs: bool,

    /// Print a timing summary after the run
    #[arg(long, global = true, default_value_t = false)]
    timings: bool,

    /// Increase output verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a script file
    Run {
        file: PathBuf,
    },
    /// Evaluate inline source and print the completion value
    Eval {
        source: String,
    },
    /// Run one or more spec files
    Spec {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Emit the combined report as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let succeeded = match &cli.command {
        Command::Run { file } => run_script(file, config, cli.timings),
        Command::Eval { source } => eval_source(source, config, cli.timings),
        Command::Spec { files, json } => run_spec_files(files, config, *json, cli.timings),
    };

    if !succeeded {
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config, JsrtError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if cli.allow_empty_specs {
        config.fail_on_empty_specs = false;
    }
    Ok(config)
}

fn run_script(file: &Path, config: Config, timings: bool) -> bool {
    let _span = info_span!("run", file = %file.display()).entered();
    let source_bytes = std::fs::metadata(file).map(|m| m.len() as usize).unwrap_or(0);
    let mut engine = Engine::with_config(config);

    let start = Instant::now();
    let result = engine.run_file(file);
    let duration = start.elapsed();

    let output = engine.take_output();
    flush_output(&output);
    let succeeded = report_outcome(&mut engine, result, false);

    if timings {
        let metrics = RunMetrics {
            source_bytes,
            duration,
            output_lines: output.len(),
            raised: !succeeded,
        };
        info!("");
        info!("{}", metrics.format_table());
    }
    succeeded
}

fn eval_source(source: &str, config: Config, timings: bool) -> bool {
    let mut engine = Engine::with_config(config);

    let start = Instant::now();
    let result = engine.try_eval(source);
    let duration = start.elapsed();

    let output = engine.take_output();
    flush_output(&output);
    let succeeded = report_outcome(&mut engine, result, true);

    if timings {
        let metrics = RunMetrics {
            source_bytes: source.len(),
            duration,
            output_lines: output.len(),
            raised: !succeeded,
        };
        info!("");
        info!("{}", metrics.format_table());
    }
    succeeded
}

/// Reports a finished script; returns false when it failed to parse or threw.
fn report_outcome(
    engine: &mut Engine,
    result: Result<Outcome, JsrtError>,
    echo_value: bool,
) -> bool {
    match result {
        Ok(Outcome::Completed(value)) => {
            if echo_value && !value.is_undefined() {
                println!("{}", engine.display(&value));
            }
            true
        }
        Ok(Outcome::Threw(thrown)) => {
            error!("Uncaught {}", thrown);
            false
        }
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}

fn run_spec_files(files: &[PathBuf], config: Config, json: bool, timings: bool) -> bool {
    let mut combined = SpecReport::default();
    let mut runs = Vec::with_capacity(files.len());
    let mut succeeded = true;

    for file in files {
        let _span = info_span!("spec_file", file = %file.display()).entered();
        // Every file gets its own global object.
        let mut engine = Engine::with_config(config.clone());

        let start = Instant::now();
        let result = engine.run_spec_file(file);
        let duration = start.elapsed();
        flush_output(&engine.take_output());

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                error!("{}: {}", file.display(), e);
                succeeded = false;
                continue;
            }
        };

        let metrics = SpecMetrics::new(file.display().to_string(), &report, duration);
        if !json {
            print_report(&report);
            info!("{}", metrics.format_summary());
        }
        if report.total() == 0 {
            warn!("{} declared no specs", file.display());
        }
        succeeded &= report.success();
        runs.push(metrics);
        combined.merge(report);
    }

    if json {
        match serde_json::to_string_pretty(&combined) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("{}", JsrtError::Serialization(e.to_string()));
                succeeded = false;
            }
        }
    }

    if timings {
        info!("");
        info!("{}", SpecMetrics::format_table(&runs));
    }
    succeeded
}

fn print_report(report: &SpecReport) {
    for result in &report.results {
        if result.passed() {
            info!("  ✓ {}", result.full_name);
        } else if result.failures().is_empty() {
            info!("  - {} (pending)", result.full_name);
        } else {
            error!("  ✗ {}", result.full_name);
            for message in result.failures() {
                error!("      {}", message);
            }
        }
    }
}

fn flush_output(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info,jsrt=info",
        1 => "debug,jsrt=debug",
        _ => "jsrt=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    use tracing_tree::HierarchicalLayer;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            HierarchicalLayer::new(2)
                .with_targets(false)
                .with_bracketed_fields(true),
        )
        .init();
}

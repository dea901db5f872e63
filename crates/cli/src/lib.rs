//! CLI for AccelBench.
//!
//! Provides the `run` subcommand driving the built-in measurement suite
//! through the full split-phase pipeline, `analyze` for standalone
//! allocation-log files, `report` to re-render a saved session, and
//! `status` for configuration introspection.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

mod suite;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use accelbench_alloclog::analyzer;
use accelbench_harness::report;
use accelbench_harness::sink::read_session;

/// AccelBench CLI.
#[derive(Parser, Debug)]
#[command(name = "accelbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the built-in benchmark suite and write results.
    ///
    /// Results land in the output directory as:
    /// - raw/ - individual JSON files per benchmark
    /// - all_results.json - combined JSON document with run metadata
    /// - summary.md - markdown summary table
    Run {
        /// Output directory.
        #[arg(short, long, default_value = "benchmarks/output")]
        output: PathBuf,

        /// Enable device-resource sampling alongside timing.
        #[arg(long)]
        sample_resources: bool,

        /// Device indices to observe. Only the first entry is honored.
        #[arg(long = "device", default_values_t = vec![0u32])]
        devices: Vec<u32>,

        /// Cap on resource-sampled rounds per benchmark.
        #[arg(long)]
        max_sampled_rounds: Option<u32>,

        /// Minimum timed rounds per benchmark.
        #[arg(long, default_value_t = 5)]
        min_rounds: u64,

        /// Time budget per benchmark, seconds.
        #[arg(long, default_value_t = 1.0)]
        max_time: f64,

        /// Source commit recorded in the run metadata.
        #[arg(long, env = "ACCELBENCH_COMMIT")]
        commit: Option<String>,

        /// Verbose output.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze allocation-log files and print peak/leak figures.
    Analyze {
        /// Log files, scanned in order with one running balance.
        #[arg(required = true)]
        logs: Vec<PathBuf>,
    },

    /// Render the markdown summary for a saved session document.
    Report {
        /// Path to an all_results.json document.
        input: PathBuf,

        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show harness status and configuration.
    Status {
        /// Show detailed status information.
        #[arg(short, long)]
        detailed: bool,
    },
}

/// Run the CLI with the given arguments.
pub fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            output,
            sample_resources,
            devices,
            max_sampled_rounds,
            min_rounds,
            max_time,
            commit,
            verbose,
        } => suite::run_suite(suite::SuiteOptions {
            output,
            sample_resources,
            devices,
            max_sampled_rounds,
            min_rounds,
            max_time,
            commit,
            verbose,
        }),

        Commands::Analyze { logs } => {
            let analysis =
                analyzer::analyze_files(&logs).context("failed to analyze allocation logs")?;
            println!("Records scanned:  {}", analysis.events);
            println!("Peak memory:      {} bytes", analysis.peak_bytes);
            println!("Leaked memory:    {} bytes", analysis.leaked_bytes);
            for warning in &analysis.warnings {
                let line = warning
                    .line
                    .map(|l| format!(" (line {l})"))
                    .unwrap_or_default();
                println!("{} {}{line}", "warning:".yellow().bold(), warning.detail);
            }
            Ok(())
        }

        Commands::Report { input, output } => {
            let record = read_session(&input)
                .with_context(|| format!("cannot read session from {}", input.display()))?;
            let summary = report::generate_summary(&record.metadata, &record.results);
            match output {
                Some(path) => std::fs::write(&path, summary)
                    .with_context(|| format!("cannot write {}", path.display()))?,
                None => print!("{summary}"),
            }
            Ok(())
        }

        Commands::Status { detailed } => {
            println!("AccelBench measurement harness");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!(
                "Resource sampling backend: {}",
                if cfg!(feature = "nvml") {
                    "nvml (accelerator)"
                } else {
                    "host-process (sysinfo)"
                }
            );

            if detailed {
                println!("\nOutput layout:");
                println!("  - benchmarks/output/raw/");
                println!("  - benchmarks/output/all_results.json");
                println!("  - benchmarks/output/summary.md");
                println!("\nAllocation log format:");
                println!(
                    "  Thread,Time,Action,Pointer,Size,Stream (one file per device, .dev<N> suffix)"
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["accelbench", "run"]).unwrap();
        match cli.command {
            Commands::Run {
                devices,
                min_rounds,
                sample_resources,
                ..
            } => {
                assert_eq!(devices, vec![0]);
                assert_eq!(min_rounds, 5);
                assert!(!sample_resources);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_analyze_requires_a_log() {
        assert!(Cli::try_parse_from(["accelbench", "analyze"]).is_err());
    }
}

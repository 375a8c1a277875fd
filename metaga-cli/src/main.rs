//! MetaGA CLI — summarize and inspect run tables.
//!
//! Commands:
//! - `summarize` — run the full pipeline and write the narrative, tabular
//!   and (optionally) JSON reports
//! - `inspect` — load, filter, group and validate only, printing the
//!   exclusion diagnostics and the instance-family breakdown

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use metaga_core::{
    dataset_hash, load_records, retain_completed, run_summary, synthetic_records,
    validate_balance, write_records_csv, BalanceReport, GroupedIndex, InstanceBreakdown,
    SummaryConfig,
};

#[derive(Parser)]
#[command(
    name = "metaga",
    about = "MetaGA run-table summarizer — RR vs MMMR significance reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the report artifacts.
    Summarize {
        /// Path to the run table (CSV).
        #[arg(long, short = 'f')]
        file: PathBuf,

        /// Narrative markdown report (appended to).
        #[arg(long, default_value = "results.md")]
        narrative: PathBuf,

        /// Tabular CSV report (overwritten).
        #[arg(long, default_value = "per_instance.csv")]
        tabular: PathBuf,

        /// Optional JSON summary artifact.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Generate a synthetic demo table at the input path if it is absent.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// Print balance diagnostics and the instance breakdown; write nothing.
    Inspect {
        /// Path to the run table (CSV).
        #[arg(long, short = 'f')]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize {
            file,
            narrative,
            tabular,
            json,
            synthetic,
        } => run_summarize(file, narrative, tabular, json, synthetic),
        Commands::Inspect { file } => run_inspect(&file),
    }
}

fn run_summarize(
    file: PathBuf,
    narrative: PathBuf,
    tabular: PathBuf,
    json: Option<PathBuf>,
    synthetic: bool,
) -> Result<()> {
    if synthetic && !file.exists() {
        eprintln!(
            "WARNING: generating synthetic data at {} — results are for smoke-testing only",
            file.display()
        );
        let records = synthetic_records(42, &[0, 1], &["gdb1", "gdb2", "bier127"], 5);
        write_records_csv(&file, &records)
            .with_context(|| format!("failed to write synthetic table: {}", file.display()))?;
    }

    let config = SummaryConfig {
        input: file,
        narrative_path: narrative,
        tabular_path: tabular,
        json_path: json,
    };
    let outcome = run_summary(&config)?;

    if outcome.discarded > 0 {
        println!(
            "Dropped {} of {} runs (state killed or crashed)",
            outcome.discarded, outcome.loaded
        );
    }
    print_exclusions(&outcome.balance);
    print!("{}", outcome.breakdown.render());

    println!();
    println!("Dataset hash: {}", outcome.report.dataset_hash);
    println!("Narrative report appended to: {}", config.narrative_path.display());
    println!("Tabular report written to: {}", config.tabular_path.display());
    if let Some(json_path) = &config.json_path {
        println!("JSON summary written to: {}", json_path.display());
    }

    Ok(())
}

fn run_inspect(file: &Path) -> Result<()> {
    let records = load_records(file)?;
    let loaded = records.len();
    let records = retain_completed(records);
    let discarded = loaded - records.len();
    let hash = dataset_hash(&records);

    let mut index = GroupedIndex::from_records(records)?;
    let balance = validate_balance(&mut index);
    let breakdown = InstanceBreakdown::from_index(&index);

    println!("Loaded {loaded} runs ({discarded} dropped as killed/crashed)");
    println!(
        "Retained {} runs across {} (k, instance) pairs",
        index.len(),
        index.pairs().len()
    );
    print_exclusions(&balance);
    print!("{}", breakdown.render());
    println!("Dataset hash: {hash}");

    Ok(())
}

fn print_exclusions(balance: &BalanceReport) {
    for exclusion in &balance.excluded {
        println!(
            "Excluding routing.num_tours={}, instance.name={} due to unbalanced data",
            exclusion.pair.num_tours, exclusion.pair.instance
        );
    }
    if let Some(min_seeds) = balance.min_seeds {
        println!(
            "Balanced design: {} heuristic groups, at least {} seeds per group",
            balance.max_groups, min_seeds
        );
    }
}

//! Zonal statistics pipeline.
//!
//! `extract` computes one statistics table per zone partition;
//! `reconcile` validates those tables and merges them onto one schema.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reconciler::Reconciler;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use zonal_pipeline::{ExtractRunner, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "zonal-pipeline")]
#[command(about = "Zonal statistics of raster imagery over land-cover partitions")]
struct Args {
    /// Configuration file path (defaults apply when omitted)
    #[arg(short, long, global = true, env = "ZONAL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute a statistics table for every zone partition
    Extract {
        /// Directory of zone partition shapefiles
        #[arg(long)]
        partitions: PathBuf,

        /// Image metadata CSV
        #[arg(long)]
        metadata: PathBuf,

        /// Directory the partition tables are written to
        #[arg(long)]
        output: PathBuf,
    },

    /// Validate partition tables and merge them into one CSV
    Reconcile {
        /// Directory of partition tables
        #[arg(long)]
        tables: PathBuf,

        /// Directory of zone partition shapefiles
        #[arg(long)]
        partitions: PathBuf,

        /// Merged CSV path
        #[arg(long)]
        output: PathBuf,

        /// Glob selecting the tables to merge (overrides the config)
        #[arg(long)]
        pattern: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level, args.json_logs)?;

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    config.apply_env_overrides()?;
    config.validate().context("Invalid pipeline configuration")?;

    match args.command {
        Command::Extract {
            partitions,
            metadata,
            output,
        } => extract(&config, &partitions, &metadata, &output),
        Command::Reconcile {
            tables,
            partitions,
            output,
            pattern,
        } => {
            if let Some(pattern) = pattern {
                config.table_pattern = pattern;
            }
            reconcile(&config, &tables, &partitions, &output)
        }
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn extract(config: &PipelineConfig, partitions: &Path, metadata: &Path, output: &Path) -> Result<()> {
    let runner = ExtractRunner::new(config);
    let summary = runner.run(partitions, metadata, output)?;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    for outcome in summary.failures() {
        warn!(partition = %outcome.partition.display(), "Partition produced no table");
    }
    if summary.failed > 0 {
        bail!("{} of {} partitions failed", summary.failed, summary.partitions());
    }
    Ok(())
}

fn reconcile(config: &PipelineConfig, tables: &Path, partitions: &Path, output: &Path) -> Result<()> {
    let catalog = config.date_catalog()?;
    info!(dates = catalog.len(), "Loaded date catalog");

    let reconciler = Reconciler::new(config.reconcile_config(), &catalog);
    let outcome = match reconciler.reconcile(tables, partitions, output) {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(report) = e.report() {
                print!("{}", report);
            }
            return Err::<(), _>(e).with_context(|| format!("Failed to reconcile tables in {:?}", tables));
        }
    };

    print!("{}", outcome.report);
    for rejected in &outcome.rejected {
        println!("Rejected {}: {}", rejected.path.display(), rejected.reason);
    }
    println!(
        "Merged {} rows from {} tables into {}",
        outcome.rows_written,
        outcome.tables_merged,
        output.display()
    );
    Ok(())
}

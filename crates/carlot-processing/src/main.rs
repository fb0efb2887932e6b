//! CLI entry point for the used-vehicle listing pipeline.

use anyhow::{Context, Result};
use carlot_processing::reporting::write_report_to_file;
use carlot_processing::{
    EtlPipeline, EtlReport, IngestionReport, Ingestor, PipelineConfig, SqliteStore,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Used-vehicle listing ingestion and ETL pipeline",
    long_about = "Loads raw used-vehicle listings into a relational store and produces a \
                  cleaned, feature-enriched analysis dataset.\n\n\
                  ENVIRONMENT VARIABLES (also read from .env):\n  \
                  CARLOT_INPUT_PATH       Source listings CSV\n  \
                  CARLOT_OUTPUT_PATH      Analysis dataset CSV\n  \
                  CARLOT_DATABASE_PATH    SQLite database file\n\n\
                  EXAMPLES:\n  \
                  carlot setup\n  \
                  carlot ingest -i data/raw/used_cars.csv\n  \
                  carlot etl -o data/processed/cleaned_car_data.csv --json"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// SQLite database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output the run report as JSON to stdout
    ///
    /// Disables all logs; only outputs the final JSON report.
    #[arg(long, global = true)]
    json: bool,

    /// Write the run report as JSON into this directory
    #[arg(short = 'r', long, global = true)]
    emit_report: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database tables and indexes
    Setup {
        /// Drop existing tables first
        #[arg(long)]
        reset: bool,
    },
    /// Load the source CSV into the store
    Ingest {
        /// Source listings CSV
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Date stamped on every listing (YYYY-MM-DD, default today)
        #[arg(long)]
        listing_date: Option<NaiveDate>,
    },
    /// Build the analysis dataset from the store
    Etl {
        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Year vehicle age is computed against (default current year)
        #[arg(long)]
        current_year: Option<i32>,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let mut builder = PipelineConfig::from_env();
    if let Some(ref database) = args.database {
        builder = builder.database_path(database);
    }
    match &args.command {
        Command::Setup { .. } => {}
        Command::Ingest {
            input,
            listing_date,
        } => {
            if let Some(input) = input {
                builder = builder.input_path(input);
            }
            if let Some(date) = listing_date {
                builder = builder.listing_date(*date);
            }
        }
        Command::Etl {
            output,
            current_year,
        } => {
            if let Some(output) = output {
                builder = builder.output_path(output);
            }
            if let Some(year) = current_year {
                builder = builder.current_year(*year);
            }
        }
    }
    let config = builder.build()?;

    match &args.command {
        Command::Setup { reset } => run_setup(&config, *reset, &args),
        Command::Ingest { .. } => run_ingest(&config, &args),
        Command::Etl { .. } => run_etl(&config, &args),
    }
}

fn run_setup(config: &PipelineConfig, reset: bool, args: &Args) -> Result<()> {
    if let Some(parent) = config.database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let store = SqliteStore::open(&config.database_path)?;
    if reset {
        store.reset()?;
    } else {
        store.provision()?;
    }
    let tables = store.table_names()?;

    if args.json {
        let report = serde_json::json!({
            "database": config.database_path.display().to_string(),
            "reset": reset,
            "tables": tables,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Database ready: {}", config.database_path.display());
        println!("Tables: {}", tables.join(", "));
    }
    Ok(())
}

fn run_ingest(config: &PipelineConfig, args: &Args) -> Result<()> {
    let ingestor = match config.listing_date {
        Some(date) => Ingestor::new(date),
        None => Ingestor::default(),
    };

    let mut store = SqliteStore::open(&config.database_path)?;
    let outcome = ingestor
        .ingest_file(&config.input_path, &mut store)
        .with_context(|| format!("Ingestion from {} failed", config.input_path.display()))?;

    emit(&outcome.report, "ingest", args)?;
    if !args.json {
        print_ingestion_summary(&outcome.report);
    }
    Ok(())
}

fn run_etl(config: &PipelineConfig, args: &Args) -> Result<()> {
    let pipeline = match config.current_year {
        Some(year) => EtlPipeline::new(year),
        None => EtlPipeline::default(),
    };

    let store = SqliteStore::open(&config.database_path)?;
    let report = pipeline
        .run(&store, &config.output_path)
        .context("ETL run failed")?;

    emit(&report, "etl", args)?;
    if !args.json {
        print_etl_summary(&report);
    }
    Ok(())
}

/// Print the report as JSON and/or write it to the report directory.
fn emit<R: serde::Serialize>(report: &R, name: &str, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    if let Some(ref dir) = args.emit_report {
        let path = write_report_to_file(report, dir, name)?;
        info!("Report written to: {}", path.display());
    }
    Ok(())
}

fn print_ingestion_summary(report: &IngestionReport) {
    println!();
    println!("{}", "=".repeat(60));
    println!("INGESTION COMPLETE");
    println!("{}", "=".repeat(60));
    if let Some(ref input) = report.input_file {
        println!("Input:    {}", input);
    }
    println!("Store:    {}", report.store);
    println!("Duration: {}ms", report.duration_ms);
    println!();
    println!("  Records read:      {}", report.records_read);
    println!(
        "  Vehicles inserted: {} ({} duplicates dropped)",
        report.vehicles_inserted, report.duplicates_dropped
    );
    println!("  Listings inserted: {}", report.listings_inserted);
    println!(
        "  Defaulted values:  {} mileage, {} price",
        report.mileage_defaulted, report.price_defaulted
    );
    println!("  Truncated models:  {}", report.truncated_models);
    println!(
        "  Resolution:        {} resolved, {} unmatched, {} ambiguous",
        report.resolution.resolved, report.resolution.unmatched, report.resolution.ambiguous
    );
    println!("{}", "=".repeat(60));
}

fn print_etl_summary(report: &EtlReport) {
    println!();
    println!("{}", "=".repeat(60));
    println!("ETL COMPLETE");
    println!("{}", "=".repeat(60));
    if let Some(ref output) = report.output_file {
        println!(
            "Output:   {} ({} rows x {} columns)",
            output,
            report.rows_written,
            report.columns.len()
        );
    }
    println!("Store:    {}", report.store);
    println!("Duration: {}ms", report.duration_ms);
    println!();
    println!("  Rows loaded:          {}", report.rows_loaded);
    println!("  After mileage filter: {}", report.filter.after_mileage);
    println!("  After price filter:   {}", report.filter.after_price);
    println!(
        "  Engine size imputed:  {} ({} by column mean)",
        report.imputation.imputed, report.imputation.mean_fallbacks
    );
    println!("  Vehicle age year:     {}", report.current_year);
    println!("{}", "=".repeat(60));
}

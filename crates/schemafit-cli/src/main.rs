mod config;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use schemafit_bench::{GroundTruthStore, StatisticsService};
use schemafit_core::Error as CoreError;
use schemafit_store::PredictionStore;
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use config::ServiceConfig;

#[derive(Debug, Error)]
enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "schemafit", version, about = "Schemafit benchmarking CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one pipeline's stored predictions against ground truth.
    Stats(StatsArgs),
    /// Score every pipeline, discovered from storage or a fixed list.
    StatsAll(StatsAllArgs),
    /// Latest persisted per-environment benchmark rows.
    EnvStats(EnvStatsArgs),
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Postgres connection string; falls back to DATABASE_URL.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: Option<String>,
    /// Directory holding `<table>_gt.json` files; falls back to
    /// SCHEMAFIT_GROUND_TRUTH_DIR, then ./data/ground_truth.
    #[arg(long, value_name = "DIR")]
    ground_truth: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Pipeline whose predictions are scored.
    pipeline: String,
    #[command(flatten)]
    connection: ConnectionArgs,
    /// Compute metrics without recording a benchmark run.
    #[arg(long, default_value_t = false)]
    no_persist: bool,
}

#[derive(Args, Debug)]
struct StatsAllArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
    /// Fixed pipeline list instead of discovering names from storage.
    #[arg(long, value_name = "PIPELINE", value_delimiter = ',')]
    pipelines: Vec<String>,
    /// Compute metrics without recording benchmark runs.
    #[arg(long, default_value_t = false)]
    no_persist: bool,
}

#[derive(Args, Debug)]
struct EnvStatsArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
    /// Pipelines to report on; defaults to every stored pipeline.
    #[arg(long, value_name = "PIPELINE", value_delimiter = ',')]
    pipelines: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Stats(args) => run_stats(args).await,
        Command::StatsAll(args) => run_stats_all(args).await,
        Command::EnvStats(args) => run_env_stats(args).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_service(connection: &ConnectionArgs, persist: bool) -> Result<StatisticsService, CliError> {
    let config = ServiceConfig::resolve(connection.conn.clone(), connection.ground_truth.clone())?;
    let store = PredictionStore::connect(&config.database_url).await?;
    let ground_truth = GroundTruthStore::new(config.ground_truth_dir);

    let mut service = StatisticsService::new(store, ground_truth);
    if !persist {
        service = service.without_persistence();
    }
    Ok(service)
}

async fn run_stats(args: StatsArgs) -> Result<(), CliError> {
    let service = open_service(&args.connection, !args.no_persist).await?;
    let stats = service.pipeline_statistics(&args.pipeline).await?;
    print_json(&stats)
}

async fn run_stats_all(args: StatsAllArgs) -> Result<(), CliError> {
    let service = open_service(&args.connection, !args.no_persist).await?;
    let stats = if args.pipelines.is_empty() {
        service.all_statistics().await?
    } else {
        service.all_statistics_for(&args.pipelines).await?
    };
    print_json(&stats)
}

async fn run_env_stats(args: EnvStatsArgs) -> Result<(), CliError> {
    let service = open_service(&args.connection, false).await?;
    let pipelines = if args.pipelines.is_empty() {
        service.pipeline_names().await?
    } else {
        args.pipelines
    };
    let latest = service.latest_env_statistics(&pipelines).await?;
    print_json(&latest)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

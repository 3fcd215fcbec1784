use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

mod aggregate;
mod config;
mod error;
mod load;
mod models;
mod report;
mod seed;

use aggregate::DashboardDataProcessor;
use config::{DashboardConfig, DisplayFloors};
use error::AggregateError;

#[derive(Parser)]
#[command(name = "engagement-dashboard")]
#[command(about = "Dashboard metrics for security engagement timelines", long_about = None)]
struct Cli {
    /// JSON config file (falls back to DASHBOARD_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,
    /// Chart true status counts without display floors
    #[arg(long, global = true)]
    no_floors: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the demo snapshot
    Seed {
        #[arg(long, default_value = "timelines.json")]
        out: PathBuf,
    },
    /// Convert status rows from a CSV file into a snapshot
    Import {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "timelines.json")]
        out: PathBuf,
    },
    /// Print aggregates as JSON
    Metrics {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = View::All)]
        view: View,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        label: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    All,
    Overall,
    Status,
    Clients,
    Services,
    Trends,
    Workload,
}

/// An empty snapshot has no overall figures; the other views still render.
fn overall_or_null(
    processor: &DashboardDataProcessor<'_>,
) -> anyhow::Result<Option<models::DashboardMetrics>> {
    match processor.overall_metrics() {
        Ok(metrics) => Ok(Some(metrics)),
        Err(AggregateError::EmptyInput) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn metrics_json(
    processor: &DashboardDataProcessor<'_>,
    view: View,
) -> anyhow::Result<serde_json::Value> {
    let value = match view {
        View::Overall => serde_json::to_value(processor.overall_metrics()?)?,
        View::Status => serde_json::to_value(processor.stage_status_distribution())?,
        View::Clients => serde_json::to_value(processor.client_performance())?,
        View::Services => serde_json::to_value(processor.service_type_analysis())?,
        View::Trends => {
            serde_json::to_value(processor.timeline_trends().collect::<Vec<_>>())?
        }
        View::Workload => serde_json::to_value(processor.team_workload())?,
        View::All => json!({
            "overall": overall_or_null(processor)?,
            "statusDistribution": processor.stage_status_distribution(),
            "clientPerformance": processor.client_performance(),
            "serviceTypes": processor.service_type_analysis(),
            "trends": processor.timeline_trends().collect::<Vec<_>>(),
            "teamWorkload": processor.team_workload(),
        }),
    };
    Ok(value)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut config = DashboardConfig::resolve(cli.config.as_deref())
        .context("failed to load dashboard config")?;
    if cli.no_floors {
        config.display_floors = DisplayFloors::none();
    }
    let today = cli.today.unwrap_or_else(|| Utc::now().date_naive());

    match cli.command {
        Commands::Seed { out } => {
            let timelines = seed::demo_timelines(today);
            load::write_json(&out, &timelines)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "Wrote {} demo timelines to {}.",
                timelines.len(),
                out.display()
            );
        }
        Commands::Import { csv, out } => {
            let timelines = load::import_csv(&csv)?;
            load::write_json(&out, &timelines)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "Imported {} timelines from {} into {}.",
                timelines.len(),
                csv.display(),
                out.display()
            );
        }
        Commands::Metrics { input, view } => {
            let timelines = load::load_snapshot(&input)?;
            let processor = DashboardDataProcessor::new(&timelines, today, &config)
                .with_context(|| format!("invalid snapshot {}", input.display()))?;
            let value = metrics_json(&processor, view)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Report { input, label, out } => {
            let timelines = load::load_snapshot(&input)?;
            let processor = DashboardDataProcessor::new(&timelines, today, &config)
                .with_context(|| format!("invalid snapshot {}", input.display()))?;
            let report = report::build_report(&processor, label.as_deref())?;
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

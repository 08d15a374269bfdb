use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;

mod config;
mod db;
mod error;
mod extract;
mod models;
mod notes;
mod payload;
mod report;
mod score;
mod trend;
mod week;

use config::AnalysisConfig;
use models::WeeklyStatus;

#[derive(Parser)]
#[command(name = "carehome-weekly-trends")]
#[command(about = "Weekly care-note trend analysis for long-term-care residents", long_about = None)]
struct Cli {
    /// JSON file overriding keyword vocabularies and thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a realistic sample fortnight
    Seed,
    /// Import daily records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print week-over-week category trends for a resident
    Status {
        #[arg(long)]
        resident: String,
        /// Current week anchor, YYYY-MM-DD
        #[arg(long)]
        week_start: String,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        resident: String,
        #[arg(long)]
        week_start: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Emit the narrative-writer payload
    Payload {
        #[arg(long)]
        resident: String,
        #[arg(long)]
        week_start: String,
        /// Print the formatted prompt input instead of JSON
        #[arg(long)]
        prompt: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

async fn load_status(
    pool: &PgPool,
    analysis_config: &AnalysisConfig,
    resident: &str,
    week_start: &str,
) -> anyhow::Result<WeeklyStatus> {
    let week_start = week::parse_week_start(week_start)?;
    let (records, previous, current) = db::fetch_two_week_records(pool, resident, week_start)
        .await
        .context("failed to fetch two-week records")?;
    debug!(%previous, %current, "analysis window");
    Ok(trend::analyze(analysis_config, records, week_start))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let analysis_config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} daily records from {}.", csv.display());
        }
        Commands::Status { resident, week_start } => {
            let status = load_status(&pool, &analysis_config, &resident, &week_start).await?;
            if status.record_count == 0 {
                println!("No records found for this window.");
                return Ok(());
            }

            println!("Category trends for {resident} ({}):", status.current_range);
            for category_score in &status.scores {
                let fmt = |value: Option<f64>| match value {
                    Some(v) => format!("{v:.1}"),
                    None => "-".to_string(),
                };
                let grade = score::grade_for_score(&analysis_config, category_score.curr);
                println!(
                    "- {}: {} → {} ({}, 등급 {})",
                    category_score.label,
                    fmt(category_score.prev),
                    fmt(category_score.curr),
                    category_score.trend,
                    grade.label()
                );
            }
            if let Some(trend) = &status.trend {
                println!(
                    "- {}: {:.1} → {:.1} ({})",
                    trend.header.meal_amount.label,
                    trend.header.meal_amount.prev,
                    trend.header.meal_amount.curr,
                    trend.header.meal_amount.trend
                );
                println!(
                    "- {}: {:.1}회 → {:.1}회 ({})",
                    trend.header.toilet.label,
                    trend.header.toilet.prev,
                    trend.header.toilet.curr,
                    trend.header.toilet.trend
                );
                println!("- {}: {}", trend.header.meal_type.label, trend.header.meal_type.change);
            }
        }
        Commands::Report { resident, week_start, out } => {
            let status = load_status(&pool, &analysis_config, &resident, &week_start).await?;
            let report = report::build_report(&resident, &status);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Payload { resident, week_start, prompt, out } => {
            let status = load_status(&pool, &analysis_config, &resident, &week_start).await?;
            let output = if prompt {
                format!(
                    "{}\n\n{}",
                    payload::WEEKLY_WRITER_SYSTEM_PROMPT,
                    payload::format_writer_input(&resident, &status, None)
                )
            } else {
                serde_json::to_string_pretty(&status)?
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, output)?;
                    println!("Payload written to {}.", path.display());
                }
                None => println!("{output}"),
            }
        }
    }

    Ok(())
}

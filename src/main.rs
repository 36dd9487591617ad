use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePoolOptions;

mod db;
mod fallback;
mod models;
mod normalize;
mod report;
mod source;
mod trend;

use models::{AnalysisResult, Mode, DEFAULT_NOTE};
use source::{JsonFileSource, ScoreSource};

#[derive(Parser)]
#[command(name = "wellness-tracker")]
#[command(about = "Ten-indicator wellness scoring and trend tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Insert demo analyses for a demo user
    Seed,
    /// Run one analysis and store the result
    Analyze {
        #[arg(long)]
        user: String,
        /// Analysis mode: health, skin, fortune or psy
        #[arg(long)]
        mode: String,
        #[arg(long)]
        age: Option<i32>,
        #[arg(long)]
        height: Option<i32>,
        #[arg(long)]
        weight: Option<i32>,
        #[arg(long)]
        waist: Option<i32>,
        /// Mark that a photo accompanied this request
        #[arg(long)]
        photo: bool,
        /// Raw scorer payload to normalize instead of generating a placeholder
        #[arg(long)]
        scores_json: Option<PathBuf>,
    },
    /// List stored analyses for a user, newest first
    History {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Render the latest stored analysis as a markdown report
    Report {
        #[arg(long)]
        user: String,
        #[arg(long)]
        mode: String,
        /// Real age, enables the biological-age estimate
        #[arg(long)]
        age: Option<i32>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Dump every stored analysis as CSV
    Export {
        #[arg(long, default_value = "history.csv")]
        out: PathBuf,
    },
    /// List analysis modes and their indicator catalogs
    Modes,
}

fn build_context(
    age: Option<i32>,
    height: Option<i32>,
    weight: Option<i32>,
    waist: Option<i32>,
) -> String {
    let mut parts = Vec::new();
    if let Some(age) = age {
        parts.push(format!("年齡:{age}"));
    }
    if let Some(height) = height {
        parts.push(format!("身高:{height}"));
    }
    if let Some(weight) = weight {
        parts.push(format!("體重:{weight}"));
    }
    if let Some(waist) = waist {
        parts.push(format!("腰圍:{waist}"));
    }
    parts.join("|")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://wellness.db?mode=rwc".to_string());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .with_context(|| format!("failed to open database at {database_url}"))?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed_demo(&pool).await?;
            println!("Demo analyses inserted for {}.", db::DEMO_USER);
        }
        Commands::Analyze {
            user,
            mode,
            age,
            height,
            weight,
            waist,
            photo,
            scores_json,
        } => {
            let mode: Mode = mode.parse()?;
            let context = build_context(age, height, weight, waist);

            let file_source = scores_json.map(JsonFileSource::new);
            let source = file_source.as_ref().map(|s| s as &dyn ScoreSource);

            let result = source::resolve(mode, &context, photo, source);
            db::save_analysis(&pool, &user, mode, &result).await?;

            let records = db::load_last_two(&pool, &user, mode).await?;
            let previous = records.get(1).map(|record| record.items.as_slice());
            let deltas = trend::compute_deltas(&result.items, previous);

            println!(
                "Overall: {} ({})",
                result.overall,
                report::overall_label(result.overall)
            );
            if let Some(movement) = trend::overall_delta(&records) {
                println!("Trend: {movement:+} vs previous analysis");
            }
            for delta in &deltas {
                match (delta.previous, delta.delta) {
                    (Some(previous), Some(movement)) => println!(
                        "- {}: {} ({movement:+} vs {previous})",
                        delta.name, delta.score
                    ),
                    _ => println!("- {}: {}", delta.name, delta.score),
                }
            }
            println!("Note: {}", result.note);
        }
        Commands::History { user, limit } => {
            let records = db::load_history(&pool, &user, limit).await?;

            if records.is_empty() {
                println!("No analyses stored for {user}.");
                return Ok(());
            }

            println!("Analyses for {user}, newest first:");
            for record in &records {
                println!(
                    "- {} [{}] overall {} ({})",
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.mode,
                    record.overall,
                    report::overall_label(record.overall)
                );
            }
        }
        Commands::Report {
            user,
            mode,
            age,
            out,
        } => {
            let mode: Mode = mode.parse()?;
            let records = db::load_last_two(&pool, &user, mode).await?;

            let Some(latest) = records.first() else {
                println!("No stored analyses for {user} in {mode} mode; run analyze first.");
                return Ok(());
            };

            // the note is not persisted, so a rebuilt report carries the default
            let result = AnalysisResult {
                overall: latest.overall,
                items: latest.items.clone(),
                note: DEFAULT_NOTE.to_string(),
            };
            let previous = records.get(1).map(|record| record.items.as_slice());
            let deltas = trend::compute_deltas(&result.items, previous);
            let overall_move = trend::overall_delta(&records);
            let history = db::load_history(&pool, &user, 5).await?;

            let report = report::build_report(
                &user,
                mode,
                &result,
                &deltas,
                &history,
                age,
                overall_move,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { out } => {
            let records = db::load_all(&pool).await?;
            let csv = report::history_csv(&records)?;
            std::fs::write(&out, csv)?;
            println!("Exported {} analyses to {}.", records.len(), out.display());
        }
        Commands::Modes => {
            for mode in Mode::ALL {
                println!("{mode}:");
                for name in mode.indicators() {
                    println!("  - {name}");
                }
            }
        }
    }

    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

mod compare;
mod config;
mod error;
mod loader;
mod models;
mod report;
mod sentiment;
mod stats;

use compare::ComparisonOutcome;
use config::AnalyzerConfig;
use models::Period;
use report::ReportFormat;
use sentiment::{ClassificationScheduler, HeuristicModel, SentimentClassifier};
use stats::Bucket;

#[derive(Parser)]
#[command(name = "review-compare")]
#[command(about = "Compare player review sentiment and volume between two time windows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an overview of a cleaned reviews CSV
    Stats {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Analyze a single period and print its statistics as JSON
    Analyze {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, default_value = "Period")]
        name: String,
        /// Use the model strategy instead of the lexicon
        #[arg(long)]
        model: bool,
        #[arg(long, default_value = "daily")]
        bucket: Bucket,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Compare two periods and write a report
    Compare {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        period1_start: String,
        #[arg(long)]
        period1_end: String,
        #[arg(long)]
        period2_start: String,
        #[arg(long)]
        period2_end: String,
        #[arg(long, default_value = "Period 1")]
        period1_name: String,
        #[arg(long, default_value = "Period 2")]
        period2_name: String,
        /// Report format: text or json
        #[arg(long, default_value = "text")]
        format: ReportFormat,
        /// Use the model strategy instead of the lexicon
        #[arg(long)]
        model: bool,
        #[arg(long, default_value = "daily")]
        bucket: Bucket,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn build_scheduler(use_model: bool, config: &AnalyzerConfig) -> ClassificationScheduler {
    let classifier = if use_model {
        SentimentClassifier::model(Arc::new(HeuristicModel::new()), config.max_model_input)
    } else {
        SentimentClassifier::lexicon(config.neutral_threshold)
    };
    ClassificationScheduler::new(Arc::new(classifier), config)
}

fn write_output(out: Option<&PathBuf>, body: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}.", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Stats { csv } => {
            let records = loader::load_reviews(&csv)?;
            let overview = loader::dataset_overview(&records);
            println!("{}", serde_json::to_string_pretty(&overview)?);
        }
        Commands::Analyze {
            csv,
            start,
            end,
            name,
            model,
            bucket,
            out,
        } => {
            let config = AnalyzerConfig {
                bucket,
                ..AnalyzerConfig::default()
            };

            let start = loader::parse_date(&start)?;
            let end = loader::parse_date(&end)?;
            let records = loader::load_reviews(&csv)?;
            let selected = loader::filter_by_date(&records, start, end)?;

            if selected.len() < config.min_sample_size {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "status": "warning",
                        "message": "too few reviews in this period for reliable analysis",
                        "review_count": selected.len(),
                        "minimum": config.min_sample_size,
                    }))?
                );
                return Ok(());
            }

            let scheduler = build_scheduler(model, &config);
            let classified = scheduler.classify_batch(selected).await;
            let period = Period::new(name, start, end, classified)?;
            let statistics = stats::period_statistics(&period, &config);
            write_output(out.as_ref(), &serde_json::to_string_pretty(&statistics)?)?;
        }
        Commands::Compare {
            csv,
            period1_start,
            period1_end,
            period2_start,
            period2_end,
            period1_name,
            period2_name,
            format,
            model,
            bucket,
            out,
        } => {
            let config = AnalyzerConfig {
                bucket,
                ..AnalyzerConfig::default()
            };

            let p1_start = loader::parse_date(&period1_start)?;
            let p1_end = loader::parse_date(&period1_end)?;
            let p2_start = loader::parse_date(&period2_start)?;
            let p2_end = loader::parse_date(&period2_end)?;

            let records = loader::load_reviews(&csv)?;
            let selected1 = loader::filter_by_date(&records, p1_start, p1_end)?;
            let selected2 = loader::filter_by_date(&records, p2_start, p2_end)?;
            info!(
                "comparing {} reviews ({period1_name}) against {} ({period2_name})",
                selected1.len(),
                selected2.len()
            );

            let scheduler = build_scheduler(model, &config);
            let classified1 = scheduler.classify_batch(selected1).await;
            let classified2 = scheduler.classify_batch(selected2).await;

            let period1 = Period::new(period1_name, p1_start, p1_end, classified1)?;
            let period2 = Period::new(period2_name, p2_start, p2_end, classified2)?;
            let outcome = compare::compare(&period1, &period2, &config);

            let body = match (&outcome, format) {
                (_, ReportFormat::Json) => report::render_json(&outcome)?,
                (ComparisonOutcome::Complete(result), ReportFormat::Text) => {
                    report::render_text(result)
                }
                (ComparisonOutcome::Insufficient { .. }, ReportFormat::Text) => {
                    report::render_json(&outcome)?
                }
            };
            write_output(out.as_ref(), &body)?;
        }
    }

    Ok(())
}

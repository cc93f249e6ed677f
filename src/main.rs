//! CLI entry point for the origin-destination survey analysis tool.
//!
//! Each subcommand computes one view of the prepared survey table and prints
//! it as JSON; `classify` can also keep a CSV run history and export the full
//! evaluation report.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use odsurvey::classify;
use odsurvey::config::Settings;
use odsurvey::output::{HistoryRow, append_records, print_json, print_pretty, write_json};
use odsurvey::regression::income_regression;
use odsurvey::source::{CsvSource, SurveyStore};
use odsurvey::summary::{crosstab, descriptive, modal, overview, trips};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "odsurvey")]
#[command(about = "Analyze an origin-destination mobility survey", long_about = None)]
struct Cli {
    /// JSON settings file; missing keys take defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dataset tried before the configured candidates
    #[arg(short, long, global = true, env = "SURVEY_DATASET")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Respondent counts and headline shares
    Overview,
    /// Sex, age, income and neighbourhood distributions
    Descriptive,
    /// Monomodal / multimodal / no-answer shares per trip context
    TripTypes,
    /// Ride-hailing app usage per trip context
    Apps,
    /// Most used modals per trip context
    ModalShare,
    /// Work modals by neighbourhood of residence
    Location,
    /// Most common multimodal combinations
    Integration,
    /// Work modal split by sex and income
    Demographics,
    /// Linear regression of work modal count on income
    Regression,
    /// Train and compare the integration classifiers
    Classify {
        /// CSV file to append one row per model to
        #[arg(long)]
        history: Option<PathBuf>,

        /// JSON file to write the full evaluation report to
        #[arg(long)]
        report: Option<PathBuf>,

        /// Gzip compress the report
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/odsurvey.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("odsurvey.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!(error = %e, "Command failed");
        return Err(e);
    }
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("reading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    // clap already folds SURVEY_DATASET into --data
    if let Some(path) = &cli.data {
        settings.prepend_dataset(path.clone());
    }
    settings.validate()?;
    Ok(settings)
}

#[tracing::instrument(skip_all)]
fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    print_pretty(&settings);

    let mut store = SurveyStore::new(CsvSource::new(settings.dataset_candidates.clone()));
    let table = store.prepared()?;
    info!(rows = table.len(), "Survey loaded");

    match cli.command {
        Commands::Overview => print_json(&overview::overview(&table))?,
        Commands::Descriptive => print_json(&descriptive::descriptive_stats(&table))?,
        Commands::TripTypes => print_json(&trips::trip_types(&table))?,
        Commands::Apps => print_json(&trips::transport_apps(&table))?,
        Commands::ModalShare => print_json(&modal::modal_share(&table))?,
        Commands::Location => print_json(&crosstab::modal_by_neighborhood(&table))?,
        Commands::Integration => print_json(&modal::modal_combinations(&table))?,
        Commands::Demographics => print_json(&crosstab::demographic_profile(&table))?,
        Commands::Regression => print_json(&income_regression(&table)?)?,
        Commands::Classify {
            history,
            report,
            gzip,
        } => {
            let evaluation = classify::evaluate(&table, &settings.evaluation)?;
            info!(best = ?evaluation.best_by_f1, "Classification finished");

            if let Some(path) = history {
                append_records(&path, &HistoryRow::from_report(&evaluation, Utc::now()))?;
            }
            if let Some(path) = report {
                write_json(&path, &evaluation, gzip)?;
            }
            print_json(&evaluation)?;
        }
    }

    Ok(())
}

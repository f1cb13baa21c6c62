use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use balance_dashboard_core::models::data::UploadFile;
use balance_dashboard_core::models::settings::Settings;
use balance_dashboard_core::services::format_service::{format_currency, format_percentage};
use balance_dashboard_core::BalanceDashboard;

#[derive(Debug, Parser)]
#[command(name = "balance-cli")]
#[command(about = "Query the Balance AI prediction service from the terminal")]
struct App {
    /// JSON settings file; environment variables are used when omitted
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Override the backend base URL
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check whether the backend answers its health probe
    Health,
    /// Show service metadata
    Info,
    /// Show the dashboard snapshot and its headline numbers
    Dashboard,
    /// Fetch predictions
    Predict {
        #[command(subcommand)]
        query: PredictQuery,
    },
    /// Generate an AI analysis of the current data
    Analyze {
        /// Free-text market context to steer the analysis
        #[arg(long)]
        context: Option<String>,
    },
    /// Manage the data the predictions are built from
    Data {
        #[command(subcommand)]
        action: DataAction,
    },
}

#[derive(Debug, Subcommand)]
enum PredictQuery {
    /// The full 2025 series
    All,
    /// One calendar month
    Month { year: i32, month: u32 },
    /// One year with its monthly breakdown
    Year { year: i32 },
    /// An explicit date range (YYYY-MM-DD)
    Range {
        start: String,
        end: String,
        #[arg(long)]
        context: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum DataAction {
    /// Show record counts, sources and statistics
    Info,
    /// Upload an .xlsx/.xls spreadsheet
    Upload {
        path: PathBuf,
        /// Sheet to import; the first one when omitted
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Drop uploaded data and return to the original dataset
    Reset,
}

fn load_settings(app: &App) -> Result<Settings> {
    let mut settings = match &app.settings {
        Some(path) => Settings::from_json_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::from_env()?,
    };
    if let Some(url) = &app.url {
        settings.base_url = url.clone();
        settings.validate()?;
    }
    Ok(settings)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let app = App::parse();
    let settings = load_settings(&app)?;
    let dashboard = BalanceDashboard::new(settings)?;
    tracing::debug!("{dashboard:?}");

    match app.command {
        Commands::Health => {
            let online = dashboard.connectivity().check_connection().await;
            println!("{}", if online { "online" } else { "offline" });
            if !online {
                bail!("backend at {} is not reachable", dashboard.settings().base_url);
            }
        }
        Commands::Info => print_json(&dashboard.api_info().await?)?,
        Commands::Dashboard => {
            let store = dashboard.dashboard();
            store.fetch_dashboard_data(true).await?;
            print_json(&store.snapshot())?;
            if let Some(metrics) = store.key_metrics() {
                eprintln!(
                    "Histórico: {} | Predicho: {} | Crecimiento: {}",
                    format_currency(metrics.total_historical),
                    format_currency(metrics.total_predicted),
                    format_percentage(metrics.growth_rate)
                );
            }
        }
        Commands::Predict { query } => run_predict(&dashboard, query).await?,
        Commands::Analyze { context } => {
            let analysis = dashboard.analysis();
            analysis.fetch_ai_analysis(context.as_deref()).await?;
            if let Some(json) = analysis.export_analysis()? {
                println!("{json}");
            }
            eprintln!("Confianza: {}", analysis.confidence_level().label());
        }
        Commands::Data { action } => run_data(&dashboard, action).await?,
    }

    Ok(())
}

async fn run_predict(dashboard: &BalanceDashboard, query: PredictQuery) -> Result<()> {
    let store = dashboard.predictions();
    match query {
        PredictQuery::All => {
            store.fetch_predictions_2025().await?;
            print_json(&store.predictions_2025())?;
            if let Some(summary) = store.predictions_2025_summary() {
                eprintln!(
                    "Total: {} | Media mensual: {}",
                    format_currency(summary.total_predicted),
                    format_currency(summary.average_monthly)
                );
            }
        }
        PredictQuery::Month { year, month } => {
            store.fetch_month_prediction(year, month).await?;
            print_json(&store.month_prediction())?;
        }
        PredictQuery::Year { year } => {
            store.fetch_year_prediction(year).await?;
            print_json(&store.year_prediction())?;
        }
        PredictQuery::Range {
            start,
            end,
            context,
        } => {
            store
                .fetch_range_prediction(&start, &end, context.as_deref())
                .await?;
            print_json(&store.range_prediction())?;
        }
    }
    Ok(())
}

async fn run_data(dashboard: &BalanceDashboard, action: DataAction) -> Result<()> {
    let store = dashboard.data();
    match action {
        DataAction::Info => {
            store.load_data_info().await?;
            print_json(&store.data_info())?;
        }
        DataAction::Upload { path, sheet } => {
            let file = UploadFile::from_path(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let response = store.upload_file(&file, sheet.as_deref()).await?;
            print_json(&response)?;
        }
        DataAction::Reset => print_json(&store.reset_data().await?)?,
    }
    Ok(())
}

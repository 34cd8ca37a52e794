//! Folio CLI binary.
//!
//! Runs the returns, portfolio, backtest and factor model stages against one
//! in-process result store.

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use folio::data::yahoo::YahooQuoteProvider;
use folio::data::{MemoryStore, ResultStore};
use folio::factors::{FamaFrenchCsv, RegressionSummary};
use folio::output::{ExportFormat, Exporter};
use folio::risk::{ObjectiveFunction, RiskMeasure};
use folio::universe::{self, GicsSector, SP500Universe};
use folio::{Envelope, Pipeline, PortfolioConfig, Settings, UniverseSelection};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "folio")]
#[command(
    about = "Folio: portfolio optimization, backtesting and factor analysis",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare returns, optimize, backtest and run the factor model
    Pipeline {
        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        optimizer: OptimizerArgs,

        /// Fama-French daily factors CSV
        #[arg(long)]
        factors: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the backtest to a .csv or .json file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Prepare returns and print the optimized weights
    Weights {
        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        optimizer: OptimizerArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Regress a synthetic portfolio on the Fama-French factors
    Factors {
        /// Fama-French daily factors CSV
        #[arg(long)]
        factors: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List S&P 500 universes
    Universe {
        /// Filter by GICS sector
        #[arg(long)]
        sector: Option<String>,

        /// List all sectors
        #[arg(long)]
        list_sectors: bool,
    },

    /// List accepted objective functions and risk measures
    Options,
}

#[derive(Args)]
struct SelectionArgs {
    /// Comma-separated symbols; takes precedence over --universe
    #[arg(long, value_delimiter = ',')]
    tickers: Vec<String>,

    /// Named universe, e.g. sp500 or sp500-tech
    #[arg(long)]
    universe: Option<String>,

    /// First date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date (YYYY-MM-DD), inclusive
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl SelectionArgs {
    fn selection(&self) -> UniverseSelection {
        UniverseSelection {
            symbols: (!self.tickers.is_empty()).then(|| self.tickers.clone()),
            universe: self.universe.clone(),
        }
    }

    fn period(&self, settings: &Settings) -> (NaiveDate, NaiveDate) {
        let start = self.start.unwrap_or(settings.start_date);
        let end = self
            .end
            .or(settings.end_date)
            .unwrap_or_else(|| Utc::now().date_naive());
        (start, end)
    }
}

#[derive(Args)]
struct OptimizerArgs {
    /// Objective function
    #[arg(long, default_value = "MINIMIZE_RISK")]
    objective: String,

    /// Risk measure
    #[arg(long, default_value = "VARIANCE")]
    risk_measure: String,

    /// Minimum weight per instrument
    #[arg(long, default_value_t = 0.0)]
    min_weight: f64,

    /// Maximum weight per instrument
    #[arg(long, default_value_t = 1.0)]
    max_weight: f64,
}

impl OptimizerArgs {
    fn config(&self) -> folio::Result<PortfolioConfig> {
        Ok(PortfolioConfig {
            min_weight: self.min_weight,
            max_weight: self.max_weight,
            ..PortfolioConfig::from_options(&self.objective, &self.risk_measure)?
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Pipeline {
            selection,
            optimizer,
            factors,
            format,
            export,
        } => {
            let factors = factors.or_else(|| settings.factors_csv.clone());
            run_pipeline(
                &settings,
                &selection,
                &optimizer,
                factors.as_deref(),
                format,
                export.as_deref(),
            )
            .await?;
        }
        Commands::Weights {
            selection,
            optimizer,
            format,
        } => {
            run_weights(&settings, &selection, &optimizer, format).await?;
        }
        Commands::Factors { factors, format } => {
            let path = factors
                .or_else(|| settings.factors_csv.clone())
                .ok_or("no factor file: pass --factors or set factors_csv in the settings")?;
            run_factors(&settings, &path, format)?;
        }
        Commands::Universe {
            sector,
            list_sectors,
        } => {
            if list_sectors {
                list_all_sectors();
            } else {
                list_universe(sector.as_deref())?;
            }
        }
        Commands::Options => list_options(),
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> CliResult<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;
    Ok(())
}

fn build_pipeline(settings: &Settings) -> CliResult<Pipeline<YahooQuoteProvider>> {
    let store: Arc<dyn ResultStore> = Arc::new(MemoryStore::with_config(settings.store_config()));
    let source = YahooQuoteProvider::with_rate_limit(settings.rate_limit())?;
    Ok(Pipeline::new(store, source))
}

/// Run the returns stage behind a spinner.
async fn fetch_returns(
    pipeline: &Pipeline<YahooQuoteProvider>,
    selection: &UniverseSelection,
    start: NaiveDate,
    end: NaiveDate,
) -> CliResult<Envelope> {
    let n_symbols = selection.resolve()?.len();

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Fetching {n_symbols} symbols from {start} to {end}..."));

    match pipeline.prepare_returns(selection, start, end).await {
        Ok(envelope) => {
            pb.finish_with_message(format!("Fetched {n_symbols} symbols"));
            Ok(envelope)
        }
        Err(e) => {
            pb.abandon_with_message("Fetch failed");
            Err(e.into())
        }
    }
}

async fn run_pipeline(
    settings: &Settings,
    selection: &SelectionArgs,
    optimizer: &OptimizerArgs,
    factors: Option<&Path>,
    format: OutputFormat,
    export: Option<&Path>,
) -> CliResult<()> {
    let config = optimizer.config()?;
    let export_format = export.map(ExportFormat::from_path).transpose()?;
    let pipeline = build_pipeline(settings)?;
    let (start, end) = selection.period(settings);

    let returns = fetch_returns(&pipeline, &selection.selection(), start, end).await?;
    let weights = pipeline.portfolio(&returns.data_id, &config)?;
    let report = pipeline.backtest(&weights.data_id, &returns.data_id)?;
    let curve = pipeline.equity_curve(&report.data_id)?;
    let points = pipeline.equity_points(&curve.data_id)?;

    let regression = match factors {
        Some(path) => {
            Some(pipeline.factor_model(Some(&report.data_id), &FamaFrenchCsv::new(path))?)
        }
        None => {
            warn!("no factor file configured, skipping factor model");
            None
        }
    };

    if let (Some(path), Some(export_format)) = (export, export_format) {
        report.summary.export_to_file(path, export_format)?;
        info!(path = %path.display(), "exported backtest");
    }

    match format {
        OutputFormat::Json => {
            let output = json!({
                "returns": returns,
                "portfolio": weights,
                "backtest": report,
                "equity_curve": curve,
                "factor_model": regression,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("Returns:      {}", returns.data_id);
            println!();
            print_weights(&weights);
            println!();
            println!("Backtest:     {}", report.data_id);
            println!("=========");
            print!("{}", report.summary);
            println!();
            println!(
                "Equity curve: {} ({} points, final {:.2}%)",
                curve.data_id,
                points.len(),
                points.last().map_or(0.0, |v| v * 100.0)
            );
            if let Some(regression) = regression {
                println!();
                print_regression(&regression);
            }
        }
    }

    Ok(())
}

async fn run_weights(
    settings: &Settings,
    selection: &SelectionArgs,
    optimizer: &OptimizerArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let config = optimizer.config()?;
    let pipeline = build_pipeline(settings)?;
    let (start, end) = selection.period(settings);

    let returns = fetch_returns(&pipeline, &selection.selection(), start, end).await?;
    let weights = pipeline.portfolio(&returns.data_id, &config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&weights)?),
        OutputFormat::Text => print_weights(&weights),
    }
    Ok(())
}

fn run_factors(settings: &Settings, path: &Path, format: OutputFormat) -> CliResult<()> {
    let pipeline = build_pipeline(settings)?;
    let regression = pipeline.factor_model(None, &FamaFrenchCsv::new(path))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&regression)?),
        OutputFormat::Text => print_regression(&regression),
    }
    Ok(())
}

fn print_weights(envelope: &Envelope) {
    println!("Weights:      {}", envelope.data_id);
    println!("========");
    if let Some(weights) = &envelope.table_data {
        for (symbol, weight) in weights {
            println!("  {:<8} {:>8.2}%", symbol, weight * 100.0);
        }
    }
}

fn print_regression(regression: &RegressionSummary) {
    print!("{}", regression);
}

fn list_all_sectors() {
    println!("GICS Sectors:");
    println!("=============\n");

    for sector in GicsSector::ALL {
        println!("{:2} - {:<24} ({})", sector.code(), sector.name(), sector.slug());
    }
}

fn list_universe(sector: Option<&str>) -> CliResult<()> {
    let sp500 = SP500Universe::new();

    if let Some(name) = sector {
        let sector: GicsSector = name.parse()?;
        let symbols = sp500.symbols_in_sector(sector);
        println!("{} ({} symbols):", sector.name(), symbols.len());
        println!("{}", symbols.join(", "));
        return Ok(());
    }

    println!("S&P 500 universe: {} symbols\n", sp500.symbols().len());
    for (sector, count) in sp500.sector_counts() {
        println!("  {:<24} {:>3}", sector.name(), count);
    }

    println!("\nUniverse names:");
    for name in universe::available_universes() {
        println!("  {}", name);
    }
    Ok(())
}

fn list_options() {
    println!("Objective functions:");
    for objective in ObjectiveFunction::ALL {
        println!("  {}", objective);
    }

    println!("\nRisk measures:");
    for measure in RiskMeasure::ALL {
        println!("  {}", measure);
    }
}

//! CLI for the capm analytics library.
//!
//! Loads closing prices from a directory of CSV files, runs the CAPM analysis
//! for the selected assets against a benchmark, and prints the market model
//! and risk tables (or JSON).

use capm::{
    AnalysisConfig, AnalysisReport, CapmAnalyzer, CashFlowSummary, CsvPriceSource,
    FinancialRatios, FinancialStatement, Scenario, ScenarioParameters, expected_return,
    fundamentals::{read_dividend_history, summarize_dividends},
    parse_rate,
    projection::{GrowthRates, forecast, project_scenarios},
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, process::ExitCode};
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "capm")]
#[command(about = "CAPM beta, alpha, risk metrics and expected returns", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze assets against a benchmark
    Analyze(AnalyzeArgs),
    /// Compute a CAPM expected return
    ExpectedReturn {
        /// Asset beta
        #[arg(long, allow_hyphen_values = true)]
        beta: f64,
        /// Risk-free rate (e.g. `1%` or `0.01`)
        #[arg(long, value_parser = rate, allow_hyphen_values = true)]
        risk_free_rate: f64,
        /// Market return (e.g. `8%` or `0.08`)
        #[arg(long, value_parser = rate, allow_hyphen_values = true)]
        market_return: f64,
    },
    /// Future value of an investment under named scenarios
    Project {
        /// Amount invested today
        #[arg(long, default_value_t = 10_000.0)]
        initial: f64,
        /// Horizon in years
        #[arg(long, default_value_t = 5)]
        years: u32,
        /// Scenarios as NAME=RATE, comma-separated
        #[arg(
            long,
            value_delimiter = ',',
            value_parser = scenario,
            allow_hyphen_values = true,
            default_value = "Optimistic=5%,Realistic=5%,Pessimistic=5%"
        )]
        scenarios: Vec<Scenario>,
    },
    /// Cash-flow totals and growth forecast
    CashFlow {
        /// Inflow amounts, comma-separated
        #[arg(long, value_delimiter = ',')]
        inflows: Vec<f64>,
        /// Outflow amounts, comma-separated
        #[arg(long, value_delimiter = ',')]
        outflows: Vec<f64>,
        /// Annual inflow growth
        #[arg(long, value_parser = rate, default_value = "5%", allow_hyphen_values = true)]
        inflow_growth: f64,
        /// Annual outflow growth
        #[arg(long, value_parser = rate, default_value = "3%", allow_hyphen_values = true)]
        outflow_growth: f64,
        /// Years to forecast (1-10)
        #[arg(long, default_value_t = 3)]
        years: u32,
    },
    /// Dividend yield and income from a dividend history CSV
    Dividend {
        /// CSV with a `date` column and a payment column
        #[arg(long)]
        file: PathBuf,
        /// Payment column
        #[arg(long, default_value = "dividend")]
        column: String,
        /// Current share price
        #[arg(long)]
        price: f64,
        /// Amount invested, for the dividend income return
        #[arg(long)]
        invested: Option<f64>,
    },
    /// Financial ratios from a JSON statement of line items
    Ratios {
        /// JSON file with `total_debt`, `total_equity`, `net_income`, ...
        #[arg(long)]
        statement: PathBuf,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Directory holding one `<INSTRUMENT>.csv` per instrument
    #[arg(long)]
    data_dir: PathBuf,
    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Comma-separated assets to analyze
    #[arg(long, value_delimiter = ',')]
    assets: Vec<String>,
    /// Benchmark index
    #[arg(long)]
    benchmark: Option<String>,
    /// Last date of the history window (YYYY-MM-DD, default today)
    #[arg(long)]
    end: Option<NaiveDate>,
    /// History window length in years (1-10)
    #[arg(long)]
    years: Option<u32>,
    /// Risk-free rate (e.g. `1%` or `0.01`)
    #[arg(long, value_parser = rate, allow_hyphen_values = true)]
    risk_free_rate: Option<f64>,
    /// Annual market return override (e.g. `8%`)
    #[arg(long, value_parser = rate, allow_hyphen_values = true)]
    market_return: Option<f64>,
    /// Periods used to annualize per-period statistics
    #[arg(long)]
    periods_per_year: Option<u32>,
    /// VaR confidence level
    #[arg(long)]
    confidence: Option<f64>,
    /// Decimal places for beta and alpha
    #[arg(long)]
    precision: Option<u32>,
    /// Per-instrument fetch timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Price column inside each CSV file
    #[arg(long, default_value = "close")]
    price_column: String,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl AnalyzeArgs {
    /// Build the run configuration: file values first, then flag overrides.
    fn config(&self) -> capm::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)?,
            None => AnalysisConfig::default(),
        };

        if !self.assets.is_empty() {
            config.instruments = self.assets.iter().map(|s| s.trim().to_string()).collect();
        }
        if let Some(benchmark) = &self.benchmark {
            config.benchmark = benchmark.clone();
        }
        if let Some(years) = self.years {
            config.history_years = years;
        }
        if let Some(rate) = self.risk_free_rate {
            config.risk_free_rate = rate;
        }
        if self.market_return.is_some() {
            config.market_return = self.market_return;
        }
        if let Some(periods) = self.periods_per_year {
            config.periods_per_year = periods;
        }
        if let Some(confidence) = self.confidence {
            config.confidence_level = confidence;
        }
        if let Some(precision) = self.precision {
            config.display_precision = precision;
        }
        if let Some(timeout) = self.timeout {
            config.fetch_timeout_secs = timeout;
        }

        Ok(config)
    }
}

fn rate(input: &str) -> Result<f64, String> {
    parse_rate(input).map_err(|e| e.to_string())
}

fn scenario(input: &str) -> Result<Scenario, String> {
    Scenario::parse(input).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let result = match cli.command {
        Commands::Analyze(args) => analyze(args).await,
        Commands::ExpectedReturn {
            beta,
            risk_free_rate,
            market_return,
        } => {
            println!("{:.6}", expected_return(beta, risk_free_rate, market_return));
            Ok(())
        }
        Commands::Project {
            initial,
            years,
            scenarios,
        } => project(initial, years, &scenarios),
        Commands::CashFlow {
            inflows,
            outflows,
            inflow_growth,
            outflow_growth,
            years,
        } => cash_flow(
            &inflows,
            &outflows,
            GrowthRates {
                inflows: inflow_growth,
                outflows: outflow_growth,
            },
            years,
        ),
        Commands::Dividend {
            file,
            column,
            price,
            invested,
        } => dividend(&file, &column, price, invested),
        Commands::Ratios { statement } => ratios(&statement),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = %e.kind(), "{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Fetch, analyze and print one report.
async fn analyze(args: AnalyzeArgs) -> capm::Result<()> {
    let analyzer = CapmAnalyzer::new(args.config()?)?;
    let source = CsvPriceSource::new(&args.data_dir).with_price_column(args.price_column.as_str());
    let end = args.end.unwrap_or_else(|| chrono::Utc::now().date_naive());

    debug!(data_dir = %args.data_dir.display(), %end, "starting analysis");
    let report = analyzer.run(&source, end).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
    } else {
        print_report(&report, analyzer.config().display_precision as usize);
    }
    Ok(())
}

/// Render the report as plain-text tables.
fn print_report(report: &AnalysisReport, precision: usize) {
    let scenario = report.scenario();
    println!(
        "Benchmark: {}  |  periods: {}  |  risk-free: {:.2}%  |  market return: {:.2}%\n",
        report.benchmark(),
        report.returns().height(),
        scenario.risk_free_rate * 100.0,
        report.market_return() * 100.0,
    );

    println!("Market model:");
    println!("  {:<10} {:>10} {:>10} {:>12} {:>6}", "asset", "beta", "alpha", "E[R]", "n");
    for row in report.model_rows() {
        println!(
            "  {:<10} {:>10.p$} {:>10.p$} {:>11.2}% {:>6}",
            row.instrument,
            row.beta,
            row.alpha,
            row.expected_return * 100.0,
            row.observations,
            p = precision,
        );
    }

    println!(
        "\nRisk ({:.0}% VaR):",
        scenario.confidence_level * 100.0
    );
    println!(
        "  {:<10} {:>11} {:>11} {:>8} {:>8}",
        "asset", "volatility", "VaR", "sharpe", "corr"
    );
    for row in report.risk_rows() {
        println!(
            "  {:<10} {:>10.2}% {:>10.2}% {:>8} {:>8}",
            row.instrument,
            row.volatility * 100.0,
            row.value_at_risk * 100.0,
            undefined_or(row.sharpe_ratio),
            undefined_or(row.correlation_with_market),
        );
    }

    let errors = report.error_rows();
    if !errors.is_empty() {
        println!("\nNot analyzed:");
        for row in errors {
            println!("  {:<10} [{}] {}", row.instrument, row.kind, row.message);
        }
    }
}

fn project(initial: f64, years: u32, scenarios: &[Scenario]) -> capm::Result<()> {
    let params = ScenarioParameters {
        horizon_years: years,
        ..Default::default()
    };
    let outcomes = project_scenarios(initial, scenarios, &params)?;

    println!("Initial investment {initial:.2} over {years} years:");
    println!("  {:<14} {:>8} {:>16} {:>14}", "scenario", "rate", "future value", "gain");
    for o in &outcomes {
        println!(
            "  {:<14} {:>7.2}% {:>16.2} {:>14.2}",
            o.name,
            o.annual_return * 100.0,
            o.future_value,
            o.gain
        );
    }
    Ok(())
}

fn cash_flow(
    inflows: &[f64],
    outflows: &[f64],
    growth: GrowthRates,
    years: u32,
) -> capm::Result<()> {
    let summary = CashFlowSummary::from_flows(inflows, outflows)?;
    let rows = forecast(&summary, growth, years)?;

    println!("Total inflows:  {:>14.2}", summary.total_inflows);
    println!("Total outflows: {:>14.2}", summary.total_outflows);
    println!("Net cash flow:  {:>14.2}", summary.net_cash_flow);
    if !summary.is_cash_positive() {
        println!("Outflows meet or exceed inflows; review cash management.");
    }

    println!("\nForecast:");
    println!("  {:>4} {:>14} {:>14} {:>14}", "year", "inflows", "outflows", "net");
    for row in &rows {
        println!(
            "  {:>4} {:>14.2} {:>14.2} {:>14.2}",
            row.year, row.inflows, row.outflows, row.net_cash_flow
        );
    }
    Ok(())
}

fn dividend(
    file: &std::path::Path,
    column: &str,
    price: f64,
    invested: Option<f64>,
) -> capm::Result<()> {
    let history = read_dividend_history(file)?;
    let summary = summarize_dividends(&history, column, price)?;

    println!("Payments:        {}", summary.payments);
    println!("Latest dividend: {}", undefined_or(summary.latest_dividend));
    println!("Total dividends: {:.2}", summary.total_dividends);
    println!(
        "Dividend yield:  {}",
        undefined_or(summary.dividend_yield.map(|y| y * 100.0))
    );
    if let Some(amount) = invested {
        let income = capm::fundamentals::income_return(summary.total_dividends, amount).ok();
        println!("Income return:   {}", undefined_or(income.map(|r| r * 100.0)));
    }
    Ok(())
}

fn ratios(path: &std::path::Path) -> capm::Result<()> {
    let statement = FinancialStatement::from_json_file(path)?;
    let ratios = FinancialRatios::from_statement(&statement);

    for (label, value) in [
        ("P/E", ratios.price_to_earnings),
        ("Debt-to-equity", ratios.debt_to_equity),
        ("Return on equity", ratios.return_on_equity),
        ("Current ratio", ratios.current_ratio),
        ("Return on assets", ratios.return_on_assets),
    ] {
        println!("  {label:<18} {:>10}", undefined_or(value));
    }
    Ok(())
}

fn undefined_or(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

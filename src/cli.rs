//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::analysis::{run_analysis, AnalysisOutcome, ScanMode};
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::config_validation::{
    validate_backtest_config, validate_report_config, validate_screener_config,
};
use crate::domain::error::ScreenerError;
use crate::domain::metrics::BacktestReport;
use crate::domain::money::to_decimal;
use crate::domain::ranking::SignalResult;
use crate::domain::rule::SignalId;
use crate::domain::strategy::{MasterWeights, ScreenerConfig, SignalPoints};
use crate::domain::universe::{load_universe, parse_tickers};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Parser, Debug)]
#[command(
    name = "screener",
    about = "Technical-analysis equity screener and strategy backtester"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }

    fn adapter(self) -> Box<dyn ReportPort> {
        match self {
            ReportFormat::Csv => Box::new(CsvReportAdapter::new()),
            ReportFormat::Json => Box::new(JsonReportAdapter::new()),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen the latest bar of every instrument
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated tickers, overriding the configured universe
        #[arg(long)]
        tickers: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
    },
    /// Score full history and simulate the portfolio
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        tickers: Option<String>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show bar count and date range for instrument(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
    /// List instruments in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Scan {
            config,
            tickers,
            output,
            format,
        } => run_scan(&config, tickers.as_deref(), output.as_ref(), format),
        Command::Backtest {
            config,
            tickers,
            output_dir,
            format,
        } => run_backtest(&config, tickers.as_deref(), output_dir.as_ref(), format),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, ticker } => run_info(&config, ticker.as_deref()),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

fn fail(err: &ScreenerError) -> ExitCode {
    error!("{err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn get_usize(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    let fallback = i64::try_from(default).unwrap_or(i64::MAX);
    usize::try_from(config.get_int(section, key, fallback)).unwrap_or(default)
}

fn get_decimal(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: rust_decimal::Decimal,
) -> Result<rust_decimal::Decimal, ScreenerError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(_) => {
            let value = config.get_double(section, key, f64::NAN);
            to_decimal(value).ok_or_else(|| ScreenerError::ConfigInvalid {
                section: section.into(),
                key: key.into(),
                reason: "not a decimal number".into(),
            })
        }
    }
}

pub fn build_screener_config(adapter: &dyn ConfigPort) -> ScreenerConfig {
    let defaults = ScreenerConfig::default();

    let mut points = SignalPoints::default();
    for id in SignalId::ALL {
        let value = adapter.get_int("points", id.key(), i64::from(id.default_points()));
        points.set(id, i32::try_from(value).unwrap_or(id.default_points()));
    }

    ScreenerConfig {
        min_history: get_usize(adapter, "screener", "min_history", defaults.min_history),
        min_avg_traded_value: adapter.get_double(
            "screener",
            "min_avg_traded_value",
            defaults.min_avg_traded_value,
        ),
        traded_value_multiplier: adapter.get_double(
            "screener",
            "traded_value_multiplier",
            defaults.traded_value_multiplier,
        ),
        liquidity_window: get_usize(
            adapter,
            "screener",
            "liquidity_window",
            defaults.liquidity_window,
        ),
        threshold: adapter.get_double("screener", "threshold", defaults.threshold),
        weights: MasterWeights {
            trend: adapter.get_double("screener", "weight_trend", defaults.weights.trend),
            momentum: adapter.get_double("screener", "weight_momentum", defaults.weights.momentum),
            volume: adapter.get_double("screener", "weight_volume", defaults.weights.volume),
        },
        points,
        macd_cross_lookback: get_usize(
            adapter,
            "screener",
            "macd_cross_lookback",
            defaults.macd_cross_lookback,
        ),
        sma_cross_lookback: get_usize(
            adapter,
            "screener",
            "sma_cross_lookback",
            defaults.sma_cross_lookback,
        ),
        divergence_lookback: get_usize(
            adapter,
            "screener",
            "divergence_lookback",
            defaults.divergence_lookback,
        ),
        divergence_order: get_usize(
            adapter,
            "screener",
            "divergence_order",
            defaults.divergence_order,
        ),
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, ScreenerError> {
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        initial_capital: get_decimal(
            adapter,
            "backtest",
            "initial_capital",
            defaults.initial_capital,
        )?,
        max_holding_days: u32::try_from(adapter.get_int(
            "backtest",
            "max_holding_days",
            i64::from(defaults.max_holding_days),
        ))
        .unwrap_or(defaults.max_holding_days),
        holding_tolerance: adapter.get_double(
            "backtest",
            "holding_tolerance",
            defaults.holding_tolerance,
        ),
        position_size: get_decimal(adapter, "backtest", "position_size", defaults.position_size)?,
        start_year: i32::try_from(adapter.get_int(
            "backtest",
            "start_year",
            i64::from(defaults.start_year),
        ))
        .unwrap_or(defaults.start_year),
    })
}

/// `--tickers` first, then `[data] tickers`, then every instrument the data
/// source lists.
pub fn resolve_tickers(
    ticker_override: Option<&str>,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, ScreenerError> {
    if let Some(list) = ticker_override {
        return Ok(parse_tickers(list)?);
    }
    if let Some(list) = config
        .get_string("data", "tickers")
        .filter(|s| !s.trim().is_empty())
    {
        return Ok(parse_tickers(&list)?);
    }
    data_port.list_symbols()
}

pub fn resolve_format(format_override: Option<ReportFormat>, config: &dyn ConfigPort) -> ReportFormat {
    if let Some(f) = format_override {
        return f;
    }
    match config.get_string("report", "format") {
        Some(f) if f.trim().eq_ignore_ascii_case("json") => ReportFormat::Json,
        _ => ReportFormat::Csv,
    }
}

fn output_dir(config: &dyn ConfigPort) -> PathBuf {
    config
        .get_string("report", "output_dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn data_adapter(config: &dyn ConfigPort) -> CsvAdapter {
    let dir = config
        .get_string("data", "dir")
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
    CsvAdapter::new(PathBuf::from(dir))
}

fn validate_all(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_screener_config(config)?;
    validate_backtest_config(config)?;
    validate_report_config(config)
}

fn run_scan(
    config_path: &Path,
    ticker_override: Option<&str>,
    output: Option<&PathBuf>,
    format_override: Option<ReportFormat>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_screener_config(&config).and_then(|_| validate_report_config(&config))
    {
        return fail(&e);
    }

    let screener_config = build_screener_config(&config);
    let data_port = data_adapter(&config);
    let tickers = match resolve_tickers(ticker_override, &config, &data_port) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };

    let format = resolve_format(format_override, &config);
    let output = output
        .cloned()
        .unwrap_or_else(|| output_dir(&config).join(format!("signals.{}", format.extension())));

    run_scan_pipeline(&data_port, &tickers, &screener_config, &output, format)
}

/// Load, screen in latest-day mode, print the ranked table and write the
/// signal report.
pub fn run_scan_pipeline(
    data_port: &dyn DataPort,
    tickers: &[String],
    config: &ScreenerConfig,
    output: &Path,
    format: ReportFormat,
) -> ExitCode {
    let outcome = match execute_scan(data_port, tickers, config) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    print!("{}", render_signal_table(&outcome.signals));

    if let Err(e) = format.adapter().write_signals(&outcome.signals, output) {
        return fail(&e);
    }
    info!(path = %output.display(), signals = outcome.signals.len(), "signal report written");
    ExitCode::SUCCESS
}

pub fn execute_scan(
    data_port: &dyn DataPort,
    tickers: &[String],
    config: &ScreenerConfig,
) -> Result<AnalysisOutcome, ScreenerError> {
    let universe = load_universe(data_port, tickers)?;
    let mut outcome = run_analysis(&universe.series, config, ScanMode::LatestDay)?;
    outcome.skipped.extend(universe.skipped);
    Ok(outcome)
}

fn run_backtest(
    config_path: &Path,
    ticker_override: Option<&str>,
    dir_override: Option<&PathBuf>,
    format_override: Option<ReportFormat>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&config) {
        return fail(&e);
    }

    let screener_config = build_screener_config(&config);
    let bt_config = match build_backtest_config(&config) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let data_port = data_adapter(&config);
    let tickers = match resolve_tickers(ticker_override, &config, &data_port) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };

    let format = resolve_format(format_override, &config);
    let dir = dir_override.cloned().unwrap_or_else(|| output_dir(&config));

    run_backtest_pipeline(
        &data_port,
        &tickers,
        &screener_config,
        &bt_config,
        &dir,
        format,
    )
}

/// Full-history screen, simulation, summary and report files.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    tickers: &[String],
    screener_config: &ScreenerConfig,
    bt_config: &BacktestConfig,
    dir: &Path,
    format: ReportFormat,
) -> ExitCode {
    let (outcome, report) = match execute_backtest(data_port, tickers, screener_config, bt_config)
    {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    if report.performance.is_none() {
        warn!("net worth series is empty, no performance report");
    }
    print!("{}", render_backtest_summary(&report));

    match format
        .adapter()
        .write_backtest(&report, &outcome.signals, dir)
    {
        Ok(files) => {
            for f in &files {
                info!(path = %f.display(), "report written");
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

pub fn execute_backtest(
    data_port: &dyn DataPort,
    tickers: &[String],
    screener_config: &ScreenerConfig,
    bt_config: &BacktestConfig,
) -> Result<(AnalysisOutcome, BacktestReport), ScreenerError> {
    let universe = load_universe(data_port, tickers)?;
    let mut outcome = run_analysis(&universe.series, screener_config, ScanMode::FullHistory)?;
    outcome.skipped.extend(universe.skipped);

    let result = backtest_engine::run_simulation(&universe.series, &outcome.signals, bt_config)?;
    let report = BacktestReport::from_portfolio(&result.portfolio);
    Ok((outcome, report))
}

/// Signals ranked by score (highest first), ties by ticker.
pub fn render_signal_table(signals: &[SignalResult]) -> String {
    let mut ranked: Vec<&SignalResult> = signals.iter().collect();
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });

    let mut out = String::new();
    if ranked.is_empty() {
        out.push_str("No qualifying signals.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<8} {:<10} {:>10} {:>10} {:>10} {:>5} {:>4}  {:<11} {}",
        "TICKER", "DATE", "PRICE", "TARGET", "STOP", "SCORE", "CONF", "TIMEFRAME", "REASONS"
    );
    for s in ranked {
        let _ = writeln!(
            out,
            "{:<8} {:<10} {:>10} {:>10} {:>10} {:>5.1} {:>4}  {:<11} {}",
            s.ticker,
            s.date,
            s.current_price,
            s.target_price,
            s.stop_loss,
            s.score,
            s.confidence,
            s.timeframe.to_string(),
            s.key_reasons.join(", ")
        );
    }
    out
}

pub fn render_backtest_summary(report: &BacktestReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Backtest Results ===");
    if let Some(perf) = &report.performance {
        let _ = writeln!(out, "Initial Capital:  {:.2}", perf.initial_capital);
        let _ = writeln!(out, "Final Value:      {:.2}", perf.final_value);
        let _ = writeln!(out, "Total Return:     {:.2}%", perf.total_return_pct);
        let _ = writeln!(out, "Annualized:       {:.2}%", perf.annualized_return_pct);
        let _ = writeln!(out, "Volatility:       {:.2}%", perf.annualized_volatility_pct);
        let _ = writeln!(out, "Sharpe Ratio:     {:.2}", perf.sharpe_ratio);
        let _ = writeln!(out, "Max Drawdown:     {:.2}%", perf.max_drawdown_pct);
        let _ = writeln!(out, "Calmar Ratio:     {:.2}", perf.calmar_ratio);
        let _ = writeln!(out, "Trading Days:     {}", perf.trading_days);
    } else {
        let _ = writeln!(out, "No usable net-worth data.");
    }

    let stats = &report.trade_stats;
    let _ = writeln!(out, "Total Trades:     {}", stats.total_trades);
    let _ = writeln!(out, "Win Rate:         {:.1}%", stats.win_rate * 100.0);
    match stats.profit_factor {
        Some(pf) => {
            let _ = writeln!(out, "Profit Factor:    {:.2}", pf);
        }
        None => {
            let _ = writeln!(out, "Profit Factor:    n/a");
        }
    }
    let _ = writeln!(out, "Avg Holding Days: {:.1}", stats.avg_holding_days);
    let _ = writeln!(out, "Open Holdings:    {}", report.open_holdings);
    out
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&config) {
        return fail(&e);
    }
    if let Err(e) = build_backtest_config(&config) {
        return fail(&e);
    }

    let sc = build_screener_config(&config);
    println!("Configuration is valid.");
    println!(
        "  threshold {}  weights {}/{}/{}  min_history {}",
        sc.threshold, sc.weights.trend, sc.weights.momentum, sc.weights.volume, sc.min_history
    );
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, ticker: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_port = data_adapter(&config);
    let tickers = match resolve_tickers(ticker, &config, &data_port) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    print!("{}", render_info(&data_port, &tickers));
    ExitCode::SUCCESS
}

pub fn render_info(data_port: &dyn DataPort, tickers: &[String]) -> String {
    let mut out = String::new();
    for t in tickers {
        match data_port.get_data_range(t) {
            Ok(Some((first, last, count))) => {
                let _ = writeln!(out, "{}: {} bars, {} to {}", t, count, first, last);
            }
            Ok(None) => {
                let _ = writeln!(out, "{}: no data found", t);
            }
            Err(e) => warn!(ticker = %t, error = %e, "range lookup failed"),
        }
    }
    out
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_port = data_adapter(&config);
    match data_port.list_symbols() {
        Ok(symbols) => {
            for s in &symbols {
                println!("{}", s);
            }
            info!(
                count = symbols.len(),
                dir = %data_port.base_path().display(),
                "symbols listed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

//! CLI definition and dispatch.

use chrono::{Local, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::adapters::clock_calendar_adapter::ClockCalendarAdapter;
use crate::adapters::csv_provider_adapter::CsvProviderAdapter;
use crate::adapters::csv_store_adapter::CsvStoreAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_signal_log_adapter::FileSignalLogAdapter;
use crate::adapters::file_universe_adapter::FileUniverseAdapter;
use crate::domain::error::TurtlescanError;
use crate::domain::refresh::refresh_universe;
use crate::domain::report::{self, breakout_label, breakout_line, market_closed_line};
use crate::domain::scan::{self, ScanOutcome};
use crate::domain::schema::IndicatorSchema;
use crate::domain::signals::ReferenceMode;
use crate::domain::universe::parse_symbols;
use crate::ports::calendar_port::CalendarPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::signal_log_port::SignalLogPort;
use crate::ports::store_port::SeriesStorePort;
use crate::ports::universe_port::UniversePort;

#[derive(Parser, Debug)]
#[command(name = "turtlescan", about = "Turtle-style breakout scanner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch new bars and enrich/extend every tracked series
    Refresh {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated override of the tracked universe
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Scan for n-day-high price breakouts
    Breakout {
        #[arg(short, long)]
        config: PathBuf,
        /// Single lookback; defaults to the configured breakout_days list
        #[arg(long)]
        n_days: Option<usize>,
        /// Compare live quotes instead of confirming the last stored bar
        #[arg(long)]
        live: bool,
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Instruments in bullish moving-average arrangement
    Bullish {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Trend-exhaustion reset signals (breakdown after breakout)
    Reset {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value_t = 20)]
        n_days: usize,
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Positions whose live day-low breaks the trailing n-day low
    Exit {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        n_days: Option<usize>,
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Breakout information snapshot for one symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        live: bool,
    },
    /// List symbols with a stored series
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Refresh { config, symbols } => run_refresh(&config, symbols.as_deref()),
        Command::Breakout {
            config,
            n_days,
            live,
            symbols,
        } => run_breakout(&config, n_days, live, symbols.as_deref()),
        Command::Bullish { config, symbols } => run_bullish(&config, symbols.as_deref()),
        Command::Reset {
            config,
            n_days,
            symbols,
        } => run_reset(&config, n_days, symbols.as_deref()),
        Command::Exit {
            config,
            n_days,
            symbols,
        } => run_exit(&config, n_days, symbols.as_deref()),
        Command::Info {
            config,
            symbol,
            live,
        } => run_info(&config, &symbol, live),
        Command::ListSymbols { config } => run_list_symbols(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            (&err).into()
        }
    }
}

/// Everything a command needs, wired from one config file.
struct AppContext {
    store: CsvStoreAdapter,
    provider: CsvProviderAdapter,
    universe: FileUniverseAdapter,
    calendar: ClockCalendarAdapter,
    signal_log: FileSignalLogAdapter,
    breakout_days: Vec<usize>,
    exit_days: usize,
}

fn build_context(config_path: &PathBuf) -> Result<AppContext, TurtlescanError> {
    let config = FileConfigAdapter::from_file(config_path).map_err(|e| {
        TurtlescanError::ConfigParse {
            file: config_path.display().to_string(),
            reason: e.to_string(),
        }
    })?;

    let path = |section: &str, key: &str, default: &str| {
        PathBuf::from(
            config
                .get_string(section, key)
                .unwrap_or_else(|| default.to_string()),
        )
    };

    let breakout_days = match config.get_string("scan", "breakout_days") {
        Some(raw) => parse_day_list("scan", "breakout_days", &raw)?,
        None => vec![20, 55],
    };

    Ok(AppContext {
        store: CsvStoreAdapter::new(
            path("data", "market_data_path", "data/market_data"),
            IndicatorSchema::default(),
        ),
        provider: CsvProviderAdapter::new(
            path("data", "provider_path", "data/provider"),
            path("data", "quotes_path", "data/quotes.csv"),
        ),
        universe: FileUniverseAdapter::new(path("data", "tickers_path", "data/tickers")),
        calendar: ClockCalendarAdapter::new(
            parse_time(&config, "calendar", "open_utc", "14:30")?,
            parse_time(&config, "calendar", "close_utc", "21:00")?,
        ),
        signal_log: FileSignalLogAdapter::new(path(
            "log",
            "signal_log_path",
            "logs/breakout_signals.log",
        )),
        breakout_days,
        exit_days: config.get_int("scan", "exit_days", 10) as usize,
    })
}

fn parse_time(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: &str,
) -> Result<NaiveTime, TurtlescanError> {
    let raw = config
        .get_string(section, key)
        .unwrap_or_else(|| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M").map_err(|_| TurtlescanError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: "expected HH:MM".to_string(),
    })
}

fn parse_day_list(section: &str, key: &str, raw: &str) -> Result<Vec<usize>, TurtlescanError> {
    raw.split(',')
        .map(|token| {
            token
                .trim()
                .parse()
                .map_err(|_| TurtlescanError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("invalid day count `{}`", token.trim()),
                })
        })
        .collect()
}

/// CLI override when given, otherwise the configured universe. An empty or
/// unobtainable universe is fatal; per-symbol problems are not.
fn resolve_symbols(
    ctx: &AppContext,
    override_list: Option<&str>,
) -> Result<Vec<String>, TurtlescanError> {
    match override_list {
        Some(raw) => parse_symbols(raw),
        None => ctx.universe.list_instruments(),
    }
}

fn report_failures(outcome: &ScanOutcome) {
    for failure in &outcome.failures {
        eprintln!("warning: {}: {}", failure.symbol, failure.error);
    }
}

fn run_refresh(config: &PathBuf, symbols: Option<&str>) -> Result<(), TurtlescanError> {
    let ctx = build_context(config)?;
    let symbols = resolve_symbols(&ctx, symbols)?;
    let today = Local::now().date_naive();

    info!(count = symbols.len(), "refreshing universe");
    let summary = refresh_universe(&ctx.provider, &ctx.store, &symbols, &IndicatorSchema::default(), today);

    println!(
        "refreshed {} of {} symbols ({} onboarded, {} extended, {} already current)",
        summary.processed(),
        symbols.len(),
        summary.created.len(),
        summary.extended.len(),
        summary.current.len()
    );
    for failure in &summary.failures {
        eprintln!("warning: {}: {}", failure.symbol, failure.error);
    }
    Ok(())
}

fn run_breakout(
    config: &PathBuf,
    n_days: Option<usize>,
    live: bool,
    symbols: Option<&str>,
) -> Result<(), TurtlescanError> {
    let ctx = build_context(config)?;

    if live && !ctx.calendar.is_market_open(Utc::now().naive_utc()) {
        let line = market_closed_line(&timestamp());
        ctx.signal_log.append(&line)?;
        println!("{line}");
        return Ok(());
    }

    let symbols = resolve_symbols(&ctx, symbols)?;
    let (mode, stamp) = if live {
        (ReferenceMode::Live, timestamp())
    } else {
        (ReferenceMode::Historical, date_stamp())
    };

    let lookbacks = match n_days {
        Some(n) => vec![n],
        None => ctx.breakout_days.clone(),
    };

    for n in lookbacks {
        let outcome = scan::price_breakout_scan(&ctx.store, &ctx.provider, &symbols, n, mode);
        let line = breakout_line(&stamp, &breakout_label(n), &outcome.matched);
        ctx.signal_log.append(&line)?;
        println!("{line}");
        report_failures(&outcome);
    }
    Ok(())
}

fn run_bullish(config: &PathBuf, symbols: Option<&str>) -> Result<(), TurtlescanError> {
    let ctx = build_context(config)?;
    let symbols = resolve_symbols(&ctx, symbols)?;

    let outcome = scan::bullish_scan(&ctx.store, &symbols);
    println!(
        "bullish arrangement: {} (count: {})",
        outcome.matched.join(", "),
        outcome.count()
    );
    report_failures(&outcome);
    Ok(())
}

fn run_reset(config: &PathBuf, n_days: usize, symbols: Option<&str>) -> Result<(), TurtlescanError> {
    let ctx = build_context(config)?;
    let symbols = resolve_symbols(&ctx, symbols)?;

    let outcome = scan::reset_scan(&ctx.store, &symbols, n_days);
    println!(
        "{n_days}-days reset signals: {} (count: {})",
        outcome.matched.join(", "),
        outcome.count()
    );
    report_failures(&outcome);
    Ok(())
}

fn run_exit(
    config: &PathBuf,
    n_days: Option<usize>,
    symbols: Option<&str>,
) -> Result<(), TurtlescanError> {
    let ctx = build_context(config)?;
    let symbols = resolve_symbols(&ctx, symbols)?;
    let n = n_days.unwrap_or(ctx.exit_days);

    let outcome = scan::exit_scan(&ctx.store, &ctx.provider, &symbols, n);
    println!(
        "{n}-days low exit signals: {} (count: {})",
        outcome.matched.join(", "),
        outcome.count()
    );
    report_failures(&outcome);
    Ok(())
}

fn run_info(config: &PathBuf, symbol: &str, live: bool) -> Result<(), TurtlescanError> {
    let ctx = build_context(config)?;
    let series = ctx
        .store
        .load(symbol)?
        .ok_or_else(|| TurtlescanError::DataUnavailable {
            symbol: symbol.to_string(),
        })?;
    series.validate()?;

    let quote = if live {
        Some(ctx.provider.fetch_quote(symbol)?)
    } else {
        None
    };
    let snapshot = report::build_snapshot(&series, quote.as_ref(), Local::now().date_naive())?;

    println!("{symbol} as of {}", snapshot.as_of);
    println!(
        "  last bar {}: O {:.4} H {:.4} L {:.4} C {:.4}",
        series.last_date().unwrap_or(snapshot.as_of),
        snapshot.open,
        snapshot.high,
        snapshot.low,
        snapshot.close
    );
    println!("  current price {:.4}", snapshot.current_price);
    for (window, high) in &snapshot.n_days_highs {
        println!("  {window}-days high {high:.4}");
    }
    println!("  bullish arrangement: {}", snapshot.bullish);
    println!("  ATR-20 {:.4}", snapshot.atr_20);
    println!("  stop loss {:.4}", snapshot.stop_loss);
    Ok(())
}

fn run_list_symbols(config: &PathBuf) -> Result<(), TurtlescanError> {
    let ctx = build_context(config)?;
    for symbol in ctx.store.list_stored()? {
        println!("{symbol}");
    }
    Ok(())
}

fn date_stamp() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{self, CsvReportAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{validate_settings, Settings};
use crate::domain::error::LedgerError;
use crate::domain::ledger::Ledger;
use crate::domain::performance::Performance;
use crate::domain::snapshot::{PositionMap, SnapshotDiffStore};
use crate::ports::cache_port::CachePort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "fxledger", about = "Forex position ledger and performance report")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a trade log and report performance
    Report {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        trades: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rotate an account's live-position snapshot pair
    Snapshot {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        positions: PathBuf,
        #[arg(long)]
        account: Option<String>,
    },
    /// Validate a settings file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Report {
            config,
            trades,
            symbol,
            output,
        } => run_report(&config, &trades, symbol.as_deref(), output.as_ref()),
        Command::Snapshot {
            config,
            positions,
            account,
        } => run_snapshot(&config, &positions, account.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &LedgerError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

pub fn load_settings(path: &Path) -> Result<Settings, ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    Settings::from_config(&adapter).map_err(|e| fail(&e))
}

/// Ledger for `symbol`, or the first configured symbol.
pub fn build_ledger(settings: &Settings, symbol: Option<&str>) -> Result<Ledger, LedgerError> {
    let symbol = match symbol.or_else(|| settings.symbols.first().map(String::as_str)) {
        Some(s) => s.to_string(),
        None => {
            return Err(LedgerError::ConfigMissing {
                section: "trading".into(),
                key: "symbols".into(),
            });
        }
    };
    let mut ledger = Ledger::new(symbol, settings.digits, settings.volume);
    ledger.set_display_offset(settings.display_offset());
    Ok(ledger)
}

pub fn format_summary(symbol: &str, perf: &Performance) -> String {
    let pnl_sign = if perf.total_pnl >= 0.0 { "+" } else { "" };
    let mut out = format!("=== {symbol} Performance ===\n");
    out.push_str(&format!("Positions:        {}\n", perf.total_position));
    out.push_str(&format!(
        "Win Rate:         {:.1}% ({} won, {} lost)\n",
        perf.win_rate * 100.0,
        perf.n_win_pos,
        perf.n_loss_pos
    ));
    out.push_str(&format!("Total PnL:        {pnl_sign}{:.2}\n", perf.total_pnl));
    out.push_str(&format!("Total Profit:     {:.2}\n", perf.total_profit));
    out.push_str(&format!("Total Loss:       {:.2}\n", perf.total_loss));
    out.push_str(&format!("Max Drawdown:     {:.2}\n", perf.max_dd));
    out.push_str(&format!("Max Run-up:       {:.2}\n", perf.max_runup));
    out.push_str(&format!("Timespan:         {:.2} days\n", perf.timespan_day));
    out.push_str(&format!("Opens per Day:    {:.2}\n", perf.avg_open_per_day));
    out
}

fn run_report(
    config_path: &Path,
    trades_path: &Path,
    symbol: Option<&str>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let mut ledger = match build_ledger(&settings, symbol) {
        Ok(l) => l,
        Err(e) => return fail(&e),
    };

    eprintln!("Replaying trade log {}", trades_path.display());
    let summary = match csv_adapter::load_trade_log(trades_path, &mut ledger) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    eprintln!(
        "  {} opened, {} closed, {} still open",
        summary.opened,
        summary.closed,
        ledger.open_trades().count()
    );

    let perf = match ledger.eval_performance() {
        Ok(p) => p.clone(),
        Err(e) => return fail(&e),
    };
    eprintln!("\n{}", format_summary(ledger.symbol(), &perf));
    match serde_json::to_string(&perf) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("error: failed to encode summary: {e}");
            return ExitCode::from(1);
        }
    }

    if let Some(output) = output_path {
        if let Err(e) = CsvReportAdapter.write(&ledger, &output.to_string_lossy()) {
            return fail(&e);
        }
        eprintln!("Report written to: {}", output.display());
    }
    ExitCode::SUCCESS
}

pub fn load_positions(path: &Path) -> Result<PositionMap, LedgerError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| LedgerError::TradeLog {
        reason: format!("invalid positions file {}: {}", path.display(), e),
    })
}

/// Rotate the snapshot pair for `account` and print what changed.
pub fn run_snapshot_with(
    cache: &dyn CachePort,
    settings: &Settings,
    account: &str,
    live: &PositionMap,
) -> ExitCode {
    let store = SnapshotDiffStore::with_ttl(cache, settings.cache_ttl_seconds);
    match store.record_cycle(account, live) {
        Some(pair) => {
            let diff = pair.diff();
            eprintln!(
                "Snapshot for {account}: {} previous, {} current",
                pair.pre.len(),
                pair.cur.len()
            );
            for key in &diff.opened {
                println!("opened {key}");
            }
            for key in &diff.closed {
                println!("closed {key}");
            }
        }
        None => eprintln!("warning: snapshot for {account} not persisted this cycle"),
    }
    ExitCode::SUCCESS
}

fn run_snapshot(config_path: &Path, positions_path: &Path, account: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match Settings::from_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let account = match account.map(str::to_string).or_else(|| settings.account.clone()) {
        Some(a) => a,
        None => {
            return fail(&LedgerError::ConfigMissing {
                section: "trading".into(),
                key: "account".into(),
            });
        }
    };
    let live = match load_positions(positions_path) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    #[cfg(feature = "redis")]
    {
        use crate::adapters::redis_cache::RedisCache;

        let cache = match RedisCache::from_config(&adapter) {
            Ok(c) => c,
            Err(e) => return fail(&e),
        };
        run_snapshot_with(&cache, &settings, &account, &live)
    }

    #[cfg(not(feature = "redis"))]
    {
        let _ = (&adapter, &settings, &account, &live);
        eprintln!("error: redis feature is required for snapshot");
        ExitCode::from(1)
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_settings(&adapter) {
        return fail(&e);
    }
    eprintln!("Config validated successfully");
    ExitCode::SUCCESS
}

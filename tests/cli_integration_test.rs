//! CLI orchestration tests: settings loading, ledger construction, trade log
//! replay and snapshot rotation against on-disk fixtures.

mod common;

use common::*;
use fxledger::adapters::csv_adapter::{self, CsvReportAdapter};
use fxledger::adapters::file_config_adapter::FileConfigAdapter;
use fxledger::adapters::memory_cache::MemoryCache;
use fxledger::cli;
use fxledger::domain::config_validation::Settings;
use fxledger::domain::error::LedgerError;
use fxledger::domain::snapshot::SnapshotDiffStore;
use fxledger::ports::report_port::ReportPort;
use std::io::Write;
use std::process::ExitCode;

fn same_code(a: ExitCode, b: ExitCode) -> bool {
    format!("{a:?}") == format!("{b:?}")
}

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[trading]
algorithm = rsi
timeframe = 15
symbols = EURUSD,GBPUSD
volume = 1
rate_tp = 40
rate_sl = 20
digits = 4
account = demo-1

[cache]
url = redis://127.0.0.1:6379
ttl_seconds = 86400

[report]
utc_offset_hours = 7
"#;

const TRADE_LOG: &str = "time_ms,action,direction,price
1704067200000,open,buy,1.1000
1704153600000,close,buy,1.1050
1704240000000,open,sell,1.1050
1704326400000,close,sell,1.1080
1704412800000,open,buy,1.1080
";

mod settings_loading {
    use super::*;

    #[test]
    fn load_settings_from_file() {
        let file = write_temp(VALID_INI);
        let settings = cli::load_settings(file.path()).unwrap();
        assert_eq!(settings.symbols, vec!["EURUSD", "GBPUSD"]);
        assert_eq!(settings.digits, 4);
        assert_eq!(settings.cache_ttl_seconds, 86_400);
    }

    #[test]
    fn load_settings_reports_invalid_config() {
        let file = write_temp("[trading]\nsymbols = EURUSD\nvolume = -1\n");
        let code = cli::load_settings(file.path()).unwrap_err();
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn load_config_missing_file() {
        let path = std::path::Path::new("/nonexistent/settings.ini");
        let code = cli::load_config(path).err().unwrap();
        assert!(same_code(code, ExitCode::from(2)));
    }
}

mod ledger_building {
    use super::*;

    fn settings() -> Settings {
        Settings::from_config(&FileConfigAdapter::from_string(VALID_INI).unwrap()).unwrap()
    }

    #[test]
    fn defaults_to_first_symbol() {
        let ledger = cli::build_ledger(&settings(), None).unwrap();
        assert_eq!(ledger.symbol(), "EURUSD");
        assert_eq!(ledger.digits(), 4);
        assert_eq!(ledger.display_offset().local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn symbol_override() {
        let ledger = cli::build_ledger(&settings(), Some("GBPUSD")).unwrap();
        assert_eq!(ledger.symbol(), "GBPUSD");
    }

    #[test]
    fn no_symbols_is_a_config_error() {
        let mut settings = settings();
        settings.symbols.clear();
        assert!(matches!(
            cli::build_ledger(&settings, None),
            Err(LedgerError::ConfigMissing { .. })
        ));
    }
}

mod report_pipeline {
    use super::*;

    #[test]
    fn replay_evaluate_and_write() {
        let settings =
            Settings::from_config(&FileConfigAdapter::from_string(VALID_INI).unwrap()).unwrap();
        let mut ledger = cli::build_ledger(&settings, None).unwrap();
        let log = write_temp(TRADE_LOG);

        let summary = csv_adapter::load_trade_log(log.path(), &mut ledger).unwrap();
        assert_eq!((summary.opened, summary.closed), (3, 2));

        let perf = ledger.eval_performance().unwrap().clone();
        assert_eq!(perf.total_position, 3);
        assert!((perf.total_pnl - 20.0).abs() < 1e-6);
        assert!((perf.timespan_day - 4.0).abs() < f64::EPSILON);

        let text = cli::format_summary(ledger.symbol(), &perf);
        assert!(text.contains("=== EURUSD Performance ==="));
        assert!(text.contains("Total PnL:        +20.00"));
        assert!(text.contains("Win Rate:         33.3% (1 won, 1 lost)"));

        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("report.csv");
        CsvReportAdapter.write(&ledger, out.to_str().unwrap()).unwrap();
        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn all_open_log_fails_evaluation() {
        let mut ledger = eurusd_ledger();
        let log = write_temp("time_ms,action,direction,price\n1704067200000,open,buy,1.1\n");
        csv_adapter::load_trade_log(log.path(), &mut ledger).unwrap();
        let err = ledger.eval_performance().unwrap_err();
        assert!(same_code(ExitCode::from(&err), ExitCode::from(5)));
    }
}

mod snapshot_command {
    use super::*;

    #[test]
    fn load_positions_from_json() {
        let file = write_temp(r#"{"123": {"symbol": "EURUSD", "mode": "buy"}}"#);
        let live = cli::load_positions(file.path()).unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live["123"]["symbol"], "EURUSD");
    }

    #[test]
    fn load_positions_rejects_non_map() {
        let file = write_temp("[1, 2, 3]");
        assert!(matches!(
            cli::load_positions(file.path()),
            Err(LedgerError::TradeLog { .. })
        ));
    }

    #[test]
    fn snapshot_with_memory_cache_uses_configured_ttl() {
        let settings =
            Settings::from_config(&FileConfigAdapter::from_string(VALID_INI).unwrap()).unwrap();
        let cache = MemoryCache::new();

        let code = cli::run_snapshot_with(&cache, &settings, "demo-1", &positions(&["a"]));
        assert!(same_code(code, ExitCode::SUCCESS));
        cli::run_snapshot_with(&cache, &settings, "demo-1", &positions(&["b"]));

        assert_eq!(cache.ttl_of("trades_cur:demo-1"), Some(86_400));
        let pair = SnapshotDiffStore::new(&cache).load_pair("demo-1").unwrap();
        assert_eq!(pair.pre, positions(&["a"]));
        assert_eq!(pair.cur, positions(&["b"]));
    }

    #[test]
    fn snapshot_with_offline_cache_still_succeeds() {
        let settings =
            Settings::from_config(&FileConfigAdapter::from_string(VALID_INI).unwrap()).unwrap();
        let cache = FlakyCache::new();
        cache.online.set(false);

        let code = cli::run_snapshot_with(&cache, &settings, "demo-1", &positions(&["a"]));
        assert!(same_code(code, ExitCode::SUCCESS));
    }
}

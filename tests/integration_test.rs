mod common;

use common::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use screener::domain::analysis::{run_analysis, ScanMode};
use screener::domain::backtest::{run_simulation, BacktestConfig};
use screener::domain::error::ScreenerError;
use screener::domain::instrument::InstrumentSeries;
use screener::domain::metrics::BacktestReport;
use screener::domain::money::to_decimal;
use screener::domain::position::ExitReason;
use screener::domain::ranking::{SignalResult, Timeframe};
use screener::domain::strategy::ScreenerConfig;
use screener::domain::universe::{load_universe, SkipReason, SkippedInstrument};

fn backtest_config(start_year: i32) -> BacktestConfig {
    BacktestConfig {
        start_year,
        ..BacktestConfig::default()
    }
}

mod screening {
    use super::*;

    #[test]
    fn breakout_signals_on_the_macd_cross() {
        let series = breakout_series("VNM", 260);
        let outcome =
            run_analysis(&[series], &ScreenerConfig::default(), ScanMode::FullHistory).unwrap();

        let dates: Vec<_> = outcome.signals.iter().map(|s| s.date).collect();
        assert_eq!(
            dates,
            vec![date(2020, 9, 12), date(2020, 9, 13)],
            "signals on bars 255 and 256 only"
        );
        for s in &outcome.signals {
            assert_eq!(s.ticker, "VNM");
            assert_eq!(s.timeframe, Timeframe::MediumTerm);
            assert_eq!(s.confidence, 64);
            assert_eq!(s.score, 7.2);
            assert!(s.key_reasons.iter().any(|r| r.contains("MACD")));
            assert!(s.target_price > s.current_price);
            assert!(s.stop_loss < s.current_price);
        }
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn breakout_price_levels() {
        let series = breakout_series("VNM", 260);
        let outcome =
            run_analysis(&[series], &ScreenerConfig::default(), ScanMode::FullHistory).unwrap();

        assert_eq!(outcome.signals[0].target_price, dec!(95.94));
        assert_eq!(outcome.signals[0].stop_loss, dec!(94.57));
        assert_eq!(outcome.signals[1].target_price, dec!(96.58));
        assert_eq!(outcome.signals[1].stop_loss, dec!(95.15));
    }

    #[test]
    fn latest_day_mode_scores_only_the_last_bar() {
        let config = ScreenerConfig::default();

        let on_signal = run_analysis(
            &[breakout_series("VNM", 257)],
            &config,
            ScanMode::LatestDay,
        )
        .unwrap();
        assert_eq!(on_signal.signals.len(), 1);
        assert_eq!(on_signal.signals[0].date, date(2020, 9, 13));

        let past_signal = run_analysis(
            &[breakout_series("VNM", 260)],
            &config,
            ScanMode::LatestDay,
        )
        .unwrap();
        assert!(past_signal.signals.is_empty());
    }

    #[test]
    fn short_history_is_skipped_not_fatal() {
        let outcome = run_analysis(
            &[breakout_series("SHORT", 251), breakout_series("VNM", 257)],
            &ScreenerConfig::default(),
            ScanMode::LatestDay,
        )
        .unwrap();

        assert_eq!(outcome.signals.len(), 1);
        assert_eq!(
            outcome.skipped,
            vec![SkippedInstrument {
                ticker: "SHORT".into(),
                reason: SkipReason::InsufficientHistory {
                    bars: 251,
                    minimum: 252
                },
            }]
        );
    }

    #[test]
    fn exactly_min_history_is_eligible() {
        let outcome = run_analysis(
            &[breakout_series("EDGE", 252)],
            &ScreenerConfig::default(),
            ScanMode::LatestDay,
        )
        .unwrap();
        assert!(outcome.skipped.is_empty());

        // a permissive threshold proves bar 251 is actually scored
        let permissive = ScreenerConfig {
            threshold: 1.0,
            ..ScreenerConfig::default()
        };
        let outcome = run_analysis(
            &[breakout_series("EDGE", 252)],
            &permissive,
            ScanMode::LatestDay,
        )
        .unwrap();
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.signals.len(), 1);
        assert_eq!(outcome.signals[0].ticker, "EDGE");
        assert_eq!(outcome.signals[0].date, date(2020, 9, 8));
    }

    #[test]
    fn illiquid_instrument_is_skipped() {
        let bars: Vec<OhlcvBar> = breakout_bars(260)
            .into_iter()
            .map(|b| OhlcvBar { volume: 10.0, ..b })
            .collect();
        let series = InstrumentSeries::new("THIN", bars).unwrap();
        let outcome =
            run_analysis(&[series], &ScreenerConfig::default(), ScanMode::FullHistory).unwrap();

        assert!(outcome.signals.is_empty());
        assert!(matches!(
            outcome.skipped[0].reason,
            SkipReason::Illiquid { .. }
        ));
    }

    #[test]
    fn raising_the_threshold_filters_everything() {
        let config = ScreenerConfig {
            threshold: 80.0,
            ..ScreenerConfig::default()
        };
        let outcome =
            run_analysis(&[breakout_series("VNM", 260)], &config, ScanMode::FullHistory).unwrap();
        assert!(outcome.signals.is_empty());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let universe = vec![
            breakout_series("VNM", 260),
            breakout_series("FPT", 258),
            breakout_series("HPG", 256),
        ];
        let config = ScreenerConfig::default();
        let first = run_analysis(&universe, &config, ScanMode::FullHistory).unwrap();
        let second = run_analysis(&universe, &config, ScanMode::FullHistory).unwrap();
        assert_eq!(first.signals, second.signals);
        assert_eq!(first.skipped, second.skipped);
    }

    #[test]
    fn signals_are_ordered_by_date_then_ticker() {
        let universe = vec![breakout_series("VNM", 260), breakout_series("FPT", 260)];
        let outcome =
            run_analysis(&universe, &ScreenerConfig::default(), ScanMode::FullHistory).unwrap();

        let keys: Vec<_> = outcome
            .signals
            .iter()
            .map(|s| (s.date, s.ticker.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (date(2020, 9, 12), "FPT"),
                (date(2020, 9, 12), "VNM"),
                (date(2020, 9, 13), "FPT"),
                (date(2020, 9, 13), "VNM"),
            ]
        );
    }
}

mod universe_loading {
    use super::*;

    #[test]
    fn failing_ticker_is_skipped() {
        let port = MockDataPort::new()
            .with_bars("VNM", breakout_bars(260))
            .with_error("BAD", "connection reset")
            .with_bars("EMPTY", vec![]);
        let loaded = load_universe(&port, &tickers(&["VNM", "BAD", "EMPTY"])).unwrap();

        assert_eq!(loaded.series.len(), 1);
        assert_eq!(loaded.series[0].ticker, "VNM");
        let skipped: Vec<_> = loaded.skipped.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(skipped, vec!["BAD", "EMPTY"]);
        assert!(loaded.skipped.iter().all(|s| s.reason == SkipReason::NoData));
    }

    #[test]
    fn nothing_loaded_is_no_data() {
        let port = MockDataPort::new().with_error("BAD", "gone");
        assert!(matches!(
            load_universe(&port, &tickers(&["BAD", "MISSING"])),
            Err(ScreenerError::NoData)
        ));
    }
}

mod simulation {
    use super::*;

    fn manual_signal(ticker: &str, date: chrono::NaiveDate, stop: Decimal, target: Decimal) -> SignalResult {
        SignalResult {
            ticker: ticker.into(),
            date,
            current_price: dec!(10),
            target_price: target,
            stop_loss: stop,
            timeframe: Timeframe::ShortTerm,
            confidence: 70,
            score: 7.0,
            key_reasons: vec![],
            rationale: String::new(),
        }
    }

    #[test]
    fn breakout_backtest_books_target_exits() {
        let bars = breakout_bars(260);
        let series = InstrumentSeries::new("VNM", bars.clone()).unwrap();
        let outcome = run_analysis(
            std::slice::from_ref(&series),
            &ScreenerConfig::default(),
            ScanMode::FullHistory,
        )
        .unwrap();

        let result = run_simulation(&[series], &outcome.signals, &backtest_config(2020)).unwrap();
        let report = BacktestReport::from_portfolio(&result.portfolio);

        assert_eq!(report.trades.len(), 2);
        let first = &report.trades[0];
        assert_eq!(first.ticker, "VNM");
        assert_eq!(first.entry_date, date(2020, 9, 13));
        assert_eq!(first.entry_price, to_decimal(bars[256].open).unwrap());
        assert_eq!(first.exit_date, date(2020, 9, 15));
        assert_eq!(first.exit_price, to_decimal(bars[258].open).unwrap());
        assert_eq!(first.reason, ExitReason::TargetReached);
        assert!(first.pnl > Decimal::ZERO);

        let second = &report.trades[1];
        assert_eq!(second.entry_date, date(2020, 9, 14));
        assert_eq!(second.exit_date, date(2020, 9, 16));
        assert_eq!(second.reason, ExitReason::TargetReached);

        assert_eq!(report.open_holdings, 1);
        assert_eq!(report.trade_stats.wins, 2);
        assert_eq!(report.trade_stats.profit_factor, None);

        let perf = report.performance.unwrap();
        assert_eq!(perf.trading_days, 260);
        assert!(perf.final_value > perf.initial_capital);
    }

    #[test]
    fn stop_loss_fills_at_next_open() {
        let d = |day| date(2021, 3, day);
        let bars = vec![
            OhlcvBar { date: d(1), open: 10.0, high: 10.0, low: 10.0, close: 10.0, volume: 1000.0 },
            OhlcvBar { date: d(2), open: 10.0, high: 10.0, low: 10.0, close: 10.0, volume: 1000.0 },
            OhlcvBar { date: d(3), open: 9.5, high: 9.5, low: 8.5, close: 8.5, volume: 1000.0 },
            OhlcvBar { date: d(4), open: 8.7, high: 8.7, low: 8.7, close: 8.7, volume: 1000.0 },
        ];
        let series = InstrumentSeries::new("AAA", bars).unwrap();
        let signals = vec![manual_signal("AAA", d(1), dec!(9.00), dec!(12.00))];
        let config = BacktestConfig {
            initial_capital: dec!(10000),
            ..backtest_config(2021)
        };

        let result = run_simulation(&[series], &signals, &config).unwrap();
        let trade = &result.portfolio.closed_trades[0];
        assert_eq!(trade.entry_date, d(2));
        assert_eq!(trade.entry_price, dec!(10));
        assert_eq!(trade.shares, 100);
        assert_eq!(trade.reason, ExitReason::StopLoss);
        assert_eq!(trade.exit_date, d(4));
        assert_eq!(trade.exit_price, dec!(8.7));
        assert_eq!(trade.pnl, dec!(-130));
    }

    #[test]
    fn idle_portfolio_has_zero_ratios() {
        let series = breakout_series("VNM", 260);
        let result = run_simulation(&[series], &[], &backtest_config(2020)).unwrap();
        let report = BacktestReport::from_portfolio(&result.portfolio);

        let perf = report.performance.unwrap();
        assert_eq!(perf.total_return_pct, 0.0);
        assert_eq!(perf.max_drawdown_pct, 0.0);
        assert_eq!(perf.sharpe_ratio, 0.0);
        assert_eq!(perf.calmar_ratio, 0.0);
        assert_eq!(report.trade_stats.total_trades, 0);
        assert_eq!(report.open_holdings, 0);
    }

    #[test]
    fn start_year_after_data_is_no_data() {
        let series = breakout_series("VNM", 260);
        assert!(matches!(
            run_simulation(&[series], &[], &backtest_config(2030)),
            Err(ScreenerError::NoData)
        ));
    }

    #[test]
    fn net_worth_recorded_every_trading_day() {
        let series = breakout_series("VNM", 260);
        let result = run_simulation(&[series], &[], &backtest_config(2020)).unwrap();
        assert_eq!(result.trading_days.len(), 260);
        assert_eq!(result.portfolio.net_worth.len(), 260);
        assert!(
            result
                .portfolio
                .net_worth
                .iter()
                .all(|p| p.value == dec!(100000000))
        );
    }
}

fn random_walk(steps: Vec<f64>) -> InstrumentSeries {
    let mut close = 100.0;
    let bars = steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| {
            let open = close;
            close = (close + step).max(20.0);
            OhlcvBar {
                date: date(2020, 1, 1) + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect();
    InstrumentSeries::new("RND", bars).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn signals_respect_score_bounds(steps in prop::collection::vec(-2.0f64..2.2, 260..300)) {
        let config = ScreenerConfig::default();
        let outcome = run_analysis(&[random_walk(steps)], &config, ScanMode::FullHistory).unwrap();
        for s in &outcome.signals {
            prop_assert!(s.confidence <= 95);
            prop_assert!(s.score >= config.threshold / 10.0);
            prop_assert!(s.score <= 10.0);
            prop_assert!(s.target_price > s.current_price);
            prop_assert!(s.stop_loss < s.current_price);
        }
    }

    #[test]
    fn simulation_never_goes_negative(steps in prop::collection::vec(-2.0f64..2.2, 260..300)) {
        let series = random_walk(steps);
        let outcome = run_analysis(
            std::slice::from_ref(&series),
            &ScreenerConfig::default(),
            ScanMode::FullHistory,
        )
        .unwrap();
        let result = run_simulation(&[series], &outcome.signals, &backtest_config(2020)).unwrap();
        prop_assert!(result.portfolio.cash >= Decimal::ZERO);
        prop_assert!(result.portfolio.net_worth.iter().all(|p| p.value > Decimal::ZERO));
    }
}

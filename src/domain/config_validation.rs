//! Configuration validation.
//!
//! Rejects out-of-range values before any scan or backtest runs. Absent keys
//! fall back to their defaults and are not errors.

use crate::domain::error::ScreenerError;
use crate::domain::rule::{Category, SignalId};
use crate::ports::config_port::ConfigPort;

pub fn validate_screener_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    for key in [
        "min_history",
        "liquidity_window",
        "macd_cross_lookback",
        "sma_cross_lookback",
        "divergence_lookback",
        "divergence_order",
    ] {
        validate_positive_int(config, "screener", key)?;
    }
    validate_threshold(config)?;
    validate_liquidity(config)?;
    validate_weights(config)?;
    validate_points(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_initial_capital(config)?;
    validate_positive_int(config, "backtest", "max_holding_days")?;
    validate_holding_tolerance(config)?;
    validate_position_size(config)?;
    validate_start_year(config)?;
    Ok(())
}

pub fn validate_report_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    match config.get_string("report", "format") {
        None => Ok(()),
        Some(f) if matches!(f.trim().to_lowercase().as_str(), "csv" | "json") => Ok(()),
        Some(_) => Err(invalid("report", "format", "format must be csv or json")),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> ScreenerError {
    ScreenerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Parsed numeric value of a key, `None` when absent.
fn number(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, ScreenerError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| invalid(section, key, &format!("{key} must be a number"))),
    }
}

fn validate_positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), ScreenerError> {
    match config.get_string(section, key) {
        None => Ok(()),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(v) if v > 0 => Ok(()),
            _ => Err(invalid(
                section,
                key,
                &format!("{key} must be a positive integer"),
            )),
        },
    }
}

fn validate_threshold(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if let Some(v) = number(config, "screener", "threshold")? {
        if v <= 0.0 || v >= 100.0 {
            return Err(invalid(
                "screener",
                "threshold",
                "threshold must be between 0 and 100 (exclusive)",
            ));
        }
    }
    Ok(())
}

fn validate_liquidity(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if let Some(v) = number(config, "screener", "min_avg_traded_value")? {
        if v < 0.0 {
            return Err(invalid(
                "screener",
                "min_avg_traded_value",
                "min_avg_traded_value must be non-negative",
            ));
        }
    }
    if let Some(v) = number(config, "screener", "traded_value_multiplier")? {
        if v <= 0.0 {
            return Err(invalid(
                "screener",
                "traded_value_multiplier",
                "traded_value_multiplier must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_weights(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    for key in ["weight_trend", "weight_momentum", "weight_volume"] {
        if let Some(v) = number(config, "screener", key)? {
            if v < 0.0 {
                return Err(invalid("screener", key, &format!("{key} must be non-negative")));
            }
        }
    }
    Ok(())
}

/// Risk rules subtract points; every other rule adds them.
fn validate_points(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    for id in SignalId::ALL {
        let key = id.key();
        let Some(raw) = config.get_string("points", key) else {
            continue;
        };
        let points: i64 = raw
            .trim()
            .parse()
            .map_err(|_| invalid("points", key, "points must be an integer"))?;
        if id.category() == Category::Risk {
            if points > 0 {
                return Err(invalid("points", key, "risk points must be zero or negative"));
            }
        } else if points < 0 {
            return Err(invalid("points", key, "points must be non-negative"));
        }
        if i32::try_from(points).is_err() {
            return Err(invalid("points", key, "points out of range"));
        }
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if let Some(v) = number(config, "backtest", "initial_capital")? {
        if v <= 0.0 {
            return Err(invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_holding_tolerance(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if let Some(v) = number(config, "backtest", "holding_tolerance")? {
        if v < 1.0 {
            return Err(invalid(
                "backtest",
                "holding_tolerance",
                "holding_tolerance must be at least 1",
            ));
        }
    }
    Ok(())
}

fn validate_position_size(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if let Some(v) = number(config, "backtest", "position_size")? {
        if v <= 0.0 || v > 1.0 {
            return Err(invalid(
                "backtest",
                "position_size",
                "position_size must be between 0 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_start_year(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    match config.get_string("backtest", "start_year") {
        None => Ok(()),
        Some(raw) => match raw.trim().parse::<i32>() {
            Ok(y) if (1900..=9999).contains(&y) => Ok(()),
            _ => Err(invalid(
                "backtest",
                "start_year",
                "start_year must be a four-digit year",
            )),
        },
    }
}

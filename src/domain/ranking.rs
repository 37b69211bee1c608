//! Composite ranker.
//!
//! Normalises each category score against its attainable maximum, applies
//! the master weights and the risk adjustment, and turns qualifying days into
//! [`SignalResult`]s with confidence, timeframe and ATR-based price levels.

use crate::domain::features::FeatureRow;
use crate::domain::money::{round_money, to_decimal, to_f64, PRICE_DP};
use crate::domain::rule::{Category, SignalId};
use crate::domain::scoring::ScoreCard;
use crate::domain::strategy::ScreenerConfig;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CONFIDENCE_BASE: f64 = 50.0;
pub const CONFIDENCE_SPAN: f64 = 45.0;
pub const CONFIDENCE_CAP: f64 = 95.0;
pub const TARGET_ATR_MULTIPLE: Decimal = dec!(2);
pub const STOP_ATR_MULTIPLE: Decimal = dec!(1.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "short-term")]
    ShortTerm,
    #[serde(rename = "medium-term")]
    MediumTerm,
    #[serde(rename = "watch")]
    Watch,
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::ShortTerm => "short-term",
            Timeframe::MediumTerm => "medium-term",
            Timeframe::Watch => "watch",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub ticker: String,
    pub date: NaiveDate,
    pub current_price: Decimal,
    pub target_price: Decimal,
    pub stop_loss: Decimal,
    pub timeframe: Timeframe,
    pub confidence: u8,
    pub score: f64,
    pub key_reasons: Vec<String>,
    pub rationale: String,
}

/// Category scores divided by their maxima; zero when a maximum is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryRatios {
    pub trend: f64,
    pub momentum: f64,
    pub volume: f64,
}

impl CategoryRatios {
    pub fn from_card(card: &ScoreCard, config: &ScreenerConfig) -> Self {
        let ratio = |category: Category| {
            let max = config.points.category_max(category);
            if max == 0 {
                0.0
            } else {
                card.category_score(category) as f64 / max as f64
            }
        };
        CategoryRatios {
            trend: ratio(Category::Trend),
            momentum: ratio(Category::Momentum),
            volume: ratio(Category::Volume),
        }
    }

    pub fn rationale(&self) -> String {
        format!(
            "Trend:{:.2},Mom:{:.2},Vol:{:.2}",
            self.trend, self.momentum, self.volume
        )
    }
}

pub fn composite_score(ratios: &CategoryRatios, risk: f64, config: &ScreenerConfig) -> f64 {
    let w = &config.weights;
    let weighted = ratios.trend * w.trend + ratios.momentum * w.momentum + ratios.volume * w.volume;
    (weighted + risk).max(0.0)
}

pub fn confidence(score: f64, threshold: f64, card: &ScoreCard) -> u8 {
    let mut value = CONFIDENCE_BASE + (score - threshold) / (100.0 - threshold) * CONFIDENCE_SPAN;

    let crossover = card.triggered.iter().any(|id| id.is_crossover());
    let strong_volume = card.has(SignalId::RelativeVolume25);
    if crossover {
        value += 5.0;
    }
    if strong_volume {
        value += 5.0;
    }
    if crossover && strong_volume {
        value += 5.0;
    }
    if card.has(SignalId::BearishEngulfing) {
        value -= 10.0;
    }
    if card.has(SignalId::BearishDivergence) {
        value -= 15.0;
    }

    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, CONFIDENCE_CAP).trunc() as u8
}

pub fn classify_timeframe(ratios: &CategoryRatios) -> Timeframe {
    if ratios.momentum >= 0.7 && ratios.volume >= 0.6 {
        Timeframe::ShortTerm
    } else if ratios.trend >= 0.8 && ratios.momentum < 0.7 {
        Timeframe::MediumTerm
    } else {
        Timeframe::Watch
    }
}

/// `(target, stop)` at `close ± k × ATR`, each rounded to cents.
///
/// `None` when the levels collapse onto each other after rounding; such a
/// day has no exit band and is not reported.
pub fn price_levels(close: f64, atr: f64) -> Option<(Decimal, Decimal)> {
    let close = to_decimal(close)?;
    let atr = to_decimal(atr)?;
    let target = round_money(close + TARGET_ATR_MULTIPLE * atr, PRICE_DP);
    let stop = round_money(close - STOP_ATR_MULTIPLE * atr, PRICE_DP);
    (target > stop).then_some((target, stop))
}

/// Composite rescaled to 0-10 at one decimal place.
pub fn display_score(composite: f64) -> f64 {
    to_decimal(composite / 10.0)
        .map(|d| to_f64(round_money(d, 1)))
        .unwrap_or(0.0)
}

/// Rank one scored day. `None` when the composite misses the threshold.
pub fn rank(
    ticker: &str,
    row: &FeatureRow,
    card: &ScoreCard,
    config: &ScreenerConfig,
) -> Option<SignalResult> {
    let ratios = CategoryRatios::from_card(card, config);
    let composite = composite_score(&ratios, card.risk as f64, config);
    if composite < config.threshold {
        return None;
    }

    let (target_price, stop_loss) = price_levels(row.close, row.atr14)?;
    Some(SignalResult {
        ticker: ticker.to_string(),
        date: row.date,
        current_price: to_decimal(row.close)?,
        target_price,
        stop_loss,
        timeframe: classify_timeframe(&ratios),
        confidence: confidence(composite, config.threshold, card),
        score: display_score(composite),
        key_reasons: card.reasons(),
        rationale: ratios.rationale(),
    })
}

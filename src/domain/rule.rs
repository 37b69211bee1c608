//! Declarative signal rule table.
//!
//! Each rule pairs a predicate over one evaluated day with a category, a
//! config key for its point value and a reason tag. The scorer walks the
//! table uniformly; adding a signal means adding a row here.

use crate::domain::features::FeatureRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Trend,
    Momentum,
    Volume,
    Risk,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Trend => "trend",
            Category::Momentum => "momentum",
            Category::Volume => "volume",
            Category::Risk => "risk",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalId {
    PriceAboveSma150,
    PriceAboveSma50,
    Sma50AboveSma150,
    Near52wHigh15,
    Near52wHigh5,
    RsiAbove50,
    RsiAbove60,
    MacdAboveSignal,
    MacdRecentCrossover,
    Sma20CrossSma50,
    RelativeVolume15,
    RelativeVolume25,
    CmfPositive,
    BearishEngulfing,
    BearishDivergence,
}

impl SignalId {
    pub const COUNT: usize = 15;

    pub const ALL: [SignalId; SignalId::COUNT] = [
        SignalId::PriceAboveSma150,
        SignalId::PriceAboveSma50,
        SignalId::Sma50AboveSma150,
        SignalId::Near52wHigh15,
        SignalId::Near52wHigh5,
        SignalId::RsiAbove50,
        SignalId::RsiAbove60,
        SignalId::MacdAboveSignal,
        SignalId::MacdRecentCrossover,
        SignalId::Sma20CrossSma50,
        SignalId::RelativeVolume15,
        SignalId::RelativeVolume25,
        SignalId::CmfPositive,
        SignalId::BearishEngulfing,
        SignalId::BearishDivergence,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Key under `[points]` in the config file.
    pub fn key(self) -> &'static str {
        match self {
            SignalId::PriceAboveSma150 => "price_above_sma150",
            SignalId::PriceAboveSma50 => "price_above_sma50",
            SignalId::Sma50AboveSma150 => "sma50_above_sma150",
            SignalId::Near52wHigh15 => "near_52w_high_15",
            SignalId::Near52wHigh5 => "near_52w_high_5",
            SignalId::RsiAbove50 => "rsi_above_50",
            SignalId::RsiAbove60 => "rsi_above_60",
            SignalId::MacdAboveSignal => "macd_above_signal",
            SignalId::MacdRecentCrossover => "macd_recent_crossover",
            SignalId::Sma20CrossSma50 => "sma20_cross_sma50",
            SignalId::RelativeVolume15 => "rvol_above_1_5",
            SignalId::RelativeVolume25 => "rvol_above_2_5",
            SignalId::CmfPositive => "cmf_positive",
            SignalId::BearishEngulfing => "bearish_engulfing",
            SignalId::BearishDivergence => "rsi_bearish_divergence",
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            SignalId::PriceAboveSma150 => "Long-term uptrend",
            SignalId::PriceAboveSma50 => "Medium-term uptrend",
            SignalId::Sma50AboveSma150 => "Bullish structure",
            SignalId::Near52wHigh15 => "Near 52-week high",
            SignalId::Near52wHigh5 => "Breakout ready",
            SignalId::RsiAbove50 => "Positive RSI",
            SignalId::RsiAbove60 => "Strong RSI",
            SignalId::MacdAboveSignal => "MACD bullish",
            SignalId::MacdRecentCrossover => "TRIGGER: MACD crossover",
            SignalId::Sma20CrossSma50 => "TRIGGER: Golden cross",
            SignalId::RelativeVolume15 => "Volume attention",
            SignalId::RelativeVolume25 => "Strong volume inflow",
            SignalId::CmfPositive => "Buying pressure",
            SignalId::BearishEngulfing => "WARNING: Bearish engulfing",
            SignalId::BearishDivergence => "WARNING: RSI bearish divergence",
        }
    }

    pub fn category(self) -> Category {
        match self {
            SignalId::PriceAboveSma150
            | SignalId::PriceAboveSma50
            | SignalId::Sma50AboveSma150
            | SignalId::Near52wHigh15
            | SignalId::Near52wHigh5 => Category::Trend,
            SignalId::RsiAbove50
            | SignalId::RsiAbove60
            | SignalId::MacdAboveSignal
            | SignalId::MacdRecentCrossover
            | SignalId::Sma20CrossSma50 => Category::Momentum,
            SignalId::RelativeVolume15 | SignalId::RelativeVolume25 | SignalId::CmfPositive => {
                Category::Volume
            }
            SignalId::BearishEngulfing | SignalId::BearishDivergence => Category::Risk,
        }
    }

    pub fn default_points(self) -> i32 {
        match self {
            SignalId::PriceAboveSma150 => 4,
            SignalId::PriceAboveSma50 => 3,
            SignalId::Sma50AboveSma150 => 3,
            SignalId::Near52wHigh15 => 2,
            SignalId::Near52wHigh5 => 2,
            SignalId::RsiAbove50 => 2,
            SignalId::RsiAbove60 => 2,
            SignalId::MacdAboveSignal => 2,
            SignalId::MacdRecentCrossover => 4,
            SignalId::Sma20CrossSma50 => 5,
            SignalId::RelativeVolume15 => 3,
            SignalId::RelativeVolume25 => 3,
            SignalId::CmfPositive => 4,
            SignalId::BearishEngulfing => -5,
            SignalId::BearishDivergence => -8,
        }
    }

    pub fn from_key(key: &str) -> Option<SignalId> {
        SignalId::ALL.into_iter().find(|id| id.key() == key)
    }

    pub fn is_crossover(self) -> bool {
        matches!(
            self,
            SignalId::MacdRecentCrossover | SignalId::Sma20CrossSma50
        )
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Everything a predicate may look at for one evaluated day. Window-based
/// facts are resolved by the scorer before the table is walked.
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    pub row: &'a FeatureRow,
    pub macd_crossed: bool,
    pub sma_crossed: bool,
    pub bearish_divergence: bool,
}

pub struct SignalRule {
    pub id: SignalId,
    pub predicate: fn(&RuleContext<'_>) -> bool,
}

pub static SIGNAL_RULES: [SignalRule; SignalId::COUNT] = [
    SignalRule {
        id: SignalId::PriceAboveSma150,
        predicate: |c| c.row.close > c.row.sma150,
    },
    SignalRule {
        id: SignalId::PriceAboveSma50,
        predicate: |c| c.row.close > c.row.sma50,
    },
    SignalRule {
        id: SignalId::Sma50AboveSma150,
        predicate: |c| c.row.sma50 > c.row.sma150,
    },
    SignalRule {
        id: SignalId::Near52wHigh15,
        predicate: |c| c.row.close >= c.row.high_52w * 0.85,
    },
    SignalRule {
        id: SignalId::Near52wHigh5,
        predicate: |c| c.row.close >= c.row.high_52w * 0.95,
    },
    SignalRule {
        id: SignalId::RsiAbove50,
        predicate: |c| c.row.rsi14 > 50.0,
    },
    SignalRule {
        id: SignalId::RsiAbove60,
        predicate: |c| c.row.rsi14 > 60.0,
    },
    SignalRule {
        id: SignalId::MacdAboveSignal,
        predicate: |c| c.row.macd > c.row.macd_signal,
    },
    SignalRule {
        id: SignalId::MacdRecentCrossover,
        predicate: |c| c.macd_crossed,
    },
    SignalRule {
        id: SignalId::Sma20CrossSma50,
        predicate: |c| c.sma_crossed,
    },
    SignalRule {
        id: SignalId::RelativeVolume15,
        predicate: |c| c.row.relative_volume > 1.5,
    },
    SignalRule {
        id: SignalId::RelativeVolume25,
        predicate: |c| c.row.relative_volume > 2.5,
    },
    SignalRule {
        id: SignalId::CmfPositive,
        predicate: |c| c.row.cmf20 > 0.0,
    },
    SignalRule {
        id: SignalId::BearishEngulfing,
        predicate: |c| c.row.engulfing.is_bearish(),
    },
    SignalRule {
        id: SignalId::BearishDivergence,
        predicate: |c| c.bearish_divergence,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::Engulfing;
    use chrono::NaiveDate;

    fn neutral_row() -> FeatureRow {
        FeatureRow {
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 1000.0,
            sma20: 100.0,
            sma50: 100.0,
            sma150: 100.0,
            rsi14: 50.0,
            macd: 0.0,
            macd_signal: 0.0,
            volume_sma50: 1000.0,
            relative_volume: 1.0,
            high_52w: 200.0,
            cmf20: 0.0,
            atr14: 2.0,
            engulfing: Engulfing::None,
        }
    }

    fn fires(id: SignalId, ctx: &RuleContext<'_>) -> bool {
        let rule = SIGNAL_RULES.iter().find(|r| r.id == id).unwrap();
        (rule.predicate)(ctx)
    }

    fn ctx(row: &FeatureRow) -> RuleContext<'_> {
        RuleContext {
            row,
            macd_crossed: false,
            sma_crossed: false,
            bearish_divergence: false,
        }
    }

    #[test]
    fn table_covers_every_signal_once() {
        for (i, rule) in SIGNAL_RULES.iter().enumerate() {
            assert_eq!(rule.id, SignalId::ALL[i]);
            assert_eq!(rule.id.index(), i);
        }
    }

    #[test]
    fn neutral_row_fires_nothing() {
        let row = neutral_row();
        let c = ctx(&row);
        for rule in &SIGNAL_RULES {
            assert!(!(rule.predicate)(&c), "{} fired on a neutral row", rule.id);
        }
    }

    #[test]
    fn trend_rules_are_strict() {
        let row = FeatureRow {
            close: 100.0,
            sma150: 100.0,
            ..neutral_row()
        };
        assert!(!fires(SignalId::PriceAboveSma150, &ctx(&row)));

        let row = FeatureRow {
            close: 100.01,
            ..row
        };
        assert!(fires(SignalId::PriceAboveSma150, &ctx(&row)));
    }

    #[test]
    fn near_high_rules_are_inclusive() {
        let row = FeatureRow {
            close: 96.0,
            high_52w: 100.0,
            ..neutral_row()
        };
        assert!(fires(SignalId::Near52wHigh15, &ctx(&row)));
        assert!(fires(SignalId::Near52wHigh5, &ctx(&row)));

        let row = FeatureRow {
            close: 90.0,
            ..row
        };
        assert!(fires(SignalId::Near52wHigh15, &ctx(&row)));
        assert!(!fires(SignalId::Near52wHigh5, &ctx(&row)));
    }

    #[test]
    fn rsi_tiers() {
        let row = FeatureRow {
            rsi14: 60.0,
            ..neutral_row()
        };
        assert!(fires(SignalId::RsiAbove50, &ctx(&row)));
        assert!(!fires(SignalId::RsiAbove60, &ctx(&row)));
    }

    #[test]
    fn volume_tiers() {
        let row = FeatureRow {
            relative_volume: 2.6,
            cmf20: 0.1,
            ..neutral_row()
        };
        assert!(fires(SignalId::RelativeVolume15, &ctx(&row)));
        assert!(fires(SignalId::RelativeVolume25, &ctx(&row)));
        assert!(fires(SignalId::CmfPositive, &ctx(&row)));
    }

    #[test]
    fn window_facts_drive_their_rules() {
        let row = neutral_row();
        let c = RuleContext {
            row: &row,
            macd_crossed: true,
            sma_crossed: true,
            bearish_divergence: true,
        };
        assert!(fires(SignalId::MacdRecentCrossover, &c));
        assert!(fires(SignalId::Sma20CrossSma50, &c));
        assert!(fires(SignalId::BearishDivergence, &c));
    }

    #[test]
    fn bearish_engulfing_rule() {
        let row = FeatureRow {
            engulfing: Engulfing::Bearish,
            ..neutral_row()
        };
        assert!(fires(SignalId::BearishEngulfing, &ctx(&row)));

        let row = FeatureRow {
            engulfing: Engulfing::Bullish,
            ..neutral_row()
        };
        assert!(!fires(SignalId::BearishEngulfing, &ctx(&row)));
    }

    #[test]
    fn keys_round_trip_and_categories() {
        for id in SignalId::ALL {
            assert_eq!(SignalId::from_key(id.key()), Some(id));
        }
        assert_eq!(SignalId::from_key("unknown"), None);
        assert_eq!(SignalId::CmfPositive.category(), Category::Volume);
        assert_eq!(SignalId::BearishDivergence.category(), Category::Risk);
    }

    #[test]
    fn default_category_maxima() {
        let max = |cat: Category| -> i32 {
            SignalId::ALL
                .iter()
                .filter(|id| id.category() == cat)
                .map(|id| id.default_points().max(0))
                .sum()
        };
        assert_eq!(max(Category::Trend), 14);
        assert_eq!(max(Category::Momentum), 15);
        assert_eq!(max(Category::Volume), 10);
    }
}

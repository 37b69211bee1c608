//! Signal scorer.
//!
//! Resolves the window-based facts for one day (recent crossovers, bearish
//! divergence), then walks [`SIGNAL_RULES`] and accumulates category points.
//!
//! # Crossover semantics
//!
//! A crossover within a trailing window of `n` observations holds when at
//! least one observation has fast > slow and at least one has fast <= slow.
//! Days where either side is undefined count as neither.

use crate::domain::divergence::detect_bearish_divergence;
use crate::domain::features::{FeatureRow, FeatureTable};
use crate::domain::rule::{Category, RuleContext, SignalId, SIGNAL_RULES};
use crate::domain::strategy::{ScreenerConfig, SignalPoints};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreCard {
    pub trend: i32,
    pub momentum: i32,
    pub volume: i32,
    pub risk: i32,
    pub triggered: Vec<SignalId>,
}

impl ScoreCard {
    pub fn has(&self, id: SignalId) -> bool {
        self.triggered.contains(&id)
    }

    pub fn category_score(&self, category: Category) -> i32 {
        match category {
            Category::Trend => self.trend,
            Category::Momentum => self.momentum,
            Category::Volume => self.volume,
            Category::Risk => self.risk,
        }
    }

    /// Reason tags in trigger order, first occurrence kept.
    pub fn reasons(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.triggered.len());
        for id in &self.triggered {
            let tag = id.reason();
            if !out.iter().any(|r| r == tag) {
                out.push(tag.to_string());
            }
        }
        out
    }
}

pub fn crossed_within(
    fast: &[Option<f64>],
    slow: &[Option<f64>],
    end: usize,
    window: usize,
) -> bool {
    if window == 0 || end >= fast.len() || end >= slow.len() {
        return false;
    }
    let start = end.saturating_sub(window - 1);
    let mut above = false;
    let mut at_or_below = false;
    for i in start..=end {
        if let (Some(f), Some(s)) = (fast[i], slow[i]) {
            if f > s {
                above = true;
            } else {
                at_or_below = true;
            }
        }
    }
    above && at_or_below
}

pub fn evaluate_rules(ctx: &RuleContext<'_>, points: &SignalPoints) -> ScoreCard {
    let mut card = ScoreCard::default();
    for rule in &SIGNAL_RULES {
        if !(rule.predicate)(ctx) {
            continue;
        }
        let pts = points.get(rule.id);
        match rule.id.category() {
            Category::Trend => card.trend += pts,
            Category::Momentum => card.momentum += pts,
            Category::Volume => card.volume += pts,
            Category::Risk => card.risk += pts,
        }
        card.triggered.push(rule.id);
    }
    card
}

/// Score day `i` of an instrument. `None` when the day's row is incomplete.
pub fn score_day(
    table: &FeatureTable,
    closes: &[f64],
    i: usize,
    config: &ScreenerConfig,
) -> Option<(FeatureRow, ScoreCard)> {
    let row = table.row(i)?;

    let ctx = RuleContext {
        row: &row,
        macd_crossed: crossed_within(&table.macd, &table.macd_signal, i, config.macd_cross_lookback),
        sma_crossed: crossed_within(&table.sma20, &table.sma50, i, config.sma_cross_lookback),
        bearish_divergence: detect_bearish_divergence(
            &closes[..=i],
            &table.rsi14[..=i],
            config.divergence_lookback,
            config.divergence_order,
        ),
    };
    let card = evaluate_rules(&ctx, &config.points);
    Some((row, card))
}

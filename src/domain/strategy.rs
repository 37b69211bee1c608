//! Screening strategy parameters.
//!
//! Passed by value into the scorer and ranker so parallel runs can use
//! different settings side by side.

use crate::domain::divergence;
use crate::domain::rule::{Category, SignalId};

pub const DEFAULT_MIN_HISTORY: usize = 252;
pub const DEFAULT_MIN_AVG_TRADED_VALUE: f64 = 1_000_000_000.0;
pub const DEFAULT_TRADED_VALUE_MULTIPLIER: f64 = 1000.0;
pub const DEFAULT_LIQUIDITY_WINDOW: usize = 20;
pub const DEFAULT_THRESHOLD: f64 = 65.0;
pub const DEFAULT_MACD_CROSS_LOOKBACK: usize = 3;
pub const DEFAULT_SMA_CROSS_LOOKBACK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterWeights {
    pub trend: f64,
    pub momentum: f64,
    pub volume: f64,
}

impl Default for MasterWeights {
    fn default() -> Self {
        MasterWeights {
            trend: 40.0,
            momentum: 30.0,
            volume: 30.0,
        }
    }
}

/// Point value per signal, indexed by [`SignalId::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalPoints {
    points: [i32; SignalId::COUNT],
}

impl Default for SignalPoints {
    fn default() -> Self {
        let mut points = [0; SignalId::COUNT];
        for id in SignalId::ALL {
            points[id.index()] = id.default_points();
        }
        SignalPoints { points }
    }
}

impl SignalPoints {
    pub fn get(&self, id: SignalId) -> i32 {
        self.points[id.index()]
    }

    pub fn set(&mut self, id: SignalId, points: i32) {
        self.points[id.index()] = points;
    }

    /// Highest attainable score in a category: the sum of its positive points.
    pub fn category_max(&self, category: Category) -> i32 {
        SignalId::ALL
            .iter()
            .filter(|id| id.category() == category)
            .map(|&id| self.get(id).max(0))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerConfig {
    pub min_history: usize,
    pub min_avg_traded_value: f64,
    pub traded_value_multiplier: f64,
    pub liquidity_window: usize,
    pub threshold: f64,
    pub weights: MasterWeights,
    pub points: SignalPoints,
    pub macd_cross_lookback: usize,
    pub sma_cross_lookback: usize,
    pub divergence_lookback: usize,
    pub divergence_order: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        ScreenerConfig {
            min_history: DEFAULT_MIN_HISTORY,
            min_avg_traded_value: DEFAULT_MIN_AVG_TRADED_VALUE,
            traded_value_multiplier: DEFAULT_TRADED_VALUE_MULTIPLIER,
            liquidity_window: DEFAULT_LIQUIDITY_WINDOW,
            threshold: DEFAULT_THRESHOLD,
            weights: MasterWeights::default(),
            points: SignalPoints::default(),
            macd_cross_lookback: DEFAULT_MACD_CROSS_LOOKBACK,
            sma_cross_lookback: DEFAULT_SMA_CROSS_LOOKBACK,
            divergence_lookback: divergence::DEFAULT_LOOKBACK,
            divergence_order: divergence::DEFAULT_ORDER,
        }
    }
}

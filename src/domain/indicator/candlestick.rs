//! Two-candle engulfing pattern.
//!
//! Bearish: previous candle white, current black, current body covers the
//! previous body (open ≥ prev close, close ≤ prev open, at least one strict).
//! Bullish is the mirror image. The first bar has no predecessor and is `None`.

use crate::domain::ohlcv::OhlcvBar;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engulfing {
    Bullish,
    Bearish,
    None,
}

impl Engulfing {
    pub fn is_bearish(self) -> bool {
        self == Engulfing::Bearish
    }
}

pub fn detect_engulfing(bars: &[OhlcvBar]) -> Vec<Option<Engulfing>> {
    let mut out = Vec::with_capacity(bars.len());
    if bars.is_empty() {
        return out;
    }
    out.push(None);
    for pair in bars.windows(2) {
        out.push(Some(classify(&pair[0], &pair[1])));
    }
    out
}

fn classify(prev: &OhlcvBar, curr: &OhlcvBar) -> Engulfing {
    if prev.is_white()
        && curr.is_black()
        && curr.open >= prev.close
        && curr.close <= prev.open
        && (curr.open > prev.close || curr.close < prev.open)
    {
        return Engulfing::Bearish;
    }
    if prev.is_black()
        && curr.is_white()
        && curr.open <= prev.close
        && curr.close >= prev.open
        && (curr.open < prev.close || curr.close > prev.open)
    {
        return Engulfing::Bullish;
    }
    Engulfing::None
}

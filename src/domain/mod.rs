//! Core domain types and logic.

pub mod ohlcv;
pub mod instrument;
pub mod indicator;
pub mod features;
pub mod divergence;
pub mod money;
pub mod rule;
pub mod strategy;
pub mod scoring;
pub mod ranking;
pub mod universe;
pub mod analysis;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;

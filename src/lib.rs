//! NeuralTrade - market-signal decision engine
//!
//! Technical indicators, risk-adjusted sizing, signal classification and a
//! polling trading agent over pluggable sentiment, market-data and
//! execution collaborators.

pub mod config;
pub mod error;
pub mod services;
pub mod types;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::{LoopState, RiskEngine, SignalGenerator, TradingAgent};
pub use types::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::{RiskAssessment, SentimentReading, TechnicalSnapshot};
use crate::error::{AppError, Result};

/// Trading strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    GridTrading,
    Dca,
    Momentum,
    Arbitrage,
    LpFarming,
    #[default]
    AiPredictive,
}

impl StrategyType {
    pub const ALL: [StrategyType; 6] = [
        StrategyType::GridTrading,
        StrategyType::Dca,
        StrategyType::Momentum,
        StrategyType::Arbitrage,
        StrategyType::LpFarming,
        StrategyType::AiPredictive,
    ];

    /// Wire value (snake_case).
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::GridTrading => "grid_trading",
            StrategyType::Dca => "dca",
            StrategyType::Momentum => "momentum",
            StrategyType::Arbitrage => "arbitrage",
            StrategyType::LpFarming => "lp_farming",
            StrategyType::AiPredictive => "ai_predictive",
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StrategyType {
    type Err = AppError;

    /// Case-insensitive; accepts both `grid_trading` and `GRID_TRADING`.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        StrategyType::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| AppError::UnknownStrategy(s.to_string()))
    }
}

/// Discrete trading action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    pub fn is_hold(&self) -> bool {
        matches!(self, TradeAction::Hold)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
            TradeAction::Hold => write!(f, "HOLD"),
        }
    }
}

/// Five-level directional tag derived from the market score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStrength {
    VeryBearish,
    Bearish,
    Neutral,
    Bullish,
    VeryBullish,
}

impl SignalStrength {
    /// Numeric value (-2 to 2).
    pub fn value(&self) -> i8 {
        match self {
            SignalStrength::VeryBearish => -2,
            SignalStrength::Bearish => -1,
            SignalStrength::Neutral => 0,
            SignalStrength::Bullish => 1,
            SignalStrength::VeryBullish => 2,
        }
    }
}

/// Open metadata carried by a signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalMetadata {
    /// Raw fused market score in [-1, 1]
    pub market_score: f64,
    pub risk_assessment: Option<RiskAssessment>,
    /// Market price at evaluation time, when the market-data provider answered
    pub reference_price: Option<f64>,
    pub sentiment: Option<SentimentReading>,
    pub technical: Option<TechnicalSnapshot>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A classified trading signal. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub timestamp: DateTime<Utc>,
    pub token: String,
    pub action: TradeAction,
    /// Confidence (0-100)
    pub confidence: f64,
    pub signal_strength: SignalStrength,
    pub reasoning: String,
    /// Fractional expected return (0.15 = 15%)
    pub expected_return: f64,
    /// Risk score (0-100)
    pub risk_score: f64,
    pub strategy: StrategyType,
    pub metadata: SignalMetadata,
}

impl TradingSignal {
    pub fn risk_assessment(&self) -> Option<&RiskAssessment> {
        self.metadata.risk_assessment.as_ref()
    }

    /// Check that an actionable signal carries a risk assessment within the account limit.
    pub fn validate(&self, max_position_size: f64) -> Result<()> {
        if self.action.is_hold() {
            return Ok(());
        }
        let assessment = self.risk_assessment().ok_or_else(|| {
            AppError::InvalidInput(format!(
                "{} signal for {} has no risk assessment",
                self.action, self.token
            ))
        })?;
        if assessment.recommended_position_size > max_position_size {
            return Err(AppError::InvalidInput(format!(
                "recommended position size {:.2} exceeds max position size {:.2}",
                assessment.recommended_position_size, max_position_size
            )));
        }
        Ok(())
    }
}

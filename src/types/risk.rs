use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of the low risk bucket.
pub const LOW_RISK_THRESHOLD: f64 = 30.0;
/// Upper bound (exclusive) of the medium risk bucket.
pub const MEDIUM_RISK_THRESHOLD: f64 = 60.0;

/// Risk bucket derived from an overall risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bucket a score: <30 low, <60 medium, anything else high.
    pub fn from_score(score: f64) -> Self {
        if score < LOW_RISK_THRESHOLD {
            RiskLevel::Low
        } else if score < MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Composite risk assessment attached to every generated signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Overall score (0-100)
    pub overall_risk_score: f64,
    pub risk_level: RiskLevel,
    /// 50% weight of the overall score
    pub max_drawdown_risk: f64,
    /// 30% weight of the overall score
    pub volatility_risk: f64,
    /// 20% weight of the overall score
    pub liquidity_risk: f64,
    pub recommended_position_size: f64,
    /// Stop-loss price (0 when no reference price was available)
    pub stop_loss: f64,
    /// Take-profit price (0 when no reference price was available)
    pub take_profit: f64,
}

impl RiskAssessment {
    pub fn has_bracket(&self) -> bool {
        self.stop_loss > 0.0 && self.take_profit > 0.0
    }
}

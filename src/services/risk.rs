//! Risk Engine
//!
//! Position sizing, bracket pricing (stop-loss / take-profit) and composite
//! risk assessment, parameterized by strategy and account limits. The overall
//! risk score comes from an injected [`RiskModel`].

use std::sync::{Arc, Mutex as StdMutex};

use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::RiskConfig;
use crate::error::{AppError, Result};
use crate::types::{RiskAssessment, RiskLevel, StrategyType};

/// Fraction of capital used as the base position before scaling.
pub const BASE_POSITION_FRACTION: f64 = 0.02;

/// Stop-loss percentage applied when a strategy name is not recognized.
pub const DEFAULT_STOP_LOSS_PCT: f64 = 0.10;

/// Sub-score weights of the overall risk score.
pub const DRAWDOWN_WEIGHT: f64 = 0.5;
pub const VOLATILITY_WEIGHT: f64 = 0.3;
pub const LIQUIDITY_WEIGHT: f64 = 0.2;

/// Stop-loss distance below entry, as a fraction, for each strategy.
pub fn stop_loss_pct(strategy: StrategyType) -> f64 {
    match strategy {
        StrategyType::GridTrading => 0.10,
        StrategyType::Dca => 0.50,
        StrategyType::Momentum => 0.05,
        StrategyType::Arbitrage => 0.01,
        StrategyType::LpFarming => 0.20,
        StrategyType::AiPredictive => 0.08,
    }
}

/// Stop-loss percentage for a strategy given by name.
///
/// Unknown names get the grid-trading percentage (10%) instead of an error.
pub fn stop_loss_pct_by_name(name: &str) -> f64 {
    name.parse::<StrategyType>()
        .map(stop_loss_pct)
        .unwrap_or(DEFAULT_STOP_LOSS_PCT)
}

/// Source of the overall risk score for a prospective trade.
pub trait RiskModel: Send + Sync {
    /// Risk score in [0, 100] for trading `amount` of `token` under `strategy`.
    fn score(&self, token: &str, amount: f64, strategy: StrategyType) -> Result<f64>;
}

/// Placeholder model sampling the score uniformly from [20, 80].
pub struct UniformRiskModel {
    rng: StdMutex<StdRng>,
    low: f64,
    high: f64,
}

impl UniformRiskModel {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Reproducible sampler for simulations and tests.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: StdMutex::new(rng),
            low: 20.0,
            high: 80.0,
        }
    }
}

impl Default for UniformRiskModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskModel for UniformRiskModel {
    fn score(&self, _token: &str, _amount: f64, _strategy: StrategyType) -> Result<f64> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| AppError::Internal("risk model rng lock poisoned".to_string()))?;
        Ok(rng.gen_range(self.low..=self.high))
    }
}

/// Deterministic model returning the same score for every trade.
#[derive(Debug, Clone, Copy)]
pub struct FixedRiskModel(pub f64);

impl RiskModel for FixedRiskModel {
    fn score(&self, _token: &str, _amount: f64, _strategy: StrategyType) -> Result<f64> {
        Ok(self.0)
    }
}

/// Realized results for the current UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub daily_pnl: f64,
    pub daily_trades: u32,
}

impl DailyStats {
    fn starting(date: NaiveDate) -> Self {
        Self {
            date,
            daily_pnl: 0.0,
            daily_trades: 0,
        }
    }

    fn roll_to(&mut self, today: NaiveDate) {
        if self.date != today {
            debug!(from = %self.date, to = %today, "Rolling daily risk ledger");
            *self = Self::starting(today);
        }
    }
}

/// Sizing, bracket pricing and risk assessment with a daily P&L ledger.
pub struct RiskEngine {
    config: RiskConfig,
    model: Arc<dyn RiskModel>,
    ledger: Mutex<DailyStats>,
}

impl RiskEngine {
    pub fn new(config: RiskConfig, model: Arc<dyn RiskModel>) -> Self {
        Self {
            config,
            model,
            ledger: Mutex::new(DailyStats::starting(Utc::now().date_naive())),
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn max_position_size(&self) -> f64 {
        self.config.max_position_size
    }

    /// Confidence- and risk-scaled position size, capped at the account maximum.
    ///
    /// `size = capital * 0.02 * (confidence / 100) * ((100 - risk_score) / 100)`
    pub fn calculate_position_size(&self, capital: f64, confidence: f64, risk_score: f64) -> Result<f64> {
        if !capital.is_finite() || capital < 0.0 {
            return Err(AppError::InvalidInput(format!(
                "capital must be a non-negative number, got {capital}"
            )));
        }
        check_percent("confidence", confidence)?;
        check_percent("risk_score", risk_score)?;

        let base = capital * BASE_POSITION_FRACTION;
        let size = base * (confidence / 100.0) * ((100.0 - risk_score) / 100.0);
        Ok(size.min(self.config.max_position_size))
    }

    /// `entry_price * (1 - pct[strategy])`
    pub fn calculate_stop_loss(&self, entry_price: f64, strategy: StrategyType) -> Result<f64> {
        check_price(entry_price)?;
        Ok(entry_price * (1.0 - stop_loss_pct(strategy)))
    }

    /// `entry_price + (entry_price - stop_loss) * risk_reward_ratio`
    pub fn calculate_take_profit(
        &self,
        entry_price: f64,
        strategy: StrategyType,
        risk_reward_ratio: f64,
    ) -> Result<f64> {
        if !risk_reward_ratio.is_finite() || risk_reward_ratio <= 0.0 {
            return Err(AppError::InvalidInput(format!(
                "risk/reward ratio must be positive, got {risk_reward_ratio}"
            )));
        }
        let stop_loss = self.calculate_stop_loss(entry_price, strategy)?;
        let risk = entry_price - stop_loss;
        Ok(entry_price + risk * risk_reward_ratio)
    }

    /// Stop-loss and take-profit at the configured risk/reward ratio.
    pub fn bracket(&self, entry_price: f64, strategy: StrategyType) -> Result<(f64, f64)> {
        let stop_loss = self.calculate_stop_loss(entry_price, strategy)?;
        let take_profit =
            self.calculate_take_profit(entry_price, strategy, self.config.risk_reward_ratio)?;
        Ok((stop_loss, take_profit))
    }

    /// Composite risk assessment for a prospective trade.
    ///
    /// The bracket prices are left at 0; callers with a reference price fill
    /// them through [`RiskEngine::bracket`].
    pub fn assess_risk(&self, token: &str, amount: f64, strategy: StrategyType) -> Result<RiskAssessment> {
        if token.trim().is_empty() {
            return Err(AppError::InvalidInput("token must not be empty".to_string()));
        }
        if !amount.is_finite() || amount < 0.0 {
            return Err(AppError::InvalidInput(format!(
                "amount must be a non-negative number, got {amount}"
            )));
        }

        let overall = self.model.score(token, amount, strategy)?;
        if !(0.0..=100.0).contains(&overall) {
            return Err(AppError::Internal(format!(
                "risk model returned out-of-range score {overall} for {token}"
            )));
        }

        let recommended_position_size = self.calculate_position_size(
            self.config.reference_capital,
            self.config.reference_confidence,
            overall,
        )?;

        let assessment = RiskAssessment {
            overall_risk_score: overall,
            risk_level: RiskLevel::from_score(overall),
            max_drawdown_risk: overall * DRAWDOWN_WEIGHT,
            volatility_risk: overall * VOLATILITY_WEIGHT,
            liquidity_risk: overall * LIQUIDITY_WEIGHT,
            recommended_position_size,
            stop_loss: 0.0,
            take_profit: 0.0,
        };

        debug!(
            token,
            strategy = %strategy,
            score = overall,
            level = assessment.risk_level.label(),
            size = recommended_position_size,
            "Risk assessed"
        );

        Ok(assessment)
    }

    /// Add a settled trade's realized P&L to today's ledger.
    pub async fn record_trade(&self, realized_pnl: f64) {
        let mut ledger = self.ledger.lock().await;
        ledger.roll_to(Utc::now().date_naive());
        ledger.daily_pnl += realized_pnl;
        ledger.daily_trades += 1;

        if ledger.daily_pnl <= -self.config.max_daily_loss {
            warn!(
                daily_pnl = ledger.daily_pnl,
                limit = self.config.max_daily_loss,
                "Daily loss limit reached"
            );
        }
    }

    /// Snapshot of today's ledger.
    pub async fn daily_stats(&self) -> DailyStats {
        let mut ledger = self.ledger.lock().await;
        ledger.roll_to(Utc::now().date_naive());
        *ledger
    }

    pub async fn daily_loss_limit_breached(&self) -> bool {
        self.daily_stats().await.daily_pnl <= -self.config.max_daily_loss
    }

    /// Whether new entries are currently allowed.
    ///
    /// Always true unless loss-limit enforcement is switched on.
    pub async fn can_open_position(&self) -> bool {
        if !self.config.enforce_daily_loss_limit {
            return true;
        }
        let breached = self.daily_loss_limit_breached().await;
        if breached {
            info!("Daily loss limit breached, blocking new entries");
        }
        !breached
    }
}

fn check_percent(name: &str, value: f64) -> Result<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "{name} must be within [0, 100], got {value}"
        )))
    }
}

fn check_price(price: f64) -> Result<()> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "entry price must be positive, got {price}"
        )))
    }
}

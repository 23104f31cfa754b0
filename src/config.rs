use std::env;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::types::StrategyType;

/// Risk engine limits and sizing parameters.
#[derive(Debug, Clone)]
pub struct RiskConfig {
    /// Upper bound on any recommended position size (quote currency).
    pub max_position_size: f64,
    /// Daily realized loss limit (quote currency, positive number).
    pub max_daily_loss: f64,
    /// Capital used when sizing the recommendation inside a risk assessment.
    pub reference_capital: f64,
    /// Confidence used when sizing the recommendation inside a risk assessment.
    pub reference_confidence: f64,
    /// Take-profit distance as a multiple of the stop-loss distance.
    pub risk_reward_ratio: f64,
    /// Refuse new entries once the daily loss limit is breached.
    pub enforce_daily_loss_limit: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_size: 10_000.0,
            max_daily_loss: 1_000.0,
            reference_capital: 10_000.0,
            reference_confidence: 70.0,
            risk_reward_ratio: 2.0,
            enforce_daily_loss_limit: false,
        }
    }
}

/// Trading loop and execution policy.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Minimum confidence (exclusive) for `run_strategy` to execute a signal.
    pub run_strategy_confidence_threshold: f64,
    /// Minimum confidence (exclusive) for the main loop to execute a signal.
    pub main_loop_confidence_threshold: f64,
    /// Notional requested when a signal is executed.
    pub trade_notional: f64,
    /// Tokens polled by the main loop.
    pub token_universe: Vec<String>,
    /// Strategy evaluated by the main loop.
    pub strategy: StrategyType,
    /// Sleep between main-loop iterations.
    pub poll_interval: Duration,
    /// Cooldown after a failed iteration.
    pub error_backoff: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            run_strategy_confidence_threshold: 70.0,
            main_loop_confidence_threshold: 75.0,
            trade_notional: 1_000.0,
            token_universe: parse_token_universe(DEFAULT_TOKEN_UNIVERSE),
            strategy: StrategyType::AiPredictive,
            poll_interval: Duration::from_secs(300),
            error_backoff: Duration::from_secs(60),
        }
    }
}

/// Default token universe for the main loop.
pub const DEFAULT_TOKEN_UNIVERSE: &str = "INJ,ETH,BTC,USDT";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Risk engine configuration.
    pub risk: RiskConfig,
    /// Trading loop configuration.
    pub agent: LoopConfig,
    /// Upper bound on every collaborator call (sentiment, market data, execution).
    pub collaborator_timeout: Duration,
    /// Candles requested for technical analysis.
    pub ohlcv_lookback: usize,
    /// Trading account address (0x-prefixed, 20 bytes hex).
    pub account_address: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            risk: RiskConfig::default(),
            agent: LoopConfig::default(),
            collaborator_timeout: Duration::from_secs(10),
            ohlcv_lookback: 50,
            account_address: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to their defaults; call [`Config::validate`]
    /// before using the result.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let risk = RiskConfig {
            max_position_size: env::var("MAX_POSITION_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.risk.max_position_size),
            max_daily_loss: env::var("MAX_DAILY_LOSS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.risk.max_daily_loss),
            reference_capital: env::var("REFERENCE_CAPITAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.risk.reference_capital),
            reference_confidence: env::var("REFERENCE_CONFIDENCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.risk.reference_confidence),
            risk_reward_ratio: env::var("RISK_REWARD_RATIO")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.risk.risk_reward_ratio),
            enforce_daily_loss_limit: env::var("ENFORCE_DAILY_LOSS_LIMIT")
                .ok()
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.risk.enforce_daily_loss_limit),
        };

        let agent = LoopConfig {
            run_strategy_confidence_threshold: env::var("RUN_STRATEGY_CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.agent.run_strategy_confidence_threshold),
            main_loop_confidence_threshold: env::var("MAIN_LOOP_CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.agent.main_loop_confidence_threshold),
            trade_notional: env::var("TRADE_NOTIONAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.agent.trade_notional),
            token_universe: env::var("TOKEN_UNIVERSE")
                .ok()
                .map(|v| parse_token_universe(&v))
                .filter(|tokens| !tokens.is_empty())
                .unwrap_or(defaults.agent.token_universe),
            strategy: env::var("LOOP_STRATEGY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.agent.strategy),
            poll_interval: env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.agent.poll_interval),
            error_backoff: env::var("ERROR_BACKOFF_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.agent.error_backoff),
        };

        Self {
            risk,
            agent,
            collaborator_timeout: env::var("COLLABORATOR_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.collaborator_timeout),
            ohlcv_lookback: env::var("OHLCV_LOOKBACK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ohlcv_lookback),
            account_address: env::var("ACCOUNT_ADDRESS")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        }
    }

    /// Reject values the agent cannot start with.
    pub fn validate(&self) -> Result<()> {
        let risk = &self.risk;
        for (name, value) in [
            ("MAX_POSITION_SIZE", risk.max_position_size),
            ("MAX_DAILY_LOSS", risk.max_daily_loss),
            ("REFERENCE_CAPITAL", risk.reference_capital),
            ("RISK_REWARD_RATIO", risk.risk_reward_ratio),
            ("TRADE_NOTIONAL", self.agent.trade_notional),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AppError::Config(format!("{name} must be positive, got {value}")));
            }
        }

        for (name, value) in [
            ("REFERENCE_CONFIDENCE", risk.reference_confidence),
            (
                "RUN_STRATEGY_CONFIDENCE_THRESHOLD",
                self.agent.run_strategy_confidence_threshold,
            ),
            (
                "MAIN_LOOP_CONFIDENCE_THRESHOLD",
                self.agent.main_loop_confidence_threshold,
            ),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(AppError::Config(format!(
                    "{name} must be within [0, 100], got {value}"
                )));
            }
        }

        if self.agent.poll_interval.is_zero() || self.agent.error_backoff.is_zero() {
            return Err(AppError::Config(
                "POLL_INTERVAL_SECS and ERROR_BACKOFF_SECS must be non-zero".to_string(),
            ));
        }
        if self.collaborator_timeout.is_zero() {
            return Err(AppError::Config(
                "COLLABORATOR_TIMEOUT_SECS must be non-zero".to_string(),
            ));
        }
        if self.ohlcv_lookback < 2 {
            return Err(AppError::Config(format!(
                "OHLCV_LOOKBACK must be at least 2, got {}",
                self.ohlcv_lookback
            )));
        }
        if self.agent.token_universe.is_empty() {
            return Err(AppError::Config("TOKEN_UNIVERSE is empty".to_string()));
        }

        if let Some(address) = &self.account_address {
            validate_account_address(address)?;
        }

        Ok(())
    }
}

/// Split a comma-separated token list, trimming and upper-casing symbols.
pub fn parse_token_universe(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|token| token.trim().to_uppercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Check an account address is `0x` followed by 20 hex-encoded bytes.
pub fn validate_account_address(address: &str) -> Result<()> {
    let digits = address
        .strip_prefix("0x")
        .ok_or_else(|| AppError::Config(format!("account address {address} must start with 0x")))?;
    let bytes = hex::decode(digits)
        .map_err(|e| AppError::Config(format!("account address {address} is not hex: {e}")))?;
    if bytes.len() != 20 {
        return Err(AppError::Config(format!(
            "account address must be 20 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(())
}

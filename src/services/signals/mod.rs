//! Trading signals service module.
//!
//! Fuses sentiment and technical analysis into a market score, classifies
//! it into an action and strength, and attaches a risk assessment.

pub mod indicators;
pub mod technical;

pub use technical::TechnicalAnalyzer;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::services::{with_timeout, MarketDataProvider, RiskEngine, SentimentProvider};
use crate::types::{
    MarketData, RiskLevel, SentimentReading, SignalMetadata, SignalStrength, StrategyType,
    TechnicalSnapshot, TradeAction, TradingSignal,
};

/// Scores strictly above this (or below its negation) are actionable.
pub const ACTION_THRESHOLD: f64 = 0.5;
/// Scores strictly above this (or below its negation) are "very" bullish/bearish.
pub const STRONG_THRESHOLD: f64 = 0.8;
/// Confidence never reaches 100.
pub const MAX_CONFIDENCE: f64 = 95.0;
/// Expected return at |score| = 1.
pub const MAX_EXPECTED_RETURN: f64 = 0.15;
/// Notional passed to the risk engine when assessing a new signal.
pub const RISK_ASSESSMENT_AMOUNT: f64 = 1_000.0;

/// Map a market score to an action and strength.
///
/// All boundaries are strict: 0.5 is HOLD and 0.8 is BULLISH.
pub fn classify(score: f64) -> (TradeAction, SignalStrength) {
    if score > ACTION_THRESHOLD {
        let strength = if score > STRONG_THRESHOLD {
            SignalStrength::VeryBullish
        } else {
            SignalStrength::Bullish
        };
        (TradeAction::Buy, strength)
    } else if score < -ACTION_THRESHOLD {
        let strength = if score < -STRONG_THRESHOLD {
            SignalStrength::VeryBearish
        } else {
            SignalStrength::Bearish
        };
        (TradeAction::Sell, strength)
    } else {
        (TradeAction::Hold, SignalStrength::Neutral)
    }
}

/// `min(|score| * 100, 95)`
pub fn confidence(score: f64) -> f64 {
    (score.abs() * 100.0).min(MAX_CONFIDENCE)
}

/// `|score| * 0.15`
pub fn expected_return(score: f64) -> f64 {
    score.abs() * MAX_EXPECTED_RETURN
}

/// Human-readable explanation for a signal. Never empty.
pub fn reasoning(token: &str, action: TradeAction, score: f64, risk_level: RiskLevel) -> String {
    match action {
        TradeAction::Buy if score > STRONG_THRESHOLD => format!(
            "Strong bullish signals detected for {token}. Technical indicators show upward momentum \
             with positive sentiment across social media and news channels. Risk level: {}.",
            risk_level.label()
        ),
        TradeAction::Buy => format!(
            "Moderate buy opportunity for {token}. Market conditions favorable with acceptable \
             risk levels. Recommend cautious position sizing."
        ),
        TradeAction::Sell => format!(
            "Bearish signals for {token}. Negative sentiment and technical weakness detected. \
             Recommend reducing exposure or taking profits."
        ),
        TradeAction::Hold => format!(
            "Market conditions for {token} are mixed. No clear directional signal. Recommend \
             maintaining current positions and waiting for clearer signals."
        ),
    }
}

/// Fused market read for one token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub token: String,
    pub timestamp: DateTime<Utc>,
    pub sentiment: SentimentReading,
    pub technical: TechnicalSnapshot,
    /// Latest quote, when the market-data provider answered
    pub market_data: Option<MarketData>,
    /// Mean of sentiment and technical scores, clamped to [-1, 1]
    pub overall_score: f64,
}

impl MarketAnalysis {
    pub fn reference_price(&self) -> Option<f64> {
        self.market_data
            .as_ref()
            .map(|quote| quote.price)
            .filter(|price| price.is_finite() && *price > 0.0)
    }
}

/// Generates [`TradingSignal`]s from sentiment, market data and the risk engine.
pub struct SignalGenerator {
    risk_engine: Arc<RiskEngine>,
    sentiment: Arc<dyn SentimentProvider>,
    market_data: Arc<dyn MarketDataProvider>,
    analyzer: TechnicalAnalyzer,
    timeout: Duration,
    lookback: usize,
}

impl SignalGenerator {
    pub fn new(
        risk_engine: Arc<RiskEngine>,
        sentiment: Arc<dyn SentimentProvider>,
        market_data: Arc<dyn MarketDataProvider>,
    ) -> Self {
        Self {
            risk_engine,
            sentiment,
            market_data,
            analyzer: TechnicalAnalyzer::default(),
            timeout: Duration::from_secs(10),
            lookback: 50,
        }
    }

    /// Upper bound on each collaborator call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Candles requested for technical analysis.
    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn with_analyzer(mut self, analyzer: TechnicalAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn risk_engine(&self) -> &Arc<RiskEngine> {
        &self.risk_engine
    }

    pub fn market_data(&self) -> &Arc<dyn MarketDataProvider> {
        &self.market_data
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Gather sentiment, quote and candles for `token` and fuse them.
    ///
    /// Collaborator failures are absorbed: sentiment falls back to neutral and
    /// missing market data leaves the technical score at 0 with no reference
    /// price.
    pub async fn analyze_market(&self, token: &str) -> Result<MarketAnalysis> {
        let token = normalize_token(token)?;

        let (sentiment, quote, candles) = tokio::join!(
            with_timeout(self.timeout, "sentiment provider", self.sentiment.get_sentiment(&token)),
            with_timeout(self.timeout, "market data", self.market_data.get_market_data(&token)),
            with_timeout(
                self.timeout,
                "ohlcv history",
                self.market_data.get_ohlcv(&token, self.lookback)
            ),
        );

        let sentiment = match sentiment {
            Ok(reading) if reading.overall.is_finite() => reading,
            Ok(reading) => {
                warn!("Non-finite sentiment for {} ({}), using neutral", token, reading.overall);
                SentimentReading::neutral()
            }
            Err(e) => {
                warn!("Sentiment unavailable for {}: {}, using neutral", token, e);
                SentimentReading::neutral()
            }
        };

        let quote = match quote {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!("Market data unavailable for {}: {}", token, e);
                None
            }
        };

        let candles = match candles {
            Ok(candles) => candles,
            Err(e) => {
                warn!("OHLCV unavailable for {}: {}", token, e);
                Vec::new()
            }
        };

        let technical = self
            .analyzer
            .analyze(&candles, quote.as_ref().map(|q| &q.order_book));

        let overall_score = ((sentiment.overall + technical.score) / 2.0).clamp(-1.0, 1.0);

        debug!(
            token = %token,
            sentiment = sentiment.overall,
            technical = technical.score,
            overall = overall_score,
            "Market analyzed"
        );

        Ok(MarketAnalysis {
            token,
            timestamp: Utc::now(),
            sentiment,
            technical,
            market_data: quote,
            overall_score,
        })
    }

    /// Classify a market score into a signal with an attached risk assessment.
    ///
    /// With a reference price the assessment also carries bracket prices.
    pub fn build_signal(
        &self,
        token: &str,
        strategy: StrategyType,
        market_score: f64,
        reference_price: Option<f64>,
    ) -> Result<TradingSignal> {
        let token = normalize_token(token)?;
        if !market_score.is_finite() || !(-1.0..=1.0).contains(&market_score) {
            return Err(AppError::InvalidInput(format!(
                "market score must be within [-1, 1], got {market_score}"
            )));
        }

        let (action, signal_strength) = classify(market_score);

        let mut assessment = self
            .risk_engine
            .assess_risk(&token, RISK_ASSESSMENT_AMOUNT, strategy)?;
        if let Some(price) = reference_price {
            let (stop_loss, take_profit) = self.risk_engine.bracket(price, strategy)?;
            assessment.stop_loss = stop_loss;
            assessment.take_profit = take_profit;
        }

        let signal = TradingSignal {
            timestamp: Utc::now(),
            reasoning: reasoning(&token, action, market_score, assessment.risk_level),
            token,
            action,
            confidence: confidence(market_score),
            signal_strength,
            expected_return: expected_return(market_score),
            risk_score: assessment.overall_risk_score,
            strategy,
            metadata: SignalMetadata {
                market_score,
                risk_assessment: Some(assessment),
                reference_price,
                ..Default::default()
            },
        };

        signal.validate(self.risk_engine.max_position_size())?;
        Ok(signal)
    }

    /// Analyze `token` and produce a signal for `strategy`.
    pub async fn generate_signal(&self, token: &str, strategy: StrategyType) -> Result<TradingSignal> {
        info!("Generating trading signal for {} using {}...", token, strategy);

        let analysis = self.analyze_market(token).await?;
        let mut signal = self.build_signal(
            &analysis.token,
            strategy,
            analysis.overall_score,
            analysis.reference_price(),
        )?;

        signal.metadata.extra.insert(
            "indicators".to_string(),
            serde_json::to_value(analysis.technical.indicator_map())?,
        );
        signal.metadata.extra.insert(
            "patterns".to_string(),
            serde_json::to_value(analysis.technical.patterns.to_map())?,
        );
        signal.metadata.sentiment = Some(analysis.sentiment);
        signal.metadata.technical = Some(analysis.technical);

        info!(
            "Signal generated: {} {} with {:.1}% confidence",
            signal.action, signal.token, signal.confidence
        );
        Ok(signal)
    }
}

/// Trim and upper-case a token symbol, rejecting empty input.
fn normalize_token(token: &str) -> Result<String> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::InvalidInput("token must not be empty".to_string()));
    }
    Ok(token.to_uppercase())
}

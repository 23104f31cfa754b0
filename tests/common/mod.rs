//! Scripted collaborators for agent tests.
//!
//! With a single candle per token the technical score reduces to the order
//! book imbalance, so a quote with only bids scores +1 and only asks -1.
//! The market score is then `(sentiment + imbalance) / 2`.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use neuraltrade::config::{Config, LoopConfig, RiskConfig};
use neuraltrade::error::{AppError, Result};
use neuraltrade::services::{
    ExecutionBackend, MarketDataProvider, RiskModel, SentimentProvider, TradingAgent,
};
use neuraltrade::types::{
    Candle, ExecutionReceipt, MarketData, OrderBookLevel, OrderBookSnapshot, SentimentReading,
    StrategyType, TradeAction, TradeStatus,
};

// =============================================================================
// Sentiment
// =============================================================================

#[derive(Default)]
pub struct ScriptedSentiment {
    scores: Mutex<HashMap<String, f64>>,
    failing: HashSet<String>,
    slow: HashSet<String>,
}

impl ScriptedSentiment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(self, token: &str, score: f64) -> Self {
        self.set_score(token, score);
        self
    }

    pub fn failing(mut self, token: &str) -> Self {
        self.failing.insert(token.to_string());
        self
    }

    pub fn slow(mut self, token: &str) -> Self {
        self.slow.insert(token.to_string());
        self
    }

    pub fn set_score(&self, token: &str, score: f64) {
        self.scores.lock().unwrap().insert(token.to_string(), score);
    }
}

impl SentimentProvider for ScriptedSentiment {
    fn get_sentiment<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<SentimentReading>> + Send + 'a>> {
        Box::pin(async move {
            if self.slow.contains(token) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.failing.contains(token) {
                return Err(AppError::Collaborator(format!("sentiment feed down for {token}")));
            }
            let overall = self.scores.lock().unwrap().get(token).copied().unwrap_or(0.0);
            Ok(SentimentReading {
                overall,
                social: overall,
                news: overall,
                on_chain: overall,
                timestamp: Utc::now(),
            })
        })
    }
}

// =============================================================================
// Market data
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Quote {
    pub price: f64,
    pub bid_qty: f64,
    pub ask_qty: f64,
}

impl Quote {
    /// Technical score +1.
    pub fn bullish(price: f64) -> Self {
        Self { price, bid_qty: 10.0, ask_qty: 0.0 }
    }

    /// Technical score -1.
    pub fn bearish(price: f64) -> Self {
        Self { price, bid_qty: 0.0, ask_qty: 10.0 }
    }

    /// Technical score 0.
    pub fn flat(price: f64) -> Self {
        Self { price, bid_qty: 0.0, ask_qty: 0.0 }
    }
}

#[derive(Default)]
pub struct ScriptedMarket {
    quotes: Mutex<HashMap<String, Quote>>,
    failing: HashSet<String>,
}

impl ScriptedMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(self, token: &str, quote: Quote) -> Self {
        self.set_quote(token, quote);
        self
    }

    pub fn failing(mut self, token: &str) -> Self {
        self.failing.insert(token.to_string());
        self
    }

    pub fn set_quote(&self, token: &str, quote: Quote) {
        self.quotes.lock().unwrap().insert(token.to_string(), quote);
    }

    pub fn set_price(&self, token: &str, price: f64) {
        if let Some(quote) = self.quotes.lock().unwrap().get_mut(token) {
            quote.price = price;
        }
    }

    fn quote(&self, token: &str) -> Result<Quote> {
        if self.failing.contains(token) {
            return Err(AppError::Collaborator(format!("market feed down for {token}")));
        }
        self.quotes
            .lock()
            .unwrap()
            .get(token)
            .copied()
            .ok_or_else(|| AppError::Collaborator(format!("no quote for {token}")))
    }
}

impl MarketDataProvider for ScriptedMarket {
    fn get_market_data<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<MarketData>> + Send + 'a>> {
        Box::pin(async move {
            let quote = self.quote(token)?;
            let mut order_book = OrderBookSnapshot::default();
            if quote.bid_qty > 0.0 {
                order_book.bids.push(OrderBookLevel {
                    price: quote.price * 0.999,
                    quantity: quote.bid_qty,
                });
            }
            if quote.ask_qty > 0.0 {
                order_book.asks.push(OrderBookLevel {
                    price: quote.price * 1.001,
                    quantity: quote.ask_qty,
                });
            }
            Ok(MarketData {
                symbol: token.to_string(),
                price: quote.price,
                volume_24h: 1.0e6,
                market_cap: 1.0e9,
                price_change_24h: 0.0,
                price_change_1h: 0.0,
                timestamp: Utc::now(),
                indicators: HashMap::new(),
                order_book,
            })
        })
    }

    fn get_ohlcv<'a>(
        &'a self,
        token: &'a str,
        _lookback: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Candle>>> + Send + 'a>> {
        Box::pin(async move {
            let quote = self.quote(token)?;
            Ok(vec![Candle {
                timestamp: Utc::now(),
                open: quote.price,
                high: quote.price,
                low: quote.price,
                close: quote.price,
                volume: 1_000.0,
            }])
        })
    }
}

// =============================================================================
// Execution
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorMode {
    Fill,
    Pending,
    Reject,
    Hang,
}

pub struct ScriptedExecutor {
    mode: Mutex<ExecutorMode>,
    orders: Mutex<Vec<(String, TradeAction, f64)>>,
}

impl ScriptedExecutor {
    pub fn new(mode: ExecutorMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            orders: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: ExecutorMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn orders(&self) -> Vec<(String, TradeAction, f64)> {
        self.orders.lock().unwrap().clone()
    }
}

impl ExecutionBackend for ScriptedExecutor {
    fn submit<'a>(
        &'a self,
        token: &'a str,
        action: TradeAction,
        amount: f64,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionReceipt>> + Send + 'a>> {
        Box::pin(async move {
            self.orders
                .lock()
                .unwrap()
                .push((token.to_string(), action, amount));
            let mode = *self.mode.lock().unwrap();
            let n = self.orders.lock().unwrap().len();
            match mode {
                ExecutorMode::Fill => Ok(ExecutionReceipt {
                    tx_ref: format!("0x{n:064x}"),
                    status: TradeStatus::Executed,
                }),
                ExecutorMode::Pending => Ok(ExecutionReceipt {
                    tx_ref: format!("0x{n:064x}"),
                    status: TradeStatus::Pending,
                }),
                ExecutorMode::Reject => Err(AppError::Execution("insufficient margin".to_string())),
                ExecutorMode::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(AppError::Execution("unreachable".to_string()))
                }
            }
        })
    }
}

// =============================================================================
// Risk model
// =============================================================================

/// Fixed score, failing for the listed tokens. Counts calls.
pub struct ScriptedRiskModel {
    score: f64,
    failing: HashSet<String>,
    fail_all: bool,
    calls: AtomicUsize,
}

impl ScriptedRiskModel {
    pub fn fixed(score: f64) -> Self {
        Self {
            score,
            failing: HashSet::new(),
            fail_all: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_for(mut self, token: &str) -> Self {
        self.failing.insert(token.to_string());
        self
    }

    pub fn always_failing() -> Self {
        Self {
            fail_all: true,
            ..Self::fixed(50.0)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RiskModel for ScriptedRiskModel {
    fn score(&self, token: &str, _amount: f64, _strategy: StrategyType) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all || self.failing.contains(token) {
            return Err(AppError::Collaborator(format!("risk model unavailable for {token}")));
        }
        Ok(self.score)
    }
}

// =============================================================================
// Wiring
// =============================================================================

pub const ACCOUNT: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

/// Fast loop settings over `tokens`.
pub fn fast_loop(tokens: &[&str]) -> LoopConfig {
    LoopConfig {
        token_universe: tokens.iter().map(|t| t.to_string()).collect(),
        poll_interval: Duration::from_millis(20),
        error_backoff: Duration::from_millis(20),
        ..Default::default()
    }
}

pub struct Harness {
    pub agent: Arc<TradingAgent>,
    pub sentiment: Arc<ScriptedSentiment>,
    pub market: Arc<ScriptedMarket>,
    pub executor: Arc<ScriptedExecutor>,
    pub risk_model: Arc<ScriptedRiskModel>,
}

pub fn harness(
    agent_config: LoopConfig,
    risk: RiskConfig,
    sentiment: ScriptedSentiment,
    market: ScriptedMarket,
    executor: ScriptedExecutor,
    risk_model: ScriptedRiskModel,
) -> Harness {
    let config = Config {
        risk,
        agent: agent_config,
        collaborator_timeout: Duration::from_millis(100),
        ohlcv_lookback: 10,
        account_address: Some(ACCOUNT.to_string()),
    };

    let sentiment = Arc::new(sentiment);
    let market = Arc::new(market);
    let executor = Arc::new(executor);
    let risk_model = Arc::new(risk_model);

    let agent = Arc::new(TradingAgent::from_config(
        &config,
        risk_model.clone(),
        sentiment.clone(),
        market.clone(),
        executor.clone(),
    ));

    Harness {
        agent,
        sentiment,
        market,
        executor,
        risk_model,
    }
}

/// Default wiring: fills every order, risk score 40.
pub fn default_harness(sentiment: ScriptedSentiment, market: ScriptedMarket) -> Harness {
    harness(
        fast_loop(&["INJ"]),
        RiskConfig::default(),
        sentiment,
        market,
        ScriptedExecutor::new(ExecutorMode::Fill),
        ScriptedRiskModel::fixed(40.0),
    )
}

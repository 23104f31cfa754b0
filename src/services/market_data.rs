//! Market-data provider seam.
//!
//! [`SimulatedMarketData`] keeps a per-token price book that takes one
//! random-walk step per quote, so repeated polls see prices move.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::types::{Candle, MarketData, OrderBookLevel, OrderBookSnapshot};

/// Source of quotes and OHLCV history.
pub trait MarketDataProvider: Send + Sync {
    /// Current market snapshot for `token`.
    fn get_market_data<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<MarketData>> + Send + 'a>>;

    /// The most recent `lookback` candles, oldest first.
    fn get_ohlcv<'a>(
        &'a self,
        token: &'a str,
        lookback: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Candle>>> + Send + 'a>>;
}

/// Starting prices for the simulated book.
const SEED_PRICES: &[(&str, f64)] = &[
    ("INJ", 25.0),
    ("ETH", 3_200.0),
    ("BTC", 65_000.0),
    ("USDT", 1.0),
];

/// Candle spacing for simulated history.
const CANDLE_MINUTES: i64 = 5;

/// Per-step volatility of the random walk (fraction of price).
const STEP_VOLATILITY: f64 = 0.01;

/// Random-walk market simulator.
pub struct SimulatedMarketData {
    prices: DashMap<String, f64>,
    rng: Mutex<StdRng>,
}

impl SimulatedMarketData {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let prices = DashMap::new();
        for (token, price) in SEED_PRICES {
            prices.insert((*token).to_string(), *price);
        }
        Self {
            prices,
            rng: Mutex::new(rng),
        }
    }

    /// Override (or add) a token's current price.
    pub fn set_price(&self, token: &str, price: f64) {
        self.prices.insert(token.to_uppercase(), price);
    }

    /// Current price without stepping the walk.
    pub fn price(&self, token: &str) -> Option<f64> {
        self.prices.get(&token.to_uppercase()).map(|p| *p)
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> Result<T> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| AppError::Internal("market rng lock poisoned".to_string()))?;
        Ok(f(&mut rng))
    }

    fn step(&self, token: &str) -> Result<f64> {
        let key = token.to_uppercase();
        let mut entry = self
            .prices
            .get_mut(&key)
            .ok_or_else(|| AppError::Collaborator(format!("no market for {token}")))?;
        let shock = self.with_rng(|rng| rng.gen_range(-STEP_VOLATILITY..=STEP_VOLATILITY))?;
        *entry = (*entry * (1.0 + shock)).max(f64::EPSILON);
        Ok(*entry)
    }

    fn order_book(&self, price: f64) -> Result<OrderBookSnapshot> {
        self.with_rng(|rng| {
            let level = |rng: &mut StdRng, offset: f64| OrderBookLevel {
                price: price * (1.0 + offset),
                quantity: rng.gen_range(1.0..100.0),
            };
            OrderBookSnapshot {
                bids: (1..=5).map(|i| level(rng, -0.001 * i as f64)).collect(),
                asks: (1..=5).map(|i| level(rng, 0.001 * i as f64)).collect(),
            }
        })
    }
}

impl Default for SimulatedMarketData {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataProvider for SimulatedMarketData {
    fn get_market_data<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<MarketData>> + Send + 'a>> {
        Box::pin(async move {
            let price = self.step(token)?;
            let (volume_24h, change_24h, change_1h) = self.with_rng(|rng| {
                (
                    rng.gen_range(1.0e5..1.0e7),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-2.0..2.0),
                )
            })?;

            Ok(MarketData {
                symbol: token.to_uppercase(),
                price,
                volume_24h,
                market_cap: price * volume_24h * 10.0,
                price_change_24h: change_24h,
                price_change_1h: change_1h,
                timestamp: Utc::now(),
                indicators: HashMap::new(),
                order_book: self.order_book(price)?,
            })
        })
    }

    fn get_ohlcv<'a>(
        &'a self,
        token: &'a str,
        lookback: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Candle>>> + Send + 'a>> {
        Box::pin(async move {
            let last_close = self
                .price(token)
                .ok_or_else(|| AppError::Collaborator(format!("no market for {token}")))?;

            // Walk backwards from the current price so the newest close matches the book
            let candles = self.with_rng(|rng| {
                let now = Utc::now();
                let mut closes = Vec::with_capacity(lookback);
                let mut close = last_close;
                for _ in 0..lookback {
                    closes.push(close);
                    close /= 1.0 + rng.gen_range(-STEP_VOLATILITY..=STEP_VOLATILITY);
                }
                closes.reverse();

                closes
                    .iter()
                    .enumerate()
                    .map(|(i, &close)| {
                        let open = if i == 0 { close } else { closes[i - 1] };
                        let wick = close * rng.gen_range(0.0..STEP_VOLATILITY);
                        let age = (lookback - 1 - i) as i64 * CANDLE_MINUTES;
                        Candle {
                            timestamp: now - Duration::minutes(age),
                            open,
                            high: open.max(close) + wick,
                            low: (open.min(close) - wick).max(0.0),
                            close,
                            volume: rng.gen_range(1.0e3..1.0e5),
                        }
                    })
                    .collect::<Vec<_>>()
            })?;

            debug!(token, candles = candles.len(), "Simulated OHLCV");
            Ok(candles)
        })
    }
}

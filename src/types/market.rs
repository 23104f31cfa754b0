use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single price level in an order book snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    /// Price at this level
    pub price: f64,
    /// Quantity available at this price
    pub quantity: f64,
}

/// Bid/ask snapshot for a token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    /// Bid levels, best first
    pub bids: Vec<OrderBookLevel>,
    /// Ask levels, best first
    pub asks: Vec<OrderBookLevel>,
}

impl OrderBookSnapshot {
    /// Order book imbalance over the top `depth` levels.
    ///
    /// Range: -1.0 (all asks) to +1.0 (all bids). `None` when both sides are empty.
    pub fn imbalance(&self, depth: usize) -> Option<f64> {
        let bid_volume: f64 = self.bids.iter().take(depth).map(|l| l.quantity).sum();
        let ask_volume: f64 = self.asks.iter().take(depth).map(|l| l.quantity).sum();
        let total = bid_volume + ask_volume;
        if total > 0.0 {
            Some((bid_volume - ask_volume) / total)
        } else {
            None
        }
    }

    /// Best bid price.
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    /// Best ask price.
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    /// Spread between best ask and best bid.
    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Market snapshot for a token, produced by the market-data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub symbol: String,
    pub price: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    /// Price change over 24h (percentage)
    pub price_change_24h: f64,
    /// Price change over 1h (percentage)
    pub price_change_1h: f64,
    pub timestamp: DateTime<Utc>,
    /// Indicator name -> latest value
    #[serde(default)]
    pub indicators: HashMap<String, f64>,
    #[serde(default)]
    pub order_book: OrderBookSnapshot,
}

/// OHLCV candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Absolute size of the candle body.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// High-low range of the candle.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Normalized sentiment reading returned by the sentiment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    /// Overall score in [-1, 1]
    pub overall: f64,
    pub social: f64,
    pub news: f64,
    pub on_chain: f64,
    pub timestamp: DateTime<Utc>,
}

impl SentimentReading {
    /// Neutral reading substituted when the provider fails.
    pub fn neutral() -> Self {
        Self {
            overall: 0.0,
            social: 0.0,
            news: 0.0,
            on_chain: 0.0,
            timestamp: Utc::now(),
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.overall == 0.0
    }
}

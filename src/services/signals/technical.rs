//! Technical analysis over a candle window.
//!
//! Runs the indicator library on closing prices and folds the latest values
//! into a single technical score in [-1, 1].

use tracing::debug;

use super::indicators::{detect_patterns, BollingerBands, Indicator, Macd, Rsi};
use crate::types::{Candle, OrderBookSnapshot, TechnicalSnapshot, Trend};

/// Order book levels considered for the imbalance factor.
pub const ORDER_BOOK_DEPTH: usize = 10;

/// Computes a [`TechnicalSnapshot`] from OHLCV candles.
pub struct TechnicalAnalyzer {
    rsi: Rsi,
    macd: Macd,
    bollinger: BollingerBands,
}

impl Default for TechnicalAnalyzer {
    fn default() -> Self {
        Self {
            rsi: Rsi::default(),
            macd: Macd::default(),
            bollinger: BollingerBands::default(),
        }
    }
}

impl TechnicalAnalyzer {
    pub fn new(rsi: Rsi, macd: Macd, bollinger: BollingerBands) -> Self {
        Self {
            rsi,
            macd,
            bollinger,
        }
    }

    /// Analyze a window of candles, oldest first.
    ///
    /// An empty window yields a neutral snapshot with score 0.
    pub fn analyze(&self, candles: &[Candle], order_book: Option<&OrderBookSnapshot>) -> TechnicalSnapshot {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let Some(&last_close) = closes.last() else {
            return TechnicalSnapshot::default();
        };

        let rsi = self.rsi.latest(&closes);
        let macd = self.macd.latest(&closes);
        let bollinger = self.bollinger.latest(&closes);
        let patterns = detect_patterns(candles);

        let support = candles.iter().map(|c| c.low).reduce(f64::min);
        let resistance = candles.iter().map(|c| c.high).reduce(f64::max);

        let trend = match bollinger {
            Some(bands) if last_close > bands.middle => Trend::Bullish,
            Some(bands) if last_close < bands.middle => Trend::Bearish,
            _ => Trend::Neutral,
        };

        let mut factors: Vec<f64> = Vec::with_capacity(5);

        // Oversold reads bullish, overbought bearish
        if let Some(rsi) = rsi {
            factors.push((50.0 - rsi) / 50.0);
        }

        if let Some(point) = macd {
            if point.histogram > 0.0 {
                factors.push(1.0);
            } else if point.histogram < 0.0 {
                factors.push(-1.0);
            }
        }

        if let Some(bands) = bollinger {
            factors.push((0.5 - bands.percent_b(last_close)) * 2.0);
        }

        if patterns.bullish_engulfing {
            factors.push(1.0);
        } else if patterns.bearish_engulfing {
            factors.push(-1.0);
        }

        if let Some(imbalance) = order_book.and_then(|book| book.imbalance(ORDER_BOOK_DEPTH)) {
            factors.push(imbalance);
        }

        let score = if factors.is_empty() {
            0.0
        } else {
            (factors.iter().sum::<f64>() / factors.len() as f64).clamp(-1.0, 1.0)
        };

        debug!(
            candles = candles.len(),
            factors = factors.len(),
            score,
            "Technical analysis complete"
        );

        TechnicalSnapshot {
            rsi,
            macd,
            bollinger,
            patterns,
            trend,
            support,
            resistance,
            score,
        }
    }
}

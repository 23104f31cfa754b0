//! MACD (Moving Average Convergence Divergence) indicator.

use super::{Ema, Indicator};
use crate::types::MacdPoint;

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(fast) - EMA(slow)
/// - Signal Line = EMA(signal) of MACD Line
/// - Histogram = MACD Line - Signal Line
///
/// All three series are full length and aligned to the input.
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }
}

impl Indicator for Macd {
    type Output = MacdPoint;

    fn id(&self) -> &str {
        "macd"
    }

    fn min_periods(&self) -> usize {
        1
    }

    fn calculate(&self, prices: &[f64]) -> Vec<Option<MacdPoint>> {
        let fast = Ema::new(self.fast_period).series(prices);
        let slow = Ema::new(self.slow_period).series(prices);

        let macd_line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal_line = Ema::new(self.signal_period).series(&macd_line);

        macd_line
            .iter()
            .zip(&signal_line)
            .map(|(&macd, &signal)| {
                Some(MacdPoint {
                    macd,
                    signal,
                    histogram: macd - signal,
                })
            })
            .collect()
    }
}

//! Simple Moving Average (SMA) indicator.

use super::{mean, Indicator};

/// SMA (Simple Moving Average) indicator.
///
/// Trailing mean over `period` samples. Defined from index `period - 1`.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn id(&self) -> &str {
        "sma"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; prices.len()];
        if self.period == 0 {
            return result;
        }

        for (i, window) in prices.windows(self.period).enumerate() {
            result[i + self.period - 1] = Some(mean(window));
        }
        result
    }
}

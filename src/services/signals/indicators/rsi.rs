//! Relative Strength Index (RSI) indicator.

use super::{mean, Indicator};

/// RSI value reported when the window has gains but no losses.
pub const RSI_NO_LOSS: f64 = 100.0;
/// RSI value reported for a flat window (no gains, no losses).
pub const RSI_FLAT: f64 = 50.0;

/// RSI (Relative Strength Index) indicator.
///
/// Simple rolling means of gains and loss magnitudes over the trailing
/// `period` price changes:
/// RSI = 100 - 100 / (1 + avg_gain / avg_loss)
///
/// Index `i` is defined once `period` changes are available (`i >= period`).
/// Division by a zero loss never happens: a window with gains but no losses
/// reports 100, a flat window reports 50.
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    fn from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            if avg_gain == 0.0 {
                RSI_FLAT
            } else {
                RSI_NO_LOSS
            }
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - (100.0 / (1.0 + rs))
        }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn id(&self) -> &str {
        "rsi"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; prices.len()];
        if self.period == 0 || prices.len() <= self.period {
            return result;
        }

        let (gains, losses): (Vec<f64>, Vec<f64>) = prices
            .windows(2)
            .map(|pair| {
                let change = pair[1] - pair[0];
                (change.max(0.0), (-change).max(0.0))
            })
            .unzip();

        // gains[j] is the change ending at price index j + 1
        for end in self.period..prices.len() {
            let window = (end - self.period)..end;
            let avg_gain = mean(&gains[window.clone()]);
            let avg_loss = mean(&losses[window]);
            result[end] = Some(Self::from_averages(avg_gain, avg_loss));
        }

        result
    }
}

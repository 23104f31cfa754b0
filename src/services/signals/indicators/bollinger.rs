//! Bollinger Bands indicator.

use super::{Indicator, Sma};
use crate::types::BandPoint;

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// StdDev is the sample standard deviation of the trailing window, so the
/// period must be at least 2; shorter periods yield no values.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier: std_dev_multiplier.abs(),
        }
    }

    /// Sample standard deviation.
    fn std_dev(values: &[f64], mean: f64) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let variance: f64 =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
        variance.sqrt()
    }
}

impl Indicator for BollingerBands {
    type Output = BandPoint;

    fn id(&self) -> &str {
        "bollinger"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, prices: &[f64]) -> Vec<Option<BandPoint>> {
        let mut result = vec![None; prices.len()];
        if self.period < 2 {
            return result;
        }

        let middles = Sma::new(self.period).calculate(prices);
        for (i, middle) in middles.into_iter().enumerate() {
            let Some(middle) = middle else { continue };
            let window = &prices[i + 1 - self.period..=i];
            let width = self.std_dev_multiplier * Self::std_dev(window, middle);
            result[i] = Some(BandPoint {
                upper: middle + width,
                middle,
                lower: middle - width,
            });
        }

        result
    }
}

//! Exponential Moving Average (EMA) indicator.

use super::Indicator;

/// EMA (Exponential Moving Average) indicator.
///
/// Smoothing factor `2 / (span + 1)`, seeded with the first sample (no warm-up
/// adjustment), so the series is defined at every index.
pub struct Ema {
    span: usize,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self { span }
    }

    /// Smoothing factor for this span.
    pub fn alpha(&self) -> f64 {
        2.0 / (self.span as f64 + 1.0)
    }

    /// Full EMA series without the `Option` wrapper.
    pub fn series(&self, values: &[f64]) -> Vec<f64> {
        let alpha = self.alpha();
        let mut ema = Vec::with_capacity(values.len());
        for &value in values {
            let next = match ema.last() {
                Some(&prev) => prev + alpha * (value - prev),
                None => value,
            };
            ema.push(next);
        }
        ema
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn id(&self) -> &str {
        "ema"
    }

    fn min_periods(&self) -> usize {
        1
    }

    fn calculate(&self, prices: &[f64]) -> Vec<Option<f64>> {
        self.series(prices).into_iter().map(Some).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::assert_approx;

    #[test]
    fn test_ema_seeded_with_first_value() {
        let ema = Ema::new(3).series(&[10.0, 20.0]);
        // alpha = 0.5
        assert_eq!(ema[0], 10.0);
        assert_approx(ema[1], 15.0, 1e-12);
    }

    #[test]
    fn test_ema_constant_series() {
        let ema = Ema::new(12).series(&[42.0; 30]);
        assert!(ema.iter().all(|&v| v == 42.0));
    }

    #[test]
    fn test_ema_empty() {
        assert!(Ema::new(9).calculate(&[]).is_empty());
        assert_eq!(Ema::new(9).latest(&[]), None);
    }

    #[test]
    fn test_ema_tracks_trend() {
        let prices: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let last = Ema::new(10).latest(&prices).unwrap();
        assert!(last < 149.0 && last > 140.0, "EMA lags an uptrend, got {last}");
    }
}

//! Technical indicator implementations.
//!
//! Every indicator produces a full-length series aligned to its input. Indices
//! without enough history hold `None` rather than zero.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod patterns;
pub mod rsi;
pub mod sma;

pub use bollinger::BollingerBands;
pub use ema::Ema;
pub use macd::Macd;
pub use patterns::detect_patterns;
pub use rsi::Rsi;
pub use sma::Sma;

/// Trait for series indicators over an ordered price sequence.
pub trait Indicator: Send + Sync {
    /// Value produced at each defined index.
    type Output: Copy;

    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Number of input samples needed before the first defined value.
    fn min_periods(&self) -> usize;

    /// Calculate the indicator for every index of `prices`.
    fn calculate(&self, prices: &[f64]) -> Vec<Option<Self::Output>>;

    /// Most recent value, if defined.
    fn latest(&self, prices: &[f64]) -> Option<Self::Output> {
        self.calculate(prices).last().copied().flatten()
    }
}

/// Arithmetic mean of a window.
pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

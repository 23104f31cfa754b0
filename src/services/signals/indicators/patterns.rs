//! Candlestick pattern detection over the two most recent candles.

use crate::types::{Candle, PatternFlags};

/// Body-to-range ratio below which a candle is a doji.
pub const DOJI_BODY_RATIO: f64 = 0.1;

/// Detect patterns on the last two candles.
///
/// Only engulfing and doji are detected; hammer, shooting star and the star
/// patterns always report false. Fewer than two candles yields no flags.
pub fn detect_patterns(candles: &[Candle]) -> PatternFlags {
    let mut flags = PatternFlags::default();

    let [prev, curr] = match candles {
        [.., prev, curr] => [prev, curr],
        _ => return flags,
    };

    flags.bullish_engulfing = prev.is_bearish()
        && curr.is_bullish()
        && curr.open < prev.close
        && curr.close > prev.open;

    flags.bearish_engulfing = prev.is_bullish()
        && curr.is_bearish()
        && curr.open > prev.close
        && curr.close < prev.open;

    let range = curr.range();
    flags.doji = range > 0.0 && curr.body() / range < DOJI_BODY_RATIO;

    flags
}

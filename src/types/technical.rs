use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One index of a MACD series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// One index of a Bollinger Bands series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BandPoint {
    /// %B: where `price` sits between the bands (0 = lower, 1 = upper).
    ///
    /// Collapsed bands report 0.5.
    pub fn percent_b(&self, price: f64) -> f64 {
        let width = self.upper - self.lower;
        if width > 0.0 {
            (price - self.lower) / width
        } else {
            0.5
        }
    }
}

/// Candlestick pattern flags. Only the engulfing pair and doji are detected;
/// the remaining flags are always false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFlags {
    pub bullish_engulfing: bool,
    pub bearish_engulfing: bool,
    pub doji: bool,
    pub hammer: bool,
    pub shooting_star: bool,
    pub morning_star: bool,
    pub evening_star: bool,
}

impl PatternFlags {
    /// Flags keyed by pattern name.
    pub fn to_map(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([
            ("bullish_engulfing", self.bullish_engulfing),
            ("bearish_engulfing", self.bearish_engulfing),
            ("doji", self.doji),
            ("hammer", self.hammer),
            ("shooting_star", self.shooting_star),
            ("morning_star", self.morning_star),
            ("evening_star", self.evening_star),
        ])
    }

    pub fn any(&self) -> bool {
        self.to_map().values().any(|&flag| flag)
    }
}

/// Coarse trend read from price relative to the Bollinger middle band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    #[default]
    Neutral,
    Bearish,
}

/// Technical read of a candle window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub rsi: Option<f64>,
    pub macd: Option<MacdPoint>,
    pub bollinger: Option<BandPoint>,
    pub patterns: PatternFlags,
    pub trend: Trend,
    /// Lowest low over the window
    pub support: Option<f64>,
    /// Highest high over the window
    pub resistance: Option<f64>,
    /// Technical score in [-1, 1]
    pub score: f64,
}

impl TechnicalSnapshot {
    /// Flatten into the `MarketData.indicators` naming.
    pub fn indicator_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        if let Some(rsi) = self.rsi {
            map.insert("rsi".to_string(), rsi);
        }
        if let Some(macd) = self.macd {
            map.insert("macd".to_string(), macd.macd);
            map.insert("macd_signal".to_string(), macd.signal);
            map.insert("macd_histogram".to_string(), macd.histogram);
        }
        if let Some(bands) = self.bollinger {
            map.insert("bb_upper".to_string(), bands.upper);
            map.insert("bb_middle".to_string(), bands.middle);
            map.insert("bb_lower".to_string(), bands.lower);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_b() {
        let bands = BandPoint {
            upper: 110.0,
            middle: 100.0,
            lower: 90.0,
        };
        assert_eq!(bands.percent_b(90.0), 0.0);
        assert_eq!(bands.percent_b(100.0), 0.5);
        assert_eq!(bands.percent_b(110.0), 1.0);
    }

    #[test]
    fn test_percent_b_collapsed_bands() {
        let bands = BandPoint {
            upper: 5.0,
            middle: 5.0,
            lower: 5.0,
        };
        assert_eq!(bands.percent_b(5.0), 0.5);
    }

    #[test]
    fn test_pattern_map_has_all_flags() {
        let flags = PatternFlags {
            doji: true,
            ..Default::default()
        };
        let map = flags.to_map();
        assert_eq!(map.len(), 7);
        assert_eq!(map["doji"], true);
        assert_eq!(map["hammer"], false);
        assert!(flags.any());
        assert!(!PatternFlags::default().any());
    }

    #[test]
    fn test_indicator_map_skips_missing() {
        let snapshot = TechnicalSnapshot {
            rsi: Some(55.0),
            ..Default::default()
        };
        let map = snapshot.indicator_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["rsi"], 55.0);
    }
}

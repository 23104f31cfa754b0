//! Indicator library and technical analysis tests.
//!
//! Run with: cargo test --test signals_test

use chrono::{Duration, TimeZone, Utc};
use neuraltrade::services::signals::indicators::{
    detect_patterns, BollingerBands, Ema, Indicator, Macd, Rsi, Sma,
};
use neuraltrade::services::TechnicalAnalyzer;
use neuraltrade::types::{Candle, OrderBookLevel, OrderBookSnapshot, Trend};

/// Deterministic oscillating series around 100.
fn wave(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 100.0 + 5.0 * (i as f64 * 0.7).sin() + 0.1 * i as f64)
        .collect()
}

fn candles(closes: &[f64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: start + Duration::hours(i as i64),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume: 500.0,
            }
        })
        .collect()
}

// =============================================================================
// Indicators
// =============================================================================

#[test]
fn test_series_are_aligned_to_input() {
    let prices = wave(60);
    assert_eq!(Sma::new(20).calculate(&prices).len(), 60);
    assert_eq!(Ema::new(12).calculate(&prices).len(), 60);
    assert_eq!(Rsi::default().calculate(&prices).len(), 60);
    assert_eq!(Macd::default().calculate(&prices).len(), 60);
    assert_eq!(BollingerBands::default().calculate(&prices).len(), 60);
}

#[test]
fn test_rsi_bounded_and_defined_after_period() {
    let prices = wave(80);
    let rsi = Rsi::default().calculate(&prices);

    assert!(rsi[..14].iter().all(Option::is_none));
    for value in rsi[14..].iter() {
        let value = value.expect("defined after 14 changes");
        assert!((0.0..=100.0).contains(&value));
    }
}

#[test]
fn test_rsi_extremes() {
    let rising: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
    assert_eq!(Rsi::default().latest(&rising), Some(100.0));

    let falling: Vec<f64> = rising.iter().rev().copied().collect();
    assert_eq!(Rsi::default().latest(&falling), Some(0.0));

    let flat = vec![42.0; 30];
    assert_eq!(Rsi::default().latest(&flat), Some(50.0));
}

#[test]
fn test_macd_flat_series_is_zero() {
    let flat = vec![25.0; 50];
    for point in Macd::default().calculate(&flat).into_iter().flatten() {
        assert!(point.macd.abs() < 1e-9);
        assert!(point.signal.abs() < 1e-9);
        assert!(point.histogram.abs() < 1e-9);
    }
}

#[test]
fn test_macd_positive_in_uptrend() {
    let rising: Vec<f64> = (0..60).map(|i| 100.0 + 2.0 * i as f64).collect();
    let point = Macd::default().latest(&rising).unwrap();
    assert!(point.macd > 0.0);
    assert!((point.histogram - (point.macd - point.signal)).abs() < 1e-9);
}

#[test]
fn test_bollinger_ordering_and_middle_is_sma() {
    let prices = wave(60);
    let bands = BollingerBands::default().calculate(&prices);
    let sma = Sma::new(20).calculate(&prices);

    assert!(bands[..19].iter().all(Option::is_none));
    for (band, mean) in bands.iter().zip(&sma).skip(19) {
        let band = band.unwrap();
        assert!(band.lower <= band.middle && band.middle <= band.upper);
        assert!((band.middle - mean.unwrap()).abs() < 1e-9);
    }
}

#[test]
fn test_ema_of_constant_is_constant() {
    let flat = vec![3.5; 40];
    for value in Ema::new(9).calculate(&flat).into_iter().flatten() {
        assert!((value - 3.5).abs() < 1e-12);
    }
}

#[test]
fn test_engulfing_detection() {
    let mut window = candles(&[101.0, 100.0, 99.0]);
    window[2].open = 99.5;
    window[2].close = 101.5;
    window[2].high = 102.0;
    let flags = detect_patterns(&window);
    assert!(flags.bullish_engulfing);
    assert!(!flags.bearish_engulfing);

    assert!(!detect_patterns(&window[..1]).any());
}

// =============================================================================
// Technical analysis
// =============================================================================

#[test]
fn test_analyzer_empty_window_is_neutral() {
    let snapshot = TechnicalAnalyzer::default().analyze(&[], None);
    assert_eq!(snapshot.score, 0.0);
    assert_eq!(snapshot.trend, Trend::Neutral);
    assert_eq!(snapshot.rsi, None);
    assert_eq!(snapshot.support, None);
}

#[test]
fn test_analyzer_score_in_range() {
    let analyzer = TechnicalAnalyzer::default();
    for len in [2, 10, 25, 50, 120] {
        let window = candles(&wave(len));
        let snapshot = analyzer.analyze(&window, None);
        assert!((-1.0..=1.0).contains(&snapshot.score), "len {len}: {}", snapshot.score);
        assert!(snapshot.support.unwrap() <= snapshot.resistance.unwrap());
    }
}

#[test]
fn test_analyzer_overbought_uptrend_leans_bearish() {
    let rising: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
    let snapshot = TechnicalAnalyzer::default().analyze(&candles(&rising), None);

    assert_eq!(snapshot.rsi, Some(100.0));
    assert_eq!(snapshot.trend, Trend::Bullish);
    // RSI and %B lean bearish, MACD leans bullish
    assert!(snapshot.score < 0.0);
}

#[test]
fn test_analyzer_order_book_imbalance() {
    let book = OrderBookSnapshot {
        bids: vec![OrderBookLevel { price: 99.0, quantity: 30.0 }],
        asks: vec![OrderBookLevel { price: 101.0, quantity: 10.0 }],
    };
    let window = candles(&[100.0]);
    let snapshot = TechnicalAnalyzer::default().analyze(&window, Some(&book));
    // (30 - 10) / 40
    assert!((snapshot.score - 0.5).abs() < 1e-9);
}

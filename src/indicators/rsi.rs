// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Sum gains and losses (as positive magnitudes) over the first
//          `period` close-to-close deltas and divide by `period`.
// Step 2 — Emit the first RSI at bar index `period`.
// Step 3 — For every later bar apply Wilder's smoothing:
//            avg_gain = (avg_gain * (period - 1) + gain) / period
//            avg_loss = (avg_loss * (period - 1) + loss) / period
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Thresholds:  RSI >= 70 => OVERBOUGHT,  RSI <= 30 => OVERSOLD.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::{Bar, Point};

pub const DEFAULT_PERIOD: usize = 14;
pub const OVERBOUGHT: f64 = 70.0;
pub const OVERSOLD: f64 = 30.0;

/// Compute the full RSI series over the closes of `bars`.
///
/// The output has `bars.len() - period` points, the first stamped with
/// `bars[period].time`.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `bars.len() < period + 1` => empty vec (need at least `period` deltas)
/// - Average loss of zero saturates RSI at 100.0 (a flat market included).
pub fn calculate_rsi(bars: &[Bar], period: usize) -> Vec<Point> {
    if period == 0 || bars.len() <= period {
        return Vec::new();
    }

    let period_f = period as f64;

    // --- Seed averages over the first `period` deltas ------------------------
    let (sum_gain, sum_loss) = bars[..=period]
        .windows(2)
        .map(|w| w[1].close - w[0].close)
        .fold((0.0_f64, 0.0_f64), |(g, l), d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l + d.abs())
            }
        });

    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    let mut result = Vec::with_capacity(bars.len() - period);
    result.push(Point::new(bars[period].time, rsi_from_averages(avg_gain, avg_loss)));

    // --- Wilder's smoothing for subsequent bars ------------------------------
    for w in bars[period..].windows(2) {
        let delta = w[1].close - w[0].close;
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { delta.abs() } else { 0.0 };

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        result.push(Point::new(w[1].time, rsi_from_averages(avg_gain, avg_loss)));
    }

    result
}

/// Overbought / oversold classification of a single RSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn of(value: f64) -> Self {
        if value >= OVERBOUGHT {
            Self::Overbought
        } else if value <= OVERSOLD {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for RsiZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "OVERBOUGHT"),
            Self::Oversold => write!(f, "OVERSOLD"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Return the most recent RSI value together with its zone.
///
/// Returns `None` while the sequence is still inside the warm-up window.
pub fn current_rsi(bars: &[Bar], period: usize) -> Option<(f64, RsiZone)> {
    let series = calculate_rsi(bars, period);
    let value = series.last()?.value;
    Some((value, RsiZone::of(value)))
}

/// Shading bands for an RSI series: `(overbought, oversold)`.
///
/// Points strictly above 70 are mapped onto the 70 line, points strictly
/// below 30 onto the 30 line; everything else is left out.
pub fn zone_bands(series: &[Point]) -> (Vec<Point>, Vec<Point>) {
    let overbought = series
        .iter()
        .filter(|p| p.value > OVERBOUGHT)
        .map(|p| Point::new(p.time, OVERBOUGHT))
        .collect();
    let oversold = series
        .iter()
        .filter(|p| p.value < OVERSOLD)
        .map(|p| Point::new(p.time, OVERSOLD))
        .collect();
    (overbought, oversold)
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // RS is infinite: 100 - 100 / (1 + inf) == 100.
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(1_000 + i as i64 * 60, c, c + 1.0, c - 1.0, c))
            .collect()
    }

    fn ascending(n: usize) -> Vec<Bar> {
        bars_from_closes(&(0..n).map(|i| 10.0 + i as f64).collect::<Vec<_>>())
    }

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_period_zero() {
        assert!(calculate_rsi(&ascending(5), 0).is_empty());
    }

    #[test]
    fn rsi_huge_period_is_empty() {
        assert!(calculate_rsi(&ascending(5), usize::MAX).is_empty());
        assert!(current_rsi(&ascending(5), usize::MAX).is_none());
    }

    #[test]
    fn rsi_warm_up_boundary() {
        for n in 0..=14 {
            assert!(calculate_rsi(&ascending(n), 14).is_empty(), "n = {n}");
        }
        for n in 15..40 {
            let series = calculate_rsi(&ascending(n), 14);
            assert_eq!(series.len(), n - 14, "n = {n}");
        }
    }

    #[test]
    fn rsi_first_point_time() {
        let bars = ascending(20);
        let series = calculate_rsi(&bars, 14);
        assert_eq!(series[0].time, bars[14].time);
        assert_eq!(series.last().unwrap().time, bars[19].time);
    }

    #[test]
    fn rsi_all_gains_saturates() {
        // 10, 11, ..., 24 => no losses at all.
        let series = calculate_rsi(&ascending(15), 14);
        assert_eq!(series.len(), 1);
        for p in &series {
            assert_eq!(p.value, 100.0);
        }
        let series = calculate_rsi(&ascending(40), 14);
        assert!(series.iter().all(|p| p.value == 100.0));
    }

    #[test]
    fn rsi_all_losses() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let series = calculate_rsi(&bars_from_closes(&closes), 14);
        assert!(!series.is_empty());
        for p in &series {
            assert!(p.value.abs() < 1e-10, "expected 0.0, got {}", p.value);
        }
    }

    #[test]
    fn rsi_flat_market_is_finite() {
        let series = calculate_rsi(&bars_from_closes(&[100.0; 30]), 14);
        assert_eq!(series.len(), 16);
        assert!(series.iter().all(|p| p.value == 100.0));
    }

    #[test]
    fn rsi_reference_values() {
        // Classic Wilder example closes.
        let closes = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        let series = calculate_rsi(&bars_from_closes(&closes), 14);
        assert_eq!(series.len(), 6);
        assert!((series[0].value - 70.46).abs() < 0.01, "got {}", series[0].value);
        assert!((series[1].value - 66.25).abs() < 0.01, "got {}", series[1].value);
        for p in &series {
            assert!((0.0..=100.0).contains(&p.value));
        }
    }

    #[test]
    fn rsi_is_deterministic() {
        let closes: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let bars = bars_from_closes(&closes);
        assert_eq!(calculate_rsi(&bars, 14), calculate_rsi(&bars, 14));
    }

    #[test]
    fn current_rsi_zones() {
        let (val, zone) = current_rsi(&ascending(30), 14).unwrap();
        assert_eq!(val, 100.0);
        assert_eq!(zone, RsiZone::Overbought);

        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let (_, zone) = current_rsi(&bars_from_closes(&closes), 14).unwrap();
        assert_eq!(zone, RsiZone::Oversold);

        assert_eq!(RsiZone::of(50.0), RsiZone::Neutral);
        assert!(current_rsi(&[], 14).is_none());
    }

    #[test]
    fn zone_bands_clamp_to_levels() {
        let series = vec![
            Point::new(1, 75.0),
            Point::new(2, 70.0),
            Point::new(3, 50.0),
            Point::new(4, 20.0),
        ];
        let (ob, os) = zone_bands(&series);
        assert_eq!(ob, vec![Point::new(1, 70.0)]);
        assert_eq!(os, vec![Point::new(4, 30.0)]);
    }
}

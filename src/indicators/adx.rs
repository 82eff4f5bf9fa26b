// =============================================================================
// Average Directional Index (ADX)
// =============================================================================
//
// ADX quantifies trend **strength** regardless of direction.
//
// Calculation pipeline:
//   1. Compute +DM, -DM and True Range (TR) for each consecutive bar pair.
//   2. Seed smoothed TR / +DM / -DM with the SUM of the first `period` values.
//   3. For every later sample apply Wilder's smoothing:
//        smoothed = smoothed - smoothed / period + raw
//      and derive
//        +DI = 100 * smoothed(+DM) / smoothed(TR)
//        -DI = 100 * smoothed(-DM) / smoothed(TR)
//        DX  = 100 * |+DI - -DI| / (+DI + -DI)
//   4. Seed ADX with the SMA of the first `period` DX values, then
//        ADX = (ADX * (period - 1) + DX) / period
//
// Timestamps: DX[i] belongs to bars[period + 1 + i].  The ADX seed therefore
// lands on bars[2 * period] and each later point on bars[period + i + 1].
//
// Crosses: ADX crossing the 25 trend level.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::crosses::level_crosses;
use crate::types::{Bar, CrossEvent, Point};

pub const DEFAULT_PERIOD: usize = 14;
/// ADX level separating trending from ranging markets.
pub const TREND_LEVEL: f64 = 25.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdxBundle {
    pub adx: Vec<Point>,
    pub crosses: Vec<CrossEvent>,
    /// +DI series, one point per DX sample.
    #[serde(default)]
    pub plus_di: Vec<Point>,
    /// -DI series, one point per DX sample.
    #[serde(default)]
    pub minus_di: Vec<Point>,
}

impl AdxBundle {
    pub fn is_empty(&self) -> bool {
        self.adx.is_empty()
    }
}

/// Compute the ADX series, the DI lines and the 25-level crosses.
///
/// Returns an empty bundle when:
/// - `period` is zero.
/// - There are fewer than `period + 1` bars.
/// - Fewer than `period` DX samples exist, i.e. fewer than `2 * period + 1`
///   bars in total.
pub fn calculate_adx(bars: &[Bar], period: usize) -> AdxBundle {
    if period == 0 || bars.len() <= period {
        return AdxBundle::default();
    }

    let period_f = period as f64;

    // ------------------------------------------------------------------
    // Step 1: Raw +DM, -DM, and True Range for each consecutive pair
    // ------------------------------------------------------------------
    let sample_count = bars.len() - 1;
    let mut plus_dm = Vec::with_capacity(sample_count);
    let mut minus_dm = Vec::with_capacity(sample_count);
    let mut tr_vals = Vec::with_capacity(sample_count);

    for w in bars.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);

        let tr = (cur.high - cur.low)
            .max((cur.high - prev.close).abs())
            .max((cur.low - prev.close).abs());

        let up_move = cur.high - prev.high;
        let down_move = prev.low - cur.low;

        let pdm = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let mdm = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };

        plus_dm.push(pdm);
        minus_dm.push(mdm);
        tr_vals.push(tr);
    }

    if tr_vals.len() < period {
        return AdxBundle::default();
    }

    // ------------------------------------------------------------------
    // Steps 2 & 3: seed sums, then Wilder-smooth and derive DI / DX
    // ------------------------------------------------------------------
    let mut smooth_tr: f64 = tr_vals[..period].iter().sum();
    let mut smooth_plus_dm: f64 = plus_dm[..period].iter().sum();
    let mut smooth_minus_dm: f64 = minus_dm[..period].iter().sum();

    let dx_len = sample_count - period;
    let mut dx_values = Vec::with_capacity(dx_len);
    let mut plus_di = Vec::with_capacity(dx_len);
    let mut minus_di = Vec::with_capacity(dx_len);

    for i in period..sample_count {
        smooth_tr = smooth_tr - smooth_tr / period_f + tr_vals[i];
        smooth_plus_dm = smooth_plus_dm - smooth_plus_dm / period_f + plus_dm[i];
        smooth_minus_dm = smooth_minus_dm - smooth_minus_dm / period_f + minus_dm[i];

        let (pdi, mdi) = directional_indicators(smooth_plus_dm, smooth_minus_dm, smooth_tr);
        let time = bars[i + 1].time;
        plus_di.push(Point::new(time, pdi));
        minus_di.push(Point::new(time, mdi));
        dx_values.push(compute_dx(pdi, mdi));
    }

    if dx_values.len() < period {
        return AdxBundle::default();
    }

    // ------------------------------------------------------------------
    // Step 4: ADX = Wilder's smoothed average of DX
    // ------------------------------------------------------------------
    let mut adx = dx_values[..period].iter().sum::<f64>() / period_f;
    let mut series = Vec::with_capacity(dx_values.len() - period + 1);
    series.push(Point::new(bars[period * 2].time, adx));

    for (i, &dx) in dx_values.iter().enumerate().skip(period) {
        adx = (adx * (period_f - 1.0) + dx) / period_f;
        series.push(Point::new(bars[period + i + 1].time, adx));
    }

    let crosses = level_crosses(&series, TREND_LEVEL);

    AdxBundle {
        adx: series,
        crosses,
        plus_di,
        minus_di,
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// +DI / -DI from smoothed values; both zero when the smoothed TR is zero.
fn directional_indicators(smooth_plus_dm: f64, smooth_minus_dm: f64, smooth_tr: f64) -> (f64, f64) {
    if smooth_tr > 0.0 {
        (
            smooth_plus_dm / smooth_tr * 100.0,
            smooth_minus_dm / smooth_tr * 100.0,
        )
    } else {
        (0.0, 0.0)
    }
}

/// DX from the two DI values; zero when there is no directional movement.
fn compute_dx(plus_di: f64, minus_di: f64) -> f64 {
    let di_sum = plus_di + minus_di;
    if di_sum > 0.0 {
        (plus_di - minus_di).abs() / di_sum * 100.0
    } else {
        0.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CrossDirection;

    fn candle(time: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(time, open, high, low, close)
    }

    fn uptrend(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                candle(i as i64 * 60, base, base + 1.5, base - 0.5, base + 1.0)
            })
            .collect()
    }

    #[test]
    fn adx_period_zero() {
        assert!(calculate_adx(&uptrend(50), 0).is_empty());
    }

    #[test]
    fn adx_insufficient_data() {
        assert!(calculate_adx(&uptrend(10), 14).is_empty());
        assert!(calculate_adx(&uptrend(15), 14).is_empty());
    }

    #[test]
    fn adx_huge_period_is_empty() {
        assert!(calculate_adx(&uptrend(5), usize::MAX).is_empty());
        assert!(calculate_adx(&uptrend(5), usize::MAX).crosses.is_empty());
    }

    #[test]
    fn adx_minimum_bars_exact() {
        let period = 5;
        let min = 2 * period + 1;
        let bars = uptrend(min);
        let bundle = calculate_adx(&bars, period);
        assert_eq!(bundle.adx.len(), 1);
        assert_eq!(bundle.adx[0].time, bars[2 * period].time);

        assert!(calculate_adx(&bars[..min - 1], period).is_empty());
    }

    #[test]
    fn adx_timestamps_pinned() {
        let bars: Vec<Bar> = (0..10)
            .map(|i| {
                let base = 10.0 + i as f64;
                candle(i * 100, base, base + 1.0, base - 1.0, base + 0.5)
            })
            .collect();
        let bundle = calculate_adx(&bars, 3);
        let times: Vec<i64> = bundle.adx.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![600, 700, 800, 900]);
        assert!(bundle.adx.iter().all(|p| (p.value - 100.0).abs() < 1e-10));

        // DI lines cover every DX sample, starting at bars[period + 1].
        assert_eq!(bundle.plus_di.len(), 6);
        assert_eq!(bundle.plus_di[0].time, 400);
        assert_eq!(bundle.minus_di.last().unwrap().time, 900);
    }

    #[test]
    fn adx_reference_values() {
        let highs = [
            10.0, 10.6, 10.4, 11.2, 11.0, 11.8, 11.5, 12.3, 11.9, 12.6, 12.1, 11.7, 12.4, 12.9, 12.2,
            11.8,
        ];
        let lows = [
            9.0, 9.7, 9.5, 10.1, 10.2, 10.8, 10.6, 11.2, 11.0, 11.5, 11.2, 10.8, 11.3, 11.9, 11.4,
            10.9,
        ];
        let closes = [
            9.5, 10.3, 9.9, 10.9, 10.6, 11.5, 11.0, 12.0, 11.4, 12.2, 11.5, 11.0, 12.1, 12.5, 11.7,
            11.2,
        ];
        let bars: Vec<Bar> = (0..16)
            .map(|i| {
                let open = (highs[i] + lows[i]) / 2.0;
                candle(1_700_000_000 + i as i64 * 300, open, highs[i], lows[i], closes[i])
            })
            .collect();

        let bundle = calculate_adx(&bars, 5);
        let expected = [
            (1_700_003_000, 64.99246866681717),
            (1_700_003_300, 56.441195998750615),
            (1_700_003_600, 54.00747458301596),
            (1_700_003_900, 54.311048464862495),
            (1_700_004_200, 48.285085110584944),
            (1_700_004_500, 38.78956293343854),
        ];
        assert_eq!(bundle.adx.len(), expected.len());
        for (p, (t, v)) in bundle.adx.iter().zip(expected) {
            assert_eq!(p.time, t);
            assert!((p.value - v).abs() < 1e-9, "got {}, expected {v}", p.value);
        }
        assert!(bundle.crosses.is_empty());
    }

    #[test]
    fn adx_flat_market() {
        let bars: Vec<Bar> = (0..60)
            .map(|i| candle(i * 60, 100.0, 101.0, 99.0, 100.0))
            .collect();
        let bundle = calculate_adx(&bars, 14);
        assert_eq!(bundle.adx.len(), 60 - 28);
        assert!(bundle.adx.iter().all(|p| p.value == 0.0));
        assert!(bundle.crosses.is_empty());
    }

    #[test]
    fn adx_zero_range_market_is_finite() {
        let bars: Vec<Bar> = (0..40).map(|i| candle(i * 60, 5.0, 5.0, 5.0, 5.0)).collect();
        let bundle = calculate_adx(&bars, 14);
        assert!(!bundle.is_empty());
        assert!(bundle.adx.iter().all(|p| p.value == 0.0));
        assert!(bundle.plus_di.iter().all(|p| p.value == 0.0));
    }

    #[test]
    fn adx_crosses_trend_level_once() {
        // 30 flat bars followed by a steady climb.
        let mut bars: Vec<Bar> = (0..30)
            .map(|i| candle(i * 60, 100.0, 101.0, 99.0, 100.0))
            .collect();
        bars.extend((0..40).map(|i| {
            let base = 100.0 + 2.0 * i as f64;
            candle((30 + i) * 60, base, base + 1.5, base - 0.5, base + 1.0)
        }));

        let bundle = calculate_adx(&bars, 14);
        assert_eq!(bundle.adx.len(), 70 - 28);
        assert_eq!(bundle.crosses.len(), 1);
        assert_eq!(bundle.crosses[0].direction, CrossDirection::Up);
        assert_eq!(bundle.crosses[0].time, bars[33].time);
        assert_eq!(bundle.crosses[0].kind, None);
    }

    #[test]
    fn adx_result_range() {
        let bars: Vec<Bar> = (0..200)
            .map(|i| {
                let base = 50.0 + (i as f64 * 0.3).sin() * 10.0;
                candle(i * 60, base - 0.5, base + 1.0, base - 1.0, base + 0.5)
            })
            .collect();
        let bundle = calculate_adx(&bars, 14);
        assert!(!bundle.is_empty());
        for p in &bundle.adx {
            assert!((0.0..=100.0).contains(&p.value), "ADX {} out of range", p.value);
        }
    }
}

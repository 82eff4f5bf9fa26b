// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = value_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The very first EMA value is seeded with the SMA of the first `period` values
// and stamped with the time of the `period`-th input.
// =============================================================================

use crate::types::{Bar, Point};

/// Compute the EMA series over a timestamped `series` for look-back `period`.
///
/// Returns an empty `Vec` when the input is too short or the period is zero.
/// Otherwise the output holds `series.len() - period + 1` points, the first
/// one at `series[period - 1].time`.
pub fn calculate_ema(series: &[Point], period: usize) -> Vec<Point> {
    if period == 0 || series.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period + 1) as f64;

    // Seed: SMA of the first `period` values.
    let mut ema = series[..period].iter().map(|p| p.value).sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(series.len() - period + 1);
    result.push(Point::new(series[period - 1].time, ema));

    for point in &series[period..] {
        ema = point.value * multiplier + ema * (1.0 - multiplier);
        result.push(Point::new(point.time, ema));
    }

    result
}

/// EMA over the close prices of `bars`.
pub fn ema_of_closes(bars: &[Bar], period: usize) -> Vec<Point> {
    calculate_ema(&closes(bars), period)
}

/// Close prices of `bars` as a timestamped series.
pub(crate) fn closes(bars: &[Bar]) -> Vec<Point> {
    bars.iter().map(|b| Point::new(b.time, b.close)).collect()
}

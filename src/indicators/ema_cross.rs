// =============================================================================
// EMA Crossover (9 / 21)
// =============================================================================
//
// Two EMAs over the closes, aligned to the shorter one by taking each tail,
// then walked pairwise:
//   bullish (up)   : prev_fast <= prev_slow  and  curr_fast > curr_slow
//   bearish (down) : prev_fast >= prev_slow  and  curr_fast < curr_slow
//
// Each cross can be enriched into a `CrossoverSignal` carrying a 0..100
// "power" score built from the EMA spread and the bar volume.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::crosses::line_crosses;
use super::ema::ema_of_closes;
use crate::types::{Bar, CrossEvent, Point, Sentiment};

pub const FAST_PERIOD: usize = 9;
pub const SLOW_PERIOD: usize = 21;
/// Volume assumed for bars that carry none.
pub const DEFAULT_VOLUME: f64 = 1_000_000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmaCrossBundle {
    pub fast: Vec<Point>,
    pub slow: Vec<Point>,
    pub crosses: Vec<CrossEvent>,
}

impl EmaCrossBundle {
    pub fn is_empty(&self) -> bool {
        self.fast.is_empty()
    }

    /// Align two EMA series on their common tail and detect crosses.
    pub fn from_series(fast: Vec<Point>, slow: Vec<Point>) -> Self {
        if fast.is_empty() || slow.is_empty() {
            return Self::default();
        }
        let len = fast.len().min(slow.len());
        let fast = fast[fast.len() - len..].to_vec();
        let slow = slow[slow.len() - len..].to_vec();
        let crosses = line_crosses(&fast, &slow);
        Self {
            fast,
            slow,
            crosses,
        }
    }
}

/// The fixed 9 / 21 crossover over the closes of `bars`.
pub fn ema_cross(bars: &[Bar]) -> EmaCrossBundle {
    ema_cross_with(bars, FAST_PERIOD, SLOW_PERIOD)
}

/// Crossover of arbitrary `fast` / `slow` EMA periods.
///
/// Empty when either EMA is empty.
pub fn ema_cross_with(bars: &[Bar], fast: usize, slow: usize) -> EmaCrossBundle {
    EmaCrossBundle::from_series(ema_of_closes(bars, fast), ema_of_closes(bars, slow))
}

/// A crossover enriched with the EMA values, bar close and a power score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverSignal {
    pub time: i64,
    #[serde(rename = "type")]
    pub kind: Sentiment,
    pub fast_ema: f64,
    pub slow_ema: f64,
    pub price: f64,
    pub power: f64,
}

/// Strength of a crossover on a 0..100 scale.
///
/// `distance_pct * min(volume / 1e6, 2) * 10`, capped at 100; zero when
/// either EMA is zero.
pub fn signal_power(fast_ema: f64, slow_ema: f64, volume: f64) -> f64 {
    if fast_ema == 0.0 || slow_ema == 0.0 {
        return 0.0;
    }
    let distance_pct = (fast_ema - slow_ema).abs() / slow_ema * 100.0;
    let volume_factor = (volume / 1_000_000.0).min(2.0);
    (distance_pct * volume_factor * 10.0).min(100.0)
}

/// Enrich every cross of `bundle` with EMA values, bar close and power.
///
/// `bars` must be the sequence the bundle was computed from; crosses whose
/// time has no matching bar are skipped.  Bars without volume use
/// `volume_fallback`.
pub fn crossover_signals(
    bars: &[Bar],
    bundle: &EmaCrossBundle,
    volume_fallback: f64,
) -> Vec<CrossoverSignal> {
    bundle
        .crosses
        .iter()
        .filter_map(|cross| {
            let idx = bundle.fast.binary_search_by_key(&cross.time, |p| p.time).ok()?;
            let bar = bars
                .binary_search_by_key(&cross.time, |b| b.time)
                .ok()
                .map(|i| &bars[i])?;
            let fast_ema = bundle.fast[idx].value;
            let slow_ema = bundle.slow[idx].value;
            let volume = bar.volume.unwrap_or(volume_fallback);
            Some(CrossoverSignal {
                time: cross.time,
                kind: cross.direction.sentiment(),
                fast_ema,
                slow_ema,
                price: bar.close,
                power: signal_power(fast_ema, slow_ema, volume),
            })
        })
        .collect()
}

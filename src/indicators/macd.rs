// =============================================================================
// Moving Average Convergence / Divergence (MACD)
// =============================================================================
//
//   MACD line = EMA(close, fast) - EMA(close, slow)
//   Signal    = EMA(MACD line, signal)
//   Histogram = MACD line - Signal
//
// Alignment: the fast EMA starts earlier than the slow one, so the MACD line
// uses the fast EMA's tail (offset = fast.len - slow.len).  The signal line is
// shorter again, so the histogram pairs the last `signal.len` MACD points with
// the signal index-for-index.  The bundle's `macd` field is truncated to that
// same tail so all three series share length and timestamps.
//
// Crosses are zero-line crossings of the histogram.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::crosses::level_crosses;
use super::ema::{calculate_ema, ema_of_closes};
use crate::types::{Bar, CrossEvent, Point};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdBundle {
    pub macd: Vec<Point>,
    pub signal: Vec<Point>,
    pub histogram: Vec<Point>,
    pub crosses: Vec<CrossEvent>,
}

impl MacdBundle {
    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }
}

/// Compute MACD, signal, histogram and histogram zero-line crosses.
///
/// Returns an all-empty bundle when `bars.len() < slow` or when any of the
/// three EMAs comes back empty (which also covers zero periods and a MACD
/// line shorter than `signal`).
pub fn calculate_macd(bars: &[Bar], fast: usize, slow: usize, signal: usize) -> MacdBundle {
    if bars.len() < slow {
        return MacdBundle::default();
    }

    let fast_ema = ema_of_closes(bars, fast);
    let slow_ema = ema_of_closes(bars, slow);
    if fast_ema.is_empty() || slow_ema.is_empty() {
        return MacdBundle::default();
    }

    let offset = fast_ema.len().saturating_sub(slow_ema.len());
    let macd_line: Vec<Point> = fast_ema[offset..]
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Point::new(f.time, f.value - s.value))
        .collect();

    let signal_line = calculate_ema(&macd_line, signal);
    if signal_line.is_empty() {
        return MacdBundle::default();
    }

    let macd_tail = &macd_line[macd_line.len() - signal_line.len()..];
    let histogram: Vec<Point> = macd_tail
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| Point::new(s.time, m.value - s.value))
        .collect();

    let crosses = level_crosses(&histogram, 0.0)
        .into_iter()
        .map(|c| CrossEvent::tagged(c.time, c.direction))
        .collect();

    MacdBundle {
        macd: macd_tail.to_vec(),
        signal: signal_line,
        histogram,
        crosses,
    }
}

// =============================================================================
// Cross detection shared by MACD, ADX and EMA-Cross
// =============================================================================
//
// A cross is a transition between two consecutive output points:
//   up   : prev <= ref  and  curr >  ref
//   down : prev >= ref  and  curr <  ref
//
// A point sitting exactly on the reference never emits by itself; the event
// fires on the step that leaves the reference line.
// =============================================================================

use crate::types::{CrossDirection, CrossEvent, Point};

/// Classify one step of `(prev, curr)` against `(prev_ref, curr_ref)`.
fn classify(prev: f64, curr: f64, prev_ref: f64, curr_ref: f64) -> Option<CrossDirection> {
    if prev <= prev_ref && curr > curr_ref {
        Some(CrossDirection::Up)
    } else if prev >= prev_ref && curr < curr_ref {
        Some(CrossDirection::Down)
    } else {
        None
    }
}

/// Crossings of `series` through the constant `level`, stamped with the time
/// of the point that completes the cross.
pub fn level_crosses(series: &[Point], level: f64) -> Vec<CrossEvent> {
    series
        .windows(2)
        .filter_map(|w| {
            classify(w[0].value, w[1].value, level, level)
                .map(|direction| CrossEvent::new(w[1].time, direction))
        })
        .collect()
}

/// Crossings of `fast` through `slow`. Both slices must already be aligned
/// index-for-index; times are taken from `fast`.
pub fn line_crosses(fast: &[Point], slow: &[Point]) -> Vec<CrossEvent> {
    let len = fast.len().min(slow.len());
    (1..len)
        .filter_map(|i| {
            classify(fast[i - 1].value, fast[i].value, slow[i - 1].value, slow[i].value)
                .map(|direction| CrossEvent::tagged(fast[i].time, direction))
        })
        .collect()
}

// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator engines.  Every function takes an explicit
// bar (or point) slice and returns freshly built series; nothing is retained
// between calls.  Insufficient data never errors: the result is simply empty
// (empty series, empty cross list), so callers can poll while a sequence is
// still warming up.

pub mod adx;
pub mod crosses;
pub mod ema;
pub mod ema_cross;
pub mod macd;
pub mod rsi;

pub use adx::{calculate_adx, AdxBundle};
pub use ema::{calculate_ema, ema_of_closes};
pub use ema_cross::{ema_cross, ema_cross_with, CrossoverSignal, EmaCrossBundle};
pub use macd::{calculate_macd, MacdBundle};
pub use rsi::{calculate_rsi, current_rsi, RsiZone};

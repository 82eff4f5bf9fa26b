// =============================================================================
// Octobot Indicators — library root
// =============================================================================
//
// Technical indicators (RSI, MACD, ADX, EMA crossover) over OHLC bar
// sequences, plus the thin stateful layers around them: a revisioned bar
// buffer, a cross/signal registry and a memoizing evaluation engine.
// =============================================================================

pub mod engine;
pub mod indicators;
pub mod market_data;
pub mod runtime_config;
pub mod signals;
pub mod types;

pub use engine::{compute_report, Alert, Evaluation, IndicatorEngine, IndicatorReport};
pub use market_data::{BarBuffer, BarSnapshot, BarUpdate};
pub use runtime_config::RuntimeConfig;
pub use signals::SignalRegistry;
pub use types::{Bar, CrossDirection, CrossEvent, IndicatorKind, Point, Sentiment};

// =============================================================================
// Shared types used across the indicator engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// A single OHLC bar. `time` is unix seconds and is unique per sequence.
///
/// The engine assumes `low <= min(open, close) <= max(open, close) <= high`
/// but never checks it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Bar {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Bar open time as a UTC datetime, `None` when `time` is out of range.
    pub fn datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.time, 0)
    }
}

/// One element of a scalar indicator series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub time: i64,
    pub value: f64,
}

impl Point {
    pub fn new(time: i64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Direction of a detected cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossDirection {
    Up,
    Down,
}

impl CrossDirection {
    /// Bullish/bearish synonym used by line-crossing indicators.
    pub fn sentiment(self) -> Sentiment {
        match self {
            Self::Up => Sentiment::Bullish,
            Self::Down => Sentiment::Bearish,
        }
    }
}

impl std::fmt::Display for CrossDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
        }
    }
}

/// A transition detected between two consecutive output points.
///
/// `kind` is only populated by MACD and EMA-Cross, where it mirrors
/// `direction`. Threshold crosses (ADX) leave it empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossEvent {
    pub time: i64,
    pub direction: CrossDirection,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Sentiment>,
}

impl CrossEvent {
    pub fn new(time: i64, direction: CrossDirection) -> Self {
        Self {
            time,
            direction,
            kind: None,
        }
    }

    /// A cross carrying the bullish/bearish tag.
    pub fn tagged(time: i64, direction: CrossDirection) -> Self {
        Self {
            time,
            direction,
            kind: Some(direction.sentiment()),
        }
    }
}

/// The indicators a caller can switch on; the bare EMA is a building block
/// and not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Rsi,
    Macd,
    Adx,
    EmaCross,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 4] = [
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::Adx,
        IndicatorKind::EmaCross,
    ];

    /// Whether the indicator emits cross events at all.
    pub fn emits_crosses(self) -> bool {
        matches!(self, Self::Macd | Self::Adx | Self::EmaCross)
    }
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsi => write!(f, "RSI"),
            Self::Macd => write!(f, "MACD"),
            Self::Adx => write!(f, "ADX"),
            Self::EmaCross => write!(f, "EMA-Cross"),
        }
    }
}

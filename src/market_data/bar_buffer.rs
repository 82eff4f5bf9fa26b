use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::Bar;

// ---------------------------------------------------------------------------
// Feed messages
// ---------------------------------------------------------------------------

/// One message of a candle feed.
///
/// ```json
/// { "type": "snapshot", "candles": [ { "time": 1700000000, ... } ] }
/// { "type": "update",   "candle":  { "time": 1700000060, ... } }
/// { "type": "error",    "message": "Invalid timeframe" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BarUpdate {
    Snapshot { candles: Vec<Bar> },
    Update { candle: Bar },
    Error { message: String },
}

impl BarUpdate {
    /// Parse a single JSON feed message.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse feed message")
    }
}

/// What a mutation did to the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Full snapshot loaded; holds the resulting length.
    Replaced(usize),
    /// New bar appended after the last one.
    Appended,
    /// Existing bar with the same time overwritten.
    Updated,
    /// New bar inserted before the last one to keep time order.
    Inserted,
    /// Message carried no bar data.
    Ignored,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable copy of the sequence tagged with the revision it was taken at.
///
/// `source` identifies the buffer the copy came from; revisions are only
/// comparable between snapshots of the same source.  Hand-built snapshots
/// carry source 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSnapshot {
    pub source: u64,
    pub revision: u64,
    pub bars: Vec<Bar>,
}

impl BarSnapshot {
    pub fn last_time(&self) -> Option<i64> {
        self.bars.last().map(|b| b.time)
    }
}

// ---------------------------------------------------------------------------
// BarBuffer -- thread-safe ordered bar sequence
// ---------------------------------------------------------------------------

/// Thread-safe, time-ordered bar sequence that keeps at most `max_bars` of
/// the newest bars.  Snapshots replace the whole sequence; single-bar
/// updates overwrite the bar with the same `time` or insert a new one in
/// order.  Every mutation bumps the revision.
pub struct BarBuffer {
    id: u64,
    bars: RwLock<Vec<Bar>>,
    revision: AtomicU64,
    max_bars: usize,
}

/// Source ids handed out to buffers; 0 is reserved for hand-built snapshots.
static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Upper bound on the capacity reserved up front.
const INITIAL_CAPACITY: usize = 1_024;

impl BarBuffer {
    /// Create an empty buffer bounded to `max_bars` (at least one).
    pub fn new(max_bars: usize) -> Self {
        let max_bars = max_bars.max(1);
        Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            bars: RwLock::new(Vec::with_capacity(max_bars.min(INITIAL_CAPACITY))),
            revision: AtomicU64::new(0),
            max_bars,
        }
    }

    /// Replace the whole sequence.
    ///
    /// Input is sorted by time; on duplicate times the later element wins.
    pub fn replace(&self, mut incoming: Vec<Bar>) -> Applied {
        incoming.sort_by_key(|b| b.time);
        let mut ordered: Vec<Bar> = Vec::with_capacity(incoming.len());
        for bar in incoming {
            match ordered.last_mut() {
                Some(last) if last.time == bar.time => *last = bar,
                _ => ordered.push(bar),
            }
        }

        let mut bars = self.bars.write();
        *bars = ordered;
        self.trim(&mut bars);
        self.revision.fetch_add(1, Ordering::Release);
        info!(bars = bars.len(), "bar snapshot loaded");
        Applied::Replaced(bars.len())
    }

    /// Insert or overwrite a single bar.
    ///
    /// A bar older than every retained bar of a full buffer would be trimmed
    /// straight away; it is reported as `Ignored` and leaves the revision
    /// untouched.
    pub fn upsert(&self, bar: Bar) -> Applied {
        let mut bars = self.bars.write();
        let last_time = bars.last().map(|b| b.time);
        let outcome = match last_time {
            Some(last) if bar.time <= last => match bars.binary_search_by_key(&bar.time, |b| b.time) {
                Ok(idx) => {
                    bars[idx] = bar;
                    Applied::Updated
                }
                Err(0) if bars.len() >= self.max_bars => {
                    debug!(time = bar.time, "bar older than a full buffer, dropped");
                    return Applied::Ignored;
                }
                Err(idx) => {
                    bars.insert(idx, bar);
                    Applied::Inserted
                }
            },
            _ => {
                bars.push(bar);
                Applied::Appended
            }
        };
        self.trim(&mut bars);
        self.revision.fetch_add(1, Ordering::Release);
        debug!(time = bar.time, close = bar.close, ?outcome, "bar upserted");
        outcome
    }

    /// Dispatch a feed message.
    pub fn apply(&self, update: BarUpdate) -> Applied {
        match update {
            BarUpdate::Snapshot { candles } => self.replace(candles),
            BarUpdate::Update { candle } => self.upsert(candle),
            BarUpdate::Error { .. } => Applied::Ignored,
        }
    }

    /// Copy of the current sequence and its revision.
    pub fn snapshot(&self) -> BarSnapshot {
        let bars = self.bars.read();
        BarSnapshot {
            source: self.id,
            revision: self.revision.load(Ordering::Acquire),
            bars: bars.clone(),
        }
    }

    /// Process-unique id stamped on every snapshot of this buffer.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.bars.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.read().is_empty()
    }

    pub fn last(&self) -> Option<Bar> {
        self.bars.read().last().copied()
    }

    /// Drop the oldest bars beyond `max_bars`.
    fn trim(&self, bars: &mut Vec<Bar>) {
        if bars.len() > self.max_bars {
            let excess = bars.len() - self.max_bars;
            bars.drain(..excess);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// =============================================================================
// Indicator Engine — recompute enabled indicators per bar snapshot
// =============================================================================
//
// Every evaluation recomputes the enabled indicators from the full snapshot;
// there is no smoothing state carried between calls, so a wholesale snapshot
// reload and a single appended bar take the same path.  The only thing kept
// is the last report, keyed by the snapshot revision and the enabled set, so
// repeated polling of an unchanged buffer costs nothing.  A hit also needs the
// cached bars to equal the snapshot's, so snapshots from another buffer (or
// built by hand) at the same revision are never served a stale report.
// =============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::indicators::ema_cross::{self, CrossoverSignal, EmaCrossBundle};
use crate::indicators::{adx::AdxBundle, calculate_adx, calculate_macd, calculate_rsi, MacdBundle};
use crate::market_data::BarSnapshot;
use crate::runtime_config::RuntimeConfig;
use crate::signals::SignalRegistry;
use crate::types::{Bar, CrossEvent, IndicatorKind, Point};

/// Everything computed for one snapshot.  Disabled indicators are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorReport {
    pub revision: u64,
    pub bar_count: usize,
    pub last_time: Option<i64>,
    pub rsi: Option<Vec<Point>>,
    pub macd: Option<MacdBundle>,
    pub adx: Option<AdxBundle>,
    pub ema_cross: Option<EmaCrossBundle>,
    /// Enriched EMA-Cross events (empty when EMA-Cross is off).
    pub crossover_signals: Vec<CrossoverSignal>,
}

impl IndicatorReport {
    /// Cross list of an indicator, empty when it is off or emits none.
    pub fn crosses(&self, kind: IndicatorKind) -> &[CrossEvent] {
        let crosses = match kind {
            IndicatorKind::Rsi => None,
            IndicatorKind::Macd => self.macd.as_ref().map(|b| &b.crosses),
            IndicatorKind::Adx => self.adx.as_ref().map(|b| &b.crosses),
            IndicatorKind::EmaCross => self.ema_cross.as_ref().map(|b| &b.crosses),
        };
        crosses.map(Vec::as_slice).unwrap_or_default()
    }
}

/// A cross that the registry had not seen before.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Alert {
    pub indicator: IndicatorKind,
    pub cross: CrossEvent,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub report: Arc<IndicatorReport>,
    pub alerts: Vec<Alert>,
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    source: u64,
    revision: u64,
    enabled: Vec<IndicatorKind>,
}

struct CachedReport {
    key: CacheKey,
    bars: Vec<Bar>,
    report: Arc<IndicatorReport>,
}

impl CachedReport {
    fn matches(&self, key: &CacheKey, bars: &[Bar]) -> bool {
        self.key == *key && self.bars == bars
    }
}

pub struct IndicatorEngine {
    config: RuntimeConfig,
    cache: Mutex<Option<CachedReport>>,
}

impl IndicatorEngine {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Compute the indicators enabled in `registry` for `snapshot` and record
    /// their latest crosses.
    pub fn evaluate(&self, snapshot: &BarSnapshot, registry: &SignalRegistry) -> Evaluation {
        let key = CacheKey {
            source: snapshot.source,
            revision: snapshot.revision,
            enabled: registry.enabled_kinds(),
        };

        if let Some(cached) = self.cache.lock().as_ref() {
            if cached.matches(&key, &snapshot.bars) {
                debug!(
                    source = key.source,
                    revision = key.revision,
                    "indicator report served from cache"
                );
                return Evaluation {
                    report: Arc::clone(&cached.report),
                    alerts: Vec::new(),
                    cached: true,
                };
            }
        }

        let mut report = compute_report(&snapshot.bars, &self.config, &key.enabled);
        report.revision = snapshot.revision;
        let report = Arc::new(report);

        let mut alerts = Vec::new();
        for kind in key.enabled.iter().copied().filter(|k| k.emits_crosses()) {
            let crosses = report.crosses(kind);
            if let Some(&cross) = crosses.last() {
                if registry.record(kind, crosses) {
                    alerts.push(Alert {
                        indicator: kind,
                        cross,
                    });
                }
            }
        }

        debug!(
            source = key.source,
            revision = key.revision,
            bars = report.bar_count,
            indicators = key.enabled.len(),
            "indicator report computed"
        );

        *self.cache.lock() = Some(CachedReport {
            key,
            bars: snapshot.bars.clone(),
            report: Arc::clone(&report),
        });
        Evaluation {
            report,
            alerts,
            cached: false,
        }
    }

    /// Drop the cached report.
    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }
}

/// Pure recompute of the `enabled` indicators over `bars`.
pub fn compute_report(
    bars: &[Bar],
    config: &RuntimeConfig,
    enabled: &[IndicatorKind],
) -> IndicatorReport {
    let on = |kind| enabled.contains(&kind);

    let cross_bundle = on(IndicatorKind::EmaCross).then(|| ema_cross::ema_cross(bars));
    let crossover_signals = cross_bundle
        .as_ref()
        .map(|bundle| ema_cross::crossover_signals(bars, bundle, config.signal_volume_fallback))
        .unwrap_or_default();

    IndicatorReport {
        revision: 0,
        bar_count: bars.len(),
        last_time: bars.last().map(|b| b.time),
        rsi: on(IndicatorKind::Rsi).then(|| calculate_rsi(bars, config.rsi_period)),
        macd: on(IndicatorKind::Macd).then(|| {
            calculate_macd(bars, config.macd_fast, config.macd_slow, config.macd_signal)
        }),
        adx: on(IndicatorKind::Adx).then(|| calculate_adx(bars, config.adx_period)),
        ema_cross: cross_bundle,
        crossover_signals,
    }
}

// =============================================================================
// Signal Registry — enabled flags and latest cross per indicator
// =============================================================================
//
// The indicator engines are stateless; this registry is the thin mutable layer
// a UI or alerting collaborator reads.  It remembers, per indicator, whether
// it is switched on and the most recent cross the engine reported.
// =============================================================================

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::types::{CrossEvent, IndicatorKind};

/// Per-indicator registry entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalSlot {
    pub enabled: bool,
    pub last_cross: Option<CrossEvent>,
    /// RFC 3339 wall-clock time the current `last_cross` was recorded.
    pub recorded_at: Option<String>,
}

/// Serialisable view of the whole registry.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub version: u64,
    pub slots: BTreeMap<IndicatorKind, SignalSlot>,
}

/// Thread-safe store of enabled flags and the latest cross per indicator.
pub struct SignalRegistry {
    slots: RwLock<HashMap<IndicatorKind, SignalSlot>>,
    version: AtomicU64,
}

impl SignalRegistry {
    /// Create a registry with every indicator known and `enabled` switched on.
    pub fn new(enabled: &[IndicatorKind]) -> Self {
        let slots = IndicatorKind::ALL
            .iter()
            .map(|&kind| {
                (
                    kind,
                    SignalSlot {
                        enabled: enabled.contains(&kind),
                        ..SignalSlot::default()
                    },
                )
            })
            .collect();
        Self {
            slots: RwLock::new(slots),
            version: AtomicU64::new(0),
        }
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    // ── Enabled flags ───────────────────────────────────────────────────

    pub fn set_enabled(&self, kind: IndicatorKind, enabled: bool) {
        let mut slots = self.slots.write();
        let slot = slots.entry(kind).or_default();
        if slot.enabled != enabled {
            slot.enabled = enabled;
            drop(slots);
            self.bump();
            info!(indicator = %kind, enabled, "indicator toggled");
        }
    }

    pub fn enable(&self, kind: IndicatorKind) {
        self.set_enabled(kind, true);
    }

    pub fn disable(&self, kind: IndicatorKind) {
        self.set_enabled(kind, false);
    }

    /// Flip the flag and return the new state.
    pub fn toggle(&self, kind: IndicatorKind) -> bool {
        let mut slots = self.slots.write();
        let slot = slots.entry(kind).or_default();
        slot.enabled = !slot.enabled;
        let enabled = slot.enabled;
        drop(slots);
        self.bump();
        info!(indicator = %kind, enabled, "indicator toggled");
        enabled
    }

    pub fn is_enabled(&self, kind: IndicatorKind) -> bool {
        self.slots.read().get(&kind).is_some_and(|s| s.enabled)
    }

    /// Enabled indicators in a stable order.
    pub fn enabled_kinds(&self) -> Vec<IndicatorKind> {
        let slots = self.slots.read();
        let mut kinds: Vec<IndicatorKind> = slots
            .iter()
            .filter(|(_, s)| s.enabled)
            .map(|(&k, _)| k)
            .collect();
        kinds.sort();
        kinds
    }

    // ── Crosses ─────────────────────────────────────────────────────────

    /// Remember the most recent cross in `crosses`.
    ///
    /// Returns `true` when it differs from the one already stored, i.e. a new
    /// alert.  An empty list leaves the stored cross untouched.
    pub fn record(&self, kind: IndicatorKind, crosses: &[CrossEvent]) -> bool {
        let Some(&latest) = crosses.last() else {
            return false;
        };

        let mut slots = self.slots.write();
        let slot = slots.entry(kind).or_default();
        if slot.last_cross == Some(latest) {
            debug!(indicator = %kind, time = latest.time, "cross already recorded");
            return false;
        }
        slot.last_cross = Some(latest);
        slot.recorded_at = Some(Utc::now().to_rfc3339());
        drop(slots);

        self.bump();
        info!(
            indicator = %kind,
            time = latest.time,
            direction = %latest.direction,
            "new cross recorded"
        );
        true
    }

    pub fn last_cross(&self, kind: IndicatorKind) -> Option<CrossEvent> {
        self.slots.read().get(&kind).and_then(|s| s.last_cross)
    }

    /// Forget the stored cross, e.g. after the bar sequence was reloaded for
    /// another market.
    pub fn clear(&self, kind: IndicatorKind) {
        let mut slots = self.slots.write();
        if let Some(slot) = slots.get_mut(&kind) {
            if slot.last_cross.take().is_some() {
                slot.recorded_at = None;
                drop(slots);
                self.bump();
            }
        }
    }

    pub fn clear_all(&self) {
        for kind in IndicatorKind::ALL {
            self.clear(kind);
        }
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let slots = self.slots.read();
        RegistrySnapshot {
            version: self.version(),
            slots: slots.iter().map(|(&k, s)| (k, s.clone())).collect(),
        }
    }
}

impl Default for SignalRegistry {
    fn default() -> Self {
        Self::new(&IndicatorKind::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CrossDirection;

    #[test]
    fn new_registry_flags() {
        let reg = SignalRegistry::new(&[IndicatorKind::Rsi, IndicatorKind::Adx]);
        assert!(reg.is_enabled(IndicatorKind::Rsi));
        assert!(!reg.is_enabled(IndicatorKind::Macd));
        assert_eq!(
            reg.enabled_kinds(),
            vec![IndicatorKind::Rsi, IndicatorKind::Adx]
        );
        assert_eq!(reg.version(), 0);
    }

    #[test]
    fn toggle_flips_and_bumps_version() {
        let reg = SignalRegistry::new(&[]);
        assert!(reg.toggle(IndicatorKind::Macd));
        assert!(reg.is_enabled(IndicatorKind::Macd));
        assert!(!reg.toggle(IndicatorKind::Macd));
        assert_eq!(reg.version(), 2);

        // No-op change does not bump.
        reg.disable(IndicatorKind::Macd);
        assert_eq!(reg.version(), 2);
    }

    #[test]
    fn concurrent_toggles_all_apply() {
        let reg = SignalRegistry::new(&[]);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..125 {
                        reg.toggle(IndicatorKind::Adx);
                    }
                });
            }
        });
        // 1000 flips: back where it started, every one counted.
        assert!(!reg.is_enabled(IndicatorKind::Adx));
        assert_eq!(reg.version(), 1_000);
    }

    #[test]
    fn record_keeps_only_latest() {
        let reg = SignalRegistry::default();
        let crosses = vec![
            CrossEvent::tagged(60, CrossDirection::Up),
            CrossEvent::tagged(180, CrossDirection::Down),
        ];
        assert!(reg.record(IndicatorKind::Macd, &crosses));
        assert_eq!(
            reg.last_cross(IndicatorKind::Macd),
            Some(CrossEvent::tagged(180, CrossDirection::Down))
        );

        // Same latest cross again is not a new alert.
        assert!(!reg.record(IndicatorKind::Macd, &crosses));
        // Empty list keeps what we had.
        assert!(!reg.record(IndicatorKind::Macd, &[]));
        assert!(reg.last_cross(IndicatorKind::Macd).is_some());
    }

    #[test]
    fn clear_forgets_cross() {
        let reg = SignalRegistry::default();
        reg.record(IndicatorKind::Adx, &[CrossEvent::new(1, CrossDirection::Up)]);
        let before = reg.version();
        reg.clear_all();
        assert_eq!(reg.last_cross(IndicatorKind::Adx), None);
        assert_eq!(reg.version(), before + 1);
    }

    #[test]
    fn snapshot_serialises() {
        let reg = SignalRegistry::new(&[IndicatorKind::EmaCross]);
        reg.record(
            IndicatorKind::EmaCross,
            &[CrossEvent::tagged(42, CrossDirection::Up)],
        );
        let snap = reg.snapshot();
        assert_eq!(snap.slots.len(), IndicatorKind::ALL.len());
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["slots"]["ema_cross"]["enabled"], true);
        assert_eq!(json["slots"]["ema_cross"]["last_cross"]["type"], "bullish");
        assert!(json["slots"]["ema_cross"]["recorded_at"].is_string());
        assert_eq!(json["slots"]["rsi"]["last_cross"], serde_json::Value::Null);
    }
}

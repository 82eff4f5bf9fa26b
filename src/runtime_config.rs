// =============================================================================
// Runtime Configuration — indicator periods and feature switches
// =============================================================================
//
// Every tunable of the indicator engine lives here.  All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file.  Persistence uses an atomic tmp + rename pattern.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::{adx, ema_cross, macd, rsi};
use crate::types::IndicatorKind;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_rsi_period() -> usize {
    rsi::DEFAULT_PERIOD
}

fn default_macd_fast() -> usize {
    macd::DEFAULT_FAST
}

fn default_macd_slow() -> usize {
    macd::DEFAULT_SLOW
}

fn default_macd_signal() -> usize {
    macd::DEFAULT_SIGNAL
}

fn default_adx_period() -> usize {
    adx::DEFAULT_PERIOD
}

fn default_max_bars() -> usize {
    500
}

fn default_enabled() -> Vec<IndicatorKind> {
    IndicatorKind::ALL.to_vec()
}

fn default_signal_volume_fallback() -> f64 {
    ema_cross::DEFAULT_VOLUME
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// RSI look-back.
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// MACD fast EMA period.
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    /// MACD slow EMA period.
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    /// MACD signal EMA period.
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    /// ADX look-back, used for both warm-up windows.
    #[serde(default = "default_adx_period")]
    pub adx_period: usize,

    /// Maximum number of bars retained by the bar buffer.
    #[serde(default = "default_max_bars")]
    pub max_bars: usize,

    /// Indicators switched on at startup.
    #[serde(default = "default_enabled")]
    pub enabled: Vec<IndicatorKind>,

    /// Volume assumed for bars without one when scoring crossover power.
    #[serde(default = "default_signal_volume_fallback")]
    pub signal_volume_fallback: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            adx_period: default_adx_period(),
            max_bars: default_max_bars(),
            enabled: default_enabled(),
            signal_volume_fallback: default_signal_volume_fallback(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing or malformed file is an error so the caller can fall back to
    /// defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            enabled = ?config.enabled,
            rsi_period = config.rsi_period,
            adx_period = config.adx_period,
            "indicator config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write (write to
    /// `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "indicator config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.rsi_period, 14);
        assert_eq!((cfg.macd_fast, cfg.macd_slow, cfg.macd_signal), (12, 26, 9));
        assert_eq!(cfg.adx_period, 14);
        assert_eq!(cfg.max_bars, 500);
        assert_eq!(cfg.enabled.len(), IndicatorKind::ALL.len());
        assert!((cfg.signal_volume_fallback - 1_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RuntimeConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "rsi_period": 7, "enabled": ["macd", "ema_cross"] }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.rsi_period, 7);
        assert_eq!(cfg.enabled, vec![IndicatorKind::Macd, IndicatorKind::EmaCross]);
        assert_eq!(cfg.macd_slow, 26);
    }

    #[test]
    fn unknown_indicator_is_rejected() {
        let json = r#"{ "enabled": ["stochastic"] }"#;
        assert!(serde_json::from_str::<RuntimeConfig>(json).is_err());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!(
            "octobot_indicator_config_{}.json",
            std::process::id()
        ));
        let cfg = RuntimeConfig {
            adx_period: 10,
            max_bars: 200,
            ..RuntimeConfig::default()
        };
        cfg.save(&path).unwrap();
        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn load_missing_file_errors() {
        let err = RuntimeConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}

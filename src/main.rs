// =============================================================================
// Octobot Indicators — feed replay binary
// =============================================================================
//
// Reads a JSON-lines candle feed (file named by the first argument or
// OCTOBOT_FEED, stdin otherwise), applies every message to the bar buffer,
// re-evaluates the enabled indicators and logs each newly recorded cross.
// =============================================================================

use std::path::Path;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use octobot_indicators::engine::{Alert, Evaluation, IndicatorEngine};
use octobot_indicators::indicators::rsi;
use octobot_indicators::market_data::{Applied, BarBuffer, BarUpdate};
use octobot_indicators::runtime_config::RuntimeConfig;
use octobot_indicators::signals::SignalRegistry;
use octobot_indicators::types::IndicatorKind;

const DEFAULT_CONFIG_PATH: &str = "indicator_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("OCTOBOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path);

    // ── 2. Shared state ──────────────────────────────────────────────────
    let buffer = BarBuffer::new(config.max_bars);
    let registry = SignalRegistry::new(&config.enabled);
    let engine = IndicatorEngine::new(config);

    // ── 3. Feed source ───────────────────────────────────────────────────
    let feed_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("OCTOBOT_FEED").ok());

    let source: Box<dyn AsyncRead + Unpin + Send> = match &feed_path {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open feed {path}"))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    info!(
        feed = feed_path.as_deref().unwrap_or("<stdin>"),
        enabled = ?registry.enabled_kinds(),
        "replay starting"
    );

    // ── 4. Replay loop ───────────────────────────────────────────────────
    let mut lines = BufReader::new(source).lines();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut line_no = 0usize;
    let mut alert_count = 0usize;
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read feed")?,
            _ = &mut shutdown => {
                warn!("shutdown signal received, stopping replay");
                break;
            }
        };
        let Some(line) = line else { break };
        line_no += 1;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let update = match BarUpdate::parse(line) {
            Ok(update) => update,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping malformed feed line");
                continue;
            }
        };
        if let BarUpdate::Error { message } = &update {
            warn!(line = line_no, %message, "feed reported an error");
            continue;
        }

        let applied = buffer.apply(update);
        debug!(line = line_no, ?applied, bars = buffer.len(), "feed message applied");
        if applied == Applied::Ignored {
            continue;
        }

        let evaluation = engine.evaluate(&buffer.snapshot(), &registry);
        for alert in &evaluation.alerts {
            log_alert(alert, &evaluation);
        }
        alert_count += evaluation.alerts.len();
    }

    // ── 5. Summary ───────────────────────────────────────────────────────
    let snapshot = buffer.snapshot();
    match rsi::current_rsi(&snapshot.bars, engine.config().rsi_period) {
        Some((value, zone)) => info!(rsi = %format!("{value:.2}"), %zone, "latest RSI"),
        None => info!(bars = snapshot.bars.len(), "not enough bars for RSI"),
    }

    let evaluation = engine.evaluate(&snapshot, &registry);
    let report = &evaluation.report;
    if let Some(last) = report.macd.as_ref().and_then(|m| m.histogram.last()) {
        info!(histogram = %format!("{:.6}", last.value), "latest MACD");
    }
    if let Some(last) = report.adx.as_ref().and_then(|a| a.adx.last()) {
        info!(adx = %format!("{:.2}", last.value), "latest ADX");
    }
    if let Some(bundle) = report.ema_cross.as_ref() {
        if let (Some(fast), Some(slow)) = (bundle.fast.last(), bundle.slow.last()) {
            info!(
                fast = %format!("{:.4}", fast.value),
                slow = %format!("{:.4}", slow.value),
                "latest EMA-Cross"
            );
        }
    }

    match serde_json::to_string(&registry.snapshot()) {
        Ok(json) => info!(registry = %json, "final signal registry"),
        Err(e) => error!(error = %e, "failed to serialise signal registry"),
    }

    info!(
        lines = line_no,
        bars = snapshot.bars.len(),
        alerts = alert_count,
        "replay complete"
    );
    Ok(())
}

/// Load the config, or fall back to defaults.  Defaults are written out when
/// no file exists yet so they can be edited for the next run.
fn load_config(path: &str) -> RuntimeConfig {
    match RuntimeConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "failed to load config, using defaults");
            let config = RuntimeConfig::default();
            if !Path::new(path).exists() {
                if let Err(e) = config.save(path) {
                    error!(error = %e, "failed to write default config");
                }
            }
            config
        }
    }
}

fn log_alert(alert: &Alert, evaluation: &Evaluation) {
    let cross = alert.cross;
    let at = chrono::DateTime::from_timestamp(cross.time, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| cross.time.to_string());

    if alert.indicator == IndicatorKind::EmaCross {
        let signal = evaluation
            .report
            .crossover_signals
            .iter()
            .find(|s| s.time == cross.time);
        if let Some(signal) = signal {
            info!(
                indicator = %alert.indicator,
                kind = %signal.kind,
                at = %at,
                price = signal.price,
                power = %format!("{:.1}", signal.power),
                "crossover"
            );
            return;
        }
    }

    info!(
        indicator = %alert.indicator,
        direction = %cross.direction,
        kind = ?cross.kind,
        at = %at,
        "cross"
    );
}

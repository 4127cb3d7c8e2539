//! Quakewatch entry point.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `quakewatch.yaml` (or `QUAKEWATCH_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the feed source and the update planner
//! 4. Attach sinks: log notifier, optional GeoJSON files, observer
//! 5. Run the refresh loop until Ctrl-C
//! 6. Log the result

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use quakewatch_core::UpdatePlanner;
use quakewatch_core::sink::{GeoJsonFileSink, LogNotifier};
use quakewatch_feed::FeedSource;
use quakewatch_observer::{AppState, ServerConfig, spawn_observer};
use quakewatch_runner::refresh::{Refresher, ctrl_c};
use quakewatch_runner::{RefreshError, logging, settings};
use tracing::info;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails. Failures inside the
/// refresh loop are logged and do not stop the process.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration.
    let config = settings::load_config(|key| std::env::var(key).ok())
        .context("failed to load configuration")?;

    // 2. Logging.
    logging::init_tracing(&config.logging)?;
    info!("quakewatch starting");
    info!(
        min_magnitude = config.planner.min_magnitude,
        proximity_threshold_km = config.planner.proximity_threshold_km,
        polygon_steps = config.planner.polygon_steps,
        pair_strategy = ?config.planner.pair_strategy,
        refresh_interval_ms = config.refresh.interval_ms,
        "Configuration loaded"
    );

    // 3. Feed and planner.
    let source = FeedSource::from_config(&config.feed).map_err(RefreshError::from)?;
    info!(source = source.name(), base_url = %config.feed.base_url, "Feed source configured");

    let planner = UpdatePlanner::new(config.planner.clone());

    // 4. Sinks.
    let mut refresher = Refresher::new(
        source,
        planner,
        Duration::from_millis(config.refresh.interval_ms),
        Duration::from_millis(config.feed.request_timeout_ms),
    )
    .with_notification_sink(Box::new(LogNotifier));

    if let Some(dir) = &config.output.dir {
        let sink = GeoJsonFileSink::new(dir).map_err(RefreshError::from)?;
        info!(dir = %sink.dir().display(), "Writing GeoJSON layers");
        refresher = refresher.with_render_sink(Box::new(sink));
    }

    let observer = if config.observer.enabled {
        let state = Arc::new(AppState::new());
        let handle = spawn_observer(&ServerConfig::from(&config.observer), Arc::clone(&state))
            .await
            .map_err(RefreshError::from)?;
        info!(addr = %handle.addr, "Observer API server started");
        refresher = refresher.with_observer(state);
        Some(handle)
    } else {
        None
    };

    // 5. Run until Ctrl-C.
    let summary = refresher.run(ctrl_c()).await;

    // 6. Shutdown.
    if let Some(handle) = observer {
        handle.task.abort();
    }

    info!(
        committed = summary.committed,
        failed = summary.failed,
        sink_failures = summary.sink_failures,
        "quakewatch shutdown complete"
    );

    Ok(())
}

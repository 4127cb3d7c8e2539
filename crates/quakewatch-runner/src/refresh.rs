//! The periodic refresh loop.
//!
//! [`Refresher`] owns the feed source, the planner, and the sinks. Each
//! cycle fetches one snapshot (bounded by a timeout), hands it to the
//! planner, and delivers a committed update to every sink. Cycles never
//! overlap: the loop awaits each cycle before waiting for the next tick,
//! and ticks missed while a cycle runs are skipped rather than queued.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use quakewatch_core::sink::{NotificationSink, RenderSink, deliver};
use quakewatch_core::{PlannerError, UpdatePlanner};
use quakewatch_feed::{FeedError, FeedSource};
use quakewatch_observer::{AppState, ObserverSink};
use tokio::time::{MissedTickBehavior, timeout};
use tracing::{debug, info, warn};

/// Result of one refresh cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The planner committed the snapshot and the update was delivered.
    Committed {
        /// Events in the committed set.
        events: usize,
        /// Risk zones drawn.
        risk_zones: usize,
        /// New significant events announced.
        new_significant: usize,
        /// Sink deliveries that failed.
        sink_failures: usize,
    },
    /// The cycle was skipped or aborted; the baseline is unchanged.
    Failed(PlannerError),
}

/// Counters accumulated over a run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Cycles the planner committed.
    pub committed: u64,
    /// Cycles skipped or aborted.
    pub failed: u64,
    /// Failed sink deliveries across all committed cycles.
    pub sink_failures: u64,
}

impl RefreshSummary {
    fn record(&mut self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Committed { sink_failures, .. } => {
                self.committed = self.committed.saturating_add(1);
                let failures = u64::try_from(*sink_failures).unwrap_or(u64::MAX);
                self.sink_failures = self.sink_failures.saturating_add(failures);
            }
            CycleOutcome::Failed(_) => {
                self.failed = self.failed.saturating_add(1);
            }
        }
    }
}

/// Drives feed -> planner -> sinks on a fixed interval.
pub struct Refresher {
    source: FeedSource,
    planner: UpdatePlanner,
    renderers: Vec<Box<dyn RenderSink>>,
    notifiers: Vec<Box<dyn NotificationSink>>,
    observer: Option<Arc<AppState>>,
    interval: Duration,
    fetch_timeout: Duration,
}

impl Refresher {
    /// Create a loop with no sinks attached.
    pub const fn new(
        source: FeedSource,
        planner: UpdatePlanner,
        interval: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            planner,
            renderers: Vec::new(),
            notifiers: Vec::new(),
            observer: None,
            interval,
            fetch_timeout,
        }
    }

    /// Attach a render sink.
    #[must_use]
    pub fn with_render_sink(mut self, sink: Box<dyn RenderSink>) -> Self {
        self.renderers.push(sink);
        self
    }

    /// Attach a notification sink.
    #[must_use]
    pub fn with_notification_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.notifiers.push(sink);
        self
    }

    /// Publish layers and alerts to the observer and record failed cycles
    /// with it.
    #[must_use]
    pub fn with_observer(mut self, state: Arc<AppState>) -> Self {
        let sink = ObserverSink::new(Arc::clone(&state));
        self.renderers.push(Box::new(sink.clone()));
        self.notifiers.push(Box::new(sink));
        self.observer = Some(state);
        self
    }

    /// The planner, for inspecting the committed baseline.
    pub const fn planner(&self) -> &UpdatePlanner {
        &self.planner
    }

    /// Run a single fetch/plan/deliver cycle.
    ///
    /// Dropping the returned future before it completes leaves the planner
    /// untouched: the only commit point is after the fetch resolves.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let fetched = match timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout(
                u64::try_from(self.fetch_timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        };

        match self.planner.apply_fetch(fetched) {
            Ok(update) => {
                let sink_failures = deliver(&update, &mut self.renderers, &mut self.notifiers);
                if sink_failures > 0 {
                    warn!(sink_failures, "Some sinks failed to accept the update");
                }
                CycleOutcome::Committed {
                    events: update.markers.len(),
                    risk_zones: update.risk_zones.len(),
                    new_significant: update.new_significant_events.len(),
                    sink_failures,
                }
            }
            Err(e) => {
                if let Some(observer) = &self.observer {
                    observer.record_failure(e.to_string());
                }
                CycleOutcome::Failed(e)
            }
        }
    }

    /// Run cycles until `shutdown` resolves.
    ///
    /// The first cycle starts immediately; later ones start every
    /// `interval`. Shutdown is honoured between and during cycles.
    pub async fn run<F>(mut self, shutdown: F) -> RefreshSummary
    where
        F: Future<Output = ()>,
    {
        let mut summary = RefreshSummary::default();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            source = self.source.name(),
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "Refresh loop starting"
        );

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                () = &mut shutdown => break,
                outcome = self.run_cycle() => {
                    debug!(?outcome, "Cycle finished");
                    summary.record(&outcome);
                }
            }
        }

        info!(
            committed = summary.committed,
            failed = summary.failed,
            sink_failures = summary.sink_failures,
            "Refresh loop stopped"
        );
        summary
    }
}

/// Resolve when the process receives Ctrl-C.
///
/// If the signal handler cannot be installed this never resolves, so the
/// loop keeps running rather than exiting immediately.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}

//! Update planner: the per-cycle orchestrator and sole owner of the
//! last committed [`EventSet`].
//!
//! One [`cycle`](UpdatePlanner::cycle) runs these stages over a freshly
//! fetched set:
//!
//! 1. **Diff** -- new significant arrivals relative to the last committed set.
//! 2. **Cluster** -- risk-zone descriptors for every pair within the threshold.
//! 3. **Geometry** -- a circle polygon per descriptor.
//! 4. **Assemble** -- a [`RenderUpdate`] with full marker and zone layers.
//! 5. **Commit** -- the fetched set becomes the new baseline.
//!
//! Commit happens only after stages 1-4 succeed. A failed stage leaves the
//! baseline untouched so the next cycle diffs against the same set again.
//! Cycles take `&mut self`, so two cycles can never overlap on one planner;
//! separate planners share nothing.

use core::fmt;

use quakewatch_geo::{GeoError, build_polygon};
use quakewatch_types::{EventId, EventSet, RenderUpdate, RiskZone, RiskZoneDescriptor};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::cluster::{ClusterError, cluster_with};
use crate::config::PlannerConfig;
use crate::diff::diff_new_significant;

/// Handling of zero-radius zones produced by co-located event pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateZonePolicy {
    /// Leave them out of the render update; they have no area to draw.
    #[default]
    Omit,
    /// Pass them to the geometry stage, which rejects them and aborts the cycle.
    Reject,
}

/// The computation stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    /// Proximity clustering.
    Cluster,
    /// Polygon construction.
    Geometry,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster => f.write_str("cluster"),
            Self::Geometry => f.write_str("geometry"),
        }
    }
}

/// A failure inside one computation stage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StageError {
    /// Clustering rejected its input.
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// Polygon construction failed for a zone.
    #[error("zone ({first}, {second}): {source}")]
    Geometry {
        /// First event of the originating pair.
        first: EventId,
        /// Second event of the originating pair.
        second: EventId,
        /// The underlying geodesy error.
        source: GeoError,
    },
}

impl StageError {
    /// Which stage produced the error.
    pub const fn stage(&self) -> CycleStage {
        match self {
            Self::Cluster(_) => CycleStage::Cluster,
            Self::Geometry { .. } => CycleStage::Geometry,
        }
    }
}

/// Errors surfaced by the planner to its caller.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The upstream fetch failed; no cycle ran.
    #[error("fetch failure: {message}")]
    FetchFailure {
        /// Description of the fetch failure.
        message: String,
    },

    /// A computation stage failed; no update was emitted and nothing was
    /// committed.
    #[error("partial cycle failure in {} stage: {source}", .source.stage())]
    PartialCycleFailure {
        /// The underlying stage error.
        #[from]
        source: StageError,
    },
}

/// Per-feed cycle orchestrator.
#[derive(Debug, Clone)]
pub struct UpdatePlanner {
    config: PlannerConfig,
    last_event_set: Option<EventSet>,
    committed_cycles: u64,
}

impl UpdatePlanner {
    /// Create a planner with no baseline; its first cycle reports no new events.
    pub const fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            last_event_set: None,
            committed_cycles: 0,
        }
    }

    /// The planner's configuration.
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The last committed event set, if any cycle has completed.
    pub const fn last_event_set(&self) -> Option<&EventSet> {
        self.last_event_set.as_ref()
    }

    /// Number of cycles committed so far.
    pub const fn committed_cycles(&self) -> u64 {
        self.committed_cycles
    }

    /// Run stages 1-4 against the current baseline without committing.
    ///
    /// # Errors
    ///
    /// Returns the [`StageError`] of the first failing stage.
    pub fn plan(&self, current: &EventSet) -> Result<RenderUpdate, StageError> {
        let new_significant_events = diff_new_significant(
            self.last_event_set.as_ref(),
            current,
            self.config.min_magnitude,
        );

        let descriptors = cluster_with(
            current,
            self.config.proximity_threshold_km,
            self.config.pair_strategy.generator(),
        )?;

        let risk_zones = self.build_zones(descriptors)?;

        Ok(RenderUpdate {
            markers: current.clone(),
            risk_zones,
            new_significant_events,
        })
    }

    /// Run a full cycle over a fetched set and commit it as the new baseline.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::PartialCycleFailure`] if any stage fails, in
    /// which case the baseline is unchanged.
    pub fn cycle(&mut self, current: EventSet) -> Result<RenderUpdate, PlannerError> {
        let update = match self.plan(&current) {
            Ok(update) => update,
            Err(source) => {
                warn!(
                    stage = %source.stage(),
                    error = %source,
                    "Cycle aborted, baseline kept"
                );
                return Err(PlannerError::PartialCycleFailure { source });
            }
        };

        self.last_event_set = Some(current);
        self.committed_cycles = self.committed_cycles.saturating_add(1);

        info!(
            cycle = self.committed_cycles,
            events = update.markers.len(),
            risk_zones = update.risk_zones.len(),
            new_significant = update.new_significant_events.len(),
            "Cycle committed"
        );

        Ok(update)
    }

    /// Run a cycle if the fetch succeeded; otherwise report the failure
    /// without touching the baseline.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::FetchFailure`] for a failed fetch, or any
    /// error from [`cycle`](Self::cycle).
    pub fn apply_fetch<E: fmt::Display>(
        &mut self,
        fetched: Result<EventSet, E>,
    ) -> Result<RenderUpdate, PlannerError> {
        match fetched {
            Ok(current) => self.cycle(current),
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "Fetch failed, skipping cycle");
                Err(PlannerError::FetchFailure { message })
            }
        }
    }

    fn build_zones(
        &self,
        descriptors: Vec<RiskZoneDescriptor>,
    ) -> Result<Vec<RiskZone>, StageError> {
        let mut zones = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if descriptor.is_degenerate() && self.config.degenerate_zones == DegenerateZonePolicy::Omit
            {
                debug!(
                    first = %descriptor.source_pair_ids.0,
                    second = %descriptor.source_pair_ids.1,
                    "Omitting zero-radius zone"
                );
                continue;
            }

            let polygon = build_polygon(
                descriptor.center,
                descriptor.radius_km,
                self.config.polygon_steps,
            )
            .map_err(|source| StageError::Geometry {
                first: descriptor.source_pair_ids.0.clone(),
                second: descriptor.source_pair_ids.1.clone(),
                source,
            })?;

            zones.push(RiskZone {
                descriptor,
                polygon,
            });
        }
        Ok(zones)
    }
}

//! Coverage Service - Resource Coverage Precomputation
//!
//! Computes which locations on a resource's level have content and stores
//! the result as a precomputed artifact:
//!
//! 1. Reuse the stored artifact if it is newer than the resource's last
//!    content change (memoization)
//! 2. Fetch the locations of the resource's level, ordered by position, and
//!    join them with the set of covered location IDs
//! 3. Group the locations by parent for the per-parent details
//! 4. Compress the coverage sequence into maximal runs in one pass and
//!    report whichever side (covered or missing) is more compact
//! 5. Atomically replace the artifact
//!
//! Recomputation is serialized per resource ID (single-flight), so callers
//! queued behind a running computation take the memoization path. An
//! optional timeout bounds the whole computation; on timeout nothing is
//! written.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::access::can_read;
use crate::db::{DatabaseError, DomainEvent};
use crate::models::{
    Location, LocationCoverage, ParentCoverage, PrecomputedData, PrecomputedKind, Resource,
    ResourceCoverage, Text, User,
};
use crate::services::{ServiceContext, ServiceError};

/// A location on the resource's level joined with its coverage flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageRecord {
    pub location_id: String,
    /// Full label of the location
    pub label: String,
    pub position: i64,
    pub parent_id: Option<String>,
    pub covered: bool,
}

/// Compress position-ordered records into maximal same-coverage runs
///
/// Returns the `[start, end]` labels of the reported runs and whether they
/// are the covered ones. Covered runs are reported if they are all runs or
/// if there are no more of them than missing runs; otherwise the missing
/// runs are reported. An empty input reports no runs as covered.
pub fn compress_ranges(records: &[CoverageRecord]) -> (Vec<[String; 2]>, bool) {
    let mut runs: Vec<(&str, &str, bool)> = Vec::new();
    for record in records {
        let label = record.label.as_str();
        if let Some((_, end, covered)) = runs.last_mut() {
            if *covered == record.covered {
                *end = label;
                continue;
            }
        }
        runs.push((label, label, record.covered));
    }

    let covered_runs = runs.iter().filter(|(_, _, covered)| *covered).count();
    let missing_runs = runs.len() - covered_runs;
    let report_covered = covered_runs == runs.len() || covered_runs <= missing_runs;

    let ranges = runs
        .into_iter()
        .filter(|(_, _, covered)| *covered == report_covered)
        .map(|(start, end, _)| [start.to_string(), end.to_string()])
        .collect();
    (ranges, report_covered)
}

/// Group records by parent in order of first appearance
///
/// `parent_labels` maps parent location IDs to their labels; unknown or
/// missing parents get a `None` label.
pub fn group_by_parent(
    records: &[CoverageRecord],
    parent_labels: &HashMap<String, String>,
) -> Vec<ParentCoverage> {
    let mut groups: Vec<ParentCoverage> = Vec::new();
    let mut index: HashMap<Option<&str>, usize> = HashMap::new();

    for record in records {
        let key = record.parent_id.as_deref();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(ParentCoverage {
                label: key.and_then(|id| parent_labels.get(id)).cloned(),
                locations: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].locations.push(LocationCoverage {
            label: record.label.clone(),
            position: record.position,
            covered: record.covered,
        });
    }
    groups
}

/// Build the coverage of `level` of `text`
///
/// `locations` must hold the text's locations on levels `0..=level` (the
/// upper levels are needed for full labels); they don't need to be sorted.
pub fn build_coverage(
    text: &Text,
    locations: &[Location],
    level: u32,
    covered_ids: &HashSet<String>,
) -> ResourceCoverage {
    let labels = text.full_location_labels(locations, level);
    let parent_labels = text.full_location_labels(locations, level.saturating_sub(1));

    let mut on_level: Vec<&Location> = locations
        .iter()
        .filter(|loc| loc.text_id == text.id && loc.level == level)
        .collect();
    on_level.sort_by_key(|loc| loc.position);

    let records: Vec<CoverageRecord> = on_level
        .into_iter()
        .map(|loc| CoverageRecord {
            location_id: loc.id.clone(),
            label: labels.get(&loc.id).cloned().unwrap_or_else(|| loc.label.clone()),
            position: loc.position,
            parent_id: loc.parent_id.clone(),
            covered: covered_ids.contains(&loc.id),
        })
        .collect();

    let (ranges, ranges_covered) = compress_ranges(&records);
    ResourceCoverage {
        covered: records.iter().filter(|r| r.covered).count(),
        total: records.len(),
        ranges,
        ranges_covered,
        details: group_by_parent(&records, &parent_labels),
    }
}

type FlightLocks = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

#[derive(Clone)]
pub struct CoverageService {
    ctx: ServiceContext,
    in_flight: FlightLocks,
}

impl CoverageService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            in_flight: Arc::default(),
        }
    }

    /// Up-to-date coverage artifact of `resource`
    ///
    /// Storage failures and timeouts are returned unchanged; nothing is
    /// persisted unless the computation completes.
    pub async fn compute_coverage(&self, resource: &Resource) -> Result<PrecomputedData, ServiceError> {
        self.refresh(resource).await.map(|(artifact, _)| artifact)
    }

    /// Coverage of a resource as seen by `user`
    ///
    /// Resources the user cannot read are reported as not found.
    pub async fn get_coverage(
        &self,
        resource_id: &str,
        user: Option<&User>,
    ) -> Result<ResourceCoverage, ServiceError> {
        let resource = self.ctx.require_resource(resource_id).await?;
        let access = self.ctx.access_context().await?;
        if !can_read(&resource, user, &access) {
            return Err(ServiceError::not_found("resource", resource_id));
        }
        Ok(self.compute_coverage(&resource).await?.data)
    }

    /// Like [`compute_coverage`](Self::compute_coverage), also reporting
    /// whether the artifact was recomputed
    pub(crate) async fn refresh(&self, resource: &Resource) -> Result<(PrecomputedData, bool), ServiceError> {
        let flight = self.flight_lock(&resource.id);
        let result = {
            let _guard = flight.lock().await;
            match self.ctx.config.data_access_timeout() {
                Some(limit) => match tokio::time::timeout(limit, self.refresh_unlocked(resource)).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(
                            resource_id = %resource.id,
                            timeout_ms = limit.as_millis() as u64,
                            "Coverage computation timed out"
                        );
                        Err(DatabaseError::timeout(format!("coverage of resource {}", resource.id)).into())
                    }
                },
                None => self.refresh_unlocked(resource).await,
            }
        };
        self.release_flight_lock(&resource.id, flight);
        result
    }

    async fn refresh_unlocked(&self, resource: &Resource) -> Result<(PrecomputedData, bool), ServiceError> {
        let store = &self.ctx.store;

        let existing = store.get_artifact(&resource.id, PrecomputedKind::Coverage).await?;
        if let Some(existing) = &existing {
            if existing.is_fresh(resource.contents_changed_at) {
                tracing::debug!(resource_id = %resource.id, "Coverage is up to date");
                return Ok((existing.clone(), false));
            }
        }

        let text = store
            .get_text(&resource.text_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("text", &resource.text_id))?;
        let locations = store.find_locations_up_to(&text.id, resource.level).await?;
        let covered_ids = store.find_covered_location_ids(&resource.id).await?;

        let data = build_coverage(&text, &locations, resource.level, &covered_ids);
        tracing::info!(
            resource_id = %resource.id,
            covered = data.covered,
            total = data.total,
            ranges = data.ranges.len(),
            "Recomputed coverage"
        );

        let mut artifact = PrecomputedData::coverage(&resource.id, self.ctx.clock.now(), data);
        if let Some(existing) = existing {
            artifact.id = existing.id;
        }
        let artifact = store.replace_artifact(artifact).await?;

        self.ctx.emit_event(DomainEvent::CoverageReplaced {
            ref_id: resource.id.clone(),
        });
        Ok((artifact, true))
    }

    fn flight_lock(&self, resource_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(resource_id.to_string()).or_default().clone()
    }

    fn release_flight_lock(&self, resource_id: &str, flight: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map and this caller hold the lock: nobody is waiting
        if Arc::strong_count(&flight) <= 2 {
            locks.remove(resource_id);
        }
    }

    #[cfg(test)]
    fn in_flight_count(&self) -> usize {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl std::fmt::Debug for CoverageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverageService").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "coverage_service_test.rs"]
mod coverage_service_test;

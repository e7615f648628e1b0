//! Maintenance - Batched Coverage Recomputation
//!
//! [`MaintenanceService::run`] brings the coverage artifacts of all
//! resources up to date. Fresh artifacts are skipped through the coverage
//! memoization; failures of single resources are logged and reported in
//! the summary without stopping the run.
//!
//! [`MaintenanceProcessor`] runs maintenance in a background task:
//! - Event-driven: sleeps until woken, no polling
//! - Wake signals are coalesced into a single run
//! - Graceful shutdown when the processor is dropped

use serde::Serialize;
use tokio::sync::mpsc;

use crate::access::Predicate;
use crate::services::{CoverageService, ServiceContext, ServiceError};

/// Outcome of a maintenance run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceSummary {
    pub recomputed: usize,
    pub skipped_fresh: usize,
    /// IDs of resources whose coverage could not be computed
    pub failed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MaintenanceService {
    ctx: ServiceContext,
    coverage: CoverageService,
}

impl MaintenanceService {
    pub fn new(ctx: ServiceContext, coverage: CoverageService) -> Self {
        Self { ctx, coverage }
    }

    /// Recompute stale coverage of every resource
    ///
    /// Only listing the resources can fail the whole run.
    pub async fn run(&self) -> Result<MaintenanceSummary, ServiceError> {
        let resources = self.ctx.store.find_resources(&Predicate::All).await?;
        let mut summary = MaintenanceSummary::default();

        for resource in &resources {
            match self.coverage.refresh(resource).await {
                Ok((_, true)) => summary.recomputed += 1,
                Ok((_, false)) => summary.skipped_fresh += 1,
                Err(e) => {
                    tracing::warn!(resource_id = %resource.id, error = %e, "Coverage maintenance failed");
                    summary.failed.push(resource.id.clone());
                }
            }
        }

        tracing::info!(
            resources = resources.len(),
            recomputed = summary.recomputed,
            skipped_fresh = summary.skipped_fresh,
            failed = summary.failed.len(),
            "Maintenance run finished"
        );
        Ok(summary)
    }
}

/// Handle to wake the maintenance processor
///
/// Lightweight and cloneable; multiple wakes are coalesced into one run.
#[derive(Debug, Clone)]
pub struct MaintenanceWaker {
    trigger_tx: mpsc::Sender<()>,
}

impl MaintenanceWaker {
    /// Request a maintenance run (non-blocking)
    pub fn wake(&self) {
        match self.trigger_tx.try_send(()) {
            Ok(_) => tracing::debug!("Maintenance wake signal sent"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("Maintenance already has a pending wake");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("MaintenanceProcessor has shut down, wake ignored");
            }
        }
    }
}

/// Background task running maintenance whenever it is woken
pub struct MaintenanceProcessor {
    waker: MaintenanceWaker,
    _shutdown_tx: mpsc::Sender<()>,
    summaries: tokio::sync::watch::Receiver<Option<MaintenanceSummary>>,
}

impl MaintenanceProcessor {
    /// Spawn the processor on the current tokio runtime
    pub fn spawn(service: MaintenanceService) -> Self {
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(1);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (summary_tx, summaries) = tokio::sync::watch::channel(None);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.recv() => {
                        tracing::info!("MaintenanceProcessor shutting down");
                        break;
                    }

                    Some(_) = trigger_rx.recv() => {
                        while trigger_rx.try_recv().is_ok() {}
                        match service.run().await {
                            Ok(summary) => {
                                let _ = summary_tx.send(Some(summary));
                            }
                            Err(e) => tracing::error!("Maintenance run failed: {}", e),
                        }
                    }
                }
            }
        });

        Self {
            waker: MaintenanceWaker { trigger_tx },
            _shutdown_tx: shutdown_tx,
            summaries,
        }
    }

    /// Cloneable waker handle for other services
    pub fn waker(&self) -> MaintenanceWaker {
        self.waker.clone()
    }

    pub fn wake(&self) {
        self.waker.wake();
    }

    /// Receiver of the summary of the latest successful run
    pub fn summaries(&self) -> tokio::sync::watch::Receiver<Option<MaintenanceSummary>> {
        self.summaries.clone()
    }
}

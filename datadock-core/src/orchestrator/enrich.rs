//! Dataset listing enriched with per-dataset health and event metrics.
//!
//! One listing call fans out into six telemetry calls per dataset. Only the
//! listing itself can fail the operation; every per-dataset call degrades to
//! a default value and is logged.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::{DatasetError, PlatformError};
use crate::platform::metrics::{MetricQuery, TimeWindow, TimeWindows};
use crate::platform::{DatasetListRequest, HealthRequest, ListedDataset, PlatformApi};

/// Reported when the health call fails or returns no status.
pub const UNKNOWN_STATUS: &str = "unknown";

/// Event counts over one day window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMetrics {
    pub received: u64,
    pub success: u64,
    pub failed: u64,
}

impl DayMetrics {
    /// `received` is processed plus failed.
    pub fn from_counts(processed: u64, failed: u64) -> Self {
        Self {
            received: processed.saturating_add(failed),
            success: processed,
            failed,
        }
    }
}

/// Today's counts at the top level, yesterday's nested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetrics {
    #[serde(flatten)]
    pub today: DayMetrics,
    pub yesterday: DayMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub dataset: String,
    pub status: String,
    pub last_synced_time: Option<DateTime<Utc>>,
    pub metrics: DatasetMetrics,
}

/// Builds [`DatasetSummary`] lists for the live datasets.
#[derive(Clone)]
pub struct MetricsEnricher {
    platform: Arc<dyn PlatformApi>,
    tz: Tz,
    max_concurrent: usize,
}

impl MetricsEnricher {
    /// `max_concurrent` bounds how many datasets are enriched at once; it is
    /// clamped to at least one.
    pub fn new(platform: Arc<dyn PlatformApi>, tz: Tz, max_concurrent: usize) -> Self {
        Self {
            platform,
            tz,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub async fn list_datasets_with_metrics(&self) -> Result<Vec<DatasetSummary>, DatasetError> {
        self.list_datasets_with_metrics_at(Utc::now()).await
    }

    /// Same as [`list_datasets_with_metrics`](Self::list_datasets_with_metrics)
    /// with the clock pinned to `now`.
    pub async fn list_datasets_with_metrics_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<DatasetSummary>, DatasetError> {
        let listed = self
            .platform
            .list_datasets(&DatasetListRequest::live())
            .await
            .map_err(|err| {
                warn!(error = %err, "Dataset listing failed");
                match err {
                    PlatformError::Rejected { status, .. } => DatasetError::ListFailed { status },
                    other => DatasetError::from_platform(other),
                }
            })?;

        let datasets: Vec<(String, String)> = listed
            .into_iter()
            .filter_map(|ListedDataset { dataset_id, name }| {
                let id = dataset_id.filter(|id| !id.trim().is_empty());
                if id.is_none() {
                    debug!(name = ?name, "Skipping listed dataset without an id");
                }
                id.map(|id| {
                    let name = name.unwrap_or_else(|| id.clone());
                    (id, name)
                })
            })
            .collect();

        let windows = TimeWindows::at(now, self.tz);
        let semaphore = Semaphore::new(self.max_concurrent);

        let summaries = join_all(datasets.iter().map(|(id, name)| {
            let semaphore = &semaphore;
            let windows = &windows;
            async move {
                // The semaphore is never closed, so acquire only fails if it were.
                let _permit = semaphore.acquire().await.ok();
                self.summarize(id, name, windows).await
            }
        }))
        .await;

        info!(
            datasets = summaries.len(),
            timezone = %self.tz,
            "Enriched dataset listing"
        );
        Ok(summaries)
    }

    async fn summarize(
        &self,
        dataset_id: &str,
        name: &str,
        windows: &TimeWindows,
    ) -> DatasetSummary {
        let (
            processed_today,
            failed_today,
            processed_yesterday,
            failed_yesterday,
            status,
            last_synced,
        ) = tokio::join!(
            self.count(processed(dataset_id, windows.today)),
            self.count(failed(dataset_id, windows.today)),
            self.count(processed(dataset_id, windows.yesterday)),
            self.count(failed(dataset_id, windows.yesterday)),
            self.health(dataset_id),
            self.last_synced(dataset_id, windows),
        );

        DatasetSummary {
            dataset: name.to_string(),
            status,
            last_synced_time: last_synced,
            metrics: DatasetMetrics {
                today: DayMetrics::from_counts(processed_today, failed_today),
                yesterday: DayMetrics::from_counts(processed_yesterday, failed_yesterday),
            },
        }
    }

    /// A count query; failures and missing values read as zero.
    async fn count(&self, query: MetricQuery) -> u64 {
        match self.platform.query_metric(&query).await {
            Ok(value) => value.map(to_count).unwrap_or(0),
            Err(err) => {
                warn!(
                    dataset_id = query.dataset_id(),
                    metric = query.id(),
                    window = ?query.window(),
                    error = %err,
                    "Metric query failed, reporting 0"
                );
                0
            }
        }
    }

    async fn health(&self, dataset_id: &str) -> String {
        match self
            .platform
            .dataset_health(&HealthRequest::envelope(dataset_id))
            .await
        {
            Ok(Some(status)) if !status.trim().is_empty() => status.to_lowercase(),
            Ok(_) => UNKNOWN_STATUS.to_string(),
            Err(err) => {
                warn!(dataset_id, error = %err, "Health check failed, reporting unknown");
                UNKNOWN_STATUS.to_string()
            }
        }
    }

    /// Latest ingested event time; a zero or missing value reads as never.
    async fn last_synced(
        &self,
        dataset_id: &str,
        windows: &TimeWindows,
    ) -> Option<DateTime<Utc>> {
        let query = MetricQuery::LastSyncedTime {
            dataset_id: dataset_id.to_string(),
            now: windows.now,
        };
        match self.platform.query_metric(&query).await {
            Ok(value) => value
                .filter(|ms| *ms > 0.0)
                .and_then(|ms| DateTime::from_timestamp_millis(ms as i64)),
            Err(err) => {
                warn!(dataset_id, error = %err, "Last-synced query failed, reporting null");
                None
            }
        }
    }
}

fn processed(dataset_id: &str, window: TimeWindow) -> MetricQuery {
    MetricQuery::ProcessedCount {
        dataset_id: dataset_id.to_string(),
        window,
    }
}

fn failed(dataset_id: &str, window: TimeWindow) -> MetricQuery {
    MetricQuery::FailedCount {
        dataset_id: dataset_id.to_string(),
        window,
    }
}

/// Fractional counts are truncated, never rounded up.
fn to_count(value: f64) -> u64 {
    if value <= 0.0 { 0 } else { value.trunc() as u64 }
}

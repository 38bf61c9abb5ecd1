use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::catalog::{MetricsCatalog, CATALOG};
use crate::inventory::InstanceDirectory;
use crate::models::{InstanceRecord, MetricTable, Scope};
use crate::{MetricsServiceError, Result};

/// One instance with every catalog metric resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceReport {
    pub id: String,
    pub name: String,
    pub machine_type: String,
    pub metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneReport {
    pub project_id: String,
    pub zone: String,
    pub generated_at: DateTime<Utc>,
    pub instances: Vec<InstanceReport>,
}

fn round_for_display(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Joins the metric table with the directory. Every directory instance gets
/// a record; metrics it has no value for read as 0.
pub fn assemble(
    table: &MetricTable,
    directory: &BTreeMap<String, InstanceRecord>,
) -> Vec<InstanceReport> {
    directory
        .values()
        .map(|record| {
            let metrics = CATALOG
                .iter()
                .map(|entry| {
                    let value = table
                        .get(entry.name)
                        .and_then(|values| values.get(&record.id))
                        .copied()
                        .unwrap_or(0.0);
                    (entry.name.to_string(), round_for_display(value))
                })
                .collect();

            InstanceReport {
                id: record.id.clone(),
                name: record.name.clone(),
                machine_type: record.machine_type.clone(),
                metrics,
            }
        })
        .collect()
}

/// Runs one report request against both backends under a deadline.
pub struct ReportService {
    catalog: MetricsCatalog,
    directory: InstanceDirectory,
    request_timeout: Duration,
}

impl ReportService {
    pub fn new(catalog: MetricsCatalog, directory: InstanceDirectory, request_timeout: Duration) -> Self {
        Self {
            catalog,
            directory,
            request_timeout,
        }
    }

    /// The raw metric table: metric name -> instance id -> value.
    pub async fn collect_metrics(&self, scope: &Scope) -> Result<MetricTable> {
        self.with_deadline(self.catalog.collect(scope)).await
    }

    /// Collects metrics and lists instances concurrently, then joins them.
    pub async fn build_report(&self, scope: &Scope) -> Result<ZoneReport> {
        let (table, directory) = self
            .with_deadline(async {
                tokio::try_join!(self.catalog.collect(scope), self.directory.list(scope))
            })
            .await?;

        let instances = assemble(&table, &directory);
        info!(
            project_id = %scope.project_id,
            zone = %scope.zone,
            instances = instances.len(),
            "Assembled zone report"
        );

        Ok(ZoneReport {
            project_id: scope.project_id.clone(),
            zone: scope.zone.clone(),
            generated_at: Utc::now(),
            instances,
        })
    }

    async fn with_deadline<T, F>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.request_timeout, future)
            .await
            .map_err(|_| MetricsServiceError::Timeout(self.request_timeout))?
    }
}

//! The fixed set of metrics collected for every report, and the fan-out that
//! queries them.

use std::str::FromStr;
use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use tracing::{info, instrument, warn};

use crate::models::{InstanceValues, MetricTable, Scope};
use crate::monitoring::{MetricQuery, MonitoringBackend, DEFAULT_WINDOW_MINUTES};
use crate::telemetry;
use crate::{MetricsServiceError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Key of the metric in reports.
    pub name: &'static str,
    /// Backend metric type.
    pub metric_type: &'static str,
    pub window_minutes: u32,
}

const fn entry(name: &'static str, metric_type: &'static str, window_minutes: u32) -> CatalogEntry {
    CatalogEntry {
        name,
        metric_type,
        window_minutes,
    }
}

pub static CATALOG: [CatalogEntry; 12] = [
    entry(
        "cpu_utilization",
        "compute.googleapis.com/instance/cpu/utilization",
        DEFAULT_WINDOW_MINUTES,
    ),
    entry(
        "cpu_usage_time",
        "compute.googleapis.com/instance/cpu/usage_time",
        DEFAULT_WINDOW_MINUTES,
    ),
    entry(
        "disk_read_ops",
        "compute.googleapis.com/instance/disk/read_ops_count",
        DEFAULT_WINDOW_MINUTES,
    ),
    entry(
        "system_uptime",
        "compute.googleapis.com/instance/uptime_total",
        DEFAULT_WINDOW_MINUTES,
    ),
    entry(
        "reserved_cores",
        "compute.googleapis.com/instance/cpu/reserved_cores",
        DEFAULT_WINDOW_MINUTES,
    ),
    entry(
        "disk_io_latency",
        "compute.googleapis.com/instance/disk/average_io_latency",
        20,
    ),
    entry(
        "write_ops_count",
        "compute.googleapis.com/instance/disk/write_ops_count",
        DEFAULT_WINDOW_MINUTES,
    ),
    entry(
        "sent_packets_count",
        "compute.googleapis.com/instance/network/sent_packets_count",
        DEFAULT_WINDOW_MINUTES,
    ),
    entry(
        "received_packets_count",
        "compute.googleapis.com/instance/network/received_packets_count",
        DEFAULT_WINDOW_MINUTES,
    ),
    entry(
        "nat_sent_packets_count",
        "compute.googleapis.com/nat/sent_packets_count",
        DEFAULT_WINDOW_MINUTES,
    ),
    entry(
        "egress_packets_count",
        "networking.googleapis.com/vm_flow/egress_packets_count",
        DEFAULT_WINDOW_MINUTES,
    ),
    entry(
        "ingress_packets_count",
        "networking.googleapis.com/vm_flow/ingress_packets_count",
        DEFAULT_WINDOW_MINUTES,
    ),
];

/// What a failed metric query does to the rest of the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The first failure fails the whole table.
    #[default]
    FailFast,
    /// A failed metric is reported as an empty mapping.
    PartialSuccess,
}

impl FromStr for FailurePolicy {
    type Err = MetricsServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "fail-fast" => Ok(FailurePolicy::FailFast),
            "partial" | "partial_success" | "partial-success" => Ok(FailurePolicy::PartialSuccess),
            other => Err(MetricsServiceError::Config(format!(
                "unknown failure policy '{}'",
                other
            ))),
        }
    }
}

pub struct MetricsCatalog {
    backend: Arc<dyn MonitoringBackend>,
    policy: FailurePolicy,
}

impl MetricsCatalog {
    pub fn new(backend: Arc<dyn MonitoringBackend>, policy: FailurePolicy) -> Self {
        Self { backend, policy }
    }

    pub fn entries(&self) -> &'static [CatalogEntry] {
        &CATALOG
    }

    /// Queries every catalog metric concurrently. The table always holds
    /// every catalog name, with an empty mapping where no instance reported.
    #[instrument(skip(self), fields(project_id = %scope.project_id, zone = %scope.zone, policy = ?self.policy))]
    pub async fn collect(&self, scope: &Scope) -> Result<MetricTable> {
        let query = MetricQuery::new(self.backend.as_ref(), scope);
        let query = &query;

        let table: MetricTable = match self.policy {
            FailurePolicy::FailFast => try_join_all(self.entries().iter().map(|entry| async move {
                query
                    .execute(entry.metric_type, entry.window_minutes)
                    .await
                    .map(|values| (entry.name.to_string(), values))
                    .map_err(|err| err.for_metric(entry.name))
            }))
            .await?
            .into_iter()
            .collect(),
            FailurePolicy::PartialSuccess => join_all(self.entries().iter().map(|entry| async move {
                let values = match query.execute(entry.metric_type, entry.window_minutes).await {
                    Ok(values) => values,
                    Err(err) => {
                        let err = err.for_metric(entry.name);
                        warn!(metric = entry.name, error = %err, "Metric query failed, reporting it empty");
                        telemetry::record_partial_failure(entry.name);
                        InstanceValues::new()
                    }
                };
                (entry.name.to_string(), values)
            }))
            .await
            .into_iter()
            .collect(),
        };

        info!(metrics = table.len(), "Collected metric catalog");
        Ok(table)
    }
}

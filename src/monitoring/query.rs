use tracing::{debug, instrument};

use crate::models::{InstanceValues, Scope, TimeWindow};
use crate::{MetricsServiceError, Result};

use super::{metric_filter, reduce, MonitoringBackend};

/// Lookback used when a metric does not configure its own.
pub const DEFAULT_WINDOW_MINUTES: u32 = 10;

/// Runs single-metric queries against one project/zone.
pub struct MetricQuery<'a> {
    backend: &'a dyn MonitoringBackend,
    scope: &'a Scope,
}

impl<'a> MetricQuery<'a> {
    pub fn new(backend: &'a dyn MonitoringBackend, scope: &'a Scope) -> Self {
        Self { backend, scope }
    }

    /// Queries the trailing `window_minutes` of `metric_type` and returns the
    /// per-instance maximum. Backend errors are returned as-is, no retry.
    pub async fn execute(&self, metric_type: &str, window_minutes: u32) -> Result<InstanceValues> {
        if window_minutes == 0 {
            return Err(MetricsServiceError::Scope(format!(
                "window for {} must be at least one minute",
                metric_type
            )));
        }

        self.execute_in(metric_type, &TimeWindow::last_minutes(window_minutes))
            .await
    }

    #[instrument(
        skip(self, window),
        fields(project_id = %self.scope.project_id, zone = %self.scope.zone)
    )]
    pub async fn execute_in(&self, metric_type: &str, window: &TimeWindow) -> Result<InstanceValues> {
        let filter = metric_filter(metric_type, &self.scope.zone);
        let series = self
            .backend
            .list_time_series(&self.scope.project_id, &filter, window)
            .await?;

        let values = reduce(&series)?;
        debug!(
            series = series.len(),
            instances = values.len(),
            "Reduced time series"
        );

        Ok(values)
    }
}

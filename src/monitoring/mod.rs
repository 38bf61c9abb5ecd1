//! Time-series side of the service: the backend port, the wire model of a
//! `timeSeries.list` response, and the normalize/reduce/query pipeline built
//! on top of it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::TimeWindow;
use crate::wire::deserialize_opt_int64;
use crate::Result;

pub mod client;
pub mod normalize;
pub mod query;
pub mod reduce;

pub use client::HttpMonitoringClient;
pub use normalize::normalize;
pub use query::{MetricQuery, DEFAULT_WINDOW_MINUTES};
pub use reduce::reduce;

/// Resource label every per-instance series carries.
pub const INSTANCE_ID_LABEL: &str = "instance_id";

#[async_trait]
pub trait MonitoringBackend: Send + Sync {
    /// Returns every series matching `filter` inside `window`, with full
    /// point detail, across all result pages.
    async fn list_time_series(
        &self,
        project_id: &str,
        filter: &str,
        window: &TimeWindow,
    ) -> Result<Vec<TimeSeries>>;
}

/// Builds the series filter for one metric type within one zone.
pub fn metric_filter(metric_type: &str, zone: &str) -> String {
    format!(
        "metric.type=\"{}\" AND resource.labels.zone=\"{}\"",
        metric_type, zone
    )
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    #[serde(default)]
    pub metric: MetricLabels,
    #[serde(default)]
    pub resource: MonitoredResource,
    #[serde(default)]
    pub points: Vec<Point>,
}

impl TimeSeries {
    pub fn instance_id(&self) -> Option<&str> {
        self.resource
            .labels
            .get(INSTANCE_ID_LABEL)
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetricLabels {
    #[serde(rename = "type", default)]
    pub metric_type: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MonitoredResource {
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub interval: Option<PointInterval>,
    #[serde(default)]
    pub value: PointValue,
}

impl From<PointValue> for Point {
    fn from(value: PointValue) -> Self {
        Point {
            interval: None,
            value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointInterval {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// A sample value. The backend fills at most one of the two fields and
/// omits fields holding their default, so a true zero and an unset value
/// look the same on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointValue {
    #[serde(default)]
    pub double_value: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_opt_int64")]
    pub int64_value: Option<i64>,
}

/// Tagged view of a [`PointValue`] that keeps "unset" apart from zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue {
    Double(f64),
    Int64(i64),
    Unset,
}

impl PointValue {
    pub fn double(value: f64) -> Self {
        PointValue {
            double_value: Some(value),
            int64_value: None,
        }
    }

    pub fn int64(value: i64) -> Self {
        PointValue {
            double_value: None,
            int64_value: Some(value),
        }
    }

    pub fn typed(&self) -> TypedValue {
        match (self.double_value, self.int64_value) {
            (Some(d), Some(i)) if d == 0.0 => TypedValue::Int64(i),
            (Some(d), _) => TypedValue::Double(d),
            (None, Some(i)) => TypedValue::Int64(i),
            (None, None) => TypedValue::Unset,
        }
    }
}

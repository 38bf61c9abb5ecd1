use std::collections::BTreeMap;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{MetricsServiceError, Result};

/// Instance id -> reduced value for one metric.
pub type InstanceValues = BTreeMap<String, f64>;

/// Logical metric name -> per-instance values.
pub type MetricTable = BTreeMap<String, InstanceValues>;

/// Project and zone every backend call of one request is confined to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub project_id: String,
    pub zone: String,
}

impl Scope {
    pub fn new(project_id: impl Into<String>, zone: impl Into<String>) -> Result<Self> {
        let project_id = project_id.into().trim().to_string();
        let zone = zone.into().trim().to_string();

        if project_id.is_empty() || zone.is_empty() {
            return Err(MetricsServiceError::Scope(
                "Missing project_id or zone".to_string(),
            ));
        }
        if !is_project_id(&project_id) {
            return Err(MetricsServiceError::Scope(format!(
                "Invalid project_id: {}",
                project_id
            )));
        }
        if !is_zone(&zone) {
            return Err(MetricsServiceError::Scope(format!("Invalid zone: {}", zone)));
        }

        Ok(Self { project_id, zone })
    }
}

/// Lowercase letters, digits and hyphens, plus `.` and `:` for
/// domain-scoped projects such as `example.com:my-project`.
fn is_project_id(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | ':'))
}

fn is_zone(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Closed interval `[start, end]` a metric query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn ending_at(end: DateTime<Utc>, minutes: u32) -> Self {
        Self {
            start: end - Duration::minutes(i64::from(minutes)),
            end,
        }
    }

    pub fn last_minutes(minutes: u32) -> Self {
        Self::ending_at(Utc::now(), minutes)
    }

    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn end_rfc3339(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Descriptive metadata for one compute instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: String,
    pub name: String,
    pub machine_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scope_requires_project_and_zone() {
        assert!(Scope::new("proj", "").is_err());
        assert!(Scope::new("", "us-central1-a").is_err());
        assert!(Scope::new("  ", "us-central1-a").is_err());

        let scope = Scope::new(" proj ", "us-central1-a").unwrap();
        assert_eq!(scope.project_id, "proj");
        assert_eq!(scope.zone, "us-central1-a");
    }

    #[test]
    fn test_scope_rejects_path_and_filter_syntax() {
        for project_id in ["victim/../other-project", "proj?x=1", "My-Project", "proj%2F"] {
            let err = Scope::new(project_id, "us-central1-a").unwrap_err();
            assert!(matches!(err, MetricsServiceError::Scope(_)), "{}", project_id);
        }

        for zone in [r#"x" OR resource.labels.zone!="x"#, "us-central1-a/..", "us central1"] {
            let err = Scope::new("proj", zone).unwrap_err();
            assert!(matches!(err, MetricsServiceError::Scope(_)), "{}", zone);
        }
    }

    #[test]
    fn test_scope_accepts_domain_scoped_project() {
        let scope = Scope::new("example.com:my-project-42", "europe-west1-b").unwrap();
        assert_eq!(scope.project_id, "example.com:my-project-42");
    }

    #[test]
    fn test_window_spans_duration() {
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let window = TimeWindow::ending_at(end, 20);

        assert_eq!(window.end - window.start, Duration::minutes(20));
        assert_eq!(window.start_rfc3339(), "2024-03-01T11:40:00.000000Z");
        assert_eq!(window.end_rfc3339(), "2024-03-01T12:00:00.000000Z");
    }
}

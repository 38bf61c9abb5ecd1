//! Scripted backends standing in for the monitoring and inventory APIs in
//! tests. Enabled for this crate's own tests and by the `testing` feature.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Backend;
use crate::inventory::{Instance, InventoryBackend};
use crate::models::TimeWindow;
use crate::monitoring::{
    MonitoredResource, MonitoringBackend, Point, PointValue, TimeSeries, INSTANCE_ID_LABEL,
};
use crate::{MetricsServiceError, Result};

pub fn series(instance_id: &str, values: &[PointValue]) -> TimeSeries {
    let mut resource = MonitoredResource {
        resource_type: "gce_instance".to_string(),
        ..Default::default()
    };
    resource
        .labels
        .insert(INSTANCE_ID_LABEL.to_string(), instance_id.to_string());

    TimeSeries {
        resource,
        points: values.iter().copied().map(Point::from).collect(),
        ..Default::default()
    }
}

pub fn instance(id: &str, name: &str, machine_type: &str) -> Instance {
    Instance {
        id: id.to_string(),
        name: name.to_string(),
        machine_type: format!(
            "https://www.googleapis.com/compute/v1/projects/proj/zones/us-central1-a/machineTypes/{}",
            machine_type
        ),
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub project_id: String,
    pub filter: String,
    pub window: TimeWindow,
}

enum Script {
    Series(Vec<TimeSeries>),
    Fail(String),
}

/// Answers by metric type; unknown metric types return no series.
#[derive(Default)]
pub struct ScriptedMonitoring {
    scripts: HashMap<String, Script>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedMonitoring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, metric_type: &str, series: Vec<TimeSeries>) -> Self {
        self.scripts
            .insert(metric_type.to_string(), Script::Series(series));
        self
    }

    pub fn failing(mut self, metric_type: &str, detail: &str) -> Self {
        self.scripts
            .insert(metric_type.to_string(), Script::Fail(detail.to_string()));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

fn metric_type_of(filter: &str) -> &str {
    filter
        .strip_prefix("metric.type=\"")
        .and_then(|rest| rest.split('"').next())
        .unwrap_or_default()
}

#[async_trait]
impl MonitoringBackend for ScriptedMonitoring {
    async fn list_time_series(
        &self,
        project_id: &str,
        filter: &str,
        window: &TimeWindow,
    ) -> Result<Vec<TimeSeries>> {
        self.calls.lock().unwrap().push(RecordedCall {
            project_id: project_id.to_string(),
            filter: filter.to_string(),
            window: *window,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.scripts.get(metric_type_of(filter)) {
            Some(Script::Series(series)) => Ok(series.clone()),
            Some(Script::Fail(detail)) => Err(MetricsServiceError::backend(
                Backend::Monitoring,
                detail.clone(),
            )),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Default)]
pub struct ScriptedInventory {
    instances: Vec<Instance>,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedInventory {
    pub fn new(instances: Vec<Instance>) -> Self {
        Self {
            instances,
            ..Default::default()
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            failure: Some(detail.to_string()),
            ..Default::default()
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl InventoryBackend for ScriptedInventory {
    async fn list_instances(&self, project_id: &str, zone: &str) -> Result<Vec<Instance>> {
        self.calls
            .lock()
            .unwrap()
            .push((project_id.to_string(), zone.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.failure {
            Some(detail) => Err(MetricsServiceError::backend(
                Backend::Inventory,
                detail.clone(),
            )),
            None => Ok(self.instances.clone()),
        }
    }
}

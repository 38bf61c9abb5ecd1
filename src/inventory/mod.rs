//! Instance inventory for a zone.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::models::{InstanceRecord, Scope};
use crate::wire::deserialize_id;
use crate::Result;

pub mod client;

pub use client::HttpInventoryClient;

/// One entry of a Compute Engine `instances.list` page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    /// Fully qualified machine type URL.
    #[serde(default)]
    pub machine_type: String,
}

#[async_trait]
pub trait InventoryBackend: Send + Sync {
    async fn list_instances(&self, project_id: &str, zone: &str) -> Result<Vec<Instance>>;
}

/// Last path segment of a machine type reference,
/// e.g. `.../zones/us-central1-a/machineTypes/e2-medium` -> `e2-medium`.
pub fn machine_type_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl From<Instance> for InstanceRecord {
    fn from(instance: Instance) -> Self {
        let machine_type = machine_type_name(&instance.machine_type).to_string();
        InstanceRecord {
            id: instance.id,
            name: instance.name,
            machine_type,
        }
    }
}

pub struct InstanceDirectory {
    backend: Arc<dyn InventoryBackend>,
}

impl InstanceDirectory {
    pub fn new(backend: Arc<dyn InventoryBackend>) -> Self {
        Self { backend }
    }

    /// Lists the zone's instances keyed by instance id.
    #[instrument(skip(self), fields(project_id = %scope.project_id, zone = %scope.zone))]
    pub async fn list(&self, scope: &Scope) -> Result<BTreeMap<String, InstanceRecord>> {
        let instances = self
            .backend
            .list_instances(&scope.project_id, &scope.zone)
            .await?;

        let records: BTreeMap<String, InstanceRecord> = instances
            .into_iter()
            .map(InstanceRecord::from)
            .map(|record| (record.id.clone(), record))
            .collect();

        info!(instances = records.len(), "Listed instances");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{instance, ScriptedInventory};
    use crate::MetricsServiceError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_machine_type_name() {
        assert_eq!(
            machine_type_name(
                "https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a/machineTypes/e2-medium"
            ),
            "e2-medium"
        );
        assert_eq!(
            machine_type_name("zones/us-central1-a/machineTypes/n2-standard-4"),
            "n2-standard-4"
        );
        assert_eq!(machine_type_name("e2-small"), "e2-small");
        assert_eq!(machine_type_name(""), "");
    }

    #[tokio::test]
    async fn test_list_extracts_records() {
        let backend = Arc::new(ScriptedInventory::new(vec![
            instance("7", "web-1", "e2-medium"),
            instance("8", "db-1", "n2-highmem-8"),
        ]));
        let directory = InstanceDirectory::new(backend.clone());
        let scope = Scope::new("proj", "us-central1-a").unwrap();

        let records = directory.list(&scope).await.unwrap();

        assert_eq!(
            records.get("7"),
            Some(&InstanceRecord {
                id: "7".to_string(),
                name: "web-1".to_string(),
                machine_type: "e2-medium".to_string(),
            })
        );
        assert_eq!(records["8"].machine_type, "n2-highmem-8");
        assert_eq!(
            backend.calls(),
            vec![("proj".to_string(), "us-central1-a".to_string())]
        );
    }

    #[tokio::test]
    async fn test_list_failure_propagates() {
        let directory = InstanceDirectory::new(Arc::new(ScriptedInventory::failing("forbidden")));
        let scope = Scope::new("proj", "us-central1-a").unwrap();

        let err = directory.list(&scope).await.unwrap_err();
        assert!(matches!(err, MetricsServiceError::BackendQuery { .. }));
    }

    #[test]
    fn test_decode_instance() {
        let instance: Instance = serde_json::from_str(
            r#"{
                "kind": "compute#instance",
                "id": "4567890123456789",
                "name": "worker-3",
                "machineType": "https://www.googleapis.com/compute/v1/projects/p/zones/z/machineTypes/e2-standard-2",
                "status": "RUNNING"
            }"#,
        )
        .unwrap();

        assert_eq!(instance.id, "4567890123456789");
        assert_eq!(InstanceRecord::from(instance).machine_type, "e2-standard-2");
    }
}

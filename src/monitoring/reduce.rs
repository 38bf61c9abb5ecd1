use crate::error::Backend;
use crate::models::InstanceValues;
use crate::{MetricsServiceError, Result};

use super::{normalize, TimeSeries};

/// Folds every sample of every series into one maximum per instance.
///
/// Each accumulator starts at 0, so the result is never negative. Series
/// sharing an instance id (one per attached disk, say) fold into the same
/// accumulator. An instance contributes an entry only if at least one
/// sample was returned for it.
pub fn reduce<'a, I>(series: I) -> Result<InstanceValues>
where
    I: IntoIterator<Item = &'a TimeSeries>,
{
    let mut values = InstanceValues::new();

    for ts in series {
        let instance_id = ts.instance_id().ok_or_else(|| {
            MetricsServiceError::backend(
                Backend::Monitoring,
                format!(
                    "series for resource type '{}' has no instance_id label",
                    ts.resource.resource_type
                ),
            )
        })?;

        if ts.points.is_empty() {
            continue;
        }

        let max = values.entry(instance_id.to_string()).or_insert(0.0);
        for point in &ts.points {
            *max = max.max(normalize(&point.value));
        }
    }

    Ok(values)
}

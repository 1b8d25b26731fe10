//! Resource models exchanged with the model-test data service

mod campaign;
mod floater_config;
mod sensor;
mod tag;
mod timeseries;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ModelResult;
use crate::query::Field;

pub use campaign::Campaign;
pub use floater_config::FloaterConfig;
pub use sensor::{PositionReference, Sensor, SensorKind};
pub use tag::{Tag, TagTarget};
pub use test::{FloaterTest, Test, TestBase, TestHeader, TestKind, WaveCalibration, WindCalibration};
pub use timeseries::{DataEnvelope, DataPoints, DataSummary, Statistics, Timeseries};

/// Server-assigned identity
pub type Id = i64;

/// A record kind stored by the service
///
/// Identity is assigned by the server: a record whose [`Resource::id`] is
/// `None` has not been persisted yet.
pub trait Resource:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Attribute namespace accepted by `filter_by` / `sort_by`
    type Field: Field;

    /// Collection path segment (e.g. "sensor")
    const PATH: &'static str;

    fn id(&self) -> Option<Id>;

    /// Read-only records reject update/delete without an administrative key
    fn read_only(&self) -> bool {
        false
    }

    /// Client-side validation run before create/update
    fn validate(&self) -> ModelResult<()> {
        Ok(())
    }

    /// Path this particular record is created/updated under
    fn endpoint(&self) -> &'static str {
        Self::PATH
    }

    /// Build a record of the same kind from a server response
    fn hydrate(&self, value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

/// Resources carrying a human-readable name
pub trait Named: Resource {
    /// Attribute the name is filtered on
    const NAME_FIELD: Self::Field;

    fn name(&self) -> &str;
}

/// Resources identified by a run number within a campaign
pub trait Numbered: Resource {
    const NUMBER_FIELD: Self::Field;

    fn number(&self) -> &str;
}

pub(crate) fn require_positive(
    resource: &'static str,
    field: &'static str,
    value: f64,
) -> ModelResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(crate::ModelError::validation(
            resource,
            field,
            format!("must be positive, got {}", value),
        ))
    }
}

pub(crate) fn require_non_negative(
    resource: &'static str,
    field: &'static str,
    value: f64,
) -> ModelResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(crate::ModelError::validation(
            resource,
            field,
            format!("must be zero or positive, got {}", value),
        ))
    }
}

pub(crate) fn require_non_empty(
    resource: &'static str,
    field: &'static str,
    value: &str,
) -> ModelResult<()> {
    if value.trim().is_empty() {
        Err(crate::ModelError::validation(resource, field, "must not be empty"))
    } else {
        Ok(())
    }
}

//! Sensor model

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{require_non_empty, require_positive, Id, Named, Resource};
use crate::error::ModelResult;
use crate::query::fields::SensorField;

/// Physical quantity measured by a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Length,
    Velocity,
    Acceleration,
    Force,
    Pressure,
    Volume,
    Mass,
    Moment,
    Angle,
    #[serde(rename = "angular velocity")]
    AngularVelocity,
    #[serde(rename = "angular acceleration")]
    AngularAcceleration,
    #[serde(rename = "slamming force")]
    SlammingForce,
    #[serde(rename = "slamming pressure")]
    SlammingPressure,
    #[serde(rename = "control signal")]
    ControlSignal,
    Rate,
}

impl SensorKind {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Velocity => "velocity",
            Self::Acceleration => "acceleration",
            Self::Force => "force",
            Self::Pressure => "pressure",
            Self::Volume => "volume",
            Self::Mass => "mass",
            Self::Moment => "moment",
            Self::Angle => "angle",
            Self::AngularVelocity => "angular velocity",
            Self::AngularAcceleration => "angular acceleration",
            Self::SlammingForce => "slamming force",
            Self::SlammingPressure => "slamming pressure",
            Self::ControlSignal => "control signal",
            Self::Rate => "rate",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinate system a sensor position is given in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionReference {
    Local,
    Global,
}

impl fmt::Display for PositionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Global => f.write_str("global"),
        }
    }
}

/// A measurement channel with a fixed position and physical kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub campaign_id: Id,
    pub kind: SensorKind,
    pub unit: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: Option<f64>,
    pub position_reference: PositionReference,
    #[serde(default)]
    pub position_heading_lock: bool,
    #[serde(default)]
    pub position_draft_lock: bool,
    /// Free-text convention, e.g. "positive upwards"
    #[serde(default)]
    pub positive_direction_definition: Option<String>,
    /// Reference area for pressure-integrated sensors [m^2]
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub read_only: bool,
}

impl Sensor {
    pub fn new(
        name: impl Into<String>,
        campaign_id: Id,
        kind: SensorKind,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            campaign_id,
            kind,
            unit: unit.into(),
            x: 0.0,
            y: 0.0,
            z: None,
            position_reference: PositionReference::Global,
            position_heading_lock: false,
            position_draft_lock: false,
            positive_direction_definition: None,
            area: None,
            read_only: false,
        }
    }

    pub fn at(mut self, x: f64, y: f64, z: Option<f64>, reference: PositionReference) -> Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self.position_reference = reference;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }
}

impl Resource for Sensor {
    type Field = SensorField;
    const PATH: &'static str = "sensor";

    fn id(&self) -> Option<Id> {
        self.id
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    fn validate(&self) -> ModelResult<()> {
        require_non_empty("sensor", "name", &self.name)?;
        if let Some(area) = self.area {
            require_positive("sensor", "area", area)?;
        }
        Ok(())
    }
}

impl Named for Sensor {
    const NAME_FIELD: SensorField = SensorField::Name;

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        let kind: SensorKind = serde_json::from_str("\"angular velocity\"").unwrap();
        assert_eq!(kind, SensorKind::AngularVelocity);
        assert_eq!(
            serde_json::to_string(&SensorKind::SlammingPressure).unwrap(),
            "\"slamming pressure\""
        );
        assert_eq!(SensorKind::ControlSignal.to_string(), "control signal");
        assert!(serde_json::from_str::<SensorKind>("\"temperature\"").is_err());
    }

    #[test]
    fn test_deserialize_without_z() {
        let json = serde_json::json!({
            "id": 11,
            "name": "M206_heave",
            "campaign_id": 1,
            "kind": "length",
            "unit": "m",
            "x": 0.0,
            "y": 0.0,
            "position_reference": "local",
            "position_heading_lock": true,
            "position_draft_lock": false
        });
        let sensor: Sensor = serde_json::from_value(json).unwrap();
        assert_eq!(sensor.z, None);
        assert_eq!(sensor.position_reference, PositionReference::Local);
        assert!(sensor.position_heading_lock);
    }

    #[test]
    fn test_validate_area() {
        let sensor = Sensor::new("p1", 1, SensorKind::Pressure, "Pa").with_area(0.0);
        assert!(sensor.validate().is_err());
        let sensor = Sensor::new("p1", 1, SensorKind::Pressure, "Pa").with_area(0.01);
        assert!(sensor.validate().is_ok());
    }
}

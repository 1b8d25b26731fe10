//! Campaign model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{require_non_empty, require_non_negative, require_positive, Id, Named, Resource};
use crate::error::ModelResult;
use crate::query::fields::CampaignField;

/// A model-test measurement program at one facility and scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    /// Unique within the service
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    /// Full-scale to model-scale length ratio
    pub scale_factor: f64,
    /// Basin water depth at model scale [m]
    pub water_depth: f64,
    #[serde(default)]
    pub read_only: bool,
}

impl Campaign {
    pub fn new(name: impl Into<String>, scale_factor: f64, water_depth: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            location: None,
            date: None,
            scale_factor,
            water_depth,
            read_only: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDateTime) -> Self {
        self.date = Some(date);
        self
    }

    /// Water depth at full scale
    pub fn full_scale_water_depth(&self) -> f64 {
        self.water_depth * self.scale_factor
    }
}

impl Resource for Campaign {
    type Field = CampaignField;
    const PATH: &'static str = "campaign";

    fn id(&self) -> Option<Id> {
        self.id
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    fn validate(&self) -> ModelResult<()> {
        require_non_empty("campaign", "name", &self.name)?;
        require_positive("campaign", "scale_factor", self.scale_factor)?;
        require_non_negative("campaign", "water_depth", self.water_depth)
    }
}

impl Named for Campaign {
    const NAME_FIELD: CampaignField = CampaignField::Name;

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelError;

    #[test]
    fn test_deserialize_server_record() {
        let json = serde_json::json!({
            "id": 3,
            "name": "Floating wind 2021",
            "description": "Semi-submersible",
            "location": "Basin A",
            "date": "2021-03-01T00:00:00",
            "scale_factor": 40.0,
            "water_depth": 2.5
        });

        let campaign: Campaign = serde_json::from_value(json).unwrap();
        assert_eq!(campaign.id, Some(3));
        assert!(!campaign.read_only);
        assert_eq!(campaign.full_scale_water_depth(), 100.0);
        assert!(campaign.validate().is_ok());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let json = serde_json::json!({ "name": "x", "water_depth": 1.0 });
        let err = serde_json::from_value::<Campaign>(json).unwrap_err();
        assert!(err.to_string().contains("scale_factor"));
    }

    #[test]
    fn test_new_campaign_omits_id() {
        let campaign = Campaign::new("c", 50.0, 1.0);
        let json = serde_json::to_value(&campaign).unwrap();
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_validate_scale_factor() {
        let err = Campaign::new("c", 0.0, 1.0).validate().unwrap_err();
        assert!(matches!(
            err,
            ModelError::Validation {
                field: "scale_factor",
                ..
            }
        ));
        assert!(Campaign::new(" ", 10.0, 1.0).validate().is_err());
        assert!(Campaign::new("c", 10.0, -1.0).validate().is_err());
    }
}

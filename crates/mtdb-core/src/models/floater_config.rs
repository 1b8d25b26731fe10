//! Floater configuration model

use serde::{Deserialize, Serialize};

use super::{require_non_empty, require_non_negative, require_positive, Id, Named, Resource};
use crate::error::ModelResult;
use crate::query::fields::FloaterConfigField;

/// Mass/ballast configuration of the floater used in a set of tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloaterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub campaign_id: Id,
    /// Reference length used for Froude-scaled statistics [m]
    pub characteristic_length: f64,
    pub draft: f64,
}

impl FloaterConfig {
    pub fn new(
        name: impl Into<String>,
        campaign_id: Id,
        characteristic_length: f64,
        draft: f64,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            campaign_id,
            characteristic_length,
            draft,
        }
    }
}

impl Resource for FloaterConfig {
    type Field = FloaterConfigField;
    const PATH: &'static str = "floaterconfig";

    fn id(&self) -> Option<Id> {
        self.id
    }

    fn validate(&self) -> ModelResult<()> {
        require_non_empty("floaterconfig", "name", &self.name)?;
        require_positive(
            "floaterconfig",
            "characteristic_length",
            self.characteristic_length,
        )?;
        require_non_negative("floaterconfig", "draft", self.draft)
    }
}

impl Named for FloaterConfig {
    const NAME_FIELD: FloaterConfigField = FloaterConfigField::Name;

    fn name(&self) -> &str {
        &self.name
    }
}

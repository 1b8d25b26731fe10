//! Tag model

use serde::{Deserialize, Serialize};

use super::{require_non_empty, Id, Named, Resource};
use crate::error::{ModelError, ModelResult};
use crate::query::fields::TagField;

/// The single entity a tag annotates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagTarget {
    Sensor(Id),
    Test(Id),
    Timeseries(Id),
}

/// A named annotation on exactly one sensor, test or time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub sensor_id: Option<Id>,
    #[serde(default)]
    pub test_id: Option<Id>,
    #[serde(default)]
    pub timeseries_id: Option<Id>,
}

impl Tag {
    pub fn new(name: impl Into<String>, target: TagTarget) -> Self {
        let mut tag = Self {
            id: None,
            name: name.into(),
            comment: None,
            sensor_id: None,
            test_id: None,
            timeseries_id: None,
        };
        match target {
            TagTarget::Sensor(id) => tag.sensor_id = Some(id),
            TagTarget::Test(id) => tag.test_id = Some(id),
            TagTarget::Timeseries(id) => tag.timeseries_id = Some(id),
        }
        tag
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The annotated entity, `None` unless exactly one target is set
    pub fn target(&self) -> Option<TagTarget> {
        match (self.sensor_id, self.test_id, self.timeseries_id) {
            (Some(id), None, None) => Some(TagTarget::Sensor(id)),
            (None, Some(id), None) => Some(TagTarget::Test(id)),
            (None, None, Some(id)) => Some(TagTarget::Timeseries(id)),
            _ => None,
        }
    }
}

impl Resource for Tag {
    type Field = TagField;
    const PATH: &'static str = "tag";

    fn id(&self) -> Option<Id> {
        self.id
    }

    fn validate(&self) -> ModelResult<()> {
        require_non_empty("tag", "name", &self.name)?;
        if self.target().is_none() {
            return Err(ModelError::validation(
                "tag",
                "sensor_id",
                "exactly one of sensor_id, test_id, timeseries_id must be set",
            ));
        }
        Ok(())
    }
}

impl Named for Tag {
    const NAME_FIELD: TagField = TagField::Name;

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_target() {
        let tag = Tag::new("bad_data", TagTarget::Timeseries(5)).with_comment("clipped");
        assert_eq!(tag.target(), Some(TagTarget::Timeseries(5)));
        assert!(tag.validate().is_ok());

        let mut both = tag.clone();
        both.sensor_id = Some(1);
        assert_eq!(both.target(), None);
        assert!(both.validate().is_err());

        let mut none = tag;
        none.timeseries_id = None;
        assert!(none.validate().is_err());
    }
}

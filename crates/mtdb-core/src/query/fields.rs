//! Per-resource attribute namespaces
//!
//! Each enum lists the attributes the server accepts in `filter_by` and
//! `sort_by` for one resource kind. A misspelled attribute is a compile error,
//! and a misspelled attribute name arriving as a string fails in `FromStr`.

use std::fmt;
use std::str::FromStr;

use super::{Field, Filter, FilterOp, Sort, SortOp};
use crate::error::ModelError;

macro_rules! resource_fields {
    (
        $(#[$meta:meta])*
        $name:ident => $resource:literal {
            $($variant:ident => $attr:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// `attribute == val`
            pub fn eq(self, val: impl fmt::Display) -> Filter<Self> {
                Filter::new(self, FilterOp::Eq, val)
            }

            /// `attribute < val`
            pub fn lt(self, val: impl fmt::Display) -> Filter<Self> {
                Filter::new(self, FilterOp::Lt, val)
            }

            /// `attribute <= val`
            pub fn lte(self, val: impl fmt::Display) -> Filter<Self> {
                Filter::new(self, FilterOp::Lte, val)
            }

            /// `attribute > val`
            pub fn gt(self, val: impl fmt::Display) -> Filter<Self> {
                Filter::new(self, FilterOp::Gt, val)
            }

            /// `attribute >= val`
            pub fn gte(self, val: impl fmt::Display) -> Filter<Self> {
                Filter::new(self, FilterOp::Gte, val)
            }

            /// `attribute` contains `val`
            pub fn contains(self, val: impl fmt::Display) -> Filter<Self> {
                Filter::new(self, FilterOp::Contains, val)
            }

            pub fn asc(self) -> Sort<Self> {
                Sort::new(self, SortOp::Asc)
            }

            pub fn ascending(self) -> Sort<Self> {
                self.asc()
            }

            pub fn desc(self) -> Sort<Self> {
                Sort::new(self, SortOp::Desc)
            }

            pub fn descending(self) -> Sort<Self> {
                self.desc()
            }
        }

        impl Field for $name {
            const RESOURCE: &'static str = $resource;

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $attr),+
                }
            }

            fn all() -> &'static [Self] {
                Self::ALL
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, ModelError> {
                <Self as Field>::parse(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

resource_fields! {
    /// Queryable attributes of a campaign
    CampaignField => "campaign" {
        Id => "id",
        Name => "name",
        Description => "description",
        Location => "location",
        Date => "date",
        ScaleFactor => "scale_factor",
        WaterDepth => "water_depth",
        ReadOnly => "read_only",
    }
}

resource_fields! {
    /// Queryable attributes of a sensor
    SensorField => "sensor" {
        Id => "id",
        Name => "name",
        Description => "description",
        CampaignId => "campaign_id",
        Kind => "kind",
        Unit => "unit",
        X => "x",
        Y => "y",
        Z => "z",
        PositionReference => "position_reference",
        PositionHeadingLock => "position_heading_lock",
        PositionDraftLock => "position_draft_lock",
        PositiveDirectionDefinition => "positive_direction_definition",
        Area => "area",
        ReadOnly => "read_only",
    }
}

resource_fields! {
    /// Queryable attributes shared by every test kind
    TestField => "test" {
        Id => "id",
        Number => "number",
        Description => "description",
        TestDate => "test_date",
        CampaignId => "campaign_id",
        Type => "type",
        ReadOnly => "read_only",
    }
}

resource_fields! {
    /// Queryable attributes of a floater test
    FloaterTestField => "floater" {
        Id => "id",
        Number => "number",
        Description => "description",
        TestDate => "test_date",
        CampaignId => "campaign_id",
        ReadOnly => "read_only",
        Category => "category",
        Orientation => "orientation",
        FloaterConfigId => "floaterconfig_id",
        WaveId => "wave_id",
        WindId => "wind_id",
    }
}

resource_fields! {
    /// Queryable attributes of a wave calibration
    WaveCalibrationField => "wavecalibration" {
        Id => "id",
        Number => "number",
        Description => "description",
        TestDate => "test_date",
        CampaignId => "campaign_id",
        ReadOnly => "read_only",
        WaveSpectrum => "wave_spectrum",
        WaveHeight => "wave_height",
        WavePeriod => "wave_period",
        Gamma => "gamma",
        WaveDirection => "wave_direction",
        CurrentVelocity => "current_velocity",
        CurrentDirection => "current_direction",
    }
}

resource_fields! {
    /// Queryable attributes of a wind calibration
    WindCalibrationField => "windcalibration" {
        Id => "id",
        Number => "number",
        Description => "description",
        TestDate => "test_date",
        CampaignId => "campaign_id",
        ReadOnly => "read_only",
        WindSpectrum => "wind_spectrum",
        WindVelocity => "wind_velocity",
        Zref => "zref",
        WindDirection => "wind_direction",
    }
}

resource_fields! {
    /// Queryable attributes of a time series
    TimeseriesField => "timeseries" {
        Id => "id",
        SensorId => "sensor_id",
        TestId => "test_id",
        Fs => "fs",
        Intermittent => "intermittent",
        DefaultStartTime => "default_start_time",
        DefaultEndTime => "default_end_time",
        ReadOnly => "read_only",
    }
}

resource_fields! {
    /// Queryable attributes of a tag
    TagField => "tag" {
        Id => "id",
        Name => "name",
        Comment => "comment",
        SensorId => "sensor_id",
        TestId => "test_id",
        TimeseriesId => "timeseries_id",
    }
}

resource_fields! {
    /// Queryable attributes of a floater configuration
    FloaterConfigField => "floaterconfig" {
        Id => "id",
        Name => "name",
        Description => "description",
        CampaignId => "campaign_id",
        CharacteristicLength => "characteristic_length",
        Draft => "draft",
    }
}

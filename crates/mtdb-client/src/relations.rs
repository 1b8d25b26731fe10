//! Relationship traversal from hydrated records
//!
//! Each accessor issues a fresh request through the client the record was
//! fetched with. Nothing is memoized beyond what the data cache holds.

use mtdb_core::query::fields::{
    FloaterConfigField, SensorField, TagField, TestField, TimeseriesField,
};
use mtdb_core::query::Query;
use mtdb_core::{
    Campaign, DataPoints, FloaterConfig, FloaterTest, Sensor, Statistics, Tag, Test, Timeseries,
    WaveCalibration, WindCalibration,
};

use crate::api::{DataRequest, StatisticsRequest};
use crate::collection::{Collection, Record};
use crate::error::Result;

impl Record<Campaign> {
    pub async fn sensors(&self) -> Result<Collection<Sensor>> {
        let id = self.require_id()?;
        self.client()?
            .sensors()
            .get(&Query::new().filter(SensorField::CampaignId.eq(id)))
            .await
    }

    pub async fn tests(&self) -> Result<Collection<Test>> {
        let id = self.require_id()?;
        self.client()?
            .tests()
            .get(&Query::new().filter(TestField::CampaignId.eq(id)))
            .await
    }

    pub async fn floater_configs(&self) -> Result<Collection<FloaterConfig>> {
        let id = self.require_id()?;
        self.client()?
            .floater_configs()
            .get(&Query::new().filter(FloaterConfigField::CampaignId.eq(id)))
            .await
    }
}

impl Record<Sensor> {
    pub async fn campaign(&self) -> Result<Record<Campaign>> {
        self.client()?.campaigns().get_by_id(self.campaign_id).await
    }

    /// Every time series recorded by this sensor
    pub async fn timeseries(&self) -> Result<Collection<Timeseries>> {
        let id = self.require_id()?;
        self.client()?
            .timeseries()
            .get(&Query::new().filter(TimeseriesField::SensorId.eq(id)))
            .await
    }

    pub async fn tags(&self) -> Result<Collection<Tag>> {
        let id = self.require_id()?;
        self.client()?
            .tags()
            .get(&Query::new().filter(TagField::SensorId.eq(id)))
            .await
    }
}

impl Record<Test> {
    pub async fn campaign(&self) -> Result<Record<Campaign>> {
        self.client()?.campaigns().get_by_id(self.campaign_id()).await
    }

    /// Every time series recorded during this test
    pub async fn timeseries(&self) -> Result<Collection<Timeseries>> {
        let id = self.require_id()?;
        self.client()?
            .timeseries()
            .get(&Query::new().filter(TimeseriesField::TestId.eq(id)))
            .await
    }

    pub async fn tags(&self) -> Result<Collection<Tag>> {
        let id = self.require_id()?;
        self.client()?
            .tags()
            .get(&Query::new().filter(TagField::TestId.eq(id)))
            .await
    }
}

impl Record<FloaterTest> {
    pub async fn campaign(&self) -> Result<Record<Campaign>> {
        self.client()?
            .campaigns()
            .get_by_id(self.test.campaign_id)
            .await
    }

    /// Floater configuration installed during the test, if recorded
    pub async fn floater_config(&self) -> Result<Option<Record<FloaterConfig>>> {
        let Some(id) = self.floaterconfig_id else {
            return Ok(None);
        };
        self.client()?.floater_configs().get_by_id(id).await.map(Some)
    }

    /// Wave calibration the test condition was taken from
    pub async fn wave_calibration(&self) -> Result<Option<Record<WaveCalibration>>> {
        let Some(id) = self.wave_id else {
            return Ok(None);
        };
        self.client()?.wave_calibrations().get_by_id(id).await.map(Some)
    }

    /// Wind calibration the test condition was taken from
    pub async fn wind_calibration(&self) -> Result<Option<Record<WindCalibration>>> {
        let Some(id) = self.wind_id else {
            return Ok(None);
        };
        self.client()?.wind_calibrations().get_by_id(id).await.map(Some)
    }
}

impl Record<Timeseries> {
    pub async fn sensor(&self) -> Result<Record<Sensor>> {
        self.client()?.sensors().get_by_id(self.sensor_id).await
    }

    pub async fn test(&self) -> Result<Record<Test>> {
        self.client()?.tests().get_by_id(self.test_id).await
    }

    pub async fn data(&self, request: &DataRequest, use_cache: bool) -> Result<DataPoints> {
        let id = self.require_id()?;
        self.client()?.timeseries().get_data(id, request, use_cache).await
    }

    pub async fn statistics(
        &self,
        request: &StatisticsRequest,
        use_cache: bool,
    ) -> Result<Statistics> {
        let id = self.require_id()?;
        self.client()?
            .timeseries()
            .get_statistics(id, request, use_cache)
            .await
    }

    pub async fn tags(&self) -> Result<Collection<Tag>> {
        let id = self.require_id()?;
        self.client()?
            .tags()
            .get(&Query::new().filter(TagField::TimeseriesId.eq(id)))
            .await
    }
}

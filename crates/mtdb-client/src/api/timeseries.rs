//! Time series and their sampled data

use std::ops::Deref;

use mtdb_core::query::fields::TimeseriesField;
use mtdb_core::query::Query;
use mtdb_core::{DataEnvelope, DataPoints, Id, Resource, Statistics, Timeseries};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::resource::{parse_error, ResourceApi};
use crate::client::MtdbClient;
use crate::collection::Record;
use crate::error::Result;
use crate::transport::Params;

/// Parameters of a data read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataRequest {
    /// Window start [s]
    pub start_time: Option<f64>,
    /// Window end [s]
    pub end_time: Option<f64>,
    /// Length scale for server-side Froude scaling to full scale
    pub scaling_length: Option<f64>,
    /// Return the whole series instead of its default analysis window
    pub all_data: bool,
}

impl DataRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(mut self, start: f64, end: f64) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn scaling_length(mut self, lambda: f64) -> Self {
        self.scaling_length = Some(lambda);
        self
    }

    pub fn all_data(mut self) -> Self {
        self.all_data = true;
        self
    }

    fn params(&self) -> Params {
        vec![
            ("start_time", self.start_time.map(|v| v.to_string())),
            ("end_time", self.end_time.map(|v| v.to_string())),
            ("scaling_length", self.scaling_length.map(|v| v.to_string())),
            ("all_data", self.all_data.then(|| "true".to_string())),
        ]
    }
}

/// Parameters of a statistics read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsRequest {
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub scaling_length: Option<f64>,
}

impl StatisticsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(mut self, start: f64, end: f64) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn scaling_length(mut self, lambda: f64) -> Self {
        self.scaling_length = Some(lambda);
        self
    }

    fn params(&self) -> Params {
        vec![
            ("start_time", self.start_time.map(|v| v.to_string())),
            ("end_time", self.end_time.map(|v| v.to_string())),
            ("scaling_length", self.scaling_length.map(|v| v.to_string())),
        ]
    }
}

/// Time-series CRUD plus the data and statistics endpoints
///
/// Dereferences to [`ResourceApi<Timeseries>`] for the generic operations.
#[derive(Clone)]
pub struct TimeseriesApi {
    resource: ResourceApi<Timeseries>,
}

impl Deref for TimeseriesApi {
    type Target = ResourceApi<Timeseries>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

impl TimeseriesApi {
    pub(crate) fn new(client: MtdbClient) -> Self {
        Self {
            resource: ResourceApi::new(client),
        }
    }

    /// The time series recording `sensor_id` during `test_id`
    pub async fn get_by_sensor_and_test(
        &self,
        sensor_id: Id,
        test_id: Id,
    ) -> Result<Option<Record<Timeseries>>> {
        let query = Query::new()
            .filter(TimeseriesField::SensorId.eq(sensor_id))
            .filter(TimeseriesField::TestId.eq(test_id));
        self.get(&query).await?.into_scalar()
    }

    /// Sampled data of a series, served from the cache when `use_cache` is set
    #[instrument(skip(self))]
    pub async fn get_data(&self, id: Id, request: &DataRequest, use_cache: bool) -> Result<DataPoints> {
        let path = data_path(id);
        let value = self
            .client()
            .get_cached(&path, request.params(), use_cache)
            .await?;
        let envelope: DataEnvelope =
            serde_json::from_value(value).map_err(|e| parse_error(self.client(), &path, e))?;
        envelope.data.validate()?;
        Ok(envelope.data)
    }

    /// Server-computed statistics of a series
    #[instrument(skip(self))]
    pub async fn get_statistics(
        &self,
        id: Id,
        request: &StatisticsRequest,
        use_cache: bool,
    ) -> Result<Statistics> {
        let path = format!("{}/{}/statistics", Timeseries::PATH, id);
        let value = self
            .client()
            .get_cached(&path, request.params(), use_cache)
            .await?;
        serde_json::from_value(value).map_err(|e| parse_error(self.client(), &path, e))
    }

    /// Append samples to a series
    ///
    /// Every cached read of the series is dropped afterwards, whether or not
    /// the write succeeded.
    #[instrument(skip(self, data), fields(points = data.len()))]
    pub async fn add_data(&self, id: Id, data: &DataPoints) -> Result<()> {
        data.validate()?;
        let path = data_path(id);
        let params = vec![(
            "secret_key",
            self.client().transport().admin_key().map(str::to_string),
        )];
        let envelope = DataEnvelope { data: data.clone() };

        let result: Result<Value> = self.client().transport().post(&path, params, &envelope).await;
        self.client()
            .invalidate(&format!("{}/{}/", Timeseries::PATH, id));
        result?;
        debug!("Added {} points to timeseries {}", data.len(), id);
        Ok(())
    }
}

fn data_path(id: Id) -> String {
    format!("{}/{}/data", Timeseries::PATH, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_request_params() {
        let request = DataRequest::new().window(10.0, 20.5).scaling_length(50.0);
        assert_eq!(
            request.params(),
            vec![
                ("start_time", Some("10".to_string())),
                ("end_time", Some("20.5".to_string())),
                ("scaling_length", Some("50".to_string())),
                ("all_data", None),
            ]
        );
        assert_eq!(
            DataRequest::new().all_data().params()[3],
            ("all_data", Some("true".to_string()))
        );
    }

    #[test]
    fn test_statistics_request_params() {
        let params = StatisticsRequest::new().params();
        assert!(params.iter().all(|(_, v)| v.is_none()));
    }
}

//! Time series, sampled data and derived statistics

use serde::{Deserialize, Serialize};

use super::{require_positive, Id, Resource, SensorKind};
use crate::error::{ModelError, ModelResult};
use crate::query::fields::TimeseriesField;
use crate::scaling::FroudeScale;

/// One sensor measured during one test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeseries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub sensor_id: Id,
    pub test_id: Id,
    /// Sampling frequency [Hz]
    pub fs: f64,
    #[serde(default)]
    pub intermittent: bool,
    /// Start of the non-transient analysis window [s]
    #[serde(default)]
    pub default_start_time: Option<f64>,
    /// End of the non-transient analysis window [s]
    #[serde(default)]
    pub default_end_time: Option<f64>,
    #[serde(default)]
    pub read_only: bool,
}

impl Timeseries {
    pub fn new(sensor_id: Id, test_id: Id, fs: f64) -> Self {
        Self {
            id: None,
            sensor_id,
            test_id,
            fs,
            intermittent: false,
            default_start_time: None,
            default_end_time: None,
            read_only: false,
        }
    }

    pub fn with_window(mut self, start: f64, end: f64) -> Self {
        self.default_start_time = Some(start);
        self.default_end_time = Some(end);
        self
    }

    /// Time between two samples [s]
    pub fn sample_interval(&self) -> f64 {
        1.0 / self.fs
    }
}

impl Resource for Timeseries {
    type Field = TimeseriesField;
    const PATH: &'static str = "timeseries";

    fn id(&self) -> Option<Id> {
        self.id
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    fn validate(&self) -> ModelResult<()> {
        require_positive("timeseries", "fs", self.fs)?;
        if let (Some(start), Some(end)) = (self.default_start_time, self.default_end_time) {
            if start > end {
                return Err(ModelError::validation(
                    "timeseries",
                    "default_end_time",
                    format!("window end {} precedes start {}", end, start),
                ));
            }
        }
        Ok(())
    }
}

/// Samples of one time series as parallel time/value sequences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoints {
    pub time: Vec<f64>,
    pub value: Vec<f64>,
}

/// Wire body of the `/data` endpoints: `{"data": {"time": [...], "value": [...]}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope {
    pub data: DataPoints,
}

/// Local aggregate over a set of samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
}

impl DataPoints {
    /// Build from parallel sequences, rejecting mismatched or unordered input
    pub fn new(time: Vec<f64>, value: Vec<f64>) -> ModelResult<Self> {
        let points = Self { time, value };
        points.validate()?;
        Ok(points)
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.time.len() != self.value.len() {
            return Err(ModelError::validation(
                "data",
                "value",
                format!(
                    "{} values for {} time stamps",
                    self.value.len(),
                    self.time.len()
                ),
            ));
        }
        if self.time.windows(2).any(|w| w[1] < w[0]) {
            return Err(ModelError::validation(
                "data",
                "time",
                "time stamps must be non-decreasing",
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Span between first and last sample [s]
    pub fn duration(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Samples with `start <= t <= end`
    pub fn window(&self, start: Option<f64>, end: Option<f64>) -> Self {
        let start = start.unwrap_or(f64::NEG_INFINITY);
        let end = end.unwrap_or(f64::INFINITY);
        let (time, value) = self
            .time
            .iter()
            .zip(&self.value)
            .filter(|(t, _)| **t >= start && **t <= end)
            .map(|(t, v)| (*t, *v))
            .unzip();
        Self { time, value }
    }

    /// Min/max/mean/std of the values, `None` when empty
    pub fn summary(&self) -> Option<DataSummary> {
        if self.value.is_empty() {
            return None;
        }
        let n = self.value.len() as f64;
        let mean = self.value.iter().sum::<f64>() / n;
        let variance = self.value.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let (min, max) = self
            .value
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });

        Some(DataSummary {
            min,
            max,
            mean,
            std: variance.sqrt(),
        })
    }

    /// Multiply every value by `factor` (unit conversion)
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            time: self.time.clone(),
            value: self.value.iter().map(|v| v * factor).collect(),
        }
    }

    /// Convert model-scale samples of `kind` to full scale
    pub fn froude_scaled(&self, kind: SensorKind, scale: &FroudeScale) -> Self {
        let time_factor = scale.time_factor();
        let value_factor = scale.factor(kind);
        Self {
            time: self.time.iter().map(|t| t * time_factor).collect(),
            value: self.value.iter().map(|v| v * value_factor).collect(),
        }
    }
}

/// Server-computed statistics of a time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub std: f64,
    pub mean: f64,
    /// Spectral moments
    #[serde(default)]
    pub m0: Option<f64>,
    #[serde(default)]
    pub m1: Option<f64>,
    #[serde(default)]
    pub m2: Option<f64>,
    #[serde(default)]
    pub m4: Option<f64>,
    /// Peak period [s]
    #[serde(default)]
    pub tp: Option<f64>,
}

impl Statistics {
    /// Significant height `4 * sqrt(m0)`
    pub fn hm0(&self) -> Option<f64> {
        self.m0.map(|m0| 4.0 * m0.sqrt())
    }

    /// Mean zero-crossing period `sqrt(m0 / m2)`
    pub fn tz(&self) -> Option<f64> {
        match (self.m0, self.m2) {
            (Some(m0), Some(m2)) if m2 > 0.0 => Some((m0 / m2).sqrt()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_format() {
        let json = serde_json::json!({"data": {"time": [0.0, 0.1], "value": [1.0, 2.0]}});
        let envelope: DataEnvelope = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(envelope.data.len(), 2);
        assert_eq!(serde_json::to_value(&envelope).unwrap(), json);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        assert!(DataPoints::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(DataPoints::new(vec![1.0, 0.0], vec![1.0, 2.0]).is_err());
        assert!(DataPoints::new(vec![], vec![]).is_ok());
    }

    #[test]
    fn test_summary() {
        let points = DataPoints::new(vec![0.0, 1.0, 2.0, 3.0], vec![2.0, 4.0, 4.0, 6.0]).unwrap();
        let summary = points.summary().unwrap();
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 6.0);
        assert_eq!(summary.mean, 4.0);
        assert!((summary.std - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(points.duration(), 3.0);
        assert!(DataPoints::default().summary().is_none());
    }

    #[test]
    fn test_window() {
        let points = DataPoints::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 10.0, 20.0, 30.0]).unwrap();
        let window = points.window(Some(1.0), Some(2.0));
        assert_eq!(window.time, vec![1.0, 2.0]);
        assert_eq!(window.value, vec![10.0, 20.0]);
        assert_eq!(points.window(None, None), points);
    }

    #[test]
    fn test_froude_scaled_force() {
        let points = DataPoints::new(vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
        let full = points.froude_scaled(SensorKind::Force, &FroudeScale::new(4.0));
        assert_eq!(full.time, vec![0.0, 2.0]);
        assert!((full.value[0] - 64.0).abs() < 1e-9);
        assert!((full.value[1] - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_timeseries_window_validation() {
        let ts = Timeseries::new(1, 2, 100.0).with_window(50.0, 10.0);
        assert!(ts.validate().is_err());
        let ts = Timeseries::new(1, 2, 0.0);
        assert!(ts.validate().is_err());
        let ts = Timeseries::new(1, 2, 200.0).with_window(10.0, 50.0);
        assert!(ts.validate().is_ok());
        assert_eq!(ts.sample_interval(), 0.005);
    }

    #[test]
    fn test_statistics_derived() {
        let stats: Statistics = serde_json::from_value(serde_json::json!({
            "min": -1.0, "max": 1.0, "std": 0.5, "mean": 0.0,
            "m0": 0.25, "m1": 0.1, "m2": 0.0625, "m4": 0.01, "tp": 12.0
        }))
        .unwrap();
        assert_eq!(stats.hm0(), Some(2.0));
        assert_eq!(stats.tz(), Some(2.0));
    }
}

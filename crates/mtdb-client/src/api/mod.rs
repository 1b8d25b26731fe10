//! Per-resource APIs
//!
//! [`ResourceApi`] covers every resource with its own endpoint. Tests are
//! listed through a generic endpoint and hydrated per kind by [`TestApi`];
//! [`TimeseriesApi`] adds the data and statistics endpoints.

pub mod resource;
pub mod timeseries;

pub use resource::ResourceApi;
pub use test::TestApi;
pub use timeseries::{DataRequest, StatisticsRequest, TimeseriesApi};

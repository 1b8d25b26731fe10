//! mtdb-client - Client library for the model-test data service
//!
//! Provides typed, authenticated access to campaigns, sensors, tests, time
//! series and their sampled data.
//!
//! # Example
//!
//! ```ignore
//! use mtdb_client::{DataRequest, MtdbClient};
//! use mtdb_client::query::{fields::SensorField, Query};
//!
//! let client = MtdbClient::from_env()?;
//!
//! let campaign = client.campaigns().get_by_name("North Sea 2023").await?;
//! let probes = client
//!     .sensors()
//!     .get(&Query::new().filter(SensorField::Name.contains("wave probe")))
//!     .await?;
//!
//! for probe in &probes {
//!     for series in &probe.timeseries().await? {
//!         let data = series.data(&DataRequest::new().all_data(), true).await?;
//!         println!("{}: {} samples", probe.name, data.len());
//!     }
//! }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
mod relations;
pub mod testing;
pub mod transport;

pub use api::{DataRequest, ResourceApi, StatisticsRequest, TestApi, TimeseriesApi};
pub use cache::{clear_cache, CacheStats, DataCache};
pub use client::{ClientHandle, MtdbClient};
pub use collection::{Collection, Record};
pub use config::{ClientConfig, MatchPolicy};
pub use error::{ClientError, Result};

// Re-export core types for convenience
pub use mtdb_core::query;
pub use mtdb_core::scaling::FroudeScale;
pub use mtdb_core::*;

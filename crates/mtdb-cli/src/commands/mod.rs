//! Command implementations

pub mod cache;
pub mod data;
pub mod list;

pub use cache::{cache_clear, cache_info};
pub use data::{data, stats, DataArgs, WindowArgs};
pub use list::{list_campaigns, list_sensors, list_tests, list_timeseries, ListArgs};

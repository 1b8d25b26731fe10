//! mtdb-core - Resource models and query expressions for the model-test data service
//!
//! This crate holds everything that does not touch the network: the typed
//! records exchanged with the server, the per-resource attribute namespaces
//! used to build filter/sort predicates, and the codec that renders those
//! predicates into query parameters.
//!
//! # Example
//!
//! ```rust
//! use mtdb_core::query::Query;
//! use mtdb_core::query::fields::SensorField;
//!
//! let query = Query::new()
//!     .filter(SensorField::CampaignId.eq(4))
//!     .filter(SensorField::Name.contains("wave"))
//!     .sort(SensorField::Name.asc())
//!     .limit(50);
//!
//! let params = query.params();
//! assert_eq!(params.get("filter_by").map(String::as_str), Some("campaign_id[eq]=4,name[co]=wave"));
//! assert_eq!(params.get("sort_by").map(String::as_str), Some("asc(name)"));
//! ```

pub mod error;
pub mod models;
pub mod query;
pub mod scaling;

pub use error::{ModelError, ModelResult};
pub use models::*;

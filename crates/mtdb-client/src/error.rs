//! Error types for client operations

use mtdb_core::ModelError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// One entry of a 422 response body (`{"detail": [{"loc": [...], "msg": ...}]}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationDetail {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ValidationDetail {
    /// Name of the offending field (last string element of `loc`)
    pub fn field(&self) -> Option<&str> {
        self.loc.iter().rev().find_map(|l| l.as_str())
    }
}

fn summarize(details: &[ValidationDetail]) -> String {
    details
        .iter()
        .map(|d| {
            let loc: Vec<String> = d
                .loc
                .iter()
                .map(|l| match l {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            format!("{}: {}", loc.join("."), d.msg)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur during client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Client-side model or query error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Server rejected the request body (HTTP 422)
    #[error("Validation failed at {url}: {}", summarize(.details))]
    Validation {
        url: String,
        details: Vec<ValidationDetail>,
        body: String,
    },

    /// Credentials rejected or host not allow-listed (HTTP 401/403)
    #[error(
        "Access denied at {url} (HTTP {status}): {body}. \
         Ask a service administrator to grant access for these credentials and this host"
    )]
    Unauthorized {
        url: String,
        status: u16,
        body: String,
    },

    /// Internal server error (HTTP 500)
    #[error("Server error at {url}: {body} (see the server logs for details)")]
    Server { url: String, body: String },

    /// Any other non-success status
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// Transient status persisted through the whole retry budget
    #[error("HTTP {status} from {url} after {attempts} attempts: {body}")]
    RetriesExhausted {
        url: String,
        status: u16,
        attempts: u32,
        body: String,
    },

    /// No response received (connect failure or timeout) after all retries
    #[error("Connection to {url} failed after {attempts} attempts: {source}")]
    Connection {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// Request could not be sent for a non-transient reason
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failed to parse response
    #[error("Failed to parse response from {url}: {message}")]
    Parse { url: String, message: String },

    /// Failed to serialize a request body or model
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Test discriminator with no matching model
    #[error("Unknown test type: '{0}'")]
    UnknownTestType(String),

    /// Operation requires a server-assigned id
    #[error("{0} has no id; create it first")]
    NotPersisted(&'static str),

    /// Update/delete of a read-only record without an administrative key
    #[error("{resource} {id} is read-only; an administrative key is required to modify it")]
    ReadOnly { resource: &'static str, id: i64 },

    /// `scalar()` on a collection holding more than one element
    #[error("Expected at most one {resource}, found {count}")]
    NotScalar { resource: &'static str, count: usize },

    /// Several matches for a lookup under the strict match policy
    #[error("{count} {resource} records match {filter}")]
    Ambiguous {
        resource: &'static str,
        filter: String,
        count: usize,
    },

    /// The client a record was fetched with no longer exists
    #[error("Client has been dropped")]
    ClientDropped,

    /// Local data cache failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status carried by the error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Validation { .. } => Some(422),
            Self::Unauthorized { status, .. }
            | Self::Http { status, .. }
            | Self::RetriesExhausted { status, .. } => Some(*status),
            Self::Server { .. } => Some(500),
            _ => None,
        }
    }

    /// Whether the server answered 404
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Offending URL, if the error came from the transport
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Validation { url, .. }
            | Self::Unauthorized { url, .. }
            | Self::Server { url, .. }
            | Self::Http { url, .. }
            | Self::RetriesExhausted { url, .. }
            | Self::Connection { url, .. }
            | Self::Request { url, .. }
            | Self::Parse { url, .. } => Some(url),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_detail_field() {
        let detail: ValidationDetail = serde_json::from_value(serde_json::json!({
            "loc": ["body", "scale_factor"],
            "msg": "ensure this value is greater than 0",
            "type": "value_error.number.not_gt"
        }))
        .unwrap();
        assert_eq!(detail.field(), Some("scale_factor"));

        let err = ClientError::Validation {
            url: "http://h/api/v1/campaign".to_string(),
            details: vec![detail],
            body: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "Validation failed at http://h/api/v1/campaign: body.scale_factor: ensure this value is greater than 0"
        );
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.url(), Some("http://h/api/v1/campaign"));
    }

    #[test]
    fn test_status_classification() {
        let err = ClientError::Http {
            url: "u".to_string(),
            status: 404,
            body: "not found".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(ClientError::ClientDropped.status(), None);
    }
}

//! Error types for models and query expressions

use thiserror::Error;

/// Result type for model and query operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised before anything is sent to the server
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Attribute name is not part of the resource's query namespace
    #[error("unknown attribute '{name}' for resource '{resource}'")]
    UnknownAttribute {
        resource: &'static str,
        name: String,
    },

    /// Unknown filter or sort operator
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// Malformed filter/sort clause
    #[error("invalid clause '{clause}': {message}")]
    InvalidClause { clause: String, message: String },

    /// A field failed client-side validation
    #[error("invalid {resource}.{field}: {message}")]
    Validation {
        resource: &'static str,
        field: &'static str,
        message: String,
    },
}

impl ModelError {
    /// Create a validation error for a resource field
    pub fn validation(
        resource: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            resource,
            field,
            message: message.into(),
        }
    }
}

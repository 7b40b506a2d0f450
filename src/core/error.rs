//! Typed error handling for list-query validation
//!
//! Client mistakes are reported as a [`ValidationError`] carrying every
//! [`QueryViolation`] found in a single pass. Problems with a resource's own
//! whitelist are [`ConfigError`]s: those are programming errors, never part of
//! the client-facing taxonomy.
//!
//! # Example
//!
//! ```rust,ignore
//! use list_query::prelude::*;
//!
//! match validate(&raw, &config) {
//!     Ok(options) => run_query(options),
//!     Err(err) => {
//!         for violation in err.violations() {
//!             eprintln!("{}: {}", violation.field(), violation);
//!         }
//!     }
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The main error type surfaced at the HTTP boundary
#[derive(Debug, Error)]
pub enum QueryError {
    /// The client sent list parameters that break the resource whitelist
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A resource configuration is malformed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Anything else that should not happen in normal operation
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl QueryError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            QueryError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            QueryError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            QueryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::Validation(_) => "VALIDATION_ERROR",
            QueryError::Config(_) => "CONFIG_ERROR",
            QueryError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            QueryError::Validation(err) => {
                Some(serde_json::json!({ "fields": err.field_errors() }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Client violations
// =============================================================================

/// A single rejected list parameter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryViolation {
    /// A string parameter is longer than the resource allows
    #[error("'{field}' must not exceed {max} characters (actual: {actual})")]
    FieldTooLong {
        field: String,
        max: usize,
        actual: usize,
    },

    /// A value is not one of the enumerated choices (e.g. a sort key)
    #[error("'{field}' must be one of: {} (actual: {value})", .allowed.join(", "))]
    InvalidEnumValue {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    /// A filter names a field the resource does not allow filtering on
    #[error("filtering by '{name}' is not allowed (allowed: {})", .allowed.join(", "))]
    UnknownFilterField {
        param: String,
        name: String,
        allowed: Vec<String>,
    },

    /// An include names a relation the resource does not expose
    #[error("including '{value}' is not allowed (allowed: {})", .allowed.join(", "))]
    UnknownIncludeValue {
        param: String,
        value: String,
        allowed: Vec<String>,
    },

    /// A parameter has the wrong shape (e.g. a list where a string is expected)
    #[error("'{field}' must be {expected}")]
    InvalidType {
        field: String,
        expected: &'static str,
    },

    /// `page` / `per_page` is not a positive integer or is out of bounds
    #[error("'{field}' {message} (actual: {value})")]
    InvalidPagination {
        field: String,
        value: String,
        message: String,
    },
}

impl QueryViolation {
    /// The offending parameter, using bracket notation for nested keys
    pub fn field(&self) -> String {
        match self {
            QueryViolation::FieldTooLong { field, .. }
            | QueryViolation::InvalidEnumValue { field, .. }
            | QueryViolation::InvalidType { field, .. }
            | QueryViolation::InvalidPagination { field, .. } => field.clone(),
            QueryViolation::UnknownFilterField { param, name, .. } => {
                format!("{}[{}]", param, name)
            }
            QueryViolation::UnknownIncludeValue { param, .. } => param.clone(),
        }
    }

    /// Machine-readable reason code
    pub fn reason(&self) -> &'static str {
        match self {
            QueryViolation::FieldTooLong { .. } => "field_too_long",
            QueryViolation::InvalidEnumValue { .. } => "invalid_enum_value",
            QueryViolation::UnknownFilterField { .. } => "unknown_filter_field",
            QueryViolation::UnknownIncludeValue { .. } => "unknown_include_value",
            QueryViolation::InvalidType { .. } => "invalid_type",
            QueryViolation::InvalidPagination { .. } => "invalid_pagination",
        }
    }
}

/// A violation flattened for response bodies
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: &'static str,
    pub message: String,
}

impl From<&QueryViolation> for FieldError {
    fn from(violation: &QueryViolation) -> Self {
        Self {
            field: violation.field(),
            reason: violation.reason(),
            message: violation.to_string(),
        }
    }
}

/// Every violation found while validating one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<QueryViolation>,
}

impl ValidationError {
    /// Wrap a list of violations
    ///
    /// Returns `None` when the list is empty, so a `ValidationError` always
    /// describes at least one problem.
    pub fn from_violations(violations: Vec<QueryViolation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    pub fn violations(&self) -> &[QueryViolation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<QueryViolation> {
        self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Response-ready view of the violations
    pub fn field_errors(&self) -> Vec<FieldError> {
        self.violations.iter().map(FieldError::from).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(f, "Invalid list query: {}", msgs.join("; "))
    }
}

impl std::error::Error for ValidationError {}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to resource configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// A resource declares an unusable value
    #[error("Invalid value for '{field}' in resource '{resource}': {message}")]
    InvalidValue {
        resource: String,
        field: String,
        message: String,
    },

    /// No configuration registered under this resource name
    #[error("Unknown resource: {name}")]
    UnknownResource { name: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// IO error while reading configuration
    #[error("IO error: {message}")]
    IoError { message: String },
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" file '{}'", f))
        .unwrap_or_default()
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError {
            message: err.to_string(),
        }
    }
}

/// Convert from anyhow::Error at application edges
impl From<anyhow::Error> for QueryError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ConfigError>() {
            Ok(config) => QueryError::Config(config),
            Err(other) => QueryError::Internal(other.to_string()),
        }
    }
}

/// A specialized Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValidationError {
        ValidationError::from_violations(vec![
            QueryViolation::FieldTooLong {
                field: "search".to_string(),
                max: 255,
                actual: 300,
            },
            QueryViolation::UnknownFilterField {
                param: "filter".to_string(),
                name: "owner".to_string(),
                allowed: vec!["car_id".to_string()],
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_violations_are_not_an_error() {
        assert!(ValidationError::from_violations(vec![]).is_none());
    }

    #[test]
    fn test_validation_error_lists_every_field() {
        let display = sample().to_string();
        assert!(display.contains("search"));
        assert!(display.contains("owner"));
    }

    #[test]
    fn test_violation_field_uses_bracket_notation() {
        let err = sample();
        assert_eq!(err.violations()[1].field(), "filter[owner]");
        assert_eq!(err.violations()[1].reason(), "unknown_filter_field");
    }

    #[test]
    fn test_enum_violation_names_allowed_values() {
        let v = QueryViolation::InvalidEnumValue {
            field: "sort".to_string(),
            value: "price".to_string(),
            allowed: vec!["name".to_string(), "-name".to_string()],
        };
        let msg = v.to_string();
        assert!(msg.contains("price"));
        assert!(msg.contains("name, -name"));
    }

    #[test]
    fn test_validation_error_status_and_code() {
        let err: QueryError = sample().into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_error_response_carries_field_details() {
        let err: QueryError = sample().into();
        let response = err.to_response();
        let details = response.details.expect("details");
        assert_eq!(details["fields"].as_array().unwrap().len(), 2);
        assert_eq!(details["fields"][0]["reason"], "field_too_long");
        assert_eq!(details["fields"][1]["field"], "filter[owner]");
    }

    #[test]
    fn test_config_error_status() {
        let err: QueryError = ConfigError::UnknownResource {
            name: "boats".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_response().details.is_none());
        assert!(err.to_string().contains("boats"));
    }

    #[test]
    fn test_parse_error_mentions_file() {
        let err = ConfigError::ParseError {
            file: Some("resources.yaml".to_string()),
            message: "bad indent".to_string(),
        };
        assert!(err.to_string().contains("resources.yaml"));

        let err = ConfigError::ParseError {
            file: None,
            message: "bad indent".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to parse config: bad indent");
    }

    #[test]
    fn test_from_anyhow_keeps_config_errors() {
        let err: QueryError = anyhow::Error::new(ConfigError::FileNotFound {
            path: "x.yaml".to_string(),
        })
        .into();
        assert!(matches!(err, QueryError::Config(ConfigError::FileNotFound { .. })));

        let err: QueryError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, QueryError::Internal(_)));
    }
}

//! Error types for stream-notifier
//!
//! This module provides error handling for the library, including:
//! - The crate-wide [`Error`] and [`Result`] alias
//! - Soft-failure taxonomies for the metadata provider ([`ProviderError`]) and
//!   the notification sink ([`DeliveryError`]), which are recorded per item
//!   rather than aborting a reconciliation pass
//! - HTTP status code mapping and structured error bodies for the REST API

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for stream-notifier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for stream-notifier
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "provider.base_url")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error outside of a provider query or delivery
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Metadata provider query failed
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Notification delivery failed
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Item or record not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Item already on the watchlist
    #[error("duplicate item: {0}")]
    Duplicate(String),

    /// Item request is not valid
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// Push subscription is not usable
    #[error("invalid push subscription: {0}")]
    InvalidSubscription(String),

    /// Shutdown in progress - not accepting new work
    #[error("shutdown in progress: not accepting new work")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Stored row could not be decoded into a domain type
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// Failure of a single metadata provider query
///
/// Confined to the item being queried: the item keeps its last-known state
/// and the pass moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderError {
    /// Provider unreachable or returned a server-side error status
    #[error("transport error: {message}")]
    Transport {
        /// What went wrong
        message: String,
    },

    /// Response did not have the expected shape
    #[error("unexpected response format: {message}")]
    Format {
        /// What went wrong
        message: String,
    },

    /// Query did not complete in time
    #[error("query timed out after {millis}ms")]
    Timeout {
        /// Timeout that elapsed, in milliseconds
        millis: u64,
    },

    /// Provider refused the query (bad API key, unknown id)
    #[error("rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status returned by the provider
        status: u16,
        /// What was queried
        message: String,
    },
}

impl ProviderError {
    /// Transport failure with a message
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Format failure with a message
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Refusal with the provider's status
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Timeout after `elapsed`
    pub fn timeout(elapsed: Duration) -> Self {
        Self::Timeout {
            millis: elapsed.as_millis() as u64,
        }
    }
}

/// Failure to deliver one notification
///
/// Carries no retry obligation; the event stays fired.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryError {
    /// Relay or push service unreachable
    #[error("transport error: {message}")]
    Transport {
        /// What went wrong
        message: String,
    },

    /// Relay answered with a non-success status
    #[error("rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body (may be empty)
        body: String,
    },

    /// Delivery did not complete in time
    #[error("delivery timed out after {millis}ms")]
    Timeout {
        /// Timeout that elapsed, in milliseconds
        millis: u64,
    },
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "not found: item 123",
///     "details": {
///       "item_id": 123
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "duplicate")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidItem(_) | Error::InvalidSubscription(_) => 422,
            Error::Duplicate(_) => 409,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Network(_) => 502,
            Error::Provider(_) => 502,
            Error::Delivery(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Provider(e) => match e {
                ProviderError::Transport { .. } => "provider_transport_error",
                ProviderError::Format { .. } => "provider_format_error",
                ProviderError::Timeout { .. } => "provider_timeout",
                ProviderError::Rejected { .. } => "provider_rejected",
            },
            Error::Delivery(_) => "delivery_error",
            Error::NotFound(_) => "not_found",
            Error::Duplicate(_) => "duplicate",
            Error::InvalidItem(_) => "invalid_item",
            Error::InvalidSubscription(_) => "invalid_subscription",
            Error::ShuttingDown => "shutting_down",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            Error::Delivery(DeliveryError::Rejected { status, .. })
            | Error::Provider(ProviderError::Rejected { status, .. }) => {
                Some(serde_json::json!({ "upstream_status": status }))
            }
            Error::Provider(ProviderError::Timeout { millis })
            | Error::Delivery(DeliveryError::Timeout { millis }) => {
                Some(serde_json::json!({ "timeout_ms": millis }))
            }
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

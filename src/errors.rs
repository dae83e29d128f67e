//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the sunspot lookup service, providing one
//! error taxonomy shared by resolvers, providers, cache stores and the API.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from parsing, upstream HTTP calls and storage
//! - **Output**: Structured error types with context and HTTP status mapping
//! - **Error Categories**: Input, Date, Geocoding, Upstream, Cache, Configuration
//!
//! ## Key Features
//! - Flat error enum with detailed context per variant
//! - HTTP status mapping kept out of the web layer's match arms
//! - Retryability classification for upstream and cache failures
//! - Automatic conversion from common library errors
//!
//! ## Usage
//! ```rust,ignore
//! use crate::errors::{LookupError, Result};
//!
//! fn parse_latitude(raw: &str) -> Result<f64> {
//!     raw.parse().map_err(|_| LookupError::InvalidInput {
//!         message: format!("latitude '{}' is not a number", raw),
//!     })
//! }
//! ```

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, LookupError>;

/// Error types for the sunspot lookup service
#[derive(Debug, Error)]
pub enum LookupError {
    /// Malformed or contradictory request input
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Date token that no supported format or keyword matches
    #[error("Unrecognized date '{token}': {details}")]
    InvalidDate { token: String, details: String },

    /// Geocoding produced no usable coordinates for the place
    #[error("No location found for '{place}'")]
    LocationNotFound { place: String },

    /// An upstream provider failed or answered with garbage
    #[error("Upstream provider '{provider}' unavailable: {details}")]
    UpstreamUnavailable { provider: String, details: String },

    /// The cache store failed; callers degrade rather than surface this
    #[error("Cache store unavailable: {details}")]
    CacheUnavailable { details: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LookupError {
    /// Check if the error is transient (a retry may succeed)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LookupError::UpstreamUnavailable { .. } | LookupError::CacheUnavailable { .. }
        )
    }

    /// Stable category slug for logging and API error bodies
    pub fn category(&self) -> &'static str {
        match self {
            LookupError::InvalidInput { .. } => "invalid_input",
            LookupError::InvalidDate { .. } => "invalid_date",
            LookupError::LocationNotFound { .. } => "location_not_found",
            LookupError::UpstreamUnavailable { .. } => "upstream_unavailable",
            LookupError::CacheUnavailable { .. } => "cache_unavailable",
            LookupError::Config { .. } => "configuration",
            LookupError::Serialization { .. } => "serialization",
            LookupError::Internal { .. } => "internal",
        }
    }

    /// HTTP status code this error maps to at the API boundary.
    ///
    /// Cache failures are listed here for completeness but are absorbed
    /// inside [`crate::cache::SunDataCache`] and never reach a response.
    pub fn http_status(&self) -> u16 {
        match self {
            LookupError::InvalidInput { .. } | LookupError::InvalidDate { .. } => 400,
            LookupError::LocationNotFound { .. } => 404,
            LookupError::UpstreamUnavailable { .. } => 503,
            LookupError::CacheUnavailable { .. }
            | LookupError::Config { .. }
            | LookupError::Serialization { .. }
            | LookupError::Internal { .. } => 500,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for LookupError {
    fn from(err: std::io::Error) -> Self {
        LookupError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::Serialization {
            message: format!("JSON serialization error: {}", err),
        }
    }
}

impl From<bincode::Error> for LookupError {
    fn from(err: bincode::Error) -> Self {
        LookupError::Serialization {
            message: format!("Binary serialization error: {}", err),
        }
    }
}

impl From<sled::Error> for LookupError {
    fn from(err: sled::Error) -> Self {
        LookupError::CacheUnavailable {
            details: err.to_string(),
        }
    }
}

// Helper macros for common error patterns
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::errors::LookupError::Internal {
            message: $msg.to_string(),
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::LookupError::Internal {
            message: format!($fmt, $($arg)*),
        }
    };
}

#[macro_export]
macro_rules! invalid_input {
    ($msg:expr) => {
        $crate::errors::LookupError::InvalidInput {
            message: $msg.to_string(),
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::LookupError::InvalidInput {
            message: format!($fmt, $($arg)*),
        }
    };
}

//! Error types for catalog operations

use thiserror::Error;

use crate::model::ObjectKind;

/// Catalog service errors
#[derive(Debug, Error)]
pub enum CatalogError {
    // ============ Configuration Errors ============
    #[error("Invalid catalog URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timeout")]
    Timeout,

    // ============ Content Errors ============
    #[error("{kind} response is missing field '{field}'")]
    MissingField { kind: ObjectKind, field: String },

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: ObjectKind, name: String },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: ObjectKind, id: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    /// Errors caused by the shape of a server response rather than transport
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            CatalogError::MissingField { .. } | CatalogError::Serialization(_)
        )
    }

    /// Check if this is a 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
            || matches!(self, CatalogError::Http { status: 404, .. })
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if e.is_decode() {
            CatalogError::Serialization(e.to_string())
        } else if let Some(status) = e.status() {
            CatalogError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            CatalogError::Network {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for CatalogError {
    fn from(e: url::ParseError) -> Self {
        CatalogError::InvalidUrl {
            url: String::new(),
            reason: e.to_string(),
        }
    }
}

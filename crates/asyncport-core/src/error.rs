//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid semantic version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("Unknown {setting} '{value}' (expected one of: {expected})")]
    UnknownSetting {
        setting: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Document not found: {path}")]
    DocumentNotFound { path: String },

    #[error("Invalid AsyncAPI document: {message}")]
    InvalidDocument { message: String },

    #[error("Feature not supported: {feature}")]
    FeatureNotSupported { feature: String },

    #[error("Failed to parse document: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

impl CoreError {
    pub(crate) fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    pub(crate) fn not_supported(feature: impl Into<String>) -> Self {
        Self::FeatureNotSupported {
            feature: feature.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

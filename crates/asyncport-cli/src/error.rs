//! CLI error types with exit code handling

use asyncport_catalog::CatalogError;
use asyncport_engine::{EngineError, ErrorCategory};
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Catalog request failed or returned unusable content
    #[error("Import failed: {message}")]
    #[diagnostic(code(asyncport::cli::catalog))]
    Catalog {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The catalog and the documents disagree
    #[error("Inconsistency: {message}")]
    #[diagnostic(
        code(asyncport::cli::inconsistency),
        help(
            "two documents may declare the same version with different content, \
             or the catalog changed while the import was running"
        )
    )]
    Inconsistency { message: String },

    /// Invalid or incomplete AsyncAPI document
    #[error("Document error: {message}")]
    #[diagnostic(code(asyncport::cli::document))]
    Document {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Document uses a feature the importer does not handle
    #[error("Not supported: {message}")]
    #[diagnostic(code(asyncport::cli::unsupported))]
    Unsupported { message: String },

    /// Invalid option or option combination
    #[error("Configuration error: {message}")]
    #[diagnostic(code(asyncport::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(asyncport::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(asyncport::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Catalog { .. } => exit_codes::CATALOG_ERROR,
            CliError::Inconsistency { .. } => exit_codes::INCONSISTENCY_ERROR,
            CliError::Document { .. } => exit_codes::DOCUMENT_ERROR,
            CliError::Unsupported { .. } => exit_codes::UNSUPPORTED_ERROR,
            CliError::Config { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CatalogError> for CliError {
    fn from(err: CatalogError) -> Self {
        let help = match &err {
            CatalogError::InvalidUrl { .. } => Some("check --api-url".to_string()),
            _ => None,
        };
        CliError::Config {
            message: err.to_string(),
            help,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err.category() {
            ErrorCategory::Catalog => CliError::Catalog {
                message,
                help: catalog_help(err.root()),
            },
            ErrorCategory::Content => CliError::Catalog {
                message,
                help: Some("the catalog returned data the importer could not use".to_string()),
            },
            ErrorCategory::Inconsistency => CliError::Inconsistency { message },
            ErrorCategory::FeatureNotSupported => CliError::Unsupported { message },
            ErrorCategory::Document => CliError::Document {
                help: document_help(&message),
                message,
            },
        }
    }
}

fn catalog_help(err: &EngineError) -> Option<String> {
    let EngineError::Catalog { source, .. } = err else {
        return None;
    };
    match source {
        CatalogError::Http { status: 401, .. } | CatalogError::Http { status: 403, .. } => {
            Some("check the API token (--token or ASYNCPORT_TOKEN)".to_string())
        }
        CatalogError::Network { .. } => Some("check --api-url and network access".to_string()),
        _ => None,
    }
}

fn document_help(message: &str) -> Option<String> {
    message
        .contains("x-ep-application-domain-name")
        .then(|| "set info.x-ep-application-domain-name in the document or pass --domain".to_string())
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use asyncport_catalog::ObjectKind;
    use asyncport_core::CoreError;
    use asyncport_engine::{RunContext, TaskKeys};

    #[test]
    fn test_engine_errors_map_to_exit_codes() {
        let inconsistency = EngineError::Inconsistency {
            message: "changed".to_string(),
        };
        assert_eq!(
            CliError::from(inconsistency).exit_code(),
            exit_codes::INCONSISTENCY_ERROR
        );

        let unsupported = EngineError::Document(CoreError::FeatureNotSupported {
            feature: "oneOf".to_string(),
        });
        assert_eq!(
            CliError::from(unsupported).exit_code(),
            exit_codes::UNSUPPORTED_ERROR
        );

        let missing = EngineError::Document(CoreError::MissingField {
            field: "info.x-ep-application-domain-name".to_string(),
        });
        let err = CliError::from(missing.in_context(&RunContext::new()));
        assert_eq!(err.exit_code(), exit_codes::DOCUMENT_ERROR);
        assert!(matches!(err, CliError::Document { help: Some(_), .. }));
    }

    #[test]
    fn test_auth_failure_suggests_token() {
        let err = EngineError::Catalog {
            kind: ObjectKind::ApplicationDomain,
            keys: TaskKeys::new().with("name", "team-x"),
            source: CatalogError::Http {
                status: 401,
                message: "unauthorized".to_string(),
            },
        };
        match CliError::from(err) {
            CliError::Catalog { help, .. } => assert!(help.unwrap().contains("token")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

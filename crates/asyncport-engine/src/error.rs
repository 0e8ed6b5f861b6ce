//! Error types for asyncport-engine

use thiserror::Error;

use asyncport_catalog::{CatalogError, ObjectKind};
use asyncport_core::CoreError;

use crate::context::{ContextSnapshot, RunContext};
use crate::task::TaskKeys;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while reconciling catalog resources
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// A Resource Service call failed
    #[error("{kind} {keys}: {source}")]
    Catalog {
        kind: ObjectKind,
        keys: TaskKeys,
        #[source]
        source: CatalogError,
    },

    /// A server response or stored object is missing or has malformed data
    #[error("content error for {kind} {keys}: {message}")]
    Content {
        kind: ObjectKind,
        keys: TaskKeys,
        message: String,
    },

    /// An idempotency assertion failed
    #[error("inconsistency: {message}")]
    Inconsistency { message: String },

    /// The requested behavior is declared but not implemented
    #[error("feature not supported: {feature}")]
    FeatureNotSupported { feature: String },

    /// The document could not be loaded or uses an unsupported construct
    #[error(transparent)]
    Document(#[from] CoreError),

    /// An error annotated with the run context it occurred in
    #[error("{source} ({context})")]
    InContext {
        context: ContextSnapshot,
        #[source]
        source: Box<EngineError>,
    },
}

/// Coarse error classes used for reporting and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transport or server failure
    Catalog,
    /// Malformed content, fatal and never retried
    Content,
    /// Idempotency assertion failure
    Inconsistency,
    /// Construct the importer does not model
    FeatureNotSupported,
    /// Invalid or unreadable document
    Document,
}

impl EngineError {
    pub(crate) fn catalog(kind: ObjectKind, keys: TaskKeys, source: CatalogError) -> Self {
        Self::Catalog { kind, keys, source }
    }

    pub(crate) fn content(kind: ObjectKind, keys: TaskKeys, message: impl Into<String>) -> Self {
        Self::Content {
            kind,
            keys,
            message: message.into(),
        }
    }

    pub(crate) fn inconsistency(message: impl Into<String>) -> Self {
        Self::Inconsistency {
            message: message.into(),
        }
    }

    /// Attach the run context once; an already annotated error is left as is
    pub fn in_context(self, ctx: &RunContext) -> Self {
        match self {
            Self::InContext { .. } => self,
            other => Self::InContext {
                context: ctx.snapshot(),
                source: Box::new(other),
            },
        }
    }

    /// The error without its context annotation
    pub fn root(&self) -> &EngineError {
        match self {
            Self::InContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Run context the error occurred in, if annotated
    pub fn context(&self) -> Option<&ContextSnapshot> {
        match self {
            Self::InContext { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            Self::Catalog { source, .. } if source.is_content_error() => ErrorCategory::Content,
            Self::Catalog { .. } => ErrorCategory::Catalog,
            Self::Content { .. } => ErrorCategory::Content,
            Self::Inconsistency { .. } => ErrorCategory::Inconsistency,
            Self::FeatureNotSupported { .. } => ErrorCategory::FeatureNotSupported,
            Self::Document(CoreError::FeatureNotSupported { .. }) => {
                ErrorCategory::FeatureNotSupported
            }
            Self::Document(_) => ErrorCategory::Document,
            Self::InContext { source, .. } => source.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Frame, RunMode};

    #[test]
    fn test_context_attached_once() {
        let outer = RunContext::new().child(Frame::RunMode(RunMode::TestMode));
        let inner = outer.child(Frame::Channel {
            topic: "a/b".to_string(),
        });

        let err = EngineError::inconsistency("boom")
            .in_context(&inner)
            .in_context(&outer);

        assert_eq!(err.context().unwrap().get("channel"), Some("a/b"));
        assert_eq!(err.category(), ErrorCategory::Inconsistency);
        assert_eq!(
            err.to_string(),
            "inconsistency: boom (mode=test_mode channel=a/b)"
        );
    }

    #[test]
    fn test_content_errors_from_catalog() {
        let err = EngineError::catalog(
            ObjectKind::Schema,
            TaskKeys::new().with("name", "order"),
            CatalogError::MissingField {
                kind: ObjectKind::Schema,
                field: "id".to_string(),
            },
        );
        assert_eq!(err.category(), ErrorCategory::Content);

        let err = EngineError::catalog(
            ObjectKind::Schema,
            TaskKeys::new(),
            CatalogError::Http {
                status: 503,
                message: "unavailable".to_string(),
            },
        );
        assert_eq!(err.category(), ErrorCategory::Catalog);
    }

    #[test]
    fn test_document_feature_not_supported() {
        let err = EngineError::from(CoreError::FeatureNotSupported {
            feature: "oneOf messages".to_string(),
        });
        assert_eq!(err.category(), ErrorCategory::FeatureNotSupported);
    }
}

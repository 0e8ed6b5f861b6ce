//! asyncport Engine - reconciles AsyncAPI documents against an event catalog
//!
//! This crate provides:
//! - **Reconciliation Task**: The generic get → decide → act cycle ([`execute`])
//! - **Versioned Task**: Create-first/create-new-version logic with bump and exact strategies
//! - **Resource Kinds**: Domains, enums, schemas, events, event APIs and applications
//! - **Run Context & Summary**: Scoped location for logs and an ordered audit trail
//! - **Importer**: Test, keep and release runs with an idempotency check before committing

pub mod context;
pub mod error;
pub mod importer;
pub mod kinds;
pub mod object;
pub mod summary;
pub mod task;
pub mod versioned;

pub use context::{ContextSnapshot, Frame, RunContext, RunMode};
pub use error::{EngineError, ErrorCategory, Result};
pub use importer::Importer;
pub use object::{ObjectContent, ObjectTask};
pub use summary::{EntryKind, RunSummary, SummaryCounts, SummaryEntry};
pub use task::{
    Action, ActionDetails, ActionRecord, CHECKMODE_PLACEHOLDER_ID, GetResult, Reconcile,
    TargetState, TaskConfig, TaskKeys, TaskOutput, TransactionLinkage, UpdateCheck, execute,
};
pub use versioned::{
    ConflictPolicy, ExactVersionProbe, VersionContent, VersionPolicy, VersionWarning,
    VersionedTask, execute_versioned,
};

//! Run summary
//!
//! An ordered audit trail of one importer execution. Every processed domain,
//! object and version, every warning and every error is recorded with the run
//! mode and context it happened in.

use chrono::{DateTime, Utc};
use serde::Serialize;

use asyncport_catalog::ObjectKind;

use crate::context::{ContextSnapshot, RunContext, RunMode};
use crate::error::EngineError;
use crate::task::{Action, TaskOutput};
use crate::versioned::VersionWarning;

/// What a summary entry records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    RunStarted,
    DomainProcessed {
        name: String,
        action: Action,
    },
    ObjectProcessed {
        kind: ObjectKind,
        name: String,
        action: Action,
    },
    VersionProcessed {
        kind: ObjectKind,
        version: String,
        action: Action,
    },
    Warning {
        message: String,
    },
    Error {
        message: String,
    },
}

/// One summary line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    pub mode: RunMode,
    /// Recorded during a verification (checkmode) pass
    pub checkmode: bool,
    #[serde(flatten)]
    pub kind: EntryKind,
    pub context: ContextSnapshot,
}

impl SummaryEntry {
    pub fn action(&self) -> Option<Action> {
        match &self.kind {
            EntryKind::DomainProcessed { action, .. }
            | EntryKind::ObjectProcessed { action, .. }
            | EntryKind::VersionProcessed { action, .. } => Some(*action),
            _ => None,
        }
    }
}

/// Aggregate view of the entries of one run mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub warnings: usize,
    pub errors: usize,
}

/// Ordered audit trail of one run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    started_at: DateTime<Utc>,
    entries: Vec<SummaryEntry>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Append an entry
    pub fn record(&mut self, mode: RunMode, checkmode: bool, kind: EntryKind, ctx: &RunContext) {
        self.entries.push(SummaryEntry {
            mode,
            checkmode,
            kind,
            context: ctx.snapshot(),
        });
    }

    /// Record a task outcome and the warnings it carries
    pub fn record_output<T>(
        &mut self,
        mode: RunMode,
        output: &TaskOutput<T>,
        ctx: &RunContext,
    ) {
        let details = &output.action.details;
        let action = output.action.action;
        let kind = match details.kind {
            ObjectKind::ApplicationDomain => EntryKind::DomainProcessed {
                name: details.keys.get("name").unwrap_or_default().to_string(),
                action,
            },
            kind if kind.is_version() => EntryKind::VersionProcessed {
                kind,
                version: details.version.clone().unwrap_or_default(),
                action,
            },
            kind => EntryKind::ObjectProcessed {
                kind,
                name: details.keys.get("name").unwrap_or_default().to_string(),
                action,
            },
        };
        self.record(mode, details.checkmode, kind, ctx);

        for warning in &output.warnings {
            self.record_warning(mode, details.checkmode, warning, ctx);
        }
    }

    pub fn record_warning(
        &mut self,
        mode: RunMode,
        checkmode: bool,
        warning: &VersionWarning,
        ctx: &RunContext,
    ) {
        self.record(
            mode,
            checkmode,
            EntryKind::Warning {
                message: warning.to_string(),
            },
            ctx,
        );
    }

    /// Record a failed run, with the context the error was raised in
    pub fn record_error(&mut self, mode: RunMode, error: &EngineError, ctx: &RunContext) {
        self.entries.push(SummaryEntry {
            mode,
            checkmode: false,
            kind: EntryKind::Error {
                message: error.root().to_string(),
            },
            context: error.context().cloned().unwrap_or_else(|| ctx.snapshot()),
        });
    }

    pub fn entries(&self) -> &[SummaryEntry] {
        &self.entries
    }

    pub fn entries_for(&self, mode: RunMode) -> impl Iterator<Item = &SummaryEntry> {
        self.entries.iter().filter(move |e| e.mode == mode)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SummaryEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.kind, EntryKind::Warning { .. }))
    }

    pub fn errors(&self) -> impl Iterator<Item = &SummaryEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.kind, EntryKind::Error { .. }))
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Counts for one run mode; verification entries count only as warnings or errors
    pub fn counts(&self, mode: RunMode) -> SummaryCounts {
        let mut counts = SummaryCounts::default();
        for entry in self.entries_for(mode) {
            match (&entry.kind, entry.action()) {
                (EntryKind::Warning { .. }, _) => counts.warnings += 1,
                (EntryKind::Error { .. }, _) => counts.errors += 1,
                _ if entry.checkmode => {}
                (_, Some(action)) if action.is_create() => counts.created += 1,
                (_, Some(Action::Update)) => counts.updated += 1,
                (_, Some(Action::NothingToDo)) => counts.unchanged += 1,
                _ => {}
            }
        }
        counts
    }

    /// Run modes in the order they appear
    pub fn modes(&self) -> Vec<RunMode> {
        let mut modes = Vec::new();
        for entry in &self.entries {
            if !modes.contains(&entry.mode) {
                modes.push(entry.mode);
            }
        }
        modes
    }
}

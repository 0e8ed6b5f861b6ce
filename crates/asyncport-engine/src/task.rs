//! Reconciliation task
//!
//! Every resource kind plugs into the same get → decide → act cycle through
//! the [`Reconcile`] trait. [`execute`] drives one task and produces exactly
//! one [`ActionRecord`] together with the resulting object, so callers can
//! chain dependent reconciliations on the returned identifiers.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use asyncport_catalog::{CatalogError, ObjectKind};
use asyncport_core::{Comparison, compare};

use crate::context::RunContext;
use crate::error::{EngineError, Result};
use crate::versioned::VersionWarning;

/// Identifier given to objects synthesized in checkmode
///
/// Child lookups under a parent carrying this identifier report the child as
/// absent without calling the service.
pub const CHECKMODE_PLACEHOLDER_ID: &str = "<checkmode>";

/// Whether a parent identifier refers to a checkmode placeholder
pub fn is_placeholder(id: &str) -> bool {
    id == CHECKMODE_PLACEHOLDER_ID
}

/// Requested state of a resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetState {
    #[default]
    Present,
    /// Declared for completeness; reconciling towards absence is not implemented
    Absent,
}

/// Audit correlation between the tasks of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLinkage {
    pub group_transaction_id: Uuid,
    pub parent_transaction_id: Option<Uuid>,
}

impl TransactionLinkage {
    /// Start a new transaction group
    pub fn new_group() -> Self {
        Self {
            group_transaction_id: Uuid::new_v4(),
            parent_transaction_id: None,
        }
    }
}

/// Immutable input of one task execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConfig {
    pub target_state: TargetState,
    pub checkmode: bool,
    pub transaction: TransactionLinkage,
}

impl TaskConfig {
    pub fn new(checkmode: bool) -> Self {
        Self {
            target_state: TargetState::Present,
            checkmode,
            transaction: TransactionLinkage::new_group(),
        }
    }

    /// Configuration for a task nested under the task that produced `parent`
    #[must_use]
    pub fn child(&self, parent: Uuid) -> Self {
        Self {
            transaction: TransactionLinkage {
                group_transaction_id: self.transaction.group_transaction_id,
                parent_transaction_id: Some(parent),
            },
            ..*self
        }
    }
}

/// Natural identifying attributes of a resource, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaskKeys(IndexMap<String, String>);

impl TaskKeys {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl fmt::Display for TaskKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("]")
    }
}

/// Outcome of a lookup; an existing resource always carries its object
#[derive(Debug, Clone, PartialEq)]
pub enum GetResult<T> {
    Absent,
    Exists(T),
}

impl<T> GetResult<T> {
    pub fn exists(&self) -> bool {
        matches!(self, GetResult::Exists(_))
    }
}

impl<T> From<Option<T>> for GetResult<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(object) => GetResult::Exists(object),
            None => GetResult::Absent,
        }
    }
}

/// Decision of [`Reconcile::is_update_required`]
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCheck {
    pub required: bool,
    pub existing_view: Value,
    pub requested_view: Value,
    pub comparison: Comparison,
}

impl UpdateCheck {
    /// Compare two projections; an update is required when they differ
    pub fn from_views(existing_view: Value, requested_view: Value) -> Self {
        let comparison = compare(&existing_view, &requested_view);
        Self {
            required: !comparison.equal,
            existing_view,
            requested_view,
            comparison,
        }
    }

    /// Require an update regardless of the comparison
    #[must_use]
    pub fn force(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The committed decision of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Create,
    CreateFirstVersion,
    CreateNewVersion,
    Update,
    NothingToDo,
}

impl Action {
    /// Whether the action creates a resource or a version
    pub fn is_create(&self) -> bool {
        matches!(
            self,
            Action::Create | Action::CreateFirstVersion | Action::CreateNewVersion
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Create => "CREATE",
            Action::CreateFirstVersion => "CREATE_FIRST_VERSION",
            Action::CreateNewVersion => "CREATE_NEW_VERSION",
            Action::Update => "UPDATE",
            Action::NothingToDo => "NOTHING_TO_DO",
        };
        f.write_str(s)
    }
}

/// Details attached to an [`Action`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDetails {
    pub kind: ObjectKind,
    pub keys: TaskKeys,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<Comparison>,
    pub checkmode: bool,
}

/// Record of one task execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub action: Action,
    pub details: ActionDetails,
}

/// Result of [`execute`]
#[derive(Debug, Clone)]
pub struct TaskOutput<T> {
    pub action: ActionRecord,
    /// Existing, created or updated object (a placeholder in checkmode)
    pub object: T,
    pub transaction_id: Uuid,
    pub warnings: Vec<VersionWarning>,
}

impl<T> TaskOutput<T> {
    pub fn action(&self) -> Action {
        self.action.action
    }
}

/// Strategy plugged into [`execute`] for one resource kind
#[async_trait]
pub trait Reconcile: Send {
    type Object: Clone + fmt::Debug + Send + Sync;

    /// Action reported when the resource was absent
    const CREATE_ACTION: Action = Action::Create;
    /// Action reported when the resource differed
    const UPDATE_ACTION: Action = Action::Update;

    fn kind(&self) -> ObjectKind;

    fn keys(&self) -> TaskKeys;

    /// Optional preparation before the lookup
    async fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    async fn get(&mut self) -> Result<GetResult<Self::Object>>;

    async fn create(&mut self) -> Result<Self::Object>;

    fn is_update_required(&self, existing: &Self::Object) -> Result<UpdateCheck>;

    async fn update(&mut self, existing: &Self::Object) -> Result<Self::Object>;

    /// Object reported by a create in checkmode
    fn create_placeholder(&self) -> Result<Self::Object>;

    /// Object reported by an update in checkmode
    fn update_placeholder(&self, existing: &Self::Object) -> Result<Self::Object>;

    /// Version string of an object, for versioned kinds
    fn version_of(&self, _object: &Self::Object) -> Option<String> {
        None
    }

    /// Warnings collected while executing
    fn take_warnings(&mut self) -> Vec<VersionWarning> {
        Vec::new()
    }

    fn catalog_error(&self, source: CatalogError) -> EngineError {
        EngineError::catalog(self.kind(), self.keys(), source)
    }

    fn content_error(&self, message: String) -> EngineError {
        EngineError::content(self.kind(), self.keys(), message)
    }
}

/// Run one reconciliation
pub async fn execute<T: Reconcile>(
    task: &mut T,
    config: &TaskConfig,
    ctx: &RunContext,
) -> Result<TaskOutput<T::Object>> {
    let kind = task.kind();
    let keys = task.keys();

    if config.target_state == TargetState::Absent {
        return Err(EngineError::FeatureNotSupported {
            feature: format!("target state ABSENT for {kind} {keys}"),
        });
    }

    task.initialize().await?;

    let (action, object, diff) = match task.get().await? {
        GetResult::Absent => {
            let object = if config.checkmode {
                task.create_placeholder()?
            } else {
                task.create().await?
            };
            (T::CREATE_ACTION, object, None)
        }
        GetResult::Exists(existing) => {
            let check = task.is_update_required(&existing)?;
            if !check.required {
                (Action::NothingToDo, existing, None)
            } else {
                tracing::debug!(
                    context = %ctx,
                    kind = %kind,
                    keys = %keys,
                    changes = %check.comparison.summary(),
                    "update required"
                );
                let object = if config.checkmode {
                    task.update_placeholder(&existing)?
                } else {
                    task.update(&existing).await?
                };
                (T::UPDATE_ACTION, object, Some(check.comparison))
            }
        }
    };

    let version = task.version_of(&object);
    tracing::info!(
        context = %ctx,
        kind = %kind,
        keys = %keys,
        version = version.as_deref().unwrap_or("-"),
        action = %action,
        checkmode = config.checkmode,
        "reconciled"
    );

    Ok(TaskOutput {
        action: ActionRecord {
            action,
            details: ActionDetails {
                kind,
                keys,
                version,
                diff,
                checkmode: config.checkmode,
            },
        },
        object,
        transaction_id: Uuid::new_v4(),
        warnings: task.take_warnings(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// In-memory task over a single optional string value
    struct ValueTask {
        stored: Option<String>,
        requested: String,
        calls: Vec<&'static str>,
    }

    #[async_trait]
    impl Reconcile for ValueTask {
        type Object = String;

        fn kind(&self) -> ObjectKind {
            ObjectKind::ApplicationDomain
        }

        fn keys(&self) -> TaskKeys {
            TaskKeys::new().with("name", "value")
        }

        async fn get(&mut self) -> Result<GetResult<String>> {
            self.calls.push("get");
            Ok(self.stored.clone().into())
        }

        async fn create(&mut self) -> Result<String> {
            self.calls.push("create");
            self.stored = Some(self.requested.clone());
            Ok(self.requested.clone())
        }

        fn is_update_required(&self, existing: &String) -> Result<UpdateCheck> {
            Ok(UpdateCheck::from_views(
                json!({ "value": existing }),
                json!({ "value": self.requested }),
            ))
        }

        async fn update(&mut self, _existing: &String) -> Result<String> {
            self.calls.push("update");
            self.stored = Some(self.requested.clone());
            Ok(self.requested.clone())
        }

        fn create_placeholder(&self) -> Result<String> {
            Ok(CHECKMODE_PLACEHOLDER_ID.to_string())
        }

        fn update_placeholder(&self, _existing: &String) -> Result<String> {
            Ok(CHECKMODE_PLACEHOLDER_ID.to_string())
        }
    }

    fn task(stored: Option<&str>, requested: &str) -> ValueTask {
        ValueTask {
            stored: stored.map(String::from),
            requested: requested.to_string(),
            calls: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_then_nothing_to_do() {
        let ctx = RunContext::new();
        let config = TaskConfig::new(false);
        let mut t = task(None, "a");

        let first = execute(&mut t, &config, &ctx).await.unwrap();
        assert_eq!(first.action(), Action::Create);
        assert_eq!(first.object, "a");

        let second = execute(&mut t, &config, &ctx).await.unwrap();
        assert_eq!(second.action(), Action::NothingToDo);
        assert_eq!(t.calls, vec!["get", "create", "get"]);
    }

    #[tokio::test]
    async fn test_update_records_diff() {
        let mut t = task(Some("a"), "b");
        let output = execute(&mut t, &TaskConfig::new(false), &RunContext::new())
            .await
            .unwrap();

        assert_eq!(output.action(), Action::Update);
        let diff = output.action.details.diff.unwrap();
        assert_eq!(diff.changed_paths(), vec!["value"]);
    }

    #[tokio::test]
    async fn test_checkmode_skips_mutations() {
        let config = TaskConfig::new(true);
        let ctx = RunContext::new();

        let mut absent = task(None, "a");
        let output = execute(&mut absent, &config, &ctx).await.unwrap();
        assert_eq!(output.action(), Action::Create);
        assert_eq!(output.object, CHECKMODE_PLACEHOLDER_ID);
        assert!(output.action.details.checkmode);

        let mut changed = task(Some("a"), "b");
        let output = execute(&mut changed, &config, &ctx).await.unwrap();
        assert_eq!(output.action(), Action::Update);

        assert_eq!(absent.calls, vec!["get"]);
        assert_eq!(changed.calls, vec!["get"]);
    }

    #[tokio::test]
    async fn test_absent_target_not_supported() {
        let config = TaskConfig {
            target_state: TargetState::Absent,
            ..TaskConfig::new(false)
        };
        let mut t = task(None, "a");
        let err = execute(&mut t, &config, &RunContext::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::FeatureNotSupported { .. }));
        assert!(t.calls.is_empty());
    }

    #[test]
    fn test_child_config_links_transactions() {
        let config = TaskConfig::new(false);
        let parent = Uuid::new_v4();
        let child = config.child(parent);

        assert_eq!(
            child.transaction.group_transaction_id,
            config.transaction.group_transaction_id
        );
        assert_eq!(child.transaction.parent_transaction_id, Some(parent));
        assert_eq!(child.checkmode, config.checkmode);
    }

    #[test]
    fn test_keys_display() {
        let keys = TaskKeys::new().with("name", "orders").with("domainId", "d-1");
        assert_eq!(keys.to_string(), "[name=orders, domainId=d-1]");
    }
}

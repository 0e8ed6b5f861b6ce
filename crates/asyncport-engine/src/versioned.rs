//! Versioned reconciliation
//!
//! Versions are immutable: when the latest version of an object differs from
//! the request, a new version is created instead of updating in place. The
//! version string of a new version follows the [`VersionPolicy`]:
//!
//! - **bump**: the requested version when it is higher than the latest one,
//!   otherwise the latest version bumped by patch or minor
//! - **exact**: the requested version must be created as is; a conflicting
//!   existing version is resolved by the [`ConflictPolicy`] of the run
//!
//! A new version is moved to the target lifecycle state right after creation.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use asyncport_catalog::{CatalogVersion, ObjectKind, VersionService};
use asyncport_core::{
    BumpStrategy, INITIAL_VERSION, LifecycleState, VersionStrategy, compare, is_greater,
    is_valid_semver, latest_version, next_version, parse_version,
};

use crate::context::RunContext;
use crate::error::{EngineError, Result};
use crate::task::{
    Action, CHECKMODE_PLACEHOLDER_ID, GetResult, Reconcile, TaskConfig, TaskKeys, TaskOutput,
    UpdateCheck, execute, is_placeholder,
};

/// Per-kind comparison rules for versions
pub trait VersionContent: CatalogVersion {
    /// Version payload compared between the latest and the requested version
    fn compare_view(&self) -> Value;
}

/// How an exact-version conflict is resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Raise an inconsistency error
    #[default]
    Fail,
    /// Create the next patch version above the latest one and record a warning
    BumpPatchWithWarning,
}

/// Version selection for one versioned task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPolicy {
    /// Version asked for by the document
    pub requested_version: Option<String>,
    pub strategy: VersionStrategy,
    /// A requested version above the latest one forces a new version even without content changes
    pub track_requested_version: bool,
    /// Lifecycle state new versions are moved to
    pub target_state: LifecycleState,
}

impl VersionPolicy {
    pub fn bump(
        requested_version: Option<String>,
        strategy: BumpStrategy,
        target_state: LifecycleState,
    ) -> Self {
        Self {
            requested_version,
            strategy: VersionStrategy::Bump(strategy),
            track_requested_version: false,
            target_state,
        }
    }

    pub fn exact(requested_version: impl Into<String>, target_state: LifecycleState) -> Self {
        Self {
            requested_version: Some(requested_version.into()),
            strategy: VersionStrategy::Exact,
            track_requested_version: true,
            target_state,
        }
    }

    #[must_use]
    pub fn tracking_requested_version(mut self) -> Self {
        self.track_requested_version = true;
        self
    }
}

/// An exact version that could not be honored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionWarning {
    pub kind: ObjectKind,
    pub keys: TaskKeys,
    pub requested: String,
    pub used: String,
}

impl fmt::Display for VersionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: version {} already exists with different content, using {}",
            self.kind, self.keys, self.requested, self.used
        )
    }
}

/// Read-only outcome of reconciling towards an exact version
#[derive(Debug, Clone, PartialEq)]
pub enum ExactVersionProbe<V> {
    /// The requested version exists with the requested content
    NoChangeNeeded(V),
    /// No version exists yet
    CreateFirst,
    /// The requested version is higher than every existing version
    CreateNew,
    /// The requested version exists with other content, or is not above the latest
    Conflict { requested: String, latest: V },
}

/// Reconciles the versions of one parent object
pub struct VersionedTask<V: VersionContent> {
    service: Arc<dyn VersionService<V>>,
    requested: V,
    policy: VersionPolicy,
    fallback_version: Option<String>,
    warnings: Vec<VersionWarning>,
}

fn parent_key(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::EnumVersion => "enumId",
        ObjectKind::SchemaVersion => "schemaId",
        ObjectKind::EventVersion => "eventId",
        ObjectKind::EventApiVersion => "eventApiId",
        ObjectKind::ApplicationVersion => "applicationId",
        _ => "parentId",
    }
}

impl<V: VersionContent> VersionedTask<V> {
    /// `requested` carries the parent id and the version payload; its version string is ignored
    pub fn new(service: Arc<dyn VersionService<V>>, requested: V, policy: VersionPolicy) -> Self {
        Self {
            service,
            requested,
            policy,
            fallback_version: None,
            warnings: Vec::new(),
        }
    }

    fn parent_id(&self) -> &str {
        self.requested.parent_id()
    }

    fn requested_version(&self) -> Option<&str> {
        self.policy.requested_version.as_deref()
    }

    fn tracks_requested_version(&self) -> bool {
        self.policy.track_requested_version || self.policy.strategy == VersionStrategy::Exact
    }

    fn matches_requested(&self, version: &V) -> bool {
        compare(&version.compare_view(), &self.requested.compare_view()).equal
    }

    fn with_version(&self, version: &str, id: Option<&str>) -> V {
        let mut object = self.requested.clone();
        object.set_version(version.to_string());
        if let Some(id) = id {
            object.set_id(id.to_string());
        }
        object
    }

    async fn versions(&self) -> Result<Vec<V>> {
        if is_placeholder(self.parent_id()) {
            return Ok(Vec::new());
        }
        self.service
            .list_versions(self.parent_id())
            .await
            .map_err(|e| self.catalog_error(e))
    }

    /// Highest version by semantic-version precedence; unparsable versions are fatal
    fn latest(&self, versions: Vec<V>) -> Result<Option<V>> {
        let latest = latest_version(versions.iter().map(|v| v.version()))
            .map_err(|e| self.content_error(e.to_string()))?;
        let Some(latest) = latest else {
            return Ok(None);
        };
        Ok(versions.into_iter().find(|v| {
            parse_version(v.version()).is_ok_and(|p| p.cmp_precedence(&latest) == Ordering::Equal)
        }))
    }

    fn requested_is_newer(&self, existing: &V) -> Result<bool> {
        match self.requested_version() {
            Some(requested) => is_greater(requested, existing.version())
                .map_err(|e| self.content_error(e.to_string())),
            None => Ok(false),
        }
    }

    fn first_version(&self) -> Result<String> {
        let version = self.requested_version().unwrap_or(INITIAL_VERSION);
        if !is_valid_semver(version) {
            return Err(self.content_error(format!("requested version '{version}' is not valid")));
        }
        Ok(version.to_string())
    }

    fn new_version(&self, latest: &V) -> Result<String> {
        if let Some(fallback) = &self.fallback_version {
            return Ok(fallback.clone());
        }
        if self.requested_is_newer(latest)? {
            return Ok(self.requested_version().unwrap_or_default().to_string());
        }
        let bump = match self.policy.strategy {
            VersionStrategy::Bump(bump) => bump,
            VersionStrategy::Exact => BumpStrategy::Patch,
        };
        next_version(latest.version(), bump).map_err(|e| self.content_error(e.to_string()))
    }

    async fn create_settled(&self, version: String) -> Result<V> {
        let created = self
            .service
            .create_version(&self.with_version(&version, None))
            .await
            .map_err(|e| self.catalog_error(e))?;

        let target = self.policy.target_state;
        if created.state_id() == Some(target.id()) {
            return Ok(created);
        }

        let id = created
            .id()
            .ok_or_else(|| self.content_error(format!("created version {version} has no id")))?;
        self.service
            .set_version_state(self.parent_id(), id, target)
            .await
            .map_err(|e| self.catalog_error(e))?;
        tracing::debug!(kind = %V::KIND, version = %version, state = %target, "version state set");

        self.service
            .get_version_by_version_string(self.parent_id(), &version)
            .await
            .map_err(|e| self.catalog_error(e))?
            .ok_or_else(|| {
                self.content_error(format!("version {version} not found after state change"))
            })
    }

    /// Reconcile towards the requested exact version without writing anything
    pub async fn probe(&self) -> Result<ExactVersionProbe<V>> {
        let Some(requested) = self.requested_version().map(String::from) else {
            return Err(self.content_error("exact version requested without a version".to_string()));
        };
        let versions = self.versions().await?;

        let exact_matches = versions
            .iter()
            .find(|v| v.version() == requested)
            .map(|v| (v.clone(), self.matches_requested(v)));

        match (exact_matches, self.latest(versions)?) {
            (Some((existing, true)), _) => Ok(ExactVersionProbe::NoChangeNeeded(existing)),
            (Some((existing, false)), latest) => Ok(ExactVersionProbe::Conflict {
                requested,
                latest: latest.unwrap_or(existing),
            }),
            (None, None) => Ok(ExactVersionProbe::CreateFirst),
            (None, Some(latest)) => {
                if self.requested_is_newer(&latest)? {
                    Ok(ExactVersionProbe::CreateNew)
                } else {
                    Ok(ExactVersionProbe::Conflict { requested, latest })
                }
            }
        }
    }
}

#[async_trait]
impl<V: VersionContent> Reconcile for VersionedTask<V> {
    type Object = V;

    const CREATE_ACTION: Action = Action::CreateFirstVersion;
    const UPDATE_ACTION: Action = Action::CreateNewVersion;

    fn kind(&self) -> ObjectKind {
        V::KIND
    }

    fn keys(&self) -> TaskKeys {
        let keys = TaskKeys::new().with(parent_key(V::KIND), self.parent_id());
        match self.requested_version() {
            Some(version) => keys.with("version", version),
            None => keys,
        }
    }

    async fn get(&mut self) -> Result<GetResult<V>> {
        let versions = self.versions().await?;

        // An older requested version that still holds the requested content satisfies the request
        if let Some(requested) = self.requested_version() {
            if let Some(found) = versions
                .iter()
                .find(|v| v.version() == requested && self.matches_requested(v))
            {
                return Ok(GetResult::Exists(found.clone()));
            }
        }

        Ok(self.latest(versions)?.into())
    }

    async fn create(&mut self) -> Result<V> {
        let version = self.first_version()?;
        self.create_settled(version).await
    }

    fn is_update_required(&self, existing: &V) -> Result<UpdateCheck> {
        let check =
            UpdateCheck::from_views(existing.compare_view(), self.requested.compare_view());
        if self.tracks_requested_version() && self.requested_is_newer(existing)? {
            return Ok(check.force());
        }
        Ok(check)
    }

    async fn update(&mut self, existing: &V) -> Result<V> {
        let version = self.new_version(existing)?;
        self.create_settled(version).await
    }

    fn create_placeholder(&self) -> Result<V> {
        let mut placeholder =
            self.with_version(&self.first_version()?, Some(CHECKMODE_PLACEHOLDER_ID));
        placeholder.set_state_id(self.policy.target_state.id().to_string());
        Ok(placeholder)
    }

    fn update_placeholder(&self, existing: &V) -> Result<V> {
        let mut placeholder =
            self.with_version(&self.new_version(existing)?, Some(CHECKMODE_PLACEHOLDER_ID));
        placeholder.set_state_id(self.policy.target_state.id().to_string());
        Ok(placeholder)
    }

    fn version_of(&self, object: &V) -> Option<String> {
        Some(object.version().to_string())
    }

    fn take_warnings(&mut self) -> Vec<VersionWarning> {
        std::mem::take(&mut self.warnings)
    }
}

/// Run a versioned task, resolving exact-version conflicts with `conflict`
pub async fn execute_versioned<V: VersionContent>(
    task: &mut VersionedTask<V>,
    config: &TaskConfig,
    conflict: ConflictPolicy,
    ctx: &RunContext,
) -> Result<TaskOutput<V>> {
    if task.policy.strategy != VersionStrategy::Exact {
        return execute(task, config, ctx).await;
    }

    let (requested, latest) = match task.probe().await? {
        ExactVersionProbe::Conflict { requested, latest } => (requested, latest),
        ExactVersionProbe::NoChangeNeeded(_)
        | ExactVersionProbe::CreateFirst
        | ExactVersionProbe::CreateNew => return execute(task, config, ctx).await,
    };

    match conflict {
        ConflictPolicy::Fail => Err(EngineError::inconsistency(format!(
            "{} {}: version {} already exists with different content (latest is {})",
            task.kind(),
            task.keys(),
            requested,
            latest.version()
        ))),
        ConflictPolicy::BumpPatchWithWarning => {
            let used = if task.matches_requested(&latest) {
                latest.version().to_string()
            } else {
                let bumped = next_version(latest.version(), BumpStrategy::Patch)
                    .map_err(|e| task.content_error(e.to_string()))?;
                task.fallback_version = Some(bumped.clone());
                bumped
            };
            let warning = VersionWarning {
                kind: task.kind(),
                keys: task.keys(),
                requested,
                used,
            };
            tracing::warn!(context = %ctx, "{}", warning);
            task.warnings.push(warning);
            execute(task, config, ctx).await
        }
    }
}

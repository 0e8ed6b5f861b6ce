//! Resource Service contract
//!
//! One object service and, for versioned kinds, one version service per
//! resource kind. [`Catalog`] bundles them so the engine can be driven by the
//! REST client or the in-memory mock interchangeably.

use async_trait::async_trait;
use std::sync::Arc;

use asyncport_core::LifecycleState;

use crate::error::Result;
use crate::model::{
    Application, ApplicationDomain, ApplicationVersion, CatalogObject, CatalogVersion, EnumVersion,
    Event, EventApi, EventApiVersion, EventVersion, Schema, SchemaVersion, TopicEnum,
};

/// Named objects looked up by `(name, parent)`
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait ObjectService<T: CatalogObject>: Send + Sync {
    /// Find an object by name under a parent domain
    async fn get_by_name(&self, name: &str, parent_id: Option<&str>) -> Result<Option<T>>;

    /// Create an object; the returned copy carries the assigned identifier
    async fn create(&self, object: &T) -> Result<T>;

    /// Replace the mutable attributes of an existing object
    async fn update(&self, id: &str, object: &T) -> Result<T>;

    /// Delete an object by name; an absent object yields `Ok(None)`
    async fn delete_by_name(&self, name: &str, parent_id: Option<&str>) -> Result<Option<T>>;
}

/// Versions of an object, looked up by `(parent, version)`
#[async_trait]
pub trait VersionService<V: CatalogVersion>: Send + Sync {
    /// All versions of a parent object, in no particular order
    async fn list_versions(&self, parent_id: &str) -> Result<Vec<V>>;

    /// Find one version by its version string
    async fn get_version_by_version_string(
        &self,
        parent_id: &str,
        version: &str,
    ) -> Result<Option<V>> {
        Ok(self
            .list_versions(parent_id)
            .await?
            .into_iter()
            .find(|v| v.version() == version))
    }

    /// Create a version; the catalog assigns its identifier and initial state
    async fn create_version(&self, version: &V) -> Result<V>;

    /// Move a version to another lifecycle state
    async fn set_version_state(
        &self,
        parent_id: &str,
        version_id: &str,
        state: LifecycleState,
    ) -> Result<()>;
}

/// Every service the importer talks to
#[derive(Clone)]
pub struct Catalog {
    pub domains: Arc<dyn ObjectService<ApplicationDomain>>,
    pub enums: Arc<dyn ObjectService<TopicEnum>>,
    pub enum_versions: Arc<dyn VersionService<EnumVersion>>,
    pub schemas: Arc<dyn ObjectService<Schema>>,
    pub schema_versions: Arc<dyn VersionService<SchemaVersion>>,
    pub events: Arc<dyn ObjectService<Event>>,
    pub event_versions: Arc<dyn VersionService<EventVersion>>,
    pub event_apis: Arc<dyn ObjectService<EventApi>>,
    pub event_api_versions: Arc<dyn VersionService<EventApiVersion>>,
    pub applications: Arc<dyn ObjectService<Application>>,
    pub application_versions: Arc<dyn VersionService<ApplicationVersion>>,
}

/// A single backend serving every resource kind
pub trait CatalogBackend:
    ObjectService<ApplicationDomain>
    + ObjectService<TopicEnum>
    + VersionService<EnumVersion>
    + ObjectService<Schema>
    + VersionService<SchemaVersion>
    + ObjectService<Event>
    + VersionService<EventVersion>
    + ObjectService<EventApi>
    + VersionService<EventApiVersion>
    + ObjectService<Application>
    + VersionService<ApplicationVersion>
    + 'static
{
}

impl<B> CatalogBackend for B where
    B: ObjectService<ApplicationDomain>
        + ObjectService<TopicEnum>
        + VersionService<EnumVersion>
        + ObjectService<Schema>
        + VersionService<SchemaVersion>
        + ObjectService<Event>
        + VersionService<EventVersion>
        + ObjectService<EventApi>
        + VersionService<EventApiVersion>
        + ObjectService<Application>
        + VersionService<ApplicationVersion>
        + 'static
{
}

impl Catalog {
    /// Route every resource kind to the same backend
    pub fn from_backend<B: CatalogBackend>(backend: Arc<B>) -> Self {
        Self {
            domains: backend.clone(),
            enums: backend.clone(),
            enum_versions: backend.clone(),
            schemas: backend.clone(),
            schema_versions: backend.clone(),
            events: backend.clone(),
            event_versions: backend.clone(),
            event_apis: backend.clone(),
            event_api_versions: backend.clone(),
            applications: backend.clone(),
            application_versions: backend,
        }
    }
}

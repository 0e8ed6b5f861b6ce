//! In-memory catalog for testing
//!
//! Behaves like the real service where the importer relies on it: identifiers
//! are assigned on creation, names are unique per parent, version strings are
//! unique per object, new versions start in the draft state and deleting a
//! domain removes everything it owns. Every call is counted so tests can
//! assert that a dry run never mutates anything.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use asyncport_core::LifecycleState;

use crate::error::{CatalogError, Result};
use crate::model::{ApplicationDomain, CatalogObject, CatalogVersion, ObjectKind};
use crate::service::{ObjectService, VersionService};

#[derive(Debug, Clone)]
struct StoredObject {
    id: String,
    name: String,
    parent_id: Option<String>,
    value: Value,
}

#[derive(Debug, Clone)]
struct StoredVersion {
    id: String,
    parent_id: String,
    version: String,
    value: Value,
}

#[derive(Debug, Default)]
struct Store {
    next_id: u64,
    objects: HashMap<ObjectKind, Vec<StoredObject>>,
    versions: HashMap<ObjectKind, Vec<StoredVersion>>,
    failing: HashSet<ObjectKind>,
}

impl Store {
    fn allocate_id(&mut self, kind: ObjectKind) -> String {
        self.next_id += 1;
        format!("{}-{:04}", kind.collection(), self.next_id)
    }

    fn object_exists(&self, id: &str) -> bool {
        self.objects
            .values()
            .flat_map(|objects| objects.iter())
            .any(|o| o.id == id)
    }

    fn check_failure(&self, kind: ObjectKind) -> Result<()> {
        if self.failing.contains(&kind) {
            return Err(CatalogError::Http {
                status: 500,
                message: format!("injected failure for {kind}"),
            });
        }
        Ok(())
    }
}

/// In-memory catalog backend for testing
#[derive(Clone, Default)]
pub struct MockCatalog {
    store: Arc<RwLock<Store>>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub lists: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub state_changes: usize,
}

impl OperationCounts {
    /// Calls that change catalog state
    pub fn mutations(&self) -> usize {
        self.creates + self.updates + self.deletes + self.state_changes
    }
}

impl MockCatalog {
    /// Create a new empty mock catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        let mut ops = self.operations.write().unwrap();
        *ops = OperationCounts::default();
    }

    /// Make every create/update of `kind` fail with a server error
    pub fn fail_writes_of(&self, kind: ObjectKind) {
        self.store.write().unwrap().failing.insert(kind);
    }

    /// All stored objects of one kind
    pub fn objects<T: CatalogObject>(&self) -> Vec<T> {
        let store = self.store.read().unwrap();
        store
            .objects
            .get(&T::KIND)
            .map(|objects| {
                objects
                    .iter()
                    .filter_map(|o| serde_json::from_value(o.value.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All stored versions of one kind
    pub fn versions<V: CatalogVersion>(&self) -> Vec<V> {
        let store = self.store.read().unwrap();
        store
            .versions
            .get(&V::KIND)
            .map(|versions| {
                versions
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.value.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of all application domains
    pub fn domain_names(&self) -> Vec<String> {
        self.objects::<ApplicationDomain>()
            .into_iter()
            .map(|d| d.name)
            .collect()
    }

    /// Count total objects and versions
    pub fn resource_count(&self) -> usize {
        let store = self.store.read().unwrap();
        store.objects.values().map(Vec::len).sum::<usize>()
            + store.versions.values().map(Vec::len).sum::<usize>()
    }

    fn count(&self, f: impl FnOnce(&mut OperationCounts)) {
        let mut ops = self.operations.write().unwrap();
        f(&mut ops);
    }
}

#[async_trait]
impl<T: CatalogObject> ObjectService<T> for MockCatalog {
    async fn get_by_name(&self, name: &str, parent_id: Option<&str>) -> Result<Option<T>> {
        self.count(|ops| ops.gets += 1);

        let store = self.store.read().unwrap();
        store
            .objects
            .get(&T::KIND)
            .and_then(|objects| {
                objects
                    .iter()
                    .find(|o| o.name == name && o.parent_id.as_deref() == parent_id)
            })
            .map(|o| serde_json::from_value(o.value.clone()))
            .transpose()
            .map_err(CatalogError::from)
    }

    async fn create(&self, object: &T) -> Result<T> {
        self.count(|ops| ops.creates += 1);

        let mut store = self.store.write().unwrap();
        store.check_failure(T::KIND)?;
        let parent_id = object.parent_id().map(String::from);
        let duplicate = store.objects.get(&T::KIND).is_some_and(|objects| {
            objects
                .iter()
                .any(|o| o.name == object.name() && o.parent_id == parent_id)
        });
        if duplicate {
            return Err(CatalogError::AlreadyExists {
                kind: T::KIND,
                name: object.name().to_string(),
            });
        }
        if let Some(parent) = &parent_id {
            if !store.object_exists(parent) {
                return Err(CatalogError::NotFound {
                    kind: ObjectKind::ApplicationDomain,
                    id: parent.clone(),
                });
            }
        }

        let id = store.allocate_id(T::KIND);
        let mut created = object.clone();
        created.set_id(id.clone());
        let value = serde_json::to_value(&created)?;
        store.objects.entry(T::KIND).or_default().push(StoredObject {
            id,
            name: created.name().to_string(),
            parent_id,
            value,
        });
        Ok(created)
    }

    async fn update(&self, id: &str, object: &T) -> Result<T> {
        self.count(|ops| ops.updates += 1);

        let mut store = self.store.write().unwrap();
        store.check_failure(T::KIND)?;
        let stored = store
            .objects
            .get_mut(&T::KIND)
            .and_then(|objects| objects.iter_mut().find(|o| o.id == id))
            .ok_or_else(|| CatalogError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })?;

        let mut updated = object.clone();
        updated.set_id(id.to_string());
        stored.name = updated.name().to_string();
        stored.value = serde_json::to_value(&updated)?;
        Ok(updated)
    }

    async fn delete_by_name(&self, name: &str, parent_id: Option<&str>) -> Result<Option<T>> {
        self.count(|ops| ops.deletes += 1);

        let mut store = self.store.write().unwrap();
        let Some(objects) = store.objects.get_mut(&T::KIND) else {
            return Ok(None);
        };
        let Some(index) = objects
            .iter()
            .position(|o| o.name == name && o.parent_id.as_deref() == parent_id)
        else {
            return Ok(None);
        };
        let removed = objects.remove(index);

        // Cascade: objects owned by the removed one, then versions of anything removed
        let mut removed_ids: HashSet<String> = HashSet::from([removed.id.clone()]);
        for objects in store.objects.values_mut() {
            objects.retain(|o| {
                let owned = o
                    .parent_id
                    .as_ref()
                    .is_some_and(|p| p == &removed.id);
                if owned {
                    removed_ids.insert(o.id.clone());
                }
                !owned
            });
        }
        for versions in store.versions.values_mut() {
            versions.retain(|v| !removed_ids.contains(&v.parent_id));
        }

        Ok(Some(serde_json::from_value(removed.value)?))
    }
}

#[async_trait]
impl<V: CatalogVersion> VersionService<V> for MockCatalog {
    async fn list_versions(&self, parent_id: &str) -> Result<Vec<V>> {
        self.count(|ops| ops.lists += 1);

        let store = self.store.read().unwrap();
        store
            .versions
            .get(&V::KIND)
            .map(|versions| {
                versions
                    .iter()
                    .filter(|v| v.parent_id == parent_id)
                    .map(|v| serde_json::from_value(v.value.clone()))
                    .collect::<std::result::Result<Vec<V>, _>>()
            })
            .transpose()
            .map(Option::unwrap_or_default)
            .map_err(CatalogError::from)
    }

    async fn get_version_by_version_string(
        &self,
        parent_id: &str,
        version: &str,
    ) -> Result<Option<V>> {
        self.count(|ops| ops.gets += 1);

        let store = self.store.read().unwrap();
        store
            .versions
            .get(&V::KIND)
            .and_then(|versions| {
                versions
                    .iter()
                    .find(|v| v.parent_id == parent_id && v.version == version)
            })
            .map(|v| serde_json::from_value(v.value.clone()))
            .transpose()
            .map_err(CatalogError::from)
    }

    async fn create_version(&self, version: &V) -> Result<V> {
        self.count(|ops| ops.creates += 1);

        let mut store = self.store.write().unwrap();
        store.check_failure(V::KIND)?;
        if !store.object_exists(version.parent_id()) {
            return Err(CatalogError::NotFound {
                kind: V::KIND,
                id: version.parent_id().to_string(),
            });
        }
        let duplicate = store.versions.get(&V::KIND).is_some_and(|versions| {
            versions
                .iter()
                .any(|v| v.parent_id == version.parent_id() && v.version == version.version())
        });
        if duplicate {
            return Err(CatalogError::AlreadyExists {
                kind: V::KIND,
                name: version.version().to_string(),
            });
        }

        let id = store.allocate_id(V::KIND);
        let mut created = version.clone();
        created.set_id(id.clone());
        created.set_state_id(LifecycleState::Draft.id().to_string());
        let value = serde_json::to_value(&created)?;
        store.versions.entry(V::KIND).or_default().push(StoredVersion {
            id,
            parent_id: created.parent_id().to_string(),
            version: created.version().to_string(),
            value,
        });
        Ok(created)
    }

    async fn set_version_state(
        &self,
        parent_id: &str,
        version_id: &str,
        state: LifecycleState,
    ) -> Result<()> {
        self.count(|ops| ops.state_changes += 1);

        let mut store = self.store.write().unwrap();
        let stored = store
            .versions
            .get_mut(&V::KIND)
            .and_then(|versions| {
                versions
                    .iter_mut()
                    .find(|v| v.id == version_id && v.parent_id == parent_id)
            })
            .ok_or_else(|| CatalogError::NotFound {
                kind: V::KIND,
                id: version_id.to_string(),
            })?;

        let mut version: V = serde_json::from_value(stored.value.clone())?;
        version.set_state_id(state.id().to_string());
        stored.value = serde_json::to_value(&version)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnumVersion, TopicEnum};

    fn domain(name: &str) -> ApplicationDomain {
        ApplicationDomain {
            id: None,
            name: name.to_string(),
            description: None,
        }
    }

    fn topic_enum(name: &str, domain_id: &str) -> TopicEnum {
        TopicEnum {
            id: None,
            name: name.to_string(),
            application_domain_id: domain_id.to_string(),
            shared: true,
        }
    }

    fn enum_version(enum_id: &str, version: &str) -> EnumVersion {
        EnumVersion {
            id: None,
            enum_id: enum_id.to_string(),
            version: version.to_string(),
            display_name: None,
            description: None,
            values: vec![],
            state_id: None,
        }
    }

    #[tokio::test]
    async fn test_mock_create_and_get() {
        let catalog = MockCatalog::new();

        let created = catalog.create(&domain("team-x")).await.unwrap();
        assert!(created.id.is_some());

        let found: Option<ApplicationDomain> = catalog.get_by_name("team-x", None).await.unwrap();
        assert_eq!(found, Some(created));

        let counts = catalog.operation_counts();
        assert_eq!(counts.creates, 1);
        assert_eq!(counts.gets, 1);
    }

    #[tokio::test]
    async fn test_mock_create_duplicate_fails() {
        let catalog = MockCatalog::new();

        catalog.create(&domain("team-x")).await.unwrap();
        let result = catalog.create(&domain("team-x")).await;
        assert!(matches!(result, Err(CatalogError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_mock_names_scoped_by_parent() {
        let catalog = MockCatalog::new();
        let a = catalog.create(&domain("a")).await.unwrap();
        let b = catalog.create(&domain("b")).await.unwrap();

        catalog
            .create(&topic_enum("region", a.id.as_deref().unwrap()))
            .await
            .unwrap();
        catalog
            .create(&topic_enum("region", b.id.as_deref().unwrap()))
            .await
            .unwrap();

        assert_eq!(catalog.objects::<TopicEnum>().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_versions_start_as_draft() {
        let catalog = MockCatalog::new();
        let d = catalog.create(&domain("a")).await.unwrap();
        let e = catalog
            .create(&topic_enum("region", d.id.as_deref().unwrap()))
            .await
            .unwrap();
        let enum_id = e.id.unwrap();

        let created = catalog
            .create_version(&enum_version(&enum_id, "1.0.0"))
            .await
            .unwrap();
        assert_eq!(created.state_id.as_deref(), Some("1"));

        VersionService::<EnumVersion>::set_version_state(
            &catalog,
            &enum_id,
            created.id.as_deref().unwrap(),
            LifecycleState::Released,
        )
        .await
        .unwrap();

        let fetched: Option<EnumVersion> = catalog
            .get_version_by_version_string(&enum_id, "1.0.0")
            .await
            .unwrap();
        assert_eq!(fetched.unwrap().state_id.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_mock_duplicate_version_fails() {
        let catalog = MockCatalog::new();
        let d = catalog.create(&domain("a")).await.unwrap();
        let e = catalog
            .create(&topic_enum("region", d.id.as_deref().unwrap()))
            .await
            .unwrap();
        let enum_id = e.id.unwrap();

        catalog
            .create_version(&enum_version(&enum_id, "1.0.0"))
            .await
            .unwrap();
        let result = catalog.create_version(&enum_version(&enum_id, "1.0.0")).await;
        assert!(matches!(result, Err(CatalogError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_mock_delete_cascades() {
        let catalog = MockCatalog::new();
        let d = catalog.create(&domain("a")).await.unwrap();
        let e = catalog
            .create(&topic_enum("region", d.id.as_deref().unwrap()))
            .await
            .unwrap();
        catalog
            .create_version(&enum_version(e.id.as_deref().unwrap(), "1.0.0"))
            .await
            .unwrap();
        assert_eq!(catalog.resource_count(), 3);

        let deleted: Option<ApplicationDomain> = catalog.delete_by_name("a", None).await.unwrap();
        assert!(deleted.is_some());
        assert_eq!(catalog.resource_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_delete_absent_is_none() {
        let catalog = MockCatalog::new();
        let deleted: Option<ApplicationDomain> =
            catalog.delete_by_name("missing", None).await.unwrap();
        assert!(deleted.is_none());
        assert_eq!(catalog.operation_counts().deletes, 1);
    }

    #[tokio::test]
    async fn test_mock_injected_failure() {
        let catalog = MockCatalog::new();
        catalog.fail_writes_of(ObjectKind::ApplicationDomain);
        let result = catalog.create(&domain("a")).await;
        assert!(matches!(result, Err(CatalogError::Http { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_mock_reset_counts() {
        let catalog = MockCatalog::new();
        catalog.create(&domain("a")).await.unwrap();
        assert_eq!(catalog.operation_counts().mutations(), 1);

        catalog.reset_counts();
        assert_eq!(catalog.operation_counts(), OperationCounts::default());
    }
}

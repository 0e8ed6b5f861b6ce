//! Reconciliation of named, unversioned catalog objects

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use asyncport_catalog::{CatalogObject, ObjectKind, ObjectService};

use crate::error::Result;
use crate::task::{
    CHECKMODE_PLACEHOLDER_ID, GetResult, Reconcile, TaskKeys, UpdateCheck, is_placeholder,
};

/// Per-kind comparison rules for catalog objects
pub trait ObjectContent: CatalogObject {
    /// Attributes the importer manages, compared between existing and requested
    fn compare_view(&self) -> Value;
}

/// Reconciles one object identified by `(name, parent)`
pub struct ObjectTask<T: ObjectContent> {
    service: Arc<dyn ObjectService<T>>,
    requested: T,
}

impl<T: ObjectContent> ObjectTask<T> {
    pub fn new(service: Arc<dyn ObjectService<T>>, requested: T) -> Self {
        Self { service, requested }
    }

    fn with_id(&self, id: &str) -> T {
        let mut object = self.requested.clone();
        object.set_id(id.to_string());
        object
    }
}

/// Keep only the fields the requested side sets
///
/// An attribute left unset in the request is not managed, so a value the
/// server holds for it is not a difference.
fn managed_view(existing: Value, requested: &Value) -> Value {
    match (existing, requested) {
        (Value::Object(existing), Value::Object(requested)) => Value::Object(
            existing
                .into_iter()
                .filter(|(key, _)| requested.get(key).is_some_and(|v| !v.is_null()))
                .collect(),
        ),
        (existing, _) => existing,
    }
}

#[async_trait]
impl<T: ObjectContent> Reconcile for ObjectTask<T> {
    type Object = T;

    fn kind(&self) -> ObjectKind {
        T::KIND
    }

    fn keys(&self) -> TaskKeys {
        let keys = TaskKeys::new().with("name", self.requested.name());
        match self.requested.parent_id() {
            Some(parent) => keys.with("domainId", parent),
            None => keys,
        }
    }

    async fn get(&mut self) -> Result<GetResult<T>> {
        let parent = self.requested.parent_id();
        if parent.is_some_and(is_placeholder) {
            return Ok(GetResult::Absent);
        }
        let found = self
            .service
            .get_by_name(self.requested.name(), parent)
            .await
            .map_err(|e| self.catalog_error(e))?;
        Ok(found.into())
    }

    async fn create(&mut self) -> Result<T> {
        self.service
            .create(&self.requested)
            .await
            .map_err(|e| self.catalog_error(e))
    }

    fn is_update_required(&self, existing: &T) -> Result<UpdateCheck> {
        let requested_view = self.requested.compare_view();
        let existing_view = managed_view(existing.compare_view(), &requested_view);
        Ok(UpdateCheck::from_views(existing_view, requested_view))
    }

    async fn update(&mut self, existing: &T) -> Result<T> {
        let id = existing
            .id()
            .ok_or_else(|| self.content_error("existing object has no id".to_string()))?;
        let merged = self.with_id(id);
        self.service
            .update(id, &merged)
            .await
            .map_err(|e| self.catalog_error(e))
    }

    fn create_placeholder(&self) -> Result<T> {
        Ok(self.with_id(CHECKMODE_PLACEHOLDER_ID))
    }

    fn update_placeholder(&self, existing: &T) -> Result<T> {
        Ok(self.with_id(existing.id().unwrap_or(CHECKMODE_PLACEHOLDER_ID)))
    }
}

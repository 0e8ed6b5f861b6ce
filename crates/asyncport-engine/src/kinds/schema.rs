//! Schemas and schema versions

use serde_json::{Value, json};

use asyncport_catalog::{Catalog, Schema, SchemaVersion};

use crate::object::{ObjectContent, ObjectTask};
use crate::versioned::{VersionContent, VersionPolicy, VersionedTask};

/// Schema type of JSON payload schemas
pub const JSON_SCHEMA_TYPE: &str = "jsonSchema";

impl ObjectContent for Schema {
    fn compare_view(&self) -> Value {
        json!({
            "shared": self.shared,
            "schemaType": self.schema_type,
            "contentType": self.content_type,
        })
    }
}

impl VersionContent for SchemaVersion {
    fn compare_view(&self) -> Value {
        // Compare parsed JSON so formatting and key order do not count as changes
        let content = serde_json::from_str::<Value>(&self.content)
            .unwrap_or_else(|_| Value::String(self.content.clone()));
        json!({
            "content": content,
            "displayName": self.display_name,
            "description": self.description,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSettings {
    pub name: String,
    pub domain_id: String,
    pub shared: bool,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaVersionSettings {
    pub schema_id: String,
    pub payload: Value,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub policy: VersionPolicy,
}

pub fn schema_task(catalog: &Catalog, settings: &SchemaSettings) -> ObjectTask<Schema> {
    ObjectTask::new(
        catalog.schemas.clone(),
        Schema {
            id: None,
            name: settings.name.clone(),
            application_domain_id: settings.domain_id.clone(),
            shared: settings.shared,
            schema_type: JSON_SCHEMA_TYPE.to_string(),
            content_type: settings.content_type.clone(),
        },
    )
}

pub fn schema_version_task(
    catalog: &Catalog,
    settings: &SchemaVersionSettings,
) -> VersionedTask<SchemaVersion> {
    VersionedTask::new(
        catalog.schema_versions.clone(),
        SchemaVersion {
            id: None,
            schema_id: settings.schema_id.clone(),
            version: String::new(),
            display_name: settings.display_name.clone(),
            description: settings.description.clone(),
            content: settings.payload.to_string(),
            state_id: None,
        },
        settings.policy.clone(),
    )
}

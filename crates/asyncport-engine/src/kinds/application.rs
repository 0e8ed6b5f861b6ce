//! Applications and application versions
//!
//! The application seen from the document's perspective: `subscribe`
//! operations are events it produces, `publish` operations events it
//! consumes.

use serde_json::{Value, json};

use asyncport_catalog::{Application, ApplicationVersion, Catalog};
use asyncport_core::sorted_ids;

use crate::object::{ObjectContent, ObjectTask};
use crate::versioned::{VersionContent, VersionPolicy, VersionedTask};

/// Application type of imported applications
pub const STANDARD_APPLICATION_TYPE: &str = "standard";

impl ObjectContent for Application {
    fn compare_view(&self) -> Value {
        json!({
            "applicationType": self.application_type,
            "brokerType": self.broker_type,
        })
    }
}

impl VersionContent for ApplicationVersion {
    fn compare_view(&self) -> Value {
        json!({
            "declaredProducedEventVersionIds": sorted_ids(&self.declared_produced_event_version_ids),
            "declaredConsumedEventVersionIds": sorted_ids(&self.declared_consumed_event_version_ids),
            "displayName": self.display_name,
            "description": self.description,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSettings {
    pub name: String,
    pub domain_id: String,
    pub broker_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationVersionSettings {
    pub application_id: String,
    pub produced_event_version_ids: Vec<String>,
    pub consumed_event_version_ids: Vec<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub policy: VersionPolicy,
}

pub fn application_task(
    catalog: &Catalog,
    settings: &ApplicationSettings,
) -> ObjectTask<Application> {
    ObjectTask::new(
        catalog.applications.clone(),
        Application {
            id: None,
            name: settings.name.clone(),
            application_domain_id: settings.domain_id.clone(),
            application_type: STANDARD_APPLICATION_TYPE.to_string(),
            broker_type: settings.broker_type.clone(),
        },
    )
}

pub fn application_version_task(
    catalog: &Catalog,
    settings: &ApplicationVersionSettings,
) -> VersionedTask<ApplicationVersion> {
    VersionedTask::new(
        catalog.application_versions.clone(),
        ApplicationVersion {
            id: None,
            application_id: settings.application_id.clone(),
            version: String::new(),
            display_name: settings.display_name.clone(),
            description: settings.description.clone(),
            declared_produced_event_version_ids: sorted_ids(&settings.produced_event_version_ids),
            declared_consumed_event_version_ids: sorted_ids(&settings.consumed_event_version_ids),
            state_id: None,
        },
        settings.policy.clone(),
    )
}

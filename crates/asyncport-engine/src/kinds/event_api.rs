//! Event APIs and event API versions
//!
//! One event API per document, named after the document title. Its version
//! must equal the document version and lists the event versions the
//! document's operations produce and consume.

use serde_json::{Value, json};

use asyncport_catalog::{Catalog, EventApi, EventApiVersion};
use asyncport_core::sorted_ids;

use crate::object::{ObjectContent, ObjectTask};
use crate::versioned::{VersionContent, VersionPolicy, VersionedTask};

impl ObjectContent for EventApi {
    fn compare_view(&self) -> Value {
        json!({
            "shared": self.shared,
            "brokerType": self.broker_type,
        })
    }
}

impl VersionContent for EventApiVersion {
    fn compare_view(&self) -> Value {
        json!({
            "producedEventVersionIds": sorted_ids(&self.produced_event_version_ids),
            "consumedEventVersionIds": sorted_ids(&self.consumed_event_version_ids),
            "displayName": self.display_name,
            "description": self.description,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventApiSettings {
    pub name: String,
    pub domain_id: String,
    pub shared: bool,
    pub broker_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventApiVersionSettings {
    pub event_api_id: String,
    pub produced_event_version_ids: Vec<String>,
    pub consumed_event_version_ids: Vec<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub policy: VersionPolicy,
}

pub fn event_api_task(catalog: &Catalog, settings: &EventApiSettings) -> ObjectTask<EventApi> {
    ObjectTask::new(
        catalog.event_apis.clone(),
        EventApi {
            id: None,
            name: settings.name.clone(),
            application_domain_id: settings.domain_id.clone(),
            shared: settings.shared,
            broker_type: settings.broker_type.clone(),
        },
    )
}

pub fn event_api_version_task(
    catalog: &Catalog,
    settings: &EventApiVersionSettings,
) -> VersionedTask<EventApiVersion> {
    VersionedTask::new(
        catalog.event_api_versions.clone(),
        EventApiVersion {
            id: None,
            event_api_id: settings.event_api_id.clone(),
            version: String::new(),
            display_name: settings.display_name.clone(),
            description: settings.description.clone(),
            produced_event_version_ids: sorted_ids(&settings.produced_event_version_ids),
            consumed_event_version_ids: sorted_ids(&settings.consumed_event_version_ids),
            state_id: None,
        },
        settings.policy.clone(),
    )
}

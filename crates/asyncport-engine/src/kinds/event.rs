//! Events and event versions
//!
//! An event version references the schema version of its message payload and
//! carries the channel topic as its delivery address. Event versions follow
//! the document version: a higher document version creates a new event
//! version even when nothing else changed.

use serde_json::{Value, json};

use asyncport_catalog::{
    Address, AddressLevelSpec, AddressLevelType, Catalog, DeliveryDescriptor, Event, EventVersion,
};
use asyncport_core::AddressLevel;

use crate::object::{ObjectContent, ObjectTask};
use crate::versioned::{VersionContent, VersionPolicy, VersionedTask};

/// Address type of topic-based delivery descriptors
pub const TOPIC_ADDRESS_TYPE: &str = "topic";

impl ObjectContent for Event {
    fn compare_view(&self) -> Value {
        json!({
            "shared": self.shared,
            "brokerType": self.broker_type,
        })
    }
}

impl VersionContent for EventVersion {
    fn compare_view(&self) -> Value {
        json!({
            "schemaVersionId": self.schema_version_id,
            "deliveryDescriptor": self.delivery_descriptor,
            "displayName": self.display_name,
            "description": self.description,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSettings {
    pub name: String,
    pub domain_id: String,
    pub shared: bool,
    pub broker_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventVersionSettings {
    pub event_id: String,
    pub schema_version_id: Option<String>,
    pub broker_type: String,
    pub address_levels: Vec<AddressLevelSpec>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub policy: VersionPolicy,
}

/// Address levels of a topic; variable levels resolve to enum versions through `enum_version_id`
pub fn address_levels<F>(levels: &[AddressLevel], enum_version_id: F) -> Vec<AddressLevelSpec>
where
    F: Fn(&str) -> Option<String>,
{
    levels
        .iter()
        .map(|level| match level {
            AddressLevel::Literal(name) => AddressLevelSpec {
                name: name.clone(),
                address_level_type: AddressLevelType::Literal,
                enum_version_id: None,
            },
            AddressLevel::Variable(name) => AddressLevelSpec {
                name: name.clone(),
                address_level_type: AddressLevelType::Variable,
                enum_version_id: enum_version_id(name),
            },
        })
        .collect()
}

pub fn event_task(catalog: &Catalog, settings: &EventSettings) -> ObjectTask<Event> {
    ObjectTask::new(
        catalog.events.clone(),
        Event {
            id: None,
            name: settings.name.clone(),
            application_domain_id: settings.domain_id.clone(),
            shared: settings.shared,
            broker_type: settings.broker_type.clone(),
        },
    )
}

pub fn event_version_task(
    catalog: &Catalog,
    settings: &EventVersionSettings,
) -> VersionedTask<EventVersion> {
    VersionedTask::new(
        catalog.event_versions.clone(),
        EventVersion {
            id: None,
            event_id: settings.event_id.clone(),
            version: String::new(),
            display_name: settings.display_name.clone(),
            description: settings.description.clone(),
            schema_version_id: settings.schema_version_id.clone(),
            delivery_descriptor: Some(DeliveryDescriptor {
                broker_type: settings.broker_type.clone(),
                address: Address {
                    address_type: TOPIC_ADDRESS_TYPE.to_string(),
                    address_levels: settings.address_levels.clone(),
                },
            }),
            state_id: None,
        },
        settings.policy.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use asyncport_core::topic_address_levels;

    #[test]
    fn test_address_levels_resolve_enums() {
        let levels = address_levels(&topic_address_levels("orders/{region}/created"), |name| {
            (name == "region").then(|| "ev-9".to_string())
        });

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].address_level_type, AddressLevelType::Literal);
        assert_eq!(levels[1].name, "region");
        assert_eq!(levels[1].address_level_type, AddressLevelType::Variable);
        assert_eq!(levels[1].enum_version_id.as_deref(), Some("ev-9"));
        assert_eq!(levels[2].enum_version_id, None);
    }
}

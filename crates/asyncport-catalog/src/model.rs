//! Catalog resource types
//!
//! Field names follow the Event Portal v2 wire format (camelCase). Identifiers
//! are assigned by the catalog on creation, so every `id` is optional on the
//! request side.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every resource kind the importer manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    ApplicationDomain,
    Enum,
    EnumVersion,
    Schema,
    SchemaVersion,
    Event,
    EventVersion,
    EventApi,
    EventApiVersion,
    Application,
    ApplicationVersion,
}

impl ObjectKind {
    /// REST collection under the architecture API
    pub fn collection(&self) -> &'static str {
        match self {
            Self::ApplicationDomain => "applicationDomains",
            Self::Enum => "enums",
            Self::EnumVersion => "enumVersions",
            Self::Schema => "schemas",
            Self::SchemaVersion => "schemaVersions",
            Self::Event => "events",
            Self::EventVersion => "eventVersions",
            Self::EventApi => "eventApis",
            Self::EventApiVersion => "eventApiVersions",
            Self::Application => "applications",
            Self::ApplicationVersion => "applicationVersions",
        }
    }

    /// Query parameter selecting versions by their parent object
    pub fn parent_query(&self) -> Option<&'static str> {
        match self {
            Self::EnumVersion => Some("enumIds"),
            Self::SchemaVersion => Some("schemaIds"),
            Self::EventVersion => Some("eventIds"),
            Self::EventApiVersion => Some("eventApiIds"),
            Self::ApplicationVersion => Some("applicationIds"),
            _ => None,
        }
    }

    pub fn is_version(&self) -> bool {
        self.parent_query().is_some()
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ApplicationDomain => "application domain",
            Self::Enum => "enum",
            Self::EnumVersion => "enum version",
            Self::Schema => "schema",
            Self::SchemaVersion => "schema version",
            Self::Event => "event",
            Self::EventVersion => "event version",
            Self::EventApi => "event API",
            Self::EventApiVersion => "event API version",
            Self::Application => "application",
            Self::ApplicationVersion => "application version",
        };
        write!(f, "{}", s)
    }
}

/// A named catalog object, identified by `(name, parent)`
pub trait CatalogObject:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: ObjectKind;

    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: String);
    fn name(&self) -> &str;
    /// Owning application domain (`None` for domains themselves)
    fn parent_id(&self) -> Option<&str>;
}

/// A version of a catalog object, identified by `(parent, version)`
pub trait CatalogVersion:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: ObjectKind;

    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: String);
    fn parent_id(&self) -> &str;
    fn version(&self) -> &str;
    fn set_version(&mut self, version: String);
    fn state_id(&self) -> Option<&str>;
    fn set_state_id(&mut self, state_id: String);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicEnum {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub application_domain_id: String,
    #[serde(default)]
    pub shared: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnumValue {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub enum_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub values: Vec<EnumValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub application_domain_id: String,
    #[serde(default)]
    pub shared: bool,
    pub schema_type: String,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub schema_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub application_domain_id: String,
    #[serde(default)]
    pub shared: bool,
    pub broker_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressLevelType {
    Literal,
    Variable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressLevelSpec {
    pub name: String,
    pub address_level_type: AddressLevelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_version_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address_type: String,
    pub address_levels: Vec<AddressLevelSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDescriptor {
    pub broker_type: String,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub event_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_descriptor: Option<DeliveryDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventApi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub application_domain_id: String,
    #[serde(default)]
    pub shared: bool,
    pub broker_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventApiVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub event_api_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub produced_event_version_ids: Vec<String>,
    #[serde(default)]
    pub consumed_event_version_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub application_domain_id: String,
    pub application_type: String,
    pub broker_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub application_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub declared_produced_event_version_ids: Vec<String>,
    #[serde(default)]
    pub declared_consumed_event_version_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

impl CatalogObject for ApplicationDomain {
    const KIND: ObjectKind = ObjectKind::ApplicationDomain;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn parent_id(&self) -> Option<&str> {
        None
    }
}

macro_rules! domain_object {
    ($ty:ty, $kind:expr) => {
        impl CatalogObject for $ty {
            const KIND: ObjectKind = $kind;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn set_id(&mut self, id: String) {
                self.id = Some(id);
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn parent_id(&self) -> Option<&str> {
                Some(&self.application_domain_id)
            }
        }
    };
}

domain_object!(TopicEnum, ObjectKind::Enum);
domain_object!(Schema, ObjectKind::Schema);
domain_object!(Event, ObjectKind::Event);
domain_object!(EventApi, ObjectKind::EventApi);
domain_object!(Application, ObjectKind::Application);

macro_rules! object_version {
    ($ty:ty, $kind:expr, $parent:ident) => {
        impl CatalogVersion for $ty {
            const KIND: ObjectKind = $kind;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn set_id(&mut self, id: String) {
                self.id = Some(id);
            }

            fn parent_id(&self) -> &str {
                &self.$parent
            }

            fn version(&self) -> &str {
                &self.version
            }

            fn set_version(&mut self, version: String) {
                self.version = version;
            }

            fn state_id(&self) -> Option<&str> {
                self.state_id.as_deref()
            }

            fn set_state_id(&mut self, state_id: String) {
                self.state_id = Some(state_id);
            }
        }
    };
}

object_version!(EnumVersion, ObjectKind::EnumVersion, enum_id);
object_version!(SchemaVersion, ObjectKind::SchemaVersion, schema_id);
object_version!(EventVersion, ObjectKind::EventVersion, event_id);
object_version!(EventApiVersion, ObjectKind::EventApiVersion, event_api_id);
object_version!(ApplicationVersion, ObjectKind::ApplicationVersion, application_id);

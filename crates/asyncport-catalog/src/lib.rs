//! asyncport Catalog - resource model and service clients for the event catalog
//!
//! This crate provides:
//! - **Resource Model**: Typed application domains, enums, schemas, events, event APIs,
//!   applications and their versions, in the catalog's wire format
//! - **Service Contract**: Async lookup/create/update/delete traits per resource kind
//! - **REST Backend**: [`HttpCatalog`] for the Event Portal v2 architecture API
//! - **Mock Backend**: [`MockCatalog`], an in-memory recording catalog for tests

pub mod error;
pub mod http;
pub mod mock;
pub mod model;
pub mod service;

pub use error::{CatalogError, Result};
pub use http::{DEFAULT_API_URL, HttpCatalog, HttpCatalogConfig};
pub use mock::{MockCatalog, OperationCounts};
pub use model::{
    Address, AddressLevelSpec, AddressLevelType, Application, ApplicationDomain,
    ApplicationVersion, CatalogObject, CatalogVersion, DeliveryDescriptor, EnumValue, EnumVersion,
    Event, EventApi, EventApiVersion, EventVersion, ObjectKind, Schema, SchemaVersion, TopicEnum,
};
pub use service::{Catalog, CatalogBackend, ObjectService, VersionService};

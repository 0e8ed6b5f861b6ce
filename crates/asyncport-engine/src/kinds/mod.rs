//! Per-kind tasks
//!
//! Each module provides the comparison rules of one resource kind, its
//! settings and builders for its object task and, where versioned, its
//! version task.

pub mod application;
pub mod domain;
pub mod enums;
pub mod event;
pub mod event_api;
pub mod schema;

pub use application::{
    ApplicationSettings, ApplicationVersionSettings, application_task, application_version_task,
};
pub use domain::{DomainSettings, delete_domain_by_name, domain_task};
pub use enums::{EnumSettings, EnumVersionSettings, enum_task, enum_version_task};
pub use event::{
    EventSettings, EventVersionSettings, address_levels, event_task, event_version_task,
};
pub use event_api::{
    EventApiSettings, EventApiVersionSettings, event_api_task, event_api_version_task,
};
pub use schema::{SchemaSettings, SchemaVersionSettings, schema_task, schema_version_task};

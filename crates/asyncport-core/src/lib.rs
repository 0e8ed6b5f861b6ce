//! asyncport Core - foundational types for importing AsyncAPI documents into an event catalog
//!
//! This crate provides:
//! - `version`: Semantic version ordering and bump strategies
//! - `compare`: Structural change detection between resource projections
//! - `document`: Read-only AsyncAPI 2.x document model
//! - `settings`: Typed import settings with per-document overrides

pub mod compare;
pub mod document;
pub mod error;
pub mod settings;
pub mod version;

pub use compare::{Comparison, FieldChange, compare, sorted_ids, strip_nulls};
pub use document::{
    AddressLevel, AsyncApiDocument, Channel, Direction, Message, Operation, Parameter,
    topic_address_levels,
};
pub use error::{CoreError, Result};
pub use settings::{
    DEFAULT_BROKER_TYPE, DEFAULT_TEST_DOMAIN_PREFIX, ImportSettings, LifecycleState,
    SettingsOverride,
};
pub use version::{
    BumpStrategy, INITIAL_VERSION, VersionStrategy, compare_versions, is_greater, is_valid_semver,
    latest_version, next_version, parse_version,
};

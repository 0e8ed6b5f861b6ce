//! Typed import settings
//!
//! Global defaults come from the command line; a document may override a
//! subset of them through `info` extensions. [`ImportSettings::merged`] is the
//! single place where the two are combined.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::version::BumpStrategy;

/// Default prefix prepended to domain names during test runs
pub const DEFAULT_TEST_DOMAIN_PREFIX: &str = "asyncport/test/";

/// Default broker type for events, event APIs and applications
pub const DEFAULT_BROKER_TYPE: &str = "solace";

/// Lifecycle state of a catalog version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Draft,
    #[default]
    Released,
    Deprecated,
    Retired,
}

impl LifecycleState {
    /// State identifier used by the catalog API
    pub fn id(&self) -> &'static str {
        match self {
            Self::Draft => "1",
            Self::Released => "2",
            Self::Deprecated => "3",
            Self::Retired => "4",
        }
    }

    /// Resolve a catalog state identifier
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "1" => Some(Self::Draft),
            "2" => Some(Self::Released),
            "3" => Some(Self::Deprecated),
            "4" => Some(Self::Retired),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Released => "released",
            Self::Deprecated => "deprecated",
            Self::Retired => "retired",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for LifecycleState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "released" => Ok(Self::Released),
            "deprecated" => Ok(Self::Deprecated),
            "retired" => Ok(Self::Retired),
            _ => Err(CoreError::UnknownSetting {
                setting: "lifecycle state",
                value: s.to_string(),
                expected: "draft, released, deprecated, retired",
            }),
        }
    }
}

/// Effective settings for importing one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSettings {
    /// Mark enums, schemas, events and event APIs as shared (default: `true`)
    pub shared: bool,

    /// Lifecycle state every new version is moved to (default: `released`)
    pub target_state: LifecycleState,

    /// Strategy for versions whose content changed (default: `bump_patch`)
    pub version_strategy: BumpStrategy,

    /// Create an event API per document (default: `true`)
    pub create_event_api: bool,

    /// Create an application per document (default: `true`)
    pub create_application: bool,

    /// Prefix for domain names in test runs (default: `asyncport/test/`)
    pub test_domain_prefix: String,

    /// Broker type of events, event APIs and applications (default: `solace`)
    pub broker_type: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            shared: true,
            target_state: LifecycleState::Released,
            version_strategy: BumpStrategy::Patch,
            create_event_api: true,
            create_application: true,
            test_domain_prefix: DEFAULT_TEST_DOMAIN_PREFIX.to_string(),
            broker_type: DEFAULT_BROKER_TYPE.to_string(),
        }
    }
}

/// Per-document overrides; `None` keeps the global value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsOverride {
    pub shared: Option<bool>,
    pub target_state: Option<LifecycleState>,
    pub version_strategy: Option<BumpStrategy>,
}

impl SettingsOverride {
    /// True if no field is overridden
    pub fn is_empty(&self) -> bool {
        self.shared.is_none() && self.target_state.is_none() && self.version_strategy.is_none()
    }
}

impl ImportSettings {
    /// Combine these settings with a document override
    pub fn merged(&self, overrides: &SettingsOverride) -> Self {
        Self {
            shared: overrides.shared.unwrap_or(self.shared),
            target_state: overrides.target_state.unwrap_or(self.target_state),
            version_strategy: overrides.version_strategy.unwrap_or(self.version_strategy),
            ..self.clone()
        }
    }

    /// Domain name as used in a test run
    pub fn test_domain_name(&self, domain_name: &str) -> String {
        format!("{}{}", self.test_domain_prefix, domain_name)
    }
}

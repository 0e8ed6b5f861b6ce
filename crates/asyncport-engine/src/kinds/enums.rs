//! Topic enums and enum versions
//!
//! Channel parameters with an enumerated value list become enums whose
//! versions hold the values; event address levels reference the enum version.

use serde_json::{Value, json};

use asyncport_catalog::{Catalog, EnumValue, EnumVersion, TopicEnum};

use crate::object::{ObjectContent, ObjectTask};
use crate::versioned::{VersionContent, VersionPolicy, VersionedTask};

impl ObjectContent for TopicEnum {
    fn compare_view(&self) -> Value {
        json!({ "shared": self.shared })
    }
}

impl VersionContent for EnumVersion {
    fn compare_view(&self) -> Value {
        let mut values = self.values.clone();
        values.sort();
        json!({
            "values": values,
            "displayName": self.display_name,
            "description": self.description,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSettings {
    pub name: String,
    pub domain_id: String,
    pub shared: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVersionSettings {
    pub enum_id: String,
    pub values: Vec<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub policy: VersionPolicy,
}

pub fn enum_task(catalog: &Catalog, settings: &EnumSettings) -> ObjectTask<TopicEnum> {
    ObjectTask::new(
        catalog.enums.clone(),
        TopicEnum {
            id: None,
            name: settings.name.clone(),
            application_domain_id: settings.domain_id.clone(),
            shared: settings.shared,
        },
    )
}

pub fn enum_version_task(
    catalog: &Catalog,
    settings: &EnumVersionSettings,
) -> VersionedTask<EnumVersion> {
    let values = settings
        .values
        .iter()
        .map(|value| EnumValue {
            value: value.clone(),
            label: value.clone(),
        })
        .collect();

    VersionedTask::new(
        catalog.enum_versions.clone(),
        EnumVersion {
            id: None,
            enum_id: settings.enum_id.clone(),
            version: String::new(),
            display_name: settings.display_name.clone(),
            description: settings.description.clone(),
            values,
            state_id: None,
        },
        settings.policy.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(values: &[&str]) -> EnumVersion {
        EnumVersion {
            id: None,
            enum_id: "e-1".to_string(),
            version: "1.0.0".to_string(),
            display_name: None,
            description: None,
            values: values
                .iter()
                .map(|v| EnumValue {
                    value: v.to_string(),
                    label: v.to_string(),
                })
                .collect(),
            state_id: None,
        }
    }

    #[test]
    fn test_value_order_is_irrelevant() {
        assert_eq!(
            version(&["eu", "us"]).compare_view(),
            version(&["us", "eu"]).compare_view()
        );
        assert_ne!(
            version(&["eu", "us"]).compare_view(),
            version(&["eu"]).compare_view()
        );
    }
}

//! Application domains

use serde_json::{Value, json};

use asyncport_catalog::{ApplicationDomain, Catalog, CatalogError};

use crate::object::{ObjectContent, ObjectTask};

impl ObjectContent for ApplicationDomain {
    fn compare_view(&self) -> Value {
        json!({ "description": self.description })
    }
}

/// Requested state of an application domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSettings {
    pub name: String,
    /// Managed only when set
    pub description: Option<String>,
}

impl DomainSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

pub fn domain_task(catalog: &Catalog, settings: &DomainSettings) -> ObjectTask<ApplicationDomain> {
    ObjectTask::new(
        catalog.domains.clone(),
        ApplicationDomain {
            id: None,
            name: settings.name.clone(),
            description: settings.description.clone(),
        },
    )
}

/// Delete a domain and everything it owns; an absent domain yields `Ok(None)`
pub async fn delete_domain_by_name(
    catalog: &Catalog,
    name: &str,
) -> Result<Option<ApplicationDomain>, CatalogError> {
    let deleted = catalog.domains.delete_by_name(name, None).await?;
    match &deleted {
        Some(_) => tracing::info!(domain = name, "deleted application domain"),
        None => tracing::debug!(domain = name, "application domain already absent"),
    }
    Ok(deleted)
}

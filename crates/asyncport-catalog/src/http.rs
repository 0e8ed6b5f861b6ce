//! REST client for the Event Portal v2 architecture API
//!
//! Every resource kind lives under its own collection below the base URL and
//! every response wraps its payload in a `{ "data": ... }` envelope.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use asyncport_core::LifecycleState;

use crate::error::{CatalogError, Result};
use crate::model::{CatalogObject, CatalogVersion, ObjectKind};
use crate::service::{ObjectService, VersionService};

/// Default API base URL
pub const DEFAULT_API_URL: &str = "https://api.solace.cloud/api/v2/architecture";

/// Connection settings for [`HttpCatalog`]
#[derive(Debug, Clone)]
pub struct HttpCatalogConfig {
    /// Base URL of the architecture API
    pub base_url: String,
    /// Bearer token
    pub token: String,
    /// Request timeout
    pub timeout: Duration,
}

impl HttpCatalogConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// Catalog backend talking to the REST API
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl HttpCatalog {
    /// Create a new REST backend
    pub fn new(config: HttpCatalogConfig) -> Result<Self> {
        // A trailing slash keeps `Url::join` from dropping the last path segment
        let normalized = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| CatalogError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("asyncport/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: config.token,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(&self.token)
    }

    async fn send<T: DeserializeOwned>(&self, kind: ObjectKind, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Http {
                status: status.as_u16(),
                message,
            });
        }
        let envelope: Envelope<T> = response.json().await?;
        envelope.data.ok_or_else(|| CatalogError::MissingField {
            kind,
            field: "data".to_string(),
        })
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(CatalogError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

/// Reject server responses that lack an identifier
fn require_id<T: CatalogObject>(object: T) -> Result<T> {
    match object.id() {
        Some(_) => Ok(object),
        None => Err(CatalogError::MissingField {
            kind: T::KIND,
            field: "id".to_string(),
        }),
    }
}

fn require_version_id<V: CatalogVersion>(version: V) -> Result<V> {
    match version.id() {
        Some(_) => Ok(version),
        None => Err(CatalogError::MissingField {
            kind: V::KIND,
            field: "id".to_string(),
        }),
    }
}

#[async_trait]
impl<T: CatalogObject> ObjectService<T> for HttpCatalog {
    async fn get_by_name(&self, name: &str, parent_id: Option<&str>) -> Result<Option<T>> {
        let mut url = self.url(T::KIND.collection())?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("name", name);
            if let Some(parent_id) = parent_id {
                query.append_pair("applicationDomainId", parent_id);
            }
        }
        tracing::debug!(kind = %T::KIND, name, "get by name");

        let found: Vec<T> = self.send(T::KIND, self.request(Method::GET, url)).await?;
        found
            .into_iter()
            .find(|object| object.name() == name)
            .map(require_id)
            .transpose()
    }

    async fn create(&self, object: &T) -> Result<T> {
        let url = self.url(T::KIND.collection())?;
        tracing::debug!(kind = %T::KIND, name = object.name(), "create");
        let created: T = self
            .send(T::KIND, self.request(Method::POST, url).json(object))
            .await?;
        require_id(created)
    }

    async fn update(&self, id: &str, object: &T) -> Result<T> {
        let url = self.url(&format!("{}/{}", T::KIND.collection(), id))?;
        tracing::debug!(kind = %T::KIND, id, "update");
        let updated: T = self
            .send(T::KIND, self.request(Method::PATCH, url).json(object))
            .await?;
        require_id(updated)
    }

    async fn delete_by_name(&self, name: &str, parent_id: Option<&str>) -> Result<Option<T>> {
        let Some(existing) = ObjectService::<T>::get_by_name(self, name, parent_id).await? else {
            return Ok(None);
        };
        let Some(id) = existing.id() else {
            return Ok(None);
        };
        let url = self.url(&format!("{}/{}", T::KIND.collection(), id))?;
        tracing::debug!(kind = %T::KIND, name, id, "delete");
        self.send_empty(self.request(Method::DELETE, url)).await?;
        Ok(Some(existing))
    }
}

#[async_trait]
impl<V: CatalogVersion> VersionService<V> for HttpCatalog {
    async fn list_versions(&self, parent_id: &str) -> Result<Vec<V>> {
        let mut url = self.url(V::KIND.collection())?;
        if let Some(param) = V::KIND.parent_query() {
            url.query_pairs_mut().append_pair(param, parent_id);
        }
        tracing::debug!(kind = %V::KIND, parent_id, "list versions");

        let versions: Vec<V> = self.send(V::KIND, self.request(Method::GET, url)).await?;
        versions
            .into_iter()
            .filter(|v| v.parent_id() == parent_id)
            .map(require_version_id)
            .collect()
    }

    async fn create_version(&self, version: &V) -> Result<V> {
        let url = self.url(V::KIND.collection())?;
        tracing::debug!(kind = %V::KIND, version = version.version(), "create version");
        let created: V = self
            .send(V::KIND, self.request(Method::POST, url).json(version))
            .await?;
        require_version_id(created)
    }

    async fn set_version_state(
        &self,
        _parent_id: &str,
        version_id: &str,
        state: LifecycleState,
    ) -> Result<()> {
        let url = self.url(&format!("{}/{}/state", V::KIND.collection(), version_id))?;
        tracing::debug!(kind = %V::KIND, version_id, %state, "set version state");
        let body = serde_json::json!({ "stateId": state.id() });
        let _ack: serde_json::Value = self
            .send(V::KIND, self.request(Method::PATCH, url).json(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApplicationDomain, EnumVersion, TopicEnum};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn catalog(server: &MockServer) -> HttpCatalog {
        HttpCatalog::new(HttpCatalogConfig::new(
            format!("{}/api/v2/architecture", server.uri()),
            "secret",
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_by_name_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/architecture/enums"))
            .and(query_param("name", "region"))
            .and(query_param("applicationDomainId", "d-1"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "e-1", "name": "region", "applicationDomainId": "d-1", "shared": true}]
            })))
            .mount(&server)
            .await;

        let catalog = catalog(&server).await;
        let found: Option<TopicEnum> = catalog.get_by_name("region", Some("d-1")).await.unwrap();
        assert_eq!(found.unwrap().id.as_deref(), Some("e-1"));
    }

    #[tokio::test]
    async fn test_get_by_name_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/architecture/applicationDomains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let catalog = catalog(&server).await;
        let found: Option<ApplicationDomain> = catalog.get_by_name("team-x", None).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_create_without_id_is_content_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/architecture/applicationDomains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"name": "team-x"}
            })))
            .mount(&server)
            .await;

        let catalog = catalog(&server).await;
        let domain = ApplicationDomain {
            id: None,
            name: "team-x".to_string(),
            description: None,
        };
        let err = ObjectService::<ApplicationDomain>::create(&catalog, &domain)
            .await
            .unwrap_err();
        assert!(err.is_content_error());
        assert!(matches!(err, CatalogError::MissingField { field, .. } if field == "id"));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/architecture/applicationDomains"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad name"))
            .mount(&server)
            .await;

        let catalog = catalog(&server).await;
        let domain = ApplicationDomain {
            id: None,
            name: "".to_string(),
            description: None,
        };
        let err = ObjectService::<ApplicationDomain>::create(&catalog, &domain)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Http { status: 400, message } if message == "bad name"));
    }

    #[tokio::test]
    async fn test_delete_by_name_absent_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/architecture/applicationDomains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let catalog = catalog(&server).await;
        let deleted: Option<ApplicationDomain> =
            catalog.delete_by_name("gone", None).await.unwrap();
        assert!(deleted.is_none());
    }

    #[tokio::test]
    async fn test_list_versions_and_set_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/architecture/enumVersions"))
            .and(query_param("enumIds", "e-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "ev-1", "enumId": "e-1", "version": "1.0.0", "values": [], "stateId": "2"},
                    {"id": "ev-2", "enumId": "e-1", "version": "1.0.1", "values": [], "stateId": "1"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v2/architecture/enumVersions/ev-2/state"))
            .and(body_partial_json(json!({"stateId": "2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"stateId": "2"}})))
            .expect(1)
            .mount(&server)
            .await;

        let catalog = catalog(&server).await;
        let versions: Vec<EnumVersion> = catalog.list_versions("e-1").await.unwrap();
        assert_eq!(versions.len(), 2);

        let found: Option<EnumVersion> = catalog
            .get_version_by_version_string("e-1", "1.0.1")
            .await
            .unwrap();
        assert_eq!(found.unwrap().id.as_deref(), Some("ev-2"));

        VersionService::<EnumVersion>::set_version_state(
            &catalog,
            "e-1",
            "ev-2",
            LifecycleState::Released,
        )
        .await
        .unwrap();
    }
}

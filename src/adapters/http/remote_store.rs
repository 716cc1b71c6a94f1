//! HTTP remote store - `RemoteStore` over a JSON REST API.
//!
//! # Routes
//!
//! | Operation | Request |
//! |---|---|
//! | `fetch(resource, filters)` | `GET {base}/{resource}?{filters}` |
//! | `mutate(resource, Create, body)` | `POST {base}/{resource}` |
//! | `mutate(resource, Update, body)` | `PATCH {base}/{resource}` |
//! | `mutate(resource, Delete, body)` | `DELETE {base}/{resource}` |
//!
//! `404` on a fetch is a miss (`Ok(None)`); an empty success body on a
//! mutation is `Value::Null`.

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::domain::cache::Filters;
use crate::domain::policy::Action;
use crate::ports::{RemoteError, RemoteStore};

/// Configuration for [`HttpRemoteStore`].
#[derive(Debug, Clone)]
pub struct HttpRemoteConfig {
    /// API root; resources are resolved beneath it.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    auth_token: Option<SecretString>,
}

impl HttpRemoteConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(15),
            auth_token: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_auth_token(mut self, token: SecretString) -> Self {
        self.auth_token = Some(token);
        self
    }
}

/// `RemoteStore` backed by a REST API.
pub struct HttpRemoteStore {
    config: HttpRemoteConfig,
    http_client: Client,
}

impl HttpRemoteStore {
    pub fn new(config: HttpRemoteConfig) -> Result<Self, RemoteError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn resource_url(&self, resource: &str) -> Result<Url, RemoteError> {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        let resource = resource.trim_start_matches('/');
        Url::parse(&format!("{base}/{resource}"))
            .map_err(|e| RemoteError::Network(format!("invalid resource URL: {e}")))
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http_client.request(method, url);
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch(&self, resource: &str, filters: &Filters) -> Result<Option<Value>, RemoteError> {
        let url = self.resource_url(resource)?;

        let response = self
            .request(Method::GET, url)
            .query(filters)
            .send()
            .await
            .map_err(network_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(resource, "Remote miss");
            return Ok(None);
        }

        let response = ensure_success(response).await?;
        let body = decode_body(response).await?;
        Ok(Some(body))
    }

    async fn mutate(
        &self,
        resource: &str,
        action: Action,
        patch: &Value,
    ) -> Result<Value, RemoteError> {
        let url = self.resource_url(resource)?;
        let method = match action {
            Action::Create => Method::POST,
            Action::Update => Method::PATCH,
            Action::Delete => Method::DELETE,
            Action::Read => Method::GET,
        };

        let response = self
            .request(method, url)
            .json(patch)
            .send()
            .await
            .map_err(network_error)?;

        let response = ensure_success(response).await?;
        decode_body(response).await
    }
}

fn network_error(e: reqwest::Error) -> RemoteError {
    RemoteError::Network(e.to_string())
}

async fn ensure_success(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), %message, "Remote store rejected request");
    Err(RemoteError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode_body(response: Response) -> Result<Value, RemoteError> {
    let bytes = response.bytes().await.map_err(network_error)?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base: &str) -> HttpRemoteStore {
        HttpRemoteStore::new(HttpRemoteConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn resource_url_joins_without_double_slash() {
        let store = store("http://localhost:8080/api/");
        assert_eq!(
            store.resource_url("/clients").unwrap().as_str(),
            "http://localhost:8080/api/clients"
        );
    }

    #[test]
    fn resource_url_keeps_nested_paths() {
        let store = store("http://localhost:8080/api");
        assert_eq!(
            store.resource_url("clients/42").unwrap().as_str(),
            "http://localhost:8080/api/clients/42"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = store(&format!("http://{addr}/api"));
        let result = store.fetch("clients", &Filters::new()).await;
        assert!(matches!(result, Err(RemoteError::Network(_))));
    }
}

//! Thin HTTP client for the remote cache REST surface.
//!
//! One method per remote operation, no local state between calls beyond
//! the pooled `reqwest::Client`. All policy lives a layer up: this module
//! translates calls to requests and responses to typed results.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use cachewarden_core::config::{HttpConfig, RemoteConfig};
use cachewarden_core::{CacheService, DeleteSelector, Error, Result, SearchMatch};

use crate::retry::RetryPolicy;

/// HTTP client for the remote semantic cache service.
#[derive(Debug)]
pub struct RemoteCacheClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Secret<String>,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes: Option<&'a HashMap<String, String>>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    matches: Vec<SearchMatch>,
}

#[derive(Serialize)]
struct StoreRequest<'a> {
    prompt: &'a str,
    response: &'a str,
    attributes: &'a HashMap<String, String>,
}

#[derive(Deserialize)]
struct StoreResponse {
    id: String,
}

#[derive(Serialize)]
struct BulkDeleteRequest<'a> {
    attributes: &'a HashMap<String, String>,
}

#[derive(Deserialize)]
struct DeletedResponse {
    #[serde(default)]
    deleted: u64,
}

impl RemoteCacheClient {
    /// Build a client from configuration.
    ///
    /// Host, cache id, and api key are validated for presence here, so a
    /// broken deployment fails with a configuration error before any
    /// request goes out.
    pub fn new(remote: &RemoteConfig, http: &HttpConfig) -> Result<Self> {
        remote.validate()?;
        // validate() has checked presence
        let api_key = remote
            .api_key
            .clone()
            .ok_or_else(|| Error::configuration("remote cache api key is not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(http.timeout_ms))
            .build()
            .map_err(|e| Error::configuration(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http: client,
            base_url: format!(
                "{}/v1/caches/{}",
                remote.host.trim_end_matches('/'),
                remote.cache_id
            ),
            api_key,
            retry: RetryPolicy::from(http),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(self.api_key.expose_secret())
    }

    async fn search_once(
        &self,
        query: &str,
        threshold: f64,
        attributes: Option<&HashMap<String, String>>,
    ) -> Result<Vec<SearchMatch>> {
        let resp = self
            .request(Method::POST, "/entries/search")
            .json(&SearchRequest {
                query,
                threshold,
                attributes,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let resp = check_status(resp).await?;
        let body: SearchResponse = resp.json().await.map_err(transport_error)?;
        Ok(body.matches)
    }

    async fn delete_by_id(&self, id: &str) -> Result<u64> {
        // Ids are opaque remote-assigned strings; encode so one containing
        // a path delimiter cannot target a different route.
        let resp = self
            .request(Method::DELETE, &format!("/entries/{}", urlencoding::encode(id)))
            .send()
            .await
            .map_err(transport_error)?;

        // Deleting a nonexistent id is not an error.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }
        let resp = check_status(resp).await?;
        let body: DeletedResponse = resp.json().await.map_err(transport_error)?;
        Ok(body.deleted)
    }

    async fn delete_by_attributes(&self, attributes: &HashMap<String, String>) -> Result<u64> {
        let resp = self
            .request(Method::DELETE, "/entries")
            .json(&BulkDeleteRequest { attributes })
            .send()
            .await
            .map_err(transport_error)?;

        let resp = check_status(resp).await?;
        let body: DeletedResponse = resp.json().await.map_err(transport_error)?;
        Ok(body.deleted)
    }

    async fn flush_once(&self) -> Result<u64> {
        let resp = self
            .request(Method::POST, "/flush")
            .send()
            .await
            .map_err(transport_error)?;

        let resp = check_status(resp).await?;
        let body: DeletedResponse = resp.json().await.map_err(transport_error)?;
        Ok(body.deleted)
    }
}

#[async_trait]
impl CacheService for RemoteCacheClient {
    async fn search(
        &self,
        query: &str,
        threshold: f64,
        attribute_filter: Option<&HashMap<String, String>>,
    ) -> Result<Vec<SearchMatch>> {
        self.retry
            .run(|| self.search_once(query, threshold, attribute_filter))
            .await
    }

    async fn store(
        &self,
        prompt: &str,
        response: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<String> {
        // Never auto-retried: a blind retry could create duplicate entries.
        let resp = self
            .request(Method::POST, "/entries")
            .json(&StoreRequest {
                prompt,
                response,
                attributes,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let resp = check_status(resp).await?;
        let body: StoreResponse = resp.json().await.map_err(transport_error)?;
        tracing::debug!(id = %body.id, "stored cache entry");
        Ok(body.id)
    }

    async fn delete(&self, selector: &DeleteSelector) -> Result<u64> {
        match selector {
            // Delete by id is idempotent, safe to retry.
            DeleteSelector::ById(id) => self.retry.run(|| self.delete_by_id(id)).await,
            DeleteSelector::ByAttributes(attributes) => {
                self.delete_by_attributes(attributes).await
            }
        }
    }

    async fn flush(&self) -> Result<u64> {
        self.retry.run(|| self.flush_once()).await
    }
}

/// Map a non-2xx response to a typed remote error, passing 2xx through.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::remote(status.as_u16(), body))
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::transport(format!("request timed out: {err}"))
    } else if err.is_connect() {
        Error::transport(format!("connection failed: {err}"))
    } else {
        Error::transport(err.to_string())
    }
}

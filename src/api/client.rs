//! HTTP client for the content API

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::document::{ApiInfo, Document, SearchResponse};
use super::query::{Predicate, Query};
use crate::config::ApiConfig;

/// Errors talking to the content API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("content API endpoint is not configured")]
    MissingEndpoint,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("content API returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("content API did not advertise a master ref")]
    NoMasterRef,
}

/// Anything that can answer content queries.
///
/// [`ContentClient`] talks HTTP; tests substitute in-memory sources.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a search query
    async fn query(&self, query: &Query) -> Result<SearchResponse, ApiError>;

    /// Follow a `next_page` cursor
    async fn fetch_page(&self, url: &str) -> Result<SearchResponse, ApiError>;

    /// Look up a single document by its uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        reference: Option<String>,
    ) -> Result<Option<Document>, ApiError> {
        let query = Query::documents_of_type(doc_type)
            .predicate(Predicate::uid(doc_type, uid))
            .page_size(1)
            .reference(reference);
        let response = self.query(&query).await?;
        Ok(response.results.into_iter().next())
    }

    /// Look up a single document of any type by its id
    async fn get_by_id(
        &self,
        id: &str,
        reference: Option<String>,
    ) -> Result<Option<Document>, ApiError> {
        let query = Query::default()
            .predicate(Predicate::id(id))
            .page_size(1)
            .reference(reference);
        let response = self.query(&query).await?;
        Ok(response.results.into_iter().next())
    }
}

/// Handle to the content API, built once at startup and passed down
#[derive(Debug, Clone)]
pub struct ContentClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl ContentClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(ApiError::MissingEndpoint);
        }

        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(ApiError::Client)?;

        Ok(Self {
            http,
            endpoint,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Resolve the ref of the currently published release
    pub async fn master_ref(&self) -> Result<String, ApiError> {
        let info: ApiInfo = self.get_json(&self.endpoint, &[]).await?;
        info.master_ref()
            .map(str::to_string)
            .ok_or(ApiError::NoMasterRef)
    }

    fn search_url(&self) -> String {
        format!("{}/documents/search", self.endpoint)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut request = self.http.get(url).query(params);
        if let Some(token) = &self.access_token {
            if !url.contains("access_token=") {
                request = request.query(&[("access_token", token)]);
            }
        }

        tracing::debug!("GET {}", url);
        let response = request.send().await.map_err(|source| ApiError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.json::<T>().await.map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ContentSource for ContentClient {
    async fn query(&self, query: &Query) -> Result<SearchResponse, ApiError> {
        let reference = match &query.reference {
            Some(reference) => reference.clone(),
            None => self.master_ref().await?,
        };
        let params = query.params(&reference);
        self.get_json(&self.search_url(), &params).await
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse, ApiError> {
        self.get_json(url, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{post_document, FakeApi};

    fn config_for(endpoint: &str) -> ApiConfig {
        ApiConfig {
            endpoint: endpoint.to_string(),
            access_token: Some("token".to_string()),
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn test_missing_endpoint() {
        let err = ContentClient::new(&ApiConfig::default()).unwrap_err();
        assert!(matches!(err, ApiError::MissingEndpoint));
    }

    #[tokio::test]
    async fn test_master_ref() {
        let api = FakeApi::spawn(vec![]).await;
        let client = ContentClient::new(&config_for(&api.endpoint)).unwrap();
        assert_eq!(client.master_ref().await.unwrap(), "master");
    }

    #[tokio::test]
    async fn test_query_and_follow_cursor() {
        let docs = (1..=3)
            .map(|i| post_document(&format!("post-{}", i), &format!("2021-03-0{}T10:00:00+0000", i)))
            .collect();
        let api = FakeApi::spawn(docs).await;
        let client = ContentClient::new(&config_for(&api.endpoint)).unwrap();

        let first = client
            .query(&Query::documents_of_type("post").page_size(2))
            .await
            .unwrap();
        assert_eq!(first.results.len(), 2);
        let cursor = first.next_page.expect("second page");

        let second = client.fetch_page(&cursor).await.unwrap();
        assert_eq!(second.results.len(), 1);
        assert!(second.next_page.is_none());
    }

    #[tokio::test]
    async fn test_get_by_uid() {
        let docs = vec![
            post_document("first", "2021-03-01T10:00:00+0000"),
            post_document("second", "2021-03-02T10:00:00+0000"),
        ];
        let api = FakeApi::spawn(docs).await;
        let client = ContentClient::new(&config_for(&api.endpoint)).unwrap();

        let doc = client.get_by_uid("post", "second", None).await.unwrap();
        assert_eq!(doc.and_then(|d| d.uid).as_deref(), Some("second"));

        let missing = client.get_by_uid("post", "nope", None).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_get_by_id_sees_drafts_only_in_preview() {
        let mut draft = post_document("draft", "2021-03-02T10:00:00+0000");
        draft["draft"] = serde_json::Value::Bool(true);
        let api = FakeApi::spawn(vec![draft]).await;
        let client = ContentClient::new(&config_for(&api.endpoint)).unwrap();

        let published = client.get_by_id("id-draft", None).await.unwrap();
        assert!(published.is_none());

        let previewed = client
            .get_by_id("id-draft", Some("preview".to_string()))
            .await
            .unwrap();
        assert_eq!(previewed.and_then(|d| d.uid).as_deref(), Some("draft"));
    }

    #[tokio::test]
    async fn test_error_status() {
        let api = FakeApi::spawn(vec![]).await;
        let client = ContentClient::new(&config_for(&api.endpoint)).unwrap();
        let err = client
            .fetch_page(&format!("{}/does-not-exist", api.endpoint))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { .. }));
    }
}

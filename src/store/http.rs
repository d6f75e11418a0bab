//! HTTP-backed remote store.
//!
//! Speaks the share server's JSON API: `GET /browse/{path}`,
//! `GET /search?q=..&folder_path=..`, `POST /edit_upload_path`,
//! `POST /delete/{path}` and `POST /create_folder`. Transport encoding is
//! the whole job of this module; engine components only ever see
//! [`StoreError`] kinds and canonicalized listings.
//!
//! Authentication headers and session cookies are owned by the deployment's
//! auth layer; this client forwards nothing of its own.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::retry::{send_with_retry, RetryConfig};
use super::{Entry, Listing, RemoteStore, SearchHits, StoreError};
use crate::config::ClientConfig;
use crate::path;

#[derive(Debug, Deserialize)]
struct BrowseResponse {
    current_path: String,
    #[serde(default)]
    folders: Vec<Entry>,
    #[serde(default)]
    files: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    folders: Vec<Entry>,
    #[serde(default)]
    files: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: String,
}

#[derive(Debug, Serialize)]
struct MoveRequest<'a> {
    upload_id: &'a str,
    old_path: &'a str,
    new_path: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateFolderRequest<'a> {
    parent_path: &'a str,
    folder_name: &'a str,
}

/// Remote store client over the share server's HTTP API.
pub struct HttpStore {
    base: String,
    client: reqwest::Client,
    retry: RetryConfig,
    remote_search: bool,
}

impl HttpStore {
    pub fn new(config: &ClientConfig) -> Result<Self, StoreError> {
        let parsed = url::Url::parse(&config.base_url)
            .map_err(|e| StoreError::InvalidConfig(format!("invalid base URL: {}", e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(StoreError::InvalidConfig(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            base: config.base_url.trim_end_matches('/').to_string(),
            client,
            retry: RetryConfig::default(),
            remote_search: config.remote_search,
        })
    }

    // ─── URL building ────────────────────────────────────────────────────

    /// Percent-encode each segment, never the separator.
    fn encode_path(raw: &str) -> String {
        path::segments(raw)
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn browse_url(&self, folder_path: &str) -> String {
        let encoded = Self::encode_path(folder_path);
        if encoded.is_empty() {
            format!("{}/browse", self.base)
        } else {
            format!("{}/browse/{}", self.base, encoded)
        }
    }

    fn search_url(&self, query: &str, scope: &str) -> String {
        format!(
            "{}/search?q={}&folder_path={}",
            self.base,
            urlencoding::encode(query),
            urlencoding::encode(scope)
        )
    }

    fn delete_url(&self, item_path: &str) -> String {
        format!("{}/delete/{}", self.base, Self::encode_path(item_path))
    }

    // ─── Transport helpers ───────────────────────────────────────────────

    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response, StoreError> {
        let request = self
            .client
            .get(url)
            .build()
            .map_err(|e| StoreError::Transient(format!("build request failed: {}", e)))?;
        send_with_retry(&self.client, request, &self.retry)
            .await
            .map_err(|e| StoreError::Transient(format!("request failed: {}", e)))
    }

    async fn post_json_with_retry<B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response, StoreError> {
        let payload = serde_json::to_vec(body)
            .map_err(|e| StoreError::Decode(format!("encode request failed: {}", e)))?;
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .build()
            .map_err(|e| StoreError::Transient(format!("build request failed: {}", e)))?;
        send_with_retry(&self.client, request, &self.retry)
            .await
            .map_err(|e| StoreError::Transient(format!("request failed: {}", e)))
    }

    async fn expect_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        if response.status().is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| StoreError::Decode(format!("unexpected response shape: {}", e)))
        } else {
            Err(Self::error_for(response).await)
        }
    }

    /// Map an unsuccessful response onto the store error taxonomy, carrying
    /// the server's `error` field when one is present.
    async fn error_for(response: reqwest::Response) -> StoreError {
        let status = response.status();
        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|e| e.error)
            .unwrap_or_default();
        let message = if message.is_empty() {
            status.to_string()
        } else {
            message
        };
        match status.as_u16() {
            401 => StoreError::Unauthorized(message),
            404 => StoreError::NotFound(message),
            409 => StoreError::Conflict(message),
            408 | 429 => StoreError::Transient(message),
            s if s >= 500 => StoreError::Transient(message),
            _ => StoreError::Rejected(message),
        }
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn list(&self, folder_path: &str) -> Result<Listing, StoreError> {
        let url = self.browse_url(folder_path);
        debug!("GET {}", url);
        let response = self.get_with_retry(&url).await?;
        let browse: BrowseResponse = Self::expect_json(response).await?;
        Ok(Listing {
            current_path: browse.current_path,
            folders: browse.folders,
            files: browse.files,
        }
        .canonicalized())
    }

    fn supports_search(&self) -> bool {
        self.remote_search
    }

    async fn search(&self, query: &str, scope: &str) -> Result<SearchHits, StoreError> {
        if !self.remote_search {
            return Err(StoreError::Unsupported("search".to_string()));
        }
        let url = self.search_url(query, scope);
        debug!("GET {}", url);
        let response = self.get_with_retry(&url).await?;
        let hits: SearchResponse = Self::expect_json(response).await?;
        Ok(SearchHits {
            folders: hits.folders,
            files: hits.files,
        }
        .canonicalized())
    }

    async fn move_file(
        &self,
        upload_id: &str,
        old_path: &str,
        new_path: &str,
    ) -> Result<String, StoreError> {
        let url = format!("{}/edit_upload_path", self.base);
        let body = MoveRequest {
            upload_id,
            old_path,
            new_path,
        };
        debug!("POST {} ({} -> {})", url, old_path, new_path);
        let response = self.post_json_with_retry(&url, &body).await?;
        let reply: MessageResponse = Self::expect_json(response).await?;
        Ok(reply.message)
    }

    async fn delete(&self, item_path: &str) -> Result<(), StoreError> {
        let url = self.delete_url(item_path);
        debug!("POST {}", url);
        let response = self
            .post_json_with_retry(&url, &serde_json::json!({}))
            .await?;
        let _: MessageResponse = Self::expect_json(response).await?;
        Ok(())
    }

    async fn create_folder(&self, parent_path: &str, name: &str) -> Result<String, StoreError> {
        let url = format!("{}/create_folder", self.base);
        let body = CreateFolderRequest {
            parent_path,
            folder_name: name,
        };
        debug!("POST {} ({})", url, name);
        let response = self.post_json_with_retry(&url, &body).await?;
        let reply: MessageResponse = Self::expect_json(response).await?;
        Ok(reply.message)
    }
}

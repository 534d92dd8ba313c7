use crate::services::{Collection, Index};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};

/// Why a catalog fetch produced nothing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The index or record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Network or I/O failure; retrying may succeed
    #[error("fetch failed: {0}")]
    Transient(String),

    /// The payload was fetched but is not the expected JSON
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

/// Where generated indexes and detail records are read from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexSource: Send + Sync {
    /// Fetch the raw bytes at a path relative to the content root,
    /// e.g. `builds/index.json`
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

/// Reads indexes straight from a content directory
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Only plain relative paths below the root are served
    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(FetchError::NotFound(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl IndexSource for FsSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(path.to_string()))
            },
            Err(e) => Err(FetchError::Transient(format!("{}: {}", full.display(), e))),
        }
    }
}

/// Fetches indexes from the deployed site over HTTP
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    /// `base_url` is the URL of the content root, e.g. `https://example.com/content`
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl IndexSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(path);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url));
        }
        if !status.is_success() {
            return Err(FetchError::Transient(format!("{} {}", status, url)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Decode an index payload. A bare array is rejected.
pub fn decode_index<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>, FetchError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| FetchError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(FetchError::Malformed(
            "index is not a JSON object".to_string(),
        ));
    }
    Index::<T>::deserialize(value)
        .map(|index| index.items)
        .map_err(|e| FetchError::Malformed(e.to_string()))
}

/// Fetch and decode one collection index
pub async fn fetch_index<T: DeserializeOwned>(
    source: &dyn IndexSource,
    collection: Collection,
) -> Result<Vec<T>, FetchError> {
    let bytes = source.fetch(&collection.index_path()).await?;
    decode_index(&bytes)
}

/// Fetch the full content record of one entity
pub async fn fetch_detail(
    source: &dyn IndexSource,
    collection: Collection,
    slug: &str,
) -> Result<Value, FetchError> {
    if slug.is_empty() || slug.contains(['/', '\\']) || slug == "index" {
        return Err(FetchError::NotFound(format!("{}/{}", collection, slug)));
    }
    let bytes = source.fetch(&collection.detail_path(slug)).await?;
    serde_json::from_slice(&bytes).map_err(|e| FetchError::Malformed(e.to_string()))
}

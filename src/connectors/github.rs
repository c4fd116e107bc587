//! GitHub contents API used as a JSON-file store.
//!
//! Each document is one file in a data repository. Reads return the decoded
//! content plus the blob sha; writes send the prior sha back so GitHub's
//! optimistic check applies, and omit it to create a missing file. There is
//! no locking above that; concurrent writers can still clobber each other
//! with a stale sha.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::auth::TokenProvider;
use crate::errors::StoreError;

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = "opsboard";

/// A file read from the store: decoded content plus its revision marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content: String,
    pub sha: String,
}

/// Seam between the document layer and the backing store. The production
/// implementation talks to GitHub; tests and `--offline` runs use the
/// in-memory one.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Read a file. `None` when the file does not exist yet.
    async fn get(&self, path: &str) -> Result<Option<StoredFile>, StoreError>;

    /// Write a file. `prior_sha` must be the sha from the last read for an
    /// existing file, or `None` to create it.
    async fn put(
        &self,
        path: &str,
        content: &str,
        message: &str,
        prior_sha: Option<&str>,
    ) -> Result<(), StoreError>;
}

/// Response shape of `GET /repos/{owner}/{repo}/contents/{path}` for a file.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    content: Option<String>,
    sha: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

pub struct GitHubFileStore {
    client: reqwest::Client,
    tokens: Arc<TokenProvider>,
    owner: String,
    repo: String,
}

impl GitHubFileStore {
    pub fn new(tokens: Arc<TokenProvider>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            GITHUB_API, self.owner, self.repo, path
        )
    }

    async fn bearer(&self) -> Result<String, StoreError> {
        let token = self.tokens.access_token("github").await?;
        Ok(format!("Bearer {}", token))
    }
}

/// GitHub wraps base64 payloads across lines; strip whitespace before decode.
fn decode_content(path: &str, raw: &str) -> Result<String, StoreError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| StoreError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|e| StoreError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl FileStore for GitHubFileStore {
    async fn get(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let response = self
            .client
            .get(self.contents_url(path))
            .header("Authorization", self.bearer().await?)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(crate::errors::ConnectorError::Http)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let value: serde_json::Value = response
            .error_for_status()
            .map_err(crate::errors::ConnectorError::Http)?
            .json()
            .await
            .map_err(crate::errors::ConnectorError::Http)?;

        // A directory listing comes back as an array.
        if value.is_array() {
            return Err(StoreError::NotAFile {
                path: path.to_string(),
            });
        }

        let parsed: ContentsResponse =
            serde_json::from_value(value).map_err(|source| StoreError::Parse {
                path: path.to_string(),
                source,
            })?;

        if parsed.kind.as_deref() == Some("dir") {
            return Err(StoreError::NotAFile {
                path: path.to_string(),
            });
        }

        let (raw, sha) = match (parsed.content, parsed.sha) {
            (Some(content), Some(sha)) => (content, sha),
            _ => {
                return Err(StoreError::NoContent {
                    path: path.to_string(),
                })
            }
        };

        Ok(Some(StoredFile {
            content: decode_content(path, &raw)?,
            sha,
        }))
    }

    async fn put(
        &self,
        path: &str,
        content: &str,
        message: &str,
        prior_sha: Option<&str>,
    ) -> Result<(), StoreError> {
        let body = PutContentsRequest {
            message,
            content: BASE64.encode(content.as_bytes()),
            sha: prior_sha,
        };

        self.client
            .put(self.contents_url(path))
            .header("Authorization", self.bearer().await?)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .json(&body)
            .send()
            .await
            .map_err(crate::errors::ConnectorError::Http)?
            .error_for_status()
            .map_err(|_| StoreError::WriteRejected {
                path: path.to_string(),
            })?;

        Ok(())
    }
}

/// In-process file store for tests and `--offline` runs. Revision markers
/// are a simple counter per path.
#[derive(Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<String, StoredFile>>,
    writes: RwLock<u64>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a file, e.g. seed fixtures in tests.
    pub async fn seed(&self, path: &str, content: &str) {
        let mut files = self.files.write().await;
        files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                sha: "seed-0".to_string(),
            },
        );
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn get(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        Ok(self.files.read().await.get(path).cloned())
    }

    async fn put(
        &self,
        path: &str,
        content: &str,
        _message: &str,
        _prior_sha: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut writes = self.writes.write().await;
        *writes += 1;
        let sha = format!("mem-{}", *writes);
        drop(writes);

        let mut files = self.files.write().await;
        files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                sha,
            },
        );
        Ok(())
    }
}

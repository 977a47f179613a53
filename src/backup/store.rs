use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The key already holds an object; bundles are write-once
    #[error("object already exists under key {0}")]
    AlreadyExists(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Write-once object store. The remote implementation lives with the
/// deployment (it wraps whatever bucket SDK the environment carries);
/// this crate ships the seam and the local fallback.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Name for logging
    fn name(&self) -> &str;
}

/// Remote object store over a plain HTTP PUT interface. `If-None-Match`
/// makes the write conditional on the key being free, matching the
/// write-once contract.
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    destination: String,
    token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(base_url: impl Into<String>, destination: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            destination: destination.into(),
            token,
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let url = format!("{}/{}/{}", self.base_url, self.destination, key);
        let mut request = self
            .client
            .put(&url)
            .header("If-None-Match", "*")
            .body(bytes.to_vec());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match response.status().as_u16() {
            code if (200..300).contains(&code) => {
                info!("bundle uploaded to {}", url);
                Ok(())
            }
            412 => Err(StoreError::AlreadyExists(key.to_string())),
            code => Err(StoreError::Unavailable(format!(
                "{} returned status {}",
                url, code
            ))),
        }
    }

    fn name(&self) -> &str {
        "remote-object-store"
    }
}

/// Filesystem store used as the degraded-mode fallback. Same key
/// discipline as the remote side: an existing file is never overwritten.
pub struct LocalFallbackStore {
    dir: PathBuf,
}

impl LocalFallbackStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl ObjectStore for LocalFallbackStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        if path.exists() {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }

        fs::write(&path, bytes)?;
        info!("bundle written to local fallback: {:?}", path);
        Ok(())
    }

    fn name(&self) -> &str {
        "local-fallback"
    }
}

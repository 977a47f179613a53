use super::bundle::BackupArtifactBundle;
use super::store::{LocalFallbackStore, ObjectStore, StoreError};
use crate::client::RetryPolicy;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Where a bundle ended up.
#[derive(Debug, Clone, Serialize)]
pub enum BackupOutcome {
    /// Uploaded to the remote store
    Remote { key: String },
    /// Remote failed or disabled; the bundle is safe on local disk
    LocalOnly { path: PathBuf, reason: String },
}

/// Persists a completed session's bundle: bounded remote retries with
/// doubling backoff, then a mandatory local-fallback write. A completed
/// session's data is never lost to a flaky remote.
pub struct BackupDispatcher {
    remote: Option<Arc<dyn ObjectStore>>,
    local: LocalFallbackStore,
    policy: RetryPolicy,
}

impl BackupDispatcher {
    pub fn new(
        remote: Option<Arc<dyn ObjectStore>>,
        local: LocalFallbackStore,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            remote,
            local,
            policy,
        }
    }

    /// Upload the bundle, falling back to local storage once retries are
    /// exhausted. The payload is serialized exactly once, before any
    /// network call; a half-written field-by-field remote record cannot
    /// happen.
    pub async fn dispatch(&self, bundle: &BackupArtifactBundle) -> Result<BackupOutcome> {
        let key = bundle.key();
        let bytes = bundle.to_bytes()?;

        let remote = match &self.remote {
            Some(remote) => remote,
            None => {
                info!("remote backup disabled, writing bundle locally");
                return self
                    .fall_back(&key, &bytes, "remote backup disabled".to_string())
                    .await;
            }
        };

        let mut last_error = String::new();
        for attempt in 1..=self.policy.max_attempts {
            match remote.put(&key, &bytes).await {
                Ok(()) => {
                    info!("bundle {} uploaded to {}", key, remote.name());
                    return Ok(BackupOutcome::Remote { key });
                }
                // Write-once key: an existing object means a previous
                // attempt landed even though we never saw the ack.
                Err(StoreError::AlreadyExists(_)) => {
                    warn!("bundle {} already present on {}", key, remote.name());
                    return Ok(BackupOutcome::Remote { key });
                }
                Err(err) => {
                    last_error = err.to_string();
                    if attempt < self.policy.max_attempts {
                        let delay = self.policy.delay_before(attempt);
                        warn!(
                            "backup upload failed (attempt {}/{}), retrying in {:?}: {}",
                            attempt, self.policy.max_attempts, delay, last_error
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        warn!(
            "backup upload exhausted {} attempts, falling back to local storage: {}",
            self.policy.max_attempts, last_error
        );
        self.fall_back(&key, &bytes, last_error).await
    }

    async fn fall_back(&self, key: &str, bytes: &[u8], reason: String) -> Result<BackupOutcome> {
        self.local
            .put(key, bytes)
            .await
            .context("Local fallback write failed; session data at risk")?;
        Ok(BackupOutcome::LocalOnly {
            path: self.local.path_for(key),
            reason,
        })
    }
}

//! Backup dispatch for completed sessions
//!
//! A finished session becomes one immutable JSON bundle (audio inlined
//! base64) that is uploaded to a write-once remote object store with
//! bounded retries, or written to local fallback storage when the remote
//! is unreachable or disabled.

mod bundle;
mod dispatcher;
mod store;

pub use bundle::{AttemptRecord, AudioBlob, BackupArtifactBundle, ModelAudioRecord};
pub use dispatcher::{BackupDispatcher, BackupOutcome};
pub use store::{HttpObjectStore, LocalFallbackStore, ObjectStore, StoreError};

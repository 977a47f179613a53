use crate::backup::BackupDispatcher;
use crate::client::AdaptiveClient;
use crate::config::LimitsConfig;
use crate::session::SessionRunner;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state for HTTP handlers.
///
/// One process serves one participant at a time: the single session slot
/// sits behind a mutex and a second start while a run is live gets 409.
#[derive(Clone)]
pub struct AppState {
    /// The active session, if any
    pub runner: Arc<Mutex<Option<SessionRunner>>>,
    /// Adaptive client shared by every stage (sticky probe cache lives here)
    pub client: Arc<AdaptiveClient>,
    /// Backup dispatcher invoked at completion
    pub dispatcher: Arc<BackupDispatcher>,
    /// The interview question participants answer
    pub question: String,
    pub limits: LimitsConfig,
}

impl AppState {
    pub fn new(
        client: Arc<AdaptiveClient>,
        dispatcher: Arc<BackupDispatcher>,
        question: String,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            runner: Arc::new(Mutex::new(None)),
            client,
            dispatcher,
            question,
            limits,
        }
    }
}

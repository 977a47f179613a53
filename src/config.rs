use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub services: CapabilityConfigs,
    pub assessment: AssessmentConfig,
    pub limits: LimitsConfig,
    pub backup: BackupConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Credentials and tuning for the three remote AI capabilities.
///
/// API keys are optional on purpose: a missing key for a capability the
/// session actually uses surfaces as an authentication error at first
/// use, not at startup.
#[derive(Debug, Deserialize)]
pub struct CapabilityConfigs {
    pub transcription: TranscriptionConfig,
    pub feedback: FeedbackConfig,
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    pub api_key: Option<String>,
    /// Expected source language of the recordings (e.g. "ko")
    pub language: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackConfig {
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    pub api_key: Option<String>,
    pub voice_id: Option<String>,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct AssessmentConfig {
    /// The interview question every participant answers
    pub question: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted recording length in seconds
    pub max_recording_secs: u64,
    /// Maximum accepted recording size in bytes (remote APIs cap uploads)
    pub max_recording_bytes: usize,
    /// Per-call timeout for remote capability calls, in seconds
    pub request_timeout_secs: u64,
    /// Initial retry backoff in milliseconds (doubles per attempt)
    pub retry_initial_delay_ms: u64,
    /// Backoff cap in milliseconds
    pub retry_max_delay_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_recording_secs: 180,
            max_recording_bytes: 25 * 1024 * 1024, // transcription API upload cap
            request_timeout_secs: 30,
            retry_initial_delay_ms: 500,
            retry_max_delay_ms: 4000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    /// Whether to attempt remote backup at all
    pub enabled: bool,
    /// Remote object-store endpoint
    pub endpoint: Option<String>,
    /// Remote destination identifier (bucket name)
    pub destination: String,
    /// Bearer token for the remote store
    pub token: Option<String>,
    /// Directory for local fallback bundles
    pub local_dir: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
